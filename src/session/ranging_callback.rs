// Copyright 2022, The Android Open Source Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This module defines the events delivered to the client of a ranging session.

use std::fmt;

use num_traits::FromPrimitive;

use crate::error::Error;
use crate::params::bundle::Bundle;
use crate::params::fira_app_config_params::UwbAddress;
use crate::params::uci_packets::{DtTagRangingRoundsResponse, ReasonCode, SessionHandle};
use crate::uci::notification::{RadarDataRcvNotification, SessionRangeData};

/// The reason reported with the stopped and closed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingChangeReason {
    Unknown,
    LocalApi,
    MaxSessionsReached,
    SystemPolicy,
    RemoteRequest,
    ProtocolSpecific,
    BadParameters,
    MaxRrRetryReached,
    InsufficientSlotsPerRr,
    SystemRegulation,
}

impl RangingChangeReason {
    /// Map the reason code of the SESSION_STATUS_NTF.
    pub fn from_reason_code(reason_code: u8) -> Self {
        match ReasonCode::from_u8(reason_code) {
            Some(ReasonCode::StateChangeWithSessionManagementCommands)
            | Some(ReasonCode::MaxNumberOfMeasurementsReached) => Self::LocalApi,
            Some(ReasonCode::MaxRangingRoundRetryCountReached) => Self::MaxRrRetryReached,
            Some(ReasonCode::SessionSuspendedDueToInbandSignal)
            | Some(ReasonCode::SessionResumedDueToInbandSignal)
            | Some(ReasonCode::SessionStoppedDueToInbandSignal) => Self::RemoteRequest,
            Some(ReasonCode::ErrorInsufficientSlotsPerRr) => Self::InsufficientSlotsPerRr,
            Some(ReasonCode::ErrorInvalidUlTdoaRandomWindow)
            | Some(ReasonCode::ErrorSlotLengthNotSupported)
            | Some(ReasonCode::ErrorMacAddressModeNotSupported)
            | Some(ReasonCode::ErrorInvalidRangingDuration)
            | Some(ReasonCode::ErrorInvalidStsConfig)
            | Some(ReasonCode::ErrorInvalidRframeConfig) => Self::BadParameters,
            Some(ReasonCode::RegulationUwbOff) => Self::SystemRegulation,
            None => Self::ProtocolSpecific,
        }
    }
}

/// The event of a ranging session. Every request accepted by the session manager ends with
/// exactly one of the terminal events of that request.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum RangingEvent {
    Opened,
    OpenFailed { error: Error },
    Started { params: Bundle },
    StartFailed { error: Error },
    Reconfigured,
    ReconfigureFailed { error: Error },
    Paused,
    PauseFailed { error: Error },
    Resumed,
    ResumeFailed { error: Error },
    ControleeAdded,
    ControleeAddFailed { error: Error },
    ControleeRemoved,
    ControleeRemoveFailed { error: Error },
    Stopped { reason: RangingChangeReason, params: Bundle },
    StopFailed { error: Error },
    Closed { reason: RangingChangeReason },
    RangingResult(SessionRangeData),
    DataSent { remote_address: UwbAddress },
    DataSendFailed { remote_address: UwbAddress, error: Error },
    DataReceived { remote_address: UwbAddress, payload: Vec<u8> },
    DataTransferPhaseConfigured,
    DataTransferPhaseConfigFailed { error: Error },
    HybridControllerConfigured,
    HybridControllerConfigFailed { error: Error },
    HybridControleeConfigured,
    HybridControleeConfigFailed { error: Error },
    DtTagRangingRoundsUpdated(DtTagRangingRoundsResponse),
    DtTagRangingRoundsUpdateFailed { error: Error },
    RadarData(RadarDataRcvNotification),
}

/// The callback of a ranging session. It is registered when the session is opened, and is
/// dropped after the Closed or OpenFailed event is delivered.
pub trait RangingCallback: 'static + Send {
    /// Notify the event of the session identified by |handle|.
    fn on_ranging_event(&mut self, handle: SessionHandle, event: RangingEvent);
}

impl fmt::Debug for dyn RangingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RangingCallback")
    }
}
