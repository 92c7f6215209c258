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

//! This module defines the UCI constants and the data structures exchanged with the native UWB
//! stack.

use num_derive::{FromPrimitive, ToPrimitive};
use zeroize::Zeroize;

/// The type of the session identifier.
pub type SessionId = u32;
/// The type of the sub-session identifier.
pub type SubSessionId = u32;
/// The type of the session token assigned by the firmware.
pub type SessionToken = u32;
/// The identifier of a UWB chip, as listed in the multichip configuration.
pub type ChipId = String;

/// The opaque token chosen by the client to refer to one of its ranging sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(u64);

impl SessionHandle {
    /// Create a SessionHandle instance.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw value of the handle.
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum SessionType {
    FiraRangingSession = 0x00,
    FiraRangingAndInBandDataSession = 0x01,
    FiraDataTransferSession = 0x02,
    FiraRangingOnlyPhase = 0x03,
    FiraInBandDataPhase = 0x04,
    FiraRangingWithDataPhase = 0x05,
    Ccc = 0xA0,
    RadarSession = 0xA1,
    Aliro = 0xA2,
    DeviceTestMode = 0xD0,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum SessionState {
    SessionStateInit = 0x00,
    SessionStateDeinit = 0x01,
    SessionStateActive = 0x02,
    SessionStateIdle = 0x03,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum DeviceState {
    DeviceStateReady = 0x01,
    DeviceStateActive = 0x02,
    DeviceStateError = 0xFF,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum StatusCode {
    UciStatusOk = 0x00,
    UciStatusRejected = 0x01,
    UciStatusFailed = 0x02,
    UciStatusSyntaxError = 0x03,
    UciStatusInvalidParam = 0x04,
    UciStatusInvalidRange = 0x05,
    UciStatusInvalidMsgSize = 0x06,
    UciStatusUnknownGid = 0x07,
    UciStatusUnknownOid = 0x08,
    UciStatusReadOnly = 0x09,
    UciStatusCommandRetry = 0x0A,
    UciStatusUnknown = 0x0B,
    UciStatusSessionNotExist = 0x11,
    UciStatusSessionDuplicate = 0x12,
    UciStatusSessionActive = 0x13,
    UciStatusMaxSessionsExceeded = 0x14,
    UciStatusSessionNotConfigured = 0x15,
    UciStatusActiveSessionsOngoing = 0x16,
    UciStatusMulticastListFull = 0x17,
    UciStatusErrorUwbInitiationTimeTooOld = 0x1A,
    UciStatusRangingTxFailed = 0x20,
    UciStatusRangingRxTimeout = 0x21,
    UciStatusDataMaxTxPsduSizeExceeded = 0x30,
    UciStatusDataRxCrcError = 0x34,
    UciStatusRegulationUwbOff = 0x53,
}

/// The reason codes of the session status notification that the service reacts to. Other
/// values are carried as raw bytes.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum ReasonCode {
    StateChangeWithSessionManagementCommands = 0x00,
    MaxRangingRoundRetryCountReached = 0x01,
    MaxNumberOfMeasurementsReached = 0x02,
    SessionSuspendedDueToInbandSignal = 0x03,
    SessionResumedDueToInbandSignal = 0x04,
    SessionStoppedDueToInbandSignal = 0x05,
    ErrorInvalidUlTdoaRandomWindow = 0x1D,
    ErrorSlotLengthNotSupported = 0x20,
    ErrorInsufficientSlotsPerRr = 0x21,
    ErrorMacAddressModeNotSupported = 0x22,
    ErrorInvalidRangingDuration = 0x23,
    ErrorInvalidStsConfig = 0x24,
    ErrorInvalidRframeConfig = 0x25,
    RegulationUwbOff = 0x80,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum UpdateMulticastListAction {
    AddControlee = 0x00,
    RemoveControlee = 0x01,
    AddControleeWithShortSubSessionKey = 0x02,
    AddControleeWithLongSubSessionKey = 0x03,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum MulticastUpdateStatusCode {
    StatusOkMulticastListUpdate = 0x00,
    StatusErrorMulticastListFull = 0x01,
    StatusErrorKeyFetchFail = 0x02,
    StatusErrorSubSessionIdNotFound = 0x03,
    StatusErrorSubSessionKeyNotFound = 0x04,
    StatusErrorSubSessionKeyNotApplicable = 0x05,
    StatusErrorSessionKeyNotFound = 0x06,
    StatusErrorAddressNotFound = 0x07,
    StatusErrorAddressAlreadyPresent = 0x08,
}

/// The UCI message type of a vendor message.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum MessageType {
    Data = 0x00,
    Command = 0x01,
    Response = 0x02,
    Notification = 0x03,
    ReservedForTesting1 = 0x04,
    ReservedForTesting2 = 0x05,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum DataTransferNtfStatusCode {
    UciDataTransferStatusRepetitionOk = 0x00,
    UciDataTransferStatusOk = 0x01,
    UciDataTransferStatusErrorDataTransfer = 0x02,
    UciDataTransferStatusErrorNoCreditAvailable = 0x03,
    UciDataTransferStatusErrorRejected = 0x04,
    UciDataTransferStatusSessionTypeNotSupported = 0x05,
    UciDataTransferStatusErrorDataTransferIsOngoing = 0x06,
    UciDataTransferStatusInvalidFormat = 0x07,
}

/// The tags of the UCI application configuration TLVs.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive, ToPrimitive,
)]
pub enum AppConfigTlvType {
    DeviceType = 0x00,
    RangingRoundUsage = 0x01,
    StsConfig = 0x02,
    MultiNodeMode = 0x03,
    ChannelNumber = 0x04,
    NumberOfControlees = 0x05,
    DeviceMacAddress = 0x06,
    DstMacAddress = 0x07,
    SlotDuration = 0x08,
    RangingDuration = 0x09,
    StsIndex = 0x0A,
    MacFcsType = 0x0B,
    RangingRoundControl = 0x0C,
    AoaResultReq = 0x0D,
    RngDataNtf = 0x0E,
    RngDataNtfProximityNear = 0x0F,
    RngDataNtfProximityFar = 0x10,
    DeviceRole = 0x11,
    RframeConfig = 0x12,
    RssiReporting = 0x13,
    PreambleCodeIndex = 0x14,
    SfdId = 0x15,
    PsduDataRate = 0x16,
    PreambleDuration = 0x17,
    RangingTimeStruct = 0x1A,
    SlotsPerRr = 0x1B,
    ResponderSlotIndex = 0x1E,
    PrfMode = 0x1F,
    ScheduledMode = 0x22,
    KeyRotation = 0x23,
    KeyRotationRate = 0x24,
    SessionPriority = 0x25,
    MacAddressMode = 0x26,
    VendorId = 0x27,
    StaticStsIv = 0x28,
    NumberOfStsSegments = 0x29,
    MaxRrRetry = 0x2A,
    UwbInitiationTime = 0x2B,
    HoppingMode = 0x2C,
    BlockStrideLength = 0x2D,
    ResultReportConfig = 0x2E,
    InBandTerminationAttemptCount = 0x2F,
    SubSessionId = 0x30,
    BprfPhrDataRate = 0x31,
    MaxNumberOfMeasurements = 0x32,
    StsLength = 0x35,
    SuspendRangingRounds = 0x36,
    SessionKey = 0x45,
    SubsessionKey = 0x46,
    CccHopModeKey = 0xA0,
    CccUwbTime0 = 0xA1,
    CccRangingProtocolVer = 0xA3,
    CccUwbConfigId = 0xA4,
    CccPulseshapeCombo = 0xA5,
    CccUrskTtl = 0xA6,
    CccLastIndexUsed = 0xA8,
    NbOfRangeMeasurements = 0xE3,
    NbOfAzimuthMeasurements = 0xE4,
    NbOfElevationMeasurements = 0xE5,
}

/// The country code struct that contains 2 uppercase ASCII characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// Create a CountryCode instance.
    pub fn new(code: &[u8; 2]) -> Option<Self> {
        if !code[0].is_ascii_uppercase() || !code[1].is_ascii_uppercase() {
            None
        } else {
            Some(Self(*code))
        }
    }

    /// Parse the country code from a string such as "US".
    pub fn parse(code: &str) -> Option<Self> {
        let bytes: [u8; 2] = code.as_bytes().try_into().ok()?;
        Self::new(&bytes)
    }

    /// The string representation of the country code.
    pub fn as_str(&self) -> &str {
        // Both bytes are uppercase ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl From<CountryCode> for [u8; 2] {
    fn from(item: CountryCode) -> [u8; 2] {
        item.0
    }
}

/// The device information of a chip, reported when the stack is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfoResponse {
    /// The UCI version.
    pub uci_version: u16,
    /// The MAC version.
    pub mac_version: u16,
    /// The physical version.
    pub phy_version: u16,
    /// The UCI test version.
    pub uci_test_version: u16,
    /// The vendor spec info.
    pub vendor_spec_info: Vec<u8>,
}

/// The status of one app config TLV which is not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfigStatus {
    /// The tag of the TLV.
    pub cfg_id: u8,
    /// The status of the TLV.
    pub status: StatusCode,
}

/// The response of the NativeUwbManager::set_app_configurations() method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetAppConfigResponse {
    /// The status code of the response.
    pub status: StatusCode,
    /// The status of each config TLV.
    pub config_status: Vec<AppConfigStatus>,
}

/// A controlee added to or removed from a controller's multicast list.
#[derive(Clone, PartialEq, Eq)]
pub struct Controlee {
    /// The short MAC address of the controlee.
    pub short_address: [u8; 2],
    /// The sub-session id of the controlee.
    pub subsession_id: SubSessionId,
    /// The sub-session key, used by the provisioned STS individual key modes.
    pub subsession_key: Option<Vec<u8>>,
}

/// Explicitly implement Debug trait to prevent logging the key material.
impl std::fmt::Debug for Controlee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        static REDACTED_STR: &str = "redacted";

        f.debug_struct("Controlee")
            .field("short_address", &self.short_address)
            .field("subsession_id", &REDACTED_STR)
            .field("subsession_key", &self.subsession_key.as_ref().map(|_| REDACTED_STR))
            .finish()
    }
}

impl Drop for Controlee {
    fn drop(&mut self) {
        self.subsession_id.zeroize();
        if let Some(key) = self.subsession_key.as_mut() {
            key.zeroize();
        }
    }
}

/// The status of one controlee in the multicast list update notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControleeStatus {
    /// The short MAC address of the controlee.
    pub mac_address: [u8; 2],
    /// The sub-session id of the controlee.
    pub subsession_id: SubSessionId,
    /// The status of the update.
    pub status: MulticastUpdateStatusCode,
}

/// The raw UCI message of the vendor notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVendorMessage {
    /// The group id of the message.
    pub gid: u32,
    /// The opcode of the message.
    pub oid: u32,
    /// The payload of the message.
    pub payload: Vec<u8>,
}

/// The response of a vendor UCI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorUciResponse {
    /// The status of the command.
    pub status: StatusCode,
    /// The group id of the response.
    pub gid: u32,
    /// The opcode of the response.
    pub oid: u32,
    /// The payload of the response.
    pub payload: Vec<u8>,
}

/// One slot of the data transfer phase configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTransferPhaseSlot {
    /// The MAC address of the device owning the slot.
    pub mac_address: Vec<u8>,
    /// The slot bitmap.
    pub slot_bitmap: Vec<u8>,
    /// Stop the data transfer of the device.
    pub stop_data_transfer: bool,
}

/// The data transfer phase configuration of a FiRa session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTransferPhaseConfig {
    /// The repetition count of the data transfer phase control message.
    pub dtpcm_repetition: u8,
    /// The data transfer control field.
    pub data_transfer_control: u8,
    /// The slot allocation.
    pub slots: Vec<DataTransferPhaseSlot>,
}

/// The phase of a hybrid session, configured by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerPhase {
    /// The session token of the secondary session running in this phase.
    pub session_token: SessionToken,
    /// The first slot index of the phase.
    pub start_slot_index: u16,
    /// The last slot index of the phase.
    pub end_slot_index: u16,
    /// The phase participation control.
    pub control: u8,
    /// The MAC address of the phase owner.
    pub mac_address: Vec<u8>,
}

/// The hybrid session configuration of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HybridControllerConfig {
    /// The message control field.
    pub message_control: u8,
    /// The phases of the hybrid session.
    pub phases: Vec<ControllerPhase>,
}

/// The hybrid session configuration of a controlee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HybridControleeConfig {
    /// The session tokens of the phases the controlee takes part in.
    pub phase_session_tokens: Vec<SessionToken>,
}

/// The response of the DT tag ranging rounds update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtTagRangingRoundsResponse {
    /// The status of the command.
    pub status: StatusCode,
    /// The indexes of the rounds that couldn't be applied.
    pub ranging_round_indexes: Vec<u8>,
}
