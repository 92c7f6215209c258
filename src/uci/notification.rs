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

//! This module defines the notifications reported by the native UWB stack.

use crate::params::fira_app_config_params::UwbAddress;
use crate::params::radar_app_config_params::{BitsPerSample, RadarDataType};
use crate::params::uci_packets::{
    ChipId, ControleeStatus, DataTransferNtfStatusCode, DeviceState, RawVendorMessage, SessionId,
    SessionState, StatusCode,
};

/// The union of the notifications of all the categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeNotification {
    /// CoreNotification equivalent.
    Core(CoreNotification),
    /// SessionNotification equivalent.
    Session(SessionNotification),
    /// The vendor notification.
    Vendor(RawVendorMessage),
    /// DataRcvNotification equivalent.
    DataRcv(DataRcvNotification),
    /// RadarDataRcvNotification equivalent.
    RadarDataRcv(RadarDataRcvNotification),
}

/// The notifications of the device, scoped by the chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreNotification {
    /// DeviceStatusNtf equivalent.
    DeviceStatus {
        /// The chip reporting the status.
        chip_id: ChipId,
        /// The new state of the device.
        state: DeviceState,
    },
    /// GenericError equivalent.
    GenericError {
        /// The chip reporting the error.
        chip_id: ChipId,
        /// The status code of the error.
        status: StatusCode,
    },
}

/// The notifications of the sessions. A session id is only unique on its chip, so each
/// notification names the chip reporting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotification {
    /// SessionStatusNtf equivalent.
    Status {
        /// The chip reporting the notification.
        chip_id: ChipId,
        /// SessionId : u32
        session_id: SessionId,
        /// The new state of the session.
        session_state: SessionState,
        /// The raw reason code. The known values are listed in ReasonCode.
        reason_code: u8,
    },
    /// SessionUpdateControllerMulticastListNtf equivalent.
    UpdateControllerMulticastList {
        /// The chip reporting the notification.
        chip_id: ChipId,
        /// SessionId : u32
        session_id: SessionId,
        /// The number of the free slots in the multicast list.
        remaining_multicast_list_size: usize,
        /// The status of each controlee in the update.
        status_list: Vec<ControleeStatus>,
    },
    /// The ranging result of a round.
    SessionInfo {
        /// The chip reporting the notification.
        chip_id: ChipId,
        /// The ranging result.
        range_data: SessionRangeData,
    },
    /// DataCreditNtf/DataTransferStatusNtf equivalent.
    DataTransferStatus {
        /// The chip reporting the notification.
        chip_id: ChipId,
        /// SessionId : u32
        session_id: SessionId,
        /// The sequence number of the data packet.
        uci_sequence_number: u16,
        /// The transfer status.
        status: DataTransferNtfStatusCode,
        /// The number of transmissions.
        tx_count: u8,
    },
    /// SessionDataTransferPhaseConfigNtf equivalent.
    DataTransferPhaseConfig {
        /// The chip reporting the notification.
        chip_id: ChipId,
        /// SessionId : u32
        session_id: SessionId,
        /// The raw status of the configuration. 0 means success.
        status: u8,
    },
}

/// The ranging result of one round of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRangeData {
    /// The sequence counter that starts with 0 when the session is started.
    pub sequence_number: u32,
    /// The identifier of the session.
    pub session_id: SessionId,
    /// The current ranging interval setting in the unit of ms.
    pub current_ranging_interval_ms: u32,
    /// The measurement of each peer.
    pub ranging_measurements: Vec<RangingMeasurement>,
}

/// The two way ranging measurement of one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangingMeasurement {
    /// The MAC address of the peer.
    pub mac_address: UwbAddress,
    /// The status of the measurement.
    pub status: StatusCode,
    /// The line of sight indication.
    pub nlos: u8,
    /// The distance in the unit of cm.
    pub distance_cm: u16,
    /// The azimuth angle in the Q9.7 format.
    pub aoa_azimuth: u16,
    /// The figure of merit of the azimuth angle.
    pub aoa_azimuth_fom: u8,
    /// The elevation angle in the Q9.7 format.
    pub aoa_elevation: u16,
    /// The figure of merit of the elevation angle.
    pub aoa_elevation_fom: u8,
    /// The RSSI in the unit of -dBm.
    pub rssi: u8,
}

/// The application data received from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRcvNotification {
    /// The chip receiving the data.
    pub chip_id: ChipId,
    /// The identifier of the session.
    pub session_id: SessionId,
    /// The status of the reception.
    pub status: StatusCode,
    /// The sequence number of the data packet.
    pub uci_sequence_num: u16,
    /// The MAC address of the sender.
    pub source_address: UwbAddress,
    /// The application payload.
    pub payload: Vec<u8>,
}

/// The radar sweeps reported for a radar session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarDataRcvNotification {
    /// The chip reporting the radar data.
    pub chip_id: ChipId,
    /// The identifier of the session.
    pub session_id: SessionId,
    /// The status of the radar data.
    pub status: StatusCode,
    /// The type of the radar data.
    pub radar_data_type: RadarDataType,
    /// The number of samples per sweep.
    pub samples_per_sweep: u8,
    /// The width of each sample.
    pub bits_per_sample: BitsPerSample,
    /// The offset of the first sample in the sweep.
    pub sweep_offset: u16,
    /// The sweeps.
    pub sweep_data: Vec<RadarSweepData>,
}

/// One sweep of the radar data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarSweepData {
    /// The counter of the sweep.
    pub sequence_number: u32,
    /// The timestamp of the sweep.
    pub timestamp: u32,
    /// The vendor specific data.
    pub vendor_specific_data: Vec<u8>,
    /// The raw samples.
    pub sample_data: Vec<u8>,
}
