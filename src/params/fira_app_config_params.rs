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

//! This module defines the UCI application config parameters for the FiRa ranging session.

use std::collections::{BTreeMap, HashSet};
use std::convert::{TryFrom, TryInto};

use log::{error, warn};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;
use zeroize::Zeroize;

use crate::error::{DecodeError, Error, Result};
use crate::params::app_config_params::{AppConfigParams, AppConfigTlvMap};
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::complex_channel::{hashed_session_id, UwbComplexChannel};
use crate::params::uci_packets::{
    AppConfigTlvType, SessionId, SessionState, SessionType, SubSessionId,
};
use crate::params::utils::{u16_to_bytes, u32_to_bytes, u8_to_bytes, validate};
use crate::utils::{builder_field, getter_field};

// The bundle versions: version 2 adds the suspend-ranging and the session key fields.
pub(super) const FIRA_BUNDLE_VERSION_1: i32 = 1;
pub(super) const FIRA_BUNDLE_VERSION_2: i32 = 2;
const FIRA_BUNDLE_VERSION_CURRENT: i32 = FIRA_BUNDLE_VERSION_2;

/// The maximal number of the controlees of a FiRa controller.
pub(crate) const MAX_NUMBER_OF_CONTROLEES: usize = 8;

const KEY_PROTOCOL_VERSION: &str = "protocol_version";
const KEY_SESSION_ID: &str = "session_id";
const KEY_SESSION_TYPE: &str = "session_type";
const KEY_DEVICE_TYPE: &str = "device_type";
const KEY_DEVICE_ROLE: &str = "device_role";
const KEY_RANGING_ROUND_USAGE: &str = "ranging_round_usage";
const KEY_MULTI_NODE_MODE: &str = "multi_node_mode";
const KEY_DEVICE_ADDRESS: &str = "device_address";
const KEY_DEST_ADDRESS_LIST: &str = "dest_address_list";
const KEY_CHANNEL_NUMBER: &str = "channel_number";
const KEY_PREAMBLE_CODE_INDEX: &str = "preamble_code_index";
const KEY_STS_CONFIG: &str = "sts_config";
const KEY_VENDOR_ID: &str = "vendor_id";
const KEY_STATIC_STS_IV: &str = "static_sts_iv";
const KEY_SUB_SESSION_ID: &str = "sub_session_id";
const KEY_SLOT_DURATION_RSTU: &str = "slot_duration_rstu";
const KEY_RANGING_INTERVAL_MS: &str = "ranging_interval_ms";
const KEY_SLOTS_PER_RR: &str = "slots_per_ranging_round";
const KEY_MAC_FCS_TYPE: &str = "mac_fcs_type";
const KEY_RANGING_ROUND_CONTROL: &str = "ranging_round_control";
const KEY_AOA_RESULT_REQUEST: &str = "aoa_result_request";
const KEY_RANGE_DATA_NTF_CONFIG: &str = "range_data_ntf_config";
const KEY_RANGE_DATA_NTF_PROXIMITY_NEAR: &str = "range_data_ntf_proximity_near";
const KEY_RANGE_DATA_NTF_PROXIMITY_FAR: &str = "range_data_ntf_proximity_far";
const KEY_RFRAME_CONFIG: &str = "rframe_config";
const KEY_PRF_MODE: &str = "prf_mode";
const KEY_SFD_ID: &str = "sfd_id";
const KEY_PSDU_DATA_RATE: &str = "psdu_data_rate";
const KEY_PREAMBLE_DURATION: &str = "preamble_duration";
const KEY_SCHEDULED_MODE: &str = "scheduled_mode";
const KEY_KEY_ROTATION: &str = "key_rotation";
const KEY_KEY_ROTATION_RATE: &str = "key_rotation_rate";
const KEY_SESSION_PRIORITY: &str = "session_priority";
const KEY_MAC_ADDRESS_MODE: &str = "mac_address_mode";
const KEY_MAX_RR_RETRY: &str = "max_rr_retry";
const KEY_UWB_INITIATION_TIME_MS: &str = "uwb_initiation_time_ms";
const KEY_HOPPING_MODE: &str = "hopping_mode";
const KEY_BLOCK_STRIDE_LENGTH: &str = "block_stride_length";
const KEY_RESULT_REPORT_CONFIG: &str = "result_report_config";
const KEY_IN_BAND_TERMINATION_ATTEMPT_COUNT: &str = "in_band_termination_attempt_count";
const KEY_STS_LENGTH: &str = "sts_length";
const KEY_SUSPEND_RANGING_ROUNDS: &str = "suspend_ranging_rounds";
const KEY_SESSION_KEY: &str = "session_key";
const KEY_SUB_SESSION_KEY: &str = "sub_session_key";

// The default value of each parameters.
const DEFAULT_PROTOCOL_VERSION: FiraProtocolVersion = FiraProtocolVersion { major: 1, minor: 1 };
const DEFAULT_SESSION_TYPE: SessionType = SessionType::FiraRangingSession;
const DEFAULT_RANGING_ROUND_USAGE: RangingRoundUsage = RangingRoundUsage::DsTwr;
const DEFAULT_STS_CONFIG: StsConfig = StsConfig::Static;
const DEFAULT_CHANNEL_NUMBER: UwbChannel = UwbChannel::Channel9;
const DEFAULT_SLOT_DURATION_RSTU: u16 = 2400;
const DEFAULT_RANGING_INTERVAL_MS: u32 = 200;
const DEFAULT_MAC_FCS_TYPE: MacFcsType = MacFcsType::Crc16;
const DEFAULT_RANGING_ROUND_CONTROL: RangingRoundControl = RangingRoundControl {
    ranging_result_report_message: true,
    control_message: true,
    measurement_report_message: false,
};
const DEFAULT_AOA_RESULT_REQUEST: AoaResultRequest = AoaResultRequest::ReqAoaResults;
const DEFAULT_RANGE_DATA_NTF_CONFIG: RangeDataNtfConfig = RangeDataNtfConfig::Enable;
const DEFAULT_RANGE_DATA_NTF_PROXIMITY_NEAR_CM: u16 = 0;
const DEFAULT_RANGE_DATA_NTF_PROXIMITY_FAR_CM: u16 = 20000;
const DEFAULT_RFRAME_CONFIG: RframeConfig = RframeConfig::SP3;
const DEFAULT_PREAMBLE_CODE_INDEX: u8 = 10;
const DEFAULT_SFD_ID: u8 = 2;
const DEFAULT_PSDU_DATA_RATE: PsduDataRate = PsduDataRate::Rate6m81;
const DEFAULT_PREAMBLE_DURATION: PreambleDuration = PreambleDuration::T64Symbols;
const DEFAULT_SLOTS_PER_RR: u8 = 25;
const DEFAULT_PRF_MODE: PrfMode = PrfMode::Bprf;
const DEFAULT_SCHEDULED_MODE: ScheduledMode = ScheduledMode::TimeScheduledRanging;
const DEFAULT_KEY_ROTATION: KeyRotation = KeyRotation::Disable;
const DEFAULT_KEY_ROTATION_RATE: u8 = 0;
const DEFAULT_SESSION_PRIORITY: u8 = 50;
const DEFAULT_MAC_ADDRESS_MODE: MacAddressMode = MacAddressMode::MacAddress2Bytes;
const DEFAULT_VENDOR_ID: [u8; 2] = [0, 0];
const DEFAULT_STATIC_STS_IV: [u8; 6] = [0; 6];
const DEFAULT_MAX_RR_RETRY: u16 = 0;
const DEFAULT_UWB_INITIATION_TIME_MS: u32 = 0;
const DEFAULT_HOPPING_MODE: HoppingMode = HoppingMode::Disable;
const DEFAULT_BLOCK_STRIDE_LENGTH: u8 = 0;
const DEFAULT_RESULT_REPORT_CONFIG: ResultReportConfig =
    ResultReportConfig { tof: true, aoa_azimuth: false, aoa_elevation: false, aoa_fom: false };
const DEFAULT_IN_BAND_TERMINATION_ATTEMPT_COUNT: u8 = 1;
const DEFAULT_SUB_SESSION_ID: u32 = 0;
const DEFAULT_STS_LENGTH: StsLength = StsLength::Length64;
const DEFAULT_SUSPEND_RANGING_ROUNDS: SuspendRanging = SuspendRanging::Disabled;

/// The FiRa's application configuration parameters of a ranging session.
/// Ref: FiRa Consortium UWB Command Interface Generic Technical Specification Version 2.0.0.
#[derive(Clone, PartialEq, Eq)]
pub struct FiraAppConfigParams {
    protocol_version: FiraProtocolVersion,
    session_id: SessionId,
    session_type: SessionType,
    device_type: DeviceType,
    device_role: DeviceRole,
    ranging_round_usage: RangingRoundUsage,
    multi_node_mode: MultiNodeMode,
    device_mac_address: UwbAddress,
    dst_mac_address: Vec<UwbAddress>,
    channel_number: UwbChannel,
    preamble_code_index: u8,
    sts_config: StsConfig,
    vendor_id: [u8; 2],
    static_sts_iv: [u8; 6],
    sub_session_id: SubSessionId,
    session_key: Option<Vec<u8>>,
    sub_session_key: Option<Vec<u8>>,
    slot_duration_rstu: u16,
    ranging_interval_ms: u32,
    slots_per_rr: u8,
    mac_fcs_type: MacFcsType,
    ranging_round_control: RangingRoundControl,
    aoa_result_request: AoaResultRequest,
    range_data_ntf_config: RangeDataNtfConfig,
    range_data_ntf_proximity_near_cm: u16,
    range_data_ntf_proximity_far_cm: u16,
    rframe_config: RframeConfig,
    prf_mode: PrfMode,
    sfd_id: u8,
    psdu_data_rate: PsduDataRate,
    preamble_duration: PreambleDuration,
    scheduled_mode: ScheduledMode,
    key_rotation: KeyRotation,
    key_rotation_rate: u8,
    session_priority: u8,
    mac_address_mode: MacAddressMode,
    max_rr_retry: u16,
    uwb_initiation_time_ms: u32,
    hopping_mode: HoppingMode,
    block_stride_length: u8,
    result_report_config: ResultReportConfig,
    in_band_termination_attempt_count: u8,
    sts_length: StsLength,
    suspend_ranging_rounds: SuspendRanging,
}

/// Explicitly implement Debug trait to prevent logging PII data.
impl std::fmt::Debug for FiraAppConfigParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        static REDACTED_STR: &str = "redacted";

        f.debug_struct("FiraAppConfigParams")
            .field("protocol_version", &self.protocol_version)
            .field("session_id", &self.session_id)
            .field("session_type", &self.session_type)
            .field("device_type", &self.device_type)
            .field("device_role", &self.device_role)
            .field("ranging_round_usage", &self.ranging_round_usage)
            .field("multi_node_mode", &self.multi_node_mode)
            .field("device_mac_address", &self.device_mac_address)
            .field("dst_mac_address", &self.dst_mac_address)
            .field("channel_number", &self.channel_number)
            .field("preamble_code_index", &self.preamble_code_index)
            .field("sts_config", &self.sts_config)
            .field("vendor_id", &REDACTED_STR) // vendor_id field is PII.
            .field("static_sts_iv", &REDACTED_STR) // static_sts_iv field is PII.
            .field("sub_session_id", &REDACTED_STR)
            .field("session_key", &self.session_key.as_ref().map(|_| REDACTED_STR))
            .field("sub_session_key", &self.sub_session_key.as_ref().map(|_| REDACTED_STR))
            .field("slot_duration_rstu", &self.slot_duration_rstu)
            .field("ranging_interval_ms", &self.ranging_interval_ms)
            .field("slots_per_rr", &self.slots_per_rr)
            .field("mac_fcs_type", &self.mac_fcs_type)
            .field("ranging_round_control", &self.ranging_round_control)
            .field("aoa_result_request", &self.aoa_result_request)
            .field("range_data_ntf_config", &self.range_data_ntf_config)
            .field("range_data_ntf_proximity_near_cm", &self.range_data_ntf_proximity_near_cm)
            .field("range_data_ntf_proximity_far_cm", &self.range_data_ntf_proximity_far_cm)
            .field("rframe_config", &self.rframe_config)
            .field("prf_mode", &self.prf_mode)
            .field("sfd_id", &self.sfd_id)
            .field("psdu_data_rate", &self.psdu_data_rate)
            .field("preamble_duration", &self.preamble_duration)
            .field("scheduled_mode", &self.scheduled_mode)
            .field("key_rotation", &self.key_rotation)
            .field("key_rotation_rate", &self.key_rotation_rate)
            .field("session_priority", &self.session_priority)
            .field("mac_address_mode", &self.mac_address_mode)
            .field("max_rr_retry", &self.max_rr_retry)
            .field("uwb_initiation_time_ms", &self.uwb_initiation_time_ms)
            .field("hopping_mode", &self.hopping_mode)
            .field("block_stride_length", &self.block_stride_length)
            .field("result_report_config", &self.result_report_config)
            .field("in_band_termination_attempt_count", &self.in_band_termination_attempt_count)
            .field("sts_length", &self.sts_length)
            .field("suspend_ranging_rounds", &self.suspend_ranging_rounds)
            .finish()
    }
}

impl Drop for FiraAppConfigParams {
    fn drop(&mut self) {
        self.vendor_id.zeroize();
        self.static_sts_iv.zeroize();
        self.sub_session_id.zeroize();
        if let Some(key) = self.session_key.as_mut() {
            key.zeroize();
        }
        if let Some(key) = self.sub_session_key.as_mut() {
            key.zeroize();
        }
    }
}

#[allow(missing_docs)]
impl FiraAppConfigParams {
    // Generate the getter methods for all the fields.
    getter_field!(protocol_version, FiraProtocolVersion);
    getter_field!(session_id, SessionId);
    getter_field!(session_type, SessionType);
    getter_field!(device_type, DeviceType);
    getter_field!(device_role, DeviceRole);
    getter_field!(ranging_round_usage, RangingRoundUsage);
    getter_field!(multi_node_mode, MultiNodeMode);
    getter_field!(device_mac_address, UwbAddress);
    getter_field!(dst_mac_address, Vec<UwbAddress>);
    getter_field!(channel_number, UwbChannel);
    getter_field!(preamble_code_index, u8);
    getter_field!(sts_config, StsConfig);
    getter_field!(vendor_id, [u8; 2]);
    getter_field!(static_sts_iv, [u8; 6]);
    getter_field!(sub_session_id, SubSessionId);
    getter_field!(session_key, Option<Vec<u8>>);
    getter_field!(sub_session_key, Option<Vec<u8>>);
    getter_field!(slot_duration_rstu, u16);
    getter_field!(ranging_interval_ms, u32);
    getter_field!(slots_per_rr, u8);
    getter_field!(mac_fcs_type, MacFcsType);
    getter_field!(ranging_round_control, RangingRoundControl);
    getter_field!(aoa_result_request, AoaResultRequest);
    getter_field!(range_data_ntf_config, RangeDataNtfConfig);
    getter_field!(range_data_ntf_proximity_near_cm, u16);
    getter_field!(range_data_ntf_proximity_far_cm, u16);
    getter_field!(rframe_config, RframeConfig);
    getter_field!(prf_mode, PrfMode);
    getter_field!(sfd_id, u8);
    getter_field!(psdu_data_rate, PsduDataRate);
    getter_field!(preamble_duration, PreambleDuration);
    getter_field!(scheduled_mode, ScheduledMode);
    getter_field!(key_rotation, KeyRotation);
    getter_field!(key_rotation_rate, u8);
    getter_field!(session_priority, u8);
    getter_field!(mac_address_mode, MacAddressMode);
    getter_field!(max_rr_retry, u16);
    getter_field!(uwb_initiation_time_ms, u32);
    getter_field!(hopping_mode, HoppingMode);
    getter_field!(block_stride_length, u8);
    getter_field!(result_report_config, ResultReportConfig);
    getter_field!(in_band_termination_attempt_count, u8);
    getter_field!(sts_length, StsLength);
    getter_field!(suspend_ranging_rounds, SuspendRanging);

    /// validate if the params are valid.
    fn is_valid(&self) -> Option<()> {
        if self.device_type == DeviceType::Controlee {
            if self.ranging_round_control.ranging_result_report_message {
                warn!("The RRRM bit is ignored by a controlee");
            }
            if self.ranging_round_control.measurement_report_message {
                warn!("The MRM bit is ignored by a controlee");
            }
        }

        let is_short_address = self.mac_address_mode == MacAddressMode::MacAddress2Bytes;
        validate(
            self.device_mac_address.is_short() == is_short_address,
            "device_mac_address doesn't match with mac_address_mode",
        )?;
        validate(
            self.dst_mac_address.iter().all(|addr| addr.is_short() == is_short_address),
            "dst_mac_address doesn't match with mac_address_mode",
        )?;
        if self.multi_node_mode == MultiNodeMode::Unicast {
            validate(
                self.dst_mac_address.len() == 1,
                "dst_mac_address should contain exactly one address in unicast mode",
            )?;
        }
        validate(
            self.dst_mac_address.len() <= MAX_NUMBER_OF_CONTROLEES,
            "Number of controlees should be at most 8",
        )?;

        let preamble_range = match self.prf_mode {
            PrfMode::Bprf => 9..=12,
            _ => 25..=32,
        };
        validate(
            preamble_range.contains(&self.preamble_code_index),
            "preamble_code_index doesn't match with prf_mode",
        )?;
        validate(
            self.range_data_ntf_proximity_near_cm <= self.range_data_ntf_proximity_far_cm,
            "range_data_ntf_proximity_near_cm should not be greater than the far one",
        )?;
        validate(
            (1..=100).contains(&self.session_priority),
            "session_priority should be between 1 to 100",
        )?;
        validate(
            (1..=10).contains(&self.in_band_termination_attempt_count),
            "in_band_termination_attempt_count should be between 1 to 10",
        )?;
        let keys = [(&self.session_key, "session_key"), (&self.sub_session_key, "sub_session_key")];
        for (key, name) in keys {
            if let Some(key) = key {
                validate(
                    key.len() == 16 || key.len() == 32,
                    &format!("{} should be 16 or 32 bytes", name),
                )?;
            }
        }
        if self.sts_config.uses_individual_key() && self.device_type == DeviceType::Controlee {
            validate(
                self.sub_session_id != DEFAULT_SUB_SESSION_ID,
                "sub_session_id is required by the individual key STS modes",
            )?;
        }

        Some(())
    }

    /// Determine if the |config_map| is updatable in the state |session_state|.
    pub fn is_config_updatable(config_map: &AppConfigTlvMap, session_state: SessionState) -> bool {
        match session_state {
            SessionState::SessionStateActive => {
                let available_list = HashSet::from([
                    AppConfigTlvType::RangingDuration,
                    AppConfigTlvType::RngDataNtf,
                    AppConfigTlvType::RngDataNtfProximityNear,
                    AppConfigTlvType::RngDataNtfProximityFar,
                    AppConfigTlvType::BlockStrideLength,
                    AppConfigTlvType::SuspendRangingRounds,
                ]);
                config_map.keys().all(|key| available_list.contains(key))
            }
            SessionState::SessionStateIdle => true,
            _ => false,
        }
    }

    /// Generate the AppConfigTlv map from the FiraAppConfigParams instance.
    pub fn generate_config_map(&self) -> AppConfigTlvMap {
        debug_assert!(self.is_valid().is_some());

        let mut config_map = BTreeMap::from([
            (AppConfigTlvType::DeviceType, u8_to_bytes(self.device_type as u8)),
            (AppConfigTlvType::RangingRoundUsage, u8_to_bytes(self.ranging_round_usage as u8)),
            (AppConfigTlvType::StsConfig, u8_to_bytes(self.sts_config as u8)),
            (AppConfigTlvType::MultiNodeMode, u8_to_bytes(self.multi_node_mode as u8)),
            (AppConfigTlvType::ChannelNumber, u8_to_bytes(self.channel_number as u8)),
            (AppConfigTlvType::NumberOfControlees, u8_to_bytes(self.dst_mac_address.len() as u8)),
            (AppConfigTlvType::DeviceMacAddress, self.device_mac_address.clone().into()),
            (AppConfigTlvType::DstMacAddress, addresses_to_bytes(&self.dst_mac_address)),
            (AppConfigTlvType::SlotDuration, u16_to_bytes(self.slot_duration_rstu)),
            (AppConfigTlvType::RangingDuration, u32_to_bytes(self.ranging_interval_ms)),
            (AppConfigTlvType::MacFcsType, u8_to_bytes(self.mac_fcs_type as u8)),
            (
                AppConfigTlvType::RangingRoundControl,
                u8_to_bytes(self.ranging_round_control.as_u8()),
            ),
            (AppConfigTlvType::AoaResultReq, u8_to_bytes(self.aoa_result_request as u8)),
            (AppConfigTlvType::RngDataNtf, u8_to_bytes(self.range_data_ntf_config as u8)),
            (
                AppConfigTlvType::RngDataNtfProximityNear,
                u16_to_bytes(self.range_data_ntf_proximity_near_cm),
            ),
            (
                AppConfigTlvType::RngDataNtfProximityFar,
                u16_to_bytes(self.range_data_ntf_proximity_far_cm),
            ),
            (AppConfigTlvType::DeviceRole, u8_to_bytes(self.device_role as u8)),
            (AppConfigTlvType::RframeConfig, u8_to_bytes(self.rframe_config as u8)),
            (AppConfigTlvType::PreambleCodeIndex, u8_to_bytes(self.preamble_code_index)),
            (AppConfigTlvType::SfdId, u8_to_bytes(self.sfd_id)),
            (AppConfigTlvType::PsduDataRate, u8_to_bytes(self.psdu_data_rate as u8)),
            (AppConfigTlvType::PreambleDuration, u8_to_bytes(self.preamble_duration as u8)),
            (AppConfigTlvType::SlotsPerRr, u8_to_bytes(self.slots_per_rr)),
            (AppConfigTlvType::PrfMode, u8_to_bytes(self.prf_mode as u8)),
            (AppConfigTlvType::ScheduledMode, u8_to_bytes(self.scheduled_mode as u8)),
            (AppConfigTlvType::KeyRotation, u8_to_bytes(self.key_rotation as u8)),
            (AppConfigTlvType::KeyRotationRate, u8_to_bytes(self.key_rotation_rate)),
            (AppConfigTlvType::SessionPriority, u8_to_bytes(self.session_priority)),
            (AppConfigTlvType::MacAddressMode, u8_to_bytes(self.mac_address_mode as u8)),
            (AppConfigTlvType::MaxRrRetry, u16_to_bytes(self.max_rr_retry)),
            (AppConfigTlvType::UwbInitiationTime, u32_to_bytes(self.uwb_initiation_time_ms)),
            (AppConfigTlvType::HoppingMode, u8_to_bytes(self.hopping_mode as u8)),
            (AppConfigTlvType::BlockStrideLength, u8_to_bytes(self.block_stride_length)),
            (AppConfigTlvType::ResultReportConfig, u8_to_bytes(self.result_report_config.as_u8())),
            (
                AppConfigTlvType::InBandTerminationAttemptCount,
                u8_to_bytes(self.in_band_termination_attempt_count),
            ),
            (AppConfigTlvType::StsLength, u8_to_bytes(self.sts_length as u8)),
            (
                AppConfigTlvType::SuspendRangingRounds,
                u8_to_bytes(self.suspend_ranging_rounds as u8),
            ),
        ]);

        // The key material is only meaningful for the matching STS modes.
        if self.sts_config == StsConfig::Static {
            config_map.insert(AppConfigTlvType::VendorId, self.vendor_id.to_vec());
            config_map.insert(AppConfigTlvType::StaticStsIv, self.static_sts_iv.to_vec());
        }
        if self.sts_config.uses_individual_key() {
            config_map.insert(AppConfigTlvType::SubSessionId, u32_to_bytes(self.sub_session_id));
        }
        if let Some(key) = self.session_key.as_ref() {
            config_map.insert(AppConfigTlvType::SessionKey, key.clone());
        }
        if let Some(key) = self.sub_session_key.as_ref() {
            config_map.insert(AppConfigTlvType::SubsessionKey, key.clone());
        }
        config_map
    }

    /// Write the params into a bundle of the current version.
    pub fn to_bundle(&self) -> Bundle {
        let mut bundle = Bundle::with_header(ProtocolName::Fira, FIRA_BUNDLE_VERSION_CURRENT);
        bundle
            .put_string(KEY_PROTOCOL_VERSION, self.protocol_version.to_string())
            .put_long(KEY_SESSION_ID, self.session_id as i64)
            .put_int(KEY_SESSION_TYPE, self.session_type as i32)
            .put_int(KEY_DEVICE_TYPE, self.device_type as i32)
            .put_int(KEY_DEVICE_ROLE, self.device_role as i32)
            .put_int(KEY_RANGING_ROUND_USAGE, self.ranging_round_usage as i32)
            .put_int(KEY_MULTI_NODE_MODE, self.multi_node_mode as i32)
            .put_bytes(KEY_DEVICE_ADDRESS, self.device_mac_address.clone().into())
            .put_bytes(KEY_DEST_ADDRESS_LIST, addresses_to_bytes(&self.dst_mac_address))
            .put_int(KEY_CHANNEL_NUMBER, self.channel_number as i32)
            .put_int(KEY_PREAMBLE_CODE_INDEX, self.preamble_code_index as i32)
            .put_int(KEY_STS_CONFIG, self.sts_config as i32)
            .put_bytes(KEY_VENDOR_ID, self.vendor_id.to_vec())
            .put_bytes(KEY_STATIC_STS_IV, self.static_sts_iv.to_vec())
            .put_long(KEY_SUB_SESSION_ID, self.sub_session_id as i64)
            .put_int(KEY_SLOT_DURATION_RSTU, self.slot_duration_rstu as i32)
            .put_long(KEY_RANGING_INTERVAL_MS, self.ranging_interval_ms as i64)
            .put_int(KEY_SLOTS_PER_RR, self.slots_per_rr as i32)
            .put_int(KEY_MAC_FCS_TYPE, self.mac_fcs_type as i32)
            .put_int(KEY_RANGING_ROUND_CONTROL, self.ranging_round_control.as_u8() as i32)
            .put_int(KEY_AOA_RESULT_REQUEST, self.aoa_result_request as i32)
            .put_int(KEY_RANGE_DATA_NTF_CONFIG, self.range_data_ntf_config as i32)
            .put_int(
                KEY_RANGE_DATA_NTF_PROXIMITY_NEAR,
                self.range_data_ntf_proximity_near_cm as i32,
            )
            .put_int(KEY_RANGE_DATA_NTF_PROXIMITY_FAR, self.range_data_ntf_proximity_far_cm as i32)
            .put_int(KEY_RFRAME_CONFIG, self.rframe_config as i32)
            .put_int(KEY_PRF_MODE, self.prf_mode as i32)
            .put_int(KEY_SFD_ID, self.sfd_id as i32)
            .put_int(KEY_PSDU_DATA_RATE, self.psdu_data_rate as i32)
            .put_int(KEY_PREAMBLE_DURATION, self.preamble_duration as i32)
            .put_int(KEY_SCHEDULED_MODE, self.scheduled_mode as i32)
            .put_int(KEY_KEY_ROTATION, self.key_rotation as i32)
            .put_int(KEY_KEY_ROTATION_RATE, self.key_rotation_rate as i32)
            .put_int(KEY_SESSION_PRIORITY, self.session_priority as i32)
            .put_int(KEY_MAC_ADDRESS_MODE, self.mac_address_mode as i32)
            .put_int(KEY_MAX_RR_RETRY, self.max_rr_retry as i32)
            .put_long(KEY_UWB_INITIATION_TIME_MS, self.uwb_initiation_time_ms as i64)
            .put_int(KEY_HOPPING_MODE, self.hopping_mode as i32)
            .put_int(KEY_BLOCK_STRIDE_LENGTH, self.block_stride_length as i32)
            .put_int(KEY_RESULT_REPORT_CONFIG, self.result_report_config.as_u8() as i32)
            .put_int(
                KEY_IN_BAND_TERMINATION_ATTEMPT_COUNT,
                self.in_band_termination_attempt_count as i32,
            )
            .put_int(KEY_STS_LENGTH, self.sts_length as i32)
            .put_int(KEY_SUSPEND_RANGING_ROUNDS, self.suspend_ranging_rounds as i32);
        if let Some(key) = self.session_key.as_ref() {
            bundle.put_bytes(KEY_SESSION_KEY, key.clone());
        }
        if let Some(key) = self.sub_session_key.as_ref() {
            bundle.put_bytes(KEY_SUB_SESSION_KEY, key.clone());
        }
        bundle
    }

    /// Read the params from a bundle. The keys absent from the bundle take the default values.
    pub fn from_bundle(bundle: &Bundle) -> Result<AppConfigParams> {
        let version = bundle
            .check_header(ProtocolName::Fira, &[FIRA_BUNDLE_VERSION_1, FIRA_BUNDLE_VERSION_2])?;
        let builder = match version {
            FIRA_BUNDLE_VERSION_1 => Self::parse_version_1(bundle)?,
            FIRA_BUNDLE_VERSION_2 => Self::parse_version_2(bundle)?,
            _ => return Err(DecodeError::InvalidBundleVersion(version).into()),
        };
        builder.build().ok_or_else(|| {
            error!("The FiRa bundle contains invalid parameters");
            Error::IllegalArgument
        })
    }

    fn parse_version_1(
        bundle: &Bundle,
    ) -> std::result::Result<FiraAppConfigParamsBuilder, DecodeError> {
        let mac_address_mode = bundle
            .get_opt(KEY_MAC_ADDRESS_MODE, Bundle::get_enum)?
            .unwrap_or(DEFAULT_MAC_ADDRESS_MODE);
        let mut builder = FiraAppConfigParamsBuilder::new();
        builder
            .device_type(bundle.get_enum(KEY_DEVICE_TYPE)?)
            .device_role(bundle.get_enum(KEY_DEVICE_ROLE)?)
            .multi_node_mode(bundle.get_enum(KEY_MULTI_NODE_MODE)?)
            .mac_address_mode(mac_address_mode)
            .device_mac_address(
                UwbAddress::try_from(bundle.get_bytes(KEY_DEVICE_ADDRESS)?).map_err(|_| {
                    DecodeError::InvalidValue { key: KEY_DEVICE_ADDRESS.to_string() }
                })?,
            )
            .dst_mac_address(bytes_to_addresses(
                &bundle.get_bytes(KEY_DEST_ADDRESS_LIST)?,
                mac_address_mode,
            )
            .ok_or_else(|| DecodeError::InvalidValue { key: KEY_DEST_ADDRESS_LIST.to_string() })?);

        if let Some(version) = bundle.get_opt(KEY_PROTOCOL_VERSION, Bundle::get_string)? {
            builder.protocol_version(version.parse()?);
        }
        if let Some(v) = bundle.get_opt(KEY_SESSION_TYPE, Bundle::get_enum)? {
            builder.session_type(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RANGING_ROUND_USAGE, Bundle::get_enum)? {
            builder.ranging_round_usage(v);
        }
        if let Some(v) = bundle.get_opt(KEY_CHANNEL_NUMBER, Bundle::get_enum)? {
            builder.channel_number(v);
        }
        if let Some(v) = bundle.get_opt(KEY_PREAMBLE_CODE_INDEX, Bundle::get_uint)? {
            builder.preamble_code_index(v);
        }
        if let Some(v) = bundle.get_opt(KEY_STS_CONFIG, Bundle::get_enum)? {
            builder.sts_config(v);
        }
        if let Some(v) = bundle.get_opt(KEY_VENDOR_ID, Bundle::get_bytes)? {
            builder.vendor_id(fixed_bytes(KEY_VENDOR_ID, v)?);
        }
        if let Some(v) = bundle.get_opt(KEY_STATIC_STS_IV, Bundle::get_bytes)? {
            builder.static_sts_iv(fixed_bytes(KEY_STATIC_STS_IV, v)?);
        }
        if let Some(v) = bundle.get_opt(KEY_SUB_SESSION_ID, Bundle::get_uint)? {
            builder.sub_session_id(v);
        }
        if let Some(v) = bundle.get_opt(KEY_SLOT_DURATION_RSTU, Bundle::get_uint)? {
            builder.slot_duration_rstu(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RANGING_INTERVAL_MS, Bundle::get_uint)? {
            builder.ranging_interval_ms(v);
        }
        if let Some(v) = bundle.get_opt(KEY_SLOTS_PER_RR, Bundle::get_uint)? {
            builder.slots_per_rr(v);
        }
        if let Some(v) = bundle.get_opt(KEY_MAC_FCS_TYPE, Bundle::get_enum)? {
            builder.mac_fcs_type(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RANGING_ROUND_CONTROL, Bundle::get_uint)? {
            builder.ranging_round_control(RangingRoundControl::from_u8(v));
        }
        if let Some(v) = bundle.get_opt(KEY_AOA_RESULT_REQUEST, Bundle::get_enum)? {
            builder.aoa_result_request(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RANGE_DATA_NTF_CONFIG, Bundle::get_enum)? {
            builder.range_data_ntf_config(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RANGE_DATA_NTF_PROXIMITY_NEAR, Bundle::get_uint)? {
            builder.range_data_ntf_proximity_near_cm(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RANGE_DATA_NTF_PROXIMITY_FAR, Bundle::get_uint)? {
            builder.range_data_ntf_proximity_far_cm(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RFRAME_CONFIG, Bundle::get_enum)? {
            builder.rframe_config(v);
        }
        if let Some(v) = bundle.get_opt(KEY_PRF_MODE, Bundle::get_enum)? {
            builder.prf_mode(v);
        }
        if let Some(v) = bundle.get_opt(KEY_SFD_ID, Bundle::get_uint)? {
            builder.sfd_id(v);
        }
        if let Some(v) = bundle.get_opt(KEY_PSDU_DATA_RATE, Bundle::get_enum)? {
            builder.psdu_data_rate(v);
        }
        if let Some(v) = bundle.get_opt(KEY_PREAMBLE_DURATION, Bundle::get_enum)? {
            builder.preamble_duration(v);
        }
        if let Some(v) = bundle.get_opt(KEY_SCHEDULED_MODE, Bundle::get_enum)? {
            builder.scheduled_mode(v);
        }
        if let Some(v) = bundle.get_opt(KEY_KEY_ROTATION, Bundle::get_enum)? {
            builder.key_rotation(v);
        }
        if let Some(v) = bundle.get_opt(KEY_KEY_ROTATION_RATE, Bundle::get_uint)? {
            builder.key_rotation_rate(v);
        }
        if let Some(v) = bundle.get_opt(KEY_SESSION_PRIORITY, Bundle::get_uint)? {
            builder.session_priority(v);
        }
        if let Some(v) = bundle.get_opt(KEY_MAX_RR_RETRY, Bundle::get_uint)? {
            builder.max_rr_retry(v);
        }
        if let Some(v) = bundle.get_opt(KEY_UWB_INITIATION_TIME_MS, Bundle::get_uint)? {
            builder.uwb_initiation_time_ms(v);
        }
        if let Some(v) = bundle.get_opt(KEY_HOPPING_MODE, Bundle::get_enum)? {
            builder.hopping_mode(v);
        }
        if let Some(v) = bundle.get_opt(KEY_BLOCK_STRIDE_LENGTH, Bundle::get_uint)? {
            builder.block_stride_length(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RESULT_REPORT_CONFIG, Bundle::get_uint)? {
            builder.result_report_config(ResultReportConfig::from_u8(v));
        }
        if let Some(v) = bundle.get_opt(KEY_IN_BAND_TERMINATION_ATTEMPT_COUNT, Bundle::get_uint)? {
            builder.in_band_termination_attempt_count(v);
        }
        if let Some(v) = bundle.get_opt(KEY_STS_LENGTH, Bundle::get_enum)? {
            builder.sts_length(v);
        }

        match bundle.get_opt(KEY_SESSION_ID, Bundle::get_uint)? {
            Some(session_id) => {
                builder.session_id(session_id);
            }
            // A controller may leave the session id to be derived from its complex channel.
            None if builder.device_type == Some(DeviceType::Controller) => {
                let channel = UwbComplexChannel::new(
                    builder.channel_number as u8,
                    builder.preamble_code_index,
                )
                .ok_or_else(|| DecodeError::InvalidValue {
                    key: KEY_PREAMBLE_CODE_INDEX.to_string(),
                })?;
                let address: Vec<u8> =
                    builder.device_mac_address.clone().map(Into::into).unwrap_or_default();
                builder.session_id(hashed_session_id(&address, &channel));
            }
            None => return Err(DecodeError::MissingKey(KEY_SESSION_ID.to_string())),
        }
        Ok(builder)
    }

    fn parse_version_2(
        bundle: &Bundle,
    ) -> std::result::Result<FiraAppConfigParamsBuilder, DecodeError> {
        let mut builder = Self::parse_version_1(bundle)?;
        if let Some(v) = bundle.get_opt(KEY_SUSPEND_RANGING_ROUNDS, Bundle::get_enum)? {
            builder.suspend_ranging_rounds(v);
        }
        if let Some(v) = bundle.get_opt(KEY_SESSION_KEY, Bundle::get_bytes)? {
            builder.session_key(v);
        }
        if let Some(v) = bundle.get_opt(KEY_SUB_SESSION_KEY, Bundle::get_bytes)? {
            builder.sub_session_key(v);
        }
        Ok(builder)
    }
}

fn fixed_bytes<const N: usize>(
    key: &str,
    value: Vec<u8>,
) -> std::result::Result<[u8; N], DecodeError> {
    value.try_into().map_err(|_| DecodeError::InvalidValue { key: key.to_string() })
}

/// The builder pattern for the FiraAppConfigParams.
pub struct FiraAppConfigParamsBuilder {
    protocol_version: FiraProtocolVersion,
    session_id: Option<SessionId>,
    session_type: SessionType,
    device_type: Option<DeviceType>,
    device_role: Option<DeviceRole>,
    ranging_round_usage: RangingRoundUsage,
    multi_node_mode: Option<MultiNodeMode>,
    device_mac_address: Option<UwbAddress>,
    dst_mac_address: Vec<UwbAddress>,
    channel_number: UwbChannel,
    preamble_code_index: u8,
    sts_config: StsConfig,
    vendor_id: [u8; 2],
    static_sts_iv: [u8; 6],
    sub_session_id: SubSessionId,
    session_key: Option<Vec<u8>>,
    sub_session_key: Option<Vec<u8>>,
    slot_duration_rstu: u16,
    ranging_interval_ms: u32,
    slots_per_rr: u8,
    mac_fcs_type: MacFcsType,
    ranging_round_control: RangingRoundControl,
    aoa_result_request: AoaResultRequest,
    range_data_ntf_config: RangeDataNtfConfig,
    range_data_ntf_proximity_near_cm: u16,
    range_data_ntf_proximity_far_cm: u16,
    rframe_config: RframeConfig,
    prf_mode: PrfMode,
    sfd_id: u8,
    psdu_data_rate: PsduDataRate,
    preamble_duration: PreambleDuration,
    scheduled_mode: ScheduledMode,
    key_rotation: KeyRotation,
    key_rotation_rate: u8,
    session_priority: u8,
    mac_address_mode: MacAddressMode,
    max_rr_retry: u16,
    uwb_initiation_time_ms: u32,
    hopping_mode: HoppingMode,
    block_stride_length: u8,
    result_report_config: ResultReportConfig,
    in_band_termination_attempt_count: u8,
    sts_length: StsLength,
    suspend_ranging_rounds: SuspendRanging,
}

#[allow(clippy::new_without_default)]
#[allow(missing_docs)]
impl FiraAppConfigParamsBuilder {
    /// Fill the default value of each field if exists, otherwise put None.
    pub fn new() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            session_id: None,
            session_type: DEFAULT_SESSION_TYPE,
            device_type: None,
            device_role: None,
            ranging_round_usage: DEFAULT_RANGING_ROUND_USAGE,
            multi_node_mode: None,
            device_mac_address: None,
            dst_mac_address: vec![],
            channel_number: DEFAULT_CHANNEL_NUMBER,
            preamble_code_index: DEFAULT_PREAMBLE_CODE_INDEX,
            sts_config: DEFAULT_STS_CONFIG,
            vendor_id: DEFAULT_VENDOR_ID,
            static_sts_iv: DEFAULT_STATIC_STS_IV,
            sub_session_id: DEFAULT_SUB_SESSION_ID,
            session_key: None,
            sub_session_key: None,
            slot_duration_rstu: DEFAULT_SLOT_DURATION_RSTU,
            ranging_interval_ms: DEFAULT_RANGING_INTERVAL_MS,
            slots_per_rr: DEFAULT_SLOTS_PER_RR,
            mac_fcs_type: DEFAULT_MAC_FCS_TYPE,
            ranging_round_control: DEFAULT_RANGING_ROUND_CONTROL,
            aoa_result_request: DEFAULT_AOA_RESULT_REQUEST,
            range_data_ntf_config: DEFAULT_RANGE_DATA_NTF_CONFIG,
            range_data_ntf_proximity_near_cm: DEFAULT_RANGE_DATA_NTF_PROXIMITY_NEAR_CM,
            range_data_ntf_proximity_far_cm: DEFAULT_RANGE_DATA_NTF_PROXIMITY_FAR_CM,
            rframe_config: DEFAULT_RFRAME_CONFIG,
            prf_mode: DEFAULT_PRF_MODE,
            sfd_id: DEFAULT_SFD_ID,
            psdu_data_rate: DEFAULT_PSDU_DATA_RATE,
            preamble_duration: DEFAULT_PREAMBLE_DURATION,
            scheduled_mode: DEFAULT_SCHEDULED_MODE,
            key_rotation: DEFAULT_KEY_ROTATION,
            key_rotation_rate: DEFAULT_KEY_ROTATION_RATE,
            session_priority: DEFAULT_SESSION_PRIORITY,
            mac_address_mode: DEFAULT_MAC_ADDRESS_MODE,
            max_rr_retry: DEFAULT_MAX_RR_RETRY,
            uwb_initiation_time_ms: DEFAULT_UWB_INITIATION_TIME_MS,
            hopping_mode: DEFAULT_HOPPING_MODE,
            block_stride_length: DEFAULT_BLOCK_STRIDE_LENGTH,
            result_report_config: DEFAULT_RESULT_REPORT_CONFIG,
            in_band_termination_attempt_count: DEFAULT_IN_BAND_TERMINATION_ATTEMPT_COUNT,
            sts_length: DEFAULT_STS_LENGTH,
            suspend_ranging_rounds: DEFAULT_SUSPEND_RANGING_ROUNDS,
        }
    }

    pub fn from_params(params: &AppConfigParams) -> Option<Self> {
        match params {
            AppConfigParams::Fira(params) => Some(Self {
                protocol_version: params.protocol_version.clone(),
                session_id: Some(params.session_id),
                session_type: params.session_type,
                device_type: Some(params.device_type),
                device_role: Some(params.device_role),
                ranging_round_usage: params.ranging_round_usage,
                multi_node_mode: Some(params.multi_node_mode),
                device_mac_address: Some(params.device_mac_address.clone()),
                dst_mac_address: params.dst_mac_address.clone(),
                channel_number: params.channel_number,
                preamble_code_index: params.preamble_code_index,
                sts_config: params.sts_config,
                vendor_id: params.vendor_id,
                static_sts_iv: params.static_sts_iv,
                sub_session_id: params.sub_session_id,
                session_key: params.session_key.clone(),
                sub_session_key: params.sub_session_key.clone(),
                slot_duration_rstu: params.slot_duration_rstu,
                ranging_interval_ms: params.ranging_interval_ms,
                slots_per_rr: params.slots_per_rr,
                mac_fcs_type: params.mac_fcs_type,
                ranging_round_control: params.ranging_round_control.clone(),
                aoa_result_request: params.aoa_result_request,
                range_data_ntf_config: params.range_data_ntf_config,
                range_data_ntf_proximity_near_cm: params.range_data_ntf_proximity_near_cm,
                range_data_ntf_proximity_far_cm: params.range_data_ntf_proximity_far_cm,
                rframe_config: params.rframe_config,
                prf_mode: params.prf_mode,
                sfd_id: params.sfd_id,
                psdu_data_rate: params.psdu_data_rate,
                preamble_duration: params.preamble_duration,
                scheduled_mode: params.scheduled_mode,
                key_rotation: params.key_rotation,
                key_rotation_rate: params.key_rotation_rate,
                session_priority: params.session_priority,
                mac_address_mode: params.mac_address_mode,
                max_rr_retry: params.max_rr_retry,
                uwb_initiation_time_ms: params.uwb_initiation_time_ms,
                hopping_mode: params.hopping_mode,
                block_stride_length: params.block_stride_length,
                result_report_config: params.result_report_config.clone(),
                in_band_termination_attempt_count: params.in_band_termination_attempt_count,
                sts_length: params.sts_length,
                suspend_ranging_rounds: params.suspend_ranging_rounds,
            }),
            _ => None,
        }
    }

    pub fn build(&self) -> Option<AppConfigParams> {
        let params = FiraAppConfigParams {
            protocol_version: self.protocol_version.clone(),
            session_id: self.session_id?,
            session_type: self.session_type,
            device_type: self.device_type?,
            device_role: self.device_role?,
            ranging_round_usage: self.ranging_round_usage,
            multi_node_mode: self.multi_node_mode?,
            device_mac_address: self.device_mac_address.clone()?,
            dst_mac_address: self.dst_mac_address.clone(),
            channel_number: self.channel_number,
            preamble_code_index: self.preamble_code_index,
            sts_config: self.sts_config,
            vendor_id: self.vendor_id,
            static_sts_iv: self.static_sts_iv,
            sub_session_id: self.sub_session_id,
            session_key: self.session_key.clone(),
            sub_session_key: self.sub_session_key.clone(),
            slot_duration_rstu: self.slot_duration_rstu,
            ranging_interval_ms: self.ranging_interval_ms,
            slots_per_rr: self.slots_per_rr,
            mac_fcs_type: self.mac_fcs_type,
            ranging_round_control: self.ranging_round_control.clone(),
            aoa_result_request: self.aoa_result_request,
            range_data_ntf_config: self.range_data_ntf_config,
            range_data_ntf_proximity_near_cm: self.range_data_ntf_proximity_near_cm,
            range_data_ntf_proximity_far_cm: self.range_data_ntf_proximity_far_cm,
            rframe_config: self.rframe_config,
            prf_mode: self.prf_mode,
            sfd_id: self.sfd_id,
            psdu_data_rate: self.psdu_data_rate,
            preamble_duration: self.preamble_duration,
            scheduled_mode: self.scheduled_mode,
            key_rotation: self.key_rotation,
            key_rotation_rate: self.key_rotation_rate,
            session_priority: self.session_priority,
            mac_address_mode: self.mac_address_mode,
            max_rr_retry: self.max_rr_retry,
            uwb_initiation_time_ms: self.uwb_initiation_time_ms,
            hopping_mode: self.hopping_mode,
            block_stride_length: self.block_stride_length,
            result_report_config: self.result_report_config.clone(),
            in_band_termination_attempt_count: self.in_band_termination_attempt_count,
            sts_length: self.sts_length,
            suspend_ranging_rounds: self.suspend_ranging_rounds,
        };

        params.is_valid()?;
        Some(AppConfigParams::Fira(params))
    }

    // Generate the setter methods for all the fields.
    builder_field!(protocol_version, FiraProtocolVersion);
    builder_field!(session_id, SessionId, Some);
    builder_field!(session_type, SessionType);
    builder_field!(device_type, DeviceType, Some);
    builder_field!(device_role, DeviceRole, Some);
    builder_field!(ranging_round_usage, RangingRoundUsage);
    builder_field!(multi_node_mode, MultiNodeMode, Some);
    builder_field!(device_mac_address, UwbAddress, Some);
    builder_field!(dst_mac_address, Vec<UwbAddress>);
    builder_field!(channel_number, UwbChannel);
    builder_field!(preamble_code_index, u8);
    builder_field!(sts_config, StsConfig);
    builder_field!(vendor_id, [u8; 2]);
    builder_field!(static_sts_iv, [u8; 6]);
    builder_field!(sub_session_id, SubSessionId);
    builder_field!(session_key, Vec<u8>, Some);
    builder_field!(sub_session_key, Vec<u8>, Some);
    builder_field!(slot_duration_rstu, u16);
    builder_field!(ranging_interval_ms, u32);
    builder_field!(slots_per_rr, u8);
    builder_field!(mac_fcs_type, MacFcsType);
    builder_field!(ranging_round_control, RangingRoundControl);
    builder_field!(aoa_result_request, AoaResultRequest);
    builder_field!(range_data_ntf_config, RangeDataNtfConfig);
    builder_field!(range_data_ntf_proximity_near_cm, u16);
    builder_field!(range_data_ntf_proximity_far_cm, u16);
    builder_field!(rframe_config, RframeConfig);
    builder_field!(prf_mode, PrfMode);
    builder_field!(sfd_id, u8);
    builder_field!(psdu_data_rate, PsduDataRate);
    builder_field!(preamble_duration, PreambleDuration);
    builder_field!(scheduled_mode, ScheduledMode);
    builder_field!(key_rotation, KeyRotation);
    builder_field!(key_rotation_rate, u8);
    builder_field!(session_priority, u8);
    builder_field!(mac_address_mode, MacAddressMode);
    builder_field!(max_rr_retry, u16);
    builder_field!(uwb_initiation_time_ms, u32);
    builder_field!(hopping_mode, HoppingMode);
    builder_field!(block_stride_length, u8);
    builder_field!(result_report_config, ResultReportConfig);
    builder_field!(in_band_termination_attempt_count, u8);
    builder_field!(sts_length, StsLength);
    builder_field!(suspend_ranging_rounds, SuspendRanging);
}

/// The FiRa protocol version, written as "major.minor" in the bundles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FiraProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl std::fmt::Display for FiraProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for FiraProtocolVersion {
    type Err = DecodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || DecodeError::InvalidValue { key: KEY_PROTOCOL_VERSION.to_string() };
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

/// The device type.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum DeviceType {
    /// Controlee
    Controlee = 0,
    /// Controller
    Controller = 1,
}

/// The device role.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum DeviceRole {
    Responder = 0,
    Initiator = 1,
    UtSynchronizationAnchor = 2,
    UtAnchor = 3,
    UtTag = 4,
    Advertiser = 5,
    Observer = 6,
    DtAnchor = 7,
    DtTag = 8,
}

/// The ranging round usage.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RangingRoundUsage {
    UlTdoa = 0,
    SsTwr = 1,
    DsTwr = 2,
    SsTwrNon = 3,
    DsTwrNon = 4,
    DlTdoa = 5,
    OwrAoa = 6,
    DataTransfer = 9,
}

/// The STS configuration.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum StsConfig {
    Static = 0,
    Dynamic = 1,
    DynamicForControleeIndividualKey = 2,
    Provisioned = 3,
    ProvisionedForControleeIndividualKey = 4,
}

impl StsConfig {
    /// Whether each controlee derives its own key from a sub-session id.
    pub fn uses_individual_key(&self) -> bool {
        matches!(
            self,
            Self::DynamicForControleeIndividualKey | Self::ProvisionedForControleeIndividualKey
        )
    }
}

/// The multiple node mode.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum MultiNodeMode {
    Unicast = 0,
    OneToMany = 1,
    ManyToMany = 2,
}

/// The UWB channel number.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum UwbChannel {
    Channel5 = 5,
    Channel6 = 6,
    Channel8 = 8,
    Channel9 = 9,
    Channel10 = 10,
    Channel12 = 12,
    Channel13 = 13,
    Channel14 = 14,
}

/// The UWB address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UwbAddress {
    /// The short MAC address (2 bytes)
    Short([u8; 2]),
    /// The extended MAC address (8 bytes)
    Extended([u8; 8]),
}

impl UwbAddress {
    pub fn is_short(&self) -> bool {
        matches!(self, Self::Short(_))
    }
}

impl From<UwbAddress> for Vec<u8> {
    fn from(item: UwbAddress) -> Self {
        match item {
            UwbAddress::Short(addr) => addr.to_vec(),
            UwbAddress::Extended(addr) => addr.to_vec(),
        }
    }
}

impl TryFrom<Vec<u8>> for UwbAddress {
    type Error = &'static str;
    fn try_from(value: Vec<u8>) -> std::result::Result<Self, Self::Error> {
        match value.len() {
            2 => value.try_into().map(UwbAddress::Short).map_err(|_| "Invalid address length"),
            8 => value.try_into().map(UwbAddress::Extended).map_err(|_| "Invalid address length"),
            _ => Err("Invalid address length"),
        }
    }
}

pub(super) fn addresses_to_bytes(addresses: &[UwbAddress]) -> Vec<u8> {
    addresses.iter().cloned().flat_map(Into::<Vec<u8>>::into).collect()
}

/// Split the concatenated addresses by the width implied by the address mode.
pub(super) fn bytes_to_addresses(bytes: &[u8], mode: MacAddressMode) -> Option<Vec<UwbAddress>> {
    let width = match mode {
        MacAddressMode::MacAddress2Bytes => 2,
        _ => 8,
    };
    if bytes.len() % width != 0 {
        return None;
    }
    bytes.chunks(width).map(|chunk| UwbAddress::try_from(chunk.to_vec()).ok()).collect()
}

/// CRC type in MAC footer.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum MacFcsType {
    /// CRC 16 (default)
    Crc16 = 0,
    /// CRC 32
    Crc32 = 1,
}

/// This parameter is used to tell the UWBS which messages will be included in a Ranging Round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangingRoundControl {
    /// Ranging Result Report Message (RRRM). Ignored by a controlee.
    pub ranging_result_report_message: bool,
    /// Control Message (CM), sent separately when set.
    pub control_message: bool,
    /// Measurement Report Message (MRM) is sent from the responders when set. Ignored by a
    /// controlee.
    pub measurement_report_message: bool,
}

impl RangingRoundControl {
    const RANGING_RESULT_REPORT_MESSAGE_BIT_OFFSET: u8 = 0;
    const CONTROL_MESSAGE_BIT_OFFSET: u8 = 1;
    const MEASUREMENT_REPORT_MESSAGE_BIT_OFFSET: u8 = 7;

    fn as_u8(&self) -> u8 {
        let mut value = 0_u8;
        if self.ranging_result_report_message {
            value |= 1 << Self::RANGING_RESULT_REPORT_MESSAGE_BIT_OFFSET;
        }
        if self.control_message {
            value |= 1 << Self::CONTROL_MESSAGE_BIT_OFFSET;
        }
        if self.measurement_report_message {
            value |= 1 << Self::MEASUREMENT_REPORT_MESSAGE_BIT_OFFSET;
        }
        value
    }

    fn from_u8(value: u8) -> Self {
        Self {
            ranging_result_report_message: value
                & (1 << Self::RANGING_RESULT_REPORT_MESSAGE_BIT_OFFSET)
                != 0,
            control_message: value & (1 << Self::CONTROL_MESSAGE_BIT_OFFSET) != 0,
            measurement_report_message: value & (1 << Self::MEASUREMENT_REPORT_MESSAGE_BIT_OFFSET)
                != 0,
        }
    }
}

/// This parameter is used to configure AOA results in the range data notification.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum AoaResultRequest {
    NoAoaReport = 0,
    ReqAoaResults = 1,
    ReqAoaResultsAzimuthOnly = 2,
    ReqAoaResultsElevationOnly = 3,
    ReqAoaResultsInterleaved = 0xF0,
}

/// This config is used to enable/disable the range data notification.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RangeDataNtfConfig {
    Disable = 0,
    Enable = 1,
    EnableProximityLevelTrig = 2,
    EnableAoaLevelTrig = 3,
    EnableProximityAoaLevelTrig = 4,
    EnableProximityEdgeTrig = 5,
    EnableAoaEdgeTrig = 6,
    EnableProximityAoaEdgeTrig = 7,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RframeConfig {
    SP0 = 0,
    SP1 = 1,
    SP3 = 3,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum PsduDataRate {
    Rate6m81 = 0,
    Rate7m80 = 1,
    Rate27m2 = 2,
    Rate31m2 = 3,
    Rate850k = 4,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum PreambleDuration {
    T32Symbols = 0,
    T64Symbols = 1,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum PrfMode {
    Bprf = 0,
    HprfWith124_8MHz = 1,
    HprfWith249_6MHz = 2,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum ScheduledMode {
    ContentionBasedRanging = 0,
    TimeScheduledRanging = 1,
    HybridScheduledRanging = 2,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum KeyRotation {
    Disable = 0,
    Enable = 1,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum MacAddressMode {
    MacAddress2Bytes = 0,
    MacAddress8Bytes2BytesHeader = 1,
    MacAddress8Bytes = 2,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum HoppingMode {
    Disable = 0,
    FiraHoppingEnable = 1,
}

/// The items reported in the ranging result.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultReportConfig {
    pub tof: bool,
    pub aoa_azimuth: bool,
    pub aoa_elevation: bool,
    pub aoa_fom: bool,
}

impl ResultReportConfig {
    const TOF_BIT_OFFSET: u8 = 0;
    const AOA_AZIMUTH_BIT_OFFSET: u8 = 1;
    const AOA_ELEVATION_BIT_OFFSET: u8 = 2;
    const AOA_FOM_BIT_OFFSET: u8 = 3;

    fn as_u8(&self) -> u8 {
        [
            (self.tof, Self::TOF_BIT_OFFSET),
            (self.aoa_azimuth, Self::AOA_AZIMUTH_BIT_OFFSET),
            (self.aoa_elevation, Self::AOA_ELEVATION_BIT_OFFSET),
            (self.aoa_fom, Self::AOA_FOM_BIT_OFFSET),
        ]
        .iter()
        .filter(|(enabled, _)| *enabled)
        .fold(0_u8, |value, (_, offset)| value | (1 << offset))
    }

    fn from_u8(value: u8) -> Self {
        Self {
            tof: value & (1 << Self::TOF_BIT_OFFSET) != 0,
            aoa_azimuth: value & (1 << Self::AOA_AZIMUTH_BIT_OFFSET) != 0,
            aoa_elevation: value & (1 << Self::AOA_ELEVATION_BIT_OFFSET) != 0,
            aoa_fom: value & (1 << Self::AOA_FOM_BIT_OFFSET) != 0,
        }
    }
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum StsLength {
    Length32 = 0,
    Length64 = 1,
    Length128 = 2,
}

/// Whether the ranging rounds are suspended. A pause request must carry Enabled and a resume
/// request must carry Disabled.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum SuspendRanging {
    Disabled = 0,
    Enabled = 1,
}

impl SuspendRanging {
    pub fn as_u8(&self) -> u8 {
        self.to_u8().unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use crate::caps::TlvBuffer;
    use crate::utils::init_test_logging;

    pub(crate) fn generate_fira_params(session_id: SessionId) -> AppConfigParams {
        FiraAppConfigParamsBuilder::new()
            .session_id(session_id)
            .device_type(DeviceType::Controller)
            .device_role(DeviceRole::Initiator)
            .multi_node_mode(MultiNodeMode::Unicast)
            .device_mac_address(UwbAddress::Short([1, 2]))
            .dst_mac_address(vec![UwbAddress::Short([3, 4])])
            .vendor_id([0xFE, 0xDC])
            .static_sts_iv([0xDF, 0xCE, 0xAB, 0x12, 0x34, 0x56])
            .build()
            .unwrap()
    }

    #[test]
    fn test_ok() {
        init_test_logging();

        let params = generate_fira_params(0x1234);
        let config_map = params.generate_config_map();

        assert_eq!(config_map.get(&AppConfigTlvType::DeviceType), Some(&vec![1]));
        assert_eq!(config_map.get(&AppConfigTlvType::DeviceMacAddress), Some(&vec![1, 2]));
        assert_eq!(config_map.get(&AppConfigTlvType::DstMacAddress), Some(&vec![3, 4]));
        assert_eq!(config_map.get(&AppConfigTlvType::NumberOfControlees), Some(&vec![1]));
        assert_eq!(config_map.get(&AppConfigTlvType::RangingDuration), Some(&vec![200, 0, 0, 0]));
        assert_eq!(config_map.get(&AppConfigTlvType::RangingRoundControl), Some(&vec![0b11]));
        assert_eq!(config_map.get(&AppConfigTlvType::ResultReportConfig), Some(&vec![0b1]));
        assert_eq!(config_map.get(&AppConfigTlvType::VendorId), Some(&vec![0xFE, 0xDC]));
        assert_eq!(config_map.get(&AppConfigTlvType::SuspendRangingRounds), Some(&vec![0]));
        // Not written for the static STS mode.
        assert_eq!(config_map.get(&AppConfigTlvType::SubSessionId), None);
        assert_eq!(config_map.get(&AppConfigTlvType::SessionKey), None);
    }

    #[test]
    fn test_individual_key_mode() {
        let mut builder =
            FiraAppConfigParamsBuilder::from_params(&generate_fira_params(1)).unwrap();
        builder
            .device_type(DeviceType::Controlee)
            .sts_config(StsConfig::ProvisionedForControleeIndividualKey)
            .session_key(vec![0x11; 16]);
        // The sub-session id is required.
        assert!(builder.build().is_none());

        builder.sub_session_id(0x0A0B).sub_session_key(vec![0x22; 32]);
        let config_map = builder.build().unwrap().generate_config_map();
        assert_eq!(config_map.get(&AppConfigTlvType::SubSessionId), Some(&vec![0x0B, 0x0A, 0, 0]));
        assert_eq!(config_map.get(&AppConfigTlvType::SessionKey), Some(&vec![0x11; 16]));
        assert_eq!(config_map.get(&AppConfigTlvType::SubsessionKey), Some(&vec![0x22; 32]));
        assert_eq!(config_map.get(&AppConfigTlvType::VendorId), None);
    }

    #[test]
    fn test_invalid_params() {
        let params = generate_fira_params(1);
        let builder = FiraAppConfigParamsBuilder::from_params(&params).unwrap();

        let mut invalid = FiraAppConfigParamsBuilder::from_params(&params).unwrap();
        invalid.preamble_code_index(25);
        assert!(invalid.build().is_none());

        let mut invalid = FiraAppConfigParamsBuilder::from_params(&params).unwrap();
        invalid.dst_mac_address(vec![UwbAddress::Extended([1; 8])]);
        assert!(invalid.build().is_none());

        let mut invalid = FiraAppConfigParamsBuilder::from_params(&params).unwrap();
        invalid
            .multi_node_mode(MultiNodeMode::OneToMany)
            .dst_mac_address(vec![UwbAddress::Short([3, 4]); MAX_NUMBER_OF_CONTROLEES + 1]);
        assert!(invalid.build().is_none());

        let mut invalid = FiraAppConfigParamsBuilder::from_params(&params).unwrap();
        invalid.range_data_ntf_proximity_near_cm(300).range_data_ntf_proximity_far_cm(200);
        assert!(invalid.build().is_none());

        let mut invalid = FiraAppConfigParamsBuilder::from_params(&params).unwrap();
        invalid.session_key(vec![0; 8]);
        assert!(invalid.build().is_none());

        assert!(builder.build().is_some());
    }

    #[test]
    fn test_is_config_updatable() {
        let active_map = BTreeMap::from([
            (AppConfigTlvType::RangingDuration, vec![1, 0, 0, 0]),
            (AppConfigTlvType::SuspendRangingRounds, vec![1]),
        ]);
        let idle_only_map = BTreeMap::from([(AppConfigTlvType::ChannelNumber, vec![5])]);

        assert!(FiraAppConfigParams::is_config_updatable(
            &active_map,
            SessionState::SessionStateActive
        ));
        assert!(!FiraAppConfigParams::is_config_updatable(
            &idle_only_map,
            SessionState::SessionStateActive
        ));
        assert!(FiraAppConfigParams::is_config_updatable(
            &idle_only_map,
            SessionState::SessionStateIdle
        ));
        assert!(!FiraAppConfigParams::is_config_updatable(
            &active_map,
            SessionState::SessionStateInit
        ));
    }

    #[test]
    fn test_bundle_round_trip() {
        let mut builder =
            FiraAppConfigParamsBuilder::from_params(&generate_fira_params(7)).unwrap();
        builder
            .multi_node_mode(MultiNodeMode::OneToMany)
            .dst_mac_address(vec![UwbAddress::Short([3, 4]), UwbAddress::Short([5, 6])])
            .suspend_ranging_rounds(SuspendRanging::Enabled)
            .session_key(vec![0x33; 16])
            .result_report_config(ResultReportConfig {
                tof: true,
                aoa_azimuth: true,
                aoa_elevation: false,
                aoa_fom: true,
            });
        let params = builder.build().unwrap();

        let bundle = params.to_bundle();
        assert_eq!(bundle.protocol_name(), Ok(ProtocolName::Fira));
        assert_eq!(bundle.bundle_version(), Ok(FIRA_BUNDLE_VERSION_2));
        assert_eq!(FiraAppConfigParams::from_bundle(&bundle), Ok(params));
    }

    #[test]
    fn test_max_number_of_controlees() {
        let mut builder =
            FiraAppConfigParamsBuilder::from_params(&generate_fira_params(7)).unwrap();
        builder
            .multi_node_mode(MultiNodeMode::OneToMany)
            .dst_mac_address(vec![UwbAddress::Short([3, 4]); MAX_NUMBER_OF_CONTROLEES]);
        let params = builder.build().unwrap();

        // The encoded TLVs are parsed back to the same elements.
        let tlvs = params.generate_tlv_buffer();
        assert_eq!(TlvBuffer::parse(&tlvs.to_bytes().unwrap()), Ok(tlvs));

        // The bundle listing more controlees is rejected before anything is encoded.
        let mut bundle = params.to_bundle();
        bundle.put_bytes(KEY_DEST_ADDRESS_LIST, vec![0x05; 260]);
        assert_eq!(FiraAppConfigParams::from_bundle(&bundle), Err(Error::IllegalArgument));
    }

    #[test]
    fn test_bundle_version_1_ignores_new_fields() {
        let params = generate_fira_params(7);
        let mut bundle = params.to_bundle();
        bundle
            .put_int(crate::params::bundle::KEY_BUNDLE_VERSION, FIRA_BUNDLE_VERSION_1)
            .put_int(KEY_SUSPEND_RANGING_ROUNDS, SuspendRanging::Enabled as i32);

        let parsed = FiraAppConfigParams::from_bundle(&bundle).unwrap();
        match parsed {
            AppConfigParams::Fira(fira) => {
                assert_eq!(fira.suspend_ranging_rounds(), &SuspendRanging::Disabled)
            }
            _ => panic!("Expected FiRa params"),
        }
    }

    #[test]
    fn test_invalid_bundle() {
        let mut bundle = generate_fira_params(7).to_bundle();
        bundle.put_int(crate::params::bundle::KEY_BUNDLE_VERSION, 3);
        assert_eq!(
            FiraAppConfigParams::from_bundle(&bundle),
            Err(Error::DecodeFailure(DecodeError::InvalidBundleVersion(3)))
        );

        let mut bundle = generate_fira_params(7).to_bundle();
        bundle.put_int(KEY_DEVICE_ROLE, 42);
        assert!(matches!(
            FiraAppConfigParams::from_bundle(&bundle),
            Err(Error::DecodeFailure(DecodeError::InvalidValue { .. }))
        ));

        let mut bundle = generate_fira_params(7).to_bundle();
        bundle.put_int(KEY_SESSION_PRIORITY, 0);
        assert_eq!(FiraAppConfigParams::from_bundle(&bundle), Err(Error::IllegalArgument));

        let mut bundle = Bundle::with_header(ProtocolName::Fira, FIRA_BUNDLE_VERSION_2);
        bundle.put_long(KEY_SESSION_ID, 1);
        assert!(matches!(
            FiraAppConfigParams::from_bundle(&bundle),
            Err(Error::DecodeFailure(DecodeError::MissingKey(_)))
        ));
    }

    #[test]
    fn test_hashed_session_id() {
        let mut bundle = generate_fira_params(7).to_bundle();
        let mut values = Bundle::with_header(ProtocolName::Fira, FIRA_BUNDLE_VERSION_2);
        for key in [
            KEY_DEVICE_TYPE,
            KEY_DEVICE_ROLE,
            KEY_MULTI_NODE_MODE,
            KEY_CHANNEL_NUMBER,
            KEY_PREAMBLE_CODE_INDEX,
        ] {
            values.put_int(key, bundle.get_int(key).unwrap());
        }
        values
            .put_bytes(KEY_DEVICE_ADDRESS, vec![1, 2])
            .put_bytes(KEY_DEST_ADDRESS_LIST, vec![3, 4]);

        let channel = UwbComplexChannel::new(9, 10).unwrap();
        let parsed = FiraAppConfigParams::from_bundle(&values).unwrap();
        assert_eq!(parsed.session_id(), hashed_session_id(&[1, 2], &channel));

        // A controlee must carry the session id.
        bundle.put_int(KEY_DEVICE_TYPE, DeviceType::Controlee as i32);
        let mut values = bundle.clone();
        values.put_long(KEY_SESSION_ID, 1);
        assert!(FiraAppConfigParams::from_bundle(&values).is_ok());
        let mut values = Bundle::with_header(ProtocolName::Fira, FIRA_BUNDLE_VERSION_2);
        for key in [KEY_DEVICE_TYPE, KEY_DEVICE_ROLE, KEY_MULTI_NODE_MODE] {
            values.put_int(key, bundle.get_int(key).unwrap());
        }
        values
            .put_bytes(KEY_DEVICE_ADDRESS, vec![1, 2])
            .put_bytes(KEY_DEST_ADDRESS_LIST, vec![3, 4]);
        assert_eq!(
            FiraAppConfigParams::from_bundle(&values),
            Err(Error::DecodeFailure(DecodeError::MissingKey(KEY_SESSION_ID.to_string())))
        );
    }

    #[test]
    fn test_protocol_version_string() {
        assert_eq!("2.0".parse(), Ok(FiraProtocolVersion { major: 2, minor: 0 }));
        assert!("2".parse::<FiraProtocolVersion>().is_err());
        assert_eq!(FiraProtocolVersion { major: 1, minor: 1 }.to_string(), "1.1");
    }

    #[test]
    fn test_redacted_pii_fields() {
        let params = generate_fira_params(1);
        let format_str = format!("{params:?}");
        assert!(format_str.contains("vendor_id: \"redacted\""));
        assert!(format_str.contains("static_sts_iv: \"redacted\""));
        assert!(format_str.contains("sub_session_id: \"redacted\""));
    }
}
