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

#![allow(missing_docs)]

use std::collections::BTreeMap;

use log::error;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::error::{DecodeError, Error, Result};
use crate::params::app_config_params::{AppConfigParams, AppConfigTlvMap};
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::fira_app_config_params::{
    DeviceRole, DeviceType, KeyRotation, MultiNodeMode, RangeDataNtfConfig, StsConfig,
};
use crate::params::uci_packets::{AppConfigTlvType, SessionId, SessionState};
use crate::params::utils::{u16_to_bytes, u32_to_bytes, u8_to_bytes, validate};
use crate::utils::{builder_field, getter_field};

const CHAP_IN_RSTU: u16 = 400; // 1 Chap = 400 RSTU.
pub(super) const MINIMUM_BLOCK_DURATION_MS: u32 = 96;

// The constant AppConfigTlv values for CCC.
const CCC_DEVICE_TYPE: DeviceType = DeviceType::Controlee;
const CCC_STS_CONFIG: StsConfig = StsConfig::Dynamic;
const CCC_MULTI_NODE_MODE: MultiNodeMode = MultiNodeMode::OneToMany;
pub(super) const CCC_RANGE_DATA_NTF_CONFIG: RangeDataNtfConfig = RangeDataNtfConfig::Disable;
const CCC_DEVICE_ROLE: DeviceRole = DeviceRole::Initiator;
const CCC_KEY_ROTATION: KeyRotation = KeyRotation::Enable;
const CCC_URSK_TTL: u16 = 0x2D0;

const DEFAULT_PROTOCOL_VERSION: CccProtocolVersion = CccProtocolVersion { major: 1, minor: 0 };

pub(super) const CCC_BUNDLE_VERSION: i32 = 1;

pub(super) const KEY_PROTOCOL_VERSION: &str = "protocol_version";
pub(super) const KEY_SESSION_ID: &str = "session_id";
const KEY_UWB_CONFIG: &str = "uwb_config";
const KEY_PULSE_SHAPE_COMBO: &str = "pulse_shape_combo";
pub(super) const KEY_RAN_MULTIPLIER: &str = "ran_multiplier";
const KEY_CHANNEL: &str = "channel";
const KEY_CHAPS_PER_SLOT: &str = "chaps_per_slot";
const KEY_NUM_RESPONDER_NODES: &str = "num_responder_nodes";
const KEY_SLOTS_PER_RR: &str = "slots_per_rr";
const KEY_SYNC_CODE_INDEX: &str = "sync_code_index";
const KEY_HOPPING_MODE: &str = "hopping_mode";
pub(super) const KEY_RANGE_DATA_NTF_CONFIG: &str = "range_data_ntf_config";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CccAppConfigParams {
    session_id: SessionId,
    protocol_version: CccProtocolVersion,
    uwb_config: CccUwbConfig,
    pulse_shape_combo: CccPulseShapeCombo,
    ran_multiplier: u32,
    channel_number: CccUwbChannel,
    chaps_per_slot: ChapsPerSlot,
    num_responder_nodes: u8,
    slots_per_rr: u8,
    sync_code_index: u8,
    hopping_mode: CccHoppingMode,
}

#[allow(missing_docs)]
impl CccAppConfigParams {
    // Generate the getter methods for all the fields.
    getter_field!(session_id, SessionId);
    getter_field!(protocol_version, CccProtocolVersion);
    getter_field!(uwb_config, CccUwbConfig);
    getter_field!(pulse_shape_combo, CccPulseShapeCombo);
    getter_field!(ran_multiplier, u32);
    getter_field!(channel_number, CccUwbChannel);
    getter_field!(chaps_per_slot, ChapsPerSlot);
    getter_field!(num_responder_nodes, u8);
    getter_field!(slots_per_rr, u8);
    getter_field!(sync_code_index, u8);
    getter_field!(hopping_mode, CccHoppingMode);

    pub fn is_config_updatable(config_map: &AppConfigTlvMap, session_state: SessionState) -> bool {
        match session_state {
            SessionState::SessionStateIdle => {
                // Only ran_multiplier can be updated at idle state.
                config_map.keys().all(|key| key == &AppConfigTlvType::RangingDuration)
            }
            _ => false,
        }
    }

    pub fn generate_config_map(&self) -> AppConfigTlvMap {
        debug_assert!(self.is_valid().is_some());

        BTreeMap::from([
            (AppConfigTlvType::DeviceType, u8_to_bytes(CCC_DEVICE_TYPE as u8)),
            (AppConfigTlvType::StsConfig, u8_to_bytes(CCC_STS_CONFIG as u8)),
            (AppConfigTlvType::MultiNodeMode, u8_to_bytes(CCC_MULTI_NODE_MODE as u8)),
            (AppConfigTlvType::ChannelNumber, u8_to_bytes(self.channel_number as u8)),
            (AppConfigTlvType::NumberOfControlees, u8_to_bytes(self.num_responder_nodes)),
            (
                AppConfigTlvType::SlotDuration,
                u16_to_bytes((self.chaps_per_slot as u16) * CHAP_IN_RSTU),
            ),
            (
                AppConfigTlvType::RangingDuration,
                u32_to_bytes(self.ran_multiplier * MINIMUM_BLOCK_DURATION_MS),
            ),
            (AppConfigTlvType::RngDataNtf, u8_to_bytes(CCC_RANGE_DATA_NTF_CONFIG as u8)),
            (AppConfigTlvType::DeviceRole, u8_to_bytes(CCC_DEVICE_ROLE as u8)),
            (AppConfigTlvType::PreambleCodeIndex, u8_to_bytes(self.sync_code_index)),
            (AppConfigTlvType::SlotsPerRr, u8_to_bytes(self.slots_per_rr)),
            (AppConfigTlvType::KeyRotation, u8_to_bytes(CCC_KEY_ROTATION as u8)),
            (AppConfigTlvType::HoppingMode, u8_to_bytes(self.hopping_mode as u8)),
            (AppConfigTlvType::CccRangingProtocolVer, self.protocol_version.clone().into()),
            (AppConfigTlvType::CccUwbConfigId, u16_to_bytes(self.uwb_config as u16)),
            (AppConfigTlvType::CccPulseshapeCombo, self.pulse_shape_combo.clone().into()),
            (AppConfigTlvType::CccUrskTtl, u16_to_bytes(CCC_URSK_TTL)),
        ])
    }

    /// Write the fields into a bundle of the protocol. The Aliro params share the same layout.
    pub(super) fn write_bundle(&self, protocol: ProtocolName) -> Bundle {
        let mut bundle = Bundle::with_header(protocol, CCC_BUNDLE_VERSION);
        bundle
            .put_string(KEY_PROTOCOL_VERSION, self.protocol_version.to_string())
            .put_long(KEY_SESSION_ID, self.session_id as i64)
            .put_int(KEY_UWB_CONFIG, self.uwb_config as i32)
            .put_int(KEY_PULSE_SHAPE_COMBO, self.pulse_shape_combo.as_u8() as i32)
            .put_long(KEY_RAN_MULTIPLIER, self.ran_multiplier as i64)
            .put_int(KEY_CHANNEL, self.channel_number as i32)
            .put_int(KEY_CHAPS_PER_SLOT, self.chaps_per_slot as i32)
            .put_int(KEY_NUM_RESPONDER_NODES, self.num_responder_nodes as i32)
            .put_int(KEY_SLOTS_PER_RR, self.slots_per_rr as i32)
            .put_int(KEY_SYNC_CODE_INDEX, self.sync_code_index as i32)
            .put_int(KEY_HOPPING_MODE, self.hopping_mode as i32);
        bundle
    }

    pub fn to_bundle(&self) -> Bundle {
        self.write_bundle(ProtocolName::Ccc)
    }

    pub fn from_bundle(bundle: &Bundle) -> Result<AppConfigParams> {
        bundle.check_header(ProtocolName::Ccc, &[CCC_BUNDLE_VERSION])?;
        CccAppConfigParamsBuilder::read_bundle(bundle)?.build().ok_or_else(|| {
            error!("The CCC bundle contains invalid parameters");
            Error::IllegalArgument
        })
    }

    pub(super) fn is_valid(&self) -> Option<()> {
        validate(
            (1..=32).contains(&self.sync_code_index),
            "sync_code_index should be between 1 to 32",
        )?;

        self.ran_multiplier.checked_mul(MINIMUM_BLOCK_DURATION_MS).or_else(|| {
            error!("ran_multiplier * MINIMUM_BLOCK_DURATION_MS overflows");
            None
        })?;

        Some(())
    }
}

pub struct CccAppConfigParamsBuilder {
    session_id: Option<SessionId>,
    protocol_version: CccProtocolVersion,
    uwb_config: Option<CccUwbConfig>,
    pulse_shape_combo: Option<CccPulseShapeCombo>,
    ran_multiplier: Option<u32>,
    channel_number: Option<CccUwbChannel>,
    chaps_per_slot: Option<ChapsPerSlot>,
    num_responder_nodes: Option<u8>,
    slots_per_rr: Option<u8>,
    sync_code_index: Option<u8>,
    hopping_mode: Option<CccHoppingMode>,
}

#[allow(clippy::new_without_default)]
impl CccAppConfigParamsBuilder {
    pub fn new() -> Self {
        Self {
            session_id: None,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            uwb_config: None,
            pulse_shape_combo: None,
            ran_multiplier: None,
            channel_number: None,
            chaps_per_slot: None,
            num_responder_nodes: None,
            slots_per_rr: None,
            sync_code_index: None,
            hopping_mode: None,
        }
    }

    pub fn build(&self) -> Option<AppConfigParams> {
        Some(AppConfigParams::Ccc(self.build_params()?))
    }

    pub(super) fn build_params(&self) -> Option<CccAppConfigParams> {
        let params = CccAppConfigParams {
            session_id: self.session_id?,
            protocol_version: self.protocol_version.clone(),
            uwb_config: self.uwb_config?,
            pulse_shape_combo: self.pulse_shape_combo.clone()?,
            ran_multiplier: self.ran_multiplier?,
            channel_number: self.channel_number?,
            chaps_per_slot: self.chaps_per_slot?,
            num_responder_nodes: self.num_responder_nodes?,
            slots_per_rr: self.slots_per_rr?,
            sync_code_index: self.sync_code_index?,
            hopping_mode: self.hopping_mode?,
        };
        params.is_valid()?;
        Some(params)
    }

    pub fn from_params(params: &AppConfigParams) -> Option<Self> {
        match params {
            AppConfigParams::Ccc(params) => Some(Self::from_ccc_params(params)),
            _ => None,
        }
    }

    pub(super) fn from_ccc_params(params: &CccAppConfigParams) -> Self {
        Self {
            session_id: Some(params.session_id),
            protocol_version: params.protocol_version.clone(),
            uwb_config: Some(params.uwb_config),
            pulse_shape_combo: Some(params.pulse_shape_combo.clone()),
            ran_multiplier: Some(params.ran_multiplier),
            channel_number: Some(params.channel_number),
            chaps_per_slot: Some(params.chaps_per_slot),
            num_responder_nodes: Some(params.num_responder_nodes),
            slots_per_rr: Some(params.slots_per_rr),
            sync_code_index: Some(params.sync_code_index),
            hopping_mode: Some(params.hopping_mode),
        }
    }

    /// Read every field from the bundle. All the keys are required.
    pub(super) fn read_bundle(bundle: &Bundle) -> std::result::Result<Self, DecodeError> {
        let mut builder = Self::new();
        builder
            .protocol_version(bundle.get_string(KEY_PROTOCOL_VERSION)?.parse()?)
            .session_id(bundle.get_uint(KEY_SESSION_ID)?)
            .uwb_config(bundle.get_enum(KEY_UWB_CONFIG)?)
            .pulse_shape_combo(
                CccPulseShapeCombo::from_u8(bundle.get_uint(KEY_PULSE_SHAPE_COMBO)?).ok_or_else(
                    || DecodeError::InvalidValue { key: KEY_PULSE_SHAPE_COMBO.to_string() },
                )?,
            )
            .ran_multiplier(bundle.get_uint(KEY_RAN_MULTIPLIER)?)
            .channel_number(bundle.get_enum(KEY_CHANNEL)?)
            .chaps_per_slot(bundle.get_enum(KEY_CHAPS_PER_SLOT)?)
            .num_responder_nodes(bundle.get_uint(KEY_NUM_RESPONDER_NODES)?)
            .slots_per_rr(bundle.get_uint(KEY_SLOTS_PER_RR)?)
            .sync_code_index(bundle.get_uint(KEY_SYNC_CODE_INDEX)?)
            .hopping_mode(bundle.get_enum(KEY_HOPPING_MODE)?);
        Ok(builder)
    }

    // Generate the setter methods for all the fields.
    builder_field!(session_id, SessionId, Some);
    builder_field!(protocol_version, CccProtocolVersion);
    builder_field!(uwb_config, CccUwbConfig, Some);
    builder_field!(pulse_shape_combo, CccPulseShapeCombo, Some);
    builder_field!(ran_multiplier, u32, Some);
    builder_field!(channel_number, CccUwbChannel, Some);
    builder_field!(chaps_per_slot, ChapsPerSlot, Some);
    builder_field!(num_responder_nodes, u8, Some);
    builder_field!(slots_per_rr, u8, Some);
    builder_field!(sync_code_index, u8, Some);
    builder_field!(hopping_mode, CccHoppingMode, Some);
}

/// The reconfigurable fields of the CCC and the Aliro sessions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CccReconfigureParams {
    /// The new RAN multiplier.
    pub ran_multiplier: Option<u32>,
    /// The new range data notification config. Only the Aliro sessions accept it.
    pub range_data_ntf_config: Option<RangeDataNtfConfig>,
}

impl CccReconfigureParams {
    pub fn to_bundle(&self, protocol: ProtocolName) -> Bundle {
        let mut bundle = Bundle::with_header(protocol, CCC_BUNDLE_VERSION);
        if let Some(ran_multiplier) = self.ran_multiplier {
            bundle.put_long(KEY_RAN_MULTIPLIER, ran_multiplier as i64);
        }
        if let Some(config) = self.range_data_ntf_config {
            bundle.put_int(KEY_RANGE_DATA_NTF_CONFIG, config as i32);
        }
        bundle
    }

    pub fn from_bundle(bundle: &Bundle) -> Result<Self> {
        let protocol = bundle.protocol_name()?;
        bundle.check_header(protocol, &[CCC_BUNDLE_VERSION])?;
        let params = Self {
            ran_multiplier: bundle.get_opt(KEY_RAN_MULTIPLIER, Bundle::get_uint)?,
            range_data_ntf_config: bundle.get_opt(KEY_RANGE_DATA_NTF_CONFIG, Bundle::get_enum)?,
        };
        match protocol {
            ProtocolName::Ccc if params.range_data_ntf_config.is_some() => {
                error!("The CCC session doesn't accept range_data_ntf_config");
                Err(Error::IllegalArgument)
            }
            ProtocolName::Ccc | ProtocolName::Aliro => Ok(params),
            _ => Err(Error::IllegalArgument),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CccProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl From<CccProtocolVersion> for Vec<u8> {
    fn from(item: CccProtocolVersion) -> Self {
        vec![item.major, item.minor]
    }
}

impl std::fmt::Display for CccProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for CccProtocolVersion {
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

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum CccUwbConfig {
    Config0 = 0,
    Config1 = 1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CccPulseShapeCombo {
    pub initiator_tx: PulseShape,
    pub responder_tx: PulseShape,
}

impl CccPulseShapeCombo {
    pub fn as_u8(&self) -> u8 {
        ((self.initiator_tx as u8) << 4) | (self.responder_tx as u8)
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Some(Self {
            initiator_tx: PulseShape::from_u8(value >> 4)?,
            responder_tx: PulseShape::from_u8(value & 0x0F)?,
        })
    }
}

impl From<CccPulseShapeCombo> for Vec<u8> {
    fn from(item: CccPulseShapeCombo) -> Self {
        vec![item.as_u8()]
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum PulseShape {
    SymmetricalRootRaisedCosine = 0x0,
    PrecursorFree = 0x1,
    PrecursorFreeSpecial = 0x2,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum CccUwbChannel {
    Channel5 = 5,
    Channel9 = 9,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum HoppingConfigMode {
    None = 0,
    Continuous = 1,
    Adaptive = 2,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum HoppingSequence {
    Default = 0,
    Aes = 1,
}

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum ChapsPerSlot {
    Value3 = 3,
    Value4 = 4,
    Value6 = 6,
    Value8 = 8,
    Value9 = 9,
    Value12 = 12,
    Value24 = 24,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum CccHoppingMode {
    Disable = 0,
    AdaptiveDefault = 2,
    ContinuousDefault = 3,
    AdaptiveAes = 4,
    ContinuousAes = 5,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn generate_ccc_builder(session_id: SessionId) -> CccAppConfigParamsBuilder {
        let mut builder = CccAppConfigParamsBuilder::new();
        builder
            .session_id(session_id)
            .protocol_version(CccProtocolVersion { major: 2, minor: 1 })
            .uwb_config(CccUwbConfig::Config0)
            .pulse_shape_combo(CccPulseShapeCombo {
                initiator_tx: PulseShape::PrecursorFree,
                responder_tx: PulseShape::PrecursorFreeSpecial,
            })
            .ran_multiplier(3)
            .channel_number(CccUwbChannel::Channel9)
            .chaps_per_slot(ChapsPerSlot::Value9)
            .num_responder_nodes(1)
            .slots_per_rr(3)
            .sync_code_index(12)
            .hopping_mode(CccHoppingMode::ContinuousAes);
        builder
    }

    #[test]
    fn test_ok() {
        let params = generate_ccc_builder(1).build().unwrap();

        // Verify the generated TLV.
        let config_map = params.generate_config_map();
        let expected_config_map = BTreeMap::from([
            (AppConfigTlvType::DeviceType, u8_to_bytes(CCC_DEVICE_TYPE as u8)),
            (AppConfigTlvType::StsConfig, u8_to_bytes(CCC_STS_CONFIG as u8)),
            (AppConfigTlvType::MultiNodeMode, u8_to_bytes(CCC_MULTI_NODE_MODE as u8)),
            (AppConfigTlvType::ChannelNumber, vec![9]),
            (AppConfigTlvType::NumberOfControlees, vec![1]),
            (AppConfigTlvType::SlotDuration, u16_to_bytes(9 * CHAP_IN_RSTU)),
            (AppConfigTlvType::RangingDuration, u32_to_bytes(3 * MINIMUM_BLOCK_DURATION_MS)),
            (AppConfigTlvType::RngDataNtf, u8_to_bytes(CCC_RANGE_DATA_NTF_CONFIG as u8)),
            (AppConfigTlvType::DeviceRole, u8_to_bytes(CCC_DEVICE_ROLE as u8)),
            (AppConfigTlvType::PreambleCodeIndex, vec![12]),
            (AppConfigTlvType::SlotsPerRr, vec![3]),
            (AppConfigTlvType::KeyRotation, u8_to_bytes(CCC_KEY_ROTATION as u8)),
            (AppConfigTlvType::HoppingMode, vec![CccHoppingMode::ContinuousAes as u8]),
            (AppConfigTlvType::CccRangingProtocolVer, vec![2, 1]),
            (AppConfigTlvType::CccUwbConfigId, vec![0, 0]),
            (AppConfigTlvType::CccPulseshapeCombo, vec![0x12]),
            (AppConfigTlvType::CccUrskTtl, u16_to_bytes(CCC_URSK_TTL)),
        ]);
        assert_eq!(config_map, expected_config_map);

        // Update the value from the params.
        let updated_params = CccAppConfigParamsBuilder::from_params(&params)
            .unwrap()
            .ran_multiplier(5)
            .build()
            .unwrap();
        let updated_config_map = updated_params
            .generate_updated_config_map(&params, SessionState::SessionStateIdle)
            .unwrap();
        assert_eq!(
            updated_config_map,
            BTreeMap::from([(
                AppConfigTlvType::RangingDuration,
                u32_to_bytes(5 * MINIMUM_BLOCK_DURATION_MS)
            )])
        );
    }

    #[test]
    fn test_update_config() {
        let mut builder = generate_ccc_builder(1);
        let params = builder.build().unwrap();

        builder.ran_multiplier(5);
        let updated_params = builder.build().unwrap();
        // ran_multiplier can be updated at idle state.
        assert!(updated_params
            .generate_updated_config_map(&params, SessionState::SessionStateIdle)
            .is_some());
        // ran_multiplier cannot be updated at active state.
        assert!(updated_params
            .generate_updated_config_map(&params, SessionState::SessionStateActive)
            .is_none());
    }

    #[test]
    fn test_invalid_params() {
        let mut builder = generate_ccc_builder(1);
        builder.sync_code_index(33);
        assert!(builder.build().is_none());

        let mut builder = generate_ccc_builder(1);
        builder.ran_multiplier(u32::MAX);
        assert!(builder.build().is_none());
    }

    #[test]
    fn test_bundle() {
        let params = generate_ccc_builder(0x55).build().unwrap();
        let bundle = params.to_bundle();
        assert_eq!(bundle.protocol_name(), Ok(ProtocolName::Ccc));
        assert_eq!(CccAppConfigParams::from_bundle(&bundle), Ok(params));

        let mut bundle = generate_ccc_builder(0x55).build().unwrap().to_bundle();
        bundle.put_int(KEY_CHAPS_PER_SLOT, 5);
        assert!(matches!(
            CccAppConfigParams::from_bundle(&bundle),
            Err(Error::DecodeFailure(DecodeError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_reconfigure_bundle() {
        let params = CccReconfigureParams { ran_multiplier: Some(8), range_data_ntf_config: None };
        assert_eq!(
            CccReconfigureParams::from_bundle(&params.to_bundle(ProtocolName::Ccc)),
            Ok(params)
        );

        let params = CccReconfigureParams {
            ran_multiplier: None,
            range_data_ntf_config: Some(RangeDataNtfConfig::Enable),
        };
        assert_eq!(
            CccReconfigureParams::from_bundle(&params.to_bundle(ProtocolName::Aliro)),
            Ok(params.clone())
        );
        assert_eq!(
            CccReconfigureParams::from_bundle(&params.to_bundle(ProtocolName::Ccc)),
            Err(Error::IllegalArgument)
        );
    }

    #[test]
    fn test_pulse_shape_combo() {
        let combo = CccPulseShapeCombo::from_u8(0x21).unwrap();
        assert_eq!(combo.initiator_tx, PulseShape::PrecursorFreeSpecial);
        assert_eq!(combo.responder_tx, PulseShape::PrecursorFree);
        assert_eq!(combo.as_u8(), 0x21);
        assert!(CccPulseShapeCombo::from_u8(0x30).is_none());
    }
}
