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

//! This module decodes the FiRa capabilities reported by the UWBS.
//!
//! The FiRa capability TLVs come in two layouts. The 1.x layout starts with the PHY and MAC version
//! ranges at tags 0x00 and 0x01, while the 2.0 layout moves them behind the max message sizes and
//! widens the device roles and the ranging methods to 2 bytes. The layout is detected from the
//! length of the tag 0x02, which is the 1-byte device roles in 1.x and the 4-byte PHY version range
//! in 2.0.

use std::collections::BTreeSet;

use log::error;

use crate::caps::tlv_buffer::{is_bit_set, optional, required, TlvBuffer};
use crate::error::DecodeError;
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::fira_app_config_params::FiraProtocolVersion;
use crate::params::utils::bytes_to_u64_widened;

const FIRA_SPECIFICATION_BUNDLE_VERSION: i32 = 1;

const LAYOUT_DISCRIMINATOR_TAG: u8 = 0x02;

// The vendor-defined capability tags, shared by both layouts.
const SUPPORTED_AOA_RESULT_REQ_INTERLEAVING: u8 = 0xE3;
const SUPPORTED_MIN_RANGING_INTERVAL_MS: u8 = 0xE4;
const SUPPORTED_RANGE_DATA_NTF_CONFIG: u8 = 0xE5;
const SUPPORTED_RSSI_REPORTING: u8 = 0xE6;
const SUPPORTED_DIAGNOSTICS: u8 = 0xE7;
const SUPPORTED_MIN_SLOT_DURATION_RSTU: u8 = 0xE8;
const SUPPORTED_MAX_RANGING_SESSION_NUMBER: u8 = 0xE9;

// The single-bit capabilities.
const AOA_RESULT_REQ_INTERLEAVING: u64 = 0x01;
const BLOCK_STRIDING: u64 = 0x01;
const HOPPING_MODE: u64 = 0x01;
const EXTENDED_MAC_ADDRESS: u64 = 0x01;
const UWB_INITIATION_TIME: u64 = 0x01;
const RSSI_REPORTING: u64 = 0x01;
const DIAGNOSTICS: u64 = 0x01;
const DT_TAG_BLOCK_SKIPPING: u64 = 0x01;
const PSDU_LENGTH_SUPPORT: u64 = 0x01;
const DS_TWR_NON_DEFERRED: u64 = 0x10;
const SS_TWR_NON_DEFERRED: u64 = 0x08;
const CC_CONSTRAINT_LENGTH_K3: u64 = 0x01;
const CC_CONSTRAINT_LENGTH_K7: u64 = 0x02;

/// The layout of the FiRa capability TLVs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiraCapsLayout {
    /// FiRa 1.x.
    Version1,
    /// FiRa 2.0.
    Version2,
}

/// The FiRa capability fields located through the per-layout tag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiraCapField {
    PhyVersionRange,
    MacVersionRange,
    DeviceType,
    DeviceRoles,
    RangingMethod,
    StsConfig,
    MultiNodeModes,
    RangingTimeStruct,
    ScheduledMode,
    HoppingMode,
    BlockStriding,
    UwbInitiationTime,
    Channels,
    RframeConfig,
    CcConstraintLength,
    BprfParameterSets,
    HprfParameterSets,
    Aoa,
    ExtendedMacAddress,
    MaxMessageSize,
    MaxDataPacketPayloadSize,
    SuspendRanging,
    SessionKeyLength,
    DtTagMaxActiveRr,
    DtTagBlockSkipping,
    PsduLengthSupport,
}

impl FiraCapsLayout {
    /// Detect the layout from the length of the discriminating tag.
    pub fn detect(tlvs: &TlvBuffer) -> Result<Self, DecodeError> {
        match required(tlvs.get_byte_array(LAYOUT_DISCRIMINATOR_TAG), "FIRA_VERSION_CHECK")?.len()
        {
            1 => Ok(Self::Version1),
            4 => Ok(Self::Version2),
            len => {
                error!("Unsupported FiRa capability layout, tag 0x02 has {} bytes", len);
                Err(DecodeError::UnsupportedVersion)
            }
        }
    }

    /// The tag of the field in this layout, or None if the layout doesn't carry the field.
    pub fn tag(self, field: FiraCapField) -> Option<u8> {
        use FiraCapField::*;
        use FiraCapsLayout::*;

        match (self, field) {
            (Version1, PhyVersionRange) => Some(0x00),
            (Version1, MacVersionRange) => Some(0x01),
            (Version1, DeviceRoles) => Some(0x02),
            (Version1, RangingMethod) => Some(0x03),
            (Version1, StsConfig) => Some(0x04),
            (Version1, MultiNodeModes) => Some(0x05),
            (Version1, RangingTimeStruct) => Some(0x06),
            (Version1, ScheduledMode) => Some(0x07),
            (Version1, HoppingMode) => Some(0x08),
            (Version1, BlockStriding) => Some(0x09),
            (Version1, UwbInitiationTime) => Some(0x0A),
            (Version1, Channels) => Some(0x0B),
            (Version1, RframeConfig) => Some(0x0C),
            (Version1, CcConstraintLength) => Some(0x0D),
            (Version1, BprfParameterSets) => Some(0x0E),
            (Version1, HprfParameterSets) => Some(0x0F),
            (Version1, Aoa) => Some(0x10),
            (Version1, ExtendedMacAddress) => Some(0x11),
            (Version1, MaxMessageSize) => Some(0x12),
            (Version1, MaxDataPacketPayloadSize) => Some(0x13),
            (
                Version1,
                DeviceType | SuspendRanging | SessionKeyLength | DtTagMaxActiveRr
                | DtTagBlockSkipping | PsduLengthSupport,
            ) => None,

            (Version2, MaxMessageSize) => Some(0x00),
            (Version2, MaxDataPacketPayloadSize) => Some(0x01),
            (Version2, PhyVersionRange) => Some(0x02),
            (Version2, MacVersionRange) => Some(0x03),
            (Version2, DeviceType) => Some(0x04),
            (Version2, DeviceRoles) => Some(0x05),
            (Version2, RangingMethod) => Some(0x06),
            (Version2, StsConfig) => Some(0x07),
            (Version2, MultiNodeModes) => Some(0x08),
            (Version2, RangingTimeStruct) => Some(0x09),
            (Version2, ScheduledMode) => Some(0x0A),
            (Version2, HoppingMode) => Some(0x0B),
            (Version2, BlockStriding) => Some(0x0C),
            (Version2, UwbInitiationTime) => Some(0x0D),
            (Version2, Channels) => Some(0x0E),
            (Version2, RframeConfig) => Some(0x0F),
            (Version2, CcConstraintLength) => Some(0x10),
            (Version2, BprfParameterSets) => Some(0x11),
            (Version2, HprfParameterSets) => Some(0x12),
            (Version2, Aoa) => Some(0x13),
            (Version2, ExtendedMacAddress) => Some(0x14),
            (Version2, SuspendRanging) => Some(0x15),
            (Version2, SessionKeyLength) => Some(0x16),
            (Version2, DtTagMaxActiveRr) => Some(0x17),
            (Version2, DtTagBlockSkipping) => Some(0x18),
            (Version2, PsduLengthSupport) => Some(0x19),
        }
    }

    /// The width in bytes of the device roles and the ranging method bitmaps.
    fn bitmap_width(self) -> usize {
        match self {
            Self::Version1 => 1,
            Self::Version2 => 2,
        }
    }

    fn device_role_table(self) -> &'static [(u64, DeviceRoleCapability)] {
        use DeviceRoleCapability::*;
        // INITIATOR and RESPONDER imply the support of both the controller and the controlee.
        const VERSION1: &[(u64, DeviceRoleCapability)] = &[
            (0x01, ControllerInitiator),
            (0x01, ControleeInitiator),
            (0x02, ControllerResponder),
            (0x02, ControleeResponder),
        ];
        const VERSION2: &[(u64, DeviceRoleCapability)] = &[
            (0x01, ControllerInitiator),
            (0x01, ControleeInitiator),
            (0x02, ControllerResponder),
            (0x02, ControleeResponder),
            (0x04, UtSynchronizationAnchor),
            (0x08, UtAnchor),
            (0x10, UtTag),
            (0x20, Advertiser),
            (0x40, Observer),
            (0x80, DtAnchor),
            (0x0100, DtTag),
        ];
        match self {
            Self::Version1 => VERSION1,
            Self::Version2 => VERSION2,
        }
    }

    fn ranging_round_table(self) -> &'static [(u64, RangingRoundCapability)] {
        use RangingRoundCapability::*;
        const VERSION1: &[(u64, RangingRoundCapability)] = &[(0x04, DsTwr), (0x02, SsTwr)];
        const VERSION2: &[(u64, RangingRoundCapability)] = &[
            (0x04, DsTwr),
            (0x02, SsTwr),
            (0x01, OwrUlTdoa),
            (0x20, OwrDlTdoa),
            (0x40, OwrAoa),
            (0x80, EssTwrNonDeferred),
            (0x0100, AdsTwr),
        ];
        match self {
            Self::Version1 => VERSION1,
            Self::Version2 => VERSION2,
        }
    }

    fn ranging_time_struct_table(self) -> &'static [(u64, RangingTimeStructCapability)] {
        use RangingTimeStructCapability::*;
        match self {
            Self::Version1 => &[(0x01, IntervalBasedScheduling), (0x02, BlockBasedScheduling)],
            Self::Version2 => &[(0x02, BlockBasedScheduling)],
        }
    }
}

const STS_TABLE: &[(u64, StsCapability)] = &[
    (0x01, StsCapability::Static),
    (0x02, StsCapability::Dynamic),
    (0x04, StsCapability::DynamicIndividualControleeKey),
    (0x08, StsCapability::Provisioned),
    (0x10, StsCapability::ProvisionedIndividualControleeKey),
];

const MULTI_NODE_TABLE: &[(u64, MultiNodeCapability)] = &[
    (0x01, MultiNodeCapability::Unicast),
    (0x02, MultiNodeCapability::OneToMany),
    (0x04, MultiNodeCapability::ManyToMany),
];

const SCHEDULING_MODE_TABLE: &[(u64, SchedulingModeCapability)] = &[
    (0x01, SchedulingModeCapability::ContentionBasedRanging),
    (0x02, SchedulingModeCapability::TimeScheduledRanging),
];

const CC_CONSTRAINT_LENGTH_TABLE: &[(u64, CcConstraintLengthCapability)] = &[
    (CC_CONSTRAINT_LENGTH_K3, CcConstraintLengthCapability::K3),
    (CC_CONSTRAINT_LENGTH_K7, CcConstraintLengthCapability::K7),
];

const CHANNEL_TABLE: &[(u64, u8)] = &[
    (0x01, 5),
    (0x02, 6),
    (0x04, 8),
    (0x08, 9),
    (0x10, 10),
    (0x20, 12),
    (0x40, 13),
    (0x80, 14),
];

const RFRAME_TABLE: &[(u64, RframeCapability)] =
    &[(0x01, RframeCapability::Sp0), (0x02, RframeCapability::Sp1), (0x08, RframeCapability::Sp3)];

const AOA_TABLE: &[(u64, AoaCapability)] = &[
    (0x01, AoaCapability::Azimuth90),
    (0x02, AoaCapability::Azimuth180),
    (0x04, AoaCapability::Elevation),
    (0x08, AoaCapability::Fom),
];

const RANGE_DATA_NTF_CONFIG_TABLE: &[(u64, RangeDataNtfConfigCapability)] = &[
    (1 << 0, RangeDataNtfConfigCapability::Enable),
    (1 << 1, RangeDataNtfConfigCapability::Disable),
    (1 << 2, RangeDataNtfConfigCapability::ProximityLevelTrig),
    (1 << 3, RangeDataNtfConfigCapability::AoaLevelTrig),
    (1 << 4, RangeDataNtfConfigCapability::ProximityAoaLevelTrig),
    (1 << 5, RangeDataNtfConfigCapability::ProximityEdgeTrig),
    (1 << 6, RangeDataNtfConfigCapability::AoaEdgeTrig),
    (1 << 7, RangeDataNtfConfigCapability::ProximityAoaEdgeTrig),
];

fn flags_from_table<T: Copy + Ord>(bitmap: u64, table: &[(u64, T)]) -> BTreeSet<T> {
    table.iter().filter(|(mask, _)| is_bit_set(bitmap, *mask)).map(|(_, flag)| *flag).collect()
}

/// The device role capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeviceRoleCapability {
    ControllerInitiator = 0,
    ControllerResponder = 1,
    ControleeInitiator = 2,
    ControleeResponder = 3,
    UtSynchronizationAnchor = 4,
    UtAnchor = 5,
    UtTag = 6,
    Advertiser = 7,
    Observer = 8,
    DtAnchor = 9,
    DtTag = 10,
}

/// The ranging round capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RangingRoundCapability {
    DsTwr = 0,
    SsTwr = 1,
    OwrUlTdoa = 2,
    OwrDlTdoa = 3,
    OwrAoa = 4,
    EssTwrNonDeferred = 5,
    AdsTwr = 6,
}

/// The STS capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StsCapability {
    Static = 0,
    Dynamic = 1,
    DynamicIndividualControleeKey = 2,
    Provisioned = 3,
    ProvisionedIndividualControleeKey = 4,
}

/// The multi-node mode capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MultiNodeCapability {
    Unicast = 0,
    OneToMany = 1,
    ManyToMany = 2,
}

/// The ranging time structure capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RangingTimeStructCapability {
    IntervalBasedScheduling = 0,
    BlockBasedScheduling = 1,
}

/// The scheduling mode capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchedulingModeCapability {
    ContentionBasedRanging = 0,
    TimeScheduledRanging = 1,
}

/// The convolutional code constraint length capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CcConstraintLengthCapability {
    K3 = 0,
    K7 = 1,
}

/// The RFRAME configuration capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RframeCapability {
    Sp0 = 0,
    Sp1 = 1,
    Sp3 = 3,
}

/// The PRF capabilities, derived from the BPRF and HPRF parameter sets.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrfCapability {
    Bprf = 0,
    Hprf = 1,
}

/// The PSDU data rate capabilities, derived from the PRF and the constraint length capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PsduDataRateCapability {
    Rate6M81 = 0,
    Rate7M80 = 1,
    Rate27M2 = 2,
    Rate31M2 = 3,
}

/// The AoA capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AoaCapability {
    Azimuth90 = 0,
    Azimuth180 = 1,
    Elevation = 2,
    Fom = 3,
    Interleaving = 4,
}

/// The range data notification configuration capabilities.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RangeDataNtfConfigCapability {
    Enable = 0,
    Disable = 1,
    ProximityLevelTrig = 2,
    AoaLevelTrig = 3,
    ProximityAoaLevelTrig = 4,
    ProximityEdgeTrig = 5,
    AoaEdgeTrig = 6,
    ProximityAoaEdgeTrig = 7,
}

/// The FiRa capabilities of the UWBS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiraSpecificationParams {
    pub layout: FiraCapsLayout,
    pub min_phy_version: FiraProtocolVersion,
    pub max_phy_version: FiraProtocolVersion,
    pub min_mac_version: FiraProtocolVersion,
    pub max_mac_version: FiraProtocolVersion,
    pub device_roles: BTreeSet<DeviceRoleCapability>,
    pub ranging_rounds: BTreeSet<RangingRoundCapability>,
    pub has_non_deferred_mode_support: bool,
    pub sts_capabilities: BTreeSet<StsCapability>,
    pub multi_node_capabilities: BTreeSet<MultiNodeCapability>,
    pub ranging_time_struct_capabilities: BTreeSet<RangingTimeStructCapability>,
    pub scheduling_mode_capabilities: BTreeSet<SchedulingModeCapability>,
    pub cc_constraint_length_capabilities: BTreeSet<CcConstraintLengthCapability>,
    pub has_block_striding_support: bool,
    pub has_hopping_preference_support: bool,
    pub has_extended_mac_address_support: bool,
    pub has_initiation_time_support: bool,
    pub supported_channels: Vec<u8>,
    pub rframe_capabilities: BTreeSet<RframeCapability>,
    pub bprf_parameter_sets: u8,
    pub hprf_parameter_sets: u64,
    pub prf_capabilities: BTreeSet<PrfCapability>,
    pub psdu_data_rate_capabilities: BTreeSet<PsduDataRateCapability>,
    pub aoa_capabilities: BTreeSet<AoaCapability>,
    pub max_message_size: Option<u16>,
    pub max_data_packet_payload_size: Option<u16>,
    /// Only reported in the 2.0 layout.
    pub device_type: Option<u8>,
    pub has_suspend_ranging_support: bool,
    /// Only reported in the 2.0 layout.
    pub session_key_length: Option<u8>,
    pub dt_tag_max_active_rr: Option<u8>,
    pub has_dt_tag_block_skipping_support: bool,
    pub has_psdu_length_support: bool,
    pub min_ranging_interval_ms: Option<u32>,
    pub min_slot_duration_us: Option<u32>,
    pub max_ranging_session_number: Option<u32>,
    pub has_rssi_reporting_support: bool,
    pub has_diagnostics_support: bool,
    pub range_data_ntf_config_capabilities: BTreeSet<RangeDataNtfConfigCapability>,
}

impl FiraSpecificationParams {
    /// Decode the FiRa capabilities. A missing optional field is logged and left at its default,
    /// a missing required field aborts the decode.
    pub fn from_tlv_buffer(tlvs: &TlvBuffer) -> Result<Self, DecodeError> {
        let reader = FiraCapsReader { tlvs, layout: FiraCapsLayout::detect(tlvs)? };
        let layout = reader.layout;

        let phy_versions = reader.required_bytes(FiraCapField::PhyVersionRange)?;
        let (min_phy_version, max_phy_version) =
            version_range(phy_versions, FiraCapField::PhyVersionRange, &reader)?;
        let mac_versions = reader.required_bytes(FiraCapField::MacVersionRange)?;
        let (min_mac_version, max_mac_version) =
            version_range(mac_versions, FiraCapField::MacVersionRange, &reader)?;

        let device_roles = flags_from_table(
            reader.required_bitmap(FiraCapField::DeviceRoles)?,
            layout.device_role_table(),
        );
        let ranging_method = reader.required_bitmap(FiraCapField::RangingMethod)?;
        let ranging_rounds = flags_from_table(ranging_method, layout.ranging_round_table());
        let has_non_deferred_mode_support = is_bit_set(ranging_method, DS_TWR_NON_DEFERRED)
            || is_bit_set(ranging_method, SS_TWR_NON_DEFERRED);

        let sts_capabilities =
            flags_from_table(reader.required_byte(FiraCapField::StsConfig)?, STS_TABLE);
        let multi_node_capabilities =
            flags_from_table(reader.required_byte(FiraCapField::MultiNodeModes)?, MULTI_NODE_TABLE);
        let ranging_time_struct_capabilities = flags_from_table(
            reader.required_byte(FiraCapField::RangingTimeStruct)?,
            layout.ranging_time_struct_table(),
        );
        let scheduling_mode_capabilities = flags_from_table(
            reader.required_byte(FiraCapField::ScheduledMode)?,
            SCHEDULING_MODE_TABLE,
        );
        let cc_constraint_length = reader.required_byte(FiraCapField::CcConstraintLength)?;
        let cc_constraint_length_capabilities =
            flags_from_table(cc_constraint_length, CC_CONSTRAINT_LENGTH_TABLE);

        let has_block_striding_support =
            is_bit_set(reader.required_byte(FiraCapField::BlockStriding)?, BLOCK_STRIDING);
        let has_hopping_preference_support =
            is_bit_set(reader.required_byte(FiraCapField::HoppingMode)?, HOPPING_MODE);
        let has_extended_mac_address_support = is_bit_set(
            reader.required_byte(FiraCapField::ExtendedMacAddress)?,
            EXTENDED_MAC_ADDRESS,
        );
        let has_initiation_time_support =
            is_bit_set(reader.required_byte(FiraCapField::UwbInitiationTime)?, UWB_INITIATION_TIME);

        let supported_channels = flags_from_table(
            reader.required_byte(FiraCapField::Channels)?,
            CHANNEL_TABLE,
        )
        .into_iter()
        .collect();
        let rframe_capabilities =
            flags_from_table(reader.required_byte(FiraCapField::RframeConfig)?, RFRAME_TABLE);

        let bprf_parameter_sets = reader.required_byte(FiraCapField::BprfParameterSets)? as u8;
        // The HPRF parameter sets are 5 bytes, the first byte carries the lowest sets.
        let hprf_bytes = reader.required_bytes(FiraCapField::HprfParameterSets)?;
        let hprf_parameter_sets = bytes_to_u64_widened(hprf_bytes).ok_or_else(|| {
            DecodeError::LengthMismatch {
                tag: layout.tag(FiraCapField::HprfParameterSets).unwrap_or_default(),
                expected: 5,
                actual: hprf_bytes.len(),
            }
        })?;
        let has_bprf_support = bprf_parameter_sets != 0;
        let has_hprf_support = hprf_bytes.iter().any(|b| *b != 0);
        let mut prf_capabilities = BTreeSet::new();
        if has_bprf_support {
            prf_capabilities.insert(PrfCapability::Bprf);
        }
        if has_hprf_support {
            prf_capabilities.insert(PrfCapability::Hprf);
        }
        let psdu_data_rate_capabilities = [
            (CC_CONSTRAINT_LENGTH_K3, has_bprf_support, PsduDataRateCapability::Rate6M81),
            (CC_CONSTRAINT_LENGTH_K7, has_bprf_support, PsduDataRateCapability::Rate7M80),
            (CC_CONSTRAINT_LENGTH_K3, has_hprf_support, PsduDataRateCapability::Rate27M2),
            (CC_CONSTRAINT_LENGTH_K7, has_hprf_support, PsduDataRateCapability::Rate31M2),
        ]
        .into_iter()
        .filter(|(mask, prf, _)| *prf && is_bit_set(cc_constraint_length, *mask))
        .map(|(_, _, rate)| rate)
        .collect();

        let mut aoa_capabilities =
            flags_from_table(reader.required_byte(FiraCapField::Aoa)?, AOA_TABLE);
        if let Some(interleaving) = optional(
            tlvs.get_byte(SUPPORTED_AOA_RESULT_REQ_INTERLEAVING),
            "SUPPORTED_AOA_RESULT_REQ_INTERLEAVING",
        ) {
            if is_bit_set(interleaving as u64, AOA_RESULT_REQ_INTERLEAVING) {
                aoa_capabilities.insert(AoaCapability::Interleaving);
            }
        }

        let max_message_size =
            optional(reader.short(FiraCapField::MaxMessageSize), "SUPPORTED_MAX_MESSAGE_SIZE");
        let max_data_packet_payload_size = optional(
            reader.short(FiraCapField::MaxDataPacketPayloadSize),
            "SUPPORTED_MAX_DATA_PACKET_PAYLOAD_SIZE",
        );

        let mut params = Self {
            layout,
            min_phy_version,
            max_phy_version,
            min_mac_version,
            max_mac_version,
            device_roles,
            ranging_rounds,
            has_non_deferred_mode_support,
            sts_capabilities,
            multi_node_capabilities,
            ranging_time_struct_capabilities,
            scheduling_mode_capabilities,
            cc_constraint_length_capabilities,
            has_block_striding_support,
            has_hopping_preference_support,
            has_extended_mac_address_support,
            has_initiation_time_support,
            supported_channels,
            rframe_capabilities,
            bprf_parameter_sets,
            hprf_parameter_sets,
            prf_capabilities,
            psdu_data_rate_capabilities,
            aoa_capabilities,
            max_message_size,
            max_data_packet_payload_size,
            device_type: None,
            has_suspend_ranging_support: false,
            session_key_length: None,
            dt_tag_max_active_rr: None,
            has_dt_tag_block_skipping_support: false,
            has_psdu_length_support: false,
            min_ranging_interval_ms: None,
            min_slot_duration_us: None,
            max_ranging_session_number: None,
            has_rssi_reporting_support: false,
            has_diagnostics_support: false,
            range_data_ntf_config_capabilities: BTreeSet::new(),
        };

        if layout == FiraCapsLayout::Version2 {
            params.device_type = Some(reader.required_byte(FiraCapField::DeviceType)? as u8);
            params.has_suspend_ranging_support =
                reader.required_byte(FiraCapField::SuspendRanging)? != 0;
            params.session_key_length =
                Some(reader.required_byte(FiraCapField::SessionKeyLength)? as u8);
            params.dt_tag_max_active_rr = optional(
                reader.byte(FiraCapField::DtTagMaxActiveRr),
                "SUPPORTED_DT_TAG_MAX_ACTIVE_RR",
            )
            .map(|value| value as u8);
            params.has_dt_tag_block_skipping_support = optional(
                reader.byte(FiraCapField::DtTagBlockSkipping),
                "SUPPORTED_DT_TAG_BLOCK_SKIPPING",
            )
            .map_or(false, |value| is_bit_set(value, DT_TAG_BLOCK_SKIPPING));
            params.has_psdu_length_support = optional(
                reader.byte(FiraCapField::PsduLengthSupport),
                "SUPPORTED_PSDU_LENGTH",
            )
            .map_or(false, |value| is_bit_set(value, PSDU_LENGTH_SUPPORT));
        }

        params.decode_vendor_fields(tlvs);
        Ok(params)
    }

    fn decode_vendor_fields(&mut self, tlvs: &TlvBuffer) {
        self.min_ranging_interval_ms = optional(
            tlvs.get_int(SUPPORTED_MIN_RANGING_INTERVAL_MS),
            "SUPPORTED_MIN_RANGING_INTERVAL_MS",
        );
        self.min_slot_duration_us = optional(
            tlvs.get_int(SUPPORTED_MIN_SLOT_DURATION_RSTU),
            "SUPPORTED_MIN_SLOT_DURATION",
        )
        .map(rstu_to_us);
        self.max_ranging_session_number = optional(
            tlvs.get_int(SUPPORTED_MAX_RANGING_SESSION_NUMBER),
            "SUPPORTED_MAX_RANGING_SESSION_NUMBER",
        );
        self.has_rssi_reporting_support =
            optional(tlvs.get_byte(SUPPORTED_RSSI_REPORTING), "SUPPORTED_RSSI_REPORTING")
                .map_or(false, |value| is_bit_set(value as u64, RSSI_REPORTING));
        self.has_diagnostics_support =
            optional(tlvs.get_byte(SUPPORTED_DIAGNOSTICS), "SUPPORTED_DIAGNOSTICS")
                .map_or(false, |value| is_bit_set(value as u64, DIAGNOSTICS));
        // The bitmap is reported with the lowest bits in the first byte.
        if let Some(bitmap) = optional(
            tlvs.get_byte_array(SUPPORTED_RANGE_DATA_NTF_CONFIG)
                .and_then(|bytes| bytes_to_u64_widened(bytes).ok_or(DecodeError::Truncated)),
            "SUPPORTED_RANGE_DATA_NTF_CONFIG",
        ) {
            self.range_data_ntf_config_capabilities =
                flags_from_table(bitmap, RANGE_DATA_NTF_CONFIG_TABLE);
        }
    }

    /// Whether the UWBS supports the UCI test messages, which requires a FiRa 2.0 MAC.
    pub fn supports_test_messages(&self) -> bool {
        self.max_mac_version.major >= 2
    }

    /// Convert the capabilities into the bundle delivered to the clients.
    pub fn to_bundle(&self) -> Bundle {
        fn flags<T: Copy + Into<i32>>(set: &BTreeSet<T>) -> Vec<i32> {
            set.iter().map(|flag| (*flag).into()).collect()
        }

        let mut bundle =
            Bundle::with_header(ProtocolName::Fira, FIRA_SPECIFICATION_BUNDLE_VERSION);
        bundle
            .put_string("min_phy_version", self.min_phy_version.to_string())
            .put_string("max_phy_version", self.max_phy_version.to_string())
            .put_string("min_mac_version", self.min_mac_version.to_string())
            .put_string("max_mac_version", self.max_mac_version.to_string())
            .put_int_array("device_role_capabilities", flags(&self.device_roles))
            .put_int_array("ranging_round_capabilities", flags(&self.ranging_rounds))
            .put_bool("non_deferred_mode_supported", self.has_non_deferred_mode_support)
            .put_int_array("sts_capabilities", flags(&self.sts_capabilities))
            .put_int_array("multi_node_capabilities", flags(&self.multi_node_capabilities))
            .put_int_array(
                "ranging_time_struct_capabilities",
                flags(&self.ranging_time_struct_capabilities),
            )
            .put_int_array(
                "scheduling_mode_capabilities",
                flags(&self.scheduling_mode_capabilities),
            )
            .put_int_array(
                "cc_constraint_length_capabilities",
                flags(&self.cc_constraint_length_capabilities),
            )
            .put_bool("block_striding_supported", self.has_block_striding_support)
            .put_bool("hopping_preference_supported", self.has_hopping_preference_support)
            .put_bool("extended_mac_address_supported", self.has_extended_mac_address_support)
            .put_bool("initiation_time_supported", self.has_initiation_time_support)
            .put_int_array(
                "channels",
                self.supported_channels.iter().map(|ch| *ch as i32).collect(),
            )
            .put_int_array("rframe_capabilities", flags(&self.rframe_capabilities))
            .put_int("bprf_parameter_set_capabilities", self.bprf_parameter_sets as i32)
            .put_long("hprf_parameter_set_capabilities", self.hprf_parameter_sets as i64)
            .put_int_array("prf_capabilities", flags(&self.prf_capabilities))
            .put_int_array(
                "psdu_data_rate_capabilities",
                flags(&self.psdu_data_rate_capabilities),
            )
            .put_int_array("aoa_capabilities", flags(&self.aoa_capabilities))
            .put_bool("suspend_ranging_supported", self.has_suspend_ranging_support)
            .put_bool("dt_tag_block_skipping_supported", self.has_dt_tag_block_skipping_support)
            .put_bool("psdu_length_supported", self.has_psdu_length_support)
            .put_bool("rssi_reporting_supported", self.has_rssi_reporting_support)
            .put_bool("diagnostics_supported", self.has_diagnostics_support)
            .put_int_array(
                "range_data_ntf_config_capabilities",
                flags(&self.range_data_ntf_config_capabilities),
            );

        let optional_ints = [
            ("max_message_size", self.max_message_size.map(i32::from)),
            ("max_data_packet_payload_size", self.max_data_packet_payload_size.map(i32::from)),
            ("device_type", self.device_type.map(i32::from)),
            ("session_key_length", self.session_key_length.map(i32::from)),
            ("dt_tag_max_active_rr", self.dt_tag_max_active_rr.map(i32::from)),
            ("min_ranging_interval_ms", self.min_ranging_interval_ms.map(|v| v as i32)),
            ("min_slot_duration_us", self.min_slot_duration_us.map(|v| v as i32)),
            ("max_ranging_session_number", self.max_ranging_session_number.map(|v| v as i32)),
        ];
        for (key, value) in optional_ints {
            if let Some(value) = value {
                bundle.put_int(key, value);
            }
        }
        bundle
    }
}

macro_rules! flag_into_i32 {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for i32 {
                fn from(flag: $ty) -> i32 {
                    flag as i32
                }
            }
        )*
    };
}
flag_into_i32!(
    DeviceRoleCapability,
    RangingRoundCapability,
    StsCapability,
    MultiNodeCapability,
    RangingTimeStructCapability,
    SchedulingModeCapability,
    CcConstraintLengthCapability,
    RframeCapability,
    PrfCapability,
    PsduDataRateCapability,
    AoaCapability,
    RangeDataNtfConfigCapability
);

/// 1 RSTU = 416 chips = 833.33 ns.
fn rstu_to_us(rstu: u32) -> u32 {
    (rstu as u64 * 5 / 6) as u32
}

fn version_range(
    bytes: &[u8],
    field: FiraCapField,
    reader: &FiraCapsReader,
) -> Result<(FiraProtocolVersion, FiraProtocolVersion), DecodeError> {
    match bytes {
        [min_major, min_minor, max_major, max_minor] => Ok((
            FiraProtocolVersion { major: *min_major, minor: *min_minor },
            FiraProtocolVersion { major: *max_major, minor: *max_minor },
        )),
        _ => Err(DecodeError::LengthMismatch {
            tag: reader.layout.tag(field).unwrap_or_default(),
            expected: 4,
            actual: bytes.len(),
        }),
    }
}

struct FiraCapsReader<'a> {
    tlvs: &'a TlvBuffer,
    layout: FiraCapsLayout,
}

impl<'a> FiraCapsReader<'a> {
    fn tag(&self, field: FiraCapField) -> Result<u8, DecodeError> {
        self.layout.tag(field).ok_or(DecodeError::UnsupportedVersion)
    }

    fn bytes(&self, field: FiraCapField) -> Result<&'a [u8], DecodeError> {
        self.tlvs.get_byte_array(self.tag(field)?)
    }

    fn byte(&self, field: FiraCapField) -> Result<u64, DecodeError> {
        self.tlvs.get_byte(self.tag(field)?).map(u64::from)
    }

    fn short(&self, field: FiraCapField) -> Result<u16, DecodeError> {
        self.tlvs.get_short(self.tag(field)?)
    }

    fn required_bytes(&self, field: FiraCapField) -> Result<&'a [u8], DecodeError> {
        required(self.bytes(field), &format!("{:?}", field))
    }

    /// Read a 1-byte bitmap field as u64.
    fn required_byte(&self, field: FiraCapField) -> Result<u64, DecodeError> {
        required(self.byte(field), &format!("{:?}", field))
    }

    /// Read a bitmap field whose width depends on the layout.
    fn required_bitmap(&self, field: FiraCapField) -> Result<u64, DecodeError> {
        let bytes = self.required_bytes(field)?;
        let expected = self.layout.bitmap_width();
        if bytes.len() != expected {
            return Err(DecodeError::LengthMismatch {
                tag: self.layout.tag(field).unwrap_or_default(),
                expected,
                actual: bytes.len(),
            });
        }
        bytes_to_u64_widened(bytes).ok_or(DecodeError::Truncated)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// The capabilities of a FiRa 1.1 UWBS.
    pub(crate) fn generate_fira_v1_caps() -> TlvBuffer {
        let mut tlvs = TlvBuffer::new();
        tlvs.put_byte_array(0x00, vec![1, 1, 1, 3])
            .put_byte_array(0x01, vec![1, 1, 1, 3])
            .put_byte(0x02, 0x03) // Initiator and responder.
            .put_byte(0x03, 0x1E) // SS/DS-TWR, deferred and non-deferred.
            .put_byte(0x04, 0x1F)
            .put_byte(0x05, 0x07)
            .put_byte(0x06, 0x03)
            .put_byte(0x07, 0x01)
            .put_byte(0x08, 0x01)
            .put_byte(0x09, 0x00)
            .put_byte(0x0A, 0x01)
            .put_byte(0x0B, 0x0A) // Channel 6 and 9.
            .put_byte(0x0C, 0x09)
            .put_byte(0x0D, 0x03)
            .put_byte(0x0E, 0x01)
            .put_byte_array(0x0F, vec![0x00, 0x00, 0x00, 0x00, 0x00])
            .put_byte(0x10, 0x0F)
            .put_byte(0x11, 0x01)
            .put_short(0x12, 1024)
            .put_byte(0xE3, 0x01)
            .put_int(0xE4, 120)
            .put_byte_array(0xE5, vec![0xFF, 0x00, 0x00, 0x00])
            .put_byte(0xE6, 0x01)
            .put_int(0xE8, 1200);
        tlvs
    }

    /// The capabilities of a FiRa 2.0 UWBS.
    pub(crate) fn generate_fira_v2_caps() -> TlvBuffer {
        let mut tlvs = TlvBuffer::new();
        tlvs.put_short(0x00, 255)
            .put_short(0x01, 1000)
            .put_byte_array(0x02, vec![2, 0, 2, 0])
            .put_byte_array(0x03, vec![1, 1, 2, 0])
            .put_byte(0x04, 0x01)
            .put_byte_array(0x05, vec![0xFF, 0x01])
            .put_byte_array(0x06, vec![0x06, 0x01])
            .put_byte(0x07, 0x03)
            .put_byte(0x08, 0x01)
            .put_byte(0x09, 0x03)
            .put_byte(0x0A, 0x02)
            .put_byte(0x0B, 0x00)
            .put_byte(0x0C, 0x01)
            .put_byte(0x0D, 0x00)
            .put_byte(0x0E, 0x08)
            .put_byte(0x0F, 0x08)
            .put_byte(0x10, 0x02)
            .put_byte(0x11, 0x00)
            .put_byte_array(0x12, vec![0x00, 0x01, 0x00, 0x00, 0x80])
            .put_byte(0x13, 0x03)
            .put_byte(0x14, 0x00)
            .put_byte(0x15, 0x01)
            .put_byte(0x16, 0x20)
            .put_byte(0x18, 0x01)
            .put_int(0xE9, 8)
            .put_byte(0xE7, 0x01);
        tlvs
    }

    #[test]
    fn test_decode_version_1() {
        let params = FiraSpecificationParams::from_tlv_buffer(&generate_fira_v1_caps()).unwrap();

        assert_eq!(params.layout, FiraCapsLayout::Version1);
        assert_eq!(params.max_mac_version, FiraProtocolVersion { major: 1, minor: 3 });
        assert_eq!(
            params.device_roles,
            BTreeSet::from([
                DeviceRoleCapability::ControllerInitiator,
                DeviceRoleCapability::ControllerResponder,
                DeviceRoleCapability::ControleeInitiator,
                DeviceRoleCapability::ControleeResponder,
            ])
        );
        assert_eq!(
            params.ranging_rounds,
            BTreeSet::from([RangingRoundCapability::DsTwr, RangingRoundCapability::SsTwr])
        );
        assert!(params.has_non_deferred_mode_support);
        assert_eq!(params.sts_capabilities.len(), 5);
        assert_eq!(
            params.ranging_time_struct_capabilities,
            BTreeSet::from([
                RangingTimeStructCapability::IntervalBasedScheduling,
                RangingTimeStructCapability::BlockBasedScheduling,
            ])
        );
        assert!(!params.has_block_striding_support);
        assert!(params.has_hopping_preference_support);
        assert_eq!(params.supported_channels, vec![6, 9]);
        assert_eq!(
            params.rframe_capabilities,
            BTreeSet::from([RframeCapability::Sp0, RframeCapability::Sp3])
        );
        assert_eq!(params.prf_capabilities, BTreeSet::from([PrfCapability::Bprf]));
        assert_eq!(
            params.psdu_data_rate_capabilities,
            BTreeSet::from([PsduDataRateCapability::Rate6M81, PsduDataRateCapability::Rate7M80])
        );
        assert!(params.aoa_capabilities.contains(&AoaCapability::Interleaving));
        assert_eq!(params.aoa_capabilities.len(), 5);
        assert_eq!(params.max_message_size, Some(1024));
        assert_eq!(params.max_data_packet_payload_size, None);
        assert_eq!(params.device_type, None);
        assert_eq!(params.min_ranging_interval_ms, Some(120));
        assert_eq!(params.min_slot_duration_us, Some(1000));
        assert_eq!(params.max_ranging_session_number, None);
        assert!(params.has_rssi_reporting_support);
        assert!(!params.has_diagnostics_support);
        assert_eq!(params.range_data_ntf_config_capabilities.len(), 8);
        assert!(!params.supports_test_messages());
    }

    #[test]
    fn test_decode_version_2() {
        let params = FiraSpecificationParams::from_tlv_buffer(&generate_fira_v2_caps()).unwrap();

        assert_eq!(params.layout, FiraCapsLayout::Version2);
        assert_eq!(params.min_phy_version, FiraProtocolVersion { major: 2, minor: 0 });
        assert_eq!(params.min_mac_version, FiraProtocolVersion { major: 1, minor: 1 });
        assert_eq!(params.max_mac_version, FiraProtocolVersion { major: 2, minor: 0 });
        assert_eq!(params.device_roles.len(), 11);
        assert_eq!(
            params.ranging_rounds,
            BTreeSet::from([
                RangingRoundCapability::DsTwr,
                RangingRoundCapability::SsTwr,
                RangingRoundCapability::AdsTwr,
            ])
        );
        assert!(!params.has_non_deferred_mode_support);
        assert_eq!(
            params.ranging_time_struct_capabilities,
            BTreeSet::from([RangingTimeStructCapability::BlockBasedScheduling])
        );
        assert_eq!(params.supported_channels, vec![9]);
        assert_eq!(params.hprf_parameter_sets, 0x80_0000_0100);
        assert_eq!(params.prf_capabilities, BTreeSet::from([PrfCapability::Hprf]));
        assert_eq!(
            params.psdu_data_rate_capabilities,
            BTreeSet::from([PsduDataRateCapability::Rate31M2])
        );
        // The interleaving tag is absent.
        assert_eq!(
            params.aoa_capabilities,
            BTreeSet::from([AoaCapability::Azimuth90, AoaCapability::Azimuth180])
        );
        assert_eq!(params.max_message_size, Some(255));
        assert_eq!(params.max_data_packet_payload_size, Some(1000));
        assert_eq!(params.device_type, Some(1));
        assert!(params.has_suspend_ranging_support);
        assert_eq!(params.session_key_length, Some(0x20));
        assert_eq!(params.dt_tag_max_active_rr, None);
        assert!(params.has_dt_tag_block_skipping_support);
        assert!(!params.has_psdu_length_support);
        assert_eq!(params.max_ranging_session_number, Some(8));
        assert!(params.has_diagnostics_support);
        assert!(params.supports_test_messages());
    }

    #[test]
    fn test_unsupported_layout() {
        let mut tlvs = generate_fira_v1_caps();
        tlvs.put_short(0x02, 0x0003);
        assert_eq!(
            FiraSpecificationParams::from_tlv_buffer(&tlvs),
            Err(DecodeError::UnsupportedVersion)
        );

        assert_eq!(
            FiraSpecificationParams::from_tlv_buffer(&TlvBuffer::new()),
            Err(DecodeError::TagNotFound(0x02))
        );
    }

    #[test]
    fn test_missing_required_field() {
        let mut tlvs = generate_fira_v2_caps();
        tlvs.put_byte_array(0x16, vec![]);
        assert_eq!(
            FiraSpecificationParams::from_tlv_buffer(&tlvs),
            Err(DecodeError::LengthMismatch { tag: 0x16, expected: 1, actual: 0 })
        );

        let mut tlvs = TlvBuffer::new();
        for tag in generate_fira_v1_caps().tags().filter(|tag| *tag != 0x0C) {
            tlvs.put_byte_array(tag, generate_fira_v1_caps().get_byte_array(tag).unwrap().to_vec());
        }
        assert_eq!(
            FiraSpecificationParams::from_tlv_buffer(&tlvs),
            Err(DecodeError::TagNotFound(0x0C))
        );
    }

    #[test]
    fn test_version_2_bitmap_width() {
        let mut tlvs = generate_fira_v2_caps();
        tlvs.put_byte(0x05, 0x01);
        assert_eq!(
            FiraSpecificationParams::from_tlv_buffer(&tlvs),
            Err(DecodeError::LengthMismatch { tag: 0x05, expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_tag_tables() {
        assert_eq!(FiraCapsLayout::Version1.tag(FiraCapField::DeviceRoles), Some(0x02));
        assert_eq!(FiraCapsLayout::Version2.tag(FiraCapField::PhyVersionRange), Some(0x02));
        assert_eq!(FiraCapsLayout::Version1.tag(FiraCapField::SuspendRanging), None);
        assert_eq!(FiraCapsLayout::Version2.tag(FiraCapField::MaxMessageSize), Some(0x00));
    }

    #[test]
    fn test_to_bundle() {
        let params = FiraSpecificationParams::from_tlv_buffer(&generate_fira_v1_caps()).unwrap();
        let bundle = params.to_bundle();

        assert_eq!(bundle.protocol_name(), Ok(ProtocolName::Fira));
        assert_eq!(bundle.get_string("max_mac_version"), Ok("1.3".to_string()));
        assert_eq!(bundle.get_int_array("channels"), Ok(vec![6, 9]));
        assert_eq!(bundle.get_int("min_slot_duration_us"), Ok(1000));
        assert!(!bundle.contains_key("device_type"));
    }
}
