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

//! This module decodes the CCC capabilities reported by the UWBS. The Aliro capabilities share
//! the same TLV layout.

use log::error;

use crate::caps::tlv_buffer::{is_bit_set, optional, required, TlvBuffer};
use crate::error::DecodeError;
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::ccc_app_config_params::{
    CccProtocolVersion, CccPulseShapeCombo, ChapsPerSlot, HoppingConfigMode, HoppingSequence,
};

const SPECIFICATION_BUNDLE_VERSION: i32 = 1;

const CCC_SUPPORTED_VERSIONS: u8 = 0xA0;
const CCC_SUPPORTED_UWB_CONFIGS: u8 = 0xA1;
const CCC_SUPPORTED_PULSE_SHAPE_COMBOS: u8 = 0xA2;
const CCC_SUPPORTED_RAN_MULTIPLIER: u8 = 0xA3;
const CCC_SUPPORTED_CHAPS_PER_SLOT: u8 = 0xA4;
const CCC_SUPPORTED_SYNC_CODES: u8 = 0xA5;
const CCC_SUPPORTED_CHANNELS: u8 = 0xA6;
const CCC_SUPPORTED_HOPPING_CONFIG_MODES_AND_SEQUENCES: u8 = 0xA7;
const CCC_SUPPORTED_MAX_RANGING_SESSION_NUMBER: u8 = 0xE9;
const CCC_SUPPORTED_MIN_UWB_INITIATION_TIME_MS: u8 = 0xEA;
const CCC_PRIORITIZED_CHANNEL_LIST: u8 = 0xEB;
const CCC_SUPPORTED_UWBS_MAX_PPM: u8 = 0xEC;

const CHAPS_PER_SLOT_TABLE: &[(u64, ChapsPerSlot)] = &[
    (0x01, ChapsPerSlot::Value3),
    (0x02, ChapsPerSlot::Value4),
    (0x04, ChapsPerSlot::Value6),
    (0x08, ChapsPerSlot::Value8),
    (0x10, ChapsPerSlot::Value9),
    (0x20, ChapsPerSlot::Value12),
    (0x40, ChapsPerSlot::Value24),
];

const CHANNEL_TABLE: &[(u64, u8)] = &[(0x01, 5), (0x02, 9)];

const HOPPING_CONFIG_MODE_TABLE: &[(u64, HoppingConfigMode)] = &[
    (0x80, HoppingConfigMode::None),
    (0x40, HoppingConfigMode::Continuous),
    (0x20, HoppingConfigMode::Adaptive),
];

const HOPPING_SEQUENCE_TABLE: &[(u64, HoppingSequence)] =
    &[(0x10, HoppingSequence::Aes), (0x08, HoppingSequence::Default)];

const DEFAULT_MAX_RANGING_SESSION_NUMBER: u32 = 1;
const DEFAULT_MIN_UWB_INITIATION_TIME_MS: i32 = -1;
const DEFAULT_UWBS_MAX_PPM: u16 = 0;

const KEY_PROTOCOL_VERSIONS: &str = "protocol_versions";
const KEY_UWB_CONFIGS: &str = "uwb_configs";
const KEY_PULSE_SHAPE_COMBOS: &str = "pulse_shape_combos";
const KEY_RAN_MULTIPLIER: &str = "ran_multiplier";
const KEY_MAX_RANGING_SESSION_NUMBER: &str = "max_ranging_session_number";
const KEY_MIN_UWB_INITIATION_TIME_MS: &str = "min_uwb_initiation_time_ms";
const KEY_CHAPS_PER_SLOTS: &str = "chaps_per_slots";
const KEY_SYNC_CODES: &str = "sync_codes";
const KEY_CHANNELS: &str = "channels";
const KEY_HOPPING_CONFIG_MODES: &str = "hopping_config_modes";
const KEY_HOPPING_SEQUENCES: &str = "hopping_sequences";
const KEY_UWBS_MAX_PPM: &str = "uwbs_max_ppm";

/// The CCC capabilities of the UWBS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CccSpecificationParams {
    pub protocol_versions: Vec<CccProtocolVersion>,
    pub uwb_configs: Vec<u8>,
    pub pulse_shape_combos: Vec<CccPulseShapeCombo>,
    pub ran_multiplier: u32,
    pub chaps_per_slots: Vec<ChapsPerSlot>,
    pub sync_codes: Vec<u32>,
    /// The prioritized channel list if reported, otherwise the supported channels.
    pub channels: Vec<u8>,
    pub hopping_config_modes: Vec<HoppingConfigMode>,
    pub hopping_sequences: Vec<HoppingSequence>,
    pub max_ranging_session_number: u32,
    pub min_uwb_initiation_time_ms: i32,
    pub uwbs_max_ppm: u16,
}

impl CccSpecificationParams {
    /// Decode the CCC capabilities.
    ///
    /// Vendors disagree on the byte order of the sync codes bitmap, `sync_codes_little_endian`
    /// selects how the bitmap is expanded into the sync code indexes.
    pub fn from_tlv_buffer(
        tlvs: &TlvBuffer,
        sync_codes_little_endian: bool,
    ) -> Result<Self, DecodeError> {
        let versions = required(tlvs.get_byte_array(CCC_SUPPORTED_VERSIONS), "CCC_VERSIONS")?;
        if versions.len() % 2 != 0 {
            error!("Invalid supported protocol versions len {}", versions.len());
            return Err(DecodeError::LengthMismatch {
                tag: CCC_SUPPORTED_VERSIONS,
                expected: versions.len() + 1,
                actual: versions.len(),
            });
        }
        let protocol_versions = versions
            .chunks_exact(2)
            .map(|pair| CccProtocolVersion { major: pair[0], minor: pair[1] })
            .collect();

        let uwb_configs =
            required(tlvs.get_byte_array(CCC_SUPPORTED_UWB_CONFIGS), "CCC_UWB_CONFIGS")?.to_vec();
        let pulse_shape_combos = required(
            tlvs.get_byte_array(CCC_SUPPORTED_PULSE_SHAPE_COMBOS),
            "CCC_PULSE_SHAPE_COMBOS",
        )?
        .iter()
        .map(|value| {
            CccPulseShapeCombo::from_u8(*value).ok_or_else(|| DecodeError::InvalidValue {
                key: "CCC_PULSE_SHAPE_COMBOS".to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
        let ran_multiplier =
            required(tlvs.get_int(CCC_SUPPORTED_RAN_MULTIPLIER), "CCC_RAN_MULTIPLIER")?;

        let chaps_per_slot =
            required(tlvs.get_byte(CCC_SUPPORTED_CHAPS_PER_SLOT), "CCC_CHAPS_PER_SLOT")?;
        let chaps_per_slots = filter_table(chaps_per_slot, CHAPS_PER_SLOT_TABLE);

        let sync_codes_bytes =
            required(tlvs.get_byte_array(CCC_SUPPORTED_SYNC_CODES), "CCC_SYNC_CODES")?;
        let sync_codes = if sync_codes_little_endian {
            sync_codes_from_le_bitmap(sync_codes_bytes)
        } else {
            sync_codes_from_be_bitmap(sync_codes_bytes)?
        };

        let channels = match optional(
            tlvs.get_byte_array(CCC_PRIORITIZED_CHANNEL_LIST),
            "CCC_PRIORITIZED_CHANNEL_LIST",
        ) {
            Some(prioritized_channels) => prioritized_channels.to_vec(),
            None => filter_table(
                required(tlvs.get_byte(CCC_SUPPORTED_CHANNELS), "CCC_CHANNELS")?,
                CHANNEL_TABLE,
            ),
        };

        let hopping = required(
            tlvs.get_byte(CCC_SUPPORTED_HOPPING_CONFIG_MODES_AND_SEQUENCES),
            "CCC_HOPPING_CONFIG_MODES_AND_SEQUENCES",
        )?;
        let hopping_config_modes = filter_table(hopping, HOPPING_CONFIG_MODE_TABLE);
        let hopping_sequences = filter_table(hopping, HOPPING_SEQUENCE_TABLE);

        let max_ranging_session_number = optional(
            tlvs.get_int(CCC_SUPPORTED_MAX_RANGING_SESSION_NUMBER),
            "SUPPORTED_MAX_RANGING_SESSION_NUMBER",
        )
        .unwrap_or(DEFAULT_MAX_RANGING_SESSION_NUMBER);
        let min_uwb_initiation_time_ms = optional(
            tlvs.get_int(CCC_SUPPORTED_MIN_UWB_INITIATION_TIME_MS),
            "SUPPORTED_MIN_UWB_INITIATION_TIME_MS",
        )
        .map_or(DEFAULT_MIN_UWB_INITIATION_TIME_MS, |value| value as i32);
        // The device max PPM is a 2-octet field of the time sync message.
        let uwbs_max_ppm =
            optional(tlvs.get_short(CCC_SUPPORTED_UWBS_MAX_PPM), "CCC_SUPPORTED_UWBS_MAX_PPM")
                .unwrap_or(DEFAULT_UWBS_MAX_PPM);

        Ok(Self {
            protocol_versions,
            uwb_configs,
            pulse_shape_combos,
            ran_multiplier,
            chaps_per_slots,
            sync_codes,
            channels,
            hopping_config_modes,
            hopping_sequences,
            max_ranging_session_number,
            min_uwb_initiation_time_ms,
            uwbs_max_ppm,
        })
    }

    /// Convert the capabilities into the bundle of the protocol, either CCC or Aliro.
    pub fn to_bundle(&self, protocol: ProtocolName) -> Bundle {
        let mut bundle = Bundle::with_header(protocol, SPECIFICATION_BUNDLE_VERSION);
        bundle
            .put_string_array(
                KEY_PROTOCOL_VERSIONS,
                self.protocol_versions.iter().map(|v| v.to_string()).collect(),
            )
            .put_int_array(KEY_UWB_CONFIGS, self.uwb_configs.iter().map(|v| *v as i32).collect())
            .put_int_array(
                KEY_PULSE_SHAPE_COMBOS,
                self.pulse_shape_combos.iter().map(|v| v.as_u8() as i32).collect(),
            )
            .put_int(KEY_RAN_MULTIPLIER, self.ran_multiplier as i32)
            .put_int(KEY_MAX_RANGING_SESSION_NUMBER, self.max_ranging_session_number as i32)
            .put_int(KEY_MIN_UWB_INITIATION_TIME_MS, self.min_uwb_initiation_time_ms)
            .put_int_array(
                KEY_CHAPS_PER_SLOTS,
                self.chaps_per_slots.iter().map(|v| *v as i32).collect(),
            )
            .put_int_array(KEY_SYNC_CODES, self.sync_codes.iter().map(|v| *v as i32).collect())
            .put_int_array(KEY_CHANNELS, self.channels.iter().map(|v| *v as i32).collect())
            .put_int_array(
                KEY_HOPPING_CONFIG_MODES,
                self.hopping_config_modes.iter().map(|v| *v as i32).collect(),
            )
            .put_int_array(
                KEY_HOPPING_SEQUENCES,
                self.hopping_sequences.iter().map(|v| *v as i32).collect(),
            )
            .put_int(KEY_UWBS_MAX_PPM, self.uwbs_max_ppm as i32);
        bundle
    }
}

fn filter_table<T: Copy>(bitmap: u8, table: &[(u64, T)]) -> Vec<T> {
    table.iter().filter(|(mask, _)| is_bit_set(bitmap as u64, *mask)).map(|(_, v)| *v).collect()
}

/// Bit `i` of byte `n` stands for the sync code `n * 8 + i + 1`.
fn sync_codes_from_le_bitmap(bytes: &[u8]) -> Vec<u32> {
    let mut sync_codes = vec![];
    for (byte_index, byte) in bytes.iter().enumerate() {
        for bit_index in 0..8 {
            if byte & (1 << bit_index) != 0 {
                sync_codes.push((byte_index * 8 + bit_index + 1) as u32);
            }
        }
    }
    sync_codes
}

/// The bitmap is a big-endian 32-bit integer, bit `i` stands for the sync code `i + 1`.
fn sync_codes_from_be_bitmap(bytes: &[u8]) -> Result<Vec<u32>, DecodeError> {
    let bitmap = match bytes {
        [b0, b1, b2, b3, ..] => u32::from_be_bytes([*b0, *b1, *b2, *b3]),
        _ => {
            return Err(DecodeError::LengthMismatch {
                tag: CCC_SUPPORTED_SYNC_CODES,
                expected: 4,
                actual: bytes.len(),
            })
        }
    };
    Ok((0..32u32).filter(|i| bitmap & (1 << *i) != 0).map(|i| i + 1).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use crate::params::ccc_app_config_params::PulseShape;

    pub(crate) fn generate_ccc_caps() -> TlvBuffer {
        let mut tlvs = TlvBuffer::new();
        tlvs.put_byte_array(CCC_SUPPORTED_VERSIONS, vec![1, 0, 2, 1])
            .put_byte_array(CCC_SUPPORTED_UWB_CONFIGS, vec![0, 1])
            .put_byte_array(CCC_SUPPORTED_PULSE_SHAPE_COMBOS, vec![0x11, 0x12])
            .put_int(CCC_SUPPORTED_RAN_MULTIPLIER, 10)
            .put_byte(CCC_SUPPORTED_CHAPS_PER_SLOT, 0x11)
            .put_byte_array(CCC_SUPPORTED_SYNC_CODES, vec![0x00, 0x00, 0x01, 0x03])
            .put_byte(CCC_SUPPORTED_CHANNELS, 0x03)
            .put_byte(CCC_SUPPORTED_HOPPING_CONFIG_MODES_AND_SEQUENCES, 0xA8);
        tlvs
    }

    #[test]
    fn test_decode() {
        let params = CccSpecificationParams::from_tlv_buffer(&generate_ccc_caps(), false).unwrap();

        assert_eq!(
            params.protocol_versions,
            vec![
                CccProtocolVersion { major: 1, minor: 0 },
                CccProtocolVersion { major: 2, minor: 1 }
            ]
        );
        assert_eq!(params.uwb_configs, vec![0, 1]);
        assert_eq!(
            params.pulse_shape_combos[1],
            CccPulseShapeCombo {
                initiator_tx: PulseShape::PrecursorFree,
                responder_tx: PulseShape::PrecursorFreeSpecial,
            }
        );
        assert_eq!(params.ran_multiplier, 10);
        assert_eq!(params.chaps_per_slots, vec![ChapsPerSlot::Value3, ChapsPerSlot::Value9]);
        // 0x00000103 read as big-endian.
        assert_eq!(params.sync_codes, vec![1, 2, 9]);
        assert_eq!(params.channels, vec![5, 9]);
        assert_eq!(
            params.hopping_config_modes,
            vec![HoppingConfigMode::None, HoppingConfigMode::Adaptive]
        );
        assert_eq!(params.hopping_sequences, vec![HoppingSequence::Default]);
        assert_eq!(params.max_ranging_session_number, DEFAULT_MAX_RANGING_SESSION_NUMBER);
        assert_eq!(params.min_uwb_initiation_time_ms, DEFAULT_MIN_UWB_INITIATION_TIME_MS);
        assert_eq!(params.uwbs_max_ppm, DEFAULT_UWBS_MAX_PPM);
    }

    #[test]
    fn test_decode_little_endian_sync_codes() {
        let params = CccSpecificationParams::from_tlv_buffer(&generate_ccc_caps(), true).unwrap();
        // Bit 0 of byte 2, bits 0 and 1 of byte 3.
        assert_eq!(params.sync_codes, vec![17, 25, 26]);

        let mut tlvs = generate_ccc_caps();
        tlvs.put_byte_array(CCC_SUPPORTED_SYNC_CODES, vec![0x81, 0x00, 0x00, 0x00, 0x01]);
        let params = CccSpecificationParams::from_tlv_buffer(&tlvs, true).unwrap();
        assert_eq!(params.sync_codes, vec![1, 8, 33]);

        // The big-endian bitmap needs 4 bytes.
        tlvs.put_byte_array(CCC_SUPPORTED_SYNC_CODES, vec![0x81]);
        assert!(CccSpecificationParams::from_tlv_buffer(&tlvs, false).is_err());
    }

    #[test]
    fn test_decode_optional_fields() {
        let mut tlvs = generate_ccc_caps();
        tlvs.put_byte_array(CCC_PRIORITIZED_CHANNEL_LIST, vec![9, 5])
            .put_int(CCC_SUPPORTED_MAX_RANGING_SESSION_NUMBER, 4)
            .put_int(CCC_SUPPORTED_MIN_UWB_INITIATION_TIME_MS, 200)
            .put_short(CCC_SUPPORTED_UWBS_MAX_PPM, 25);
        let params = CccSpecificationParams::from_tlv_buffer(&tlvs, false).unwrap();

        assert_eq!(params.channels, vec![9, 5]);
        assert_eq!(params.max_ranging_session_number, 4);
        assert_eq!(params.min_uwb_initiation_time_ms, 200);
        assert_eq!(params.uwbs_max_ppm, 25);
    }

    #[test]
    fn test_decode_invalid() {
        let mut tlvs = generate_ccc_caps();
        tlvs.put_byte_array(CCC_SUPPORTED_VERSIONS, vec![1, 0, 2]);
        assert!(matches!(
            CccSpecificationParams::from_tlv_buffer(&tlvs, false),
            Err(DecodeError::LengthMismatch { tag: CCC_SUPPORTED_VERSIONS, .. })
        ));

        let mut tlvs = generate_ccc_caps();
        tlvs.put_byte_array(CCC_SUPPORTED_HOPPING_CONFIG_MODES_AND_SEQUENCES, vec![]);
        assert!(CccSpecificationParams::from_tlv_buffer(&tlvs, false).is_err());

        assert_eq!(
            CccSpecificationParams::from_tlv_buffer(&TlvBuffer::new(), false),
            Err(DecodeError::TagNotFound(CCC_SUPPORTED_VERSIONS))
        );
    }

    #[test]
    fn test_to_bundle() {
        let params = CccSpecificationParams::from_tlv_buffer(&generate_ccc_caps(), false).unwrap();
        let bundle = params.to_bundle(ProtocolName::Ccc);

        assert_eq!(bundle.protocol_name(), Ok(ProtocolName::Ccc));
        assert_eq!(bundle.bundle_version(), Ok(1));
        assert_eq!(
            bundle.get_string_array(KEY_PROTOCOL_VERSIONS),
            Ok(vec!["1.0".to_string(), "2.1".to_string()])
        );
        assert_eq!(bundle.get_int_array(KEY_CHAPS_PER_SLOTS), Ok(vec![3, 9]));
        assert_eq!(bundle.get_int(KEY_MIN_UWB_INITIATION_TIME_MS), Ok(-1));
    }
}
