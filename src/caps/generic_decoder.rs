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

//! This module decodes the whole CORE_GET_CAPS_INFO response into the capabilities of every
//! protocol supported by the UWBS.

use crate::caps::aliro_decoder::AliroSpecificationParams;
use crate::caps::ccc_decoder::CccSpecificationParams;
use crate::caps::fira_decoder::FiraSpecificationParams;
use crate::caps::radar_decoder::{RadarSpecificationParams, RADAR_SUPPORT};
use crate::caps::tlv_buffer::{is_bit_set, optional, TlvBuffer};
use crate::error::DecodeError;
use crate::params::bundle::{Bundle, ProtocolName, KEY_BUNDLE_VERSION};

const GENERIC_SPECIFICATION_BUNDLE_VERSION: i32 = 1;
const KEY_POWER_STATS_SUPPORTED: &str = "power_stats_supported";

const SUPPORTED_POWER_STATS: u8 = 0xC0;
const POWER_STATS_SUPPORT: u64 = 0x01;

/// The capabilities of the UWBS. FiRa is mandatory, the others are present only if the UWBS
/// reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericSpecificationParams {
    pub fira: FiraSpecificationParams,
    pub ccc: Option<CccSpecificationParams>,
    pub aliro: Option<AliroSpecificationParams>,
    pub radar: Option<RadarSpecificationParams>,
    pub has_power_stats_support: bool,
}

impl GenericSpecificationParams {
    /// Decode the capabilities. The raw bytes are the TLVs of the CORE_GET_CAPS_INFO response.
    pub fn decode(caps_info: &[u8], sync_codes_little_endian: bool) -> Result<Self, DecodeError> {
        Self::from_tlv_buffer(&TlvBuffer::parse(caps_info)?, sync_codes_little_endian)
    }

    pub fn from_tlv_buffer(
        tlvs: &TlvBuffer,
        sync_codes_little_endian: bool,
    ) -> Result<Self, DecodeError> {
        let fira = FiraSpecificationParams::from_tlv_buffer(tlvs)?;
        let ccc = optional(
            CccSpecificationParams::from_tlv_buffer(tlvs, sync_codes_little_endian),
            "CCC specification",
        );
        let aliro = optional(
            AliroSpecificationParams::from_tlv_buffer(tlvs, sync_codes_little_endian),
            "Aliro specification",
        );
        let radar = if tlvs.contains(RADAR_SUPPORT) {
            optional(RadarSpecificationParams::from_tlv_buffer(tlvs), "Radar specification")
        } else {
            None
        };
        let has_power_stats_support =
            optional(tlvs.get_byte(SUPPORTED_POWER_STATS), "SUPPORTED_POWER_STATS")
                .map_or(false, |value| is_bit_set(value as u64, POWER_STATS_SUPPORT));

        Ok(Self { fira, ccc, aliro, radar, has_power_stats_support })
    }

    /// Whether the UWBS accepts the UCI test messages.
    pub fn supports_test_messages(&self) -> bool {
        self.fira.supports_test_messages()
    }

    /// Convert the capabilities into a bundle, each protocol nested under its protocol name.
    pub fn to_bundle(&self) -> Bundle {
        let mut bundle = Bundle::new();
        bundle
            .put_int(KEY_BUNDLE_VERSION, GENERIC_SPECIFICATION_BUNDLE_VERSION)
            .put_bool(KEY_POWER_STATS_SUPPORTED, self.has_power_stats_support)
            .put_nested(&ProtocolName::Fira.to_string(), &self.fira.to_bundle());
        if let Some(ccc) = &self.ccc {
            bundle.put_nested(&ProtocolName::Ccc.to_string(), &ccc.to_bundle(ProtocolName::Ccc));
        }
        if let Some(aliro) = &self.aliro {
            bundle.put_nested(&ProtocolName::Aliro.to_string(), &aliro.to_bundle());
        }
        if let Some(radar) = &self.radar {
            bundle.put_nested(&ProtocolName::Radar.to_string(), &radar.to_bundle());
        }
        bundle
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use crate::caps::ccc_decoder::tests::generate_ccc_caps;
    use crate::caps::fira_decoder::tests::generate_fira_v2_caps;

    /// The raw CORE_GET_CAPS_INFO TLVs of a UWBS supporting FiRa 2.0, CCC and radar.
    pub(crate) fn generate_caps_info() -> Vec<u8> {
        let mut tlvs = generate_fira_v2_caps();
        let ccc = generate_ccc_caps();
        for tag in ccc.tags() {
            if let Ok(value) = ccc.get_byte_array(tag) {
                tlvs.put_byte_array(tag, value.to_vec());
            }
        }
        tlvs.put_byte(RADAR_SUPPORT, 0x01).put_byte(SUPPORTED_POWER_STATS, 0x01);
        tlvs.to_bytes().unwrap()
    }

    #[test]
    fn test_decode() {
        let params = GenericSpecificationParams::decode(&generate_caps_info(), false).unwrap();

        assert!(params.supports_test_messages());
        assert_eq!(params.ccc.as_ref().map(|ccc| ccc.ran_multiplier), Some(10));
        assert_eq!(params.aliro.as_ref().map(|aliro| aliro.params()), params.ccc.as_ref());
        assert!(params.radar.is_some());
        assert!(params.has_power_stats_support);
    }

    #[test]
    fn test_decode_fira_only() {
        let bytes = generate_fira_v2_caps().to_bytes().unwrap();
        let params = GenericSpecificationParams::decode(&bytes, false).unwrap();

        assert_eq!(params.ccc, None);
        assert_eq!(params.aliro, None);
        assert_eq!(params.radar, None);
        assert!(!params.has_power_stats_support);
    }

    #[test]
    fn test_decode_failure() {
        // FiRa is mandatory.
        let bytes = generate_ccc_caps().to_bytes().unwrap();
        assert!(GenericSpecificationParams::decode(&bytes, false).is_err());
        // Truncated TLV.
        assert_eq!(
            GenericSpecificationParams::decode(&[0x02, 0x04, 0x01], false),
            Err(DecodeError::Truncated)
        );
    }

    #[test]
    fn test_to_bundle() {
        let params = GenericSpecificationParams::decode(&generate_caps_info(), false).unwrap();
        let bundle = params.to_bundle();

        assert_eq!(bundle.get_bool(KEY_POWER_STATS_SUPPORTED), Ok(true));
        let fira = bundle.get_nested(&ProtocolName::Fira.to_string()).unwrap();
        assert_eq!(fira.protocol_name(), Ok(ProtocolName::Fira));
        assert_eq!(fira.get_string("max_mac_version"), Ok("2.0".to_string()));
        let ccc = bundle.get_nested(&ProtocolName::Ccc.to_string()).unwrap();
        assert_eq!(ccc.get_int("ran_multiplier"), Ok(10));
        assert!(bundle.get_nested(&ProtocolName::Aliro.to_string()).is_some());
        assert!(bundle.get_nested(&ProtocolName::Radar.to_string()).is_some());
    }
}
