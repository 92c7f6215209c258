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

use log::warn;

use crate::caps::TlvBuffer;
use crate::error::DecodeError;
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::ccc_app_config_params::{
    CCC_BUNDLE_VERSION, KEY_RAN_MULTIPLIER, MINIMUM_BLOCK_DURATION_MS,
};
use crate::params::uci_packets::AppConfigTlvType;
use crate::params::utils::bytes_to_u64_widened;

const KEY_STS_INDEX: &str = "sts_index";
const KEY_HOP_MODE_KEY: &str = "hop_mode_key";
const KEY_UWB_TIME0: &str = "uwb_time0";
const KEY_SYNC_CODE_INDEX: &str = "sync_code_index";
const KEY_LAST_STS_INDEX_USED: &str = "last_sts_index_used";

/// The parameters of a started CCC or Aliro session, read back from the firmware with the
/// SESSION_GET_APP_CONFIG_CMD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CccStartedAppConfigParams {
    pub sts_index: u32,
    pub hop_mode_key: u32,
    pub uwb_time0: u64,
    pub ran_multiplier: u32,
    pub sync_code_index: u8,
}

impl CccStartedAppConfigParams {
    /// The tags requested from the firmware.
    pub fn requested_tags() -> Vec<AppConfigTlvType> {
        vec![
            AppConfigTlvType::StsIndex,
            AppConfigTlvType::CccHopModeKey,
            AppConfigTlvType::CccUwbTime0,
            AppConfigTlvType::RangingDuration,
            AppConfigTlvType::PreambleCodeIndex,
        ]
    }

    pub fn from_tlv_buffer(tlvs: &TlvBuffer) -> Result<Self, DecodeError> {
        let uwb_time0 = match tlvs.get_long(AppConfigTlvType::CccUwbTime0 as u8) {
            Ok(value) => value,
            Err(e) => {
                // Some firmware reports the time0 as the FiRa UWB initiation time.
                warn!("UWB_TIME0 not found: {}", e);
                let tag = AppConfigTlvType::UwbInitiationTime as u8;
                let bytes = tlvs.get_byte_array(tag)?;
                bytes_to_u64_widened(bytes).ok_or(DecodeError::LengthMismatch {
                    tag,
                    expected: 8,
                    actual: bytes.len(),
                })?
            }
        };
        Ok(Self {
            sts_index: tlvs.get_int(AppConfigTlvType::StsIndex as u8)?,
            hop_mode_key: tlvs.get_int(AppConfigTlvType::CccHopModeKey as u8)?,
            uwb_time0,
            ran_multiplier: tlvs.get_int(AppConfigTlvType::RangingDuration as u8)?
                / MINIMUM_BLOCK_DURATION_MS,
            sync_code_index: tlvs.get_byte(AppConfigTlvType::PreambleCodeIndex as u8)?,
        })
    }

    pub fn to_bundle(&self, protocol: ProtocolName) -> Bundle {
        let mut bundle = Bundle::with_header(protocol, CCC_BUNDLE_VERSION);
        bundle
            .put_long(KEY_STS_INDEX, self.sts_index as i64)
            .put_long(KEY_HOP_MODE_KEY, self.hop_mode_key as i64)
            .put_long(KEY_UWB_TIME0, self.uwb_time0 as i64)
            .put_long(KEY_RAN_MULTIPLIER, self.ran_multiplier as i64)
            .put_int(KEY_SYNC_CODE_INDEX, self.sync_code_index as i32);
        bundle
    }
}

/// The parameters reported when a CCC or Aliro session stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CccStoppedAppConfigParams {
    pub last_sts_index_used: u32,
}

impl CccStoppedAppConfigParams {
    pub fn requested_tags() -> Vec<AppConfigTlvType> {
        vec![AppConfigTlvType::CccLastIndexUsed]
    }

    pub fn from_tlv_buffer(tlvs: &TlvBuffer) -> Result<Self, DecodeError> {
        Ok(Self { last_sts_index_used: tlvs.get_int(AppConfigTlvType::CccLastIndexUsed as u8)? })
    }

    pub fn to_bundle(&self, protocol: ProtocolName) -> Bundle {
        let mut bundle = Bundle::with_header(protocol, CCC_BUNDLE_VERSION);
        bundle.put_long(KEY_LAST_STS_INDEX_USED, self.last_sts_index_used as i64);
        bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_tlvs() -> TlvBuffer {
        let mut tlvs = TlvBuffer::new();
        tlvs.put_int(AppConfigTlvType::StsIndex as u8, 3)
            .put_int(AppConfigTlvType::CccHopModeKey as u8, 5)
            .put_int(AppConfigTlvType::RangingDuration as u8, 4 * MINIMUM_BLOCK_DURATION_MS)
            .put_byte(AppConfigTlvType::PreambleCodeIndex as u8, 9);
        tlvs
    }

    #[test]
    fn test_from_tlv_buffer() {
        let mut tlvs = started_tlvs();
        tlvs.put_long(AppConfigTlvType::CccUwbTime0 as u8, 7);
        let params = CccStartedAppConfigParams::from_tlv_buffer(&tlvs).unwrap();

        assert_eq!(
            params,
            CccStartedAppConfigParams {
                sts_index: 3,
                hop_mode_key: 5,
                uwb_time0: 7,
                ran_multiplier: 4,
                sync_code_index: 9,
            }
        );
        let bundle = params.to_bundle(ProtocolName::Ccc);
        assert_eq!(bundle.get_long(KEY_RAN_MULTIPLIER), Ok(4));
    }

    #[test]
    fn test_uwb_time0_fallback() {
        let mut tlvs = started_tlvs();
        tlvs.put_int(AppConfigTlvType::UwbInitiationTime as u8, 0x1234);
        let params = CccStartedAppConfigParams::from_tlv_buffer(&tlvs).unwrap();
        assert_eq!(params.uwb_time0, 0x1234);

        // Neither tag is present.
        assert_eq!(
            CccStartedAppConfigParams::from_tlv_buffer(&started_tlvs()),
            Err(DecodeError::TagNotFound(AppConfigTlvType::UwbInitiationTime as u8))
        );
    }

    #[test]
    fn test_stopped_params() {
        let mut tlvs = TlvBuffer::new();
        tlvs.put_int(AppConfigTlvType::CccLastIndexUsed as u8, 0x100);
        let params = CccStoppedAppConfigParams::from_tlv_buffer(&tlvs).unwrap();
        assert_eq!(params.last_sts_index_used, 0x100);
        assert_eq!(
            params.to_bundle(ProtocolName::Aliro).get_long(KEY_LAST_STS_INDEX_USED),
            Ok(0x100)
        );
        assert!(CccStoppedAppConfigParams::from_tlv_buffer(&TlvBuffer::new()).is_err());
    }
}
