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

//! This module decodes the radar capabilities reported by the UWBS.

use std::collections::BTreeSet;

use crate::caps::tlv_buffer::{is_bit_set, required, TlvBuffer};
use crate::error::DecodeError;
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::utils::bytes_to_u64_widened;

const RADAR_SPECIFICATION_BUNDLE_VERSION: i32 = 1;
const KEY_RADAR_CAPABILITIES: &str = "radar_capabilities";

pub(super) const RADAR_SUPPORT: u8 = 0xB0;

/// The radar capabilities.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RadarCapability {
    /// The UWBS reports the raw radar sweep samples.
    RadarSweepSamples = 0,
}

/// The radar capabilities of the UWBS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarSpecificationParams {
    pub radar_capabilities: BTreeSet<RadarCapability>,
}

impl RadarSpecificationParams {
    pub fn from_tlv_buffer(tlvs: &TlvBuffer) -> Result<Self, DecodeError> {
        let bytes = required(tlvs.get_byte_array(RADAR_SUPPORT), "RADAR_SUPPORT")?;
        let bitmap = bytes_to_u64_widened(bytes).ok_or(DecodeError::LengthMismatch {
            tag: RADAR_SUPPORT,
            expected: 1,
            actual: bytes.len(),
        })?;

        let mut radar_capabilities = BTreeSet::new();
        if is_bit_set(bitmap, 1 << RadarCapability::RadarSweepSamples as u64) {
            radar_capabilities.insert(RadarCapability::RadarSweepSamples);
        }
        Ok(Self { radar_capabilities })
    }

    pub fn to_bundle(&self) -> Bundle {
        let mut bundle =
            Bundle::with_header(ProtocolName::Radar, RADAR_SPECIFICATION_BUNDLE_VERSION);
        bundle.put_int_array(
            KEY_RADAR_CAPABILITIES,
            self.radar_capabilities.iter().map(|c| *c as i32).collect(),
        );
        bundle
    }
}
