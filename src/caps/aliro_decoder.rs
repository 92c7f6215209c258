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

//! The Aliro capabilities use the CCC TLV layout and are delivered in an Aliro bundle.

use crate::caps::ccc_decoder::CccSpecificationParams;
use crate::caps::tlv_buffer::TlvBuffer;
use crate::error::DecodeError;
use crate::params::bundle::{Bundle, ProtocolName};

/// The Aliro capabilities of the UWBS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliroSpecificationParams(CccSpecificationParams);

impl AliroSpecificationParams {
    pub fn from_tlv_buffer(
        tlvs: &TlvBuffer,
        sync_codes_little_endian: bool,
    ) -> Result<Self, DecodeError> {
        CccSpecificationParams::from_tlv_buffer(tlvs, sync_codes_little_endian).map(Self)
    }

    pub fn params(&self) -> &CccSpecificationParams {
        &self.0
    }

    pub fn to_bundle(&self) -> Bundle {
        self.0.to_bundle(ProtocolName::Aliro)
    }
}
