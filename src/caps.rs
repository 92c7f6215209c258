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

//! This module provides the TLV buffer and the decoders of the capabilities reported by the UWBS
//! in the CORE_GET_CAPS_INFO response.

pub mod aliro_decoder;
pub mod ccc_decoder;
pub mod fira_decoder;
pub mod generic_decoder;
pub mod radar_decoder;
pub mod tlv_buffer;

pub use aliro_decoder::AliroSpecificationParams;
pub use ccc_decoder::CccSpecificationParams;
pub use fira_decoder::{FiraCapField, FiraCapsLayout, FiraSpecificationParams};
pub use generic_decoder::GenericSpecificationParams;
pub use radar_decoder::RadarSpecificationParams;
pub use tlv_buffer::TlvBuffer;
