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

//! uwb_service_core is the platform service core that mediates access to UWB ranging hardware.
//!
//! It owns the adapter lifecycle (enable/disable under a watchdog, country code gating and per-chip
//! device status), multiplexes the ranging sessions of several clients over one or more chips, and
//! translates the protocol parameters from/to the UCI TLV format spoken by the firmware.

pub mod caps;
pub mod config;
pub mod error;
pub mod params;
pub mod service;
pub mod session;
pub mod uci;

pub(crate) mod utils;

pub use error::{DecodeError, Error, Result};
