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

//! This module provides the bridge to the native UWB stack: the NativeUwbManager trait, the
//! notifications reported by the stack, and the watchdog bounding the hardware calls.

pub(crate) mod watchdog;

pub mod native_uwb_manager;
pub mod notification;

#[cfg(any(test, feature = "mock-utils"))]
pub mod mock_native_uwb_manager;

// Re-export the public elements.
pub use native_uwb_manager::NativeUwbManager;
pub use notification::{
    CoreNotification, DataRcvNotification, NativeNotification, RadarDataRcvNotification,
    RadarSweepData, RangingMeasurement, SessionNotification, SessionRangeData,
};
