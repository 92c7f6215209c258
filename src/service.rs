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

//! This module defines the UwbServiceCore, the entry of the UWB platform service, and its
//! related components: the adapter state machine, the callbacks and the builder.

pub mod adapter_state;
pub mod callbacks;
pub mod uwb_service_core;
pub mod uwb_service_core_builder;

#[cfg(any(test, feature = "mock-utils"))]
pub mod mock_service_callbacks;

// Re-export the public elements.
pub use adapter_state::{AdapterState, StateChangeReason};
pub use callbacks::{
    AdapterStateCallback, BugReporter, CallbackId, CountryCodeProvider,
    InitializationFailureListener, SetCountryCodeStatus, VendorUciCallback, WakeLock,
};
pub use uwb_service_core::UwbServiceCore;
pub use uwb_service_core_builder::{default_runtime, UwbServiceCoreBuilder};
