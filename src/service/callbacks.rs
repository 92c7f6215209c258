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

//! This module defines the callbacks of the UwbServiceCore, and the platform facilities it
//! depends on.

use std::fmt;

use crate::service::adapter_state::{AdapterState, StateChangeReason};

/// The id assigned to a registered callback. It is used to unregister the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallbackId(u32);

impl CallbackId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }
}

/// The callback notified when the adapter state changes.
pub trait AdapterStateCallback: 'static + Send {
    /// Notify the adapter state. It is also called once with the current state when the callback
    /// is registered.
    fn on_adapter_state_changed(&mut self, state: AdapterState, reason: StateChangeReason);
}

/// The listener notified when the UWB hardware fails to initialize.
pub trait InitializationFailureListener: 'static + Send {
    fn on_failure(&mut self);
}

/// The callback of the vendor-specific UCI messages.
pub trait VendorUciCallback: 'static + Send {
    /// Notify the response of the vendor command sent by send_vendor_uci_message().
    fn on_vendor_response_received(&mut self, gid: u32, oid: u32, payload: Vec<u8>);

    /// Notify the vendor notification emitted by the UWBS.
    fn on_vendor_notification_received(&mut self, gid: u32, oid: u32, payload: Vec<u8>);
}

impl fmt::Debug for dyn AdapterStateCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdapterStateCallback")
    }
}

impl fmt::Debug for dyn InitializationFailureListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InitializationFailureListener")
    }
}

impl fmt::Debug for dyn VendorUciCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VendorUciCallback")
    }
}

/// The result of pushing the country code to the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCountryCodeStatus {
    Ok,
    Failed,
    /// The firmware rejects UWB in the country.
    RegulationUwbOff,
}

/// The country code subsystem. It picks the country code from the platform sources (telephony,
/// wifi, location...) and pushes it to the firmware.
///
/// When the picked code changes later, the provider reports it through
/// UwbServiceCore::on_country_code_changed().
pub trait CountryCodeProvider: 'static + Send {
    /// Pick the current country code and push it to the firmware. The code is pushed even if it
    /// is not changed when |force_update| is true.
    fn set_country_code(&mut self, force_update: bool) -> (SetCountryCodeStatus, Option<String>);
}

/// The wake lock held while the hardware is being initialized or deinitialized.
pub trait WakeLock: 'static + Send {
    fn acquire(&mut self);
    fn release(&mut self);
    fn is_held(&self) -> bool;
}

/// Capture the diagnostic information of the device.
pub trait BugReporter: 'static + Send {
    fn take_bug_report(&mut self, reason: &str);
}
