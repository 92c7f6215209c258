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

//! This module defines the state of the UWB adapter reported to the clients, and how the state is
//! derived from the hardware status.

use std::collections::BTreeMap;

use crate::params::uci_packets::{ChipId, CountryCode, DeviceState};

/// The state of the UWB adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// UWB is off, or it is not allowed in the current country.
    Disabled,
    /// UWB is on, and no session is ranging.
    EnabledInactive,
    /// UWB is on, and at least one chip is ranging.
    EnabledActive,
    /// UWB is enabled by the user, but the hardware is off until a client needs it.
    EnabledHwIdle,
}

/// The reason of the adapter state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeReason {
    Unknown,
    SessionStarted,
    AllSessionsClosed,
    SystemPolicy,
    SystemRegulation,
    SystemBoot,
}

/// The inputs of the adapter state. The fields are only mutated by the service actor.
#[derive(Debug, Clone, Default)]
pub(crate) struct AdapterStatus {
    /// The hardware is initialized.
    pub hw_initialized: bool,
    /// The user enabled UWB, but the hardware is turned off because nobody votes for it.
    pub hw_idle: bool,
    /// The country code accepted by the firmware. None when unknown or UWB is not allowed.
    pub country_code: Option<CountryCode>,
    /// The latest device state of each chip. Only filled while the hardware is initialized.
    pub chip_states: BTreeMap<ChipId, DeviceState>,
}

impl AdapterStatus {
    pub fn adapter_state(&self) -> AdapterState {
        if self.hw_idle {
            return AdapterState::EnabledHwIdle;
        }
        if !self.hw_initialized || self.country_code.is_none() {
            return AdapterState::Disabled;
        }
        if self.chip_states.values().any(|state| *state == DeviceState::DeviceStateActive) {
            AdapterState::EnabledActive
        } else {
            AdapterState::EnabledInactive
        }
    }

    /// Reset the state of every chip after the hardware is initialized.
    pub fn reset_chip_states<'a>(&mut self, chip_ids: impl Iterator<Item = &'a ChipId>) {
        self.chip_states =
            chip_ids.map(|chip_id| (chip_id.clone(), DeviceState::DeviceStateReady)).collect();
    }

    pub fn is_known_chip(&self, chip_id: &str) -> bool {
        self.chip_states.contains_key(chip_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_status() -> AdapterStatus {
        let mut status = AdapterStatus {
            hw_initialized: true,
            country_code: CountryCode::parse("US"),
            ..Default::default()
        };
        let chips = vec!["chip0".to_string(), "chip1".to_string()];
        status.reset_chip_states(chips.iter());
        status
    }

    #[test]
    fn test_default_is_disabled() {
        let status = AdapterStatus::default();
        assert_eq!(status.adapter_state(), AdapterState::Disabled);
    }

    #[test]
    fn test_enabled_inactive() {
        let status = enabled_status();
        assert_eq!(status.adapter_state(), AdapterState::EnabledInactive);
        assert!(status.is_known_chip("chip1"));
        assert!(!status.is_known_chip("invalidChipId"));
    }

    #[test]
    fn test_any_active_chip() {
        let mut status = enabled_status();
        status.chip_states.insert("chip1".to_string(), DeviceState::DeviceStateActive);
        assert_eq!(status.adapter_state(), AdapterState::EnabledActive);

        status.chip_states.insert("chip1".to_string(), DeviceState::DeviceStateReady);
        assert_eq!(status.adapter_state(), AdapterState::EnabledInactive);
    }

    #[test]
    fn test_invalid_country_code() {
        let mut status = enabled_status();
        status.chip_states.insert("chip0".to_string(), DeviceState::DeviceStateActive);
        status.country_code = None;
        assert_eq!(status.adapter_state(), AdapterState::Disabled);
    }

    #[test]
    fn test_hw_not_initialized() {
        let mut status = enabled_status();
        status.chip_states.insert("chip0".to_string(), DeviceState::DeviceStateActive);
        status.hw_initialized = false;
        assert_eq!(status.adapter_state(), AdapterState::Disabled);
    }

    #[test]
    fn test_hw_idle() {
        let status = AdapterStatus { hw_idle: true, ..Default::default() };
        assert_eq!(status.adapter_state(), AdapterState::EnabledHwIdle);
    }
}
