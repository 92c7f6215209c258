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

//! This module defines the configuration of the service core. It is usually loaded once at startup
//! from a TOML document, e.g.
//!
//! ```toml
//! watchdog_ms = 30000
//! multichip = ["chip0", "chip1"]
//! device_error_bugreport_enabled = true
//! ```

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::uci_packets::ChipId;

const DEFAULT_WATCHDOG_MS: u64 = 60_000;
const MS_IN_HOUR: u64 = 60 * 60 * 1000;
const DEFAULT_BUG_REPORT_MIN_INTERVAL_MS: u64 = 24 * MS_IN_HOUR;
const DEFAULT_MAX_SESSION_COUNT: usize = 5;
const DEFAULT_SESSION_STATE_TIMEOUT_MS: u64 = 1000;
const DEFAULT_RX_DATA_MAX_PACKETS_TO_STORE: usize = 10;
const DEFAULT_CHIP_ID: &str = "default";

/// The configuration of the UWB service core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// The watchdog bound of the hardware initialize/deinitialize calls.
    #[serde(default = "default_watchdog_ms")]
    pub watchdog_ms: u64,

    /// Take a bug report when the hardware fails to initialize.
    #[serde(default)]
    pub device_error_bugreport_enabled: bool,

    /// The minimal interval between two bug reports.
    #[serde(default = "default_bug_report_min_interval_ms")]
    pub bug_report_min_interval_ms: u64,

    /// Expand the CCC/Aliro sync code bitmap in little-endian bit order.
    #[serde(default)]
    pub ccc_supported_sync_codes_little_endian: bool,

    /// Turn the hardware off while no client votes for it.
    #[serde(default)]
    pub hw_idle_turn_off_enabled: bool,

    /// The ids of all the UWB chips on the device.
    #[serde(default = "default_multichip")]
    pub multichip: Vec<ChipId>,

    /// The chip used by the requests that don't name one. Defaults to the first chip.
    #[serde(default)]
    pub default_chip_id: Option<ChipId>,

    /// The maximal number of concurrent sessions per chip.
    #[serde(default = "default_max_session_count")]
    pub max_session_count: usize,

    /// How long to wait for the session status notification after a session command.
    #[serde(default = "default_session_state_timeout_ms")]
    pub session_state_timeout_ms: u64,

    /// The maximal number of received data packets buffered per session.
    #[serde(default = "default_rx_data_max_packets_to_store")]
    pub rx_data_max_packets_to_store: usize,

    /// Report the stopped params of CCC/Aliro sessions when the ranging stops.
    #[serde(default)]
    pub ccc_ranging_stopped_params_send_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            watchdog_ms: default_watchdog_ms(),
            device_error_bugreport_enabled: false,
            bug_report_min_interval_ms: default_bug_report_min_interval_ms(),
            ccc_supported_sync_codes_little_endian: false,
            hw_idle_turn_off_enabled: false,
            multichip: default_multichip(),
            default_chip_id: None,
            max_session_count: default_max_session_count(),
            session_state_timeout_ms: default_session_state_timeout_ms(),
            rx_data_max_packets_to_store: default_rx_data_max_packets_to_store(),
            ccc_ranging_stopped_params_send_enabled: false,
        }
    }
}

impl ServiceConfig {
    /// Parse the configuration from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            error!("Failed to parse the service config: {}", e);
            Error::IllegalArgument
        })?;
        if config.multichip.is_empty() {
            error!("The multichip config should contain at least one chip");
            return Err(Error::IllegalArgument);
        }
        if let Some(chip_id) = config.default_chip_id.as_ref() {
            if !config.multichip.contains(chip_id) {
                error!("The default chip {} is not in the multichip config", chip_id);
                return Err(Error::IllegalArgument);
            }
        }
        Ok(config)
    }

    /// The chip used when a request doesn't specify one.
    pub fn default_chip_id(&self) -> ChipId {
        self.default_chip_id
            .clone()
            .or_else(|| self.multichip.first().cloned())
            .unwrap_or_else(default_chip_id)
    }
}

fn default_watchdog_ms() -> u64 {
    DEFAULT_WATCHDOG_MS
}

fn default_bug_report_min_interval_ms() -> u64 {
    DEFAULT_BUG_REPORT_MIN_INTERVAL_MS
}

fn default_chip_id() -> ChipId {
    DEFAULT_CHIP_ID.to_string()
}

fn default_multichip() -> Vec<ChipId> {
    vec![default_chip_id()]
}

fn default_max_session_count() -> usize {
    DEFAULT_MAX_SESSION_COUNT
}

fn default_session_state_timeout_ms() -> u64 {
    DEFAULT_SESSION_STATE_TIMEOUT_MS
}

fn default_rx_data_max_packets_to_store() -> usize {
    DEFAULT_RX_DATA_MAX_PACKETS_TO_STORE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bug_report_min_interval_ms, 86_400_000);
        assert_eq!(config.default_chip_id(), "default");
    }

    #[test]
    fn test_multichip_config() {
        let config = ServiceConfig::from_toml_str(
            r#"
            watchdog_ms = 500
            multichip = ["chip0", "chip1"]
            default_chip_id = "chip1"
            ccc_supported_sync_codes_little_endian = true
            "#,
        )
        .unwrap();
        assert_eq!(config.watchdog_ms, 500);
        assert_eq!(config.multichip, vec!["chip0".to_string(), "chip1".to_string()]);
        assert_eq!(config.default_chip_id(), "chip1");
        assert!(config.ccc_supported_sync_codes_little_endian);
    }

    #[test]
    fn test_first_chip_is_default() {
        let config = ServiceConfig::from_toml_str(r#"multichip = ["a", "b"]"#).unwrap();
        assert_eq!(config.default_chip_id(), "a");
    }

    #[test]
    fn test_invalid_config() {
        let result = ServiceConfig::from_toml_str("watchdog_ms = \"x\"");
        assert_eq!(result, Err(Error::IllegalArgument));
        assert_eq!(ServiceConfig::from_toml_str("multichip = []"), Err(Error::IllegalArgument));
        assert_eq!(
            ServiceConfig::from_toml_str(
                r#"
                multichip = ["a"]
                default_chip_id = "b"
                "#
            ),
            Err(Error::IllegalArgument)
        );
    }
}
