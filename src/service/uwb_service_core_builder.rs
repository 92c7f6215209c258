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

//! This module defines the UwbServiceCoreBuilder, the builder of the UwbServiceCore.

use log::error;
use tokio::runtime::Runtime;

use crate::config::ServiceConfig;
use crate::service::callbacks::{BugReporter, CountryCodeProvider, WakeLock};
use crate::service::uwb_service_core::UwbServiceCore;
use crate::uci::native_uwb_manager::NativeUwbManager;

/// Create the default runtime for UwbServiceCore.
pub fn default_runtime() -> Option<Runtime> {
    tokio::runtime::Builder::new_multi_thread().thread_name("UwbService").enable_all().build().ok()
}

/// The builder of UwbServiceCore, used to keep the backward compatibility when adding new
/// parameters of creating a UwbServiceCore instance.
pub struct UwbServiceCoreBuilder<N, P, W, B>
where
    N: NativeUwbManager,
    P: CountryCodeProvider,
    W: WakeLock,
    B: BugReporter,
{
    runtime: Option<Runtime>,
    config: Option<ServiceConfig>,
    native_manager: Option<N>,
    country_code_provider: Option<P>,
    wake_lock: Option<W>,
    bug_reporter: Option<B>,
}

impl<N, P, W, B> Default for UwbServiceCoreBuilder<N, P, W, B>
where
    N: NativeUwbManager,
    P: CountryCodeProvider,
    W: WakeLock,
    B: BugReporter,
{
    fn default() -> Self {
        Self {
            runtime: None,
            config: None,
            native_manager: None,
            country_code_provider: None,
            wake_lock: None,
            bug_reporter: None,
        }
    }
}

impl<N, P, W, B> UwbServiceCoreBuilder<N, P, W, B>
where
    N: NativeUwbManager,
    P: CountryCodeProvider,
    W: WakeLock,
    B: BugReporter,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the runtime field. The default runtime is created if it is not set.
    pub fn runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Set the config field. The default config is used if it is not set.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the native_manager field.
    pub fn native_manager(mut self, native_manager: N) -> Self {
        self.native_manager = Some(native_manager);
        self
    }

    /// Set the country_code_provider field.
    pub fn country_code_provider(mut self, country_code_provider: P) -> Self {
        self.country_code_provider = Some(country_code_provider);
        self
    }

    /// Set the wake_lock field.
    pub fn wake_lock(mut self, wake_lock: W) -> Self {
        self.wake_lock = Some(wake_lock);
        self
    }

    /// Set the bug_reporter field.
    pub fn bug_reporter(mut self, bug_reporter: B) -> Self {
        self.bug_reporter = Some(bug_reporter);
        self
    }

    /// Build the UwbServiceCore.
    pub fn build(mut self) -> Option<UwbServiceCore> {
        let config = self.config.take().unwrap_or_default();
        if config.multichip.is_empty() {
            error!("The config should contain at least one chip");
            return None;
        }
        let runtime = self.runtime.take().or_else(default_runtime)?;
        Some(UwbServiceCore::new(
            runtime,
            config,
            self.native_manager.take()?,
            self.country_code_provider.take()?,
            self.wake_lock.take()?,
            self.bug_reporter.take()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::adapter_state::AdapterState;
    use crate::service::mock_service_callbacks::{
        MockBugReporter, MockCountryCodeProvider, MockWakeLock,
    };
    use crate::uci::mock_native_uwb_manager::MockNativeUwbManager;

    type TestBuilder = UwbServiceCoreBuilder<
        MockNativeUwbManager,
        MockCountryCodeProvider,
        MockWakeLock,
        MockBugReporter,
    >;

    #[test]
    fn test_build_fail() {
        let result = TestBuilder::new().build();
        assert!(result.is_none());

        let result = TestBuilder::new()
            .config(ServiceConfig { multichip: vec![], ..Default::default() })
            .native_manager(MockNativeUwbManager::new())
            .country_code_provider(MockCountryCodeProvider::new())
            .wake_lock(MockWakeLock::new())
            .bug_reporter(MockBugReporter::new())
            .build();
        assert!(result.is_none());
    }

    #[test]
    fn test_build_ok() {
        let result = UwbServiceCoreBuilder::new()
            .native_manager(MockNativeUwbManager::new())
            .country_code_provider(MockCountryCodeProvider::new())
            .wake_lock(MockWakeLock::new())
            .bug_reporter(MockBugReporter::new())
            .build();
        assert!(result.is_some());
        assert_eq!(result.unwrap().get_adapter_state(), AdapterState::Disabled);
    }
}
