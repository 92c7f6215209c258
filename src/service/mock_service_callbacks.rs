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

//! Mock versions of the callbacks and the platform facilities of the UwbServiceCore.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::time::{timeout, Duration};

use crate::service::adapter_state::{AdapterState, StateChangeReason};
use crate::service::callbacks::{
    AdapterStateCallback, BugReporter, CountryCodeProvider, InitializationFailureListener,
    SetCountryCodeStatus, VendorUciCallback, WakeLock,
};

/// Mock of all the callbacks of the UwbServiceCore. The calls are expected in order, across all
/// the callback types.
#[derive(Clone, Default)]
pub struct MockServiceCallbacks {
    expected_calls: Arc<Mutex<VecDeque<ExpectedCall>>>,
    expect_call_consumed: Arc<Notify>,
}

#[allow(dead_code)]
impl MockServiceCallbacks {
    /// Constructor.
    pub fn new() -> Self {
        Default::default()
    }

    /// Prepare Mock to expect on_adapter_state_changed.
    pub fn expect_on_adapter_state_changed(
        &mut self,
        state: AdapterState,
        reason: StateChangeReason,
    ) {
        self.push_expected_call(ExpectedCall::AdapterState { state, reason });
    }

    /// Prepare Mock to expect on_failure of the InitializationFailureListener.
    pub fn expect_on_initialization_failure(&mut self) {
        self.push_expected_call(ExpectedCall::InitializationFailure);
    }

    /// Prepare Mock to expect on_vendor_response_received.
    pub fn expect_on_vendor_response_received(&mut self, gid: u32, oid: u32, payload: Vec<u8>) {
        self.push_expected_call(ExpectedCall::VendorResponse { gid, oid, payload });
    }

    /// Prepare Mock to expect on_vendor_notification_received.
    pub fn expect_on_vendor_notification_received(
        &mut self,
        gid: u32,
        oid: u32,
        payload: Vec<u8>,
    ) {
        self.push_expected_call(ExpectedCall::VendorNotification { gid, oid, payload });
    }

    /// Wait until expected calls are done.
    ///
    /// Returns false if calls are pending after 1 second.
    pub async fn wait_expected_calls_done(&mut self) -> bool {
        while !self.expected_calls.lock().unwrap().is_empty() {
            if timeout(Duration::from_secs(1), self.expect_call_consumed.notified()).await.is_err()
            {
                return false;
            }
        }
        true
    }

    fn push_expected_call(&mut self, call: ExpectedCall) {
        self.expected_calls.lock().unwrap().push_back(call);
    }

    fn pop_expected_call(&mut self) -> ExpectedCall {
        let call = self.expected_calls.lock().unwrap().pop_front().unwrap();
        self.expect_call_consumed.notify_one();
        call
    }
}

impl AdapterStateCallback for MockServiceCallbacks {
    fn on_adapter_state_changed(&mut self, state: AdapterState, reason: StateChangeReason) {
        assert_eq!(self.pop_expected_call(), ExpectedCall::AdapterState { state, reason });
    }
}

impl InitializationFailureListener for MockServiceCallbacks {
    fn on_failure(&mut self) {
        assert_eq!(self.pop_expected_call(), ExpectedCall::InitializationFailure);
    }
}

impl VendorUciCallback for MockServiceCallbacks {
    fn on_vendor_response_received(&mut self, gid: u32, oid: u32, payload: Vec<u8>) {
        assert_eq!(self.pop_expected_call(), ExpectedCall::VendorResponse { gid, oid, payload });
    }

    fn on_vendor_notification_received(&mut self, gid: u32, oid: u32, payload: Vec<u8>) {
        assert_eq!(
            self.pop_expected_call(),
            ExpectedCall::VendorNotification { gid, oid, payload }
        );
    }
}

#[derive(PartialEq, Debug)]
enum ExpectedCall {
    AdapterState { state: AdapterState, reason: StateChangeReason },
    InitializationFailure,
    VendorResponse { gid: u32, oid: u32, payload: Vec<u8> },
    VendorNotification { gid: u32, oid: u32, payload: Vec<u8> },
}

/// Mock of CountryCodeProvider. Each set_country_code() call consumes one expected result.
#[derive(Clone, Default)]
pub struct MockCountryCodeProvider {
    expected_results: Arc<Mutex<VecDeque<(SetCountryCodeStatus, Option<String>)>>>,
}

#[allow(dead_code)]
impl MockCountryCodeProvider {
    /// Constructor.
    pub fn new() -> Self {
        Default::default()
    }

    /// Prepare Mock to expect set_country_code.
    pub fn expect_set_country_code(
        &mut self,
        status: SetCountryCodeStatus,
        country_code: Option<&str>,
    ) {
        self.expected_results
            .lock()
            .unwrap()
            .push_back((status, country_code.map(|code| code.to_string())));
    }

    /// Whether all the expected results are consumed.
    pub fn is_done(&self) -> bool {
        self.expected_results.lock().unwrap().is_empty()
    }
}

impl CountryCodeProvider for MockCountryCodeProvider {
    fn set_country_code(&mut self, force_update: bool) -> (SetCountryCodeStatus, Option<String>) {
        assert!(force_update);
        self.expected_results.lock().unwrap().pop_front().unwrap()
    }
}

#[derive(Default)]
struct WakeLockRecord {
    held: bool,
    acquire_count: usize,
    release_count: usize,
}

/// Mock of WakeLock, which records how many times the lock is acquired and released.
#[derive(Clone, Default)]
pub struct MockWakeLock {
    record: Arc<Mutex<WakeLockRecord>>,
}

#[allow(dead_code)]
impl MockWakeLock {
    /// Constructor.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn acquire_count(&self) -> usize {
        self.record.lock().unwrap().acquire_count
    }

    pub fn release_count(&self) -> usize {
        self.record.lock().unwrap().release_count
    }
}

impl WakeLock for MockWakeLock {
    fn acquire(&mut self) {
        let mut record = self.record.lock().unwrap();
        record.held = true;
        record.acquire_count += 1;
    }

    fn release(&mut self) {
        let mut record = self.record.lock().unwrap();
        assert!(record.held, "Release a wake lock which is not held");
        record.held = false;
        record.release_count += 1;
    }

    fn is_held(&self) -> bool {
        self.record.lock().unwrap().held
    }
}

/// Mock of BugReporter, which records the reasons of the bug reports.
#[derive(Clone, Default)]
pub struct MockBugReporter {
    reports: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockBugReporter {
    /// Constructor.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

impl BugReporter for MockBugReporter {
    fn take_bug_report(&mut self, reason: &str) {
        self.reports.lock().unwrap().push(reason.to_string());
    }
}
