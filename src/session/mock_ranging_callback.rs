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

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::time::{timeout, Duration};

use crate::params::uci_packets::SessionHandle;
use crate::session::ranging_callback::{RangingCallback, RangingEvent};

/// Mock version of RangingCallback for testing. The events are expected in order.
#[derive(Clone, Default)]
pub struct MockRangingCallback {
    expected_events: Arc<Mutex<VecDeque<(SessionHandle, RangingEvent)>>>,
    expect_call_consumed: Arc<Notify>,
}

impl MockRangingCallback {
    /// Constructor.
    pub fn new() -> Self {
        Default::default()
    }

    /// Expect the event of the session.
    pub fn expect_event(&mut self, handle: SessionHandle, event: RangingEvent) {
        self.expected_events.lock().unwrap().push_back((handle, event));
    }

    /// Wait until all the expected events are received.
    ///
    /// Returns false if events are pending after 1 second.
    pub async fn wait_expected_calls_done(&mut self) -> bool {
        while !self.expected_events.lock().unwrap().is_empty() {
            if timeout(Duration::from_secs(1), self.expect_call_consumed.notified()).await.is_err()
            {
                return false;
            }
        }
        true
    }

    fn pop_expected_event(&mut self) -> (SessionHandle, RangingEvent) {
        let event = self.expected_events.lock().unwrap().pop_front().unwrap();
        self.expect_call_consumed.notify_one();
        event
    }
}

impl RangingCallback for MockRangingCallback {
    fn on_ranging_event(&mut self, handle: SessionHandle, event: RangingEvent) {
        assert_eq!(self.pop_expected_event(), (handle, event));
    }
}
