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

//! This module offers a mocked version of NativeUwbManager for testing.
//!
//! The mocked version of NativeUwbManager mimics the behavior of the native UWB stack and the
//! firmware. The expected calls are consumed in order. Each call may emit notifications before
//! returning its result, the same way the firmware sends the notifications after the response.

use std::collections::{HashMap, VecDeque};
use std::iter::zip;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio::time::{sleep, timeout};

use crate::error::{Error, Result};
use crate::params::uci_packets::{
    ChipId, Controlee, DataTransferPhaseConfig, DeviceInfoResponse, DtTagRangingRoundsResponse,
    HybridControleeConfig, HybridControllerConfig, MessageType, RawVendorMessage, SessionId,
    SessionType, SetAppConfigResponse, UpdateMulticastListAction, VendorUciResponse,
};
use crate::uci::native_uwb_manager::NativeUwbManager;
use crate::uci::notification::{
    CoreNotification, DataRcvNotification, NativeNotification, RadarDataRcvNotification,
    SessionNotification,
};

/// Mock version of NativeUwbManager for testing. All the clones share the same expectations.
#[derive(Clone, Default)]
pub struct MockNativeUwbManager {
    expected_calls: Arc<Mutex<VecDeque<ExpectedCall>>>,
    expect_call_consumed: Arc<Notify>,
    notf_senders: Arc<Mutex<NotificationSenders>>,
}

#[derive(Default)]
struct NotificationSenders {
    core: Option<mpsc::UnboundedSender<CoreNotification>>,
    session: Option<mpsc::UnboundedSender<SessionNotification>>,
    vendor: Option<mpsc::UnboundedSender<RawVendorMessage>>,
    data_rcv: Option<mpsc::UnboundedSender<DataRcvNotification>>,
    radar_data_rcv: Option<mpsc::UnboundedSender<RadarDataRcvNotification>>,
}

#[allow(dead_code)]
impl MockNativeUwbManager {
    /// Constructor.
    pub fn new() -> Self {
        Default::default()
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

    /// Send a notification as if it was emitted by the firmware on its own.
    pub fn send_notification(&self, notf: NativeNotification) {
        self.send_notifications(vec![notf]);
    }

    /// Prepare Mock to expect do_initialize.
    ///
    /// The result is returned after `delay`, to mimic a hardware which is slow to come up.
    pub fn expect_do_initialize(
        &mut self,
        delay: Option<Duration>,
        notfs: Vec<NativeNotification>,
        out: Option<HashMap<ChipId, DeviceInfoResponse>>,
    ) {
        self.push_expected_call(ExpectedCall::DoInitialize { delay, notfs, out });
    }

    /// Prepare Mock to expect do_deinitialize.
    pub fn expect_do_deinitialize(&mut self, delay: Option<Duration>, out: bool) {
        self.push_expected_call(ExpectedCall::DoDeinitialize { delay, out });
    }

    /// Prepare Mock to expect get_caps_info.
    pub fn expect_get_caps_info(&mut self, expected_chip_id: &str, out: Result<Vec<u8>>) {
        self.push_expected_call(ExpectedCall::GetCapsInfo {
            expected_chip_id: expected_chip_id.to_string(),
            out,
        });
    }

    /// Prepare Mock to expect session_init.
    pub fn expect_session_init(
        &mut self,
        expected_session_id: SessionId,
        expected_session_type: SessionType,
        expected_chip_id: &str,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SessionInit {
            expected_session_id,
            expected_session_type,
            expected_chip_id: expected_chip_id.to_string(),
            notfs,
            out,
        });
    }

    /// Prepare Mock to expect session_deinit.
    pub fn expect_session_deinit(
        &mut self,
        expected_session_id: SessionId,
        expected_chip_id: &str,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SessionDeinit {
            expected_session_id,
            expected_chip_id: expected_chip_id.to_string(),
            notfs,
            out,
        });
    }

    /// Prepare Mock to expect set_app_configurations.
    pub fn expect_set_app_configurations(
        &mut self,
        expected_session_id: SessionId,
        expected_tlvs: Vec<u8>,
        expected_chip_id: &str,
        notfs: Vec<NativeNotification>,
        out: Result<SetAppConfigResponse>,
    ) {
        self.push_expected_call(ExpectedCall::SetAppConfigurations {
            expected_session_id,
            expected_tlvs,
            expected_chip_id: expected_chip_id.to_string(),
            notfs,
            out,
        });
    }

    /// Prepare Mock to expect get_app_configurations.
    pub fn expect_get_app_configurations(
        &mut self,
        expected_session_id: SessionId,
        expected_tags: Vec<u8>,
        expected_chip_id: &str,
        out: Result<Vec<u8>>,
    ) {
        self.push_expected_call(ExpectedCall::GetAppConfigurations {
            expected_session_id,
            expected_tags,
            expected_chip_id: expected_chip_id.to_string(),
            out,
        });
    }

    /// Prepare Mock to expect set_radar_app_configurations.
    pub fn expect_set_radar_app_configurations(
        &mut self,
        expected_session_id: SessionId,
        expected_tlvs: Vec<u8>,
        expected_chip_id: &str,
        notfs: Vec<NativeNotification>,
        out: Result<SetAppConfigResponse>,
    ) {
        self.push_expected_call(ExpectedCall::SetRadarAppConfigurations {
            expected_session_id,
            expected_tlvs,
            expected_chip_id: expected_chip_id.to_string(),
            notfs,
            out,
        });
    }

    /// Prepare Mock to expect range_start.
    pub fn expect_range_start(
        &mut self,
        expected_session_id: SessionId,
        expected_chip_id: &str,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::RangeStart {
            expected_session_id,
            expected_chip_id: expected_chip_id.to_string(),
            notfs,
            out,
        });
    }

    /// Prepare Mock to expect range_stop.
    pub fn expect_range_stop(
        &mut self,
        expected_session_id: SessionId,
        expected_chip_id: &str,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::RangeStop {
            expected_session_id,
            expected_chip_id: expected_chip_id.to_string(),
            notfs,
            out,
        });
    }

    /// Prepare Mock to expect update_multicast_list.
    pub fn expect_update_multicast_list(
        &mut self,
        expected_session_id: SessionId,
        expected_action: UpdateMulticastListAction,
        expected_controlees: Vec<Controlee>,
        expected_chip_id: &str,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::UpdateMulticastList {
            expected_session_id,
            expected_action,
            expected_controlees,
            expected_chip_id: expected_chip_id.to_string(),
            notfs,
            out,
        });
    }

    /// Prepare Mock to expect update_dt_tag_ranging_rounds.
    pub fn expect_update_dt_tag_ranging_rounds(
        &mut self,
        expected_session_id: SessionId,
        expected_ranging_round_indexes: Vec<u8>,
        expected_chip_id: &str,
        out: Result<DtTagRangingRoundsResponse>,
    ) {
        self.push_expected_call(ExpectedCall::UpdateDtTagRangingRounds {
            expected_session_id,
            expected_ranging_round_indexes,
            expected_chip_id: expected_chip_id.to_string(),
            out,
        });
    }

    /// Prepare Mock to expect query_max_data_size.
    pub fn expect_query_max_data_size(
        &mut self,
        expected_session_id: SessionId,
        expected_chip_id: &str,
        out: Result<u16>,
    ) {
        self.push_expected_call(ExpectedCall::QueryMaxDataSize {
            expected_session_id,
            expected_chip_id: expected_chip_id.to_string(),
            out,
        });
    }

    /// Prepare Mock to expect send_data.
    #[allow(clippy::too_many_arguments)]
    pub fn expect_send_data(
        &mut self,
        expected_session_id: SessionId,
        expected_address: Vec<u8>,
        expected_uci_sequence_number: u16,
        expected_payload: Vec<u8>,
        expected_chip_id: &str,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SendData {
            expected_session_id,
            expected_address,
            expected_uci_sequence_number,
            expected_payload,
            expected_chip_id: expected_chip_id.to_string(),
            notfs,
            out,
        });
    }

    /// Prepare Mock to expect set_data_transfer_phase_config.
    pub fn expect_set_data_transfer_phase_config(
        &mut self,
        expected_session_id: SessionId,
        expected_config: DataTransferPhaseConfig,
        expected_chip_id: &str,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SetDataTransferPhaseConfig {
            expected_session_id,
            expected_config,
            expected_chip_id: expected_chip_id.to_string(),
            notfs,
            out,
        });
    }

    /// Prepare Mock to expect set_hybrid_controller_config.
    pub fn expect_set_hybrid_controller_config(
        &mut self,
        expected_session_id: SessionId,
        expected_config: HybridControllerConfig,
        expected_chip_id: &str,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SetHybridControllerConfig {
            expected_session_id,
            expected_config,
            expected_chip_id: expected_chip_id.to_string(),
            out,
        });
    }

    /// Prepare Mock to expect set_hybrid_controlee_config.
    pub fn expect_set_hybrid_controlee_config(
        &mut self,
        expected_session_id: SessionId,
        expected_config: HybridControleeConfig,
        expected_chip_id: &str,
        out: Result<()>,
    ) {
        self.push_expected_call(ExpectedCall::SetHybridControleeConfig {
            expected_session_id,
            expected_config,
            expected_chip_id: expected_chip_id.to_string(),
            out,
        });
    }

    /// Prepare Mock to expect send_raw_vendor_cmd.
    pub fn expect_send_raw_vendor_cmd(
        &mut self,
        expected_mt: MessageType,
        expected_gid: u32,
        expected_oid: u32,
        expected_payload: Vec<u8>,
        expected_chip_id: &str,
        out: Result<VendorUciResponse>,
    ) {
        self.push_expected_call(ExpectedCall::SendRawVendorCmd {
            expected_mt,
            expected_gid,
            expected_oid,
            expected_payload,
            expected_chip_id: expected_chip_id.to_string(),
            out,
        });
    }

    fn push_expected_call(&mut self, call: ExpectedCall) {
        self.expected_calls.lock().unwrap().push_back(call);
    }

    // Pop the next call if it matches, otherwise keep it at the front of the queue.
    fn pop_expected_call<F>(&self, matched: F) -> Option<ExpectedCall>
    where
        F: FnOnce(&ExpectedCall) -> bool,
    {
        let mut expected_calls = self.expected_calls.lock().unwrap();
        match expected_calls.pop_front() {
            Some(call) if matched(&call) => {
                self.expect_call_consumed.notify_one();
                Some(call)
            }
            Some(call) => {
                expected_calls.push_front(call);
                None
            }
            None => None,
        }
    }

    fn send_notifications(&self, notfs: Vec<NativeNotification>) {
        let senders = self.notf_senders.lock().unwrap();
        for notf in notfs.into_iter() {
            match notf {
                NativeNotification::Core(notf) => {
                    let _ = senders.core.as_ref().unwrap().send(notf);
                }
                NativeNotification::Session(notf) => {
                    let _ = senders.session.as_ref().unwrap().send(notf);
                }
                NativeNotification::Vendor(notf) => {
                    let _ = senders.vendor.as_ref().unwrap().send(notf);
                }
                NativeNotification::DataRcv(notf) => {
                    let _ = senders.data_rcv.as_ref().unwrap().send(notf);
                }
                NativeNotification::RadarDataRcv(notf) => {
                    let _ = senders.radar_data_rcv.as_ref().unwrap().send(notf);
                }
            }
        }
    }
}

#[async_trait]
impl NativeUwbManager for MockNativeUwbManager {
    async fn set_core_notification_sender(
        &mut self,
        core_notf_sender: mpsc::UnboundedSender<CoreNotification>,
    ) {
        self.notf_senders.lock().unwrap().core = Some(core_notf_sender);
    }

    async fn set_session_notification_sender(
        &mut self,
        session_notf_sender: mpsc::UnboundedSender<SessionNotification>,
    ) {
        self.notf_senders.lock().unwrap().session = Some(session_notf_sender);
    }

    async fn set_vendor_notification_sender(
        &mut self,
        vendor_notf_sender: mpsc::UnboundedSender<RawVendorMessage>,
    ) {
        self.notf_senders.lock().unwrap().vendor = Some(vendor_notf_sender);
    }

    async fn set_data_rcv_notification_sender(
        &mut self,
        data_rcv_notf_sender: mpsc::UnboundedSender<DataRcvNotification>,
    ) {
        self.notf_senders.lock().unwrap().data_rcv = Some(data_rcv_notf_sender);
    }

    async fn set_radar_data_rcv_notification_sender(
        &mut self,
        radar_data_rcv_notf_sender: mpsc::UnboundedSender<RadarDataRcvNotification>,
    ) {
        self.notf_senders.lock().unwrap().radar_data_rcv = Some(radar_data_rcv_notf_sender);
    }

    async fn do_initialize(&self) -> Option<HashMap<ChipId, DeviceInfoResponse>> {
        match self.pop_expected_call(|call| matches!(call, ExpectedCall::DoInitialize { .. })) {
            Some(ExpectedCall::DoInitialize { delay, notfs, out }) => {
                if let Some(delay) = delay {
                    sleep(delay).await;
                }
                self.send_notifications(notfs);
                out
            }
            _ => None,
        }
    }

    async fn do_deinitialize(&self) -> bool {
        match self.pop_expected_call(|call| matches!(call, ExpectedCall::DoDeinitialize { .. })) {
            Some(ExpectedCall::DoDeinitialize { delay, out }) => {
                if let Some(delay) = delay {
                    sleep(delay).await;
                }
                out
            }
            _ => false,
        }
    }

    async fn get_caps_info(&self, chip_id: &str) -> Result<Vec<u8>> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::GetCapsInfo { expected_chip_id, .. }
                if expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::GetCapsInfo { out, .. }) => out,
            _ => Err(Error::MockUndefined),
        }
    }

    async fn session_init(
        &self,
        session_id: SessionId,
        session_type: SessionType,
        chip_id: &str,
    ) -> Result<()> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::SessionInit {
                expected_session_id, expected_session_type, expected_chip_id, ..
            } if *expected_session_id == session_id
                && *expected_session_type == session_type
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::SessionInit { notfs, out, .. }) => {
                self.send_notifications(notfs);
                out
            }
            _ => Err(Error::MockUndefined),
        }
    }

    async fn session_deinit(&self, session_id: SessionId, chip_id: &str) -> Result<()> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::SessionDeinit {
                expected_session_id, expected_chip_id, ..
            } if *expected_session_id == session_id && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::SessionDeinit { notfs, out, .. }) => {
                self.send_notifications(notfs);
                out
            }
            _ => Err(Error::MockUndefined),
        }
    }

    async fn set_app_configurations(
        &self,
        session_id: SessionId,
        tlvs: Vec<u8>,
        chip_id: &str,
    ) -> Result<SetAppConfigResponse> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::SetAppConfigurations {
                expected_session_id, expected_tlvs, expected_chip_id, ..
            } if *expected_session_id == session_id
                && *expected_tlvs == tlvs
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::SetAppConfigurations { notfs, out, .. }) => {
                self.send_notifications(notfs);
                out
            }
            _ => Err(Error::MockUndefined),
        }
    }

    async fn get_app_configurations(
        &self,
        session_id: SessionId,
        tags: Vec<u8>,
        chip_id: &str,
    ) -> Result<Vec<u8>> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::GetAppConfigurations {
                expected_session_id, expected_tags, expected_chip_id, ..
            } if *expected_session_id == session_id
                && *expected_tags == tags
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::GetAppConfigurations { out, .. }) => out,
            _ => Err(Error::MockUndefined),
        }
    }

    async fn set_radar_app_configurations(
        &self,
        session_id: SessionId,
        tlvs: Vec<u8>,
        chip_id: &str,
    ) -> Result<SetAppConfigResponse> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::SetRadarAppConfigurations {
                expected_session_id, expected_tlvs, expected_chip_id, ..
            } if *expected_session_id == session_id
                && *expected_tlvs == tlvs
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::SetRadarAppConfigurations { notfs, out, .. }) => {
                self.send_notifications(notfs);
                out
            }
            _ => Err(Error::MockUndefined),
        }
    }

    async fn range_start(&self, session_id: SessionId, chip_id: &str) -> Result<()> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::RangeStart {
                expected_session_id, expected_chip_id, ..
            } if *expected_session_id == session_id && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::RangeStart { notfs, out, .. }) => {
                self.send_notifications(notfs);
                out
            }
            _ => Err(Error::MockUndefined),
        }
    }

    async fn range_stop(&self, session_id: SessionId, chip_id: &str) -> Result<()> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::RangeStop {
                expected_session_id, expected_chip_id, ..
            } if *expected_session_id == session_id && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::RangeStop { notfs, out, .. }) => {
                self.send_notifications(notfs);
                out
            }
            _ => Err(Error::MockUndefined),
        }
    }

    async fn update_multicast_list(
        &self,
        session_id: SessionId,
        action: UpdateMulticastListAction,
        controlees: Vec<Controlee>,
        chip_id: &str,
    ) -> Result<()> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::UpdateMulticastList {
                expected_session_id, expected_action, expected_controlees, expected_chip_id, ..
            } if *expected_session_id == session_id
                && *expected_action == action
                && expected_controlees.len() == controlees.len()
                && zip(expected_controlees, &controlees).all(|(a, b)| {
                    a.short_address == b.short_address && a.subsession_id == b.subsession_id
                })
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::UpdateMulticastList { notfs, out, .. }) => {
                self.send_notifications(notfs);
                out
            }
            _ => Err(Error::MockUndefined),
        }
    }

    async fn update_dt_tag_ranging_rounds(
        &self,
        session_id: SessionId,
        ranging_round_indexes: Vec<u8>,
        chip_id: &str,
    ) -> Result<DtTagRangingRoundsResponse> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::UpdateDtTagRangingRounds {
                expected_session_id, expected_ranging_round_indexes, expected_chip_id, ..
            } if *expected_session_id == session_id
                && *expected_ranging_round_indexes == ranging_round_indexes
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::UpdateDtTagRangingRounds { out, .. }) => out,
            _ => Err(Error::MockUndefined),
        }
    }

    async fn query_max_data_size(&self, session_id: SessionId, chip_id: &str) -> Result<u16> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::QueryMaxDataSize {
                expected_session_id, expected_chip_id, ..
            } if *expected_session_id == session_id && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::QueryMaxDataSize { out, .. }) => out,
            _ => Err(Error::MockUndefined),
        }
    }

    async fn send_data(
        &self,
        session_id: SessionId,
        address: Vec<u8>,
        uci_sequence_number: u16,
        payload: Vec<u8>,
        chip_id: &str,
    ) -> Result<()> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::SendData {
                expected_session_id,
                expected_address,
                expected_uci_sequence_number,
                expected_payload,
                expected_chip_id,
                ..
            } if *expected_session_id == session_id
                && *expected_address == address
                && *expected_uci_sequence_number == uci_sequence_number
                && *expected_payload == payload
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::SendData { notfs, out, .. }) => {
                self.send_notifications(notfs);
                out
            }
            _ => Err(Error::MockUndefined),
        }
    }

    async fn set_data_transfer_phase_config(
        &self,
        session_id: SessionId,
        config: DataTransferPhaseConfig,
        chip_id: &str,
    ) -> Result<()> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::SetDataTransferPhaseConfig {
                expected_session_id, expected_config, expected_chip_id, ..
            } if *expected_session_id == session_id
                && *expected_config == config
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::SetDataTransferPhaseConfig { notfs, out, .. }) => {
                self.send_notifications(notfs);
                out
            }
            _ => Err(Error::MockUndefined),
        }
    }

    async fn set_hybrid_controller_config(
        &self,
        session_id: SessionId,
        config: HybridControllerConfig,
        chip_id: &str,
    ) -> Result<()> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::SetHybridControllerConfig {
                expected_session_id, expected_config, expected_chip_id, ..
            } if *expected_session_id == session_id
                && *expected_config == config
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::SetHybridControllerConfig { out, .. }) => out,
            _ => Err(Error::MockUndefined),
        }
    }

    async fn set_hybrid_controlee_config(
        &self,
        session_id: SessionId,
        config: HybridControleeConfig,
        chip_id: &str,
    ) -> Result<()> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::SetHybridControleeConfig {
                expected_session_id, expected_config, expected_chip_id, ..
            } if *expected_session_id == session_id
                && *expected_config == config
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::SetHybridControleeConfig { out, .. }) => out,
            _ => Err(Error::MockUndefined),
        }
    }

    async fn send_raw_vendor_cmd(
        &self,
        mt: MessageType,
        gid: u32,
        oid: u32,
        payload: Vec<u8>,
        chip_id: &str,
    ) -> Result<VendorUciResponse> {
        match self.pop_expected_call(|call| {
            matches!(call, ExpectedCall::SendRawVendorCmd {
                expected_mt, expected_gid, expected_oid, expected_payload, expected_chip_id, ..
            } if *expected_mt == mt
                && *expected_gid == gid
                && *expected_oid == oid
                && *expected_payload == payload
                && expected_chip_id == chip_id)
        }) {
            Some(ExpectedCall::SendRawVendorCmd { out, .. }) => out,
            _ => Err(Error::MockUndefined),
        }
    }
}

enum ExpectedCall {
    DoInitialize {
        delay: Option<Duration>,
        notfs: Vec<NativeNotification>,
        out: Option<HashMap<ChipId, DeviceInfoResponse>>,
    },
    DoDeinitialize {
        delay: Option<Duration>,
        out: bool,
    },
    GetCapsInfo {
        expected_chip_id: ChipId,
        out: Result<Vec<u8>>,
    },
    SessionInit {
        expected_session_id: SessionId,
        expected_session_type: SessionType,
        expected_chip_id: ChipId,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    },
    SessionDeinit {
        expected_session_id: SessionId,
        expected_chip_id: ChipId,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    },
    SetAppConfigurations {
        expected_session_id: SessionId,
        expected_tlvs: Vec<u8>,
        expected_chip_id: ChipId,
        notfs: Vec<NativeNotification>,
        out: Result<SetAppConfigResponse>,
    },
    GetAppConfigurations {
        expected_session_id: SessionId,
        expected_tags: Vec<u8>,
        expected_chip_id: ChipId,
        out: Result<Vec<u8>>,
    },
    SetRadarAppConfigurations {
        expected_session_id: SessionId,
        expected_tlvs: Vec<u8>,
        expected_chip_id: ChipId,
        notfs: Vec<NativeNotification>,
        out: Result<SetAppConfigResponse>,
    },
    RangeStart {
        expected_session_id: SessionId,
        expected_chip_id: ChipId,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    },
    RangeStop {
        expected_session_id: SessionId,
        expected_chip_id: ChipId,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    },
    UpdateMulticastList {
        expected_session_id: SessionId,
        expected_action: UpdateMulticastListAction,
        expected_controlees: Vec<Controlee>,
        expected_chip_id: ChipId,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    },
    UpdateDtTagRangingRounds {
        expected_session_id: SessionId,
        expected_ranging_round_indexes: Vec<u8>,
        expected_chip_id: ChipId,
        out: Result<DtTagRangingRoundsResponse>,
    },
    QueryMaxDataSize {
        expected_session_id: SessionId,
        expected_chip_id: ChipId,
        out: Result<u16>,
    },
    SendData {
        expected_session_id: SessionId,
        expected_address: Vec<u8>,
        expected_uci_sequence_number: u16,
        expected_payload: Vec<u8>,
        expected_chip_id: ChipId,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    },
    SetDataTransferPhaseConfig {
        expected_session_id: SessionId,
        expected_config: DataTransferPhaseConfig,
        expected_chip_id: ChipId,
        notfs: Vec<NativeNotification>,
        out: Result<()>,
    },
    SetHybridControllerConfig {
        expected_session_id: SessionId,
        expected_config: HybridControllerConfig,
        expected_chip_id: ChipId,
        out: Result<()>,
    },
    SetHybridControleeConfig {
        expected_session_id: SessionId,
        expected_config: HybridControleeConfig,
        expected_chip_id: ChipId,
        out: Result<()>,
    },
    SendRawVendorCmd {
        expected_mt: MessageType,
        expected_gid: u32,
        expected_oid: u32,
        expected_payload: Vec<u8>,
        expected_chip_id: ChipId,
        out: Result<VendorUciResponse>,
    },
}
