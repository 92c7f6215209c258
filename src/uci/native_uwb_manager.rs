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

//! This module defines the NativeUwbManager, the interface of the native UWB stack which speaks
//! UCI with the firmware of each chip.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::params::uci_packets::{
    ChipId, Controlee, DataTransferPhaseConfig, DeviceInfoResponse, DtTagRangingRoundsResponse,
    HybridControleeConfig, HybridControllerConfig, MessageType, RawVendorMessage, SessionId,
    SessionType, SetAppConfigResponse, UpdateMulticastListAction, VendorUciResponse,
};
use crate::uci::notification::{
    CoreNotification, DataRcvNotification, RadarDataRcvNotification, SessionNotification,
};

/// The NativeUwbManager is the outbound boundary of the service. Each method is a blocking call
/// into the native stack that completes when the firmware responds.
///
/// The app configurations are exchanged as serialized TLV streams, see caps::TlvBuffer.
#[async_trait]
pub trait NativeUwbManager: 'static + Send + Sync + Clone {
    // Set the senders of the notifications. They are replaced every time the stack is brought up.
    async fn set_core_notification_sender(
        &mut self,
        core_notf_sender: mpsc::UnboundedSender<CoreNotification>,
    );
    async fn set_session_notification_sender(
        &mut self,
        session_notf_sender: mpsc::UnboundedSender<SessionNotification>,
    );
    async fn set_vendor_notification_sender(
        &mut self,
        vendor_notf_sender: mpsc::UnboundedSender<RawVendorMessage>,
    );
    async fn set_data_rcv_notification_sender(
        &mut self,
        data_rcv_notf_sender: mpsc::UnboundedSender<DataRcvNotification>,
    );
    async fn set_radar_data_rcv_notification_sender(
        &mut self,
        radar_data_rcv_notf_sender: mpsc::UnboundedSender<RadarDataRcvNotification>,
    );

    // Bring up all the chips. None means the hardware failed to initialize.
    async fn do_initialize(&self) -> Option<HashMap<ChipId, DeviceInfoResponse>>;

    // Shut down all the chips.
    async fn do_deinitialize(&self) -> bool;

    // Read the capability TLVs of the chip.
    async fn get_caps_info(&self, chip_id: &str) -> Result<Vec<u8>>;

    async fn session_init(
        &self,
        session_id: SessionId,
        session_type: SessionType,
        chip_id: &str,
    ) -> Result<()>;
    async fn session_deinit(&self, session_id: SessionId, chip_id: &str) -> Result<()>;
    async fn set_app_configurations(
        &self,
        session_id: SessionId,
        tlvs: Vec<u8>,
        chip_id: &str,
    ) -> Result<SetAppConfigResponse>;
    async fn get_app_configurations(
        &self,
        session_id: SessionId,
        tags: Vec<u8>,
        chip_id: &str,
    ) -> Result<Vec<u8>>;
    async fn set_radar_app_configurations(
        &self,
        session_id: SessionId,
        tlvs: Vec<u8>,
        chip_id: &str,
    ) -> Result<SetAppConfigResponse>;
    async fn range_start(&self, session_id: SessionId, chip_id: &str) -> Result<()>;
    async fn range_stop(&self, session_id: SessionId, chip_id: &str) -> Result<()>;
    async fn update_multicast_list(
        &self,
        session_id: SessionId,
        action: UpdateMulticastListAction,
        controlees: Vec<Controlee>,
        chip_id: &str,
    ) -> Result<()>;
    async fn update_dt_tag_ranging_rounds(
        &self,
        session_id: SessionId,
        ranging_round_indexes: Vec<u8>,
        chip_id: &str,
    ) -> Result<DtTagRangingRoundsResponse>;
    async fn query_max_data_size(&self, session_id: SessionId, chip_id: &str) -> Result<u16>;

    // Send a data packet to the peer. The result of the transfer is reported by the
    // SessionNotification::DataTransferStatus notification.
    async fn send_data(
        &self,
        session_id: SessionId,
        address: Vec<u8>,
        uci_sequence_number: u16,
        payload: Vec<u8>,
        chip_id: &str,
    ) -> Result<()>;
    async fn set_data_transfer_phase_config(
        &self,
        session_id: SessionId,
        config: DataTransferPhaseConfig,
        chip_id: &str,
    ) -> Result<()>;
    async fn set_hybrid_controller_config(
        &self,
        session_id: SessionId,
        config: HybridControllerConfig,
        chip_id: &str,
    ) -> Result<()>;
    async fn set_hybrid_controlee_config(
        &self,
        session_id: SessionId,
        config: HybridControleeConfig,
        chip_id: &str,
    ) -> Result<()>;

    // Send a raw vendor command.
    async fn send_raw_vendor_cmd(
        &self,
        mt: MessageType,
        gid: u32,
        oid: u32,
        payload: Vec<u8>,
        chip_id: &str,
    ) -> Result<VendorUciResponse>;
}
