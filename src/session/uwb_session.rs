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

use std::collections::{BTreeMap, VecDeque};

use log::{debug, error, warn};
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::params::app_config_params::AppConfigParams;
use crate::params::fira_app_config_params::UwbAddress;
use crate::params::uci_packets::{
    ChipId, ControleeStatus, SessionHandle, SessionId, SessionState, SessionType,
};
use crate::session::ranging_callback::{RangingCallback, RangingEvent};
use crate::uci::notification::DataRcvNotification;

/// The result of the SESSION_UPDATE_CONTROLLER_MULTICAST_LIST_NTF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MulticastUpdate {
    pub remaining_multicast_list_size: usize,
    pub status_list: Vec<ControleeStatus>,
}

/// The record of an opened session, owned by the SessionManagerActor.
///
/// The state and the multicast update are published through watch channels, so the jobs running
/// on the SessionExecutor can wait for the firmware notifications.
pub(crate) struct UwbSession {
    handle: SessionHandle,
    session_id: SessionId,
    session_type: SessionType,
    chip_id: ChipId,
    identity: String,
    params: AppConfigParams,
    callback: Box<dyn RangingCallback>,
    state_sender: watch::Sender<SessionState>,
    multicast_sender: watch::Sender<Option<MulticastUpdate>>,

    opened: bool,
    closing: bool,
    pending_jobs: usize,
    next_data_sequence_number: u16,
    pending_data_sends: BTreeMap<u16, UwbAddress>,
    pending_data_transfer_phase_config: bool,
    rx_data: VecDeque<DataRcvNotification>,
    rx_data_max_packets: usize,
}

impl UwbSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        handle: SessionHandle,
        session_type: SessionType,
        chip_id: ChipId,
        identity: String,
        params: AppConfigParams,
        callback: Box<dyn RangingCallback>,
        rx_data_max_packets: usize,
    ) -> Self {
        let (state_sender, _) = watch::channel(SessionState::SessionStateDeinit);
        let (multicast_sender, _) = watch::channel(None);
        Self {
            handle,
            session_id: params.session_id(),
            session_type,
            chip_id,
            identity,
            params,
            callback,
            state_sender,
            multicast_sender,
            opened: false,
            closing: false,
            pending_jobs: 0,
            next_data_sequence_number: 0,
            pending_data_sends: BTreeMap::new(),
            pending_data_transfer_phase_config: false,
            rx_data: VecDeque::new(),
            rx_data_max_packets,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn chip_id(&self) -> &str {
        &self.chip_id
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn params(&self) -> &AppConfigParams {
        &self.params
    }

    pub fn set_params(&mut self, params: AppConfigParams) {
        self.params = params;
    }

    pub fn state(&self) -> SessionState {
        *self.state_sender.borrow()
    }

    /// Update the state and return the previous one.
    pub fn set_state(&mut self, state: SessionState) -> SessionState {
        self.state_sender.send_replace(state)
    }

    pub fn state_receiver(&self) -> watch::Receiver<SessionState> {
        self.state_sender.subscribe()
    }

    pub fn set_multicast_update(&mut self, update: MulticastUpdate) {
        self.multicast_sender.send_replace(Some(update));
    }

    pub fn multicast_receiver(&self) -> watch::Receiver<Option<MulticastUpdate>> {
        self.multicast_sender.subscribe()
    }

    pub fn notify(&mut self, event: RangingEvent) {
        debug!("Session {:?} of {}: {:?}", self.handle, self.identity, event);
        self.callback.on_ranging_event(self.handle, event);
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    pub fn mark_opened(&mut self) {
        self.opened = true;
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn mark_closing(&mut self) {
        self.closing = true;
    }

    pub fn add_pending_job(&mut self) {
        self.pending_jobs += 1;
    }

    pub fn finish_pending_job(&mut self) {
        self.pending_jobs = self.pending_jobs.saturating_sub(1);
    }

    /// Check the state before a request is queued. While jobs are pending the state is checked
    /// when the job runs, since the pending jobs may change it.
    pub fn check_state(&self, allowed_states: &[SessionState]) -> Result<()> {
        if self.pending_jobs > 0 {
            return Ok(());
        }
        let state = self.state();
        if !allowed_states.contains(&state) {
            error!("Session {} is at the illegal state {:?}", self.session_id, state);
            return Err(Error::IllegalState);
        }
        Ok(())
    }

    /// Allocate the UCI sequence number of an outgoing data packet, and remember the packet until
    /// its transfer status is known.
    pub fn add_pending_data_send(&mut self, remote_address: UwbAddress) -> u16 {
        let sequence_number = self.next_data_sequence_number;
        self.next_data_sequence_number = self.next_data_sequence_number.wrapping_add(1);
        self.pending_data_sends.insert(sequence_number, remote_address);
        sequence_number
    }

    pub fn take_pending_data_send(&mut self, sequence_number: u16) -> Option<UwbAddress> {
        self.pending_data_sends.remove(&sequence_number)
    }

    pub fn set_pending_data_transfer_phase_config(&mut self) {
        self.pending_data_transfer_phase_config = true;
    }

    /// Clear the pending data transfer phase config request. Returns whether it was pending.
    pub fn take_pending_data_transfer_phase_config(&mut self) -> bool {
        std::mem::replace(&mut self.pending_data_transfer_phase_config, false)
    }

    /// Buffer the received data until the ranging result of the peer arrives. The oldest packet
    /// is dropped when the buffer is full.
    pub fn buffer_rx_data(&mut self, notf: DataRcvNotification) {
        if self.rx_data_max_packets == 0 {
            warn!("Session {} drops the received data, buffering is disabled", self.session_id);
            return;
        }
        while self.rx_data.len() >= self.rx_data_max_packets {
            if let Some(dropped) = self.rx_data.pop_front() {
                warn!(
                    "Session {} drops the received data {} from {:?}",
                    self.session_id, dropped.uci_sequence_num, dropped.source_address
                );
            }
        }
        self.rx_data.push_back(notf);
    }

    /// Take the buffered data received from any of the addresses, in the receiving order.
    pub fn take_rx_data(&mut self, addresses: &[UwbAddress]) -> Vec<DataRcvNotification> {
        let (matched, kept): (VecDeque<_>, VecDeque<_>) =
            self.rx_data.drain(..).partition(|notf| addresses.contains(&notf.source_address));
        self.rx_data = kept;
        matched.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::params::fira_app_config_params::tests::generate_fira_params;
    use crate::params::uci_packets::StatusCode;

    struct NopCallback;
    impl RangingCallback for NopCallback {
        fn on_ranging_event(&mut self, _handle: SessionHandle, _event: RangingEvent) {}
    }

    fn new_session(rx_data_max_packets: usize) -> UwbSession {
        UwbSession::new(
            SessionHandle::new(7),
            SessionType::FiraRangingSession,
            "chip0".to_string(),
            "test".to_string(),
            generate_fira_params(0x123),
            Box::new(NopCallback),
            rx_data_max_packets,
        )
    }

    fn rx_data(sequence_number: u16, address: [u8; 2]) -> DataRcvNotification {
        DataRcvNotification {
            chip_id: "chip0".to_string(),
            session_id: 0x123,
            status: StatusCode::UciStatusOk,
            uci_sequence_num: sequence_number,
            source_address: UwbAddress::Short(address),
            payload: vec![sequence_number as u8],
        }
    }

    #[test]
    fn test_state() {
        let mut session = new_session(1);
        assert_eq!(session.session_id(), 0x123);
        assert_eq!(session.state(), SessionState::SessionStateDeinit);

        let mut receiver = session.state_receiver();
        let prev_state = session.set_state(SessionState::SessionStateInit);
        assert_eq!(prev_state, SessionState::SessionStateDeinit);
        assert!(receiver.has_changed().unwrap());
        assert_eq!(*receiver.borrow_and_update(), SessionState::SessionStateInit);
        assert_eq!(session.state(), SessionState::SessionStateInit);
    }

    #[test]
    fn test_check_state() {
        let mut session = new_session(1);
        session.set_state(SessionState::SessionStateIdle);
        assert_eq!(session.check_state(&[SessionState::SessionStateIdle]), Ok(()));
        assert_eq!(
            session.check_state(&[SessionState::SessionStateActive]),
            Err(Error::IllegalState)
        );

        // The queued jobs may change the state before the request runs.
        session.add_pending_job();
        assert_eq!(session.check_state(&[SessionState::SessionStateActive]), Ok(()));
        session.finish_pending_job();
        assert_eq!(
            session.check_state(&[SessionState::SessionStateActive]),
            Err(Error::IllegalState)
        );
    }

    #[test]
    fn test_data_sequence_number() {
        let mut session = new_session(1);
        session.next_data_sequence_number = u16::MAX;

        let address = UwbAddress::Short([1, 2]);
        assert_eq!(session.add_pending_data_send(address.clone()), u16::MAX);
        assert_eq!(session.add_pending_data_send(address.clone()), 0);
        assert_eq!(session.take_pending_data_send(u16::MAX), Some(address));
        assert_eq!(session.take_pending_data_send(u16::MAX), None);
    }

    #[test]
    fn test_rx_data_buffer() {
        let mut session = new_session(2);
        session.buffer_rx_data(rx_data(1, [1, 2]));
        session.buffer_rx_data(rx_data(2, [3, 4]));
        // The oldest packet is dropped.
        session.buffer_rx_data(rx_data(3, [1, 2]));

        assert!(session.take_rx_data(&[UwbAddress::Short([5, 6])]).is_empty());
        assert_eq!(session.take_rx_data(&[UwbAddress::Short([1, 2])]), vec![rx_data(3, [1, 2])]);
        assert_eq!(session.take_rx_data(&[UwbAddress::Short([3, 4])]), vec![rx_data(2, [3, 4])]);
    }

    #[test]
    fn test_pending_data_transfer_phase_config() {
        let mut session = new_session(1);
        assert!(!session.take_pending_data_transfer_phase_config());
        session.set_pending_data_transfer_phase_config();
        assert!(session.take_pending_data_transfer_phase_config());
        assert!(!session.take_pending_data_transfer_phase_config());
    }
}
