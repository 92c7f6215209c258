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

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::sync::{mpsc, oneshot};

use crate::caps::TlvBuffer;
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::params::app_config_params::{AppConfigParams, ReconfigureParams};
use crate::params::bundle::Bundle;
use crate::params::fira_app_config_params::{SuspendRanging, UwbAddress};
use crate::params::fira_reconfigure_params::FiraReconfigureParams;
use crate::params::uci_packets::{
    ChipId, DataTransferNtfStatusCode, DataTransferPhaseConfig, HybridControleeConfig,
    HybridControllerConfig, ReasonCode, SessionHandle, SessionId, SessionState, StatusCode,
    UpdateMulticastListAction,
};
use crate::session::ranging_callback::{RangingCallback, RangingChangeReason, RangingEvent};
use crate::session::session_executor::{
    Job, JobOutcome, ReconfigureOp, SessionExecutor, SessionOutcome, SessionTask,
    CONFIGURABLE_STATES,
};
use crate::session::uwb_session::{MulticastUpdate, UwbSession};
use crate::uci::native_uwb_manager::NativeUwbManager;
use crate::uci::notification::{
    DataRcvNotification, RadarDataRcvNotification, SessionNotification,
};

/// The SessionManager organizes the state machine of the existing UWB ranging sessions, sends
/// the session-related requests to the SessionExecutor, and handles the session notifications
/// from the native stack.
/// Using the actor model, SessionManager delegates the requests to SessionManagerActor.
///
/// Each request is validated synchronously: the returned error means nothing was sent to the
/// firmware. An accepted request ends with exactly one terminal RangingEvent delivered to the
/// callback of the session.
pub(crate) struct SessionManager {
    cmd_sender: mpsc::UnboundedSender<(SessionCommand, ResponseSender)>,
}

impl SessionManager {
    pub fn new<N: NativeUwbManager>(
        config: &ServiceConfig,
        native_manager: N,
        session_notf_receiver: mpsc::UnboundedReceiver<SessionNotification>,
        data_rcv_notf_receiver: mpsc::UnboundedReceiver<DataRcvNotification>,
        radar_data_rcv_notf_receiver: mpsc::UnboundedReceiver<RadarDataRcvNotification>,
    ) -> Self {
        let (cmd_sender, cmd_receiver) = mpsc::unbounded_channel();
        let (job_sender, job_receiver) = mpsc::unbounded_channel();
        let (outcome_sender, outcome_receiver) = mpsc::unbounded_channel();

        let mut executor = SessionExecutor::new(
            job_receiver,
            outcome_sender,
            native_manager,
            Duration::from_millis(config.session_state_timeout_ms),
            config.ccc_ranging_stopped_params_send_enabled,
        );
        tokio::spawn(async move { executor.run().await });

        let mut actor = SessionManagerActor::new(
            cmd_receiver,
            job_sender,
            outcome_receiver,
            session_notf_receiver,
            data_rcv_notf_receiver,
            radar_data_rcv_notf_receiver,
            config.max_session_count,
            config.rx_data_max_packets_to_store,
        );
        tokio::spawn(async move { actor.run().await });

        Self { cmd_sender }
    }

    pub async fn open_session(
        &mut self,
        identity: String,
        handle: SessionHandle,
        chip_id: ChipId,
        params: Bundle,
        callback: Box<dyn RangingCallback>,
    ) -> Result<()> {
        self.send_cmd(SessionCommand::OpenSession { identity, handle, chip_id, params, callback })
            .await?;
        Ok(())
    }

    /// Start ranging. The optional params are only accepted by the CCC and the Aliro sessions.
    pub async fn start_ranging(
        &mut self,
        handle: SessionHandle,
        params: Option<Bundle>,
    ) -> Result<()> {
        self.send_cmd(SessionCommand::StartRanging { handle, params }).await?;
        Ok(())
    }

    pub async fn stop_ranging(&mut self, handle: SessionHandle) -> Result<()> {
        self.send_cmd(SessionCommand::StopRanging { handle }).await?;
        Ok(())
    }

    pub async fn reconfigure(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.send_reconfigure(handle, ReconfigureOp::Reconfigure, params).await
    }

    pub async fn pause(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.send_reconfigure(handle, ReconfigureOp::Pause, params).await
    }

    pub async fn resume(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.send_reconfigure(handle, ReconfigureOp::Resume, params).await
    }

    pub async fn add_controlee(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.send_reconfigure(handle, ReconfigureOp::AddControlee, params).await
    }

    pub async fn remove_controlee(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.send_reconfigure(handle, ReconfigureOp::RemoveControlee, params).await
    }

    pub async fn close_session(&mut self, handle: SessionHandle) -> Result<()> {
        self.send_cmd(SessionCommand::CloseSession { handle }).await?;
        Ok(())
    }

    pub async fn send_data(
        &mut self,
        handle: SessionHandle,
        remote_address: UwbAddress,
        payload: Vec<u8>,
    ) -> Result<()> {
        self.send_cmd(SessionCommand::SendData { handle, remote_address, payload }).await?;
        Ok(())
    }

    pub async fn set_data_transfer_phase_config(
        &mut self,
        handle: SessionHandle,
        config: DataTransferPhaseConfig,
    ) -> Result<()> {
        self.send_cmd(SessionCommand::SetDataTransferPhaseConfig { handle, config }).await?;
        Ok(())
    }

    pub async fn set_hybrid_controller_config(
        &mut self,
        handle: SessionHandle,
        config: HybridControllerConfig,
    ) -> Result<()> {
        self.send_cmd(SessionCommand::SetHybridControllerConfig { handle, config }).await?;
        Ok(())
    }

    pub async fn set_hybrid_controlee_config(
        &mut self,
        handle: SessionHandle,
        config: HybridControleeConfig,
    ) -> Result<()> {
        self.send_cmd(SessionCommand::SetHybridControleeConfig { handle, config }).await?;
        Ok(())
    }

    pub async fn update_dt_tag_ranging_rounds(
        &mut self,
        handle: SessionHandle,
        ranging_round_indexes: Vec<u8>,
    ) -> Result<()> {
        self.send_cmd(SessionCommand::UpdateDtTagRangingRounds { handle, ranging_round_indexes })
            .await?;
        Ok(())
    }

    /// Query the max data size of the session. The query is queued behind the pending jobs.
    pub async fn query_max_data_size(&mut self, handle: SessionHandle) -> Result<u16> {
        match self.send_cmd(SessionCommand::QueryMaxDataSize { handle }).await? {
            Response::MaxDataSize(size) => Ok(size),
            response => {
                error!("query_max_data_size() should return MaxDataSize: {:?}", response);
                Err(Error::Unknown)
            }
        }
    }

    /// Close all the sessions, and wait until the Closed events are delivered.
    pub async fn close_all_sessions(&mut self, reason: RangingChangeReason) -> Result<()> {
        self.send_cmd(SessionCommand::CloseAllSessions { reason }).await?;
        Ok(())
    }

    async fn send_reconfigure(
        &mut self,
        handle: SessionHandle,
        op: ReconfigureOp,
        params: Bundle,
    ) -> Result<()> {
        self.send_cmd(SessionCommand::Reconfigure { handle, op, params }).await?;
        Ok(())
    }

    // Send the |cmd| to the SessionManagerActor.
    async fn send_cmd(&self, cmd: SessionCommand) -> Result<Response> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.cmd_sender.send((cmd, result_sender)).map_err(|cmd| {
            error!("Failed to send cmd: {:?}", cmd.0);
            Error::Unknown
        })?;
        result_receiver.await.unwrap_or(Err(Error::Unknown))
    }
}

struct SessionManagerActor {
    // Receive the commands and the corresponding response senders from SessionManager.
    cmd_receiver: mpsc::UnboundedReceiver<(SessionCommand, ResponseSender)>,

    // The jobs are executed by the SessionExecutor, and the outcomes come back here.
    job_sender: mpsc::UnboundedSender<Job>,
    outcome_receiver: mpsc::UnboundedReceiver<JobOutcome>,

    // Receive the notifications from the native stack.
    session_notf_receiver: mpsc::UnboundedReceiver<SessionNotification>,
    data_rcv_notf_receiver: mpsc::UnboundedReceiver<DataRcvNotification>,
    radar_data_rcv_notf_receiver: mpsc::UnboundedReceiver<RadarDataRcvNotification>,

    max_session_count: usize,
    rx_data_max_packets: usize,
    sessions: BTreeMap<SessionHandle, UwbSession>,
}

impl SessionManagerActor {
    #[allow(clippy::too_many_arguments)]
    fn new(
        cmd_receiver: mpsc::UnboundedReceiver<(SessionCommand, ResponseSender)>,
        job_sender: mpsc::UnboundedSender<Job>,
        outcome_receiver: mpsc::UnboundedReceiver<JobOutcome>,
        session_notf_receiver: mpsc::UnboundedReceiver<SessionNotification>,
        data_rcv_notf_receiver: mpsc::UnboundedReceiver<DataRcvNotification>,
        radar_data_rcv_notf_receiver: mpsc::UnboundedReceiver<RadarDataRcvNotification>,
        max_session_count: usize,
        rx_data_max_packets: usize,
    ) -> Self {
        Self {
            cmd_receiver,
            job_sender,
            outcome_receiver,
            session_notf_receiver,
            data_rcv_notf_receiver,
            radar_data_rcv_notf_receiver,
            max_session_count,
            rx_data_max_packets,
            sessions: BTreeMap::new(),
        }
    }

    async fn run(&mut self) {
        loop {
            tokio::select! {
                cmd = self.cmd_receiver.recv() => {
                    match cmd {
                        None => {
                            debug!("SessionManager is about to drop.");
                            break;
                        },
                        Some((cmd, result_sender)) => {
                            self.handle_cmd(cmd, result_sender);
                        }
                    }
                }

                Some(outcome) = self.outcome_receiver.recv() => {
                    self.handle_job_outcome(outcome);
                }
                Some(session_notf) = self.session_notf_receiver.recv() => {
                    self.handle_session_notification(session_notf);
                }
                Some(data_rcv_notf) = self.data_rcv_notf_receiver.recv() => {
                    self.handle_data_rcv_notification(data_rcv_notf);
                }
                Some(radar_data_rcv_notf) = self.radar_data_rcv_notf_receiver.recv() => {
                    self.handle_radar_data_rcv_notification(radar_data_rcv_notf);
                }
            }
        }
    }

    fn handle_cmd(&mut self, cmd: SessionCommand, result_sender: ResponseSender) {
        let result = match cmd {
            SessionCommand::OpenSession { identity, handle, chip_id, params, callback } => {
                self.open_session(identity, handle, chip_id, params, callback)
            }
            SessionCommand::StartRanging { handle, params } => self.start_ranging(handle, params),
            SessionCommand::StopRanging { handle } => self.stop_ranging(handle),
            SessionCommand::Reconfigure { handle, op, params } => {
                self.reconfigure(handle, op, &params)
            }
            SessionCommand::CloseSession { handle } => self.close_session(handle),
            SessionCommand::SendData { handle, remote_address, payload } => {
                self.send_data(handle, remote_address, payload)
            }
            SessionCommand::SetDataTransferPhaseConfig { handle, config } => {
                self.set_data_transfer_phase_config(handle, config)
            }
            SessionCommand::SetHybridControllerConfig { handle, config } => {
                self.fira_session(handle, &CONFIGURABLE_STATES).and_then(|_| {
                    self.enqueue(handle, SessionTask::SetHybridControllerConfig { config })
                })
            }
            SessionCommand::SetHybridControleeConfig { handle, config } => {
                self.fira_session(handle, &CONFIGURABLE_STATES).and_then(|_| {
                    self.enqueue(handle, SessionTask::SetHybridControleeConfig { config })
                })
            }
            SessionCommand::UpdateDtTagRangingRounds { handle, ranging_round_indexes } => {
                self.fira_session(handle, &CONFIGURABLE_STATES).and_then(|_| {
                    let task = SessionTask::UpdateDtTagRangingRounds { ranging_round_indexes };
                    self.enqueue(handle, task)
                })
            }
            SessionCommand::QueryMaxDataSize { handle } => {
                // The response is sent by the SessionExecutor.
                if let Err(e) = self.active_session(handle) {
                    let _ = result_sender.send(Err(e));
                    return;
                }
                let _ = self.enqueue(handle, SessionTask::QueryMaxDataSize { result_sender });
                return;
            }
            SessionCommand::CloseAllSessions { reason } => {
                // The response is sent when the Flush job comes back.
                self.close_all_sessions(reason, result_sender);
                return;
            }
        };
        let _ = result_sender.send(result.map(|_| Response::Null));
    }

    fn open_session(
        &mut self,
        identity: String,
        handle: SessionHandle,
        chip_id: ChipId,
        params: Bundle,
        callback: Box<dyn RangingCallback>,
    ) -> Result<()> {
        if self.sessions.contains_key(&handle) {
            error!("The session handle {:?} is already used", handle);
            return Err(Error::Duplicate);
        }
        let params = AppConfigParams::from_bundle(&params)?;
        let session_id = params.session_id();
        if self.sessions.values().any(|s| s.session_id() == session_id && s.chip_id() == chip_id) {
            error!("Session {} already exists on chip {}", session_id, chip_id);
            return Err(Error::Duplicate);
        }
        let session_count = self.sessions.values().filter(|s| s.chip_id() == chip_id).count();
        if session_count >= self.max_session_count {
            error!("The chip {} already has {} sessions", chip_id, session_count);
            return Err(Error::IllegalState);
        }

        debug!("{} opens the {:?} session {} on chip {}", identity, handle, session_id, chip_id);
        let session = UwbSession::new(
            handle,
            params.session_type(),
            chip_id,
            identity,
            params.clone(),
            callback,
            self.rx_data_max_packets,
        );
        // We store the session first. It is removed when the open job fails.
        self.sessions.insert(handle, session);
        if let Err(e) = self.enqueue(handle, SessionTask::Open { params }) {
            self.sessions.remove(&handle);
            return Err(e);
        }
        Ok(())
    }

    fn start_ranging(&mut self, handle: SessionHandle, params: Option<Bundle>) -> Result<()> {
        let session = self.active_session(handle)?;
        session.check_state(&[SessionState::SessionStateIdle])?;
        let updated = match params {
            None => None,
            Some(params) => {
                Some(updated_ccc_params(session, &params, SessionState::SessionStateIdle)?)
            }
        };
        let task = SessionTask::Start { params: session.params().clone(), updated };
        self.enqueue(handle, task)
    }

    fn stop_ranging(&mut self, handle: SessionHandle) -> Result<()> {
        let session = self.active_session(handle)?;
        session.check_state(&[SessionState::SessionStateActive])?;
        let protocol = session.params().protocol_name();
        self.enqueue(handle, SessionTask::Stop { protocol })
    }

    fn reconfigure(
        &mut self,
        handle: SessionHandle,
        op: ReconfigureOp,
        params: &Bundle,
    ) -> Result<()> {
        let session = self.active_session(handle)?;
        session.check_state(&CONFIGURABLE_STATES)?;
        let task = reconfigure_task(session, op, params)?;
        self.enqueue(handle, task)
    }

    fn close_session(&mut self, handle: SessionHandle) -> Result<()> {
        self.active_session(handle)?;
        self.enqueue(handle, SessionTask::Close { reason: RangingChangeReason::LocalApi })?;
        if let Some(session) = self.sessions.get_mut(&handle) {
            session.mark_closing();
        }
        Ok(())
    }

    fn send_data(
        &mut self,
        handle: SessionHandle,
        remote_address: UwbAddress,
        payload: Vec<u8>,
    ) -> Result<()> {
        self.fira_session(handle, &[SessionState::SessionStateActive])?;
        let sequence_number = match self.sessions.get_mut(&handle) {
            Some(session) => session.add_pending_data_send(remote_address.clone()),
            None => return Err(Error::IllegalState),
        };
        let task = SessionTask::SendData { remote_address, sequence_number, payload };
        let result = self.enqueue(handle, task);
        if result.is_err() {
            if let Some(session) = self.sessions.get_mut(&handle) {
                session.take_pending_data_send(sequence_number);
            }
        }
        result
    }

    fn set_data_transfer_phase_config(
        &mut self,
        handle: SessionHandle,
        config: DataTransferPhaseConfig,
    ) -> Result<()> {
        self.fira_session(handle, &CONFIGURABLE_STATES)?;
        self.enqueue(handle, SessionTask::SetDataTransferPhaseConfig { config })?;
        if let Some(session) = self.sessions.get_mut(&handle) {
            session.set_pending_data_transfer_phase_config();
        }
        Ok(())
    }

    fn close_all_sessions(&mut self, reason: RangingChangeReason, result_sender: ResponseSender) {
        let handles: Vec<SessionHandle> =
            self.sessions.values().filter(|s| !s.is_closing()).map(|s| s.handle()).collect();
        for handle in handles.into_iter() {
            if self.enqueue(handle, SessionTask::Close { reason }).is_ok() {
                if let Some(session) = self.sessions.get_mut(&handle) {
                    session.mark_closing();
                }
            }
        }
        if let Err(e) = self.job_sender.send(Job::Flush { result_sender }) {
            error!("Failed to send the flush job");
            if let Job::Flush { result_sender } = e.0 {
                let _ = result_sender.send(Err(Error::Unknown));
            }
        }
    }

    fn handle_job_outcome(&mut self, outcome: JobOutcome) {
        let (handle, outcome) = match outcome {
            JobOutcome::Flushed { result_sender } => {
                let _ = result_sender.send(Ok(Response::Null));
                return;
            }
            JobOutcome::Session { handle, outcome } => (handle, outcome),
        };
        let session = match self.sessions.get_mut(&handle) {
            Some(session) => session,
            None => {
                debug!("Drop the outcome of the closed session {:?}: {:?}", handle, outcome);
                return;
            }
        };
        session.finish_pending_job();
        let outcome = match outcome {
            Some(outcome) => outcome,
            None => return,
        };

        match outcome {
            SessionOutcome::Opened(Ok(())) => {
                session.mark_opened();
                session.notify(RangingEvent::Opened);
            }
            SessionOutcome::Opened(Err(error)) => {
                if let Some(mut session) = self.sessions.remove(&handle) {
                    session.notify(RangingEvent::OpenFailed { error });
                }
            }
            SessionOutcome::Started(Ok((params, updated_params))) => {
                if let Some(updated_params) = updated_params {
                    session.set_params(updated_params);
                }
                session.notify(RangingEvent::Started { params });
            }
            SessionOutcome::Started(Err(error)) => {
                session.notify(RangingEvent::StartFailed { error });
            }
            SessionOutcome::Stopped(Ok(params)) => {
                let reason = RangingChangeReason::LocalApi;
                session.notify(RangingEvent::Stopped { reason, params });
            }
            SessionOutcome::Stopped(Err(error)) => {
                session.notify(RangingEvent::StopFailed { error });
            }
            SessionOutcome::Reconfigured { op, result: Ok(updated_params) } => {
                if let Some(updated_params) = updated_params {
                    session.set_params(updated_params);
                }
                let event = match op {
                    ReconfigureOp::Reconfigure => RangingEvent::Reconfigured,
                    ReconfigureOp::Pause => RangingEvent::Paused,
                    ReconfigureOp::Resume => RangingEvent::Resumed,
                    ReconfigureOp::AddControlee => RangingEvent::ControleeAdded,
                    ReconfigureOp::RemoveControlee => RangingEvent::ControleeRemoved,
                };
                session.notify(event);
            }
            SessionOutcome::Reconfigured { op, result: Err(error) } => {
                let event = match op {
                    ReconfigureOp::Reconfigure => RangingEvent::ReconfigureFailed { error },
                    ReconfigureOp::Pause => RangingEvent::PauseFailed { error },
                    ReconfigureOp::Resume => RangingEvent::ResumeFailed { error },
                    ReconfigureOp::AddControlee => RangingEvent::ControleeAddFailed { error },
                    ReconfigureOp::RemoveControlee => {
                        RangingEvent::ControleeRemoveFailed { error }
                    }
                };
                session.notify(event);
            }
            SessionOutcome::DataSendFailed { sequence_number, error } => {
                if let Some(remote_address) = session.take_pending_data_send(sequence_number) {
                    session.notify(RangingEvent::DataSendFailed { remote_address, error });
                }
            }
            SessionOutcome::DataTransferPhaseConfigFailed(error) => {
                if session.take_pending_data_transfer_phase_config() {
                    session.notify(RangingEvent::DataTransferPhaseConfigFailed { error });
                }
            }
            SessionOutcome::HybridControllerConfigured(result) => {
                session.notify(match result {
                    Ok(()) => RangingEvent::HybridControllerConfigured,
                    Err(error) => RangingEvent::HybridControllerConfigFailed { error },
                });
            }
            SessionOutcome::HybridControleeConfigured(result) => {
                session.notify(match result {
                    Ok(()) => RangingEvent::HybridControleeConfigured,
                    Err(error) => RangingEvent::HybridControleeConfigFailed { error },
                });
            }
            SessionOutcome::DtTagRangingRoundsUpdated(result) => {
                session.notify(match result {
                    Ok(response) => RangingEvent::DtTagRangingRoundsUpdated(response),
                    Err(error) => RangingEvent::DtTagRangingRoundsUpdateFailed { error },
                });
            }
            SessionOutcome::Closed { reason } => {
                if let Some(mut session) = self.sessions.remove(&handle) {
                    session.notify(RangingEvent::Closed { reason });
                }
            }
        }
    }

    fn handle_session_notification(&mut self, notf: SessionNotification) {
        match notf {
            SessionNotification::Status { chip_id, session_id, session_state, reason_code } => {
                self.handle_session_status(&chip_id, session_id, session_state, reason_code);
            }
            SessionNotification::UpdateControllerMulticastList {
                chip_id,
                session_id,
                remaining_multicast_list_size,
                status_list,
            } => match self.session_by_id(&chip_id, session_id) {
                Some(session) => session.set_multicast_update(MulticastUpdate {
                    remaining_multicast_list_size,
                    status_list,
                }),
                None => warn!("Received multicast update of the unknown Session {}", session_id),
            },
            SessionNotification::SessionInfo { chip_id, range_data } => {
                let session = match self.session_by_id(&chip_id, range_data.session_id) {
                    Some(session) => session,
                    None => {
                        warn!("Received range data of unknown Session {}", range_data.session_id);
                        return;
                    }
                };
                let addresses: Vec<UwbAddress> = range_data
                    .ranging_measurements
                    .iter()
                    .map(|measurement| measurement.mac_address.clone())
                    .collect();
                session.notify(RangingEvent::RangingResult(range_data));
                for data in session.take_rx_data(&addresses).into_iter() {
                    session.notify(RangingEvent::DataReceived {
                        remote_address: data.source_address,
                        payload: data.payload,
                    });
                }
            }
            SessionNotification::DataTransferStatus {
                chip_id,
                session_id,
                uci_sequence_number,
                status,
                tx_count,
            } => {
                let session = match self.session_by_id(&chip_id, session_id) {
                    Some(session) => session,
                    None => {
                        warn!("Received data status of the unknown Session {}", session_id);
                        return;
                    }
                };
                let remote_address = match session.take_pending_data_send(uci_sequence_number) {
                    Some(remote_address) => remote_address,
                    None => {
                        debug!(
                            "Session {} data {} is already resolved, tx_count: {}",
                            session_id, uci_sequence_number, tx_count
                        );
                        return;
                    }
                };
                match status {
                    DataTransferNtfStatusCode::UciDataTransferStatusOk
                    | DataTransferNtfStatusCode::UciDataTransferStatusRepetitionOk => {
                        session.notify(RangingEvent::DataSent { remote_address });
                    }
                    _ => {
                        error!("Failed to send data {}: {:?}", uci_sequence_number, status);
                        session.notify(RangingEvent::DataSendFailed {
                            remote_address,
                            error: Error::HardwareFailure,
                        });
                    }
                }
            }
            SessionNotification::DataTransferPhaseConfig { chip_id, session_id, status } => {
                let session = match self.session_by_id(&chip_id, session_id) {
                    Some(session) => session,
                    None => {
                        warn!("Received DTPCM status of the unknown Session {}", session_id);
                        return;
                    }
                };
                if !session.take_pending_data_transfer_phase_config() {
                    debug!("No pending data transfer phase config of {}", session_id);
                    return;
                }
                if status == 0 {
                    session.notify(RangingEvent::DataTransferPhaseConfigured);
                } else {
                    error!("Failed to config the data transfer phase: {}", status);
                    session.notify(RangingEvent::DataTransferPhaseConfigFailed {
                        error: Error::HardwareFailure,
                    });
                }
            }
        }
    }

    fn handle_session_status(
        &mut self,
        chip_id: &str,
        session_id: SessionId,
        session_state: SessionState,
        reason_code: u8,
    ) {
        let session = match self.session_by_id(chip_id, session_id) {
            Some(session) => session,
            None => {
                warn!(
                    "Received notification of the unknown Session {} on chip {}: {:?}, {:?}",
                    session_id, chip_id, session_state, reason_code
                );
                return;
            }
        };
        let prev_state = session.set_state(session_state);
        let reason = RangingChangeReason::from_reason_code(reason_code);

        if session_state == SessionState::SessionStateDeinit {
            // The deinit of the closing or opening sessions is reported by their jobs.
            if session.is_opened() && !session.is_closing() {
                debug!("Session {} is deinitialized by the firmware", session_id);
                let handle = session.handle();
                if let Some(mut session) = self.sessions.remove(&handle) {
                    session.notify(RangingEvent::Closed { reason });
                }
            }
            return;
        }

        if prev_state == SessionState::SessionStateActive
            && session_state == SessionState::SessionStateIdle
            && reason_code != ReasonCode::StateChangeWithSessionManagementCommands as u8
        {
            session.notify(RangingEvent::Stopped { reason, params: Bundle::new() });
        }
    }

    fn handle_data_rcv_notification(&mut self, notf: DataRcvNotification) {
        if notf.status != StatusCode::UciStatusOk {
            warn!("Drop the received data with status {:?}", notf.status);
            return;
        }
        match self.session_by_id(&notf.chip_id, notf.session_id) {
            Some(session) => session.buffer_rx_data(notf),
            None => warn!("Received data of the unknown Session {}", notf.session_id),
        }
    }

    fn handle_radar_data_rcv_notification(&mut self, notf: RadarDataRcvNotification) {
        match self.session_by_id(&notf.chip_id, notf.session_id) {
            Some(session) => session.notify(RangingEvent::RadarData(notf)),
            None => warn!("Received radar data of the unknown Session {}", notf.session_id),
        }
    }

    fn session_by_id(&mut self, chip_id: &str, session_id: SessionId) -> Option<&mut UwbSession> {
        self.sessions
            .values_mut()
            .find(|session| session.session_id() == session_id && session.chip_id() == chip_id)
    }

    // The session accepts new requests until it is closed.
    fn active_session(&self, handle: SessionHandle) -> Result<&UwbSession> {
        match self.sessions.get(&handle) {
            Some(session) if !session.is_closing() => Ok(session),
            Some(_) => {
                error!("Session {:?} is closing", handle);
                Err(Error::IllegalState)
            }
            None => {
                error!("Session {:?} doesn't exist", handle);
                Err(Error::IllegalState)
            }
        }
    }

    // Check the FiRa-only request is allowed in the current state of the session.
    fn fira_session(&self, handle: SessionHandle, allowed_states: &[SessionState]) -> Result<()> {
        let session = self.active_session(handle)?;
        match session.params() {
            AppConfigParams::Fira(_) => session.check_state(allowed_states),
            params => {
                error!("The operation is not supported by {} sessions", params.protocol_name());
                Err(Error::IllegalState)
            }
        }
    }

    fn enqueue(&mut self, handle: SessionHandle, task: SessionTask) -> Result<()> {
        let session = self.sessions.get_mut(&handle).ok_or(Error::IllegalState)?;
        let job = Job::Session {
            handle,
            session_id: session.session_id(),
            chip_id: session.chip_id().to_string(),
            state_receiver: session.state_receiver(),
            task,
        };
        self.job_sender.send(job).map_err(|e| {
            error!("Failed to send job: {:?}", e.0);
            Error::Unknown
        })?;
        session.add_pending_job();
        Ok(())
    }
}

// Build the params applied by the start or reconfigure request of a CCC or Aliro session.
fn updated_ccc_params(
    session: &UwbSession,
    bundle: &Bundle,
    session_state: SessionState,
) -> Result<(AppConfigParams, TlvBuffer)> {
    let current_params = session.params();
    if bundle.protocol_name()? != current_params.protocol_name() {
        error!("The params don't match the {} session", current_params.protocol_name());
        return Err(Error::IllegalArgument);
    }
    let reconfigure = match ReconfigureParams::from_bundle(bundle)? {
        ReconfigureParams::Ccc(reconfigure) => reconfigure,
        ReconfigureParams::Fira(_) => return Err(Error::IllegalArgument),
    };
    let updated_params =
        current_params.apply_reconfigure(&reconfigure).ok_or(Error::IllegalArgument)?;
    let tlvs = updated_params
        .generate_updated_tlv_buffer(current_params, session_state)
        .ok_or_else(|| {
            error!("The params are not updatable at {:?}", session_state);
            Error::IllegalArgument
        })?;
    Ok((updated_params, tlvs))
}

fn reconfigure_task(
    session: &UwbSession,
    op: ReconfigureOp,
    bundle: &Bundle,
) -> Result<SessionTask> {
    let multicast_receiver = session.multicast_receiver();
    let is_fira = matches!(session.params(), AppConfigParams::Fira(_));

    if op == ReconfigureOp::Reconfigure && !is_fira {
        let (updated_params, tlvs) = updated_ccc_params(session, bundle, session.state())?;
        return Ok(SessionTask::Reconfigure {
            op,
            multicast: None,
            multicast_receiver,
            tlvs,
            updated_params: Some(updated_params),
        });
    }
    if !is_fira {
        error!("{:?} is only supported by FiRa sessions", op);
        return Err(Error::IllegalState);
    }

    let params = FiraReconfigureParams::from_bundle(bundle)?;
    let multicast = match (op, *params.action()) {
        (ReconfigureOp::Pause, _) | (ReconfigureOp::Resume, _) => {
            let expected = match op {
                ReconfigureOp::Pause => SuspendRanging::Enabled,
                _ => SuspendRanging::Disabled,
            };
            if *params.suspend_ranging_rounds() != Some(expected) {
                error!("{:?} requires suspend_ranging_rounds {:?}", op, expected);
                return Err(Error::IllegalState);
            }
            None
        }
        (ReconfigureOp::AddControlee, Some(action))
            if action != UpdateMulticastListAction::RemoveControlee =>
        {
            Some((action, params.controlees().ok_or(Error::IllegalArgument)?))
        }
        (ReconfigureOp::RemoveControlee, Some(UpdateMulticastListAction::RemoveControlee)) => {
            Some((
                UpdateMulticastListAction::RemoveControlee,
                params.controlees().ok_or(Error::IllegalArgument)?,
            ))
        }
        (ReconfigureOp::AddControlee, _) | (ReconfigureOp::RemoveControlee, _) => {
            error!("{:?} doesn't match the action {:?}", op, params.action());
            return Err(Error::IllegalArgument);
        }
        (ReconfigureOp::Reconfigure, Some(action)) => {
            Some((action, params.controlees().ok_or(Error::IllegalArgument)?))
        }
        (ReconfigureOp::Reconfigure, None) => None,
    };
    let tlvs = AppConfigParams::config_map_to_tlv_buffer(&params.generate_config_map());
    Ok(SessionTask::Reconfigure { op, multicast, multicast_receiver, tlvs, updated_params: None })
}

#[derive(Debug)]
enum SessionCommand {
    OpenSession {
        identity: String,
        handle: SessionHandle,
        chip_id: ChipId,
        params: Bundle,
        callback: Box<dyn RangingCallback>,
    },
    StartRanging {
        handle: SessionHandle,
        params: Option<Bundle>,
    },
    StopRanging {
        handle: SessionHandle,
    },
    Reconfigure {
        handle: SessionHandle,
        op: ReconfigureOp,
        params: Bundle,
    },
    CloseSession {
        handle: SessionHandle,
    },
    SendData {
        handle: SessionHandle,
        remote_address: UwbAddress,
        payload: Vec<u8>,
    },
    SetDataTransferPhaseConfig {
        handle: SessionHandle,
        config: DataTransferPhaseConfig,
    },
    SetHybridControllerConfig {
        handle: SessionHandle,
        config: HybridControllerConfig,
    },
    SetHybridControleeConfig {
        handle: SessionHandle,
        config: HybridControleeConfig,
    },
    UpdateDtTagRangingRounds {
        handle: SessionHandle,
        ranging_round_indexes: Vec<u8>,
    },
    QueryMaxDataSize {
        handle: SessionHandle,
    },
    CloseAllSessions {
        reason: RangingChangeReason,
    },
}

#[derive(Debug)]
pub(crate) enum Response {
    Null,
    MaxDataSize(u16),
}
pub(crate) type ResponseSender = oneshot::Sender<Result<Response>>;


#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;

    use crate::params::ccc_app_config_params::tests::generate_ccc_builder;
    use crate::params::ccc_started_app_config_params::CccStartedAppConfigParams;
    use crate::params::fira_app_config_params::tests::generate_fira_params;
    use crate::params::fira_reconfigure_params::FiraReconfigureParamsBuilder;
    use crate::params::radar_app_config_params::{
        BitsPerSample, RadarAppConfigParamsBuilder, RadarDataType,
    };
    use crate::params::uci_packets::{
        ControleeStatus, ControllerPhase, DataTransferPhaseSlot, DtTagRangingRoundsResponse,
        MulticastUpdateStatusCode, SetAppConfigResponse,
    };
    use crate::session::mock_ranging_callback::MockRangingCallback;
    use crate::uci::mock_native_uwb_manager::MockNativeUwbManager;
    use crate::uci::notification::{NativeNotification, RadarSweepData};
    use crate::utils::init_test_logging;

    const CHIP_ID: &str = "default";
    const OTHER_CHIP_ID: &str = "chip1";
    const IDENTITY: &str = "com.example.ranging";

    async fn setup_session_manager<F>(
        config: ServiceConfig,
        setup_native_fn: F,
    ) -> (SessionManager, MockNativeUwbManager)
    where
        F: FnOnce(&mut MockNativeUwbManager),
    {
        init_test_logging();
        let (session_notf_sender, session_notf_receiver) = mpsc::unbounded_channel();
        let (data_rcv_notf_sender, data_rcv_notf_receiver) = mpsc::unbounded_channel();
        let (radar_notf_sender, radar_notf_receiver) = mpsc::unbounded_channel();
        let mut native = MockNativeUwbManager::new();
        native.set_session_notification_sender(session_notf_sender).await;
        native.set_data_rcv_notification_sender(data_rcv_notf_sender).await;
        native.set_radar_data_rcv_notification_sender(radar_notf_sender).await;
        setup_native_fn(&mut native);

        let manager = SessionManager::new(
            &config,
            native.clone(),
            session_notf_receiver,
            data_rcv_notf_receiver,
            radar_notf_receiver,
        );
        (manager, native)
    }

    // Open the session and wait until it reaches Idle.
    async fn open_session(
        manager: &mut SessionManager,
        callback: &mut MockRangingCallback,
        handle: SessionHandle,
        params: &AppConfigParams,
    ) {
        callback.expect_event(handle, RangingEvent::Opened);
        let result = manager
            .open_session(
                IDENTITY.to_string(),
                handle,
                CHIP_ID.to_string(),
                params.to_bundle(),
                Box::new(callback.clone()),
            )
            .await;
        assert_eq!(result, Ok(()));
        assert!(callback.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_open_start_stop_close() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_range_start(
                    session_id,
                    CHIP_ID,
                    vec![session_status_notf(
                        CHIP_ID,
                        session_id,
                        SessionState::SessionStateActive,
                    )],
                    Ok(()),
                );
                native.expect_range_stop(
                    session_id,
                    CHIP_ID,
                    vec![session_status_notf(CHIP_ID, session_id, SessionState::SessionStateIdle)],
                    Ok(()),
                );
                native.expect_session_deinit(
                    session_id,
                    CHIP_ID,
                    vec![session_status_notf(
                        CHIP_ID,
                        session_id,
                        SessionState::SessionStateDeinit,
                    )],
                    Ok(()),
                );
            })
            .await;

        // The requests are queued without waiting for the previous ones.
        let mut callback = MockRangingCallback::new();
        callback.expect_event(handle, RangingEvent::Opened);
        callback.expect_event(handle, RangingEvent::Started { params: params.to_bundle() });
        callback.expect_event(
            handle,
            RangingEvent::Stopped { reason: RangingChangeReason::LocalApi, params: Bundle::new() },
        );
        let reason = RangingChangeReason::LocalApi;
        callback.expect_event(handle, RangingEvent::Closed { reason });

        let result = manager
            .open_session(
                IDENTITY.to_string(),
                handle,
                CHIP_ID.to_string(),
                params.to_bundle(),
                Box::new(callback.clone()),
            )
            .await;
        assert_eq!(result, Ok(()));
        assert_eq!(manager.start_ranging(handle, None).await, Ok(()));
        assert_eq!(manager.stop_ranging(handle).await, Ok(()));
        assert_eq!(manager.close_session(handle).await, Ok(()));

        // The closing session doesn't accept requests anymore.
        assert_eq!(manager.start_ranging(handle, None).await, Err(Error::IllegalState));

        assert!(native.wait_expected_calls_done().await);
        assert!(callback.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_open_session_duplicated() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        // The same handle.
        let result = manager
            .open_session(
                IDENTITY.to_string(),
                handle,
                CHIP_ID.to_string(),
                generate_fira_params(0x456).to_bundle(),
                Box::new(callback.clone()),
            )
            .await;
        assert_eq!(result, Err(Error::Duplicate));

        // The same session id on the same chip.
        let result = manager
            .open_session(
                IDENTITY.to_string(),
                SessionHandle::new(2),
                CHIP_ID.to_string(),
                params.to_bundle(),
                Box::new(callback.clone()),
            )
            .await;
        assert_eq!(result, Err(Error::Duplicate));

        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_same_session_id_on_two_chips() {
        let session_id = 0x123;
        let handle1 = SessionHandle::new(1);
        let handle2 = SessionHandle::new(2);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                expect_open_session(native, &params_clone, OTHER_CHIP_ID);
            })
            .await;

        let mut callback1 = MockRangingCallback::new();
        open_session(&mut manager, &mut callback1, handle1, &params).await;

        let mut callback2 = MockRangingCallback::new();
        callback2.expect_event(handle2, RangingEvent::Opened);
        let result = manager
            .open_session(
                IDENTITY.to_string(),
                handle2,
                OTHER_CHIP_ID.to_string(),
                params.to_bundle(),
                Box::new(callback2.clone()),
            )
            .await;
        assert_eq!(result, Ok(()));
        assert!(callback2.wait_expected_calls_done().await);

        // The notifications only reach the session on the reporting chip.
        let range_data = session_range_data(session_id, UwbAddress::Short([3, 4]));
        callback2.expect_event(handle2, RangingEvent::RangingResult(range_data.clone()));
        native.send_notification(session_info_notf(OTHER_CHIP_ID, range_data.clone()));
        assert!(callback2.wait_expected_calls_done().await);

        callback2.expect_event(
            handle2,
            RangingEvent::Closed { reason: RangingChangeReason::SystemRegulation },
        );
        native.send_notification(session_status_notf_with_reason(
            OTHER_CHIP_ID,
            session_id,
            SessionState::SessionStateDeinit,
            ReasonCode::RegulationUwbOff as u8,
        ));
        assert!(callback2.wait_expected_calls_done().await);

        callback1.expect_event(handle1, RangingEvent::RangingResult(range_data.clone()));
        native.send_notification(session_info_notf(CHIP_ID, range_data));
        assert!(callback1.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_open_session_max_count() {
        let config = ServiceConfig { max_session_count: 1, ..Default::default() };
        let params = generate_fira_params(0x123);
        let params_clone = params.clone();
        let (mut manager, mut native) = setup_session_manager(config, move |native| {
            expect_open_session(native, &params_clone, CHIP_ID);
        })
        .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, SessionHandle::new(1), &params).await;

        let result = manager
            .open_session(
                IDENTITY.to_string(),
                SessionHandle::new(2),
                CHIP_ID.to_string(),
                generate_fira_params(0x456).to_bundle(),
                Box::new(callback.clone()),
            )
            .await;
        assert_eq!(result, Err(Error::IllegalState));

        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_open_session_failed() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let session_type = params.session_type();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                native.expect_session_init(
                    session_id,
                    session_type,
                    CHIP_ID,
                    vec![],
                    Err(Error::Unknown),
                );
                native.expect_session_deinit(session_id, CHIP_ID, vec![], Err(Error::Unknown));
            })
            .await;

        let mut callback = MockRangingCallback::new();
        callback.expect_event(handle, RangingEvent::OpenFailed { error: Error::HardwareFailure });
        let result = manager
            .open_session(
                IDENTITY.to_string(),
                handle,
                CHIP_ID.to_string(),
                params.to_bundle(),
                Box::new(callback.clone()),
            )
            .await;
        assert_eq!(result, Ok(()));
        assert!(native.wait_expected_calls_done().await);
        assert!(callback.wait_expected_calls_done().await);

        // The failed session is removed.
        assert_eq!(manager.start_ranging(handle, None).await, Err(Error::IllegalState));
    }

    #[tokio::test]
    async fn test_open_session_invalid_params() {
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), |_| {}).await;

        let callback = MockRangingCallback::new();
        let result = manager
            .open_session(
                IDENTITY.to_string(),
                SessionHandle::new(1),
                CHIP_ID.to_string(),
                Bundle::new(),
                Box::new(callback),
            )
            .await;
        assert_eq!(result, Err(Error::IllegalArgument));
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_stop_ranging_at_idle() {
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(0x123);
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        // Nothing is queued, so the request fails without reaching the firmware.
        assert_eq!(manager.stop_ranging(handle).await, Err(Error::IllegalState));
        assert_eq!(
            manager.send_data(handle, UwbAddress::Short([3, 4]), vec![0x01]).await,
            Err(Error::IllegalState)
        );
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_stop_ranging_queued_behind_start() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let config = ServiceConfig { session_state_timeout_ms: 300, ..Default::default() };
        let (mut manager, mut native) = setup_session_manager(config, move |native| {
            expect_open_session(native, &params_clone, CHIP_ID);
            // The session never becomes active.
            native.expect_range_start(session_id, CHIP_ID, vec![], Ok(()));
        })
        .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        // The stop request is accepted while the start is pending, and checked when it runs.
        callback.expect_event(handle, RangingEvent::StartFailed { error: Error::Timeout });
        callback.expect_event(handle, RangingEvent::StopFailed { error: Error::IllegalState });
        assert_eq!(manager.start_ranging(handle, None).await, Ok(()));
        assert_eq!(manager.stop_ranging(handle).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);

        assert_eq!(manager.stop_ranging(handle).await, Err(Error::IllegalState));
    }

    #[tokio::test]
    async fn test_pause_and_resume() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let pause_params = FiraReconfigureParams::suspend(SuspendRanging::Enabled);
        let params_clone = params.clone();
        let pause_tlvs =
            AppConfigParams::config_map_to_tlv_buffer(&pause_params.generate_config_map());
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_set_app_configurations(
                    session_id,
                    pause_tlvs.to_bytes().unwrap(),
                    CHIP_ID,
                    vec![],
                    Ok(set_app_config_ok()),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        // Pause requires the Enabled suspend_ranging_rounds.
        let resume_bundle = FiraReconfigureParams::suspend(SuspendRanging::Disabled).to_bundle();
        assert_eq!(manager.pause(handle, resume_bundle).await, Err(Error::IllegalState));
        assert_eq!(
            manager.resume(handle, pause_params.to_bundle()).await,
            Err(Error::IllegalState)
        );

        callback.expect_event(handle, RangingEvent::Paused);
        assert_eq!(manager.pause(handle, pause_params.to_bundle()).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_add_controlee() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let reconfigure_params = FiraReconfigureParamsBuilder::new()
            .action(UpdateMulticastListAction::AddControlee)
            .address_list(vec![UwbAddress::Short([5, 6]), UwbAddress::Short([7, 8])])
            .sub_session_id_list(vec![0x10, 0x20])
            .build()
            .unwrap();
        let controlees = reconfigure_params.controlees().unwrap();
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                let status_ok = MulticastUpdateStatusCode::StatusOkMulticastListUpdate;
                native.expect_update_multicast_list(
                    session_id,
                    UpdateMulticastListAction::AddControlee,
                    controlees.clone(),
                    CHIP_ID,
                    vec![NativeNotification::Session(
                        SessionNotification::UpdateControllerMulticastList {
                            chip_id: CHIP_ID.to_string(),
                            session_id,
                            remaining_multicast_list_size: 6,
                            status_list: vec![
                                ControleeStatus {
                                    mac_address: [5, 6],
                                    subsession_id: 0x10,
                                    status: status_ok,
                                },
                                ControleeStatus {
                                    mac_address: [7, 8],
                                    subsession_id: 0x20,
                                    status: status_ok,
                                },
                            ],
                        },
                    )],
                    Ok(()),
                );
                native.expect_update_multicast_list(
                    session_id,
                    UpdateMulticastListAction::AddControlee,
                    controlees,
                    CHIP_ID,
                    vec![NativeNotification::Session(
                        SessionNotification::UpdateControllerMulticastList {
                            chip_id: CHIP_ID.to_string(),
                            session_id,
                            remaining_multicast_list_size: 6,
                            status_list: vec![ControleeStatus {
                                mac_address: [5, 6],
                                subsession_id: 0x10,
                                status: MulticastUpdateStatusCode::StatusErrorMulticastListFull,
                            }],
                        },
                    )],
                    Ok(()),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        // The action doesn't match the request.
        assert_eq!(
            manager.remove_controlee(handle, reconfigure_params.to_bundle()).await,
            Err(Error::IllegalArgument)
        );

        callback.expect_event(handle, RangingEvent::ControleeAdded);
        callback.expect_event(
            handle,
            RangingEvent::ControleeAddFailed { error: Error::HardwareFailure },
        );
        assert_eq!(manager.add_controlee(handle, reconfigure_params.to_bundle()).await, Ok(()));
        assert_eq!(manager.add_controlee(handle, reconfigure_params.to_bundle()).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_session_closed_by_firmware() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        callback.expect_event(
            handle,
            RangingEvent::Closed { reason: RangingChangeReason::SystemRegulation },
        );
        native.send_notification(session_status_notf_with_reason(
            CHIP_ID,
            session_id,
            SessionState::SessionStateDeinit,
            ReasonCode::RegulationUwbOff as u8,
        ));
        assert!(callback.wait_expected_calls_done().await);

        assert_eq!(manager.close_session(handle).await, Err(Error::IllegalState));
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_ranging_stopped_by_firmware() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_range_start(
                    session_id,
                    CHIP_ID,
                    vec![session_status_notf(
                        CHIP_ID,
                        session_id,
                        SessionState::SessionStateActive,
                    )],
                    Ok(()),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;
        callback.expect_event(handle, RangingEvent::Started { params: params.to_bundle() });
        assert_eq!(manager.start_ranging(handle, None).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);

        // The range data is forwarded while the session is active.
        let range_data = session_range_data(session_id, UwbAddress::Short([3, 4]));
        callback.expect_event(handle, RangingEvent::RangingResult(range_data.clone()));
        native.send_notification(session_info_notf(CHIP_ID, range_data));
        assert!(callback.wait_expected_calls_done().await);

        callback.expect_event(
            handle,
            RangingEvent::Stopped {
                reason: RangingChangeReason::MaxRrRetryReached,
                params: Bundle::new(),
            },
        );
        native.send_notification(session_status_notf_with_reason(
            CHIP_ID,
            session_id,
            SessionState::SessionStateIdle,
            ReasonCode::MaxRangingRoundRetryCountReached as u8,
        ));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_send_and_receive_data() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let peer_address = UwbAddress::Short([3, 4]);
        let payload = vec![0x01, 0x02, 0x03];
        let payload_clone = payload.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_range_start(
                    session_id,
                    CHIP_ID,
                    vec![session_status_notf(
                        CHIP_ID,
                        session_id,
                        SessionState::SessionStateActive,
                    )],
                    Ok(()),
                );
                native.expect_send_data(
                    session_id,
                    vec![3, 4],
                    0,
                    payload_clone,
                    CHIP_ID,
                    vec![NativeNotification::Session(SessionNotification::DataTransferStatus {
                        chip_id: CHIP_ID.to_string(),
                        session_id,
                        uci_sequence_number: 0,
                        status: DataTransferNtfStatusCode::UciDataTransferStatusOk,
                        tx_count: 1,
                    })],
                    Ok(()),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;
        callback.expect_event(handle, RangingEvent::Started { params: params.to_bundle() });
        assert_eq!(manager.start_ranging(handle, None).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);

        let remote_address = peer_address.clone();
        callback.expect_event(handle, RangingEvent::DataSent { remote_address });
        assert_eq!(manager.send_data(handle, peer_address.clone(), payload.clone()).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);

        // The received data is delivered with the range data of its sender.
        native.send_notification(NativeNotification::DataRcv(DataRcvNotification {
            chip_id: CHIP_ID.to_string(),
            session_id,
            status: StatusCode::UciStatusOk,
            uci_sequence_num: 0,
            source_address: peer_address.clone(),
            payload: payload.clone(),
        }));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let range_data = session_range_data(session_id, peer_address.clone());
        callback.expect_event(handle, RangingEvent::RangingResult(range_data.clone()));
        callback.expect_event(
            handle,
            RangingEvent::DataReceived { remote_address: peer_address, payload },
        );
        native.send_notification(session_info_notf(CHIP_ID, range_data));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_send_data_requires_fira_session() {
        let handle = SessionHandle::new(1);
        let params = generate_ccc_builder(0x123).build().unwrap();
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        let result = manager.send_data(handle, UwbAddress::Short([3, 4]), vec![0x01]).await;
        assert_eq!(result, Err(Error::IllegalState));
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_start_ccc_session_without_started_params() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_ccc_builder(session_id).build().unwrap();
        let params_clone = params.clone();
        let requested_tags: Vec<u8> =
            CccStartedAppConfigParams::requested_tags().into_iter().map(|tag| tag as u8).collect();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_range_start(
                    session_id,
                    CHIP_ID,
                    vec![session_status_notf(
                        CHIP_ID,
                        session_id,
                        SessionState::SessionStateActive,
                    )],
                    Ok(()),
                );
                native.expect_get_app_configurations(
                    session_id,
                    requested_tags,
                    CHIP_ID,
                    Err(Error::Unknown),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        // The configured params are reported when the started params can't be read.
        callback.expect_event(handle, RangingEvent::Started { params: params.to_bundle() });
        assert_eq!(manager.start_ranging(handle, None).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_query_max_data_size() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_query_max_data_size(session_id, CHIP_ID, Ok(1024));
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        assert_eq!(manager.query_max_data_size(handle).await, Ok(1024));
        assert_eq!(
            manager.query_max_data_size(SessionHandle::new(2)).await,
            Err(Error::IllegalState)
        );
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_close_all_sessions() {
        let params1 = generate_fira_params(0x123);
        let params2 = generate_fira_params(0x456);
        let params1_clone = params1.clone();
        let params2_clone = params2.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params1_clone, CHIP_ID);
                expect_open_session(native, &params2_clone, CHIP_ID);
                native.expect_session_deinit(0x123, CHIP_ID, vec![], Ok(()));
                native.expect_session_deinit(0x456, CHIP_ID, vec![], Ok(()));
            })
            .await;

        let mut callback = MockRangingCallback::new();
        let handle1 = SessionHandle::new(1);
        let handle2 = SessionHandle::new(2);
        open_session(&mut manager, &mut callback, handle1, &params1).await;
        open_session(&mut manager, &mut callback, handle2, &params2).await;

        let reason = RangingChangeReason::SystemPolicy;
        callback.expect_event(handle1, RangingEvent::Closed { reason });
        callback.expect_event(handle2, RangingEvent::Closed { reason });
        assert_eq!(manager.close_all_sessions(reason).await, Ok(()));

        // The Closed events are delivered before close_all_sessions() returns.
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
        assert_eq!(manager.close_session(handle1).await, Err(Error::IllegalState));
    }

    fn generate_radar_params(session_id: SessionId) -> AppConfigParams {
        let mut builder = RadarAppConfigParamsBuilder::new();
        builder.session_id(session_id);
        builder.build().unwrap()
    }

    fn radar_data_notf(chip_id: &str, session_id: SessionId) -> RadarDataRcvNotification {
        RadarDataRcvNotification {
            chip_id: chip_id.to_string(),
            session_id,
            status: StatusCode::UciStatusOk,
            radar_data_type: RadarDataType::RadarSweepSamples,
            samples_per_sweep: 2,
            bits_per_sample: BitsPerSample::Value32,
            sweep_offset: 0,
            sweep_data: vec![RadarSweepData {
                sequence_number: 1,
                timestamp: 1000,
                vendor_specific_data: vec![],
                sample_data: vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08],
            }],
        }
    }

    fn data_transfer_phase_config() -> DataTransferPhaseConfig {
        DataTransferPhaseConfig {
            dtpcm_repetition: 0,
            data_transfer_control: 0,
            slots: vec![DataTransferPhaseSlot {
                mac_address: vec![0x03, 0x04],
                slot_bitmap: vec![0x0F],
                stop_data_transfer: false,
            }],
        }
    }

    fn dtpcm_status_notf(session_id: SessionId, status: u8) -> NativeNotification {
        NativeNotification::Session(SessionNotification::DataTransferPhaseConfig {
            chip_id: CHIP_ID.to_string(),
            session_id,
            status,
        })
    }

    #[tokio::test]
    async fn test_open_radar_session_and_receive_radar_data() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_radar_params(session_id);
        let session_type = params.session_type();
        let tlvs = params.generate_tlv_buffer().to_bytes().unwrap();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                native.expect_session_init(
                    session_id,
                    session_type,
                    CHIP_ID,
                    vec![session_status_notf(CHIP_ID, session_id, SessionState::SessionStateInit)],
                    Ok(()),
                );
                native.expect_set_radar_app_configurations(
                    session_id,
                    tlvs,
                    CHIP_ID,
                    vec![session_status_notf(CHIP_ID, session_id, SessionState::SessionStateIdle)],
                    Ok(set_app_config_ok()),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;
        assert!(native.wait_expected_calls_done().await);

        // The radar data of the same session id on another chip is not delivered.
        let other_notf = radar_data_notf(OTHER_CHIP_ID, session_id);
        native.send_notification(NativeNotification::RadarDataRcv(other_notf));

        let notf = radar_data_notf(CHIP_ID, session_id);
        callback.expect_event(handle, RangingEvent::RadarData(notf.clone()));
        native.send_notification(NativeNotification::RadarDataRcv(notf));
        assert!(callback.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_open_radar_session_failed() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_radar_params(session_id);
        let session_type = params.session_type();
        let tlvs = params.generate_tlv_buffer().to_bytes().unwrap();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                native.expect_session_init(
                    session_id,
                    session_type,
                    CHIP_ID,
                    vec![session_status_notf(CHIP_ID, session_id, SessionState::SessionStateInit)],
                    Ok(()),
                );
                native.expect_set_radar_app_configurations(
                    session_id,
                    tlvs,
                    CHIP_ID,
                    vec![],
                    Ok(SetAppConfigResponse {
                        status: StatusCode::UciStatusFailed,
                        config_status: vec![],
                    }),
                );
                native.expect_session_deinit(session_id, CHIP_ID, vec![], Ok(()));
            })
            .await;

        let mut callback = MockRangingCallback::new();
        callback.expect_event(handle, RangingEvent::OpenFailed { error: Error::HardwareFailure });
        let result = manager
            .open_session(
                IDENTITY.to_string(),
                handle,
                CHIP_ID.to_string(),
                params.to_bundle(),
                Box::new(callback.clone()),
            )
            .await;
        assert_eq!(result, Ok(()));
        assert!(native.wait_expected_calls_done().await);
        assert!(callback.wait_expected_calls_done().await);

        // The radar data of the removed session is dropped.
        let notf = radar_data_notf(CHIP_ID, session_id);
        native.send_notification(NativeNotification::RadarDataRcv(notf));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(manager.close_session(handle).await, Err(Error::IllegalState));
    }

    #[tokio::test]
    async fn test_set_data_transfer_phase_config() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let config = data_transfer_phase_config();
        let config_clone = config.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_set_data_transfer_phase_config(
                    session_id,
                    config_clone.clone(),
                    CHIP_ID,
                    vec![dtpcm_status_notf(session_id, 0)],
                    Ok(()),
                );
                native.expect_set_data_transfer_phase_config(
                    session_id,
                    config_clone.clone(),
                    CHIP_ID,
                    vec![dtpcm_status_notf(session_id, 1)],
                    Ok(()),
                );
                native.expect_set_data_transfer_phase_config(
                    session_id,
                    config_clone,
                    CHIP_ID,
                    vec![],
                    Err(Error::Unknown),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        // The result is reported by the notification.
        callback.expect_event(handle, RangingEvent::DataTransferPhaseConfigured);
        let result = manager.set_data_transfer_phase_config(handle, config.clone()).await;
        assert_eq!(result, Ok(()));
        assert!(callback.wait_expected_calls_done().await);

        let error = Error::HardwareFailure;
        callback.expect_event(handle, RangingEvent::DataTransferPhaseConfigFailed { error: error.clone() });
        let result = manager.set_data_transfer_phase_config(handle, config.clone()).await;
        assert_eq!(result, Ok(()));
        assert!(callback.wait_expected_calls_done().await);

        // The command is rejected by the native stack.
        callback.expect_event(handle, RangingEvent::DataTransferPhaseConfigFailed { error });
        let result = manager.set_data_transfer_phase_config(handle, config).await;
        assert_eq!(result, Ok(()));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);

        // The late notification without a pending config is dropped.
        native.send_notification(dtpcm_status_notf(session_id, 0));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_set_hybrid_controller_config() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let config = HybridControllerConfig {
            message_control: 0,
            phases: vec![ControllerPhase {
                session_token: 0x456,
                start_slot_index: 0,
                end_slot_index: 10,
                control: 0,
                mac_address: vec![0x03, 0x04],
            }],
        };
        let config_clone = config.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_set_hybrid_controller_config(
                    session_id,
                    config_clone.clone(),
                    CHIP_ID,
                    Ok(()),
                );
                native.expect_set_hybrid_controller_config(
                    session_id,
                    config_clone,
                    CHIP_ID,
                    Err(Error::Unknown),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        callback.expect_event(handle, RangingEvent::HybridControllerConfigured);
        assert_eq!(manager.set_hybrid_controller_config(handle, config.clone()).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);

        let error = Error::HardwareFailure;
        callback.expect_event(handle, RangingEvent::HybridControllerConfigFailed { error });
        assert_eq!(manager.set_hybrid_controller_config(handle, config).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_set_hybrid_controlee_config() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let config = HybridControleeConfig { phase_session_tokens: vec![0x456, 0x789] };
        let config_clone = config.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_set_hybrid_controlee_config(
                    session_id,
                    config_clone.clone(),
                    CHIP_ID,
                    Ok(()),
                );
                native.expect_set_hybrid_controlee_config(
                    session_id,
                    config_clone,
                    CHIP_ID,
                    Err(Error::Unknown),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        callback.expect_event(handle, RangingEvent::HybridControleeConfigured);
        assert_eq!(manager.set_hybrid_controlee_config(handle, config.clone()).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);

        let error = Error::HardwareFailure;
        callback.expect_event(handle, RangingEvent::HybridControleeConfigFailed { error });
        assert_eq!(manager.set_hybrid_controlee_config(handle, config).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_update_dt_tag_ranging_rounds() {
        let session_id = 0x123;
        let handle = SessionHandle::new(1);
        let params = generate_fira_params(session_id);
        let params_clone = params.clone();
        let indexes = vec![0, 2, 4];
        let indexes_clone = indexes.clone();
        let response = DtTagRangingRoundsResponse {
            status: StatusCode::UciStatusOk,
            ranging_round_indexes: vec![],
        };
        let response_clone = response.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
                native.expect_update_dt_tag_ranging_rounds(
                    session_id,
                    indexes_clone.clone(),
                    CHIP_ID,
                    Ok(response_clone),
                );
                // The round 4 is not applied.
                native.expect_update_dt_tag_ranging_rounds(
                    session_id,
                    indexes_clone.clone(),
                    CHIP_ID,
                    Ok(DtTagRangingRoundsResponse {
                        status: StatusCode::UciStatusFailed,
                        ranging_round_indexes: vec![4],
                    }),
                );
                native.expect_update_dt_tag_ranging_rounds(
                    session_id,
                    indexes_clone,
                    CHIP_ID,
                    Err(Error::Unknown),
                );
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        callback.expect_event(handle, RangingEvent::DtTagRangingRoundsUpdated(response));
        assert_eq!(manager.update_dt_tag_ranging_rounds(handle, indexes.clone()).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);

        let error = Error::HardwareFailure;
        callback.expect_event(handle, RangingEvent::DtTagRangingRoundsUpdateFailed { error: error.clone() });
        assert_eq!(manager.update_dt_tag_ranging_rounds(handle, indexes.clone()).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);

        callback.expect_event(handle, RangingEvent::DtTagRangingRoundsUpdateFailed { error });
        assert_eq!(manager.update_dt_tag_ranging_rounds(handle, indexes).await, Ok(()));
        assert!(callback.wait_expected_calls_done().await);
        assert!(native.wait_expected_calls_done().await);
    }

    #[tokio::test]
    async fn test_fira_only_requests_on_ccc_session() {
        let handle = SessionHandle::new(1);
        let params = generate_ccc_builder(0x123).build().unwrap();
        let params_clone = params.clone();
        let (mut manager, mut native) =
            setup_session_manager(ServiceConfig::default(), move |native| {
                expect_open_session(native, &params_clone, CHIP_ID);
            })
            .await;

        let mut callback = MockRangingCallback::new();
        open_session(&mut manager, &mut callback, handle, &params).await;

        let config = data_transfer_phase_config();
        let result = manager.set_data_transfer_phase_config(handle, config).await;
        assert_eq!(result, Err(Error::IllegalState));
        let config = HybridControllerConfig { message_control: 0, phases: vec![] };
        let result = manager.set_hybrid_controller_config(handle, config).await;
        assert_eq!(result, Err(Error::IllegalState));
        let config = HybridControleeConfig { phase_session_tokens: vec![0x456] };
        let result = manager.set_hybrid_controlee_config(handle, config).await;
        assert_eq!(result, Err(Error::IllegalState));
        let result = manager.update_dt_tag_ranging_rounds(handle, vec![0]).await;
        assert_eq!(result, Err(Error::IllegalState));
        assert!(native.wait_expected_calls_done().await);
    }
}
