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

//! The single executor of the firmware-bound session jobs.
//!
//! Every session request accepted by the SessionManagerActor becomes a Job. The jobs of all the
//! sessions are executed one by one in the submission order, so the firmware never observes
//! interleaved command sequences. The outcome of each job is sent back to the actor, which owns
//! the session registry and the callbacks.

use std::time::Duration;

use log::{debug, error, warn};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use crate::caps::TlvBuffer;
use crate::error::{Error, Result};
use crate::params::app_config_params::AppConfigParams;
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::ccc_started_app_config_params::{
    CccStartedAppConfigParams, CccStoppedAppConfigParams,
};
use crate::params::fira_app_config_params::UwbAddress;
use crate::params::uci_packets::{
    AppConfigTlvType, ChipId, Controlee, DataTransferPhaseConfig, DtTagRangingRoundsResponse,
    HybridControleeConfig, HybridControllerConfig, MulticastUpdateStatusCode, SessionHandle,
    SessionId, SessionState, SetAppConfigResponse, StatusCode, UpdateMulticastListAction,
};
use crate::session::ranging_callback::RangingChangeReason;
use crate::session::session_manager::{Response, ResponseSender};
use crate::session::uwb_session::MulticastUpdate;
use crate::uci::native_uwb_manager::NativeUwbManager;

// The states in which the session accepts configuration changes.
pub(crate) const CONFIGURABLE_STATES: [SessionState; 2] =
    [SessionState::SessionStateIdle, SessionState::SessionStateActive];

/// The kind of a reconfigure-class request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReconfigureOp {
    Reconfigure,
    Pause,
    Resume,
    AddControlee,
    RemoveControlee,
}

#[derive(Debug)]
pub(crate) enum Job {
    Session {
        handle: SessionHandle,
        session_id: SessionId,
        chip_id: ChipId,
        state_receiver: watch::Receiver<SessionState>,
        task: SessionTask,
    },
    /// Resolved after all the previously submitted jobs are done.
    Flush { result_sender: ResponseSender },
}

#[derive(Debug)]
pub(crate) enum SessionTask {
    Open {
        params: AppConfigParams,
    },
    Start {
        params: AppConfigParams,
        updated: Option<(AppConfigParams, TlvBuffer)>,
    },
    Stop {
        protocol: ProtocolName,
    },
    Reconfigure {
        op: ReconfigureOp,
        multicast: Option<(UpdateMulticastListAction, Vec<Controlee>)>,
        multicast_receiver: watch::Receiver<Option<MulticastUpdate>>,
        tlvs: TlvBuffer,
        updated_params: Option<AppConfigParams>,
    },
    SendData {
        remote_address: UwbAddress,
        sequence_number: u16,
        payload: Vec<u8>,
    },
    SetDataTransferPhaseConfig {
        config: DataTransferPhaseConfig,
    },
    SetHybridControllerConfig {
        config: HybridControllerConfig,
    },
    SetHybridControleeConfig {
        config: HybridControleeConfig,
    },
    UpdateDtTagRangingRounds {
        ranging_round_indexes: Vec<u8>,
    },
    QueryMaxDataSize {
        result_sender: ResponseSender,
    },
    Close {
        reason: RangingChangeReason,
    },
}

#[derive(Debug)]
pub(crate) enum JobOutcome {
    /// Sent when every session job is done. The outcome is None when the job has nothing to
    /// report yet, e.g. the data transfer result comes with a later notification.
    Session { handle: SessionHandle, outcome: Option<SessionOutcome> },
    Flushed { result_sender: ResponseSender },
}

#[derive(Debug)]
pub(crate) enum SessionOutcome {
    Opened(Result<()>),
    /// The bundle reported to the client, and the params applied when starting.
    Started(Result<(Bundle, Option<AppConfigParams>)>),
    Stopped(Result<Bundle>),
    Reconfigured { op: ReconfigureOp, result: Result<Option<AppConfigParams>> },
    DataSendFailed { sequence_number: u16, error: Error },
    DataTransferPhaseConfigFailed(Error),
    HybridControllerConfigured(Result<()>),
    HybridControleeConfigured(Result<()>),
    DtTagRangingRoundsUpdated(Result<DtTagRangingRoundsResponse>),
    Closed { reason: RangingChangeReason },
}

pub(crate) struct SessionExecutor<N: NativeUwbManager> {
    job_receiver: mpsc::UnboundedReceiver<Job>,
    outcome_sender: mpsc::UnboundedSender<JobOutcome>,
    native_manager: N,
    state_timeout: Duration,
    send_stopped_params: bool,
}

impl<N: NativeUwbManager> SessionExecutor<N> {
    pub fn new(
        job_receiver: mpsc::UnboundedReceiver<Job>,
        outcome_sender: mpsc::UnboundedSender<JobOutcome>,
        native_manager: N,
        state_timeout: Duration,
        send_stopped_params: bool,
    ) -> Self {
        Self { job_receiver, outcome_sender, native_manager, state_timeout, send_stopped_params }
    }

    pub async fn run(&mut self) {
        loop {
            match self.job_receiver.recv().await {
                None => {
                    debug!("SessionExecutor is about to drop.");
                    break;
                }
                Some(job) => self.execute(job).await,
            }
        }
    }

    async fn execute(&mut self, job: Job) {
        let (handle, mut ctx, task) = match job {
            Job::Flush { result_sender } => {
                let _ = self.outcome_sender.send(JobOutcome::Flushed { result_sender });
                return;
            }
            Job::Session { handle, session_id, chip_id, state_receiver, task } => (
                handle,
                JobContext {
                    session_id,
                    chip_id,
                    state_receiver,
                    state_timeout: self.state_timeout,
                },
                task,
            ),
        };

        let outcome = match task {
            SessionTask::Open { params } => {
                Some(SessionOutcome::Opened(self.open(&mut ctx, params).await))
            }
            SessionTask::Start { params, updated } => {
                Some(SessionOutcome::Started(self.start(&mut ctx, params, updated).await))
            }
            SessionTask::Stop { protocol } => {
                Some(SessionOutcome::Stopped(self.stop(&mut ctx, protocol).await))
            }
            SessionTask::Reconfigure {
                op,
                multicast,
                multicast_receiver,
                tlvs,
                updated_params,
            } => {
                let result = self
                    .reconfigure(&mut ctx, multicast, multicast_receiver, tlvs)
                    .await
                    .map(|_| updated_params);
                Some(SessionOutcome::Reconfigured { op, result })
            }
            SessionTask::SendData { remote_address, sequence_number, payload } => self
                .send_data(&mut ctx, remote_address, sequence_number, payload)
                .await
                .err()
                .map(|error| SessionOutcome::DataSendFailed { sequence_number, error }),
            SessionTask::SetDataTransferPhaseConfig { config } => self
                .set_data_transfer_phase_config(&mut ctx, config)
                .await
                .err()
                .map(SessionOutcome::DataTransferPhaseConfigFailed),
            SessionTask::SetHybridControllerConfig { config } => {
                let result = match ctx.check_state(&CONFIGURABLE_STATES) {
                    Ok(_) => self
                        .native_manager
                        .set_hybrid_controller_config(ctx.session_id, config, &ctx.chip_id)
                        .await
                        .map_err(|e| hardware_failure("set the hybrid controller config", e)),
                    Err(e) => Err(e),
                };
                Some(SessionOutcome::HybridControllerConfigured(result))
            }
            SessionTask::SetHybridControleeConfig { config } => {
                let result = match ctx.check_state(&CONFIGURABLE_STATES) {
                    Ok(_) => self
                        .native_manager
                        .set_hybrid_controlee_config(ctx.session_id, config, &ctx.chip_id)
                        .await
                        .map_err(|e| hardware_failure("set the hybrid controlee config", e)),
                    Err(e) => Err(e),
                };
                Some(SessionOutcome::HybridControleeConfigured(result))
            }
            SessionTask::UpdateDtTagRangingRounds { ranging_round_indexes } => {
                let result =
                    self.update_dt_tag_ranging_rounds(&mut ctx, ranging_round_indexes).await;
                Some(SessionOutcome::DtTagRangingRoundsUpdated(result))
            }
            SessionTask::QueryMaxDataSize { result_sender } => {
                let result = self
                    .native_manager
                    .query_max_data_size(ctx.session_id, &ctx.chip_id)
                    .await
                    .map(Response::MaxDataSize)
                    .map_err(|e| hardware_failure("query the max data size", e));
                let _ = result_sender.send(result);
                None
            }
            SessionTask::Close { reason } => {
                if let Err(e) =
                    self.native_manager.session_deinit(ctx.session_id, &ctx.chip_id).await
                {
                    warn!("Failed to deinit session {}: {:?}", ctx.session_id, e);
                }
                Some(SessionOutcome::Closed { reason })
            }
        };

        let _ = self.outcome_sender.send(JobOutcome::Session { handle, outcome });
    }

    async fn open(&mut self, ctx: &mut JobContext, params: AppConfigParams) -> Result<()> {
        let result = self.initialize(ctx, &params).await;
        if result.is_err() {
            // Release the firmware resources of the partially initialized session.
            if let Err(e) = self.native_manager.session_deinit(ctx.session_id, &ctx.chip_id).await
            {
                debug!("Failed to deinit the failed session {}: {:?}", ctx.session_id, e);
            }
        }
        result
    }

    async fn initialize(&mut self, ctx: &mut JobContext, params: &AppConfigParams) -> Result<()> {
        ctx.mark_state_seen();
        self.native_manager
            .session_init(ctx.session_id, params.session_type(), &ctx.chip_id)
            .await
            .map_err(|e| hardware_failure("initialize session", e))?;
        ctx.wait_state(SessionState::SessionStateInit).await?;

        let tlvs = params.generate_tlv_buffer().to_bytes()?;
        let response = match params {
            AppConfigParams::Radar(_) => {
                self.native_manager
                    .set_radar_app_configurations(ctx.session_id, tlvs, &ctx.chip_id)
                    .await
            }
            _ => {
                self.native_manager
                    .set_app_configurations(ctx.session_id, tlvs, &ctx.chip_id)
                    .await
            }
        }
        .map_err(|e| hardware_failure("set app_config", e))?;
        check_app_config_response(response)?;
        ctx.wait_state(SessionState::SessionStateIdle).await
    }

    async fn start(
        &mut self,
        ctx: &mut JobContext,
        params: AppConfigParams,
        updated: Option<(AppConfigParams, TlvBuffer)>,
    ) -> Result<(Bundle, Option<AppConfigParams>)> {
        ctx.check_state(&[SessionState::SessionStateIdle])?;

        let (params, updated_params) = match updated {
            Some((updated_params, tlvs)) => {
                if !tlvs.is_empty() {
                    self.set_app_configurations(ctx, tlvs).await?;
                }
                (updated_params.clone(), Some(updated_params))
            }
            None => (params, None),
        };

        ctx.mark_state_seen();
        self.native_manager
            .range_start(ctx.session_id, &ctx.chip_id)
            .await
            .map_err(|e| hardware_failure("start ranging", e))?;
        ctx.wait_state(SessionState::SessionStateActive).await?;

        let bundle = match params {
            AppConfigParams::Ccc(_) | AppConfigParams::Aliro(_) => {
                let started = self
                    .read_app_configurations(ctx, CccStartedAppConfigParams::requested_tags())
                    .await
                    .and_then(|tlvs| Ok(CccStartedAppConfigParams::from_tlv_buffer(&tlvs)?));
                match started {
                    Ok(started) => started.to_bundle(params.protocol_name()),
                    Err(e) => {
                        warn!("Failed to read the started params: {:?}", e);
                        params.to_bundle()
                    }
                }
            }
            _ => params.to_bundle(),
        };
        Ok((bundle, updated_params))
    }

    async fn stop(&mut self, ctx: &mut JobContext, protocol: ProtocolName) -> Result<Bundle> {
        ctx.check_state(&[SessionState::SessionStateActive])?;
        self.native_manager
            .range_stop(ctx.session_id, &ctx.chip_id)
            .await
            .map_err(|e| hardware_failure("stop ranging", e))?;
        ctx.wait_state(SessionState::SessionStateIdle).await?;

        if !self.send_stopped_params || !matches!(protocol, ProtocolName::Ccc | ProtocolName::Aliro)
        {
            return Ok(Bundle::new());
        }
        let stopped = self
            .read_app_configurations(ctx, CccStoppedAppConfigParams::requested_tags())
            .await
            .and_then(|tlvs| Ok(CccStoppedAppConfigParams::from_tlv_buffer(&tlvs)?));
        match stopped {
            Ok(stopped) => Ok(stopped.to_bundle(protocol)),
            Err(e) => {
                warn!("Failed to read the stopped params: {:?}", e);
                Ok(Bundle::new())
            }
        }
    }

    async fn reconfigure(
        &mut self,
        ctx: &mut JobContext,
        multicast: Option<(UpdateMulticastListAction, Vec<Controlee>)>,
        mut multicast_receiver: watch::Receiver<Option<MulticastUpdate>>,
        tlvs: TlvBuffer,
    ) -> Result<()> {
        ctx.check_state(&CONFIGURABLE_STATES)?;

        if let Some((action, controlees)) = multicast {
            let _ = multicast_receiver.borrow_and_update();
            self.native_manager
                .update_multicast_list(ctx.session_id, action, controlees, &ctx.chip_id)
                .await
                .map_err(|e| hardware_failure("update the multicast list", e))?;
            match timeout(ctx.state_timeout, multicast_receiver.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    debug!("UwbSession is about to drop.");
                    return Err(Error::Unknown);
                }
                Err(_) => {
                    error!("Timeout waiting for the multicast list update notification");
                    return Err(Error::Timeout);
                }
            }
            let update = multicast_receiver.borrow().clone();
            if let Some(update) = update {
                for status in update.status_list.iter() {
                    if status.status != MulticastUpdateStatusCode::StatusOkMulticastListUpdate {
                        error!(
                            "Failed to update controlee {:?}: {:?}",
                            status.mac_address, status.status
                        );
                        return Err(Error::HardwareFailure);
                    }
                }
            }
        }

        if !tlvs.is_empty() {
            self.set_app_configurations(ctx, tlvs).await?;
        }
        Ok(())
    }

    async fn send_data(
        &mut self,
        ctx: &mut JobContext,
        remote_address: UwbAddress,
        sequence_number: u16,
        payload: Vec<u8>,
    ) -> Result<()> {
        ctx.check_state(&[SessionState::SessionStateActive])?;
        self.native_manager
            .send_data(
                ctx.session_id,
                remote_address.into(),
                sequence_number,
                payload,
                &ctx.chip_id,
            )
            .await
            .map_err(|e| hardware_failure("send data", e))
    }

    async fn set_data_transfer_phase_config(
        &mut self,
        ctx: &mut JobContext,
        config: DataTransferPhaseConfig,
    ) -> Result<()> {
        ctx.check_state(&CONFIGURABLE_STATES)?;
        self.native_manager
            .set_data_transfer_phase_config(ctx.session_id, config, &ctx.chip_id)
            .await
            .map_err(|e| hardware_failure("set the data transfer phase config", e))
    }

    async fn update_dt_tag_ranging_rounds(
        &mut self,
        ctx: &mut JobContext,
        ranging_round_indexes: Vec<u8>,
    ) -> Result<DtTagRangingRoundsResponse> {
        ctx.check_state(&CONFIGURABLE_STATES)?;
        let response = self
            .native_manager
            .update_dt_tag_ranging_rounds(ctx.session_id, ranging_round_indexes, &ctx.chip_id)
            .await
            .map_err(|e| hardware_failure("update the DT tag ranging rounds", e))?;
        if response.status != StatusCode::UciStatusOk {
            error!("Failed to update the DT tag ranging rounds: {:?}", response);
            return Err(Error::HardwareFailure);
        }
        Ok(response)
    }

    async fn set_app_configurations(
        &mut self,
        ctx: &mut JobContext,
        tlvs: TlvBuffer,
    ) -> Result<()> {
        let response = self
            .native_manager
            .set_app_configurations(ctx.session_id, tlvs.to_bytes()?, &ctx.chip_id)
            .await
            .map_err(|e| hardware_failure("set app_config", e))?;
        check_app_config_response(response)
    }

    async fn read_app_configurations(
        &mut self,
        ctx: &mut JobContext,
        tags: Vec<AppConfigTlvType>,
    ) -> Result<TlvBuffer> {
        let tags = tags.into_iter().map(|tag| tag as u8).collect();
        let data = self
            .native_manager
            .get_app_configurations(ctx.session_id, tags, &ctx.chip_id)
            .await
            .map_err(|e| hardware_failure("get app_config", e))?;
        Ok(TlvBuffer::parse(&data)?)
    }
}

struct JobContext {
    session_id: SessionId,
    chip_id: ChipId,
    state_receiver: watch::Receiver<SessionState>,
    state_timeout: Duration,
}

impl JobContext {
    fn mark_state_seen(&mut self) {
        let _ = self.state_receiver.borrow_and_update();
    }

    // Mark the current state as seen, and check it is one of |allowed_states|.
    fn check_state(&mut self, allowed_states: &[SessionState]) -> Result<SessionState> {
        let state = *self.state_receiver.borrow_and_update();
        if !allowed_states.contains(&state) {
            error!("Session {} is at the illegal state {:?}", self.session_id, state);
            return Err(Error::IllegalState);
        }
        Ok(state)
    }

    async fn wait_state(&mut self, expected_state: SessionState) -> Result<()> {
        match timeout(self.state_timeout, self.state_receiver.changed()).await {
            Ok(result) => {
                if result.is_err() {
                    debug!("UwbSession is about to drop.");
                    return Err(Error::Unknown);
                }
            }
            Err(_) => {
                error!("Timeout waiting for the session status notification");
                return Err(Error::Timeout);
            }
        }

        let state = *self.state_receiver.borrow_and_update();
        if state != expected_state {
            error!(
                "Transit to wrong Session state {:?}. The expected state is {:?}",
                state, expected_state
            );
            return Err(Error::IllegalState);
        }
        Ok(())
    }
}

fn hardware_failure(action: &str, e: Error) -> Error {
    error!("Failed to {}: {:?}", action, e);
    Error::HardwareFailure
}

fn check_app_config_response(response: SetAppConfigResponse) -> Result<()> {
    for config_status in response.config_status.iter() {
        warn!("AppConfig {:?} is not applied: {:?}", config_status.cfg_id, config_status.status);
    }
    if response.status != StatusCode::UciStatusOk {
        error!("Failed to set app_config. StatusCode: {:?}", response.status);
        return Err(Error::HardwareFailure);
    }
    Ok(())
}
