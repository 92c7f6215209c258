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

//! This module defines the UwbServiceCore, the entry of the UWB platform service.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::caps::GenericSpecificationParams;
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::params::bundle::Bundle;
use crate::params::fira_app_config_params::UwbAddress;
use crate::params::uci_packets::{
    ChipId, CountryCode, DataTransferPhaseConfig, DeviceState, HybridControleeConfig,
    HybridControllerConfig, MessageType, RawVendorMessage, SessionHandle, StatusCode,
};
use crate::service::adapter_state::{AdapterState, AdapterStatus, StateChangeReason};
use crate::service::callbacks::{
    AdapterStateCallback, BugReporter, CallbackId, CountryCodeProvider,
    InitializationFailureListener, SetCountryCodeStatus, VendorUciCallback, WakeLock,
};
use crate::session::ranging_callback::{RangingCallback, RangingChangeReason};
use crate::session::session_manager::SessionManager;
use crate::uci::native_uwb_manager::NativeUwbManager;
use crate::uci::notification::CoreNotification;
use crate::uci::watchdog::run_with_watchdog;

/// The entry class (a.k.a top shim) of the UWB platform service. The class accepts requests from
/// the client, and delegates them to the UwbServiceCoreActor running on the runtime.
///
/// All the state-mutating requests are processed one by one on the actor, so the firmware sees
/// the commands in the order they are issued. Each method blocks until the request is processed
/// by the actor, while the outcome of a ranging operation is delivered later to the
/// RangingCallback of the session.
pub struct UwbServiceCore {
    runtime: Runtime,
    cmd_sender: mpsc::UnboundedSender<(Command, ResponseSender)>,
    state_receiver: watch::Receiver<AdapterState>,
}

impl UwbServiceCore {
    /// Create a new UwbServiceCore instance.
    pub(super) fn new<N, P, W, B>(
        runtime: Runtime,
        config: ServiceConfig,
        native_manager: N,
        country_code_provider: P,
        wake_lock: W,
        bug_reporter: B,
    ) -> Self
    where
        N: NativeUwbManager,
        P: CountryCodeProvider,
        W: WakeLock,
        B: BugReporter,
    {
        let (cmd_sender, cmd_receiver) = mpsc::unbounded_channel();
        let (state_sender, state_receiver) = watch::channel(AdapterState::Disabled);
        let mut actor = runtime.block_on(async move {
            UwbServiceCoreActor::new(
                cmd_receiver,
                state_sender,
                config,
                native_manager,
                country_code_provider,
                wake_lock,
                bug_reporter,
            )
        });
        runtime.spawn(async move { actor.run().await });

        Self { runtime, cmd_sender, state_receiver }
    }

    /// Enable or disable UWB. Enabling an enabled service (or disabling a disabled one) is a
    /// no-op. The failure of the hardware is reported by the InitializationFailureListener.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.block_on_cmd(Command::SetEnabled { enabled })?;
        Ok(())
    }

    /// Report the country code picked by the CountryCodeProvider.
    pub fn on_country_code_changed(
        &mut self,
        status: SetCountryCodeStatus,
        country_code: Option<String>,
    ) -> Result<()> {
        self.block_on_cmd(Command::CountryCodeChanged { status, country_code })?;
        Ok(())
    }

    /// Vote to keep the hardware on. Only used when the hardware idle turn off is enabled.
    pub fn update_hw_enable_vote(&mut self, tag: &str, enabled: bool) -> Result<()> {
        self.block_on_cmd(Command::UpdateHwEnableVote { tag: tag.to_string(), enabled })?;
        Ok(())
    }

    /// Get the current adapter state. It can be called from any thread.
    pub fn get_adapter_state(&self) -> AdapterState {
        *self.state_receiver.borrow()
    }

    /// Register the callback of the adapter state. The current state is delivered immediately.
    pub fn register_adapter_state_callback<C: AdapterStateCallback>(
        &mut self,
        callback: C,
    ) -> Result<CallbackId> {
        let callback = Box::new(callback);
        match self.block_on_cmd(Command::RegisterAdapterStateCallback { callback })? {
            Response::CallbackId(id) => Ok(id),
            response => {
                error!(
                    "register_adapter_state_callback() should return CallbackId: {:?}",
                    response
                );
                Err(Error::Unknown)
            }
        }
    }

    pub fn unregister_adapter_state_callback(&mut self, id: CallbackId) -> Result<()> {
        self.block_on_cmd(Command::UnregisterAdapterStateCallback { id })?;
        Ok(())
    }

    pub fn add_initialization_failure_listener<L: InitializationFailureListener>(
        &mut self,
        listener: L,
    ) -> Result<CallbackId> {
        let listener = Box::new(listener);
        match self.block_on_cmd(Command::AddInitializationFailureListener { listener })? {
            Response::CallbackId(id) => Ok(id),
            response => {
                error!(
                    "add_initialization_failure_listener() should return CallbackId: {:?}",
                    response
                );
                Err(Error::Unknown)
            }
        }
    }

    pub fn remove_initialization_failure_listener(&mut self, id: CallbackId) -> Result<()> {
        self.block_on_cmd(Command::RemoveInitializationFailureListener { id })?;
        Ok(())
    }

    /// Register the callback of the vendor UCI messages. It replaces the previous one.
    pub fn register_vendor_extension_callback<C: VendorUciCallback>(
        &mut self,
        callback: C,
    ) -> Result<()> {
        let callback = Box::new(callback);
        self.block_on_cmd(Command::RegisterVendorExtensionCallback { callback })?;
        Ok(())
    }

    pub fn unregister_vendor_extension_callback(&mut self) -> Result<()> {
        self.block_on_cmd(Command::UnregisterVendorExtensionCallback)?;
        Ok(())
    }

    /// Open a ranging session. The protocol of the session is named by the params bundle. The
    /// default chip is used when |chip_id| is None.
    pub fn open_ranging<R: RangingCallback>(
        &mut self,
        identity: &str,
        handle: SessionHandle,
        params: Bundle,
        callback: R,
        chip_id: Option<&str>,
    ) -> Result<()> {
        self.block_on_cmd(Command::OpenRanging {
            identity: identity.to_string(),
            handle,
            params,
            callback: Box::new(callback),
            chip_id: chip_id.map(|chip_id| chip_id.to_string()),
        })?;
        Ok(())
    }

    /// Start ranging. The params are only used by the CCC and Aliro sessions.
    pub fn start_ranging(&mut self, handle: SessionHandle, params: Option<Bundle>) -> Result<()> {
        self.block_on_cmd(Command::StartRanging { handle, params })?;
        Ok(())
    }

    pub fn reconfigure_ranging(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.block_on_cmd(Command::Reconfigure { handle, params })?;
        Ok(())
    }

    pub fn pause(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.block_on_cmd(Command::Pause { handle, params })?;
        Ok(())
    }

    pub fn resume(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.block_on_cmd(Command::Resume { handle, params })?;
        Ok(())
    }

    pub fn add_controlee(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.block_on_cmd(Command::AddControlee { handle, params })?;
        Ok(())
    }

    pub fn remove_controlee(&mut self, handle: SessionHandle, params: Bundle) -> Result<()> {
        self.block_on_cmd(Command::RemoveControlee { handle, params })?;
        Ok(())
    }

    pub fn stop_ranging(&mut self, handle: SessionHandle) -> Result<()> {
        self.block_on_cmd(Command::StopRanging { handle })?;
        Ok(())
    }

    pub fn close_ranging(&mut self, handle: SessionHandle) -> Result<()> {
        self.block_on_cmd(Command::CloseRanging { handle })?;
        Ok(())
    }

    pub fn send_data(
        &mut self,
        handle: SessionHandle,
        remote_address: UwbAddress,
        payload: Vec<u8>,
    ) -> Result<()> {
        self.block_on_cmd(Command::SendData { handle, remote_address, payload })?;
        Ok(())
    }

    pub fn set_data_transfer_phase_config(
        &mut self,
        handle: SessionHandle,
        config: DataTransferPhaseConfig,
    ) -> Result<()> {
        self.block_on_cmd(Command::SetDataTransferPhaseConfig { handle, config })?;
        Ok(())
    }

    pub fn set_hybrid_session_controller_configuration(
        &mut self,
        handle: SessionHandle,
        config: HybridControllerConfig,
    ) -> Result<()> {
        self.block_on_cmd(Command::SetHybridControllerConfig { handle, config })?;
        Ok(())
    }

    pub fn set_hybrid_session_controlee_configuration(
        &mut self,
        handle: SessionHandle,
        config: HybridControleeConfig,
    ) -> Result<()> {
        self.block_on_cmd(Command::SetHybridControleeConfig { handle, config })?;
        Ok(())
    }

    pub fn update_dt_tag_ranging_rounds(
        &mut self,
        handle: SessionHandle,
        ranging_round_indexes: Vec<u8>,
    ) -> Result<()> {
        self.block_on_cmd(Command::UpdateDtTagRangingRounds { handle, ranging_round_indexes })?;
        Ok(())
    }

    /// Query the max size of the data sent in one packet of the session.
    pub fn query_max_data_size(&mut self, handle: SessionHandle) -> Result<u16> {
        match self.block_on_cmd(Command::QueryMaxDataSize { handle })? {
            Response::MaxDataSize(size) => Ok(size),
            response => {
                error!("query_max_data_size() should return MaxDataSize: {:?}", response);
                Err(Error::Unknown)
            }
        }
    }

    /// Send a vendor UCI message, and return the status of the response. The response payload
    /// is delivered to the VendorUciCallback.
    pub fn send_vendor_uci_message(
        &mut self,
        mt: MessageType,
        gid: u32,
        oid: u32,
        payload: Vec<u8>,
        chip_id: Option<&str>,
    ) -> Result<StatusCode> {
        let chip_id = chip_id.map(|chip_id| chip_id.to_string());
        match self.block_on_cmd(Command::SendVendorUciMessage { mt, gid, oid, payload, chip_id })? {
            Response::StatusCode(status) => Ok(status),
            response => {
                error!("send_vendor_uci_message() should return StatusCode: {:?}", response);
                Err(Error::Unknown)
            }
        }
    }

    /// Get the capabilities of the chip, in the form of a bundle.
    pub fn get_specification_info(&mut self, chip_id: Option<&str>) -> Result<Bundle> {
        let params = self.get_cached_specification_params(chip_id)?;
        Ok(params.to_bundle())
    }

    /// Get the capabilities of the chip. The capabilities are queried from the firmware once,
    /// and cached until the country code changes.
    pub fn get_cached_specification_params(
        &mut self,
        chip_id: Option<&str>,
    ) -> Result<GenericSpecificationParams> {
        let chip_id = chip_id.map(|chip_id| chip_id.to_string());
        match self.block_on_cmd(Command::GetSpecificationParams { chip_id })? {
            Response::SpecificationParams(params) => Ok(*params),
            response => {
                error!(
                    "get_cached_specification_params() should return SpecificationParams: {:?}",
                    response
                );
                Err(Error::Unknown)
            }
        }
    }

    /// Send the |cmd| to UwbServiceCoreActor and wait until receiving the response.
    fn block_on_cmd(&self, cmd: Command) -> Result<Response> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.cmd_sender.send((cmd, result_sender)).map_err(|cmd| {
            error!("Failed to send cmd: {:?}", cmd.0);
            Error::Unknown
        })?;

        self.runtime.block_on(async move {
            result_receiver.await.unwrap_or_else(|e| {
                error!("Failed to receive the result for cmd: {:?}", e);
                Err(Error::Unknown)
            })
        })
    }

    /// Run an future task on the runtime. This method is only exposed for the testing.
    #[cfg(test)]
    fn block_on_for_testing<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

struct UwbServiceCoreActor<N, P, W, B>
where
    N: NativeUwbManager,
    P: CountryCodeProvider,
    W: WakeLock,
    B: BugReporter,
{
    cmd_receiver: mpsc::UnboundedReceiver<(Command, ResponseSender)>,
    state_sender: watch::Sender<AdapterState>,
    config: ServiceConfig,
    native_manager: N,
    country_code_provider: P,
    wake_lock: W,
    bug_reporter: B,
    session_manager: Option<SessionManager>,
    core_notf_receiver: mpsc::UnboundedReceiver<CoreNotification>,
    vendor_notf_receiver: mpsc::UnboundedReceiver<RawVendorMessage>,

    // UWB is enabled by the user.
    user_enabled: bool,
    hw_enable_votes: BTreeSet<String>,
    status: AdapterStatus,
    // The last state and reason delivered to the callbacks.
    last_notified: (AdapterState, StateChangeReason),
    specification_cache: BTreeMap<ChipId, GenericSpecificationParams>,
    last_bug_report: Option<Instant>,

    next_callback_id: u32,
    adapter_state_callbacks: BTreeMap<CallbackId, Box<dyn AdapterStateCallback>>,
    init_failure_listeners: BTreeMap<CallbackId, Box<dyn InitializationFailureListener>>,
    vendor_callback: Option<Box<dyn VendorUciCallback>>,
}

impl<N, P, W, B> UwbServiceCoreActor<N, P, W, B>
where
    N: NativeUwbManager,
    P: CountryCodeProvider,
    W: WakeLock,
    B: BugReporter,
{
    fn new(
        cmd_receiver: mpsc::UnboundedReceiver<(Command, ResponseSender)>,
        state_sender: watch::Sender<AdapterState>,
        config: ServiceConfig,
        native_manager: N,
        country_code_provider: P,
        wake_lock: W,
        bug_reporter: B,
    ) -> Self {
        Self {
            cmd_receiver,
            state_sender,
            config,
            native_manager,
            country_code_provider,
            wake_lock,
            bug_reporter,
            session_manager: None,
            core_notf_receiver: mpsc::unbounded_channel().1,
            vendor_notf_receiver: mpsc::unbounded_channel().1,
            user_enabled: false,
            hw_enable_votes: BTreeSet::new(),
            status: AdapterStatus::default(),
            last_notified: (AdapterState::Disabled, StateChangeReason::Unknown),
            specification_cache: BTreeMap::new(),
            last_bug_report: None,
            next_callback_id: 0,
            adapter_state_callbacks: BTreeMap::new(),
            init_failure_listeners: BTreeMap::new(),
            vendor_callback: None,
        }
    }

    async fn run(&mut self) {
        loop {
            tokio::select! {
                cmd = self.cmd_receiver.recv() => {
                    match cmd {
                        None => {
                            debug!("UwbServiceCore is about to drop.");
                            break;
                        },
                        Some((cmd, result_sender)) => {
                            let result = self.handle_cmd(cmd).await;
                            let timeout_occurs = matches!(result, Err(Error::Timeout));
                            let _ = result_sender.send(result);

                            // The firmware might be stuck at a weird state when the timeout
                            // occurs. Toggle the hardware and hope it goes back to normal.
                            if timeout_occurs {
                                warn!("The command timeout, reset the service.");
                                self.reset_service().await;
                            }
                        }
                    }
                }
                Some(core_notf) = self.core_notf_receiver.recv() => {
                    self.handle_core_notification(core_notf).await;
                }
                Some(vendor_notf) = self.vendor_notf_receiver.recv() => {
                    self.handle_vendor_notification(vendor_notf);
                }
            }
        }
    }

    async fn handle_cmd(&mut self, cmd: Command) -> Result<Response> {
        match cmd {
            Command::SetEnabled { enabled } => {
                self.set_enabled(enabled).await;
                Ok(Response::Null)
            }
            Command::CountryCodeChanged { status, country_code } => {
                self.apply_country_code(status, country_code);
                Ok(Response::Null)
            }
            Command::UpdateHwEnableVote { tag, enabled } => {
                self.update_hw_enable_vote(tag, enabled).await;
                Ok(Response::Null)
            }
            Command::RegisterAdapterStateCallback { mut callback } => {
                let (state, reason) = self.last_notified;
                callback.on_adapter_state_changed(state, reason);
                let id = self.allocate_callback_id();
                self.adapter_state_callbacks.insert(id, callback);
                Ok(Response::CallbackId(id))
            }
            Command::UnregisterAdapterStateCallback { id } => {
                if self.adapter_state_callbacks.remove(&id).is_none() {
                    warn!("The adapter state callback {:?} is not registered", id);
                }
                Ok(Response::Null)
            }
            Command::AddInitializationFailureListener { listener } => {
                let id = self.allocate_callback_id();
                self.init_failure_listeners.insert(id, listener);
                Ok(Response::CallbackId(id))
            }
            Command::RemoveInitializationFailureListener { id } => {
                if self.init_failure_listeners.remove(&id).is_none() {
                    warn!("The initialization failure listener {:?} is not added", id);
                }
                Ok(Response::Null)
            }
            Command::RegisterVendorExtensionCallback { callback } => {
                self.vendor_callback = Some(callback);
                Ok(Response::Null)
            }
            Command::UnregisterVendorExtensionCallback => {
                self.vendor_callback = None;
                Ok(Response::Null)
            }
            Command::OpenRanging { identity, handle, params, callback, chip_id } => {
                let chip_id = self.resolve_chip_id(chip_id)?;
                info!("{} opens the session {:?} on the chip {}", identity, handle, chip_id);
                self.ranging_session_manager()?
                    .open_session(identity, handle, chip_id, params, callback)
                    .await?;
                Ok(Response::Null)
            }
            Command::StartRanging { handle, params } => {
                self.ranging_session_manager()?.start_ranging(handle, params).await?;
                Ok(Response::Null)
            }
            Command::Reconfigure { handle, params } => {
                self.session_manager()?.reconfigure(handle, params).await?;
                Ok(Response::Null)
            }
            Command::Pause { handle, params } => {
                self.session_manager()?.pause(handle, params).await?;
                Ok(Response::Null)
            }
            Command::Resume { handle, params } => {
                self.ranging_session_manager()?.resume(handle, params).await?;
                Ok(Response::Null)
            }
            Command::AddControlee { handle, params } => {
                self.session_manager()?.add_controlee(handle, params).await?;
                Ok(Response::Null)
            }
            Command::RemoveControlee { handle, params } => {
                self.session_manager()?.remove_controlee(handle, params).await?;
                Ok(Response::Null)
            }
            Command::StopRanging { handle } => {
                self.session_manager()?.stop_ranging(handle).await?;
                Ok(Response::Null)
            }
            Command::CloseRanging { handle } => {
                self.session_manager()?.close_session(handle).await?;
                Ok(Response::Null)
            }
            Command::SendData { handle, remote_address, payload } => {
                self.session_manager()?.send_data(handle, remote_address, payload).await?;
                Ok(Response::Null)
            }
            Command::SetDataTransferPhaseConfig { handle, config } => {
                self.session_manager()?.set_data_transfer_phase_config(handle, config).await?;
                Ok(Response::Null)
            }
            Command::SetHybridControllerConfig { handle, config } => {
                self.session_manager()?.set_hybrid_controller_config(handle, config).await?;
                Ok(Response::Null)
            }
            Command::SetHybridControleeConfig { handle, config } => {
                self.session_manager()?.set_hybrid_controlee_config(handle, config).await?;
                Ok(Response::Null)
            }
            Command::UpdateDtTagRangingRounds { handle, ranging_round_indexes } => {
                self.session_manager()?
                    .update_dt_tag_ranging_rounds(handle, ranging_round_indexes)
                    .await?;
                Ok(Response::Null)
            }
            Command::QueryMaxDataSize { handle } => {
                let size = self.session_manager()?.query_max_data_size(handle).await?;
                Ok(Response::MaxDataSize(size))
            }
            Command::SendVendorUciMessage { mt, gid, oid, payload, chip_id } => {
                let status = self.send_vendor_uci_message(mt, gid, oid, payload, chip_id).await?;
                Ok(Response::StatusCode(status))
            }
            Command::GetSpecificationParams { chip_id } => {
                let chip_id = self.resolve_chip_id(chip_id)?;
                let params = self.cached_specification_params(&chip_id).await?;
                Ok(Response::SpecificationParams(Box::new(params)))
            }
        }
    }

    async fn handle_core_notification(&mut self, notf: CoreNotification) {
        debug!("Receive core notification: {:?}", notf);
        match notf {
            CoreNotification::DeviceStatus { chip_id, state } => {
                if !self.status.is_known_chip(&chip_id) {
                    warn!("Ignore the device status of the unknown chip {}", chip_id);
                    return;
                }
                if state == DeviceState::DeviceStateError {
                    warn!("Received DeviceStateError from {}, reset the service", chip_id);
                    self.reset_service().await;
                    return;
                }

                let prev_state = self.status.adapter_state();
                self.status.chip_states.insert(chip_id, state);
                if self.status.adapter_state() != prev_state {
                    let reason = match state {
                        DeviceState::DeviceStateActive => StateChangeReason::SessionStarted,
                        _ => StateChangeReason::AllSessionsClosed,
                    };
                    self.update_adapter_state(reason);
                }
            }
            CoreNotification::GenericError { chip_id, status } => {
                warn!("Received the generic error {:?} from {}", status, chip_id);
            }
        }
    }

    fn handle_vendor_notification(&mut self, notf: RawVendorMessage) {
        match self.vendor_callback.as_mut() {
            Some(callback) => {
                callback.on_vendor_notification_received(notf.gid, notf.oid, notf.payload)
            }
            None => debug!("Drop the vendor notification, no callback is registered"),
        }
    }

    async fn set_enabled(&mut self, enabled: bool) {
        if self.user_enabled == enabled {
            debug!("UWB is already {}, skip.", if enabled { "enabled" } else { "disabled" });
            return;
        }
        self.user_enabled = enabled;

        if !enabled {
            self.status.hw_idle = false;
            self.disable_hw().await;
            self.update_adapter_state(StateChangeReason::SystemPolicy);
        } else if self.config.hw_idle_turn_off_enabled && self.hw_enable_votes.is_empty() {
            debug!("Nobody votes for the hardware, keep it off.");
            self.status.hw_idle = true;
            self.update_adapter_state(StateChangeReason::SystemPolicy);
        } else {
            self.enable_hw().await;
        }
    }

    async fn update_hw_enable_vote(&mut self, tag: String, enabled: bool) {
        if !self.config.hw_idle_turn_off_enabled {
            debug!("The hardware idle turn off is disabled, ignore the vote of {}", tag);
            return;
        }
        let changed = if enabled {
            self.hw_enable_votes.insert(tag)
        } else {
            self.hw_enable_votes.remove(&tag)
        };
        if !changed || !self.user_enabled {
            return;
        }

        if !self.hw_enable_votes.is_empty() && self.status.hw_idle {
            self.status.hw_idle = false;
            self.enable_hw().await;
        } else if self.hw_enable_votes.is_empty() && self.status.hw_initialized {
            self.disable_hw().await;
            self.status.hw_idle = true;
            self.update_adapter_state(StateChangeReason::SystemPolicy);
        }
    }

    async fn enable_hw(&mut self) {
        let (core_notf_sender, core_notf_receiver) = mpsc::unbounded_channel();
        let (session_notf_sender, session_notf_receiver) = mpsc::unbounded_channel();
        let (vendor_notf_sender, vendor_notf_receiver) = mpsc::unbounded_channel();
        let (data_rcv_notf_sender, data_rcv_notf_receiver) = mpsc::unbounded_channel();
        let (radar_notf_sender, radar_notf_receiver) = mpsc::unbounded_channel();
        self.native_manager.set_core_notification_sender(core_notf_sender).await;
        self.native_manager.set_session_notification_sender(session_notf_sender).await;
        self.native_manager.set_vendor_notification_sender(vendor_notf_sender).await;
        self.native_manager.set_data_rcv_notification_sender(data_rcv_notf_sender).await;
        self.native_manager.set_radar_data_rcv_notification_sender(radar_notf_sender).await;

        self.wake_lock.acquire();
        let native_manager = self.native_manager.clone();
        let result = run_with_watchdog(self.watchdog_duration(), async move {
            native_manager.do_initialize().await
        })
        .await;
        self.release_wake_lock();

        let device_infos = match result {
            Ok(Some(device_infos)) => device_infos,
            Ok(None) => {
                error!("Failed to initialize the UWB hardware");
                self.handle_initialization_failure();
                return;
            }
            Err(e) => {
                error!("The UWB hardware is not initialized in time: {:?}", e);
                self.handle_initialization_failure();
                return;
            }
        };
        for (chip_id, device_info) in device_infos.iter() {
            info!("The chip {} is initialized: {:?}", chip_id, device_info);
        }

        self.core_notf_receiver = core_notf_receiver;
        self.vendor_notf_receiver = vendor_notf_receiver;
        self.session_manager = Some(SessionManager::new(
            &self.config,
            self.native_manager.clone(),
            session_notf_receiver,
            data_rcv_notf_receiver,
            radar_notf_receiver,
        ));
        self.status.hw_initialized = true;
        self.status.reset_chip_states(self.config.multichip.iter());

        let (status, country_code) = self.country_code_provider.set_country_code(true);
        self.apply_country_code(status, country_code);
    }

    async fn disable_hw(&mut self) {
        if let Some(mut session_manager) = self.session_manager.take() {
            let reason = RangingChangeReason::SystemPolicy;
            if let Err(e) = session_manager.close_all_sessions(reason).await {
                warn!("Failed to close the sessions: {:?}", e);
            }
        }
        self.core_notf_receiver = mpsc::unbounded_channel().1;
        self.vendor_notf_receiver = mpsc::unbounded_channel().1;
        self.specification_cache.clear();

        if self.status.hw_initialized {
            self.wake_lock.acquire();
            let native_manager = self.native_manager.clone();
            let result = run_with_watchdog(self.watchdog_duration(), async move {
                native_manager.do_deinitialize().await
            })
            .await;
            self.release_wake_lock();
            match result {
                Ok(true) => debug!("The UWB hardware is deinitialized"),
                Ok(false) => error!("Failed to deinitialize the UWB hardware"),
                Err(e) => error!("The UWB hardware is not deinitialized in time: {:?}", e),
            }
        }
        self.status.hw_initialized = false;
        self.status.chip_states.clear();
    }

    // Toggle the hardware off and on. The user's choice is kept.
    async fn reset_service(&mut self) {
        self.disable_hw().await;
        self.update_adapter_state(StateChangeReason::SystemPolicy);
        if self.user_enabled && !self.status.hw_idle {
            self.enable_hw().await;
        }
    }

    fn handle_initialization_failure(&mut self) {
        self.core_notf_receiver = mpsc::unbounded_channel().1;
        self.vendor_notf_receiver = mpsc::unbounded_channel().1;
        self.user_enabled = false;

        if self.init_failure_listeners.is_empty() {
            self.take_bug_report_if_needed("UWB hardware initialization failure");
        }
        for listener in self.init_failure_listeners.values_mut() {
            listener.on_failure();
        }
    }

    fn take_bug_report_if_needed(&mut self, reason: &str) {
        if !self.config.device_error_bugreport_enabled {
            return;
        }
        let now = Instant::now();
        let min_interval = Duration::from_millis(self.config.bug_report_min_interval_ms);
        if let Some(last_bug_report) = self.last_bug_report {
            if now.duration_since(last_bug_report) < min_interval {
                debug!("Skip the bug report, the last one was taken recently");
                return;
            }
        }
        self.last_bug_report = Some(now);
        self.bug_reporter.take_bug_report(reason);
    }

    fn apply_country_code(&mut self, status: SetCountryCodeStatus, country_code: Option<String>) {
        info!("Country code changed: {:?}, status: {:?}", country_code, status);
        self.specification_cache.clear();

        let valid_code = country_code.as_deref().and_then(CountryCode::parse);
        let reason = match (status, valid_code) {
            (SetCountryCodeStatus::Ok, Some(code)) => {
                self.status.country_code = Some(code);
                StateChangeReason::SystemPolicy
            }
            (SetCountryCodeStatus::Ok, None) | (SetCountryCodeStatus::Failed, None) => {
                self.status.country_code = None;
                StateChangeReason::SystemRegulation
            }
            (SetCountryCodeStatus::RegulationUwbOff, _) => {
                warn!("UWB is not allowed in the country {:?}", country_code);
                self.status.country_code = None;
                StateChangeReason::SystemRegulation
            }
            (SetCountryCodeStatus::Failed, Some(_)) => {
                self.status.country_code = None;
                StateChangeReason::SystemPolicy
            }
        };
        self.update_adapter_state(reason);
    }

    // Publish the adapter state, and notify the callbacks if the state or the reason changes.
    fn update_adapter_state(&mut self, reason: StateChangeReason) {
        let state = self.status.adapter_state();
        self.state_sender.send_replace(state);
        if self.last_notified == (state, reason) {
            debug!("The adapter state {:?} ({:?}) is not changed", state, reason);
            return;
        }

        info!("Adapter state changed: {:?}, reason: {:?}", state, reason);
        self.last_notified = (state, reason);
        for callback in self.adapter_state_callbacks.values_mut() {
            callback.on_adapter_state_changed(state, reason);
        }
    }

    async fn send_vendor_uci_message(
        &mut self,
        mt: MessageType,
        gid: u32,
        oid: u32,
        payload: Vec<u8>,
        chip_id: Option<ChipId>,
    ) -> Result<StatusCode> {
        let chip_id = self.resolve_chip_id(chip_id)?;
        match mt {
            MessageType::Command => {}
            MessageType::ReservedForTesting1 | MessageType::ReservedForTesting2 => {
                let supported = match self.cached_specification_params(&chip_id).await {
                    Ok(params) => params.supports_test_messages(),
                    Err(e) => {
                        error!("Failed to get the capabilities of {}: {:?}", chip_id, e);
                        false
                    }
                };
                if !supported {
                    error!("The UCI test messages are not supported by {}", chip_id);
                    return Ok(StatusCode::UciStatusFailed);
                }
            }
            _ => {
                error!("The message type {:?} is not supported", mt);
                return Ok(StatusCode::UciStatusFailed);
            }
        }

        let response =
            self.native_manager.send_raw_vendor_cmd(mt, gid, oid, payload, &chip_id).await?;
        if response.status == StatusCode::UciStatusOk {
            match self.vendor_callback.as_mut() {
                Some(callback) => callback.on_vendor_response_received(
                    response.gid,
                    response.oid,
                    response.payload,
                ),
                None => debug!("Drop the vendor response, no callback is registered"),
            }
        }
        Ok(response.status)
    }

    async fn cached_specification_params(
        &mut self,
        chip_id: &str,
    ) -> Result<GenericSpecificationParams> {
        if let Some(params) = self.specification_cache.get(chip_id) {
            return Ok(params.clone());
        }

        let caps_info = self.native_manager.get_caps_info(chip_id).await?;
        let params = GenericSpecificationParams::decode(
            &caps_info,
            self.config.ccc_supported_sync_codes_little_endian,
        )
        .map_err(|e| {
            error!("Failed to decode the capabilities of {}: {:?}", chip_id, e);
            Error::DecodeFailure(e)
        })?;
        self.specification_cache.insert(chip_id.to_string(), params.clone());
        Ok(params)
    }

    // Select the default chip if |chip_id| is None. The hardware must be initialized.
    fn resolve_chip_id(&self, chip_id: Option<ChipId>) -> Result<ChipId> {
        if !self.status.hw_initialized {
            error!("The UWB hardware is not enabled");
            return Err(Error::IllegalState);
        }
        let chip_id = chip_id.unwrap_or_else(|| self.config.default_chip_id());
        if !self.status.is_known_chip(&chip_id) {
            error!("The chip {} is not found", chip_id);
            return Err(Error::IllegalArgument);
        }
        Ok(chip_id)
    }

    fn session_manager(&mut self) -> Result<&mut SessionManager> {
        match self.session_manager.as_mut() {
            Some(session_manager) => Ok(session_manager),
            None => {
                error!("The UWB hardware is not enabled");
                Err(Error::IllegalState)
            }
        }
    }

    // The session manager for the operations which start the radio.
    fn ranging_session_manager(&mut self) -> Result<&mut SessionManager> {
        if self.status.hw_initialized && self.status.country_code.is_none() {
            error!("UWB is not allowed with the current country code");
            return Err(Error::RegulatoryBlocked);
        }
        self.session_manager()
    }

    fn allocate_callback_id(&mut self) -> CallbackId {
        let id = CallbackId::new(self.next_callback_id);
        self.next_callback_id = self.next_callback_id.wrapping_add(1);
        id
    }

    fn release_wake_lock(&mut self) {
        if self.wake_lock.is_held() {
            self.wake_lock.release();
        }
    }

    fn watchdog_duration(&self) -> Duration {
        Duration::from_millis(self.config.watchdog_ms)
    }
}

#[derive(Debug)]
enum Command {
    SetEnabled {
        enabled: bool,
    },
    CountryCodeChanged {
        status: SetCountryCodeStatus,
        country_code: Option<String>,
    },
    UpdateHwEnableVote {
        tag: String,
        enabled: bool,
    },
    RegisterAdapterStateCallback {
        callback: Box<dyn AdapterStateCallback>,
    },
    UnregisterAdapterStateCallback {
        id: CallbackId,
    },
    AddInitializationFailureListener {
        listener: Box<dyn InitializationFailureListener>,
    },
    RemoveInitializationFailureListener {
        id: CallbackId,
    },
    RegisterVendorExtensionCallback {
        callback: Box<dyn VendorUciCallback>,
    },
    UnregisterVendorExtensionCallback,
    OpenRanging {
        identity: String,
        handle: SessionHandle,
        params: Bundle,
        callback: Box<dyn RangingCallback>,
        chip_id: Option<ChipId>,
    },
    StartRanging {
        handle: SessionHandle,
        params: Option<Bundle>,
    },
    Reconfigure {
        handle: SessionHandle,
        params: Bundle,
    },
    Pause {
        handle: SessionHandle,
        params: Bundle,
    },
    Resume {
        handle: SessionHandle,
        params: Bundle,
    },
    AddControlee {
        handle: SessionHandle,
        params: Bundle,
    },
    RemoveControlee {
        handle: SessionHandle,
        params: Bundle,
    },
    StopRanging {
        handle: SessionHandle,
    },
    CloseRanging {
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
    SendVendorUciMessage {
        mt: MessageType,
        gid: u32,
        oid: u32,
        payload: Vec<u8>,
        chip_id: Option<ChipId>,
    },
    GetSpecificationParams {
        chip_id: Option<ChipId>,
    },
}

#[derive(Debug)]
enum Response {
    Null,
    CallbackId(CallbackId),
    MaxDataSize(u16),
    StatusCode(StatusCode),
    SpecificationParams(Box<GenericSpecificationParams>),
}
type ResponseSender = oneshot::Sender<Result<Response>>;
