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

//! This module defines the parameters of reconfiguring a running FiRa session, including the
//! multicast list update and the pause/resume requests.

use std::collections::BTreeMap;

use log::error;

use crate::error::{Error, Result};
use crate::params::app_config_params::AppConfigTlvMap;
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::fira_app_config_params::{
    addresses_to_bytes, bytes_to_addresses, MacAddressMode, RangeDataNtfConfig, SuspendRanging,
    UwbAddress, MAX_NUMBER_OF_CONTROLEES,
};
use crate::params::uci_packets::{
    AppConfigTlvType, Controlee, SubSessionId, UpdateMulticastListAction,
};
use crate::params::utils::{u16_to_bytes, u8_to_bytes, validate};
use crate::utils::{consuming_builder_field, getter_field};

const FIRA_RECONFIGURE_BUNDLE_VERSION: i32 = 1;

const KEY_ACTION: &str = "action";
const KEY_ADDRESS_LIST: &str = "address_list";
const KEY_SUB_SESSION_ID_LIST: &str = "sub_session_id_list";
const KEY_SUB_SESSION_KEY_LIST: &str = "sub_session_key_list";
const KEY_BLOCK_STRIDE_LENGTH: &str = "block_stride_length";
const KEY_RANGE_DATA_NTF_CONFIG: &str = "range_data_ntf_config";
const KEY_RANGE_DATA_NTF_PROXIMITY_NEAR: &str = "range_data_ntf_proximity_near";
const KEY_RANGE_DATA_NTF_PROXIMITY_FAR: &str = "range_data_ntf_proximity_far";
const KEY_SUSPEND_RANGING_ROUNDS: &str = "suspend_ranging_rounds";

const SHORT_SUB_SESSION_KEY_LEN: usize = 16;
const LONG_SUB_SESSION_KEY_LEN: usize = 32;

/// The parameters to reconfigure a FiRa session. Every field is optional, only the present ones
/// are sent to the firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiraReconfigureParams {
    action: Option<UpdateMulticastListAction>,
    address_list: Option<Vec<UwbAddress>>,
    sub_session_id_list: Option<Vec<SubSessionId>>,
    sub_session_key_list: Option<Vec<Vec<u8>>>,
    block_stride_length: Option<u8>,
    range_data_ntf_config: Option<RangeDataNtfConfig>,
    range_data_ntf_proximity_near_cm: Option<u16>,
    range_data_ntf_proximity_far_cm: Option<u16>,
    suspend_ranging_rounds: Option<SuspendRanging>,
}

#[allow(missing_docs)]
impl FiraReconfigureParams {
    getter_field!(action, Option<UpdateMulticastListAction>);
    getter_field!(address_list, Option<Vec<UwbAddress>>);
    getter_field!(block_stride_length, Option<u8>);
    getter_field!(range_data_ntf_config, Option<RangeDataNtfConfig>);
    getter_field!(range_data_ntf_proximity_near_cm, Option<u16>);
    getter_field!(range_data_ntf_proximity_far_cm, Option<u16>);
    getter_field!(suspend_ranging_rounds, Option<SuspendRanging>);

    /// Create the params of a pause (`Enabled`) or resume (`Disabled`) request.
    pub fn suspend(suspend_ranging_rounds: SuspendRanging) -> Self {
        FiraReconfigureParamsBuilder::new()
            .suspend_ranging_rounds(suspend_ranging_rounds)
            .params()
    }

    /// The controlees of the multicast list update, if the action is present.
    pub fn controlees(&self) -> Option<Vec<Controlee>> {
        self.action?;
        let addresses = self.address_list.as_ref()?;
        let mut controlees = vec![];
        for (idx, address) in addresses.iter().enumerate() {
            let short_address = match address {
                UwbAddress::Short(addr) => *addr,
                UwbAddress::Extended(_) => {
                    error!("The multicast list only accepts short addresses");
                    return None;
                }
            };
            let subsession_id = self
                .sub_session_id_list
                .as_ref()
                .and_then(|ids| ids.get(idx).copied())
                .unwrap_or_default();
            let subsession_key =
                self.sub_session_key_list.as_ref().and_then(|keys| keys.get(idx).cloned());
            controlees.push(Controlee { short_address, subsession_id, subsession_key });
        }
        Some(controlees)
    }

    /// Generate the TLVs of the fields other than the multicast list update.
    pub fn generate_config_map(&self) -> AppConfigTlvMap {
        let mut config_map = BTreeMap::new();
        if let Some(value) = self.block_stride_length {
            config_map.insert(AppConfigTlvType::BlockStrideLength, u8_to_bytes(value));
        }
        if let Some(value) = self.range_data_ntf_config {
            config_map.insert(AppConfigTlvType::RngDataNtf, u8_to_bytes(value as u8));
        }
        if let Some(value) = self.range_data_ntf_proximity_near_cm {
            config_map.insert(AppConfigTlvType::RngDataNtfProximityNear, u16_to_bytes(value));
        }
        if let Some(value) = self.range_data_ntf_proximity_far_cm {
            config_map.insert(AppConfigTlvType::RngDataNtfProximityFar, u16_to_bytes(value));
        }
        if let Some(value) = self.suspend_ranging_rounds {
            config_map.insert(AppConfigTlvType::SuspendRangingRounds, u8_to_bytes(value as u8));
        }
        config_map
    }

    /// Write the params into a bundle.
    pub fn to_bundle(&self) -> Bundle {
        let mut bundle = Bundle::with_header(ProtocolName::Fira, FIRA_RECONFIGURE_BUNDLE_VERSION);
        if let Some(action) = self.action {
            bundle.put_int(KEY_ACTION, action as i32);
        }
        if let Some(addresses) = self.address_list.as_ref() {
            bundle.put_bytes(KEY_ADDRESS_LIST, addresses_to_bytes(addresses));
        }
        if let Some(ids) = self.sub_session_id_list.as_ref() {
            let ids = ids.iter().map(|id| *id as i64).collect();
            bundle.put_long_array(KEY_SUB_SESSION_ID_LIST, ids);
        }
        if let Some(keys) = self.sub_session_key_list.as_ref() {
            bundle.put_bytes(KEY_SUB_SESSION_KEY_LIST, keys.concat());
        }
        if let Some(value) = self.block_stride_length {
            bundle.put_int(KEY_BLOCK_STRIDE_LENGTH, value as i32);
        }
        if let Some(value) = self.range_data_ntf_config {
            bundle.put_int(KEY_RANGE_DATA_NTF_CONFIG, value as i32);
        }
        if let Some(value) = self.range_data_ntf_proximity_near_cm {
            bundle.put_int(KEY_RANGE_DATA_NTF_PROXIMITY_NEAR, value as i32);
        }
        if let Some(value) = self.range_data_ntf_proximity_far_cm {
            bundle.put_int(KEY_RANGE_DATA_NTF_PROXIMITY_FAR, value as i32);
        }
        if let Some(value) = self.suspend_ranging_rounds {
            bundle.put_int(KEY_SUSPEND_RANGING_ROUNDS, value as i32);
        }
        bundle
    }

    /// Read the params from a bundle.
    pub fn from_bundle(bundle: &Bundle) -> Result<Self> {
        bundle.check_header(ProtocolName::Fira, &[FIRA_RECONFIGURE_BUNDLE_VERSION])?;

        let action: Option<UpdateMulticastListAction> =
            bundle.get_opt(KEY_ACTION, Bundle::get_enum)?;
        let mut builder = FiraReconfigureParamsBuilder::new();
        if let Some(action) = action {
            builder = builder.action(action);
        }
        if let Some(bytes) = bundle.get_opt(KEY_ADDRESS_LIST, Bundle::get_bytes)? {
            let addresses = bytes_to_addresses(&bytes, MacAddressMode::MacAddress2Bytes)
                .or_else(|| bytes_to_addresses(&bytes, MacAddressMode::MacAddress8Bytes))
                .ok_or_else(|| {
                    error!("Failed to parse the address list of {} bytes", bytes.len());
                    Error::IllegalArgument
                })?;
            builder = builder.address_list(addresses);
        }
        if let Some(ids) = bundle.get_opt(KEY_SUB_SESSION_ID_LIST, Bundle::get_long_array)? {
            let ids = ids
                .into_iter()
                .map(SubSessionId::try_from)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| Error::IllegalArgument)?;
            builder = builder.sub_session_id_list(ids);
        }
        if let Some(bytes) = bundle.get_opt(KEY_SUB_SESSION_KEY_LIST, Bundle::get_bytes)? {
            let key_len = match action {
                Some(UpdateMulticastListAction::AddControleeWithLongSubSessionKey) => {
                    LONG_SUB_SESSION_KEY_LEN
                }
                _ => SHORT_SUB_SESSION_KEY_LEN,
            };
            builder = builder
                .sub_session_key_list(bytes.chunks(key_len).map(|chunk| chunk.to_vec()).collect());
        }
        if let Some(value) = bundle.get_opt(KEY_BLOCK_STRIDE_LENGTH, Bundle::get_uint)? {
            builder = builder.block_stride_length(value);
        }
        if let Some(value) = bundle.get_opt(KEY_RANGE_DATA_NTF_CONFIG, Bundle::get_enum)? {
            builder = builder.range_data_ntf_config(value);
        }
        if let Some(value) = bundle.get_opt(KEY_RANGE_DATA_NTF_PROXIMITY_NEAR, Bundle::get_uint)? {
            builder = builder.range_data_ntf_proximity_near_cm(value);
        }
        if let Some(value) = bundle.get_opt(KEY_RANGE_DATA_NTF_PROXIMITY_FAR, Bundle::get_uint)? {
            builder = builder.range_data_ntf_proximity_far_cm(value);
        }
        if let Some(value) = bundle.get_opt(KEY_SUSPEND_RANGING_ROUNDS, Bundle::get_enum)? {
            builder = builder.suspend_ranging_rounds(value);
        }
        builder.build().ok_or(Error::IllegalArgument)
    }

    fn is_valid(&self) -> Option<()> {
        if let Some(action) = self.action {
            let addresses = self.address_list.as_ref();
            validate(
                addresses.map_or(false, |list| !list.is_empty()),
                "address_list is required by the multicast list update",
            )?;
            let count = addresses.map_or(0, Vec::len);
            validate(
                count <= MAX_NUMBER_OF_CONTROLEES,
                "Number of controlees should be between 1 to 8",
            )?;
            if let Some(ids) = self.sub_session_id_list.as_ref() {
                validate(ids.len() == count, "sub_session_id_list doesn't match address_list")?;
            }
            let key_len = match action {
                UpdateMulticastListAction::AddControleeWithShortSubSessionKey => {
                    Some(SHORT_SUB_SESSION_KEY_LEN)
                }
                UpdateMulticastListAction::AddControleeWithLongSubSessionKey => {
                    Some(LONG_SUB_SESSION_KEY_LEN)
                }
                _ => None,
            };
            match (key_len, self.sub_session_key_list.as_ref()) {
                (Some(key_len), Some(keys)) => validate(
                    keys.len() == count && keys.iter().all(|key| key.len() == key_len),
                    "sub_session_key_list doesn't match the action",
                )?,
                (Some(_), None) => {
                    validate(false, "sub_session_key_list is required by the action")?
                }
                (None, _) => {}
            }
        }
        if let (Some(near), Some(far)) =
            (self.range_data_ntf_proximity_near_cm, self.range_data_ntf_proximity_far_cm)
        {
            validate(near <= far, "range_data_ntf_proximity_near_cm is greater than the far one")?;
        }
        Some(())
    }
}

/// The builder of FiraReconfigureParams.
#[derive(Default)]
pub struct FiraReconfigureParamsBuilder {
    action: Option<UpdateMulticastListAction>,
    address_list: Option<Vec<UwbAddress>>,
    sub_session_id_list: Option<Vec<SubSessionId>>,
    sub_session_key_list: Option<Vec<Vec<u8>>>,
    block_stride_length: Option<u8>,
    range_data_ntf_config: Option<RangeDataNtfConfig>,
    range_data_ntf_proximity_near_cm: Option<u16>,
    range_data_ntf_proximity_far_cm: Option<u16>,
    suspend_ranging_rounds: Option<SuspendRanging>,
}

#[allow(missing_docs)]
impl FiraReconfigureParamsBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    consuming_builder_field!(action, UpdateMulticastListAction, Some);
    consuming_builder_field!(address_list, Vec<UwbAddress>, Some);
    consuming_builder_field!(sub_session_id_list, Vec<SubSessionId>, Some);
    consuming_builder_field!(sub_session_key_list, Vec<Vec<u8>>, Some);
    consuming_builder_field!(block_stride_length, u8, Some);
    consuming_builder_field!(range_data_ntf_config, RangeDataNtfConfig, Some);
    consuming_builder_field!(range_data_ntf_proximity_near_cm, u16, Some);
    consuming_builder_field!(range_data_ntf_proximity_far_cm, u16, Some);
    consuming_builder_field!(suspend_ranging_rounds, SuspendRanging, Some);

    pub fn build(self) -> Option<FiraReconfigureParams> {
        let params = self.params();
        params.is_valid()?;
        Some(params)
    }

    fn params(self) -> FiraReconfigureParams {
        FiraReconfigureParams {
            action: self.action,
            address_list: self.address_list,
            sub_session_id_list: self.sub_session_id_list,
            sub_session_key_list: self.sub_session_key_list,
            block_stride_length: self.block_stride_length,
            range_data_ntf_config: self.range_data_ntf_config,
            range_data_ntf_proximity_near_cm: self.range_data_ntf_proximity_near_cm,
            range_data_ntf_proximity_far_cm: self.range_data_ntf_proximity_far_cm,
            suspend_ranging_rounds: self.suspend_ranging_rounds,
        }
    }
}
