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

#![allow(missing_docs)]

use std::collections::BTreeMap;

use log::{error, warn};

use crate::caps::TlvBuffer;
use crate::error::{Error, Result};
use crate::params::aliro_app_config_params::{AliroAppConfigParams, AliroAppConfigParamsBuilder};
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::ccc_app_config_params::{
    CccAppConfigParams, CccAppConfigParamsBuilder, CccReconfigureParams,
};
use crate::params::fira_app_config_params::FiraAppConfigParams;
use crate::params::fira_reconfigure_params::FiraReconfigureParams;
use crate::params::radar_app_config_params::RadarAppConfigParams;
use crate::params::uci_packets::{AppConfigTlvType, SessionId, SessionState, SessionType};

/// The app config TLVs keyed by the tag. The ordered map keeps the encoded TLV stream
/// deterministic.
pub type AppConfigTlvMap = BTreeMap<AppConfigTlvType, Vec<u8>>;

/// The application configuration parameters of the UWB session. It is used to generate the
/// parameters for the SESSION_SET_APP_CONFIG_CMD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppConfigParams {
    Fira(FiraAppConfigParams),
    Ccc(CccAppConfigParams),
    Aliro(AliroAppConfigParams),
    Radar(RadarAppConfigParams),
}

impl AppConfigParams {
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::Fira(params) => *params.session_id(),
            Self::Ccc(params) => *params.session_id(),
            Self::Aliro(params) => params.session_id(),
            Self::Radar(params) => *params.session_id(),
        }
    }

    /// The session type sent with the SESSION_INIT_CMD.
    pub fn session_type(&self) -> SessionType {
        match self {
            Self::Fira(params) => *params.session_type(),
            Self::Ccc(_) => SessionType::Ccc,
            Self::Aliro(_) => SessionType::Aliro,
            Self::Radar(_) => SessionType::RadarSession,
        }
    }

    pub fn protocol_name(&self) -> ProtocolName {
        match self {
            Self::Fira(_) => ProtocolName::Fira,
            Self::Ccc(_) => ProtocolName::Ccc,
            Self::Aliro(_) => ProtocolName::Aliro,
            Self::Radar(_) => ProtocolName::Radar,
        }
    }

    /// Generate the TLVs from the params.
    pub fn generate_tlv_buffer(&self) -> TlvBuffer {
        match self {
            Self::Radar(params) => params.generate_tlv_buffer(),
            _ => Self::config_map_to_tlv_buffer(&self.generate_config_map()),
        }
    }

    /// Generate the updated TLVs from the difference between this and the previous params.
    pub fn generate_updated_tlv_buffer(
        &self,
        prev_params: &Self,
        session_state: SessionState,
    ) -> Option<TlvBuffer> {
        Some(Self::config_map_to_tlv_buffer(
            &self.generate_updated_config_map(prev_params, session_state)?,
        ))
    }

    pub fn config_map_to_tlv_buffer(config_map: &AppConfigTlvMap) -> TlvBuffer {
        let mut tlvs = TlvBuffer::new();
        for (cfg_id, value) in config_map.iter() {
            tlvs.put_byte_array(*cfg_id as u8, value.clone());
        }
        tlvs
    }

    pub(super) fn generate_config_map(&self) -> AppConfigTlvMap {
        match self {
            Self::Fira(params) => params.generate_config_map(),
            Self::Ccc(params) => params.generate_config_map(),
            Self::Aliro(params) => params.generate_config_map(),
            Self::Radar(_) => BTreeMap::new(),
        }
    }

    pub(super) fn generate_updated_config_map(
        &self,
        prev_params: &Self,
        session_state: SessionState,
    ) -> Option<AppConfigTlvMap> {
        let config_map = self.generate_config_map();
        let prev_config_map = prev_params.generate_config_map();

        match (self, prev_params) {
            (Self::Fira(_), Self::Fira(_)) => {
                let updated_config_map = Self::diff_config_map(config_map, prev_config_map);
                if FiraAppConfigParams::is_config_updatable(&updated_config_map, session_state) {
                    Some(updated_config_map)
                } else {
                    None
                }
            }
            (Self::Ccc(_), Self::Ccc(_)) => {
                let updated_config_map = Self::diff_config_map(config_map, prev_config_map);
                if CccAppConfigParams::is_config_updatable(&updated_config_map, session_state) {
                    Some(updated_config_map)
                } else {
                    None
                }
            }
            (Self::Aliro(_), Self::Aliro(_)) => {
                let updated_config_map = Self::diff_config_map(config_map, prev_config_map);
                if AliroAppConfigParams::is_config_updatable(&updated_config_map, session_state) {
                    Some(updated_config_map)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn is_type_matched(&self, session_type: SessionType) -> bool {
        match self {
            Self::Fira(_) => {
                session_type == SessionType::FiraDataTransferSession
                    || session_type == SessionType::FiraRangingSession
                    || session_type == SessionType::FiraRangingAndInBandDataSession
                    || session_type == SessionType::FiraRangingOnlyPhase
                    || session_type == SessionType::FiraInBandDataPhase
                    || session_type == SessionType::FiraRangingWithDataPhase
            }
            Self::Ccc(_) => session_type == SessionType::Ccc,
            Self::Aliro(_) => session_type == SessionType::Aliro,
            Self::Radar(_) => session_type == SessionType::RadarSession,
        }
    }

    /// Build the params of a CCC or Aliro session with the reconfigured fields applied.
    pub fn apply_reconfigure(&self, reconfigure: &CccReconfigureParams) -> Option<Self> {
        match self {
            Self::Ccc(_) => {
                if reconfigure.range_data_ntf_config.is_some() {
                    warn!("range_data_ntf_config is not reconfigurable for the CCC session");
                    return None;
                }
                let mut builder = CccAppConfigParamsBuilder::from_params(self)?;
                if let Some(ran_multiplier) = reconfigure.ran_multiplier {
                    builder.ran_multiplier(ran_multiplier);
                }
                builder.build()
            }
            Self::Aliro(_) => {
                let mut builder = AliroAppConfigParamsBuilder::from_params(self)?;
                if let Some(ran_multiplier) = reconfigure.ran_multiplier {
                    builder.base().ran_multiplier(ran_multiplier);
                }
                if let Some(config) = reconfigure.range_data_ntf_config {
                    builder.range_data_ntf_config(config);
                }
                builder.build()
            }
            _ => None,
        }
    }

    pub fn to_bundle(&self) -> Bundle {
        match self {
            Self::Fira(params) => params.to_bundle(),
            Self::Ccc(params) => params.to_bundle(),
            Self::Aliro(params) => params.to_bundle(),
            Self::Radar(params) => params.to_bundle(),
        }
    }

    /// Read the params from the bundle of any protocol.
    pub fn from_bundle(bundle: &Bundle) -> Result<Self> {
        let protocol = bundle.protocol_name().map_err(|e| {
            error!("Failed to read the protocol name of the bundle: {:?}", e);
            Error::IllegalArgument
        })?;
        match protocol {
            ProtocolName::Fira => FiraAppConfigParams::from_bundle(bundle),
            ProtocolName::Ccc => CccAppConfigParams::from_bundle(bundle),
            ProtocolName::Aliro => AliroAppConfigParams::from_bundle(bundle),
            ProtocolName::Radar => RadarAppConfigParams::from_bundle(bundle),
        }
    }

    fn diff_config_map(
        config_map: AppConfigTlvMap,
        prev_config_map: AppConfigTlvMap,
    ) -> AppConfigTlvMap {
        let mut updated_config_map = BTreeMap::new();
        for (key, value) in config_map.into_iter() {
            if !matches!(prev_config_map.get(&key), Some(prev_value) if prev_value == &value) {
                updated_config_map.insert(key, value);
            }
        }
        updated_config_map
    }
}

/// The parameters of a reconfigure request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconfigureParams {
    Fira(FiraReconfigureParams),
    /// Used by both the CCC and the Aliro sessions.
    Ccc(CccReconfigureParams),
}

impl ReconfigureParams {
    pub fn from_bundle(bundle: &Bundle) -> Result<Self> {
        let protocol = bundle.protocol_name().map_err(|_| Error::IllegalArgument)?;
        match protocol {
            ProtocolName::Fira => Ok(Self::Fira(FiraReconfigureParams::from_bundle(bundle)?)),
            ProtocolName::Ccc | ProtocolName::Aliro => {
                Ok(Self::Ccc(CccReconfigureParams::from_bundle(bundle)?))
            }
            ProtocolName::Radar => {
                error!("The radar session is not reconfigurable");
                Err(Error::IllegalArgument)
            }
        }
    }
}
