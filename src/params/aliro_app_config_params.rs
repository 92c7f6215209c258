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

use log::error;

use crate::error::{Error, Result};
use crate::params::app_config_params::{AppConfigParams, AppConfigTlvMap};
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::ccc_app_config_params::{
    CccAppConfigParams, CccAppConfigParamsBuilder, CCC_BUNDLE_VERSION, CCC_RANGE_DATA_NTF_CONFIG,
    KEY_RANGE_DATA_NTF_CONFIG,
};
use crate::params::fira_app_config_params::RangeDataNtfConfig;
use crate::params::uci_packets::{AppConfigTlvType, SessionId, SessionState};
use crate::params::utils::u8_to_bytes;
use crate::utils::getter_field;

/// The Aliro session shares the CCC layout of the app config TLVs. The only difference is the range
/// data notification, which the Aliro sessions can turn on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliroAppConfigParams {
    base: CccAppConfigParams,
    range_data_ntf_config: RangeDataNtfConfig,
}

impl AliroAppConfigParams {
    getter_field!(base, CccAppConfigParams);
    getter_field!(range_data_ntf_config, RangeDataNtfConfig);

    pub fn session_id(&self) -> SessionId {
        *self.base.session_id()
    }

    pub fn is_config_updatable(config_map: &AppConfigTlvMap, session_state: SessionState) -> bool {
        match session_state {
            SessionState::SessionStateIdle => config_map.keys().all(|key| {
                key == &AppConfigTlvType::RangingDuration || key == &AppConfigTlvType::RngDataNtf
            }),
            _ => false,
        }
    }

    pub fn generate_config_map(&self) -> AppConfigTlvMap {
        let mut config_map = self.base.generate_config_map();
        config_map
            .insert(AppConfigTlvType::RngDataNtf, u8_to_bytes(self.range_data_ntf_config as u8));
        config_map
    }

    pub fn to_bundle(&self) -> Bundle {
        let mut bundle = self.base.write_bundle(ProtocolName::Aliro);
        bundle.put_int(KEY_RANGE_DATA_NTF_CONFIG, self.range_data_ntf_config as i32);
        bundle
    }

    pub fn from_bundle(bundle: &Bundle) -> Result<AppConfigParams> {
        bundle.check_header(ProtocolName::Aliro, &[CCC_BUNDLE_VERSION])?;
        let mut builder = AliroAppConfigParamsBuilder {
            base: CccAppConfigParamsBuilder::read_bundle(bundle)?,
            range_data_ntf_config: CCC_RANGE_DATA_NTF_CONFIG,
        };
        if let Some(config) = bundle.get_opt(KEY_RANGE_DATA_NTF_CONFIG, Bundle::get_enum)? {
            builder.range_data_ntf_config(config);
        }
        builder.build().ok_or_else(|| {
            error!("The Aliro bundle contains invalid parameters");
            Error::IllegalArgument
        })
    }
}

pub struct AliroAppConfigParamsBuilder {
    base: CccAppConfigParamsBuilder,
    range_data_ntf_config: RangeDataNtfConfig,
}

impl AliroAppConfigParamsBuilder {
    /// Create the builder on top of the CCC builder which holds the shared fields.
    pub fn new(base: CccAppConfigParamsBuilder) -> Self {
        Self { base, range_data_ntf_config: CCC_RANGE_DATA_NTF_CONFIG }
    }

    pub fn from_params(params: &AppConfigParams) -> Option<Self> {
        match params {
            AppConfigParams::Aliro(params) => Some(Self {
                base: CccAppConfigParamsBuilder::from_ccc_params(&params.base),
                range_data_ntf_config: params.range_data_ntf_config,
            }),
            _ => None,
        }
    }

    pub fn base(&mut self) -> &mut CccAppConfigParamsBuilder {
        &mut self.base
    }

    pub fn range_data_ntf_config(&mut self, value: RangeDataNtfConfig) -> &mut Self {
        self.range_data_ntf_config = value;
        self
    }

    pub fn build(&self) -> Option<AppConfigParams> {
        Some(AppConfigParams::Aliro(AliroAppConfigParams {
            base: self.base.build_params()?,
            range_data_ntf_config: self.range_data_ntf_config,
        }))
    }
}
