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

//! This module defines the app configuration of the radar sessions. The radar sessions use their
//! own tag space instead of AppConfigTlvType.

use log::error;
use num_derive::{FromPrimitive, ToPrimitive};

use crate::caps::TlvBuffer;
use crate::error::{DecodeError, Error, Result};
use crate::params::app_config_params::AppConfigParams;
use crate::params::bundle::{Bundle, ProtocolName};
use crate::params::fira_app_config_params::{PreambleDuration, PrfMode, RframeConfig, UwbChannel};
use crate::params::uci_packets::SessionId;
use crate::params::utils::{u16_to_bytes, u32_to_bytes, validate};
use crate::utils::{builder_field, getter_field};

const RADAR_BUNDLE_VERSION: i32 = 1;

const KEY_SESSION_ID: &str = "session_id";
const KEY_BURST_PERIOD_MS: &str = "burst_period_ms";
const KEY_SWEEP_PERIOD_RSTU: &str = "sweep_period_rstu";
const KEY_SWEEPS_PER_BURST: &str = "sweeps_per_burst";
const KEY_SAMPLES_PER_SWEEP: &str = "samples_per_sweep";
const KEY_CHANNEL_NUMBER: &str = "channel_number";
const KEY_SWEEP_OFFSET: &str = "sweep_offset";
const KEY_RFRAME_CONFIG: &str = "rframe_config";
const KEY_PREAMBLE_DURATION: &str = "preamble_duration";
const KEY_PREAMBLE_CODE_INDEX: &str = "preamble_code_index";
const KEY_SESSION_PRIORITY: &str = "session_priority";
const KEY_BITS_PER_SAMPLE: &str = "bits_per_sample";
const KEY_PRF_MODE: &str = "prf_mode";
const KEY_NUMBER_OF_BURSTS: &str = "number_of_bursts";
const KEY_RADAR_DATA_TYPE: &str = "radar_data_type";

const DEFAULT_TIMING_PARAMS: RadarTimingParams =
    RadarTimingParams { burst_period_ms: 1000, sweep_period_rstu: 1200, sweeps_per_burst: 64 };
const DEFAULT_SAMPLES_PER_SWEEP: u8 = 64;
const DEFAULT_CHANNEL_NUMBER: UwbChannel = UwbChannel::Channel9;
const DEFAULT_SWEEP_OFFSET: u16 = 0;
const DEFAULT_RFRAME_CONFIG: RframeConfig = RframeConfig::SP3;
const DEFAULT_PREAMBLE_DURATION: PreambleDuration = PreambleDuration::T64Symbols;
const DEFAULT_PREAMBLE_CODE_INDEX: u8 = 10;
const DEFAULT_SESSION_PRIORITY: u8 = 50;
const DEFAULT_BITS_PER_SAMPLE: BitsPerSample = BitsPerSample::Value32;
const DEFAULT_PRF_MODE: PrfMode = PrfMode::Bprf;
// Zero means the bursts continue until the session stops.
const DEFAULT_NUMBER_OF_BURSTS: u16 = 0;
const DEFAULT_RADAR_DATA_TYPE: RadarDataType = RadarDataType::RadarSweepSamples;

/// The tags of the radar app configuration.
#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, FromPrimitive, ToPrimitive)]
pub enum RadarConfigTlvType {
    RadarTimingParams = 0x0,
    SamplesPerSweep = 0x1,
    ChannelNumber = 0x2,
    SweepOffset = 0x3,
    RframeConfig = 0x4,
    PreambleDuration = 0x5,
    PreambleCodeIndex = 0x6,
    SessionPriority = 0x7,
    BitsPerSample = 0x8,
    PrfMode = 0x9,
    NumberOfBursts = 0xA,
    RadarDataType = 0xB,
}

/// The timing of the radar bursts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarTimingParams {
    /// The period between the bursts.
    pub burst_period_ms: u32,
    /// The period between the sweeps inside one burst.
    pub sweep_period_rstu: u16,
    /// The number of sweeps in one burst.
    pub sweeps_per_burst: u8,
}

impl From<&RadarTimingParams> for Vec<u8> {
    fn from(item: &RadarTimingParams) -> Self {
        let mut bytes = u32_to_bytes(item.burst_period_ms);
        bytes.extend(u16_to_bytes(item.sweep_period_rstu));
        bytes.push(item.sweeps_per_burst);
        bytes
    }
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum BitsPerSample {
    Value32 = 0,
    Value48 = 1,
    Value64 = 2,
}

#[allow(missing_docs)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RadarDataType {
    RadarSweepSamples = 0,
}

/// The app configuration of a radar session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarAppConfigParams {
    session_id: SessionId,
    timing_params: RadarTimingParams,
    samples_per_sweep: u8,
    channel_number: UwbChannel,
    sweep_offset: u16,
    rframe_config: RframeConfig,
    preamble_duration: PreambleDuration,
    preamble_code_index: u8,
    session_priority: u8,
    bits_per_sample: BitsPerSample,
    prf_mode: PrfMode,
    number_of_bursts: u16,
    radar_data_type: RadarDataType,
}

#[allow(missing_docs)]
impl RadarAppConfigParams {
    getter_field!(session_id, SessionId);
    getter_field!(timing_params, RadarTimingParams);
    getter_field!(samples_per_sweep, u8);
    getter_field!(channel_number, UwbChannel);
    getter_field!(sweep_offset, u16);
    getter_field!(rframe_config, RframeConfig);
    getter_field!(preamble_duration, PreambleDuration);
    getter_field!(preamble_code_index, u8);
    getter_field!(session_priority, u8);
    getter_field!(bits_per_sample, BitsPerSample);
    getter_field!(prf_mode, PrfMode);
    getter_field!(number_of_bursts, u16);
    getter_field!(radar_data_type, RadarDataType);

    /// Generate the radar TLVs.
    pub fn generate_tlv_buffer(&self) -> TlvBuffer {
        let mut tlvs = TlvBuffer::new();
        tlvs.put_byte_array(
            RadarConfigTlvType::RadarTimingParams as u8,
            Vec::from(&self.timing_params),
        )
        .put_byte(RadarConfigTlvType::SamplesPerSweep as u8, self.samples_per_sweep)
        .put_byte(RadarConfigTlvType::ChannelNumber as u8, self.channel_number as u8)
        .put_short(RadarConfigTlvType::SweepOffset as u8, self.sweep_offset)
        .put_byte(RadarConfigTlvType::RframeConfig as u8, self.rframe_config as u8)
        .put_byte(RadarConfigTlvType::PreambleDuration as u8, self.preamble_duration as u8)
        .put_byte(RadarConfigTlvType::PreambleCodeIndex as u8, self.preamble_code_index)
        .put_byte(RadarConfigTlvType::SessionPriority as u8, self.session_priority)
        .put_byte(RadarConfigTlvType::BitsPerSample as u8, self.bits_per_sample as u8)
        .put_byte(RadarConfigTlvType::PrfMode as u8, self.prf_mode as u8)
        .put_short(RadarConfigTlvType::NumberOfBursts as u8, self.number_of_bursts)
        .put_byte(RadarConfigTlvType::RadarDataType as u8, self.radar_data_type as u8);
        tlvs
    }

    pub fn to_bundle(&self) -> Bundle {
        let mut bundle = Bundle::with_header(ProtocolName::Radar, RADAR_BUNDLE_VERSION);
        bundle
            .put_long(KEY_SESSION_ID, self.session_id as i64)
            .put_long(KEY_BURST_PERIOD_MS, self.timing_params.burst_period_ms as i64)
            .put_int(KEY_SWEEP_PERIOD_RSTU, self.timing_params.sweep_period_rstu as i32)
            .put_int(KEY_SWEEPS_PER_BURST, self.timing_params.sweeps_per_burst as i32)
            .put_int(KEY_SAMPLES_PER_SWEEP, self.samples_per_sweep as i32)
            .put_int(KEY_CHANNEL_NUMBER, self.channel_number as i32)
            .put_int(KEY_SWEEP_OFFSET, self.sweep_offset as i32)
            .put_int(KEY_RFRAME_CONFIG, self.rframe_config as i32)
            .put_int(KEY_PREAMBLE_DURATION, self.preamble_duration as i32)
            .put_int(KEY_PREAMBLE_CODE_INDEX, self.preamble_code_index as i32)
            .put_int(KEY_SESSION_PRIORITY, self.session_priority as i32)
            .put_int(KEY_BITS_PER_SAMPLE, self.bits_per_sample as i32)
            .put_int(KEY_PRF_MODE, self.prf_mode as i32)
            .put_int(KEY_NUMBER_OF_BURSTS, self.number_of_bursts as i32)
            .put_int(KEY_RADAR_DATA_TYPE, self.radar_data_type as i32);
        bundle
    }

    pub fn from_bundle(bundle: &Bundle) -> Result<AppConfigParams> {
        bundle.check_header(ProtocolName::Radar, &[RADAR_BUNDLE_VERSION])?;
        Self::read_bundle(bundle)?.build().ok_or_else(|| {
            error!("The radar bundle contains invalid parameters");
            Error::IllegalArgument
        })
    }

    fn read_bundle(
        bundle: &Bundle,
    ) -> std::result::Result<RadarAppConfigParamsBuilder, DecodeError> {
        let mut builder = RadarAppConfigParamsBuilder::new();
        builder.session_id(bundle.get_uint(KEY_SESSION_ID)?);

        let mut timing_params = DEFAULT_TIMING_PARAMS;
        if let Some(v) = bundle.get_opt(KEY_BURST_PERIOD_MS, Bundle::get_uint)? {
            timing_params.burst_period_ms = v;
        }
        if let Some(v) = bundle.get_opt(KEY_SWEEP_PERIOD_RSTU, Bundle::get_uint)? {
            timing_params.sweep_period_rstu = v;
        }
        if let Some(v) = bundle.get_opt(KEY_SWEEPS_PER_BURST, Bundle::get_uint)? {
            timing_params.sweeps_per_burst = v;
        }
        builder.timing_params(timing_params);

        if let Some(v) = bundle.get_opt(KEY_SAMPLES_PER_SWEEP, Bundle::get_uint)? {
            builder.samples_per_sweep(v);
        }
        if let Some(v) = bundle.get_opt(KEY_CHANNEL_NUMBER, Bundle::get_enum)? {
            builder.channel_number(v);
        }
        if let Some(v) = bundle.get_opt(KEY_SWEEP_OFFSET, Bundle::get_uint)? {
            builder.sweep_offset(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RFRAME_CONFIG, Bundle::get_enum)? {
            builder.rframe_config(v);
        }
        if let Some(v) = bundle.get_opt(KEY_PREAMBLE_DURATION, Bundle::get_enum)? {
            builder.preamble_duration(v);
        }
        if let Some(v) = bundle.get_opt(KEY_PREAMBLE_CODE_INDEX, Bundle::get_uint)? {
            builder.preamble_code_index(v);
        }
        if let Some(v) = bundle.get_opt(KEY_SESSION_PRIORITY, Bundle::get_uint)? {
            builder.session_priority(v);
        }
        if let Some(v) = bundle.get_opt(KEY_BITS_PER_SAMPLE, Bundle::get_enum)? {
            builder.bits_per_sample(v);
        }
        if let Some(v) = bundle.get_opt(KEY_PRF_MODE, Bundle::get_enum)? {
            builder.prf_mode(v);
        }
        if let Some(v) = bundle.get_opt(KEY_NUMBER_OF_BURSTS, Bundle::get_uint)? {
            builder.number_of_bursts(v);
        }
        if let Some(v) = bundle.get_opt(KEY_RADAR_DATA_TYPE, Bundle::get_enum)? {
            builder.radar_data_type(v);
        }
        Ok(builder)
    }

    fn is_valid(&self) -> Option<()> {
        validate(self.samples_per_sweep > 0, "samples_per_sweep should be positive")?;
        validate(self.timing_params.sweeps_per_burst > 0, "sweeps_per_burst should be positive")?;
        let preamble_range = match self.prf_mode {
            PrfMode::Bprf => 9..=12,
            _ => 25..=32,
        };
        validate(
            preamble_range.contains(&self.preamble_code_index),
            "preamble_code_index doesn't match with prf_mode",
        )?;
        validate(
            (1..=100).contains(&self.session_priority),
            "session_priority should be between 1 to 100",
        )
    }
}

/// The builder of the RadarAppConfigParams.
pub struct RadarAppConfigParamsBuilder {
    session_id: Option<SessionId>,
    timing_params: RadarTimingParams,
    samples_per_sweep: u8,
    channel_number: UwbChannel,
    sweep_offset: u16,
    rframe_config: RframeConfig,
    preamble_duration: PreambleDuration,
    preamble_code_index: u8,
    session_priority: u8,
    bits_per_sample: BitsPerSample,
    prf_mode: PrfMode,
    number_of_bursts: u16,
    radar_data_type: RadarDataType,
}

#[allow(clippy::new_without_default)]
#[allow(missing_docs)]
impl RadarAppConfigParamsBuilder {
    pub fn new() -> Self {
        Self {
            session_id: None,
            timing_params: DEFAULT_TIMING_PARAMS,
            samples_per_sweep: DEFAULT_SAMPLES_PER_SWEEP,
            channel_number: DEFAULT_CHANNEL_NUMBER,
            sweep_offset: DEFAULT_SWEEP_OFFSET,
            rframe_config: DEFAULT_RFRAME_CONFIG,
            preamble_duration: DEFAULT_PREAMBLE_DURATION,
            preamble_code_index: DEFAULT_PREAMBLE_CODE_INDEX,
            session_priority: DEFAULT_SESSION_PRIORITY,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            prf_mode: DEFAULT_PRF_MODE,
            number_of_bursts: DEFAULT_NUMBER_OF_BURSTS,
            radar_data_type: DEFAULT_RADAR_DATA_TYPE,
        }
    }

    pub fn build(&self) -> Option<AppConfigParams> {
        let params = RadarAppConfigParams {
            session_id: self.session_id?,
            timing_params: self.timing_params.clone(),
            samples_per_sweep: self.samples_per_sweep,
            channel_number: self.channel_number,
            sweep_offset: self.sweep_offset,
            rframe_config: self.rframe_config,
            preamble_duration: self.preamble_duration,
            preamble_code_index: self.preamble_code_index,
            session_priority: self.session_priority,
            bits_per_sample: self.bits_per_sample,
            prf_mode: self.prf_mode,
            number_of_bursts: self.number_of_bursts,
            radar_data_type: self.radar_data_type,
        };
        params.is_valid()?;
        Some(AppConfigParams::Radar(params))
    }

    builder_field!(session_id, SessionId, Some);
    builder_field!(timing_params, RadarTimingParams);
    builder_field!(samples_per_sweep, u8);
    builder_field!(channel_number, UwbChannel);
    builder_field!(sweep_offset, u16);
    builder_field!(rframe_config, RframeConfig);
    builder_field!(preamble_duration, PreambleDuration);
    builder_field!(preamble_code_index, u8);
    builder_field!(session_priority, u8);
    builder_field!(bits_per_sample, BitsPerSample);
    builder_field!(prf_mode, PrfMode);
    builder_field!(number_of_bursts, u16);
    builder_field!(radar_data_type, RadarDataType);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tlv_buffer() {
        let mut builder = RadarAppConfigParamsBuilder::new();
        builder.session_id(9).number_of_bursts(300);
        let params = match builder.build().unwrap() {
            AppConfigParams::Radar(params) => params,
            _ => panic!("Expected radar params"),
        };

        let tlvs = params.generate_tlv_buffer();
        assert_eq!(tlvs.len(), 12);
        assert_eq!(
            tlvs.get_byte_array(RadarConfigTlvType::RadarTimingParams as u8),
            Ok(&[0xE8, 0x03, 0, 0, 0xB0, 0x04, 64][..])
        );
        assert_eq!(tlvs.get_short(RadarConfigTlvType::NumberOfBursts as u8), Ok(300));
        assert_eq!(tlvs.get_byte(RadarConfigTlvType::ChannelNumber as u8), Ok(9));
    }

    #[test]
    fn test_bundle() {
        let mut builder = RadarAppConfigParamsBuilder::new();
        builder
            .session_id(9)
            .prf_mode(PrfMode::HprfWith124_8MHz)
            .preamble_code_index(26)
            .bits_per_sample(BitsPerSample::Value64);
        let params = builder.build().unwrap();
        assert_eq!(RadarAppConfigParams::from_bundle(&params.to_bundle()), Ok(params));

        // The HPRF preamble index doesn't match with BPRF.
        let mut bundle = Bundle::with_header(ProtocolName::Radar, RADAR_BUNDLE_VERSION);
        bundle.put_long(KEY_SESSION_ID, 9).put_int(KEY_PREAMBLE_CODE_INDEX, 26);
        assert_eq!(RadarAppConfigParams::from_bundle(&bundle), Err(Error::IllegalArgument));

        let bundle = Bundle::with_header(ProtocolName::Radar, RADAR_BUNDLE_VERSION);
        assert_eq!(
            RadarAppConfigParams::from_bundle(&bundle),
            Err(Error::DecodeFailure(DecodeError::MissingKey(KEY_SESSION_ID.to_string())))
        );
    }
}
