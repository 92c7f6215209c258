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

//! This module defines the complex channel, the (RF channel, preamble code index) pair that
//! identifies the PHY configuration of a ranging session.

use crate::params::uci_packets::SessionId;
use crate::utils::fnv1a_32;

const SUPPORTED_CHANNELS: [u8; 8] = [5, 6, 8, 9, 10, 12, 13, 14];
const SUPPORTED_BPRF_PREAMBLE_INDEX: [u8; 4] = [9, 10, 11, 12];
const SUPPORTED_HPRF_PREAMBLE_INDEX: [u8; 8] = [25, 26, 27, 28, 29, 30, 31, 32];

/// The complex channel of a ranging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UwbComplexChannel {
    channel: u8,
    preamble_index: u8,
}

impl UwbComplexChannel {
    /// Create the complex channel. Return None if the channel or the preamble index is not
    /// supported.
    pub fn new(channel: u8, preamble_index: u8) -> Option<Self> {
        if !SUPPORTED_CHANNELS.contains(&channel) {
            return None;
        }
        if !SUPPORTED_BPRF_PREAMBLE_INDEX.contains(&preamble_index)
            && !SUPPORTED_HPRF_PREAMBLE_INDEX.contains(&preamble_index)
        {
            return None;
        }
        Some(Self { channel, preamble_index })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn preamble_index(&self) -> u8 {
        self.preamble_index
    }

    /// Whether the preamble belongs to the higher pulse repetition frequency set.
    pub fn is_hprf(&self) -> bool {
        SUPPORTED_HPRF_PREAMBLE_INDEX.contains(&self.preamble_index)
    }

    /// Encode the complex channel into one byte:
    /// bits 4-6 channel position, bits 1-3 preamble position, bit 0 PRF (1 for HPRF).
    pub fn encode(&self) -> u8 {
        let channel_position = position(&SUPPORTED_CHANNELS, self.channel);
        let (preamble_position, prf) = if self.is_hprf() {
            (position(&SUPPORTED_HPRF_PREAMBLE_INDEX, self.preamble_index), 1)
        } else {
            (position(&SUPPORTED_BPRF_PREAMBLE_INDEX, self.preamble_index), 0)
        };
        (channel_position << 4) | (preamble_position << 1) | prf
    }

    /// Decode the byte produced by encode().
    pub fn decode(value: u8) -> Option<Self> {
        let channel = *SUPPORTED_CHANNELS.get(((value >> 4) & 0x07) as usize)?;
        let preamble_position = ((value >> 1) & 0x07) as usize;
        let preamble_index = if value & 0x01 == 1 {
            *SUPPORTED_HPRF_PREAMBLE_INDEX.get(preamble_position)?
        } else {
            *SUPPORTED_BPRF_PREAMBLE_INDEX.get(preamble_position)?
        };
        Self::new(channel, preamble_index)
    }
}

// Both arrays are searched only with members validated in new().
fn position(values: &[u8], value: u8) -> u8 {
    values.iter().position(|v| *v == value).unwrap_or_default() as u8
}

/// Derive the session id of a controller session from its MAC address and complex channel, so
/// that both ends of an out-of-band negotiated session agree on the id.
pub fn hashed_session_id(device_address: &[u8], complex_channel: &UwbComplexChannel) -> SessionId {
    let mut bytes = device_address.to_vec();
    bytes.push(complex_channel.encode());
    fnv1a_32(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        assert!(UwbComplexChannel::new(9, 10).is_some());
        assert!(UwbComplexChannel::new(9, 30).is_some());
        assert!(UwbComplexChannel::new(7, 10).is_none());
        assert!(UwbComplexChannel::new(9, 13).is_none());
    }

    #[test]
    fn test_encode_decode() {
        let channel = UwbComplexChannel::new(9, 11).unwrap();
        // channel 9 is at position 3, preamble 11 at position 2.
        assert_eq!(channel.encode(), 0b0011_0100);
        assert_eq!(UwbComplexChannel::decode(channel.encode()), Some(channel));

        let hprf_channel = UwbComplexChannel::new(14, 32).unwrap();
        assert!(hprf_channel.is_hprf());
        assert_eq!(hprf_channel.encode(), 0b0111_1111);
        assert_eq!(UwbComplexChannel::decode(hprf_channel.encode()), Some(hprf_channel));

        // BPRF has only 4 preambles.
        assert_eq!(UwbComplexChannel::decode(0b0011_1000), None);
    }

    #[test]
    fn test_hashed_session_id() {
        let channel = UwbComplexChannel::new(9, 11).unwrap();
        let other_channel = UwbComplexChannel::new(5, 11).unwrap();
        let id = hashed_session_id(&[0x01, 0x02], &channel);

        assert_eq!(id, hashed_session_id(&[0x01, 0x02], &channel));
        assert_ne!(id, hashed_session_id(&[0x02, 0x01], &channel));
        assert_ne!(id, hashed_session_id(&[0x01, 0x02], &other_channel));
    }
}
