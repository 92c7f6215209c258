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

//! This module defines the TlvBuffer, the ordered mapping from single-byte tags to raw values that
//! backs both the app configuration encoding and the capability decoding.

use std::collections::BTreeMap;

use log::{error, warn};

use crate::error::DecodeError;
use crate::params::utils::{
    bytes_to_u16, bytes_to_u32, bytes_to_u64, bytes_to_u8, u16_to_bytes, u32_to_bytes,
    u64_to_bytes, u8_to_bytes,
};

/// The ordered TLV container. Each element is serialized as tag (1 byte), length (1 byte) and the
/// value; multi-byte integers are little-endian.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvBuffer {
    entries: BTreeMap<u8, Vec<u8>>,
}

impl TlvBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Default::default()
    }

    /// Parse the serialized TLV elements. A later element with the same tag replaces the former.
    pub fn parse(mut data: &[u8]) -> Result<Self, DecodeError> {
        let mut entries = BTreeMap::new();
        while !data.is_empty() {
            let (tag, len) = match data {
                [tag, len, ..] => (*tag, *len as usize),
                _ => return Err(DecodeError::Truncated),
            };
            let value = data.get(2..2 + len).ok_or(DecodeError::Truncated)?;
            entries.insert(tag, value.to_vec());
            data = &data[2 + len..];
        }
        Ok(Self { entries })
    }

    /// Serialize the elements in ascending tag order. Fails when a value is longer than the
    /// length field can express.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        let mut bytes = Vec::new();
        for (tag, value) in self.entries.iter() {
            let length = u8::try_from(value.len()).map_err(|_| {
                error!("The value of tag {:#04x} has {} bytes", tag, value.len());
                DecodeError::ValueTooLong { tag: *tag, length: value.len() }
            })?;
            bytes.push(*tag);
            bytes.push(length);
            bytes.extend_from_slice(value);
        }
        Ok(bytes)
    }

    /// The number of the elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer has no element.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the element with the tag exists.
    pub fn contains(&self, tag: u8) -> bool {
        self.entries.contains_key(&tag)
    }

    /// The tags of all the elements, in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.keys().copied()
    }

    pub fn put_byte(&mut self, tag: u8, value: u8) -> &mut Self {
        self.put_byte_array(tag, u8_to_bytes(value))
    }

    pub fn put_short(&mut self, tag: u8, value: u16) -> &mut Self {
        self.put_byte_array(tag, u16_to_bytes(value))
    }

    pub fn put_int(&mut self, tag: u8, value: u32) -> &mut Self {
        self.put_byte_array(tag, u32_to_bytes(value))
    }

    pub fn put_long(&mut self, tag: u8, value: u64) -> &mut Self {
        self.put_byte_array(tag, u64_to_bytes(value))
    }

    pub fn put_byte_array(&mut self, tag: u8, value: Vec<u8>) -> &mut Self {
        self.entries.insert(tag, value);
        self
    }

    /// Read the raw value of the tag.
    pub fn get_byte_array(&self, tag: u8) -> Result<&[u8], DecodeError> {
        self.entries.get(&tag).map(|v| v.as_slice()).ok_or(DecodeError::TagNotFound(tag))
    }

    pub fn get_byte(&self, tag: u8) -> Result<u8, DecodeError> {
        self.get_sized(tag, 1, bytes_to_u8)
    }

    pub fn get_short(&self, tag: u8) -> Result<u16, DecodeError> {
        self.get_sized(tag, 2, bytes_to_u16)
    }

    pub fn get_int(&self, tag: u8) -> Result<u32, DecodeError> {
        self.get_sized(tag, 4, bytes_to_u32)
    }

    pub fn get_long(&self, tag: u8) -> Result<u64, DecodeError> {
        self.get_sized(tag, 8, bytes_to_u64)
    }

    fn get_sized<T>(
        &self,
        tag: u8,
        expected: usize,
        convert: fn(&[u8]) -> Option<T>,
    ) -> Result<T, DecodeError> {
        let value = self.get_byte_array(tag)?;
        convert(value).ok_or(DecodeError::LengthMismatch { tag, expected, actual: value.len() })
    }
}

/// Turn the lookup result of an optional field into an Option, logging the field when it's
/// missing or malformed.
pub fn optional<T>(result: Result<T, DecodeError>, field: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} not found: {}", field, e);
            None
        }
    }
}

/// Log the lookup failure of a required field and pass it through.
pub fn required<T>(result: Result<T, DecodeError>, field: &str) -> Result<T, DecodeError> {
    result.map_err(|e| {
        error!("Failed to read the required field {}: {}", field, e);
        e
    })
}

/// Test a capability bitmap.
pub fn is_bit_set(flags: u64, mask: u64) -> bool {
    flags & mask != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let data = [0x00, 0x01, 0x05, 0x02, 0x02, 0x34, 0x12, 0xE3, 0x00];
        let buffer = TlvBuffer::parse(&data).unwrap();

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.get_byte(0x00), Ok(0x05));
        assert_eq!(buffer.get_short(0x02), Ok(0x1234));
        assert_eq!(buffer.get_byte_array(0xE3), Ok(&[][..]));
        assert_eq!(buffer.tags().collect::<Vec<_>>(), vec![0x00, 0x02, 0xE3]);
    }

    #[test]
    fn test_parse_truncated() {
        assert_eq!(TlvBuffer::parse(&[0x00]), Err(DecodeError::Truncated));
        assert_eq!(TlvBuffer::parse(&[0x00, 0x02, 0x01]), Err(DecodeError::Truncated));
        assert_eq!(TlvBuffer::parse(&[]), Ok(TlvBuffer::new()));
    }

    #[test]
    fn test_typed_getter_errors() {
        let mut buffer = TlvBuffer::new();
        buffer.put_short(0x01, 7);

        assert_eq!(buffer.get_byte(0x02), Err(DecodeError::TagNotFound(0x02)));
        assert_eq!(
            buffer.get_int(0x01),
            Err(DecodeError::LengthMismatch { tag: 0x01, expected: 4, actual: 2 })
        );
        assert_eq!(optional(buffer.get_byte(0x02), "FIELD"), None);
        assert_eq!(optional(buffer.get_short(0x01), "FIELD"), Some(7));
    }

    #[test]
    fn test_to_bytes_sorted_by_tag() {
        let mut buffer = TlvBuffer::new();
        buffer.put_int(0x09, 0x0000_00C8).put_byte(0x00, 0x01).put_long(0xA1, 1);

        assert_eq!(
            buffer.to_bytes(),
            Ok(vec![
                0x00, 0x01, 0x01, // DEVICE_TYPE
                0x09, 0x04, 0xC8, 0x00, 0x00, 0x00, // RANGING_DURATION
                0xA1, 0x08, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // UWB_TIME0
            ])
        );
        assert_eq!(TlvBuffer::parse(&buffer.to_bytes().unwrap()), Ok(buffer));
    }

    #[test]
    fn test_to_bytes_value_too_long() {
        let mut buffer = TlvBuffer::new();
        buffer.put_byte_array(0x06, vec![0x01; 255]);
        assert_eq!(buffer.to_bytes().map(|bytes| bytes.len()), Ok(257));

        // 130 short addresses don't fit in one element.
        buffer.put_byte(0x05, 130).put_byte_array(0x07, vec![0x02; 260]);
        assert_eq!(buffer.to_bytes(), Err(DecodeError::ValueTooLong { tag: 0x07, length: 260 }));
    }

    #[test]
    fn test_is_bit_set() {
        assert!(is_bit_set(0b0101, 0b0100));
        assert!(!is_bit_set(0b0101, 0b0010));
    }
}
