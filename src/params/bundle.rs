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

//! This module defines the key-value bundle in which the clients exchange the protocol parameters
//! with the service. Every bundle embeds the protocol name and the schema version it is written
//! with.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use num_traits::FromPrimitive;

use crate::error::DecodeError;

/// The key of the protocol name stored in every bundle.
pub const KEY_PROTOCOL_NAME: &str = "protocol_name";
/// The key of the schema version stored in every bundle.
pub const KEY_BUNDLE_VERSION: &str = "bundle_version";

/// A typed value stored in a Bundle.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleValue {
    Int(i32),
    Long(i64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    StringArray(Vec<String>),
}

/// The ordered key-value container of the parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    values: BTreeMap<String, BundleValue>,
}

macro_rules! bundle_accessors {
    ($put:ident, $get:ident, $variant:ident, $ty:ty) => {
        /// Store the value under the key.
        pub fn $put(&mut self, key: &str, value: $ty) -> &mut Self {
            self.values.insert(key.to_string(), BundleValue::$variant(value));
            self
        }

        /// Read the value stored under the key.
        pub fn $get(&self, key: &str) -> Result<$ty, DecodeError> {
            match self.values.get(key) {
                Some(BundleValue::$variant(value)) => Ok(value.clone()),
                Some(_) => Err(DecodeError::InvalidValue { key: key.to_string() }),
                None => Err(DecodeError::MissingKey(key.to_string())),
            }
        }
    };
}

impl Bundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Default::default()
    }

    /// Create the bundle with the protocol name and the schema version.
    pub fn with_header(protocol: ProtocolName, bundle_version: i32) -> Self {
        let mut bundle = Self::new();
        bundle
            .put_string(KEY_PROTOCOL_NAME, protocol.to_string())
            .put_int(KEY_BUNDLE_VERSION, bundle_version);
        bundle
    }

    bundle_accessors!(put_int, get_int, Int, i32);
    bundle_accessors!(put_long, get_long, Long, i64);
    bundle_accessors!(put_bool, get_bool, Bool, bool);
    bundle_accessors!(put_string, get_string, String, String);
    bundle_accessors!(put_bytes, get_bytes, Bytes, Vec<u8>);
    bundle_accessors!(put_int_array, get_int_array, IntArray, Vec<i32>);
    bundle_accessors!(put_long_array, get_long_array, LongArray, Vec<i64>);
    bundle_accessors!(put_string_array, get_string_array, StringArray, Vec<String>);

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bundle is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read an optional value. A missing key yields None, a value of the wrong type is an error.
    pub fn get_opt<T>(
        &self,
        key: &str,
        getter: impl Fn(&Self, &str) -> Result<T, DecodeError>,
    ) -> Result<Option<T>, DecodeError> {
        if self.contains_key(key) {
            getter(self, key).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read an int value and convert it into the enum type.
    pub fn get_enum<T: FromPrimitive>(&self, key: &str) -> Result<T, DecodeError> {
        let value = self.get_int(key)?;
        T::from_i32(value).ok_or_else(|| DecodeError::InvalidValue { key: key.to_string() })
    }

    /// Read an int value and check it fits into an unsigned integer type.
    pub fn get_uint<T: TryFrom<i64>>(&self, key: &str) -> Result<T, DecodeError> {
        let value = match self.values.get(key) {
            Some(BundleValue::Int(value)) => *value as i64,
            Some(BundleValue::Long(value)) => *value,
            Some(_) => return Err(DecodeError::InvalidValue { key: key.to_string() }),
            None => return Err(DecodeError::MissingKey(key.to_string())),
        };
        T::try_from(value).map_err(|_| DecodeError::InvalidValue { key: key.to_string() })
    }

    /// Read the protocol name of the bundle.
    pub fn protocol_name(&self) -> Result<ProtocolName, DecodeError> {
        self.get_string(KEY_PROTOCOL_NAME)?
            .parse()
            .map_err(|_| DecodeError::InvalidValue { key: KEY_PROTOCOL_NAME.to_string() })
    }

    /// Read the schema version of the bundle.
    pub fn bundle_version(&self) -> Result<i32, DecodeError> {
        self.get_int(KEY_BUNDLE_VERSION)
    }

    /// Check the bundle is written for the protocol with one of the supported versions.
    pub fn check_header(
        &self,
        protocol: ProtocolName,
        supported_versions: &[i32],
    ) -> Result<i32, DecodeError> {
        if self.protocol_name()? != protocol {
            return Err(DecodeError::InvalidValue { key: KEY_PROTOCOL_NAME.to_string() });
        }
        let version = self.bundle_version()?;
        if !supported_versions.contains(&version) {
            return Err(DecodeError::InvalidBundleVersion(version));
        }
        Ok(version)
    }

    /// Copy all the entries of the other bundle, with the keys prefixed by "<prefix>.".
    pub fn put_nested(&mut self, prefix: &str, other: &Bundle) -> &mut Self {
        for (key, value) in other.values.iter() {
            self.values.insert(format!("{}.{}", prefix, key), value.clone());
        }
        self
    }

    /// Extract the entries put by `put_nested()` with the prefix.
    pub fn get_nested(&self, prefix: &str) -> Option<Bundle> {
        let prefix = format!("{}.", prefix);
        let values: BTreeMap<_, _> = self
            .values
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix).map(|key| (key.to_string(), value.clone()))
            })
            .collect();
        (!values.is_empty()).then_some(Bundle { values })
    }
}

/// The UWB protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolName {
    /// FiRa Consortium ranging.
    Fira,
    /// CCC digital key ranging.
    Ccc,
    /// Aliro access control ranging.
    Aliro,
    /// UWB radar.
    Radar,
}

impl fmt::Display for ProtocolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fira => "fira",
            Self::Ccc => "ccc",
            Self::Aliro => "aliro",
            Self::Radar => "radar",
        };
        f.write_str(name)
    }
}

impl FromStr for ProtocolName {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fira" => Ok(Self::Fira),
            "ccc" => Ok(Self::Ccc),
            "aliro" => Ok(Self::Aliro),
            "radar" => Ok(Self::Radar),
            _ => Err(DecodeError::InvalidValue { key: KEY_PROTOCOL_NAME.to_string() }),
        }
    }
}

/// Convert an unsigned byte array into the int array used by bundles.
pub(crate) fn bytes_to_int_array(bytes: &[u8]) -> Vec<i32> {
    bytes.iter().map(|b| *b as i32).collect()
}

/// Convert an int array of a bundle back into bytes, checking each value fits.
pub(crate) fn int_array_to_bytes(key: &str, values: &[i32]) -> Result<Vec<u8>, DecodeError> {
    values
        .iter()
        .map(|v| u8::try_from(*v).map_err(|_| DecodeError::InvalidValue { key: key.to_string() }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::params::uci_packets::SessionState;

    #[test]
    fn test_put_get() {
        let mut bundle = Bundle::with_header(ProtocolName::Fira, 2);
        bundle.put_int("int", -3).put_bytes("bytes", vec![1, 2]).put_bool("flag", true);

        assert_eq!(bundle.protocol_name(), Ok(ProtocolName::Fira));
        assert_eq!(bundle.bundle_version(), Ok(2));
        assert_eq!(bundle.get_int("int"), Ok(-3));
        assert_eq!(bundle.get_bytes("bytes"), Ok(vec![1, 2]));
        assert_eq!(bundle.get_bool("flag"), Ok(true));
        assert_eq!(bundle.len(), 5);
    }

    #[test]
    fn test_missing_and_mismatched_values() {
        let mut bundle = Bundle::new();
        bundle.put_string("name", "x".to_string()).put_int("negative", -1);

        assert_eq!(bundle.get_int("none"), Err(DecodeError::MissingKey("none".to_string())));
        assert_eq!(
            bundle.get_int("name"),
            Err(DecodeError::InvalidValue { key: "name".to_string() })
        );
        assert_eq!(bundle.get_opt("none", Bundle::get_int), Ok(None));
        assert_eq!(
            bundle.get_uint::<u8>("negative"),
            Err(DecodeError::InvalidValue { key: "negative".to_string() })
        );
    }

    #[test]
    fn test_get_enum() {
        let mut bundle = Bundle::new();
        bundle.put_int("state", 2).put_int("bad", 9);
        assert_eq!(bundle.get_enum::<SessionState>("state"), Ok(SessionState::SessionStateActive));
        assert!(bundle.get_enum::<SessionState>("bad").is_err());
    }

    #[test]
    fn test_check_header() {
        let bundle = Bundle::with_header(ProtocolName::Ccc, 1);
        assert_eq!(bundle.check_header(ProtocolName::Ccc, &[1]), Ok(1));
        assert_eq!(
            bundle.check_header(ProtocolName::Ccc, &[2]),
            Err(DecodeError::InvalidBundleVersion(1))
        );
        assert!(bundle.check_header(ProtocolName::Fira, &[1]).is_err());
    }

    #[test]
    fn test_protocol_name() {
        for protocol in
            [ProtocolName::Fira, ProtocolName::Ccc, ProtocolName::Aliro, ProtocolName::Radar]
        {
            assert_eq!(protocol.to_string().parse::<ProtocolName>(), Ok(protocol));
        }
        assert!("uwb".parse::<ProtocolName>().is_err());
    }

    #[test]
    fn test_nested() {
        let mut inner = Bundle::with_header(ProtocolName::Radar, 1);
        inner.put_bool("flag", true);
        let mut outer = Bundle::new();
        outer.put_int("version", 1).put_nested("radar", &inner);

        assert_eq!(outer.get_bool("radar.flag"), Ok(true));
        assert_eq!(outer.get_nested("radar"), Some(inner));
        assert_eq!(outer.get_nested("ccc"), None);
    }

    #[test]
    fn test_int_array_bytes() {
        assert_eq!(bytes_to_int_array(&[0, 255]), vec![0, 255]);
        assert_eq!(int_array_to_bytes("k", &[0, 255]), Ok(vec![0, 255]));
        assert!(int_array_to_bytes("k", &[256]).is_err());
    }
}
