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

//! This module defines the error types and the result type for this library.

/// The error type for the uwb_service_core library.
#[non_exhaustive] // Adding new enum fields doesn't break the downstream build.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The operation is not allowed in the current adapter or session state.
    #[error("The operation is not allowed in the current state")]
    IllegalState,
    /// The parameter bundle is malformed or belongs to another protocol.
    #[error("Illegal argument")]
    IllegalArgument,
    /// The session id is already used by another session on the same chip.
    #[error("Duplicated session id")]
    Duplicate,
    /// The firmware failed to execute the command.
    #[error("The hardware failed to execute the command")]
    HardwareFailure,
    /// The TLV data or the parameter bundle cannot be decoded.
    #[error("Decode failure: {0}")]
    DecodeFailure(#[from] DecodeError),
    /// The current country code doesn't allow UWB.
    #[error("UWB is not allowed by the regulation of the current country")]
    RegulatoryBlocked,
    /// The response or notification is not received in timeout.
    #[error("The response or notification is not received in timeout")]
    Timeout,
    /// The unknown error.
    #[error("The unknown error")]
    Unknown,

    /// The result of the mock method is not assigned
    #[cfg(any(test, feature = "mock-utils"))]
    #[error("The result of the mock method is not assigned")]
    MockUndefined,
}

/// The error raised while encoding or decoding TLV data or parameter bundles.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The TLV with the tag is not found.
    #[error("Tag {0:#04x} is not found")]
    TagNotFound(u8),
    /// The value length of the TLV doesn't match with the requested type.
    #[error("Tag {tag:#04x} has length {actual}, expected {expected}")]
    LengthMismatch {
        /// The tag of the TLV.
        tag: u8,
        /// The expected length.
        expected: usize,
        /// The actual length.
        actual: usize,
    },
    /// The value doesn't fit in the one-byte length field of a TLV element.
    #[error("Tag {tag:#04x} has {length} bytes, more than a TLV element can carry")]
    ValueTooLong {
        /// The tag of the TLV.
        tag: u8,
        /// The length of the value.
        length: usize,
    },
    /// The TLV stream ends in the middle of an element.
    #[error("The TLV data is truncated")]
    Truncated,
    /// The version of the capability layout is not supported.
    #[error("The protocol version is not supported")]
    UnsupportedVersion,
    /// The version embedded in the bundle is not handled.
    #[error("Invalid bundle version {0}")]
    InvalidBundleVersion(i32),
    /// The bundle doesn't contain the required key.
    #[error("Missing key {0}")]
    MissingKey(String),
    /// The value stored under the key is out of range or has the wrong type.
    #[error("Invalid value of key {key}")]
    InvalidValue {
        /// The key of the value.
        key: String,
    },
}

/// The result type for the uwb_service_core library.
///
/// This type is broadly used by the methods in this library which may produce an error.
pub type Result<T> = std::result::Result<T, Error>;
