//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Protocol layer error types.
//!
//! These errors describe a message that cannot be accepted by a hub. None of
//! them is fatal: the hub logs the offending message, drops it and keeps
//! reading.
//!
//! # Error Categories
//!
//! - [`ProtocolError`]: the payload is malformed or violates the field rules
//! - [`AuthError`]: the message token does not match the shared secret
//! - [`CoercionError`]: a wire value cannot be converted to a parameter type

use thiserror::Error;

use crate::protocol::Value;
use crate::serialization::DeserializationError;

/// A message that violates the wire format or the field vocabulary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload could not be decoded by the serializer.
    #[error("malformed payload: {0}")]
    Malformed(#[from] DeserializationError),

    /// The `id` field is missing, not an integer, or negative.
    ///
    /// A message failing this check is treated as a possible injection
    /// attempt and rejected before anything else is looked at.
    #[error("invalid or missing message id (possible injection)")]
    InvalidId,

    /// The `type` field is missing or names an unknown message kind.
    #[error("unknown message type: {0:?}")]
    UnknownKind(Option<String>),

    /// A required field is missing or has the wrong shape.
    #[error("missing or invalid field `{0}`")]
    MissingField(&'static str),

    /// Incomplete input kept accumulating past the configured limit.
    #[error("incomplete frame of {size} bytes exceeds limit of {limit} bytes")]
    FrameTooLarge {
        /// Bytes buffered without forming a message
        size: usize,
        /// Configured maximum frame size
        limit: usize,
    },
}

/// A message whose token does not authenticate.
///
/// Treated exactly like a message that never arrived: no dispatch and no
/// response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// A validate token is configured but the message carries none.
    #[error("message carries no token")]
    MissingToken,

    /// The token does not match the recomputed digest.
    #[error("token mismatch")]
    Mismatch,
}

/// A wire value that cannot be converted into a declared parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found}")]
pub struct CoercionError {
    /// Declared type name
    pub expected: &'static str,
    /// Description of the value found on the wire
    pub found: String,
}

impl CoercionError {
    /// Creates an error for a value of the wrong shape.
    #[must_use]
    pub fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: found.kind().to_owned(),
        }
    }

    /// Creates an error for an integer that does not fit the target type.
    #[must_use]
    pub fn out_of_range(expected: &'static str, value: i64) -> Self {
        Self {
            expected,
            found: format!("out of range integer {value}"),
        }
    }
}
