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

//! Serialization trait definitions.
//!
//! This module defines the [`Serializer`] trait every wire encoding used by a
//! hub must implement.

use crate::protocol::FieldMap;
use crate::serialization::{DeserializationError, SerializationError};

/// Trait for encoding hub messages to bytes and decoding them back.
///
/// Hubs hold their serializer as `Arc<dyn Serializer>`, so the trait is
/// object safe and works on [`FieldMap`]s rather than generic values.
///
/// # Stream Decoding
///
/// The byte stream carries no length prefix. A single read may contain
/// several adjacent messages, a batch, or the front part of a message whose
/// tail has not arrived yet. [`Serializer::decode`] consumes every complete
/// message at the front of the buffer and leaves an incomplete tail in place
/// for the next read.
///
/// # Thread Safety
///
/// All serializers must be `Send + Sync + 'static` so one instance can be
/// shared by every hub of a server.
pub trait Serializer: Send + Sync + 'static {
    /// Encodes a single message.
    ///
    /// # Errors
    ///
    /// Returns a [`SerializationError`] if a field value cannot be encoded.
    fn serialize(&self, message: &FieldMap) -> Result<Vec<u8>, SerializationError>;

    /// Encodes several messages as one batch payload, preserving order.
    ///
    /// # Errors
    ///
    /// Returns a [`SerializationError`] if a field value cannot be encoded.
    fn serialize_batch(&self, messages: &[FieldMap]) -> Result<Vec<u8>, SerializationError>;

    /// Decodes a complete payload holding one or more messages or batches.
    ///
    /// # Errors
    ///
    /// Returns a [`DeserializationError`] if the payload is malformed or
    /// ends in the middle of a message.
    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<FieldMap>, DeserializationError>;

    /// Drains every complete message from the front of `buffer`.
    ///
    /// An incomplete trailing message stays in `buffer`. When malformed input
    /// is found, the messages decoded before it are returned, followed by the
    /// error, and the rest of the buffer is discarded.
    fn decode(&self, buffer: &mut Vec<u8>) -> Vec<Result<FieldMap, DeserializationError>>;

    /// Returns the name of this serializer, used in logs.
    fn name(&self) -> &'static str;
}
