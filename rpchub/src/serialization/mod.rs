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

//! Serialization layer for rpchub.
//!
//! This module provides the pluggable wire encoding of a hub.
//!
//! # Overview
//!
//! - **[`Serializer`] trait**: object safe abstraction over wire formats
//! - **[`JsonSerializer`]**: the default encoding, one JSON object per
//!   message and one JSON array per batch
//! - **Error types**: [`SerializationError`] and [`DeserializationError`]
//!
//! # Framing
//!
//! The stream has no length prefix. Messages are adjacent top-level values
//! and [`Serializer::decode`] re-splits them, keeping any incomplete tail
//! buffered until the next read completes it.
//!
//! ```text
//! {"class":"A","id":1,...}{"class":"A","id":2,...}[{...},{...}]{"clas
//! \______ message ______/ \______ message ______/ \_ batch _/ \_ tail, kept
//! ```
//!
//! # Custom serializer implementation
//!
//! A different encoding only needs to map a [`FieldMap`](crate::protocol::FieldMap)
//! to bytes and back, and to know where a complete payload ends.

mod error;
mod json;
mod traits;

pub use error::{DeserializationError, SerializationError};
pub use json::JsonSerializer;
pub use traits::Serializer;
