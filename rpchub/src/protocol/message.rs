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

//! Hub messages and their field map representation.
//!
//! A message travels as a [`FieldMap`], an ordered mapping of field name to
//! [`Value`]. The key order of the map is the canonical field order used for
//! tokens, so both ends iterate fields identically regardless of how the
//! serializer orders them on the wire.
//!
//! # Field Vocabulary
//!
//! | Field | Kinds | Contents |
//! |---|---|---|
//! | `type` | both | `"request"` or `"response"` |
//! | `id` | both | non-negative integer, required |
//! | `class` | both | target class name |
//! | `method` | request | method name |
//! | `val0`..`val9` | request | positional arguments, present only if supplied |
//! | `return` | response | return value, absent for void methods |
//! | `token` | both | optional message digest |

use std::collections::BTreeMap;
use std::fmt;

use crate::protocol::{Args, MAX_ARGS, ProtocolError, Value};

/// Ordered field name to value mapping; one per message on the wire.
pub type FieldMap = BTreeMap<String, Value>;

/// Field holding the message kind.
pub const FIELD_TYPE: &str = "type";
/// Field holding the request id.
pub const FIELD_ID: &str = "id";
/// Field holding the target class name.
pub const FIELD_CLASS: &str = "class";
/// Field holding the method name.
pub const FIELD_METHOD: &str = "method";
/// Field holding the return value.
pub const FIELD_RETURN: &str = "return";
/// Field holding the message token.
pub const FIELD_TOKEN: &str = "token";

const ARG_FIELDS: [&str; MAX_ARGS] = [
    "val0", "val1", "val2", "val3", "val4", "val5", "val6", "val7", "val8", "val9",
];

/// Returns the field name of positional argument `index` (`val0..val9`).
#[must_use]
pub fn arg_field(index: usize) -> Option<&'static str> {
    ARG_FIELDS.get(index).copied()
}

/// The two message kinds of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A method invocation.
    Request,
    /// The result of a method invocation.
    Response,
}

impl MessageKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Request => "request",
            MessageKind::Response => "response",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "request" => Some(MessageKind::Request),
            "response" => Some(MessageKind::Response),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded hub message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Request or response.
    pub kind: MessageKind,
    /// Request id, echoed by the matching response.
    pub id: u64,
    /// Target class name.
    pub class: String,
    /// Method name; always present on requests.
    pub method: Option<String>,
    /// Positional arguments; empty on responses.
    pub args: Args,
    /// Return value; `None` for void results and for requests.
    pub ret: Option<Value>,
    /// Message token, if the message was signed.
    pub token: Option<String>,
}

impl Message {
    /// Creates a request for `class::method`.
    #[must_use]
    pub fn request(id: u64, class: impl Into<String>, method: impl Into<String>, args: Args) -> Self {
        Self {
            kind: MessageKind::Request,
            id,
            class: class.into(),
            method: Some(method.into()),
            args,
            ret: None,
            token: None,
        }
    }

    /// Creates a response to request `id`. `ret` is `None` for void methods.
    #[must_use]
    pub fn response(id: u64, class: impl Into<String>, ret: Option<Value>) -> Self {
        Self {
            kind: MessageKind::Response,
            id,
            class: class.into(),
            method: None,
            args: Args::new(),
            ret,
            token: None,
        }
    }

    /// `class::method` key used by the reentrancy lock set.
    #[must_use]
    pub fn dispatch_key(&self) -> String {
        format!("{}::{}", self.class, self.method.as_deref().unwrap_or_default())
    }

    /// Converts the message into its field map.
    #[must_use]
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(FIELD_TYPE.into(), Value::String(self.kind.as_str().into()));
        fields.insert(FIELD_ID.into(), Value::Int(self.id as i64));
        fields.insert(FIELD_CLASS.into(), Value::String(self.class.clone()));
        if let Some(method) = &self.method {
            fields.insert(FIELD_METHOD.into(), Value::String(method.clone()));
        }
        for (index, value) in self.args.iter() {
            if let Some(name) = arg_field(index) {
                fields.insert(name.into(), value.clone());
            }
        }
        if let Some(ret) = &self.ret {
            fields.insert(FIELD_RETURN.into(), ret.clone());
        }
        if let Some(token) = &self.token {
            fields.insert(FIELD_TOKEN.into(), Value::String(token.clone()));
        }
        fields
    }

    /// Parses a field map into a message.
    ///
    /// The `id` check runs first: a message without a non-negative integer id
    /// is rejected as a possible injection attempt.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] describing the first violated rule.
    pub fn from_fields(fields: &FieldMap) -> Result<Self, ProtocolError> {
        let id = match fields.get(FIELD_ID) {
            Some(Value::Int(id)) if *id >= 0 => *id as u64,
            _ => return Err(ProtocolError::InvalidId),
        };

        let kind = match fields.get(FIELD_TYPE) {
            Some(Value::String(name)) => MessageKind::parse(name)
                .ok_or_else(|| ProtocolError::UnknownKind(Some(name.clone())))?,
            Some(other) => return Err(ProtocolError::UnknownKind(Some(other.to_string()))),
            None => return Err(ProtocolError::UnknownKind(None)),
        };

        let class = string_field(fields, FIELD_CLASS)?
            .ok_or(ProtocolError::MissingField(FIELD_CLASS))?;
        let token = string_field(fields, FIELD_TOKEN)?;

        let mut message = match kind {
            MessageKind::Request => {
                let method = string_field(fields, FIELD_METHOD)?
                    .ok_or(ProtocolError::MissingField(FIELD_METHOD))?;
                let mut args = Args::new();
                for (index, name) in ARG_FIELDS.iter().enumerate() {
                    args.set(index, fields.get(*name).cloned());
                }
                Message::request(id, class, method, args)
            }
            MessageKind::Response => Message::response(id, class, fields.get(FIELD_RETURN).cloned()),
        };
        message.token = token;
        Ok(message)
    }
}

fn string_field(fields: &FieldMap, name: &'static str) -> Result<Option<String>, ProtocolError> {
    match fields.get(name) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ProtocolError::MissingField(name)),
    }
}
