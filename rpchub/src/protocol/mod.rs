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

//! Message protocol for rpchub.
//!
//! This module defines what travels between two hubs:
//!
//! - **[`Value`]**: an untagged dynamic value carried by every field
//! - **[`Args`]**: up to [`MAX_ARGS`] positional arguments where an absent
//!   argument is distinct from a null one
//! - **[`Message`]**: a request or response, convertible to and from its
//!   [`FieldMap`]
//! - **[`ValidateToken`]**: the optional shared-secret message digest
//!
//! # Example
//!
//! ```rust
//! use rpchub::args;
//! use rpchub::protocol::{Message, ValidateToken};
//!
//! let token = ValidateToken::new("shared secret");
//! let mut fields = Message::request(1, "Client", "greet", args!["world"]).to_fields();
//! token.sign(&mut fields);
//!
//! assert!(token.verify(&fields).is_ok());
//! let message = Message::from_fields(&fields).unwrap();
//! assert_eq!(message.method.as_deref(), Some("greet"));
//! ```

mod error;
mod message;
mod token;
mod value;

pub use error::{AuthError, CoercionError, ProtocolError};
pub use message::{
    FIELD_CLASS, FIELD_ID, FIELD_METHOD, FIELD_RETURN, FIELD_TOKEN, FIELD_TYPE, FieldMap, Message,
    MessageKind, arg_field,
};
pub use token::ValidateToken;
pub use value::{Args, FromValue, IntoValue, MAX_ARGS, Value};
