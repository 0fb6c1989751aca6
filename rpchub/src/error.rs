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

//! Top-level error type for rpchub.
//!
//! A [`HubError`] is what the sending and connecting operations return. It
//! composes the errors of the layers those operations touch:
//!
//! 1. **Transport** ([`TransportError`]): connection failures.
//! 2. **Call** ([`CallError`]): outcomes delivered to waiting callers.
//! 3. **Serialization** ([`SerializationError`]): outgoing messages that
//!    cannot be encoded, and [`CoercionError`] for return values of the
//!    wrong type.
//!
//! Inbound failures ([`ProtocolError`](crate::protocol::ProtocolError),
//! [`AuthError`](crate::protocol::AuthError),
//! [`DispatchError`](crate::dispatch::DispatchError)) never reach user code
//! as a [`HubError`]. The offending message is dropped, logged and counted
//! in [`HubMetrics`](crate::hub::HubMetrics).
//!
//! # Examples
//!
//! ```rust
//! use rpchub::HubError;
//! use rpchub::call::CallError;
//! use rpchub::transport::TransportError;
//!
//! let error: HubError = CallError::ConnectionLost.into();
//! assert!(error.is_connection_lost());
//!
//! let error: HubError = TransportError::Closed.into();
//! assert!(!error.is_recoverable());
//! ```

use thiserror::Error;

use crate::call::CallError;
use crate::protocol::CoercionError;
use crate::serialization::SerializationError;
use crate::transport::TransportError;

/// Errors returned by hub and server operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The call did not produce a return value.
    #[error("call failed: {0}")]
    Call(#[from] CallError),

    /// A return value did not convert to the requested type.
    #[error("unexpected return value: {0}")]
    Coercion(#[from] CoercionError),

    /// A message could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The hub has no connection.
    #[error("not connected")]
    NotConnected,

    /// The request was dropped because `key` is being dispatched on the
    /// same hub.
    #[error("`{key}` is executing on this hub, request suppressed")]
    Suppressed {
        /// The `class::method` key
        key: String,
    },

    /// The request was buffered by an open transaction and has no reply
    /// of its own.
    #[error("request buffered in a transaction, no reply to wait for")]
    Batched,
}

impl HubError {
    /// Returns `true` if retrying the operation may succeed.
    ///
    /// Covers recoverable transport errors, lost connections and timeouts.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(error) => error.is_recoverable(),
            Self::Call(_) | Self::NotConnected => true,
            Self::Coercion(_) | Self::Serialization(_) | Self::Suppressed { .. } | Self::Batched => {
                false
            }
        }
    }

    /// Returns `true` if the operation failed because the connection is
    /// gone or was never there.
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::Call(error) => error.is_connection_lost(),
            Self::NotConnected => true,
            Self::Transport(TransportError::ConnectionLost { .. } | TransportError::Closed) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_classification() {
        assert!(HubError::NotConnected.is_connection_lost());
        assert!(HubError::NotConnected.is_recoverable());

        let timeout = HubError::from(CallError::Timeout {
            duration: Duration::from_secs(1),
        });
        assert!(timeout.is_recoverable());
        assert!(!timeout.is_connection_lost());

        assert!(!HubError::Batched.is_recoverable());
        assert!(!HubError::from(TransportError::Closed).is_recoverable());
        assert!(HubError::from(TransportError::Closed).is_connection_lost());
    }

    #[test]
    fn test_display() {
        let error = HubError::Suppressed {
            key: "Client::ping".to_string(),
        };
        assert_eq!(error.to_string(), "`Client::ping` is executing on this hub, request suppressed");
        assert_eq!(
            HubError::from(TransportError::Closed).to_string(),
            "transport error: transport is closed"
        );
    }
}
