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

//! Hub connection states and lifecycle events.

use std::fmt;

use crate::transport::ConnectionId;

/// Connection state of a hub.
///
/// ```text
/// Disconnected --connect--> Connecting --established--> Connected
///      ^                         |                          |
///      +-------- failed ---------+------- lost/closed ------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
    /// No connection; calls fail with `NotConnected`.
    Disconnected,

    /// A connection attempt is in progress.
    Connecting,

    /// Connected over the given connection.
    Connected(ConnectionId),
}

impl HubState {
    /// Returns `true` in the [`HubState::Connected`] state.
    pub fn is_connected(&self) -> bool {
        matches!(self, HubState::Connected(_))
    }
}

impl fmt::Display for HubState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected(id) => write!(f, "Connected({id})"),
        }
    }
}

/// Lifecycle notification published by a hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    /// A connection was established.
    Connected {
        /// The new connection
        connection: ConnectionId,
    },

    /// A connection ended. Every call pending on it has been failed.
    Disconnected {
        /// The connection that ended
        connection: ConnectionId,
        /// Why it ended
        reason: String,
        /// Number of pending calls failed with `ConnectionLost`
        failed_calls: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(HubState::Disconnected.to_string(), "Disconnected");
        assert_eq!(
            HubState::Connected(ConnectionId::new(3)).to_string(),
            "Connected(Connection(3))"
        );
        assert!(HubState::Connected(ConnectionId::new(3)).is_connected());
        assert!(!HubState::Connecting.is_connected());
    }
}
