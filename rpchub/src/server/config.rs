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

//! Configuration for servers.

use std::time::Duration;

use crate::hub::HubConfig;

/// Default pause after a failed accept.
pub const DEFAULT_ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Configuration for a [`Server`](crate::server::Server).
///
/// # Examples
///
/// ```rust
/// use rpchub::hub::HubConfig;
/// use rpchub::protocol::ValidateToken;
/// use rpchub::server::ServerConfig;
///
/// let config = ServerConfig::default()
///     .with_hub_config(HubConfig::default().with_validate_token(ValidateToken::new("secret")))
///     .with_isolate_peers(true)
///     .with_max_peers(Some(64));
/// assert!(config.isolate_peers);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Template for the hub of each accepted peer.
    ///
    /// The serializer and validate token are shared by every peer.
    /// Auto-reconnect is always off for accepted connections.
    ///
    /// Default: [`HubConfig::default`] named `"server"`
    pub hub: HubConfig,

    /// Run each peer on a dedicated thread with its own runtime.
    ///
    /// A peer whose handlers block then stalls only its own thread. When
    /// false, every peer runs on the runtime that called
    /// [`listen`](crate::server::Server::listen).
    ///
    /// Default: false
    pub isolate_peers: bool,

    /// Maximum number of connected peers.
    ///
    /// Connections accepted beyond the limit are closed immediately.
    ///
    /// Default: None (unlimited)
    pub max_peers: Option<usize>,
    /// Pause before accepting again after the listener reports an error,
    /// such as running out of file descriptors.
    ///
    /// Default: [`DEFAULT_ACCEPT_RETRY_DELAY`]
    pub accept_retry_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hub: HubConfig::default().with_name("server"),
            isolate_peers: false,
            max_peers: None,
            accept_retry_delay: DEFAULT_ACCEPT_RETRY_DELAY,
        }
    }
}

impl ServerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-peer hub template.
    #[must_use]
    pub fn with_hub_config(mut self, hub: HubConfig) -> Self {
        self.hub = hub;
        self
    }

    /// Enables or disables one worker thread per peer.
    #[must_use]
    pub fn with_isolate_peers(mut self, isolate: bool) -> Self {
        self.isolate_peers = isolate;
        self
    }

    /// Limits the number of connected peers.
    #[must_use]
    pub fn with_max_peers(mut self, max: Option<usize>) -> Self {
        self.max_peers = max;
        self
    }

    /// Sets the pause after a failed accept.
    #[must_use]
    pub fn with_accept_retry_delay(mut self, delay: Duration) -> Self {
        self.accept_retry_delay = delay;
        self
    }

    /// The configuration of an accepted peer's hub.
    pub(crate) fn peer_hub_config(&self) -> HubConfig {
        self.hub.clone().with_auto_reconnect(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_hubs_never_reconnect() {
        let config = ServerConfig::default().with_hub_config(HubConfig::default().with_auto_reconnect(true));
        assert!(config.hub.auto_reconnect);
        assert!(!config.peer_hub_config().auto_reconnect);
    }

    #[test]
    fn test_accept_retry_delay() {
        assert_eq!(ServerConfig::default().accept_retry_delay, DEFAULT_ACCEPT_RETRY_DELAY);
        assert!(!DEFAULT_ACCEPT_RETRY_DELAY.is_zero());
        let config = ServerConfig::default().with_accept_retry_delay(Duration::from_secs(1));
        assert_eq!(config.accept_retry_delay, Duration::from_secs(1));
    }
}
