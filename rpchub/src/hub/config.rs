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

//! Configuration types for hubs.

use std::fmt;
use std::sync::Arc;

use crate::protocol::ValidateToken;
use crate::reconnection::{FixedDelay, ReconnectionStrategy};
use crate::serialization::{JsonSerializer, Serializer};

/// Configuration for a hub.
///
/// # Examples
///
/// ```rust
/// use rpchub::hub::HubConfig;
/// use rpchub::protocol::ValidateToken;
///
/// // Use default configuration
/// let config = HubConfig::default();
///
/// // Customize configuration
/// let config = HubConfig {
///     validate_token: Some(ValidateToken::new("shared secret")),
///     auto_reconnect: true,
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct HubConfig {
    /// Wire encoding shared by both ends of the connection.
    ///
    /// Default: [`JsonSerializer`]
    pub serializer: Arc<dyn Serializer>,

    /// Shared secret used to sign outgoing and verify incoming messages.
    ///
    /// Both ends must be configured with the same secret. Messages that fail
    /// verification are dropped without a response.
    ///
    /// Default: None (messages are neither signed nor verified)
    pub validate_token: Option<ValidateToken>,

    /// Retry the connection after it is lost.
    ///
    /// Only meaningful for hubs that connect to an address themselves.
    /// Server-side hubs never reconnect.
    ///
    /// Default: false
    pub auto_reconnect: bool,

    /// Strategy consulted by the reconnect loop.
    ///
    /// Default: [`FixedDelay`] of 500 ms, unlimited attempts
    pub reconnection_strategy: Arc<dyn ReconnectionStrategy>,

    /// Size of each read from the transport, in bytes.
    ///
    /// Default: 8 KiB
    pub read_buffer_size: usize,

    /// Maximum number of bytes buffered without completing a message.
    ///
    /// A peer that keeps sending an unterminated message past this limit
    /// has its buffered input discarded.
    ///
    /// Default: 16 MiB
    pub max_frame_size: usize,

    /// Label used in log records.
    ///
    /// Default: `"hub"`
    pub name: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            serializer: Arc::new(JsonSerializer::default()),
            validate_token: None,
            auto_reconnect: false,
            reconnection_strategy: Arc::new(FixedDelay::default()),
            read_buffer_size: 8 * 1024,
            max_frame_size: 16 * 1024 * 1024, // 16 MiB
            name: "hub".to_owned(),
        }
    }
}

impl fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubConfig")
            .field("serializer", &self.serializer.name())
            .field("validate_token", &self.validate_token)
            .field("auto_reconnect", &self.auto_reconnect)
            .field("reconnection_strategy", &self.reconnection_strategy.name())
            .field("read_buffer_size", &self.read_buffer_size)
            .field("max_frame_size", &self.max_frame_size)
            .field("name", &self.name)
            .finish()
    }
}

impl HubConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wire encoding.
    #[must_use]
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Sets the shared secret for message tokens.
    #[must_use]
    pub fn with_validate_token(mut self, token: ValidateToken) -> Self {
        self.validate_token = Some(token);
        self
    }

    /// Enables or disables auto-reconnect.
    #[must_use]
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Sets the reconnection strategy.
    #[must_use]
    pub fn with_reconnection_strategy(mut self, strategy: Arc<dyn ReconnectionStrategy>) -> Self {
        self.reconnection_strategy = strategy;
        self
    }

    /// Sets the read buffer size.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Sets the maximum incomplete frame size.
    #[must_use]
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the log label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
