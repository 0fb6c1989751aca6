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

//! Fixed delay reconnection strategy.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::reconnection::{ReconnectionMetrics, ReconnectionStrategy};
use crate::transport::TransportError;

/// Default delay between attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Retries at a constant interval.
///
/// This is the default strategy of a hub: every 500 ms, without an attempt
/// limit, until a connection is established or auto-reconnect is disabled.
///
/// # Examples
///
/// ```
/// use rpchub::reconnection::FixedDelay;
/// use std::time::Duration;
///
/// // Default configuration (500 ms delay, unlimited attempts)
/// let strategy = FixedDelay::default();
///
/// // Custom configuration
/// let strategy = FixedDelay::builder()
///     .delay(Duration::from_secs(5))
///     .max_attempts(Some(10))
///     .build();
/// ```
#[derive(Debug)]
pub struct FixedDelay {
    /// Delay between attempts
    delay: Duration,
    /// Maximum number of attempts (None = unlimited)
    max_attempts: Option<u32>,
    /// Internal metrics
    metrics: Mutex<ReconnectionMetrics>,
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}

impl FixedDelay {
    /// Create a new builder for configuring fixed delay.
    pub fn builder() -> FixedDelayBuilder {
        FixedDelayBuilder::default()
    }

    /// Create a new fixed delay strategy with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
            metrics: Mutex::new(ReconnectionMetrics::new()),
        }
    }

    /// Get the current metrics.
    pub fn metrics(&self) -> ReconnectionMetrics {
        self.metrics.lock().clone()
    }
}

#[async_trait]
impl ReconnectionStrategy for FixedDelay {
    async fn should_reconnect(&self, attempt: u32, last_error: &TransportError) -> bool {
        if matches!(last_error, TransportError::InvalidConfiguration { .. }) {
            return false;
        }
        if self.max_attempts.is_some_and(|max| attempt >= max) {
            return false;
        }
        self.metrics.lock().record_attempt();
        true
    }

    async fn next_delay(&self, _attempt: u32) -> Duration {
        self.delay
    }

    fn on_connected(&self) {
        self.metrics.lock().record_success();
    }

    fn on_disconnected(&self, error: &TransportError) {
        self.metrics.lock().record_failure(error);
    }

    fn reset(&self) {
        self.metrics.lock().reset();
    }

    fn name(&self) -> &str {
        "FixedDelay"
    }
}

/// Builder for configuring fixed delay strategy.
#[derive(Debug)]
pub struct FixedDelayBuilder {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl Default for FixedDelayBuilder {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY,
            max_attempts: None,
        }
    }
}

impl FixedDelayBuilder {
    /// Set the delay between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the maximum number of attempts.
    pub fn max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    /// Build the fixed delay strategy.
    pub fn build(self) -> FixedDelay {
        FixedDelay {
            delay: self.delay,
            max_attempts: self.max_attempts,
            metrics: Mutex::new(ReconnectionMetrics::new()),
        }
    }
}
