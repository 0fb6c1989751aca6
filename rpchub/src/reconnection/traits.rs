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

//! Reconnection strategy trait and metrics.

use std::time::Duration;

use async_trait::async_trait;

use crate::transport::TransportError;

/// Decides whether and when a disconnected hub retries its connection.
///
/// A hub with auto-reconnect enabled consults its strategy every time it
/// enters the disconnected state and after every failed attempt. The hub
/// cancels the retry loop as soon as it is connected again, whether the
/// connection came from the loop or from an explicit connect.
#[async_trait]
pub trait ReconnectionStrategy: Send + Sync {
    /// Returns `true` if attempt number `attempt` (zero based) should be made
    /// after `last_error`.
    async fn should_reconnect(&self, attempt: u32, last_error: &TransportError) -> bool;

    /// Delay to wait before attempt number `attempt`.
    async fn next_delay(&self, attempt: u32) -> Duration;

    /// Called when a connection is established.
    fn on_connected(&self);

    /// Called when a connection is lost or an attempt fails.
    fn on_disconnected(&self, error: &TransportError);

    /// Clears any accumulated state.
    fn reset(&self);

    /// Name of the strategy, used in logs.
    fn name(&self) -> &str;
}

/// Counters describing reconnection activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconnectionMetrics {
    /// Total number of reconnection attempts allowed by the strategy
    pub total_attempts: u64,
    /// Number of connections established
    pub successful_reconnections: u64,
    /// Number of disconnects and failed attempts
    pub failed_reconnections: u64,
    /// Failures since the last successful connection
    pub consecutive_failures: u32,
    /// Description of the most recent failure
    pub last_error: Option<String>,
}

impl ReconnectionMetrics {
    /// Creates zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an attempt.
    pub fn record_attempt(&mut self) {
        self.total_attempts += 1;
    }

    /// Records an established connection.
    pub fn record_success(&mut self) {
        self.successful_reconnections += 1;
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    /// Records a failure.
    pub fn record_failure(&mut self, error: &TransportError) {
        self.failed_reconnections += 1;
        self.consecutive_failures += 1;
        self.last_error = Some(error.to_string());
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
