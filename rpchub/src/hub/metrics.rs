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

//! Per-hub counters.
//!
//! Counters are atomics read through accessor methods. With the
//! `observability` feature enabled, every increment is also forwarded to the
//! `metrics` facade under an `rpchub.hub.*` name.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one hub, updated with relaxed atomics.
///
/// # Examples
///
/// ```rust
/// use rpchub::hub::HubMetrics;
///
/// let metrics = HubMetrics::new();
/// metrics.record_request_sent();
/// metrics.record_frame_written();
///
/// assert_eq!(metrics.requests_sent(), 1);
/// assert_eq!(metrics.frames_written(), 1);
/// ```
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Requests serialized for the wire, including batched ones
    requests_sent: AtomicU64,
    /// Responses sent for dispatched requests
    responses_sent: AtomicU64,
    /// Writes handed to the transport
    frames_written: AtomicU64,
    /// Messages decoded from the transport
    messages_received: AtomicU64,
    /// Inbound messages dropped as malformed
    protocol_errors: AtomicU64,
    /// Inbound messages dropped for a bad token
    auth_failures: AtomicU64,
    /// Inbound requests that could not be dispatched
    dispatch_failures: AtomicU64,
    /// Connection attempts made by the reconnect loop
    reconnect_attempts: AtomicU64,
}

macro_rules! counter {
    ($($record:ident => $field:ident : $name:literal),* $(,)?) => {
        impl HubMetrics {
            $(
                #[doc = concat!("Increments `", stringify!($field), "`.")]
                pub fn $record(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                    #[cfg(feature = "observability")]
                    metrics::counter!($name).increment(1);
                }

                #[doc = concat!("Current value of `", stringify!($field), "`.")]
                pub fn $field(&self) -> u64 {
                    self.$field.load(Ordering::Relaxed)
                }
            )*
        }
    };
}

counter!(
    record_request_sent => requests_sent: "rpchub.hub.requests.sent",
    record_response_sent => responses_sent: "rpchub.hub.responses.sent",
    record_frame_written => frames_written: "rpchub.hub.frames.written",
    record_message_received => messages_received: "rpchub.hub.messages.received",
    record_protocol_error => protocol_errors: "rpchub.hub.errors.protocol",
    record_auth_failure => auth_failures: "rpchub.hub.errors.auth",
    record_dispatch_failure => dispatch_failures: "rpchub.hub.errors.dispatch",
    record_reconnect_attempt => reconnect_attempts: "rpchub.hub.reconnect.attempts",
);

impl HubMetrics {
    /// Creates zeroed metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_independent() {
        let metrics = HubMetrics::new();
        metrics.record_protocol_error();
        metrics.record_protocol_error();
        metrics.record_auth_failure();

        assert_eq!(metrics.protocol_errors(), 2);
        assert_eq!(metrics.auth_failures(), 1);
        assert_eq!(metrics.dispatch_failures(), 0);
    }

    #[cfg(feature = "observability")]
    #[test]
    fn test_counters_reach_the_metrics_facade() {
        use std::collections::HashMap;
        use std::sync::Arc;

        use ::metrics::{
            Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
        };
        use parking_lot::Mutex;

        #[derive(Default)]
        struct Capture {
            counters: Mutex<HashMap<String, Arc<AtomicU64>>>,
        }

        impl Recorder for Capture {
            fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
            fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
            fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

            fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
                let counter = self.counters.lock().entry(key.name().to_string()).or_default().clone();
                Counter::from_arc(counter)
            }

            fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
                Gauge::noop()
            }

            fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
                Histogram::noop()
            }
        }

        let capture = Capture::default();
        ::metrics::with_local_recorder(&capture, || {
            let metrics = HubMetrics::new();
            metrics.record_auth_failure();
            metrics.record_auth_failure();
            metrics.record_request_sent();
        });

        let counters = capture.counters.lock();
        assert_eq!(counters["rpchub.hub.errors.auth"].load(Ordering::Relaxed), 2);
        assert_eq!(counters["rpchub.hub.requests.sent"].load(Ordering::Relaxed), 1);
    }
}
