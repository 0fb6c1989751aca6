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

//! The hub: one end of a bidirectional RPC connection.
//!
//! A [`Hub`] owns a connection, correlates outgoing requests with their
//! responses and dispatches incoming requests to registered
//! [`DispatchTarget`](crate::dispatch::DispatchTarget)s. Both ends of a
//! connection are hubs; the side that connected and the side that accepted
//! behave the same once attached.
//!
//! # Sending
//!
//! | Style | Method | Result |
//! |-------|--------|--------|
//! | fire-and-forget | [`Hub::send`] | [`SendOutcome`] |
//! | callback | [`Hub::call_with`] | callback runs once |
//! | await | [`Hub::call`], [`Hub::call_timeout`] | return value |
//! | blocking | [`Hub::invoke`] + [`PendingReply::blocking_wait`](crate::call::PendingReply::blocking_wait) | return value |
//!
//! Every pending call is resolved when the connection ends, so no caller
//! waits on a dead connection.
//!
//! # Transactions
//!
//! Between [`Hub::begin_transaction`] and [`Hub::commit`] requests are
//! buffered and then written as a single batch. [`Hub::sync`] uses a
//! transaction to push every [`SyncSource`] attribute in one write.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected --connect_to_server--> Connecting --> Connected
//!       ^                                                |
//!       +------------- peer closed / disconnect ---------+
//! ```
//!
//! With auto-reconnect enabled a lost connection is retried on the delay
//! given by the configured
//! [`ReconnectionStrategy`](crate::reconnection::ReconnectionStrategy).
//! [`Hub::disconnect_from_server`] turns auto-reconnect off first.

mod config;
mod connection;
#[allow(clippy::module_inception)]
mod hub;
mod metrics;
mod remote;
mod state;
mod sync;

pub use config::HubConfig;
pub use hub::{Hub, SendOutcome};
pub use metrics::HubMetrics;
pub use remote::RemoteObject;
pub use state::{HubEvent, HubState};
pub use sync::{SyncAttribute, SyncSource};
