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

//! Multi-peer server.
//!
//! A [`Server`] listens on a TCP address. For every accepted connection it
//! creates a hub from the [`ServerConfig::hub`] template, builds a peer
//! object of the server's [`Peer`] type around it, registers the peer's own
//! target and adds it to the peer set. The set is readable at any time as a
//! snapshot; only the accept path and peer teardown write to it.
//!
//! With [`ServerConfig::isolate_peers`] every peer runs on its own thread
//! with a single-threaded runtime, so a handler that blocks stalls only
//! that peer.

mod config;
mod peer;
#[allow(clippy::module_inception)]
mod server;

pub use config::{DEFAULT_ACCEPT_RETRY_DELAY, ServerConfig};
pub use peer::{Peer, PeerId, ServerEvent};
pub use server::Server;
