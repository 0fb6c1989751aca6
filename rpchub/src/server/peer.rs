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

//! Peers and server events.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::dispatch::DispatchTarget;
use crate::hub::Hub;
use crate::transport::ConnectionId;

/// Identifies a connected peer for the lifetime of its connection.
pub type PeerId = ConnectionId;

/// The server-side object created for each accepted connection.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Weak};
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use rpchub::dispatch::DispatchTarget;
/// use rpchub::hub::Hub;
/// use rpchub::server::Peer;
///
/// struct Player {
///     hub: Hub,
///     score: AtomicI64,
/// }
///
/// impl Peer for Player {
///     fn new(hub: Hub) -> Self {
///         Player { hub, score: AtomicI64::new(0) }
///     }
///
///     fn hub(&self) -> &Hub {
///         &self.hub
///     }
///
///     fn target(self: Arc<Self>) -> Option<DispatchTarget> {
///         let player: Weak<Player> = Arc::downgrade(&self);
///         Some(DispatchTarget::new("Player").method("addPoints", move |points: i64| {
///             player.upgrade().map(|p| p.score.fetch_add(points, Ordering::Relaxed) + points)
///         }))
///     }
/// }
/// ```
pub trait Peer: Send + Sync + 'static {
    /// Creates the peer for a freshly accepted connection.
    fn new(hub: Hub) -> Self
    where
        Self: Sized;

    /// The hub bound to this peer's connection.
    fn hub(&self) -> &Hub;

    /// Methods the remote side may call on this peer.
    ///
    /// Registered on the peer's own hub next to the server's shared
    /// targets. Capture the peer weakly: the target lives inside the hub the
    /// peer owns.
    fn target(self: Arc<Self>) -> Option<DispatchTarget> {
        None
    }
}

/// A peer that is nothing but its hub.
impl Peer for Hub {
    fn new(hub: Hub) -> Self {
        hub
    }

    fn hub(&self) -> &Hub {
        self
    }
}

/// Peer lifecycle notifications published by a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A connection was accepted and its peer added to the peer set.
    PeerConnected {
        /// The new peer
        peer: PeerId,
        /// Remote address of the connection
        address: SocketAddr,
    },

    /// A peer's connection ended and it left the peer set.
    PeerDisconnected {
        /// The departed peer
        peer: PeerId,
    },
}
