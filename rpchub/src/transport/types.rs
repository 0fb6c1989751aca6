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

//! Connection identity and metadata.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide counter for connection ids.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of one connection incarnation.
///
/// A hub that reconnects gets a new id for every connection, which lets
/// teardown of a stale connection recognise that it no longer owns the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({})", self.0)
    }
}

/// Metadata about a transport connection.
#[derive(Debug, Clone)]
pub struct TransportMetadata {
    /// Id of this connection.
    pub id: ConnectionId,

    /// Local socket address, if the transport has one.
    pub local_addr: Option<SocketAddr>,

    /// Remote socket address, if the transport has one.
    pub peer_addr: Option<SocketAddr>,

    /// Transport kind (`"tcp"`, `"memory"`).
    pub transport_type: &'static str,

    /// When the connection was established.
    pub created_at: Instant,
}

impl TransportMetadata {
    /// Creates metadata with a freshly allocated id.
    pub fn new(transport_type: &'static str) -> Self {
        Self {
            id: ConnectionId::next(),
            local_addr: None,
            peer_addr: None,
            transport_type,
            created_at: Instant::now(),
        }
    }

    /// Sets the local address.
    #[must_use]
    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// Sets the peer address.
    #[must_use]
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Time since the connection was established.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl fmt::Display for TransportMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.transport_type, self.id)?;
        if let Some(peer) = self.peer_addr {
            write!(f, " to {peer}")?;
        }
        Ok(())
    }
}
