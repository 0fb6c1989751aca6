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

//! The [`Server`]: accepts connections and manages the peer set.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatch::{DispatchTarget, TargetRegistry};
use crate::hub::{Hub, HubState, SendOutcome};
use crate::protocol::Args;
use crate::server::{Peer, PeerId, ServerConfig, ServerEvent};
use crate::transport::{TcpTransport, Transport, TransportError};

/// Capacity of the peer event channel.
const EVENT_CAPACITY: usize = 256;

struct Listening {
    address: SocketAddr,
    task: JoinHandle<()>,
}

struct ServerInner<P> {
    config: ServerConfig,
    shared: TargetRegistry,
    peers: RwLock<HashMap<PeerId, Arc<P>>>,
    events: broadcast::Sender<ServerEvent>,
    listening: Mutex<Option<Listening>>,
}

/// Accepts connections and gives each one a hub and a peer object of type
/// `P`.
///
/// Every peer hub can dispatch to the server's shared targets, and the
/// server can reach every peer through [`peers`](Server::peers) or
/// [`broadcast`](Server::broadcast).
///
/// # Examples
///
/// ```rust,no_run
/// use rpchub::dispatch::DispatchTarget;
/// use rpchub::hub::Hub;
/// use rpchub::server::{Server, ServerConfig};
/// use rpchub::args;
///
/// # async fn example() -> Result<(), rpchub::HubError> {
/// let server: Server<Hub> = Server::new(ServerConfig::default());
/// server.add_shared_target(
///     DispatchTarget::new("Client").method("getRandomNumberSlot", || 4_i64),
/// );
///
/// let address = server.listen("127.0.0.1:0").await?;
/// println!("listening on {address}");
///
/// server.broadcast("Client", "setMotd", args!["welcome"]);
/// # Ok(())
/// # }
/// ```
pub struct Server<P: Peer> {
    inner: Arc<ServerInner<P>>,
}

impl<P: Peer> Clone for Server<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Peer> std::fmt::Debug for Server<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr())
            .field("peers", &self.peer_count())
            .field("shared_targets", &self.inner.shared.classes())
            .finish()
    }
}

impl<P: Peer> Server<P> {
    /// Creates a server that is not listening yet.
    pub fn new(config: ServerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ServerInner {
                config,
                shared: TargetRegistry::new(),
                peers: RwLock::new(HashMap::new()),
                events,
                listening: Mutex::new(None),
            }),
        }
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Makes `target` callable by every peer, current and future.
    pub fn add_shared_target(&self, target: DispatchTarget) {
        self.inner.shared.register(target);
    }

    /// Withdraws a shared target.
    pub fn remove_shared_target(&self, class: &str) -> bool {
        self.inner.shared.unregister(class).is_some()
    }

    /// The shared target registry.
    pub fn shared_targets(&self) -> &TargetRegistry {
        &self.inner.shared
    }

    /// Binds `address` and starts accepting connections in the background.
    ///
    /// Returns the bound address, which tells the port chosen for
    /// `"host:0"`. Listening again replaces the previous listener.
    ///
    /// # Errors
    ///
    /// [`TransportError::BindFailed`] if the address cannot be bound.
    pub async fn listen(&self, address: impl Into<String>) -> Result<SocketAddr, TransportError> {
        let listener = TcpTransport::bind(address).await?;
        let address = listener.local_addr()?;
        info!(%address, "listening");

        let task = tokio::spawn(accept_loop(Arc::clone(&self.inner), listener));
        let previous = self.inner.listening.lock().replace(Listening { address, task });
        if let Some(previous) = previous {
            previous.task.abort();
        }
        Ok(address)
    }

    /// The listening address, if listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.listening.lock().as_ref().map(|listening| listening.address)
    }

    /// Snapshot of the connected peers.
    pub fn peers(&self) -> Vec<Arc<P>> {
        self.inner.peers.read().values().cloned().collect()
    }

    /// The peer connected as `id`.
    pub fn peer(&self, id: PeerId) -> Option<Arc<P>> {
        self.inner.peers.read().get(&id).cloned()
    }

    /// Number of connected peers.
    pub fn peer_count(&self) -> usize {
        self.inner.peers.read().len()
    }

    /// Subscribes to peer connect and disconnect events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.inner.events.subscribe()
    }

    /// Sends `class::method` to every connected peer.
    ///
    /// Each peer's hub treats the request as its own send, so a peer with
    /// an open transaction buffers it. Returns the number of peers that
    /// accepted the request.
    pub fn broadcast(&self, class: &str, method: &str, args: Args) -> usize {
        let mut delivered = 0;
        for peer in self.peers() {
            match peer.hub().send(class, method, args.clone()) {
                Ok(SendOutcome::Sent(_) | SendOutcome::Buffered) => delivered += 1,
                Ok(SendOutcome::Suppressed) => {}
                Err(error) => {
                    debug!(peer = ?peer.hub().connection_id(), class, method, %error, "broadcast skipped peer");
                }
            }
        }
        delivered
    }

    /// Stops accepting and disconnects every peer.
    pub fn shutdown(&self) {
        if let Some(listening) = self.inner.listening.lock().take() {
            listening.task.abort();
            info!(address = %listening.address, "stopped listening");
        }
        for peer in self.peers() {
            peer.hub().disconnect_from_server();
        }
    }
}

async fn accept_loop<P: Peer>(inner: Arc<ServerInner<P>>, listener: TcpListener) {
    loop {
        let (transport, address) = match TcpTransport::accept(&listener).await {
            Ok(accepted) => accepted,
            Err(error) => {
                let delay = inner.config.accept_retry_delay;
                warn!(%error, ?delay, "accept failed, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        if let Some(max) = inner.config.max_peers {
            if inner.peers.read().len() >= max {
                warn!(%address, max, "peer limit reached, closing connection");
                continue;
            }
        }

        if inner.config.isolate_peers {
            spawn_isolated(Arc::clone(&inner), transport, address);
        } else {
            tokio::spawn(serve_peer(Arc::clone(&inner), transport, address));
        }
    }
}

/// Moves the connection to a dedicated thread running its own runtime.
fn spawn_isolated<P: Peer>(inner: Arc<ServerInner<P>>, transport: TcpTransport, address: SocketAddr) {
    let stream = match transport.into_std() {
        Ok(stream) => stream,
        Err(error) => {
            warn!(%address, %error, "cannot detach connection for its worker");
            return;
        }
    };

    let spawned = std::thread::Builder::new()
        .name(format!("rpchub-peer-{address}"))
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(error) => {
                    warn!(%address, %error, "cannot start peer runtime");
                    return;
                }
            };
            runtime.block_on(async move {
                match TcpTransport::from_std(stream) {
                    Ok(transport) => serve_peer(inner, transport, address).await,
                    Err(error) => warn!(%address, %error, "cannot adopt connection"),
                }
            });
            debug!(%address, "peer worker exited");
        });
    if let Err(error) = spawned {
        warn!(%address, %error, "cannot spawn peer worker");
    }
}

/// Runs one peer from accept to disconnect.
async fn serve_peer<P: Peer>(inner: Arc<ServerInner<P>>, transport: TcpTransport, address: SocketAddr) {
    let hub = Hub::with_shared_targets(inner.config.peer_hub_config(), inner.shared.shared());
    let peer = Arc::new(P::new(hub.clone()));
    let own_class = Arc::clone(&peer).target().map(|target| {
        let class = target.class().to_string();
        hub.register_target(target);
        class
    });

    let id = transport.metadata().id;
    inner.peers.write().insert(id, Arc::clone(&peer));
    let connection = hub.attach(transport);
    info!(peer = %connection, %address, "peer connected");
    let _ = inner.events.send(ServerEvent::PeerConnected {
        peer: connection,
        address,
    });

    let mut state = hub.state_changes();
    let _ = state
        .wait_for(|state| *state != HubState::Connected(connection))
        .await;

    inner.peers.write().remove(&id);
    if let Some(class) = own_class {
        hub.unregister_target(&class);
    }
    info!(peer = %connection, %address, "peer disconnected");
    let _ = inner.events.send(ServerEvent::PeerDisconnected { peer: connection });
}
