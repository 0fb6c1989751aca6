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

//! The [`Hub`] handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::call::{CallError, CallResult, Continuation, PendingCalls, PendingReply, RequestIdGenerator};
use crate::dispatch::{DispatchTarget, Dispatcher, ReentrancyLocks, SharedTargets};
use crate::error::HubError;
use crate::hub::connection::{Link, Outbound};
use crate::hub::sync::SyncSource;
use crate::hub::{HubConfig, HubEvent, HubMetrics, HubState, RemoteObject};
use crate::protocol::{Args, FieldMap, Message, Value};
use crate::transport::{ConnectionId, TransportError};

/// Capacity of the lifecycle event channel.
const EVENT_CAPACITY: usize = 64;

/// What [`Hub::send`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Written to the connection under this request id.
    Sent(u64),
    /// Appended to the open transaction; no id is assigned to the caller.
    Buffered,
    /// Dropped because the same `class::method` is being dispatched on this
    /// hub right now.
    Suppressed,
}

impl SendOutcome {
    /// The request id, if the request went out on its own.
    pub fn id(&self) -> Option<u64> {
        match self {
            SendOutcome::Sent(id) => Some(*id),
            SendOutcome::Buffered | SendOutcome::Suppressed => None,
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct Transaction {
    pub(super) open: bool,
    pub(super) buffer: Vec<Message>,
}

pub(super) struct HubInner {
    pub(super) config: HubConfig,
    pub(super) address: Mutex<Option<String>>,
    pub(super) auto_reconnect: AtomicBool,
    pub(super) state: watch::Sender<HubState>,
    pub(super) ids: RequestIdGenerator,
    pub(super) pending: PendingCalls,
    pub(super) dispatcher: Dispatcher,
    pub(super) locks: ReentrancyLocks,
    /// Held while a request is encoded and queued, which keeps requests on
    /// the wire in the order they were sent.
    pub(super) transaction: Mutex<Transaction>,
    pub(super) syncables: RwLock<Vec<SyncSource>>,
    pub(super) link: Mutex<Option<Link>>,
    pub(super) reconnect_task: Mutex<Option<JoinHandle<()>>>,
    pub(super) sync_task: Mutex<Option<JoinHandle<()>>>,
    pub(super) events: broadcast::Sender<HubEvent>,
    pub(super) metrics: Arc<HubMetrics>,
}

impl Drop for HubInner {
    fn drop(&mut self) {
        if let Some(task) = self.reconnect_task.get_mut().take() {
            task.abort();
        }
        if let Some(task) = self.sync_task.get_mut().take() {
            task.abort();
        }
    }
}

/// One end of a bidirectional RPC connection.
///
/// A hub owns the connection, the pending-call registry and the dispatch
/// table for inbound requests. Either side may call the other: requests
/// go out through [`send`](Hub::send) and its variants, and requests from
/// the peer are routed to the targets registered with
/// [`register_target`](Hub::register_target).
///
/// `Hub` is a cheap handle; clones share the same connection.
///
/// # Examples
///
/// ```rust,no_run
/// use rpchub::hub::{Hub, HubConfig};
/// use rpchub::dispatch::DispatchTarget;
/// use rpchub::args;
///
/// # async fn example() -> Result<(), rpchub::HubError> {
/// let hub = Hub::new(HubConfig::default());
/// hub.register_target(DispatchTarget::new("Client").method("ping", || "pong"));
///
/// hub.connect_to_server(Some("127.0.0.1:9000".to_string())).await?;
/// let slot = hub.call("Server", "getRandomNumberSlot", args![]).await?;
/// println!("slot = {slot:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Hub {
    pub(super) inner: Arc<HubInner>,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("name", &self.inner.config.name)
            .field("state", &self.state())
            .field("pending", &self.inner.pending.len())
            .finish()
    }
}

impl Hub {
    /// Creates a disconnected hub.
    pub fn new(config: HubConfig) -> Self {
        Self::with_dispatcher(config, Dispatcher::new())
    }

    /// Creates a disconnected hub that also dispatches to `shared` targets.
    ///
    /// Targets registered on the hub itself take precedence over shared
    /// ones with the same class name.
    pub fn with_shared_targets(config: HubConfig, shared: SharedTargets) -> Self {
        Self::with_dispatcher(config, Dispatcher::with_shared(shared))
    }

    fn with_dispatcher(config: HubConfig, dispatcher: Dispatcher) -> Self {
        let (state, _) = watch::channel(HubState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let auto_reconnect = AtomicBool::new(config.auto_reconnect);
        Self {
            inner: Arc::new(HubInner {
                config,
                address: Mutex::new(None),
                auto_reconnect,
                state,
                ids: RequestIdGenerator::new(),
                pending: PendingCalls::new(),
                dispatcher,
                locks: ReentrancyLocks::new(),
                transaction: Mutex::new(Transaction::default()),
                syncables: RwLock::new(Vec::new()),
                link: Mutex::new(None),
                reconnect_task: Mutex::new(None),
                sync_task: Mutex::new(None),
                events,
                metrics: Arc::new(HubMetrics::new()),
            }),
        }
    }

    /// The configuration this hub was created with.
    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// The hub's log label.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Registers a target for inbound requests, replacing any target with
    /// the same class name.
    pub fn register_target(&self, target: DispatchTarget) {
        self.inner.dispatcher.local().register(target);
    }

    /// Removes a target registered with [`register_target`](Hub::register_target).
    pub fn unregister_target(&self, class: &str) -> bool {
        self.inner.dispatcher.local().unregister(class).is_some()
    }

    // ----- sending -------------------------------------------------------

    /// Sends a request without waiting for its response.
    ///
    /// Returns [`SendOutcome::Buffered`] inside a transaction and
    /// [`SendOutcome::Suppressed`] while `class::method` is being dispatched
    /// on this hub, which stops a handler from echoing the call it is
    /// serving back to the peer.
    ///
    /// # Errors
    ///
    /// [`HubError::NotConnected`] outside a transaction while disconnected,
    /// or a serialization error.
    pub fn send(&self, class: &str, method: &str, args: Args) -> Result<SendOutcome, HubError> {
        self.submit(class, method, args, None)
    }

    /// Sends a request and hands its result to `callback`.
    ///
    /// The callback runs on the task reading the connection, so it must not
    /// block. It runs exactly once if the request is sent: with the return
    /// value, or with [`CallError::ConnectionLost`] when the connection
    /// ends first. It never runs for a buffered or suppressed request, nor
    /// when the peer fails to dispatch the request.
    pub fn call_with(
        &self,
        class: &str,
        method: &str,
        args: Args,
        callback: impl FnOnce(CallResult) + Send + 'static,
    ) -> Result<SendOutcome, HubError> {
        self.submit(class, method, args, Some(Continuation::callback(callback)))
    }

    /// Sends a request and returns a handle on its result.
    ///
    /// The handle can be awaited or, from a thread outside the runtime,
    /// waited on with [`PendingReply::blocking_wait`].
    ///
    /// # Errors
    ///
    /// Besides the errors of [`send`](Hub::send), [`HubError::Batched`]
    /// inside a transaction and [`HubError::Suppressed`] while the same
    /// method is being dispatched.
    pub fn invoke(&self, class: &str, method: &str, args: Args) -> Result<PendingReply, HubError> {
        let (sender, receiver) = oneshot::channel();
        match self.submit(class, method, args, Some(Continuation::Waiter(sender)))? {
            SendOutcome::Sent(id) => Ok(PendingReply::new(id, receiver)),
            SendOutcome::Buffered => Err(HubError::Batched),
            SendOutcome::Suppressed => Err(HubError::Suppressed {
                key: format!("{class}::{method}"),
            }),
        }
    }

    /// Sends a request and waits for its return value.
    ///
    /// Resolves to `None` for void methods. There is no timeout: if the
    /// peer drops the request the future completes only when the connection
    /// ends. Use [`call_timeout`](Hub::call_timeout) to bound the wait.
    ///
    /// The peer runs one invocation of a `class::method` at a time and drops
    /// requests for a method that is still running. Concurrent calls to the
    /// same method from several tasks may therefore never resolve; issue
    /// them one after another or bound them with `call_timeout`.
    pub async fn call(&self, class: &str, method: &str, args: Args) -> Result<Option<Value>, HubError> {
        let reply = self.invoke(class, method, args)?;
        Ok(reply.await?)
    }

    /// Like [`call`](Hub::call), but gives up after `timeout`.
    ///
    /// On timeout the pending call is removed, so a late response is
    /// ignored, and [`CallError::Timeout`] is returned.
    pub async fn call_timeout(
        &self,
        class: &str,
        method: &str,
        args: Args,
        timeout: Duration,
    ) -> Result<Option<Value>, HubError> {
        let reply = self.invoke(class, method, args)?;
        let id = reply.id();
        match tokio::time::timeout(timeout, reply).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                self.inner.pending.cancel(id);
                debug!(hub = %self.name(), id, class, method, "call timed out");
                Err(CallError::Timeout { duration: timeout }.into())
            }
        }
    }

    /// A stub for calling methods of the peer's `class`.
    pub fn remote(&self, class: impl Into<String>) -> RemoteObject {
        RemoteObject::new(self.clone(), class.into())
    }

    fn submit(
        &self,
        class: &str,
        method: &str,
        args: Args,
        continuation: Option<Continuation>,
    ) -> Result<SendOutcome, HubError> {
        let key = format!("{class}::{method}");
        if self.inner.locks.is_held(&key) {
            debug!(hub = %self.name(), %key, "suppressing re-entrant send");
            return Ok(SendOutcome::Suppressed);
        }

        let mut transaction = self.inner.transaction.lock();
        let id = self.inner.ids.next();
        let message = Message::request(id, class, method, args);
        if transaction.open {
            debug!(hub = %self.name(), id, class, method, "buffering request");
            transaction.buffer.push(message);
            return Ok(SendOutcome::Buffered);
        }

        let frame = self.inner.config.serializer.serialize(&self.sign(&message))?;
        let link = self.inner.link.lock();
        let Some(link) = link.as_ref() else {
            return Err(HubError::NotConnected);
        };
        if let Some(continuation) = continuation {
            self.inner.pending.register(id, continuation);
        }
        if !link.send(Outbound::Frame(frame)) {
            self.inner.pending.cancel(id);
            return Err(HubError::NotConnected);
        }
        self.inner.metrics.record_request_sent();
        debug!(hub = %self.name(), id, class, method, "request sent");
        Ok(SendOutcome::Sent(id))
    }

    /// Sends the response to request `id`.
    pub(super) fn respond(&self, id: u64, class: &str, ret: Option<Value>) -> Result<(), HubError> {
        let frame = self
            .inner
            .config
            .serializer
            .serialize(&self.sign(&Message::response(id, class, ret)))?;
        let link = self.inner.link.lock();
        match link.as_ref() {
            Some(link) if link.send(Outbound::Frame(frame)) => {
                self.inner.metrics.record_response_sent();
                Ok(())
            }
            _ => Err(HubError::NotConnected),
        }
    }

    fn sign(&self, message: &Message) -> FieldMap {
        let mut fields = message.to_fields();
        if let Some(token) = &self.inner.config.validate_token {
            token.sign(&mut fields);
        }
        fields
    }

    // ----- transactions --------------------------------------------------

    /// Starts buffering requests instead of writing them.
    ///
    /// Starting a transaction that is already open keeps what has been
    /// buffered so far.
    pub fn begin_transaction(&self) {
        self.inner.transaction.lock().open = true;
    }

    /// Returns `true` while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.inner.transaction.lock().open
    }

    /// Number of requests buffered by the open transaction.
    pub fn buffered(&self) -> usize {
        self.inner.transaction.lock().buffer.len()
    }

    /// Discards the buffered requests and closes the transaction.
    ///
    /// Returns the number of requests discarded.
    pub fn rollback(&self) -> usize {
        let mut transaction = self.inner.transaction.lock();
        transaction.open = false;
        let discarded = transaction.buffer.len();
        transaction.buffer.clear();
        discarded
    }

    /// Writes every buffered request as one batch and closes the
    /// transaction.
    ///
    /// An empty transaction writes nothing. Returns the number of requests
    /// written.
    ///
    /// # Errors
    ///
    /// [`HubError::NotConnected`] if there is no connection. The
    /// transaction stays open with its buffer intact and is flushed by the
    /// sync pass of the next connection.
    pub fn commit(&self) -> Result<usize, HubError> {
        let mut transaction = self.inner.transaction.lock();
        if transaction.buffer.is_empty() {
            transaction.open = false;
            return Ok(0);
        }

        let link = self.inner.link.lock();
        let Some(link) = link.as_ref() else {
            return Err(HubError::NotConnected);
        };
        let batch: Vec<FieldMap> = transaction.buffer.iter().map(|message| self.sign(message)).collect();
        let frame = self.inner.config.serializer.serialize_batch(&batch)?;
        if !link.send(Outbound::Frame(frame)) {
            return Err(HubError::NotConnected);
        }

        let count = transaction.buffer.len();
        transaction.buffer.clear();
        transaction.open = false;
        for _ in 0..count {
            self.inner.metrics.record_request_sent();
        }
        debug!(hub = %self.name(), count, "transaction committed");
        Ok(count)
    }

    // ----- synchronization -----------------------------------------------

    /// Adds a source of attributes pushed to the peer by [`sync`](Hub::sync).
    pub fn register_syncable(&self, source: SyncSource) {
        self.inner.syncables.write().push(source);
    }

    /// Pushes every registered attribute to the peer as one batch.
    ///
    /// Each attribute becomes a `set<Name>` request carrying its current
    /// value. Requests already buffered by an open transaction go out in
    /// the same write. Returns the number of requests written.
    pub fn sync(&self) -> Result<usize, HubError> {
        let sources = self.inner.syncables.read().clone();
        self.begin_transaction();
        for source in &sources {
            for attribute in source.attributes() {
                let mut args = Args::new();
                // One argument always fits.
                let _ = args.push(attribute.read());
                self.send(source.class(), attribute.setter(), args)?;
            }
        }
        self.commit()
    }

    /// Runs [`sync`](Hub::sync) every `interval` while connected,
    /// replacing any previous schedule.
    pub fn start_periodic_sync(&self, interval: Duration) {
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let hub = Hub { inner };
                if hub.is_connected() {
                    if let Err(error) = hub.sync() {
                        warn!(hub = %hub.name(), %error, "periodic sync failed");
                    }
                }
            }
        });
        if let Some(previous) = self.inner.sync_task.lock().replace(task) {
            previous.abort();
        }
    }

    /// Stops the schedule started by [`start_periodic_sync`](Hub::start_periodic_sync).
    pub fn stop_periodic_sync(&self) {
        if let Some(task) = self.inner.sync_task.lock().take() {
            task.abort();
        }
    }

    // ----- lifecycle -----------------------------------------------------

    /// Current connection state.
    pub fn state(&self) -> HubState {
        *self.inner.state.borrow()
    }

    /// Returns `true` while connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// The current connection, if any.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        match self.state() {
            HubState::Connected(id) => Some(id),
            HubState::Disconnected | HubState::Connecting => None,
        }
    }

    /// A receiver that observes every state change.
    pub fn state_changes(&self) -> watch::Receiver<HubState> {
        self.inner.state.subscribe()
    }

    /// Subscribes to connect and disconnect events.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.inner.events.subscribe()
    }

    /// Counters for this hub.
    pub fn metrics(&self) -> &HubMetrics {
        &self.inner.metrics
    }

    /// Number of calls awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.len()
    }

    /// The address used by [`connect_to_server`](Hub::connect_to_server)
    /// and the reconnect loop.
    pub fn address(&self) -> Option<String> {
        self.inner.address.lock().clone()
    }

    /// Returns `true` if the hub reconnects after losing its connection.
    pub fn auto_reconnect(&self) -> bool {
        self.inner.auto_reconnect.load(Ordering::Acquire)
    }

    /// Turns automatic reconnection on or off.
    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.inner.auto_reconnect.store(enabled, Ordering::Release);
        if !enabled {
            self.stop_reconnect_loop();
        }
    }

    /// Connects to `address`, or to the address of the previous connect
    /// when `None`.
    ///
    /// On success the sync pass runs, flushing any open transaction. On
    /// failure with auto-reconnect enabled the reconnect loop keeps trying
    /// in the background.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidConfiguration`](crate::transport::TransportError::InvalidConfiguration)
    /// if no address is known, or the connect failure.
    pub async fn connect_to_server(&self, address: Option<String>) -> Result<ConnectionId, HubError> {
        if let Some(address) = address {
            *self.inner.address.lock() = Some(address);
        }
        self.stop_reconnect_loop();
        match self.establish().await {
            Ok(connection) => Ok(connection),
            Err(HubError::Transport(TransportError::InvalidConfiguration { reason })) => {
                Err(TransportError::InvalidConfiguration { reason }.into())
            }
            Err(error) => {
                if self.auto_reconnect() {
                    self.start_reconnect_loop();
                }
                Err(error)
            }
        }
    }

    /// Closes the connection without reconnecting.
    ///
    /// Auto-reconnect is switched off first, and every pending call is
    /// failed with [`CallError::ConnectionLost`] before this returns.
    pub fn disconnect_from_server(&self) {
        self.inner.auto_reconnect.store(false, Ordering::Release);
        self.stop_reconnect_loop();
        self.close();
    }

    pub(super) fn stop_reconnect_loop(&self) {
        if let Some(task) = self.inner.reconnect_task.lock().take() {
            task.abort();
        }
    }
}
