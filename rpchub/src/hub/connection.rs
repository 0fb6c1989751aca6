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

//! Connection plumbing: the writer task, the read loop, inbound dispatch,
//! teardown and the reconnect loop.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::call::CallError;
use crate::dispatch::DispatchError;
use crate::error::HubError;
use crate::hub::hub::HubInner;
use crate::hub::{Hub, HubEvent, HubMetrics, HubState};
use crate::protocol::{FieldMap, Message, MessageKind, ProtocolError};
use crate::transport::{ConnectionId, TcpTransport, Transport, TransportError};

/// Work queued for the writer task.
pub(super) enum Outbound {
    /// One serialized message or batch, written with a single write call.
    Frame(Vec<u8>),
    /// Flush what was queued before, then shut the connection down.
    Close,
}

/// The hub's handle on its live connection.
pub(super) struct Link {
    pub(super) id: ConnectionId,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Link {
    /// Queues `item` for the writer; `false` if the writer has stopped.
    pub(super) fn send(&self, item: Outbound) -> bool {
        self.outbound.send(item).is_ok()
    }
}

impl Hub {
    /// Binds the hub to an established transport.
    ///
    /// Any previous connection is closed and its pending calls fail with
    /// [`CallError::ConnectionLost`]. The hub moves to
    /// [`HubState::Connected`], publishes [`HubEvent::Connected`] and runs a
    /// sync pass. Must be called within a Tokio runtime.
    pub fn attach<T: Transport>(&self, transport: T) -> ConnectionId {
        let metadata = transport.metadata().clone();
        let connection = metadata.id;
        let (reader, writer) = tokio::io::split(transport);
        let (outbound, queue) = mpsc::unbounded_channel();
        let (stopped, writer_stopped) = oneshot::channel();

        // Calls of the old connection are failed before the new link is
        // visible, so nothing registered on the new one is caught by it.
        let previous = self.inner.link.lock().take();
        if let Some(previous) = previous {
            previous.send(Outbound::Close);
            self.connection_lost(
                previous.id,
                TransportError::connection_lost("replaced by a new connection"),
            );
        }
        *self.inner.link.lock() = Some(Link { id: connection, outbound });

        self.inner.state.send_replace(HubState::Connected(connection));
        self.inner.config.reconnection_strategy.on_connected();
        info!(hub = %self.name(), %metadata, "connected");
        let _ = self.inner.events.send(HubEvent::Connected { connection });

        tokio::spawn(write_loop(
            writer,
            queue,
            stopped,
            Arc::clone(&self.inner.metrics),
            self.name().to_string(),
        ));
        tokio::spawn(read_loop(Arc::downgrade(&self.inner), connection, reader, writer_stopped));

        if let Err(error) = self.sync() {
            debug!(hub = %self.name(), %error, "sync after connect failed");
        }
        connection
    }

    /// Connects to the stored address and attaches the connection.
    pub(super) async fn establish(&self) -> Result<ConnectionId, HubError> {
        if let HubState::Connected(connection) = self.state() {
            return Ok(connection);
        }
        let address = self.address().ok_or_else(|| TransportError::InvalidConfiguration {
            reason: "no server address to connect to".to_string(),
        })?;

        self.inner.state.send_replace(HubState::Connecting);
        debug!(hub = %self.name(), %address, "connecting");
        match TcpTransport::connect(address.clone()).await {
            Ok(transport) => Ok(self.attach(transport)),
            Err(error) => {
                self.inner.state.send_if_modified(|state| {
                    let connecting = *state == HubState::Connecting;
                    if connecting {
                        *state = HubState::Disconnected;
                    }
                    connecting
                });
                self.inner.config.reconnection_strategy.on_disconnected(&error);
                warn!(hub = %self.name(), %address, %error, "connect failed");
                Err(error.into())
            }
        }
    }

    /// Closes the current connection, if any.
    pub(crate) fn close(&self) {
        let connection = self.inner.link.lock().as_ref().map(|link| link.id);
        if let Some(connection) = connection {
            self.detach(connection, TransportError::Closed);
        }
    }

    /// Tears down `connection` if it is still the live one.
    fn detach(&self, connection: ConnectionId, error: TransportError) {
        let link = {
            let mut link = self.inner.link.lock();
            if link.as_ref().is_some_and(|link| link.id == connection) {
                link.take()
            } else {
                None
            }
        };
        let Some(link) = link else {
            return;
        };
        link.send(Outbound::Close);
        drop(link);

        self.inner.state.send_if_modified(|state| {
            let current = *state == HubState::Connected(connection);
            if current {
                *state = HubState::Disconnected;
            }
            current
        });
        self.connection_lost(connection, error);

        if self.auto_reconnect() {
            self.start_reconnect_loop();
        }
    }

    fn connection_lost(&self, connection: ConnectionId, error: TransportError) {
        let failed_calls = self.inner.pending.fail_all(CallError::ConnectionLost);
        self.inner.config.reconnection_strategy.on_disconnected(&error);
        info!(hub = %self.name(), %connection, %error, failed_calls, "disconnected");
        let _ = self.inner.events.send(HubEvent::Disconnected {
            connection,
            reason: error.to_string(),
            failed_calls,
        });
    }

    pub(super) fn start_reconnect_loop(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            warn!(hub = %self.name(), "no runtime available, not reconnecting");
            return;
        }
        let task = tokio::spawn(reconnect_loop(Arc::downgrade(&self.inner)));
        if let Some(previous) = self.inner.reconnect_task.lock().replace(task) {
            previous.abort();
        }
    }

    /// Handles one decoded message.
    fn process(&self, fields: FieldMap) {
        self.inner.metrics.record_message_received();
        let message = match Message::from_fields(&fields) {
            Ok(message) => message,
            Err(error) => {
                self.inner.metrics.record_protocol_error();
                warn!(hub = %self.name(), %error, "dropping malformed message");
                return;
            }
        };
        if let Some(token) = &self.inner.config.validate_token {
            if let Err(error) = token.verify(&fields) {
                self.inner.metrics.record_auth_failure();
                warn!(hub = %self.name(), id = message.id, class = %message.class, %error, "dropping unauthenticated message");
                return;
            }
        }

        match message.kind {
            MessageKind::Response => {
                if !self.inner.pending.complete(message.id, message.ret) {
                    debug!(hub = %self.name(), id = message.id, "response matches no pending call");
                }
            }
            MessageKind::Request => self.dispatch(message),
        }
    }

    /// Runs an inbound request on the blocking pool and answers it.
    fn dispatch(&self, message: Message) {
        let Message {
            id, class, method, args, ..
        } = message;
        let method = method.unwrap_or_default();

        let invocation = match self.inner.dispatcher.resolve(&class, &method) {
            Ok(invocation) => invocation,
            Err(error) => {
                self.inner.metrics.record_dispatch_failure();
                warn!(hub = %self.name(), id, %error, "dropping request");
                return;
            }
        };
        let Some(guard) = self.inner.locks.try_acquire(invocation.key()) else {
            self.inner.metrics.record_dispatch_failure();
            let error = DispatchError::Reentrant { key: invocation.key() };
            warn!(hub = %self.name(), id, %error, "dropping request");
            return;
        };

        debug!(hub = %self.name(), id, %class, %method, "dispatching request");
        let hub = self.clone();
        tokio::task::spawn_blocking(move || {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| invocation.invoke(args)));
            drop(guard);

            let error = match result {
                Ok(Ok(ret)) => {
                    if let Err(error) = hub.respond(id, &class, ret) {
                        debug!(hub = %hub.name(), id, %error, "response not sent");
                    }
                    return;
                }
                Ok(Err(error)) => error,
                Err(_) => DispatchError::Invocation {
                    class,
                    method,
                    reason: "handler panicked".to_string(),
                },
            };
            hub.inner.metrics.record_dispatch_failure();
            warn!(hub = %hub.name(), id, %error, "request failed, no response sent");
        });
    }
}

/// Writes queued frames until closed. The reader learns why the writer
/// stopped through `stopped`.
async fn write_loop<W>(
    mut writer: W,
    mut queue: mpsc::UnboundedReceiver<Outbound>,
    stopped: oneshot::Sender<TransportError>,
    metrics: Arc<HubMetrics>,
    name: String,
) where
    W: AsyncWrite + Unpin,
{
    let reason = loop {
        match queue.recv().await {
            Some(Outbound::Frame(frame)) => {
                if let Err(error) = write_frame(&mut writer, &frame).await {
                    error!(hub = %name, %error, "write failed");
                    break error;
                }
                metrics.record_frame_written();
            }
            Some(Outbound::Close) | None => break TransportError::Closed,
        }
    };
    let _ = writer.shutdown().await;
    let _ = stopped.send(reason);
}

async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(frame)
        .await
        .map_err(|source| TransportError::WriteFailed { source })?;
    writer
        .flush()
        .await
        .map_err(|source| TransportError::WriteFailed { source })
}

async fn read_loop<R>(
    weak: Weak<HubInner>,
    connection: ConnectionId,
    mut reader: R,
    mut writer_stopped: oneshot::Receiver<TransportError>,
) where
    R: AsyncRead + Unpin,
{
    let Some((serializer, read_buffer_size, max_frame_size)) = weak.upgrade().map(|inner| {
        (
            Arc::clone(&inner.config.serializer),
            inner.config.read_buffer_size,
            inner.config.max_frame_size,
        )
    }) else {
        return;
    };

    let mut buffer = Vec::with_capacity(read_buffer_size);
    let reason = loop {
        buffer.reserve(read_buffer_size);
        let read = tokio::select! {
            stopped = &mut writer_stopped => break stopped.unwrap_or(TransportError::Closed),
            read = reader.read_buf(&mut buffer) => read,
        };
        match read {
            Ok(0) => break TransportError::connection_lost("peer closed the connection"),
            Ok(_) => {}
            Err(source) => break TransportError::ReadFailed { source },
        }

        let decoded = serializer.decode(&mut buffer);
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let hub = Hub { inner };
        for item in decoded {
            match item {
                Ok(fields) => hub.process(fields),
                Err(error) => {
                    hub.inner.metrics.record_protocol_error();
                    warn!(hub = %hub.name(), %error, "dropping malformed input");
                }
            }
        }
        if buffer.len() > max_frame_size {
            hub.inner.metrics.record_protocol_error();
            let error = ProtocolError::FrameTooLarge {
                size: buffer.len(),
                limit: max_frame_size,
            };
            warn!(hub = %hub.name(), %error, "discarding buffered input");
            buffer.clear();
        }
    };

    if let Some(inner) = weak.upgrade() {
        Hub { inner }.detach(connection, reason);
    }
}

async fn reconnect_loop(weak: Weak<HubInner>) {
    let mut attempt = 0u32;
    let mut last_error = TransportError::connection_lost("connection lost");
    loop {
        let (strategy, name) = {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let hub = Hub { inner };
            if !hub.auto_reconnect() || hub.is_connected() {
                return;
            }
            (
                Arc::clone(&hub.inner.config.reconnection_strategy),
                hub.name().to_string(),
            )
        };

        if !strategy.should_reconnect(attempt, &last_error).await {
            warn!(hub = %name, attempts = attempt, error = %last_error, "giving up reconnecting");
            return;
        }
        let delay = strategy.next_delay(attempt).await;
        debug!(hub = %name, attempt, ?delay, "reconnecting");
        tokio::time::sleep(delay).await;

        let Some(inner) = weak.upgrade() else {
            return;
        };
        let hub = Hub { inner };
        if !hub.auto_reconnect() || hub.is_connected() {
            return;
        }
        hub.inner.metrics.record_reconnect_attempt();
        match hub.establish().await {
            Ok(connection) => {
                info!(hub = %name, %connection, attempt, "reconnected");
                return;
            }
            Err(HubError::Transport(error)) => last_error = error,
            Err(error) => last_error = TransportError::connection_lost(error.to_string()),
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::args;
    use crate::dispatch::DispatchTarget;
    use crate::hub::HubConfig;
    use crate::protocol::Value;
    use crate::serialization::{JsonSerializer, Serializer};
    use crate::transport::MemoryTransport;

    fn pair() -> (Hub, Hub) {
        let (left, right) = MemoryTransport::pair_default();
        let client = Hub::new(HubConfig::default().with_name("client"));
        let server = Hub::new(HubConfig::default().with_name("server"));
        client.attach(left);
        server.attach(right);
        (client, server)
    }

    /// Counters are bumped after the frame is queued, so the peer can see
    /// the frame first.
    async fn wait_for_count(read: impl Fn() -> u64, expected: u64) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while read() != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_call_round_trip() {
        let (client, server) = pair();
        server.register_target(DispatchTarget::new("Math").method("add", |a: i64, b: i64| a + b));

        let sum = client.call("Math", "add", args![2, 3]).await.unwrap();
        assert_eq!(sum, Some(Value::Int(5)));
        assert_eq!(client.pending_calls(), 0);
        wait_for_count(|| server.metrics().responses_sent(), 1).await;
    }

    #[tokio::test]
    async fn test_void_method_resolves_with_none() {
        let (client, server) = pair();
        server.register_target(DispatchTarget::new("Log").method("write", |_line: String| {}));

        let ret = client.call("Log", "write", args!["hello"]).await.unwrap();
        assert_eq!(ret, None);
    }

    #[tokio::test]
    async fn test_unknown_class_gets_no_response() {
        let (client, server) = pair();

        let result = client
            .call_timeout("Nobody", "home", args![], Duration::from_millis(100))
            .await;
        assert!(matches!(result, Err(HubError::Call(CallError::Timeout { .. }))));
        assert_eq!(client.pending_calls(), 0);
        assert_eq!(server.metrics().dispatch_failures(), 1);
    }

    #[tokio::test]
    async fn test_malformed_input_is_dropped() {
        let (raw, right) = MemoryTransport::pair_default();
        let hub = Hub::new(HubConfig::default());
        hub.register_target(DispatchTarget::new("Echo").method("echo", |v: Value| v));
        hub.attach(right);

        let (mut reader, mut writer) = tokio::io::split(raw);
        writer.write_all(br#"{"type":"request","id":"1; drop","class":"Echo","method":"echo"}"#).await.unwrap();
        writer.write_all(br#"{"type":"request","id":7,"class":"Echo","method":"echo","val0":"hi"}"#).await.unwrap();

        let mut buffer = vec![0u8; 1024];
        let n = tokio::time::timeout(Duration::from_secs(5), reader.read(&mut buffer))
            .await
            .unwrap()
            .unwrap();
        let mut bytes = buffer[..n].to_vec();
        let messages = JsonSerializer::new().decode(&mut bytes);
        assert_eq!(messages.len(), 1);
        let response = Message::from_fields(messages[0].as_ref().unwrap()).unwrap();
        assert_eq!(response.id, 7);
        assert_eq!(response.ret, Some(Value::String("hi".to_string())));
        assert_eq!(hub.metrics().protocol_errors(), 1);
    }

    #[tokio::test]
    async fn test_peer_close_fails_pending_calls() {
        let (client, server) = pair();
        let mut events = client.subscribe();
        let mut server_events = server.subscribe();

        let reply = client.invoke("Slow", "never", args![]).unwrap();
        assert_eq!(client.pending_calls(), 1);
        server.disconnect_from_server();

        let result = tokio::time::timeout(Duration::from_secs(5), reply).await.unwrap();
        assert_eq!(result, Err(CallError::ConnectionLost));
        assert_eq!(client.pending_calls(), 0);
        assert_eq!(client.state(), HubState::Disconnected);

        match events.recv().await.unwrap() {
            HubEvent::Disconnected { failed_calls, reason, .. } => {
                assert_eq!(failed_calls, 1);
                assert_eq!(reason, "connection lost: peer closed the connection");
            }
            other => panic!("unexpected event {other:?}"),
        }
        match server_events.recv().await.unwrap() {
            HubEvent::Disconnected { reason, .. } => assert_eq!(reason, "transport is closed"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_attach_replaces_connection() {
        let (client, server) = pair();
        server.register_target(DispatchTarget::new("Math").method("add", |a: i64, b: i64| a + b));
        let first = client.connection_id().unwrap();
        let mut events = client.subscribe();

        let stale = client.invoke("Slow", "never", args![]).unwrap();
        let (left, right) = MemoryTransport::pair_default();
        let second = client.attach(left);
        server.attach(right);
        assert_ne!(first, second);

        let result = tokio::time::timeout(Duration::from_secs(5), stale).await.unwrap();
        assert_eq!(result, Err(CallError::ConnectionLost));
        match events.recv().await.unwrap() {
            HubEvent::Disconnected { connection, failed_calls, .. } => {
                assert_eq!(connection, first);
                assert_eq!(failed_calls, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }

        let sum = client.call("Math", "add", args![1, 2]).await.unwrap();
        assert_eq!(sum, Some(Value::Int(3)));
        assert_eq!(client.connection_id(), Some(second));
    }

    #[tokio::test]
    async fn test_send_while_disconnected() {
        let hub = Hub::new(HubConfig::default());
        assert!(matches!(hub.send("A", "b", args![]), Err(HubError::NotConnected)));
        assert!(matches!(hub.invoke("A", "b", args![]), Err(HubError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_without_address() {
        let hub = Hub::new(HubConfig::default().with_auto_reconnect(true));
        let result = hub.connect_to_server(None).await;
        assert!(matches!(
            result,
            Err(HubError::Transport(TransportError::InvalidConfiguration { .. }))
        ));
        assert_eq!(hub.state(), HubState::Disconnected);
    }
}
