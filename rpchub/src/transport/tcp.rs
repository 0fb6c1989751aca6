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

//! TCP transport implementation.
//!
//! This module provides the TCP transport hubs connect and listen with,
//! built on Tokio's `TcpStream`.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use crate::transport::{Transport, TransportError, TransportMetadata};

/// TCP transport implementation.
///
/// `TcpTransport` wraps a Tokio `TcpStream` and implements [`Transport`].
/// Nagle's algorithm is disabled on every stream it wraps, since hub traffic
/// consists of small request and response messages.
///
/// # Examples
///
/// ```rust,no_run
/// use rpchub::transport::TcpTransport;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let listener = TcpTransport::bind("127.0.0.1:4000").await?;
/// let (transport, peer_addr) = TcpTransport::accept(&listener).await?;
/// println!("Accepted connection from {peer_addr}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    metadata: TransportMetadata,
}

impl TcpTransport {
    /// Creates a new TCP transport from an existing stream.
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        if let Err(err) = stream.set_nodelay(true) {
            warn!(%peer_addr, error = %err, "failed to set TCP_NODELAY");
        }

        let metadata = TransportMetadata::new("tcp")
            .with_local_addr(local_addr)
            .with_peer_addr(peer_addr);
        debug!(connection = %metadata.id, %local_addr, %peer_addr, "created TCP transport");

        Ok(Self { stream, metadata })
    }

    /// Creates a transport from a standard library stream, for handing a
    /// connection over to another runtime.
    ///
    /// Must be called from within the runtime that will drive the transport.
    pub fn from_std(stream: std::net::TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Self::from_stream(TcpStream::from_std(stream)?)
    }

    /// Releases the stream from the current runtime so another runtime can
    /// adopt it with [`TcpTransport::from_std`].
    pub fn into_std(self) -> io::Result<std::net::TcpStream> {
        self.stream.into_std()
    }

    /// Connects to a remote TCP endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError::ConnectionFailed`] if the connection cannot
    /// be established.
    pub async fn connect(addr: impl Into<String>) -> Result<Self, TransportError> {
        let address = addr.into();
        debug!(%address, "connecting to TCP endpoint");

        let stream = TcpStream::connect(&address)
            .await
            .map_err(|source| TransportError::ConnectionFailed {
                address: address.clone(),
                source,
            })?;

        Self::from_stream(stream).map_err(|source| TransportError::Io { source })
    }

    /// Binds a listener on a local address.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError::BindFailed`] if the address cannot be bound.
    pub async fn bind(addr: impl Into<String>) -> Result<TcpListener, TransportError> {
        let address = addr.into();
        TcpListener::bind(&address)
            .await
            .map_err(|source| TransportError::BindFailed { address, source })
    }

    /// Accepts an incoming connection from a listener.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError::Io`] if accepting the connection fails.
    pub async fn accept(listener: &TcpListener) -> Result<(Self, SocketAddr), TransportError> {
        let (stream, peer_addr) = listener.accept().await?;
        let transport = Self::from_stream(stream)?;
        Ok((transport, peer_addr))
    }

    /// Returns the local address of this transport.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    /// Returns the peer address of this transport.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Sets the TCP_NODELAY option on the underlying socket.
    pub fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        self.stream.set_nodelay(nodelay)
    }

    /// Gets the TCP_NODELAY option on the underlying socket.
    pub fn nodelay(&self) -> io::Result<bool> {
        self.stream.nodelay()
    }
}

impl Transport for TcpTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }
}

impl AsyncRead for TcpTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpTransport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_tcp_connect_and_echo() {
        let listener = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut transport, _) = TcpTransport::accept(&listener).await.unwrap();
            let mut buffer = vec![0u8; 1024];
            let n = transport.read(&mut buffer).await.unwrap();
            transport.write_all(&buffer[..n]).await.unwrap();
        });

        let mut client = TcpTransport::connect(addr.to_string()).await.unwrap();
        client.write_all(b"Hello, server!").await.unwrap();

        let mut buffer = vec![0u8; 1024];
        let n = client.read(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..n], b"Hello, server!");
    }

    #[tokio::test]
    async fn test_tcp_metadata_and_nodelay() {
        let listener = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let _ = TcpTransport::accept(&listener).await;
        });

        let transport = TcpTransport::connect(addr.to_string()).await.unwrap();
        let metadata = transport.metadata();
        assert_eq!(metadata.transport_type, "tcp");
        assert_eq!(metadata.peer_addr, Some(addr));
        assert!(transport.nodelay().unwrap());
    }

    #[tokio::test]
    async fn test_tcp_connection_refused() {
        let listener = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        match TcpTransport::connect(addr.clone()).await {
            Err(TransportError::ConnectionFailed { address, .. }) => assert_eq!(address, addr),
            other => panic!("Expected ConnectionFailed error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tcp_bind_failure() {
        let listener = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let result = TcpTransport::bind(addr).await;
        assert!(matches!(result, Err(TransportError::BindFailed { .. })));
    }

    #[test]
    fn test_std_hand_off_between_runtimes() {
        let first = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (std_stream, listener) = first.block_on(async {
            let listener = TcpTransport::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let client = TcpTransport::connect(addr.to_string()).await.unwrap();
            (client.into_std().unwrap(), listener)
        });

        let second = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        second.block_on(async move {
            let mut client = TcpTransport::from_std(std_stream).unwrap();
            let listener = TcpListener::from_std(listener.into_std().unwrap()).unwrap();
            let (mut server, _) = TcpTransport::accept(&listener).await.unwrap();
            client.write_all(b"moved").await.unwrap();
            let mut buffer = [0u8; 5];
            server.read_exact(&mut buffer).await.unwrap();
            assert_eq!(&buffer, b"moved");
        });
    }
}
