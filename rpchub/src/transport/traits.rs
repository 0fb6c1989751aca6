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

//! Core transport trait definition.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::transport::TransportMetadata;

/// A bidirectional byte stream a hub can be attached to.
///
/// Implementations are split into read and write halves by the hub, so the
/// only requirement beyond async I/O is to describe the connection. Closing
/// goes through [`AsyncWrite::poll_shutdown`], which must make the remote
/// side observe end of stream.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Returns metadata about this connection.
    fn metadata(&self) -> &TransportMetadata;
}
