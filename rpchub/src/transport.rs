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

//! Transport layer abstractions for rpchub.
//!
//! A hub speaks over any bidirectional byte stream implementing
//! [`Transport`]:
//!
//! - [`TcpTransport`]: TCP/IP networking, used by clients and the server
//! - [`MemoryTransport`]: in-memory channels for tests and in-process peers
//!
//! # The Transport Trait
//!
//! The [`Transport`] trait extends `AsyncRead + AsyncWrite` with connection
//! metadata:
//!
//! ```rust
//! use rpchub::transport::Transport;
//!
//! fn describe<T: Transport>(transport: &T) {
//!     let metadata = transport.metadata();
//!     println!("{} peer {:?}", metadata.id, metadata.peer_addr);
//! }
//! ```
//!
//! # Error Handling
//!
//! ```rust,no_run
//! use rpchub::transport::{TcpTransport, TransportError};
//!
//! # async fn example() {
//! match TcpTransport::connect("127.0.0.1:4000").await {
//!     Ok(_) => println!("connected"),
//!     Err(TransportError::ConnectionFailed { address, source }) => {
//!         eprintln!("failed to connect to {address}: {source}");
//!     }
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! # }
//! ```

mod error;
mod memory;
mod tcp;
mod traits;
mod types;

pub use self::error::TransportError;
pub use self::memory::MemoryTransport;
pub use self::tcp::TcpTransport;
pub use self::traits::Transport;
pub use self::types::{ConnectionId, TransportMetadata};
