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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod call;
pub mod dispatch;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod reconnection;
pub mod serialization;
pub mod server;
pub mod transport;

pub use call::{CallError, CallResult, PendingReply};
pub use dispatch::{DispatchError, DispatchTarget, TargetRegistry};
pub use error::HubError;
pub use hub::{Hub, HubConfig, HubEvent, HubState, RemoteObject, SendOutcome, SyncSource};
pub use protocol::{Args, FromValue, IntoValue, Message, ValidateToken, Value};
pub use reconnection::{FixedDelay, ReconnectionStrategy};
pub use serialization::{JsonSerializer, Serializer};
pub use server::{Peer, Server, ServerConfig, ServerEvent};
pub use transport::{TcpTransport, Transport, TransportError};
