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

//! Pending-call bookkeeping and request correlation.
//!
//! - **[`RequestIdGenerator`]**: per-hub request ids with wrap-around
//! - **[`PendingCalls`]**: request id to [`Continuation`] registry
//! - **[`PendingReply`]**: awaitable or blocking handle on one call
//! - **[`CallError`]**: failures delivered to continuations
//!
//! Three calling conventions sit on top of this: fire-and-forget (nothing is
//! registered), callback ([`Continuation::Callback`]) and waiting
//! ([`Continuation::Waiter`] behind a [`PendingReply`]).

mod error;
mod id;
mod pending;
mod reply;

pub use error::CallError;
pub use id::{MAX_REQUEST_ID, RequestIdGenerator};
pub use pending::{CallResult, Continuation, PendingCalls};
pub use reply::PendingReply;
