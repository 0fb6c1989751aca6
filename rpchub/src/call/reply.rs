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

//! Awaitable handle for a single pending call.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::call::{CallError, CallResult};

/// The eventual result of a call registered with a waiter continuation.
///
/// Await it from async code or call [`PendingReply::blocking_wait`] from a
/// plain thread. Either way the wait ends when the response arrives or when
/// the hub fails its pending calls on disconnect; it never outlives the
/// connection.
#[derive(Debug)]
#[must_use = "a pending reply does nothing unless awaited"]
pub struct PendingReply {
    id: u64,
    receiver: oneshot::Receiver<CallResult>,
}

impl PendingReply {
    pub(crate) fn new(id: u64, receiver: oneshot::Receiver<CallResult>) -> Self {
        Self { id, receiver }
    }

    /// Request id the reply is correlated with.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Blocks the current thread until the call resolves.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context, as
    /// `tokio::sync::oneshot::Receiver::blocking_recv` does. Use `.await`
    /// there instead.
    pub fn blocking_wait(self) -> CallResult {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(CallError::ConnectionLost))
    }
}

impl Future for PendingReply {
    type Output = CallResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(CallError::ConnectionLost)))
    }
}
