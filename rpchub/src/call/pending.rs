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

//! Tracking of calls awaiting their response.
//!
//! A pending call is created when a request is written and resolved exactly
//! once: by the matching response, by an explicit cancel, or by connection
//! loss. Removal from the registry happens under the lock and resolution
//! happens after it is released, so a continuation can freely issue new
//! calls on the same hub.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::call::{CallError, PendingReply};
use crate::protocol::Value;

/// Outcome delivered to a pending call: the return value (absent for void
/// methods) or the reason it failed.
pub type CallResult = Result<Option<Value>, CallError>;

/// How the result of a pending call reaches the caller.
pub enum Continuation {
    /// Invoked once on the task that processes the response.
    Callback(Box<dyn FnOnce(CallResult) + Send>),
    /// Wakes a caller suspended on a [`PendingReply`].
    Waiter(oneshot::Sender<CallResult>),
}

impl Continuation {
    /// Wraps a closure as a callback continuation.
    pub fn callback(callback: impl FnOnce(CallResult) + Send + 'static) -> Self {
        Continuation::Callback(Box::new(callback))
    }

    fn resolve(self, result: CallResult) {
        match self {
            Continuation::Callback(callback) => callback(result),
            Continuation::Waiter(sender) => {
                // The waiter may have given up already.
                let _ = sender.send(result);
            }
        }
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Continuation::Callback(_) => f.write_str("Callback"),
            Continuation::Waiter(_) => f.write_str("Waiter"),
        }
    }
}

/// Pending calls of one hub, keyed by request id.
///
/// # Thread Safety
///
/// The registry uses a `parking_lot` mutex so it can be used from async
/// tasks and from plain threads blocked on a call alike. The lock is never
/// held while a continuation runs.
///
/// # Example
///
/// ```rust
/// use rpchub::call::PendingCalls;
/// use rpchub::protocol::Value;
///
/// # async fn example() {
/// let pending = PendingCalls::new();
/// let reply = pending.wait_for(42);
///
/// assert!(pending.complete(42, Some(Value::Int(7))));
/// assert_eq!(reply.await, Ok(Some(Value::Int(7))));
/// assert!(pending.is_empty());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PendingCalls {
    calls: Mutex<HashMap<u64, Continuation>>,
}

impl PendingCalls {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a continuation under `id`.
    ///
    /// A continuation already registered under the same id is resolved with
    /// [`CallError::ConnectionLost`]; it belongs to a call whose id has
    /// wrapped around and can no longer be matched.
    pub fn register(&self, id: u64, continuation: Continuation) {
        let previous = self.calls.lock().insert(id, continuation);
        if let Some(previous) = previous {
            previous.resolve(Err(CallError::ConnectionLost));
        }
    }

    /// Registers a waiter under `id` and returns the future that resolves
    /// with its result.
    #[must_use]
    pub fn wait_for(&self, id: u64) -> PendingReply {
        let (sender, receiver) = oneshot::channel();
        self.register(id, Continuation::Waiter(sender));
        PendingReply::new(id, receiver)
    }

    /// Resolves the call registered under `id` with its return value.
    ///
    /// Returns `false` if no call is registered under `id` (already
    /// resolved, cancelled, or from an earlier connection).
    pub fn complete(&self, id: u64, ret: Option<Value>) -> bool {
        self.resolve(id, Ok(ret))
    }

    /// Resolves the call registered under `id` with a failure.
    pub fn fail(&self, id: u64, error: CallError) -> bool {
        self.resolve(id, Err(error))
    }

    /// Removes the call registered under `id` without resolving it.
    pub fn cancel(&self, id: u64) -> bool {
        self.calls.lock().remove(&id).is_some()
    }

    /// Resolves every registered call with `error` and empties the registry.
    ///
    /// Returns the number of calls resolved.
    pub fn fail_all(&self, error: CallError) -> usize {
        let drained: Vec<_> = self.calls.lock().drain().collect();
        let count = drained.len();
        for (_, continuation) in drained {
            continuation.resolve(Err(error.clone()));
        }
        count
    }

    /// Returns `true` if a call is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.calls.lock().contains_key(&id)
    }

    /// Number of calls awaiting a response.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns `true` if no call awaits a response.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    fn resolve(&self, id: u64, result: CallResult) -> bool {
        let continuation = self.calls.lock().remove(&id);
        match continuation {
            Some(continuation) => {
                continuation.resolve(result);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_wait_and_complete() {
        let pending = PendingCalls::new();
        let reply = pending.wait_for(42);
        assert_eq!(pending.len(), 1);

        assert!(pending.complete(42, Some(Value::String("ok".into()))));
        assert_eq!(reply.await, Ok(Some(Value::String("ok".into()))));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_complete_nonexistent() {
        let pending = PendingCalls::new();
        assert!(!pending.complete(99, None));
    }

    #[test]
    fn test_callback_resolves_once() {
        let pending = PendingCalls::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        pending.register(
            1,
            Continuation::callback(move |result| {
                assert_eq!(result, Ok(None));
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(pending.complete(1, None));
        assert!(!pending.complete(1, None));
        assert!(!pending.fail(1, CallError::ConnectionLost));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_drops_waiter() {
        let pending = PendingCalls::new();
        let reply = pending.wait_for(42);

        assert!(pending.cancel(42));
        assert!(!pending.cancel(42));
        assert_eq!(reply.await, Err(CallError::ConnectionLost));
    }

    #[tokio::test]
    async fn test_fail_all() {
        let pending = PendingCalls::new();
        let replies: Vec<_> = (1..=5).map(|id| pending.wait_for(id)).collect();
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        pending.register(
            6,
            Continuation::callback(move |result| {
                assert_eq!(result, Err(CallError::ConnectionLost));
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(pending.fail_all(CallError::ConnectionLost), 6);
        assert!(pending.is_empty());
        for reply in replies {
            assert_eq!(reply.await, Err(CallError::ConnectionLost));
        }
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_may_reenter_registry() {
        let pending = Arc::new(PendingCalls::new());
        let inner = pending.clone();
        pending.register(
            1,
            Continuation::callback(move |_| {
                inner.register(2, Continuation::callback(|_| {}));
            }),
        );

        assert!(pending.complete(1, None));
        assert!(pending.contains(2));
    }

    #[tokio::test]
    async fn test_out_of_order_completion() {
        let pending = PendingCalls::new();
        let first = pending.wait_for(1);
        let second = pending.wait_for(2);

        pending.complete(2, Some(Value::Int(2)));
        pending.complete(1, Some(Value::Int(1)));

        assert_eq!(first.await, Ok(Some(Value::Int(1))));
        assert_eq!(second.await, Ok(Some(Value::Int(2))));
    }
}
