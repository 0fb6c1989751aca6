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

//! Stub seam for calling one class of the peer.

use std::time::Duration;

use crate::call::{CallResult, PendingReply};
use crate::error::HubError;
use crate::hub::{Hub, SendOutcome};
use crate::protocol::{Args, FromValue, Value};

/// A handle on a class exposed by the peer.
///
/// This is what a typed stub wraps: each method of the stub forwards to
/// one of the delivery styles below with its own method name.
///
/// ```rust,no_run
/// use rpchub::hub::{Hub, HubConfig};
/// use rpchub::args;
///
/// # async fn example(hub: Hub) -> Result<(), rpchub::HubError> {
/// let server = hub.remote("Server");
/// server.notify("log", args!["starting"])?;
/// let slot: i64 = server.call_as("getRandomNumberSlot", args![]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RemoteObject {
    hub: Hub,
    class: String,
}

impl RemoteObject {
    pub(crate) fn new(hub: Hub, class: String) -> Self {
        Self { hub, class }
    }

    /// The remote class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The hub calls go through.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Fire-and-forget. See [`Hub::send`].
    pub fn notify(&self, method: &str, args: Args) -> Result<SendOutcome, HubError> {
        self.hub.send(&self.class, method, args)
    }

    /// Callback delivery. See [`Hub::call_with`].
    pub fn call_with(
        &self,
        method: &str,
        args: Args,
        callback: impl FnOnce(CallResult) + Send + 'static,
    ) -> Result<SendOutcome, HubError> {
        self.hub.call_with(&self.class, method, args, callback)
    }

    /// Awaitable or blocking delivery. See [`Hub::invoke`].
    pub fn invoke(&self, method: &str, args: Args) -> Result<PendingReply, HubError> {
        self.hub.invoke(&self.class, method, args)
    }

    /// Waits for the untyped return value. See [`Hub::call`], including
    /// its note on concurrent calls to the same method.
    pub async fn call(&self, method: &str, args: Args) -> Result<Option<Value>, HubError> {
        self.hub.call(&self.class, method, args).await
    }

    /// Waits for the return value converted to `T`.
    ///
    /// A void result converts like an absent argument: `Option` yields
    /// `None` and numbers yield zero.
    pub async fn call_as<T: FromValue>(&self, method: &str, args: Args) -> Result<T, HubError> {
        let ret = self.call(method, args).await?;
        Ok(T::from_value(ret)?)
    }

    /// Waits at most `timeout`. See [`Hub::call_timeout`].
    pub async fn call_timeout(&self, method: &str, args: Args, timeout: Duration) -> Result<Option<Value>, HubError> {
        self.hub.call_timeout(&self.class, method, args, timeout).await
    }
}
