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

//! Dynamic dispatch of inbound requests.
//!
//! Methods are resolved by name from explicit registration tables:
//!
//! - **[`DispatchTarget`]**: a class name with its method table
//! - **[`Handler`]**: any `Fn` of up to ten [`FromValue`](crate::protocol::FromValue)
//!   parameters returning an [`IntoReturn`] value
//! - **[`TargetRegistry`]** / **[`SharedTargets`]**: hub-local and
//!   server-shared tables
//! - **[`Dispatcher`]**: resolves `(class, method)` to an [`Invocation`]
//! - **[`ReentrancyLocks`]**: keys currently executing on a hub
//!
//! # Example
//!
//! ```rust
//! use rpchub::args;
//! use rpchub::dispatch::{DispatchTarget, Dispatcher};
//! use rpchub::protocol::Value;
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.local().register(
//!     DispatchTarget::new("Greeter").method("greet", |name: String| format!("hello {name}")),
//! );
//!
//! let invocation = dispatcher.resolve("Greeter", "greet").unwrap();
//! let ret = invocation.invoke(args!["hub"]).unwrap();
//! assert_eq!(ret, Some(Value::String("hello hub".into())));
//! ```

mod error;
mod handler;
mod reentrancy;
mod registry;
mod target;

pub use error::{DispatchError, InvokeError};
pub use handler::{Handler, IntoReturn, MethodSignature};
pub use reentrancy::{ReentrancyGuard, ReentrancyLocks};
pub use registry::{Dispatcher, SharedTargets, TargetRegistry};
pub use target::{DispatchTarget, Invocation};
