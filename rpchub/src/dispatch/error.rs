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

//! Dispatch layer error types.

use thiserror::Error;

use crate::protocol::CoercionError;

/// Failure of a handler invocation, before class and method are attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// Argument `index` could not be converted to the declared parameter type.
    #[error("argument {index}: {source}")]
    Coercion {
        /// Position of the argument (`val{index}`)
        index: usize,
        /// The conversion failure
        #[source]
        source: CoercionError,
    },

    /// The handler returned an error or panicked.
    #[error("{0}")]
    Failed(String),
}

/// An inbound request that could not be dispatched.
///
/// Every variant results in the request being logged and dropped without a
/// response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No target is registered under the class name.
    #[error("no dispatch target registered for class `{class}`")]
    UnknownClass {
        /// Requested class
        class: String,
    },

    /// The target does not expose the method.
    #[error("class `{class}` has no method `{method}`")]
    UnknownMethod {
        /// Requested class
        class: String,
        /// Requested method
        method: String,
    },

    /// An argument could not be coerced to the declared parameter type.
    #[error("cannot coerce argument {index} of `{class}::{method}`: {source}")]
    Coercion {
        /// Target class
        class: String,
        /// Target method
        method: String,
        /// Position of the argument
        index: usize,
        /// The conversion failure
        #[source]
        source: CoercionError,
    },

    /// The handler failed.
    #[error("`{class}::{method}` failed: {reason}")]
    Invocation {
        /// Target class
        class: String,
        /// Target method
        method: String,
        /// Error reported by the handler
        reason: String,
    },

    /// The same `class::method` is already being dispatched on this hub.
    #[error("`{key}` is already executing, request dropped")]
    Reentrant {
        /// The `class::method` key
        key: String,
    },
}

impl DispatchError {
    pub(crate) fn from_invoke(class: &str, method: &str, error: InvokeError) -> Self {
        match error {
            InvokeError::Coercion { index, source } => DispatchError::Coercion {
                class: class.to_owned(),
                method: method.to_owned(),
                index,
                source,
            },
            InvokeError::Failed(reason) => DispatchError::Invocation {
                class: class.to_owned(),
                method: method.to_owned(),
                reason,
            },
        }
    }
}
