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

//! Failures delivered to pending calls.

use std::time::Duration;

use thiserror::Error;

/// Why a pending call finished without a return value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The connection dropped (or the hub went away) before the response
    /// arrived.
    #[error("connection lost before the response arrived")]
    ConnectionLost,

    /// No response arrived within the caller's deadline.
    #[error("no response within {duration:?}")]
    Timeout {
        /// The deadline that elapsed
        duration: Duration,
    },
}

impl CallError {
    /// Returns `true` for [`CallError::ConnectionLost`].
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, CallError::ConnectionLost)
    }
}
