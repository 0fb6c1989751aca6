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

//! Reentrancy lock set.
//!
//! Holds the `class::method` keys currently being dispatched on one hub.
//! A second inbound request for a held key is dropped, and outbound sends
//! for a held key are suppressed, which breaks resend loops between two
//! hubs calling each other back.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Set of `class::method` keys currently executing.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyLocks {
    held: Arc<Mutex<HashSet<String>>>,
}

impl ReentrancyLocks {
    /// Creates an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires `key`, or returns `None` if it is already held.
    ///
    /// The key is released when the returned guard is dropped, including
    /// during unwinding.
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<ReentrancyGuard> {
        let key = key.into();
        if self.held.lock().insert(key.clone()) {
            Some(ReentrancyGuard {
                held: self.held.clone(),
                key,
            })
        } else {
            None
        }
    }

    /// Returns `true` if `key` is currently held.
    pub fn is_held(&self, key: &str) -> bool {
        self.held.lock().contains(key)
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.held.lock().len()
    }

    /// Returns `true` if no key is held.
    pub fn is_empty(&self) -> bool {
        self.held.lock().is_empty()
    }
}

/// Scoped ownership of one reentrancy key.
#[derive(Debug)]
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct ReentrancyGuard {
    held: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl ReentrancyGuard {
    /// The held `class::method` key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.held.lock().remove(&self.key);
    }
}
