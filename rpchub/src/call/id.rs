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

//! Request id allocation.
//!
//! Ids travel as signed 64-bit integers on the wire, so the counter lives in
//! `0..MAX_REQUEST_ID` and wraps back to zero one step before the top.

use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bound (exclusive) of request ids; the largest wire integer.
pub const MAX_REQUEST_ID: u64 = i64::MAX as u64;

/// Generates request ids for one hub.
///
/// # Thread Safety
///
/// This generator is lock-free and can be shared across tasks and threads.
///
/// # ID Space
///
/// The first id is 1. After `MAX_REQUEST_ID - 1` the counter wraps to 0.
/// Wrapping is safe in practice because the number of calls in flight is
/// tiny compared to the id space.
///
/// # Example
///
/// ```rust
/// use rpchub::call::{MAX_REQUEST_ID, RequestIdGenerator};
///
/// let generator = RequestIdGenerator::new();
/// assert_eq!(generator.next(), 1);
///
/// let generator = RequestIdGenerator::starting_at(MAX_REQUEST_ID - 1);
/// assert_eq!(generator.next(), 0);
/// ```
#[derive(Debug)]
pub struct RequestIdGenerator {
    current: AtomicU64,
}

impl RequestIdGenerator {
    /// Creates a generator whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a generator whose next id follows `current`.
    #[must_use]
    pub fn starting_at(current: u64) -> Self {
        Self {
            current: AtomicU64::new(current.min(MAX_REQUEST_ID - 1)),
        }
    }

    /// Allocates the next request id.
    #[must_use]
    pub fn next(&self) -> u64 {
        let previous = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(Self::step(current))
            })
            .unwrap_or_else(|current| current);
        Self::step(previous)
    }

    /// Returns the most recently allocated id without advancing.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    fn step(current: u64) -> u64 {
        if current >= MAX_REQUEST_ID - 1 {
            0
        } else {
            current + 1
        }
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_starts_at_one() {
        let generator = RequestIdGenerator::new();
        assert_eq!(generator.next(), 1);
        assert_eq!(generator.next(), 2);
        assert_eq!(generator.current(), 2);
    }

    #[test]
    fn test_generator_wraps_to_zero() {
        let generator = RequestIdGenerator::starting_at(MAX_REQUEST_ID - 2);
        assert_eq!(generator.next(), MAX_REQUEST_ID - 1);
        assert_eq!(generator.next(), 0);
        assert_eq!(generator.next(), 1);
    }

    #[test]
    fn test_ids_fit_wire_integer() {
        let generator = RequestIdGenerator::starting_at(u64::MAX);
        let id = generator.next();
        assert!(i64::try_from(id).is_ok());
    }

    #[tokio::test]
    async fn test_generator_concurrent() {
        use std::sync::Arc;

        let generator = Arc::new(RequestIdGenerator::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let generator = generator.clone();
            handles.push(tokio::spawn(async move {
                (0..100).map(|_| generator.next()).collect::<Vec<_>>()
            }));
        }

        let mut all_ids = std::collections::HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(all_ids.insert(id), "Duplicate ID in concurrent test: {id}");
            }
        }

        assert_eq!(all_ids.len(), 1000);
    }
}
