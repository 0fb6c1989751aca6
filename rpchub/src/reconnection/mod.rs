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

//! Reconnection strategies for hubs with auto-reconnect enabled.
//!
//! When a hub loses its connection it consults a [`ReconnectionStrategy`]
//! to decide whether to retry and how long to wait. The retry loop stops the
//! moment the hub is connected again, and an intentional disconnect
//! disables it before closing.
//!
//! # Using Fixed Delay
//!
//! ```
//! use rpchub::hub::HubConfig;
//! use rpchub::reconnection::FixedDelay;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = HubConfig::default()
//!     .with_auto_reconnect(true)
//!     .with_reconnection_strategy(Arc::new(FixedDelay::new(Duration::from_millis(250))));
//! assert!(config.auto_reconnect);
//! ```

mod fixed;
mod traits;

pub use fixed::{DEFAULT_RECONNECT_DELAY, FixedDelay, FixedDelayBuilder};
pub use traits::{ReconnectionMetrics, ReconnectionStrategy};
