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

//! Target registries and inbound request resolution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dispatch::{DispatchError, DispatchTarget, Invocation};

/// Class name to [`DispatchTarget`] table.
///
/// Cloning yields another handle onto the same table. At most one target is
/// registered per class name; a later registration replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Arc<RwLock<HashMap<String, Arc<DispatchTarget>>>>,
}

impl TargetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `target` under its class name and returns the target it
    /// replaced, if any.
    pub fn register(&self, target: DispatchTarget) -> Option<Arc<DispatchTarget>> {
        let class = target.class().to_owned();
        let previous = self.targets.write().insert(class.clone(), Arc::new(target));
        if previous.is_some() {
            tracing::debug!(%class, "replaced dispatch target");
        }
        previous
    }

    /// Removes the target registered under `class`.
    pub fn unregister(&self, class: &str) -> Option<Arc<DispatchTarget>> {
        self.targets.write().remove(class)
    }

    /// Returns the target registered under `class`.
    pub fn get(&self, class: &str) -> Option<Arc<DispatchTarget>> {
        self.targets.read().get(class).cloned()
    }

    /// Returns `true` if a target is registered under `class`.
    pub fn contains(&self, class: &str) -> bool {
        self.targets.read().contains_key(class)
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<_> = self.targets.read().keys().cloned().collect();
        classes.sort();
        classes
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.targets.read().len()
    }

    /// Returns `true` if no target is registered.
    pub fn is_empty(&self) -> bool {
        self.targets.read().is_empty()
    }

    /// A read-only view onto this registry.
    pub fn shared(&self) -> SharedTargets {
        SharedTargets {
            targets: self.targets.clone(),
        }
    }
}

/// Read-only view of a [`TargetRegistry`] owned by someone else.
///
/// A server hands this to each of its hubs: the server stays the only writer
/// while every hub sees its registrations as they happen.
#[derive(Debug, Clone)]
pub struct SharedTargets {
    targets: Arc<RwLock<HashMap<String, Arc<DispatchTarget>>>>,
}

impl SharedTargets {
    /// Returns the target registered under `class`.
    pub fn get(&self, class: &str) -> Option<Arc<DispatchTarget>> {
        self.targets.read().get(class).cloned()
    }

    /// Returns `true` if a target is registered under `class`.
    pub fn contains(&self, class: &str) -> bool {
        self.targets.read().contains_key(class)
    }
}

/// Resolves inbound requests against hub-local targets first and shared
/// targets second.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    local: TargetRegistry,
    shared: Option<SharedTargets>,
}

impl Dispatcher {
    /// Creates a dispatcher with only hub-local targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher that falls back to `shared` targets.
    #[must_use]
    pub fn with_shared(shared: SharedTargets) -> Self {
        Self {
            local: TargetRegistry::new(),
            shared: Some(shared),
        }
    }

    /// Hub-local targets.
    pub fn local(&self) -> &TargetRegistry {
        &self.local
    }

    /// Looks up the target for `class`.
    pub fn target(&self, class: &str) -> Option<Arc<DispatchTarget>> {
        self.local
            .get(class)
            .or_else(|| self.shared.as_ref().and_then(|shared| shared.get(class)))
    }

    /// Resolves `class::method` into an invocation.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownClass`] or
    /// [`DispatchError::UnknownMethod`].
    pub fn resolve(&self, class: &str, method: &str) -> Result<Invocation, DispatchError> {
        self.target(class)
            .ok_or_else(|| DispatchError::UnknownClass {
                class: class.to_owned(),
            })?
            .resolve(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Args, Value};

    #[test]
    fn test_register_replaces() {
        let registry = TargetRegistry::new();
        assert!(registry.register(DispatchTarget::new("A")).is_none());
        assert!(registry.register(DispatchTarget::new("A")).is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.classes(), vec!["A".to_string()]);
    }

    #[test]
    fn test_shared_view_sees_later_registrations() {
        let registry = TargetRegistry::new();
        let shared = registry.shared();
        assert!(!shared.contains("A"));
        registry.register(DispatchTarget::new("A"));
        assert!(shared.contains("A"));
        registry.unregister("A");
        assert!(shared.get("A").is_none());
    }

    #[test]
    fn test_local_targets_shadow_shared() {
        let registry = TargetRegistry::new();
        registry.register(DispatchTarget::new("A").method("who", || "shared".to_string()));
        registry.register(DispatchTarget::new("B").method("who", || "shared b".to_string()));

        let dispatcher = Dispatcher::with_shared(registry.shared());
        dispatcher
            .local()
            .register(DispatchTarget::new("A").method("who", || "local".to_string()));

        let who = |class| dispatcher.resolve(class, "who").unwrap().invoke(Args::new()).unwrap();
        assert_eq!(who("A"), Some(Value::String("local".into())));
        assert_eq!(who("B"), Some(Value::String("shared b".into())));
    }

    #[test]
    fn test_unknown_class() {
        let dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.resolve("Nope", "m"),
            Err(DispatchError::UnknownClass { .. })
        ));
    }
}
