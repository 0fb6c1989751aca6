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

//! Attribute sources for the sync pass.

use std::fmt;
use std::sync::Arc;

use crate::protocol::{IntoValue, Value};

type Getter = Arc<dyn Fn() -> Value + Send + Sync>;

/// One attribute pushed to the peer by [`Hub::sync`](crate::hub::Hub::sync).
#[derive(Clone)]
pub struct SyncAttribute {
    name: String,
    setter: String,
    getter: Getter,
}

impl SyncAttribute {
    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method called on the peer with the attribute value.
    pub fn setter(&self) -> &str {
        &self.setter
    }

    /// Reads the current value.
    pub fn read(&self) -> Value {
        (self.getter)()
    }
}

impl fmt::Debug for SyncAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncAttribute")
            .field("name", &self.name)
            .field("setter", &self.setter)
            .finish_non_exhaustive()
    }
}

/// A set of attributes mirrored onto a class of the peer.
///
/// Each attribute is pushed as a one-argument setter call, `set<Name>` by
/// default.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use rpchub::hub::SyncSource;
///
/// let score = Arc::new(AtomicI64::new(10));
/// let source = SyncSource::new("Player").attribute("score", {
///     let score = Arc::clone(&score);
///     move || score.load(Ordering::Relaxed)
/// });
///
/// let attribute = &source.attributes()[0];
/// assert_eq!(attribute.setter(), "setScore");
/// assert_eq!(attribute.read().as_i64(), Some(10));
/// ```
#[derive(Debug, Clone)]
pub struct SyncSource {
    class: String,
    attributes: Vec<SyncAttribute>,
}

impl SyncSource {
    /// Creates an empty source for the peer class `class`.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute pushed through `set<Name>`.
    pub fn attribute<T, F>(self, name: impl Into<String>, getter: F) -> Self
    where
        T: IntoValue,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let name = name.into();
        let setter = setter_name(&name);
        self.attribute_with_setter(name, setter, getter)
    }

    /// Adds an attribute pushed through an explicitly named setter.
    pub fn attribute_with_setter<T, F>(mut self, name: impl Into<String>, setter: impl Into<String>, getter: F) -> Self
    where
        T: IntoValue,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.attributes.push(SyncAttribute {
            name: name.into(),
            setter: setter.into(),
            getter: Arc::new(move || getter().into_value()),
        });
        self
    }

    /// The peer class receiving the setter calls.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Attributes in registration order.
    pub fn attributes(&self) -> &[SyncAttribute] {
        &self.attributes
    }
}

fn setter_name(attribute: &str) -> String {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setter_name() {
        assert_eq!(setter_name("health"), "setHealth");
        assert_eq!(setter_name("X"), "setX");
        assert_eq!(setter_name("élan"), "setÉlan");
        assert_eq!(setter_name(""), "set");
    }

    #[test]
    fn test_attributes_keep_order() {
        let source = SyncSource::new("Player")
            .attribute("name", || "ada")
            .attribute_with_setter("hp", "updateHealth", || 12);

        let setters: Vec<_> = source.attributes().iter().map(|a| a.setter()).collect();
        assert_eq!(setters, ["setName", "updateHealth"]);
        assert_eq!(source.attributes()[1].read(), Value::Int(12));
    }
}
