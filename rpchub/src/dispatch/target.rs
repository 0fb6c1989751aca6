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

//! Dispatch targets: named method tables.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::{DispatchError, Handler, InvokeError, MethodSignature};
use crate::protocol::{Args, Value};

type Thunk = Arc<dyn Fn(Args) -> Result<Option<Value>, InvokeError> + Send + Sync>;

#[derive(Clone)]
struct Method {
    signature: MethodSignature,
    thunk: Thunk,
}

/// A named object whose methods can be invoked by inbound requests.
///
/// # Example
///
/// ```rust
/// use rpchub::dispatch::DispatchTarget;
///
/// let target = DispatchTarget::new("Calculator")
///     .method("add", |a: i64, b: i64| a + b)
///     .method("reset", || ());
///
/// assert_eq!(target.class(), "Calculator");
/// assert!(target.signature("reset").unwrap().void);
/// ```
#[derive(Clone)]
pub struct DispatchTarget {
    class: String,
    methods: HashMap<String, Method>,
}

impl DispatchTarget {
    /// Creates a target with no methods.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            methods: HashMap::new(),
        }
    }

    /// Adds a method, replacing any method already registered under `name`.
    #[must_use]
    pub fn method<P, H>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<P>,
        P: 'static,
    {
        self.add_method(name, handler);
        self
    }

    /// Adds a method in place.
    pub fn add_method<P, H>(&mut self, name: impl Into<String>, handler: H)
    where
        H: Handler<P>,
        P: 'static,
    {
        let signature = handler.signature();
        let thunk: Thunk = Arc::new(move |args| handler.invoke(args));
        self.methods.insert(name.into(), Method { signature, thunk });
    }

    /// Class name requests address this target by.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Signature of `method`, if registered.
    pub fn signature(&self, method: &str) -> Option<&MethodSignature> {
        self.methods.get(method).map(|m| &m.signature)
    }

    /// Registered method names with their signatures.
    pub fn methods(&self) -> impl Iterator<Item = (&str, &MethodSignature)> {
        self.methods
            .iter()
            .map(|(name, method)| (name.as_str(), &method.signature))
    }

    /// Resolves `method` into an owned invocation that can be moved to a
    /// worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownMethod`] if the method is not
    /// registered.
    pub fn resolve(&self, method: &str) -> Result<Invocation, DispatchError> {
        let resolved = self
            .methods
            .get(method)
            .ok_or_else(|| DispatchError::UnknownMethod {
                class: self.class.clone(),
                method: method.to_owned(),
            })?;
        Ok(Invocation {
            class: self.class.clone(),
            method: method.to_owned(),
            void: resolved.signature.void,
            thunk: resolved.thunk.clone(),
        })
    }
}

impl fmt::Debug for DispatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("DispatchTarget")
            .field("class", &self.class)
            .field("methods", &methods)
            .finish()
    }
}

/// A resolved method ready to run.
pub struct Invocation {
    class: String,
    method: String,
    void: bool,
    thunk: Thunk,
}

impl Invocation {
    /// `class::method` key of the invocation.
    pub fn key(&self) -> String {
        format!("{}::{}", self.class, self.method)
    }

    /// Target class.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Whether the method is void.
    pub fn is_void(&self) -> bool {
        self.void
    }

    /// Runs the method. Void methods always yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Coercion`] or [`DispatchError::Invocation`].
    pub fn invoke(&self, args: Args) -> Result<Option<Value>, DispatchError> {
        let ret = (self.thunk)(args)
            .map_err(|err| DispatchError::from_invoke(&self.class, &self.method, err))?;
        Ok(if self.void { None } else { ret })
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("class", &self.class)
            .field("method", &self.method)
            .field("void", &self.void)
            .finish_non_exhaustive()
    }
}
