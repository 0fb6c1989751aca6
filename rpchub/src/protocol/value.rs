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

//! Wire values and positional argument slots.
//!
//! Every field of a hub message carries a [`Value`]. The encoding on the wire
//! is untagged, so the receiving side relies on the declared parameter type of
//! the dispatch target ([`FromValue`]) to pick the conversion rather than on
//! the shape of the value.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::CoercionError;

/// Maximum number of positional arguments a request can carry (`val0..val9`).
pub const MAX_ARGS: usize = 10;

/// A dynamically typed value carried in a message field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An explicit null. Distinct from an absent field.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// A double precision float.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A string keyed map of values, ordered by key.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns a short name for the variant, used in coercion errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Returns the integer if this is an [`Value::Int`].
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Canonical text form, used when computing message tokens.
///
/// `Null` renders as the empty string so a blanked field and a null field
/// digest identically on both ends.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::String(value) => f.write_str(value),
            Value::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (index, (key, item)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Conversion of a Rust value into a wire [`Value`].
pub trait IntoValue {
    /// Converts `self` into a [`Value`].
    fn into_value(self) -> Value;
}

/// Conversion of an optional wire [`Value`] into a typed parameter.
///
/// `None` means the argument slot was absent on the wire. Most types map an
/// absent slot to their default; `Option<T>` maps it to `None`.
pub trait FromValue: Sized {
    /// Converts the (possibly absent) value into `Self`.
    ///
    /// # Errors
    ///
    /// Returns a [`CoercionError`] when the wire value has an incompatible
    /// shape for this type.
    fn from_value(value: Option<Value>) -> Result<Self, CoercionError>;

    /// Name of the type as reported in method signatures.
    fn type_name() -> &'static str;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Option<Value>) -> Result<Self, CoercionError> {
        Ok(value.unwrap_or(Value::Null))
    }

    fn type_name() -> &'static str {
        "value"
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Option<Value>) -> Result<Self, CoercionError> {
        match value {
            None => Ok(false),
            Some(Value::Bool(value)) => Ok(value),
            Some(other) => Err(CoercionError::new("bool", &other)),
        }
    }

    fn type_name() -> &'static str {
        "bool"
    }
}

macro_rules! impl_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoValue for $ty {
            #[allow(clippy::cast_possible_wrap, clippy::cast_lossless)]
            fn into_value(self) -> Value {
                Value::Int(self as i64)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Option<Value>) -> Result<Self, CoercionError> {
                match value {
                    None => Ok(0),
                    Some(Value::Int(number)) => <$ty>::try_from(number)
                        .map_err(|_| CoercionError::out_of_range(stringify!($ty), number)),
                    #[allow(clippy::cast_possible_truncation)]
                    Some(Value::Float(number)) if number.fract() == 0.0
                        && number >= i64::MIN as f64
                        && number <= i64::MAX as f64 =>
                    {
                        let whole = number as i64;
                        <$ty>::try_from(whole)
                            .map_err(|_| CoercionError::out_of_range(stringify!($ty), whole))
                    }
                    Some(other) => Err(CoercionError::new(stringify!($ty), &other)),
                }
            }

            fn type_name() -> &'static str {
                stringify!($ty)
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

macro_rules! impl_float {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::Float(f64::from(self))
            }
        }

        impl FromValue for $ty {
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            fn from_value(value: Option<Value>) -> Result<Self, CoercionError> {
                match value {
                    None => Ok(0.0),
                    Some(Value::Float(number)) => Ok(number as $ty),
                    Some(Value::Int(number)) => Ok(number as $ty),
                    Some(other) => Err(CoercionError::new(stringify!($ty), &other)),
                }
            }

            fn type_name() -> &'static str {
                stringify!($ty)
            }
        }
    )*};
}

impl_float!(f32, f64);

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_owned())
    }
}

impl FromValue for String {
    fn from_value(value: Option<Value>) -> Result<Self, CoercionError> {
        match value {
            None => Ok(String::new()),
            Some(Value::String(value)) => Ok(value),
            Some(other) => Err(CoercionError::new("string", &other)),
        }
    }

    fn type_name() -> &'static str {
        "string"
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Option<Value>) -> Result<Self, CoercionError> {
        match value {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => items
                .into_iter()
                .map(|item| T::from_value(Some(item)))
                .collect(),
            Some(other) => Err(CoercionError::new("list", &other)),
        }
    }

    fn type_name() -> &'static str {
        "list"
    }
}

impl<T: IntoValue> IntoValue for BTreeMap<String, T> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(key, item)| (key, item.into_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Option<Value>) -> Result<Self, CoercionError> {
        match value {
            None => Ok(BTreeMap::new()),
            Some(Value::Map(entries)) => entries
                .into_iter()
                .map(|(key, item)| T::from_value(Some(item)).map(|item| (key, item)))
                .collect(),
            Some(other) => Err(CoercionError::new("map", &other)),
        }
    }

    fn type_name() -> &'static str {
        "map"
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(value) => value.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Option<Value>) -> Result<Self, CoercionError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(Some(value)).map(Some),
        }
    }

    fn type_name() -> &'static str {
        T::type_name()
    }
}

/// Positional arguments of a request.
///
/// Each of the [`MAX_ARGS`] slots is either absent or holds a value, so an
/// absent argument never collapses into [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    slots: [Option<Value>; MAX_ARGS],
}

impl Args {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds arguments from up to [`MAX_ARGS`] values filling `val0..`.
    ///
    /// The arity is checked at compile time.
    #[must_use]
    pub fn from_values<const N: usize>(values: [Value; N]) -> Self {
        const { assert!(N <= MAX_ARGS, "a request carries at most 10 arguments") };
        let mut args = Self::new();
        for (slot, value) in args.slots.iter_mut().zip(values) {
            *slot = Some(value);
        }
        args
    }

    /// Stores `value` in the first free slot after the last occupied one.
    ///
    /// # Errors
    ///
    /// Returns the value back if every slot is already taken.
    pub fn push(&mut self, value: impl IntoValue) -> Result<(), Value> {
        let value = value.into_value();
        let next = self.slots.iter().rposition(Option::is_some).map_or(0, |last| last + 1);
        match self.slots.get_mut(next) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(value),
        }
    }

    /// Sets or clears slot `index`. Indices past [`MAX_ARGS`] are ignored.
    pub fn set(&mut self, index: usize, value: Option<Value>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = value;
        }
    }

    /// Returns the value in slot `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Removes and returns the value in slot `index`.
    pub fn take(&mut self, index: usize) -> Option<Value> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Number of present slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns `true` if no slot is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Iterates over present slots as `(index, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index, value)))
    }
}

/// Builds an [`Args`] list from expressions implementing [`IntoValue`].
///
/// ```rust
/// use rpchub::args;
/// use rpchub::protocol::Value;
///
/// let args = args![7, "seven", true];
/// assert_eq!(args.len(), 3);
/// assert_eq!(args.get(1), Some(&Value::String("seven".into())));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::protocol::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::protocol::Args::from_values([
            $($crate::protocol::IntoValue::into_value($value)),+
        ])
    };
}
