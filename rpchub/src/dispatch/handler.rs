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

//! Typed handlers behind dispatch targets.
//!
//! Any `Fn` closure or function taking up to ten [`FromValue`] parameters and
//! returning an [`IntoReturn`] value is a [`Handler`]. Registration turns it
//! into an invocation thunk that coerces positional arguments, calls the
//! function and converts its result, so methods are resolved by name from a
//! table instead of by runtime introspection.

use std::collections::BTreeMap;
use std::fmt;

use crate::dispatch::InvokeError;
use crate::protocol::{Args, FromValue, IntoValue, Value};

/// Declared shape of a registered method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Parameter type names, in positional order.
    pub params: Vec<&'static str>,
    /// Return type name (`"void"` for void methods).
    pub returns: &'static str,
    /// Whether the method is void. Responses to void methods omit `return`.
    pub void: bool,
}

impl MethodSignature {
    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) -> {}", self.params.join(", "), self.returns)
    }
}

/// Conversion of a handler's return value into an optional wire value.
///
/// `()` is void and produces no `return` field. `Result<T, E>` maps `Err`
/// into an invocation failure.
pub trait IntoReturn {
    /// Converts the returned value; `None` for void.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Failed`] if the handler reported an error.
    fn into_return(self) -> Result<Option<Value>, InvokeError>;

    /// Name of the return type as reported in method signatures.
    fn type_name() -> &'static str;

    /// Whether this return type is void.
    fn is_void() -> bool {
        false
    }
}

impl IntoReturn for () {
    fn into_return(self) -> Result<Option<Value>, InvokeError> {
        Ok(None)
    }

    fn type_name() -> &'static str {
        "void"
    }

    fn is_void() -> bool {
        true
    }
}

macro_rules! impl_into_return {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoReturn for $ty {
            fn into_return(self) -> Result<Option<Value>, InvokeError> {
                Ok(Some(self.into_value()))
            }

            fn type_name() -> &'static str {
                <$ty as FromValue>::type_name()
            }
        }
    )*};
}

impl_into_return!(Value, bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, String);

impl IntoReturn for &str {
    fn into_return(self) -> Result<Option<Value>, InvokeError> {
        Ok(Some(self.into_value()))
    }

    fn type_name() -> &'static str {
        "string"
    }
}

impl<T: IntoValue + FromValue> IntoReturn for Vec<T> {
    fn into_return(self) -> Result<Option<Value>, InvokeError> {
        Ok(Some(self.into_value()))
    }

    fn type_name() -> &'static str {
        <Self as FromValue>::type_name()
    }
}

impl<T: IntoValue + FromValue> IntoReturn for BTreeMap<String, T> {
    fn into_return(self) -> Result<Option<Value>, InvokeError> {
        Ok(Some(self.into_value()))
    }

    fn type_name() -> &'static str {
        <Self as FromValue>::type_name()
    }
}

impl<T: IntoValue + FromValue> IntoReturn for Option<T> {
    fn into_return(self) -> Result<Option<Value>, InvokeError> {
        Ok(Some(self.into_value()))
    }

    fn type_name() -> &'static str {
        T::type_name()
    }
}

impl<T: IntoReturn, E: fmt::Display> IntoReturn for Result<T, E> {
    fn into_return(self) -> Result<Option<Value>, InvokeError> {
        match self {
            Ok(value) => value.into_return(),
            Err(err) => Err(InvokeError::Failed(err.to_string())),
        }
    }

    fn type_name() -> &'static str {
        T::type_name()
    }

    fn is_void() -> bool {
        T::is_void()
    }
}

/// A function that can be registered as a dispatch target method.
///
/// `Params` is the tuple of parameter types; it only exists to keep the
/// implementations for different arities apart and is inferred at the
/// registration site.
pub trait Handler<Params>: Send + Sync + 'static {
    /// Declared parameter and return types.
    fn signature(&self) -> MethodSignature;

    /// Coerces `args` positionally and calls the function.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Coercion`] for the first argument that cannot
    /// be converted and [`InvokeError::Failed`] if the function reports an
    /// error.
    fn invoke(&self, args: Args) -> Result<Option<Value>, InvokeError>;
}

macro_rules! impl_handler {
    ($($param:ident $index:tt),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, R, $($param,)*> Handler<($($param,)*)> for F
        where
            F: Fn($($param),*) -> R + Send + Sync + 'static,
            R: IntoReturn,
            $($param: FromValue,)*
        {
            fn signature(&self) -> MethodSignature {
                MethodSignature {
                    params: vec![$(<$param as FromValue>::type_name()),*],
                    returns: R::type_name(),
                    void: R::is_void(),
                }
            }

            fn invoke(&self, mut args: Args) -> Result<Option<Value>, InvokeError> {
                $(
                    let $param = <$param as FromValue>::from_value(args.take($index))
                        .map_err(|source| InvokeError::Coercion { index: $index, source })?;
                )*
                (self)($($param),*).into_return()
            }
        }
    };
}

impl_handler!();
impl_handler!(A0 0);
impl_handler!(A0 0, A1 1);
impl_handler!(A0 0, A1 1, A2 2);
impl_handler!(A0 0, A1 1, A2 2, A3 3);
impl_handler!(A0 0, A1 1, A2 2, A3 3, A4 4);
impl_handler!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
impl_handler!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
impl_handler!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);
impl_handler!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7, A8 8);
impl_handler!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7, A8 8, A9 9);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    fn invoke<P, H: Handler<P>>(handler: H, args: Args) -> Result<Option<Value>, InvokeError> {
        handler.invoke(args)
    }

    fn signature<P, H: Handler<P>>(handler: H) -> MethodSignature {
        handler.signature()
    }

    #[test]
    fn test_zero_arity() {
        assert_eq!(invoke(|| 4_i64, Args::new()), Ok(Some(Value::Int(4))));
    }

    #[test]
    fn test_void_handler_has_no_return() {
        assert_eq!(invoke(|_: String| (), args!["x"]), Ok(None));
        assert!(signature(|_: String| ()).void);
    }

    #[test]
    fn test_string_literal_return() {
        assert_eq!(invoke(|| "pong", Args::new()), Ok(Some(Value::String("pong".into()))));
        assert_eq!(signature(|| "pong").returns, "string");
    }

    #[test]
    fn test_arguments_are_positional() {
        let result = invoke(|a: i64, b: String| format!("{b}{a}"), args![3, "n"]);
        assert_eq!(result, Ok(Some(Value::String("n3".into()))));
    }

    #[test]
    fn test_missing_trailing_arguments_default() {
        let result = invoke(|a: i64, b: i64, c: Option<i64>| a + b + c.unwrap_or(100), args![1]);
        assert_eq!(result, Ok(Some(Value::Int(101))));
    }

    #[test]
    fn test_coercion_failure_reports_index() {
        let result = invoke(|_: i64, _: bool| (), args![1, "not a bool"]);
        assert!(matches!(result, Err(InvokeError::Coercion { index: 1, .. })));
    }

    #[test]
    fn test_result_error_is_invocation_failure() {
        let result = invoke(|| Err::<i64, _>("boom"), Args::new());
        assert_eq!(result, Err(InvokeError::Failed("boom".into())));
        assert!(signature(|| Ok::<(), String>(())).void);
    }

    #[test]
    fn test_signature() {
        let sig = signature(|_: i64, _: String, _: Vec<f64>| true);
        assert_eq!(sig.params, vec!["i64", "string", "list"]);
        assert_eq!(sig.returns, "bool");
        assert_eq!(sig.arity(), 3);
        assert_eq!(sig.to_string(), "(i64, string, list) -> bool");
    }

    #[test]
    fn test_max_arity() {
        let sum = |a: i64, b: i64, c: i64, d: i64, e: i64, f: i64, g: i64, h: i64, i: i64, j: i64| {
            a + b + c + d + e + f + g + h + i + j
        };
        let result = invoke(sum, args![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(result, Ok(Some(Value::Int(55))));
    }

    #[test]
    fn test_function_item_handler() {
        fn double(value: f64) -> f64 {
            value * 2.0
        }
        assert_eq!(invoke(double, args![2]), Ok(Some(Value::Float(4.0))));
    }
}
