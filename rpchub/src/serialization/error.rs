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

//! Serialization error types.
//!
//! Both errors carry a message and an optional boxed source, so serializers
//! other than JSON can wrap their own failures without new variants.

use std::fmt;

/// Error that occurs while encoding a message.
///
/// # Examples
///
/// ```rust
/// use rpchub::serialization::SerializationError;
///
/// let error = SerializationError::new("value is not representable");
/// assert_eq!(error.to_string(), "Serialization error: value is not representable");
/// ```
#[derive(Debug)]
pub struct SerializationError {
    /// The underlying error message
    message: String,
    /// Optional source error
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SerializationError {
    /// Creates a new serialization error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new serialization error with a message and source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Serialization error: {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " (caused by: {source})")?;
        }
        Ok(())
    }
}

impl std::error::Error for SerializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error that occurs while decoding bytes into messages.
///
/// Common causes:
/// - Malformed payload (not the serializer's format)
/// - A top-level value that is neither a message nor a batch
/// - Incomplete input where a complete payload was required
#[derive(Debug)]
pub struct DeserializationError {
    /// The underlying error message
    message: String,
    /// Optional source error
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DeserializationError {
    /// Creates a new deserialization error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new deserialization error with a message and source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deserialization error: {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " (caused by: {source})")?;
        }
        Ok(())
    }
}

impl std::error::Error for DeserializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source("JSON serialization failed", err)
    }
}

impl From<serde_json::Error> for DeserializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source("JSON deserialization failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_serialization_error_new() {
        let error = SerializationError::new("test error");
        assert_eq!(error.to_string(), "Serialization error: test error");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_deserialization_error_with_source() {
        let source = std::io::Error::other("io error");
        let error = DeserializationError::with_source("test error", source);
        assert_eq!(
            error.to_string(),
            "Deserialization error: test error (caused by: io error)"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn test_from_json_error() {
        let json_error = serde_json::from_str::<u32>("nope").unwrap_err();
        let error = DeserializationError::from(json_error);
        assert!(error.to_string().starts_with("Deserialization error: JSON deserialization failed"));
    }
}
