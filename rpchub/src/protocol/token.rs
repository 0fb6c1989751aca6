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

//! Shared-secret message tokens.
//!
//! When both ends of a hub are configured with the same secret, every message
//! carries a `token` field holding a SHA-256 digest of its fields and the
//! secret. A receiver recomputes the digest and drops the message on
//! mismatch.
//!
//! The digest input is every field rendered as `"key: value*"` in the
//! canonical (lexicographic) key order of the [`FieldMap`], with the token
//! field itself always present and blanked, followed by the secret.
//!
//! This is an integrity check only. It provides no confidentiality and is
//! only as strong as the secret.

use std::fmt;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use crate::protocol::{AuthError, FIELD_TOKEN, FieldMap, Value};

/// Shared secret used to sign and verify messages.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidateToken {
    secret: String,
}

impl ValidateToken {
    /// Creates a token validator from a shared secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Computes the hex digest of `fields` with the token field blanked.
    #[must_use]
    pub fn digest(&self, fields: &FieldMap) -> String {
        let mut blanked = fields.clone();
        blanked.insert(FIELD_TOKEN.into(), Value::String(String::new()));

        let mut canonical = String::new();
        for (key, value) in &blanked {
            // Writing into a String cannot fail.
            let _ = write!(canonical, "{key}: {value}*");
        }
        canonical.push_str(&self.secret);

        hex::encode(Sha256::digest(canonical.as_bytes()))
    }

    /// Attaches the digest of `fields` as its token field.
    pub fn sign(&self, fields: &mut FieldMap) {
        let token = self.digest(fields);
        fields.insert(FIELD_TOKEN.into(), Value::String(token));
    }

    /// Checks the token field of `fields` against the recomputed digest.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] if no string token is present and
    /// [`AuthError::Mismatch`] if it does not match.
    pub fn verify(&self, fields: &FieldMap) -> Result<(), AuthError> {
        let Some(Value::String(received)) = fields.get(FIELD_TOKEN) else {
            return Err(AuthError::MissingToken);
        };
        let expected = self.digest(fields);
        if constant_time_eq(expected.as_bytes(), received.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::Mismatch)
        }
    }
}

impl fmt::Debug for ValidateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateToken")
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::protocol::Message;

    fn fields() -> FieldMap {
        Message::request(42, "Client", "getRandomNumberSlot", args![1, "two"]).to_fields()
    }

    #[test]
    fn test_digest_is_deterministic() {
        let token = ValidateToken::new("secret");
        let fields = fields();
        assert_eq!(token.digest(&fields), token.digest(&fields));
        assert_eq!(token.digest(&fields).len(), 64);
    }

    #[test]
    fn test_digest_ignores_existing_token_value() {
        let token = ValidateToken::new("secret");
        let mut signed = fields();
        let before = token.digest(&signed);
        token.sign(&mut signed);
        assert_eq!(token.digest(&signed), before);
    }

    #[test]
    fn test_sign_then_verify() {
        let token = ValidateToken::new("secret");
        let mut fields = fields();
        token.sign(&mut fields);
        assert!(token.verify(&fields).is_ok());
    }

    #[test]
    fn test_tampered_field_is_rejected() {
        let token = ValidateToken::new("secret");
        let mut fields = fields();
        token.sign(&mut fields);
        fields.insert("val0".into(), Value::Int(2));
        assert_eq!(token.verify(&fields), Err(AuthError::Mismatch));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let mut fields = fields();
        ValidateToken::new("secret").sign(&mut fields);
        assert_eq!(
            ValidateToken::new("other").verify(&fields),
            Err(AuthError::Mismatch)
        );
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let token = ValidateToken::new("secret");
        assert_eq!(token.verify(&fields()), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", ValidateToken::new("hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
