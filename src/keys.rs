//! Verification key sets parsed from JWKS documents.
//!
//! Key material parsing itself is delegated to `jsonwebtoken`; this module
//! only arranges the parsed keys into a key-id indexed map for the token
//! verification pipeline.

use std::collections::HashMap;
use std::fmt;

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{JwkSet, PublicKeyUse};

/// Errors that can occur while parsing a key set document.
#[derive(Debug, thiserror::Error)]
pub enum KeySetError {
    /// The document is not a valid JWKS JSON document.
    #[error("Failed to parse key set: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but contains no usable signing keys.
    #[error("No usable signing keys in key set")]
    NoSigningKeys,
}

/// Verification keys indexed by key id.
#[derive(Clone)]
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl KeySet {
    /// Parses a JWKS document into a key set.
    ///
    /// Encryption keys (`use: "enc"`), keys without a `kid`, and keys that
    /// cannot be converted to verification keys are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns a [`KeySetError`] if the document is not valid JWKS JSON or
    /// no usable signing key remains after filtering.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeySetError> {
        let jwks: JwkSet = serde_json::from_slice(bytes)?;

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
                continue;
            }

            let Some(kid) = jwk.common.key_id.clone() else {
                tracing::warn!("Skipping JWK without a key id");
                continue;
            };

            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => {
                    tracing::warn!("Skipping unusable JWK {}: {}", kid, e);
                }
            }
        }

        if keys.is_empty() {
            return Err(KeySetError::NoSigningKeys);
        }

        Ok(Self { keys })
    }

    /// Looks up a verification key by key id.
    #[must_use]
    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    /// Returns the key ids in the set, in no particular order.
    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Returns the number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySet")
            .field("key_ids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}
