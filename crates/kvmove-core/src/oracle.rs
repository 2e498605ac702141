use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::MigrateError;

/// Contract for an encryption-as-a-service endpoint addressed by key name.
///
/// The oracle never exposes key material. Both calls return the raw response
/// data object; extracting and decoding fields is the caller's job.
#[async_trait]
pub trait CryptoOracle: Send + Sync {
    /// Submit `ciphertext` for decryption; a well-formed response carries a
    /// base64 `plaintext` field.
    async fn decrypt(&self, key: &str, ciphertext: &str) -> Result<Value, MigrateError>;

    /// Submit base64 `plaintext` for encryption; a well-formed response
    /// carries an opaque `ciphertext` token.
    async fn encrypt(&self, key: &str, plaintext_b64: &str) -> Result<Value, MigrateError>;
}

/// Deterministic, reversible stand-in for a transit engine.
/// Ciphertext is `vault:<key>:<base64 plaintext>`, so only the key that
/// produced a token can open it. Not cryptographically secure.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOracle {
    calls: Arc<AtomicUsize>,
}

impl InMemoryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of encrypt/decrypt calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ciphertext this oracle would produce for `plaintext` under `key`.
    pub fn seal(key: &str, plaintext_b64: &str) -> String {
        format!("vault:{key}:{plaintext_b64}")
    }
}

#[async_trait]
impl CryptoOracle for InMemoryOracle {
    async fn decrypt(&self, key: &str, ciphertext: &str) -> Result<Value, MigrateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prefix = format!("vault:{key}:");
        let plaintext = ciphertext
            .strip_prefix(prefix.as_str())
            .ok_or_else(|| MigrateError::Crypto {
                key: key.to_string(),
                reason: "cipher: message authentication failed".to_string(),
            })?;
        Ok(json!({ "plaintext": plaintext }))
    }

    async fn encrypt(&self, key: &str, plaintext_b64: &str) -> Result<Value, MigrateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "ciphertext": Self::seal(key, plaintext_b64) }))
    }
}
