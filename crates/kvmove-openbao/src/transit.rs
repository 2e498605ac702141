use async_trait::async_trait;
use kvmove_core::{CryptoOracle, MigrateError};
use serde_json::{json, Value};
use tracing::instrument;

use crate::client::{envelope_data, OpenBaoClient};

/// The transit secrets engine as a [`CryptoOracle`].
pub struct TransitOracle {
    client: OpenBaoClient,
    mount: String,
}

impl TransitOracle {
    pub fn new(client: OpenBaoClient, mount: impl Into<String>) -> Self {
        Self {
            client,
            mount: mount.into().trim_matches('/').to_string(),
        }
    }

    pub fn op_path(&self, op: &str, key: &str) -> String {
        format!("{}/{op}/{key}", self.mount)
    }

    async fn call(&self, op: &'static str, key: &str, body: Value) -> Result<Value, MigrateError> {
        let logical = self.op_path(op, key);
        let crypto_err = |reason: String| MigrateError::Crypto {
            key: key.to_string(),
            reason,
        };

        let response = self
            .client
            .write(op, &logical, &body)
            .await
            .map_err(|e| crypto_err(e.to_string()))?;
        if response.is_none() {
            return Err(crypto_err(format!("{logical}: not found")));
        }
        // A missing data object surfaces later as a missing response field.
        Ok(envelope_data(response).unwrap_or(Value::Null))
    }
}

#[async_trait]
impl CryptoOracle for TransitOracle {
    #[instrument(skip_all, fields(mount = %self.mount, key = %key))]
    async fn decrypt(&self, key: &str, ciphertext: &str) -> Result<Value, MigrateError> {
        self.call("decrypt", key, json!({ "ciphertext": ciphertext }))
            .await
    }

    #[instrument(skip_all, fields(mount = %self.mount, key = %key))]
    async fn encrypt(&self, key: &str, plaintext_b64: &str) -> Result<Value, MigrateError> {
        self.call("encrypt", key, json!({ "plaintext": plaintext_b64 }))
            .await
    }
}
