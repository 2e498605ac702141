use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use kvmove_core::{CryptoOracle, FieldValue, Fields, MigrateError};
use serde_json::Value;
use tracing::{instrument, trace};

/// Field conventionally holding the sensitive value.
pub const DEFAULT_FIELD: &str = "encrypted";

/// Which way the designated field is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ciphertext in, plaintext out (export, source key).
    Decrypt,
    /// Plaintext in, ciphertext out (import, destination key).
    Encrypt,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Decrypt => "decrypt",
            Direction::Encrypt => "encrypt",
        }
    }
}

/// Rewrites the designated field of a record through a crypto oracle.
///
/// Only a non-empty string value is sent to the oracle. Empty strings,
/// non-strings (including nested mappings and lists under the same name)
/// and records without the field pass through untouched.
pub struct FieldTransformer<'a> {
    oracle: &'a dyn CryptoOracle,
    key: &'a str,
    field: &'a str,
}

impl<'a> FieldTransformer<'a> {
    pub fn new(oracle: &'a dyn CryptoOracle, key: &'a str, field: &'a str) -> Self {
        Self { oracle, key, field }
    }

    #[instrument(skip_all, fields(direction = direction.as_str(), key = self.key))]
    pub async fn transform(
        &self,
        mut fields: Fields,
        direction: Direction,
    ) -> Result<Fields, MigrateError> {
        let Some(input) = fields.get(self.field).and_then(FieldValue::as_non_empty_str) else {
            return Ok(fields);
        };

        let output = match direction {
            Direction::Decrypt => self.decrypt(input).await?,
            Direction::Encrypt => self.encrypt(input).await?,
        };
        trace!(field = self.field, out_len = output.len(), "transformed");
        fields.insert(self.field.to_string(), FieldValue::String(output));
        Ok(fields)
    }

    async fn decrypt(&self, ciphertext: &str) -> Result<String, MigrateError> {
        let response = self.oracle.decrypt(self.key, ciphertext).await?;
        let encoded = response_field(&response, "plaintext", self.key, Direction::Decrypt)?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| self.crypto_err(format!("base64 decode plaintext: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| self.crypto_err(format!("plaintext is not valid UTF-8: {e}")))
    }

    async fn encrypt(&self, plaintext: &str) -> Result<String, MigrateError> {
        let encoded = BASE64.encode(plaintext.as_bytes());
        let response = self.oracle.encrypt(self.key, &encoded).await?;
        response_field(&response, "ciphertext", self.key, Direction::Encrypt).map(str::to_string)
    }

    fn crypto_err(&self, reason: String) -> MigrateError {
        MigrateError::Crypto {
            key: self.key.to_string(),
            reason,
        }
    }
}

fn response_field<'v>(
    response: &'v Value,
    field: &'static str,
    key: &str,
    direction: Direction,
) -> Result<&'v str, MigrateError> {
    response
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| MigrateError::MissingField {
            op: format!("{} with key {key}", direction.as_str()),
            field,
        })
}
