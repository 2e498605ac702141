use async_trait::async_trait;
use kvmove_core::{path, FieldValue, Fields, MigrateError, SecretStore};
use serde_json::{json, Value};
use tracing::instrument;

use crate::client::{envelope_data, OpenBaoClient};

/// A KV version 2 mount exposed as a [`SecretStore`].
///
/// Listing goes through `<mount>/metadata/<prefix>`, reads and writes
/// through `<mount>/data/<path>`.
pub struct KvStore {
    client: OpenBaoClient,
    mount: String,
}

impl KvStore {
    pub fn new(client: OpenBaoClient, mount: impl Into<String>) -> Self {
        Self {
            client,
            mount: mount.into().trim_matches('/').to_string(),
        }
    }

    pub fn metadata_path(&self, prefix: &str) -> String {
        let prefix = path::normalize(prefix);
        if prefix.is_empty() {
            format!("{}/metadata", self.mount)
        } else {
            format!("{}/metadata/{prefix}", self.mount)
        }
    }

    pub fn data_path(&self, rel: &str) -> String {
        format!("{}/data/{}", self.mount, path::normalize(rel))
    }
}

/// Body for a KV v2 write: the fields wrapped under `data`.
pub(crate) fn write_body(fields: &Fields) -> Value {
    json!({ "data": Value::from(FieldValue::Mapping(fields.clone())) })
}

#[async_trait]
impl SecretStore for KvStore {
    fn name(&self) -> &str {
        self.client.addr()
    }

    #[instrument(skip_all, fields(mount = %self.mount, folder = %folder))]
    async fn list(&self, folder: &str) -> Result<Option<Value>, MigrateError> {
        let body = self.client.list("list", &self.metadata_path(folder)).await?;
        Ok(envelope_data(body))
    }

    #[instrument(skip_all, fields(mount = %self.mount, path = %path))]
    async fn read(&self, path: &str) -> Result<Option<Value>, MigrateError> {
        let body = self.client.read("read", &self.data_path(path)).await?;
        Ok(envelope_data(body))
    }

    #[instrument(skip_all, fields(mount = %self.mount, path = %path))]
    async fn write(&self, path: &str, fields: &Fields) -> Result<(), MigrateError> {
        let logical = self.data_path(path);
        match self.client.write("write", &logical, &write_body(fields)).await? {
            Some(_) => Ok(()),
            // A write that lands on a 404 means the mount itself is missing.
            None => Err(MigrateError::Connection {
                op: "write",
                target: logical,
                reason: "status 404: no handler for route".to_string(),
            }),
        }
    }
}
