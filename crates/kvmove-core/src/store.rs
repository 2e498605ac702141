use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    error::MigrateError,
    path,
    record::{FieldValue, Fields},
};

/// Contract for a hierarchical, versioned secret store.
///
/// Implementations hand back the store's raw response bodies; the pipeline
/// owns shape validation so every backend is held to the same checks.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Short name used in logs (e.g. "openbao", "memory").
    fn name(&self) -> &str;

    /// List the immediate children of `folder` (empty = namespace top).
    /// Returns the listing's data object, or `None` when nothing lives there.
    async fn list(&self, folder: &str) -> Result<Option<Value>, MigrateError>;

    /// Read the latest version at `path`. Returns the envelope's data object
    /// (whose inner `data` holds the fields), or `None` when the path is empty.
    async fn read(&self, path: &str) -> Result<Option<Value>, MigrateError>;

    /// Replace whatever is stored at `path` with `fields`, creating it if needed.
    async fn write(&self, path: &str, fields: &Fields) -> Result<(), MigrateError>;
}

#[derive(Debug, Clone)]
struct Entry {
    fields: Fields,
    version: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, Entry>,
    write_log: Vec<String>,
}

/// In-memory store with KV-v2-like listing and read envelopes, for tests and smoke runs.
#[derive(Debug, Default, Clone)]
pub struct InMemorySecretStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a leaf directly, bypassing the write log.
    pub fn insert(&self, path: &str, fields: Fields) -> Result<(), MigrateError> {
        let mut inner = self.lock()?;
        let entry = inner
            .entries
            .entry(path::normalize(path).to_string())
            .or_insert(Entry {
                fields: Fields::new(),
                version: 0,
            });
        entry.fields = fields;
        entry.version += 1;
        Ok(())
    }

    /// Fields currently stored at `path`.
    pub fn get(&self, path: &str) -> Result<Option<Fields>, MigrateError> {
        let inner = self.lock()?;
        Ok(inner
            .entries
            .get(path::normalize(path))
            .map(|e| e.fields.clone()))
    }

    /// All leaf paths, sorted.
    pub fn paths(&self) -> Result<Vec<String>, MigrateError> {
        Ok(self.lock()?.entries.keys().cloned().collect())
    }

    /// Paths passed to `write`, in call order.
    pub fn write_log(&self) -> Result<Vec<String>, MigrateError> {
        Ok(self.lock()?.write_log.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, MigrateError> {
        self.inner.lock().map_err(|err| MigrateError::Connection {
            op: "lock",
            target: "memory".to_string(),
            reason: format!("lock poisoned: {err}"),
        })
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list(&self, folder: &str) -> Result<Option<Value>, MigrateError> {
        let inner = self.lock()?;
        let folder = path::normalize(folder);
        let prefix = if folder.is_empty() {
            String::new()
        } else {
            format!("{folder}/")
        };

        let children: BTreeSet<String> = inner
            .entries
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .map(|rest| match rest.split_once('/') {
                Some((segment, _)) => format!("{segment}/"),
                None => rest.to_string(),
            })
            .collect();

        if children.is_empty() {
            return Ok(None);
        }
        Ok(Some(json!({ "keys": children })))
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, MigrateError> {
        let inner = self.lock()?;
        Ok(inner.entries.get(path::normalize(path)).map(|entry| {
            json!({
                "data": Value::from(FieldValue::Mapping(entry.fields.clone())),
                "metadata": { "version": entry.version },
            })
        }))
    }

    async fn write(&self, path: &str, fields: &Fields) -> Result<(), MigrateError> {
        let path = path::normalize(path).to_string();
        let mut inner = self.lock()?;
        let entry = inner.entries.entry(path.clone()).or_insert(Entry {
            fields: Fields::new(),
            version: 0,
        });
        entry.fields = fields.clone();
        entry.version += 1;
        inner.write_log.push(path);
        Ok(())
    }
}
