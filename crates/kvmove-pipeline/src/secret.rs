use kvmove_core::{record::fields_from_map, Fields, MigrateError, SecretStore};
use serde_json::Value;
use tracing::instrument;

/// Fetch the fields of the leaf at `path`.
///
/// `Ok(None)` means the store holds no data there (deleted version, or the
/// leaf vanished since it was listed); callers skip such paths.
#[instrument(skip_all, fields(path = %path))]
pub async fn read_secret(
    store: &dyn SecretStore,
    path: &str,
) -> Result<Option<Fields>, MigrateError> {
    let shape_err = || MigrateError::Shape {
        op: "read",
        target: path.to_string(),
        expected: "data mapping",
    };

    let envelope = match store.read(path).await? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(envelope)) => envelope,
        Some(_) => return Err(shape_err()),
    };

    match envelope.get("data") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(data)) => Ok(Some(fields_from_map(data.clone()))),
        Some(_) => Err(shape_err()),
    }
}

/// Replace the leaf at `path` with exactly `fields`. No existence check and
/// no merge with what was there before.
#[instrument(skip_all, fields(path = %path, fields = fields.len()))]
pub async fn write_secret(
    store: &dyn SecretStore,
    path: &str,
    fields: &Fields,
) -> Result<(), MigrateError> {
    store.write(path, fields).await
}
