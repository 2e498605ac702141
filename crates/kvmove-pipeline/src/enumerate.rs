use kvmove_core::{path, MigrateError, SecretStore};
use serde_json::Value;
use tracing::{debug, instrument};

/// One folder being walked: its full prefix and the children not yet visited.
struct Frame {
    prefix: String,
    children: std::vec::IntoIter<String>,
}

/// Discover every leaf path under `root` (empty = namespace top).
///
/// Depth-first, pre-order: a folder's subtree is emitted at the point the
/// folder appears in its parent's listing, before any later sibling. The walk
/// uses an explicit stack, so depth is bounded by memory rather than the call
/// stack. Absent or empty folders contribute nothing; a malformed listing
/// aborts the whole walk.
#[instrument(skip_all, fields(store = store.name(), root = %root))]
pub async fn enumerate(
    store: &dyn SecretStore,
    root: &str,
) -> Result<Vec<String>, MigrateError> {
    let root = path::normalize(root).to_string();
    let children = list_children(store, &root).await?;

    let mut leaves = Vec::new();
    let mut stack = vec![Frame {
        prefix: root,
        children: children.into_iter(),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(child) = frame.children.next() else {
            stack.pop();
            continue;
        };

        match path::folder_name(&child) {
            Some(folder) => {
                let prefix = path::join(&frame.prefix, folder);
                let children = list_children(store, &prefix).await?;
                debug!(folder = %prefix, children = children.len(), "descending");
                stack.push(Frame {
                    prefix,
                    children: children.into_iter(),
                });
            }
            None => leaves.push(path::join(&frame.prefix, &child)),
        }
    }

    Ok(leaves)
}

/// Immediate children of `folder`, validated to be a list of non-empty names.
async fn list_children(
    store: &dyn SecretStore,
    folder: &str,
) -> Result<Vec<String>, MigrateError> {
    let target = if folder.is_empty() { "/" } else { folder };
    let shape_err = || MigrateError::Shape {
        op: "list",
        target: target.to_string(),
        expected: "keys list",
    };

    let listing = store
        .list(folder)
        .await
        .map_err(|e| e.at("list", target))?;

    let keys = match listing {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(mut data)) => data.remove("keys"),
        Some(_) => return Err(shape_err()),
    };

    match keys {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) if !path::normalize(&name).is_empty() => Ok(name),
                _ => Err(shape_err()),
            })
            .collect(),
        Some(_) => Err(shape_err()),
    }
}
