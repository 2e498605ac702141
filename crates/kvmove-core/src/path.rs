//! Helpers for slash-delimited secret paths.

/// Strip leading and trailing delimiters so `"/app/db/"` and `"app/db"` address the same leaf.
pub fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// Join a folder prefix and a child name; an empty prefix is the namespace top.
pub fn join(prefix: &str, child: &str) -> String {
    let prefix = normalize(prefix);
    let child = normalize(child);
    if prefix.is_empty() {
        child.to_string()
    } else {
        format!("{prefix}/{child}")
    }
}

/// True for a leaf path made of non-empty segments with no leading or trailing delimiter.
pub fn is_canonical(path: &str) -> bool {
    !path.is_empty() && path.split('/').all(|segment| !segment.is_empty())
}

/// Listing entries with a trailing delimiter are folders; returns the bare folder name.
pub fn folder_name(entry: &str) -> Option<&str> {
    entry.strip_suffix('/')
}
