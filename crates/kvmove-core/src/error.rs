use thiserror::Error;

/// Coarse classification of a [`MigrateError`], used for exit codes and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Shape,
    MissingField,
    Crypto,
    Format,
    Io,
    Config,
}

/// Every failure a migration run can hit. None of them is recovered locally:
/// the enclosing export or import flow stops at the first one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MigrateError {
    /// Transport or auth failure talking to a store or oracle.
    #[error("{op} {target}: {reason}")]
    Connection {
        op: &'static str,
        target: String,
        reason: String,
    },
    /// A response did not have the structure we rely on.
    #[error("unexpected {expected} shape for {op} {target}")]
    Shape {
        op: &'static str,
        target: String,
        expected: &'static str,
    },
    /// A response lacked a field we need (e.g. returned ciphertext).
    #[error("no {field} field returned from {op}")]
    MissingField { op: String, field: &'static str },
    /// Oracle call failed or returned a malformed encoding.
    #[error("crypto failure with key {key}: {reason}")]
    Crypto { key: String, reason: String },
    /// Bundle is not valid serialized form.
    #[error("invalid bundle: {reason}")]
    Format { reason: String },
    /// Bundle file unreadable or unwritable.
    #[error("bundle file {path}: {reason}")]
    Io { path: String, reason: String },
    /// Invalid mode combination or missing parameter.
    #[error("configuration error: {reason}")]
    Config { reason: String },
    /// Context wrapper naming the secret path and step that failed.
    #[error("{op} {path}: {source}")]
    Record {
        path: String,
        op: &'static str,
        #[source]
        source: Box<MigrateError>,
    },
}

impl MigrateError {
    pub fn config(reason: impl Into<String>) -> Self {
        MigrateError::Config {
            reason: reason.into(),
        }
    }

    pub fn format(reason: impl Into<String>) -> Self {
        MigrateError::Format {
            reason: reason.into(),
        }
    }

    /// Attach the path and step being processed when this error surfaced.
    pub fn at(self, op: &'static str, path: impl Into<String>) -> Self {
        MigrateError::Record {
            path: path.into(),
            op,
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Connection { .. } => ErrorKind::Connection,
            MigrateError::Shape { .. } => ErrorKind::Shape,
            MigrateError::MissingField { .. } => ErrorKind::MissingField,
            MigrateError::Crypto { .. } => ErrorKind::Crypto,
            MigrateError::Format { .. } => ErrorKind::Format,
            MigrateError::Io { .. } => ErrorKind::Io,
            MigrateError::Config { .. } => ErrorKind::Config,
            MigrateError::Record { source, .. } => source.kind(),
        }
    }
}
