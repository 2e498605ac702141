//! Core contracts for kvmove: the record model, the error taxonomy, and the
//! store/oracle traits every adapter implements.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod error;
pub mod oracle;
pub mod path;
pub mod record;
pub mod store;

pub use error::{ErrorKind, MigrateError};
pub use oracle::{CryptoOracle, InMemoryOracle};
pub use record::{FieldValue, Fields, SecretRecord};
pub use store::{InMemorySecretStore, SecretStore};
