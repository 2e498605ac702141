//! HTTP adapters for OpenBao/Vault-compatible servers: the KV version 2
//! secrets engine as a [`SecretStore`](kvmove_core::SecretStore) and the
//! transit engine as a [`CryptoOracle`](kvmove_core::CryptoOracle).

pub mod client;
pub mod kv;
pub mod transit;

pub use client::{OpenBaoClient, OpenBaoConfig};
pub use kv::KvStore;
pub use transit::TransitOracle;
