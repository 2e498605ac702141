//! Portable bundle format for exported secrets.
//! A bundle is a pretty-printed JSON list of `{path, data}` objects, written
//! atomically so a failed export never leaves a half-written file behind.

pub mod codec;
pub mod file;

pub use codec::{decode, encode};
pub use file::{read_bundle, write_bundle};
