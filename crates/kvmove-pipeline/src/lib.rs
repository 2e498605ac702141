//! The migration pipeline: enumerate a namespace, read each leaf, rewrite
//! its designated field through a crypto oracle, and move it via a bundle.
//!
//! Everything here runs strictly in sequence against the contracts in
//! `kvmove-core`, so the same flows run unchanged against real servers or the
//! in-memory doubles used by the tests.

pub mod enumerate;
pub mod migrate;
pub mod secret;
pub mod transform;

pub use enumerate::enumerate;
pub use migrate::{
    export, import, run, Endpoint, ExportSummary, ImportSummary, Mode, RunConfig, RunSummary,
};
pub use secret::{read_secret, write_secret};
pub use transform::{Direction, FieldTransformer, DEFAULT_FIELD};
