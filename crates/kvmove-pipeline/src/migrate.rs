use std::{collections::HashSet, path::PathBuf};

use kvmove_bundle::{read_bundle, write_bundle};
use kvmove_core::{CryptoOracle, MigrateError, SecretRecord, SecretStore};
use tracing::{debug, info, instrument};

use crate::{
    enumerate::enumerate,
    secret::{read_secret, write_secret},
    transform::{Direction, FieldTransformer},
};

/// Which flows a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ExportOnly,
    ImportOnly,
    /// Export, then import the bundle just produced.
    Both,
}

impl Mode {
    /// Resolve the `--export-only` / `--import-only` pair.
    pub fn from_flags(export_only: bool, import_only: bool) -> Result<Self, MigrateError> {
        match (export_only, import_only) {
            (true, true) => Err(MigrateError::config(
                "can't specify both export-only and import-only",
            )),
            (true, false) => Ok(Mode::ExportOnly),
            (false, true) => Ok(Mode::ImportOnly),
            (false, false) => Ok(Mode::Both),
        }
    }

    pub fn exports(self) -> bool {
        matches!(self, Mode::ExportOnly | Mode::Both)
    }

    pub fn imports(self) -> bool {
        matches!(self, Mode::ImportOnly | Mode::Both)
    }
}

/// A store together with the oracle and key name used for its designated field.
#[derive(Clone, Copy)]
pub struct Endpoint<'a> {
    pub store: &'a dyn SecretStore,
    pub oracle: &'a dyn CryptoOracle,
    pub key: &'a str,
}

/// Everything one run needs, passed explicitly rather than held globally.
pub struct RunConfig<'a> {
    pub mode: Mode,
    /// Folder to start enumeration from; empty is the top of the mount.
    pub root: String,
    /// Name of the designated field.
    pub field: String,
    /// Bundle written by export and read by import.
    pub bundle: PathBuf,
    pub source: Option<Endpoint<'a>>,
    pub destination: Option<Endpoint<'a>>,
}

impl RunConfig<'_> {
    /// Check the endpoints required by `mode` are present. Runs before any I/O.
    pub fn validate(&self) -> Result<(), MigrateError> {
        if self.field.is_empty() {
            return Err(MigrateError::config("designated field name must not be empty"));
        }
        if self.mode.exports() && self.source.is_none() {
            return Err(MigrateError::config("export requires a source store"));
        }
        if self.mode.imports() && self.destination.is_none() {
            return Err(MigrateError::config("import requires a destination store"));
        }
        Ok(())
    }

    fn source(&self) -> Result<Endpoint<'_>, MigrateError> {
        self.source
            .ok_or_else(|| MigrateError::config("export requires a source store"))
    }

    fn destination(&self) -> Result<Endpoint<'_>, MigrateError> {
        self.destination
            .ok_or_else(|| MigrateError::config("import requires a destination store"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Leaf paths found by enumeration.
    pub discovered: usize,
    /// Records written to the bundle.
    pub exported: usize,
    /// Paths that held no data when read.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub written: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub export: Option<ExportSummary>,
    pub import: Option<ImportSummary>,
}

/// Run the flows selected by `cfg.mode`. In [`Mode::Both`] the records just
/// written to the bundle feed the import directly.
pub async fn run(cfg: &RunConfig<'_>) -> Result<RunSummary, MigrateError> {
    cfg.validate()?;
    let mut summary = RunSummary::default();

    let exported = if cfg.mode.exports() {
        let (records, exported) = export(cfg).await?;
        summary.export = Some(exported);
        Some(records)
    } else {
        None
    };

    if cfg.mode.imports() {
        let records = match exported {
            Some(records) => records,
            None => read_bundle(&cfg.bundle)?,
        };
        summary.import = Some(import(cfg, &records).await?);
    }

    Ok(summary)
}

/// Enumerate, read, decrypt and collect every leaf, then write the bundle.
///
/// The bundle is written once, after every record is processed, so a failure
/// at any path leaves no new artifact behind.
#[instrument(skip_all, fields(root = %cfg.root, bundle = %cfg.bundle.display()))]
pub async fn export(
    cfg: &RunConfig<'_>,
) -> Result<(Vec<SecretRecord>, ExportSummary), MigrateError> {
    let source = cfg.source()?;
    let transformer = FieldTransformer::new(source.oracle, source.key, &cfg.field);

    info!(store = source.store.name(), "listing secrets");
    let paths = enumerate(source.store, &cfg.root).await?;
    info!(count = paths.len(), "found secret paths");
    ensure_unique(&paths)?;

    let mut records = Vec::with_capacity(paths.len());
    let mut skipped = 0;
    for path in &paths {
        debug!(%path, "reading");
        let Some(fields) = read_secret(source.store, path)
            .await
            .map_err(|e| e.at("read", path))?
        else {
            debug!(%path, "no data, skipping");
            skipped += 1;
            continue;
        };

        let fields = transformer
            .transform(fields, Direction::Decrypt)
            .await
            .map_err(|e| e.at("decrypt", path))?;
        records.push(SecretRecord::new(path.clone(), fields));
    }

    write_bundle(&cfg.bundle, &records)?;
    info!(
        count = records.len(),
        file = %cfg.bundle.display(),
        "exported secrets"
    );

    let summary = ExportSummary {
        discovered: paths.len(),
        exported: records.len(),
        skipped,
    };
    Ok((records, summary))
}

/// A bundle holds each path once; a listing that repeats a leaf can't be exported.
fn ensure_unique(paths: &[String]) -> Result<(), MigrateError> {
    let mut seen = HashSet::with_capacity(paths.len());
    match paths.iter().find(|&path| !seen.insert(path)) {
        Some(path) => Err(MigrateError::Shape {
            op: "list",
            target: path.clone(),
            expected: "unique leaf paths",
        }),
        None => Ok(()),
    }
}

/// Encrypt and write each record to the destination in bundle order.
///
/// Stops at the first failure; records already written stay written.
#[instrument(skip_all, fields(records = records.len()))]
pub async fn import(
    cfg: &RunConfig<'_>,
    records: &[SecretRecord],
) -> Result<ImportSummary, MigrateError> {
    let destination = cfg.destination()?;
    let transformer = FieldTransformer::new(destination.oracle, destination.key, &cfg.field);

    info!(
        count = records.len(),
        store = destination.store.name(),
        "importing secrets"
    );

    let mut written = 0;
    for record in records {
        let fields = transformer
            .transform(record.fields.clone(), Direction::Encrypt)
            .await
            .map_err(|e| e.at("encrypt", &record.path))?;

        debug!(path = %record.path, "writing");
        write_secret(destination.store, &record.path, &fields)
            .await
            .map_err(|e| e.at("write", &record.path))?;
        written += 1;
    }

    info!(written, "import complete");
    Ok(ImportSummary { written })
}
