use kvmove_core::MigrateError;
use kvmove_openbao::{KvStore, OpenBaoClient, TransitOracle};
use kvmove_pipeline::{Endpoint, RunConfig, RunSummary};
use tracing::info;

use crate::settings::{Server, Settings};

/// A connected server: KV store and transit engine sharing one HTTP client.
struct Side {
    store: KvStore,
    oracle: TransitOracle,
    key: String,
}

impl Side {
    fn connect(server: &Server, settings: &Settings) -> Self {
        let client = OpenBaoClient::new(server.openbao());
        Self {
            store: KvStore::new(client.clone(), settings.mount.clone()),
            oracle: TransitOracle::new(client, settings.transit_mount.clone()),
            key: server.transit_key.clone(),
        }
    }

    fn endpoint(&self) -> Endpoint<'_> {
        Endpoint {
            store: &self.store,
            oracle: &self.oracle,
            key: &self.key,
        }
    }
}

/// Build the OpenBao adapters described by `settings` and run the migration.
pub async fn run(settings: &Settings) -> Result<RunSummary, MigrateError> {
    let source = settings
        .source
        .as_ref()
        .map(|server| Side::connect(server, settings));
    let destination = settings
        .destination
        .as_ref()
        .map(|server| Side::connect(server, settings));

    info!(
        mode = ?settings.mode,
        mount = %settings.mount,
        bundle = %settings.bundle.display(),
        "starting migration"
    );

    let cfg = RunConfig {
        mode: settings.mode,
        root: settings.prefix.clone(),
        field: settings.field.clone(),
        bundle: settings.bundle.clone(),
        source: source.as_ref().map(Side::endpoint),
        destination: destination.as_ref().map(Side::endpoint),
    };
    kvmove_pipeline::run(&cfg).await
}

/// Human-readable lines describing what a run did.
pub fn report(settings: &Settings, summary: &RunSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(export) = summary.export {
        lines.push(format!(
            "Exported {} secrets to {} ({} discovered, {} skipped)",
            export.exported,
            settings.bundle.display(),
            export.discovered,
            export.skipped
        ));
    }
    if let Some(import) = summary.import {
        lines.push(format!("Imported {} secrets", import.written));
    }
    lines
}
