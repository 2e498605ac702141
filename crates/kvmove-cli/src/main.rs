mod cli;
mod config;
mod migrate;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::Result;
use kvmove_core::{ErrorKind, MigrateError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{cli::ConfigCommand, settings::Settings};

/// Entry point wiring the CLI to the migration pipeline.
#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("Error: {err:?}");
        return ExitCode::FAILURE;
    }

    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            exit_code(&err)
        }
    }
}

async fn dispatch(cli: cli::Cli) -> Result<()> {
    match cli.command {
        Some(cli::Command::Version) => print_version(),
        Some(cli::Command::Config(ConfigCommand::Init)) => init_config(cli.config)?,
        None => {
            let file = load_config(cli.config.as_deref())?;
            let settings = Settings::resolve(&cli.run, &file)?;
            let summary = migrate::run(&settings).await?;
            for line in migrate::report(&settings, &summary) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Filter used when RUST_LOG is unset: info, or debug for every kvmove crate with --verbose.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,kvmove=debug,kvmove_core=debug,kvmove_pipeline=debug,kvmove_openbao=debug,kvmove_bundle=debug"
    } else {
        "info"
    }
}

fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// An unreadable or malformed config file is a configuration error like any other.
fn load_config(path: Option<&std::path::Path>) -> Result<config::Config, MigrateError> {
    config::load(path).map_err(|e| MigrateError::config(format!("config file: {e}")))
}

/// 2 for configuration problems, 1 for everything else.
fn exit_code(err: &color_eyre::Report) -> ExitCode {
    match err.downcast_ref::<MigrateError>().map(MigrateError::kind) {
        Some(ErrorKind::Config) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn print_version() {
    println!("kvmove {}", env!("CARGO_PKG_VERSION"));
}

fn init_config(path: Option<std::path::PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => config::default_path()?,
    };
    let path = config::write_if_missing(&config::Config::template(), &path)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
