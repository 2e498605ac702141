use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// CLI surface definition. Without a subcommand, runs the migration.
#[derive(Parser, Debug)]
#[command(
    name = "kvmove",
    about = "Migrate KV v2 secrets between OpenBao/Vault servers, re-encrypting one field via transit",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging for kvmove crates.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a config file template if one does not exist.
    Init,
}

/// Migration parameters. Flags win over environment, which wins over the config file.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// Source server address.
    #[arg(long, env = "OLD_ADDR")]
    pub old_addr: Option<String>,
    /// Source server token.
    #[arg(long, env = "OLD_TOKEN", hide_env_values = true)]
    pub old_token: Option<String>,
    /// Source transit key name.
    #[arg(long, env = "OLD_TRANSIT_KEY")]
    pub old_transit: Option<String>,

    /// Destination server address.
    #[arg(long, env = "NEW_ADDR")]
    pub new_addr: Option<String>,
    /// Destination server token.
    #[arg(long, env = "NEW_TOKEN", hide_env_values = true)]
    pub new_token: Option<String>,
    /// Destination transit key name.
    #[arg(long, env = "NEW_TRANSIT_KEY")]
    pub new_transit: Option<String>,

    /// KV v2 mount path (e.g. `secret`).
    #[arg(long, env = "KV_MOUNT")]
    pub mount: Option<String>,
    /// Only migrate secrets below this folder of the mount.
    #[arg(long)]
    pub prefix: Option<String>,
    /// Bundle file written by export and read by import [default: secrets_export.json].
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Field re-encrypted during migration [default: encrypted].
    #[arg(long)]
    pub field: Option<String>,
    /// Mount path of the transit engine on both servers [default: transit].
    #[arg(long)]
    pub transit_mount: Option<String>,

    /// Only export (write the bundle).
    #[arg(long)]
    pub export_only: bool,
    /// Only import (read the bundle given by --out).
    #[arg(long)]
    pub import_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_migration_when_missing_subcommand() {
        let cli = Cli::try_parse_from(["kvmove"]).expect("parse should succeed");
        assert_eq!(cli.command, None);
        assert!(!cli.run.export_only);
        assert!(!cli.run.import_only);
    }

    #[test]
    fn parses_migration_flags() {
        let cli = Cli::try_parse_from([
            "kvmove",
            "--old-addr",
            "http://old:8200",
            "--old-token",
            "s.old",
            "--old-transit",
            "legacy",
            "--mount",
            "secret",
            "--out",
            "dump.json",
            "--export-only",
        ])
        .expect("parse should succeed");
        assert_eq!(cli.run.old_addr.as_deref(), Some("http://old:8200"));
        assert_eq!(cli.run.old_transit.as_deref(), Some("legacy"));
        assert_eq!(cli.run.mount.as_deref(), Some("secret"));
        assert_eq!(cli.run.out, Some(PathBuf::from("dump.json")));
        assert!(cli.run.export_only);
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli = Cli::try_parse_from(["kvmove", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Config(ConfigCommand::Init)));
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["kvmove", "config", "init", "--config", "/tmp/k.toml", "-v"])
            .expect("parse should succeed");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/k.toml")));
        assert!(cli.verbose);
    }
}
