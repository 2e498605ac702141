use std::path::PathBuf;

use kvmove_core::MigrateError;
use kvmove_openbao::OpenBaoConfig;
use kvmove_pipeline::{Mode, DEFAULT_FIELD};

use crate::{
    cli::RunArgs,
    config::{Config, ServerConfig},
};

const DEFAULT_BUNDLE: &str = "secrets_export.json";
const DEFAULT_TRANSIT_MOUNT: &str = "transit";

/// One fully resolved server: where it is, how to authenticate, and which transit key to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub addr: String,
    pub token: String,
    pub transit_key: String,
}

impl Server {
    pub fn openbao(&self) -> OpenBaoConfig {
        OpenBaoConfig {
            addr: self.addr.clone(),
            token: self.token.clone(),
        }
    }
}

/// Settings for one run after merging flags, environment and the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mode: Mode,
    pub mount: String,
    pub prefix: String,
    pub bundle: PathBuf,
    pub field: String,
    pub transit_mount: String,
    /// Present whenever the mode exports.
    pub source: Option<Server>,
    /// Present whenever the mode imports.
    pub destination: Option<Server>,
}

impl Settings {
    /// Merge `args` over `file` and validate the result.
    ///
    /// Every failure is a configuration error, reported before anything touches
    /// the network or the bundle.
    pub fn resolve(args: &RunArgs, file: &Config) -> Result<Self, MigrateError> {
        let mode = Mode::from_flags(args.export_only, args.import_only)?;

        let mount = pick(&args.mount, &file.mount)
            .ok_or_else(|| MigrateError::config("KV mount is required (--mount or KV_MOUNT)"))?;
        let prefix = pick(&args.prefix, &file.prefix).unwrap_or_default();
        let bundle = args
            .out
            .clone()
            .or_else(|| file.out.clone())
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUNDLE));
        let field = pick(&args.field, &file.field).unwrap_or_else(|| DEFAULT_FIELD.to_string());
        let transit_mount = pick(&args.transit_mount, &file.transit_mount)
            .unwrap_or_else(|| DEFAULT_TRANSIT_MOUNT.to_string());

        let source = if mode.exports() {
            Some(resolve_server(
                "old",
                "OLD",
                [&args.old_addr, &args.old_token, &args.old_transit],
                file.source.as_ref(),
            )?)
        } else {
            None
        };
        let destination = if mode.imports() {
            Some(resolve_server(
                "new",
                "NEW",
                [&args.new_addr, &args.new_token, &args.new_transit],
                file.destination.as_ref(),
            )?)
        } else {
            None
        };

        Ok(Self {
            mode,
            mount,
            prefix,
            bundle,
            field,
            transit_mount,
            source,
            destination,
        })
    }
}

/// First non-empty value of flag/env, then file.
fn pick(arg: &Option<String>, file: &Option<String>) -> Option<String> {
    arg.iter()
        .chain(file.iter())
        .find(|v| !v.trim().is_empty())
        .cloned()
}

fn resolve_server(
    flag: &str,
    env: &str,
    [addr, token, transit]: [&Option<String>; 3],
    file: Option<&ServerConfig>,
) -> Result<Server, MigrateError> {
    let empty = ServerConfig::default();
    let file = file.unwrap_or(&empty);
    let missing = |what: &str, flag_suffix: &str, env_suffix: &str| {
        MigrateError::config(format!(
            "{what} is required (--{flag}-{flag_suffix} or {env}_{env_suffix})"
        ))
    };

    Ok(Server {
        addr: pick(addr, &file.addr).ok_or_else(|| missing("server address", "addr", "ADDR"))?,
        token: pick(token, &file.token).ok_or_else(|| missing("token", "token", "TOKEN"))?,
        transit_key: pick(transit, &file.transit_key)
            .ok_or_else(|| missing("transit key", "transit", "TRANSIT_KEY"))?,
    })
}
