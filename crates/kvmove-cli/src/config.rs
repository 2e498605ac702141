use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/kvmove/config.toml` (platform-specific).
/// Every setting is optional; flags and environment variables take precedence.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// KV v2 mount path.
    pub mount: Option<String>,
    /// Folder within the mount to start from.
    pub prefix: Option<String>,
    /// Bundle file path.
    pub out: Option<PathBuf>,
    /// Designated field name.
    pub field: Option<String>,
    /// Transit engine mount path.
    pub transit_mount: Option<String>,
    /// Server secrets are exported from.
    pub source: Option<ServerConfig>,
    /// Server secrets are imported into.
    pub destination: Option<ServerConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: Option<String>,
    pub token: Option<String>,
    pub transit_key: Option<String>,
}

impl Config {
    /// Starting point written by `kvmove config init`. Tokens are left out;
    /// supply them through the environment.
    pub fn template() -> Self {
        Self {
            mount: Some("secret".into()),
            prefix: None,
            out: Some(PathBuf::from("secrets_export.json")),
            field: Some("encrypted".into()),
            transit_mount: Some("transit".into()),
            source: Some(ServerConfig {
                addr: Some("http://127.0.0.1:8200".into()),
                token: None,
                transit_key: Some("old-key".into()),
            }),
            destination: Some(ServerConfig {
                addr: Some("http://127.0.0.1:8300".into()),
                token: None,
                transit_key: Some("new-key".into()),
            }),
        }
    }
}

/// Load config from `path`, or the default path when `None`; if missing, return defaults.
pub fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_from_path(path),
        None => load_from_path(default_path()?),
    }
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("kvmove").join("config.toml"))
}

/// Write `config` to `path`, creating parent directories as needed.
/// Leaves an existing file alone to avoid clobbering user edits.
pub fn write_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}
