use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub const ENV_BASE_URL: &str = "PAWS_BASE_URL";
pub const ENV_TIMEOUT: &str = "PAWS_TIMEOUT";
pub const ENV_RETRIES: &str = "PAWS_RETRIES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found '{0}'")]
    NotFound(String),

    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write config '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {key} value '{value}': {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(alias = "api_base_url")]
    pub base_url: Option<String>,
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub backoff_ms: Option<u64>,
    pub retry_statuses: Option<String>,
    pub health_timeout: Option<u64>,
    pub page_size: Option<usize>,
    pub storage: Option<String>,
    pub proxy: Option<String>,
    pub no_color: Option<bool>,
    pub log_level: Option<String>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".paws").join("config.yml"))
}

pub fn default_storage_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".paws").join("storage.json"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => {
            let cfg = serde_yaml::from_str::<ConfigFile>(&contents).map_err(|e| {
                ConfigError::Parse {
                    path: path.display().to_string(),
                    source: e,
                }
            })?;
            debug!(path = %path.display(), "loaded config file");
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ConfigError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::InvalidEnv {
        key,
        reason: e.to_string(),
        value,
    })
}

/// Layers `PAWS_*` variables over the file values. `lookup` is usually
/// `std::env::var`.
pub fn apply_env_overrides<F>(mut cfg: ConfigFile, lookup: F) -> Result<ConfigFile, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
        info!("{ENV_BASE_URL} set, overriding base URL");
        cfg.base_url = Some(url.trim().to_string());
    }
    if let Some(raw) = lookup(ENV_TIMEOUT).filter(|v| !v.trim().is_empty()) {
        cfg.timeout = Some(parse_env(ENV_TIMEOUT, raw)?);
    }
    if let Some(raw) = lookup(ENV_RETRIES).filter(|v| !v.trim().is_empty()) {
        cfg.retries = Some(parse_env(ENV_RETRIES, raw)?);
    }
    Ok(cfg)
}

pub fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn default_config_yaml() -> String {
    r#"# Paws config
#
# Location (default):
#   ~/.paws/config.yml
#
# Environment overrides: PAWS_BASE_URL, PAWS_TIMEOUT, PAWS_RETRIES.
# Command line flags win over both.

base_url: http://localhost:8080

# Requests
timeout: 10
retries: 2
backoff_ms: 1000
retry_statuses: "408,429,500,502,503,504"
health_timeout: 5
# proxy: http://127.0.0.1:8080

# Listing
page_size: 6

# Session storage (token and profile)
# storage: ~/.paws/storage.json

# Output styling
no_color: false
# log_level: info
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    let write_err = |e: std::io::Error| ConfigError::Write {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, default_config_yaml()).map_err(write_err)?;
    info!(path = %path.display(), "wrote default config");
    Ok(())
}
