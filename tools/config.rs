use std::fs;
use std::path::{Path, PathBuf};

use common::ConverterConfig;
use tracing::{info, warn};

pub const DEFAULT_DB_FILE: &str = "library.redb";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    NoSearchPaths,
    InvalidAllowance(f64),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Toml(err) => write!(f, "toml error: {}", err),
            ConfigError::NoSearchPaths => {
                write!(f, "no search paths specified, unable to continue")
            }
            ConfigError::InvalidAllowance(value) => {
                write!(f, "MinimumMatchAllowance must be a finite number, got {}", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err)
    }
}

/// Reads the TOML config at `path`. A missing file falls back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<ConverterConfig, ConfigError> {
    let path = match path {
        Some(path) => path,
        None => return Ok(ConverterConfig::default()),
    };
    if !path.exists() {
        warn!("Config file {:?} does not exist; using default configuration", path);
        return Ok(ConverterConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let mut config: ConverterConfig = toml::from_str(&contents)?;
    config.paths = config
        .paths
        .iter()
        .map(|value| resolve_path(path, value))
        .collect();
    config.db_file = config.db_file.as_deref().map(|value| resolve_path(path, value));
    info!("Loaded config from {:?}", path);
    Ok(config.normalized())
}

/// Appends command-line search directories and checks the result is usable.
pub fn finalize(
    mut config: ConverterConfig,
    search_dirs: &[PathBuf],
) -> Result<ConverterConfig, ConfigError> {
    config.paths.extend(search_dirs.iter().cloned());
    if config.paths.is_empty() {
        return Err(ConfigError::NoSearchPaths);
    }
    if !config.minimum_match_allowance.is_finite() {
        return Err(ConfigError::InvalidAllowance(config.minimum_match_allowance));
    }
    Ok(config)
}

/// Snapshot location: command line first, then config, then the default.
pub fn db_path(cli_value: Option<&Path>, config: &ConverterConfig) -> PathBuf {
    cli_value
        .map(Path::to_path_buf)
        .or_else(|| config.db_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

pub fn resolve_path(config_path: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        return value.to_path_buf();
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(value)
}
