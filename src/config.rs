use crate::api::DEFAULT_SEED_URL;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "tasklist-sync";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    Timeout { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub seed_url: String,
    pub database_path: PathBuf,
    pub flags_path: PathBuf,
    pub request_timeout: Duration,
}

// Every key in config.toml is optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    seed_url: Option<String>,
    database_path: Option<PathBuf>,
    flags_path: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Config {
            seed_url: DEFAULT_SEED_URL.to_string(),
            database_path: data_dir.join("tasks.db"),
            flags_path: data_dir.join("flags.toml"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Defaults, then the config file if it exists, then environment overrides.
    pub fn load() -> Result<Config, ConfigError> {
        let mut config = Config::default();
        if let Some(path) = Config::default_path() {
            if path.exists() {
                config.apply_file(&path)?;
            }
        }
        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(url) = file.seed_url {
            self.seed_url = url;
        }
        if let Some(path) = file.database_path {
            self.database_path = path;
        }
        if let Some(path) = file.flags_path {
            self.flags_path = path;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("TASKLIST_SEED_URL") {
            self.seed_url = url;
        }
        if let Some(path) = var("TASKLIST_DATABASE") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(path) = var("TASKLIST_FLAGS") {
            self.flags_path = PathBuf::from(path);
        }
        if let Some(value) = var("TASKLIST_TIMEOUT_SECS") {
            let secs = value.trim().parse::<u64>().map_err(|_| ConfigError::Timeout {
                name: "TASKLIST_TIMEOUT_SECS",
                value: value.clone(),
            })?;
            self.request_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }
}
