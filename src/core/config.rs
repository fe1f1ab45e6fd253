//! TOML configuration loaded from the platform config directory.
//!
//! Every field is optional; a missing file yields defaults, so the client
//! runs unconfigured against a local or env-selected endpoint. The API key
//! itself never lives in the file, only the name of the environment
//! variable that holds it.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::core::store::ChatMode;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_TYPEWRITER_DELAY_MS: u64 = 5;
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file was not valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Chat-completions endpoint base URL.
    pub base_url: Option<String>,
    /// Model identifier sent with every request.
    pub model: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    /// Memory mode to start in: "raw" or "templated".
    pub default_mode: Option<String>,
    /// Directory transcripts are saved to.
    pub history_dir: Option<PathBuf>,
    /// Per-character delay of the terminal typewriter effect.
    pub typewriter_delay_ms: Option<u64>,
    /// Bind address of the web adapter.
    pub listen_addr: Option<String>,
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn StdError>> {
        Self::load_from_path(&Self::config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Config, Box<dyn StdError>> {
        if path.exists() {
            let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        Self::project_dirs().config_dir().join("config.toml")
    }

    fn project_dirs() -> ProjectDirs {
        ProjectDirs::from("", "", "parley").expect("Failed to determine config directory")
    }

    /// Configured base URL, the `OPENAI_BASE_URL` environment variable, or
    /// the OpenAI default, in that order.
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .or_else(|| env::var(BASE_URL_ENV).ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// API key read from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        let var = self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
        env::var(var).ok().filter(|v| !v.trim().is_empty())
    }

    pub fn default_mode(&self) -> ChatMode {
        match self.default_mode.as_deref() {
            None => ChatMode::Templated,
            Some(value) => value.parse().unwrap_or_else(|err: String| {
                warn!("{err}; falling back to templated mode");
                ChatMode::Templated
            }),
        }
    }

    pub fn history_dir(&self) -> PathBuf {
        self.history_dir
            .clone()
            .unwrap_or_else(|| Self::project_dirs().data_dir().join("chat_history"))
    }

    pub fn typewriter_delay(&self) -> Duration {
        Duration::from_millis(
            self.typewriter_delay_ms
                .unwrap_or(DEFAULT_TYPEWRITER_DELAY_MS),
        )
    }

    pub fn listen_addr(&self) -> String {
        self.listen_addr
            .clone()
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
    }
}
