mod schema;

pub use schema::{
    ChatConfig, Config, DEFAULT_MASTER_BRANCH, DEFAULT_SHIP_ITS, MAX_RESULTS_CHANNEL,
    MAX_RESULTS_PRIVATE,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::credentials::Credentials;

/// Environment variable overriding the configured server URL
pub const ENV_URL_VAR: &str = "RB_KEEPER_URL";
/// Environment variable overriding the configured username
pub const ENV_USER_VAR: &str = "RB_KEEPER_USER";

/// Get the config directory path (~/.config/rb-keeper/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("rb-keeper"))
}

/// Get the default config file path (~/.config/rb-keeper/config.yaml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path,
///   and a missing default file yields the default configuration.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            path
        }
        None => match get_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };

    parse_config_file(&config_path)
}

fn parse_config_file(config_path: &Path) -> Result<Config> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse config: invalid YAML in {}",
            config_path.display()
        )
    })?;

    Ok(config)
}

/// Resolved run settings, built once at startup and handed to each command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: Option<String>,
    pub credentials: Option<Credentials>,
    pub ship_its: usize,
    pub master_branch: String,
    pub chat: ChatConfig,
}

impl Settings {
    /// Merge the config file with environment overrides. Command-line flags
    /// are applied on top by the caller.
    pub fn resolve(config: Config, credentials: Option<Credentials>) -> Self {
        let url = env_value(ENV_URL_VAR).or(config.url);
        Self {
            url,
            credentials,
            ship_its: config.ship_its.unwrap_or(DEFAULT_SHIP_ITS),
            master_branch: config
                .master_branch
                .unwrap_or_else(|| DEFAULT_MASTER_BRANCH.to_string()),
            chat: config.chat,
        }
    }

    /// Server URL from the command line if given, else the configured one
    pub fn server_url(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string).or_else(|| self.url.clone())
    }
}

/// Username from the environment or the config file
pub fn configured_username(config: &Config) -> Option<String> {
    env_value(ENV_USER_VAR).or_else(|| config.username.clone())
}

/// Read a non-empty, trimmed environment variable
pub(crate) fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
