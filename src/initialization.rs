use std::{env, fs};
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;

const CONFIG_ENV: &str = "WEATHERSTORE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_LOCATION: &str = "94043";

#[derive(Deserialize, Debug)]
pub struct Db {
    pub db_path: String,
}

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn is_metric(&self) -> bool {
        *self == Units::Metric
    }
}

/// User preferences, the preferred location and the temperature units
#[derive(Deserialize, Debug)]
pub struct Preferences {
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub units: Units,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences { location: default_location(), units: Units::default() }
    }
}

#[derive(Deserialize, Debug)]
pub struct Logging {
    #[serde(default = "default_level")]
    pub level: String,
    pub log_path: Option<String>,
}

impl Default for Logging {
    fn default() -> Self {
        Logging { level: default_level(), log_path: None }
    }
}

impl Logging {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.level.parse()
            .map_err(|_| ConfigError(format!("unknown log level: {}", self.level)))
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub db: Db,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub logging: Logging,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_level() -> String {
    "info".to_string()
}

/// Loads the configuration from the file named by `WEATHERSTORE_CONFIG`, or `config.toml`
///
pub fn config() -> Result<Config, ConfigError> {
    let path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(&path)
}

/// Loads the configuration from the given file
///
/// # Arguments
///
/// * 'path' - path to a toml config file
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(path)?;
    parse_config(&toml)
}

/// Parses and validates a toml configuration
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(toml)?;
    config.logging.level_filter()?;

    Ok(config)
}
