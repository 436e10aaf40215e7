use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub lobby: LobbyConfig,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Ok(toml::from_str::<Self>(&config_str)?)
    }
}

fn default_retry_interval() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RecoveryConfig {
    #[serde(default = "default_retry_interval")]
    pub retry_interval: u64, // in seconds
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            retry_interval: default_retry_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_players() -> u8 {
    4
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LobbyConfig {
    #[serde(default)]
    pub default_nickname: Option<String>,
    #[serde(default = "default_max_players")]
    pub max_players: u8,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            default_nickname: None,
            max_players: default_max_players(),
        }
    }
}
