//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which game the process serves. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Free movement, one "it" player
    Tag,
    /// Car dynamics on a closed track with laps
    Racing,
}

impl FromStr for GameMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tag" => Ok(Self::Tag),
            "racing" | "race" => Ok(Self::Racing),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Game served by this process
    pub mode: GameMode,
    /// Laps a racer must complete to win
    pub laps_to_win: u32,
    /// Seed for spawn positions and colours (random when unset)
    pub world_seed: Option<u64>,

    /// Allowed client origins for CORS (any origin when empty)
    pub client_origins: Vec<String>,
}

pub const DEFAULT_LAPS_TO_WIN: u32 = 3;

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins so the server binds all interfaces on LAN setups
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        };

        let mode = match env::var("GAME_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => GameMode::Tag,
        };

        let laps_to_win = match env::var("LAPS") {
            Ok(raw) => parse_laps(&raw)?,
            Err(_) => DEFAULT_LAPS_TO_WIN,
        };

        let world_seed = match env::var("WORLD_SEED") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidNumber("WORLD_SEED"))?,
            ),
            Err(_) => None,
        };

        let client_origins = env::var("CLIENT_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            mode,
            laps_to_win,
            world_seed,
            client_origins,
        })
    }
}

fn parse_laps(raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(laps) if laps >= 1 => Ok(laps),
        _ => Err(ConfigError::InvalidNumber("LAPS")),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Unknown game mode {0:?} (expected \"tag\" or \"racing\")")]
    InvalidMode(String),

    #[error("Invalid numeric value for {0}")]
    InvalidNumber(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_mode_parses_case_insensitively() {
        assert_eq!("TAG".parse::<GameMode>().unwrap(), GameMode::Tag);
        assert_eq!(" racing ".parse::<GameMode>().unwrap(), GameMode::Racing);
        assert!(matches!(
            "soccer".parse::<GameMode>(),
            Err(ConfigError::InvalidMode(_))
        ));
    }

    #[test]
    fn laps_must_be_positive() {
        assert_eq!(parse_laps("5").unwrap(), 5);
        assert!(parse_laps("0").is_err());
        assert!(parse_laps("three").is_err());
    }
}
