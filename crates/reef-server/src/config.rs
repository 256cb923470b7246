//! Server configuration management.
//!
//! Every environment variable the server reads is read here.

use crate::coordinator::MatchSettings;
use reef_core::{MouthLayout, RuleConfig};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Largest board radius a server will create matches with
pub const MAX_BOARD_RADIUS: u32 = 64;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// Rules every new match is created with
    pub rules: RuleConfig,
    /// Whether a full match accepts further joiners as spectators
    pub allow_spectators: bool,
    /// How long a match may go without any command before it is closed
    pub idle_match_timeout: Duration,
    /// Capacity of each match's command queue
    pub match_queue: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

impl ConfigError {
    fn invalid(var: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var: var.to_string(),
            reason: reason.into(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let settings = MatchSettings::default();
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            rules: settings.rules,
            allow_spectators: settings.allow_spectators,
            idle_match_timeout: settings.idle_timeout,
            match_queue: settings.queue_capacity,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let rules = RuleConfig {
            board_radius: parse_or(&lookup, "REEF_BOARD_RADIUS", defaults.rules.board_radius)?,
            winning_chain: parse_or(&lookup, "REEF_WINNING_CHAIN", defaults.rules.winning_chain)?,
            fish_must_be_adjacent: parse_or(
                &lookup,
                "REEF_FISH_ADJACENT",
                defaults.rules.fish_must_be_adjacent,
            )?,
            big_shark_mouths: parse_or::<MouthLayout, _>(
                &lookup,
                "REEF_BIG_SHARK_MOUTHS",
                defaults.rules.big_shark_mouths,
            )?,
            ..defaults.rules
        };

        let idle_secs: u64 = parse_or(
            &lookup,
            "REEF_IDLE_MATCH_SECS",
            defaults.idle_match_timeout.as_secs(),
        )?;

        let config = ServerConfig {
            addr: parse_or(&lookup, "SERVER_ADDR", defaults.addr)?,
            rules,
            allow_spectators: parse_or(&lookup, "REEF_ALLOW_SPECTATORS", defaults.allow_spectators)?,
            idle_match_timeout: Duration::from_secs(idle_secs),
            match_queue: parse_or(&lookup, "REEF_MATCH_QUEUE", defaults.match_queue)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_BOARD_RADIUS).contains(&self.rules.board_radius) {
            return Err(ConfigError::invalid(
                "REEF_BOARD_RADIUS",
                format!("must be between 1 and {MAX_BOARD_RADIUS}"),
            ));
        }
        if self.rules.winning_chain < 2 {
            return Err(ConfigError::invalid("REEF_WINNING_CHAIN", "must be at least 2"));
        }
        if self.idle_match_timeout.is_zero() {
            return Err(ConfigError::invalid("REEF_IDLE_MATCH_SECS", "must be greater than 0"));
        }
        if self.match_queue == 0 {
            return Err(ConfigError::invalid("REEF_MATCH_QUEUE", "must be greater than 0"));
        }
        Ok(())
    }

    /// Settings handed to the coordinator for each new match
    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            rules: self.rules,
            allow_spectators: self.allow_spectators,
            idle_timeout: self.idle_match_timeout,
            queue_capacity: self.match_queue,
        }
    }
}

/// Parse `key` if set, otherwise fall back to `default`
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{raw}'"))),
    }
}
