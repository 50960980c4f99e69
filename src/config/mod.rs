use chrono::Duration;
use std::env;
use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::security_headers_layers;

use crate::checkin::token::DeploymentSecret;
use crate::checkin::{TokenService, WindowConfig};

const DEFAULT_STEP_SECONDS: u64 = 30;
const DEFAULT_TOLERANCE_STEPS: i64 = 1;
const DEFAULT_PRE_BUFFER_MINUTES: i64 = 15;
const DEFAULT_POST_BUFFER_MINUTES: i64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    NotPositive { name: &'static str, value: String },

    #[error("{name} must be a non-negative integer, got '{value}'")]
    Negative { name: &'static str, value: String },
}

pub struct Config {
    pub database_url: String,
    pub checkin: CheckInConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/atrium".to_string()),
            checkin: CheckInConfig::from_env()?,
        })
    }
}

/// Check-in tuning knobs. All env-overridable with named defaults;
/// validated once at startup so the hot path never re-checks them.
pub struct CheckInConfig {
    /// Seconds per token rotation step. Not a secret.
    pub step_size_seconds: u64,
    /// Adjacent steps accepted on either side of "now" during validation.
    /// Widening this trades security for usability.
    pub tolerance_steps: i64,
    /// Minutes before start_time that check-in opens.
    pub pre_buffer_minutes: i64,
    /// Minutes after end_time that check-in stays open.
    pub post_buffer_minutes: i64,
    /// Optional per-deployment token secret; unset keeps the default
    /// member-fingerprint keying.
    pub token_secret: Option<String>,
}

impl CheckInConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            step_size_seconds: positive_env("CHECKIN_STEP_SECONDS", DEFAULT_STEP_SECONDS)?,
            tolerance_steps: non_negative_env("CHECKIN_TOLERANCE_STEPS", DEFAULT_TOLERANCE_STEPS)?,
            pre_buffer_minutes: non_negative_env(
                "CHECKIN_PRE_BUFFER_MINUTES",
                DEFAULT_PRE_BUFFER_MINUTES,
            )?,
            post_buffer_minutes: non_negative_env(
                "CHECKIN_POST_BUFFER_MINUTES",
                DEFAULT_POST_BUFFER_MINUTES,
            )?,
            token_secret: env::var("CHECKIN_TOKEN_SECRET").ok(),
        })
    }

    pub fn token_service(&self) -> TokenService {
        match &self.token_secret {
            Some(secret) => {
                tracing::info!("Check-in tokens keyed with deployment secret");
                TokenService::with_keying(
                    Box::new(DeploymentSecret::new(secret.as_bytes().to_vec())),
                    self.step_size_seconds,
                    self.tolerance_steps,
                )
            }
            None => TokenService::new(self.step_size_seconds, self.tolerance_steps),
        }
    }

    pub fn window(&self) -> WindowConfig {
        WindowConfig {
            pre_buffer: Duration::minutes(self.pre_buffer_minutes),
            post_buffer: Duration::minutes(self.post_buffer_minutes),
        }
    }
}

fn positive_env(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::NotPositive { name, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

fn non_negative_env(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<i64>() {
            Ok(value) if value >= 0 => Ok(value),
            _ => Err(ConfigError::Negative { name, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so the env mutations cannot interleave across threads.
    #[test]
    fn env_values_are_validated_at_startup() {
        env::remove_var("CHECKIN_STEP_SECONDS");
        env::remove_var("CHECKIN_TOLERANCE_STEPS");
        let config = CheckInConfig::from_env().unwrap();
        assert_eq!(config.step_size_seconds, DEFAULT_STEP_SECONDS);
        assert_eq!(config.tolerance_steps, DEFAULT_TOLERANCE_STEPS);

        env::set_var("CHECKIN_STEP_SECONDS", "0");
        let result = CheckInConfig::from_env();
        env::remove_var("CHECKIN_STEP_SECONDS");
        assert!(matches!(result, Err(ConfigError::NotPositive { .. })));

        env::set_var("CHECKIN_TOLERANCE_STEPS", "-1");
        let result = CheckInConfig::from_env();
        env::remove_var("CHECKIN_TOLERANCE_STEPS");
        assert!(matches!(result, Err(ConfigError::Negative { .. })));
    }
}
