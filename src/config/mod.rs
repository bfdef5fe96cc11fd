use std::env;
use std::fmt;
use std::num::ParseIntError;
use std::time::Duration;

use crate::donors::search::DEFAULT_FUZZY_THRESHOLD;
use crate::requests::simulator::SimulatorConfig;

/// Top-level configuration for the engine, loaded from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub outreach: OutreachConfig,
    pub simulator: SimulatorConfig,
    pub search: SearchConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let webhook_url = env::var("OUTREACH_WEBHOOK_URL")
            .unwrap_or_else(|_| "http://localhost:5678/webhook/blood-request".to_string());
        let timeout_ms = parse_env_u64("OUTREACH_TIMEOUT_MS", 10_000)?;

        let fuzzy_threshold =
            parse_env_u64("FUZZY_MATCH_THRESHOLD", DEFAULT_FUZZY_THRESHOLD as u64)? as usize;

        let simulator = SimulatorConfig {
            matching_delay: stage_delay("SIMULATOR_MATCHING_DELAY_MS", 2_000)?,
            contacting_delay: stage_delay("SIMULATOR_CONTACTING_DELAY_MS", 4_000)?,
            awaiting_delay: stage_delay("SIMULATOR_AWAITING_DELAY_MS", 3_000)?,
            secured_delay: stage_delay("SIMULATOR_SECURED_DELAY_MS", 2_000)?,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            outreach: OutreachConfig {
                webhook_url,
                timeout: Duration::from_millis(timeout_ms),
            },
            simulator,
            search: SearchConfig { fuzzy_threshold },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn parse_env_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|source| ConfigError::InvalidNumber { key, source }),
        Err(_) => Ok(default),
    }
}

fn stage_delay(key: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    parse_env_u64(key, default_ms).map(Duration::from_millis)
}

/// Settings for the outbound automation webhook.
#[derive(Debug, Clone)]
pub struct OutreachConfig {
    pub webhook_url: String,
    pub timeout: Duration,
}

/// Settings for the donor match stage.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub fuzzy_threshold: usize,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber {
        key: &'static str,
        source: ParseIntError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, .. } => {
                write!(f, "{} must be a non-negative integer", key)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidNumber { source, .. } => Some(source),
        }
    }
}
