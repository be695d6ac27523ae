use std::env;
use std::fmt;
use std::str::FromStr;

use crate::workflows::booking::{TransitionPolicy, DEFAULT_GEOFENCE_RADIUS_METERS};
use crate::workflows::matching::MatchingConfig;
use crate::workflows::reliability::ReliabilityConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub engines: EngineSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = EngineSettings::default();
        let engines = EngineSettings {
            geofence_radius_meters: parse_var(
                "CLEANFLOW_GEOFENCE_RADIUS_METERS",
                defaults.geofence_radius_meters,
            )?,
            reliability_window_days: parse_var(
                "CLEANFLOW_RELIABILITY_WINDOW_DAYS",
                defaults.reliability_window_days,
            )?,
            match_limit: parse_var("CLEANFLOW_MATCH_LIMIT", defaults.match_limit)?,
            transition_attempts: parse_var(
                "CLEANFLOW_TRANSITION_ATTEMPTS",
                defaults.transition_attempts,
            )?,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            engines,
        })
    }
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Environment overrides applied on top of the engine policy defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub geofence_radius_meters: f64,
    pub reliability_window_days: u32,
    pub match_limit: usize,
    pub transition_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            geofence_radius_meters: DEFAULT_GEOFENCE_RADIUS_METERS,
            reliability_window_days: 90,
            match_limit: 5,
            transition_attempts: 3,
        }
    }
}

impl EngineSettings {
    pub fn transition_policy(&self) -> Result<TransitionPolicy, ConfigError> {
        let policy = TransitionPolicy::default().with_geofence_radius(self.geofence_radius_meters);
        policy.validate()?;
        Ok(policy)
    }

    pub fn reliability_config(&self) -> Result<ReliabilityConfig, ConfigError> {
        let config = ReliabilityConfig::default().with_window_days(self.reliability_window_days);
        config.validate()?;
        Ok(config)
    }

    pub fn matching_config(&self) -> Result<MatchingConfig, ConfigError> {
        let config = MatchingConfig::default().with_default_limit(self.match_limit);
        config.validate()?;
        Ok(config)
    }
}

/// Rejected engine policy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("weights must sum to 1.0, got {total:.4}")]
    WeightsDoNotSumToOne { total: f64 },
    #[error("tier requirement for {0} is out of order")]
    TierOrder(&'static str),
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { var: &'static str },
    Policy(PolicyError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { var } => write!(f, "{var} must be a valid number"),
            ConfigError::Policy(err) => write!(f, "invalid engine policy: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidNumber { .. } => None,
            ConfigError::Policy(err) => Some(err),
        }
    }
}

impl From<PolicyError> for ConfigError {
    fn from(value: PolicyError) -> Self {
        Self::Policy(value)
    }
}
