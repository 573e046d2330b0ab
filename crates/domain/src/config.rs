//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BATCH_CONCURRENCY, DEFAULT_REFRESH_SKEW_SECONDS, DEFAULT_STEP_MINUTES,
    PRIMARY_CALENDAR_ID,
};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub google: GoogleConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub availability: AvailabilityConfig,
}

/// Google provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub redirect_uri: String,
    /// Target calendar for event writes.
    pub calendar_id: String,
    pub scopes: Vec<String>,
    pub auth_endpoint: String,
    pub token_endpoint: String,
    pub api_base: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub http_timeout_seconds: u64,
    /// Total HTTP attempts (initial try + retries) for transient failures.
    pub max_attempts: usize,
    pub batch_concurrency: usize,
    pub refresh_skew_seconds: i64,
}

/// Availability / slot-search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    pub step_minutes: u32,
    /// IANA reference time zone for work-hour evaluation.
    pub time_zone: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            google: GoogleConfig::default(),
            database: DatabaseConfig::default(),
            sync: SyncConfig::default(),
            availability: AvailabilityConfig::default(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            calendar_id: PRIMARY_CALENDAR_ID.to_string(),
            scopes: vec![
                "https://www.googleapis.com/auth/calendar".to_string(),
                "https://www.googleapis.com/auth/calendar.events".to_string(),
            ],
            auth_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            api_base: "https://www.googleapis.com/calendar/v3".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "agendasync.db".to_string(), pool_size: 8 }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            http_timeout_seconds: 30,
            max_attempts: 3,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            refresh_skew_seconds: DEFAULT_REFRESH_SKEW_SECONDS,
        }
    }
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            work_start_hour: 8,
            work_end_hour: 18,
            step_minutes: DEFAULT_STEP_MINUTES,
            time_zone: "UTC".to_string(),
        }
    }
}
