//! Configuration loader
//!
//! Loads engine configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables (`.env` honoured)
//! 2. If the required Google credentials are missing, falls back to a file
//! 3. Probes a handful of paths for TOML config files
//!
//! ## Environment Variables
//! - `AGENDASYNC_GOOGLE_CLIENT_ID` / `AGENDASYNC_GOOGLE_CLIENT_SECRET` /
//!   `AGENDASYNC_GOOGLE_REDIRECT_URI`: required
//! - `AGENDASYNC_GOOGLE_CALENDAR_ID`: target calendar (default "primary")
//! - `AGENDASYNC_DB_PATH` / `AGENDASYNC_DB_POOL_SIZE`
//! - `AGENDASYNC_HTTP_TIMEOUT_SECONDS` / `AGENDASYNC_MAX_ATTEMPTS` /
//!   `AGENDASYNC_BATCH_CONCURRENCY`
//! - `AGENDASYNC_WORK_START_HOUR` / `AGENDASYNC_WORK_END_HOUR` /
//!   `AGENDASYNC_STEP_MINUTES` / `AGENDASYNC_TIME_ZONE`
//!
//! ## File Locations
//! The loader probes `./agendasync.toml`, `./config.toml`, and
//! `../agendasync.toml`, in that order.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use agendasync_domain::{AgendaSyncError, EngineConfig, Result};
use chrono_tz::Tz;
use tracing::{debug, info};

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `AgendaSyncError::Config` if configuration cannot be loaded from
/// either source or fails validation.
pub fn load() -> Result<EngineConfig> {
    // .env files are a local-development convenience.
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(config) => {
            info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            debug!(error = ?e, "environment configuration incomplete, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// The Google client credentials are required; everything else falls back
/// to defaults.
pub fn load_from_env() -> Result<EngineConfig> {
    let mut config = EngineConfig::default();

    config.google.client_id = required_var("AGENDASYNC_GOOGLE_CLIENT_ID")?;
    config.google.client_secret = required_var("AGENDASYNC_GOOGLE_CLIENT_SECRET")?;
    config.google.redirect_uri = required_var("AGENDASYNC_GOOGLE_REDIRECT_URI")?;

    if let Ok(value) = std::env::var("AGENDASYNC_GOOGLE_CALENDAR_ID") {
        config.google.calendar_id = value;
    }
    if let Ok(value) = std::env::var("AGENDASYNC_DB_PATH") {
        config.database.path = value;
    }
    if let Ok(value) = std::env::var("AGENDASYNC_TIME_ZONE") {
        config.availability.time_zone = value;
    }

    set_parsed(&mut config.database.pool_size, "AGENDASYNC_DB_POOL_SIZE")?;
    set_parsed(&mut config.sync.http_timeout_seconds, "AGENDASYNC_HTTP_TIMEOUT_SECONDS")?;
    set_parsed(&mut config.sync.max_attempts, "AGENDASYNC_MAX_ATTEMPTS")?;
    set_parsed(&mut config.sync.batch_concurrency, "AGENDASYNC_BATCH_CONCURRENCY")?;
    set_parsed(&mut config.availability.work_start_hour, "AGENDASYNC_WORK_START_HOUR")?;
    set_parsed(&mut config.availability.work_end_hour, "AGENDASYNC_WORK_END_HOUR")?;
    set_parsed(&mut config.availability.step_minutes, "AGENDASYNC_STEP_MINUTES")?;

    validate(&config)?;
    Ok(config)
}

/// Load configuration from a TOML file, probing default locations when no
/// path is given.
pub fn load_from_file(path: Option<&Path>) -> Result<EngineConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => probe_config_file().ok_or_else(|| {
            AgendaSyncError::Config(
                "no configuration file found (tried ./agendasync.toml, ./config.toml, \
                 ../agendasync.toml)"
                    .to_string(),
            )
        })?,
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        AgendaSyncError::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;

    let config: EngineConfig = toml::from_str(&contents).map_err(|e| {
        AgendaSyncError::Config(format!("invalid config file {}: {e}", path.display()))
    })?;

    validate(&config)?;
    info!(path = %path.display(), "configuration loaded from file");
    Ok(config)
}

/// Validate a loaded configuration.
pub fn validate(config: &EngineConfig) -> Result<()> {
    if config.google.client_id.trim().is_empty() {
        return Err(AgendaSyncError::Config("google.client_id must be set".into()));
    }
    if config.google.client_secret.trim().is_empty() {
        return Err(AgendaSyncError::Config("google.client_secret must be set".into()));
    }
    if config.google.redirect_uri.trim().is_empty() {
        return Err(AgendaSyncError::Config("google.redirect_uri must be set".into()));
    }
    if config.database.pool_size == 0 {
        return Err(AgendaSyncError::Config("database.pool_size must be at least 1".into()));
    }
    if config.sync.max_attempts == 0 {
        return Err(AgendaSyncError::Config("sync.max_attempts must be at least 1".into()));
    }
    if config.availability.work_start_hour >= config.availability.work_end_hour {
        return Err(AgendaSyncError::Config(
            "availability.work_start_hour must be before work_end_hour".into(),
        ));
    }
    if config.availability.work_end_hour > 24 {
        return Err(AgendaSyncError::Config(
            "availability.work_end_hour cannot exceed 24".into(),
        ));
    }
    if config.availability.step_minutes == 0 {
        return Err(AgendaSyncError::Config(
            "availability.step_minutes must be at least 1".into(),
        ));
    }
    parse_time_zone(&config.availability.time_zone)?;
    Ok(())
}

/// Parse the configured IANA time zone name.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    Tz::from_str(name)
        .map_err(|_| AgendaSyncError::Config(format!("unknown time zone: {name}")))
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| AgendaSyncError::Config(format!("missing environment variable: {name}")))
}

fn set_parsed<T: FromStr>(target: &mut T, name: &str) -> Result<()>
where
    T::Err: std::fmt::Display,
{
    if let Ok(value) = std::env::var(name) {
        *target = value
            .parse()
            .map_err(|e| AgendaSyncError::Config(format!("invalid value for {name}: {e}")))?;
    }
    Ok(())
}

fn probe_config_file() -> Option<PathBuf> {
    ["./agendasync.toml", "./config.toml", "../agendasync.toml"]
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}
