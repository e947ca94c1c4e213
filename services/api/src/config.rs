//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use report_dashboard_core::persistence::{
    StorageKeys, DEFAULT_INIT_KEY, DEFAULT_REPORTS_KEY, DEFAULT_USER_KEY,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub summary_model: String,
    pub summary_temperature: f32,
    pub draft_delay: Duration,
    pub allowed_origin: String,
    /// Base URL the dashboard front end uses to reach this service.
    pub api_url: String,
    pub storage_path: PathBuf,
    pub storage_keys: StorageKeys,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: Level::INFO,
            openai_api_key: None,
            summary_model: "gpt-3.5-turbo".to_string(),
            summary_temperature: 0.5,
            draft_delay: Duration::from_millis(500),
            allowed_origin: "http://localhost:5173".to_string(),
            api_url: "http://localhost:3000".to_string(),
            storage_path: PathBuf::from("./dashboard-storage.json"),
            storage_keys: StorageKeys::default(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Self::default();

        // --- Server Settings ---
        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => defaults.bind_address,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin =
            std::env::var("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin);
        let api_url = std::env::var("API_URL").unwrap_or(defaults.api_url);

        // --- Summarizer Settings ---
        // The key is optional: without it the summarize endpoint answers with a fixed error.
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .or_else(|_| std::env::var("VITE_OPENAI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let summary_model =
            std::env::var("SUMMARY_MODEL").unwrap_or(defaults.summary_model);
        let summary_temperature = match std::env::var("SUMMARY_TEMPERATURE") {
            Ok(raw) => raw.parse::<f32>().map_err(|e| {
                ConfigError::InvalidValue("SUMMARY_TEMPERATURE".to_string(), e.to_string())
            })?,
            Err(_) => defaults.summary_temperature,
        };

        // --- Draft Generator Settings ---
        let draft_delay = match std::env::var("DRAFT_DELAY_MS") {
            Ok(raw) => Duration::from_millis(raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("DRAFT_DELAY_MS".to_string(), e.to_string())
            })?),
            Err(_) => defaults.draft_delay,
        };

        // --- Local Storage Settings ---
        let storage_path = std::env::var("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);
        let reports_key = non_empty_var("LOCAL_STORAGE_KEY", DEFAULT_REPORTS_KEY);
        let init_key = non_empty_var("LOCAL_STORAGE_INIT_KEY", DEFAULT_INIT_KEY);
        let user_key = non_empty_var("LOCAL_USER_KEY", DEFAULT_USER_KEY);

        Ok(Self {
            bind_address,
            log_level,
            openai_api_key,
            summary_model,
            summary_temperature,
            draft_delay,
            allowed_origin,
            api_url,
            storage_path,
            storage_keys: StorageKeys::new(&reports_key, &init_key, &user_key),
        })
    }
}

fn non_empty_var(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
