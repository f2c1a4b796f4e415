//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{GatherlyError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_storage_config(&settings.storage)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(GatherlyError::Config(
            "Bot token is required".to_string()
        ));
    }

    if config.admin_ids.is_empty() {
        return Err(GatherlyError::Config(
            "At least one admin ID must be configured".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(GatherlyError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(GatherlyError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(GatherlyError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(GatherlyError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

/// Validate object storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.bucket.is_empty() {
        return Err(GatherlyError::Config(
            "Storage bucket is required".to_string()
        ));
    }

    url::Url::parse(&config.base_url)
        .map_err(|e| GatherlyError::Config(format!("Invalid storage base URL: {}", e)))?;

    url::Url::parse(&config.placeholder_url)
        .map_err(|e| GatherlyError::Config(format!("Invalid placeholder URL: {}", e)))?;

    if config.timeout_seconds == 0 {
        return Err(GatherlyError::Config(
            "Storage timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    let level = config.level.to_lowercase();

    // EnvFilter directives like "info,sqlx=warn" are accepted as-is
    if !level.contains('=') && !level.contains(',') && !valid_levels.contains(&level.as_str()) {
        return Err(GatherlyError::Config(
            format!("Invalid log level: {}", config.level)
        ));
    }

    if config.file_path.is_empty() {
        return Err(GatherlyError::Config(
            "Log file path is required".to_string()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "12345:test_token".to_string();
        settings.bot.admin_ids = vec![42];
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut settings = valid_settings();
        settings.bot.token = String::new();
        assert_matches!(validate_settings(&settings), Err(GatherlyError::Config(_)));
    }

    #[test]
    fn test_bad_storage_url_rejected() {
        let mut settings = valid_settings();
        settings.storage.base_url = "not a url".to_string();
        assert_matches!(validate_settings(&settings), Err(GatherlyError::Config(_)));
    }

    #[test]
    fn test_connection_bounds_checked() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        settings.database.max_connections = 5;
        assert_matches!(validate_settings(&settings), Err(GatherlyError::Config(_)));
    }

    #[test]
    fn test_env_filter_directives_allowed() {
        let mut settings = valid_settings();
        settings.logging.level = "info,sqlx=warn".to_string();
        assert!(validate_settings(&settings).is_ok());
    }
}
