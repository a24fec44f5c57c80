use crate::config::parse_time;
use crate::config::types::{Config, HttpConfig, ScheduleConfig, SiteConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_http_config(&config.http)?;
    validate_storage_config(&config.storage)?;
    validate_schedule_config(&config.schedule)?;
    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::Validation(format!("invalid base-url: {}", e)))?;

    if !config.comics_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "comics-path must start with '/', got '{}'",
            config.comics_path
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "timeout-seconds must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.image_dir.is_empty() {
        return Err(ConfigError::Validation(
            "image-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates schedule configuration
///
/// The refresh must come before the post time so a day's strip is already
/// indexed when the daily posts go out.
fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    let refresh = parse_time(&config.refresh_time)?;
    let post = parse_time(&config.post_time)?;

    if post <= refresh {
        return Err(ConfigError::Validation(format!(
            "post-time ({}) must be later than refresh-time ({})",
            config.post_time, config.refresh_time
        )));
    }

    Ok(())
}
