use crate::config::types::{
    Config, DiscoveryConfig, HttpConfig, OutputConfig, RosterEntry, SearchConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_discovery_config(&config.discovery)?;
    validate_search_config(&config.search)?;
    validate_output_config(&config.output)?;
    validate_rosters(&config.roster)?;
    Ok(())
}

/// Validates HTTP identity and timeouts
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    if config.request_timeout_secs == 0 || config.probe_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request and probe timeouts must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.batch_width < 1 || config.batch_width > 50 {
        return Err(ConfigError::Validation(format!(
            "batch_width must be between 1 and 50, got {}",
            config.batch_width
        )));
    }

    if config.max_pages_per_company < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_per_company must be >= 1, got {}",
            config.max_pages_per_company
        )));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.cache_ttl_hours < 1 {
        return Err(ConfigError::Validation(format!(
            "cache_ttl_hours must be >= 1, got {}",
            config.cache_ttl_hours
        )));
    }

    if config.deadline_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "deadline_secs must be >= 1, got {}",
            config.deadline_secs
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_rosters(rosters: &[RosterEntry]) -> Result<(), ConfigError> {
    for entry in rosters {
        if entry.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "roster path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
