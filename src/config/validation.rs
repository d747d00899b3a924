use crate::config::types::{Config, CrawlerConfig, ExtractionConfig, OutputConfig, UserAgentConfig};
use crate::extract::FieldRules;
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent requests to one host
const MAX_CONNECTIONS_PER_HOST: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_http_url("origin", &config.origin)?;

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_connections_per_host < 1
        || config.max_connections_per_host > MAX_CONNECTIONS_PER_HOST
    {
        return Err(ConfigError::Validation(format!(
            "max_connections_per_host must be between 1 and {}, got {}",
            MAX_CONNECTIONS_PER_HOST, config.max_connections_per_host
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    for seed in &config.seeds {
        validate_http_url("seed", seed)?;
    }

    for sitemap in &config.sitemaps {
        validate_http_url("sitemap", sitemap)?;
    }

    for path in config.skip_paths.iter().chain(&config.listing_paths) {
        if !path.starts_with('/') {
            return Err(ConfigError::InvalidPattern(format!(
                "Path rule '{}' must start with '/'",
                path
            )));
        }
    }

    Ok(())
}

/// Parses a URL and requires an http(s) scheme with a host
fn validate_http_url(what: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", what)));
    }

    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            what, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            what, value
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if !config.contact_url.is_empty() {
        Url::parse(&config.contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if !config.contact_email.is_empty() {
        validate_email(&config.contact_email)?;
    }

    Ok(())
}

/// Validates extraction settings and compiles selector overrides once
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.min_fields < 1 || config.min_fields > crate::extract::FIELD_COUNT {
        return Err(ConfigError::Validation(format!(
            "min_fields must be between 1 and {}, got {}",
            crate::extract::FIELD_COUNT,
            config.min_fields
        )));
    }

    FieldRules::from_config(config)?;
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
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
