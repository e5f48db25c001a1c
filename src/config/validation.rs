use crate::config::types::{Config, CrawlerConfig, FilterConfig, ServerConfig, StorageConfig};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_filter_config(&config.filter)?;
    validate_storage_config(&config.storage)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.page_deadline_secs < config.request_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "page_deadline_secs ({}) must not be shorter than request_timeout_secs ({})",
            config.page_deadline_secs, config.request_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    let seed = Url::parse(&config.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed_url '{}': {}", config.seed_url, e)))?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use http or https",
            config.seed_url
        )));
    }

    Ok(())
}

/// Validates link admission rules
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    validate_domain_string(&config.institution_domain)?;

    for host in &config.excluded_hosts {
        validate_domain_string(host)?;
    }

    for prefix in &config.private_prefixes {
        validate_ipv4_prefix(prefix)?;
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!("Invalid server bind address '{}': {}", config.bind, e))
    })?;
    Ok(())
}

/// Validates a host or domain name
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.edu')",
            domain
        )));
    }

    Ok(())
}

/// Validates a leading-octets IPv4 prefix such as "58.192" or "10"
fn validate_ipv4_prefix(prefix: &str) -> Result<(), ConfigError> {
    let octets: Vec<&str> = prefix.split('.').collect();

    if octets.is_empty() || octets.len() > 3 {
        return Err(ConfigError::InvalidPattern(format!(
            "Address prefix '{}' must have between one and three octets",
            prefix
        )));
    }

    for octet in octets {
        if octet.is_empty() || octet.parse::<u8>().is_err() {
            return Err(ConfigError::InvalidPattern(format!(
                "Address prefix '{}' contains an invalid octet '{}'",
                prefix, octet
            )));
        }
    }

    Ok(())
}
