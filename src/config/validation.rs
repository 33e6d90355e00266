use crate::config::types::Config;
use crate::download::Category;
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_start_url(&config.start_url)?;
    validate_excluded_paths(&config.excluded_paths)?;
    validate_download_extensions(&config.download_extensions)?;
    validate_language_pattern(config.language_pattern.as_deref())?;
    validate_network(config)?;

    if config.base_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "base_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the start URL: absolute, http(s), with a host
fn validate_start_url(start_url: &str) -> ConfigResult<()> {
    if start_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "start_url cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", start_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "start_url '{}' must use http or https",
            start_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' has no host",
            start_url
        )));
    }

    Ok(())
}

/// Validates exclusion substrings
fn validate_excluded_paths(paths: &[String]) -> ConfigResult<()> {
    // An empty substring would match every path
    if paths.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Validation(
            "excluded_paths cannot contain an empty string".to_string(),
        ));
    }
    Ok(())
}

/// Validates the extension table: well-formed and unambiguous
fn validate_download_extensions(
    table: &BTreeMap<Category, Vec<String>>,
) -> ConfigResult<()> {
    let mut owners: HashMap<&str, Category> = HashMap::new();

    for (category, extensions) in table {
        for ext in extensions {
            let bare = ext.trim_start_matches('.');
            if bare.is_empty() || !bare.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::Validation(format!(
                    "Invalid extension '{}' for category {}",
                    ext, category
                )));
            }

            if let Some(previous) = owners.insert(ext.as_str(), *category) {
                if previous != *category {
                    return Err(ConfigError::Validation(format!(
                        "Extension '{}' is mapped to both {} and {}",
                        ext, previous, category
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Validates that the locale pattern compiles
fn validate_language_pattern(pattern: Option<&str>) -> ConfigResult<()> {
    if let Some(pattern) = pattern {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("language_pattern '{}': {}", pattern, e))
        })?;
    }
    Ok(())
}

/// Validates timeouts, retries and the user agent
fn validate_network(config: &Config) -> ConfigResult<()> {
    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 5, got {}",
            config.max_retries
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}
