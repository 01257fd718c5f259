use crate::catalog::LawEntry;
use crate::config::types::{
    Config, FilterConfig, LeyChileConfig, OutputConfig, ScraperConfig, SiiConfig, UserAgentConfig,
};
use crate::output::SII_REPORT_KEYS;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sii_config(&config.sii)?;
    validate_leychile_config(&config.leychile)?;
    Ok(())
}

/// Validates pacing and timeouts
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    // Delays may be zero (throttling disabled), timeouts may not: every request
    // must be bounded.
    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs > config.request_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs ({}) cannot exceed request_timeout_secs ({})",
            config.connect_timeout_secs, config.request_timeout_secs
        )));
    }

    if config.request_delay_ms > 60_000 || config.law_delay_ms > 60_000 {
        return Err(ConfigError::Validation(
            "request delays must be <= 60000ms".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }

    if config.value.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user-agent value cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output root cannot be empty".to_string(),
        ));
    }

    if config.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    if config.logs_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "logs_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates SII categories, schemas and the year window
fn validate_sii_config(config: &SiiConfig) -> Result<(), ConfigError> {
    validate_http_url("sii base-origin", &config.base_origin)?;

    if config.years_back > 50 {
        return Err(ConfigError::Validation(format!(
            "years_back must be <= 50, got {}",
            config.years_back
        )));
    }

    let mut names = HashSet::new();
    for category in &config.categories {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "SII category name cannot be empty".to_string(),
            ));
        }

        if SII_REPORT_KEYS.contains(&category.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "SII category name '{}' is reserved in the report",
                category.name
            )));
        }

        if !names.insert(category.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate SII category '{}'",
                category.name
            )));
        }

        if category.file_prefix.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "SII category '{}' must have a file_prefix",
                category.name
            )));
        }

        if !category.index_template.contains("{year}") {
            return Err(ConfigError::Validation(format!(
                "index_template for '{}' must contain a {{year}} placeholder",
                category.name
            )));
        }

        // The template itself is a valid URL once a year is substituted
        validate_http_url(
            &format!("{} index_template", category.name),
            &category.index_template.replace("{year}", "2000"),
        )?;

        for (year, url) in &category.overrides {
            if year.parse::<i32>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "Override key '{}' for '{}' is not a year",
                    year, category.name
                )));
            }
            validate_http_url(&format!("{} override {}", category.name, year), url)?;
        }

        validate_filters(&category.name, &category.filters)?;
    }

    if config.schemas.enabled {
        validate_http_url("schemas index-url", &config.schemas.index_url)?;
        validate_filters("schemas", &config.schemas.filters)?;
    }

    Ok(())
}

/// Validates a link filter set
fn validate_filters(owner: &str, filters: &FilterConfig) -> Result<(), ConfigError> {
    if filters.extensions.is_empty() && filters.keywords.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Filters for '{}' must declare at least one extension or keyword",
            owner
        )));
    }

    if filters
        .extensions
        .iter()
        .chain(filters.keywords.iter())
        .any(|token| token.trim().is_empty())
    {
        return Err(ConfigError::Validation(format!(
            "Filters for '{}' cannot contain empty tokens",
            owner
        )));
    }

    let expected = filters.expected_extension.trim_start_matches('.');
    if expected.is_empty() || !expected.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(format!(
            "expected_extension for '{}' must be alphanumeric, got '{}'",
            owner, filters.expected_extension
        )));
    }

    Ok(())
}

/// Validates the LeyChile section and its law list
fn validate_leychile_config(config: &LeyChileConfig) -> Result<(), ConfigError> {
    validate_http_url("leychile base-origin", &config.base_origin)?;

    if config.destination.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "leychile destination cannot be empty".to_string(),
        ));
    }

    validate_laws(&config.laws)
}

/// Validates configured law entries
fn validate_laws(laws: &[LawEntry]) -> Result<(), ConfigError> {
    let mut codes = HashSet::new();
    for law in laws {
        if law.code.is_empty() || law.id.is_empty() || law.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Law entry '{}' must have code, id and name",
                law.code
            )));
        }

        if !codes.insert(law.code.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate law code '{}'",
                law.code
            )));
        }

        validate_http_url(&format!("law '{}' url", law.code), &law.url)?;
    }

    Ok(())
}

/// Checks that a string is an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}
