use crate::checks::CheckKind;
use crate::config::types::{
    AuditConfig, Config, CurrencyConfig, LinksConfig, OutputConfig, PageConfig, PayloadConfig,
    UserAgentConfig,
};
use crate::links::RetryPolicy;
use crate::ConfigError;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_audit_config(&config.audit)?;
    validate_page_config(&config.page)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_links_config(&config.links)?;
    validate_currency_config(&config.currency)?;
    validate_payload_config(&config.payload)?;
    validate_output_config(&config.output)?;
    warn_on_short_check_timeout(config);
    Ok(())
}

/// Warns when the check timeout cannot cover even one link's retries
fn warn_on_short_check_timeout(config: &Config) {
    let per_link = RetryPolicy::from(&config.links).worst_case();
    let check_timeout = Duration::from_secs(config.audit.check_timeout_secs);

    if check_timeout < per_link {
        tracing::warn!(
            "check-timeout-secs ({}s) is shorter than the worst case for a single link ({:?}); \
             the link check may time out without link rows",
            config.audit.check_timeout_secs,
            per_link
        );
    }
}

/// Validates the audited page and the check selection
fn validate_audit_config(config: &AuditConfig) -> Result<(), ConfigError> {
    validate_http_url("page-url", &config.page_url)?;

    if config.check_timeout_secs == 0 || config.check_timeout_secs > 3600 {
        return Err(ConfigError::Validation(format!(
            "check-timeout-secs must be between 1 and 3600, got {}",
            config.check_timeout_secs
        )));
    }

    let mut seen = HashSet::new();
    for name in &config.checks {
        if CheckKind::from_slug(name).is_none() {
            return Err(ConfigError::UnknownCheck(name.clone()));
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "check '{}' is listed more than once",
                name
            )));
        }
    }

    Ok(())
}

fn validate_page_config(config: &PageConfig) -> Result<(), ConfigError> {
    validate_http_url("webdriver-url", &config.webdriver_url)?;

    if config.load_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "load-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.scroll_passes > 20 {
        return Err(ConfigError::Validation(format!(
            "scroll-passes must be <= 20, got {}",
            config.scroll_passes
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.agent_name.is_empty() {
        return Err(ConfigError::Validation(
            "agent-name cannot be empty".to_string(),
        ));
    }

    if !config
        .agent_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "agent-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.agent_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

/// Validates the probing policy
fn validate_links_config(config: &LinksConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_probes < 1 || config.max_concurrent_probes > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-probes must be between 1 and 64, got {}",
            config.max_concurrent_probes
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.attempt_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "attempt-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_currency_config(config: &CurrencyConfig) -> Result<(), ConfigError> {
    for (key, value) in [
        ("control-selector", &config.control_selector),
        ("option-selector", &config.option_selector),
        ("symbol-selector", &config.symbol_selector),
        ("name-attribute", &config.name_attribute),
        ("price-selector", &config.price_selector),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "currency {} cannot be empty",
                key
            )));
        }
    }
    Ok(())
}

fn validate_payload_config(config: &PayloadConfig) -> Result<(), ConfigError> {
    let variable = config.variable.trim();
    if variable.is_empty()
        || !variable
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
    {
        return Err(ConfigError::Validation(format!(
            "payload variable must be a JavaScript identifier, got '{}'",
            config.variable
        )));
    }

    if config.required_keys.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "payload required-keys cannot contain empty keys".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Requires an absolute http(s) URL
fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS",
            key, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit(checks: &[&str]) -> AuditConfig {
        AuditConfig {
            page_url: "https://example.com/".to_string(),
            check_timeout_secs: 60,
            checks: checks.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("page-url", "https://example.com/").is_ok());
        assert!(validate_http_url("page-url", "http://127.0.0.1:8080/x").is_ok());

        assert!(validate_http_url("page-url", "").is_err());
        assert!(validate_http_url("page-url", "example.com").is_err());
        assert!(validate_http_url("page-url", "ftp://example.com/").is_err());
    }

    #[test]
    fn test_validate_check_names() {
        assert!(validate_audit_config(&audit(&[])).is_ok());
        assert!(validate_audit_config(&audit(&["alt-text", "link-health"])).is_ok());

        assert!(matches!(
            validate_audit_config(&audit(&["spelling"])),
            Err(ConfigError::UnknownCheck(_))
        ));
        assert!(matches!(
            validate_audit_config(&audit(&["alt-text", "alt-text"])),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_links_bounds() {
        let mut links = LinksConfig::default();
        assert!(validate_links_config(&links).is_ok());

        links.max_attempts = 0;
        assert!(validate_links_config(&links).is_err());

        links.max_attempts = 5;
        links.max_concurrent_probes = 100;
        assert!(validate_links_config(&links).is_err());
    }

    #[test]
    fn test_validate_payload_variable() {
        let mut payload = PayloadConfig::default();
        assert!(validate_payload_config(&payload).is_ok());

        payload.variable = "window.ScriptData".to_string();
        assert!(validate_payload_config(&payload).is_ok());

        payload.variable = "not valid".to_string();
        assert!(validate_payload_config(&payload).is_err());
    }
}
