//! Page-Audit: rule-based web page auditing
//!
//! This crate runs a fixed set of independent checks (heading hierarchy, H1
//! presence, image alt text, link health, currency localization, embedded
//! payload) against one page and consolidates every verdict into a single
//! report with one detail sheet per check and a summary sheet.

pub mod checks;
pub mod config;
pub mod links;
pub mod page;
pub mod report;
pub mod runner;
pub mod url;

use thiserror::Error;

/// Main error type for Page-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Report error: {0}")]
    Report(#[from] report::ReportError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Check '{check}' failed: {message}")]
    Check { check: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown check name: {0}")]
    UnknownCheck(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Errors raised by page accessors and element handles
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("Operation not supported by this page accessor: {0}")]
    Unsupported(String),

    #[error("WebDriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    #[error("Malformed WebDriver response: {0}")]
    Protocol(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Page-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for page access operations
pub type PageResult<T> = std::result::Result<T, PageError>;

// Re-export commonly used types
pub use checks::{Check, CheckResult, CheckStatus, DetailRows};
pub use config::Config;
pub use links::{LinkRecord, LinkValidator};
pub use report::{Report, ReportAggregator, ReportSink};
pub use runner::CheckRunner;
pub use url::normalize_link;
