use serde::Deserialize;

/// Main configuration structure for Page-Audit
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub audit: AuditConfig,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub payload: PayloadConfig,
    pub output: OutputConfig,
}

/// What to audit and how long each check may take
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// The page every check runs against
    #[serde(rename = "page-url")]
    pub page_url: String,

    /// Wall-clock limit for a single check (seconds)
    ///
    /// The link check is bounded by this too. With default link settings a
    /// dead link can take about 40s, eight at a time, so the default leaves
    /// room for roughly 120 unreachable links.
    #[serde(rename = "check-timeout-secs", default = "default_check_timeout")]
    pub check_timeout_secs: u64,

    /// Checks to run, in order. Empty means every known check.
    #[serde(default)]
    pub checks: Vec<String>,
}

/// Which page backend is used to load pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageBackend {
    /// Fetch HTML over HTTP and query a static snapshot
    #[default]
    Static,
    /// Drive a browser through a W3C WebDriver endpoint
    WebDriver,
}

/// Page loading configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub backend: PageBackend,

    /// WebDriver endpoint (only used by the webdriver backend)
    #[serde(rename = "webdriver-url", default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser headless
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Page load timeout (seconds)
    #[serde(rename = "load-timeout-secs", default = "default_load_timeout")]
    pub load_timeout_secs: u64,

    /// Implicit element wait for the webdriver backend (milliseconds)
    #[serde(rename = "element-wait-ms", default = "default_element_wait")]
    pub element_wait_ms: u64,

    /// Number of scroll-to-bottom passes used to trigger lazy content
    #[serde(rename = "scroll-passes", default = "default_scroll_passes")]
    pub scroll_passes: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            backend: PageBackend::default(),
            webdriver_url: default_webdriver_url(),
            headless: true,
            load_timeout_secs: default_load_timeout(),
            element_wait_ms: default_element_wait(),
            scroll_passes: default_scroll_passes(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the auditor
    #[serde(rename = "agent-name")]
    pub agent_name: String,

    /// Version of the auditor
    #[serde(rename = "agent-version")]
    pub agent_version: String,

    /// URL with information about the auditor
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            agent_name: "PageAudit".to_string(),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/page-audit".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: Name/Version (+ContactURL)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.agent_name, self.agent_version, self.contact_url
        )
    }
}

/// Link probing policy
#[derive(Debug, Clone, Deserialize)]
pub struct LinksConfig {
    /// Maximum probes in flight at once
    #[serde(rename = "max-concurrent-probes", default = "default_concurrency")]
    pub max_concurrent_probes: usize,

    /// Total attempts per link, including the first
    #[serde(rename = "max-attempts", default = "default_attempts")]
    pub max_attempts: u32,

    /// Timeout for a single probe attempt (seconds)
    #[serde(rename = "attempt-timeout-secs", default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,

    /// Delay before the first retry; doubles on every further retry (milliseconds)
    #[serde(rename = "initial-backoff-ms", default = "default_backoff")]
    pub initial_backoff_ms: u64,

    /// Skip TLS certificate verification when probing
    #[serde(rename = "accept-invalid-certs", default)]
    pub accept_invalid_certs: bool,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: default_concurrency(),
            max_attempts: default_attempts(),
            attempt_timeout_secs: default_attempt_timeout(),
            initial_backoff_ms: default_backoff(),
            accept_invalid_certs: false,
        }
    }
}

/// Selectors for the currency switcher
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// The control that opens the currency list
    #[serde(rename = "control-selector", default = "default_control_selector")]
    pub control_selector: String,

    /// Options inside the opened control
    #[serde(rename = "option-selector", default = "default_option_selector")]
    pub option_selector: String,

    /// Element inside an option whose first word is the currency symbol
    #[serde(rename = "symbol-selector", default = "default_symbol_selector")]
    pub symbol_selector: String,

    /// Attribute on an option naming the currency
    #[serde(rename = "name-attribute", default = "default_name_attribute")]
    pub name_attribute: String,

    /// Price tiles that must reflect the selected currency
    #[serde(rename = "price-selector", default = "default_price_selector")]
    pub price_selector: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            control_selector: default_control_selector(),
            option_selector: default_option_selector(),
            symbol_selector: default_symbol_selector(),
            name_attribute: default_name_attribute(),
            price_selector: default_price_selector(),
        }
    }
}

/// Embedded script payload expectations
#[derive(Debug, Clone, Deserialize)]
pub struct PayloadConfig {
    /// JavaScript variable the payload object is assigned to
    #[serde(default = "default_payload_variable")]
    pub variable: String,

    /// Keys that must be present with a non-empty value
    #[serde(rename = "required-keys", default = "default_required_keys")]
    pub required_keys: Vec<String>,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            variable: default_payload_variable(),
            required_keys: default_required_keys(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite report database
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown report
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

fn default_check_timeout() -> u64 {
    600
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_true() -> bool {
    true
}

fn default_load_timeout() -> u64 {
    30
}

fn default_element_wait() -> u64 {
    10_000
}

fn default_scroll_passes() -> u32 {
    3
}

fn default_concurrency() -> usize {
    8
}

fn default_attempts() -> u32 {
    5
}

fn default_attempt_timeout() -> u64 {
    5
}

fn default_backoff() -> u64 {
    1000
}

fn default_control_selector() -> String {
    "#js-currency-sort-footer".to_string()
}

fn default_option_selector() -> String {
    ".select-ul > li".to_string()
}

fn default_symbol_selector() -> String {
    ".option > p".to_string()
}

fn default_name_attribute() -> String {
    "data-currency-country".to_string()
}

fn default_price_selector() -> String {
    ".js-price-value".to_string()
}

fn default_payload_variable() -> String {
    "ScriptData".to_string()
}

fn default_required_keys() -> Vec<String> {
    ["SiteURL", "CampaignID", "SiteName", "Browser", "CountryCode", "IP"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}
