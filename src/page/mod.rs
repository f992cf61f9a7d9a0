//! Page access for checks
//!
//! This module contains:
//! - The `PageAccessor` / `PageHandle` / `ElementHandle` traits checks are written against
//! - A static HTML accessor (reqwest + scraper)
//! - A WebDriver accessor for interactive checks

mod html;
mod traits;
mod webdriver;

pub use html::{build_page_client, HtmlElement, HtmlPage, HtmlPageAccessor};
pub use traits::{ElementHandle, PageAccessor, PageHandle};
pub use webdriver::{WebDriverAccessor, WebDriverPage, WebDriverSettings};

use crate::config::{Config, PageBackend};
use crate::AuditError;
use std::sync::Arc;
use std::time::Duration;

/// Script used to trigger lazily loaded content
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Builds the page accessor selected in the configuration
pub fn build_accessor(config: &Config) -> Result<Arc<dyn PageAccessor>, AuditError> {
    let load_timeout = Duration::from_secs(config.page.load_timeout_secs);

    let accessor: Arc<dyn PageAccessor> = match config.page.backend {
        PageBackend::Static => {
            let client = build_page_client(&config.user_agent, load_timeout)?;
            Arc::new(HtmlPageAccessor::new(client))
        }
        PageBackend::WebDriver => Arc::new(WebDriverAccessor::new(WebDriverSettings {
            endpoint: config.page.webdriver_url.clone(),
            headless: config.page.headless,
            load_timeout,
            element_wait: Duration::from_millis(config.page.element_wait_ms),
        })?),
    };

    tracing::debug!("Using {} page accessor", accessor.name());
    Ok(accessor)
}
