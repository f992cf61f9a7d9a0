//! Page access traits
//!
//! Checks only ever see these traits. A `PageAccessor` produces a fresh
//! `PageHandle` per navigation; handles are never shared between checks.

use crate::PageResult;
use async_trait::async_trait;

/// Loads pages
#[async_trait]
pub trait PageAccessor: Send + Sync {
    /// Navigates to `url` and returns a handle owning that page
    async fn navigate(&self, url: &str) -> PageResult<Box<dyn PageHandle>>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// A loaded page
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// The URL the page was loaded from
    fn url(&self) -> &str;

    /// All elements matching a CSS selector, in document order
    async fn find_all(&self, selector: &str) -> PageResult<Vec<Box<dyn ElementHandle>>>;

    /// Runs a script in the page (used for scroll-triggered loading)
    async fn execute_script(&self, script: &str) -> PageResult<()>;

    /// Releases whatever the handle holds (browser session, buffers)
    async fn close(&mut self) -> PageResult<()>;

    /// The first element matching `selector`, or `ElementNotFound`
    async fn find_first(&self, selector: &str) -> PageResult<Box<dyn ElementHandle>> {
        self.find_all(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| crate::PageError::ElementNotFound(selector.to_string()))
    }
}

/// An element on a loaded page
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Lowercase tag name, e.g. `h2`
    async fn tag_name(&self) -> PageResult<String>;

    /// Rendered text, trimmed
    async fn text(&self) -> PageResult<String>;

    /// Attribute value; `None` when the attribute is absent.
    ///
    /// `innerHTML` and `textContent` are answered from the element's content.
    async fn attribute(&self, name: &str) -> PageResult<Option<String>>;

    /// Descendants matching a CSS selector, in document order
    async fn find_all(&self, selector: &str) -> PageResult<Vec<Box<dyn ElementHandle>>>;

    /// Clicks the element
    async fn click(&self) -> PageResult<()>;
}
