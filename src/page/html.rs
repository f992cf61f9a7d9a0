//! Static HTML page accessor
//!
//! Fetches a page with `reqwest` and answers element queries from a `scraper`
//! snapshot of the returned document. Nothing on the page executes, so
//! scripts are ignored and clicks are reported as unsupported.

use crate::config::UserAgentConfig;
use crate::page::traits::{ElementHandle, PageAccessor, PageHandle};
use crate::{PageError, PageResult};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Builds the HTTP client used to load pages
pub fn build_page_client(
    user_agent: &UserAgentConfig,
    load_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(load_timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page accessor backed by plain HTTP fetches
pub struct HtmlPageAccessor {
    client: Client,
}

impl HtmlPageAccessor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageAccessor for HtmlPageAccessor {
    async fn navigate(&self, url: &str) -> PageResult<Box<dyn PageHandle>> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| navigation_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| navigation_error(url, &e))?;

        Ok(Box::new(HtmlPage::from_html(final_url, body)))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

fn navigation_error(url: &str, error: &reqwest::Error) -> PageError {
    let message = if error.is_timeout() {
        "Page load timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };

    PageError::Navigation {
        url: url.to_string(),
        message,
    }
}

/// A fetched page; queries re-parse the stored document
#[derive(Debug, Clone)]
pub struct HtmlPage {
    url: String,
    body: Arc<str>,
}

impl HtmlPage {
    /// Wraps already-fetched HTML
    pub fn from_html(url: impl Into<String>, body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self {
            url: url.into(),
            body: Arc::from(body),
        }
    }
}

#[async_trait]
impl PageHandle for HtmlPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn find_all(&self, selector: &str) -> PageResult<Vec<Box<dyn ElementHandle>>> {
        let parsed = parse_selector(selector)?;
        let document = Html::parse_document(&self.body);
        Ok(snapshots(&self.body, &document, document.select(&parsed)))
    }

    async fn execute_script(&self, script: &str) -> PageResult<()> {
        tracing::trace!("Ignoring script on static page: {}", script);
        Ok(())
    }

    async fn close(&mut self) -> PageResult<()> {
        self.body = Arc::from("");
        Ok(())
    }
}

/// One element of a static page
///
/// Tag, text and attributes are copied out. Nested queries re-parse the
/// shared document and search below the element at `position`, so
/// context-dependent children such as table rows keep their structure.
#[derive(Debug, Clone)]
pub struct HtmlElement {
    tag: String,
    text: String,
    attributes: HashMap<String, String>,
    inner_html: String,
    document: Arc<str>,
    position: usize,
}

impl HtmlElement {
    fn snapshot(element: ElementRef<'_>, document: &Arc<str>, position: usize) -> Self {
        let value = element.value();
        Self {
            tag: value.name().to_ascii_lowercase(),
            text: collapse_whitespace(&element.text().collect::<String>()),
            attributes: value
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            inner_html: element.inner_html(),
            document: Arc::clone(document),
            position,
        }
    }
}

#[async_trait]
impl ElementHandle for HtmlElement {
    async fn tag_name(&self) -> PageResult<String> {
        Ok(self.tag.clone())
    }

    async fn text(&self) -> PageResult<String> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> PageResult<Option<String>> {
        Ok(match name {
            "innerHTML" => Some(self.inner_html.clone()),
            "textContent" => Some(self.text.clone()),
            _ => self.attributes.get(name).cloned(),
        })
    }

    async fn find_all(&self, selector: &str) -> PageResult<Vec<Box<dyn ElementHandle>>> {
        let parsed = parse_selector(selector)?;
        let document = Html::parse_document(&self.document);

        // Parsing the same markup again yields the same tree
        let element = elements(&document).nth(self.position).ok_or_else(|| {
            PageError::ElementNotFound(format!("<{}> is no longer in the document", self.tag))
        })?;

        Ok(snapshots(&self.document, &document, element.select(&parsed)))
    }

    async fn click(&self) -> PageResult<()> {
        Err(PageError::Unsupported(format!(
            "cannot click <{}> on a static HTML snapshot",
            self.tag
        )))
    }
}

fn parse_selector(selector: &str) -> PageResult<Selector> {
    Selector::parse(selector).map_err(|_| PageError::InvalidSelector(selector.to_string()))
}

/// Every element of the document in pre-order
fn elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.tree.root().descendants().filter_map(ElementRef::wrap)
}

fn snapshots<'a>(
    source: &Arc<str>,
    document: &'a Html,
    selected: impl Iterator<Item = ElementRef<'a>>,
) -> Vec<Box<dyn ElementHandle>> {
    let positions: HashMap<_, usize> = elements(document)
        .enumerate()
        .map(|(position, element)| ((*element).id(), position))
        .collect();

    selected
        .filter_map(|element| {
            // Tree node ids, not HTML `id` attributes
            let position = *positions.get(&(*element).id())?;
            Some(Box::new(HtmlElement::snapshot(element, source, position)) as Box<dyn ElementHandle>)
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
