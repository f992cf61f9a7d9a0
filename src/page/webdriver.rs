//! W3C WebDriver page accessor
//!
//! Talks the WebDriver JSON wire protocol to an endpoint such as chromedriver
//! or geckodriver. Every `navigate` call opens its own browser session, so
//! checks that mutate the page (currency selection) cannot leak state into
//! other checks.
//!
//! # Commands used
//!
//! | Operation | Request |
//! |-----------|---------|
//! | New session | `POST /session` |
//! | Timeouts | `POST /session/{id}/timeouts` |
//! | Navigate | `POST /session/{id}/url` |
//! | Find elements | `POST /session/{id}/elements` |
//! | Find in element | `POST /session/{id}/element/{eid}/elements` |
//! | Text / name | `GET /session/{id}/element/{eid}/text`, `.../name` |
//! | Attribute | `GET .../attribute/{name}` or `.../property/{name}` |
//! | Click | `POST /session/{id}/element/{eid}/click` |
//! | Script | `POST /session/{id}/execute/sync` |
//! | Close | `DELETE /session/{id}` |

use crate::page::traits::{ElementHandle, PageAccessor, PageHandle};
use crate::{PageError, PageResult};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Key the protocol uses for element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4f8e4f6b3c7c";

/// Key used by pre-W3C drivers
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Attributes that are only reachable as DOM properties
const PROPERTY_NAMES: &[&str] = &["innerHTML", "textContent"];

/// Session settings for the WebDriver accessor
#[derive(Debug, Clone)]
pub struct WebDriverSettings {
    /// Endpoint, e.g. `http://localhost:9515`
    pub endpoint: String,
    pub headless: bool,
    pub load_timeout: Duration,
    pub element_wait: Duration,
}

/// Page accessor that drives a real browser
pub struct WebDriverAccessor {
    client: Client,
    settings: WebDriverSettings,
}

impl WebDriverAccessor {
    pub fn new(settings: WebDriverSettings) -> Result<Self, reqwest::Error> {
        // Driver calls block for up to the page load timeout
        let client = Client::builder()
            .timeout(settings.load_timeout + Duration::from_secs(30))
            .build()?;

        Ok(Self { client, settings })
    }

    fn capabilities(&self) -> Value {
        let mut args = vec!["--window-size=1920,1080".to_string()];
        if self.settings.headless {
            args.push("--headless=new".to_string());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }

    async fn open_session(&self) -> PageResult<Arc<Session>> {
        let endpoint = self.settings.endpoint.trim_end_matches('/').to_string();
        let value = send_command(
            &self.client,
            Method::POST,
            &format!("{}/session", endpoint),
            Some(self.capabilities()),
        )
        .await?;

        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| PageError::Protocol("new session response has no sessionId".into()))?
            .to_string();

        tracing::debug!("Opened WebDriver session {}", id);

        Ok(Arc::new(Session {
            client: self.client.clone(),
            endpoint,
            id,
        }))
    }
}

#[async_trait]
impl PageAccessor for WebDriverAccessor {
    async fn navigate(&self, url: &str) -> PageResult<Box<dyn PageHandle>> {
        let session = self.open_session().await?;
        let mut page = WebDriverPage {
            session,
            url: url.to_string(),
            closed: false,
        };

        let setup = async {
            page.session
                .command(
                    Method::POST,
                    "/timeouts",
                    Some(json!({
                        "implicit": self.settings.element_wait.as_millis() as u64,
                        "pageLoad": self.settings.load_timeout.as_millis() as u64,
                        "script": self.settings.load_timeout.as_millis() as u64,
                    })),
                )
                .await?;
            page.session
                .command(Method::POST, "/url", Some(json!({ "url": url })))
                .await
        }
        .await;

        if let Err(e) = setup {
            if let Err(close_err) = page.close().await {
                tracing::warn!("Failed to close WebDriver session: {}", close_err);
            }
            return Err(PageError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            });
        }

        Ok(Box::new(page))
    }

    fn name(&self) -> &'static str {
        "webdriver"
    }
}

/// An open browser session
#[derive(Debug)]
struct Session {
    client: Client,
    endpoint: String,
    id: String,
}

impl Session {
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> PageResult<Value> {
        let url = format!("{}/session/{}{}", self.endpoint, self.id, path);
        send_command(&self.client, method, &url, body).await
    }
}

/// Finds elements below `scope` ("" for the whole document)
async fn find_elements(
    session: &Arc<Session>,
    scope: &str,
    selector: &str,
) -> PageResult<Vec<Box<dyn ElementHandle>>> {
    let value = session
        .command(
            Method::POST,
            &format!("{}/elements", scope),
            Some(json!({ "using": "css selector", "value": selector })),
        )
        .await?;

    let refs = value
        .as_array()
        .ok_or_else(|| PageError::Protocol("find elements did not return an array".into()))?;

    refs.iter()
        .map(|r| {
            element_id(r).map(|id| {
                Box::new(WebDriverElement {
                    session: Arc::clone(session),
                    id,
                }) as Box<dyn ElementHandle>
            })
        })
        .collect()
}

fn element_id(reference: &Value) -> PageResult<String> {
    reference
        .get(ELEMENT_KEY)
        .or_else(|| reference.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PageError::Protocol(format!("not an element reference: {}", reference)))
}

/// Sends one command and unwraps the `value` member of the response
async fn send_command(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> PageResult<Value> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .map_err(|e| PageError::Protocol(format!("invalid JSON from {}: {}", url, e)))?;

    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        return Err(match error {
            "no such element" => PageError::ElementNotFound(message),
            "invalid selector" => PageError::InvalidSelector(message),
            _ => PageError::WebDriver {
                error: error.to_string(),
                message,
            },
        });
    }

    if !status.is_success() {
        return Err(PageError::WebDriver {
            error: format!("HTTP {}", status.as_u16()),
            message: value.to_string(),
        });
    }

    Ok(value)
}

/// A page loaded in its own browser session
pub struct WebDriverPage {
    session: Arc<Session>,
    url: String,
    closed: bool,
}

#[async_trait]
impl PageHandle for WebDriverPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn find_all(&self, selector: &str) -> PageResult<Vec<Box<dyn ElementHandle>>> {
        find_elements(&self.session, "", selector).await
    }

    async fn execute_script(&self, script: &str) -> PageResult<()> {
        self.session
            .command(
                Method::POST,
                "/execute/sync",
                Some(json!({ "script": script, "args": [] })),
            )
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> PageResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let url = format!("{}/session/{}", self.session.endpoint, self.session.id);
        send_command(&self.session.client, Method::DELETE, &url, None).await?;
        tracing::debug!("Closed WebDriver session {}", self.session.id);
        Ok(())
    }
}

/// Reference to an element inside a session
struct WebDriverElement {
    session: Arc<Session>,
    id: String,
}

impl WebDriverElement {
    async fn get_string(&self, path: &str) -> PageResult<Option<String>> {
        let value = self
            .session
            .command(Method::GET, &format!("/element/{}{}", self.id, path), None)
            .await?;

        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }
}

#[async_trait]
impl ElementHandle for WebDriverElement {
    async fn tag_name(&self) -> PageResult<String> {
        Ok(self
            .get_string("/name")
            .await?
            .unwrap_or_default()
            .to_ascii_lowercase())
    }

    async fn text(&self) -> PageResult<String> {
        Ok(self
            .get_string("/text")
            .await?
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    async fn attribute(&self, name: &str) -> PageResult<Option<String>> {
        let kind = if PROPERTY_NAMES.contains(&name) {
            "property"
        } else {
            "attribute"
        };
        self.get_string(&format!("/{}/{}", kind, name)).await
    }

    async fn find_all(&self, selector: &str) -> PageResult<Vec<Box<dyn ElementHandle>>> {
        find_elements(&self.session, &format!("/element/{}", self.id), selector).await
    }

    async fn click(&self) -> PageResult<()> {
        self.session
            .command(Method::POST, &format!("/element/{}/click", self.id), Some(json!({})))
            .await?;
        Ok(())
    }
}
