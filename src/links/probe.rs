//! Single-attempt link probes
//!
//! A probe sends one request and reports what happened. Retrying, backoff
//! and classification live in the validator.

use crate::config::{LinksConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::error::Error as _;
use std::time::Duration;

/// What a single probe attempt observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered with this status code
    Status(u16),
    /// No answer within the attempt timeout
    Timeout,
    /// Connection, TLS, DNS or protocol failure
    Transport(String),
}

impl ProbeOutcome {
    /// Timeouts and 5xx responses are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status(code) => (500..=599).contains(code),
            Self::Timeout => true,
            Self::Transport(_) => false,
        }
    }
}

/// Sends one probe for a URL
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Builds the HTTP client used for link probes
///
/// Redirects are followed (up to 10 hops) so that a moved page is judged by
/// its final destination.
pub fn build_probe_client(
    user_agent: &UserAgentConfig,
    links: &LinksConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .connect_timeout(Duration::from_secs(links.attempt_timeout_secs))
        .redirect(Policy::limited(10))
        .danger_accept_invalid_certs(links.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Probes links with HTTP GET requests
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            // Only the status matters; the body is dropped unread
            Ok(response) => ProbeOutcome::Status(response.status().as_u16()),
            Err(e) if e.is_timeout() => ProbeOutcome::Timeout,
            Err(e) => ProbeOutcome::Transport(describe_error(&e)),
        }
    }
}

/// Error text including the underlying cause
fn describe_error(error: &reqwest::Error) -> String {
    match error.source() {
        Some(source) => format!("{}: {}", error, source),
        None => error.to_string(),
    }
}
