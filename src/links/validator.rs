//! Bounded-concurrency link validation
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 404 | Immediate → Fail "404 Not Found" |
//! | Other 2xx/3xx/4xx | Immediate → Pass |
//! | HTTP 5xx | Retry with backoff; Fail once attempts run out |
//! | Timeout | Retry with backoff; Fail "Timeout" once attempts run out |
//! | Transport error | Immediate → Fail with the error text |
//!
//! Backoff starts at the configured delay and doubles on every retry.

use crate::checks::CheckStatus;
use crate::config::LinksConfig;
use crate::links::probe::{ProbeOutcome, Prober};
use crate::url::normalize_links;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Reachability verdict for one unique link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Normalized absolute URL
    pub url: String,
    /// Status of the last answered attempt
    pub http_status: Option<u16>,
    pub status: CheckStatus,
    /// Empty when the link passed
    pub error_message: String,
    /// Probes sent for this link
    pub attempts: u32,
}

impl LinkRecord {
    /// Classifies the final outcome of a link's probes
    pub fn classify(url: String, outcome: ProbeOutcome, attempts: u32) -> Self {
        let (http_status, status, error_message) = match outcome {
            ProbeOutcome::Status(404) => (Some(404), CheckStatus::Fail, "404 Not Found".to_string()),
            ProbeOutcome::Status(code) if (500..=599).contains(&code) => (
                Some(code),
                CheckStatus::Fail,
                format!("HTTP {} after {} attempts", code, attempts),
            ),
            ProbeOutcome::Status(code) => (Some(code), CheckStatus::Pass, String::new()),
            ProbeOutcome::Timeout => (None, CheckStatus::Fail, "Timeout".to_string()),
            ProbeOutcome::Transport(message) => {
                (None, CheckStatus::Fail, format!("Error: {}", message))
            }
        };

        Self {
            url,
            http_status,
            status,
            error_message,
            attempts,
        }
    }
}

/// Attempt limits and backoff for one link
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    /// Delay before the first retry
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay after the given (1-based) failed attempt
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }

    /// Longest time one link can take: every attempt timing out plus the
    /// backoff between attempts
    pub fn worst_case(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        let backoff: Duration = (1..attempts).map(|a| self.backoff_after(a)).sum();
        self.attempt_timeout.saturating_mul(attempts) + backoff
    }
}

impl From<&LinksConfig> for RetryPolicy {
    fn from(config: &LinksConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        }
    }
}

/// Resolves discovered links to pass/fail verdicts
pub struct LinkValidator {
    prober: Arc<dyn Prober>,
    policy: RetryPolicy,
    semaphore: Arc<Semaphore>,
}

impl LinkValidator {
    pub fn new(prober: Arc<dyn Prober>, policy: RetryPolicy, max_concurrent: usize) -> Self {
        Self {
            prober,
            policy,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Normalizes, de-duplicates and probes `links`
    ///
    /// Relative links are resolved against `base`. The returned records are
    /// sorted by normalized URL regardless of completion order.
    pub async fn validate<I, S>(&self, links: I, base: &Url) -> Vec<LinkRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique = normalize_links(links, base);
        tracing::info!("Validating {} unique links", unique.len());

        let mut tasks = Vec::with_capacity(unique.len());
        for url in unique {
            let prober = Arc::clone(&self.prober);
            let semaphore = Arc::clone(&self.semaphore);
            let policy = self.policy;
            let task_url = url.clone();

            let handle = tokio::spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                probe_with_retry(prober.as_ref(), task_url, policy).await
            });
            tasks.push((url, handle));
        }

        let mut records = Vec::with_capacity(tasks.len());
        for (url, handle) in tasks {
            match handle.await {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::error!("Probe task for {} failed: {}", url, e);
                    records.push(LinkRecord {
                        url,
                        http_status: None,
                        status: CheckStatus::Fail,
                        error_message: format!("Error: probe task failed: {}", e),
                        attempts: 0,
                    });
                }
            }
        }

        records.sort_by(|a, b| a.url.cmp(&b.url));
        records
    }
}

/// Probes one link until it gets a terminal outcome or runs out of attempts
async fn probe_with_retry(prober: &dyn Prober, url: String, policy: RetryPolicy) -> LinkRecord {
    let mut attempts = 0;

    loop {
        attempts += 1;

        let outcome = tokio::time::timeout(policy.attempt_timeout, prober.probe(&url))
            .await
            .unwrap_or(ProbeOutcome::Timeout);

        if outcome.is_retryable() && attempts < policy.max_attempts {
            let delay = policy.backoff_after(attempts);
            tracing::debug!(
                "Attempt {} for {} gave {:?}; retrying in {:?}",
                attempts,
                url,
                outcome,
                delay
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        let record = LinkRecord::classify(url, outcome, attempts);
        tracing::debug!(
            "Checked URL: {}, Status: {}, HTTP Code: {:?}, Attempts: {}",
            record.url,
            record.status,
            record.http_status,
            record.attempts
        );
        return record;
    }
}
