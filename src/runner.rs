//! Check execution with per-check isolation
//!
//! Checks run one after another. Each gets its own task and its own freshly
//! navigated page, so a check that errors, panics or hangs is recorded as a
//! failure and the next check still runs.

use crate::checks::{Check, CheckResult, DetailRows};
use crate::page::PageAccessor;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// Runs checks against one URL
pub struct CheckRunner {
    accessor: Arc<dyn PageAccessor>,
    check_timeout: Duration,
}

impl CheckRunner {
    /// Creates a runner; `check_timeout` bounds each check's `run` call
    pub fn new(accessor: Arc<dyn PageAccessor>, check_timeout: Duration) -> Self {
        Self {
            accessor,
            check_timeout,
        }
    }

    /// Runs every check and returns one result per check, in input order
    pub async fn run(&self, checks: &[Arc<dyn Check>], url: &str) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(checks.len());

        for check in checks {
            let name = check.name().to_string();
            tracing::info!("Running check: {}", name);

            let task = tokio::spawn(run_isolated(
                Arc::clone(&self.accessor),
                Arc::clone(check),
                url.to_string(),
                self.check_timeout,
            ));

            let result = match task.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    tracing::error!("Check {} panicked: {}", name, message);
                    CheckResult::fail(
                        &name,
                        format!("Check panicked: {}", message),
                        DetailRows::None,
                    )
                }
                Err(e) => {
                    tracing::error!("Check {} was cancelled: {}", name, e);
                    CheckResult::fail(&name, format!("Check cancelled: {}", e), DetailRows::None)
                }
            };

            tracing::info!(
                "Check {} finished: {} ({})",
                name,
                result.status(),
                result.comment()
            );
            results.push(result);
        }

        results
    }
}

/// Navigates, runs one check under the timeout, and closes the page
async fn run_isolated(
    accessor: Arc<dyn PageAccessor>,
    check: Arc<dyn Check>,
    url: String,
    check_timeout: Duration,
) -> CheckResult {
    let name = check.name().to_string();

    let mut page = match accessor.navigate(&url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Page unavailable for {}: {}", name, e);
            return CheckResult::page_unavailable(name, e.to_string());
        }
    };

    let outcome = tokio::time::timeout(check_timeout, check.run(page.as_ref())).await;

    if let Err(e) = page.close().await {
        tracing::warn!("Failed to close page after {}: {}", name, e);
    }

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => CheckResult::fail(name, e.to_string(), DetailRows::None),
        Err(_) => CheckResult::fail(
            name,
            format!("timeout after {:?}", check_timeout),
            DetailRows::None,
        ),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
