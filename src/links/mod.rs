//! Link validation
//!
//! This module contains:
//! - Single-attempt HTTP probes behind the `Prober` trait
//! - The bounded-concurrency `LinkValidator` with retry and backoff

mod probe;
mod validator;

pub use probe::{build_probe_client, HttpProber, ProbeOutcome, Prober};
pub use validator::{LinkRecord, LinkValidator, RetryPolicy};

use crate::config::Config;
use crate::AuditError;
use std::sync::Arc;

/// Builds a validator with an HTTP prober from the configuration
pub fn build_validator(config: &Config) -> Result<LinkValidator, AuditError> {
    let client = build_probe_client(&config.user_agent, &config.links)?;

    Ok(LinkValidator::new(
        Arc::new(HttpProber::new(client)),
        RetryPolicy::from(&config.links),
        config.links.max_concurrent_probes,
    ))
}
