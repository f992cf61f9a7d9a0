//! Page checks
//!
//! This module contains:
//! - The `Check` trait every rule implements
//! - The shared result model (`CheckResult`, `DetailRows` and row types)
//! - One module per rule: heading sequence, H1 presence, image alt text,
//!   link health, currency localization and embedded payload

mod alt_text;
mod currency;
mod h1;
mod heading;
mod links;
mod payload;
mod result;

pub use alt_text::AltTextCheck;
pub use currency::CurrencyLocalizationCheck;
pub use h1::H1PresenceCheck;
pub use heading::HeadingSequenceCheck;
pub use links::LinkHealthCheck;
pub use payload::PayloadPresenceCheck;
pub use result::{
    CheckResult, CheckStatus, CurrencyRecord, DetailRows, H1Record, HeadingRecord, ImageRecord,
    PayloadField,
};

use crate::config::Config;
use crate::ConfigError;
use crate::page::PageHandle;
use crate::AuditError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A rule evaluated against one loaded page
///
/// Checks report what they observed through the returned `CheckResult`.
/// An `Err` means the check could not finish; the runner turns it into a
/// failing result.
#[async_trait]
pub trait Check: Send + Sync {
    /// Display name, also used as the report sheet name
    fn name(&self) -> &str;

    async fn run(&self, page: &dyn PageHandle) -> crate::Result<CheckResult>;
}

/// The checks that can be enabled in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    HeadingSequence,
    H1Presence,
    AltText,
    LinkHealth,
    CurrencyLocalization,
    PayloadPresence,
}

impl CheckKind {
    /// Every check, in default execution order
    pub fn all() -> &'static [CheckKind] {
        &[
            Self::HeadingSequence,
            Self::H1Presence,
            Self::AltText,
            Self::LinkHealth,
            Self::CurrencyLocalization,
            Self::PayloadPresence,
        ]
    }

    /// Name used in configuration files and on the command line
    pub fn slug(&self) -> &'static str {
        match self {
            Self::HeadingSequence => "heading-sequence",
            Self::H1Presence => "h1-presence",
            Self::AltText => "alt-text",
            Self::LinkHealth => "link-health",
            Self::CurrencyLocalization => "currency-localization",
            Self::PayloadPresence => "payload-presence",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.slug().eq_ignore_ascii_case(slug.trim()))
    }

    /// Name shown in reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::HeadingSequence => "Heading Sequence",
            Self::H1Presence => "H1 Tags",
            Self::AltText => "Image Alt Text",
            Self::LinkHealth => "URL Status",
            Self::CurrencyLocalization => "Currency Filter",
            Self::PayloadPresence => "Script Data",
        }
    }

    /// Resolves configured names; an empty list selects every check
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Result<Vec<CheckKind>, ConfigError> {
        if names.is_empty() {
            return Ok(Self::all().to_vec());
        }

        names
            .iter()
            .map(|name| {
                Self::from_slug(name.as_ref())
                    .ok_or_else(|| ConfigError::UnknownCheck(name.as_ref().to_string()))
            })
            .collect()
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Instantiates the given checks from the configuration
///
/// A check that cannot be constructed is replaced by an `UnavailableCheck`
/// carrying the cause, so the remaining checks still run.
pub fn build_checks(config: &Config, kinds: &[CheckKind]) -> Vec<Arc<dyn Check>> {
    kinds
        .iter()
        .map(|kind| match build_check(config, *kind) {
            Ok(check) => check,
            Err(e) => {
                tracing::error!("Failed to set up {}: {}", kind.display_name(), e);
                Arc::new(UnavailableCheck::new(kind.display_name(), e.to_string()))
                    as Arc<dyn Check>
            }
        })
        .collect()
}

fn build_check(config: &Config, kind: CheckKind) -> Result<Arc<dyn Check>, AuditError> {
    Ok(match kind {
        CheckKind::HeadingSequence => Arc::new(HeadingSequenceCheck::new()),
        CheckKind::H1Presence => Arc::new(H1PresenceCheck::new()),
        CheckKind::AltText => Arc::new(AltTextCheck::new()),
        CheckKind::LinkHealth => {
            Arc::new(LinkHealthCheck::new(crate::links::build_validator(config)?))
        }
        CheckKind::CurrencyLocalization => Arc::new(CurrencyLocalizationCheck::new(
            config.currency.clone(),
            config.page.scroll_passes,
        )),
        CheckKind::PayloadPresence => Arc::new(PayloadPresenceCheck::new(config.payload.clone())),
    })
}

/// Stands in for a check whose setup failed; always fails with the cause
pub struct UnavailableCheck {
    name: String,
    reason: String,
}

impl UnavailableCheck {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Check for UnavailableCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _page: &dyn PageHandle) -> crate::Result<CheckResult> {
        Ok(CheckResult::fail(
            self.name.as_str(),
            format!("Check could not be set up: {}", self.reason),
            DetailRows::None,
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs_round_trip() {
        for kind in CheckKind::all() {
            assert_eq!(CheckKind::from_slug(kind.slug()), Some(*kind));
        }
        assert_eq!(
            CheckKind::from_slug(" Alt-Text "),
            Some(CheckKind::AltText)
        );
        assert_eq!(CheckKind::from_slug("spelling"), None);
    }

    #[test]
    fn test_resolve_empty_selects_all() {
        let kinds = CheckKind::resolve::<String>(&[]).unwrap();
        assert_eq!(kinds, CheckKind::all().to_vec());
    }

    #[test]
    fn test_resolve_keeps_order() {
        let kinds = CheckKind::resolve(&["link-health", "heading-sequence"]).unwrap();
        assert_eq!(kinds, vec![CheckKind::LinkHealth, CheckKind::HeadingSequence]);

        assert!(matches!(
            CheckKind::resolve(&["nope"]),
            Err(ConfigError::UnknownCheck(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_build_checks_uses_display_names() {
        let config = crate::config::parse_config(
            r#"
[audit]
page-url = "https://example.com/"

[output]
database-path = "audit.db"
summary-path = "audit.md"
"#,
        )
        .unwrap();

        let checks = build_checks(&config, CheckKind::all());
        let names: Vec<_> = checks.iter().map(|c| c.name().to_string()).collect();

        assert_eq!(
            names,
            vec![
                "Heading Sequence",
                "H1 Tags",
                "Image Alt Text",
                "URL Status",
                "Currency Filter",
                "Script Data"
            ]
        );
    }

    #[tokio::test]
    async fn test_unavailable_check_fails_with_cause() {
        let check = UnavailableCheck::new("URL Status", "TLS backend unavailable");
        let page = fixtures::page("<html><body><a href=\"/a\">a</a></body></html>");

        let result = check.run(page.as_ref()).await.unwrap();

        assert_eq!(result.check_name(), "URL Status");
        assert_eq!(result.status(), CheckStatus::Fail);
        assert_eq!(
            result.comment(),
            "Check could not be set up: TLS backend unavailable"
        );
        assert!(result.page_loaded());
    }
}
