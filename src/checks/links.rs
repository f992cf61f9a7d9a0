use crate::checks::{Check, CheckResult, DetailRows};
use crate::links::LinkValidator;
use crate::page::PageHandle;
use crate::url::parse_page_url;
use async_trait::async_trait;

/// Probes every link on the page and fails if any is unreachable
pub struct LinkHealthCheck {
    validator: LinkValidator,
}

impl LinkHealthCheck {
    pub fn new(validator: LinkValidator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Check for LinkHealthCheck {
    fn name(&self) -> &str {
        "URL Status"
    }

    async fn run(&self, page: &dyn PageHandle) -> crate::Result<CheckResult> {
        let base = parse_page_url(page.url())?;

        let mut hrefs = Vec::new();
        for anchor in page.find_all("a[href]").await? {
            if let Some(href) = anchor.attribute("href").await? {
                hrefs.push(href);
            }
        }
        tracing::debug!("Found {} anchors on {}", hrefs.len(), base);

        let records = self.validator.validate(&hrefs, &base).await;
        if records.is_empty() {
            return Ok(CheckResult::fail(
                self.name(),
                "No links found on the page",
                DetailRows::Links(records),
            ));
        }

        let details = DetailRows::Links(records);
        let failed = details.failed_count();

        let result = if failed == 0 {
            CheckResult::pass(
                self.name(),
                format!("All {} URLs passed successfully.", details.len()),
                details,
            )
        } else {
            CheckResult::fail(
                self.name(),
                format!("{} of {} URLs failed.", failed, details.len()),
                details,
            )
        };

        Ok(result)
    }
}
