use crate::checks::{Check, CheckResult, DetailRows, H1Record};
use crate::page::PageHandle;
use async_trait::async_trait;

/// Passes when the page has at least one H1 with visible text
#[derive(Debug, Default)]
pub struct H1PresenceCheck;

impl H1PresenceCheck {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Check for H1PresenceCheck {
    fn name(&self) -> &str {
        "H1 Tags"
    }

    async fn run(&self, page: &dyn PageHandle) -> crate::Result<CheckResult> {
        let mut records = Vec::new();
        for element in page.find_all("h1").await? {
            let text = element.text().await?;
            if !text.trim().is_empty() {
                records.push(H1Record { text });
            }
        }

        let result = if records.is_empty() {
            CheckResult::fail(self.name(), "No H1 tags found.", DetailRows::H1s(records))
        } else {
            CheckResult::pass(self.name(), "H1 tags found.", DetailRows::H1s(records))
        };

        Ok(result)
    }
}
