//! Heading hierarchy check
//!
//! Heading levels must never decrease in document order: once an `h3` has
//! appeared, a later `h2` fails the page.

use crate::checks::{Check, CheckResult, DetailRows, HeadingRecord};
use crate::page::PageHandle;
use async_trait::async_trait;

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

#[derive(Debug, Default)]
pub struct HeadingSequenceCheck;

impl HeadingSequenceCheck {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Check for HeadingSequenceCheck {
    fn name(&self) -> &str {
        "Heading Sequence"
    }

    async fn run(&self, page: &dyn PageHandle) -> crate::Result<CheckResult> {
        let mut records = Vec::new();
        for element in page.find_all(HEADING_SELECTOR).await? {
            records.push(HeadingRecord {
                tag: element.tag_name().await?.to_ascii_uppercase(),
                text: element.text().await?,
            });
        }

        if records.is_empty() {
            return Ok(CheckResult::pass(
                self.name(),
                "No headings found on the page.",
                DetailRows::Headings(records),
            ));
        }

        let levels: Vec<u8> = records.iter().filter_map(HeadingRecord::level).collect();
        tracing::debug!("Heading levels: {}", format_levels(&levels));

        let result = if is_non_decreasing(&levels) {
            CheckResult::pass(
                self.name(),
                format!("Heading sequence is in order: {}", format_levels(&levels)),
                DetailRows::Headings(records),
            )
        } else {
            let mut expected = levels.clone();
            expected.sort_unstable();
            CheckResult::fail(
                self.name(),
                format!(
                    "Heading sequence is out of order: {} (expected {})",
                    format_levels(&levels),
                    format_levels(&expected)
                ),
                DetailRows::Headings(records),
            )
        };

        Ok(result)
    }
}

fn is_non_decreasing(levels: &[u8]) -> bool {
    levels.windows(2).all(|pair| pair[0] <= pair[1])
}

/// Formats levels as `[1,3,2]`
fn format_levels(levels: &[u8]) -> String {
    let joined: Vec<String> = levels.iter().map(u8::to_string).collect();
    format!("[{}]", joined.join(","))
}
