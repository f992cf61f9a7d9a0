//! Image alt text check
//!
//! Every `img` needs a non-empty `alt` attribute. Whitespace-only alt text
//! counts as present.

use crate::checks::{Check, CheckResult, CheckStatus, DetailRows, ImageRecord};
use crate::page::PageHandle;
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct AltTextCheck;

impl AltTextCheck {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Check for AltTextCheck {
    fn name(&self) -> &str {
        "Image Alt Text"
    }

    async fn run(&self, page: &dyn PageHandle) -> crate::Result<CheckResult> {
        let images = page.find_all("img").await?;
        let mut records = Vec::with_capacity(images.len());

        for (i, image) in images.iter().enumerate() {
            let source = image.attribute("src").await?;
            let alt_text = image.attribute("alt").await?;
            let has_alt = alt_text.as_deref().is_some_and(|alt| !alt.is_empty());

            records.push(ImageRecord {
                index: i + 1,
                source,
                alt_text,
                status: CheckStatus::from_bool(has_alt),
            });
        }

        let details = DetailRows::Images(records);
        let total = details.len();
        let failed = details.failed_count();

        let result = if total == 0 {
            CheckResult::pass(self.name(), "No images found on the page.", details)
        } else if failed > 0 {
            CheckResult::fail(
                self.name(),
                format!("{} images failed due to missing alt text.", failed),
                details,
            )
        } else {
            CheckResult::pass(
                self.name(),
                format!("All {} images have alt text.", total),
                details,
            )
        };

        Ok(result)
    }
}
