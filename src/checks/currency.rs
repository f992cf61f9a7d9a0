//! Currency selector check
//!
//! Opens the page's currency control and selects every option in turn. After
//! each selection all price tiles must show the option's symbol. Options are
//! judged independently: one broken currency does not stop the others.

use crate::checks::{Check, CheckResult, CheckStatus, CurrencyRecord, DetailRows};
use crate::config::CurrencyConfig;
use crate::page::{ElementHandle, PageHandle, SCROLL_TO_BOTTOM};
use crate::PageResult;
use async_trait::async_trait;
use std::time::Duration;

/// Pause after each scroll so lazily loaded content can arrive
const DEFAULT_SCROLL_PAUSE: Duration = Duration::from_secs(2);

pub struct CurrencyLocalizationCheck {
    config: CurrencyConfig,
    scroll_passes: u32,
    scroll_pause: Duration,
}

impl CurrencyLocalizationCheck {
    pub fn new(config: CurrencyConfig, scroll_passes: u32) -> Self {
        Self {
            config,
            scroll_passes,
            scroll_pause: DEFAULT_SCROLL_PAUSE,
        }
    }

    /// Overrides the pause between scroll passes
    pub fn with_scroll_pause(mut self, pause: Duration) -> Self {
        self.scroll_pause = pause;
        self
    }

    async fn load_lazy_content(&self, page: &dyn PageHandle) -> PageResult<()> {
        for _ in 0..self.scroll_passes {
            page.execute_script(SCROLL_TO_BOTTOM).await?;
            tokio::time::sleep(self.scroll_pause).await;
        }
        Ok(())
    }

    /// Selects every option; `Err` only when the control itself is unusable
    async fn check_options(&self, page: &dyn PageHandle) -> PageResult<Vec<CurrencyRecord>> {
        self.load_lazy_content(page).await?;

        let control = page.find_first(&self.config.control_selector).await?;
        control.click().await?;
        tracing::debug!("Currency control opened");

        let options = control.find_all(&self.config.option_selector).await?;
        tracing::info!("Found {} currency options", options.len());

        let mut records = Vec::with_capacity(options.len());
        for option in &options {
            records.push(self.check_option(page, control.as_ref(), option.as_ref()).await);
        }
        Ok(records)
    }

    async fn check_option(
        &self,
        page: &dyn PageHandle,
        control: &dyn ElementHandle,
        option: &dyn ElementHandle,
    ) -> CurrencyRecord {
        let currency_name = option
            .attribute(&self.config.name_attribute)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();

        let currency_symbol = match self.read_symbol(option).await {
            Ok(symbol) => symbol,
            Err(e) => return record(currency_name, "N/A", CheckStatus::Fail, e.to_string()),
        };

        match self.select_and_verify(page, control, option, &currency_symbol).await {
            Ok(true) => record(
                currency_name,
                currency_symbol,
                CheckStatus::Pass,
                "Validation successful",
            ),
            Ok(false) => record(
                currency_name,
                currency_symbol,
                CheckStatus::Fail,
                "Currency not reflected in tiles",
            ),
            Err(e) => {
                tracing::error!("Error for currency {}: {}", currency_symbol, e);
                record(currency_name, currency_symbol, CheckStatus::Fail, e.to_string())
            }
        }
    }

    /// First whitespace-separated token of the option's label
    async fn read_symbol(&self, option: &dyn ElementHandle) -> PageResult<String> {
        let label = option
            .find_all(&self.config.symbol_selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| crate::PageError::ElementNotFound(self.config.symbol_selector.clone()))?;

        Ok(label
            .text()
            .await?
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string())
    }

    async fn select_and_verify(
        &self,
        page: &dyn PageHandle,
        control: &dyn ElementHandle,
        option: &dyn ElementHandle,
        symbol: &str,
    ) -> PageResult<bool> {
        control.click().await?;
        option.click().await?;

        let tiles = page.find_all(&self.config.price_selector).await?;
        if tiles.is_empty() || symbol.is_empty() {
            return Ok(false);
        }

        for tile in &tiles {
            if !tile.text().await?.contains(symbol) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn record(
    currency_name: impl Into<String>,
    currency_symbol: impl Into<String>,
    status: CheckStatus,
    reason: impl Into<String>,
) -> CurrencyRecord {
    CurrencyRecord {
        currency_name: currency_name.into(),
        currency_symbol: currency_symbol.into(),
        status,
        reason: reason.into(),
    }
}

#[async_trait]
impl Check for CurrencyLocalizationCheck {
    fn name(&self) -> &str {
        "Currency Filter"
    }

    async fn run(&self, page: &dyn PageHandle) -> crate::Result<CheckResult> {
        let records = match self.check_options(page).await {
            Ok(records) if records.is_empty() => {
                let rows = vec![record(
                    "All",
                    "N/A",
                    CheckStatus::Fail,
                    "No currency options found",
                )];
                return Ok(CheckResult::fail(
                    self.name(),
                    "No currency options found",
                    DetailRows::Currencies(rows),
                ));
            }
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Currency check could not use the selector: {}", e);
                let rows = vec![record("All", "N/A", CheckStatus::Fail, e.to_string())];
                return Ok(CheckResult::fail(
                    self.name(),
                    format!("Currency selector unusable: {}", e),
                    DetailRows::Currencies(rows),
                ));
            }
        };

        let details = DetailRows::Currencies(records);
        let failed = details.failed_count();

        let result = if failed == 0 {
            CheckResult::pass(self.name(), "All currencies passed successfully.", details)
        } else {
            CheckResult::fail(self.name(), format!("{} currencies failed.", failed), details)
        };

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::page;
    use crate::PageError;
    use std::sync::{Arc, Mutex};

    /// A shop page whose price tiles follow the selected currency
    ///
    /// `broken` lists currencies whose selection leaves the tiles unchanged.
    #[derive(Clone)]
    struct Shop {
        currencies: Vec<(&'static str, &'static str)>,
        broken: Vec<&'static str>,
        tiles: usize,
        selected: Arc<Mutex<&'static str>>,
        scrolls: Arc<Mutex<u32>>,
    }

    impl Shop {
        fn new(currencies: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                currencies,
                broken: Vec::new(),
                tiles: 3,
                selected: Arc::new(Mutex::new("$")),
                scrolls: Arc::new(Mutex::new(0)),
            }
        }
    }

    enum Part {
        Control,
        Option(&'static str, &'static str),
        Label(&'static str),
        Tile,
    }

    struct ShopElement {
        shop: Shop,
        part: Part,
    }

    #[async_trait]
    impl PageHandle for Shop {
        fn url(&self) -> &str {
            "https://shop.example.com/"
        }

        async fn find_all(&self, selector: &str) -> PageResult<Vec<Box<dyn ElementHandle>>> {
            let parts: Vec<Part> = match selector {
                "#js-currency-sort-footer" => vec![Part::Control],
                ".js-price-value" => (0..self.tiles).map(|_| Part::Tile).collect(),
                _ => Vec::new(),
            };
            Ok(parts
                .into_iter()
                .map(|part| {
                    Box::new(ShopElement {
                        shop: self.clone(),
                        part,
                    }) as Box<dyn ElementHandle>
                })
                .collect())
        }

        async fn execute_script(&self, _script: &str) -> PageResult<()> {
            *self.scrolls.lock().unwrap() += 1;
            Ok(())
        }

        async fn close(&mut self) -> PageResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl ElementHandle for ShopElement {
        async fn tag_name(&self) -> PageResult<String> {
            Ok("li".to_string())
        }

        async fn text(&self) -> PageResult<String> {
            Ok(match &self.part {
                Part::Label(symbol) => format!("{} Currency", symbol),
                Part::Tile => format!("{} 120", self.shop.selected.lock().unwrap()),
                _ => String::new(),
            })
        }

        async fn attribute(&self, name: &str) -> PageResult<Option<String>> {
            Ok(match (&self.part, name) {
                (Part::Option(country, _), "data-currency-country") => Some(country.to_string()),
                _ => None,
            })
        }

        async fn find_all(&self, selector: &str) -> PageResult<Vec<Box<dyn ElementHandle>>> {
            let parts: Vec<Part> = match (&self.part, selector) {
                (Part::Control, ".select-ul > li") => self
                    .shop
                    .currencies
                    .iter()
                    .map(|&(country, symbol)| Part::Option(country, symbol))
                    .collect(),
                (Part::Option(_, symbol), ".option > p") => vec![Part::Label(*symbol)],
                _ => Vec::new(),
            };
            Ok(parts
                .into_iter()
                .map(|part| {
                    Box::new(ShopElement {
                        shop: self.shop.clone(),
                        part,
                    }) as Box<dyn ElementHandle>
                })
                .collect())
        }

        async fn click(&self) -> PageResult<()> {
            if let Part::Option(country, symbol) = &self.part {
                if !self.shop.broken.contains(country) {
                    *self.shop.selected.lock().unwrap() = *symbol;
                }
            }
            Ok(())
        }
    }

    fn check() -> CurrencyLocalizationCheck {
        CurrencyLocalizationCheck::new(CurrencyConfig::default(), 3)
            .with_scroll_pause(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_all_currencies_reflected() {
        let shop = Shop::new(vec![("US", "$"), ("ES", "€"), ("GB", "£")]);

        let result = check().run(&shop).await.unwrap();

        assert_eq!(result.status(), CheckStatus::Pass);
        assert_eq!(result.details().len(), 3);
        assert_eq!(*shop.scrolls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unreflected_currency_fails_alone() {
        let mut shop = Shop::new(vec![("US", "$"), ("ES", "€"), ("GB", "£")]);
        shop.broken = vec!["GB"];

        let result = check().run(&shop).await.unwrap();

        assert_eq!(result.status(), CheckStatus::Fail);
        assert_eq!(result.comment(), "1 currencies failed.");

        match result.details() {
            DetailRows::Currencies(rows) => {
                assert_eq!(rows[0].status, CheckStatus::Pass);
                assert_eq!(rows[1].currency_name, "ES");
                assert_eq!(rows[1].currency_symbol, "€");
                assert_eq!(rows[1].status, CheckStatus::Pass);
                assert_eq!(rows[2].status, CheckStatus::Fail);
                assert_eq!(rows[2].reason, "Currency not reflected in tiles");
            }
            other => panic!("unexpected rows: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_tiles_fails_option() {
        let mut shop = Shop::new(vec![("ES", "€")]);
        shop.tiles = 0;

        let result = check().run(&shop).await.unwrap();

        assert_eq!(result.status(), CheckStatus::Fail);
        assert_eq!(result.details().failed_count(), 1);
    }

    #[tokio::test]
    async fn test_no_options_fails() {
        let shop = Shop::new(Vec::new());

        let result = check().run(&shop).await.unwrap();

        assert_eq!(result.status(), CheckStatus::Fail);
        assert_eq!(result.comment(), "No currency options found");
    }

    #[tokio::test]
    async fn test_static_page_cannot_click() {
        let page = page(
            r#"<div id="js-currency-sort-footer"><ul class="select-ul">
                <li data-currency-country="ES"><div class="option"><p>€ Euro</p></div></li>
            </ul></div>"#,
        );

        let result = check().run(page.as_ref()).await.unwrap();

        assert_eq!(result.status(), CheckStatus::Fail);
        assert!(result.comment().contains("not supported"));
    }

    #[tokio::test]
    async fn test_missing_control_fails() {
        let result = check().run(page("<p>no selector</p>").as_ref()).await.unwrap();

        assert_eq!(result.status(), CheckStatus::Fail);
        let expected = PageError::ElementNotFound("#js-currency-sort-footer".into()).to_string();
        assert!(result.comment().contains(&expected));
    }
}
