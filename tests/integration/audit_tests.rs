//! Integration tests for the audit pipeline
//!
//! These tests use wiremock to serve the audited page and its links, and
//! run configuration, checks, runner, aggregation and sinks end-to-end.

use page_audit::checks::{build_checks, Check, CheckKind, UnavailableCheck};
use page_audit::config::{parse_config, Config};
use page_audit::page::build_accessor;
use page_audit::report::{MarkdownSink, MemorySink, Report, ReportAggregator, SqliteSink};
use page_audit::{CheckRunner, CheckStatus};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration auditing `page_url` with fast link retries
fn create_test_config(page_url: &str, dir: &Path) -> Config {
    let content = format!(
        r#"
[audit]
page-url = "{}"
check-timeout-secs = 30

[page]
load-timeout-secs = 5
scroll-passes = 0

[links]
max-concurrent-probes = 4
max-attempts = 5
attempt-timeout-secs = 2
initial-backoff-ms = 10

[output]
database-path = '{}'
summary-path = '{}'
"#,
        page_url,
        dir.join("report.db").display(),
        dir.join("report.md").display()
    );
    parse_config(&content).expect("Failed to parse test config")
}

fn listing_page() -> String {
    r#"<html><head><title>Madrid stays</title>
        <script src="/static/app.js"></script>
        <script>
          var ScriptData = {"SiteURL": "https://www.example.com", "CampaignID": "EXAMPLE",
            "SiteName": "Example", "Browser": "Chrome", "CountryCode": "ES", "IP": "203.0.113.7"};
        </script></head>
        <body>
          <h1>Stays in Madrid</h1>
          <h2>Popular</h2>
          <img src="/img/1.jpg" alt="Flat near Retiro">
          <img src="/img/2.jpg">
          <h2>Nearby</h2>
          <h3>Toledo</h3>
          <a href="/ok">Ok</a>
          <a href="/ok#reviews">Ok again</a>
          <a href="/flaky">Flaky</a>
          <a href="/missing">Missing</a>
          <a href="javascript:void(0)">Menu</a>
          <div id="js-currency-sort-footer">
            <ul class="select-ul">
              <li data-currency-country="ES"><div class="option"><p>€ Euro</p></div></li>
            </ul>
          </div>
          <span class="js-price-value">$ 120</span>
        </body></html>"#
        .to_string()
}

async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    // Two server errors, then success
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

async fn audit(config: &Config, kinds: &[CheckKind]) -> Report {
    let accessor = build_accessor(config).expect("Failed to build accessor");
    let checks = build_checks(config, kinds);
    let runner = CheckRunner::new(
        accessor,
        Duration::from_secs(config.audit.check_timeout_secs),
    );

    let results = runner.run(&checks, &config.audit.page_url).await;
    ReportAggregator::new(config.audit.page_url.as_str()).aggregate(results)
}

#[tokio::test]
async fn test_full_audit_single_page() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/listing", server.uri()), dir.path());

    let report = audit(&config, CheckKind::all()).await;

    let summary = report.summary();
    assert_eq!(summary.len(), 6);

    let status_of = |name: &str| {
        summary
            .iter()
            .find(|row| row.testcase == name)
            .map(|row| row.status)
            .unwrap_or_else(|| panic!("no summary row for {}", name))
    };
    assert_eq!(status_of("Heading Sequence"), CheckStatus::Pass);
    assert_eq!(status_of("H1 Tags"), CheckStatus::Pass);
    assert_eq!(status_of("Image Alt Text"), CheckStatus::Fail);
    assert_eq!(status_of("URL Status"), CheckStatus::Fail);
    assert_eq!(status_of("Currency Filter"), CheckStatus::Fail);
    assert_eq!(status_of("Script Data"), CheckStatus::Pass);

    assert!(!report.page_unavailable());
    assert_eq!(report.passed_count(), 3);
    assert_eq!(report.failed_count(), 3);
}

#[tokio::test]
async fn test_link_retries_recorded_in_database() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/listing", server.uri()), dir.path());

    let report = audit(&config, &[CheckKind::LinkHealth]).await;

    let db_path = dir.path().join("report.db");
    let mut database = SqliteSink::open(&db_path, report.page_url(), "test-hash").unwrap();
    ReportAggregator::new(report.page_url())
        .publish(&report, &mut database)
        .unwrap();

    let sheet = database.read_sheet("URL Status").unwrap().unwrap();
    assert_eq!(
        sheet.columns,
        vec!["URL", "HTTP Status", "Status", "Error Message", "Attempts"]
    );

    // /ok and /ok#reviews collapse to one link; javascript: is skipped
    assert_eq!(sheet.row_count(), 3);

    let row_for = |suffix: &str| {
        sheet
            .rows
            .iter()
            .find(|row| row[0].ends_with(suffix))
            .cloned()
            .unwrap_or_else(|| panic!("no row for {}", suffix))
    };
    assert_eq!(row_for("/flaky")[2], "Pass");
    assert_eq!(row_for("/flaky")[4], "3");
    assert_eq!(row_for("/missing")[3], "404 Not Found");
    assert_eq!(row_for("/missing")[4], "1");

    let summary = database.read_sheet("Summary").unwrap().unwrap();
    assert_eq!(summary.row_count(), 1);
    assert_eq!(summary.rows[0][2], "Fail");

    let run = database.get_run(database.run_id()).unwrap().unwrap();
    assert_eq!(run.status, "completed");
    assert_eq!(run.config_hash, "test-hash");
}

#[tokio::test]
async fn test_unreachable_page_still_produces_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/listing", server.uri()), dir.path());

    let report = audit(&config, CheckKind::all()).await;

    assert!(report.page_unavailable());
    assert_eq!(report.summary().len(), 6);
    assert_eq!(report.checks_without_data().len(), 6);

    let md_path = dir.path().join("report.md");
    let mut markdown = MarkdownSink::new(&md_path, report.page_url());
    ReportAggregator::new(report.page_url())
        .publish(&report, &mut markdown)
        .unwrap();

    let content = std::fs::read_to_string(&md_path).unwrap();
    assert!(content.contains("## Summary"));
    assert!(content.contains("HTTP 500"));
}

#[tokio::test]
async fn test_selected_checks_only() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/listing", server.uri()), dir.path());

    let kinds = CheckKind::resolve(&["alt-text", "h1-presence"]).unwrap();
    let report = audit(&config, &kinds).await;

    let mut sink = MemorySink::new();
    ReportAggregator::new(report.page_url())
        .publish(&report, &mut sink)
        .unwrap();

    let names: Vec<_> = sink.sheets().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Image Alt Text", "H1 Tags", "Summary"]);

    let images = sink.sheet("Image Alt Text").unwrap();
    assert_eq!(images.row_count(), 2);
    assert_eq!(images.rows[1][2], "None");
    assert_eq!(images.rows[1][3], "Fail");
}

#[tokio::test]
async fn test_check_that_failed_setup_does_not_stop_others() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/listing", server.uri()), dir.path());

    let mut checks = build_checks(&config, &[CheckKind::H1Presence]);
    checks.insert(
        0,
        Arc::new(UnavailableCheck::new("URL Status", "client could not be built")) as Arc<dyn Check>,
    );

    let accessor = build_accessor(&config).expect("Failed to build accessor");
    let runner = CheckRunner::new(accessor, Duration::from_secs(30));
    let results = runner.run(&checks, &config.audit.page_url).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status(), CheckStatus::Fail);
    assert!(results[0].comment().contains("client could not be built"));
    assert_eq!(results[1].check_name(), "H1 Tags");
    assert_eq!(results[1].status(), CheckStatus::Pass);
}
