//! Page-Audit main entry point
//!
//! This is the command-line interface for the Page-Audit page checker.

use anyhow::Context;
use clap::Parser;
use page_audit::checks::{build_checks, CheckKind, CheckResult};
use page_audit::config::{load_config_with_hash, Config};
use page_audit::page::build_accessor;
use page_audit::report::{write_outputs, Report, ReportAggregator};
use page_audit::url::parse_page_url;
use page_audit::CheckRunner;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Page-Audit: rule-based web page auditing
///
/// Page-Audit loads one page, runs a set of independent checks against it
/// (heading order, H1 presence, image alt text, link health, currency
/// selector, embedded script data) and writes a consolidated report.
#[derive(Parser, Debug)]
#[command(name = "page-audit")]
#[command(version = "1.0.0")]
#[command(about = "Rule-based web page auditing", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Audit this URL instead of the configured page-url
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Run only these checks (e.g. --only alt-text --only link-health)
    #[arg(long, value_name = "NAME", num_args = 1..)]
    only: Vec<String>,

    /// Validate config and show which checks would run without running them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(url) = &cli.url {
        parse_page_url(url).with_context(|| format!("Invalid --url {}", url))?;
        config.audit.page_url = url.clone();
    }

    let selected = if cli.only.is_empty() {
        &config.audit.checks
    } else {
        &cli.only
    };
    let kinds = CheckKind::resolve(selected)?;

    if cli.dry_run {
        print_dry_run(&config, &kinds);
        return Ok(());
    }

    let report = run_audit(&config, &kinds).await;
    let written = write_outputs(&report, &config.output, &config_hash)
        .context("Failed to write the audit report")?;
    for path in &written {
        tracing::info!("Report written to {}", path.display());
    }
    print_summary(&report);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_audit=info,warn"),
            1 => EnvFilter::new("page_audit=debug,info"),
            2 => EnvFilter::new("page_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn print_dry_run(config: &Config, kinds: &[CheckKind]) {
    println!("=== Page-Audit Dry Run ===\n");

    println!("Audit:");
    println!("  Page URL: {}", config.audit.page_url);
    println!("  Check timeout: {}s", config.audit.check_timeout_secs);

    println!("\nPage Access:");
    println!("  Backend: {:?}", config.page.backend);
    println!("  WebDriver URL: {}", config.page.webdriver_url);
    println!("  Load timeout: {}s", config.page.load_timeout_secs);
    println!("  Scroll passes: {}", config.page.scroll_passes);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nLinks:");
    println!(
        "  Max concurrent probes: {}",
        config.links.max_concurrent_probes
    );
    println!("  Max attempts: {}", config.links.max_attempts);
    println!("  Attempt timeout: {}s", config.links.attempt_timeout_secs);
    println!("  Initial backoff: {}ms", config.links.initial_backoff_ms);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nChecks ({}):", kinds.len());
    for kind in kinds {
        println!("  - {} ({})", kind.display_name(), kind.slug());
    }

    println!("\n✓ Configuration is valid");
}

/// Runs every selected check and consolidates the results
async fn run_audit(config: &Config, kinds: &[CheckKind]) -> Report {
    let page_url = &config.audit.page_url;

    let checks = build_checks(config, kinds);

    let results = match build_accessor(config) {
        Ok(accessor) => {
            let runner = CheckRunner::new(
                accessor,
                Duration::from_secs(config.audit.check_timeout_secs),
            );

            tracing::info!("Auditing {} with {} checks", page_url, checks.len());
            runner.run(&checks, page_url).await
        }
        Err(e) => {
            tracing::error!("Failed to set up page access: {}", e);
            checks
                .iter()
                .map(|check| {
                    CheckResult::page_unavailable(
                        check.name(),
                        format!("Page access could not be set up: {}", e),
                    )
                })
                .collect()
        }
    };

    ReportAggregator::new(page_url.as_str()).aggregate(results)
}

fn print_summary(report: &Report) {
    println!("\n=== Audit Summary: {} ===\n", report.page_url());
    for row in report.summary() {
        println!("  [{}] {}: {}", row.status, row.testcase, row.comments);
    }
    println!(
        "\n{} passed, {} failed",
        report.passed_count(),
        report.failed_count()
    );

    if report.page_unavailable() {
        println!("⚠ The page could not be loaded for any check");
    }
}
