use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{Instrument, info};

use asset_alerts::cli::Cli;
use asset_alerts::runner::{Delivery, RunOptions, RunReport, run_once};
use asset_alerts::Settings;
use common::logger::{RunId, init_logger, root_span};
use market::yahoo::YahooClient;
use notify::NtfySender;
use state::JsonFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logger("asset-alerts", cli.verbose, cli.log_format());

    let run_id = RunId::new();
    run(cli).instrument(root_span("asset-alerts", &run_id)).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    info!(
        alerts = settings.alerts.len(),
        tickers = settings.unique_tickers().len(),
        "config loaded"
    );

    let store = JsonFileStore::new(settings.resolve_state_path(cli.state.as_deref(), &cli.config))
        .with_retention(settings.retention);

    let source = YahooClient::new().context("failed to build quote client")?;
    let sink = NtfySender::new(settings.ntfy.clone()).context("failed to build ntfy client")?;

    let options = RunOptions {
        dry_run: cli.dry_run,
    };

    let report = run_once(&settings, options, &store, &source, &sink, Utc::now())
        .await
        .with_context(|| format!("alert run failed (state: {})", store.path().display()))?;

    print_report(&report, cli.dry_run);

    info!(
        state = %store.path().display(),
        sent = report.sent(),
        failed = report.failed(),
        "run complete"
    );
    Ok(())
}

fn print_report(report: &RunReport, dry_run: bool) {
    if dry_run && !report.alerts.is_empty() {
        println!("Dry run - would send the following alerts:");
    }

    for (alert, delivery) in &report.alerts {
        match delivery {
            Delivery::Sent => println!("✓ Alert sent: {} - {}", alert.name, alert.message),
            Delivery::Skipped => println!(
                "  • {}: {} (price: ${:.2})",
                alert.name, alert.message, alert.price
            ),
            Delivery::Failed(_) => {}
        }
    }
}
