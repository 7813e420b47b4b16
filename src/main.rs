mod alert;
mod config;
mod filter;
mod hotels;
mod monitor;
mod telegram;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use config::{Config, Secrets};
use monitor::{CheckOutcome, Monitor};

fn utc_day(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("room_watch=info")),
        )
        .init();

    let config = Config::load().context("Failed to load config")?;
    let dry_run = config::is_dry_run();

    info!(
        targets = %config.watch.targets.join(", "),
        check_in = %utc_day(config.watch.check_in_ms),
        check_out = %utc_day(config.watch.check_out_ms),
        adults = config.watch.adults,
        children = config.watch.children,
        "Starting room watch"
    );

    let secrets = match Secrets::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!(missing = ?e.0, "Add these as repository secrets or to .env");
            return Err(e.into());
        }
    };
    info!("All environment variables present");

    if dry_run {
        info!("DRY RUN mode, alerts will be logged instead of sent");
    }

    let monitor = Monitor::new(config, secrets)?;
    match monitor.run_once(Utc::now(), dry_run).await {
        CheckOutcome::AlertSent { rooms } => info!(rooms, "Alert delivered"),
        CheckOutcome::DryRun { rooms } => info!(rooms, "Dry run found target rooms"),
        CheckOutcome::NoMatches => info!("Nothing to report"),
        CheckOutcome::AlertFailed { rooms } => warn!(rooms, "Target rooms found but alert failed"),
        CheckOutcome::AuthExpired { notified } => warn!(notified, "Tokens expired"),
        CheckOutcome::FetchFailed => warn!("Search failed, skipping this run"),
        CheckOutcome::FormatFailed => warn!("Could not build alert, skipping this run"),
    }

    info!("Check completed");
    Ok(())
}
