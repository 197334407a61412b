//! # ga-export: Analytics Settings Export
//!
//! This is the entry point of the export tool. It authenticates against the
//! Management API, walks every account, property and view, and writes the
//! settings as CSV files under `output/<YYYYMMDD_HHMMSS>/`.
//!
//! Settings come from `config.yml`, `.env` and `GA_EXPORT_*` variables; the
//! command itself takes no arguments.

mod consent;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use consent::LoopbackConsent;
use ga_export::auth::obtain_token;
use ga_export::{load_config, run_export, ManagementClient};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// How long to wait for the user to finish the browser consent.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(120);

// --- CLI Definition ---

/// Export Google Analytics account, property and view settings to CSV.
#[derive(Parser, Debug)]
#[command(name = "ga-export", author, version, about, long_about = None)]
struct Cli {}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup logging
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ga_export=info".parse()?),
        )
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 2. Parse CLI arguments
    let _cli = Cli::parse();

    // 3. Run the export and handle the final result
    if let Err(e) = run().await {
        eprintln!("[ga-export error] {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = load_config(None).context("Failed to load configuration")?;

    let consent = LoopbackConsent::new(CONSENT_TIMEOUT);
    let token = obtain_token(&config, &consent)
        .await
        .context("Authentication failed")?;

    let client = ManagementClient::new(
        config.api_base_url.as_str(),
        token.access_token,
        config.page_size,
    )?;
    let summary = run_export(&client, &config.output_root, Local::now())
        .await
        .context("Export failed")?;

    for table in &summary.tables {
        info!("{}: {} rows", table.kind.file_name(), table.rows);
    }
    info!("Export complete: '{}'.", summary.run_dir.display());
    Ok(())
}
