//! Runs a complete export: walk the API, then write every table.

use crate::api::ManagementApi;
use crate::errors::ExportError;
use crate::traverse::collect_settings;
use crate::writer::{run_directory, write_tables, WrittenTable};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// The outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub run_dir: PathBuf,
    pub tables: Vec<WrittenTable>,
}

/// Exports all settings into `<output_root>/<YYYYMMDD_HHMMSS>/`.
///
/// Rows are held in memory until the walk finishes; if any API call fails,
/// nothing is written.
pub async fn run_export(
    api: &dyn ManagementApi,
    output_root: &Path,
    started_at: DateTime<Local>,
) -> Result<ExportSummary, ExportError> {
    let tables = collect_settings(api).await?;

    let run_dir = run_directory(output_root, &started_at);
    info!("Writing export to '{}'.", run_dir.display());
    let tables = write_tables(&run_dir, &tables)?;

    Ok(ExportSummary { run_dir, tables })
}
