//! # Tabular Writer
//!
//! Writes collections of [`Row`]s as CSV. Rows may carry different keys: the
//! header is the union of all keys in first-seen order, and cells a row does
//! not have are left blank.

use crate::errors::ExportError;
use crate::row::Row;
use crate::tables::{ExportTables, TableKind};
use chrono::{DateTime, TimeZone};
use indexmap::IndexSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Format of the per-run directory name, e.g. `20240131_235959`.
pub const RUN_DIR_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Returns `<root>/<YYYYMMDD_HHMMSS>` for a run started at `started_at`.
pub fn run_directory<Tz: TimeZone>(root: &Path, started_at: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    root.join(started_at.format(RUN_DIR_FORMAT).to_string())
}

/// The union of all row keys, in the order they are first seen.
pub fn header(rows: &[Row]) -> Vec<String> {
    let columns: IndexSet<&str> = rows.iter().flat_map(Row::keys).collect();
    columns.into_iter().map(str::to_string).collect()
}

/// Writes `rows` as CSV to `writer`. An empty collection writes nothing.
pub fn write_rows<W: Write>(writer: W, rows: &[Row]) -> Result<(), ExportError> {
    if rows.is_empty() {
        return Ok(());
    }

    let columns = header(rows);
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&columns)?;
    for row in rows {
        csv_writer.write_record(
            columns
                .iter()
                .map(|column| row.get(column).map(|cell| cell.render()).unwrap_or_default()),
        )?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes one table into `dir`, creating the directory if missing.
pub fn write_table(dir: &Path, file_name: &str, rows: &[Row]) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let writer = BufWriter::new(File::create(&path)?);
    write_rows(writer, rows)?;
    info!("Wrote {} rows to '{}'.", rows.len(), path.display());
    Ok(path)
}

/// A file written by [`write_tables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTable {
    pub kind: TableKind,
    pub path: PathBuf,
    pub rows: usize,
}

/// Writes all eight tables into `dir`.
pub fn write_tables(dir: &Path, tables: &ExportTables) -> Result<Vec<WrittenTable>, ExportError> {
    TableKind::ALL
        .iter()
        .map(|&kind| -> Result<WrittenTable, ExportError> {
            let rows = tables.rows(kind);
            let path = write_table(dir, kind.file_name(), rows)?;
            Ok(WrittenTable {
                kind,
                path,
                rows: rows.len(),
            })
        })
        .collect()
}
