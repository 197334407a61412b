//! # Analytics Settings Export
//!
//! This crate reads the account → property → view configuration of a Google
//! Analytics Management API (v3) login and exports it as eight CSV tables,
//! one per resource type.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod export;
pub mod flatten;
pub mod row;
pub mod tables;
pub mod traverse;
pub mod writer;

pub use api::{ManagementApi, ManagementClient};
pub use config::{load_config, ExportConfig};
pub use errors::ExportError;
pub use export::{run_export, ExportSummary};
pub use row::{Cell, Row};
pub use tables::{ExportTables, TableKind};
