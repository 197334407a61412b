//! # Export Configuration
//!
//! This module defines the settings used by an export run and the logic for
//! loading them from an optional `config.yml` file and `GA_EXPORT_*`
//! environment variables, layered on top of built-in defaults.

use crate::errors::ExportError;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// The read-only analytics scope requested during consent.
pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";

/// The base URL of the Management API (v3).
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/analytics/v3";

/// The file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Path to the OAuth client secret downloaded from the Cloud console.
    pub client_secret_file: PathBuf,
    /// Path of the persisted token, read at startup and rewritten on refresh.
    pub token_file: PathBuf,
    /// OAuth scopes requested during consent.
    pub scopes: Vec<String>,
    /// Base URL of the Management API. Overridable for tests.
    pub api_base_url: String,
    /// Directory under which each run creates its timestamped folder.
    pub output_root: PathBuf,
    /// Value sent as `max-results` on the first page of every list call.
    pub page_size: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            client_secret_file: PathBuf::from("client_secret.json"),
            token_file: PathBuf::from("token.json"),
            scopes: vec![ANALYTICS_READONLY_SCOPE.to_string()],
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            output_root: PathBuf::from("output"),
            page_size: 1000,
        }
    }
}

/// Loads the export configuration.
///
/// Layers, lowest precedence first:
/// - built-in defaults (see [`ExportConfig::default`]);
/// - the YAML file at `path`, or `config.yml` in the working directory if present;
/// - `GA_EXPORT_*` environment variables (e.g. `GA_EXPORT_TOKEN_FILE`,
///   `GA_EXPORT_SCOPES=a,b`).
///
/// An explicit `path` that does not exist is an error; the implicit
/// `config.yml` is optional.
pub fn load_config(path: Option<&Path>) -> Result<ExportConfig, ExportError> {
    let defaults = ExportConfig::default();
    let mut builder = ConfigBuilder::builder()
        .set_default(
            "client_secret_file",
            defaults.client_secret_file.to_string_lossy().to_string(),
        )?
        .set_default("token_file", defaults.token_file.to_string_lossy().to_string())?
        .set_default("scopes", defaults.scopes)?
        .set_default("api_base_url", defaults.api_base_url)?
        .set_default(
            "output_root",
            defaults.output_root.to_string_lossy().to_string(),
        )?
        .set_default("page_size", i64::from(defaults.page_size))?;

    match path {
        Some(path) => {
            info!("Loading configuration from '{}'.", path.display());
            builder = builder
                .add_source(File::new(&path.to_string_lossy(), FileFormat::Yaml).required(true));
        }
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Loading configuration from '{DEFAULT_CONFIG_FILE}'.");
            }
            builder = builder
                .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));
        }
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("GA_EXPORT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scopes"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
