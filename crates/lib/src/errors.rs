use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while authenticating, fetching, or writing an export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Request to the Management API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Management API returned {status} for {url}: {body}")]
    Api {
        status: StatusCode,
        url: String,
        body: String,
    },
    #[error("Management API rejected the credentials ({status}): {body}")]
    Unauthorized { status: StatusCode, body: String },
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Invalid client secret file '{path}': {reason}")]
    ClientSecret { path: String, reason: String },
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
