use crate::errors::ExportError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{info, warn};

/// Tokens are treated as expired this many seconds before `expires_at`.
const EXPIRY_SKEW_SECS: i64 = 60;

/// The credential persisted between runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredToken {
    /// Returns `true` if the access token can still be used at `now`.
    /// A token without an expiry never expires.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(EXPIRY_SKEW_SECS) < expires_at,
            None => true,
        }
    }

    /// Returns `true` if every requested scope was granted to this token.
    pub fn covers(&self, scopes: &[String]) -> bool {
        scopes.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Reads the token file.
    ///
    /// A missing file yields `Ok(None)`. A file whose content is not a valid
    /// token is logged and also yields `Ok(None)`, so a fresh consent
    /// replaces it. Errors opening an existing file are returned.
    pub fn load(path: &Path) -> Result<Option<Self>, ExportError> {
        if !path.exists() {
            info!("Token file '{}' not found.", path.display());
            return Ok(None);
        }

        let reader = BufReader::new(File::open(path)?);
        match serde_json::from_reader(reader) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!("Ignoring unreadable token file '{}': {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Writes the token to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!("Saved credentials to '{}'.", path.display());
        Ok(())
    }
}
