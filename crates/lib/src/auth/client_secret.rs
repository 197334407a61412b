use crate::errors::ExportError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The OAuth client registered in the Cloud console.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The downloaded file wraps the client under `installed` or `web`.
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Parses the JSON content of a client secret file.
    pub fn from_json(content: &str) -> Result<Self, String> {
        let file: ClientSecretFile = serde_json::from_str(content).map_err(|e| e.to_string())?;
        file.installed
            .or(file.web)
            .ok_or_else(|| "expected an 'installed' or 'web' client entry".to_string())
    }

    /// Reads and parses the client secret at `path`.
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let content = fs::read_to_string(path).map_err(|e| ExportError::ClientSecret {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|reason| ExportError::ClientSecret {
            path: path.display().to_string(),
            reason,
        })
    }
}
