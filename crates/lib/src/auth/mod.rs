//! # Credential Provider
//!
//! This module obtains the access token used by the Management API client.
//! A valid token persisted by a previous run is reused as-is; an expired one
//! is refreshed; otherwise the user is asked for consent through a
//! [`ConsentFlow`] and the resulting token is persisted for the next run.

mod client_secret;
mod oauth;
mod token;

pub use client_secret::ClientSecret;
pub use oauth::OAuthClient;
pub use token::StoredToken;

use crate::config::ExportConfig;
use crate::errors::ExportError;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

/// An authorization code returned by the consent step, together with the
/// redirect URI it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationCode {
    pub code: String,
    pub redirect_uri: String,
}

/// The interactive step in which the user grants access.
///
/// The binary implements this with a browser and a loopback callback server;
/// tests substitute a canned code.
#[async_trait]
pub trait ConsentFlow: Send + Sync {
    async fn request_code(
        &self,
        oauth: &OAuthClient,
        scopes: &[String],
    ) -> Result<AuthorizationCode, ExportError>;
}

/// Returns an access token for the configured scopes.
///
/// Authentication failures (declined consent, revoked refresh token, bad
/// client secret) are returned as errors and are not retried.
pub async fn obtain_token(
    config: &ExportConfig,
    consent: &dyn ConsentFlow,
) -> Result<StoredToken, ExportError> {
    let stored = StoredToken::load(&config.token_file)?
        .filter(|token| token.covers(&config.scopes));

    if let Some(token) = &stored {
        if token.is_valid_at(Utc::now()) {
            info!("Using stored credentials from '{}'.", config.token_file.display());
            return Ok(token.clone());
        }
    }

    let oauth = OAuthClient::new(ClientSecret::load(&config.client_secret_file)?)?;

    let token = match stored {
        Some(token) if token.refresh_token.is_some() => oauth.refresh(&token).await?,
        _ => {
            info!("No usable credentials found. Requesting user consent.");
            let grant = consent.request_code(&oauth, &config.scopes).await?;
            oauth
                .exchange_code(&grant.code, &grant.redirect_uri, &config.scopes)
                .await?
        }
    };

    token.save(&config.token_file)?;
    Ok(token)
}
