use super::{ClientSecret, StoredToken};
use crate::errors::ExportError;
use chrono::{Duration, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::info;

// --- Token endpoint request and response structures ---

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// A client for the OAuth 2.0 authorization and token endpoints of one
/// registered OAuth client.
#[derive(Clone, Debug)]
pub struct OAuthClient {
    client: Client,
    secret: ClientSecret,
}

impl OAuthClient {
    pub fn new(secret: ClientSecret) -> Result<Self, ExportError> {
        let client = Client::builder()
            .build()
            .map_err(ExportError::ReqwestClientBuild)?;
        Ok(Self { client, secret })
    }

    /// Builds the URL the user opens to grant offline access to `scopes`.
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> Result<String, ExportError> {
        let scope = scopes.join(" ");
        let url = Url::parse_with_params(
            &self.secret.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.secret.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| ExportError::InvalidUrl {
            url: self.secret.auth_uri.clone(),
            reason: e.to_string(),
        })?;
        Ok(url.to_string())
    }

    /// Exchanges an authorization code for a token.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> Result<StoredToken, ExportError> {
        info!("Exchanging authorization code for an access token.");
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", self.secret.client_id.as_str()),
                ("client_secret", self.secret.client_secret.as_str()),
            ])
            .await?;
        into_stored_token(response, None, scopes)
    }

    /// Obtains a new access token using the token's refresh token.
    ///
    /// The refresh token and granted scopes are carried over when the
    /// endpoint does not return new ones.
    pub async fn refresh(&self, token: &StoredToken) -> Result<StoredToken, ExportError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| ExportError::Auth("the stored token has no refresh token".into()))?;

        info!("Refreshing expired access token.");
        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.secret.client_id.as_str()),
                ("client_secret", self.secret.client_secret.as_str()),
            ])
            .await?;
        into_stored_token(response, token.refresh_token.clone(), &token.scopes)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, ExportError> {
        let response = self
            .client
            .post(&self.secret.token_uri)
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("token endpoint responded with {status}: {body}"),
            };
            return Err(ExportError::Auth(message));
        }

        Ok(response.json().await?)
    }
}

fn into_stored_token(
    response: TokenResponse,
    previous_refresh_token: Option<String>,
    requested_scopes: &[String],
) -> Result<StoredToken, ExportError> {
    let scopes = match response.scope {
        Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
        None => requested_scopes.to_vec(),
    };
    let expires_at = match response.expires_in {
        Some(secs) => Some(
            Duration::try_seconds(secs)
                .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
                .ok_or_else(|| {
                    ExportError::Auth(format!(
                        "token endpoint returned an invalid expires_in: {secs}"
                    ))
                })?,
        ),
        None => None,
    };
    Ok(StoredToken {
        access_token: response.access_token,
        refresh_token: response.refresh_token.or(previous_refresh_token),
        expires_at,
        scopes,
        token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
    })
}
