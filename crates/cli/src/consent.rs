//! # Browser Consent Flow
//!
//! This module implements the installed-application OAuth 2.0 consent step:
//! it starts a loopback HTTP server on a free port, opens the user's browser
//! at the authorization URL, and waits for Google to redirect back with an
//! authorization code.

use async_trait::async_trait;
use ga_export::auth::{AuthorizationCode, ConsentFlow, OAuthClient};
use ga_export::ExportError;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{body::Incoming, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

/// The query parameters Google appends to the redirect URI.
#[derive(Deserialize, Debug, Default)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

type CodeSender = Arc<Mutex<Option<oneshot::Sender<Result<String, ExportError>>>>>;

/// Interprets the redirect parameters. `Ok` carries the authorization code.
fn outcome(params: CallbackParams, expected_state: &str) -> Result<String, ExportError> {
    if let Some(err) = params.error {
        return Err(ExportError::Auth(format!("consent was not granted: {err}")));
    }
    if params.state.as_deref() != Some(expected_state) {
        return Err(ExportError::Auth(
            "the authorization response carried an unexpected state".to_string(),
        ));
    }
    params
        .code
        .ok_or_else(|| ExportError::Auth("the authorization response had no code".to_string()))
}

/// Handles one request to the loopback server.
async fn callback_service(
    req: Request<Incoming>,
    code_tx: CodeSender,
    expected_state: Arc<String>,
) -> Result<Response<String>, hyper::Error> {
    if req.method() != Method::GET || req.uri().path() != "/" {
        let mut not_found = Response::new("Not Found".to_string());
        *not_found.status_mut() = StatusCode::NOT_FOUND;
        return Ok(not_found);
    }

    Ok(handle_redirect(req.uri().query(), &code_tx, &expected_state).await)
}

/// Answers a `GET /` on the loopback server. The sender is consumed only by a
/// redirect that carries a `code` or an `error`; anything else (a prefetch or
/// a reload of the bare URL) gets a 400 and leaves the flow waiting.
async fn handle_redirect(
    query: Option<&str>,
    code_tx: &CodeSender,
    expected_state: &str,
) -> Response<String> {
    let params = serde_urlencoded::from_str::<CallbackParams>(query.unwrap_or(""))
        .unwrap_or_else(|e| {
            error!("Failed to parse callback query parameters: {}", e);
            CallbackParams::default()
        });

    if params.code.is_none() && params.error.is_none() {
        let mut response = Response::new("Waiting for the authorization redirect.".to_string());
        *response.status_mut() = StatusCode::BAD_REQUEST;
        return response;
    }

    let Some(tx) = code_tx.lock().await.take() else {
        // The redirect was already handled.
        return Response::new("This authorization link has already been used.".to_string());
    };

    let result = outcome(params, expected_state);
    let response = match &result {
        Ok(_) => Response::new("Authorization complete. You can close this tab now.".to_string()),
        Err(e) => {
            let mut response = Response::new(format!("Authorization failed: {e}"));
            *response.status_mut() = StatusCode::UNAUTHORIZED;
            response
        }
    };
    let _ = tx.send(result);
    response
}

/// Consent through the system browser and a loopback redirect.
pub struct LoopbackConsent {
    timeout: Duration,
}

impl LoopbackConsent {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ConsentFlow for LoopbackConsent {
    async fn request_code(
        &self,
        oauth: &OAuthClient,
        scopes: &[String],
    ) -> Result<AuthorizationCode, ExportError> {
        // 1. Find a free port for the local callback server.
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{port}/");
        info!("Local callback server will listen on port {}", port);

        // 2. Construct the authorization URL and open it in the browser.
        let state = Arc::new(Uuid::new_v4().to_string());
        let auth_url = oauth.authorization_url(&redirect_uri, scopes, &state)?;
        eprintln!("Please visit this URL to authorize access:\n\n{auth_url}\n");
        if let Err(e) = open::that(&auth_url) {
            warn!("Failed to open browser for authorization: {e}");
        }

        // 3. Serve the redirect until a code (or an error) arrives.
        let (code_tx, code_rx) = oneshot::channel();
        let code_tx: CodeSender = Arc::new(Mutex::new(Some(code_tx)));
        let server_handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    continue;
                };
                let io = TokioIo::new(stream);
                let code_tx = Arc::clone(&code_tx);
                let state = Arc::clone(&state);
                tokio::task::spawn(async move {
                    let service = service_fn(move |req| {
                        callback_service(req, Arc::clone(&code_tx), Arc::clone(&state))
                    });
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        // 4. Wait for the code or a timeout.
        let result = tokio::select! {
            res = code_rx => res.unwrap_or_else(|_| {
                Err(ExportError::Auth("callback channel closed unexpectedly".to_string()))
            }),
            _ = tokio::time::sleep(self.timeout) => Err(ExportError::Auth(format!(
                "no authorization received within {} seconds",
                self.timeout.as_secs()
            ))),
        };
        server_handle.abort();

        let code = result?;
        info!("Received authorization code from callback server.");
        Ok(AuthorizationCode { code, redirect_uri })
    }
}
