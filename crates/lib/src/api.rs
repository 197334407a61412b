//! # Management API Client
//!
//! One list call per resource type. Each call follows `nextLink` until the
//! collection is exhausted or links back to a page already fetched, and
//! returns the raw JSON items, or an empty vector when a page carries no
//! `items` key. Retries and rate limiting are left to the caller.

use crate::errors::ExportError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// The read operations the traverser needs from the Management API.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<Value>, ExportError>;

    async fn list_web_properties(&self, account_id: &str) -> Result<Vec<Value>, ExportError>;

    async fn list_views(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> Result<Vec<Value>, ExportError>;

    async fn list_segments(&self) -> Result<Vec<Value>, ExportError>;

    async fn list_filters(&self, account_id: &str) -> Result<Vec<Value>, ExportError>;

    async fn list_profile_filter_links(
        &self,
        account_id: &str,
        property_id: &str,
        view_id: &str,
    ) -> Result<Vec<Value>, ExportError>;

    async fn list_goals(
        &self,
        account_id: &str,
        property_id: &str,
        view_id: &str,
    ) -> Result<Vec<Value>, ExportError>;

    async fn list_uploads(
        &self,
        account_id: &str,
        property_id: &str,
        custom_data_source_id: &str,
    ) -> Result<Vec<Value>, ExportError>;

    async fn list_custom_dimensions(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> Result<Vec<Value>, ExportError>;

    async fn list_custom_metrics(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> Result<Vec<Value>, ExportError>;
}

/// One page of a Management API collection.
#[derive(Deserialize, Debug)]
struct ListPage {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

/// An authenticated client for the Management API.
#[derive(Clone, Debug)]
pub struct ManagementClient {
    client: Client,
    base_url: String,
    access_token: String,
    page_size: u32,
}

impl ManagementClient {
    /// Creates a new `ManagementClient` that sends `access_token` as a bearer token.
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        page_size: u32,
    ) -> Result<Self, ExportError> {
        let client = Client::builder()
            .build()
            .map_err(ExportError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            access_token: access_token.into(),
            page_size,
        })
    }

    /// Builds the first-page URL for a collection under `/management/`.
    fn collection_url(&self, segments: &[&str]) -> Result<Url, ExportError> {
        let invalid = |reason: String| ExportError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push("management")
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("max-results", &self.page_size.to_string());
        Ok(url)
    }

    /// Fetches every page of a collection and concatenates the items.
    async fn list(&self, segments: &[&str]) -> Result<Vec<Value>, ExportError> {
        let mut url = self.collection_url(segments)?;
        let mut fetched = HashSet::from([url.clone()]);
        let mut items = Vec::new();

        loop {
            debug!("GET {}", url);
            let response = self
                .client
                .get(url.clone())
                .bearer_auth(&self.access_token)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(match status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        ExportError::Unauthorized { status, body }
                    }
                    _ => ExportError::Api {
                        status,
                        url: url.to_string(),
                        body,
                    },
                });
            }

            let page: ListPage = response.json().await?;
            items.extend(page.items);

            match page.next_link {
                Some(next) => {
                    let next = Url::parse(&next).map_err(|e| ExportError::InvalidUrl {
                        url: next.clone(),
                        reason: e.to_string(),
                    })?;
                    if !fetched.insert(next.clone()) {
                        warn!("Stopping pagination: '{}' was already fetched.", next);
                        break;
                    }
                    url = next;
                }
                None => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl ManagementApi for ManagementClient {
    async fn list_accounts(&self) -> Result<Vec<Value>, ExportError> {
        self.list(&["accounts"]).await
    }

    async fn list_web_properties(&self, account_id: &str) -> Result<Vec<Value>, ExportError> {
        self.list(&["accounts", account_id, "webproperties"]).await
    }

    async fn list_views(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.list(&[
            "accounts",
            account_id,
            "webproperties",
            property_id,
            "profiles",
        ])
        .await
    }

    async fn list_segments(&self) -> Result<Vec<Value>, ExportError> {
        self.list(&["segments"]).await
    }

    async fn list_filters(&self, account_id: &str) -> Result<Vec<Value>, ExportError> {
        self.list(&["accounts", account_id, "filters"]).await
    }

    async fn list_profile_filter_links(
        &self,
        account_id: &str,
        property_id: &str,
        view_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.list(&[
            "accounts",
            account_id,
            "webproperties",
            property_id,
            "profiles",
            view_id,
            "profileFilterLinks",
        ])
        .await
    }

    async fn list_goals(
        &self,
        account_id: &str,
        property_id: &str,
        view_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.list(&[
            "accounts",
            account_id,
            "webproperties",
            property_id,
            "profiles",
            view_id,
            "goals",
        ])
        .await
    }

    async fn list_uploads(
        &self,
        account_id: &str,
        property_id: &str,
        custom_data_source_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.list(&[
            "accounts",
            account_id,
            "webproperties",
            property_id,
            "customDataSources",
            custom_data_source_id,
            "uploads",
        ])
        .await
    }

    async fn list_custom_dimensions(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.list(&[
            "accounts",
            account_id,
            "webproperties",
            property_id,
            "customDimensions",
        ])
        .await
    }

    async fn list_custom_metrics(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.list(&[
            "accounts",
            account_id,
            "webproperties",
            property_id,
            "customMetrics",
        ])
        .await
    }
}
