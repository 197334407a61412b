#![allow(dead_code)]

use async_trait::async_trait;
use ga_export::{ExportError, ManagementApi};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// --- Mock Management API ---

/// An in-memory `ManagementApi` serving canned collections.
///
/// Collections are keyed by call name and path, e.g. `goals:a1/p1/v1`.
/// Every call is recorded so tests can assert on call counts and order.
#[derive(Clone, Debug, Default)]
pub struct MockManagementApi {
    responses: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    calls: Arc<Mutex<Vec<String>>>,
    failing_call: Arc<Mutex<Option<String>>>,
}

impl MockManagementApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-programs the items returned for a call key.
    pub fn respond(&self, key: &str, items: Vec<Value>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .insert(key.to_string(), items);
        self
    }

    /// Makes the call with this key fail with a 500 API error.
    pub fn fail_on(&self, key: &str) -> &Self {
        *self.failing_call.lock().unwrap() = Some(key.to_string());
        self
    }

    /// Retrieves the recorded call keys, in order.
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Counts the recorded calls whose key starts with `prefix`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.get_calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn serve(&self, key: String) -> Result<Vec<Value>, ExportError> {
        self.calls.lock().unwrap().push(key.clone());
        if self.failing_call.lock().unwrap().as_deref() == Some(key.as_str()) {
            return Err(ExportError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                url: key,
                body: "backend error".to_string(),
            });
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ManagementApi for MockManagementApi {
    async fn list_accounts(&self) -> Result<Vec<Value>, ExportError> {
        self.serve("accounts".to_string())
    }

    async fn list_web_properties(&self, account_id: &str) -> Result<Vec<Value>, ExportError> {
        self.serve(format!("properties:{account_id}"))
    }

    async fn list_views(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.serve(format!("views:{account_id}/{property_id}"))
    }

    async fn list_segments(&self) -> Result<Vec<Value>, ExportError> {
        self.serve("segments".to_string())
    }

    async fn list_filters(&self, account_id: &str) -> Result<Vec<Value>, ExportError> {
        self.serve(format!("filters:{account_id}"))
    }

    async fn list_profile_filter_links(
        &self,
        account_id: &str,
        property_id: &str,
        view_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.serve(format!("links:{account_id}/{property_id}/{view_id}"))
    }

    async fn list_goals(
        &self,
        account_id: &str,
        property_id: &str,
        view_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.serve(format!("goals:{account_id}/{property_id}/{view_id}"))
    }

    async fn list_uploads(
        &self,
        account_id: &str,
        property_id: &str,
        custom_data_source_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.serve(format!(
            "uploads:{account_id}/{property_id}/{custom_data_source_id}"
        ))
    }

    async fn list_custom_dimensions(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.serve(format!("dimensions:{account_id}/{property_id}"))
    }

    async fn list_custom_metrics(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> Result<Vec<Value>, ExportError> {
        self.serve(format!("metrics:{account_id}/{property_id}"))
    }
}

// --- Fixture helpers ---

/// A minimal API object with an id and a name.
pub fn named(id: &str, name: &str) -> Value {
    serde_json::json!({ "id": id, "name": name })
}

/// Reads a CSV file into its header and data rows.
pub fn read_csv(path: &std::path::Path) -> anyhow::Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let header = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<_, _>>()?;
    Ok((header, rows))
}
