use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::runtime::Runtime;

/// Client for the model-serving endpoints that turn OCR text into table
/// structure. Constructed once by the process entry point and passed into
/// the pipeline; it holds no ambient state beyond the HTTP connection pool.
///
/// Both endpoints share one wire shape: a JSON POST, and on success a body
/// carrying the model output under `response`. Column inference receives
/// `{ "text": ... }` and answers a bare comma-separated list of column
/// names; table extraction receives `{ "text": ..., "columns": [...] }` and
/// answers a markdown-style table. The extraction prompt served behind the
/// endpoint instructs the model to collapse irregular whitespace, split
/// combined cells, merge duplicate headers, fill gaps with `-`, and return
/// the table with no commentary. The caller must still validate the output;
/// none of that is guaranteed.
#[derive(Clone)]
pub struct InferenceClient {
    http: Client,
    columns_endpoint: String,
    table_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EndpointResponse {
    response: Option<String>,
}

impl InferenceClient {
    pub fn new(columns_endpoint: impl Into<String>, table_endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            columns_endpoint: columns_endpoint.into(),
            table_endpoint: Some(table_endpoint.into()),
        }
    }

    /// Client for schema-only use. `extract_table` fails on such a client
    /// without touching the network.
    pub fn columns_only(columns_endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            columns_endpoint: columns_endpoint.into(),
            table_endpoint: None,
        }
    }

    /// Asks the model for column names over the reference-document text.
    /// Returns the raw comma-separated response; the caller parses and
    /// caches it. Transport failures, non-success statuses and bodies
    /// without a `response` field are errors. No retries.
    pub async fn infer_columns(&self, text: &str) -> Result<String> {
        self.post(&self.columns_endpoint, json!({ "text": text }), "column inference")
            .await
    }

    /// Asks the model to restructure one user document's text into a
    /// markdown-style table over the given columns.
    pub async fn extract_table(&self, text: &str, columns: &[String]) -> Result<String> {
        let endpoint = self
            .table_endpoint
            .as_deref()
            .ok_or_else(|| anyhow!("no table extraction endpoint configured"))?;
        self.post(
            endpoint,
            json!({ "text": text, "columns": columns }),
            "table extraction",
        )
        .await
    }

    pub fn infer_columns_blocking(&self, text: &str) -> Result<String> {
        let rt = Runtime::new().context("failed to create tokio runtime")?;
        rt.block_on(self.infer_columns(text))
    }

    pub fn extract_table_blocking(&self, text: &str, columns: &[String]) -> Result<String> {
        let rt = Runtime::new().context("failed to create tokio runtime")?;
        rt.block_on(self.extract_table(text, columns))
    }

    async fn post(&self, url: &str, payload: serde_json::Value, what: &str) -> Result<String> {
        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{what} returned error (status {status}): {body}"));
        }
        let body: EndpointResponse = response
            .json()
            .await
            .with_context(|| format!("failed to decode {what} response"))?;
        body.response
            .ok_or_else(|| anyhow!("missing response field in {what} body"))
    }
}
