use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{multipart, Client};

use paper2data_core::OcrResult;

/// Client for the document OCR service. The document bytes go up as a
/// multipart field named `document`; the JSON body comes back as an
/// `OcrResult`. Whether a failure here is fatal depends on which document
/// was being read, so errors always propagate to the driver.
pub struct OcrClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OcrClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn recognize(&self, path: &Path) -> Result<OcrResult> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OCR API key is not set and no cached result exists"))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document")
            .to_string();
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read document {}", path.display()))?;
        let form = multipart::Form::new()
            .part("document", multipart::Part::bytes(bytes).file_name(file_name));
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .with_context(|| format!("OCR request failed for {}", path.display()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!(
                "OCR service returned error for {} (status {status}): {body}",
                path.display()
            ));
        }
        response
            .json::<OcrResult>()
            .with_context(|| format!("failed to decode OCR response for {}", path.display()))
    }
}
