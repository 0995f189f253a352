use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

const DEFAULT_OCR_ENDPOINT: &str = "https://api.upstage.ai/v1/document-ai/ocr";
const DEFAULT_OCR_CACHE_DIR: &str = "cache";
const DEFAULT_COLUMN_CACHE_DIR: &str = "column_cache";

#[derive(Debug, Clone)]
pub struct Paper2DataConfig {
    pub columns_endpoint: String,
    pub table_endpoint: Option<String>,
    pub ocr_endpoint: String,
    pub ocr_api_key: Option<String>,
    pub ocr_cache_dir: PathBuf,
    pub column_cache_dir: PathBuf,
}

impl Paper2DataConfig {
    pub fn from_env() -> Result<Self> {
        let columns_endpoint = require_env("PAPER2DATA_COLUMNS_ENDPOINT")?;
        // Only extraction runs need this one; schema-only runs never call
        // the table endpoint.
        let table_endpoint = optional_env("PAPER2DATA_TABLE_ENDPOINT");
        let ocr_endpoint = env::var("PAPER2DATA_OCR_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_OCR_ENDPOINT.to_string());
        // The document OCR key; only needed when a result is not cached yet.
        let ocr_api_key = env::var("PAPER2DATA_OCR_API_KEY")
            .or_else(|_| env::var("UPSTAGE_API_KEY"))
            .ok();
        let ocr_cache_dir = env::var("PAPER2DATA_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OCR_CACHE_DIR));
        let column_cache_dir = env::var("PAPER2DATA_COLUMN_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_COLUMN_CACHE_DIR));
        Ok(Self {
            columns_endpoint,
            table_endpoint,
            ocr_endpoint,
            ocr_api_key,
            ocr_cache_dir,
            column_cache_dir,
        })
    }

    pub fn require_table_endpoint(&self) -> Result<&str> {
        self.table_endpoint
            .as_deref()
            .ok_or_else(|| anyhow!("PAPER2DATA_TABLE_ENDPOINT is not set"))
    }
}

fn require_env(var: &str) -> Result<String> {
    let value = env::var(var).map_err(|_| anyhow!(format!("{var} is not set")))?;
    if value.trim().is_empty() {
        return Err(anyhow!(format!("{var} is empty")));
    }
    Ok(value)
}

fn optional_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}
