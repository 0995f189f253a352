use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use paper2data_core::{
    normalize_markdown_table, reconcile, ColumnSchema, Fingerprint, JsonCache, OcrResult, Table,
    TableError,
};
use paper2data_llm::InferenceClient;

use crate::config::Paper2DataConfig;
use crate::dataset;
use crate::logging::{self, Stage};
use crate::ocr_client::OcrClient;

/// Raw column-inference response, persisted verbatim in the response cache
/// so a later run decodes exactly what the model once said.
#[derive(Debug, Serialize, Deserialize)]
struct ColumnsResponse {
    column_names: String,
}

/// The two cache namespaces: file-content fingerprints map to OCR results,
/// reference-text fingerprints map to raw column-inference responses. They
/// stay in separate directories because the key domains are unrelated.
pub struct Caches {
    pub ocr: JsonCache,
    pub columns: JsonCache,
}

impl Caches {
    pub fn open(config: &Paper2DataConfig) -> Result<Self> {
        Ok(Self {
            ocr: JsonCache::open(&config.ocr_cache_dir)?,
            columns: JsonCache::open(&config.column_cache_dir)?,
        })
    }
}

/// One batch: a reference document defining the table structure, the user
/// documents to extract rows from, and the columns of a pre-loaded dataset
/// when one was supplied (those take precedence over inference).
pub struct BatchInputs {
    pub reference: PathBuf,
    pub users: Vec<PathBuf>,
    pub existing_columns: Option<ColumnSchema>,
}

/// Runs one full batch and exports the reconciled result.
pub fn run(
    reference: PathBuf,
    users: Vec<PathBuf>,
    existing: Option<PathBuf>,
    output: PathBuf,
) -> Result<()> {
    let config = Paper2DataConfig::from_env()?;
    let caches = Caches::open(&config)?;
    let ocr = OcrClient::new(config.ocr_endpoint.clone(), config.ocr_api_key.clone());
    let inference = InferenceClient::new(
        config.columns_endpoint.clone(),
        config.require_table_endpoint()?.to_string(),
    );
    let existing_table = match &existing {
        Some(path) => {
            let table = dataset::load_existing(path)?;
            logging::stage(
                Stage::Dataset,
                format!(
                    "loaded existing dataset {} ({} columns, {} rows)",
                    path.display(),
                    table.columns.len(),
                    table.row_count()
                ),
            );
            Some(table)
        }
        None => None,
    };
    let inputs = BatchInputs {
        reference,
        users,
        existing_columns: existing_table
            .as_ref()
            .map(|table| ColumnSchema::new(table.columns.clone())),
    };
    let (_, tables) = process_batch(
        &inputs,
        &caches,
        |path| ocr.recognize(path),
        |text| inference.infer_columns_blocking(text),
        |text, columns| inference.extract_table_blocking(text, columns),
        |done, total| {
            logging::stage(Stage::Progress, format!("{done}/{total} documents processed"))
        },
    )?;
    if tables.is_empty() {
        return Err(anyhow!("no tables were extracted from the user documents"));
    }
    let fresh = Table::concat(&tables);
    let final_table = reconcile(existing_table, fresh)?;
    dataset::export(&final_table, &output)?;
    logging::info(format!(
        "results saved to {} ({} rows)",
        output.display(),
        final_table.row_count()
    ));
    Ok(())
}

/// Infers and prints the column schema for a reference document, without
/// touching any user documents.
pub fn run_columns(reference: PathBuf) -> Result<()> {
    let config = Paper2DataConfig::from_env()?;
    let caches = Caches::open(&config)?;
    let ocr = OcrClient::new(config.ocr_endpoint.clone(), config.ocr_api_key.clone());
    let inference = InferenceClient::columns_only(config.columns_endpoint.clone());
    let result = cache_or_fetch_ocr(&caches.ocr, &reference, &|path| ocr.recognize(path))?;
    let schema = infer_columns(&result.joined_text(), &caches.columns, &|text| {
        inference.infer_columns_blocking(text)
    })?;
    println!("{schema}");
    Ok(())
}

/// The batch driver. Collaborator calls are injected so the orchestration
/// is testable without the network: `ocr_fn` performs uncached OCR,
/// `columns_fn` asks for column names, `extract_fn` asks for a table.
/// Progress is reported as (documents completed, total) after the
/// reference and after every user document; the reference counts as one
/// unit. Processing is strictly sequential in selection order.
///
/// Fatal: no user documents, reference OCR failure, empty schema. A user
/// document that fails OCR or extraction, or normalizes to an empty table,
/// is logged and skipped.
pub fn process_batch<FOcr, FColumns, FExtract, FProgress>(
    inputs: &BatchInputs,
    caches: &Caches,
    ocr_fn: FOcr,
    columns_fn: FColumns,
    extract_fn: FExtract,
    mut progress: FProgress,
) -> Result<(ColumnSchema, Vec<Table>)>
where
    FOcr: Fn(&Path) -> Result<OcrResult>,
    FColumns: Fn(&str) -> Result<String>,
    FExtract: Fn(&str, &[String]) -> Result<String>,
    FProgress: FnMut(usize, usize),
{
    if inputs.users.is_empty() {
        return Err(TableError::InvalidInput("no user documents selected").into());
    }
    let total = inputs.users.len() + 1;

    let reference_ocr = cache_or_fetch_ocr(&caches.ocr, &inputs.reference, &ocr_fn)
        .with_context(|| format!("failed to read reference document {}", label(&inputs.reference)))?;
    let reference_text = reference_ocr.joined_text();
    if reference_text.is_empty() {
        logging::stage(
            Stage::Ocr,
            format!("reference {} produced no text", label(&inputs.reference)),
        );
    }

    let schema = match &inputs.existing_columns {
        Some(columns) => {
            logging::stage(Stage::Columns, "existing dataset used for table structure");
            columns.clone()
        }
        None => infer_columns(&reference_text, &caches.columns, &columns_fn)?,
    };
    if schema.is_empty() {
        return Err(TableError::EmptySchema.into());
    }
    logging::stage(
        Stage::Columns,
        format!("table structure ({} columns): {schema}", schema.len()),
    );
    progress(1, total);

    let mut tables = Vec::new();
    for (idx, user) in inputs.users.iter().enumerate() {
        let name = label(user);
        match extract_document(caches, user, schema.names(), &ocr_fn, &extract_fn) {
            Ok(Some(table)) => {
                logging::stage(
                    Stage::Extract,
                    format!("{name}: extracted {} row(s)", table.row_count()),
                );
                tables.push(table);
            }
            Ok(None) => {
                logging::stage(Stage::Extract, format!("{name}: empty table, skipping"));
            }
            Err(err) => {
                logging::stage(Stage::Extract, format!("skipping {name}: {err:#}"));
            }
        }
        progress(idx + 2, total);
    }
    Ok((schema, tables))
}

/// Column inference with its response cache: a hit decodes the stored raw
/// response; a miss calls the collaborator and persists the raw text before
/// parsing. Any failure here is batch-fatal, there is no table to build
/// without columns.
pub fn infer_columns(
    text: &str,
    cache: &JsonCache,
    invoke: &impl Fn(&str) -> Result<String>,
) -> Result<ColumnSchema> {
    let key = Fingerprint::of_text(text);
    if let Some(cached) = cache.get::<ColumnsResponse>(&key)? {
        logging::stage(Stage::Columns, "column inference response found in cache");
        let schema = ColumnSchema::parse_csv(&cached.column_names);
        if schema.is_empty() {
            return Err(TableError::EmptySchema.into());
        }
        return Ok(schema);
    }
    let raw = invoke(text).context("column inference failed")?;
    let schema = ColumnSchema::parse_csv(&raw);
    if schema.is_empty() {
        return Err(TableError::EmptySchema.into());
    }
    if let Err(err) = cache.put(&key, &ColumnsResponse { column_names: raw }) {
        logging::stage(Stage::Cache, format!("failed to persist column response: {err}"));
    }
    Ok(schema)
}

/// Cache-or-fetch for one document's OCR result. The lookup never triggers
/// the collaborator; on a miss the full result is persisted before use. A
/// failed write loses only the cache entry, the in-memory result stays
/// valid.
fn cache_or_fetch_ocr(
    cache: &JsonCache,
    path: &Path,
    ocr_fn: &impl Fn(&Path) -> Result<OcrResult>,
) -> Result<OcrResult> {
    let name = label(path);
    let key = Fingerprint::of_file(path)?;
    if let Some(result) = cache.get::<OcrResult>(&key)? {
        logging::stage(Stage::Cache, format!("OCR result found in cache for {name}"));
        return Ok(result);
    }
    logging::stage(Stage::Cache, format!("no cached OCR result for {name}"));
    let result = ocr_fn(path)?;
    if let Err(err) = cache.put(&key, &result) {
        logging::stage(Stage::Cache, format!("failed to persist OCR result for {name}: {err}"));
    }
    Ok(result)
}

fn extract_document(
    caches: &Caches,
    path: &Path,
    columns: &[String],
    ocr_fn: &impl Fn(&Path) -> Result<OcrResult>,
    extract_fn: &impl Fn(&str, &[String]) -> Result<String>,
) -> Result<Option<Table>> {
    let name = label(path);
    let ocr = cache_or_fetch_ocr(&caches.ocr, path, ocr_fn)?;
    let text = ocr.joined_text();
    if text.is_empty() {
        logging::verbose(Stage::Extract, format!("{name} produced no OCR text"));
    }
    let raw = extract_fn(&text, columns)?;
    logging::verbose(Stage::Extract, format!("{name} model output:\n{raw}"));
    let (table, report) = normalize_markdown_table(&raw);
    if report.truncated_rows > 0 {
        logging::stage(
            Stage::Normalize,
            format!(
                "{name}: dropped trailing cells from {} row(s) wider than the header",
                report.truncated_rows
            ),
        );
    }
    if report.padded_rows > 0 || report.skipped_rows > 0 {
        logging::verbose(
            Stage::Normalize,
            format!(
                "{name}: padded {} row(s), skipped {} row(s)",
                report.padded_rows, report.skipped_rows
            ),
        );
    }
    if table.is_empty() {
        return Ok(None);
    }
    Ok(Some(table))
}

fn label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
