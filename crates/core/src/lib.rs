mod cache;
mod error;
mod fingerprint;
mod ocr;
mod schema;
mod table;

pub use cache::JsonCache;
pub use error::{Result, TableError};
pub use fingerprint::Fingerprint;
pub use ocr::{OcrPage, OcrResult};
pub use schema::{reconcile, ColumnSchema};
pub use table::{normalize_markdown_table, Cell, NormalizeReport, Table, MISSING_SENTINEL};
