use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("column inference returned no columns")]
    EmptySchema,
    #[error("column headers do not match between existing data and new data (existing: [{existing}], new: [{fresh}])")]
    SchemaMismatch { existing: String, fresh: String },
}

pub type Result<T> = std::result::Result<T, TableError>;
