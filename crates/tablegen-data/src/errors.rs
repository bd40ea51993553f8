use thiserror::Error;

/// Errors emitted while loading, merging and exporting table data.
#[derive(Debug, Error)]
pub enum DataError {
    /// A singleton table does not export exactly one record.
    #[error("table {table} is a singleton table (mode=one) but exports {count} records")]
    SingletonCardinality { table: String, count: usize },
    /// Data does not match what the type graph guarantees by construction.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
    #[error("table not registered: {0}")]
    TableNotRegistered(String),
    #[error("table {table}: duplicate key {key} in {origin} records")]
    DuplicateKey {
        table: String,
        key: String,
        origin: &'static str,
    },
    #[error("table {0} is a list table and does not accept patch records")]
    PatchUnsupported(String),
    #[error("invalid record at {location}: {message}")]
    InvalidRecord { location: String, message: String },
    #[error("schema error: {0}")]
    Schema(#[from] tablegen_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for data operations.
pub type DataResult<T> = std::result::Result<T, DataError>;
