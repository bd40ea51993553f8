use thiserror::Error;

use tablegen_data::DataError;

/// Errors emitted while preparing a run or generating artifacts.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("missing required option '{0}'")]
    MissingOption(String),
    #[error("invalid option '{0}': expected family.key=value")]
    InvalidOption(String),
    #[error("unknown code target: {0}")]
    UnknownTarget(String),
    #[error("code target already registered: {0}")]
    DuplicateTarget(String),
    #[error("unknown code style: {0}")]
    UnknownCodeStyle(String),
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    /// A generation unit failed; the whole run is aborted.
    #[error("generation unit '{unit}' failed: {source}")]
    UnitFailed {
        unit: String,
        #[source]
        source: Box<CodegenError>,
    },
    #[error("generation unit '{0}' panicked")]
    UnitPanicked(String),
    /// Two artifacts of one target resolved to the same output path.
    #[error("units '{first}' and '{second}' both write '{path}'")]
    DuplicateOutputPath {
        path: String,
        first: String,
        second: String,
    },
    #[error("schema error: {0}")]
    Core(#[from] tablegen_core::Error),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for code generation.
pub type CodegenResult<T> = std::result::Result<T, CodegenError>;
