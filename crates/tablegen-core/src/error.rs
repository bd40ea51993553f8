use thiserror::Error;

/// Core error type shared across tablegen crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The type graph violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A field type expression could not be parsed.
    #[error("invalid type expression '{expr}': {reason}")]
    InvalidTypeExpr { expr: String, reason: String },
    /// A table was exported under a name already claimed by another kind of type.
    #[error("export name collision: '{name}' is both a {existing} and a {incoming}")]
    NameCollision {
        name: String,
        existing: &'static str,
        incoming: &'static str,
    },
    /// A referenced type is not declared in the graph.
    #[error("unknown type: {0}")]
    UnknownType(String),
}

/// Convenience alias for results returned by tablegen crates.
pub type Result<T> = std::result::Result<T, Error>;
