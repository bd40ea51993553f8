//! Core contracts for tablegen.
//!
//! This crate defines the type graph (enums, beans, tables), structured data
//! values, graph validation, and the export closure resolver shared by the
//! data pipeline, the code generators and the CLI.

pub mod error;
pub mod graph;
pub mod schema;
pub mod types;
pub mod validation;
pub mod value;

pub use error::{Error, Result};
pub use graph::{
    ExportClosure, ExportedType, groups_intersect, resolve_export_closure, select_export_tables,
};
pub use schema::{
    BeanDef, EnumDef, EnumItem, FieldDef, TableDef, TableMode, TypeDef, TypeGraph,
    TypeGraphDocument, full_name,
};
pub use types::FieldType;
pub use validation::validate_graph;
pub use value::{BeanValue, DataValue, Record};

/// Current contract version for type graph documents.
pub const SCHEMA_VERSION: &str = "0.1";
