//! Table data pipeline for tablegen.
//!
//! Loads rows per table, merges main and patch records, and exposes the
//! filtered, validated and key-ordered views that code targets consume.

pub mod convert;
pub mod errors;
pub mod loader;
pub mod merge;
pub mod store;

pub use convert::{TAGS_KEY, TYPE_KEY, record_from_json};
pub use errors::{DataError, DataResult};
pub use loader::{DataLoader, JsonDirLoader, LoadedTable, load_tables};
pub use merge::merge_records;
pub use store::{TableDataInfo, TableDataStore};
