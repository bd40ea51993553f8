use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info};

use tablegen_core::{Record, TableDef, TypeGraph};

use crate::convert::record_from_json;
use crate::errors::{DataError, DataResult};
use crate::store::TableDataStore;

/// Raw rows of one table, before merging.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub main: Vec<Record>,
    pub patch: Vec<Record>,
}

/// Source of table rows.
pub trait DataLoader: Sync {
    fn load(&self, graph: &TypeGraph, table: &TableDef) -> DataResult<LoadedTable>;
}

/// Reads `<input_dir>/<input>.json` (a JSON array of row objects) and, when
/// configured, the same file name under a patch directory.
#[derive(Debug, Clone)]
pub struct JsonDirLoader {
    input_dir: PathBuf,
    patch_dir: Option<PathBuf>,
}

impl JsonDirLoader {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            patch_dir: None,
        }
    }

    pub fn with_patch_dir(mut self, patch_dir: impl Into<PathBuf>) -> Self {
        self.patch_dir = Some(patch_dir.into());
        self
    }

    fn read_rows(graph: &TypeGraph, table: &TableDef, path: &Path) -> DataResult<Vec<Record>> {
        let contents = fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&contents)?;
        let rows = document.as_array().ok_or_else(|| DataError::InvalidRecord {
            location: path.display().to_string(),
            message: "expected a JSON array of rows".to_string(),
        })?;

        rows.iter()
            .enumerate()
            .map(|(idx, row)| {
                let location = format!("{}[{idx}]", path.display());
                record_from_json(graph, table, row, &location)
            })
            .collect()
    }
}

impl DataLoader for JsonDirLoader {
    fn load(&self, graph: &TypeGraph, table: &TableDef) -> DataResult<LoadedTable> {
        let file_name = format!("{}.json", table.input_name());
        let main = Self::read_rows(graph, table, &self.input_dir.join(&file_name))?;

        let patch = match &self.patch_dir {
            Some(dir) => {
                let path = dir.join(&file_name);
                if path.is_file() {
                    Self::read_rows(graph, table, &path)?
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        };

        debug!(
            table = %table.full_name(),
            main = main.len(),
            patch = patch.len(),
            "table rows loaded"
        );
        Ok(LoadedTable { main, patch })
    }
}

/// Load every table concurrently, then register the results in `tables`
/// order. The first failing table aborts the whole load.
pub fn load_tables<'g>(
    store: &mut TableDataStore<'g>,
    graph: &'g TypeGraph,
    loader: &dyn DataLoader,
    tables: &[&'g TableDef],
) -> DataResult<()> {
    let start = Instant::now();
    info!(tables = tables.len(), "load data begin");

    let results: Vec<DataResult<LoadedTable>> = std::thread::scope(|scope| {
        let workers: Vec<_> = tables
            .iter()
            .map(|table| scope.spawn(move || loader.load(graph, table)))
            .collect();
        workers
            .into_iter()
            .zip(tables)
            .map(|(worker, table)| {
                worker.join().unwrap_or_else(|_| {
                    Err(DataError::InternalInvariant(format!(
                        "loader panicked on table {}",
                        table.full_name()
                    )))
                })
            })
            .collect()
    });

    for (table, result) in tables.iter().copied().zip(results) {
        let loaded = result?;
        store.register(table, loaded.main, loaded.patch)?;
    }

    info!(
        tables = tables.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "load data end"
    );
    Ok(())
}
