use serde::Serialize;
use serde_json::Value;

use tablegen_core::{TableDef, TableMode};

use crate::context::GenerationContext;
use crate::errors::CodegenResult;
use crate::options::keys;
use crate::target::CodeTarget;

/// Exports table data as JSON, one file per table plus an index.
#[derive(Debug, Default)]
pub struct JsonDataTarget;

#[derive(Debug, Serialize)]
struct DataIndex<'a> {
    manager: &'a str,
    tables: Vec<DataIndexEntry>,
}

#[derive(Debug, Serialize)]
struct DataIndexEntry {
    name: String,
    file: String,
    mode: TableMode,
    records: usize,
}

impl JsonDataTarget {
    pub fn new() -> Self {
        Self
    }
}

fn to_pretty(value: &impl Serialize) -> CodegenResult<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

impl CodeTarget for JsonDataTarget {
    fn name(&self) -> &str {
        "json"
    }

    fn file_suffix(&self) -> &str {
        "json"
    }

    fn output_dir_key(&self) -> &str {
        keys::OUTPUT_DATA_DIR
    }

    fn generate_manifest(
        &self,
        ctx: &GenerationContext<'_>,
        export_tables: &[&TableDef],
    ) -> CodegenResult<String> {
        let tables = export_tables
            .iter()
            .map(|table| {
                Ok(DataIndexEntry {
                    name: table.full_name(),
                    file: self.table_file(table),
                    mode: table.mode,
                    records: ctx.export_records(table)?.len(),
                })
            })
            .collect::<CodegenResult<Vec<_>>>()?;

        to_pretty(&DataIndex {
            manager: &ctx.target().manager,
            tables,
        })
    }

    fn generate_one(&self, ctx: &GenerationContext<'_>, table: &TableDef) -> CodegenResult<String> {
        let records = ctx.export_records(table)?;
        let sorted = ctx.sort_by_key(table, &records)?;
        let rows = Value::Array(sorted.iter().map(|record| record.data.to_json()).collect());
        to_pretty(&rows)
    }
}
