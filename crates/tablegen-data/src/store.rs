use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use tablegen_core::{DataValue, FieldType, Record, TableDef, TypeGraph};

use crate::errors::{DataError, DataResult};
use crate::merge::merge_records;

/// Main, patch and merged records of one table.
#[derive(Debug, Clone)]
pub struct TableDataInfo<'g> {
    pub table: &'g TableDef,
    pub main_records: Vec<Record>,
    pub patch_records: Vec<Record>,
    pub final_records: Vec<Record>,
}

/// Per-run table data, keyed by table full name.
///
/// Filled once after the export closure is resolved and only read while
/// generating, so generation units can share it without locking.
#[derive(Debug, Clone)]
pub struct TableDataStore<'g> {
    graph: &'g TypeGraph,
    exclude_tags: BTreeSet<String>,
    tables: BTreeMap<String, TableDataInfo<'g>>,
}

impl<'g> TableDataStore<'g> {
    pub fn new(graph: &'g TypeGraph, exclude_tags: BTreeSet<String>) -> Self {
        Self {
            graph,
            exclude_tags,
            tables: BTreeMap::new(),
        }
    }

    pub fn exclude_tags(&self) -> &BTreeSet<String> {
        &self.exclude_tags
    }

    /// Store the records of `table`, replacing any earlier registration.
    pub fn register(
        &mut self,
        table: &'g TableDef,
        main_records: Vec<Record>,
        patch_records: Vec<Record>,
    ) -> DataResult<()> {
        let final_records = merge_records(table, &main_records, &patch_records)?;
        let name = table.full_name();
        debug!(
            table = %name,
            main = main_records.len(),
            patch = patch_records.len(),
            merged = final_records.len(),
            "table data registered"
        );
        self.tables.insert(
            name,
            TableDataInfo {
                table,
                main_records,
                patch_records,
                final_records,
            },
        );
        Ok(())
    }

    pub fn is_registered(&self, table: &TableDef) -> bool {
        self.tables.contains_key(&table.full_name())
    }

    pub fn table_info(&self, table: &TableDef) -> DataResult<&TableDataInfo<'g>> {
        let name = table.full_name();
        self.tables
            .get(&name)
            .ok_or(DataError::TableNotRegistered(name))
    }

    /// Merged records, ignoring exclusion tags.
    pub fn all_records(&self, table: &TableDef) -> DataResult<&[Record]> {
        Ok(&self.table_info(table)?.final_records)
    }

    /// Merged records minus those carrying an excluded tag.
    ///
    /// Singleton tables must export exactly one record.
    pub fn export_records(&self, table: &TableDef) -> DataResult<Vec<&Record>> {
        let info = self.table_info(table)?;
        let records: Vec<&Record> = if self.exclude_tags.is_empty() {
            info.final_records.iter().collect()
        } else {
            info.final_records
                .iter()
                .filter(|record| record.is_not_filtered(&self.exclude_tags))
                .collect()
        };

        if table.is_singleton() && records.len() != 1 {
            return Err(DataError::SingletonCardinality {
                table: table.full_name(),
                count: records.len(),
            });
        }
        Ok(records)
    }

    /// Order records ascending by an `int`/`long` key field.
    ///
    /// Tables without such a key keep the merge order. The sort is stable,
    /// so sorting an already sorted sequence is a no-op.
    pub fn sort_by_key<'r>(
        &self,
        table: &TableDef,
        records: &[&'r Record],
    ) -> DataResult<Vec<&'r Record>> {
        let Some((_, key_field)) = self.graph.key_field(table) else {
            return Ok(records.to_vec());
        };
        if !key_field.field_type.is_integer_key() {
            return Ok(records.to_vec());
        }

        let mut keyed = records
            .iter()
            .map(|record| {
                sort_key(table, &key_field.field_type, &key_field.name, record)
                    .map(|key| (key, *record))
            })
            .collect::<DataResult<Vec<_>>>()?;
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Int(i32),
    Long(i64),
}

fn sort_key(
    table: &TableDef,
    declared: &FieldType,
    field: &str,
    record: &Record,
) -> DataResult<SortKey> {
    match (declared, record.data.get_field(field)) {
        (FieldType::Int, Some(DataValue::Int(value))) => Ok(SortKey::Int(*value)),
        (FieldType::Long, Some(DataValue::Long(value))) => Ok(SortKey::Long(*value)),
        (declared, found) => Err(DataError::InternalInvariant(format!(
            "table {} key '{}' declared {} but record holds {}",
            table.full_name(),
            field,
            declared,
            found.map(DataValue::kind).unwrap_or("nothing")
        ))),
    }
}
