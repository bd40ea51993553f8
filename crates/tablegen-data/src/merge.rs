use std::collections::{HashMap, HashSet};

use tablegen_core::{DataValue, Record, TableDef, TableMode};

use crate::errors::{DataError, DataResult};

/// Combine main and patch records into the final record set of a table.
///
/// - `map`: a patch row replaces the main row with the same key in place;
///   rows with new keys are appended in patch order. Keys must be unique
///   within each side.
/// - `list`: patches are rejected.
/// - `one`: a non-empty patch set replaces the main set.
pub fn merge_records(
    table: &TableDef,
    main_records: &[Record],
    patch_records: &[Record],
) -> DataResult<Vec<Record>> {
    match table.mode {
        TableMode::One => {
            if patch_records.is_empty() {
                Ok(main_records.to_vec())
            } else {
                Ok(patch_records.to_vec())
            }
        }
        TableMode::List => {
            if !patch_records.is_empty() {
                return Err(DataError::PatchUnsupported(table.full_name()));
            }
            Ok(main_records.to_vec())
        }
        TableMode::Map => merge_by_key(table, main_records, patch_records),
    }
}

fn merge_by_key(
    table: &TableDef,
    main_records: &[Record],
    patch_records: &[Record],
) -> DataResult<Vec<Record>> {
    let index = table.index.as_deref().ok_or_else(|| {
        DataError::InternalInvariant(format!("map table {} has no index", table.full_name()))
    })?;

    let mut merged: Vec<Record> = Vec::with_capacity(main_records.len() + patch_records.len());
    let mut position_by_key: HashMap<String, usize> = HashMap::new();

    for record in main_records {
        let key = record_key(table, index, record)?;
        if position_by_key.insert(key.clone(), merged.len()).is_some() {
            return Err(DataError::DuplicateKey {
                table: table.full_name(),
                key,
                origin: "main",
            });
        }
        merged.push(record.clone());
    }

    let mut patched: HashSet<String> = HashSet::new();
    for record in patch_records {
        let key = record_key(table, index, record)?;
        if !patched.insert(key.clone()) {
            return Err(DataError::DuplicateKey {
                table: table.full_name(),
                key,
                origin: "patch",
            });
        }
        match position_by_key.get(&key).copied() {
            Some(position) => merged[position] = record.clone(),
            None => {
                position_by_key.insert(key, merged.len());
                merged.push(record.clone());
            }
        }
    }

    Ok(merged)
}

fn record_key(table: &TableDef, index: &str, record: &Record) -> DataResult<String> {
    let value = record.data.get_field(index).ok_or_else(|| DataError::InvalidRecord {
        location: location(table, record),
        message: format!("missing key field '{index}'"),
    })?;
    value_key(value).ok_or_else(|| DataError::InvalidRecord {
        location: location(table, record),
        message: format!("key field '{index}' holds a {} value", value.kind()),
    })
}

fn location(table: &TableDef, record: &Record) -> String {
    record
        .source
        .clone()
        .unwrap_or_else(|| table.full_name())
}

/// Identity of a scalar key value; `None` for composite values.
fn value_key(value: &DataValue) -> Option<String> {
    match value {
        DataValue::Bool(value) => Some(value.to_string()),
        DataValue::Int(value) => Some(value.to_string()),
        DataValue::Long(value) | DataValue::DateTime(value) => Some(value.to_string()),
        DataValue::String(value) => Some(value.clone()),
        DataValue::Enum { value, .. } => Some(value.to_string()),
        DataValue::Null
        | DataValue::Float(_)
        | DataValue::Double(_)
        | DataValue::Bean(_)
        | DataValue::Seq(_)
        | DataValue::Map(_) => None,
    }
}
