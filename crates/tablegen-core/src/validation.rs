use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::{BeanDef, TableMode, TypeDef, TypeGraph};
use crate::types::FieldType;

/// Validate internal consistency of a type graph.
///
/// This checks:
/// - bean parents exist, are beans, and form no cycle
/// - field type expressions only name declared enums or beans
/// - map keys are primitives or enums
/// - table value types are beans and index fields exist on them
/// - `map` tables declare an index
///
/// Duplicate names are rejected while the graph is indexed.
pub fn validate_graph(graph: &TypeGraph) -> Result<()> {
    for def in graph.types() {
        if let TypeDef::Bean(bean) = def {
            validate_parent_chain(graph, bean)?;
        }
    }

    for def in graph.types() {
        match def {
            TypeDef::Enum(enum_def) => {
                let mut names = BTreeSet::new();
                for item in &enum_def.items {
                    if !names.insert(item.name.as_str()) {
                        return Err(Error::InvalidSchema(format!(
                            "duplicate enum item: {}.{}",
                            enum_def.full_name(),
                            item.name
                        )));
                    }
                }
            }
            TypeDef::Bean(bean) => validate_bean_fields(graph, bean)?,
            TypeDef::Table(table) => {
                let value = graph.bean(&table.value_type).ok_or_else(|| {
                    Error::InvalidSchema(format!(
                        "table {} value type is not a bean: {}",
                        table.full_name(),
                        table.value_type
                    ))
                })?;

                match (&table.index, table.mode) {
                    (None, TableMode::Map) => {
                        return Err(Error::InvalidSchema(format!(
                            "map table {} requires an index field",
                            table.full_name()
                        )));
                    }
                    (Some(index), _) => {
                        let found = graph
                            .hierarchy_fields(value)
                            .iter()
                            .any(|(_, field)| &field.name == index);
                        if !found {
                            return Err(Error::InvalidSchema(format!(
                                "index field not found: {}.{}",
                                value.full_name(),
                                index
                            )));
                        }
                    }
                    (None, _) => {}
                }
            }
        }
    }

    Ok(())
}

fn validate_parent_chain(graph: &TypeGraph, bean: &BeanDef) -> Result<()> {
    let mut seen = BTreeSet::new();
    seen.insert(bean.full_name());
    let mut current = bean;

    while let Some(parent_name) = current.parent.as_deref() {
        let parent = graph.bean(parent_name).ok_or_else(|| {
            Error::InvalidSchema(format!(
                "parent of {} is not a declared bean: {}",
                bean.full_name(),
                parent_name
            ))
        })?;
        if !seen.insert(parent.full_name()) {
            return Err(Error::InvalidSchema(format!(
                "cyclic bean inheritance involving {}",
                bean.full_name()
            )));
        }
        current = parent;
    }

    Ok(())
}

fn validate_bean_fields(graph: &TypeGraph, bean: &BeanDef) -> Result<()> {
    let mut names = BTreeSet::new();
    for (owner, field) in graph.hierarchy_fields(bean) {
        if !names.insert(field.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate field name: {}.{}",
                bean.full_name(),
                field.name
            )));
        }

        let mut missing = None;
        field.field_type.for_each_named(&mut |name| {
            let resolved = graph.field_ref(owner, name);
            if !matches!(resolved, Some(TypeDef::Enum(_) | TypeDef::Bean(_))) && missing.is_none() {
                missing = Some(name.to_string());
            }
        });
        if let Some(name) = missing {
            return Err(Error::UnknownType(format!(
                "{name} (field {}.{})",
                bean.full_name(),
                field.name
            )));
        }

        if let FieldType::Map(key, _) = field.field_type.non_null()
            && let FieldType::Named(name) = key.as_ref()
            && !matches!(graph.field_ref(owner, name), Some(TypeDef::Enum(_)))
        {
            return Err(Error::InvalidSchema(format!(
                "map key of {}.{} must be a primitive or enum",
                bean.full_name(),
                field.name
            )));
        }
    }

    Ok(())
}
