use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::{BeanDef, EnumDef, TableDef, TypeDef, TypeGraph};

/// A type selected for generation.
#[derive(Debug, Clone, Copy)]
pub enum ExportedType<'g> {
    Enum(&'g EnumDef),
    Bean(&'g BeanDef),
    Table(&'g TableDef),
}

impl<'g> ExportedType<'g> {
    fn from_def(def: &'g TypeDef) -> Self {
        match def {
            TypeDef::Enum(def) => ExportedType::Enum(def),
            TypeDef::Bean(def) => ExportedType::Bean(def),
            TypeDef::Table(def) => ExportedType::Table(def),
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ExportedType::Enum(_) => "enum",
            ExportedType::Bean(_) => "bean",
            ExportedType::Table(_) => "table",
        }
    }
}

/// Minimal set of types that must be generated for a run, keyed by
/// fully-qualified name.
#[derive(Debug, Clone, Default)]
pub struct ExportClosure<'g> {
    types: BTreeMap<String, ExportedType<'g>>,
}

impl<'g> ExportClosure<'g> {
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.types.contains_key(full_name)
    }

    pub fn get(&self, full_name: &str) -> Option<ExportedType<'g>> {
        self.types.get(full_name).copied()
    }

    /// Every exported type, ordered by full name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ExportedType<'g>)> + '_ {
        self.types.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn beans(&self) -> impl Iterator<Item = &'g BeanDef> + '_ {
        self.types.values().filter_map(|ty| match ty {
            ExportedType::Bean(bean) => Some(*bean),
            _ => None,
        })
    }

    pub fn enums(&self) -> impl Iterator<Item = &'g EnumDef> + '_ {
        self.types.values().filter_map(|ty| match ty {
            ExportedType::Enum(def) => Some(*def),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &'g TableDef> + '_ {
        self.types.values().filter_map(|ty| match ty {
            ExportedType::Table(def) => Some(*def),
            _ => None,
        })
    }

    /// Insert `def` and everything reachable from it that is not yet present.
    ///
    /// A name already held by a type of another kind is a collision.
    fn add_reachable(&mut self, graph: &'g TypeGraph, def: &'g TypeDef) -> Result<()> {
        let mut pending = vec![def];
        while let Some(def) = pending.pop() {
            let name = def.full_name();
            if let Some(existing) = self.types.get(&name) {
                if existing.kind_label() != def.kind_label() {
                    return Err(Error::NameCollision {
                        name,
                        existing: existing.kind_label(),
                        incoming: def.kind_label(),
                    });
                }
                continue;
            }
            self.types.insert(name, ExportedType::from_def(def));
            graph.visit_refs(def, |referenced| {
                if !matches!(referenced, TypeDef::Table(_)) {
                    pending.push(referenced);
                }
            });
        }
        Ok(())
    }

    fn add_table(&mut self, graph: &'g TypeGraph, table: &'g TableDef) -> Result<()> {
        let name = table.full_name();
        if let Some(existing) = self.types.get(&name)
            && !matches!(existing, ExportedType::Table(_))
        {
            return Err(Error::NameCollision {
                name,
                existing: existing.kind_label(),
                incoming: "table",
            });
        }
        self.types.insert(name, ExportedType::Table(table));

        let value = graph
            .get(&table.value_type)
            .ok_or_else(|| Error::UnknownType(table.value_type.clone()))?;
        self.add_reachable(graph, value)
    }
}

/// Whether any of `groups` is enabled.
pub fn groups_intersect(groups: &[String], enabled_groups: &BTreeSet<String>) -> bool {
    groups.iter().any(|group| enabled_groups.contains(group))
}

/// Tables a target exports: ungrouped tables always, grouped tables when one
/// of their groups is enabled. Declaration order is preserved.
pub fn select_export_tables<'g>(
    graph: &'g TypeGraph,
    enabled_groups: &BTreeSet<String>,
) -> Vec<&'g TableDef> {
    graph
        .tables()
        .filter(|table| table.groups.is_empty() || groups_intersect(&table.groups, enabled_groups))
        .collect()
}

/// Compute the export closure for a run.
///
/// Roots are every enum, every bean whose groups intersect
/// `enabled_groups`, and every table in `export_tables`; the closure adds
/// everything transitively referenced from a root bean or a table's value
/// type. Reference cycles terminate on the visited check.
pub fn resolve_export_closure<'g>(
    graph: &'g TypeGraph,
    export_tables: &[&'g TableDef],
    enabled_groups: &BTreeSet<String>,
) -> Result<ExportClosure<'g>> {
    let mut closure = ExportClosure::default();

    for def in graph.types() {
        if closure.contains(&def.full_name()) {
            continue;
        }
        match def {
            TypeDef::Bean(bean) if groups_intersect(&bean.groups, enabled_groups) => {
                closure.add_reachable(graph, def)?;
            }
            TypeDef::Enum(_) => closure.add_reachable(graph, def)?,
            TypeDef::Bean(_) | TypeDef::Table(_) => {}
        }
    }

    for table in export_tables {
        closure.add_table(graph, table)?;
    }

    Ok(closure)
}
