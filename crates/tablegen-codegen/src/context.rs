use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use tablegen_core::{
    BeanDef, EnumDef, ExportClosure, Record, TableDef, TypeGraph, resolve_export_closure,
    select_export_tables,
};
use tablegen_data::{DataLoader, TableDataStore, load_tables};

use crate::errors::CodegenResult;
use crate::options::{EnvOptions, keys};
use crate::style::CodeStyle;

fn default_manager() -> String {
    "Tables".to_string()
}

/// Output target selected for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    /// Name of the generated manager type that owns every table.
    #[serde(default = "default_manager")]
    pub manager: String,
    #[serde(default)]
    pub top_module: String,
    /// Enabled groups; grouped tables and beans are exported only when one
    /// of their groups is listed.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl TargetConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manager: default_manager(),
            top_module: String::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

/// Tag selection applied to table records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    #[serde(default)]
    pub include_tags: BTreeSet<String>,
    #[serde(default)]
    pub exclude_tags: BTreeSet<String>,
}

/// Everything a generation run reads.
///
/// Built once per target: the export closure is resolved up front and table
/// data is registered before generation starts. Code targets only take
/// shared references, so the context is handed to every generation unit
/// without synchronization.
#[derive(Debug)]
pub struct GenerationContext<'g> {
    graph: &'g TypeGraph,
    target: TargetConfig,
    include_tags: BTreeSet<String>,
    options: EnvOptions,
    export_tables: Vec<&'g TableDef>,
    closure: ExportClosure<'g>,
    store: TableDataStore<'g>,
}

impl<'g> GenerationContext<'g> {
    pub fn new(
        graph: &'g TypeGraph,
        target: TargetConfig,
        tags: TagFilter,
        options: EnvOptions,
    ) -> CodegenResult<Self> {
        let start = Instant::now();
        let enabled_groups: BTreeSet<String> = target.groups.iter().cloned().collect();
        let export_tables = select_export_tables(graph, &enabled_groups);
        let closure = resolve_export_closure(graph, &export_tables, &enabled_groups)?;

        info!(
            code_target = %target.name,
            tables = export_tables.len(),
            types = closure.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "export closure resolved"
        );

        Ok(Self {
            graph,
            target,
            include_tags: tags.include_tags,
            options,
            export_tables,
            closure,
            store: TableDataStore::new(graph, tags.exclude_tags),
        })
    }

    /// Load and register the data of every export table.
    pub fn load_datas(&mut self, loader: &dyn DataLoader) -> CodegenResult<()> {
        load_tables(&mut self.store, self.graph, loader, &self.export_tables)?;
        Ok(())
    }

    /// Register in-memory records for one table.
    pub fn add_data_table(
        &mut self,
        table: &'g TableDef,
        main_records: Vec<Record>,
        patch_records: Vec<Record>,
    ) -> CodegenResult<()> {
        self.store.register(table, main_records, patch_records)?;
        Ok(())
    }

    pub fn graph(&self) -> &'g TypeGraph {
        self.graph
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn options(&self) -> &EnvOptions {
        &self.options
    }

    pub fn include_tags(&self) -> &BTreeSet<String> {
        &self.include_tags
    }

    pub fn exclude_tags(&self) -> &BTreeSet<String> {
        self.store.exclude_tags()
    }

    pub fn export_tables(&self) -> &[&'g TableDef] {
        &self.export_tables
    }

    pub fn closure(&self) -> &ExportClosure<'g> {
        &self.closure
    }

    pub fn store(&self) -> &TableDataStore<'g> {
        &self.store
    }

    pub fn export_beans(&self) -> Vec<&'g BeanDef> {
        self.closure.beans().collect()
    }

    pub fn export_enums(&self) -> Vec<&'g EnumDef> {
        self.closure.enums().collect()
    }

    pub fn all_records(&self, table: &TableDef) -> CodegenResult<&[Record]> {
        Ok(self.store.all_records(table)?)
    }

    pub fn export_records(&self, table: &TableDef) -> CodegenResult<Vec<&Record>> {
        Ok(self.store.export_records(table)?)
    }

    pub fn sort_by_key<'r>(
        &self,
        table: &TableDef,
        records: &[&'r Record],
    ) -> CodegenResult<Vec<&'r Record>> {
        Ok(self.store.sort_by_key(table, records)?)
    }

    /// Code style for `family`: option `<family>.codeStyle`, else `default`.
    pub fn code_style(&self, family: &str, default: &str) -> CodegenResult<CodeStyle> {
        CodeStyle::builtin(
            self.options
                .get_or_default(family, keys::CODE_STYLE, default),
        )
    }

    /// Output directory option for `family`, if configured.
    pub fn output_dir(&self, family: &str, key: &str) -> Option<&str> {
        self.options.try_get(family, key)
    }
}
