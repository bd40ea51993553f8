//! Code targets and their registry.

mod json_data;
mod rust_json;

use std::collections::BTreeMap;

use heck::ToSnakeCase;

use tablegen_core::TableDef;

use crate::context::GenerationContext;
use crate::errors::{CodegenError, CodegenResult};
use crate::options::keys;

pub use json_data::JsonDataTarget;
pub use rust_json::RustJsonTarget;

/// One output language or format.
///
/// A target produces one manifest artifact plus one artifact per export
/// table. Each call only reads the context and may run on any thread.
pub trait CodeTarget: Send + Sync {
    /// Registry key, also the option family of the target.
    fn name(&self) -> &str;

    /// Text prepended to every artifact.
    fn file_header(&self) -> &str {
        ""
    }

    fn file_suffix(&self) -> &str;

    /// Output path of the artifact for a fully-qualified type name.
    fn file_name(&self, full_name: &str) -> String {
        format!("{}.{}", file_stem(full_name), self.file_suffix())
    }

    /// Option key naming the directory this target writes into.
    fn output_dir_key(&self) -> &str {
        keys::OUTPUT_CODE_DIR
    }

    fn generate_manifest(
        &self,
        ctx: &GenerationContext<'_>,
        export_tables: &[&TableDef],
    ) -> CodegenResult<String>;

    fn generate_one(&self, ctx: &GenerationContext<'_>, table: &TableDef) -> CodegenResult<String>;

    fn manifest_file(&self, ctx: &GenerationContext<'_>) -> String {
        self.file_name(&ctx.target().manager)
    }

    fn table_file(&self, table: &TableDef) -> String {
        self.file_name(&table.full_name())
    }
}

/// Relative path without suffix: one snake case directory per namespace
/// segment, so `item.TbItem` and `itemTb.Item` stay apart.
pub fn file_stem(full_name: &str) -> String {
    full_name
        .split('.')
        .map(|segment| segment.to_snake_case())
        .collect::<Vec<_>>()
        .join("/")
}

/// Named code targets available to a run.
#[derive(Default)]
pub struct TargetRegistry {
    targets: BTreeMap<String, Box<dyn CodeTarget>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every shipped target.
    pub fn with_builtin() -> CodegenResult<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(RustJsonTarget::new()?))?;
        registry.register(Box::new(JsonDataTarget::new()))?;
        Ok(registry)
    }

    pub fn register(&mut self, target: Box<dyn CodeTarget>) -> CodegenResult<()> {
        let name = target.name().to_string();
        if self.targets.contains_key(&name) {
            return Err(CodegenError::DuplicateTarget(name));
        }
        self.targets.insert(name, target);
        Ok(())
    }

    pub fn get(&self, name: &str) -> CodegenResult<&dyn CodeTarget> {
        self.targets
            .get(name)
            .map(|target| target.as_ref())
            .ok_or_else(|| CodegenError::UnknownTarget(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("targets", &self.targets.keys().collect::<Vec<_>>())
            .finish()
    }
}
