use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use tablegen_codegen::{TagFilter, TargetConfig};

pub const DEFAULT_CONFIG_FILE: &str = "tablegen.toml";

/// Contents of `tablegen.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablegenConfig {
    /// Type graph document (JSON).
    pub schema: Option<PathBuf>,
    pub target: TargetSection,
    pub data: DataSection,
    /// `family.key = value` generator options.
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSection {
    pub name: String,
    pub manager: String,
    pub top_module: String,
    pub groups: Vec<String>,
    pub code_targets: Vec<String>,
}

impl Default for TargetSection {
    fn default() -> Self {
        let target = TargetConfig::new("default");
        Self {
            name: target.name,
            manager: target.manager,
            top_module: target.top_module,
            groups: target.groups,
            code_targets: Vec::new(),
        }
    }
}

impl TargetSection {
    pub fn target_config(&self) -> TargetConfig {
        TargetConfig {
            name: self.name.clone(),
            manager: self.manager.clone(),
            top_module: self.top_module.clone(),
            groups: self.groups.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub input_dir: Option<PathBuf>,
    pub patch_dir: Option<PathBuf>,
    pub include_tags: BTreeSet<String>,
    pub exclude_tags: BTreeSet<String>,
}

impl DataSection {
    pub fn tag_filter(&self) -> TagFilter {
        TagFilter {
            include_tags: self.include_tags.clone(),
            exclude_tags: self.exclude_tags.clone(),
        }
    }
}

pub fn parse_config(content: &str) -> Result<TablegenConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load `path`; a missing file yields the defaults unless `required`.
pub fn load_config(path: &Path, required: bool) -> Result<TablegenConfig, crate::CliError> {
    if !required && !path.exists() {
        return Ok(TablegenConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_config(&content)?)
}
