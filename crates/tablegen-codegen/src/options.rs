use std::collections::BTreeMap;

use crate::errors::{CodegenError, CodegenResult};

/// Well-known option keys.
pub mod keys {
    pub const OUTPUT_CODE_DIR: &str = "outputCodeDir";
    pub const OUTPUT_DATA_DIR: &str = "outputDataDir";
    pub const CODE_STYLE: &str = "codeStyle";
}

/// Flat `family.key = value` option store.
///
/// Lookups for `(family, key)` try `family.key` first and fall back to the
/// global `key`, so a single default can be overridden per target.
#[derive(Debug, Clone, Default)]
pub struct EnvOptions {
    values: BTreeMap<String, String>,
}

impl EnvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Parse and store a `family.key=value` (or `key=value`) assignment.
    pub fn set_assignment(&mut self, assignment: &str) -> CodegenResult<()> {
        let (name, value) = assignment
            .split_once('=')
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| CodegenError::InvalidOption(assignment.to_string()))?;
        self.set(name, value);
        Ok(())
    }

    pub fn try_get(&self, family: &str, key: &str) -> Option<&str> {
        if !family.is_empty()
            && let Some(value) = self.values.get(&format!("{family}.{key}"))
        {
            return Some(value);
        }
        self.values.get(key).map(String::as_str)
    }

    /// Look up an option, failing when it is required and absent.
    pub fn get(&self, family: &str, key: &str, required: bool) -> CodegenResult<Option<&str>> {
        match self.try_get(family, key) {
            Some(value) => Ok(Some(value)),
            None if required => Err(CodegenError::MissingOption(if family.is_empty() {
                key.to_string()
            } else {
                format!("{family}.{key}")
            })),
            None => Ok(None),
        }
    }

    pub fn get_or_default<'a>(&'a self, family: &str, key: &str, default: &'a str) -> &'a str {
        self.try_get(family, key).unwrap_or(default)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = EnvOptions::new();
        for (name, value) in iter {
            options.set(name, value);
        }
        options
    }
}
