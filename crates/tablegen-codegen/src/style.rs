use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use serde::Serialize;

use crate::errors::{CodegenError, CodegenResult};

/// Identifier casing applied by a code style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingConvention {
    /// Keep the declared spelling.
    None,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
}

impl NamingConvention {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "none" => Some(NamingConvention::None),
            "pascal" => Some(NamingConvention::Pascal),
            "camel" => Some(NamingConvention::Camel),
            "snake" => Some(NamingConvention::Snake),
            "screaming-snake" => Some(NamingConvention::ScreamingSnake),
            _ => None,
        }
    }

    pub fn apply(self, name: &str) -> String {
        match self {
            NamingConvention::None => name.to_string(),
            NamingConvention::Pascal => name.to_upper_camel_case(),
            NamingConvention::Camel => name.to_lower_camel_case(),
            NamingConvention::Snake => name.to_snake_case(),
            NamingConvention::ScreamingSnake => name.to_shouty_snake_case(),
        }
    }
}

/// Naming conventions a target applies to each identifier category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeStyle {
    pub name: String,
    pub namespace: NamingConvention,
    pub type_name: NamingConvention,
    pub method: NamingConvention,
    pub property: NamingConvention,
    pub field: NamingConvention,
    pub enum_item: NamingConvention,
}

impl CodeStyle {
    fn new(name: &str, conventions: [NamingConvention; 6]) -> Self {
        let [namespace, type_name, method, property, field, enum_item] = conventions;
        Self {
            name: name.to_string(),
            namespace,
            type_name,
            method,
            property,
            field,
            enum_item,
        }
    }

    pub fn none() -> Self {
        Self::new("none", [NamingConvention::None; 6])
    }

    pub fn csharp_default() -> Self {
        use NamingConvention::*;
        Self::new("csharp-default", [Pascal, Pascal, Pascal, Pascal, Camel, None])
    }

    pub fn java_default() -> Self {
        use NamingConvention::*;
        Self::new("java-default", [None, Pascal, Camel, Camel, Camel, None])
    }

    pub fn rust_default() -> Self {
        use NamingConvention::*;
        Self::new("rust-default", [Snake, Pascal, Snake, Snake, Snake, Pascal])
    }

    /// Look up a built-in style by name.
    pub fn builtin(name: &str) -> CodegenResult<Self> {
        match name {
            "none" => Ok(Self::none()),
            "csharp-default" => Ok(Self::csharp_default()),
            "java-default" => Ok(Self::java_default()),
            "rust-default" => Ok(Self::rust_default()),
            other => Err(CodegenError::UnknownCodeStyle(other.to_string())),
        }
    }

    /// Format a dotted namespace segment by segment.
    pub fn format_namespace(&self, namespace: &str, separator: &str) -> String {
        namespace
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| self.namespace.apply(part))
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn format_type(&self, name: &str) -> String {
        self.type_name.apply(name)
    }

    pub fn format_method(&self, name: &str) -> String {
        self.method.apply(name)
    }

    pub fn format_property(&self, name: &str) -> String {
        self.property.apply(name)
    }

    pub fn format_field(&self, name: &str) -> String {
        self.field.apply(name)
    }

    pub fn format_enum_item(&self, name: &str) -> String {
        self.enum_item.apply(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_default_formats_identifiers() {
        let style = CodeStyle::rust_default();
        assert_eq!(style.format_type("item_reward"), "ItemReward");
        assert_eq!(style.format_field("itemId"), "item_id");
        assert_eq!(style.format_enum_item("GOLD_BAR"), "GoldBar");
        assert_eq!(style.format_namespace("Game.ItemSystem", "::"), "game::item_system");
    }

    #[test]
    fn unknown_style_is_an_error() {
        assert!(matches!(
            CodeStyle::builtin("cobol-default"),
            Err(CodegenError::UnknownCodeStyle(_))
        ));
        assert_eq!(CodeStyle::builtin("none").unwrap().format_field("ItemId"), "ItemId");
    }
}
