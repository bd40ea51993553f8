use std::collections::{BTreeMap, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::FieldType;
use crate::validation::validate_graph;

/// Serialized form of a type graph, as produced by an external schema parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TypeGraphDocument {
    /// Contract version for this document format.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Every declared type, in declaration order.
    pub types: Vec<TypeDef>,
}

fn default_schema_version() -> String {
    crate::SCHEMA_VERSION.to_string()
}

/// A declared type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDef {
    Enum(EnumDef),
    Bean(BeanDef),
    Table(TableDef),
}

impl TypeDef {
    pub fn namespace(&self) -> &str {
        match self {
            TypeDef::Enum(def) => &def.namespace,
            TypeDef::Bean(def) => &def.namespace,
            TypeDef::Table(def) => &def.namespace,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeDef::Enum(def) => &def.name,
            TypeDef::Bean(def) => &def.name,
            TypeDef::Table(def) => &def.name,
        }
    }

    pub fn full_name(&self) -> String {
        full_name(self.namespace(), self.name())
    }

    pub fn groups(&self) -> &[String] {
        match self {
            TypeDef::Enum(def) => &def.groups,
            TypeDef::Bean(def) => &def.groups,
            TypeDef::Table(def) => &def.groups,
        }
    }

    /// Short label used in diagnostics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            TypeDef::Enum(_) => "enum",
            TypeDef::Bean(_) => "bean",
            TypeDef::Table(_) => "table",
        }
    }
}

/// Enum declaration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EnumDef {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    /// Bit-flag enum; items may be combined.
    #[serde(default)]
    pub flags: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    pub items: Vec<EnumItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl EnumDef {
    pub fn full_name(&self) -> String {
        full_name(&self.namespace, &self.name)
    }

    /// Find an item by name or alias.
    pub fn item(&self, name: &str) -> Option<&EnumItem> {
        self.items
            .iter()
            .find(|item| item.name == name || item.alias.as_deref() == Some(name))
    }

    pub fn item_by_value(&self, value: i32) -> Option<&EnumItem> {
        self.items.iter().find(|item| item.value == value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EnumItem {
    pub name: String,
    pub value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Bean (record/struct) declaration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BeanDef {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    /// Full name of the parent bean for polymorphic hierarchies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Abstract beans cannot be instantiated by data rows.
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl BeanDef {
    pub fn full_name(&self) -> String {
        full_name(&self.namespace, &self.name)
    }

    /// Find a field declared directly on this bean.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Field of a bean.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Table declaration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableDef {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    /// Full name of the row bean.
    pub value_type: String,
    /// Key field on the row bean.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default)]
    pub mode: TableMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    /// Data source name; defaults to the table name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TableDef {
    pub fn full_name(&self) -> String {
        full_name(&self.namespace, &self.name)
    }

    /// Whether exactly one exported row is expected.
    pub fn is_singleton(&self) -> bool {
        self.mode == TableMode::One
    }

    pub fn input_name(&self) -> &str {
        self.input.as_deref().unwrap_or(&self.name)
    }
}

/// Storage shape of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TableMode {
    /// Rows keyed by a unique index field.
    #[default]
    Map,
    /// Ordered rows; the index, when present, is not unique.
    List,
    /// Singleton table holding exactly one row.
    One,
}

/// Join a namespace and a simple name.
pub fn full_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// Validated, indexed type graph.
///
/// Read-only once built; every lookup is by fully-qualified name.
#[derive(Debug, Clone)]
pub struct TypeGraph {
    types: Vec<TypeDef>,
    by_name: HashMap<String, usize>,
    children: BTreeMap<String, Vec<String>>,
}

impl TypeGraph {
    /// Index and validate a document.
    pub fn from_document(document: TypeGraphDocument) -> Result<Self> {
        Self::new(document.types)
    }

    pub fn new(types: Vec<TypeDef>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(types.len());
        for (idx, def) in types.iter().enumerate() {
            let name = def.full_name();
            if by_name.insert(name.clone(), idx).is_some() {
                return Err(Error::InvalidSchema(format!("duplicate type name: {name}")));
            }
        }

        let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for def in &types {
            if let TypeDef::Bean(bean) = def
                && let Some(parent) = &bean.parent
            {
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(bean.full_name());
            }
        }

        let graph = Self {
            types,
            by_name,
            children,
        };
        validate_graph(&graph)?;
        Ok(graph)
    }

    /// All declared types in declaration order.
    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    pub fn get(&self, full_name: &str) -> Option<&TypeDef> {
        self.by_name.get(full_name).map(|idx| &self.types[*idx])
    }

    pub fn bean(&self, full_name: &str) -> Option<&BeanDef> {
        match self.get(full_name) {
            Some(TypeDef::Bean(bean)) => Some(bean),
            _ => None,
        }
    }

    pub fn enum_def(&self, full_name: &str) -> Option<&EnumDef> {
        match self.get(full_name) {
            Some(TypeDef::Enum(def)) => Some(def),
            _ => None,
        }
    }

    pub fn table(&self, full_name: &str) -> Option<&TableDef> {
        match self.get(full_name) {
            Some(TypeDef::Table(def)) => Some(def),
            _ => None,
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.types.iter().filter_map(|def| match def {
            TypeDef::Table(table) => Some(table),
            _ => None,
        })
    }

    /// Resolve a type name used inside `namespace`.
    ///
    /// The namespace-qualified name wins over the absolute one.
    pub fn resolve_ref(&self, namespace: &str, name: &str) -> Option<&TypeDef> {
        if !namespace.is_empty()
            && let Some(def) = self.get(&full_name(namespace, name))
        {
            return Some(def);
        }
        self.get(name)
    }

    /// Direct subtypes of a bean.
    pub fn children(&self, full_name: &str) -> &[String] {
        self.children
            .get(full_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every concrete or abstract descendant of a bean, depth first.
    pub fn descendants(&self, full_name: &str) -> Vec<&BeanDef> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = self.children(full_name).iter().map(String::as_str).collect();
        stack.reverse();
        while let Some(name) = stack.pop() {
            if let Some(bean) = self.bean(name) {
                out.push(bean);
                stack.extend(self.children(name).iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// Fields of a bean including inherited ones, parents first, each paired
    /// with the bean that declares it. Named field types resolve in the
    /// declaring bean's namespace.
    pub fn hierarchy_fields<'a>(
        &'a self,
        bean: &'a BeanDef,
    ) -> Vec<(&'a BeanDef, &'a FieldDef)> {
        let mut chain = vec![bean];
        let mut current = bean;
        while let Some(parent) = current.parent.as_deref().and_then(|name| self.bean(name)) {
            chain.push(parent);
            current = parent;
        }
        chain
            .into_iter()
            .rev()
            .flat_map(|bean| bean.fields.iter().map(move |field| (bean, field)))
            .collect()
    }

    /// Resolve a field's named type in the declaring bean's namespace.
    pub fn field_ref(&self, bean: &BeanDef, name: &str) -> Option<&TypeDef> {
        self.resolve_ref(&bean.namespace, name)
    }

    /// Key field of a table and its declaring bean, when the table declares
    /// an index.
    pub fn key_field<'a>(&'a self, table: &TableDef) -> Option<(&'a BeanDef, &'a FieldDef)> {
        let index = table.index.as_deref()?;
        let bean = self.bean(&table.value_type)?;
        self.hierarchy_fields(bean)
            .into_iter()
            .find(|(_, field)| field.name == index)
    }

    /// Visit every type directly referenced by `def`.
    ///
    /// Beans reference their field types (through containers), their parent
    /// and their direct children; tables reference their value bean; enums
    /// reference nothing. Unresolvable names are skipped; `validate_graph`
    /// rejects them up front.
    pub fn visit_refs<'a, F: FnMut(&'a TypeDef)>(&'a self, def: &'a TypeDef, mut visit: F) {
        match def {
            TypeDef::Enum(_) => {}
            TypeDef::Table(table) => {
                if let Some(value) = self.get(&table.value_type) {
                    visit(value);
                }
            }
            TypeDef::Bean(bean) => {
                if let Some(parent) = bean.parent.as_deref().and_then(|name| self.get(name)) {
                    visit(parent);
                }
                for child in self.children(&bean.full_name()) {
                    if let Some(child) = self.get(child) {
                        visit(child);
                    }
                }
                for field in &bean.fields {
                    field.field_type.for_each_named(&mut |name| {
                        if let Some(target) = self.field_ref(bean, name) {
                            visit(target);
                        }
                    });
                }
            }
        }
    }
}
