use std::collections::BTreeSet;

use heck::ToShoutySnakeCase;
use minijinja::context;
use serde::Serialize;

use tablegen_core::{BeanDef, EnumDef, FieldType, TableDef, TableMode, TypeDef, TypeGraph};

use crate::context::GenerationContext;
use crate::errors::CodegenResult;
use crate::style::CodeStyle;
use crate::target::{CodeTarget, JsonDataTarget, file_stem};
use crate::template::TemplateRenderer;

const MANIFEST_TEMPLATE: &str = "tables.rs";
const TABLE_TEMPLATE: &str = "table.rs";
const HEADER: &str = "// @generated by tablegen. Do not edit.\n\n";

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "yield",
];

/// Rust source whose table wrappers load the `json` target's data files.
#[derive(Debug)]
pub struct RustJsonTarget {
    renderer: TemplateRenderer,
}

impl RustJsonTarget {
    pub fn new() -> CodegenResult<Self> {
        let mut renderer = TemplateRenderer::new();
        renderer.add_template(
            MANIFEST_TEMPLATE,
            include_str!("../../templates/rust/tables.rs.jinja"),
        )?;
        renderer.add_template(
            TABLE_TEMPLATE,
            include_str!("../../templates/rust/table.rs.jinja"),
        )?;
        Ok(Self { renderer })
    }

    fn style(&self, ctx: &GenerationContext<'_>) -> CodegenResult<CodeStyle> {
        ctx.code_style(self.name(), "rust-default")
    }
}

#[derive(Debug, Serialize)]
struct CtxView<'a> {
    target: &'a str,
    manager: &'a str,
    top_module: &'a str,
    groups: &'a [String],
    include_tags: Vec<&'a str>,
    exclude_tags: Vec<&'a str>,
}

impl<'a> CtxView<'a> {
    fn new(ctx: &'a GenerationContext<'_>) -> Self {
        let target = ctx.target();
        Self {
            target: &target.name,
            manager: &target.manager,
            top_module: &target.top_module,
            groups: &target.groups,
            include_tags: ctx.include_tags().iter().map(String::as_str).collect(),
            exclude_tags: ctx.exclude_tags().iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EnumView {
    name: String,
    full_name: String,
    flags: bool,
    const_prefix: String,
    comment: Option<String>,
    items: Vec<EnumItemView>,
}

#[derive(Debug, Serialize)]
struct EnumItemView {
    name: String,
    const_name: String,
    value: i32,
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct BeanView {
    name: String,
    full_name: String,
    kind: String,
    is_abstract: bool,
    polymorphic: bool,
    comment: Option<String>,
    fields: Vec<FieldView>,
    variants: Vec<VariantView>,
}

#[derive(Debug, Serialize)]
struct FieldView {
    name: String,
    /// Accessor method on the polymorphic enum.
    accessor: String,
    json_name: String,
    rename: bool,
    ty: String,
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct VariantView {
    name: String,
    tag: String,
}

#[derive(Debug, Serialize)]
struct KeyView {
    name: String,
    ty: String,
    hashable: bool,
    /// Expression borrowing the key of `row`.
    access: String,
}

#[derive(Debug, Serialize)]
struct TableView {
    name: String,
    full_name: String,
    module: String,
    /// Field of the manager struct holding this table.
    member: String,
    file: String,
    data_file: String,
    mode: TableMode,
    /// Map table whose key can back a hash index.
    indexed: bool,
    value_type: String,
    key: Option<KeyView>,
    comment: Option<String>,
}

/// Maps schema names and field types onto Rust identifiers.
struct RustNames<'a> {
    graph: &'a TypeGraph,
    style: CodeStyle,
}

impl<'a> RustNames<'a> {
    fn type_ident(&self, full_name: &str) -> String {
        self.style.format_type(&full_name.replace('.', "_"))
    }

    fn bean_ident(&self, bean: &BeanDef) -> String {
        let ident = self.type_ident(&bean.full_name());
        if self.is_polymorphic(bean) {
            format!("{ident}Kind")
        } else {
            ident
        }
    }

    fn is_polymorphic(&self, bean: &BeanDef) -> bool {
        !self.graph.children(&bean.full_name()).is_empty()
    }

    fn field_ident(&self, name: &str) -> String {
        escape_keyword(self.style.format_field(name))
    }

    fn method_ident(&self, name: &str) -> String {
        escape_keyword(self.style.format_method(name))
    }

    /// One property-styled segment per namespace level, joined by `__`.
    fn member_ident(&self, full_name: &str) -> String {
        let ident = full_name
            .split('.')
            .map(|segment| self.style.format_property(segment))
            .collect::<Vec<_>>()
            .join("__");
        escape_keyword(ident)
    }

    fn enum_item_ident(&self, name: &str) -> String {
        let ident = self.style.format_enum_item(name);
        if ident.starts_with(|c: char| c.is_ascii_digit()) {
            format!("V{ident}")
        } else {
            ident
        }
    }

    /// Rust type of a field declared in `scope`. Bean values outside a
    /// container are boxed so recursive beans stay sized.
    fn rust_type(&self, scope: &BeanDef, ty: &FieldType, boxed: bool) -> CodegenResult<String> {
        Ok(match ty {
            FieldType::Bool => "bool".to_string(),
            FieldType::Int => "i32".to_string(),
            FieldType::Long | FieldType::DateTime => "i64".to_string(),
            FieldType::Float => "f32".to_string(),
            FieldType::Double => "f64".to_string(),
            FieldType::String => "String".to_string(),
            FieldType::Named(name) => match self.graph.field_ref(scope, name) {
                Some(TypeDef::Enum(def)) => self.type_ident(&def.full_name()),
                Some(TypeDef::Bean(bean)) if boxed => format!("Box<{}>", self.bean_ident(bean)),
                Some(TypeDef::Bean(bean)) => self.bean_ident(bean),
                _ => return Err(tablegen_core::Error::UnknownType(name.clone()).into()),
            },
            FieldType::Array(elem) | FieldType::List(elem) | FieldType::Set(elem) => {
                format!("Vec<{}>", self.rust_type(scope, elem, false)?)
            }
            FieldType::Map(key, value) => format!(
                "Vec<({}, {})>",
                self.rust_type(scope, key, false)?,
                self.rust_type(scope, value, false)?
            ),
            FieldType::Nullable(inner) => {
                format!("Option<{}>", self.rust_type(scope, inner, boxed)?)
            }
        })
    }

    fn is_hashable(&self, scope: &BeanDef, ty: &FieldType) -> bool {
        match ty {
            FieldType::Float | FieldType::Double => false,
            FieldType::Named(name) => matches!(self.graph.field_ref(scope, name), Some(TypeDef::Enum(_))),
            FieldType::Array(elem)
            | FieldType::List(elem)
            | FieldType::Set(elem)
            | FieldType::Nullable(elem) => self.is_hashable(scope, elem),
            FieldType::Map(key, value) => {
                self.is_hashable(scope, key) && self.is_hashable(scope, value)
            }
            FieldType::Bool
            | FieldType::Int
            | FieldType::Long
            | FieldType::String
            | FieldType::DateTime => true,
        }
    }

    fn enum_view(&self, def: &EnumDef) -> EnumView {
        let name = self.type_ident(&def.full_name());
        let mut seen = BTreeSet::new();
        let items = def
            .items
            .iter()
            .filter(|item| def.flags || seen.insert(item.value))
            .map(|item| EnumItemView {
                name: self.enum_item_ident(&item.name),
                const_name: item.name.to_shouty_snake_case(),
                value: item.value,
                comment: item.comment.as_deref().map(one_line),
            })
            .collect();
        EnumView {
            const_prefix: name.to_shouty_snake_case(),
            name,
            full_name: def.full_name(),
            flags: def.flags,
            comment: def.comment.as_deref().map(one_line),
            items,
        }
    }

    fn field_views(&self, bean: &BeanDef) -> CodegenResult<Vec<FieldView>> {
        self.graph
            .hierarchy_fields(bean)
            .into_iter()
            .map(|(owner, field)| {
                let name = self.field_ident(&field.name);
                Ok(FieldView {
                    accessor: self.method_ident(&field.name),
                    rename: name != field.name,
                    json_name: field.name.clone(),
                    ty: self.rust_type(owner, &field.field_type, true)?,
                    comment: field.comment.as_deref().map(one_line),
                    name,
                })
            })
            .collect()
    }

    fn bean_view(&self, bean: &BeanDef) -> CodegenResult<BeanView> {
        let full_name = bean.full_name();
        let polymorphic = self.is_polymorphic(bean);
        let variants = if polymorphic {
            std::iter::once(bean)
                .chain(self.graph.descendants(&full_name))
                .filter(|concrete| !concrete.is_abstract)
                .map(|concrete| VariantView {
                    name: self.type_ident(&concrete.full_name()),
                    tag: concrete.full_name(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(BeanView {
            name: self.type_ident(&full_name),
            kind: self.bean_ident(bean),
            is_abstract: bean.is_abstract,
            polymorphic,
            comment: bean.comment.as_deref().map(one_line),
            fields: self.field_views(bean)?,
            variants,
            full_name,
        })
    }

    fn table_view(&self, target: &dyn CodeTarget, table: &TableDef) -> CodegenResult<TableView> {
        let full_name = table.full_name();
        let bean = self
            .graph
            .bean(&table.value_type)
            .ok_or_else(|| tablegen_core::Error::UnknownType(table.value_type.clone()))?;
        let polymorphic = self.is_polymorphic(bean);

        let key = match self.graph.key_field(table) {
            Some((owner, field)) => {
                let name = self.field_ident(&field.name);
                Some(KeyView {
                    ty: self.rust_type(owner, &field.field_type, true)?,
                    hashable: self.is_hashable(owner, &field.field_type),
                    access: if polymorphic {
                        format!("row.{}()", self.method_ident(&field.name))
                    } else {
                        format!("&row.{name}")
                    },
                    name,
                })
            }
            None => None,
        };

        let file = target.table_file(table);
        Ok(TableView {
            indexed: table.mode == TableMode::Map && key.as_ref().is_some_and(|key| key.hashable),
            name: self.type_ident(&full_name),
            module: file_stem(&full_name).replace('/', "__"),
            member: self.member_ident(&full_name),
            data_file: JsonDataTarget::new().table_file(table),
            file,
            mode: table.mode,
            value_type: self.bean_ident(bean),
            key,
            comment: table.comment.as_deref().map(one_line),
            full_name,
        })
    }
}

fn escape_keyword(ident: String) -> String {
    if KEYWORDS.contains(&ident.as_str()) {
        format!("{ident}_")
    } else {
        ident
    }
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl CodeTarget for RustJsonTarget {
    fn name(&self) -> &str {
        "rust-json"
    }

    fn file_header(&self) -> &str {
        HEADER
    }

    fn file_suffix(&self) -> &str {
        "rs"
    }

    fn generate_manifest(
        &self,
        ctx: &GenerationContext<'_>,
        export_tables: &[&TableDef],
    ) -> CodegenResult<String> {
        let style = self.style(ctx)?;
        let names = RustNames {
            graph: ctx.graph(),
            style: style.clone(),
        };

        let enums: Vec<EnumView> = ctx
            .export_enums()
            .into_iter()
            .map(|def| names.enum_view(def))
            .collect();
        let beans = ctx
            .export_beans()
            .into_iter()
            .map(|bean| names.bean_view(bean))
            .collect::<CodegenResult<Vec<_>>>()?;
        let tables = export_tables
            .iter()
            .map(|table| names.table_view(self, table))
            .collect::<CodegenResult<Vec<_>>>()?;

        self.renderer.render(
            MANIFEST_TEMPLATE,
            context! {
                __ctx => CtxView::new(ctx),
                __name => names.type_ident(&ctx.target().manager),
                __namespace => style.format_namespace(&ctx.target().top_module, "::"),
                __enums => enums,
                __beans => beans,
                __tables => tables,
                __code_style => style,
            },
        )
    }

    fn generate_one(&self, ctx: &GenerationContext<'_>, table: &TableDef) -> CodegenResult<String> {
        let style = self.style(ctx)?;
        let names = RustNames {
            graph: ctx.graph(),
            style: style.clone(),
        };
        let view = names.table_view(self, table)?;

        self.renderer.render(
            TABLE_TEMPLATE,
            context! {
                __ctx => CtxView::new(ctx),
                __name => &view.name,
                __namespace => &table.namespace,
                __key_type => view.key.as_ref().map(|key| key.ty.as_str()),
                __value_type => &view.value_type,
                __table => &view,
                __code_style => style,
            },
        )
    }
}
