use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Semantic type of a bean field.
///
/// Serialized as a compact type expression such as `int`, `list<Item>`,
/// `map<int,string>` or `Reward?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Bool,
    Int,
    Long,
    Float,
    Double,
    String,
    DateTime,
    /// Reference to a declared enum or bean, resolved against the type graph.
    Named(String),
    Array(Box<FieldType>),
    List(Box<FieldType>),
    Set(Box<FieldType>),
    Map(Box<FieldType>, Box<FieldType>),
    Nullable(Box<FieldType>),
}

impl FieldType {
    /// Parse a type expression.
    pub fn parse(expr: &str) -> Result<Self> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(invalid(expr, "empty type"));
        }

        if let Some(inner) = trimmed.strip_suffix('?') {
            let inner = FieldType::parse(inner)?;
            if matches!(inner, FieldType::Nullable(_)) {
                return Err(invalid(expr, "nested nullable"));
            }
            return Ok(FieldType::Nullable(Box::new(inner)));
        }

        if let Some(open) = trimmed.find('<') {
            let close = trimmed
                .rfind('>')
                .filter(|close| *close == trimmed.len() - 1 && *close > open)
                .ok_or_else(|| invalid(expr, "unbalanced '<'"))?;
            let container = trimmed[..open].trim();
            let args = split_args(&trimmed[open + 1..close])
                .ok_or_else(|| invalid(expr, "unbalanced '<'"))?;

            return match (container, args.as_slice()) {
                ("array", [elem]) => Ok(FieldType::Array(Box::new(FieldType::parse(elem)?))),
                ("list", [elem]) => Ok(FieldType::List(Box::new(FieldType::parse(elem)?))),
                ("set", [elem]) => Ok(FieldType::Set(Box::new(FieldType::parse(elem)?))),
                ("map", [key, value]) => Ok(FieldType::Map(
                    Box::new(FieldType::parse(key)?),
                    Box::new(FieldType::parse(value)?),
                )),
                ("array" | "list" | "set" | "map", _) => {
                    Err(invalid(expr, "wrong number of type arguments"))
                }
                _ => Err(invalid(expr, "unknown container")),
            };
        }

        if trimmed.contains(['>', ',']) || trimmed.contains(char::is_whitespace) {
            return Err(invalid(expr, "unexpected character"));
        }

        Ok(match trimmed {
            "bool" => FieldType::Bool,
            "int" => FieldType::Int,
            "long" => FieldType::Long,
            "float" => FieldType::Float,
            "double" => FieldType::Double,
            "string" => FieldType::String,
            "datetime" => FieldType::DateTime,
            other => FieldType::Named(other.to_string()),
        })
    }

    /// Strip a nullable wrapper, if any.
    pub fn non_null(&self) -> &FieldType {
        match self {
            FieldType::Nullable(inner) => inner,
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldType::Nullable(_))
    }

    /// Whether values of this type can key a sorted table (`int` or `long`).
    pub fn is_integer_key(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Long)
    }

    /// Calls `f` with every named type reachable inside this expression,
    /// including container element types.
    pub fn for_each_named<F: FnMut(&str)>(&self, f: &mut F) {
        match self {
            FieldType::Named(name) => f(name),
            FieldType::Array(elem)
            | FieldType::List(elem)
            | FieldType::Set(elem)
            | FieldType::Nullable(elem) => elem.for_each_named(f),
            FieldType::Map(key, value) => {
                key.for_each_named(f);
                value.for_each_named(f);
            }
            FieldType::Bool
            | FieldType::Int
            | FieldType::Long
            | FieldType::Float
            | FieldType::Double
            | FieldType::String
            | FieldType::DateTime => {}
        }
    }
}

fn invalid(expr: &str, reason: &str) -> Error {
    Error::InvalidTypeExpr {
        expr: expr.to_string(),
        reason: reason.to_string(),
    }
}

fn split_args(args: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;

    for (idx, ch) in args.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(args[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    parts.push(args[start..].trim());
    Some(parts)
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => f.write_str("bool"),
            FieldType::Int => f.write_str("int"),
            FieldType::Long => f.write_str("long"),
            FieldType::Float => f.write_str("float"),
            FieldType::Double => f.write_str("double"),
            FieldType::String => f.write_str("string"),
            FieldType::DateTime => f.write_str("datetime"),
            FieldType::Named(name) => f.write_str(name),
            FieldType::Array(elem) => write!(f, "array<{elem}>"),
            FieldType::List(elem) => write!(f, "list<{elem}>"),
            FieldType::Set(elem) => write!(f, "set<{elem}>"),
            FieldType::Map(key, value) => write!(f, "map<{key},{value}>"),
            FieldType::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldType::parse(s)
    }
}

impl TryFrom<String> for FieldType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        FieldType::parse(&value)
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}
