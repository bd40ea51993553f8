use std::collections::BTreeSet;

use serde_json::{Map, Number, Value};

/// Structured data value conforming to a field type.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// Seconds since the Unix epoch.
    DateTime(i64),
    Enum { item: String, value: i32 },
    Bean(BeanValue),
    /// Elements of an array, list or set.
    Seq(Vec<DataValue>),
    Map(Vec<(DataValue, DataValue)>),
}

impl DataValue {
    /// Variant label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DataValue::Null => "null",
            DataValue::Bool(_) => "bool",
            DataValue::Int(_) => "int",
            DataValue::Long(_) => "long",
            DataValue::Float(_) => "float",
            DataValue::Double(_) => "double",
            DataValue::String(_) => "string",
            DataValue::DateTime(_) => "datetime",
            DataValue::Enum { .. } => "enum",
            DataValue::Bean(_) => "bean",
            DataValue::Seq(_) => "seq",
            DataValue::Map(_) => "map",
        }
    }

    /// JSON rendering used by data targets.
    ///
    /// Enums export their integer value; map entries export as `[key, value]`
    /// pairs so non-string keys survive.
    pub fn to_json(&self) -> Value {
        match self {
            DataValue::Null => Value::Null,
            DataValue::Bool(value) => Value::Bool(*value),
            DataValue::Int(value) => Value::from(*value),
            DataValue::Long(value) | DataValue::DateTime(value) => Value::from(*value),
            DataValue::Float(value) => Number::from_f64(f64::from(*value))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            DataValue::Double(value) => Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            DataValue::String(value) => Value::String(value.clone()),
            DataValue::Enum { value, .. } => Value::from(*value),
            DataValue::Bean(bean) => bean.to_json(),
            DataValue::Seq(items) => Value::Array(items.iter().map(DataValue::to_json).collect()),
            DataValue::Map(entries) => Value::Array(
                entries
                    .iter()
                    .map(|(key, value)| Value::Array(vec![key.to_json(), value.to_json()]))
                    .collect(),
            ),
        }
    }
}

/// Instance of a bean: concrete type name plus ordered field values.
#[derive(Debug, Clone, PartialEq)]
pub struct BeanValue {
    pub type_name: String,
    /// Emit the concrete type next to the fields (polymorphic beans).
    pub tagged: bool,
    pub fields: Vec<(String, DataValue)>,
}

impl BeanValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            tagged: false,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: DataValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&DataValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        if self.tagged {
            object.insert("$type".to_string(), Value::String(self.type_name.clone()));
        }
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.to_json());
        }
        Value::Object(object)
    }
}

/// One data row bound to a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub data: BeanValue,
    /// Provenance tags used for exclusion filtering.
    pub tags: Vec<String>,
    /// Where the row came from, for diagnostics.
    pub source: Option<String>,
}

impl Record {
    pub fn new(data: BeanValue) -> Self {
        Self {
            data,
            tags: Vec::new(),
            source: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// True when none of the record's tags is excluded.
    pub fn is_not_filtered(&self, exclude_tags: &BTreeSet<String>) -> bool {
        !self.tags.iter().any(|tag| exclude_tags.contains(tag))
    }
}
