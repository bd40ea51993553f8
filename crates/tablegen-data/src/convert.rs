use chrono::NaiveDateTime;
use serde_json::Value;

use tablegen_core::{
    BeanDef, BeanValue, DataValue, EnumDef, FieldType, Record, TableDef, TypeDef, TypeGraph,
};

use crate::errors::{DataError, DataResult};

/// Reserved row key carrying provenance tags.
pub const TAGS_KEY: &str = "__tags";
/// Reserved object key selecting the concrete type of a polymorphic bean.
pub const TYPE_KEY: &str = "$type";

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Convert one JSON row of `table` into a record.
pub fn record_from_json(
    graph: &TypeGraph,
    table: &TableDef,
    row: &Value,
    location: &str,
) -> DataResult<Record> {
    let bean = graph
        .bean(&table.value_type)
        .ok_or_else(|| tablegen_core::Error::UnknownType(table.value_type.clone()))?;

    let tags = match row.get(TAGS_KEY) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(tag)) => split_tags(tag),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(location, "tags must be strings"))
            })
            .collect::<DataResult<Vec<_>>>()?,
        Some(_) => return Err(invalid(location, "tags must be a string or an array")),
    };

    let converter = Converter { graph };
    let data = converter.bean(bean, row, location, &[TAGS_KEY])?;
    Ok(Record {
        data,
        tags,
        source: Some(location.to_string()),
    })
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split([',', ';', '|'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn invalid(location: &str, message: impl Into<String>) -> DataError {
    DataError::InvalidRecord {
        location: location.to_string(),
        message: message.into(),
    }
}

struct Converter<'g> {
    graph: &'g TypeGraph,
}

impl<'g> Converter<'g> {
    fn bean(
        &self,
        declared: &'g BeanDef,
        value: &Value,
        location: &str,
        reserved: &[&str],
    ) -> DataResult<BeanValue> {
        let object = value
            .as_object()
            .ok_or_else(|| invalid(location, format!("expected object for {}", declared.full_name())))?;

        let descendants = self.graph.descendants(&declared.full_name());
        let polymorphic = !descendants.is_empty() || declared.parent.is_some();
        let concrete = match object.get(TYPE_KEY).and_then(Value::as_str) {
            Some(type_name) => std::iter::once(declared)
                .chain(descendants.iter().copied())
                .find(|bean| bean.full_name() == type_name || bean.name == type_name)
                .ok_or_else(|| {
                    invalid(
                        location,
                        format!("{type_name} is not {} or one of its subtypes", declared.full_name()),
                    )
                })?,
            None => declared,
        };
        if concrete.is_abstract {
            return Err(invalid(
                location,
                format!("{} is abstract; set {TYPE_KEY}", concrete.full_name()),
            ));
        }

        let fields = self.graph.hierarchy_fields(concrete);
        for key in object.keys() {
            let known = key == TYPE_KEY
                || reserved.contains(&key.as_str())
                || fields.iter().any(|(_, field)| &field.name == key);
            if !known {
                return Err(invalid(
                    location,
                    format!("unknown field '{key}' for {}", concrete.full_name()),
                ));
            }
        }

        let mut bean = BeanValue::new(concrete.full_name());
        bean.tagged = polymorphic;
        for (owner, field) in fields {
            let path = format!("{location}.{}", field.name);
            let raw = object.get(&field.name).unwrap_or(&Value::Null);
            let value = self.value(owner, &field.field_type, raw, &path)?;
            bean.fields.push((field.name.clone(), value));
        }
        Ok(bean)
    }

    fn value(
        &self,
        scope: &'g BeanDef,
        ty: &FieldType,
        raw: &Value,
        location: &str,
    ) -> DataResult<DataValue> {
        if let FieldType::Nullable(inner) = ty {
            return if raw.is_null() {
                Ok(DataValue::Null)
            } else {
                self.value(scope, inner, raw, location)
            };
        }
        if raw.is_null() {
            return Err(invalid(location, format!("missing value of type {ty}")));
        }

        match ty {
            FieldType::Bool => match raw {
                Value::Bool(value) => Ok(DataValue::Bool(*value)),
                Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(DataValue::Bool(true)),
                    "false" | "0" => Ok(DataValue::Bool(false)),
                    _ => Err(invalid(location, format!("'{text}' is not a bool"))),
                },
                _ => Err(invalid(location, "expected bool")),
            },
            FieldType::Int => {
                let value = integer(raw, location)?;
                i32::try_from(value)
                    .map(DataValue::Int)
                    .map_err(|_| invalid(location, format!("{value} overflows int")))
            }
            FieldType::Long => integer(raw, location).map(DataValue::Long),
            FieldType::Float => float(raw, location).map(|value| DataValue::Float(value as f32)),
            FieldType::Double => float(raw, location).map(DataValue::Double),
            FieldType::String => match raw {
                Value::String(text) => Ok(DataValue::String(text.clone())),
                Value::Number(number) => Ok(DataValue::String(number.to_string())),
                _ => Err(invalid(location, "expected string")),
            },
            FieldType::DateTime => match raw {
                Value::Number(_) => integer(raw, location).map(DataValue::DateTime),
                Value::String(text) => DATETIME_FORMATS
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(text.trim(), format).ok())
                    .map(|datetime| DataValue::DateTime(datetime.and_utc().timestamp()))
                    .ok_or_else(|| invalid(location, format!("'{text}' is not a datetime"))),
                _ => Err(invalid(location, "expected datetime")),
            },
            FieldType::Named(name) => match self.graph.field_ref(scope, name) {
                Some(TypeDef::Enum(def)) => enum_value(def, raw, location),
                Some(TypeDef::Bean(bean)) => {
                    self.bean(bean, raw, location, &[]).map(DataValue::Bean)
                }
                _ => Err(tablegen_core::Error::UnknownType(name.clone()).into()),
            },
            FieldType::Array(elem) | FieldType::List(elem) | FieldType::Set(elem) => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| invalid(location, format!("expected array for {ty}")))?;
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| self.value(scope, elem, item, &format!("{location}[{idx}]")))
                    .collect::<DataResult<Vec<_>>>()
                    .map(DataValue::Seq)
            }
            FieldType::Map(key_ty, value_ty) => {
                let mut entries = Vec::new();
                match raw {
                    Value::Object(object) => {
                        for (key, value) in object {
                            let path = format!("{location}.{key}");
                            entries.push((
                                self.value(scope, key_ty, &Value::String(key.clone()), &path)?,
                                self.value(scope, value_ty, value, &path)?,
                            ));
                        }
                    }
                    Value::Array(pairs) => {
                        for (idx, pair) in pairs.iter().enumerate() {
                            let path = format!("{location}[{idx}]");
                            let [key, value] = pair.as_array().map(Vec::as_slice).unwrap_or_default()
                            else {
                                return Err(invalid(&path, "map entries must be [key, value] pairs"));
                            };
                            entries.push((
                                self.value(scope, key_ty, key, &path)?,
                                self.value(scope, value_ty, value, &path)?,
                            ));
                        }
                    }
                    _ => return Err(invalid(location, format!("expected object for {ty}"))),
                }
                Ok(DataValue::Map(entries))
            }
            FieldType::Nullable(_) => Err(DataError::InternalInvariant(
                "nullable handled above".to_string(),
            )),
        }
    }
}

fn integer(raw: &Value, location: &str) -> DataResult<i64> {
    match raw {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| invalid(location, format!("{number} is not an integer"))),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(location, format!("'{text}' is not an integer"))),
        _ => Err(invalid(location, "expected integer")),
    }
}

fn float(raw: &Value, location: &str) -> DataResult<f64> {
    match raw {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| invalid(location, format!("{number} is not a number"))),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(location, format!("'{text}' is not a number"))),
        _ => Err(invalid(location, "expected number")),
    }
}

fn enum_value(def: &EnumDef, raw: &Value, location: &str) -> DataResult<DataValue> {
    let by_value = |value: i64| {
        i32::try_from(value)
            .ok()
            .and_then(|value| def.item_by_value(value))
            .map(|item| DataValue::Enum {
                item: item.name.clone(),
                value: item.value,
            })
            .ok_or_else(|| invalid(location, format!("{value} is not a value of {}", def.full_name())))
    };

    match raw {
        Value::Number(_) => by_value(integer(raw, location)?),
        Value::String(text) => {
            let text = text.trim();
            if let Ok(value) = text.parse::<i64>() {
                return by_value(value);
            }
            if def.flags && text.contains('|') {
                let mut value = 0;
                for part in text.split('|').map(str::trim) {
                    let item = def.item(part).ok_or_else(|| {
                        invalid(location, format!("'{part}' is not an item of {}", def.full_name()))
                    })?;
                    value |= item.value;
                }
                return Ok(DataValue::Enum {
                    item: text.to_string(),
                    value,
                });
            }
            def.item(text)
                .map(|item| DataValue::Enum {
                    item: item.name.clone(),
                    value: item.value,
                })
                .ok_or_else(|| {
                    invalid(location, format!("'{text}' is not an item of {}", def.full_name()))
                })
        }
        _ => Err(invalid(location, format!("expected {} item", def.full_name()))),
    }
}
