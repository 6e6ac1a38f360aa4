//! Conversion between [`Record`]s and the plain JSON shown to (and edited by)
//! the user.
//!
//! Decoding understands a `<TYPE>` suffix on attribute names, e.g.
//! `"tags<SS>": ["a", "b"]`, for the types plain JSON cannot express. Hints are
//! only honoured on top-level attributes and inside values that were
//! themselves hinted with `<M>`; a map that is inferred from a plain JSON
//! object keeps its keys verbatim.

use std::{collections::HashMap, fmt, str::FromStr};

use serde_json::{Map, Number, Value};

use super::value::{Record, TypedValue};

#[derive(Debug, PartialEq, Eq)]
pub enum JsonConversionError {
    InvalidNumber {
        value: String,
    },
    InvalidStructure {
        message: String,
    },
    UnsupportedType {
        attribute_type: String,
    },
    TypeConversion {
        attribute: String,
        type_hint: String,
        reason: String,
    },
    SerializationError(String),
    DeserializationError(String),
}

impl fmt::Display for JsonConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonConversionError::InvalidNumber { value } => {
                write!(f, "invalid DynamoDB number: {value}")
            }
            JsonConversionError::InvalidStructure { message } => {
                write!(f, "invalid JSON structure: {message}")
            }
            JsonConversionError::UnsupportedType { attribute_type } => {
                write!(f, "unsupported DynamoDB attribute type: {attribute_type}")
            }
            JsonConversionError::TypeConversion {
                attribute,
                type_hint,
                reason,
            } => {
                write!(
                    f,
                    "failed to convert {attribute} with type {type_hint}: {reason}"
                )
            }
            JsonConversionError::SerializationError(inner) => {
                write!(f, "failed to serialize JSON value: {inner}")
            }
            JsonConversionError::DeserializationError(inner) => {
                write!(f, "invalid JSON: {inner}")
            }
        }
    }
}

impl std::error::Error for JsonConversionError {}

pub type Result<T> = std::result::Result<T, JsonConversionError>;

pub fn to_json(item: &Record) -> Result<Value> {
    let mut json_map = Map::with_capacity(item.len());

    for (key, value) in item {
        json_map.insert(key.clone(), to_json_value(value)?);
    }

    Ok(Value::Object(json_map))
}

pub fn to_json_string(item: &Record) -> Result<String> {
    let json_value = to_json(item)?;
    serde_json::to_string_pretty(&json_value)
        .map_err(|err| JsonConversionError::SerializationError(err.to_string()))
}

pub fn to_compact_json_string(item: &Record) -> Result<String> {
    let json_value = to_json(item)?;
    serde_json::to_string(&json_value)
        .map_err(|err| JsonConversionError::SerializationError(err.to_string()))
}

/// Like [`to_json_string`], but adds type hints wherever decoding the plain
/// form would come back with a different type: sets, binary values, maps that
/// contain either, and attribute names that would themselves parse as hinted.
///
/// Sets and binary values nested inside lists still come back as lists and
/// strings, because list elements are never hint-decoded.
pub fn to_editable_json_string(item: &Record) -> Result<String> {
    let json_value = Value::Object(to_editable_object(item)?);
    serde_json::to_string_pretty(&json_value)
        .map_err(|err| JsonConversionError::SerializationError(err.to_string()))
}

fn to_editable_object(item: &Record) -> Result<Map<String, Value>> {
    let mut json_map = Map::with_capacity(item.len());
    for (key, value) in item {
        let needs_hint = needs_type_hint(value) || split_type_hint(key).is_some();
        if !needs_hint {
            json_map.insert(key.clone(), to_json_value(value)?);
            continue;
        }
        let encoded = match value {
            TypedValue::M(inner) => Value::Object(to_editable_object(inner)?),
            other => to_json_value(other)?,
        };
        json_map.insert(format!("{key}<{}>", value.type_name()), encoded);
    }
    Ok(json_map)
}

fn needs_type_hint(value: &TypedValue) -> bool {
    match value {
        TypedValue::Ss(_) | TypedValue::Ns(_) | TypedValue::Bs(_) | TypedValue::B(_) => true,
        TypedValue::M(inner) => inner
            .iter()
            .any(|(key, value)| needs_type_hint(value) || split_type_hint(key).is_some()),
        _ => false,
    }
}

/// Renders the type of every attribute instead of its value.
pub fn to_type_json(item: &Record) -> Value {
    Value::Object(
        item.iter()
            .map(|(key, value)| (key.clone(), type_json_value(value)))
            .collect(),
    )
}

pub fn to_type_json_string(item: &Record) -> Result<String> {
    serde_json::to_string_pretty(&to_type_json(item))
        .map_err(|err| JsonConversionError::SerializationError(err.to_string()))
}

fn type_json_value(value: &TypedValue) -> Value {
    match value {
        TypedValue::L(list) => {
            let mut map = Map::with_capacity(2);
            map.insert("type".to_string(), Value::String("L".to_string()));
            map.insert(
                "elements".to_string(),
                Value::Array(list.iter().map(type_json_value).collect()),
            );
            Value::Object(map)
        }
        TypedValue::M(inner) => {
            let mut map = Map::with_capacity(2);
            map.insert("type".to_string(), Value::String("M".to_string()));
            map.insert("attributes".to_string(), to_type_json(inner));
            Value::Object(map)
        }
        other => Value::String(other.type_name().to_string()),
    }
}

/// Short single-line rendering used for key columns: strings and numbers
/// verbatim, everything else as compact JSON.
pub fn display_value(value: &TypedValue) -> String {
    match value {
        TypedValue::S(text) | TypedValue::N(text) => text.clone(),
        other => to_json_value(other)
            .map(|json| json.to_string())
            .unwrap_or_else(|err| err.to_string()),
    }
}

pub fn from_json_string(input: &str) -> Result<Record> {
    let value: Value = serde_json::from_str(input)
        .map_err(|err| JsonConversionError::DeserializationError(err.to_string()))?;
    from_json(&value)
}

pub fn from_json(value: &Value) -> Result<Record> {
    let Value::Object(map) = value else {
        return Err(JsonConversionError::InvalidStructure {
            message: "expected a JSON object at the top level".to_string(),
        });
    };
    from_hinted_object(map)
}

fn from_hinted_object(map: &Map<String, Value>) -> Result<Record> {
    let mut result = HashMap::with_capacity(map.len());
    for (key, value) in map {
        let (name, converted) = match split_type_hint(key) {
            Some((name, type_hint)) => (name, convert_with_type_hint(name, type_hint, value)?),
            None => (key.as_str(), from_json_value(value)?),
        };
        if name.is_empty() {
            return Err(JsonConversionError::InvalidStructure {
                message: format!("empty attribute name in {key:?}"),
            });
        }
        if result.insert(name.to_string(), converted).is_some() {
            return Err(JsonConversionError::InvalidStructure {
                message: format!("duplicate attribute {name}"),
            });
        }
    }
    Ok(result)
}

/// Splits `name<TYPE>` into `("name", "TYPE")`, using the last `<`.
fn split_type_hint(key: &str) -> Option<(&str, &str)> {
    let inner = key.strip_suffix('>')?;
    let open = inner.rfind('<')?;
    Some((&inner[..open], &inner[open + 1..]))
}

fn convert_with_type_hint(name: &str, type_hint: &str, value: &Value) -> Result<TypedValue> {
    let fail = |reason: String| JsonConversionError::TypeConversion {
        attribute: name.to_string(),
        type_hint: type_hint.to_string(),
        reason,
    };

    match type_hint.to_ascii_uppercase().as_str() {
        "S" => Ok(TypedValue::S(render_plain(value))),
        "N" => number_text(value)
            .map(TypedValue::N)
            .ok_or_else(|| fail(format!("cannot convert {} to number", render_plain(value)))),
        "BOOL" => match value {
            Value::Bool(flag) => Ok(TypedValue::Bool(*flag)),
            Value::String(text) if text.eq_ignore_ascii_case("true") => Ok(TypedValue::Bool(true)),
            Value::String(text) if text.eq_ignore_ascii_case("false") => {
                Ok(TypedValue::Bool(false))
            }
            other => Err(fail(format!(
                "cannot convert {} to boolean",
                render_plain(other)
            ))),
        },
        "NULL" => Ok(TypedValue::Null),
        "L" => match value {
            Value::Array(values) => list_from_json(values),
            Value::String(text) => {
                let values: Vec<Value> = serde_json::from_str(text)
                    .map_err(|err| fail(format!("cannot parse list: {err}")))?;
                list_from_json(&values)
            }
            other => Ok(TypedValue::L(vec![from_json_value(other)?])),
        },
        "M" => match value {
            Value::Object(map) => Ok(TypedValue::M(from_hinted_object(map)?)),
            Value::String(text) => {
                let map: Map<String, Value> = serde_json::from_str(text)
                    .map_err(|err| fail(format!("cannot parse map: {err}")))?;
                Ok(TypedValue::M(from_hinted_object(&map)?))
            }
            other => Err(fail(format!("cannot convert {} to map", render_plain(other)))),
        },
        "SS" => Ok(TypedValue::Ss(set_members(value))),
        "NS" => {
            let members = set_members(value);
            if let Some(bad) = members.iter().find(|member| !is_number(member)) {
                return Err(fail(format!("invalid number set member: {bad}")));
            }
            Ok(TypedValue::Ns(members))
        }
        "BS" => Ok(TypedValue::Bs(
            set_members(value)
                .into_iter()
                .map(String::into_bytes)
                .collect(),
        )),
        "B" => Ok(TypedValue::B(render_plain(value).into_bytes())),
        _ => Err(fail(format!("unknown type hint: {type_hint}"))),
    }
}

fn list_from_json(values: &[Value]) -> Result<TypedValue> {
    let mut list = Vec::with_capacity(values.len());
    for value in values {
        list.push(from_json_value(value)?);
    }
    Ok(TypedValue::L(list))
}

/// Members of a hinted set: an array, a string holding a JSON array, or
/// anything else as a single member.
fn set_members(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values.iter().map(render_plain).collect(),
        Value::String(text) => match serde_json::from_str::<Vec<Value>>(text) {
            Ok(values) => values.iter().map(render_plain).collect(),
            Err(_) => vec![text.clone()],
        },
        other => vec![render_plain(other)],
    }
}

fn render_plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn number_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => {
            let text = text.trim();
            is_number(text).then(|| text.to_string())
        }
        _ => None,
    }
}

fn is_number(text: &str) -> bool {
    Number::from_str(text).is_ok()
}

fn from_json_value(value: &Value) -> Result<TypedValue> {
    match value {
        Value::String(text) => Ok(TypedValue::S(text.clone())),
        Value::Number(number) => Ok(TypedValue::N(number.to_string())),
        Value::Bool(value) => Ok(TypedValue::Bool(*value)),
        Value::Null => Ok(TypedValue::Null),
        Value::Array(values) => list_from_json(values),
        Value::Object(map) => {
            let mut result = HashMap::with_capacity(map.len());
            for (key, value) in map {
                result.insert(key.clone(), from_json_value(value)?);
            }
            Ok(TypedValue::M(result))
        }
    }
}

fn to_json_value(value: &TypedValue) -> Result<Value> {
    match value {
        TypedValue::Bool(bool_value) => Ok(Value::Bool(*bool_value)),
        TypedValue::S(string_value) => Ok(Value::String(string_value.clone())),
        TypedValue::N(number_value) => Ok(Value::Number(parse_number(number_value)?)),
        TypedValue::Null => Ok(Value::Null),
        TypedValue::L(list) => {
            let mut array = Vec::with_capacity(list.len());
            for element in list {
                array.push(to_json_value(element)?);
            }
            Ok(Value::Array(array))
        }
        TypedValue::M(map) => to_json(map),
        TypedValue::Ss(set) | TypedValue::Ns(set) => Ok(Value::Array(
            set.iter().cloned().map(Value::String).collect(),
        )),
        TypedValue::Bs(set) => Ok(Value::Array(
            set.iter()
                .map(|bytes| Value::String(String::from_utf8_lossy(bytes).into_owned()))
                .collect(),
        )),
        TypedValue::B(bytes) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

fn parse_number(text: &str) -> Result<Number> {
    Number::from_str(text).map_err(|_| JsonConversionError::InvalidNumber {
        value: text.to_string(),
    })
}
