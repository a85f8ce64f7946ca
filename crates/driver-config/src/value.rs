//! Semantic field types, field values and coercion between them.

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use driver_core::errors::{DriverError, ErrorInfo};
use driver_core::paths::posix_string;
use driver_core::time::{
    duration_from_seconds, format_duration, format_timestamp, parse_duration, parse_timestamp,
};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};

/// Closed set of names accepted by an enumerant field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumSpec {
    /// Name of the enumeration, used in diagnostics.
    pub label: &'static str,
    /// Declared variant names; documents store these verbatim.
    pub variants: &'static [&'static str],
}

impl EnumSpec {
    /// Matches `value` against the declared names, ignoring case.
    pub fn resolve(&self, value: &str) -> Option<&'static str> {
        let value = value.trim();
        self.variants
            .iter()
            .find(|variant| variant.eq_ignore_ascii_case(value))
            .copied()
    }
}

/// Semantic type of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// `true` / `false`.
    Bool,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// Free text.
    Text,
    /// Filesystem path.
    Path,
    /// Time span, written as `HH:MM:SS.f`.
    Duration,
    /// Calendar timestamp.
    Timestamp,
    /// One of a fixed set of names.
    Enumerant(EnumSpec),
    /// Homogeneous list.
    List(Box<FieldType>),
    /// Nested string-keyed mapping.
    Mapping,
    /// Accepts any value unchanged.
    Any,
}

/// Value stored in a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unset.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Float.
    Float(f64),
    /// Text.
    Text(String),
    /// Path.
    Path(PathBuf),
    /// Duration.
    Duration(Duration),
    /// Timestamp without zone.
    Timestamp(NaiveDateTime),
    /// Declared enumerant name.
    Enumerant(String),
    /// List of values.
    List(Vec<Value>),
    /// Ordered nested mapping.
    Mapping(IndexMap<String, Value>),
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl FieldType {
    /// Infers the field type registered for a previously unknown key.
    pub fn infer(value: &Value) -> FieldType {
        match value {
            Value::Null => FieldType::Any,
            Value::Bool(_) => FieldType::Bool,
            Value::Integer(_) => FieldType::Integer,
            Value::Float(_) => FieldType::Float,
            Value::Text(_) | Value::Enumerant(_) => FieldType::Text,
            Value::Path(_) => FieldType::Path,
            Value::Duration(_) => FieldType::Duration,
            Value::Timestamp(_) => FieldType::Timestamp,
            Value::List(items) => {
                let mut inferred = items.iter().filter(|item| !item.is_null()).map(FieldType::infer);
                let item_type = match inferred.next() {
                    Some(first) if inferred.all(|other| other == first) => first,
                    _ => FieldType::Any,
                };
                FieldType::List(Box::new(item_type))
            }
            Value::Mapping(_) => FieldType::Mapping,
        }
    }

    /// Converts `value` to this type, failing with a coercion error naming `field`.
    pub fn coerce(&self, field: &str, value: Value) -> Result<Value, DriverError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let shown = value.to_string();
        let coerced = match (self, value) {
            (FieldType::Any, value) => Some(value),
            (FieldType::Bool, Value::Bool(flag)) => Some(Value::Bool(flag)),
            (FieldType::Bool, Value::Integer(number)) if number == 0 || number == 1 => {
                Some(Value::Bool(number == 1))
            }
            (FieldType::Bool, Value::Text(text)) => parse_bool(&text).map(Value::Bool),
            (FieldType::Integer, Value::Integer(number)) => Some(Value::Integer(number)),
            (FieldType::Integer, Value::Float(number))
                if number.is_finite() && number.fract() == 0.0 =>
            {
                Some(Value::Integer(number as i64))
            }
            (FieldType::Integer, Value::Text(text)) => text.trim().parse().ok().map(Value::Integer),
            (FieldType::Float, Value::Float(number)) => Some(Value::Float(number)),
            (FieldType::Float, Value::Integer(number)) => Some(Value::Float(number as f64)),
            (FieldType::Float, Value::Text(text)) => text.trim().parse().ok().map(Value::Float),
            (FieldType::Text, Value::Text(text)) => Some(Value::Text(text)),
            (FieldType::Text, Value::List(_)) | (FieldType::Text, Value::Mapping(_)) => None,
            (FieldType::Text, other) => other.as_text().map(Value::Text),
            (FieldType::Path, Value::Path(path)) => Some(Value::Path(path)),
            (FieldType::Path, Value::Text(text)) => Some(Value::Path(PathBuf::from(text))),
            (FieldType::Duration, Value::Duration(duration)) => Some(Value::Duration(duration)),
            (FieldType::Duration, Value::Text(text)) => parse_duration(&text).ok().map(Value::Duration),
            (FieldType::Duration, Value::Integer(seconds)) => {
                Duration::try_seconds(seconds).map(Value::Duration)
            }
            (FieldType::Duration, Value::Float(seconds)) => {
                duration_from_seconds(seconds).map(Value::Duration)
            }
            (FieldType::Timestamp, Value::Timestamp(timestamp)) => Some(Value::Timestamp(timestamp)),
            (FieldType::Timestamp, Value::Text(text)) => {
                parse_timestamp(&text).ok().map(Value::Timestamp)
            }
            (FieldType::Enumerant(spec), Value::Text(text))
            | (FieldType::Enumerant(spec), Value::Enumerant(text)) => spec
                .resolve(&text)
                .map(|name| Value::Enumerant(name.to_string())),
            (FieldType::List(item_type), Value::List(items)) => {
                let items = items
                    .into_iter()
                    .map(|item| item_type.coerce(field, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Some(Value::List(items))
            }
            (FieldType::List(item_type), scalar) => {
                Some(Value::List(vec![item_type.coerce(field, scalar)?]))
            }
            (FieldType::Mapping, Value::Mapping(entries)) => Some(Value::Mapping(entries)),
            (FieldType::Mapping, Value::Text(text)) => serde_json::from_str::<Json>(&text)
                .ok()
                .map(Value::from_json)
                .filter(|parsed| matches!(parsed, Value::Mapping(_))),
            _ => None,
        };
        coerced.ok_or_else(|| {
            let hint = match self {
                FieldType::Enumerant(spec) => Some(format!("must be one of {}", spec.variants.join(", "))),
                _ => None,
            };
            let info = ErrorInfo::new(
                "type_coercion",
                format!("cannot convert {shown} to {self} for field \"{field}\""),
            )
            .with_context("field", field)
            .with_context("expected", self.to_string())
            .with_context("value", shown);
            DriverError::TypeCoercion(match hint {
                Some(hint) => info.with_hint(hint),
                None => info,
            })
        })
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => f.write_str("bool"),
            FieldType::Integer => f.write_str("integer"),
            FieldType::Float => f.write_str("float"),
            FieldType::Text => f.write_str("string"),
            FieldType::Path => f.write_str("path"),
            FieldType::Duration => f.write_str("duration"),
            FieldType::Timestamp => f.write_str("timestamp"),
            FieldType::Enumerant(spec) => write!(f, "enum {}", spec.label),
            FieldType::List(item) => write!(f, "list<{item}>"),
            FieldType::Mapping => f.write_str("mapping"),
            FieldType::Any => f.write_str("any"),
        }
    }
}

impl Value {
    /// Whether the value is unset.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Integer payload.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(number) => Some(*number),
            _ => None,
        }
    }

    /// Numeric payload, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(number) => Some(*number),
            Value::Integer(number) => Some(*number as f64),
            _ => None,
        }
    }

    /// Borrowed text of a text or enumerant value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) | Value::Enumerant(text) => Some(text),
            _ => None,
        }
    }

    /// Scalar rendered as document text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Bool(flag) => Some(flag.to_string()),
            Value::Integer(number) => Some(number.to_string()),
            Value::Float(number) => Some(number.to_string()),
            Value::Text(text) | Value::Enumerant(text) => Some(text.clone()),
            Value::Path(path) => Some(posix_string(path)),
            Value::Duration(duration) => Some(format_duration(duration)),
            Value::Timestamp(timestamp) => Some(format_timestamp(timestamp)),
            Value::Null | Value::List(_) | Value::Mapping(_) => None,
        }
    }

    /// Path payload.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Duration payload.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::Duration(duration) => Some(*duration),
            _ => None,
        }
    }

    /// Timestamp payload.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(timestamp) => Some(*timestamp),
            _ => None,
        }
    }

    /// List payload.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Mapping payload.
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Converts into a document-safe JSON value.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(flag) => Json::Bool(*flag),
            Value::Integer(number) => Json::Number((*number).into()),
            Value::Float(number) => Number::from_f64(*number).map(Json::Number).unwrap_or(Json::Null),
            Value::Text(text) | Value::Enumerant(text) => Json::String(text.clone()),
            Value::Path(path) => Json::String(posix_string(path)),
            Value::Duration(duration) => Json::String(format_duration(duration)),
            Value::Timestamp(timestamp) => Json::String(format_timestamp(timestamp)),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Mapping(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// Builds an untyped value from parsed JSON; record assignment applies field types.
    pub fn from_json(json: Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(flag) => Value::Bool(flag),
            Json::Number(number) => match number.as_i64() {
                Some(integer) => Value::Integer(integer),
                None => number.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            Json::String(text) => Value::Text(text),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            Json::Object(entries) => Value::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from_json(value)))
                    .collect(),
            ),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<PathBuf> for Value {
    fn from(value: PathBuf) -> Self {
        Value::Path(value)
    }
}

impl From<&Path> for Value {
    fn from(value: &Path) -> Self {
        Value::Path(value.to_path_buf())
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Value::Duration(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(value: IndexMap<String, Value>) -> Self {
        Value::Mapping(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
