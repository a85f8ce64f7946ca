//! Reading and writing record documents.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use driver_core::errors::{DriverError, ErrorInfo};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

fn serde_error(code: &str, err: impl ToString) -> DriverError {
    DriverError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Serializes a value into indented JSON bytes with a trailing newline.
pub fn to_document_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, DriverError> {
    let mut bytes =
        serde_json::to_vec_pretty(value).map_err(|err| serde_error("json_serialize", err))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Deserializes a value from JSON bytes.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, DriverError> {
    serde_json::from_slice(data).map_err(|err| serde_error("json_deserialize", err))
}

/// Parses JSON text that must hold a top-level mapping.
pub fn parse_document(data: &[u8]) -> Result<Map<String, Value>, DriverError> {
    match from_json_slice::<Value>(data)? {
        Value::Object(map) => Ok(map),
        other => Err(DriverError::Serde(
            ErrorInfo::new("document_not_mapping", "configuration document is not a mapping")
                .with_context("found", type_name(&other)),
        )),
    }
}

/// Reads a configuration document from disk.
pub fn read_document(path: &Path) -> Result<Map<String, Value>, DriverError> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => DriverError::ConfigurationNotFound(
            ErrorInfo::new("document_missing", format!("no configuration at \"{}\"", path.display()))
                .with_context("path", path.display().to_string()),
        ),
        _ => DriverError::io("document_read", path, err),
    })?;
    parse_document(&bytes).map_err(|err| match err {
        DriverError::Serde(info) => {
            DriverError::Serde(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
