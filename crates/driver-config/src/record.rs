//! Named record holding schema-typed values.

use std::path::{Path, PathBuf};

use driver_core::errors::{DriverError, ErrorInfo};
use driver_core::files::{write_guarded, WriteOutcome};
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use tracing::{debug, info};

use crate::schema::Schema;
use crate::serde::{read_document, to_document_bytes};
use crate::value::{FieldType, Value};

/// One named configuration aspect: a schema plus the values assigned to it.
///
/// Every key in the value store has an entry in the schema. Unknown keys widen the schema
/// with the type inferred from the first value assigned to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    default_filename: String,
    schema: Schema,
    values: IndexMap<String, Value>,
}

impl Record {
    /// Creates a record with every declared field unset.
    pub fn new(name: impl Into<String>, default_filename: impl Into<String>, schema: Schema) -> Self {
        let values = schema
            .iter()
            .map(|(field, _)| (field.to_string(), Value::Null))
            .collect();
        Self {
            name: name.into(),
            default_filename: default_filename.into(),
            schema,
            values,
        }
    }

    /// Stable identifier of the record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name used when writing into a directory.
    pub fn default_filename(&self) -> &str {
        &self.default_filename
    }

    /// Current field schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Assigned values in schema order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Assigns `value` to `key`, coercing it to the declared type.
    ///
    /// A key missing from the schema is registered with the inferred type of `value`.
    /// A failed coercion leaves the record unchanged.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), DriverError> {
        let key = key.to_lowercase();
        let value = value.into();
        match self.schema.get(&key) {
            Some(field_type) => {
                let coerced = field_type.coerce(&key, value)?;
                self.values.insert(key, coerced);
            }
            None => {
                let field_type = FieldType::infer(&value);
                let coerced = field_type.coerce(&key, value)?;
                info!(
                    record = %self.name,
                    field = %key,
                    field_type = %field_type,
                    "adding field to configuration schema"
                );
                self.schema.register(&key, field_type);
                self.values.insert(key, coerced);
            }
        }
        Ok(())
    }

    /// Assigns several values in order, stopping at the first failure.
    pub fn update<K, V, I>(&mut self, values: I) -> Result<(), DriverError>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in values {
            self.set(key.as_ref(), value)?;
        }
        Ok(())
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Result<&Value, DriverError> {
        let key = key.to_lowercase();
        self.values.get(&key).ok_or_else(|| {
            DriverError::KeyNotFound(
                ErrorInfo::new("field_missing", format!("\"{key}\" not in \"{}\"", self.name))
                    .with_context("record", self.name.clone())
                    .with_context("field", key),
            )
        })
    }

    /// Value stored under `key`, or `None` when the key is absent or unset.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|value| !value.is_null())
    }

    /// Scalar under `key` rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        self.value(key).and_then(Value::as_text)
    }

    /// Integer under `key`.
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.value(key).and_then(Value::as_integer)
    }

    /// Number under `key`.
    pub fn float(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(Value::as_float)
    }

    /// Flag under `key`, falling back to `default` when unset.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.value(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Path under `key`.
    pub fn path(&self, key: &str) -> Option<PathBuf> {
        self.value(key).and_then(Value::as_path).map(Path::to_path_buf)
    }

    /// Duration under `key`.
    pub fn duration(&self, key: &str) -> Option<chrono::Duration> {
        self.value(key).and_then(Value::as_duration)
    }

    /// Timestamp under `key`.
    pub fn timestamp(&self, key: &str) -> Option<chrono::NaiveDateTime> {
        self.value(key).and_then(Value::as_timestamp)
    }

    /// List of scalars under `key` rendered as text; unset yields an empty list.
    pub fn texts(&self, key: &str) -> Vec<String> {
        self.value(key)
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_text).collect())
            .unwrap_or_default()
    }

    /// Mapping under `key`; unset yields an empty mapping.
    pub fn mapping(&self, key: &str) -> IndexMap<String, Value> {
        self.value(key)
            .and_then(Value::as_mapping)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `key` exists in the record.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(&key.to_lowercase())
    }

    /// Canonical ordered document with lower-cased keys and document-safe values.
    pub fn to_document(&self) -> Map<String, Json> {
        self.values
            .iter()
            .map(|(key, value)| (key.to_lowercase(), value.to_json()))
            .collect()
    }

    /// Writes the canonical document to `path`.
    ///
    /// A directory target receives the default file name; an existing file is kept unless
    /// `overwrite` is set.
    pub fn write(&self, path: &Path, overwrite: bool) -> Result<WriteOutcome, DriverError> {
        let target = self.target_path(path);
        let bytes = to_document_bytes(&Json::Object(self.to_document()))?;
        let outcome = write_guarded(&target, bytes, overwrite)?;
        if !outcome.written() {
            debug!(path = %target.display(), "skipping existing configuration document");
        }
        Ok(outcome)
    }

    /// Resolves a write or read target, appending the default file name to directories.
    pub fn target_path(&self, path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(&self.default_filename)
        } else {
            path.to_path_buf()
        }
    }

    /// Loads values from the document at `path` into this record.
    pub fn load(&mut self, path: &Path) -> Result<(), DriverError> {
        let document = read_document(&self.target_path(path))?;
        self.load_document(document)
    }

    /// Loads values from an already parsed document.
    pub fn load_document(&mut self, document: Map<String, Json>) -> Result<(), DriverError> {
        for (key, value) in document {
            self.set(&key.to_lowercase(), Value::from_json(value))?;
        }
        Ok(())
    }

    /// Rewrites the named path fields in place.
    pub(crate) fn map_paths<F>(&mut self, fields: &[&str], mut rewrite: F)
    where
        F: FnMut(&Path) -> Option<PathBuf>,
    {
        for field in fields {
            if let Some(Value::Path(path)) = self.values.get_mut(*field) {
                if let Some(rewritten) = rewrite(path) {
                    *path = rewritten;
                }
            }
        }
    }
}
