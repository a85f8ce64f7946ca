//! Field schemas and the mixin fragments they are composed from.

use driver_core::errors::{DriverError, ErrorInfo};
use indexmap::IndexMap;

use crate::value::FieldType;

/// Named schema fragment contributed by a capability mixin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Name of the contributing capability.
    pub name: &'static str,
    /// Declared fields in declaration order.
    pub fields: Vec<(&'static str, FieldType)>,
}

impl Fragment {
    /// Creates an empty fragment.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Adds a field declaration.
    pub fn field(mut self, name: &'static str, field_type: FieldType) -> Self {
        self.fields.push((name, field_type));
        self
    }
}

/// Ordered field-name to semantic-type mapping of a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: IndexMap<String, FieldType>,
}

impl Schema {
    /// Merges fragments by key union.
    ///
    /// A field declared twice must carry the same type; a retyped field is rejected.
    pub fn compose(fragments: &[Fragment]) -> Result<Self, DriverError> {
        let mut schema = Schema::default();
        for fragment in fragments {
            schema.extend(fragment)?;
        }
        Ok(schema)
    }

    /// Adds every field of `fragment`, rejecting retyped fields.
    pub fn extend(&mut self, fragment: &Fragment) -> Result<(), DriverError> {
        for (name, field_type) in &fragment.fields {
            match self.fields.get(*name) {
                Some(existing) if existing != field_type => {
                    return Err(DriverError::Schema(
                        ErrorInfo::new(
                            "conflicting_field",
                            format!("fragment \"{}\" retypes field \"{name}\"", fragment.name),
                        )
                        .with_context("field", *name)
                        .with_context("declared", existing.to_string())
                        .with_context("conflicting", field_type.to_string()),
                    ));
                }
                Some(_) => {}
                None => {
                    self.fields.insert((*name).to_string(), field_type.clone());
                }
            }
        }
        Ok(())
    }

    /// Declared type of `name`.
    pub fn get(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Declared fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields.iter().map(|(name, field_type)| (name.as_str(), field_type))
    }

    pub(crate) fn register(&mut self, name: &str, field_type: FieldType) {
        self.fields.entry(name.to_string()).or_insert(field_type);
    }
}
