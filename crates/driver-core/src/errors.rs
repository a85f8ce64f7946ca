//! Structured error types shared across the driver crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`DriverError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (field names, paths, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the coupled model driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum DriverError {
    /// A required configuration document is absent from a directory.
    #[error("missing configuration: {0}")]
    MissingConfiguration(ErrorInfo),
    /// Two configurations claim the same required role.
    #[error("duplicate configuration: {0}")]
    DuplicateConfiguration(ErrorInfo),
    /// A value could not be converted to the declared field type.
    #[error("type coercion error: {0}")]
    TypeCoercion(ErrorInfo),
    /// A key was looked up that does not exist.
    #[error("key not found: {0}")]
    KeyNotFound(ErrorInfo),
    /// A configuration document could not be found at the given path.
    #[error("configuration not found: {0}")]
    ConfigurationNotFound(ErrorInfo),
    /// A mandatory upstream input file is missing.
    #[error("file not found: {0}")]
    FileNotFound(ErrorInfo),
    /// Notification type configured without an address.
    #[error("missing email address: {0}")]
    MissingEmailAddress(ErrorInfo),
    /// Schema composition and registry errors.
    #[error("schema error: {0}")]
    Schema(ErrorInfo),
    /// Filesystem errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Document serialization errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl DriverError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            DriverError::MissingConfiguration(info)
            | DriverError::DuplicateConfiguration(info)
            | DriverError::TypeCoercion(info)
            | DriverError::KeyNotFound(info)
            | DriverError::ConfigurationNotFound(info)
            | DriverError::FileNotFound(info)
            | DriverError::MissingEmailAddress(info)
            | DriverError::Schema(info)
            | DriverError::Io(info)
            | DriverError::Serde(info) => info,
        }
    }

    /// Wraps a filesystem error under the provided code, recording the offending path.
    pub fn io(code: &str, path: &std::path::Path, err: impl ToString) -> Self {
        DriverError::Io(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
