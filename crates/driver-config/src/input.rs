//! "From user input" resolution of configuration records.

use std::path::{Path, PathBuf};

use driver_core::errors::{DriverError, ErrorInfo};

use crate::configs::{
    AdcircConfig, AtmeshForcingConfig, BestTrackForcingConfig, ConfigurationEntry,
    ConfigurationKind, ForcingConfig, ModelDriverConfig, NemsConfig, OwiForcingConfig,
    SlurmConfig, TidalForcingConfig, Ww3DataForcingConfig,
};
use crate::native::NativeForcing;
use crate::serde::parse_document;

/// Anything a caller may hand to [`crate::RunConfiguration::insert`].
#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    /// An already typed record.
    Entry(ConfigurationEntry),
    /// A native forcing object.
    Forcing(NativeForcing),
    /// Path to a document, or to a directory holding the default file name.
    Path(PathBuf),
    /// Either a document path or an inline document.
    Text(String),
}

fn configuration_kind(name: &str) -> Result<ConfigurationKind, DriverError> {
    ConfigurationKind::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = ConfigurationKind::ALL.iter().map(|kind| kind.name()).collect();
        DriverError::Schema(
            ErrorInfo::new(
                "unknown_configuration",
                format!("no configuration record named \"{name}\""),
            )
            .with_context("name", name)
            .with_hint(format!("known records: {}", known.join(", "))),
        )
    })
}

impl UserInput {
    /// Turns the input into a record for the configuration called `name`.
    ///
    /// Text naming an existing file is read as a document path; any other text is parsed as
    /// an inline document. Native forcings dispatch on their kind and ignore `name`.
    pub fn resolve(self, name: &str) -> Result<ConfigurationEntry, DriverError> {
        match self {
            UserInput::Entry(entry) => Ok(entry),
            UserInput::Forcing(native) => Ok(ForcingConfig::from_native(native)?.into()),
            UserInput::Path(path) => ConfigurationEntry::read(configuration_kind(name)?, &path),
            UserInput::Text(text) => {
                let kind = configuration_kind(name)?;
                let candidate = Path::new(text.trim());
                if candidate.exists() {
                    ConfigurationEntry::read(kind, candidate)
                } else {
                    ConfigurationEntry::from_document(kind, parse_document(text.as_bytes())?)
                }
            }
        }
    }
}

macro_rules! entry_input {
    ($($record:ty),* $(,)?) => {
        $(
            impl From<$record> for UserInput {
                fn from(value: $record) -> Self {
                    UserInput::Entry(value.into())
                }
            }
        )*
    };
}

entry_input!(
    ConfigurationEntry,
    ForcingConfig,
    ModelDriverConfig,
    SlurmConfig,
    NemsConfig,
    AdcircConfig,
    TidalForcingConfig,
    BestTrackForcingConfig,
    OwiForcingConfig,
    AtmeshForcingConfig,
    Ww3DataForcingConfig,
);

impl From<NativeForcing> for UserInput {
    fn from(value: NativeForcing) -> Self {
        UserInput::Forcing(value)
    }
}

impl From<PathBuf> for UserInput {
    fn from(value: PathBuf) -> Self {
        UserInput::Path(value)
    }
}

impl From<&Path> for UserInput {
    fn from(value: &Path) -> Self {
        UserInput::Path(value.to_path_buf())
    }
}

impl From<String> for UserInput {
    fn from(value: String) -> Self {
        UserInput::Text(value)
    }
}

impl From<&str> for UserInput {
    fn from(value: &str) -> Self {
        UserInput::Text(value.to_string())
    }
}
