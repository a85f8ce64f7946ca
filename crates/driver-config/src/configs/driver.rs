use driver_core::errors::{DriverError, ErrorInfo};
use driver_core::platform::Platform;
use indexmap::IndexMap;

use super::{Configuration, ConfigurationKind};
use crate::record::Record;
use crate::schema::{Fragment, Schema};
use crate::value::{EnumSpec, FieldType, Value};

const PLATFORM: EnumSpec = EnumSpec {
    label: "Platform",
    variants: Platform::NAMES,
};

/// Name of the single run emitted when no perturbation is configured.
pub const UNPERTURBED: &str = "unperturbed";

/// Named perturbation applied to one ensemble member.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDescriptor {
    /// Run directory name.
    pub name: String,
    /// Overrides keyed by configuration name or native attribute name.
    pub overrides: IndexMap<String, Value>,
}

fn check_run_name(name: &str) -> Result<(), DriverError> {
    let usable = !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\']);
    if usable {
        return Ok(());
    }
    Err(DriverError::TypeCoercion(
        ErrorInfo::new(
            "invalid_run_name",
            format!("run name \"{name}\" is not a single directory name"),
        )
        .with_context("field", "perturbations")
        .with_context("run", name)
        .with_hint("run names become directories under runs/ and cannot contain path separators"),
    ))
}

/// Target platform and run descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDriverConfig {
    record: Record,
}

fn schema() -> Result<Schema, DriverError> {
    Schema::compose(&[Fragment::new("modeldriver")
        .field("platform", FieldType::Enumerant(PLATFORM))
        .field("perturbations", FieldType::Mapping)])
}

impl ModelDriverConfig {
    /// Creates a driver record; `None` perturbations yield a single unperturbed run.
    pub fn new(
        platform: Platform,
        perturbations: Option<IndexMap<String, Value>>,
    ) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.set("platform", platform.name())?;
        if let Some(perturbations) = perturbations {
            configuration.set("perturbations", perturbations)?;
        }
        Ok(configuration)
    }

    /// Target platform.
    pub fn platform(&self) -> Result<Platform, DriverError> {
        match self.record.text("platform") {
            Some(name) => name.parse(),
            None => Err(DriverError::KeyNotFound(
                ErrorInfo::new("platform_unset", "no platform configured")
                    .with_context("record", Self::KIND.name())
                    .with_hint(format!("set platform to one of {}", Platform::NAMES.join(", "))),
            )),
        }
    }

    /// Run descriptors in insertion order.
    ///
    /// Every run name must be usable as a single directory name.
    pub fn perturbations(&self) -> Result<Vec<RunDescriptor>, DriverError> {
        let perturbations = self.record.mapping("perturbations");
        if perturbations.is_empty() {
            return Ok(vec![RunDescriptor {
                name: UNPERTURBED.to_string(),
                overrides: IndexMap::new(),
            }]);
        }
        let mut descriptors = Vec::with_capacity(perturbations.len());
        for (name, overrides) in perturbations {
            check_run_name(&name)?;
            let overrides = match overrides {
                Value::Null => IndexMap::new(),
                Value::Mapping(overrides) => overrides,
                other => {
                    return Err(DriverError::TypeCoercion(
                        ErrorInfo::new(
                            "perturbation_not_mapping",
                            format!("perturbation \"{name}\" must map names to values"),
                        )
                        .with_context("field", "perturbations")
                        .with_context("run", name.clone())
                        .with_context("value", other.to_string()),
                    ))
                }
            };
            descriptors.push(RunDescriptor { name, overrides });
        }
        Ok(descriptors)
    }
}

impl Configuration for ModelDriverConfig {
    const KIND: ConfigurationKind = ConfigurationKind::ModelDriver;

    fn blank() -> Result<Self, DriverError> {
        let mut record = Record::new(Self::KIND.name(), Self::KIND.default_filename(), schema()?);
        let mut perturbations = IndexMap::new();
        perturbations.insert(UNPERTURBED.to_string(), Value::Null);
        record.set("perturbations", perturbations)?;
        Ok(Self { record })
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
