use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use driver_core::errors::DriverError;

use super::{Configuration, ConfigurationKind};
use crate::native::ModelType;
use crate::record::Record;
use crate::schema::{Fragment, Schema};
use crate::value::{FieldType, Value};

/// Coupling layer executable, window and sequencing.
#[derive(Debug, Clone, PartialEq)]
pub struct NemsConfig {
    record: Record,
}

fn schema() -> Result<Schema, DriverError> {
    let text_list = || FieldType::List(Box::new(FieldType::Text));
    Schema::compose(&[Fragment::new("nems")
        .field("executable_path", FieldType::Path)
        .field("modeled_start_time", FieldType::Timestamp)
        .field("modeled_end_time", FieldType::Timestamp)
        .field("interval", FieldType::Duration)
        .field("connections", FieldType::List(Box::new(text_list())))
        .field("mediations", text_list())
        .field("sequence", text_list())])
}

impl NemsConfig {
    /// Creates a coupling record.
    pub fn new(
        executable_path: &Path,
        modeled_start_time: NaiveDateTime,
        modeled_end_time: NaiveDateTime,
        interval: Duration,
    ) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.set("executable_path", executable_path)?;
        configuration.set("modeled_start_time", modeled_start_time)?;
        configuration.set("modeled_end_time", modeled_end_time)?;
        configuration.set("interval", interval)?;
        Ok(configuration)
    }

    /// Adds a `source -> target` connection.
    pub fn connect(&mut self, source: ModelType, target: ModelType) -> Result<(), DriverError> {
        let mut connections = self
            .record
            .value("connections")
            .and_then(Value::as_list)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        connections.push(Value::from(vec![source.code(), target.code()]));
        self.set("connections", connections)
    }

    /// Coupling executable.
    pub fn executable_path(&self) -> Option<PathBuf> {
        self.record.path("executable_path")
    }

    /// First coupled time.
    pub fn modeled_start_time(&self) -> Option<NaiveDateTime> {
        self.record.timestamp("modeled_start_time")
    }

    /// Last coupled time.
    pub fn modeled_end_time(&self) -> Option<NaiveDateTime> {
        self.record.timestamp("modeled_end_time")
    }

    /// Coupling exchange interval.
    pub fn interval(&self) -> Option<Duration> {
        self.record.duration("interval")
    }

    /// `(source, target)` component pairs.
    pub fn connections(&self) -> Vec<(String, String)> {
        self.record
            .value("connections")
            .and_then(Value::as_list)
            .map(|pairs| {
                pairs
                    .iter()
                    .filter_map(Value::as_list)
                    .filter_map(|pair| match pair {
                        [source, target] => Some((source.as_text()?, target.as_text()?)),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mediator operations.
    pub fn mediations(&self) -> Vec<String> {
        self.record.texts("mediations")
    }

    /// Explicit run sequence; empty means every component in slot order.
    pub fn sequence(&self) -> Vec<String> {
        self.record.texts("sequence")
    }
}

impl Configuration for NemsConfig {
    const KIND: ConfigurationKind = ConfigurationKind::Nems;

    fn blank() -> Result<Self, DriverError> {
        Ok(Self {
            record: Record::new(Self::KIND.name(), Self::KIND.default_filename(), schema()?),
        })
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
