use std::path::PathBuf;

use chrono::Duration;
use driver_core::email::EmailType;
use driver_core::errors::DriverError;

use super::{Configuration, ConfigurationKind};
use crate::record::Record;
use crate::schema::{Fragment, Schema};
use crate::value::{EnumSpec, FieldType};

const EMAIL_TYPE: EnumSpec = EnumSpec {
    label: "EmailType",
    variants: EmailType::NAMES,
};

/// Batch scheduler request shared by every job of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SlurmConfig {
    record: Record,
}

fn schema() -> Result<Schema, DriverError> {
    Schema::compose(&[Fragment::new("slurm")
        .field("account", FieldType::Text)
        .field("tasks", FieldType::Integer)
        .field("partition", FieldType::Text)
        .field("job_duration", FieldType::Duration)
        .field("run_directory", FieldType::Path)
        .field("run_name", FieldType::Text)
        .field("email_type", FieldType::Enumerant(EMAIL_TYPE))
        .field("email_address", FieldType::Text)
        .field("log_filename", FieldType::Path)
        .field("modules", FieldType::List(Box::new(FieldType::Text)))
        .field("path_prefix", FieldType::Path)
        .field("extra_commands", FieldType::List(Box::new(FieldType::Text)))
        .field("launcher", FieldType::Text)
        .field("nodes", FieldType::Integer)])
}

impl SlurmConfig {
    /// Creates a scheduler request for `tasks` processes.
    pub fn new(
        account: Option<&str>,
        tasks: u32,
        job_duration: Option<Duration>,
    ) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.set("account", account)?;
        configuration.set("tasks", tasks)?;
        configuration.set("job_duration", job_duration)?;
        Ok(configuration)
    }

    /// Sets the notification address; the type defaults to `ALL` when not given.
    pub fn set_email(
        &mut self,
        address: &str,
        email_type: Option<EmailType>,
    ) -> Result<(), DriverError> {
        let email_type = email_type
            .or_else(|| self.email_type())
            .unwrap_or(EmailType::All);
        self.set("email_address", address)?;
        self.set("email_type", email_type.name())
    }

    /// Charged account.
    pub fn account(&self) -> Option<String> {
        self.record.text("account")
    }

    /// Requested task count.
    pub fn tasks(&self) -> Option<u32> {
        self.record
            .integer("tasks")
            .and_then(|tasks| u32::try_from(tasks).ok())
    }

    /// Requested partition.
    pub fn partition(&self) -> Option<String> {
        self.record.text("partition")
    }

    /// Wall-clock limit.
    pub fn job_duration(&self) -> Option<Duration> {
        self.record.duration("job_duration")
    }

    /// Working directory directive.
    pub fn run_directory(&self) -> Option<PathBuf> {
        self.record.path("run_directory")
    }

    /// Job name.
    pub fn run_name(&self) -> Option<String> {
        self.record.text("run_name")
    }

    /// Notification type.
    pub fn email_type(&self) -> Option<EmailType> {
        self.record
            .text("email_type")
            .and_then(|name| name.parse().ok())
    }

    /// Notification address.
    pub fn email_address(&self) -> Option<String> {
        self.record.text("email_address")
    }

    /// Output log file.
    pub fn log_filename(&self) -> Option<PathBuf> {
        self.record.path("log_filename")
    }

    /// Environment modules loaded before running.
    pub fn modules(&self) -> Vec<String> {
        self.record.texts("modules")
    }

    /// Directory prepended to `PATH`.
    pub fn path_prefix(&self) -> Option<String> {
        self.record.text("path_prefix")
    }

    /// Commands appended to the ensemble run script.
    pub fn extra_commands(&self) -> Vec<String> {
        self.record.texts("extra_commands")
    }

    /// Launcher overriding the platform default.
    pub fn launcher(&self) -> Option<String> {
        self.record.text("launcher")
    }

    /// Requested node count.
    pub fn nodes(&self) -> Option<u32> {
        self.record
            .integer("nodes")
            .and_then(|nodes| u32::try_from(nodes).ok())
    }
}

impl Configuration for SlurmConfig {
    const KIND: ConfigurationKind = ConfigurationKind::Slurm;

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
