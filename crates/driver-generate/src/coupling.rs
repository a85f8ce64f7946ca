//! Coupling layer configuration files.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use driver_config::{CouplingEntry, ModelType, NemsConfig, RunConfiguration};
use driver_core::errors::{DriverError, ErrorInfo};
use driver_core::files::{write_guarded, WriteOutcome};
use driver_core::time::{duration_seconds, offset_timestamp};

use crate::state::RunPhase;

/// Component sequencing file.
pub const NEMS_CONFIGURE: &str = "nems.configure";
/// Time window and processor count file.
pub const MODEL_CONFIGURE: &str = "model_configure";
/// Component directory and namelist file.
pub const CONFIG_RC: &str = "config.rc";

/// Every coupling file, in writing order.
pub const COUPLING_FILENAMES: [&str; 3] = [NEMS_CONFIGURE, MODEL_CONFIGURE, CONFIG_RC];

/// Coupling files suffixed with the phase they belong to, e.g. `nems.configure.coldstart`.
pub fn phase_filename(filename: &str, phase: RunPhase) -> String {
    format!("{filename}.{phase}")
}

/// One component with its processor range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Coupling entry of the component.
    pub entry: CouplingEntry,
    /// First processor index.
    pub first: u32,
    /// Last processor index.
    pub last: u32,
}

/// Coupled run for one phase: time window, components and run sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelingSystem {
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    interval: Duration,
    components: Vec<Component>,
    connections: Vec<(String, String)>,
    mediations: Vec<String>,
    sequence: Vec<String>,
}

fn unset(field: &str) -> DriverError {
    DriverError::KeyNotFound(
        ErrorInfo::new("coupling_field_unset", format!("coupling field \"{field}\" is not set"))
            .with_context("field", field)
            .with_context("record", "nems"),
    )
}

fn assign_processors(mut entries: Vec<CouplingEntry>) -> Result<Vec<Component>, DriverError> {
    entries.sort_by_key(|entry| entry.model_type);
    let mut next: u32 = 0;
    let mut components = Vec::with_capacity(entries.len());
    for entry in entries {
        let first = next;
        next = first.checked_add(entry.processors.max(1)).ok_or_else(|| {
            DriverError::TypeCoercion(
                ErrorInfo::new(
                    "processor_count_overflow",
                    format!(
                        "{} processors for {} exceed the petlist range",
                        entry.processors, entry.model_type
                    ),
                )
                .with_context("model", entry.model_type.to_string())
                .with_context("processors", entry.processors.to_string()),
            )
        })?;
        components.push(Component { entry, first, last: next - 1 });
    }
    Ok(components)
}

impl ModelingSystem {
    /// Coupled run of `phase`.
    ///
    /// The coldstart of a spun-up run couples only the ocean over the spin-up window; every
    /// other phase couples every participant over the modeled window.
    pub fn from_configuration(
        configuration: &RunConfiguration,
        phase: RunPhase,
    ) -> Result<Self, DriverError> {
        let nems: &NemsConfig = configuration.nems().ok_or_else(|| {
            DriverError::MissingConfiguration(
                ErrorInfo::new("coupling_missing", "run configuration has no \"nems\" record")
                    .with_context("configuration", "nems"),
            )
        })?;
        let start_time = nems.modeled_start_time().ok_or_else(|| unset("modeled_start_time"))?;
        let end_time = nems.modeled_end_time().ok_or_else(|| unset("modeled_end_time"))?;
        let interval = nems.interval().ok_or_else(|| unset("interval"))?;
        let entries = configuration.coupling_entries()?;
        let spinup = configuration.adcirc()?.tidal_spinup_duration();

        match (phase, spinup) {
            (RunPhase::Coldstart, Some(spinup)) => Ok(Self {
                start_time: offset_timestamp(start_time, -spinup, "tidal_spinup_duration")?,
                end_time: start_time,
                interval,
                components: assign_processors(
                    entries
                        .into_iter()
                        .filter(|entry| entry.model_type == ModelType::Ocean)
                        .collect(),
                )?,
                connections: Vec::new(),
                mediations: Vec::new(),
                sequence: Vec::new(),
            }),
            _ => Ok(Self {
                start_time,
                end_time,
                interval,
                components: assign_processors(entries)?,
                connections: nems.connections(),
                mediations: nems.mediations(),
                sequence: nems.sequence(),
            }),
        }
    }

    /// Components with their processor ranges, in slot order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Total processors over every component.
    pub fn processors(&self) -> u32 {
        self.components
            .last()
            .map(|component| component.last + 1)
            .unwrap_or(0)
    }

    fn run_sequence(&self) -> Vec<String> {
        if !self.sequence.is_empty() {
            return self.sequence.clone();
        }
        let mut lines: Vec<String> = self
            .connections
            .iter()
            .map(|(source, target)| format!("{source} -> {target}   :remapMethod=redist"))
            .collect();
        lines.extend(self.mediations.iter().map(|mediation| format!("MED {mediation}")));
        lines.extend(
            self.components
                .iter()
                .map(|component| component.entry.model_type.code().to_string()),
        );
        lines
    }

    /// `nems.configure` text.
    pub fn nems_configure(&self) -> String {
        let codes: Vec<&str> = self
            .components
            .iter()
            .map(|component| component.entry.model_type.code())
            .collect();
        let mut lines = vec![
            "# EARTH #".to_string(),
            format!("EARTH_component_list: {}", codes.join(" ")),
            "EARTH_attributes::".to_string(),
            "  Verbosity = off".to_string(),
            "::".to_string(),
        ];
        for component in &self.components {
            let code = component.entry.model_type.code();
            lines.push(String::new());
            lines.push(format!("# {code} #"));
            lines.push(format!("{:<32}{}", format!("{code}_model:"), component.entry.model.to_lowercase()));
            lines.push(format!(
                "{:<32}{} {}",
                format!("{code}_petlist_bounds:"),
                component.first,
                component.last
            ));
            lines.push(format!("{code}_attributes::"));
            lines.push("  Verbosity = off".to_string());
            for (key, value) in &component.entry.parameters {
                lines.push(format!("  {key} = {value}"));
            }
            lines.push("::".to_string());
        }
        lines.push(String::new());
        lines.push("# Run Sequence #".to_string());
        lines.push("runSeq::".to_string());
        lines.push(format!("  @{}", duration_seconds(&self.interval).round() as i64));
        lines.extend(self.run_sequence().into_iter().map(|line| format!("    {line}")));
        lines.push("  @".to_string());
        lines.push("::".to_string());
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// `model_configure` text.
    pub fn model_configure(&self) -> String {
        let hours = duration_seconds(&(self.end_time - self.start_time)) / 3600.0;
        let start = self.start_time;
        let entries = [
            ("total_member", "1".to_string()),
            ("print_esmf", ".true.".to_string()),
            ("namelist", "atm_namelist".to_string()),
            ("PE_MEMBER01", self.processors().to_string()),
            ("start_year", start.year().to_string()),
            ("start_month", start.month().to_string()),
            ("start_day", start.day().to_string()),
            ("start_hour", start.hour().to_string()),
            ("start_minute", start.minute().to_string()),
            ("start_second", start.second().to_string()),
            ("nhours_fcst", format!("{}", hours.round() as i64)),
            ("RUN_CONTINUE", ".false.".to_string()),
            ("ENS_SPS", ".false.".to_string()),
        ];
        entries
            .iter()
            .map(|(key, value)| format!("{:<25}{value}\n", format!("{key}:")))
            .collect()
    }

    /// `config.rc` text.
    pub fn config_rc(&self) -> String {
        self.components
            .iter()
            .map(|component| {
                let slot = component.entry.model_type.code().to_lowercase();
                let model = component.entry.model.to_lowercase();
                format!(" {slot}_dir: {model}\n {slot}_nml: {model}.nml\n")
            })
            .collect()
    }

    /// Writes the three coupling files into `directory`, suffixed with `phase`.
    pub fn write(
        &self,
        directory: &Path,
        phase: RunPhase,
        overwrite: bool,
    ) -> Result<Vec<WriteOutcome>, DriverError> {
        let contents = [self.nems_configure(), self.model_configure(), self.config_rc()];
        COUPLING_FILENAMES
            .iter()
            .zip(contents)
            .map(|(filename, text)| {
                let path: PathBuf = directory.join(phase_filename(filename, phase));
                write_guarded(&path, text, overwrite)
            })
            .collect()
    }
}
