use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use driver_core::errors::DriverError;
use indexmap::IndexMap;

use super::{Configuration, ConfigurationKind};
use crate::mixins::{self, CouplingParticipant};
use crate::native::{CouplingEntry, ForcingKind, ModelType};
use crate::record::Record;
use crate::schema::{Fragment, Schema};
use crate::value::{EnumSpec, FieldType, Value};

/// Accepted solution schemes for the continuity equation.
pub const GWCE_SOLUTION_SCHEMES: &[&str] = &["explicit", "semi-implicit", "semi-implicit-legacy"];

const GWCE_SOLUTION_SCHEME: EnumSpec = EnumSpec {
    label: "GWCESolutionScheme",
    variants: GWCE_SOLUTION_SCHEMES,
};

const DEFAULT_PROCESSORS: u32 = 11;

/// Ocean circulation model record.
#[derive(Debug, Clone, PartialEq)]
pub struct AdcircConfig {
    record: Record,
    forcings: Vec<ForcingKind>,
}

fn schema() -> Result<Schema, DriverError> {
    let adcirc = Fragment::new("adcirc")
        .field("adcirc_executable_path", FieldType::Path)
        .field("adcprep_executable_path", FieldType::Path)
        .field("aswip_executable_path", FieldType::Path)
        .field("fort_13_path", FieldType::Path)
        .field("fort_14_path", FieldType::Path)
        .field("tidal_spinup_duration", FieldType::Duration)
        .field("tidal_spinup_timestep", FieldType::Duration)
        .field("gwce_solution_scheme", FieldType::Enumerant(GWCE_SOLUTION_SCHEME))
        .field("use_smagorinsky", FieldType::Bool)
        .field("use_original_mesh", FieldType::Bool)
        .field("output_surface", FieldType::Bool)
        .field("surface_output_interval", FieldType::Duration)
        .field("output_stations", FieldType::Bool)
        .field("stations_output_interval", FieldType::Duration)
        .field("stations_file_path", FieldType::Path)
        .field("output_spinup", FieldType::Bool)
        .field("output_elevations", FieldType::Bool)
        .field("output_velocities", FieldType::Bool)
        .field("output_concentrations", FieldType::Bool)
        .field("output_meteorological_factors", FieldType::Bool);
    Schema::compose(&[
        mixins::model(),
        mixins::scheduler_binding(),
        mixins::coupling_cap(),
        mixins::attributes(),
        adcirc,
    ])
}

impl AdcircConfig {
    /// Creates a model record over the mesh at `fort_14_path`.
    pub fn new(
        fort_14_path: &Path,
        modeled_start_time: NaiveDateTime,
        modeled_end_time: NaiveDateTime,
        modeled_timestep: Duration,
    ) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.set("fort_14_path", fort_14_path)?;
        configuration.set("modeled_start_time", modeled_start_time)?;
        configuration.set("modeled_end_time", modeled_end_time)?;
        configuration.set("modeled_timestep", modeled_timestep)?;
        Ok(configuration)
    }

    /// Records that a forcing of `kind` drives the model.
    pub fn attach_forcing(&mut self, kind: ForcingKind) {
        if !self.forcings.contains(&kind) {
            self.forcings.push(kind);
        }
    }

    /// Drops a forcing previously attached with [`AdcircConfig::attach_forcing`].
    pub fn detach_forcing(&mut self, kind: ForcingKind) {
        self.forcings.retain(|attached| *attached != kind);
    }

    /// Forcing kinds attached through the run configuration.
    pub fn forcings(&self) -> &[ForcingKind] {
        &self.forcings
    }

    /// Model executable.
    pub fn adcirc_executable_path(&self) -> PathBuf {
        self.record
            .path("adcirc_executable_path")
            .unwrap_or_else(|| PathBuf::from("adcirc"))
    }

    /// Mesh partitioner executable.
    pub fn adcprep_executable_path(&self) -> PathBuf {
        self.record
            .path("adcprep_executable_path")
            .unwrap_or_else(|| PathBuf::from("adcprep"))
    }

    /// Track preprocessor executable.
    pub fn aswip_executable_path(&self) -> Option<PathBuf> {
        self.record.path("aswip_executable_path")
    }

    /// Nodal attribute file.
    pub fn fort_13_path(&self) -> Option<PathBuf> {
        self.record.path("fort_13_path")
    }

    /// Mesh file.
    pub fn fort_14_path(&self) -> Option<PathBuf> {
        self.record.path("fort_14_path")
    }

    /// First modeled time.
    pub fn modeled_start_time(&self) -> Option<NaiveDateTime> {
        self.record.timestamp("modeled_start_time")
    }

    /// Last modeled time.
    pub fn modeled_end_time(&self) -> Option<NaiveDateTime> {
        self.record.timestamp("modeled_end_time")
    }

    /// Model time step.
    pub fn modeled_timestep(&self) -> Option<Duration> {
        self.record.duration("modeled_timestep")
    }

    /// Spin-up length; unset disables the coldstart phase.
    pub fn tidal_spinup_duration(&self) -> Option<Duration> {
        self.record.duration("tidal_spinup_duration")
    }

    /// Time step used during spin-up.
    pub fn tidal_spinup_timestep(&self) -> Option<Duration> {
        self.record.duration("tidal_spinup_timestep")
    }

    /// Continuity equation solution scheme.
    pub fn gwce_solution_scheme(&self) -> Option<String> {
        self.record.text("gwce_solution_scheme")
    }

    /// Whether Smagorinsky lateral viscosity is enabled.
    pub fn use_smagorinsky(&self) -> Option<bool> {
        self.record.value("use_smagorinsky").and_then(Value::as_bool)
    }

    /// Environment file sourced by job scripts.
    pub fn source_filename(&self) -> Option<PathBuf> {
        self.record.path("source_filename")
    }

    /// Whether the caller's mesh is linked instead of rewritten.
    pub fn use_original_mesh(&self) -> bool {
        self.record.flag("use_original_mesh", false)
    }

    /// Whether gridded output is written.
    pub fn output_surface(&self) -> bool {
        self.record.flag("output_surface", true)
    }

    /// Gridded output interval.
    pub fn surface_output_interval(&self) -> Duration {
        self.record
            .duration("surface_output_interval")
            .unwrap_or_else(|| Duration::hours(1))
    }

    /// Whether station output is written.
    pub fn output_stations(&self) -> bool {
        self.record.flag("output_stations", false)
    }

    /// Station output interval.
    pub fn stations_output_interval(&self) -> Duration {
        self.record
            .duration("stations_output_interval")
            .unwrap_or_else(|| Duration::minutes(6))
    }

    /// Station list file.
    pub fn stations_file_path(&self) -> Option<PathBuf> {
        self.record.path("stations_file_path")
    }

    /// Whether output is also written during spin-up.
    pub fn output_spinup(&self) -> bool {
        self.record.flag("output_spinup", true)
    }

    /// Whether elevations are written.
    pub fn output_elevations(&self) -> bool {
        self.record.flag("output_elevations", true)
    }

    /// Whether velocities are written.
    pub fn output_velocities(&self) -> bool {
        self.record.flag("output_velocities", true)
    }

    /// Whether concentrations are written.
    pub fn output_concentrations(&self) -> bool {
        self.record.flag("output_concentrations", false)
    }

    /// Whether meteorological factors are written.
    pub fn output_meteorological_factors(&self) -> bool {
        self.record.flag("output_meteorological_factors", false)
    }

    /// Requested model processors.
    pub fn processors(&self) -> u32 {
        self.record
            .integer("processors")
            .and_then(|processors| u32::try_from(processors).ok())
            .unwrap_or(DEFAULT_PROCESSORS)
    }

    /// Native attributes applied to every run.
    pub fn attributes(&self) -> IndexMap<String, Value> {
        self.record.mapping("attributes")
    }
}

impl CouplingParticipant for AdcircConfig {
    fn coupling_entry(&self) -> Result<CouplingEntry, DriverError> {
        Ok(CouplingEntry {
            model_type: ModelType::Ocean,
            model: "ADCIRC".to_string(),
            processors: self.processors(),
            parameters: text_parameters(&self.record),
        })
    }
}

pub(super) fn text_parameters(record: &Record) -> IndexMap<String, String> {
    record
        .mapping("nems_parameters")
        .into_iter()
        .filter_map(|(key, value)| value.as_text().map(|text| (key, text)))
        .collect()
}

impl Configuration for AdcircConfig {
    const KIND: ConfigurationKind = ConfigurationKind::Adcirc;

    fn blank() -> Result<Self, DriverError> {
        let mut record = Record::new(Self::KIND.name(), Self::KIND.default_filename(), schema()?);
        record.update([
            ("adcirc_executable_path", Value::from(PathBuf::from("adcirc"))),
            ("adcprep_executable_path", Value::from(PathBuf::from("adcprep"))),
            ("use_original_mesh", Value::from(false)),
            ("output_surface", Value::from(true)),
            ("surface_output_interval", Value::from(Duration::hours(1))),
            ("output_stations", Value::from(false)),
            ("stations_output_interval", Value::from(Duration::minutes(6))),
            ("output_spinup", Value::from(true)),
            ("output_elevations", Value::from(true)),
            ("output_velocities", Value::from(true)),
            ("output_concentrations", Value::from(false)),
            ("output_meteorological_factors", Value::from(false)),
            ("processors", Value::from(DEFAULT_PROCESSORS)),
            ("nems_parameters", Value::Mapping(IndexMap::new())),
            ("attributes", Value::Mapping(IndexMap::new())),
        ])?;
        Ok(Self {
            record,
            forcings: Vec::new(),
        })
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
