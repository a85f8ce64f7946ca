use std::path::{Path, PathBuf};

use chrono::Duration;
use driver_core::errors::DriverError;
use indexmap::IndexMap;

use super::adcirc::text_parameters;
use super::{Configuration, ConfigurationKind};
use crate::mixins::{self, CouplingParticipant, ForcingRecord};
use crate::native::{CouplingEntry, ForcingKind, ModelType, NativeForcing};
use crate::record::Record;
use crate::schema::{Fragment, Schema};
use crate::value::{EnumSpec, FieldType, Value};

/// Accepted tidal constituent databases.
pub const TIDAL_SOURCES: &[&str] = &["TPXO", "HAMTIDE"];

const TIDAL_SOURCE: EnumSpec = EnumSpec {
    label: "TidalSource",
    variants: TIDAL_SOURCES,
};

fn blank_record(
    kind: ConfigurationKind,
    fragments: &[Fragment],
    defaults: Vec<(&str, Value)>,
) -> Result<Record, DriverError> {
    let mut record = Record::new(kind.name(), kind.default_filename(), Schema::compose(fragments)?);
    record.update(defaults)?;
    Ok(record)
}

fn processors(record: &Record) -> u32 {
    record
        .integer("processors")
        .and_then(|processors| u32::try_from(processors).ok())
        .unwrap_or(1)
}

/// Tidal constituent forcing.
#[derive(Debug, Clone, PartialEq)]
pub struct TidalForcingConfig {
    record: Record,
}

impl TidalForcingConfig {
    /// Creates a tidal forcing drawing `constituents` from `source`.
    pub fn new(
        source: &str,
        constituents: Vec<String>,
        resource: Option<&Path>,
    ) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.set("tidal_source", source)?;
        if !constituents.is_empty() {
            configuration.set("constituents", constituents)?;
        }
        configuration.set("resource", resource)?;
        Ok(configuration)
    }
}

impl Configuration for TidalForcingConfig {
    const KIND: ConfigurationKind = ConfigurationKind::Tidal;

    fn blank() -> Result<Self, DriverError> {
        let tidal = Fragment::new("tidal")
            .field("tidal_source", FieldType::Enumerant(TIDAL_SOURCE))
            .field("constituents", FieldType::List(Box::new(FieldType::Text)));
        let record = blank_record(
            Self::KIND,
            &[mixins::file_forcing(), tidal],
            vec![
                ("tidal_source", Value::from("TPXO")),
                ("constituents", Value::from(vec!["All"])),
            ],
        )?;
        Ok(Self { record })
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl ForcingRecord for TidalForcingConfig {
    fn kind(&self) -> ForcingKind {
        ForcingKind::Tides
    }

    fn native_forcing(&self) -> Result<NativeForcing, DriverError> {
        Ok(NativeForcing::Tides {
            source: self
                .record
                .text("tidal_source")
                .unwrap_or_else(|| TIDAL_SOURCES[0].to_string()),
            constituents: self.record.texts("constituents"),
            resource: self.record.path("resource"),
        })
    }
}

/// Best-track parametric wind forcing.
#[derive(Debug, Clone, PartialEq)]
pub struct BestTrackForcingConfig {
    record: Record,
}

impl BestTrackForcingConfig {
    /// Creates a best-track forcing for the storm `storm_id`.
    pub fn new(storm_id: Option<&str>, nws: Option<i64>) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.set("storm_id", storm_id)?;
        if let Some(nws) = nws {
            configuration.set("nws", nws)?;
        }
        Ok(configuration)
    }

    /// Wind selector.
    pub fn nws(&self) -> i64 {
        self.record.integer("nws").unwrap_or(20)
    }
}

impl Configuration for BestTrackForcingConfig {
    const KIND: ConfigurationKind = ConfigurationKind::BestTrack;

    fn blank() -> Result<Self, DriverError> {
        let besttrack = Fragment::new("besttrack")
            .field("storm_id", FieldType::Text)
            .field("start_date", FieldType::Timestamp)
            .field("end_date", FieldType::Timestamp)
            .field("fort22_filename", FieldType::Path);
        let record = blank_record(
            Self::KIND,
            &[
                mixins::timestep_forcing(),
                mixins::wind_forcing(),
                mixins::attributes(),
                besttrack,
            ],
            vec![
                ("nws", Value::from(20)),
                ("attributes", Value::Mapping(IndexMap::new())),
            ],
        )?;
        Ok(Self { record })
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl ForcingRecord for BestTrackForcingConfig {
    fn kind(&self) -> ForcingKind {
        ForcingKind::BestTrack
    }

    fn native_forcing(&self) -> Result<NativeForcing, DriverError> {
        Ok(NativeForcing::BestTrack {
            storm_id: self.record.text("storm_id"),
            nws: self.nws(),
            interval: self.record.duration("interval"),
            start_date: self.record.timestamp("start_date"),
            end_date: self.record.timestamp("end_date"),
            fort22_filename: self.record.path("fort22_filename"),
        })
    }
}

/// Gridded OWI wind forcing.
#[derive(Debug, Clone, PartialEq)]
pub struct OwiForcingConfig {
    record: Record,
}

impl OwiForcingConfig {
    /// Creates an OWI forcing updated every `interval`.
    pub fn new(interval: Option<Duration>) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        if let Some(interval) = interval {
            configuration.set("interval", interval)?;
        }
        Ok(configuration)
    }
}

impl Configuration for OwiForcingConfig {
    const KIND: ConfigurationKind = ConfigurationKind::Owi;

    fn blank() -> Result<Self, DriverError> {
        let record = blank_record(
            Self::KIND,
            &[mixins::timestep_forcing(), mixins::wind_forcing()],
            vec![
                ("nws", Value::from(12)),
                ("interval", Value::from(Duration::hours(1))),
            ],
        )?;
        Ok(Self { record })
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl ForcingRecord for OwiForcingConfig {
    fn kind(&self) -> ForcingKind {
        ForcingKind::OwiWind
    }

    fn native_forcing(&self) -> Result<NativeForcing, DriverError> {
        Ok(NativeForcing::OwiWind {
            nws: self.record.integer("nws").unwrap_or(12),
            interval: self.record.duration("interval"),
        })
    }
}

/// Atmospheric mesh wind forcing delivered through the coupling layer.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmeshForcingConfig {
    record: Record,
}

impl AtmeshForcingConfig {
    /// Creates an atmospheric mesh forcing reading `resource`.
    pub fn new(resource: &Path) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.set("resource", resource)?;
        Ok(configuration)
    }
}

impl Configuration for AtmeshForcingConfig {
    const KIND: ConfigurationKind = ConfigurationKind::Atmesh;

    fn blank() -> Result<Self, DriverError> {
        let record = blank_record(
            Self::KIND,
            &[
                mixins::file_forcing(),
                mixins::timestep_forcing(),
                mixins::wind_forcing(),
                mixins::coupling_cap(),
            ],
            vec![
                ("nws", Value::from(17)),
                ("interval", Value::from(Duration::hours(1))),
                ("processors", Value::from(1)),
                ("nems_parameters", Value::Mapping(IndexMap::new())),
            ],
        )?;
        Ok(Self { record })
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl ForcingRecord for AtmeshForcingConfig {
    fn kind(&self) -> ForcingKind {
        ForcingKind::AtmeshWind
    }

    fn native_forcing(&self) -> Result<NativeForcing, DriverError> {
        Ok(NativeForcing::AtmeshWind {
            nws: self.record.integer("nws").unwrap_or(17),
            interval: self.record.duration("interval"),
            resource: self.record.path("resource"),
        })
    }
}

impl CouplingParticipant for AtmeshForcingConfig {
    fn coupling_entry(&self) -> Result<CouplingEntry, DriverError> {
        Ok(CouplingEntry {
            model_type: ModelType::Atmosphere,
            model: "ATMESH".to_string(),
            processors: processors(&self.record),
            parameters: text_parameters(&self.record),
        })
    }
}

/// WaveWatch III data forcing delivered through the coupling layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Ww3DataForcingConfig {
    record: Record,
}

impl Ww3DataForcingConfig {
    /// Creates a wave data forcing reading `resource`.
    pub fn new(resource: &Path) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.set("resource", resource)?;
        Ok(configuration)
    }
}

impl Configuration for Ww3DataForcingConfig {
    const KIND: ConfigurationKind = ConfigurationKind::Ww3Data;

    fn blank() -> Result<Self, DriverError> {
        let record = blank_record(
            Self::KIND,
            &[
                mixins::file_forcing(),
                mixins::timestep_forcing(),
                mixins::wave_forcing(),
                mixins::coupling_cap(),
            ],
            vec![
                ("nrs", Value::from(5)),
                ("interval", Value::from(Duration::hours(1))),
                ("processors", Value::from(1)),
                ("nems_parameters", Value::Mapping(IndexMap::new())),
            ],
        )?;
        Ok(Self { record })
    }

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl ForcingRecord for Ww3DataForcingConfig {
    fn kind(&self) -> ForcingKind {
        ForcingKind::Ww3DataWave
    }

    fn native_forcing(&self) -> Result<NativeForcing, DriverError> {
        Ok(NativeForcing::Ww3DataWave {
            nrs: self.record.integer("nrs").unwrap_or(5),
            interval: self.record.duration("interval"),
            resource: self.record.path("resource"),
        })
    }
}

impl CouplingParticipant for Ww3DataForcingConfig {
    fn coupling_entry(&self) -> Result<CouplingEntry, DriverError> {
        Ok(CouplingEntry {
            model_type: ModelType::Wave,
            model: "WW3DATA".to_string(),
            processors: processors(&self.record),
            parameters: text_parameters(&self.record),
        })
    }
}

/// Any forcing record.
#[derive(Debug, Clone, PartialEq)]
pub enum ForcingConfig {
    /// Tidal forcing.
    Tidal(TidalForcingConfig),
    /// Best-track wind.
    BestTrack(BestTrackForcingConfig),
    /// OWI wind.
    Owi(OwiForcingConfig),
    /// Atmospheric mesh wind.
    Atmesh(AtmeshForcingConfig),
    /// Wave data.
    Ww3Data(Ww3DataForcingConfig),
}

fn optional_path(path: Option<PathBuf>) -> Value {
    path.map(Value::Path).unwrap_or(Value::Null)
}

impl ForcingConfig {
    /// Builds the record matching a native forcing object.
    pub fn from_native(native: NativeForcing) -> Result<Self, DriverError> {
        Ok(match native {
            NativeForcing::Tides {
                source,
                constituents,
                resource,
            } => {
                let mut configuration = TidalForcingConfig::blank()?;
                configuration.set("tidal_source", source)?;
                configuration.set("constituents", constituents)?;
                configuration.set("resource", optional_path(resource))?;
                ForcingConfig::Tidal(configuration)
            }
            NativeForcing::BestTrack {
                storm_id,
                nws,
                interval,
                start_date,
                end_date,
                fort22_filename,
            } => {
                let mut configuration = BestTrackForcingConfig::blank()?;
                configuration.set("storm_id", storm_id)?;
                configuration.set("nws", nws)?;
                configuration.set("interval", interval)?;
                configuration.set("start_date", start_date)?;
                configuration.set("end_date", end_date)?;
                configuration.set("fort22_filename", optional_path(fort22_filename))?;
                ForcingConfig::BestTrack(configuration)
            }
            NativeForcing::OwiWind { nws, interval } => {
                let mut configuration = OwiForcingConfig::blank()?;
                configuration.set("nws", nws)?;
                configuration.set("interval", interval)?;
                ForcingConfig::Owi(configuration)
            }
            NativeForcing::AtmeshWind {
                nws,
                interval,
                resource,
            } => {
                let mut configuration = AtmeshForcingConfig::blank()?;
                configuration.set("nws", nws)?;
                configuration.set("interval", interval)?;
                configuration.set("resource", optional_path(resource))?;
                ForcingConfig::Atmesh(configuration)
            }
            NativeForcing::Ww3DataWave {
                nrs,
                interval,
                resource,
            } => {
                let mut configuration = Ww3DataForcingConfig::blank()?;
                configuration.set("nrs", nrs)?;
                configuration.set("interval", interval)?;
                configuration.set("resource", optional_path(resource))?;
                ForcingConfig::Ww3Data(configuration)
            }
        })
    }

    /// Aspect configured by the forcing.
    pub fn configuration_kind(&self) -> ConfigurationKind {
        match self {
            ForcingConfig::Tidal(_) => ConfigurationKind::Tidal,
            ForcingConfig::BestTrack(_) => ConfigurationKind::BestTrack,
            ForcingConfig::Owi(_) => ConfigurationKind::Owi,
            ForcingConfig::Atmesh(_) => ConfigurationKind::Atmesh,
            ForcingConfig::Ww3Data(_) => ConfigurationKind::Ww3Data,
        }
    }

    /// Underlying record.
    pub fn record(&self) -> &Record {
        match self {
            ForcingConfig::Tidal(configuration) => configuration.record(),
            ForcingConfig::BestTrack(configuration) => configuration.record(),
            ForcingConfig::Owi(configuration) => configuration.record(),
            ForcingConfig::Atmesh(configuration) => configuration.record(),
            ForcingConfig::Ww3Data(configuration) => configuration.record(),
        }
    }

    /// Underlying record, mutably.
    pub fn record_mut(&mut self) -> &mut Record {
        match self {
            ForcingConfig::Tidal(configuration) => configuration.record_mut(),
            ForcingConfig::BestTrack(configuration) => configuration.record_mut(),
            ForcingConfig::Owi(configuration) => configuration.record_mut(),
            ForcingConfig::Atmesh(configuration) => configuration.record_mut(),
            ForcingConfig::Ww3Data(configuration) => configuration.record_mut(),
        }
    }

    /// Coupling entry, for forcings delivered through the coupling layer.
    pub fn coupling_entry(&self) -> Option<Result<CouplingEntry, DriverError>> {
        match self {
            ForcingConfig::Atmesh(configuration) => Some(configuration.coupling_entry()),
            ForcingConfig::Ww3Data(configuration) => Some(configuration.coupling_entry()),
            _ => None,
        }
    }
}

impl ForcingRecord for ForcingConfig {
    fn kind(&self) -> ForcingKind {
        match self {
            ForcingConfig::Tidal(configuration) => configuration.kind(),
            ForcingConfig::BestTrack(configuration) => configuration.kind(),
            ForcingConfig::Owi(configuration) => configuration.kind(),
            ForcingConfig::Atmesh(configuration) => configuration.kind(),
            ForcingConfig::Ww3Data(configuration) => configuration.kind(),
        }
    }

    fn native_forcing(&self) -> Result<NativeForcing, DriverError> {
        match self {
            ForcingConfig::Tidal(configuration) => configuration.native_forcing(),
            ForcingConfig::BestTrack(configuration) => configuration.native_forcing(),
            ForcingConfig::Owi(configuration) => configuration.native_forcing(),
            ForcingConfig::Atmesh(configuration) => configuration.native_forcing(),
            ForcingConfig::Ww3Data(configuration) => configuration.native_forcing(),
        }
    }
}

impl From<TidalForcingConfig> for ForcingConfig {
    fn from(value: TidalForcingConfig) -> Self {
        ForcingConfig::Tidal(value)
    }
}

impl From<BestTrackForcingConfig> for ForcingConfig {
    fn from(value: BestTrackForcingConfig) -> Self {
        ForcingConfig::BestTrack(value)
    }
}

impl From<OwiForcingConfig> for ForcingConfig {
    fn from(value: OwiForcingConfig) -> Self {
        ForcingConfig::Owi(value)
    }
}

impl From<AtmeshForcingConfig> for ForcingConfig {
    fn from(value: AtmeshForcingConfig) -> Self {
        ForcingConfig::Atmesh(value)
    }
}

impl From<Ww3DataForcingConfig> for ForcingConfig {
    fn from(value: Ww3DataForcingConfig) -> Self {
        ForcingConfig::Ww3Data(value)
    }
}
