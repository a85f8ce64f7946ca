//! Concrete configuration records and their closed registry.

mod adcirc;
mod driver;
mod forcings;
mod nems;
mod slurm;

use std::path::Path;

use driver_core::errors::DriverError;
use driver_core::files::WriteOutcome;
use serde_json::{Map, Value as Json};

use crate::native::{CouplingEntry, ForcingKind};
use crate::record::Record;
use crate::value::Value;

pub use adcirc::{AdcircConfig, GWCE_SOLUTION_SCHEMES};
pub use driver::{ModelDriverConfig, RunDescriptor, UNPERTURBED};
pub use forcings::{
    AtmeshForcingConfig, BestTrackForcingConfig, ForcingConfig, OwiForcingConfig,
    TidalForcingConfig, Ww3DataForcingConfig, TIDAL_SOURCES,
};
pub use nems::NemsConfig;
pub use slurm::SlurmConfig;

/// Every configuration aspect known to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurationKind {
    /// Platform and run descriptors.
    ModelDriver,
    /// Batch scheduler request.
    Slurm,
    /// Coupling layer.
    Nems,
    /// Ocean circulation model.
    Adcirc,
    /// Tidal forcing.
    Tidal,
    /// Best-track wind forcing.
    BestTrack,
    /// OWI wind forcing.
    Owi,
    /// Atmospheric mesh forcing.
    Atmesh,
    /// WaveWatch III data forcing.
    Ww3Data,
}

impl ConfigurationKind {
    /// Every kind, required aspects first.
    pub const ALL: [ConfigurationKind; 9] = [
        ConfigurationKind::ModelDriver,
        ConfigurationKind::Slurm,
        ConfigurationKind::Nems,
        ConfigurationKind::Adcirc,
        ConfigurationKind::Tidal,
        ConfigurationKind::BestTrack,
        ConfigurationKind::Owi,
        ConfigurationKind::Atmesh,
        ConfigurationKind::Ww3Data,
    ];

    /// Supplementary forcing kinds.
    pub const FORCINGS: [ConfigurationKind; 5] = [
        ConfigurationKind::Tidal,
        ConfigurationKind::BestTrack,
        ConfigurationKind::Owi,
        ConfigurationKind::Atmesh,
        ConfigurationKind::Ww3Data,
    ];

    /// Lower-cased record name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigurationKind::ModelDriver => "modeldriver",
            ConfigurationKind::Slurm => "slurm",
            ConfigurationKind::Nems => "nems",
            ConfigurationKind::Adcirc => "adcirc",
            ConfigurationKind::Tidal => "tidal",
            ConfigurationKind::BestTrack => "besttrack",
            ConfigurationKind::Owi => "owi",
            ConfigurationKind::Atmesh => "atmesh",
            ConfigurationKind::Ww3Data => "ww3data",
        }
    }

    /// Document file name inside a configuration directory.
    pub fn default_filename(&self) -> &'static str {
        match self {
            ConfigurationKind::ModelDriver => "configure_modeldriver.json",
            ConfigurationKind::Slurm => "configure_slurm.json",
            ConfigurationKind::Nems => "configure_nems.json",
            ConfigurationKind::Adcirc => "configure_adcirc.json",
            ConfigurationKind::Tidal => "configure_tidal.json",
            ConfigurationKind::BestTrack => "configure_besttrack.json",
            ConfigurationKind::Owi => "configure_owi.json",
            ConfigurationKind::Atmesh => "configure_atmesh.json",
            ConfigurationKind::Ww3Data => "configure_ww3data.json",
        }
    }

    /// Looks a kind up by record name, ignoring case.
    pub fn from_name(name: &str) -> Option<ConfigurationKind> {
        ConfigurationKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Forcing kind carried by forcing records.
    pub fn forcing_kind(&self) -> Option<ForcingKind> {
        match self {
            ConfigurationKind::Tidal => Some(ForcingKind::Tides),
            ConfigurationKind::BestTrack => Some(ForcingKind::BestTrack),
            ConfigurationKind::Owi => Some(ForcingKind::OwiWind),
            ConfigurationKind::Atmesh => Some(ForcingKind::AtmeshWind),
            ConfigurationKind::Ww3Data => Some(ForcingKind::Ww3DataWave),
            _ => None,
        }
    }

    /// Whether the kind is a supplementary forcing.
    pub fn is_forcing(&self) -> bool {
        self.forcing_kind().is_some()
    }

    /// Path fields naming input files, resolved against the document directory on read.
    pub fn input_path_fields(&self) -> &'static [&'static str] {
        match self {
            ConfigurationKind::Adcirc => &["fort_13_path", "fort_14_path", "stations_file_path"],
            ConfigurationKind::BestTrack => &["fort22_filename"],
            ConfigurationKind::Tidal | ConfigurationKind::Atmesh | ConfigurationKind::Ww3Data => {
                &["resource"]
            }
            _ => &[],
        }
    }
}

/// Typed wrapper over a [`Record`] with a fixed schema.
pub trait Configuration: Sized {
    /// Aspect the record configures.
    const KIND: ConfigurationKind;

    /// Record with the composed schema and default values only.
    fn blank() -> Result<Self, DriverError>;

    /// Underlying record.
    fn record(&self) -> &Record;

    /// Underlying record, mutably.
    fn record_mut(&mut self) -> &mut Record;

    /// Assigns one field.
    fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), DriverError> {
        self.record_mut().set(key, value)
    }

    /// Reads one field.
    fn get(&self, key: &str) -> Result<&Value, DriverError> {
        self.record().get(key)
    }

    /// Canonical document.
    fn to_document(&self) -> Map<String, Json> {
        self.record().to_document()
    }

    /// Writes the document; see [`Record::write`].
    fn write(&self, path: &Path, overwrite: bool) -> Result<WriteOutcome, DriverError> {
        self.record().write(path, overwrite)
    }

    /// Reads a document written by [`Configuration::write`].
    fn read(path: &Path) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.record_mut().load(path)?;
        Ok(configuration)
    }

    /// Builds a record from an in-memory document.
    fn from_document(document: Map<String, Json>) -> Result<Self, DriverError> {
        let mut configuration = Self::blank()?;
        configuration.record_mut().load_document(document)?;
        Ok(configuration)
    }
}

/// Any configuration record held by a run configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationEntry {
    /// Driver record.
    ModelDriver(ModelDriverConfig),
    /// Scheduler record.
    Slurm(SlurmConfig),
    /// Coupling record.
    Nems(NemsConfig),
    /// Model record.
    Adcirc(AdcircConfig),
    /// Forcing record.
    Forcing(ForcingConfig),
}

impl ConfigurationEntry {
    /// Blank record of `kind`.
    pub fn blank(kind: ConfigurationKind) -> Result<Self, DriverError> {
        Ok(match kind {
            ConfigurationKind::ModelDriver => ModelDriverConfig::blank()?.into(),
            ConfigurationKind::Slurm => SlurmConfig::blank()?.into(),
            ConfigurationKind::Nems => NemsConfig::blank()?.into(),
            ConfigurationKind::Adcirc => AdcircConfig::blank()?.into(),
            ConfigurationKind::Tidal => TidalForcingConfig::blank()?.into(),
            ConfigurationKind::BestTrack => BestTrackForcingConfig::blank()?.into(),
            ConfigurationKind::Owi => OwiForcingConfig::blank()?.into(),
            ConfigurationKind::Atmesh => AtmeshForcingConfig::blank()?.into(),
            ConfigurationKind::Ww3Data => Ww3DataForcingConfig::blank()?.into(),
        })
    }

    /// Reads a document of `kind` from `path`.
    pub fn read(kind: ConfigurationKind, path: &Path) -> Result<Self, DriverError> {
        let mut entry = ConfigurationEntry::blank(kind)?;
        entry.record_mut().load(path)?;
        Ok(entry)
    }

    /// Builds a record of `kind` from a parsed document.
    pub fn from_document(
        kind: ConfigurationKind,
        document: Map<String, Json>,
    ) -> Result<Self, DriverError> {
        let mut entry = ConfigurationEntry::blank(kind)?;
        entry.record_mut().load_document(document)?;
        Ok(entry)
    }

    /// Aspect configured by the entry.
    pub fn kind(&self) -> ConfigurationKind {
        match self {
            ConfigurationEntry::ModelDriver(_) => ConfigurationKind::ModelDriver,
            ConfigurationEntry::Slurm(_) => ConfigurationKind::Slurm,
            ConfigurationEntry::Nems(_) => ConfigurationKind::Nems,
            ConfigurationEntry::Adcirc(_) => ConfigurationKind::Adcirc,
            ConfigurationEntry::Forcing(forcing) => forcing.configuration_kind(),
        }
    }

    /// Underlying record.
    pub fn record(&self) -> &Record {
        match self {
            ConfigurationEntry::ModelDriver(configuration) => configuration.record(),
            ConfigurationEntry::Slurm(configuration) => configuration.record(),
            ConfigurationEntry::Nems(configuration) => configuration.record(),
            ConfigurationEntry::Adcirc(configuration) => configuration.record(),
            ConfigurationEntry::Forcing(configuration) => configuration.record(),
        }
    }

    /// Underlying record, mutably.
    pub fn record_mut(&mut self) -> &mut Record {
        match self {
            ConfigurationEntry::ModelDriver(configuration) => configuration.record_mut(),
            ConfigurationEntry::Slurm(configuration) => configuration.record_mut(),
            ConfigurationEntry::Nems(configuration) => configuration.record_mut(),
            ConfigurationEntry::Adcirc(configuration) => configuration.record_mut(),
            ConfigurationEntry::Forcing(configuration) => configuration.record_mut(),
        }
    }

    /// Forcing record, if the entry is one.
    pub fn as_forcing(&self) -> Option<&ForcingConfig> {
        match self {
            ConfigurationEntry::Forcing(forcing) => Some(forcing),
            _ => None,
        }
    }

    /// Coupling entry of coupling participants.
    pub fn coupling_entry(&self) -> Option<Result<CouplingEntry, DriverError>> {
        use crate::mixins::CouplingParticipant;
        match self {
            ConfigurationEntry::Adcirc(adcirc) => Some(adcirc.coupling_entry()),
            ConfigurationEntry::Forcing(forcing) => forcing.coupling_entry(),
            _ => None,
        }
    }
}

impl From<ModelDriverConfig> for ConfigurationEntry {
    fn from(value: ModelDriverConfig) -> Self {
        ConfigurationEntry::ModelDriver(value)
    }
}

impl From<SlurmConfig> for ConfigurationEntry {
    fn from(value: SlurmConfig) -> Self {
        ConfigurationEntry::Slurm(value)
    }
}

impl From<NemsConfig> for ConfigurationEntry {
    fn from(value: NemsConfig) -> Self {
        ConfigurationEntry::Nems(value)
    }
}

impl From<AdcircConfig> for ConfigurationEntry {
    fn from(value: AdcircConfig) -> Self {
        ConfigurationEntry::Adcirc(value)
    }
}

impl From<ForcingConfig> for ConfigurationEntry {
    fn from(value: ForcingConfig) -> Self {
        ConfigurationEntry::Forcing(value)
    }
}

impl From<TidalForcingConfig> for ConfigurationEntry {
    fn from(value: TidalForcingConfig) -> Self {
        ConfigurationEntry::Forcing(value.into())
    }
}

impl From<BestTrackForcingConfig> for ConfigurationEntry {
    fn from(value: BestTrackForcingConfig) -> Self {
        ConfigurationEntry::Forcing(value.into())
    }
}

impl From<OwiForcingConfig> for ConfigurationEntry {
    fn from(value: OwiForcingConfig) -> Self {
        ConfigurationEntry::Forcing(value.into())
    }
}

impl From<AtmeshForcingConfig> for ConfigurationEntry {
    fn from(value: AtmeshForcingConfig) -> Self {
        ConfigurationEntry::Forcing(value.into())
    }
}

impl From<Ww3DataForcingConfig> for ConfigurationEntry {
    fn from(value: Ww3DataForcingConfig) -> Self {
        ConfigurationEntry::Forcing(value.into())
    }
}
