//! Run configuration aggregator: the named collection of records describing one run.

use std::fs;
use std::path::{Path, PathBuf};

use driver_core::errors::{DriverError, ErrorInfo};
use driver_core::files::WriteOutcome;
use driver_core::paths::relative_path;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::configs::{
    AdcircConfig, ConfigurationEntry, ConfigurationKind, ForcingConfig, ModelDriverConfig,
    NemsConfig, SlurmConfig,
};
use crate::input::UserInput;
use crate::mixins::ForcingRecord;
use crate::native::{CouplingEntry, ForcingKind, NativeForcing};
use crate::value::Value;

/// Wind selectors whose track files are preprocessed before partitioning.
pub const ASWIP_NWS: [i64; 4] = [8, 19, 20, 21];

/// Concrete run type, fixing which records are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunKind {
    /// Standalone ocean model.
    Adcirc,
    /// Ocean model inside the coupling layer.
    CoupledAdcirc,
}

impl RunKind {
    /// Records that must be present.
    pub fn required(&self) -> &'static [ConfigurationKind] {
        match self {
            RunKind::Adcirc => &[
                ConfigurationKind::ModelDriver,
                ConfigurationKind::Slurm,
                ConfigurationKind::Adcirc,
            ],
            RunKind::CoupledAdcirc => &[
                ConfigurationKind::ModelDriver,
                ConfigurationKind::Slurm,
                ConfigurationKind::Nems,
                ConfigurationKind::Adcirc,
            ],
        }
    }

    /// A directory holding a coupling document describes a coupled run.
    pub fn detect(directory: &Path) -> RunKind {
        let coupling = ConfigurationKind::Nems.default_filename();
        let found = fs::read_dir(directory)
            .map(|entries| {
                entries.filter_map(Result::ok).any(|entry| {
                    entry
                        .file_name()
                        .to_string_lossy()
                        .eq_ignore_ascii_case(coupling)
                })
            })
            .unwrap_or(false);
        if found {
            RunKind::CoupledAdcirc
        } else {
            RunKind::Adcirc
        }
    }
}

/// One ensemble member: the run configuration with record-level overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbedRun {
    /// Run directory name.
    pub name: String,
    /// Private copy of the run configuration.
    pub configuration: RunConfiguration,
    /// Overrides applied to the native model representation.
    pub overrides: IndexMap<String, Value>,
}

/// Named collection of configuration records for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    kind: RunKind,
    configurations: IndexMap<String, ConfigurationEntry>,
}

fn missing(kind: ConfigurationKind) -> DriverError {
    DriverError::MissingConfiguration(
        ErrorInfo::new(
            "configuration_missing",
            format!("run configuration has no \"{}\" record", kind.name()),
        )
        .with_context("configuration", kind.name())
        .with_context("file", kind.default_filename()),
    )
}

impl RunConfiguration {
    /// Empty run configuration of `kind`; see [`RunConfiguration::validate`].
    pub fn new(kind: RunKind) -> Self {
        Self {
            kind,
            configurations: IndexMap::new(),
        }
    }

    /// Builds a validated standalone run.
    pub fn standalone(
        driver: ModelDriverConfig,
        slurm: SlurmConfig,
        adcirc: AdcircConfig,
        forcings: Vec<ForcingConfig>,
    ) -> Result<Self, DriverError> {
        let mut entries: Vec<ConfigurationEntry> = vec![driver.into(), slurm.into(), adcirc.into()];
        entries.extend(forcings.into_iter().map(ConfigurationEntry::from));
        Self::from_configurations(entries)
    }

    /// Builds a validated coupled run.
    pub fn coupled(
        driver: ModelDriverConfig,
        slurm: SlurmConfig,
        nems: NemsConfig,
        adcirc: AdcircConfig,
        forcings: Vec<ForcingConfig>,
    ) -> Result<Self, DriverError> {
        let mut entries: Vec<ConfigurationEntry> =
            vec![driver.into(), slurm.into(), nems.into(), adcirc.into()];
        entries.extend(forcings.into_iter().map(ConfigurationEntry::from));
        Self::from_configurations(entries)
    }

    /// Builds a run from an explicit record list.
    ///
    /// The run is coupled when a coupling record is present. Two records of the same required
    /// kind are rejected; forcings of the same kind replace each other.
    pub fn from_configurations(
        entries: impl IntoIterator<Item = ConfigurationEntry>,
    ) -> Result<Self, DriverError> {
        let entries: Vec<ConfigurationEntry> = entries.into_iter().collect();
        let kind = if entries
            .iter()
            .any(|entry| entry.kind() == ConfigurationKind::Nems)
        {
            RunKind::CoupledAdcirc
        } else {
            RunKind::Adcirc
        };
        let mut configuration = Self::new(kind);
        for entry in entries {
            let entry_kind = entry.kind();
            if !entry_kind.is_forcing() && configuration.contains(entry_kind.name()) {
                return Err(DriverError::DuplicateConfiguration(
                    ErrorInfo::new(
                        "duplicate_role",
                        format!("more than one \"{}\" record supplied", entry_kind.name()),
                    )
                    .with_context("configuration", entry_kind.name())
                    .with_hint("pass exactly one record per required role"),
                ));
            }
            configuration.add(entry);
        }
        configuration.validate()?;
        Ok(configuration)
    }

    /// Fails with the first required record that is absent.
    pub fn validate(&self) -> Result<(), DriverError> {
        match self
            .kind
            .required()
            .iter()
            .find(|kind| !self.configurations.contains_key(kind.name()))
        {
            Some(kind) => Err(missing(*kind)),
            None => Ok(()),
        }
    }

    /// Run type.
    pub fn kind(&self) -> RunKind {
        self.kind
    }

    /// Resolves `input` into a record and stores it under `name`.
    pub fn insert(&mut self, name: &str, input: impl Into<UserInput>) -> Result<(), DriverError> {
        let name = name.trim().to_lowercase();
        let entry = input.into().resolve(&name)?;
        let resolved = entry.kind().name();
        if !entry.kind().is_forcing() && resolved != name {
            return Err(DriverError::Schema(
                ErrorInfo::new(
                    "configuration_name_mismatch",
                    format!("a \"{resolved}\" record cannot be stored as \"{name}\""),
                )
                .with_context("name", name)
                .with_context("record", resolved),
            ));
        }
        self.add(entry);
        Ok(())
    }

    /// Inserts or replaces a record by its lower-cased name.
    pub fn add(&mut self, entry: impl Into<ConfigurationEntry>) {
        match entry.into() {
            ConfigurationEntry::Forcing(forcing) => self.add_forcing(forcing),
            ConfigurationEntry::Adcirc(mut adcirc) => {
                for forcing in self.forcings() {
                    adcirc.attach_forcing(forcing.kind());
                }
                self.configurations
                    .insert(ConfigurationKind::Adcirc.name().to_string(), adcirc.into());
            }
            entry => {
                if entry.kind() == ConfigurationKind::Nems {
                    self.kind = RunKind::CoupledAdcirc;
                }
                self.configurations
                    .insert(entry.kind().name().to_string(), entry);
            }
        }
    }

    /// Adds a forcing, replacing any forcing of the same kind, and attaches it to the model.
    pub fn add_forcing(&mut self, forcing: impl Into<ForcingConfig>) {
        let forcing = forcing.into();
        let kind = forcing.kind();
        if let Some(adcirc) = self.adcirc_mut() {
            adcirc.attach_forcing(kind);
        }
        match forcing.coupling_entry() {
            Some(Ok(entry)) => debug!(
                model_type = %entry.model_type,
                model = %entry.model,
                processors = entry.processors,
                "forcing joins the coupling layer"
            ),
            Some(Err(err)) => warn!(error = %err, "forcing has no usable coupling entry"),
            None => {}
        }
        let name = forcing.configuration_kind().name().to_string();
        if self.configurations.contains_key(&name) {
            debug!(forcing = %name, "replacing forcing of the same kind");
        }
        self.configurations
            .insert(name, ConfigurationEntry::Forcing(forcing));
    }

    /// Record stored under `name`.
    pub fn get(&self, name: &str) -> Result<&ConfigurationEntry, DriverError> {
        let name = name.trim().to_lowercase();
        self.configurations.get(&name).ok_or_else(|| {
            DriverError::KeyNotFound(
                ErrorInfo::new("configuration_absent", format!("no \"{name}\" record"))
                    .with_context("configuration", name),
            )
        })
    }

    /// Record stored under `name`, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ConfigurationEntry> {
        self.configurations.get_mut(&name.trim().to_lowercase())
    }

    /// Whether a record is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.configurations
            .contains_key(&name.trim().to_lowercase())
    }

    /// Removes the record stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<ConfigurationEntry> {
        let removed = self
            .configurations
            .shift_remove(&name.trim().to_lowercase())?;
        if let Some(forcing) = removed.as_forcing() {
            let kind = forcing.kind();
            if let Some(adcirc) = self.adcirc_mut() {
                adcirc.detach_forcing(kind);
            }
        }
        Some(removed)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigurationEntry)> {
        self.configurations
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    /// Whether no record is stored.
    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Driver record.
    pub fn model_driver(&self) -> Result<&ModelDriverConfig, DriverError> {
        match self.configurations.get(ConfigurationKind::ModelDriver.name()) {
            Some(ConfigurationEntry::ModelDriver(driver)) => Ok(driver),
            _ => Err(missing(ConfigurationKind::ModelDriver)),
        }
    }

    /// Scheduler record.
    pub fn slurm(&self) -> Result<&SlurmConfig, DriverError> {
        match self.configurations.get(ConfigurationKind::Slurm.name()) {
            Some(ConfigurationEntry::Slurm(slurm)) => Ok(slurm),
            _ => Err(missing(ConfigurationKind::Slurm)),
        }
    }

    /// Model record.
    pub fn adcirc(&self) -> Result<&AdcircConfig, DriverError> {
        match self.configurations.get(ConfigurationKind::Adcirc.name()) {
            Some(ConfigurationEntry::Adcirc(adcirc)) => Ok(adcirc),
            _ => Err(missing(ConfigurationKind::Adcirc)),
        }
    }

    /// Model record, mutably.
    pub fn adcirc_mut(&mut self) -> Option<&mut AdcircConfig> {
        match self.configurations.get_mut(ConfigurationKind::Adcirc.name()) {
            Some(ConfigurationEntry::Adcirc(adcirc)) => Some(adcirc),
            _ => None,
        }
    }

    /// Coupling record, present on coupled runs.
    pub fn nems(&self) -> Option<&NemsConfig> {
        match self.configurations.get(ConfigurationKind::Nems.name()) {
            Some(ConfigurationEntry::Nems(nems)) => Some(nems),
            _ => None,
        }
    }

    /// Forcing records in insertion order.
    pub fn forcings(&self) -> Vec<&ForcingConfig> {
        self.configurations
            .values()
            .filter_map(ConfigurationEntry::as_forcing)
            .collect()
    }

    /// Forcing of `kind`, if configured.
    pub fn forcing(&self, kind: ForcingKind) -> Option<&ForcingConfig> {
        self.forcings()
            .into_iter()
            .find(|forcing| forcing.kind() == kind)
    }

    /// Native forcing objects handed to the model.
    pub fn native_forcings(&self) -> Result<Vec<NativeForcing>, DriverError> {
        self.forcings()
            .into_iter()
            .map(ForcingRecord::native_forcing)
            .collect()
    }

    /// Coupling entries of every participating record, in insertion order.
    pub fn coupling_entries(&self) -> Result<Vec<CouplingEntry>, DriverError> {
        self.configurations
            .values()
            .filter_map(ConfigurationEntry::coupling_entry)
            .collect()
    }

    /// Whether a coldstart spin-up precedes the production runs.
    pub fn uses_spinup(&self) -> bool {
        self.adcirc()
            .map(|adcirc| adcirc.tidal_spinup_duration().is_some())
            .unwrap_or(false)
    }

    /// Whether the partition job preprocesses a best-track file.
    pub fn use_aswip(&self) -> bool {
        let track = match self.forcing(ForcingKind::BestTrack) {
            Some(ForcingConfig::BestTrack(track)) => track,
            _ => return false,
        };
        ASWIP_NWS.contains(&track.nws())
            && self
                .adcirc()
                .map(|adcirc| adcirc.aswip_executable_path().is_some())
                .unwrap_or(false)
    }

    /// Reads every document of a configuration directory.
    ///
    /// All required documents are located before any is parsed; forcing documents are loaded
    /// when present. Relative input paths are resolved against `directory`.
    pub fn read_directory(directory: &Path) -> Result<Self, DriverError> {
        let kind = RunKind::detect(directory);
        let absent: Vec<&str> = kind
            .required()
            .iter()
            .map(ConfigurationKind::default_filename)
            .filter(|filename| !directory.join(filename).is_file())
            .collect();
        if let Some(first) = absent.first() {
            return Err(DriverError::MissingConfiguration(
                ErrorInfo::new(
                    "document_missing",
                    format!("required configuration \"{first}\" not found"),
                )
                .with_context("directory", directory.display().to_string())
                .with_context("missing", absent.join(", ")),
            ));
        }
        let mut configuration = Self::new(kind);
        for required in kind.required() {
            let path = directory.join(required.default_filename());
            configuration.add(ConfigurationEntry::read(*required, &path)?);
        }
        for forcing in ConfigurationKind::FORCINGS {
            let path = directory.join(forcing.default_filename());
            if path.is_file() {
                configuration.add(ConfigurationEntry::read(forcing, &path)?);
            } else {
                debug!(forcing = forcing.name(), "forcing not configured");
            }
        }
        configuration.resolve_paths(directory);
        Ok(configuration)
    }

    /// Writes every record into `directory`.
    ///
    /// With `relative_paths`, input path fields are rewritten relative to `directory` in the
    /// written documents; the in-memory records keep their paths.
    pub fn write_directory(
        &self,
        directory: &Path,
        overwrite: bool,
        relative_paths: bool,
    ) -> Result<Vec<WriteOutcome>, DriverError> {
        fs::create_dir_all(directory)
            .map_err(|err| DriverError::io("create_directory", directory, err))?;
        let base = absolute(directory)?;
        self.configurations
            .values()
            .map(|entry| {
                let target = directory.join(entry.kind().default_filename());
                if !relative_paths {
                    return entry.record().write(&target, overwrite);
                }
                let mut entry = entry.clone();
                let fields = entry.kind().input_path_fields();
                entry.record_mut().map_paths(fields, |path| {
                    path.is_absolute()
                        .then(|| relative_path(&base, path))
                        .flatten()
                });
                entry.record().write(&target, overwrite)
            })
            .collect()
    }

    /// Anchors relative input paths at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for entry in self.configurations.values_mut() {
            let fields = entry.kind().input_path_fields();
            entry.record_mut().map_paths(fields, |path| {
                if path.is_relative() {
                    Some(base.join(path))
                } else {
                    None
                }
            });
        }
    }

    /// Expands the driver record's run descriptors into ensemble members.
    ///
    /// A descriptor key naming a stored record with a mapping value updates that record for
    /// the member only. Any other key is kept as a native attribute override.
    pub fn perturb(&self) -> Result<Vec<PerturbedRun>, DriverError> {
        let descriptors = self.model_driver()?.perturbations()?;
        descriptors
            .into_iter()
            .map(|descriptor| -> Result<PerturbedRun, DriverError> {
                let mut configuration = self.clone();
                let mut overrides = IndexMap::new();
                for (key, value) in descriptor.overrides {
                    match value {
                        Value::Mapping(fields) => match configuration.get_mut(&key) {
                            Some(entry) => entry.record_mut().update(fields)?,
                            None => warn!(
                                run = %descriptor.name,
                                configuration = %key,
                                "skipping perturbation of unknown configuration"
                            ),
                        },
                        value => {
                            overrides.insert(key, value);
                        }
                    }
                }
                Ok(PerturbedRun {
                    name: descriptor.name,
                    configuration,
                    overrides,
                })
            })
            .collect()
    }
}

fn absolute(path: &Path) -> Result<PathBuf, DriverError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|current| current.join(path))
        .map_err(|err| DriverError::io("current_directory", path, err))
}
