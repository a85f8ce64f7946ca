//! Model-side representations produced from configuration records.

use std::fmt::{self, Display};
use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Underlying forcing kind; an aggregator holds at most one forcing per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcingKind {
    /// Tidal constituents.
    Tides,
    /// Best-track parametric wind.
    BestTrack,
    /// Oceanweather gridded wind.
    OwiWind,
    /// Atmospheric mesh wind read through the coupling layer.
    AtmeshWind,
    /// WaveWatch III wave data read through the coupling layer.
    Ww3DataWave,
}

/// Native forcing object handed to or received from the model collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeForcing {
    /// Tidal forcing.
    Tides {
        /// Constituent database, `TPXO` or `HAMTIDE`.
        source: String,
        /// Constituent names, `All` or `Major` selecting groups.
        constituents: Vec<String>,
        /// Database file.
        resource: Option<PathBuf>,
    },
    /// Best-track wind.
    BestTrack {
        /// Storm identifier, e.g. `AL112017`.
        storm_id: Option<String>,
        /// Wind input selector.
        nws: i64,
        /// Track sampling interval.
        interval: Option<Duration>,
        /// First track time used.
        start_date: Option<NaiveDateTime>,
        /// Last track time used.
        end_date: Option<NaiveDateTime>,
        /// Pre-existing track file.
        fort22_filename: Option<PathBuf>,
    },
    /// Gridded OWI wind.
    OwiWind {
        /// Wind input selector.
        nws: i64,
        /// Wind update interval.
        interval: Option<Duration>,
    },
    /// Coupled atmospheric mesh wind.
    AtmeshWind {
        /// Wind input selector.
        nws: i64,
        /// Wind update interval.
        interval: Option<Duration>,
        /// Forcing data file.
        resource: Option<PathBuf>,
    },
    /// Coupled wave data.
    Ww3DataWave {
        /// Wave radiation stress selector.
        nrs: i64,
        /// Wave update interval.
        interval: Option<Duration>,
        /// Forcing data file.
        resource: Option<PathBuf>,
    },
}

impl NativeForcing {
    /// Kind of the forcing.
    pub fn kind(&self) -> ForcingKind {
        match self {
            NativeForcing::Tides { .. } => ForcingKind::Tides,
            NativeForcing::BestTrack { .. } => ForcingKind::BestTrack,
            NativeForcing::OwiWind { .. } => ForcingKind::OwiWind,
            NativeForcing::AtmeshWind { .. } => ForcingKind::AtmeshWind,
            NativeForcing::Ww3DataWave { .. } => ForcingKind::Ww3DataWave,
        }
    }

    /// Wind selector, when the forcing drives wind.
    pub fn nws(&self) -> Option<i64> {
        match self {
            NativeForcing::BestTrack { nws, .. }
            | NativeForcing::OwiWind { nws, .. }
            | NativeForcing::AtmeshWind { nws, .. } => Some(*nws),
            _ => None,
        }
    }

    /// Wave selector, when the forcing drives waves.
    pub fn nrs(&self) -> Option<i64> {
        match self {
            NativeForcing::Ww3DataWave { nrs, .. } => Some(*nrs),
            _ => None,
        }
    }

    /// Update interval of time-stepped forcings.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            NativeForcing::BestTrack { interval, .. }
            | NativeForcing::OwiWind { interval, .. }
            | NativeForcing::AtmeshWind { interval, .. }
            | NativeForcing::Ww3DataWave { interval, .. } => *interval,
            NativeForcing::Tides { .. } => None,
        }
    }
}

/// Component slot of a coupling-layer participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelType {
    /// Atmosphere.
    #[serde(rename = "ATM")]
    Atmosphere,
    /// Waves.
    #[serde(rename = "WAV")]
    Wave,
    /// Ocean.
    #[serde(rename = "OCN")]
    Ocean,
}

impl ModelType {
    /// Every slot, in declaration order.
    pub const ALL: [ModelType; 3] = [ModelType::Atmosphere, ModelType::Wave, ModelType::Ocean];

    /// Three letter component code.
    pub fn code(&self) -> &'static str {
        match self {
            ModelType::Atmosphere => "ATM",
            ModelType::Wave => "WAV",
            ModelType::Ocean => "OCN",
        }
    }

    /// Parses a component code, ignoring case.
    pub fn from_code(code: &str) -> Option<ModelType> {
        ModelType::ALL
            .into_iter()
            .find(|model_type| model_type.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Representation of one participant in the coupling layer's sequencing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouplingEntry {
    /// Component slot.
    pub model_type: ModelType,
    /// Component implementation name.
    pub model: String,
    /// Processors assigned to the component.
    pub processors: u32,
    /// Free-form component attributes.
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
}
