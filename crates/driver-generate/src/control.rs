//! Native model run representation and its control file.

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use driver_config::{NativeForcing, RunConfiguration, Value};
use driver_core::errors::{DriverError, ErrorInfo};
use driver_core::files::{write_guarded, WriteOutcome};
use driver_core::paths::posix_string;
use driver_core::time::{duration_seconds, offset_timestamp};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::state::RunPhase;

/// Model control file name.
pub const CONTROL_FILENAME: &str = "fort.15";

/// Netcdf output format code; restart files are written as `fort.67.nc`/`fort.68.nc`.
const NETCDF: i64 = 5;
const SECONDS_PER_DAY: f64 = 86_400.0;

const MAJOR_CONSTITUENTS: [&str; 8] = ["M2", "S2", "N2", "K2", "K1", "O1", "P1", "Q1"];
const MINOR_CONSTITUENTS: [&str; 7] = ["Mm", "Mf", "M4", "MN4", "MS4", "2N2", "S1"];

/// One output station.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Optional label.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Outputs {
    surface: bool,
    surface_interval: Duration,
    stations: bool,
    stations_interval: Duration,
    spinup: bool,
    elevations: bool,
    velocities: bool,
    concentrations: bool,
    meteorological: bool,
}

/// Native run: time window, numerics, forcings, outputs and attributes.
///
/// Renders the control file for either phase. Attributes whose names match a control
/// parameter replace its value; any other attribute is appended as `value ! name`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdcircDriver {
    run_id: String,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    reference_time: NaiveDateTime,
    timestep: Duration,
    spinup: Option<Duration>,
    spinup_timestep: Option<Duration>,
    gwce_solution_scheme: String,
    use_smagorinsky: bool,
    forcings: Vec<NativeForcing>,
    outputs: Outputs,
    stations: Vec<Station>,
    attributes: IndexMap<String, Value>,
}

fn unset(field: &str) -> DriverError {
    DriverError::KeyNotFound(
        ErrorInfo::new("model_field_unset", format!("model field \"{field}\" is not set"))
            .with_context("field", field)
            .with_context("record", "adcirc"),
    )
}

/// Reads `longitude latitude [name]` lines, skipping blanks and `#`/`!` comments.
pub fn read_stations(path: &Path) -> Result<Vec<Station>, DriverError> {
    let text = fs::read_to_string(path).map_err(|err| DriverError::io("read_stations", path, err))?;
    text.lines()
        .enumerate()
        .map(|(index, line)| (index, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .map(|(index, line)| {
            let invalid = || {
                DriverError::Serde(
                    ErrorInfo::new("invalid_station", format!("cannot parse station \"{line}\""))
                        .with_context("path", path.display().to_string())
                        .with_context("line", (index + 1).to_string()),
                )
            };
            let mut tokens = line.split_whitespace();
            let mut coordinate = || -> Result<f64, DriverError> {
                tokens
                    .next()
                    .and_then(|token| token.trim_end_matches(',').parse().ok())
                    .ok_or_else(&invalid)
            };
            let longitude = coordinate()?;
            let latitude = coordinate()?;
            let name: Vec<&str> = tokens.collect();
            Ok(Station {
                longitude,
                latitude,
                name: (!name.is_empty()).then(|| name.join(" ")),
            })
        })
        .collect()
}

/// Expands the `All` and `Major` groups, keeping first occurrences.
pub fn expand_constituents(constituents: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = Vec::new();
    for constituent in constituents {
        let group: Vec<&str> = match constituent.to_ascii_lowercase().as_str() {
            "all" => MAJOR_CONSTITUENTS.iter().chain(MINOR_CONSTITUENTS.iter()).copied().collect(),
            "major" => MAJOR_CONSTITUENTS.to_vec(),
            _ => vec![constituent.as_str()],
        };
        for name in group {
            if !expanded.iter().any(|existing| existing.eq_ignore_ascii_case(name)) {
                expanded.push(name.to_string());
            }
        }
    }
    expanded
}

fn days(duration: Duration) -> f64 {
    duration_seconds(&duration) / SECONDS_PER_DAY
}

fn steps(interval: Duration, timestep: Duration) -> i64 {
    let timestep = duration_seconds(&timestep);
    if timestep <= 0.0 {
        return 0;
    }
    (duration_seconds(&interval) / timestep).round() as i64
}

fn native_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Mapping(_) => None,
        Value::Bool(flag) => Some(if *flag { "1" } else { "0" }.to_string()),
        Value::Duration(duration) => Some(duration_seconds(duration).to_string()),
        Value::Path(path) => Some(posix_string(path)),
        Value::List(items) => Some(
            items
                .iter()
                .filter_map(native_text)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        other => other.as_text(),
    }
}

struct ControlLines {
    lines: Vec<(String, String)>,
}

impl ControlLines {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    fn push(&mut self, label: &str, value: impl ToString) {
        self.lines.push((label.to_string(), value.to_string()));
    }

    fn output(&mut self, label: &str, enabled: bool, window: (f64, f64), spool: i64) {
        if enabled {
            self.push(label, format!("{NETCDF} {} {} {spool}", window.0, window.1));
        } else {
            self.push(label, "0 0 0 0");
        }
    }

    fn apply(&mut self, attributes: &IndexMap<String, Value>) {
        for (name, value) in attributes {
            let Some(text) = native_text(value) else {
                debug!(attribute = %name, "skipping attribute without a scalar value");
                continue;
            };
            match self
                .lines
                .iter_mut()
                .find(|(label, _)| label.eq_ignore_ascii_case(name))
            {
                Some(line) => line.1 = text,
                None => self.push(name, text),
            }
        }
    }

    fn render(&self) -> String {
        let mut text = String::new();
        for (label, value) in &self.lines {
            text.push_str(&format!("{value:<40} ! {label}\n"));
        }
        text
    }
}

impl AdcircDriver {
    /// Builds the native run from the model record and attached forcings.
    ///
    /// A missing stations file disables station output with a warning.
    pub fn from_configuration(configuration: &RunConfiguration) -> Result<Self, DriverError> {
        let adcirc = configuration.adcirc()?;
        let start_time = adcirc
            .modeled_start_time()
            .ok_or_else(|| unset("modeled_start_time"))?;
        let end_time = adcirc
            .modeled_end_time()
            .ok_or_else(|| unset("modeled_end_time"))?;
        let timestep = adcirc
            .modeled_timestep()
            .ok_or_else(|| unset("modeled_timestep"))?;
        let spinup = adcirc.tidal_spinup_duration();
        let reference_time = match spinup {
            Some(spinup) => offset_timestamp(start_time, -spinup, "tidal_spinup_duration")?,
            None => start_time,
        };

        let mut outputs = Outputs {
            surface: adcirc.output_surface(),
            surface_interval: adcirc.surface_output_interval(),
            stations: adcirc.output_stations(),
            stations_interval: adcirc.stations_output_interval(),
            spinup: adcirc.output_spinup(),
            elevations: adcirc.output_elevations(),
            velocities: adcirc.output_velocities(),
            concentrations: adcirc.output_concentrations(),
            meteorological: adcirc.output_meteorological_factors(),
        };
        let mut stations = Vec::new();
        if outputs.stations {
            match adcirc.stations_file_path() {
                Some(path) if path.is_file() => stations = read_stations(&path)?,
                Some(path) => {
                    warn!(path = %path.display(), "stations file not found; station output disabled");
                    outputs.stations = false;
                }
                None => {
                    warn!("no stations file configured; station output disabled");
                    outputs.stations = false;
                }
            }
        }

        Ok(Self {
            run_id: "ADCIRC".to_string(),
            start_time,
            end_time,
            reference_time,
            timestep,
            spinup,
            spinup_timestep: adcirc.tidal_spinup_timestep(),
            gwce_solution_scheme: adcirc
                .gwce_solution_scheme()
                .unwrap_or_else(|| "explicit".to_string()),
            use_smagorinsky: adcirc.use_smagorinsky().unwrap_or(false),
            forcings: configuration.native_forcings()?,
            outputs,
            stations,
            attributes: adcirc.attributes(),
        })
    }

    /// Sets the run identifier written to the control file.
    pub fn set_run_id(&mut self, run_id: impl Into<String>) {
        self.run_id = run_id.into();
    }

    /// Adds or replaces native attributes; later values win.
    pub fn apply_overrides(&mut self, overrides: &IndexMap<String, Value>) {
        for (name, value) in overrides {
            self.attributes.insert(name.clone(), value.clone());
        }
    }

    /// Native attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Stations read for station output.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Whether a spin-up precedes the production run.
    pub fn spinup(&self) -> Option<Duration> {
        self.spinup
    }

    /// Time all control-file times are counted from.
    pub fn reference_time(&self) -> NaiveDateTime {
        self.reference_time
    }

    fn im(&self) -> i64 {
        match self.gwce_solution_scheme.as_str() {
            "semi-implicit" => 511112,
            "semi-implicit-legacy" => 0,
            _ => 511113,
        }
    }

    fn wind(&self) -> Option<&NativeForcing> {
        self.forcings.iter().find(|forcing| forcing.nws().is_some())
    }

    fn wave(&self) -> Option<&NativeForcing> {
        self.forcings.iter().find(|forcing| forcing.nrs().is_some())
    }

    fn constituents(&self) -> Vec<String> {
        self.forcings
            .iter()
            .find_map(|forcing| match forcing {
                NativeForcing::Tides { constituents, .. } => Some(expand_constituents(constituents)),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn control_lines(&self, phase: RunPhase) -> ControlLines {
        let spinup_phase = phase == RunPhase::Coldstart && self.spinup.is_some();
        let offset = self.spinup.map(days).unwrap_or(0.0);
        let (timestep, window) = if spinup_phase {
            (self.spinup_timestep.unwrap_or(self.timestep), (0.0, offset))
        } else {
            let run = days(self.end_time - self.start_time);
            (self.timestep, (offset, offset + run))
        };
        let hotstart = phase == RunPhase::Hotstart && self.spinup.is_some();
        let (nws, wind_interval) = if spinup_phase {
            (0, None)
        } else {
            let nws = self.wind().and_then(NativeForcing::nws).unwrap_or(0);
            let nrs = self.wave().and_then(NativeForcing::nrs).unwrap_or(0);
            let interval = self
                .wind()
                .or_else(|| self.wave())
                .and_then(NativeForcing::interval);
            (nrs * 100 + nws, interval)
        };
        let constituents = self.constituents();
        let write_outputs = !spinup_phase || self.outputs.spinup;

        let mut lines = ControlLines::new();
        lines.push("RUNDES", format!("{} {}", self.run_id, phase));
        lines.push("RUNID", &self.run_id);
        lines.push("NFOVER", 1);
        lines.push("NABOUT", 1);
        lines.push("NSCREEN", 100);
        lines.push("IHOT", if hotstart { 567 } else { 0 });
        lines.push("ICS", 2);
        lines.push("IM", self.im());
        lines.push("NOLIBF", 2);
        lines.push("NOLIFA", 2);
        lines.push("NOLICA", 1);
        lines.push("NOLICAT", 1);
        lines.push("NWP", 0);
        lines.push("NCOR", 1);
        lines.push("NTIP", i64::from(!constituents.is_empty()));
        lines.push("NWS", nws);
        lines.push("NRAMP", i64::from(spinup_phase));
        lines.push("G", 9.81);
        lines.push("TAU0", -3);
        lines.push("DTDP", duration_seconds(&timestep));
        lines.push("STATIM", window.0);
        lines.push("REFTIM", 0);
        if nws != 0 {
            let interval = wind_interval.map(|interval| duration_seconds(&interval)).unwrap_or(3600.0);
            lines.push("WTIMINC", interval);
        }
        lines.push("RNDAY", window.1);
        lines.push("DRAMP", if spinup_phase { offset } else { 0.0 });
        lines.push("A00 B00 C00", "0.35 0.3 0.35");
        lines.push("H0 INTEGER INTEGER VELMIN", "0.01 0 0 0.01");
        lines.push("SLAM0 SFEA0", "0 0");
        lines.push("CF HBREAK FTHETA FGAMMA", "0.0025 1 10 0.33333");
        lines.push("ESLM", if self.use_smagorinsky { "-0.2" } else { "50" });
        lines.push("CORI", 0);
        lines.push("NTIF", constituents.len());
        for constituent in &constituents {
            lines.push("TIPOTAG", constituent);
        }
        lines.push("NBFR", constituents.len());
        for constituent in &constituents {
            lines.push("BOUNTAG", constituent);
        }
        lines.push("ANGINN", 110);

        let stations = write_outputs && self.outputs.stations;
        let station_spool = steps(self.outputs.stations_interval, timestep);
        let station_count = if stations { self.stations.len() } else { 0 };
        for (label, count, enabled) in [
            ("NOUTE TOUTSE TOUTFE NSPOOLE", "NSTAE", self.outputs.elevations),
            ("NOUTV TOUTSV TOUTFV NSPOOLV", "NSTAV", self.outputs.velocities),
        ] {
            lines.output(label, stations && enabled, window, station_spool);
            let listed = if enabled { station_count } else { 0 };
            lines.push(count, listed);
            for station in self.stations.iter().take(listed) {
                let name = station.name.as_deref().unwrap_or("");
                lines.push(name, format!("{} {}", station.longitude, station.latitude));
            }
        }
        if nws != 0 {
            let enabled = stations && self.outputs.meteorological;
            lines.output("NOUTM TOUTSM TOUTFM NSPOOLM", enabled, window, station_spool);
            lines.push("NSTAM", if enabled { station_count } else { 0 });
        }

        let surface = write_outputs && self.outputs.surface;
        let surface_spool = steps(self.outputs.surface_interval, timestep);
        lines.output("NOUTGE TOUTSGE TOUTFGE NSPOOLGE", surface && self.outputs.elevations, window, surface_spool);
        lines.output("NOUTGV TOUTSGV TOUTFGV NSPOOLGV", surface && self.outputs.velocities, window, surface_spool);
        lines.output(
            "NOUTGC TOUTSGC TOUTFGC NSPOOLGC",
            surface && self.outputs.concentrations,
            window,
            surface_spool,
        );
        if nws != 0 {
            lines.output(
                "NOUTGW TOUTSGW TOUTFGW NSPOOLGW",
                surface && self.outputs.meteorological,
                window,
                surface_spool,
            );
        }
        lines.push("NFREQ", 0);
        lines.push("THAS THAF NHAINC FMV", "0 0 0 0");
        lines.push("NHASE NHASV NHAGE NHAGV", "0 0 0 0");
        if spinup_phase {
            lines.push("NHSTAR NHSINC", format!("{NETCDF} {}", steps(self.spinup.unwrap_or(timestep), timestep)));
        } else {
            lines.push("NHSTAR NHSINC", "0 0");
        }
        lines.push("ITITER ISLDIA CONVCR ITMAX", "1 0 1e-10 25");
        lines.push("NCPROJ", "coupled ensemble");
        lines.push("NCDATE", format!("{} UTC", self.reference_time().format("%Y-%m-%d %H:%M:%S")));
        lines.apply(&self.attributes);
        lines
    }

    /// Control file text for `phase`.
    ///
    /// The coldstart phase of a spun-up run covers the spin-up window with tides only and
    /// writes restart files at its end; the hotstart phase resumes from them.
    pub fn render(&self, phase: RunPhase) -> String {
        self.control_lines(phase).render()
    }

    /// Writes the control file for `phase` into `directory`.
    pub fn write(
        &self,
        directory: &Path,
        phase: RunPhase,
        overwrite: bool,
    ) -> Result<WriteOutcome, DriverError> {
        write_guarded(&directory.join(CONTROL_FILENAME), self.render(phase), overwrite)
    }
}
