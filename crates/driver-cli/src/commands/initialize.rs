use std::error::Error;
use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime};
use clap::Args;
use driver_config::{
    AdcircConfig, AtmeshForcingConfig, BestTrackForcingConfig, Configuration, ForcingConfig,
    ModelDriverConfig, ModelType, NemsConfig, OwiForcingConfig, RunConfiguration, SlurmConfig,
    TidalForcingConfig, Ww3DataForcingConfig,
};
use driver_core::{
    offset_timestamp, parse_duration, parse_timestamp, DriverError, EmailType, ErrorInfo, Platform,
};
use driver_generate::generate;
use tracing::{debug, info};

const FORCING_NAMES: [&str; 5] = ["tidal", "besttrack", "owi", "atmesh", "ww3data"];

#[derive(Args, Debug)]
pub struct InitializeArgs {
    /// Platform the jobs are written for (HERA, ORION, STAMPEDE2, LOCAL, SLURM).
    #[arg(long)]
    pub platform: Platform,
    /// Directory holding `fort.14` and optionally `fort.13`.
    #[arg(long)]
    pub mesh_directory: PathBuf,
    /// Start of the modeled window.
    #[arg(long, value_parser = parse_timestamp)]
    pub modeled_start_time: NaiveDateTime,
    /// Length of the modeled window, e.g. `5:00:00:00`.
    #[arg(long, value_parser = parse_duration)]
    pub modeled_duration: Duration,
    /// Model timestep.
    #[arg(long, value_parser = parse_duration)]
    pub modeled_timestep: Duration,
    /// Tidal spin-up before the modeled window; enables the coldstart phase.
    #[arg(long, value_parser = parse_duration)]
    pub tidal_spinup_duration: Option<Duration>,
    /// Coupling loop interval; makes the run a coupled run.
    #[arg(long, value_parser = parse_duration)]
    pub nems_interval: Option<Duration>,
    /// Module file sourced by every job.
    #[arg(long)]
    pub modulefile: Option<PathBuf>,
    /// Comma-separated forcings (tidal, besttrack, owi, atmesh, ww3data).
    #[arg(long, value_delimiter = ',')]
    pub forcings: Vec<String>,
    /// Model executable, or the coupled executable for coupled runs.
    #[arg(long, default_value = "adcirc")]
    pub adcirc_executable: PathBuf,
    /// Mesh partitioner executable.
    #[arg(long, default_value = "adcprep")]
    pub adcprep_executable: PathBuf,
    /// Best-track preprocessor executable.
    #[arg(long)]
    pub aswip_executable: Option<PathBuf>,
    /// Processors assigned to the ocean model.
    #[arg(long, default_value_t = 11)]
    pub adcirc_processors: u32,
    /// Wall clock limit of every job.
    #[arg(long, value_parser = parse_duration, default_value = "06:00:00")]
    pub job_duration: Duration,
    /// Scheduler account.
    #[arg(long)]
    pub account: Option<String>,
    /// Scheduler partition.
    #[arg(long)]
    pub partition: Option<String>,
    /// Notification address.
    #[arg(long)]
    pub email_address: Option<String>,
    /// Notification type; defaults to ALL when an address is given.
    #[arg(long)]
    pub email_type: Option<EmailType>,
    /// Tidal database (TPXO or HAMTIDE).
    #[arg(long, default_value = "TPXO")]
    pub tidal_source: String,
    /// Comma-separated tidal constituents or groups (All, Major).
    #[arg(long, value_delimiter = ',')]
    pub tidal_constituents: Vec<String>,
    /// Tidal database file.
    #[arg(long)]
    pub tidal_path: Option<PathBuf>,
    /// Storm identifier of the best-track forcing, e.g. `AL112017`.
    #[arg(long)]
    pub besttrack_storm_id: Option<String>,
    /// Wind selector of the best-track forcing.
    #[arg(long)]
    pub besttrack_nws: Option<i64>,
    /// Update interval of the OWI forcing.
    #[arg(long, value_parser = parse_duration)]
    pub owi_interval: Option<Duration>,
    /// Atmospheric mesh file.
    #[arg(long)]
    pub atmesh_path: Option<PathBuf>,
    /// Wave data file.
    #[arg(long)]
    pub ww3data_path: Option<PathBuf>,
    /// Directory the configuration documents are written to.
    #[arg(long, default_value = ".")]
    pub output_directory: PathBuf,
    /// Keep documents that already exist instead of overwriting them.
    #[arg(long)]
    pub skip_existing: bool,
    /// Write path fields relative to the output directory.
    #[arg(long)]
    pub relative_paths: bool,
    /// Generate the ensemble tree right after writing the documents.
    #[arg(long)]
    pub generate: bool,
}

fn missing_argument(forcing: &str, flag: &str) -> DriverError {
    DriverError::KeyNotFound(
        ErrorInfo::new(
            "forcing_argument_missing",
            format!("forcing \"{forcing}\" requires --{flag}"),
        )
        .with_context("forcing", forcing)
        .with_context("flag", flag),
    )
}

fn forcing(args: &InitializeArgs, name: &str) -> Result<ForcingConfig, DriverError> {
    let forcing: ForcingConfig = match name {
        "tidal" => TidalForcingConfig::new(
            &args.tidal_source,
            args.tidal_constituents.clone(),
            args.tidal_path.as_deref(),
        )?
        .into(),
        "besttrack" => {
            let storm_id = args
                .besttrack_storm_id
                .as_deref()
                .ok_or_else(|| missing_argument(name, "besttrack-storm-id"))?;
            BestTrackForcingConfig::new(Some(storm_id), args.besttrack_nws)?.into()
        }
        "owi" => OwiForcingConfig::new(args.owi_interval)?.into(),
        "atmesh" => {
            let path = args
                .atmesh_path
                .as_deref()
                .ok_or_else(|| missing_argument(name, "atmesh-path"))?;
            AtmeshForcingConfig::new(path)?.into()
        }
        "ww3data" => {
            let path = args
                .ww3data_path
                .as_deref()
                .ok_or_else(|| missing_argument(name, "ww3data-path"))?;
            Ww3DataForcingConfig::new(path)?.into()
        }
        other => {
            return Err(DriverError::Schema(
                ErrorInfo::new("unknown_forcing", format!("unrecognized forcing \"{other}\""))
                    .with_context("forcing", other)
                    .with_hint(format!("must be one of {}", FORCING_NAMES.join(", "))),
            ))
        }
    };
    Ok(forcing)
}

fn modeled_end_time(args: &InitializeArgs) -> Result<NaiveDateTime, DriverError> {
    offset_timestamp(args.modeled_start_time, args.modeled_duration, "modeled_duration")
}

fn model(args: &InitializeArgs) -> Result<AdcircConfig, DriverError> {
    let mesh = args.mesh_directory.join("fort.14");
    let end_time = modeled_end_time(args)?;
    let mut adcirc = AdcircConfig::new(
        &mesh,
        args.modeled_start_time,
        end_time,
        args.modeled_timestep,
    )?;
    let attributes = args.mesh_directory.join("fort.13");
    if attributes.is_file() {
        adcirc.set("fort_13_path", attributes)?;
    }
    adcirc.set("processors", args.adcirc_processors)?;
    adcirc.set("adcprep_executable_path", args.adcprep_executable.as_path())?;
    if args.nems_interval.is_none() {
        adcirc.set("adcirc_executable_path", args.adcirc_executable.as_path())?;
    }
    if let Some(aswip) = &args.aswip_executable {
        adcirc.set("aswip_executable_path", aswip.as_path())?;
    }
    if let Some(spinup) = args.tidal_spinup_duration {
        adcirc.set("tidal_spinup_duration", spinup)?;
    }
    if let Some(modulefile) = &args.modulefile {
        adcirc.set("source_filename", modulefile.as_path())?;
    }
    Ok(adcirc)
}

fn scheduler(args: &InitializeArgs) -> Result<SlurmConfig, DriverError> {
    let mut slurm = SlurmConfig::new(
        args.account.as_deref(),
        args.adcirc_processors,
        Some(args.job_duration),
    )?;
    if let Some(partition) = &args.partition {
        slurm.set("partition", partition.as_str())?;
    }
    match (&args.email_address, args.email_type) {
        (Some(address), email_type) => slurm.set_email(address, email_type)?,
        (None, Some(email_type)) => slurm.set("email_type", email_type.name())?,
        (None, None) => {}
    }
    Ok(slurm)
}

/// Builds the run configuration described by `args`.
pub fn configuration(args: &InitializeArgs) -> Result<RunConfiguration, DriverError> {
    let mut names: Vec<String> = Vec::new();
    for name in &args.forcings {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    let forcings = names
        .iter()
        .map(|name| forcing(args, name))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(forcings = ?names, "configuring forcings");

    let driver = ModelDriverConfig::new(args.platform, None)?;
    let slurm = scheduler(args)?;
    let adcirc = model(args)?;
    match args.nems_interval {
        Some(interval) => {
            let mut nems = NemsConfig::new(
                &args.adcirc_executable,
                args.modeled_start_time,
                modeled_end_time(args)?,
                interval,
            )?;
            let mut sources: Vec<ModelType> = forcings
                .iter()
                .filter_map(ForcingConfig::coupling_entry)
                .map(|entry| entry.map(|entry| entry.model_type))
                .collect::<Result<_, _>>()?;
            sources.sort();
            sources.dedup();
            for source in sources {
                nems.connect(source, ModelType::Ocean)?;
            }
            RunConfiguration::coupled(driver, slurm, nems, adcirc, forcings)
        }
        None => RunConfiguration::standalone(driver, slurm, adcirc, forcings),
    }
}

pub fn run(args: &InitializeArgs) -> Result<(), Box<dyn Error>> {
    let configuration = configuration(args)?;
    let directory = args.output_directory.as_path();
    let overwrite = !args.skip_existing;
    let outcomes = configuration.write_directory(directory, overwrite, args.relative_paths)?;
    let written = outcomes.iter().filter(|outcome| outcome.written()).count();
    info!(
        directory = %directory.display(),
        written,
        skipped = outcomes.len() - written,
        "wrote configuration documents"
    );
    if args.generate {
        let report = generate(&configuration, directory, overwrite)?;
        println!("{}: {}", report.root.display(), report.summary());
    }
    Ok(())
}
