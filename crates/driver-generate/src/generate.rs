//! Coldstart/hotstart ensemble generation.

use std::fs;
use std::path::{Path, PathBuf};

use driver_config::{AdcircConfig, PerturbedRun, RunConfiguration, RunKind, SlurmConfig};
use driver_core::errors::{DriverError, ErrorInfo};
use driver_core::files::write_guarded;
use driver_core::platform::Platform;
use driver_script::{
    adcirc_run_job, adcirc_setup_job, make_executable, EnsembleCleanupScript, EnsembleRunScript,
    JobScript, Script, COLDSTART_JOB_NAME, HOTSTART_JOB_NAME,
};
use tracing::{debug, info, info_span, warn};

use crate::control::AdcircDriver;
use crate::coupling::{phase_filename, ModelingSystem, COUPLING_FILENAMES};
use crate::links::{create_link, LinkOutcome};
use crate::report::GenerationReport;
use crate::state::{RunPhase, RunState};

/// Shared spin-up directory under the ensemble root.
pub const COLDSTART_DIRECTORY: &str = "coldstart";
/// Directory holding one subdirectory per ensemble member.
pub const RUNS_DIRECTORY: &str = "runs";
/// Restart files written by the coldstart and read by every hotstart.
pub const RESTART_FILENAMES: [&str; 2] = ["fort.67.nc", "fort.68.nc"];

const MESH_FILENAME: &str = "fort.14";
const ATTRIBUTES_FILENAME: &str = "fort.13";
/// Per-directory link to the mesh partitioning job.
pub const SETUP_LINK: &str = "adcprep.job";
/// Per-directory link to the phase's model job.
pub const RUN_LINK: &str = "adcirc.job";
const DEFAULT_COUPLED_EXECUTABLE: &str = "NEMS.x";

/// Root-level file names for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsembleLayout {
    /// Absolute ensemble root.
    pub root: PathBuf,
    /// Mesh partitioning job.
    pub setup_script: PathBuf,
    /// Spin-up job, written only with spin-up.
    pub coldstart_script: PathBuf,
    /// Production job.
    pub hotstart_script: PathBuf,
    /// Ensemble dispatch script.
    pub run_script: PathBuf,
    /// Ensemble cleanup script.
    pub cleanup_script: PathBuf,
}

impl EnsembleLayout {
    /// Layout of an ensemble rooted at `root` for `platform`.
    pub fn new(root: &Path, platform: Platform) -> Self {
        let stem = platform.file_stem();
        Self {
            root: root.to_path_buf(),
            setup_script: root.join(format!("job_adcprep_{stem}.job")),
            coldstart_script: root.join(format!("job_adcirc_{stem}.job.coldstart")),
            hotstart_script: root.join(format!("job_adcirc_{stem}.job.hotstart")),
            run_script: root.join(format!("run_{stem}.sh")),
            cleanup_script: root.join("cleanup.sh"),
        }
    }

    /// Run script of `phase`.
    pub fn run_job(&self, phase: RunPhase) -> &Path {
        match phase {
            RunPhase::Coldstart => &self.coldstart_script,
            RunPhase::Hotstart => &self.hotstart_script,
        }
    }

    /// Shared spin-up directory.
    pub fn coldstart_directory(&self) -> PathBuf {
        self.root.join(COLDSTART_DIRECTORY)
    }

    /// Directory of the member called `name`.
    pub fn run_directory(&self, name: &str) -> PathBuf {
        self.root.join(RUNS_DIRECTORY).join(name)
    }
}

fn job_template(platform: Platform, slurm: &SlurmConfig, adcirc: &AdcircConfig) -> JobScript {
    JobScript::new(platform, adcirc.processors())
        .with_account(slurm.account())
        .with_email(slurm.email_type(), slurm.email_address())
        .with_nodes(slurm.nodes())
        .with_duration(slurm.job_duration())
        .with_partition(slurm.partition())
        .with_modules(slurm.modules())
        .with_path_prefix(slurm.path_prefix())
        .with_source_filename(adcirc.source_filename())
        .with_launcher(slurm.launcher())
}

fn mesh_source(adcirc: &AdcircConfig) -> Result<PathBuf, DriverError> {
    match adcirc.fort_14_path() {
        Some(path) if path.is_file() => Ok(path),
        Some(path) => Err(DriverError::FileNotFound(
            ErrorInfo::new("mesh_missing", format!("mesh not found at \"{}\"", path.display()))
                .with_context("path", path.display().to_string()),
        )),
        None => Err(DriverError::FileNotFound(
            ErrorInfo::new("mesh_unset", "no mesh configured")
                .with_context("field", "fort_14_path")
                .with_hint("set fort_14_path in configure_adcirc.json"),
        )),
    }
}

fn same_file(left: &Path, right: &Path) -> bool {
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

struct Generator<'a> {
    configuration: &'a RunConfiguration,
    layout: EnsembleLayout,
    overwrite: bool,
    spinup: bool,
    coupled: bool,
    report: GenerationReport,
}

impl<'a> Generator<'a> {
    fn link(&mut self, source: &Path, link: &Path) -> Result<LinkOutcome, DriverError> {
        let outcome = create_link(source, link, true, self.overwrite)?;
        self.report.link(outcome.clone());
        Ok(outcome)
    }

    /// Restart links never abort generation; a failed link is reported as dangling.
    fn link_restart(&mut self, run: &str, source: &Path, link: &Path) {
        let outcome = match create_link(source, link, true, self.overwrite) {
            Ok(LinkOutcome::Dangling(path)) => {
                warn!(
                    run,
                    link = %link.display(),
                    "coldstart restart file not written yet; link or copy it after coldstart completes"
                );
                LinkOutcome::Dangling(path)
            }
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    run,
                    link = %link.display(),
                    error = %err,
                    "could not link coldstart restart file; link or copy it after coldstart completes"
                );
                LinkOutcome::Dangling(link.to_path_buf())
            }
        };
        self.report.link(outcome);
    }

    fn write_script(&mut self, script: &dyn Script, path: &Path) -> Result<(), DriverError> {
        debug!(script = %path.display(), "writing script");
        let outcome = script.write(path, self.overwrite)?;
        self.report.file(outcome);
        Ok(())
    }

    fn write_jobs(&mut self, platform: Platform) -> Result<(), DriverError> {
        let configuration = self.configuration;
        let adcirc = configuration.adcirc()?;
        let slurm = configuration.slurm()?;
        let template = job_template(platform, slurm, adcirc);

        let (executable, coldstart_tasks, hotstart_tasks, partitions) = if self.coupled {
            let executable = configuration
                .nems()
                .and_then(|nems| nems.executable_path())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COUPLED_EXECUTABLE));
            let coldstart = ModelingSystem::from_configuration(configuration, RunPhase::Coldstart)?;
            let hotstart = ModelingSystem::from_configuration(configuration, RunPhase::Hotstart)?;
            (executable, coldstart.processors(), hotstart.processors(), adcirc.processors())
        } else {
            let tasks = slurm.tasks().unwrap_or_else(|| adcirc.processors());
            (adcirc.adcirc_executable_path(), tasks, tasks, tasks)
        };

        let aswip = if configuration.use_aswip() {
            adcirc.aswip_executable_path()
        } else {
            None
        };
        let adcprep = adcirc.adcprep_executable_path();
        debug!(adcprep = %adcprep.display(), partitions, "setting mesh partitioner");
        let setup = adcirc_setup_job(template.clone(), &adcprep, partitions, aswip.as_deref());
        let path = self.layout.setup_script.clone();
        self.write_script(&setup, &path)?;

        debug!(executable = %executable.display(), "setting run executable");
        if self.spinup {
            let coldstart = adcirc_run_job(
                template.clone().with_tasks(coldstart_tasks),
                &executable,
                COLDSTART_JOB_NAME,
            );
            let path = self.layout.coldstart_script.clone();
            self.write_script(&coldstart, &path)?;
        }
        let hotstart = adcirc_run_job(
            template.with_tasks(hotstart_tasks),
            &executable,
            HOTSTART_JOB_NAME,
        );
        let path = self.layout.hotstart_script.clone();
        self.write_script(&hotstart, &path)
    }

    fn write_coupling(&mut self) -> Result<(), DriverError> {
        let mut phases = Vec::new();
        if self.spinup {
            phases.push(RunPhase::Coldstart);
        }
        phases.push(RunPhase::Hotstart);
        for phase in phases {
            let system = ModelingSystem::from_configuration(self.configuration, phase)?;
            let outcomes = system.write(&self.layout.root, phase, self.overwrite)?;
            info!(phase = %phase, files = outcomes.len(), "writing coupling configuration");
            for outcome in outcomes {
                self.report.file(outcome);
            }
        }
        Ok(())
    }

    fn write_mesh(&mut self, mesh: &Path) -> Result<(), DriverError> {
        let configuration = self.configuration;
        let adcirc = configuration.adcirc()?;
        let mut sources = vec![(mesh.to_path_buf(), MESH_FILENAME)];
        match adcirc.fort_13_path() {
            Some(path) if path.is_file() => sources.push((path, ATTRIBUTES_FILENAME)),
            Some(path) => debug!(path = %path.display(), "nodal attributes not found"),
            None => {}
        }
        let original = adcirc.use_original_mesh();
        if original {
            info!(mesh = %mesh.display(), "using original mesh");
        } else {
            info!(mesh = %mesh.display(), "copying mesh into ensemble root");
        }
        for (source, filename) in sources {
            let target = self.layout.root.join(filename);
            if same_file(&source, &target) {
                debug!(path = %target.display(), "mesh already in place");
                continue;
            }
            if original {
                let outcome = create_link(&source, &target, false, self.overwrite)?;
                self.report.link(outcome);
            } else {
                let contents =
                    fs::read(&source).map_err(|err| DriverError::io("read_mesh", &source, err))?;
                let outcome = write_guarded(&target, contents, self.overwrite)?;
                self.report.file(outcome);
            }
        }
        Ok(())
    }

    fn link_inputs(&mut self, directory: &Path, phase: RunPhase) -> Result<(), DriverError> {
        for filename in [ATTRIBUTES_FILENAME, MESH_FILENAME] {
            let source = self.layout.root.join(filename);
            if filename == ATTRIBUTES_FILENAME && fs::symlink_metadata(&source).is_err() {
                continue;
            }
            self.link(&source, &directory.join(filename))?;
        }
        let setup = self.layout.setup_script.clone();
        self.link(&setup, &directory.join(SETUP_LINK))?;
        let run = self.layout.run_job(phase).to_path_buf();
        self.link(&run, &directory.join(RUN_LINK))?;
        if self.coupled {
            for filename in COUPLING_FILENAMES {
                let source = self.layout.root.join(phase_filename(filename, phase));
                self.link(&source, &directory.join(filename))?;
            }
        }
        Ok(())
    }

    fn write_coldstart(&mut self) -> Result<(), DriverError> {
        let directory = self.layout.coldstart_directory();
        debug!(directory = %directory.display(), "writing coldstart configuration");
        let mut driver = AdcircDriver::from_configuration(self.configuration)?;
        driver.set_run_id(COLDSTART_DIRECTORY);
        let outcome = driver.write(&directory, RunPhase::Coldstart, self.overwrite)?;
        self.report.file(outcome);
        self.link_inputs(&directory, RunPhase::Coldstart)?;
        self.report.coldstart = Some(RunState::prepared(RunPhase::Coldstart));
        Ok(())
    }

    fn write_runs(&mut self, runs: Vec<PerturbedRun>) -> Result<(), DriverError> {
        info!(
            runs = runs.len(),
            directory = %self.layout.root.join(RUNS_DIRECTORY).display(),
            "generating run configurations"
        );
        for run in runs {
            let directory = self.layout.run_directory(&run.name);
            debug!(run = %run.name, directory = %directory.display(), "writing run configuration");
            let mut driver = AdcircDriver::from_configuration(&run.configuration)?;
            driver.set_run_id(&run.name);
            driver.apply_overrides(&run.overrides);
            let outcome = driver.write(&directory, RunPhase::Hotstart, self.overwrite)?;
            self.report.file(outcome);
            self.link_inputs(&directory, RunPhase::Hotstart)?;
            if self.spinup {
                let coldstart = self.layout.coldstart_directory();
                for filename in RESTART_FILENAMES {
                    self.link_restart(&run.name, &coldstart.join(filename), &directory.join(filename));
                }
            }
            self.report.reached(&run.name, RunState::prepared(RunPhase::Hotstart));
        }
        Ok(())
    }

    fn write_ensemble_scripts(&mut self, platform: Platform) -> Result<(), DriverError> {
        let cleanup = EnsembleCleanupScript::default();
        let path = self.layout.cleanup_script.clone();
        self.write_script(&cleanup, &path)?;

        let cleanup_name = cleanup.default_filename();
        let mut commands = vec![
            "echo deleting previous ADCIRC output".to_string(),
            format!("sh {cleanup_name}"),
        ];
        commands.extend(self.configuration.slurm()?.extra_commands());
        let run = EnsembleRunScript::new(platform, self.spinup, commands);
        let path = self.layout.run_script.clone();
        info!(script = %path.display(), "writing ensemble run script");
        self.write_script(&run, &path)?;
        make_executable(&path)
    }
}

/// Generates the ensemble tree for `configuration` under `output_directory`.
///
/// The mesh and the run descriptors are checked before anything is written. With spin-up, a shared `coldstart/`
/// directory is prepared first; every run descriptor then gets `runs/<name>/` in descriptor
/// order, each linking the coldstart restart files even before they exist. Without
/// `overwrite`, existing files are kept so a rerun only fills in what is missing.
pub fn generate(
    configuration: &RunConfiguration,
    output_directory: &Path,
    overwrite: bool,
) -> Result<GenerationReport, DriverError> {
    configuration.validate()?;
    let adcirc = configuration.adcirc()?;
    let mesh = mesh_source(adcirc)?;
    let platform = configuration.model_driver()?.platform()?;
    let runs = configuration.perturb()?;

    fs::create_dir_all(output_directory)
        .map_err(|err| DriverError::io("create_output", output_directory, err))?;
    let root = fs::canonicalize(output_directory)
        .map_err(|err| DriverError::io("resolve_output", output_directory, err))?;

    let span = info_span!("generate", root = %root.display(), platform = platform.name());
    let _entered = span.enter();

    let spinup = configuration.uses_spinup();
    let coupled = configuration.kind() == RunKind::CoupledAdcirc;
    if let Some(source) = adcirc.source_filename() {
        debug!(source = %source.display(), "sourcing modules");
    }
    info!(spinup, coupled, "generating ensemble");

    let mut generator = Generator {
        configuration,
        layout: EnsembleLayout::new(&root, platform),
        overwrite,
        spinup,
        coupled,
        report: GenerationReport::new(&root),
    };
    if coupled {
        generator.write_coupling()?;
    }
    generator.write_jobs(platform)?;
    generator.write_mesh(&mesh)?;
    if spinup {
        generator.write_coldstart()?;
    }
    generator.write_runs(runs)?;
    generator.write_ensemble_scripts(platform)?;

    let report = generator.report;
    info!(summary = %report.summary(), "generation finished");
    Ok(report)
}

/// Reads the configuration documents in `configuration_directory` and generates the ensemble
/// into `output_directory`, defaulting to the configuration directory itself.
pub fn generate_directory(
    configuration_directory: &Path,
    output_directory: Option<&Path>,
    overwrite: bool,
) -> Result<GenerationReport, DriverError> {
    let configuration = RunConfiguration::read_directory(configuration_directory)?;
    match configuration.kind() {
        RunKind::CoupledAdcirc => debug!("generating coupled configuration"),
        RunKind::Adcirc => debug!("generating standalone configuration"),
    }
    generate(
        &configuration,
        output_directory.unwrap_or(configuration_directory),
        overwrite,
    )
}
