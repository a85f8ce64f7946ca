//! Ensemble-level dispatch and cleanup scripts.

use driver_core::errors::DriverError;
use driver_core::platform::Platform;

use crate::bash::{bash_for_loop, bash_if_statement};
use crate::script::{Script, SHEBANG};

const DIRECTORY: &str = r#"DIRECTORY="$(cd "$(dirname "${BASH_SOURCE[0]}")" && pwd -P)""#;
const RUNS_LOOP: &str = "for hotstart in ${DIRECTORY}/runs/*/";
const COLDSTART_DIRECTORY: &str = "${DIRECTORY}/coldstart";
const POPD: &str = "popd >/dev/null 2>&1";
const SQUEUE: &str = r#"squeue -u $USER -o "%.8i %.21j %.4C %.4D %.31E %.20V %.20S %.20e""#;
const CLEANUP_COMMANDS: [&str; 3] = [
    "rm -rf PE* ADC_*",
    "rm max* partmesh.txt metis_graph.txt",
    "rm fort.16 fort.6* fort.80",
];

fn pushd(directory: &str) -> String {
    format!("pushd {directory} >/dev/null 2>&1")
}

fn strings(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

/// Submits the coldstart job pair, then every hotstart pair chained after it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleRunScript {
    platform: Platform,
    spinup: bool,
    commands: Vec<String>,
}

impl EnsembleRunScript {
    /// Dispatch script for `platform`; `spinup` adds the coldstart block.
    pub fn new(platform: Platform, spinup: bool, commands: Vec<String>) -> Self {
        Self {
            platform,
            spinup,
            commands,
        }
    }

    fn scheduled(&self) -> bool {
        self.platform.info().uses_scheduler
    }

    fn coldstart(&self) -> Vec<String> {
        if self.scheduled() {
            strings(&[
                "coldstart_adcprep_jobid=$(sbatch adcprep.job | awk '{print $NF}')",
                "coldstart_jobid=$(sbatch --dependency=afterany:$coldstart_adcprep_jobid adcirc.job | awk '{print $NF}')",
            ])
        } else {
            strings(&["sh adcprep.job", "sh adcirc.job"])
        }
    }

    fn hotstart(&self) -> Vec<String> {
        if !self.scheduled() {
            return strings(&["sh adcprep.job", "sh adcirc.job"]);
        }
        let adcprep = if self.spinup {
            "hotstart_adcprep_jobid=$(sbatch --dependency=afterany:$coldstart_jobid adcprep.job | awk '{print $NF}')"
        } else {
            "hotstart_adcprep_jobid=$(sbatch adcprep.job | awk '{print $NF}')"
        };
        strings(&[
            adcprep,
            "sbatch --dependency=afterany:$hotstart_adcprep_jobid adcirc.job",
        ])
    }
}

impl Script for EnsembleRunScript {
    fn lines(&self) -> Result<Vec<String>, DriverError> {
        let mut lines = strings(&[SHEBANG, DIRECTORY, ""]);
        if self.spinup {
            lines.push("# run single coldstart configuration".to_string());
            lines.push(pushd(COLDSTART_DIRECTORY));
            lines.extend(self.coldstart());
            lines.push(POPD.to_string());
            lines.push(String::new());
        }
        lines.push("# run every hotstart configuration".to_string());
        let mut body = vec![pushd("${hotstart}")];
        body.extend(self.hotstart());
        body.push(POPD.to_string());
        lines.extend(bash_for_loop(RUNS_LOOP, &body));
        lines.extend(self.commands.iter().cloned());
        if self.scheduled() {
            lines.push(String::new());
            lines.push("# display job queue with dependencies".to_string());
            lines.push(SQUEUE.to_string());
            lines.push(format!("echo {}", SQUEUE.replace('"', r#"\""#)));
        }
        Ok(lines)
    }

    fn default_filename(&self) -> String {
        format!("run_{}.sh", self.platform.file_stem())
    }
}

/// Removes partitioned inputs and model output from every run directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnsembleCleanupScript {
    commands: Vec<String>,
}

impl EnsembleCleanupScript {
    /// Cleanup script followed by `commands`.
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

impl Script for EnsembleCleanupScript {
    fn lines(&self) -> Result<Vec<String>, DriverError> {
        let cleanup = |directory: &str| {
            let mut block = vec![pushd(directory)];
            block.extend(strings(&CLEANUP_COMMANDS));
            block.push(POPD.to_string());
            block
        };
        let mut lines = strings(&[SHEBANG, DIRECTORY, "", "# prepare single coldstart directory"]);
        lines.extend(bash_if_statement(
            &format!("[ -d {COLDSTART_DIRECTORY} ]"),
            &cleanup(COLDSTART_DIRECTORY),
            None,
        ));
        lines.push(String::new());
        lines.push("# prepare every hotstart directory".to_string());
        lines.extend(bash_for_loop(RUNS_LOOP, &cleanup("${hotstart}")));
        lines.extend(self.commands.iter().cloned());
        Ok(lines)
    }

    fn default_filename(&self) -> String {
        "cleanup.sh".to_string()
    }
}
