//! Ocean model jobs: mesh partitioning and model runs.

use std::path::Path;

use crate::job::{command_path, JobScript};

/// Name of the partitioning job.
pub const SETUP_JOB_NAME: &str = "ADCIRC_SETUP";
/// Name of the spin-up job.
pub const COLDSTART_JOB_NAME: &str = "ADCIRC_COLDSTART";
/// Name of the production job.
pub const HOTSTART_JOB_NAME: &str = "ADCIRC_HOTSTART";

/// Wind selector written into the preprocessed track file name.
const ASWIP_TRACK_NWS: i64 = 20;

fn named(template: JobScript, name: &str) -> JobScript {
    template.with_name(name).with_logs(
        Some(format!("{name}.err.log").into()),
        Some(format!("{name}.out.log").into()),
    )
}

/// Partitions the mesh over `partitions` processors with `adcprep`.
///
/// With `aswip`, the best-track file is preprocessed and swapped in before partitioning.
pub fn adcirc_setup_job(
    template: JobScript,
    adcprep: &Path,
    partitions: u32,
    aswip: Option<&Path>,
) -> JobScript {
    let job = named(template, SETUP_JOB_NAME).with_tasks(1).with_nodes(None);
    let mut commands = Vec::new();
    if let Some(aswip) = aswip {
        commands.push(job.launch(&command_path(aswip)));
        commands.push("mv fort.22 fort.22.original".to_string());
        commands.push(format!("mv NWS_{ASWIP_TRACK_NWS}_fort.22 fort.22"));
    }
    let adcprep = command_path(adcprep);
    commands.push(job.launch(&format!("{adcprep} --np {partitions} --partmesh")));
    commands.push(job.launch(&format!("{adcprep} --np {partitions} --prepall")));
    job.with_commands(commands)
}

/// Runs `executable` under the launcher as the job called `name`.
pub fn adcirc_run_job(template: JobScript, executable: &Path, name: &str) -> JobScript {
    let job = named(template, name);
    let command = job.launch(&command_path(executable));
    job.with_commands([command])
}
