use std::path::Path;

use chrono::Duration;
use driver_core::{DriverError, EmailType, Platform};
use driver_script::{
    adcirc_run_job, adcirc_setup_job, default_job_name, JobScript, Script, HOTSTART_JOB_NAME,
};

#[test]
fn scheduler_header_follows_directive_order() {
    let job = JobScript::new(Platform::Hera, 50)
        .with_name("storm")
        .with_run_directory("/scratch/storm")
        .with_account(Some("coastal".to_string()))
        .with_email(Some(EmailType::End), Some("someone@example.com".to_string()))
        .with_duration(Some(Duration::minutes(90) + Duration::milliseconds(600)))
        .with_partition(Some("bigmem".to_string()))
        .with_commands(["echo hello"]);
    let text = job.render().expect("render");
    let expected = [
        "#!/bin/bash --login",
        "#SBATCH -J storm",
        "#SBATCH -D /scratch/storm",
        "#SBATCH -A coastal",
        "#SBATCH --mail-type=END",
        "#SBATCH --mail-user=someone@example.com",
        "#SBATCH --error=slurm.log",
        "#SBATCH --output=slurm.log",
        "#SBATCH -n 50",
        "#SBATCH -N 2",
        "#SBATCH --time=01:30:01",
        "#SBATCH --partition=bigmem",
        "",
        "set -e",
        "",
        "echo hello",
    ]
    .join("\n");
    assert_eq!(text, format!("{expected}\n"));
}

#[test]
fn platform_defaults_fill_account_and_partition() {
    let text = JobScript::new(Platform::Stampede2, 136)
        .with_name("defaults")
        .render()
        .expect("render");
    assert!(text.contains("#SBATCH -A coastal\n"));
    assert!(text.contains("#SBATCH -N 2\n"));
    assert!(text.contains("#SBATCH --partition=development\n"));
    assert!(!text.contains("--time"));
}

#[test]
fn notification_without_address_fails() {
    let job = JobScript::new(Platform::Hera, 1).with_email(Some(EmailType::Fail), None);
    let err = job.render().unwrap_err();
    assert!(matches!(err, DriverError::MissingEmailAddress(_)));

    let quiet = JobScript::new(Platform::Hera, 1).with_email(Some(EmailType::None), None);
    assert!(!quiet.render().expect("render").contains("--mail"));
}

#[test]
fn local_jobs_have_no_header() {
    let job = JobScript::new(Platform::Local, 4)
        .with_modules(vec!["intel".to_string(), "netcdf".to_string()])
        .with_path_prefix(Some("$HOME/bin".to_string()))
        .with_source_filename(Some("env.sh".into()))
        .with_commands(["adcirc"]);
    let text = job.render().expect("render");
    assert_eq!(
        text,
        "#!/bin/bash --login\nmodule load intel netcdf\n\nPATH=$HOME/bin:$PATH\n\nsource env.sh\nadcirc\n"
    );
}

#[test]
fn setup_job_partitions_with_single_task() {
    let template = JobScript::new(Platform::Hera, 11).with_account(Some("coastal".to_string()));
    let job = adcirc_setup_job(template, Path::new("/opt/adcprep"), 11, None);
    assert_eq!(job.tasks(), 1);
    assert_eq!(job.nodes(), 1);
    assert_eq!(
        job.commands(),
        &[
            "srun /opt/adcprep --np 11 --partmesh".to_string(),
            "srun /opt/adcprep --np 11 --prepall".to_string(),
        ]
    );
    let text = job.render().expect("render");
    assert!(text.contains("#SBATCH -J ADCIRC_SETUP\n"));
    assert!(text.contains("#SBATCH --error=ADCIRC_SETUP.err.log\n"));
    assert!(text.contains("#SBATCH --output=ADCIRC_SETUP.out.log\n"));
}

#[test]
fn setup_job_preprocesses_track_first() {
    let template = JobScript::new(Platform::Local, 4);
    let job = adcirc_setup_job(template, Path::new("adcprep"), 4, Some(Path::new("aswip")));
    assert_eq!(
        job.commands(),
        &[
            "aswip".to_string(),
            "mv fort.22 fort.22.original".to_string(),
            "mv NWS_20_fort.22 fort.22".to_string(),
            "adcprep --np 4 --partmesh".to_string(),
            "adcprep --np 4 --prepall".to_string(),
        ]
    );
}

#[test]
fn run_job_uses_launcher_override() {
    let template = JobScript::new(Platform::Slurm, 72).with_launcher(Some("mpirun".to_string()));
    let job = adcirc_run_job(template, Path::new("padcirc"), HOTSTART_JOB_NAME);
    assert_eq!(job.commands(), &["mpirun padcirc".to_string()]);
    assert_eq!(job.nodes(), 2);
    assert_eq!(job.name(), "ADCIRC_HOTSTART");
}

#[test]
fn unnamed_jobs_get_stable_names() {
    let commands = vec!["echo one".to_string(), "echo two".to_string()];
    let first = default_job_name(&commands);
    assert_eq!(first, default_job_name(&commands));
    assert!(first.starts_with("job_"));
    assert_eq!(first.len(), "job_".len() + 16);
    assert_ne!(first, default_job_name(&commands[..1]));
    let job = JobScript::new(Platform::Hera, 1).with_commands(commands.clone());
    assert_eq!(job.name(), first);
}

#[test]
fn directory_targets_use_platform_file_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let job = JobScript::new(Platform::Orion, 1).with_name("write");
    let outcome = job.write(dir.path(), false).expect("write");
    assert_eq!(outcome.path(), dir.path().join("orion.job"));
    let again = job.write(dir.path(), false).expect("skip");
    assert!(!again.written());
}
