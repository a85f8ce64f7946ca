use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use walkdir::WalkDir;

fn driver(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_coupled-driver"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run coupled-driver")
}

fn initialize(mesh_directory: &Path, output: &Path, extra: &[&str]) -> Output {
    let mut args = vec![
        "initialize",
        "--platform",
        "hera",
        "--mesh-directory",
        mesh_directory.to_str().expect("mesh path"),
        "--modeled-start-time",
        "2008-08-23 00:00:00",
        "--modeled-duration",
        "5:00:00:00",
        "--modeled-timestep",
        "2",
        "--output-directory",
        output.to_str().expect("output path"),
    ];
    args.extend_from_slice(extra);
    driver(&args)
}

fn mesh_directory(root: &Path) -> std::path::PathBuf {
    let directory = root.join("mesh");
    fs::create_dir_all(&directory).expect("mesh dir");
    fs::write(directory.join("fort.14"), "test mesh\n0 0\n").expect("mesh");
    directory
}

#[test]
fn initialize_then_generate_builds_the_tree() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mesh = mesh_directory(dir.path());
    let output = dir.path().join("run");

    let initialized = initialize(
        &mesh,
        &output,
        &["--forcings", "tidal", "--tidal-spinup-duration", "12:00:00:00"],
    );
    assert!(initialized.status.success(), "{}", String::from_utf8_lossy(&initialized.stderr));
    for document in [
        "configure_modeldriver.json",
        "configure_slurm.json",
        "configure_adcirc.json",
        "configure_tidal.json",
    ] {
        assert!(output.join(document).is_file(), "{document} missing");
    }
    assert!(!output.join("configure_nems.json").exists());

    let generated = driver(&[
        "generate",
        "--configuration-directory",
        output.to_str().expect("output path"),
        "--json",
    ]);
    assert!(generated.status.success(), "{}", String::from_utf8_lossy(&generated.stderr));
    let report: serde_json::Value =
        serde_json::from_slice(&generated.stdout).expect("report json");
    assert_eq!(report["coldstart"], "coldstart_prepared");
    assert_eq!(report["runs"]["unperturbed"], "hotstart_prepared");
    assert!(output.join("coldstart").join("fort.15").is_file());
    assert!(output.join("runs").join("unperturbed").join("fort.15").is_file());

    let checked = driver(&["check", output.to_str().expect("output path"), "--json"]);
    assert!(checked.status.success());
    let statuses: serde_json::Value = serde_json::from_slice(&checked.stdout).expect("check json");
    let statuses = statuses.as_array().expect("array");
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0]["name"], "coldstart");
    assert_eq!(statuses[1]["status"], "not_started");
}

#[test]
fn skip_existing_leaves_edited_documents_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mesh = mesh_directory(dir.path());
    let output = dir.path().join("run");

    assert!(initialize(&mesh, &output, &[]).status.success());
    let slurm = output.join("configure_slurm.json");
    fs::write(&slurm, "{\"tasks\": 4}\n").expect("edit");

    assert!(initialize(&mesh, &output, &["--skip-existing"]).status.success());
    assert_eq!(fs::read_to_string(&slurm).expect("read"), "{\"tasks\": 4}\n");

    assert!(initialize(&mesh, &output, &[]).status.success());
    assert_ne!(fs::read_to_string(&slurm).expect("read"), "{\"tasks\": 4}\n");
}

#[test]
fn generate_twice_with_skip_existing_is_stable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mesh = mesh_directory(dir.path());
    let output = dir.path().join("run");
    assert!(initialize(&mesh, &output, &["--generate"]).status.success());

    let snapshot = |root: &Path| -> Vec<(String, Vec<u8>)> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.expect("entry"))
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let relative = entry.path().strip_prefix(root).expect("prefix");
                (relative.display().to_string(), fs::read(entry.path()).expect("read"))
            })
            .collect()
    };
    let before = snapshot(&output);
    let generated = driver(&[
        "generate",
        "--configuration-directory",
        output.to_str().expect("output path"),
        "--skip-existing",
    ]);
    assert!(generated.status.success());
    assert_eq!(before, snapshot(&output));
}

#[test]
fn fatal_errors_exit_non_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let generated = driver(&[
        "generate",
        "--configuration-directory",
        dir.path().to_str().expect("path"),
    ]);
    assert!(!generated.status.success());

    let mesh = mesh_directory(dir.path());
    let output = dir.path().join("run");
    let unknown = initialize(&mesh, &output, &["--forcings", "tsunami"]);
    assert!(!unknown.status.success());
    assert!(!output.join("configure_adcirc.json").exists());
}

#[test]
fn relative_paths_resolve_against_the_document_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mesh = mesh_directory(dir.path());
    let output = dir.path().join("run");

    assert!(initialize(&mesh, &output, &["--relative-paths"]).status.success());
    let document = fs::read_to_string(output.join("configure_adcirc.json")).expect("read");
    assert!(document.contains("\"../mesh/fort.14\""), "{document}");

    let generated = driver(&[
        "generate",
        "--configuration-directory",
        output.to_str().expect("output path"),
    ]);
    assert!(generated.status.success(), "{}", String::from_utf8_lossy(&generated.stderr));
    assert_eq!(
        fs::read_to_string(output.join("fort.14")).expect("mesh copy"),
        "test mesh\n0 0\n"
    );
}

#[test]
fn modeled_window_past_the_calendar_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mesh = mesh_directory(dir.path());
    let output = dir.path().join("run");

    let args = [
        "initialize",
        "--platform",
        "hera",
        "--mesh-directory",
        mesh.to_str().expect("mesh path"),
        "--modeled-start-time",
        "2008-08-23 00:00:00",
        "--modeled-duration",
        "9000000000000",
        "--modeled-timestep",
        "2",
        "--output-directory",
        output.to_str().expect("output path"),
    ];
    let initialized = driver(&args);
    assert!(!initialized.status.success());
    assert!(String::from_utf8_lossy(&initialized.stderr).contains("timestamp_out_of_range"));
    assert!(!output.join("configure_adcirc.json").exists());
}
