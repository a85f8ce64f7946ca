use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use driver_config::{
    AdcircConfig, AtmeshForcingConfig, BestTrackForcingConfig, Configuration, ConfigurationEntry,
    ConfigurationKind, ForcingConfig, ForcingKind, ModelDriverConfig, ModelType, NativeForcing,
    NemsConfig, OwiForcingConfig, RunConfiguration, RunKind, SlurmConfig, TidalForcingConfig,
    Value, Ww3DataForcingConfig,
};
use driver_core::{DriverError, Platform};
use indexmap::IndexMap;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2008, 8, 23)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("date")
}

fn adcirc(mesh: &Path) -> AdcircConfig {
    AdcircConfig::new(mesh, start(), start() + Duration::days(5), Duration::seconds(2))
        .expect("adcirc")
}

fn run(mesh: &Path, perturbations: Option<IndexMap<String, Value>>) -> RunConfiguration {
    let driver = ModelDriverConfig::new(Platform::Hera, perturbations).expect("driver");
    let slurm = SlurmConfig::new(Some("coastal"), 11, Some(Duration::hours(6))).expect("slurm");
    RunConfiguration::standalone(driver, slurm, adcirc(mesh), vec![]).expect("run")
}

fn mapping(entries: Vec<(&str, Value)>) -> IndexMap<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[test]
fn directory_round_trip_preserves_documents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut configuration = run(&dir.path().join("fort.14"), None);
    configuration.add_forcing(TidalForcingConfig::new("TPXO", vec![], None).expect("tides"));

    let outcomes = configuration
        .write_directory(dir.path(), false, false)
        .expect("write");
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|outcome| outcome.written()));

    let read = RunConfiguration::read_directory(dir.path()).expect("read");
    assert_eq!(read.kind(), RunKind::Adcirc);
    for (name, entry) in configuration.iter() {
        let loaded = read.get(name).expect("loaded");
        assert_eq!(loaded.record().to_document(), entry.record().to_document());
    }
    assert_eq!(read.adcirc().expect("adcirc").forcings(), &[ForcingKind::Tides]);
}

#[test]
fn missing_required_document_fails_whole_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut configuration = run(&dir.path().join("fort.14"), None);
    configuration.add_forcing(OwiForcingConfig::new(None).expect("owi"));
    configuration
        .write_directory(dir.path(), false, false)
        .expect("write");
    fs::remove_file(dir.path().join("configure_slurm.json")).expect("remove");

    let err = RunConfiguration::read_directory(dir.path()).unwrap_err();
    assert!(matches!(err, DriverError::MissingConfiguration(_)));
    assert!(err.info().context["missing"].contains("configure_slurm.json"));
}

#[test]
fn relative_documents_resolve_against_their_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mesh = dir.path().join("mesh").join("fort.14");
    let output = dir.path().join("config");
    let configuration = run(&mesh, None);
    configuration
        .write_directory(&output, true, true)
        .expect("write");

    let raw = fs::read_to_string(output.join("configure_adcirc.json")).expect("document");
    let document: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(document["fort_14_path"], "../mesh/fort.14");

    let read = RunConfiguration::read_directory(&output).expect("read");
    let resolved = read
        .adcirc()
        .expect("adcirc")
        .fort_14_path()
        .expect("mesh path");
    assert_eq!(resolved, output.join("../mesh/fort.14"));
    assert_eq!(
        configuration.adcirc().expect("adcirc").fort_14_path(),
        Some(mesh)
    );
}

#[test]
fn forcings_are_deduplicated_by_kind() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut configuration = run(&dir.path().join("fort.14"), None);
    configuration.add_forcing(TidalForcingConfig::new("TPXO", vec![], None).expect("first"));
    configuration.add_forcing(
        TidalForcingConfig::new("HAMTIDE", vec!["M2".to_string()], None).expect("second"),
    );

    let forcings = configuration.forcings();
    assert_eq!(forcings.len(), 1);
    assert_eq!(
        forcings[0].record().text("tidal_source").as_deref(),
        Some("HAMTIDE")
    );
    assert_eq!(
        configuration.adcirc().expect("adcirc").forcings(),
        &[ForcingKind::Tides]
    );

    configuration.remove("tidal").expect("removed");
    assert!(configuration.adcirc().expect("adcirc").forcings().is_empty());
}

#[test]
fn duplicate_required_records_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entries: Vec<ConfigurationEntry> = vec![
        ModelDriverConfig::new(Platform::Local, None).expect("driver").into(),
        SlurmConfig::new(None, 1, None).expect("slurm").into(),
        SlurmConfig::new(None, 2, None).expect("slurm").into(),
        adcirc(&dir.path().join("fort.14")).into(),
    ];
    let err = RunConfiguration::from_configurations(entries).unwrap_err();
    assert!(matches!(err, DriverError::DuplicateConfiguration(_)));

    let incomplete: Vec<ConfigurationEntry> = vec![ModelDriverConfig::new(Platform::Local, None)
        .expect("driver")
        .into()];
    let err = RunConfiguration::from_configurations(incomplete).unwrap_err();
    assert!(matches!(err, DriverError::MissingConfiguration(_)));
}

#[test]
fn user_input_resolves_documents_and_native_forcings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut configuration = run(&dir.path().join("fort.14"), None);

    configuration
        .insert("Slurm", r#"{"account": "other", "tasks": 4}"#)
        .expect("inline document");
    let slurm = configuration.slurm().expect("slurm");
    assert_eq!(slurm.account().as_deref(), Some("other"));
    assert_eq!(slurm.tasks(), Some(4));

    let owi = OwiForcingConfig::new(Some(Duration::minutes(15))).expect("owi");
    owi.write(dir.path(), false).expect("write");
    configuration
        .insert("owi", dir.path().join("configure_owi.json"))
        .expect("document path");
    assert!(configuration.forcing(ForcingKind::OwiWind).is_some());

    configuration
        .insert(
            "besttrack",
            NativeForcing::BestTrack {
                storm_id: Some("AL112017".to_string()),
                nws: 20,
                interval: None,
                start_date: None,
                end_date: None,
                fort22_filename: None,
            },
        )
        .expect("native forcing");
    assert!(configuration.contains("besttrack"));

    let err = configuration
        .insert("slurm", ModelDriverConfig::new(Platform::Hera, None).expect("driver"))
        .unwrap_err();
    assert!(matches!(err, DriverError::Schema(_)));
    let err = configuration.insert("weather", "{}").unwrap_err();
    assert_eq!(err.info().code, "unknown_configuration");
}

#[test]
fn coupled_runs_collect_coupling_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut nems = NemsConfig::new(
        Path::new("NEMS.x"),
        start(),
        start() + Duration::days(5),
        Duration::hours(1),
    )
    .expect("nems");
    nems.connect(ModelType::Atmosphere, ModelType::Ocean)
        .expect("connect");
    let configuration = RunConfiguration::coupled(
        ModelDriverConfig::new(Platform::Hera, None).expect("driver"),
        SlurmConfig::new(None, 13, None).expect("slurm"),
        nems,
        adcirc(&dir.path().join("fort.14")),
        vec![
            AtmeshForcingConfig::new(Path::new("wind.nc"))
                .expect("atmesh")
                .into(),
            Ww3DataForcingConfig::new(Path::new("waves.nc"))
                .expect("ww3data")
                .into(),
        ],
    )
    .expect("coupled");
    assert_eq!(configuration.kind(), RunKind::CoupledAdcirc);

    let entries = configuration.coupling_entries().expect("entries");
    let slots: Vec<(ModelType, &str, u32)> = entries
        .iter()
        .map(|entry| (entry.model_type, entry.model.as_str(), entry.processors))
        .collect();
    assert_eq!(
        slots,
        vec![
            (ModelType::Ocean, "ADCIRC", 11),
            (ModelType::Atmosphere, "ATMESH", 1),
            (ModelType::Wave, "WW3DATA", 1),
        ]
    );

    configuration
        .write_directory(dir.path(), false, false)
        .expect("write");
    let read = RunConfiguration::read_directory(dir.path()).expect("read");
    assert_eq!(read.kind(), RunKind::CoupledAdcirc);
    assert_eq!(
        read.nems().expect("nems").connections(),
        vec![("ATM".to_string(), "OCN".to_string())]
    );
    assert_eq!(
        read.adcirc().expect("adcirc").forcings(),
        &[ForcingKind::AtmeshWind, ForcingKind::Ww3DataWave]
    );
}

#[test]
fn perturbations_expand_in_insertion_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let perturbations = mapping(vec![
        ("run_b", Value::Mapping(mapping(vec![("friction", Value::from(0.05))]))),
        ("run_a", Value::Mapping(mapping(vec![("friction", Value::from(0.02))]))),
        (
            "more_processors",
            Value::Mapping(mapping(vec![(
                "adcirc",
                Value::Mapping(mapping(vec![("processors", Value::from(4))])),
            )])),
        ),
        (
            "typo",
            Value::Mapping(mapping(vec![(
                "adcric",
                Value::Mapping(mapping(vec![("processors", Value::from(4))])),
            )])),
        ),
    ]);
    let configuration = run(&dir.path().join("fort.14"), Some(perturbations));
    let runs = configuration.perturb().expect("perturb");

    let names: Vec<&str> = runs.iter().map(|run| run.name.as_str()).collect();
    assert_eq!(names, vec!["run_b", "run_a", "more_processors", "typo"]);
    assert_eq!(runs[0].overrides["friction"], Value::Float(0.05));
    assert_eq!(runs[1].overrides["friction"], Value::Float(0.02));

    assert!(runs[2].overrides.is_empty());
    assert_eq!(runs[2].configuration.adcirc().expect("adcirc").processors(), 4);
    assert_eq!(configuration.adcirc().expect("adcirc").processors(), 11);

    assert!(runs[3].overrides.is_empty());
    assert_eq!(runs[3].configuration, configuration);
}

#[test]
fn unperturbed_driver_yields_single_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let configuration = run(&dir.path().join("fort.14"), None);
    let runs = configuration.perturb().expect("perturb");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].name, driver_config::UNPERTURBED);
}

#[test]
fn track_preprocessing_needs_executable_and_selector() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut configuration = run(&dir.path().join("fort.14"), None);
    configuration.add_forcing(
        BestTrackForcingConfig::new(Some("AL112017"), None).expect("track"),
    );
    assert!(!configuration.use_aswip());

    let adcirc = configuration.adcirc_mut().expect("adcirc");
    adcirc.set("aswip_executable_path", Path::new("aswip")).expect("aswip");
    assert!(configuration.use_aswip());

    configuration.add_forcing(
        BestTrackForcingConfig::new(Some("AL112017"), Some(8)).expect("track"),
    );
    assert!(configuration.use_aswip());
    configuration.add_forcing(ForcingConfig::from(
        BestTrackForcingConfig::new(Some("AL112017"), Some(1)).expect("track"),
    ));
    assert!(!configuration.use_aswip());
    assert_eq!(
        configuration
            .get(ConfigurationKind::BestTrack.name())
            .expect("track")
            .record()
            .integer("nws"),
        Some(1)
    );
}
