use chrono::{Duration, NaiveDate, NaiveDateTime};
use driver_config::{
    AdcircConfig, Configuration, ConfigurationKind, FieldType, Fragment, Record, Schema,
    SlurmConfig, Value,
};
use driver_core::{DriverError, EmailType};
use proptest::prelude::*;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2008, 8, 23)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("date")
}

fn scratch_record() -> Record {
    let schema = Schema::compose(&[Fragment::new("scratch").field("tasks", FieldType::Integer)])
        .expect("schema");
    Record::new("scratch", "configure_scratch.json", schema)
}

#[test]
fn written_record_reads_back_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut adcirc = AdcircConfig::new(
        &dir.path().join("fort.14"),
        start(),
        start() + Duration::days(5),
        Duration::seconds(2),
    )
    .expect("adcirc");
    adcirc
        .set("tidal_spinup_duration", Duration::days(12))
        .expect("spinup");
    adcirc
        .set("gwce_solution_scheme", "Semi-Implicit")
        .expect("scheme");
    adcirc.set("friction", 0.025).expect("widen");

    let outcome = adcirc.write(dir.path(), false).expect("write");
    assert!(outcome.written());
    assert_eq!(
        outcome.path(),
        dir.path().join(ConfigurationKind::Adcirc.default_filename())
    );

    let read = AdcircConfig::read(dir.path()).expect("read");
    assert_eq!(read.to_document(), adcirc.to_document());
    assert_eq!(read.tidal_spinup_duration(), Some(Duration::days(12)));
    assert_eq!(read.gwce_solution_scheme().as_deref(), Some("semi-implicit"));
}

#[test]
fn existing_documents_are_kept_without_overwrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = SlurmConfig::new(Some("first"), 11, None).expect("slurm");
    let second = SlurmConfig::new(Some("second"), 11, None).expect("slurm");
    first.write(dir.path(), false).expect("write");
    let outcome = second.write(dir.path(), false).expect("skip");
    assert!(!outcome.written());
    let read = SlurmConfig::read(dir.path()).expect("read");
    assert_eq!(read.account().as_deref(), Some("first"));

    second.write(dir.path(), true).expect("overwrite");
    let read = SlurmConfig::read(dir.path()).expect("read");
    assert_eq!(read.account().as_deref(), Some("second"));
}

#[test]
fn documents_use_lower_case_keys_and_text_values() {
    let mut slurm = SlurmConfig::new(None, 4, Some(Duration::hours(6))).expect("slurm");
    slurm.set("Run_Name", "storm").expect("mixed case key");
    slurm.set_email("someone@example.com", None).expect("email");
    let document = slurm.to_document();
    assert_eq!(document["run_name"], "storm");
    assert_eq!(document["job_duration"], "06:00:00.0");
    assert_eq!(document["email_type"], "ALL");
    assert!(document.keys().all(|key| key == &key.to_lowercase()));
    assert_eq!(slurm.email_type(), Some(EmailType::All));
}

#[test]
fn missing_document_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = SlurmConfig::read(&dir.path().join("configure_slurm.json")).unwrap_err();
    assert!(matches!(err, DriverError::ConfigurationNotFound(_)));
}

#[test]
fn failed_coercion_keeps_previous_value() {
    let mut slurm = SlurmConfig::new(None, 4, None).expect("slurm");
    let err = slurm.set("tasks", "many").unwrap_err();
    assert!(matches!(err, DriverError::TypeCoercion(_)));
    assert_eq!(err.info().context["field"], "tasks");
    assert!(err.info().context["value"].contains("many"));
    assert_eq!(slurm.tasks(), Some(4));

    let err = slurm.set("email_type", "SOMETIMES").unwrap_err();
    assert!(err.info().hint.as_deref().is_some_and(|hint| hint.contains("ALL")));
}

#[test]
fn unknown_keys_widen_the_schema() {
    let mut record = scratch_record();
    assert!(record.get("friction").is_err());
    record.set("friction", 0.02).expect("widen");
    assert_eq!(record.schema().get("friction"), Some(&FieldType::Float));
    record.set("friction", 3).expect("integer coerces to float");
    assert_eq!(record.get("friction").expect("get"), &Value::Float(3.0));
    assert!(record.set("friction", vec!["a", "b"]).is_err());
    assert_eq!(record.schema().get("friction"), Some(&FieldType::Float));
}

#[test]
fn retyping_a_mixin_field_is_rejected() {
    let err = Schema::compose(&[
        Fragment::new("first").field("processors", FieldType::Integer),
        Fragment::new("second").field("processors", FieldType::Text),
    ])
    .unwrap_err();
    assert!(matches!(err, DriverError::Schema(_)));

    let merged = Schema::compose(&[
        Fragment::new("first").field("processors", FieldType::Integer),
        Fragment::new("second").field("processors", FieldType::Integer),
    ])
    .expect("identical declarations merge");
    assert_eq!(merged.len(), 1);
}

#[test]
fn out_of_range_durations_are_coercion_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut adcirc = AdcircConfig::new(
        &dir.path().join("fort.14"),
        start(),
        start() + Duration::days(5),
        Duration::seconds(2),
    )
    .expect("adcirc");
    for value in [
        Value::Integer(100_000_000_000_000_000),
        Value::Integer(i64::MIN),
        Value::Float(1e300),
        Value::Float(f64::NAN),
        Value::Text("1e30".to_string()),
    ] {
        let shown = value.to_string();
        let err = adcirc.set("tidal_spinup_duration", value).unwrap_err();
        assert!(matches!(err, DriverError::TypeCoercion(_)), "{shown}");
    }
    assert_eq!(adcirc.tidal_spinup_duration(), None);
    adcirc
        .set("tidal_spinup_duration", Value::Integer(86_400))
        .expect("one day");
    assert_eq!(adcirc.tidal_spinup_duration(), Some(Duration::days(1)));

    adcirc.write(dir.path(), true).expect("write");
    let path = dir.path().join(ConfigurationKind::Adcirc.default_filename());
    let mut document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    document["tidal_spinup_duration"] = serde_json::json!(100_000_000_000_000_000i64);
    std::fs::write(&path, document.to_string()).expect("edit");
    let err = AdcircConfig::read(dir.path()).unwrap_err();
    assert!(matches!(err, DriverError::TypeCoercion(_)));
    assert_eq!(err.info().context["field"], "tidal_spinup_duration");
}

proptest! {
    #[test]
    fn widened_fields_keep_their_type(text in ".{0,12}", flag in any::<bool>()) {
        let mut record = scratch_record();
        record.set("extra", 7i64).expect("widen");
        let outcome = record.set("extra", text.as_str());
        match outcome {
            Ok(()) => prop_assert!(matches!(record.get("extra").expect("get"), Value::Integer(_))),
            Err(err) => {
                prop_assert!(matches!(err, DriverError::TypeCoercion(_)));
                prop_assert_eq!(record.get("extra").expect("get"), &Value::Integer(7));
            }
        }
        let _ = record.set("extra", flag);
        prop_assert_eq!(record.schema().get("extra"), Some(&FieldType::Integer));
    }
}
