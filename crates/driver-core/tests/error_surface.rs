use driver_core::errors::{DriverError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("field", "tasks")
        .with_context("path", "configure_slurm.json")
}

#[test]
fn missing_configuration_surface() {
    let err = DriverError::MissingConfiguration(sample_info("missing_required", "absent"));
    assert_eq!(err.info().code, "missing_required");
    assert!(err.info().context.contains_key("path"));
}

#[test]
fn type_coercion_surface() {
    let err = DriverError::TypeCoercion(sample_info("invalid_integer", "not a number"));
    assert_eq!(err.info().code, "invalid_integer");
    assert!(err.info().context.contains_key("field"));
}

#[test]
fn display_includes_context_and_hint() {
    let err = DriverError::MissingEmailAddress(
        ErrorInfo::new("missing_email_address", "missing email address")
            .with_context("email_type", "ALL")
            .with_hint("set email_address"),
    );
    let text = err.to_string();
    assert!(text.starts_with("missing email address: missing email address (code: missing_email_address)"));
    assert!(text.contains("context: [email_type=ALL]"));
    assert!(text.ends_with("hint: set email_address"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = DriverError::DuplicateConfiguration(ErrorInfo::new("duplicate_role", "two slurm"));
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "DuplicateConfiguration");
    assert_eq!(json["detail"]["code"], "duplicate_role");
    let restored: DriverError = serde_json::from_value(json).expect("deserialize");
    assert_eq!(restored, err);
}

#[test]
fn io_helper_records_path() {
    let err = DriverError::io("write_document", std::path::Path::new("/tmp/x.json"), "denied");
    assert!(matches!(err, DriverError::Io(_)));
    assert_eq!(err.info().context.get("path").map(String::as_str), Some("/tmp/x.json"));
}
