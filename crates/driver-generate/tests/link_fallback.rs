#![cfg(unix)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use driver_core::DriverError;
use driver_generate::{create_link, create_link_with, LinkOutcome};

fn refuse(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks disabled"))
}

fn source(dir: &Path) -> PathBuf {
    let path = dir.join("mesh").join("fort.14");
    fs::create_dir_all(path.parent().expect("parent")).expect("mesh dir");
    fs::write(&path, "test mesh\n0 0\n").expect("mesh");
    path
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|metadata| metadata.file_type().is_symlink())
        .unwrap_or(false)
}

#[test]
fn refused_symlink_copies_the_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = source(dir.path());
    let link = dir.path().join("runs").join("a").join("fort.14");

    let outcome = create_link_with(&source, &link, true, true, refuse).expect("fallback");
    assert_eq!(outcome, LinkOutcome::Copied(link.clone()));
    assert!(!is_symlink(&link));
    assert_eq!(fs::read_to_string(&link).expect("copy"), "test mesh\n0 0\n");
}

#[test]
fn refused_symlink_to_missing_source_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let link = dir.path().join("runs").join("a").join("fort.67.nc");

    let err = create_link_with(&dir.path().join("absent.nc"), &link, true, true, refuse)
        .unwrap_err();
    assert!(matches!(err, DriverError::Io(_)));
    assert_eq!(err.info().code, "create_link");
    assert!(fs::symlink_metadata(&link).is_err());
}

#[test]
fn links_are_relative_and_replaced() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = source(dir.path());
    let link = dir.path().join("runs").join("a").join("fort.14");

    let outcome = create_link(&source, &link, true, false).expect("link");
    assert_eq!(outcome, LinkOutcome::Linked(link.clone()));
    assert_eq!(
        fs::read_link(&link).expect("target"),
        Path::new("../../mesh/fort.14")
    );
    let outcome = create_link(&source, &link, false, false).expect("relink");
    assert_eq!(outcome, LinkOutcome::Linked(link.clone()));
    assert_eq!(fs::read_link(&link).expect("target"), source);
}

#[test]
fn regular_files_are_kept_without_overwrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = source(dir.path());
    let link = dir.path().join("fort.14.local");
    fs::write(&link, "edited\n").expect("edited");

    let outcome = create_link(&source, &link, true, false).expect("skip");
    assert_eq!(outcome, LinkOutcome::Skipped(link.clone()));
    assert_eq!(fs::read_to_string(&link).expect("kept"), "edited\n");

    let outcome = create_link(&source, &link, true, true).expect("replace");
    assert_eq!(outcome, LinkOutcome::Linked(link.clone()));
    assert!(is_symlink(&link));
}
