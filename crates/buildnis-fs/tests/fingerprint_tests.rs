//! Change detection through content fingerprints

use buildnis_fs::{Error, Fingerprint, same_content};
use std::fs;
use tempfile::TempDir;

#[test]
fn fingerprint_is_stable_for_unmodified_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("host_config.json");
    fs::write(&path, r#"{"file_name": "host_config"}"#).unwrap();

    let first = Fingerprint::compute(&path).unwrap();
    let second = Fingerprint::compute(&path).unwrap();

    assert_eq!(first.size(), second.size());
    assert_eq!(first.digest(), second.digest());
    assert!(same_content(&first, &second));
}

#[test]
fn changing_one_byte_changes_the_digest() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, b"{\"a\": 1}").unwrap();
    let before = Fingerprint::compute(&path).unwrap();

    fs::write(&path, b"{\"a\": 2}").unwrap();
    let after = Fingerprint::compute(&path).unwrap();

    assert_eq!(before.size(), after.size());
    assert_ne!(before.digest(), after.digest());
    assert!(!before.same_content(&after));
}

#[test]
fn copies_have_the_same_content() {
    let temp = TempDir::new().unwrap();
    let original = temp.path().join("a.json");
    let copy = temp.path().join("b.json");
    fs::write(&original, "same bytes").unwrap();
    fs::copy(&original, &copy).unwrap();

    let a = Fingerprint::compute(&original).unwrap();
    let b = Fingerprint::compute(&copy).unwrap();

    assert_ne!(a.path(), b.path());
    assert!(a.same_content(&b));
}

#[test]
fn matches_file_detects_size_change_without_hashing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, "short").unwrap();
    let fingerprint = Fingerprint::compute(&path).unwrap();

    assert!(fingerprint.matches_file(&path).unwrap());

    fs::write(&path, "a lot longer now").unwrap();
    assert!(!fingerprint.matches_file(&path).unwrap());
}

#[test]
fn missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let result = Fingerprint::compute(temp.path().join("missing.json"));
    assert!(matches!(result, Err(Error::NotFound { .. })));
}
