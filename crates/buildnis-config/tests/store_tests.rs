use buildnis_config::{ConfigNode, DocumentStore, Error, SaveOutcome, Schema};
use buildnis_fs::NormalizedPath;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn write_doc(dir: &TempDir, name: &str, content: &str) -> NormalizedPath {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    NormalizedPath::new(path)
}

#[test]
fn test_load_valid_project() {
    let temp = TempDir::new().unwrap();
    let path = write_doc(
        &temp,
        "project_config.json",
        r#"{"file_name": "project_config", "file_version": "1.0", "name": "Widget"}"#,
    );

    let node = DocumentStore::new().load(&path, Schema::Project).unwrap();
    assert_eq!(node.get_str("name"), Some("Widget"));
}

#[rstest]
#[case(Schema::Module)]
#[case(Schema::Build)]
#[case(Schema::Host)]
#[case(Schema::ProjectDependency)]
fn test_wrong_schema_is_rejected(#[case] expected: Schema) {
    let temp = TempDir::new().unwrap();
    let path = write_doc(
        &temp,
        "doc.json",
        r#"{"file_name": "project_config", "file_version": "1.0"}"#,
    );

    match DocumentStore::new().load(&path, expected) {
        Err(Error::SchemaMismatch { expected: e, actual, .. }) => {
            assert_eq!(e, expected.as_str());
            assert_eq!(actual, "project_config");
        }
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
}

#[test]
fn test_missing_file_name_reports_empty_actual() {
    let temp = TempDir::new().unwrap();
    let path = write_doc(&temp, "doc.json", r#"{"file_version": "1.0"}"#);

    let result = DocumentStore::new().load(&path, Schema::Project);
    assert!(matches!(result, Err(Error::SchemaMismatch { actual, .. }) if actual.is_empty()));
}

#[rstest]
#[case("0.9", false)]
#[case("1.0", true)]
#[case("1.5", true)]
#[case("2.0", true)]
#[case("1.05", true)]
#[case("01.0", true)]
fn test_version_gate(#[case] version: &str, #[case] accepted: bool) {
    let temp = TempDir::new().unwrap();
    let content = json!({"file_name": "build_config", "file_version": version}).to_string();
    let path = write_doc(&temp, "build.json", &content);

    let result = DocumentStore::new().load(&path, Schema::Build);
    if accepted {
        assert!(result.is_ok());
    } else {
        assert!(matches!(result, Err(Error::VersionTooOld { .. })));
    }
}

#[test]
fn test_malformed_version_is_invalid() {
    let temp = TempDir::new().unwrap();
    let path = write_doc(
        &temp,
        "build.json",
        r#"{"file_name": "build_config", "file_version": "one"}"#,
    );

    let result = DocumentStore::new().load(&path, Schema::Build);
    assert!(matches!(result, Err(Error::InvalidVersion { value, .. }) if value == "one"));
}

#[test]
fn test_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("absent.json"));

    let result = DocumentStore::new().load(&path, Schema::Project);
    assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[rstest]
#[case("{ not json")]
#[case("[1, 2, 3]")]
fn test_malformed_content_is_parse_error(#[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let path = write_doc(&temp, "doc.json", content);

    let result = DocumentStore::new().load(&path, Schema::Project);
    assert!(matches!(result, Err(Error::Parse { .. })));
}

#[test]
fn test_save_then_load_keeps_field_order() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("out").join("box_host_config.json"));
    let store = DocumentStore::new();

    let mut node = ConfigNode::from_value(json!({"zeta": 1, "alpha": [true, null], "mid": {"b": 2, "a": 1}})).unwrap();
    store.stamp(&mut node, Schema::Host);
    store.save(&mut node, &path).unwrap();

    let loaded = store.load(&path, Schema::Host).unwrap();
    assert_eq!(loaded, node);
    assert!(!loaded.str_or_default("generated_at").is_empty());
    let keys: Vec<_> = loaded.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["file_name", "file_version", "generated_at", "zeta", "alpha", "mid"]);
}

#[test]
fn test_save_to_unwritable_location_is_write_error() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "file, not a directory").unwrap();
    let path = NormalizedPath::new(blocker.join("doc.json"));

    let mut node = ConfigNode::new();
    let result = DocumentStore::new().save(&mut node, &path);
    assert!(matches!(result, Err(Error::Write { .. })));
}

#[test]
fn test_save_if_changed_skips_identical_content() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("deps.json"));
    let store = DocumentStore::new();

    let mut node = ConfigNode::from_value(json!({"dependencies": []})).unwrap();
    store.stamp(&mut node, Schema::ProjectDependency);
    store.save(&mut node, &path).unwrap();

    // Rewrite the stamp so a rewrite would be visible
    let mut on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(path.to_native()).unwrap()).unwrap();
    on_disk["generated_at"] = json!("2000-01-01 00:00:00");
    fs::write(path.to_native(), format!("{}\n", serde_json::to_string_pretty(&on_disk).unwrap())).unwrap();

    let mut same = node.clone();
    assert_eq!(store.save_if_changed(&mut same, &path).unwrap(), SaveOutcome::Unchanged);
    assert_eq!(same.get_str("generated_at"), Some("2000-01-01 00:00:00"));

    let mut changed = node.clone();
    changed.set("dependencies", json!([{"name": "cmake"}]));
    assert_eq!(store.save_if_changed(&mut changed, &path).unwrap(), SaveOutcome::Written);
    let reloaded = store.load(&path, Schema::ProjectDependency).unwrap();
    assert_ne!(reloaded.get_str("generated_at"), Some("2000-01-01 00:00:00"));
}

#[test]
fn test_save_if_changed_writes_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("new.json"));
    let mut node = ConfigNode::new();

    let outcome = DocumentStore::new().save_if_changed(&mut node, &path).unwrap();
    assert_eq!(outcome, SaveOutcome::Written);
    assert!(path.is_file());
}
