use buildnis_config::placeholder::{self, PROJECT_NAME};
use buildnis_config::{ConfigNode, Constants, PlaceholderResolver};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};

fn node(value: Value) -> ConfigNode {
    ConfigNode::from_value(value).unwrap()
}

fn resolver() -> PlaceholderResolver {
    let clock = NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    PlaceholderResolver::new(Constants::with_clock(clock))
}

#[test]
fn test_literal_from_root_scope() {
    let mut root = node(json!({"PROJECT_NAME": "Widget", "step": "Build ${PROJECT_NAME} now"}));
    resolver().resolve(&mut root);
    assert_eq!(root.get_str("step"), Some("Build Widget now"));
}

#[test]
fn test_literal_from_constants() {
    let mut constants = Constants::new();
    constants.set(PROJECT_NAME, "Widget");
    let mut root = node(json!({"step": "Build ${PROJECT_NAME} now"}));
    PlaceholderResolver::new(constants).resolve(&mut root);
    assert_eq!(root.get_str("step"), Some("Build Widget now"));
}

#[test]
fn test_parent_scope_traversal() {
    let mut root = node(json!({"X": "42", "a": {"b": "${../X}"}}));
    resolver().resolve(&mut root);
    assert_eq!(root.get("a").unwrap(), &json!({"b": "42"}));
}

#[test]
fn test_unresolvable_is_unchanged() {
    let mut root = node(json!({"s": "${NOT_DEFINED_ANYWHERE}"}));
    resolver().resolve(&mut root);
    assert_eq!(root.get_str("s"), Some("${NOT_DEFINED_ANYWHERE}"));
}

#[test]
fn test_non_string_replaces_wholesale() {
    let mut root = node(json!({"LIST_REF": ["a", "b"], "s": "prefix ${LIST_REF}", "n": "${COUNT}", "COUNT": 3}));
    resolver().resolve(&mut root);
    assert_eq!(root.get("s").unwrap(), &json!(["a", "b"]));
    assert_eq!(root.get("n").unwrap(), &json!(3));
}

#[test]
fn test_dict_in_sequence_scopes_through_the_sequence() {
    let mut root = node(json!({
        "name": "lib",
        "supported_builds": [{"target": "${../name}", "own": "${name}"}]
    }));
    resolver().resolve(&mut root);
    // The element itself is not a scope; the owning list is, and resolves nothing
    assert_eq!(
        root.get("supported_builds").unwrap(),
        &json!([{"target": "lib", "own": "${name}"}])
    );
}

#[test]
fn test_nested_sequences_push_no_scope() {
    let mut root = node(json!({"X": "1", "grid": [["${X}", 2], "${X}"]}));
    resolver().resolve(&mut root);
    assert_eq!(root.get("grid").unwrap(), &json!([["1", 2], "1"]));
}

#[test]
fn test_parents_are_outer_scopes() {
    let project = node(json!({"name": "Widget", "out": "/tmp/out"}));
    let module = node(json!({"module_path": "/src/lib"}));
    let mut build = node(json!({
        "output": "${../../out}/lib",
        "source": "${../module_path}/main.c",
        "missing": "${../../../name}"
    }));

    resolver().resolve_with_parents(&mut build, &[&project, &module]);
    assert_eq!(build.get_str("output"), Some("/tmp/out/lib"));
    assert_eq!(build.get_str("source"), Some("/src/lib/main.c"));
    assert_eq!(build.get_str("missing"), Some("${../../../name}"));
}

#[test]
fn test_single_pass_reads_the_snapshot() {
    let mut root = node(json!({"A": "${B}", "B": "${C}", "C": "c"}));
    resolver().resolve(&mut root);
    assert_eq!(root.get_str("A"), Some("${C}"));
    assert_eq!(root.get_str("B"), Some("c"));
}

#[test]
fn test_chained_references_reach_a_fixed_point() {
    let mut root = node(json!({"A": "${B}", "B": "${C}", "C": "c"}));
    let expansion = resolver().resolve_until_stable(&mut root, &[], 8);
    assert!(expansion.stable);
    assert_eq!(expansion.passes, 3);
    assert_eq!(root, node(json!({"A": "c", "B": "c", "C": "c"})));
}

#[test]
fn test_self_growing_reference_does_not_stabilise() {
    let mut root = node(json!({"A": "x${A}"}));
    let expansion = resolver().resolve_until_stable(&mut root, &[], 4);
    assert!(!expansion.stable);
    assert_eq!(expansion.passes, 4);
    assert_eq!(root.get_str("A"), Some("xxxxx${A}"));
}

#[test]
fn test_date_constant() {
    let mut root = node(json!({"stamp": "built on ${DATE}, ${DATE}"}));
    resolver().resolve(&mut root);
    assert_eq!(root.get_str("stamp"), Some("built on 07.03.2024, 07.03.2024"));
    assert!(placeholder::unresolved_placeholders(&root).is_empty());
}

fn literal_keys() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z ]{0,6}", 4)
}

proptest! {
    #[test]
    fn resolving_twice_equals_resolving_once(
        values in literal_keys(),
        refs in proptest::collection::vec((0usize..6, "[a-z]{0,3}"), 0..8),
    ) {
        let mut map = serde_json::Map::new();
        for (i, v) in values.iter().enumerate() {
            map.insert(format!("K{}", i), json!(v));
        }
        let mut nested = serde_json::Map::new();
        for (i, (target, text)) in refs.iter().enumerate() {
            // K4 and K5 do not exist and stay unresolved
            map.insert(format!("r{}", i), json!(format!("{}${{K{}}}", text, target)));
            nested.insert(format!("n{}", i), json!(format!("${{../K{}}}{}", target, text)));
        }
        map.insert("nested".to_string(), Value::Object(nested));
        let mut root = ConfigNode::from(map);

        let resolver = resolver();
        resolver.resolve(&mut root);
        let once = root.clone();
        resolver.resolve(&mut root);
        prop_assert_eq!(once, root);
    }
}
