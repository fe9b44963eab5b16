mod common;

use std::fs;

use buildnis_config::placeholder::unresolved_placeholders;
use buildnis_config::{Constants, DocumentStore, PlaceholderResolver, Schema};
use buildnis_core::graph::{BUILD_CONFIGS, MODULE_CONFIGS};
use buildnis_core::{Error, ExitCode, ProjectGraphLoader};
use buildnis_fs::NormalizedPath;
use common::{Project, fixed_clock};
use pretty_assertions::assert_eq;
use serde_json::json;

fn load(project: &Project) -> buildnis_core::Result<buildnis_core::ProjectGraph> {
    ProjectGraphLoader::new(DocumentStore::new()).load(&NormalizedPath::new(project.project_file()))
}

fn resolver(graph: &buildnis_core::ProjectGraph) -> PlaceholderResolver {
    let mut constants = Constants::with_clock(fixed_clock());
    constants.set_project(&graph.project, graph.project.project_dir().as_str());
    constants.set("HOST_NAME", "testhost");
    PlaceholderResolver::new(constants)
}

#[test]
fn test_loads_modules_and_builds_in_order() {
    let project = Project::new();
    let graph = load(&project).unwrap();
    let root = NormalizedPath::new(project.root());

    assert_eq!(graph.project.name(), "Widget");
    assert_eq!(graph.modules.len(), 1);
    assert_eq!(graph.build_count(), 1);

    let module = &graph.modules[0];
    assert_eq!(module.document.source(), &root.join("lib/module_config.json"));
    assert_eq!(module.document.module_path(), root.join("lib"));
    assert_eq!(module.builds[0].source(), &root.join("lib/gcc_release.json"));
    assert_eq!(module.builds[0].build_cfg_path(), root.join("lib"));
    assert_eq!(
        graph.project.dependency_config(),
        Some(root.join("project_dependency_config.json").as_str().to_string())
    );
}

#[test]
fn test_expansion_reaches_every_level() {
    let project = Project::new();
    let mut graph = load(&project).unwrap();
    let resolver = resolver(&graph);
    let root = graph.project.project_dir();

    assert!(graph.expand_placeholders(&resolver, 8));

    let node = graph.artifact_node();
    assert!(unresolved_placeholders(&node).is_empty());
    assert_eq!(node.get_str("copyright_info"), Some("(c) 2024 Widget Works"));
    let build = &node.get(BUILD_CONFIGS).unwrap()[0];
    assert_eq!(build["flags"], json!(["-O2", "-DHOST=testhost"]));
    assert_eq!(build["target"], json!(format!("{}/install/lib/widget_lib", root)));
    assert_eq!(
        node.get(MODULE_CONFIGS).unwrap()[0]["source_dir"],
        json!(format!("{}/lib/src", root))
    );
}

#[test]
fn test_unknown_placeholders_survive_expansion() {
    let project = Project::new();
    let build = project.root().join("lib/gcc_release.json");
    let content = fs::read_to_string(&build)
        .unwrap()
        .replace("\"-O2\"", "\"${NOT_A_CONSTANT}\"");
    fs::write(&build, content).unwrap();

    let mut graph = load(&project).unwrap();
    let resolver = resolver(&graph);
    assert!(graph.expand_placeholders(&resolver, 8));

    let node = graph.artifact_node();
    assert_eq!(unresolved_placeholders(&node), vec!["${NOT_A_CONSTANT}".to_string()]);
}

#[test]
fn test_artifact_survives_save_and_load() {
    let project = Project::new();
    let mut graph = load(&project).unwrap();
    let resolver = resolver(&graph);
    graph.expand_placeholders(&resolver, 8);

    let store = DocumentStore::new();
    let path = NormalizedPath::new(project.root().join("out/testhost_project_config.json"));
    let mut node = graph.artifact_node();
    store.stamp(&mut node, Schema::Project);
    store.save(&mut node, &path).unwrap();

    let loaded = store.load(&path, Schema::Project).unwrap();
    assert_eq!(loaded, node);
}

fn saved_artifact(
    project: &Project,
    adjust: impl FnOnce(&mut buildnis_config::ConfigNode),
) -> (buildnis_core::ProjectGraph, NormalizedPath) {
    let mut graph = load(project).unwrap();
    let resolver = resolver(&graph);
    graph.expand_placeholders(&resolver, 8);

    let store = DocumentStore::new();
    let path = NormalizedPath::new(project.root().join("testhost_project_config.json"));
    let mut node = graph.artifact_node();
    adjust(&mut node);
    store.stamp(&mut node, Schema::Project);
    store.save(&mut node, &path).unwrap();
    (graph, path)
}

#[test]
fn test_artifact_rebuilds_the_graph() {
    let project = Project::new();
    let (expanded, path) = saved_artifact(&project, |_| {});
    let root = NormalizedPath::new(project.root());

    let rebuilt = ProjectGraphLoader::new(DocumentStore::new())
        .load_artifact(&path, &NormalizedPath::new(project.project_file()))
        .unwrap();

    assert_eq!(rebuilt.project.project_dir(), root);
    assert_eq!(rebuilt.project.name(), "Widget");
    assert!(!rebuilt.project.node().contains(MODULE_CONFIGS));
    assert_eq!(rebuilt.build_count(), 1);

    let module = &rebuilt.modules[0];
    assert_eq!(module.document.source(), &root.join("lib/module_config.json"));
    assert_eq!(module.document.node(), expanded.modules[0].document.node());
    assert_eq!(module.builds[0].source(), &root.join("lib/gcc_release.json"));
    assert_eq!(module.builds[0].node(), expanded.modules[0].builds[0].node());

    let store = DocumentStore::new();
    assert_eq!(rebuilt.artifact_node(), store.load(&path, Schema::Project).unwrap());
}

#[test]
fn test_artifact_with_missing_builds_is_invalid() {
    let project = Project::new();
    let (_, path) = saved_artifact(&project, |node| node.set(BUILD_CONFIGS, json!([])));

    let error = ProjectGraphLoader::new(DocumentStore::new())
        .load_artifact(&path, &NormalizedPath::new(project.project_file()))
        .unwrap_err();

    assert!(matches!(
        &error,
        Error::Config(buildnis_config::Error::InvalidField { field, .. }) if field == BUILD_CONFIGS
    ));
    assert_eq!(ExitCode::from(&error), ExitCode::InvalidConfig);
}

#[test]
fn test_missing_module_aborts_load() {
    let project = Project::new();
    fs::remove_file(project.root().join("lib/module_config.json")).unwrap();

    let result = load(&project);
    assert!(matches!(
        result,
        Err(Error::Config(buildnis_config::Error::NotFound { .. }))
    ));
}

#[test]
fn test_missing_project_file() {
    let project = Project::new();
    let result = ProjectGraphLoader::new(DocumentStore::new())
        .load(&NormalizedPath::new(project.root().join("nothing.json")));
    assert!(matches!(result, Err(Error::ProjectNotFound { .. })));
}
