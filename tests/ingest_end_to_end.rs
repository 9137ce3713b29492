//! Full ingestion passes over complete CX documents

mod common;

use common::{artifact_names, meta, minimal_network, read_artifacts, CxDocument};
use cxload::{
    CxNetworkLoader, LoadError, LoaderConfig, NetworkLoadingTask, OpenStore, SqliteStore,
    SummaryStore,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[test]
fn minimal_network_produces_exact_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let aspects = dir.path().join("aspects");

    let outcome = CxNetworkLoader::new(Uuid::new_v4(), &aspects)
        .load(minimal_network().reader())
        .unwrap();

    assert_eq!(outcome.summary.node_count, 2);
    assert_eq!(outcome.summary.edge_count, 1);
    assert!(outcome.summary.warnings.is_empty(), "{:?}", outcome.summary.warnings);
    assert_eq!(outcome.elements_loaded, 3);

    let artifacts = read_artifacts(&aspects);
    assert_eq!(artifacts.len(), 2);
    assert_eq!(artifacts["nodes"], r#"[{"@id":1},{"@id":2}]"#);
    assert_eq!(artifacts["edges"], r#"[{"@id":1,"s":1,"t":2}]"#);

    assert_eq!(outcome.metadata.get("nodes").unwrap().element_count, Some(2));
    assert_eq!(outcome.metadata.get("edges").unwrap().element_count, Some(1));
}

#[test]
fn edge_to_undeclared_node_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let aspects = dir.path().join("aspects");
    let document = CxDocument::new()
        .metadata(vec![meta("nodes", 1, Some(1)), meta("edges", 1, Some(1))])
        .aspect("nodes", vec![json!({"@id": 1})])
        .aspect("edges", vec![json!({"@id": 1, "s": 1, "t": 3})]);

    let err = CxNetworkLoader::new(Uuid::new_v4(), &aspects)
        .load(document.reader())
        .unwrap_err();

    match err {
        LoadError::UndefinedIds(message) => {
            assert_eq!(message, "Undefined id(s) referenced in aspect nodes: [3]");
        }
        other => panic!("expected undefined ids, got {:?}", other),
    }
    assert!(!aspects.exists());
}

#[test]
fn dangling_citation_link_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let aspects = dir.path().join("aspects");
    let document = minimal_network()
        .metadata(vec![meta("edgeCitations", 1, None)])
        .aspect("edgeCitations", vec![json!({"po": [1], "citations": [7]})]);

    let outcome = CxNetworkLoader::new(Uuid::new_v4(), &aspects)
        .load(document.reader())
        .unwrap();

    assert_eq!(
        outcome.summary.warnings,
        vec!["Undefined id(s) referenced in aspect citations: [7]".to_string()]
    );
    assert_eq!(artifact_names(&aspects), vec!["edgeCitations", "edges", "nodes"]);
}

#[test]
fn post_metadata_supplies_id_counters() {
    let dir = tempfile::tempdir().unwrap();
    let aspects = dir.path().join("aspects");
    let document = CxDocument::new()
        .metadata(vec![meta("nodes", 2, None), meta("edges", 1, None)])
        .aspect("nodes", vec![json!({"@id": 1}), json!({"@id": 2})])
        .aspect("edges", vec![json!({"@id": 1, "s": 1, "t": 2})])
        .metadata(vec![meta("nodes", 2, Some(2)), meta("edges", 1, Some(1))]);

    let outcome = CxNetworkLoader::new(Uuid::new_v4(), &aspects)
        .load(document.reader())
        .unwrap();

    assert_eq!(outcome.metadata.get("nodes").unwrap().id_counter, Some(2));
    assert_eq!(outcome.metadata.get("edges").unwrap().id_counter, Some(1));
}

#[test]
fn subnetwork_name_is_republished_at_network_level() {
    let dir = tempfile::tempdir().unwrap();
    let aspects = dir.path().join("aspects");
    let document = minimal_network()
        .metadata(vec![meta("networkAttributes", 1, None), meta("cySubNetworks", 1, None)])
        .aspect("cySubNetworks", vec![json!({"@id": 52, "nodes": "all", "edges": "all"})])
        .aspect("networkAttributes", vec![json!({"n": "name", "v": "Glycolysis", "s": 52})]);

    let outcome = CxNetworkLoader::new(Uuid::new_v4(), &aspects)
        .load(document.reader())
        .unwrap();

    assert_eq!(outcome.summary.name.as_deref(), Some("Glycolysis"));
    assert!(outcome.subnetwork_ids.contains(&52));
    assert!(outcome.summary.warnings.is_empty(), "{:?}", outcome.summary.warnings);
    assert_eq!(
        outcome.metadata.get("networkAttributes").unwrap().element_count,
        Some(2)
    );
    assert_eq!(
        read_artifacts(&aspects)["networkAttributes"],
        r#"[{"n":"name","v":"Glycolysis","s":52},{"n":"name","v":"Glycolysis"}]"#
    );
}

#[test]
fn status_and_provenance_are_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let aspects = dir.path().join("aspects");
    let document = minimal_network()
        .metadata(vec![meta("ndexStatus", 1, None)])
        .aspect("ndexStatus", vec![json!({"externalId": "abc", "readOnly": false})])
        .aspect("provenanceHistory", vec![json!({"entity": {"uri": "http://example.org/net"}})]);

    let outcome = CxNetworkLoader::new(Uuid::new_v4(), &aspects)
        .load(document.reader())
        .unwrap();

    assert!(!outcome.metadata.contains("ndexStatus"));
    assert_eq!(
        outcome.provenance,
        Some(json!({"entity": {"uri": "http://example.org/net"}}))
    );
    assert_eq!(outcome.elements_loaded, 3);
    assert_eq!(artifact_names(&aspects), vec!["edges", "nodes"]);
}

#[test]
fn loading_task_persists_summary_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoaderConfig::default().with_data_root(dir.path().join("data"));
    let store = Arc::new(SqliteStore::open(dir.path().join("cxload.db")).unwrap());
    let id = Uuid::new_v4();

    minimal_network()
        .aspect("networkAttributes", vec![json!({"n": "description", "v": "two nodes"})])
        .metadata(vec![meta("networkAttributes", 1, None)])
        .write_to(&config.network_file(&id));

    let task = NetworkLoadingTask::new(config.clone(), store.clone());
    let summary = task.run(id).unwrap();

    let stored = store.load_summary(&id).unwrap().unwrap();
    assert_eq!(stored.node_count, 2);
    assert_eq!(stored.description.as_deref(), Some("two nodes"));
    assert_eq!(stored.warnings, summary.warnings);
    assert!(store.is_complete(&id).unwrap());

    let metadata = store.load_metadata(&id).unwrap().unwrap();
    assert_eq!(metadata.aspect_names(), vec!["edges", "networkAttributes", "nodes"]);
    assert_eq!(
        artifact_names(&config.aspect_dir(&id)),
        vec!["edges", "networkAttributes", "nodes"]
    );
}

#[test]
fn failed_task_keeps_registration_and_records_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoaderConfig::default().with_data_root(dir.path());
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let id = Uuid::new_v4();

    CxDocument::new()
        .metadata(vec![meta("nodes", 1, Some(1))])
        .aspect("nodes", vec![json!({"@id": 1})])
        .aspect("cartesianLayout", vec![json!({"node": 1, "x": 0.0, "y": 0.0})])
        .write_to(&config.network_file(&id));
    store.register_network(&id, chrono::Utc::now()).unwrap();

    let err = NetworkLoadingTask::new(config.clone(), store.clone())
        .run(id)
        .unwrap_err();

    assert!(matches!(err, LoadError::UndeclaredAspect(ref name) if name == "cartesianLayout"));
    assert_eq!(
        store.error_message(&id).unwrap().as_deref(),
        Some("Aspect cartesianLayout is not defined in MetaData section.")
    );
    assert!(!store.is_complete(&id).unwrap());
    assert!(!config.aspect_dir(&id).exists());
    assert!(config.network_file(&id).exists());
}
