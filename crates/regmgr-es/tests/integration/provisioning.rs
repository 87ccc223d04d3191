//! Integration tests for registry provisioning.

use regmgr_core::{Error, IndexSchema, RegistryNames};
use regmgr_es::{IndexProvisioner, schemas};

use crate::common::FakeEngine;

#[tokio::test]
async fn test_create_registry_with_builtin_templates() {
    let engine = FakeEngine::new();
    let provisioner = IndexProvisioner::new(engine.clone());
    let schema = IndexSchema::new(schemas::registry_template().unwrap(), 2, 1).unwrap();

    let report = provisioner
        .create_registry(
            &RegistryNames::new("registry"),
            &schema,
            schemas::dictionary_template().unwrap(),
        )
        .await
        .expect("Provisioning should succeed");

    assert_eq!(report.indices, vec!["registry", "registry-dd"]);

    let primary = engine.index("registry").unwrap();
    assert_eq!(primary.settings["settings"]["number_of_shards"], 2);
    assert_eq!(primary.settings["settings"]["number_of_replicas"], 1);
    assert_eq!(primary.mapping["lidvid"], "keyword");

    let registry = engine.index("registry-dd").unwrap();
    assert_eq!(registry.settings["settings"]["number_of_shards"], 1);
    assert_eq!(registry.settings["settings"]["number_of_replicas"], 1);
    assert_eq!(registry.mapping["es_data_type"], "keyword");
}

#[tokio::test]
async fn test_custom_suffix() {
    let engine = FakeEngine::new();
    let provisioner = IndexProvisioner::new(engine.clone());
    let schema = IndexSchema::new(schemas::registry_template().unwrap(), 1, 0).unwrap();

    provisioner
        .create_registry(
            &RegistryNames::new("pds").with_suffix("-fields"),
            &schema,
            schemas::dictionary_template().unwrap(),
        )
        .await
        .unwrap();

    assert!(engine.index("pds-fields").is_some());
}

#[tokio::test]
async fn test_existing_index_reported() {
    let engine = FakeEngine::with_index("registry", &[]);
    let provisioner = IndexProvisioner::new(engine.clone());
    let schema = IndexSchema::new(schemas::registry_template().unwrap(), 1, 0).unwrap();

    let err = provisioner
        .create_registry(
            &RegistryNames::new("registry"),
            &schema,
            schemas::dictionary_template().unwrap(),
        )
        .await
        .unwrap_err();

    match err {
        Error::Engine { status, message, .. } => {
            assert_eq!(status, 400);
            assert!(message.contains("already exists"));
        }
        other => unreachable!("Expected Engine error, got {other:?}"),
    }
    assert!(engine.index("registry-dd").is_none());
}
