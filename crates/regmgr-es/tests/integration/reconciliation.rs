//! Integration tests for type resolution and mapping reconciliation.

use std::cell::Cell;

use regmgr_core::{Error, RegistryNames, ResolvedField, TypeSource};
use regmgr_es::{
    Document, FieldRegistry, LoaderOptions, MappingReconciler, Method, RegistryManager,
    TypeResolver,
};
use serde_json::json;

use crate::common::FakeEngine;

fn resolver(engine: std::sync::Arc<FakeEngine>) -> TypeResolver {
    TypeResolver::new(FieldRegistry::new(engine, &RegistryNames::new("registry")))
}

// ============================================================================
// Resolution
// ============================================================================

#[tokio::test]
async fn test_registry_then_fallback() {
    let engine = FakeEngine::new();
    engine.seed_registry("registry-dd", &[("a.b.C.d.e", "keyword")]);
    let fallback_calls = Cell::new(0);

    let resolution = resolver(engine.clone())
        .resolve(["a.b.C.d.e", "x.y.Z.w.v"], |id| {
            fallback_calls.set(fallback_calls.get() + 1);
            assert_ne!(id, "a.b.C.d.e", "Fallback must not see registry hits");
            (id == "x.y.Z.w.v").then(|| "integer".to_string())
        })
        .await
        .unwrap();

    assert_eq!(fallback_calls.get(), 1);
    assert_eq!(
        resolution.fields,
        vec![
            ResolvedField::new("a.b.C.d.e", "keyword", TypeSource::Registry),
            ResolvedField::new("x.y.Z.w.v", "integer", TypeSource::Fallback),
        ]
    );
    assert_eq!(engine.requests_to("_mget").len(), 1);
}

#[tokio::test]
async fn test_unknown_to_fallback_is_unresolved() {
    let engine = FakeEngine::new();
    engine.seed_registry("registry-dd", &[("a.b.C.d.e", "keyword")]);

    let err = resolver(engine)
        .resolve(["a.b.C.d.e", "x.y.Z.w.v"], |_| None)
        .await
        .unwrap_err();

    match err {
        Error::UnresolvedFields { fields, help_url } => {
            assert_eq!(fields, vec!["x.y.Z.w.v".to_string()]);
            assert!(help_url.starts_with("https://"));
        }
        other => unreachable!("Expected UnresolvedFields, got {other:?}"),
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn test_reconcile_empty_set_issues_no_requests() {
    let engine = FakeEngine::with_index("registry", &[]);
    let added = MappingReconciler::new(engine.clone())
        .reconcile("registry", &[])
        .await
        .unwrap();

    assert_eq!(added, 0);
    assert!(engine.requests().is_empty());
}

#[tokio::test]
async fn test_incompatible_type_sends_no_update() {
    let engine = FakeEngine::with_index("registry", &[("a.b.C.d.e", "keyword")]);

    let err = MappingReconciler::new(engine.clone())
        .reconcile(
            "registry",
            &[ResolvedField::new("a.b.C.d.e", "integer", TypeSource::Registry)],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::IncompatibleType { .. }));
    assert!(
        engine.requests().iter().all(|r| r.method != Method::Put),
        "No mapping update should be sent"
    );
    assert_eq!(
        engine.index("registry").unwrap().mapping["a.b.C.d.e"],
        "keyword"
    );
}

#[tokio::test]
async fn test_reconcile_is_additive() {
    let engine = FakeEngine::with_index("registry", &[("lid", "keyword")]);
    let reconciler = MappingReconciler::new(engine.clone());

    let fields = vec![
        ResolvedField::new("lid", "keyword", TypeSource::Registry),
        ResolvedField::new("pds:File/pds:file_size", "long", TypeSource::Registry),
    ];
    assert_eq!(reconciler.reconcile("registry", &fields).await.unwrap(), 1);
    assert_eq!(reconciler.reconcile("registry", &fields).await.unwrap(), 0);

    let mapping = engine.index("registry").unwrap().mapping;
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping["pds:File/pds:file_size"], "long");
    assert_eq!(engine.requests_to("_mapping").iter().filter(|r| r.method == Method::Put).count(), 1);
}

// ============================================================================
// Data loading
// ============================================================================

#[tokio::test]
async fn test_load_documents_maps_then_indexes() {
    let engine = FakeEngine::with_index("registry", &[("lid", "keyword")]);
    engine.seed_registry("registry-dd", &[("pds:Product/pds:title", "text")]);
    let manager = RegistryManager::new(
        engine.clone(),
        RegistryNames::new("registry"),
        LoaderOptions::default(),
    );

    let documents = vec![
        Document::new("a::1.0", json!({"lid": "a", "pds:Product/pds:title": "A"})),
        Document::new("b::1.0", json!({"lid": "b", "pds:File/pds:md5": "abc"})),
    ];
    let report = manager
        .load_documents(documents, |_| Some("keyword".to_string()), true)
        .await
        .unwrap();

    assert_eq!(report.resolution.len(), 2);
    assert_eq!(report.persisted, 1);
    assert_eq!(report.load.succeeded(), 2);

    let primary = engine.index("registry").unwrap();
    assert_eq!(primary.mapping["pds:Product/pds:title"], "text");
    assert_eq!(primary.mapping["pds:File/pds:md5"], "keyword");
    assert_eq!(primary.docs.len(), 2);

    let registry = engine.index("registry-dd").unwrap();
    assert_eq!(registry.docs["pds:File/pds:md5"]["es_data_type"], "keyword");
}

#[tokio::test]
async fn test_load_documents_without_persist_leaves_registry() {
    let engine = FakeEngine::with_index("registry", &[]);
    let manager = RegistryManager::new(
        engine.clone(),
        RegistryNames::new("registry"),
        LoaderOptions::default(),
    );

    let report = manager
        .load_documents(
            vec![Document::new("a", json!({"lid": "a"}))],
            |_| Some("keyword".to_string()),
            false,
        )
        .await
        .unwrap();

    assert_eq!(report.persisted, 0);
    assert!(engine.index("registry-dd").is_none());
}

#[tokio::test]
async fn test_registry_names_read_once_and_limit_lookups() {
    let engine = FakeEngine::with_index("registry", &[("lid", "keyword")]);
    engine.seed_registry("registry-dd", &[("pds:Product/pds:title", "text")]);
    let manager = RegistryManager::new(
        engine.clone(),
        RegistryNames::new("registry"),
        LoaderOptions::default(),
    );

    manager
        .load_documents(
            vec![Document::new(
                "a::1.0",
                json!({"lid": "a", "pds:Product/pds:title": "A", "pds:File/pds:md5": "x"}),
            )],
            |_| Some("keyword".to_string()),
            false,
        )
        .await
        .unwrap();

    assert_eq!(engine.requests_to("/registry-dd/_search").len(), 1);
    let lookups = engine.requests_to("/registry-dd/_mget");
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].json(), Some(&json!({"ids": ["pds:Product/pds:title"]})));

    engine.clear_requests();
    let report = manager
        .load_documents(
            vec![Document::new("b::1.0", json!({"lid": "b", "pds:File/pds:file_size": 3}))],
            |_| Some("long".to_string()),
            false,
        )
        .await
        .unwrap();

    assert_eq!(report.resolution.from_fallback().count(), 1);
    assert!(engine.requests_to("/registry-dd/_search").is_empty());
    assert!(engine.requests_to("/registry-dd/_mget").is_empty());
    assert_eq!(report.load.succeeded(), 1);
}

#[tokio::test]
async fn test_unresolved_fields_stop_load() {
    let engine = FakeEngine::with_index("registry", &[]);
    let manager = RegistryManager::new(
        engine.clone(),
        RegistryNames::new("registry"),
        LoaderOptions::default(),
    );

    let err = manager
        .load_documents(vec![Document::new("a", json!({"mystery": 1}))], |_| None, false)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnresolvedFields { .. }));
    assert!(engine.requests_to("_bulk").is_empty());
}
