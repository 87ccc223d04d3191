//! Integration tests for data dictionary ingestion.

use std::path::PathBuf;

use regmgr_core::{Error, RegistryNames};
use regmgr_dd::DataTypeMap;
use regmgr_es::{LoaderOptions, RegistryManager};
use tempfile::TempDir;

use crate::common::{FakeEngine, dictionary_json};

fn write_dictionary(dir: &TempDir, attributes: &[(&str, &str)]) -> PathBuf {
    let path = dir.path().join("ldd.json");
    std::fs::write(&path, dictionary_json("1.16.0.0", attributes)).unwrap();
    path
}

fn manager(engine: std::sync::Arc<FakeEngine>) -> RegistryManager {
    RegistryManager::new(
        engine,
        RegistryNames::new("registry"),
        LoaderOptions {
            batch_size: 2,
            concurrency: 1,
        },
    )
}

#[tokio::test]
async fn test_ingest_translates_and_registers() {
    let dir = TempDir::new().unwrap();
    let path = write_dictionary(
        &dir,
        &[
            ("0001_NASA_PDS_1.pds.Target_Identification.pds.name", "ASCII_Short_String_Collapsed"),
            ("0001_NASA_PDS_1.cart.Equirectangular.cart.latitude", "ASCII_Real"),
            ("0001_NASA_PDS_1.pds.Time_Coordinates.pds.start_date_time", "ASCII_Date_Time_YMD_UTC"),
        ],
    );
    let engine = FakeEngine::new();
    let manager = manager(engine.clone());

    let report = manager
        .ingest_dictionary(&path, &DataTypeMap::default())
        .await
        .expect("Ingestion should succeed");

    assert_eq!(report.info.attribute_count, 3);
    assert_eq!(report.info.version.as_deref(), Some("1.16.0.0"));
    assert_eq!(report.load.succeeded(), 3);
    assert_eq!(engine.requests_to("/registry-dd/_bulk").len(), 2);

    let registry = engine.index("registry-dd").unwrap();
    let lat = &registry.docs["cart:Equirectangular/cart:latitude"];
    assert_eq!(lat["es_data_type"], "double");
    assert_eq!(lat["data_type"], "ASCII_Real");
    assert_eq!(lat["ldd_version"], "1.16.0.0");
    assert_eq!(
        registry.docs["pds:Time_Coordinates/pds:start_date_time"]["es_data_type"],
        "date"
    );
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write_dictionary(
        &dir,
        &[
            ("0001_NASA_PDS_1.pds.Product.pds.title", "UTF8_Text_Preserved"),
            ("0001_NASA_PDS_1.pds.File.pds.file_size", "ASCII_NonNegative_Integer"),
        ],
    );
    let engine = FakeEngine::new();
    let manager = manager(engine.clone());
    let types = DataTypeMap::default();

    manager.ingest_dictionary(&path, &types).await.unwrap();
    let first = engine.index("registry-dd").unwrap().docs;

    manager.ingest_dictionary(&path, &types).await.unwrap();
    let second = engine.index("registry-dd").unwrap().docs;

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);

    let names = manager.registry().get_all_field_names().await.unwrap();
    assert_eq!(names.len(), 2);
    assert!(names.contains("pds:File/pds:file_size"));
}

#[tokio::test]
async fn test_missing_data_type_aborts_before_any_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ldd.json");
    std::fs::write(
        &path,
        r#"[{"dataDictionary": {"attributeDictionary": [
            {"attribute": {"identifier": "0001_NASA_PDS_1.pds.Product.pds.title", "dataType": "ASCII_Text_Preserved"}},
            {"attribute": {"identifier": "0001_NASA_PDS_1.pds.Product.pds.lid"}}
        ]}}]"#,
    )
    .unwrap();
    let engine = FakeEngine::new();

    let err = manager(engine.clone())
        .ingest_dictionary(&path, &DataTypeMap::default())
        .await
        .unwrap_err();

    match err {
        Error::Validation { field, .. } => {
            assert_eq!(field.as_deref(), Some("0001_NASA_PDS_1.pds.Product.pds.lid"));
        }
        other => unreachable!("Expected Validation error, got {other:?}"),
    }
    assert!(engine.requests().is_empty());
}

#[tokio::test]
async fn test_missing_identifier_names_ordinal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ldd.json");
    std::fs::write(
        &path,
        r#"[{"dataDictionary": {"attributeDictionary": [
            {"attribute": {"identifier": "0001_NASA_PDS_1.pds.Product.pds.title", "dataType": "ASCII_Text_Preserved"}},
            {"attribute": {"identifier": "0001_NASA_PDS_1.pds.Product.pds.lid", "dataType": "ASCII_LID"}},
            {"attribute": {"dataType": "ASCII_Real"}}
        ]}}]"#,
    )
    .unwrap();

    let err = manager(FakeEngine::new())
        .ingest_dictionary(&path, &DataTypeMap::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Index = 3"));
}

#[tokio::test]
async fn test_large_dictionary_sent_in_several_batches() {
    let dir = TempDir::new().unwrap();
    let path = write_dictionary(
        &dir,
        &[
            ("0001_NASA_PDS_1.pds.Product.pds.title", "UTF8_Text_Preserved"),
            ("0001_NASA_PDS_1.pds.Product.pds.lid", "ASCII_LID"),
            ("0001_NASA_PDS_1.pds.File.pds.file_size", "ASCII_NonNegative_Integer"),
            ("0001_NASA_PDS_1.pds.File.pds.md5_checksum", "ASCII_MD5_Checksum"),
            ("0001_NASA_PDS_1.cart.Equirectangular.cart.latitude", "ASCII_Real"),
        ],
    );
    let engine = FakeEngine::new();
    let manager = RegistryManager::new(
        engine.clone(),
        RegistryNames::new("registry"),
        LoaderOptions {
            batch_size: 2,
            concurrency: 2,
        },
    );

    let report = manager
        .ingest_dictionary(&path, &DataTypeMap::default())
        .await
        .unwrap();

    assert_eq!(report.info.attribute_count, 5);
    assert_eq!(report.load.index, "registry-dd");
    assert_eq!(report.load.batches.len(), 3);
    assert_eq!(report.load.succeeded(), 5);
    assert_eq!(engine.requests_to("/registry-dd/_bulk").len(), 3);
    assert_eq!(engine.index("registry-dd").unwrap().docs.len(), 5);
}
