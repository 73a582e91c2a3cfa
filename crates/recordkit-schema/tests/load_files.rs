//! Loading schema files from disk and decoding instances against them.

use recordkit_model::Value;
use recordkit_schema::{codec, ModelRegistry, SchemaDocument, SchemaError};
use recordkit_test_utils::{DOG_SCHEMA_JSON, DOG_SCHEMA_TOML, DOG_SCHEMA_YAML};
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, file: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn every_format_loads_the_same_models() {
    let dir = TempDir::new().unwrap();
    let files = [
        write(&dir, "dogs.toml", DOG_SCHEMA_TOML),
        write(&dir, "dogs.json", DOG_SCHEMA_JSON),
        write(&dir, "dogs.yaml", DOG_SCHEMA_YAML),
    ];

    let registries: Vec<ModelRegistry> = files
        .iter()
        .map(|path| {
            let registry = ModelRegistry::new();
            registry.load_file(path).unwrap();
            registry
        })
        .collect();

    for registry in &registries[1..] {
        assert_eq!(registry.names(), registries[0].names());
        for name in registry.names() {
            assert_eq!(registry.get(&name), registries[0].get(&name));
        }
    }
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = ModelRegistry::new().load_file(&path).unwrap_err();
    match err {
        SchemaError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected io error, got {other:?}"),
    }
}

#[test]
fn unknown_extension_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "dogs.ini", DOG_SCHEMA_TOML);
    assert!(matches!(
        SchemaDocument::from_file(&path),
        Err(SchemaError::UnsupportedFormat(_))
    ));
}

#[test]
fn models_split_across_files() {
    let dir = TempDir::new().unwrap();
    let dogs = write(
        &dir,
        "dogs.toml",
        r#"
        [[model]]
        name = "Dog"
        [[model.field]]
        name = "name"
        kind = "string"
        "#,
    );
    let walkers = write(
        &dir,
        "walkers.yml",
        "model:\n  - name: Walker\n    field:\n      - name: dog\n        kind: \"model:Dog\"\n",
    );

    let registry = ModelRegistry::new();
    registry.load_file(&dogs).unwrap();
    registry.load_file(&walkers).unwrap();

    let walker = codec::decode_named(
        "Walker",
        &registry,
        &serde_json::json!({"dog": {"name": "Rex"}}),
    )
    .unwrap();
    let dog = walker.get("dog").and_then(Value::as_model).unwrap();
    assert_eq!(dog.get("name"), Some(&Value::from("Rex")));
}

#[test]
fn dependent_file_loaded_first_fails() {
    let dir = TempDir::new().unwrap();
    let walkers = write(
        &dir,
        "walkers.json",
        r#"{"model": [{"name": "Walker", "field": [{"name": "dog", "kind": "model:Dog"}]}]}"#,
    );
    assert!(matches!(
        ModelRegistry::new().load_file(&walkers),
        Err(SchemaError::UnknownModel { .. })
    ));
}
