use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use tablegen_core::{DataValue, TypeGraph, TypeGraphDocument};
use tablegen_data::{
    DataError, DataLoader, JsonDirLoader, TableDataStore, load_tables, record_from_json,
};

const SCHEMA: &str = r#"{
  "types": [
    { "kind": "enum", "name": "Quality", "items": [
        { "name": "WHITE", "value": 1 }, { "name": "GOLD", "value": 5 } ] },
    { "kind": "enum", "name": "Access", "flags": true, "items": [
        { "name": "READ", "value": 1 }, { "name": "WRITE", "value": 2 } ] },
    { "kind": "bean", "name": "Effect", "is_abstract": true, "fields": [] },
    { "kind": "bean", "name": "Heal", "parent": "Effect", "fields": [ { "name": "amount", "type": "int" } ] },
    { "kind": "bean", "name": "Item", "fields": [
        { "name": "id", "type": "int" },
        { "name": "quality", "type": "Quality" },
        { "name": "access", "type": "Access" },
        { "name": "weights", "type": "map<int,double>" },
        { "name": "effect", "type": "Effect?" },
        { "name": "opened", "type": "datetime" }
    ] },
    { "kind": "table", "name": "TbItem", "value_type": "Item", "index": "id", "input": "items" }
  ]
}"#;

fn graph() -> TypeGraph {
    let document: TypeGraphDocument = serde_json::from_str(SCHEMA).expect("parse schema");
    TypeGraph::from_document(document).expect("valid graph")
}

fn temp_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("tablegen_data_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn loads_and_converts_rows() {
    let graph = graph();
    let table = graph.table("TbItem").unwrap();
    let dir = temp_dir("convert");
    fs::write(
        dir.join("items.json"),
        r#"[
          { "id": 1, "quality": "GOLD", "access": "READ|WRITE", "weights": { "3": 0.5 },
            "effect": { "$type": "Heal", "amount": 40 }, "opened": "2024-01-02 03:04:05",
            "__tags": "dev" },
          { "id": "2", "quality": 1, "access": "READ", "weights": [[7, 1.5]],
            "effect": null, "opened": 0 }
        ]"#,
    )
    .unwrap();

    let loaded = JsonDirLoader::new(&dir).load(&graph, table).expect("load");
    assert_eq!(loaded.main.len(), 2);
    assert!(loaded.patch.is_empty());

    let first = &loaded.main[0];
    assert_eq!(first.tags, vec!["dev".to_string()]);
    assert_eq!(
        first.data.get_field("quality"),
        Some(&DataValue::Enum {
            item: "GOLD".to_string(),
            value: 5
        })
    );
    assert!(matches!(
        first.data.get_field("access"),
        Some(DataValue::Enum { value: 3, .. })
    ));
    assert_eq!(
        first.data.get_field("weights"),
        Some(&DataValue::Map(vec![(DataValue::Int(3), DataValue::Double(0.5))]))
    );
    match first.data.get_field("effect") {
        Some(DataValue::Bean(effect)) => {
            assert_eq!(effect.type_name, "Heal");
            assert!(effect.tagged);
            assert_eq!(effect.get_field("amount"), Some(&DataValue::Int(40)));
        }
        other => panic!("unexpected effect {other:?}"),
    }
    assert_eq!(
        first.data.get_field("opened"),
        Some(&DataValue::DateTime(1_704_164_645))
    );

    let second = &loaded.main[1];
    assert_eq!(second.data.get_field("id"), Some(&DataValue::Int(2)));
    assert_eq!(second.data.get_field("effect"), Some(&DataValue::Null));
    assert!(second.tags.is_empty());
}

#[test]
fn abstract_bean_requires_concrete_type() {
    let graph = graph();
    let table = graph.table("TbItem").unwrap();
    let dir = temp_dir("abstract");
    fs::write(
        dir.join("items.json"),
        r#"[ { "id": 1, "quality": "GOLD", "access": "READ", "weights": {},
               "effect": { "amount": 1 }, "opened": 0 } ]"#,
    )
    .unwrap();

    let err = JsonDirLoader::new(&dir).load(&graph, table).unwrap_err();
    assert!(matches!(err, DataError::InvalidRecord { .. }));
    assert!(err.to_string().contains("abstract"));
}

#[test]
fn unknown_field_is_rejected_with_location() {
    let graph = graph();
    let table = graph.table("TbItem").unwrap();
    let dir = temp_dir("unknown");
    fs::write(
        dir.join("items.json"),
        r#"[ { "id": 1, "quality": "GOLD", "access": "READ", "weights": {},
               "opened": 0, "colour": "red" } ]"#,
    )
    .unwrap();

    let err = JsonDirLoader::new(&dir).load(&graph, table).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("colour"), "{message}");
    assert!(message.contains("items.json[0]"), "{message}");
}

#[test]
fn patch_directory_rows_are_merged_by_key() {
    let graph = graph();
    let table = graph.table("TbItem").unwrap();
    let input = temp_dir("main");
    let patch = temp_dir("patch");
    fs::write(
        input.join("items.json"),
        r#"[
          { "id": 1, "quality": "WHITE", "access": "READ", "weights": {}, "opened": 0 },
          { "id": 2, "quality": "WHITE", "access": "READ", "weights": {}, "opened": 0 }
        ]"#,
    )
    .unwrap();
    fs::write(
        patch.join("items.json"),
        r#"[ { "id": 1, "quality": "GOLD", "access": "READ", "weights": {}, "opened": 0 } ]"#,
    )
    .unwrap();

    let loader = JsonDirLoader::new(&input).with_patch_dir(&patch);
    let mut store = TableDataStore::new(&graph, BTreeSet::new());
    load_tables(&mut store, &graph, &loader, &[table]).expect("load tables");

    let info = store.table_info(table).unwrap();
    assert_eq!(info.main_records.len(), 2);
    assert_eq!(info.patch_records.len(), 1);
    let qualities: Vec<_> = info
        .final_records
        .iter()
        .map(|record| record.data.get_field("quality").cloned())
        .collect();
    assert_eq!(
        qualities,
        vec![
            Some(DataValue::Enum {
                item: "GOLD".to_string(),
                value: 5
            }),
            Some(DataValue::Enum {
                item: "WHITE".to_string(),
                value: 1
            }),
        ]
    );
}

#[test]
fn missing_input_file_fails_the_load() {
    let graph = graph();
    let table = graph.table("TbItem").unwrap();
    let loader = JsonDirLoader::new(temp_dir("empty"));
    let mut store = TableDataStore::new(&graph, BTreeSet::new());

    let err = load_tables(&mut store, &graph, &loader, &[table]).unwrap_err();
    assert!(matches!(err, DataError::Io(_)));
    assert!(!store.is_registered(table));
}

#[test]
fn inherited_enum_field_resolves_in_parent_namespace() {
    let document: TypeGraphDocument = serde_json::from_str(
        r#"{
          "types": [
            { "kind": "enum", "namespace": "a", "name": "Color", "items": [
                { "name": "RED", "value": 1 }, { "name": "BLUE", "value": 2 } ] },
            { "kind": "bean", "namespace": "a", "name": "Base", "fields": [
                { "name": "c", "type": "Color" } ] },
            { "kind": "bean", "namespace": "b", "name": "Child", "parent": "a.Base", "fields": [
                { "name": "n", "type": "int" } ] },
            { "kind": "table", "namespace": "b", "name": "TbChild", "value_type": "b.Child", "index": "n" }
          ]
        }"#,
    )
    .expect("parse schema");
    let graph = TypeGraph::from_document(document).expect("valid graph");
    let table = graph.table("b.TbChild").unwrap();

    let record = record_from_json(
        &graph,
        table,
        &serde_json::json!({ "n": 7, "c": "BLUE" }),
        "children.json[0]",
    )
    .expect("convert");
    assert_eq!(
        record.data.get_field("c"),
        Some(&DataValue::Enum {
            item: "BLUE".to_string(),
            value: 2
        })
    );
    assert_eq!(record.data.get_field("n"), Some(&DataValue::Int(7)));
}
