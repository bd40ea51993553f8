use std::collections::BTreeSet;

use tablegen_core::{
    BeanDef, BeanValue, DataValue, FieldDef, FieldType, Record, TableDef, TableMode, TypeDef,
    TypeGraph,
};
use tablegen_data::{DataError, TableDataStore};

fn field(name: &str, ty: &str) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        field_type: FieldType::parse(ty).expect("type expr"),
        comment: None,
    }
}

fn table(name: &str, value: &str, index: Option<&str>, mode: TableMode) -> TypeDef {
    TypeDef::Table(TableDef {
        namespace: String::new(),
        name: name.to_string(),
        value_type: value.to_string(),
        index: index.map(str::to_string),
        mode,
        groups: Vec::new(),
        input: None,
        comment: None,
    })
}

fn graph() -> TypeGraph {
    TypeGraph::new(vec![
        TypeDef::Bean(BeanDef {
            namespace: String::new(),
            name: "Item".to_string(),
            parent: None,
            is_abstract: false,
            groups: Vec::new(),
            fields: vec![field("id", "int"), field("name", "string")],
            comment: None,
        }),
        TypeDef::Bean(BeanDef {
            namespace: String::new(),
            name: "Event".to_string(),
            parent: None,
            is_abstract: false,
            groups: Vec::new(),
            fields: vec![field("stamp", "long"), field("label", "string")],
            comment: None,
        }),
        table("TbItem", "Item", Some("id"), TableMode::Map),
        table("TbEvent", "Event", Some("stamp"), TableMode::List),
        table("TbNamed", "Item", Some("name"), TableMode::List),
        table("TbGlobal", "Item", None, TableMode::One),
    ])
    .expect("valid graph")
}

fn item(id: i32, tags: &[&str]) -> Record {
    Record::new(
        BeanValue::new("Item")
            .with_field("id", DataValue::Int(id))
            .with_field("name", DataValue::String(format!("item{id}"))),
    )
    .with_tags(tags.iter().copied())
}

fn event(stamp: i64) -> Record {
    Record::new(
        BeanValue::new("Event")
            .with_field("stamp", DataValue::Long(stamp))
            .with_field("label", DataValue::String(format!("e{stamp}"))),
    )
}

fn ids(records: &[&Record]) -> Vec<i32> {
    records
        .iter()
        .map(|record| match record.data.get_field("id") {
            Some(DataValue::Int(id)) => *id,
            other => panic!("unexpected key {other:?}"),
        })
        .collect()
}

fn exclude(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|tag| tag.to_string()).collect()
}

#[test]
fn singleton_with_one_record_exports_it() {
    let graph = graph();
    let global = graph.table("TbGlobal").unwrap();
    let mut store = TableDataStore::new(&graph, BTreeSet::new());
    store.register(global, vec![item(1, &[])], Vec::new()).unwrap();

    assert_eq!(store.export_records(global).unwrap().len(), 1);
}

#[test]
fn singleton_with_two_records_is_a_configuration_error() {
    let graph = graph();
    let global = graph.table("TbGlobal").unwrap();
    let mut store = TableDataStore::new(&graph, BTreeSet::new());
    store
        .register(global, vec![item(1, &[]), item(2, &[])], Vec::new())
        .unwrap();

    let err = store.export_records(global).unwrap_err();
    match &err {
        DataError::SingletonCardinality { table, count } => {
            assert_eq!(table, "TbGlobal");
            assert_eq!(*count, 2);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("TbGlobal"));
}

#[test]
fn singleton_cardinality_is_checked_after_filtering() {
    let graph = graph();
    let global = graph.table("TbGlobal").unwrap();
    let mut store = TableDataStore::new(&graph, exclude(&["dev"]));
    store
        .register(global, vec![item(1, &["dev"]), item(2, &[])], Vec::new())
        .unwrap();

    assert_eq!(ids(&store.export_records(global).unwrap()), vec![2]);
    assert_eq!(store.all_records(global).unwrap().len(), 2);
}

#[test]
fn sort_by_int_key_orders_ascending() {
    let graph = graph();
    let items = graph.table("TbItem").unwrap();
    let mut store = TableDataStore::new(&graph, BTreeSet::new());
    store
        .register(items, vec![item(30, &[]), item(10, &[]), item(20, &[])], Vec::new())
        .unwrap();

    let exported = store.export_records(items).unwrap();
    let sorted = store.sort_by_key(items, &exported).unwrap();
    assert_eq!(ids(&sorted), vec![10, 20, 30]);

    let twice = store.sort_by_key(items, &sorted).unwrap();
    assert_eq!(ids(&twice), ids(&sorted));
}

#[test]
fn sort_by_long_key_orders_ascending_and_keeps_duplicates_stable() {
    let graph = graph();
    let events = graph.table("TbEvent").unwrap();
    let mut store = TableDataStore::new(&graph, BTreeSet::new());
    let mut late = event(5);
    late.source = Some("late".to_string());
    store
        .register(
            events,
            vec![event(5_000_000_000), event(5), event(-1), late],
            Vec::new(),
        )
        .unwrap();

    let exported = store.export_records(events).unwrap();
    let sorted = store.sort_by_key(events, &exported).unwrap();
    let stamps: Vec<_> = sorted
        .iter()
        .map(|record| record.data.get_field("stamp").cloned())
        .collect();
    assert_eq!(
        stamps,
        vec![
            Some(DataValue::Long(-1)),
            Some(DataValue::Long(5)),
            Some(DataValue::Long(5)),
            Some(DataValue::Long(5_000_000_000)),
        ]
    );
    assert_eq!(sorted[2].source.as_deref(), Some("late"));
}

#[test]
fn non_integer_key_keeps_load_order() {
    let graph = graph();
    let named = graph.table("TbNamed").unwrap();
    let mut store = TableDataStore::new(&graph, BTreeSet::new());
    store
        .register(named, vec![item(3, &[]), item(1, &[]), item(2, &[])], Vec::new())
        .unwrap();

    let exported = store.export_records(named).unwrap();
    let sorted = store.sort_by_key(named, &exported).unwrap();
    assert_eq!(ids(&sorted), vec![3, 1, 2]);
}

#[test]
fn mismatched_key_variant_is_an_internal_error() {
    let graph = graph();
    let items = graph.table("TbItem").unwrap();
    let mut store = TableDataStore::new(&graph, BTreeSet::new());
    let bad = Record::new(BeanValue::new("Item").with_field("id", DataValue::Long(7)));
    store
        .register(items, vec![item(1, &[]), bad], Vec::new())
        .unwrap();

    let exported = store.export_records(items).unwrap();
    let err = store.sort_by_key(items, &exported).unwrap_err();
    assert!(matches!(err, DataError::InternalInvariant(_)));
}

#[test]
fn empty_exclusion_set_exports_everything() {
    let graph = graph();
    let items = graph.table("TbItem").unwrap();
    let mut store = TableDataStore::new(&graph, BTreeSet::new());
    store
        .register(
            items,
            vec![item(1, &["dev"]), item(2, &[]), item(3, &["test", "dev"])],
            Vec::new(),
        )
        .unwrap();

    let exported = store.export_records(items).unwrap();
    let all: Vec<&Record> = store.all_records(items).unwrap().iter().collect();
    assert_eq!(exported, all);
}

#[test]
fn exclusion_tags_filter_records() {
    let graph = graph();
    let items = graph.table("TbItem").unwrap();
    let mut store = TableDataStore::new(&graph, exclude(&["dev"]));
    store
        .register(
            items,
            vec![item(1, &["dev"]), item(2, &[]), item(3, &["test"])],
            Vec::new(),
        )
        .unwrap();

    assert_eq!(ids(&store.export_records(items).unwrap()), vec![2, 3]);
}

#[test]
fn registering_again_replaces_previous_data() {
    let graph = graph();
    let items = graph.table("TbItem").unwrap();
    let mut store = TableDataStore::new(&graph, BTreeSet::new());
    store.register(items, vec![item(1, &[])], Vec::new()).unwrap();
    store
        .register(items, vec![item(2, &[]), item(3, &[])], Vec::new())
        .unwrap();

    assert_eq!(ids(&store.export_records(items).unwrap()), vec![2, 3]);
}

#[test]
fn unregistered_table_is_reported() {
    let graph = graph();
    let items = graph.table("TbItem").unwrap();
    let store = TableDataStore::new(&graph, BTreeSet::new());
    assert!(matches!(
        store.all_records(items),
        Err(DataError::TableNotRegistered(name)) if name == "TbItem"
    ));
}
