#![allow(dead_code)]

use tablegen_codegen::{EnvOptions, GenerationContext, TagFilter, TargetConfig};
use tablegen_core::{BeanValue, DataValue, Record, TypeGraph, TypeGraphDocument};

pub const SCHEMA: &str = r#"{
  "types": [
    { "kind": "enum", "name": "Quality", "items": [
        { "name": "WHITE", "value": 1 }, { "name": "GOLD", "value": 5 } ] },
    { "kind": "bean", "name": "Reward", "is_abstract": true, "fields": [
        { "name": "weight", "type": "int" } ] },
    { "kind": "bean", "name": "Coin", "parent": "Reward", "fields": [
        { "name": "amount", "type": "long" } ] },
    { "kind": "bean", "name": "Item", "fields": [
        { "name": "id", "type": "int" },
        { "name": "name", "type": "string" },
        { "name": "quality", "type": "Quality" },
        { "name": "reward", "type": "Reward?" } ] },
    { "kind": "bean", "name": "Global", "fields": [ { "name": "maxLevel", "type": "int" } ] },
    { "kind": "table", "name": "TbItem", "value_type": "Item", "index": "id" },
    { "kind": "table", "name": "TbGlobal", "value_type": "Global", "mode": "one" },
    { "kind": "table", "name": "TbEditor", "value_type": "Item", "index": "id", "groups": ["editor"] }
  ]
}"#;

pub fn graph() -> TypeGraph {
    let document: TypeGraphDocument = serde_json::from_str(SCHEMA).expect("parse schema");
    TypeGraph::from_document(document).expect("valid graph")
}

pub fn item(id: i32, quality: (&str, i32)) -> Record {
    let mut coin = BeanValue::new("Coin")
        .with_field("weight", DataValue::Int(1))
        .with_field("amount", DataValue::Long(100 * i64::from(id)));
    coin.tagged = true;
    Record::new(
        BeanValue::new("Item")
            .with_field("id", DataValue::Int(id))
            .with_field("name", DataValue::String(format!("item{id}")))
            .with_field(
                "quality",
                DataValue::Enum {
                    item: quality.0.to_string(),
                    value: quality.1,
                },
            )
            .with_field("reward", DataValue::Bean(coin)),
    )
}

pub fn global(max_level: i32) -> Record {
    Record::new(BeanValue::new("Global").with_field("maxLevel", DataValue::Int(max_level)))
}

/// Context for target `client` with TbItem and TbGlobal registered.
pub fn context<'g>(graph: &'g TypeGraph, options: EnvOptions) -> GenerationContext<'g> {
    let mut ctx = GenerationContext::new(
        graph,
        TargetConfig::new("client"),
        TagFilter::default(),
        options,
    )
    .expect("context");
    ctx.add_data_table(
        graph.table("TbItem").expect("TbItem"),
        vec![item(2, ("GOLD", 5)), item(1, ("WHITE", 1))],
        Vec::new(),
    )
    .expect("register items");
    ctx.add_data_table(
        graph.table("TbGlobal").expect("TbGlobal"),
        vec![global(60)],
        Vec::new(),
    )
    .expect("register global");
    ctx
}
