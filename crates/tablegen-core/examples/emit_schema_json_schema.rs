use schemars::schema_for;
use tablegen_core::TypeGraphDocument;

fn main() {
    let schema = schema_for!(TypeGraphDocument);
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
