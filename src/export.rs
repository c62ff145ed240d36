use serde_json::{Map, Value as Json};

use crate::engine::Store;
use crate::persist::encode_record;
use crate::schema::{FieldKind, Schema};

/// Full-state export: one document mapping every collection name to its
/// complete record list, in current order.
pub fn dump(schema: &Schema, store: &Store) -> Json {
    let mut doc = Map::new();
    for def in &schema.collections {
        let records: Vec<Json> = store.iter(def.name).map(encode_record).collect();
        doc.insert(def.name.to_string(), Json::Array(records));
    }
    Json::Object(doc)
}

/// Import/template document: one example record per collection with a
/// placeholder value for each declared field. Derivable from schema
/// knowledge alone.
pub fn template(schema: &Schema) -> Json {
    let mut doc = Map::new();
    for def in &schema.collections {
        let mut example = Map::new();
        example.insert("id".into(), Json::from("example-id"));
        for field in &def.fields {
            example.insert(field.name.to_string(), placeholder(field.kind));
        }
        doc.insert(def.name.to_string(), Json::Array(vec![Json::Object(example)]));
    }
    Json::Object(doc)
}

fn placeholder(kind: FieldKind) -> Json {
    match kind {
        FieldKind::Str => Json::from("text"),
        FieldKind::Number => Json::from(0),
        FieldKind::Bool => Json::from(false),
        FieldKind::Date => Json::from("2024-01-01"),
        FieldKind::List => Json::Array(Vec::new()),
    }
}
