//! The persistence boundary: whole-collection snapshots exchanged with
//! an external byte-oriented store as self-describing JSON. The codec
//! round-trips losslessly: decode then encode reproduces the same
//! structure, field order included.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use serde_json::{Map, Value as Json};

use crate::engine::EngineError;
use crate::model::{Collection, Record, Value};
use crate::schema::{CollectionDef, FieldKind};

/// A collection snapshot: one flat JSON object per record.
pub type Snapshot = Vec<Json>;

/// External persistence collaborator. `load` runs once per collection
/// at open; `save` runs after every successful mutation with the full
/// affected collection.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn load(&self, collection: &str) -> io::Result<Option<Snapshot>>;
    async fn save(&self, collection: &str, snapshot: &Snapshot) -> io::Result<()>;
}

// ── Codec ────────────────────────────────────────────────

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::from(*b),
        Value::Number(n) => {
            // Integral values stay integers so re-saving an untouched
            // snapshot reproduces its bytes.
            if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                Json::from(*n as i64)
            } else {
                Json::from(*n)
            }
        }
        Value::Str(s) => Json::from(s.clone()),
        Value::Date(d) => Json::from(d.format("%Y-%m-%d").to_string()),
        Value::List(records) => Json::Array(records.iter().map(encode_record).collect()),
    }
}

pub fn encode_record(record: &Record) -> Json {
    let mut map = Map::new();
    for (name, value) in record.entries() {
        map.insert(name.to_string(), value_to_json(value));
    }
    Json::Object(map)
}

pub fn encode_collection(collection: &Collection) -> Snapshot {
    collection.iter().map(encode_record).collect()
}

/// Decode without schema knowledge: strings stay strings. Used for the
/// nested lists inside a record, which are derived and rebuilt after
/// load anyway.
fn json_to_value(json: &Json) -> Result<Value, String> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| format!("unrepresentable number {n}")),
        Json::String(s) => Ok(Value::Str(s.clone())),
        Json::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for item in items {
                records.push(decode_plain_record(item)?);
            }
            Ok(Value::List(records))
        }
        Json::Object(_) => Err("unexpected nested object".into()),
    }
}

fn decode_plain_record(json: &Json) -> Result<Record, String> {
    let Json::Object(map) = json else {
        return Err(format!("expected record object, got {json}"));
    };
    let mut record = Record::default();
    for (name, value) in map {
        record.set(name.clone(), json_to_value(value)?);
    }
    Ok(record)
}

/// Decode one record, coercing fields the schema knows (dates in
/// particular) and passing unknown fields through untouched so nothing
/// is lost on a round trip.
pub fn decode_record(def: &CollectionDef, json: &Json) -> Result<Record, EngineError> {
    let storage_err =
        |detail: String| EngineError::Storage(format!("{} snapshot: {detail}", def.name));

    let Json::Object(map) = json else {
        return Err(storage_err(format!("expected record object, got {json}")));
    };
    let mut record = Record::default();
    for (name, value) in map {
        let decoded = match (def.field_def(name).map(|f| f.kind), value) {
            (Some(FieldKind::Date), Json::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| storage_err(format!("field {name}: bad date {s:?}: {e}")))?,
            _ => json_to_value(value).map_err(|d| storage_err(format!("field {name}: {d}")))?,
        };
        record.set(name.clone(), decoded);
    }
    if record.id().is_empty() {
        return Err(storage_err("record missing string id".into()));
    }
    Ok(record)
}

pub fn decode_collection(
    def: &CollectionDef,
    snapshot: &Snapshot,
) -> Result<Collection, EngineError> {
    let mut collection = Collection::default();
    for json in snapshot {
        collection.insert(decode_record(def, json)?);
    }
    Ok(collection)
}

// ── In-memory gateway ────────────────────────────────────

/// Gateway backed by process memory, used by tests and first-run
/// demos. Saves can be switched off to exercise the warning path.
#[derive(Default)]
pub struct MemoryGateway {
    stored: DashMap<String, Snapshot>,
    fail_saves: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate empty snapshots for every collection of `names`,
    /// so opening an engine against this gateway skips seeding.
    pub fn blank(names: &[&str]) -> Self {
        let gw = Self::default();
        for name in names {
            gw.stored.insert(name.to_string(), Vec::new());
        }
        gw
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot_of(&self, collection: &str) -> Option<Snapshot> {
        self.stored.get(collection).map(|e| e.value().clone())
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn load(&self, collection: &str) -> io::Result<Option<Snapshot>> {
        Ok(self.stored.get(collection).map(|e| e.value().clone()))
    }

    async fn save(&self, collection: &str, snapshot: &Snapshot) -> io::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(io::Error::other("saves disabled"));
        }
        self.stored.insert(collection.to_string(), snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use serde_json::json;

    fn def() -> CollectionDef {
        CollectionDef::new("payments")
            .field(FieldDef::text("memberId"))
            .field(FieldDef::number("amount"))
            .field(FieldDef::date("date"))
            .field(FieldDef::text("status"))
    }

    #[test]
    fn decode_then_encode_is_identity() {
        let snapshot = vec![
            json!({"id": "p1", "memberId": "m1", "amount": 120, "date": "2024-02-01", "status": "completed"}),
            json!({"id": "p2", "memberId": "m2", "amount": 99.5, "date": "2024-03-15", "status": "pending"}),
        ];
        let collection = decode_collection(&def(), &snapshot).unwrap();
        assert_eq!(encode_collection(&collection), snapshot);
    }

    #[test]
    fn dates_coerce_via_schema() {
        let snapshot = vec![json!({"id": "p1", "date": "2024-02-01"})];
        let collection = decode_collection(&def(), &snapshot).unwrap();
        let d = collection.get("p1").unwrap().date("date").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn unknown_fields_pass_through() {
        let snapshot = vec![json!({"id": "p1", "legacyNote": "kept"})];
        let collection = decode_collection(&def(), &snapshot).unwrap();
        assert_eq!(collection.get("p1").unwrap().text("legacyNote"), Some("kept"));
        assert_eq!(encode_collection(&collection), snapshot);
    }

    #[test]
    fn bad_date_is_a_storage_error() {
        let snapshot = vec![json!({"id": "p1", "date": "02/01/2024"})];
        let err = decode_collection(&def(), &snapshot).unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));
    }

    #[test]
    fn missing_id_is_a_storage_error() {
        let snapshot = vec![json!({"amount": 10})];
        let err = decode_collection(&def(), &snapshot).unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));
    }

    #[tokio::test]
    async fn memory_gateway_round_trip() {
        let gw = MemoryGateway::new();
        assert!(gw.load("payments").await.unwrap().is_none());

        let snapshot = vec![json!({"id": "p1"})];
        gw.save("payments", &snapshot).await.unwrap();
        assert_eq!(gw.load("payments").await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn memory_gateway_failure_injection() {
        let gw = MemoryGateway::new();
        gw.set_fail_saves(true);
        assert!(gw.save("payments", &Vec::new()).await.is_err());
        gw.set_fail_saves(false);
        assert!(gw.save("payments", &Vec::new()).await.is_ok());
    }
}
