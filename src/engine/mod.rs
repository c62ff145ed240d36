pub mod aggregate;
mod error;
mod integrity;
mod mutations;
mod queries;
mod store;

pub use error::{EngineError, PersistenceWarning};
pub use queries::{QuerySpec, SortDir, SortSpec};
pub use store::Store;

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::model::Record;
use crate::persist::{self, Gateway};
use crate::schema::Schema;

/// Receipt for a committed mutation. The in-memory change is final;
/// `warnings` carries any write-through failures.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub warnings: Vec<PersistenceWarning>,
}

/// One application's data engine: the schema, every collection behind a
/// single lock, and the persistence gateway it writes through to. The
/// lock spans the whole mutation, cascade and write-through included,
/// so a read issued after a mutation returns never sees partial state.
pub struct Engine {
    schema: Arc<Schema>,
    store: RwLock<Store>,
    gateway: Arc<dyn Gateway>,
}

impl Engine {
    /// Load every collection from the gateway, seeding the schema's
    /// deterministic default dataset where the store has none, then
    /// recompute all derived fields fresh.
    pub async fn open(schema: Arc<Schema>, gateway: Arc<dyn Gateway>) -> Result<Self, EngineError> {
        let mut store = Store::new(&schema);
        let mut dirty: BTreeSet<String> = BTreeSet::new();
        let seed_data = (schema.seed)();

        for def in &schema.collections {
            let loaded = gateway
                .load(def.name)
                .await
                .map_err(|e| EngineError::Storage(format!("load {}: {e}", def.name)))?;
            match loaded {
                Some(snapshot) => {
                    let collection = persist::decode_collection(def, &snapshot)?;
                    info!(
                        app = schema.name,
                        collection = def.name,
                        records = collection.len(),
                        "loaded collection"
                    );
                    store.set_collection(def.name, collection);
                }
                None => {
                    let records = seed_data
                        .iter()
                        .find(|(name, _)| *name == def.name)
                        .map(|(_, records)| records.clone())
                        .unwrap_or_default();
                    info!(
                        app = schema.name,
                        collection = def.name,
                        records = records.len(),
                        "no snapshot, seeding defaults"
                    );
                    for record in records {
                        store.insert(def.name, record);
                    }
                    dirty.insert(def.name.to_string());
                }
            }
        }

        dirty.extend(integrity::recompute_all(&schema, &mut store));

        // First-run write-back; a failing gateway degrades to a warning
        // and the engine stays usable in memory.
        for warning in write_through(&schema, gateway.as_ref(), &store, &dirty).await {
            warn!(%warning, "initial write-back failed");
        }

        Ok(Self {
            schema,
            store: RwLock::new(store),
            gateway,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Record, EngineError> {
        let store = self.store.read().await;
        self.schema
            .collection(collection)
            .ok_or_else(|| EngineError::UnknownCollection(collection.to_string()))?;
        store
            .get(collection, id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    /// All records of a collection in their current order.
    pub async fn list(&self, collection: &str) -> Result<Vec<Record>, EngineError> {
        self.schema
            .collection(collection)
            .ok_or_else(|| EngineError::UnknownCollection(collection.to_string()))?;
        let store = self.store.read().await;
        Ok(store.iter(collection).cloned().collect())
    }

    /// Full-state dump document for the export boundary.
    pub async fn dump(&self) -> serde_json::Value {
        let store = self.store.read().await;
        crate::export::dump(&self.schema, &store)
    }

    /// Template document with one placeholder record per collection;
    /// needs nothing beyond the schema.
    pub fn template(&self) -> serde_json::Value {
        crate::export::template(&self.schema)
    }
}

/// Hand each affected collection to the gateway in full. Failures are
/// collected as warnings; the in-memory mutation already committed.
pub(crate) async fn write_through(
    schema: &Schema,
    gateway: &dyn Gateway,
    store: &Store,
    affected: &BTreeSet<String>,
) -> Vec<PersistenceWarning> {
    let mut warnings = Vec::new();
    for name in affected {
        let Some(collection) = store.collection(name) else {
            continue;
        };
        let snapshot = persist::encode_collection(collection);
        if let Err(e) = gateway.save(name, &snapshot).await {
            warn!(
                app = schema.name,
                collection = %name,
                error = %e,
                "write-through failed"
            );
            warnings.push(PersistenceWarning {
                collection: name.clone(),
                detail: e.to_string(),
            });
        }
    }
    warnings
}
