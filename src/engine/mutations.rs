use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;
use ulid::Ulid;

use crate::limits::MAX_RECORDS_PER_COLLECTION;
use crate::model::{Record, Value};
use crate::schema::{CollectionDef, FieldKind};

use super::{integrity, write_through, Committed, Engine, EngineError};

impl Engine {
    /// Insert a new record. The id is assigned here; reference fields
    /// must resolve; derived fields are computed before the record is
    /// visible. Fails with no partial effect.
    pub async fn create(
        &self,
        collection: &str,
        fields: IndexMap<String, Value>,
    ) -> Result<Committed<Record>, EngineError> {
        let def = self.collection_def(collection)?;
        let mut store = self.store.write().await;

        if store.len(collection) >= MAX_RECORDS_PER_COLLECTION {
            return Err(EngineError::LimitExceeded("too many records in collection"));
        }
        integrity::validate_fields(def, &fields)?;
        integrity::check_references(def, &store, &fields)?;

        let id = Ulid::new().to_string();
        let mut record = assemble(def, &id, fields);
        integrity::compute_own_derived(def, &store, &mut record);
        store.insert(collection, record);

        let mut affected = BTreeSet::from([collection.to_string()]);
        integrity::propagate_derived(&self.schema, &mut store, &mut affected);

        let record = store
            .get(collection, &id)
            .cloned()
            .expect("record just inserted");
        let warnings = write_through(&self.schema, self.gateway.as_ref(), &store, &affected).await;
        debug!(collection, id = %record.id(), "created record");
        Ok(Committed {
            value: record,
            warnings,
        })
    }

    /// Whole-record replace by id, preserving position and id. Derived
    /// fields on this record and on dependents are recomputed within
    /// the same call.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: IndexMap<String, Value>,
    ) -> Result<Committed<Record>, EngineError> {
        let def = self.collection_def(collection)?;
        let mut store = self.store.write().await;

        if store.get(collection, id).is_none() {
            return Err(EngineError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        integrity::validate_fields(def, &fields)?;
        integrity::check_references(def, &store, &fields)?;

        let mut record = assemble(def, id, fields);
        integrity::compute_own_derived(def, &store, &mut record);
        store.insert(collection, record);

        let mut affected = BTreeSet::from([collection.to_string()]);
        integrity::propagate_derived(&self.schema, &mut store, &mut affected);

        let record = store
            .get(collection, id)
            .cloned()
            .expect("record just replaced");
        let warnings = write_through(&self.schema, self.gateway.as_ref(), &store, &affected).await;
        debug!(collection, id, "updated record");
        Ok(Committed {
            value: record,
            warnings,
        })
    }

    /// Delete by id after applying every declared on-delete policy,
    /// transitively. No read after this returns can observe an orphan
    /// or a half-applied cascade.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<Committed<()>, EngineError> {
        self.collection_def(collection)?;
        let mut store = self.store.write().await;

        if store.get(collection, id).is_none() {
            return Err(EngineError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        let mut affected = BTreeSet::from([collection.to_string()]);
        integrity::cascade_delete(&self.schema, &mut store, collection, id, &mut affected, 0)?;
        integrity::propagate_derived(&self.schema, &mut store, &mut affected);

        let warnings = write_through(&self.schema, self.gateway.as_ref(), &store, &affected).await;
        debug!(collection, id, collections = affected.len(), "deleted record");
        Ok(Committed {
            value: (),
            warnings,
        })
    }

    fn collection_def(&self, collection: &str) -> Result<&CollectionDef, EngineError> {
        self.schema
            .collection(collection)
            .ok_or_else(|| EngineError::UnknownCollection(collection.to_string()))
    }
}

/// Build the stored record: declared fields in schema order, caller
/// values where supplied, nulls elsewhere. Derived fields get their
/// empty shape here and real values from the integrity layer. Supplied
/// fields the schema does not declare are dropped.
fn assemble(def: &CollectionDef, id: &str, mut fields: IndexMap<String, Value>) -> Record {
    let mut record = Record::with_id(id);
    for f in &def.fields {
        let value = match fields.swap_remove(f.name) {
            Some(v) if !def.is_derived(f.name) => v,
            _ if f.kind == FieldKind::List => Value::List(Vec::new()),
            _ => Value::Null,
        };
        record.set(f.name, value);
    }
    record
}
