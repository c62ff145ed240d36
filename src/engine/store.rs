use indexmap::IndexMap;

use crate::model::{Collection, Record};
use crate::schema::Schema;

/// Raw storage for one application: every collection of the schema, in
/// schema order. No integrity policy lives here; the enforcer in the
/// layer above owns validation, cascades, and derived fields. The whole
/// struct sits behind one lock so a cascade commits atomically.
#[derive(Debug)]
pub struct Store {
    collections: IndexMap<String, Collection>,
}

impl Store {
    pub fn new(schema: &Schema) -> Self {
        Self {
            collections: schema
                .collections
                .iter()
                .map(|def| (def.name.to_string(), Collection::default()))
                .collect(),
        }
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub(crate) fn set_collection(&mut self, name: &str, collection: Collection) {
        if let Some(slot) = self.collections.get_mut(name) {
            *slot = collection;
        }
    }

    pub fn len(&self, name: &str) -> usize {
        self.collections.get(name).map_or(0, Collection::len)
    }

    pub fn get(&self, name: &str, id: &str) -> Option<&Record> {
        self.collections.get(name).and_then(|c| c.get(id))
    }

    pub(crate) fn get_mut(&mut self, name: &str, id: &str) -> Option<&mut Record> {
        self.collections.get_mut(name).and_then(|c| c.get_mut(id))
    }

    /// Iterate a collection in insertion order; unknown names yield
    /// nothing.
    pub fn iter(&self, name: &str) -> impl Iterator<Item = &Record> {
        self.collections.get(name).into_iter().flat_map(Collection::iter)
    }

    pub(crate) fn insert(&mut self, name: &str, record: Record) {
        if let Some(c) = self.collections.get_mut(name) {
            c.insert(record);
        }
    }

    pub(crate) fn remove(&mut self, name: &str, id: &str) -> Option<Record> {
        self.collections.get_mut(name).and_then(|c| c.remove(id))
    }
}
