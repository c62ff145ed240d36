use indexmap::IndexMap;

use crate::model::{FieldAccess, Record, Value};

use super::{Engine, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub dir: SortDir,
}

/// One query: free-text term, multi-value filter, single-key sort.
/// Stages always apply in that order. Field names the schema does not
/// know are tolerated as no-ops for their clause.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    pub search: Option<String>,
    pub filter: IndexMap<String, Vec<Value>>,
    pub sort: Option<SortSpec>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Accept any of `values` for `field` (OR within the set, AND
    /// across fields).
    pub fn filter_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.filter.insert(field.into(), values);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.sort = Some(SortSpec {
            field: field.into(),
            dir,
        });
        self
    }
}

/// Case-insensitive substring match against the text form of every
/// scalar field. An empty term matches everything.
pub fn search<T: FieldAccess + Clone>(records: &[T], term: &str) -> Vec<T> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| {
            r.field_names().iter().any(|name| {
                r.field(name)
                    .filter(|v| !v.is_list())
                    .is_some_and(|v| v.text_form().to_lowercase().contains(&needle))
            })
        })
        .cloned()
        .collect()
}

/// AND across filtered fields, OR within a field's accepted set. A
/// record missing a constrained field fails that constraint; a field
/// the schema does not know is skipped entirely.
pub fn filter<T: FieldAccess + Clone>(
    records: &[T],
    spec: &IndexMap<String, Vec<Value>>,
    is_known: impl Fn(&str) -> bool,
) -> Vec<T> {
    records
        .iter()
        .filter(|r| {
            spec.iter().all(|(field, accepted)| {
                if !is_known(field) {
                    return true;
                }
                match r.field(field) {
                    Some(value) => accepted.contains(value),
                    None => false,
                }
            })
        })
        .cloned()
        .collect()
}

/// Stable single-key sort; ties keep their prior relative order, and an
/// unknown field leaves the order untouched.
pub fn sort<T: FieldAccess + Clone>(
    records: &[T],
    spec: &SortSpec,
    is_known: impl Fn(&str) -> bool,
) -> Vec<T> {
    let mut out = records.to_vec();
    if !is_known(&spec.field) {
        return out;
    }
    let missing = Value::Null;
    out.sort_by(|a, b| {
        let av = a.field(&spec.field).unwrap_or(&missing);
        let bv = b.field(&spec.field).unwrap_or(&missing);
        let ord = av.sort_cmp(bv);
        match spec.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
    out
}

/// Fixed composition: search, then filter, then sort.
pub fn apply<T: FieldAccess + Clone>(
    records: &[T],
    spec: &QuerySpec,
    is_known: impl Fn(&str) -> bool + Copy,
) -> Vec<T> {
    let mut out = match &spec.search {
        Some(term) => search(records, term),
        None => records.to_vec(),
    };
    if !spec.filter.is_empty() {
        out = filter(&out, &spec.filter, is_known);
    }
    if let Some(sort_spec) = &spec.sort {
        out = sort(&out, sort_spec, is_known);
    }
    out
}

impl Engine {
    /// Run one query over a collection; returns full cloned records in
    /// result order.
    pub async fn query(
        &self,
        collection: &str,
        spec: &QuerySpec,
    ) -> Result<Vec<Record>, EngineError> {
        let def = self
            .schema
            .collection(collection)
            .ok_or_else(|| EngineError::UnknownCollection(collection.to_string()))?;
        let store = self.store.read().await;
        let records: Vec<Record> = store.iter(collection).cloned().collect();
        Ok(apply(&records, spec, |name| def.is_known_field(name)))
    }
}
