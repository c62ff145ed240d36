use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::limits::{MAX_CASCADE_DEPTH, MAX_STRING_LEN};
use crate::model::{FieldAccess, Record, Value};
use crate::schema::{CollectionDef, DerivedDef, OnDelete, Schema};

use super::store::Store;
use super::EngineError;

/// Check caller-supplied fields against the collection's declared
/// kinds and constraints. Derived fields are engine-owned and skipped.
pub(super) fn validate_fields(
    def: &CollectionDef,
    fields: &IndexMap<String, Value>,
) -> Result<(), EngineError> {
    for f in &def.fields {
        if def.is_derived(f.name) {
            continue;
        }
        let supplied = fields.get(f.name);
        if f.required && !matches!(supplied, Some(v) if !v.is_null()) {
            return Err(EngineError::Validation {
                field: f.name.to_string(),
                reason: "required field missing".into(),
            });
        }
        let Some(value) = supplied else { continue };
        if value.is_null() {
            continue;
        }
        if !f.kind.matches(value) {
            return Err(EngineError::Validation {
                field: f.name.to_string(),
                reason: format!("expected {}, got {}", f.kind.name(), value.kind_name()),
            });
        }
        if let Value::Str(s) = value
            && s.len() > MAX_STRING_LEN {
                return Err(EngineError::LimitExceeded("string field too long"));
            }
        if let (Some(min), Some(n)) = (f.min, value.as_number())
            && n < min {
                return Err(EngineError::Validation {
                    field: f.name.to_string(),
                    reason: format!("below minimum {min}"),
                });
            }
    }
    Ok(())
}

/// Every non-empty reference must resolve at commit time; a dangling
/// one aborts the mutation before any state changes.
pub(super) fn check_references(
    def: &CollectionDef,
    store: &Store,
    fields: &IndexMap<String, Value>,
) -> Result<(), EngineError> {
    for r in &def.references {
        if let Some(Value::Str(target_id)) = fields.get(r.field)
            && !target_id.is_empty()
            && store.get(r.target, target_id).is_none() {
                return Err(EngineError::DanglingReference {
                    collection: def.name.to_string(),
                    field: r.field.to_string(),
                    id: target_id.clone(),
                });
            }
    }
    Ok(())
}

/// Compute this record's own derived fields in place. The store view
/// excludes the record itself (create) or still holds the previous
/// version (update); none of the shipped derive rules read their own
/// collection, so both views are correct.
pub(super) fn compute_own_derived(def: &CollectionDef, store: &Store, record: &mut Record) {
    for d in &def.derived {
        let value = (d.compute)(store, record);
        record.set(d.field, value);
    }
}

/// Delete `id` from `collection`, first applying the declared on-delete
/// policy of every reference pointing at it. Cascade recurses into
/// dependents; nullify clears the reference and applies the declared
/// status reset. Collections touched along the way land in `affected`.
pub(super) fn cascade_delete(
    schema: &Schema,
    store: &mut Store,
    collection: &str,
    id: &str,
    affected: &mut BTreeSet<String>,
    depth: usize,
) -> Result<(), EngineError> {
    if depth > MAX_CASCADE_DEPTH {
        return Err(EngineError::LimitExceeded("cascade too deep"));
    }

    for (dependent, reference) in schema.references_to(collection) {
        let dependent_ids: Vec<String> = store
            .iter(dependent)
            .filter(|r| r.text(reference.field) == Some(id))
            .map(|r| r.id().to_string())
            .collect();
        if dependent_ids.is_empty() {
            continue;
        }
        affected.insert(dependent.to_string());

        match &reference.on_delete {
            OnDelete::Cascade => {
                for dep_id in dependent_ids {
                    cascade_delete(schema, store, dependent, &dep_id, affected, depth + 1)?;
                }
            }
            OnDelete::Nullify { reset } => {
                for dep_id in dependent_ids {
                    if let Some(rec) = store.get_mut(dependent, &dep_id) {
                        rec.set(reference.field, Value::Null);
                        if let Some((field, value)) = reset {
                            rec.set(*field, Value::str(*value));
                        }
                    }
                }
            }
        }
    }

    store.remove(collection, id);
    debug!(collection, id, depth, "removed record");
    Ok(())
}

/// Recompute the derived fields of `def` selected by `filter`, with
/// change detection. New values are computed against the immutable
/// store first, then applied.
fn recompute(store: &mut Store, def: &CollectionDef, filter: impl Fn(&DerivedDef) -> bool) -> bool {
    let rules: Vec<&DerivedDef> = def.derived.iter().filter(|d| filter(d)).collect();
    if rules.is_empty() {
        return false;
    }

    let mut updates: Vec<(String, &'static str, Value)> = Vec::new();
    {
        let view: &Store = store;
        for record in view.iter(def.name) {
            for rule in &rules {
                let next = (rule.compute)(view, record);
                if record.field(rule.field) != Some(&next) {
                    updates.push((record.id().to_string(), rule.field, next));
                }
            }
        }
    }

    let changed = !updates.is_empty();
    for (id, field, value) in updates {
        if let Some(rec) = store.get_mut(def.name, &id) {
            rec.set(field, value);
        }
    }
    changed
}

/// Recompute every derived field of every collection. Used at load so
/// no stale value survives a restart.
pub(super) fn recompute_all(schema: &Schema, store: &mut Store) -> BTreeSet<String> {
    let mut touched = BTreeSet::new();
    for def in &schema.collections {
        if recompute(store, def, |_| true) {
            touched.insert(def.name.to_string());
        }
    }
    touched
}

/// Propagate derived-field recomputation out from the collections in
/// `affected` until no dependent collection changes anymore. Runs
/// inside the same mutation, so derived values are never observed
/// stale.
pub(super) fn propagate_derived(schema: &Schema, store: &mut Store, affected: &mut BTreeSet<String>) {
    let mut pending: Vec<String> = affected.iter().cloned().collect();
    while let Some(source) = pending.pop() {
        for def in &schema.collections {
            let touched = recompute(store, def, |d| {
                d.depends_on.iter().any(|c| *c == source)
            });
            if touched && affected.insert(def.name.to_string()) {
                pending.push(def.name.to_string());
            }
        }
    }
}
