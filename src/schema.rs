use crate::engine::Store;
use crate::model::{Record, Value};

/// Scalar kinds a field may hold. `List` marks a denormalized child
/// list, always derived and never caller-supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Number,
    Bool,
    Date,
    List,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Number => "number",
            FieldKind::Bool => "bool",
            FieldKind::Date => "date",
            FieldKind::List => "list",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldKind::Str, Value::Str(_))
                | (FieldKind::Number, Value::Number(_))
                | (FieldKind::Bool, Value::Bool(_))
                | (FieldKind::Date, Value::Date(_))
                | (FieldKind::List, Value::List(_))
        )
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Documented lower bound for numeric fields.
    pub min: Option<f64>,
}

impl FieldDef {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            min: None,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Str)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn list(name: &'static str) -> Self {
        Self::new(name, FieldKind::List)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, bound: f64) -> Self {
        self.min = Some(bound);
        self
    }
}

/// What happens to a dependent record when the entity it references is
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnDelete {
    /// Delete the dependent, recursively applying its own policies.
    Cascade,
    /// Clear the reference field; optionally reset a status field to
    /// its unassigned value (e.g. a unit back to "vacant").
    Nullify {
        reset: Option<(&'static str, &'static str)>,
    },
}

/// A foreign key: `field` on this collection holds the id of a record
/// in `target`. Non-empty values must resolve at commit time.
#[derive(Debug, Clone)]
pub struct ReferenceDef {
    pub field: &'static str,
    pub target: &'static str,
    pub on_delete: OnDelete,
}

pub type DeriveFn = fn(&Store, &Record) -> Value;

/// A field computed from related collections instead of stored
/// authoritatively. `depends_on` names the collections whose mutations
/// force a recompute within the same operation.
#[derive(Debug, Clone)]
pub struct DerivedDef {
    pub field: &'static str,
    pub depends_on: &'static [&'static str],
    pub compute: DeriveFn,
}

#[derive(Debug, Clone)]
pub struct CollectionDef {
    pub name: &'static str,
    pub fields: Vec<FieldDef>,
    pub references: Vec<ReferenceDef>,
    pub derived: Vec<DerivedDef>,
}

impl CollectionDef {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            references: Vec::new(),
            derived: Vec::new(),
        }
    }

    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    pub fn reference(mut self, field: &'static str, target: &'static str, on_delete: OnDelete) -> Self {
        self.references.push(ReferenceDef {
            field,
            target,
            on_delete,
        });
        self
    }

    pub fn derived(
        mut self,
        field: &'static str,
        depends_on: &'static [&'static str],
        compute: DeriveFn,
    ) -> Self {
        self.derived.push(DerivedDef {
            field,
            depends_on,
            compute,
        });
        self
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// `id` is implicit on every collection.
    pub fn is_known_field(&self, name: &str) -> bool {
        name == "id" || self.field_def(name).is_some()
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.derived.iter().any(|d| d.field == name)
    }
}

pub type SeedFn = fn() -> Vec<(&'static str, Vec<Record>)>;

/// A full application schema: collections, their integrity rules, and
/// the deterministic first-run dataset.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    pub collections: Vec<CollectionDef>,
    pub seed: SeedFn,
}

impl Schema {
    pub fn new(name: &'static str, collections: Vec<CollectionDef>, seed: SeedFn) -> Self {
        Self {
            name,
            collections,
            seed,
        }
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionDef> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Every (dependent collection, reference) pair pointing at `target`.
    pub fn references_to(&self, target: &str) -> Vec<(&'static str, &ReferenceDef)> {
        let mut refs = Vec::new();
        for def in &self.collections {
            for r in &def.references {
                if r.target == target {
                    refs.push((def.name, r));
                }
            }
        }
        refs
    }
}
