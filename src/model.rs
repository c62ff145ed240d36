use std::cmp::Ordering;

use chrono::NaiveDate;
use indexmap::IndexMap;

/// One field value. `List` holds denormalized child records kept in
/// sync with their canonical collection by the integrity layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Date(NaiveDate),
    List(Vec<Record>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Date(_) => "date",
            Value::List(_) => "list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Natural text form, used for substring search and as the grouping
    /// key in distributions. Lists have no text form.
    pub fn text_form(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::List(_) => String::new(),
        }
    }

    /// Total order for sorting: numbers and dates compare naturally,
    /// strings lexicographically, nulls first. Mixed kinds fall back to
    /// their text forms.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => self.text_form().cmp(&other.text_form()),
        }
    }
}

/// Integral values print without a trailing `.0` so that searching for
/// "40" matches a stored 40.0.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Capability abstraction over anything with named fields. The query
/// and aggregation code is written once against this trait.
pub trait FieldAccess {
    fn field(&self, name: &str) -> Option<&Value>;
    fn field_names(&self) -> Vec<&str>;
}

/// One entity: an insertion-ordered field map. The `id` field is a
/// string assigned at creation and never changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut record = Record::default();
        record.set("id", Value::Str(id.into()));
        record
    }

    pub fn id(&self) -> &str {
        self.fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Builder form of `set` for literal construction.
    pub fn field_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_number)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.fields.get(name).and_then(Value::as_date)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FieldAccess for Record {
    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

/// All entities of one type, keyed by id. Insertion order is preserved
/// and is the default iteration order; replacing a record keeps its
/// position.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: IndexMap<String, Record>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.records.get_mut(id)
    }

    /// Insert or replace by the record's own id. An existing record is
    /// replaced in place, keeping its position.
    pub fn insert(&mut self, record: Record) {
        self.records.insert(record.id().to_string(), record);
    }

    /// Remove by id, shifting later records up so order stays intact.
    pub fn remove(&mut self, id: &str) -> Option<Record> {
        self.records.shift_remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }
}
