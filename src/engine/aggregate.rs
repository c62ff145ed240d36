//! Derived reporting views. Every function here is pure and stateless:
//! it reads a slice of records (often a query result) and produces a
//! value that a fresh recomputation would reproduce. Nothing is
//! cached.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{FieldAccess, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Day,
    Month,
}

impl Period {
    fn key(&self, date: chrono::NaiveDate) -> String {
        match self {
            Period::Day => date.format("%Y-%m-%d").to_string(),
            Period::Month => date.format("%Y-%m").to_string(),
        }
    }
}

/// One time bucket of a series, keyed by its ISO period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: String,
    pub total: f64,
}

/// One group of a category distribution. `share` is the percentage of
/// the grand total; shares sum to 100 modulo float rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub key: String,
    pub value: f64,
    pub share: f64,
}

/// Sum a numeric field, optionally restricted to records whose
/// `predicate` field equals the given value.
pub fn sum_where<T: FieldAccess>(
    records: &[T],
    amount_field: &str,
    predicate: Option<(&str, &Value)>,
) -> f64 {
    records
        .iter()
        .filter(|r| match predicate {
            Some((field, expected)) => r.field(field) == Some(expected),
            None => true,
        })
        .filter_map(|r| r.field(amount_field).and_then(Value::as_number))
        .sum()
}

/// Bucket records by a date field truncated to `period` and sum a
/// numeric field per bucket. Buckets come out chronologically and only
/// where at least one record contributed, no zero fill.
pub fn series<T: FieldAccess>(
    records: &[T],
    date_field: &str,
    amount_field: &str,
    period: Period,
) -> Vec<Bucket> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for r in records {
        let Some(date) = r.field(date_field).and_then(Value::as_date) else {
            continue;
        };
        let amount = r
            .field(amount_field)
            .and_then(Value::as_number)
            .unwrap_or(0.0);
        *totals.entry(period.key(date)).or_insert(0.0) += amount;
    }
    totals
        .into_iter()
        .map(|(key, total)| Bucket { key, total })
        .collect()
}

/// The fixed 12-month calendar series for one year: every month is
/// emitted, zero-filled where nothing contributed.
pub fn calendar_series<T: FieldAccess>(
    records: &[T],
    date_field: &str,
    amount_field: &str,
    year: i32,
) -> Vec<Bucket> {
    let mut months: Vec<Bucket> = (1..=12)
        .map(|m| Bucket {
            key: format!("{year:04}-{m:02}"),
            total: 0.0,
        })
        .collect();
    for bucket in series(records, date_field, amount_field, Period::Month) {
        if let Some(slot) = months.iter_mut().find(|m| m.key == bucket.key) {
            slot.total = bucket.total;
        }
    }
    months
}

/// Count records per distinct value of a field. Groups appear in
/// first-seen order; records without the field are left out.
pub fn breakdown_count<T: FieldAccess>(records: &[T], field: &str) -> Vec<Slice> {
    breakdown(records, field, None)
}

/// Sum a numeric field per distinct value of a grouping field.
pub fn breakdown_sum<T: FieldAccess>(
    records: &[T],
    group_field: &str,
    amount_field: &str,
) -> Vec<Slice> {
    breakdown(records, group_field, Some(amount_field))
}

fn breakdown<T: FieldAccess>(
    records: &[T],
    group_field: &str,
    amount_field: Option<&str>,
) -> Vec<Slice> {
    let mut groups: IndexMap<String, f64> = IndexMap::new();
    for r in records {
        let Some(key) = r.field(group_field).filter(|v| !v.is_null()) else {
            continue;
        };
        let weight = match amount_field {
            Some(field) => r.field(field).and_then(Value::as_number).unwrap_or(0.0),
            None => 1.0,
        };
        *groups.entry(key.text_form()).or_insert(0.0) += weight;
    }
    let grand_total: f64 = groups.values().sum();
    groups
        .into_iter()
        .map(|(key, value)| Slice {
            key,
            value,
            share: if grand_total == 0.0 {
                0.0
            } else {
                value / grand_total * 100.0
            },
        })
        .collect()
}

/// First `n` records ranked descending by a numeric field; ties keep
/// their original relative order. Records without the field rank last.
pub fn top_n<T: FieldAccess + Clone>(records: &[T], field: &str, n: usize) -> Vec<T> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| {
        let av = a.field(field).and_then(Value::as_number).unwrap_or(f64::NEG_INFINITY);
        let bv = b.field(field).and_then(Value::as_number).unwrap_or(f64::NEG_INFINITY);
        bv.total_cmp(&av)
    });
    ranked.truncate(n);
    ranked
}
