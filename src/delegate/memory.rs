//! In-memory delegate
//!
//! Holds a model's records in a `Vec` and answers `find_many` with the same
//! filter, ordering and cursor semantics a database-backed delegate has.

use super::Delegate;
use crate::error::{Error, Result};
use crate::pagination::FindManyArgs;
use crate::types::{JsonObject, OrderBy, Record};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Delegate over an in-memory record collection
#[derive(Debug)]
pub struct MemoryDelegate {
    model: String,
    records: RwLock<Vec<Record>>,
    calls: AtomicUsize,
}

impl MemoryDelegate {
    /// Create a delegate holding `records`
    pub fn new(model: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            model: model.into(),
            records: RwLock::new(records),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a delegate from JSON values, each of which must be an object
    pub fn from_values(model: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        let model = model.into();
        let records = values
            .into_iter()
            .map(|v| match v {
                Value::Object(record) => Ok(record),
                other => Err(Error::delegate(
                    model.clone(),
                    format!("record must be an object, got {other}"),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(model, records))
    }

    /// Append a record
    pub fn insert(&self, record: Record) -> Result<()> {
        self.write().push(record);
        Ok(())
    }

    /// Remove every record whose `field` equals `value`, returning how many were removed
    pub fn remove_where(&self, field: &str, value: &Value) -> Result<usize> {
        let mut records = self.write();
        let before = records.len();
        records.retain(|r| r.get(field) != Some(value));
        Ok(before - records.len())
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `find_many` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    // a panicking writer cannot leave a half-applied push or retain behind
    fn read(&self) -> RwLockReadGuard<'_, Vec<Record>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Record>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn query(&self, args: &FindManyArgs) -> Result<Vec<Record>> {
        let records = self.read();

        let mut matched = Vec::new();
        for record in records.iter() {
            let keep = match args.filter() {
                Some(filter) => matches_filter(record, filter)?,
                None => true,
            };
            if keep {
                matched.push(record.clone());
            }
        }
        drop(records);

        sort_records(&mut matched, &args.order_by);

        let distinct = args.distinct();
        if !distinct.is_empty() {
            let mut seen = HashSet::new();
            matched.retain(|r| {
                let key: Vec<String> = distinct
                    .iter()
                    .map(|f| r.get(f).unwrap_or(&Value::Null).to_string())
                    .collect();
                seen.insert(key)
            });
        }

        let start = match &args.cursor {
            Some(cursor) => {
                let Some(anchor) = matched
                    .iter()
                    .position(|r| r.get(&cursor.field).unwrap_or(&Value::Null) == &cursor.value)
                else {
                    return Ok(Vec::new());
                };
                anchor + args.skip
            }
            None => args.skip,
        };

        let page = matched
            .into_iter()
            .skip(start)
            .take(args.take)
            .map(|r| match args.select() {
                Some(select) => project(r, select),
                None => r,
            })
            .collect();

        Ok(page)
    }
}

#[async_trait]
impl Delegate for MemoryDelegate {
    fn model(&self) -> &str {
        &self.model
    }

    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.query(&args)
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Total order over JSON values: null < bool < number < string < array < object
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_records(records: &mut [Record], order_by: &OrderBy) {
    if order_by.is_empty() {
        return;
    }
    // stable, so ties keep insertion order
    records.sort_by(|a, b| {
        for entry in order_by {
            let left = a.get(&entry.field).unwrap_or(&Value::Null);
            let right = b.get(&entry.field).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            let ord = if entry.order.is_desc() { ord.reverse() } else { ord };
            if ord.is_ne() {
                return ord;
            }
        }
        Ordering::Equal
    });
}

// ============================================================================
// Filtering
// ============================================================================

const OPERATORS: [&str; 11] = [
    "equals",
    "not",
    "in",
    "notIn",
    "lt",
    "lte",
    "gt",
    "gte",
    "contains",
    "startsWith",
    "endsWith",
];

pub(crate) fn is_operator_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.keys().any(|k| OPERATORS.contains(&k.as_str())),
        _ => false,
    }
}

fn as_filter_list(value: &Value) -> Result<Vec<&JsonObject>> {
    match value {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| Error::invalid_argument("where", format!("expected an object, got {item}")))
            })
            .collect(),
        other => Err(Error::invalid_argument(
            "where",
            format!("expected an object or array, got {other}"),
        )),
    }
}

/// Evaluate a `where` filter against a record
fn matches_filter(record: &Record, filter: &JsonObject) -> Result<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "AND" => {
                let mut all = true;
                for sub in as_filter_list(condition)? {
                    all &= matches_filter(record, sub)?;
                }
                all
            }
            "OR" => {
                let mut any = false;
                for sub in as_filter_list(condition)? {
                    any |= matches_filter(record, sub)?;
                }
                any
            }
            "NOT" => {
                let mut none = true;
                for sub in as_filter_list(condition)? {
                    none &= !matches_filter(record, sub)?;
                }
                none
            }
            field => {
                let value = record.get(field).unwrap_or(&Value::Null);
                if is_operator_object(condition) {
                    matches_operators(value, condition)?
                } else {
                    value == condition
                }
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_operators(value: &Value, operators: &Value) -> Result<bool> {
    let Value::Object(operators) = operators else {
        return Ok(value == operators);
    };

    for (op, operand) in operators {
        let ok = match op.as_str() {
            "equals" => value == operand,
            "not" => {
                if is_operator_object(operand) {
                    !matches_operators(value, operand)?
                } else {
                    value != operand
                }
            }
            "in" => list_operand(op, operand)?.contains(value),
            "notIn" => !list_operand(op, operand)?.contains(value),
            "lt" => !value.is_null() && compare_values(value, operand) == Ordering::Less,
            "lte" => !value.is_null() && compare_values(value, operand) != Ordering::Greater,
            "gt" => !value.is_null() && compare_values(value, operand) == Ordering::Greater,
            "gte" => !value.is_null() && compare_values(value, operand) != Ordering::Less,
            "contains" | "startsWith" | "endsWith" => {
                let (Some(haystack), Some(needle)) = (value.as_str(), operand.as_str()) else {
                    return Ok(false);
                };
                match op.as_str() {
                    "contains" => haystack.contains(needle),
                    "startsWith" => haystack.starts_with(needle),
                    _ => haystack.ends_with(needle),
                }
            }
            other => {
                return Err(Error::invalid_argument(
                    "where",
                    format!("unsupported operator '{other}'"),
                ))
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn list_operand<'a>(op: &str, operand: &'a Value) -> Result<&'a Vec<Value>> {
    operand
        .as_array()
        .ok_or_else(|| Error::invalid_argument("where", format!("'{op}' expects an array")))
}

/// Keep only the fields selected with `true`
pub(crate) fn project(record: Record, select: &JsonObject) -> Record {
    record
        .into_iter()
        .filter(|(k, _)| matches!(select.get(k), Some(Value::Bool(true))))
        .collect()
}
