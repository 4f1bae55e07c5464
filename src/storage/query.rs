//! Query evaluation over a JSON tree.
//!
//! Ordering mirrors the hosted store: missing/null < false < true < numbers
//! < strings < objects, ties broken by key. Keys that parse as integers sort
//! numerically before all other keys.

use std::cmp::Ordering;

use serde_json::Value;

use super::tree;
use crate::interfaces::{OrderBy, Query, Record, Scope};

/// Evaluate `query` against the node found at the query path.
///
/// Results are in ascending order; `limit_to_last` keeps the tail.
pub fn evaluate(node: Option<&Value>, query: &Query) -> Vec<Record> {
    let Some(node) = node else {
        return Vec::new();
    };

    let mut records: Vec<Record> = match query.scope {
        Scope::Children => tree::children(node)
            .into_iter()
            .map(|(key, value)| Record {
                parent: None,
                key,
                value: value.clone(),
            })
            .collect(),
        Scope::Grandchildren => tree::children(node)
            .into_iter()
            .flat_map(|(parent, group)| {
                tree::children(group)
                    .into_iter()
                    .map(move |(key, value)| Record {
                        parent: Some(parent.clone()),
                        key,
                        value: value.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect(),
    };

    records.sort_by(|a, b| compare_records(a, b, &query.order_by));

    if let Some(limit) = query.limit_to_last {
        let excess = records.len().saturating_sub(limit);
        records.drain(..excess);
    }
    records
}

fn compare_records(a: &Record, b: &Record, order_by: &OrderBy) -> Ordering {
    let by_value = match order_by {
        OrderBy::Key => Ordering::Equal,
        OrderBy::Child(field) => compare_values(field_of(&a.value, field), field_of(&b.value, field)),
    };
    by_value
        .then_with(|| compare_keys(&a.key, &b.key))
        .then_with(|| compare_keys(a.parent.as_deref().unwrap_or(""), b.parent.as_deref().unwrap_or("")))
}

fn field_of<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('/')
        .try_fold(value, |node, seg| node.get(seg))
        .filter(|v| !v.is_null())
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(false)) => 1,
        Some(Value::Bool(true)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 5,
    }
}

/// Compare two child values in store order.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Compare keys: integer keys first (numerically), then lexicographic.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn test_order_by_child_with_missing_values_first() {
        let node = json!({
            "a": {"totalSpent": 30},
            "b": {"name": "no spend"},
            "c": {"totalSpent": 10},
        });
        let records = evaluate(Some(&node), &Query::children().order_by_child("totalSpent"));
        assert_eq!(keys(&records), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_limit_to_last_keeps_tail() {
        let node = json!({"a": 1, "b": 2, "c": 3, "d": 4});
        let records = evaluate(Some(&node), &Query::children().limit_to_last(2));
        assert_eq!(keys(&records), vec!["c", "d"]);
    }

    #[test]
    fn test_grandchildren_flatten_with_parent() {
        let node = json!({
            "u1": {"o1": {"date": "2024-01-02"}},
            "u2": {"o2": {"date": "2024-01-01"}, "o3": {"date": "2024-01-03"}},
        });
        let records = evaluate(
            Some(&node),
            &Query::grandchildren().order_by_child("date").limit_to_last(2),
        );
        assert_eq!(keys(&records), vec!["o1", "o3"]);
        assert_eq!(records[0].parent.as_deref(), Some("u1"));
        assert_eq!(records[1].parent.as_deref(), Some("u2"));
    }

    #[test]
    fn test_nested_child_field() {
        let node = json!({
            "a": {"gamerLevels": {"unlocked": 12}},
            "b": {"gamerLevels": {"unlocked": 3}},
        });
        let records = evaluate(Some(&node), &Query::children().order_by_child("gamerLevels/unlocked"));
        assert_eq!(keys(&records), vec!["b", "a"]);
    }

    #[test]
    fn test_type_ordering() {
        assert_eq!(compare_values(None, Some(&json!(false))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(true)), Some(&json!(1))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(99)), Some(&json!("1"))), Ordering::Less);
        assert_eq!(compare_keys("2", "10"), Ordering::Less);
        assert_eq!(compare_keys("10", "a"), Ordering::Less);
    }
}
