//! Path handling and JSON tree manipulation shared by store backends.
//!
//! The tree follows the hosted store's rules: `null` and empty objects are
//! never stored, writing below a scalar replaces it with an object, and
//! arrays are addressable by index.

use serde_json::{Map, Value};

use crate::interfaces::{Result, StoreError};

/// Characters the hosted store refuses in keys.
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '#', '$', '[', ']'];

/// Split and validate a path. The empty path (or `/`) addresses the root.
pub fn segments(path: &str) -> Result<Vec<&str>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let parts: Vec<&str> = trimmed.split('/').collect();
    for part in &parts {
        if part.is_empty() || part.contains(FORBIDDEN_KEY_CHARS) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
    }
    Ok(parts)
}

/// True when one path is an ancestor of (or equal to) the other.
pub fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
    .filter(|v| !v.is_null())
}

/// Look up the node at `segs`.
pub fn lookup<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segs {
        node = child(node, seg)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// Drop nulls and empty objects, recursively. `None` means "nothing stored".
pub fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k, v)))
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Object(cleaned))
            }
        }
        Value::Array(items) => {
            if items.iter().all(Value::is_null) {
                None
            } else {
                Some(Value::Array(items))
            }
        }
        other => Some(other),
    }
}

/// The children of `node` as an object. Arrays keep their indices as
/// keys; scalars have no children.
fn into_object(node: Value) -> Map<String, Value> {
    match node {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    }
}

/// Write (or with `None`, delete) the node at `segs`.
///
/// Empty parents left behind by a delete are pruned.
pub fn write(root: &mut Value, segs: &[&str], value: Option<Value>) {
    let value = value.and_then(normalize);
    let Some((_, parents)) = segs.split_last() else {
        *root = value.unwrap_or_else(|| Value::Object(Map::new()));
        return;
    };

    if value.is_none() && lookup(root, segs).is_none() {
        return;
    }

    let mut map = into_object(root.take());
    write_into(&mut map, segs, value);
    *root = Value::Object(map);

    prune(root, parents);
}

fn write_into(map: &mut Map<String, Value>, segs: &[&str], value: Option<Value>) {
    let Some((first, rest)) = segs.split_first() else {
        return;
    };
    if rest.is_empty() {
        match value {
            Some(v) => {
                map.insert(first.to_string(), v);
            }
            None => {
                map.remove(*first);
            }
        }
        return;
    }
    let child = map.entry(first.to_string()).or_insert(Value::Null);
    let mut child_map = into_object(child.take());
    write_into(&mut child_map, rest, value);
    *child = Value::Object(child_map);
}

/// Remove empty objects along `segs`, deepest first.
fn prune(root: &mut Value, segs: &[&str]) {
    for depth in (1..=segs.len()).rev() {
        let (target, parent_path) = (segs[depth - 1], &segs[..depth - 1]);
        let mut node = &mut *root;
        for seg in parent_path {
            match node {
                Value::Object(map) => match map.get_mut(*seg) {
                    Some(next) => node = next,
                    None => return,
                },
                _ => return,
            }
        }
        if let Value::Object(map) = node {
            let empty = matches!(map.get(target), Some(Value::Object(m)) if m.is_empty());
            if empty {
                map.remove(target);
            }
        }
    }
}

/// Direct children of a node as `(key, value)` pairs.
pub fn children(node: &Value) -> Vec<(String, &Value)> {
    match node {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}
