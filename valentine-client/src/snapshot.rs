//! Local mirror of a followed location
//!
//! Stream events describe changes relative to the followed path. Applying
//! them in order to a [`Snapshot`] reproduces the value the server holds.

use serde_json::{Map, Value};

use crate::stream::DatabaseEvent;

/// The current value of a followed location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    root: Value,
}

impl Snapshot {
    pub fn new() -> Self {
        Self { root: Value::Null }
    }

    /// The mirrored value (`Value::Null` when nothing is stored)
    pub fn value(&self) -> &Value {
        &self.root
    }

    /// The mirrored value with integer-keyed objects turned into arrays
    ///
    /// The database stores arrays as objects keyed by index, and partial
    /// updates can leave them in that shape. Missing indices become `null`.
    pub fn as_array_like(&self) -> Value {
        normalize_array(&self.root)
    }

    /// Applies an event. Returns `true` if the value may have changed.
    pub fn apply(&mut self, event: &DatabaseEvent) -> bool {
        match event {
            DatabaseEvent::Put { path, data } => {
                self.put(path, data.clone());
                true
            }
            DatabaseEvent::Patch { path, data } => {
                if let Value::Object(children) = data {
                    for (key, value) in children {
                        let child = format!("{}/{}", path.trim_end_matches('/'), key);
                        self.put(&child, value.clone());
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn put(&mut self, path: &str, data: Value) {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segments.split_last() else {
            self.root = data;
            return;
        };

        let mut node = &mut self.root;
        for segment in parents {
            node = child_mut(node, segment);
        }
        set_child(node, last, data);
    }
}

/// Descends into a child, creating an object when the path does not exist
fn child_mut<'a>(node: &'a mut Value, key: &str) -> &'a mut Value {
    if let Some(index) = array_index(node, key) {
        return &mut node[index];
    }
    demote_array(node);

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    &mut node[key]
}

fn set_child(node: &mut Value, key: &str, data: Value) {
    if let Some(index) = array_index(node, key) {
        node[index] = data;
        return;
    }
    demote_array(node);

    if let Value::Object(map) = node {
        if data.is_null() {
            map.remove(key);
        } else {
            map.insert(key.to_string(), data);
        }
    } else if !data.is_null() {
        let mut map = Map::new();
        map.insert(key.to_string(), data);
        *node = Value::Object(map);
    }
}

/// Index into an array node, if `key` addresses an existing element
fn array_index(node: &Value, key: &str) -> Option<usize> {
    match node {
        Value::Array(items) => key.parse::<usize>().ok().filter(|i| *i < items.len()),
        _ => None,
    }
}

/// Rewrites an array node as an index-keyed object so new keys can be added
fn demote_array(node: &mut Value) {
    if let Value::Array(items) = node {
        let items = std::mem::take(items);
        *node = Value::Object(array_to_object(items));
    }
}

fn array_to_object(items: Vec<Value>) -> Map<String, Value> {
    items
        .into_iter()
        .enumerate()
        .filter(|(_, v)| !v.is_null())
        .map(|(i, v)| (i.to_string(), v))
        .collect()
}

/// Turns an integer-keyed object into an array, leaving other values as-is
///
/// Missing indices become `null`. Like the database itself, an object is
/// only treated as an array when at least half of the indices up to its
/// largest key are present; sparser objects are returned unchanged.
pub fn normalize_array(value: &Value) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };

    let indices: Option<Vec<usize>> = map.keys().map(|k| k.parse::<usize>().ok()).collect();
    let Some(max) = indices.and_then(|indices| indices.into_iter().max()) else {
        return value.clone();
    };
    if max >= map.len().saturating_mul(2) {
        return value.clone();
    }

    let mut items = vec![Value::Null; max + 1];
    for (key, item) in map {
        if let Ok(index) = key.parse::<usize>() {
            items[index] = item.clone();
        }
    }
    Value::Array(items)
}
