//! Conversions between nested config values and flat variables
//!
//! The runtime config service only stores leaf text. A nested
//! [`serde_json::Value`] is flattened into `(slash/path, leaf)` pairs for
//! writing, and variables read back are folded into nested objects again.

use crate::error::Result;
use serde_json::{Map, Value};

/// Path separator inside a config namespace
pub const PATH_SEPARATOR: char = '/';

/// Flatten `value` into leaf writes below `path`
///
/// Objects recurse once per key; every other value (including arrays) is a
/// leaf. An empty object produces no writes.
///
/// # Examples
///
/// ```
/// use fnship::runtime_config::tree::flatten;
/// use serde_json::json;
///
/// let leaves = flatten("db", &json!({"host": "localhost", "pool": {"size": 5}}));
/// assert_eq!(leaves[0], ("db/host".to_string(), json!("localhost")));
/// assert_eq!(leaves[1], ("db/pool/size".to_string(), json!(5)));
/// ```
pub fn flatten(path: &str, value: &Value) -> Vec<(String, Value)> {
    let mut leaves = Vec::new();
    flatten_into(path, value, &mut leaves);
    leaves
}

fn flatten_into(path: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = join_path(path, key);
                flatten_into(&child_path, child, out);
            }
        }
        leaf => out.push((path.to_string(), leaf.clone())),
    }
}

/// Join a parent path and a key with `/`, skipping an empty parent
pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", parent, PATH_SEPARATOR, key)
    }
}

/// Assign `value` at `segments`, creating intermediate objects
///
/// A non-object value found where an intermediate object is needed is
/// replaced.
pub fn insert_at_path<'a, I>(root: &mut Map<String, Value>, segments: I, value: Value)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut segments: Vec<&str> = segments.into_iter().collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => unreachable!("slot was just made an object"),
        };
    }
    current.insert(last.to_string(), value);
}

/// Value at a dotted path such as `db.pool.size`
pub fn get_dotted<'v>(value: &'v Value, dotted: &str) -> Option<&'v Value> {
    if dotted.is_empty() {
        return Some(value);
    }
    dotted
        .split('.')
        .try_fold(value, |current, segment| current.get(segment))
}

/// Remove the entry at a dotted path; returns true if something was removed
pub fn remove_dotted(root: &mut Map<String, Value>, dotted: &str) -> bool {
    let mut segments: Vec<&str> = dotted.split('.').collect();
    let Some(last) = segments.pop() else {
        return false;
    };

    let mut current = root;
    for segment in segments {
        match current.get_mut(segment) {
            Some(Value::Object(map)) => current = map,
            _ => return false,
        }
    }
    current.remove(last).is_some()
}

/// Stored text for a leaf value
pub fn encode_value(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Leaf value for stored text; text that is not JSON is kept as a string
pub fn decode_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_object() {
        let leaves = flatten("", &json!({"a": {"b": {"c": 5}}, "d": "x"}));
        assert_eq!(
            leaves,
            vec![
                ("a/b/c".to_string(), json!(5)),
                ("d".to_string(), json!("x"))
            ]
        );
    }

    #[test]
    fn test_flatten_leaf_and_array() {
        assert_eq!(flatten("a/b", &json!(5)), vec![("a/b".to_string(), json!(5))]);
        assert_eq!(
            flatten("list", &json!([1, {"x": 2}])),
            vec![("list".to_string(), json!([1, {"x": 2}]))]
        );
        assert!(flatten("empty", &json!({})).is_empty());
    }

    #[test]
    fn test_insert_at_path_builds_structure() {
        let mut root = Map::new();
        insert_at_path(&mut root, "a/b/c".split('/'), json!(5));
        insert_at_path(&mut root, "a/d".split('/'), json!("x"));
        assert_eq!(Value::Object(root), json!({"a": {"b": {"c": 5}, "d": "x"}}));
    }

    #[test]
    fn test_insert_replaces_leaf_with_object() {
        let mut root = Map::new();
        insert_at_path(&mut root, ["a"], json!(1));
        insert_at_path(&mut root, ["a", "b"], json!(2));
        assert_eq!(Value::Object(root), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_flatten_then_insert_round_trips() {
        let original = json!({"a": {"b": {"c": 5}}, "list": [1, 2], "s": "str"});
        let mut root = Map::new();
        for (path, leaf) in flatten("", &original) {
            insert_at_path(&mut root, path.split(PATH_SEPARATOR), leaf);
        }
        assert_eq!(Value::Object(root), original);
    }

    #[test]
    fn test_get_and_remove_dotted() {
        let mut root = json!({"a": {"b": {"c": 5}, "d": 1}});
        assert_eq!(get_dotted(&root, "a.b.c"), Some(&json!(5)));
        assert_eq!(get_dotted(&root, "a.x"), None);
        assert_eq!(get_dotted(&root, ""), Some(&root));

        let map = root.as_object_mut().unwrap();
        assert!(remove_dotted(map, "a.b"));
        assert!(!remove_dotted(map, "a.b.c"));
        assert_eq!(root, json!({"a": {"d": 1}}));
    }

    #[test]
    fn test_encode_decode() {
        assert_eq!(encode_value(&json!("faz")).unwrap(), "\"faz\"");
        assert_eq!(decode_text("\"faz\""), json!("faz"));
        assert_eq!(decode_text("5"), json!(5));
        assert_eq!(decode_text("faz"), json!("faz"));
    }
}
