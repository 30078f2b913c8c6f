//! Per-node descriptive metadata.
//!
//! Every key follows one entry of an explicit merge policy table:
//!
//! | key                                      | policy                          |
//! |------------------------------------------|---------------------------------|
//! | `examples`, `tags`, `notes`              | [`MergePolicy::Append`]         |
//! | `element`, `elements`, `keys`, `values`  | [`MergePolicy::Nested`]         |
//! | anything else                            | [`MergePolicy::Replace`]        |
//!
//! Appending keys accumulate across chained calls; nested descriptors merge
//! recursively with the same rules applied to their own keys.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergePolicy {
    /// Existing array grows by the new entries.
    Append,
    /// Objects merge recursively; arrays inside them append.
    Nested,
    /// New value overwrites, except that an existing array still appends and
    /// two objects still merge.
    Replace,
}

impl MergePolicy {
    pub fn for_key(key: &str) -> MergePolicy {
        match key {
            "examples" | "tags" | "notes" => MergePolicy::Append,
            "element" | "elements" | "keys" | "values" => MergePolicy::Nested,
            _ => MergePolicy::Replace,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(IndexMap<String, Json>);

impl Manifest {
    pub fn get(&self) -> &IndexMap<String, Json> {
        &self.0
    }

    pub fn get_one(&self, key: &str) -> Option<&Json> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `value` into `key` according to the key's [`MergePolicy`].
    pub fn update(&mut self, key: &str, value: Json) {
        let policy = MergePolicy::for_key(key);
        match self.0.entry(key.to_string()) {
            Entry::Occupied(mut slot) => {
                let existing = std::mem::take(slot.get_mut());
                let merged = match policy {
                    MergePolicy::Append => append(existing, value),
                    MergePolicy::Nested | MergePolicy::Replace => merge(existing, value),
                };
                *slot.get_mut() = merged;
            }
            Entry::Vacant(slot) => {
                slot.insert(match (policy, value) {
                    (MergePolicy::Append, Json::Array(xs)) => Json::Array(xs),
                    (MergePolicy::Append, single) => Json::Array(vec![single]),
                    (_, value) => value,
                });
            }
        }
    }

    /// Overwrite `key` unconditionally. Used for structural descriptors that
    /// are re-derived from children rather than accumulated.
    pub fn set(&mut self, key: &str, value: Json) {
        self.0.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Json> {
        self.0.shift_remove(key)
    }

    /// Merge every key of `other` into `self` with [`Manifest::update`].
    pub fn extend(&mut self, other: &Manifest) {
        for (key, value) in &other.0 {
            self.update(key, value.clone());
        }
    }

    pub fn to_json(&self) -> Json {
        Json::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

fn append(existing: Json, value: Json) -> Json {
    let mut items = match existing {
        Json::Array(xs) => xs,
        single => vec![single],
    };
    match value {
        Json::Array(xs) => items.extend(xs),
        single => items.push(single),
    }
    Json::Array(items)
}

fn merge(existing: Json, value: Json) -> Json {
    match (existing, value) {
        (existing @ Json::Array(_), value) => append(existing, value),
        (Json::Object(mut left), Json::Object(right)) => {
            for (key, rv) in right {
                match left.get_mut(&key) {
                    Some(slot) => {
                        let lv = std::mem::take(slot);
                        *slot = match MergePolicy::for_key(&key) {
                            MergePolicy::Append => append(lv, rv),
                            _ => merge(lv, rv),
                        };
                    }
                    None => {
                        left.insert(key, rv);
                    }
                }
            }
            Json::Object(left)
        }
        (_, value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_accumulate_in_order() {
        let mut m = Manifest::default();
        m.update("tags", json!({"value": "a"}));
        m.update("tags", json!({"value": "b"}));
        assert_eq!(m.get_one("tags"), Some(&json!([{"value": "a"}, {"value": "b"}])));
    }

    #[test]
    fn scalars_overwrite() {
        let mut m = Manifest::default();
        m.update("title", json!("one"));
        m.update("title", json!("two"));
        assert_eq!(m.get_one("title"), Some(&json!("two")));
    }

    #[test]
    fn nested_descriptors_merge_recursively() {
        let mut m = Manifest::default();
        m.update("keys", json!({"name": {"title": "Name", "tags": [{"value": "x"}]}}));
        m.update("keys", json!({"name": {"tags": [{"value": "y"}]}, "age": {"title": "Age"}}));
        assert_eq!(
            m.to_json(),
            json!({"keys": {
                "name": {"title": "Name", "tags": [{"value": "x"}, {"value": "y"}]},
                "age": {"title": "Age"}
            }})
        );
    }

    #[test]
    fn rewritten_keys_keep_their_position() {
        let mut m = Manifest::default();
        m.update("title", json!("one"));
        m.update("tags", json!({"value": "a"}));
        m.update("keys", json!({"a": {"title": "A"}, "b": {}}));
        m.update("title", json!("two"));
        m.update("keys", json!({"a": {"title": "B"}}));
        let order: Vec<&str> = m.get().keys().map(String::as_str).collect();
        assert_eq!(order, ["title", "tags", "keys"]);
        let nested: Vec<String> = m
            .get_one("keys")
            .and_then(Json::as_object)
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(nested, ["a", "b"]);
    }

    #[test]
    fn set_replaces_structural_descriptors() {
        let mut m = Manifest::default();
        m.update("keys", json!({"a": {}}));
        m.set("keys", json!({"b": {}}));
        assert_eq!(m.get_one("keys"), Some(&json!({"b": {}})));
    }
}
