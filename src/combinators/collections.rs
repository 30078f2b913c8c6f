//! Key/value and element collections: `record`, `map`, `set`.
//!
//! `map` and `set` validate through the array machinery: a native `Map` is
//! lowered to an array of `[key, value]` pairs (a `Set` to an array of
//! elements) before the checks and raised back afterwards. Plain arrays of
//! the same shape are accepted and raised as well.

use serde_json::json;

use super::impl_as_node;
use super::primitives::{number, string, symbol};
use super::tuple::tuple;
use super::union::union;
use crate::engine::{Constraint, Kind, Mapper, ObjectDef, Pattern, Rule};
use crate::hint;
use crate::node::{AsNode, SchemaNode, Structure, TypeTag};
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct RecordSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct MapSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct SetSchema {
    node: SchemaNode,
}

impl_as_node!(RecordSchema, MapSchema, SetSchema);

fn record_parts(node: &SchemaNode) -> Option<(&SchemaNode, &SchemaNode)> {
    match node.structure() {
        Structure::Record { key, value } => Some((key, value)),
        _ => None,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RECORD
// ————————————————————————————————————————————————————————————————————————————

/// Object whose every entry matches `value`, keyed by any property key.
pub fn record(value: impl AsNode) -> RecordSchema {
    let key = union(vec![string().into_node(), number().into_node(), symbol().into_node()]);
    record_with_key(key, value)
}

/// Object whose keys match `key` and whose values match `value`.
pub fn record_with_key(key: impl AsNode, value: impl AsNode) -> RecordSchema {
    let (key, value) = (key.into_node(), value.into_node());
    let constraint = Constraint::build(Kind::Object(ObjectDef {
        pattern: Some(Pattern { key: Some(Box::new(key.embed())), value: Box::new(value.embed()) }),
        ..ObjectDef::default()
    }));
    let mut node = SchemaNode::new(TypeTag::Record, hint::record(key.hint(), value.hint()), constraint);
    node.manifest_mut().set("values", value.manifest().to_json());
    let structure = Structure::Record { key: Box::new(key), value: Box::new(value) };
    RecordSchema { node: node.with_structure(structure) }
}

impl RecordSchema {
    pub fn key_schema(&self) -> Option<&SchemaNode> {
        record_parts(&self.node).map(|(key, _)| key)
    }

    pub fn value_schema(&self) -> Option<&SchemaNode> {
        record_parts(&self.node).map(|(_, value)| value)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MAP
// ————————————————————————————————————————————————————————————————————————————

pub fn map(key: impl AsNode, value: impl AsNode) -> MapSchema {
    let (key, value) = (key.into_node(), value.into_node());
    let entry = tuple(vec![key.clone(), value.clone()]).into_node();
    let constraint = Constraint::array(entry.embed())
        .message("array.base", "{{#label}} must be a Map")
        .prepare(Mapper::new(lower_map))
        .finalize(Mapper::new(raise_map));
    let mut node = SchemaNode::new(TypeTag::Map, hint::map(key.hint(), value.hint()), constraint);
    node.manifest_mut().set("keys", key.manifest().to_json());
    node.manifest_mut().set("values", value.manifest().to_json());
    let structure = Structure::Record { key: Box::new(key), value: Box::new(value) };
    MapSchema { node: node.with_structure(structure) }
}

fn lower_map(value: Value) -> Value {
    match value.thaw() {
        Value::Map(entries) => {
            Value::Array(entries.into_iter().map(|(k, v)| Value::Array(vec![k, v])).collect())
        }
        other => other,
    }
}

fn raise_map(value: Value) -> Value {
    match value.thaw() {
        Value::Array(pairs) => Value::Map(
            pairs
                .into_iter()
                .map(|pair| match pair.thaw() {
                    Value::Array(mut kv) if kv.len() == 2 => {
                        let v = kv.pop().unwrap_or_default();
                        let k = kv.pop().unwrap_or_default();
                        (k, v)
                    }
                    other => (other, Value::Undefined),
                })
                .collect(),
        ),
        other => other,
    }
}

impl MapSchema {
    pub fn key_schema(&self) -> Option<&SchemaNode> {
        record_parts(&self.node).map(|(key, _)| key)
    }

    pub fn value_schema(&self) -> Option<&SchemaNode> {
        record_parts(&self.node).map(|(_, value)| value)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SET
// ————————————————————————————————————————————————————————————————————————————

pub fn set(element: impl AsNode) -> SetSchema {
    let element = element.into_node();
    let constraint = Constraint::array(element.embed())
        .message("array.base", "{{#label}} must be a Set")
        .prepare(Mapper::new(lower_set))
        .finalize(Mapper::new(raise_set));
    let mut node = SchemaNode::new(TypeTag::Set, hint::set(element.hint()), constraint);
    node.manifest_mut().set("element", element.manifest().to_json());
    SetSchema { node: node.with_structure(Structure::Array(Box::new(element))) }
}

/// Duplicates are dropped here, before the size rules count elements.
fn lower_set(value: Value) -> Value {
    match value.thaw() {
        Value::Set(xs) | Value::Array(xs) => Value::Array(distinct(xs)),
        other => other,
    }
}

/// Elements that became equal through conversion collapse again.
fn raise_set(value: Value) -> Value {
    match value.thaw() {
        Value::Array(xs) => Value::Set(distinct(xs)),
        other => other,
    }
}

/// Equal elements collapse to the first occurrence.
fn distinct(xs: Vec<Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(xs.len());
    for x in xs {
        if !unique.contains(&x) {
            unique.push(x);
        }
    }
    unique
}

impl SetSchema {
    fn rule(mut self, rule: Rule) -> Self {
        self.node.map_constraint(|c| c.rule(rule));
        self
    }

    pub fn element(&self) -> Option<&SchemaNode> {
        match self.node.structure() {
            Structure::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn min(mut self, limit: usize) -> Self {
        self.node.manifest_mut().update("minItems", json!(limit));
        self.rule(Rule::MinItems(limit))
    }

    pub fn max(mut self, limit: usize) -> Self {
        self.node.manifest_mut().update("maxItems", json!(limit));
        self.rule(Rule::MaxItems(limit))
    }

    pub fn size(mut self, n: usize) -> Self {
        self.node.manifest_mut().update("minItems", json!(n));
        self.node.manifest_mut().update("maxItems", json!(n));
        self.rule(Rule::Items(n))
    }

    pub fn nonempty(self) -> Self {
        self.min(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{enumeration, object};
    use crate::node::{Compose, Describe, Validate};
    use crate::value;

    #[test]
    fn record_validates_every_value() {
        let scores = record(number());
        assert_eq!(scores.hint(), "Record<string | number | symbol, number>");
        assert_eq!(scores.parse(&value!({"a": 1, "b": "2"})).ok(), Some(value!({"a": 1, "b": 2})));
        let err = scores.parse(&value!({"a": 1, "b": "x"})).err();
        let issue = err.as_ref().and_then(|e| e.first());
        assert_eq!(issue.map(|i| i.path_string()), Some("b".to_string()));
    }

    #[test]
    fn record_keys_can_be_constrained() {
        let Ok(keys) = enumeration(["en", "fr"]) else { panic!("non-empty") };
        let labels = record_with_key(keys, string());
        assert!(labels.is_valid(&value!({"en": "Hi"})));
        let err = labels.parse(&value!({"de": "Hallo"})).err();
        assert_eq!(err.as_ref().map(|e| e.codes()), Some(vec!["any.only"]));
    }

    #[test]
    fn map_round_trips_native_maps() {
        let ages = map(string(), number());
        let input = Value::Map(vec![(Value::from("ann"), Value::from("31"))]);
        let out = ages.parse(&input).ok();
        assert_eq!(out, Some(Value::Map(vec![(Value::from("ann"), Value::from(31))])));
        assert_eq!(ages.hint(), "Map<string, number>");
    }

    #[test]
    fn map_reports_entry_paths() {
        let ages = map(string(), number());
        let input = Value::Map(vec![(Value::from("ann"), Value::from(true))]);
        let err = ages.parse(&input).err();
        let issue = err.as_ref().and_then(|e| e.first());
        assert_eq!(issue.map(|i| i.path_string()), Some("[0][1]".to_string()));
        let err = ages.parse(&value!("nope")).err();
        assert_eq!(err.map(|e| e.message), Some("\"value\" must be a Map".to_string()));
    }

    #[test]
    fn map_accepts_entry_arrays() {
        let ages = map(string(), number());
        let out = ages.parse(&value!([["bob", 4]])).ok();
        assert_eq!(out, Some(Value::Map(vec![(Value::from("bob"), Value::from(4))])));
    }

    #[test]
    fn set_rules_and_dedup() {
        let ids = set(number()).min(2);
        assert_eq!(ids.hint(), "Set<number>");
        let out = ids.parse(&Value::Set(vec![Value::from(1), Value::from(2)])).ok();
        assert_eq!(out, Some(Value::Set(vec![Value::from(1), Value::from(2)])));
        let err = ids.parse(&Value::Set(vec![Value::from(1)])).err();
        assert_eq!(err.as_ref().map(|e| e.codes()), Some(vec!["array.min"]));
        let collapsed = set(number()).parse(&value!([1, 1, 2])).ok();
        assert_eq!(collapsed, Some(Value::Set(vec![Value::from(1), Value::from(2)])));
        assert!(!set(number()).size(1).is_valid(&value!([1, 2])));
        assert!(!set(number()).nonempty().is_valid(&value!([])));
    }

    #[test]
    fn set_size_counts_distinct_elements() {
        let pair = set(number()).size(2);
        let err = pair.parse(&value!([1, 1])).err();
        assert_eq!(err.as_ref().map(|e| e.codes()), Some(vec!["array.length"]));
        assert!(!set(number()).min(2).is_valid(&Value::Set(vec![Value::from(3), Value::from(3)])));
        assert!(pair.is_valid(&value!([1, 2, 2])));
    }

    #[test]
    fn nested_in_objects() {
        let user = object([("roles", set(string()).optional().into_node())]);
        let out = user.parse(&value!({"roles": ["a"]})).ok();
        assert_eq!(out, Some(crate::value::Value::Object(
            [("roles".to_string(), Value::Set(vec![Value::from("a")]))].into_iter().collect()
        )));
        assert!(user.is_valid(&value!({})));
        assert_eq!(set(string().title("Role")).manifest().get_one("element"), Some(&json!({"title": "Role"})));
    }
}
