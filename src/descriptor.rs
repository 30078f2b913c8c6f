//! Declarative schemas: a JSON document describing a schema tree, compiled
//! into the equivalent [`SchemaNode`].
//!
//! ```json
//! {
//!   "type": "object",
//!   "unknown": "strict",
//!   "keys": {
//!     "name": {"type": "string", "min": 1},
//!     "tags": {"type": "array", "element": {"type": "string"}, "optional": true}
//!   }
//! }
//! ```
//!
//! Every descriptor also takes the presence and annotation fields of
//! [`Descriptor`] (`optional`, `nullable`, `default`, `label`, ...).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

use crate::combinators::{
    ObjectSchema, any, array, bigint, boolean, date, discriminated_union, enumeration,
    intersection, literal, map, never, null, number, object, record, record_with_key, set,
    string, tuple, union, unknown,
};
use crate::config::PreferencesPatch;
use crate::error::SchemaError;
use crate::node::{AsNode, Compose, Describe, SchemaNode};
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(flatten)]
    pub kind: DescriptorKind,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Json>,
    /// Issue code → message template, local to this node.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub messages: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefs: Option<PreferencesPatch>,
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DescriptorKind {
    #[serde(rename_all = "camelCase")]
    String {
        min: Option<usize>,
        max: Option<usize>,
        length: Option<usize>,
        pattern: Option<String>,
        format: Option<StringFormat>,
        #[serde(default)]
        trim: bool,
    },
    #[serde(rename_all = "camelCase")]
    Number {
        min: Option<f64>,
        max: Option<f64>,
        gt: Option<f64>,
        lt: Option<f64>,
        #[serde(default)]
        integer: bool,
        multiple_of: Option<f64>,
    },
    Bigint,
    Boolean,
    Date {
        min: Option<DateTime<Utc>>,
        max: Option<DateTime<Utc>>,
    },
    Null,
    Any,
    Unknown,
    Never,
    Literal {
        value: Json,
    },
    Enum {
        values: Vec<String>,
    },
    Array {
        element: Box<Descriptor>,
        min: Option<usize>,
        max: Option<usize>,
        length: Option<usize>,
    },
    Tuple {
        items: Vec<Descriptor>,
        rest: Option<Box<Descriptor>>,
    },
    Object {
        #[serde(default)]
        keys: IndexMap<String, Descriptor>,
        #[serde(default)]
        unknown: UnknownMode,
        catchall: Option<Box<Descriptor>>,
    },
    Record {
        key: Option<Box<Descriptor>>,
        value: Box<Descriptor>,
    },
    Map {
        key: Box<Descriptor>,
        value: Box<Descriptor>,
    },
    Set {
        element: Box<Descriptor>,
        min: Option<usize>,
        max: Option<usize>,
    },
    Union {
        options: Vec<Descriptor>,
    },
    Intersection {
        parts: Vec<Descriptor>,
    },
    #[serde(rename_all = "camelCase")]
    DiscriminatedUnion {
        discriminator: String,
        options: Vec<Descriptor>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    Email,
    Url,
    Uuid,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownMode {
    #[default]
    Strip,
    Strict,
    Passthrough,
}

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("at JSON path {path} → {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("at {path}: {source}")]
    Schema {
        path: String,
        #[source]
        source: SchemaError,
    },
    #[error("at {path}: discriminated union options must be objects")]
    NotAnObject { path: String },
}

// ————————————————————————————————————————————————————————————————————————————
// LOADING
// ————————————————————————————————————————————————————————————————————————————

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DescriptorError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize(de).map_err(|err| DescriptorError::Json {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DescriptorError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(de).map_err(|err| DescriptorError::Json {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

impl std::str::FromStr for Descriptor {
    type Err = DescriptorError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        from_str_with_path(src)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COMPILATION
// ————————————————————————————————————————————————————————————————————————————

impl Descriptor {
    /// Build the schema this descriptor describes.
    pub fn compile(&self) -> Result<SchemaNode, DescriptorError> {
        self.compile_at(".")
    }

    fn compile_at(&self, path: &str) -> Result<SchemaNode, DescriptorError> {
        let mut node = self.kind.compile_at(path)?;

        if let Some(title) = &self.title {
            node = node.title(title.as_str());
        }
        if let Some(description) = &self.description {
            node = node.description(description.as_str());
        }
        for example in &self.examples {
            node = node.examples(Value::from(example.clone()));
        }
        if let Some(label) = &self.label {
            node = node.label(label.as_str());
        }
        for (code, template) in &self.messages {
            node = node.message(code.as_str(), template.as_str());
        }
        if let Some(prefs) = &self.prefs {
            node = Compose::prefs(node, prefs.clone());
        }
        if self.readonly {
            node = node.readonly().into_node();
        }
        if self.nullable {
            node = node.nullable().into_node();
        }
        if self.optional {
            node = node.optional().into_node();
        }
        if let Some(default) = &self.default {
            node = node.default(Value::from(default.clone())).into_node();
        }
        Ok(node)
    }
}

fn child(path: &str, segment: impl std::fmt::Display) -> String {
    if path == "." { format!(".{segment}") } else { format!("{path}.{segment}") }
}

impl DescriptorKind {
    fn compile_at(&self, path: &str) -> Result<SchemaNode, DescriptorError> {
        let schema_error = |source| DescriptorError::Schema { path: path.to_string(), source };
        let compile_all = |items: &[Descriptor], field: &str| -> Result<Vec<SchemaNode>, DescriptorError> {
            items
                .iter()
                .enumerate()
                .map(|(i, d)| d.compile_at(&child(path, format!("{field}[{i}]"))))
                .collect()
        };

        let node = match self {
            DescriptorKind::String { min, max, length, pattern, format, trim } => {
                let mut s = string();
                if let Some(n) = min {
                    s = s.min(*n);
                }
                if let Some(n) = max {
                    s = s.max(*n);
                }
                if let Some(n) = length {
                    s = s.length(*n);
                }
                if let Some(pattern) = pattern {
                    s = s.regex(pattern).map_err(schema_error)?;
                }
                s = match format {
                    Some(StringFormat::Email) => s.email(),
                    Some(StringFormat::Url) => s.url(),
                    Some(StringFormat::Uuid) => s.uuid(),
                    None => s,
                };
                if *trim {
                    s = s.trim();
                }
                s.into_node()
            }
            DescriptorKind::Number { min, max, gt, lt, integer, multiple_of } => {
                let mut n = number();
                if let Some(limit) = min {
                    n = n.min(*limit);
                }
                if let Some(limit) = max {
                    n = n.max(*limit);
                }
                if let Some(limit) = gt {
                    n = n.gt(*limit);
                }
                if let Some(limit) = lt {
                    n = n.lt(*limit);
                }
                if *integer {
                    n = n.int();
                }
                if let Some(base) = multiple_of {
                    n = n.multiple_of(*base);
                }
                n.into_node()
            }
            DescriptorKind::Bigint => bigint().into_node(),
            DescriptorKind::Boolean => boolean().into_node(),
            DescriptorKind::Date { min, max } => {
                let mut d = date();
                if let Some(limit) = min {
                    d = d.min(*limit);
                }
                if let Some(limit) = max {
                    d = d.max(*limit);
                }
                d.into_node()
            }
            DescriptorKind::Null => null().into_node(),
            DescriptorKind::Any => any().into_node(),
            DescriptorKind::Unknown => unknown().into_node(),
            DescriptorKind::Never => never().into_node(),
            DescriptorKind::Literal { value } => literal(Value::from(value.clone())).into_node(),
            DescriptorKind::Enum { values } => {
                enumeration(values.iter().cloned()).map_err(schema_error)?.into_node()
            }
            DescriptorKind::Array { element, min, max, length } => {
                let mut a = array(element.compile_at(&child(path, "element"))?);
                if let Some(n) = min {
                    a = a.min(*n);
                }
                if let Some(n) = max {
                    a = a.max(*n);
                }
                match length {
                    Some(n) => a.length(*n).into_node(),
                    None => a.into_node(),
                }
            }
            DescriptorKind::Tuple { items, rest } => {
                let t = tuple(compile_all(items, "items")?);
                match rest {
                    Some(rest) => t.rest(rest.compile_at(&child(path, "rest"))?).into_node(),
                    None => t.into_node(),
                }
            }
            DescriptorKind::Object { keys, unknown, catchall } => {
                let shape = keys
                    .iter()
                    .map(|(key, d)| Ok((key.clone(), d.compile_at(&child(path, format!("keys.{key}")))?)))
                    .collect::<Result<Vec<_>, DescriptorError>>()?;
                let o = match unknown {
                    UnknownMode::Strip => object(shape).strip(),
                    UnknownMode::Strict => object(shape).strict(),
                    UnknownMode::Passthrough => object(shape).passthrough(),
                };
                match catchall {
                    Some(c) => o.catchall(c.compile_at(&child(path, "catchall"))?).into_node(),
                    None => o.into_node(),
                }
            }
            DescriptorKind::Record { key, value } => {
                let value = value.compile_at(&child(path, "value"))?;
                match key {
                    Some(key) => record_with_key(key.compile_at(&child(path, "key"))?, value).into_node(),
                    None => record(value).into_node(),
                }
            }
            DescriptorKind::Map { key, value } => map(
                key.compile_at(&child(path, "key"))?,
                value.compile_at(&child(path, "value"))?,
            )
            .into_node(),
            DescriptorKind::Set { element, min, max } => {
                let mut s = set(element.compile_at(&child(path, "element"))?);
                if let Some(n) = min {
                    s = s.min(*n);
                }
                if let Some(n) = max {
                    s = s.max(*n);
                }
                s.into_node()
            }
            DescriptorKind::Union { options } => union(compile_all(options, "options")?).into_node(),
            DescriptorKind::Intersection { parts } => {
                intersection(compile_all(parts, "parts")?).into_node()
            }
            DescriptorKind::DiscriminatedUnion { discriminator, options } => {
                let objects = compile_all(options, "options")?
                    .into_iter()
                    .enumerate()
                    .map(|(i, node)| {
                        ObjectSchema::from_node(node).ok_or_else(|| DescriptorError::NotAnObject {
                            path: child(path, format!("options[{i}]")),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                discriminated_union(discriminator.as_str(), objects).map_err(schema_error)?.into_node()
            }
        };
        Ok(node)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Validate;
    use crate::value;

    fn compile(src: &str) -> SchemaNode {
        match src.parse::<Descriptor>().and_then(|d| d.compile()) {
            Ok(node) => node,
            Err(err) => panic!("{err}"),
        }
    }

    #[test]
    fn object_descriptor() {
        let person = compile(
            r#"{
                "type": "object",
                "unknown": "strict",
                "keys": {
                    "name": {"type": "string", "min": 1, "label": "Name"},
                    "age": {"type": "number", "integer": true, "optional": true},
                    "tags": {"type": "array", "element": {"type": "string"}, "default": []}
                }
            }"#,
        );
        assert_eq!(person.hint(), "{ name: string; age?: number; tags?: string[] }");
        assert_eq!(person.parse(&value!({"name": "x"})).ok(), Some(value!({"name": "x", "tags": []})));
        let err = person.parse(&value!({"name": "", "extra": 1})).err();
        assert_eq!(err.as_ref().map(|e| e.codes()), Some(vec!["string.min", "object.unknown"]));
    }

    #[test]
    fn nested_unions_and_literals() {
        let shape = compile(
            r#"{
                "type": "discriminatedUnion",
                "discriminator": "kind",
                "options": [
                    {"type": "object", "keys": {"kind": {"type": "literal", "value": "a"}}},
                    {"type": "object", "keys": {
                        "kind": {"type": "literal", "value": "b"},
                        "n": {"type": "union", "options": [{"type": "number"}, {"type": "null"}]}
                    }}
                ]
            }"#,
        );
        assert!(shape.is_valid(&value!({"kind": "b", "n": null})));
        assert!(!shape.is_valid(&value!({"kind": "c"})));
    }

    #[test]
    fn json_errors_carry_the_path() {
        let err = r#"{"type": "object", "keys": {"a": {"type": "strin"}}}"#.parse::<Descriptor>().err();
        let text = err.map(|e| e.to_string()).unwrap_or_default();
        assert!(text.starts_with("at JSON path"), "{text}");
        assert!(text.contains("strin"), "{text}");

        let err = r#"{"type": "string", "optional": "yes"}"#.parse::<Descriptor>().err();
        let text = err.map(|e| e.to_string()).unwrap_or_default();
        assert!(text.starts_with("at JSON path optional"), "{text}");
    }

    #[test]
    fn schema_errors_carry_the_path() {
        let d: Result<Descriptor, _> = r#"{"type": "array", "element": {"type": "enum", "values": []}}"#.parse();
        let err = d.and_then(|d| d.compile()).err();
        assert!(matches!(
            err,
            Some(DescriptorError::Schema { ref path, source: SchemaError::EmptyEnum }) if path == ".element"
        ));

        let d: Result<Descriptor, _> = r#"{"type": "discriminatedUnion", "discriminator": "k",
            "options": [{"type": "string"}, {"type": "string"}]}"#
            .parse();
        let err = d.and_then(|d| d.compile()).err();
        assert!(matches!(err, Some(DescriptorError::NotAnObject { .. })));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let s = compile(r#"{"type": "string", "nonEnumerables": true}"#);
        assert!(s.is_valid(&value!("x")));
    }

    #[test]
    fn annotations_land_in_the_manifest() {
        let s = compile(r#"{"type": "string", "title": "Name", "examples": ["ann"], "readonly": true}"#);
        assert_eq!(s.hint(), "Readonly<string>");
        assert_eq!(s.manifest().get_one("title"), Some(&serde_json::json!("Name")));
        assert_eq!(s.manifest().get_one("examples"), Some(&serde_json::json!([{"value": "ann"}])));
    }
}
