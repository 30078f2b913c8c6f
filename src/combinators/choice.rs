//! Closed value sets: string enums and single literals.

use serde_json::Value as Json;

use super::impl_as_node;
use crate::engine::Constraint;
use crate::error::SchemaError;
use crate::hint;
use crate::node::{SchemaNode, Structure, TypeTag};
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct EnumSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct LiteralSchema {
    node: SchemaNode,
}

impl_as_node!(EnumSchema, LiteralSchema);

/// One of a fixed, non-empty list of strings.
pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Result<EnumSchema, SchemaError> {
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return Err(SchemaError::EmptyEnum);
    }
    let constraint = Constraint::valid(values.iter().map(|v| Value::from(v.as_str())).collect());
    let mut node = SchemaNode::new(TypeTag::Enum, hint::enumeration(&values), constraint);
    node.manifest_mut().set("enum", Json::Array(values.iter().cloned().map(Json::String).collect()));
    Ok(EnumSchema { node: node.with_structure(Structure::Enum(values)) })
}

impl EnumSchema {
    /// Members in declaration order.
    pub fn options(&self) -> &[String] {
        match self.node.structure() {
            Structure::Enum(values) => values,
            _ => &[],
        }
    }

    /// A new enum limited to `keep`. Unknown members are an error, as is an
    /// empty result.
    pub fn extract(&self, keep: &[&str]) -> Result<EnumSchema, SchemaError> {
        if let Some(missing) = keep.iter().find(|k| !self.options().iter().any(|o| o == *k)) {
            return Err(SchemaError::UnknownKey(missing.to_string()));
        }
        enumeration(self.options().iter().filter(|o| keep.contains(&o.as_str())).cloned())
    }

    /// A new enum without `drop`.
    pub fn exclude(&self, drop: &[&str]) -> Result<EnumSchema, SchemaError> {
        if let Some(missing) = drop.iter().find(|k| !self.options().iter().any(|o| o == *k)) {
            return Err(SchemaError::UnknownKey(missing.to_string()));
        }
        enumeration(self.options().iter().filter(|o| !drop.contains(&o.as_str())).cloned())
    }
}

/// Exactly `value`. Big integers compare by value.
pub fn literal(value: impl Into<Value>) -> LiteralSchema {
    let value = value.into();
    let mut node = SchemaNode::new(TypeTag::Literal, hint::literal(&value), Constraint::valid(vec![value.clone()]));
    node.manifest_mut().set("const", value.to_json());
    LiteralSchema { node: node.with_structure(Structure::Literal(value)) }
}

impl LiteralSchema {
    pub fn value(&self) -> &Value {
        match self.node.structure() {
            Structure::Literal(value) => value,
            _ => &Value::Undefined,
        }
    }
}
