//! Object schemas.
//!
//! The key → node shape is kept on the node so that shape-deriving methods
//! (`partial`, `pick`, `extend`, ...) can rebuild the constraint. Mode
//! switches (`strict`, `strip`, `passthrough`, `catchall`) keep the node's
//! rules, label and manifest; shape-deriving methods start a fresh node that
//! only inherits the manifest.

use indexmap::IndexMap;
use serde_json::Value as Json;

use super::choice::{EnumSchema, enumeration};
use super::impl_as_node;
use super::wrappers::{optional, required};
use crate::engine::{Constraint, Kind, ObjectDef, Pattern, UnknownKeys};
use crate::error::SchemaError;
use crate::hint;
use crate::node::{AsNode, ObjectShape, SchemaNode, Structure, TypeTag};

#[derive(Clone, Debug)]
pub struct ObjectSchema {
    node: SchemaNode,
}

impl_as_node!(ObjectSchema);

pub fn object<K: Into<String>>(shape: impl IntoIterator<Item = (K, SchemaNode)>) -> ObjectSchema {
    let keys = shape.into_iter().map(|(key, node)| (key.into(), node)).collect();
    ObjectSchema::fresh(None).rebuild(ObjectShape { keys, ..ObjectShape::default() })
}

impl ObjectSchema {
    fn fresh(from: Option<&SchemaNode>) -> ObjectSchema {
        let mut node = SchemaNode::new(TypeTag::Object, "{}", Constraint::object(IndexMap::new()));
        if let Some(from) = from {
            node.manifest_mut().extend(from.manifest());
        }
        ObjectSchema { node }
    }

    /// View an object-shaped node as an object schema.
    pub fn from_node(node: SchemaNode) -> Option<ObjectSchema> {
        match node.structure() {
            Structure::Object(_) => Some(ObjectSchema { node }),
            _ => None,
        }
    }

    fn current(&self) -> ObjectShape {
        self.node.shape().cloned().unwrap_or_default()
    }

    pub fn shape(&self) -> IndexMap<String, SchemaNode> {
        self.current().keys
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.current().unknown
    }

    fn rebuild(mut self, shape: ObjectShape) -> ObjectSchema {
        let entries: Vec<(String, String, bool)> = shape
            .keys
            .iter()
            .map(|(key, node)| (key.clone(), node.hint().to_string(), node.accepts_undefined()))
            .collect();
        let catchall_hint = shape.catchall.as_ref().map(|c| c.hint().to_string());
        self.node.set_hint(hint::object(&entries, catchall_hint.as_deref()));

        *self.node.constraint_mut().kind_mut() = Kind::Object(ObjectDef {
            keys: shape.keys.iter().map(|(k, n)| (k.clone(), n.embed())).collect(),
            unknown: if shape.catchall.is_some() { UnknownKeys::Passthrough } else { shape.unknown },
            pattern: shape
                .catchall
                .as_ref()
                .map(|c| Pattern { key: None, value: Box::new(c.embed()) }),
        });

        let described: serde_json::Map<String, Json> =
            shape.keys.iter().map(|(k, n)| (k.clone(), n.manifest().to_json())).collect();
        self.node.manifest_mut().set("keys", Json::Object(described));
        if let Some(catchall) = &shape.catchall {
            self.node.manifest_mut().set("values", catchall.manifest().to_json());
        }
        self.node.set_structure(Structure::Object(shape));
        self
    }

    fn derive(&self, shape: ObjectShape) -> ObjectSchema {
        ObjectSchema::fresh(Some(&self.node)).rebuild(shape)
    }

    // ——— unknown-key modes ———

    fn with_mode(self, unknown: UnknownKeys) -> ObjectSchema {
        let mut shape = self.current();
        shape.unknown = unknown;
        self.rebuild(shape)
    }

    /// Reject keys outside the shape.
    pub fn strict(self) -> ObjectSchema {
        self.with_mode(UnknownKeys::Strict)
    }

    /// Drop keys outside the shape (the default).
    pub fn strip(self) -> ObjectSchema {
        self.with_mode(UnknownKeys::Strip)
    }

    /// Keep keys outside the shape unvalidated.
    pub fn passthrough(self) -> ObjectSchema {
        self.with_mode(UnknownKeys::Passthrough)
    }

    /// Validate keys outside the shape against `schema`. Takes precedence over
    /// any unknown-key mode, set before or after.
    pub fn catchall(self, schema: impl AsNode) -> ObjectSchema {
        let mut shape = self.current();
        shape.catchall = Some(Box::new(schema.into_node()));
        self.rebuild(shape)
    }

    // ——— shape derivation ———

    /// Every key optional, one level deep.
    pub fn partial(&self) -> ObjectSchema {
        let mut shape = self.current();
        for node in shape.keys.values_mut() {
            *node = optional(node.clone()).into_node();
        }
        self.derive(shape)
    }

    /// The listed keys optional, one level deep.
    pub fn partial_keys(&self, keys: &[&str]) -> Result<ObjectSchema, SchemaError> {
        let mut shape = self.current();
        for key in keys {
            let node = shape
                .keys
                .get_mut(*key)
                .ok_or_else(|| SchemaError::UnknownKey(key.to_string()))?;
            *node = optional(node.clone()).into_node();
        }
        Ok(self.derive(shape))
    }

    /// Like [`ObjectSchema::partial`], recursing into keys that are object
    /// schemas themselves. Other composites only become optional.
    pub fn deep_partial(&self) -> ObjectSchema {
        let mut shape = self.current();
        for node in shape.keys.values_mut() {
            let inner = match ObjectSchema::from_node(node.clone()) {
                Some(nested) => nested.deep_partial().into_node(),
                None => node.clone(),
            };
            *node = optional(inner).into_node();
        }
        self.derive(shape)
    }

    /// Every key required. For the whole object, call
    /// [`Compose::required`](crate::node::Compose::required) explicitly.
    pub fn required(self) -> ObjectSchema {
        let mut shape = self.current();
        for node in shape.keys.values_mut() {
            *node = required(node.clone()).into_node();
        }
        self.derive(shape)
    }

    /// Add or replace keys.
    pub fn extend<K: Into<String>>(&self, keys: impl IntoIterator<Item = (K, SchemaNode)>) -> ObjectSchema {
        let mut shape = self.current();
        for (key, node) in keys {
            shape.keys.insert(key.into(), node);
        }
        self.derive(shape)
    }

    /// Keys of both, `other` winning on conflicts; `other`'s unknown-key
    /// handling is kept.
    pub fn merge(&self, other: &ObjectSchema) -> ObjectSchema {
        let mut shape = self.current();
        let theirs = other.current();
        for (key, node) in theirs.keys {
            shape.keys.insert(key, node);
        }
        shape.unknown = theirs.unknown;
        shape.catchall = theirs.catchall;
        self.derive(shape)
    }

    pub fn pick(&self, keys: &[&str]) -> Result<ObjectSchema, SchemaError> {
        let mut shape = self.current();
        let mut picked = IndexMap::new();
        for key in keys {
            let node = shape
                .keys
                .shift_remove(*key)
                .ok_or_else(|| SchemaError::UnknownKey(key.to_string()))?;
            picked.insert(key.to_string(), node);
        }
        shape.keys = picked;
        Ok(self.derive(shape))
    }

    pub fn omit(&self, keys: &[&str]) -> Result<ObjectSchema, SchemaError> {
        let mut shape = self.current();
        for key in keys {
            shape
                .keys
                .shift_remove(*key)
                .ok_or_else(|| SchemaError::UnknownKey(key.to_string()))?;
        }
        Ok(self.derive(shape))
    }

    /// Enum of the shape's keys.
    pub fn keyof(&self) -> Result<EnumSchema, SchemaError> {
        enumeration(self.current().keys.keys().cloned())
    }
}
