//! Presence and nullability wrappers, and defaults.
//!
//! Each wrapper copies the source node's manifest and hooks and adjusts the
//! constraint's accepted set.

use serde_json::Value as Json;

use super::impl_as_node;
use crate::engine::{Constraint, DefaultValue, Presence, Verdict};
use crate::hint;
use crate::node::{AsNode, SchemaNode, TypeTag};
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct OptionalSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct NullableSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct RequiredSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct NonNullableSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct DefaultSchema {
    node: SchemaNode,
}

impl_as_node!(OptionalSchema, NullableSchema, RequiredSchema, NonNullableSchema, DefaultSchema);

/// Also accept `undefined`. A source that accepts nothing but `undefined` is
/// returned unchanged.
pub fn optional(schema: impl AsNode) -> OptionalSchema {
    let source = schema.into_node();
    if source.constraint().current_presence() == Presence::Forbidden {
        return OptionalSchema { node: source };
    }
    let mut node = source.wrap(TypeTag::Optional, hint::optional(source.hint()));
    node.map_constraint(|c| c.presence(Presence::Optional));
    OptionalSchema { node }
}

/// Also accept `null`.
pub fn nullable(schema: impl AsNode) -> NullableSchema {
    let source = schema.into_node();
    let mut node = source.wrap(TypeTag::Nullable, hint::nullable(source.hint()));
    node.map_constraint(|c| c.allow(Value::Null));
    NullableSchema { node }
}

/// `nullable` first, then `optional`: the hint reads `T | null | undefined`.
pub fn nullish(schema: impl AsNode) -> OptionalSchema {
    optional(nullable(schema))
}

/// Reject `undefined`, dropping any default.
pub fn required(schema: impl AsNode) -> RequiredSchema {
    let source = schema.into_node();
    let mut node = source.wrap(TypeTag::Required, hint::strip_arm(source.hint(), "undefined"));
    node.map_constraint(require);
    RequiredSchema { node }
}

/// Reject both `undefined` and `null`.
pub fn nonnullable(schema: impl AsNode) -> NonNullableSchema {
    let source = schema.into_node();
    let stripped = hint::strip_arm(&hint::strip_arm(source.hint(), "undefined"), "null");
    let mut node = source.wrap(TypeTag::NonNullable, stripped);
    node.map_constraint(|c| require(c).disallow(Value::Null));
    NonNullableSchema { node }
}

fn require(constraint: Constraint) -> Constraint {
    match constraint.current_presence() {
        // only `undefined` was acceptable, so nothing is left
        Presence::Forbidden => Constraint::custom_kind("never", |_, _| Verdict::reject("never.base")),
        _ => constraint.presence(Presence::Required).without_default(),
    }
}

/// Substitute `default` for `undefined` inside the engine, then validate it
/// like any other input.
pub fn default(schema: impl AsNode, default: DefaultValue) -> DefaultSchema {
    let source = schema.into_node();
    let mut node = source.wrap(TypeTag::Default, hint::strip_arm(source.hint(), "undefined"));
    if let DefaultValue::Fixed(value) = &default {
        node.manifest_mut().update("default", value.to_json());
    } else {
        node.manifest_mut().update("default", Json::Null);
    }
    node.map_constraint(|c| c.default_value(default));
    DefaultSchema { node }
}

macro_rules! unwrap_methods {
    ($($ty:ty),+) => {$(
        impl $ty {
            /// The schema this wrapper was built from.
            pub fn unwrap(self) -> SchemaNode {
                self.node.into_inner()
            }
        }
    )+};
}

unwrap_methods!(OptionalSchema, NullableSchema, RequiredSchema, NonNullableSchema);

impl DefaultSchema {
    pub fn remove_default(self) -> SchemaNode {
        self.node.into_inner()
    }
}
