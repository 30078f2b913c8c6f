use super::impl_as_node;
use crate::engine::{Constraint, Match, Presence};
use crate::hint;
use crate::node::{SchemaNode, Structure, TypeTag};

/// Accepts a value when at least one option does; the first accepting option
/// produces the output.
#[derive(Clone, Debug)]
pub struct UnionSchema {
    node: SchemaNode,
}

/// Accepts a value when every part does; the parts' outputs are merged.
#[derive(Clone, Debug)]
pub struct IntersectionSchema {
    node: SchemaNode,
}

impl_as_node!(UnionSchema, IntersectionSchema);

pub fn union(options: Vec<SchemaNode>) -> UnionSchema {
    let hints: Vec<&str> = options.iter().map(SchemaNode::hint).collect();
    let hint = hint::union(&hints);
    let mut constraint = Constraint::join(options.iter().map(SchemaNode::embed).collect(), Match::Any);
    if options.iter().any(SchemaNode::accepts_undefined) {
        constraint = constraint.presence(Presence::Optional);
    }
    let node = SchemaNode::new(TypeTag::Union, hint, constraint)
        .with_structure(Structure::Options(options));
    UnionSchema { node }
}

pub fn intersection(parts: Vec<SchemaNode>) -> IntersectionSchema {
    let hints: Vec<&str> = parts.iter().map(SchemaNode::hint).collect();
    let hint = hint::intersection(&hints);
    let mut constraint = Constraint::join(parts.iter().map(SchemaNode::embed).collect(), Match::All);
    if !parts.is_empty() && parts.iter().all(SchemaNode::accepts_undefined) {
        constraint = constraint.presence(Presence::Optional);
    }
    let node = SchemaNode::new(TypeTag::Intersection, hint, constraint)
        .with_structure(Structure::Options(parts));
    IntersectionSchema { node }
}

fn options_of(node: &SchemaNode) -> &[SchemaNode] {
    match node.structure() {
        Structure::Options(options) => options,
        _ => &[],
    }
}

impl UnionSchema {
    pub fn options(&self) -> &[SchemaNode] {
        options_of(&self.node)
    }
}

impl IntersectionSchema {
    pub fn parts(&self) -> &[SchemaNode] {
        options_of(&self.node)
    }
}
