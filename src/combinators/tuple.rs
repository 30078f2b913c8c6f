use serde_json::Value as Json;

use super::impl_as_node;
use crate::engine::{ArrayDef, Constraint, Kind};
use crate::hint;
use crate::node::{AsNode, SchemaNode, Structure, TypeTag};

/// Fixed positional elements with an optional rest type.
#[derive(Clone, Debug)]
pub struct TupleSchema {
    node: SchemaNode,
}

impl_as_node!(TupleSchema);

pub fn tuple(items: Vec<SchemaNode>) -> TupleSchema {
    let node = SchemaNode::new(TypeTag::Tuple, "", Constraint::tuple(Vec::new(), None));
    TupleSchema { node }.rebuild(items, None)
}

impl TupleSchema {
    fn parts(&self) -> (Vec<SchemaNode>, Option<SchemaNode>) {
        match self.node.structure() {
            Structure::Tuple { items, rest } => (items.clone(), rest.as_deref().cloned()),
            _ => (Vec::new(), None),
        }
    }

    pub fn items(&self) -> Vec<SchemaNode> {
        self.parts().0
    }

    /// Validate every element past the positional ones against `rest`.
    pub fn rest(self, rest: impl AsNode) -> TupleSchema {
        let (items, _) = self.parts();
        self.rebuild(items, Some(rest.into_node()))
    }

    fn rebuild(mut self, items: Vec<SchemaNode>, rest: Option<SchemaNode>) -> TupleSchema {
        let hints: Vec<&str> = items.iter().map(SchemaNode::hint).collect();
        self.node.set_hint(hint::tuple(&hints, rest.as_ref().map(SchemaNode::hint)));
        *self.node.constraint_mut().kind_mut() = Kind::Array(ArrayDef {
            items: rest.as_ref().map(|r| Box::new(r.embed())),
            ordered: items.iter().map(SchemaNode::embed).collect(),
        });
        let elements: Vec<Json> = items.iter().map(|n| n.manifest().to_json()).collect();
        self.node.manifest_mut().set("elements", Json::Array(elements));
        self.node.set_structure(Structure::Tuple { items, rest: rest.map(Box::new) });
        self
    }
}
