//! Homogeneous arrays.

use std::marker::PhantomData;

use serde_json::json;

use crate::engine::{Constraint, Rule, SortOrder};
use crate::hint;
use crate::node::{AsNode, SchemaNode, Structure, TypeTag};

/// Arity markers: what is statically known about an array's length.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyLength;
#[derive(Clone, Copy, Debug, Default)]
pub struct NonEmpty;
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedLength;

#[derive(Clone, Debug)]
pub struct ArraySchema<A = AnyLength> {
    node: SchemaNode,
    arity: PhantomData<A>,
}

impl<A> AsNode for ArraySchema<A> {
    fn node(&self) -> &SchemaNode {
        &self.node
    }
    fn node_mut(&mut self) -> &mut SchemaNode {
        &mut self.node
    }
    fn into_node(self) -> SchemaNode {
        self.node
    }
}

pub fn array(element: impl AsNode) -> ArraySchema {
    let element = element.into_node();
    let mut node = SchemaNode::new(
        TypeTag::Array,
        hint::array(element.hint()),
        Constraint::array(element.embed()),
    );
    node.manifest_mut().set("element", element.manifest().to_json());
    ArraySchema { node: node.with_structure(Structure::Array(Box::new(element))), arity: PhantomData }
}

impl<A> ArraySchema<A> {
    fn rule(mut self, rule: Rule) -> Self {
        self.node.map_constraint(|c| c.rule(rule));
        self
    }

    fn retag<B>(self) -> ArraySchema<B> {
        ArraySchema { node: self.node, arity: PhantomData }
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

    /// Exactly `n` elements. Returns a new schema since the arity changes.
    pub fn length(self, n: usize) -> ArraySchema<FixedLength> {
        let mut node = self.node.wrap(TypeTag::Array, self.node.hint());
        node.set_structure(self.node.structure().clone());
        node.manifest_mut().update("minItems", json!(n));
        node.manifest_mut().update("maxItems", json!(n));
        node.map_constraint(|c| c.rule(Rule::Items(n)));
        ArraySchema { node, arity: PhantomData }
    }

    /// At least one element. Returns a new schema since the arity changes.
    pub fn nonempty(self) -> ArraySchema<NonEmpty> {
        let element_hint = self.element().map(|e| e.hint().to_string()).unwrap_or_default();
        let mut node = self.node.wrap(TypeTag::Array, hint::nonempty(&element_hint));
        node.set_structure(self.node.structure().clone());
        node.manifest_mut().update("minItems", json!(1));
        node.map_constraint(|c| c.rule(Rule::MinItems(1)));
        ArraySchema { node, arity: PhantomData }
    }

    pub fn ascending(self) -> Self {
        self.rule(Rule::Sort(SortOrder::Ascending))
    }

    pub fn descending(self) -> Self {
        self.rule(Rule::Sort(SortOrder::Descending))
    }

    /// Forget the statically known arity.
    pub fn any_length(self) -> ArraySchema<AnyLength> {
        self.retag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{number, object, string};
    use crate::node::{Compose, Describe, Validate};
    use crate::value;

    #[test]
    fn min_scenarios() {
        let tags = array(string()).min(2);
        let err = tags.safe_parse(&value!(["a"]));
        assert_eq!(err.error().map(|e| e.codes()), Some(vec!["array.min"]));
        assert_eq!(tags.parse(&value!(["a", "b", "c"])).ok(), Some(value!(["a", "b", "c"])));
    }

    #[test]
    fn element_failures_carry_index_paths() {
        let err = array(number()).parse(&value!([1, "x", 3, true])).err();
        let paths: Vec<String> = err.map(|e| e.issues.iter().map(|i| i.path_string()).collect()).unwrap_or_default();
        assert_eq!(paths, ["[1]", "[3]"]);
    }

    #[test]
    fn length_and_nonempty_are_new_schemas() {
        let base = array(string());
        let fixed = base.clone().length(2);
        assert_ne!(fixed.node().id(), base.node().id());
        assert!(fixed.is_valid(&value!(["a", "b"])));
        assert_eq!(fixed.safe_parse(&value!(["a"])).error().map(|e| e.codes()), Some(vec!["array.length"]));
        assert!(base.is_valid(&value!(["a"])));

        let some = base.nonempty();
        assert_eq!(some.hint(), "[string, ...string[]]");
        assert!(!some.is_valid(&value!([])));
    }

    #[test]
    fn hints_bracket_compound_elements() {
        assert_eq!(array(string()).hint(), "string[]");
        assert_eq!(string().nullable().array().hint(), "Array<string | null>");
    }

    #[test]
    fn sort_order() {
        let asc = array(number()).ascending();
        assert!(asc.is_valid(&value!([1, 2, 3])));
        assert_eq!(asc.safe_parse(&value!([2, 1])).error().map(|e| e.codes()), Some(vec!["array.sort"]));
    }

    #[test]
    fn element_manifest_is_described() {
        let a = array(string().title("Tag"));
        assert_eq!(a.manifest().get_one("element"), Some(&json!({"title": "Tag"})));
    }

    #[test]
    fn nested_object_elements_strip_unknown_keys() {
        let rows = array(object([("id", number().into_node())]));
        let out = rows.parse(&value!([{"id": 1, "x": 2}]));
        assert_eq!(out.ok(), Some(value!([{"id": 1}])));
    }
}
