//! Object unions dispatched on one literal-valued key.

use indexmap::IndexMap;

use super::impl_as_node;
use super::object::ObjectSchema;
use crate::engine::Constraint;
use crate::error::SchemaError;
use crate::hint;
use crate::node::{AsNode, SchemaNode, Structure, TypeTag};
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct DiscriminatedUnionSchema {
    node: SchemaNode,
    key: String,
}

impl_as_node!(DiscriminatedUnionSchema);

/// Values the option accepts for the discriminator key.
fn discriminator_values(option: &ObjectSchema, key: &str) -> Option<Vec<Value>> {
    let shape = option.shape();
    match shape.get(key)?.structure() {
        Structure::Literal(value) => Some(vec![value.clone()]),
        Structure::Enum(values) => Some(values.iter().map(|v| Value::from(v.as_str())).collect()),
        _ => None,
    }
}

/// Dispatch on `key`: the input's value for `key` selects exactly one option,
/// which then validates the whole input. Other options are never tried.
pub fn discriminated_union(
    key: impl Into<String>,
    options: Vec<ObjectSchema>,
) -> Result<DiscriminatedUnionSchema, SchemaError> {
    let key = key.into();
    if options.len() < 2 {
        return Err(SchemaError::TooFewOptions { key, count: options.len() });
    }

    let mut cases: IndexMap<String, (Value, Constraint)> = IndexMap::new();
    for (index, option) in options.iter().enumerate() {
        let values = discriminator_values(option, &key)
            .ok_or_else(|| SchemaError::MissingDiscriminator { key: key.clone(), index })?;
        for value in values {
            let rendered = value.to_string();
            if cases.contains_key(&rendered) {
                return Err(SchemaError::DuplicateDiscriminator { key: key.clone(), value: rendered });
            }
            cases.insert(rendered, (value, option.node().embed()));
        }
    }

    let hints: Vec<&str> = options.iter().map(|o| o.node().hint()).collect();
    let hint = hint::union(&hints);
    let constraint = Constraint::switch(key.clone(), cases.into_values().collect());
    let nodes = options.into_iter().map(AsNode::into_node).collect();
    let node = SchemaNode::new(TypeTag::DiscriminatedUnion, hint, constraint)
        .with_structure(Structure::Options(nodes));
    tracing::trace!(%key, "built discriminated union");
    Ok(DiscriminatedUnionSchema { node, key })
}

impl DiscriminatedUnionSchema {
    pub fn discriminator(&self) -> &str {
        &self.key
    }

    pub fn options(&self) -> &[SchemaNode] {
        match self.node.structure() {
            Structure::Options(options) => options,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::combinators::{enumeration, literal, number, object, string};
    use crate::node::{Compose, Describe, Validate};
    use crate::value;

    fn circle() -> ObjectSchema {
        object([("kind", literal("circle").into_node()), ("radius", number().into_node())])
    }

    fn square() -> ObjectSchema {
        object([("kind", literal("square").into_node()), ("side", number().into_node())])
    }

    #[test]
    fn dispatches_to_the_matching_option_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let counted = square().refine(
            move |_| {
                seen.fetch_add(1, Ordering::Relaxed);
                true
            },
            "unreachable",
        );
        let Ok(shapes) = discriminated_union("kind", vec![circle(), counted]) else {
            panic!("valid options")
        };
        let out = shapes.parse(&value!({"kind": "circle", "radius": 2}));
        assert_eq!(out.ok(), Some(value!({"kind": "circle", "radius": 2})));
        let err = shapes.parse(&value!({"kind": "circle", "side": 2})).err();
        assert_eq!(err.as_ref().map(|e| e.codes()), Some(vec!["any.required"]));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn unknown_discriminator_is_reported_at_the_key() {
        let Ok(shapes) = discriminated_union("kind", vec![circle(), square()]) else {
            panic!("valid options")
        };
        let err = shapes.parse(&value!({"kind": "hexagon"})).err();
        let issue = err.as_ref().and_then(|e| e.first());
        assert_eq!(issue.map(|i| i.code.as_str()), Some("alternatives.discriminator"));
        assert_eq!(issue.map(|i| i.path_string()), Some("kind".to_string()));
        assert!(!shapes.is_valid(&value!("circle")));
        assert_eq!(
            shapes.hint(),
            "{ kind: \"circle\"; radius: number } | { kind: \"square\"; side: number }"
        );
    }

    #[test]
    fn enum_discriminators_cover_several_values() {
        let Ok(kinds) = enumeration(["a", "b"]) else { panic!("non-empty") };
        let ab = object([("kind", kinds.into_node()), ("x", string().into_node())]);
        let c = object([("kind", literal("c").into_node())]);
        let Ok(u) = discriminated_union("kind", vec![ab, c]) else { panic!("valid options") };
        assert!(u.is_valid(&value!({"kind": "b", "x": "y"})));
        assert!(u.is_valid(&value!({"kind": "c"})));
    }

    #[test]
    fn configuration_errors() {
        assert!(matches!(
            discriminated_union("kind", vec![circle()]),
            Err(SchemaError::TooFewOptions { count: 1, .. })
        ));
        assert!(matches!(
            discriminated_union("kind", vec![circle(), object([("kind", string().into_node())])]),
            Err(SchemaError::MissingDiscriminator { index: 1, .. })
        ));
        assert!(matches!(
            discriminated_union("kind", vec![circle(), circle()]),
            Err(SchemaError::DuplicateDiscriminator { .. })
        ));
    }
}
