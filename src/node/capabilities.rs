//! Public API of every schema, split by role.
//!
//! Each typed schema implements [`AsNode`]; [`Validate`], [`Describe`] and
//! [`Compose`] are then blanket-implemented over it, delegating to the
//! parser, the manifest and the combinators respectively.

use std::future::{Ready, ready};

use serde::de::DeserializeOwned;
use serde_json::{Value as Json, json};

use super::SchemaNode;
use crate::combinators::{
    self, ArraySchema, Brand, BrandedSchema, DefaultSchema, IntersectionSchema, NonNullableSchema,
    NullableSchema, OptionalSchema, PreprocessSchema, ReadonlySchema, RequiredSchema,
    TransformSchema, UnionSchema,
};
use crate::config::{ParseOptions, PreferencesPatch};
use crate::engine::{DefaultValue, Verdict};
use crate::error::{ParseAsError, ValidationError};
use crate::manifest::Manifest;
use crate::parser::{ParseResult, Parser};
use crate::value::Value;

pub trait AsNode: Sized {
    fn node(&self) -> &SchemaNode;
    fn node_mut(&mut self) -> &mut SchemaNode;
    fn into_node(self) -> SchemaNode;
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATE
// ————————————————————————————————————————————————————————————————————————————

pub trait Validate: AsNode {
    fn safe_parse(&self, input: &Value) -> ParseResult {
        self.safe_parse_with(input, &ParseOptions::default())
    }

    fn safe_parse_with(&self, input: &Value, options: &ParseOptions) -> ParseResult {
        Parser::new(self.node()).run(input, options)
    }

    /// The accepted value, or every issue as one error.
    fn parse(&self, input: &Value) -> Result<Value, ValidationError> {
        self.safe_parse(input).into_result()
    }

    fn parse_with(&self, input: &Value, options: &ParseOptions) -> Result<Value, ValidationError> {
        self.safe_parse_with(input, options).into_result()
    }

    /// Same algorithm as [`Validate::parse`], delivered as an already
    /// resolved future.
    fn parse_async(&self, input: &Value) -> Ready<Result<Value, ValidationError>> {
        ready(self.parse(input))
    }

    fn parse_async_with(
        &self,
        input: &Value,
        options: &ParseOptions,
    ) -> Ready<Result<Value, ValidationError>> {
        ready(self.parse_with(input, options))
    }

    fn is_valid(&self, input: &Value) -> bool {
        self.safe_parse(input).is_ok()
    }

    fn is_valid_with(&self, input: &Value, options: &ParseOptions) -> bool {
        self.safe_parse_with(input, options).is_ok()
    }

    /// Parse, then deserialize the accepted value into `T`.
    fn parse_as<T: DeserializeOwned>(&self, input: &Value) -> Result<T, ParseAsError> {
        let value = self.parse(input)?;
        serde_path_to_error::deserialize(value.to_json()).map_err(|err| ParseAsError::Shape {
            path: err.path().to_string(),
            source: err.into_inner(),
        })
    }
}

impl<T: AsNode> Validate for T {}

// ————————————————————————————————————————————————————————————————————————————
// DESCRIBE
// ————————————————————————————————————————————————————————————————————————————

pub trait Describe: AsNode {
    fn hint(&self) -> &str {
        self.node().hint()
    }

    fn manifest(&self) -> &Manifest {
        self.node().manifest()
    }

    /// Merge `value` into manifest key `key`.
    fn meta(mut self, key: &str, value: Json) -> Self {
        self.node_mut().manifest_mut().update(key, value);
        self
    }

    fn title(self, title: impl Into<String>) -> Self {
        self.meta("title", Json::String(title.into()))
    }

    fn summary(self, summary: impl Into<String>) -> Self {
        self.meta("summary", Json::String(summary.into()))
    }

    fn description(self, description: impl Into<String>) -> Self {
        self.meta("description", Json::String(description.into()))
    }

    fn examples(self, example: impl Into<Value>) -> Self {
        self.meta("examples", json!({"value": example.into().to_json()}))
    }

    fn tags(self, tag: impl Into<String>) -> Self {
        self.meta("tags", json!({"value": tag.into()}))
    }

    fn notes(self, note: impl Into<String>) -> Self {
        self.meta("notes", json!({"value": note.into()}))
    }

    fn unit(self, unit: impl Into<String>) -> Self {
        self.meta("unit", Json::String(unit.into()))
    }

    fn deprecated(self, deprecated: bool) -> Self {
        self.meta("deprecated", Json::Bool(deprecated))
    }
}

impl<T: AsNode> Describe for T {}

// ————————————————————————————————————————————————————————————————————————————
// COMPOSE
// ————————————————————————————————————————————————————————————————————————————

pub trait Compose: AsNode {
    fn optional(self) -> OptionalSchema {
        combinators::optional(self)
    }

    fn nullable(self) -> NullableSchema {
        combinators::nullable(self)
    }

    fn nullish(self) -> OptionalSchema {
        combinators::nullish(self)
    }

    fn required(self) -> RequiredSchema {
        combinators::required(self)
    }

    fn nonnullable(self) -> NonNullableSchema {
        combinators::nonnullable(self)
    }

    fn default(self, value: impl Into<Value>) -> DefaultSchema {
        combinators::default(self, DefaultValue::Fixed(value.into()))
    }

    fn default_with(self, supplier: impl Fn() -> Value + Send + Sync + 'static) -> DefaultSchema {
        combinators::default(self, DefaultValue::Supplier(std::sync::Arc::new(supplier)))
    }

    fn array(self) -> ArraySchema {
        combinators::array(self)
    }

    fn or(self, other: impl AsNode) -> UnionSchema {
        combinators::union(vec![self.into_node(), other.into_node()])
    }

    fn and(self, other: impl AsNode) -> IntersectionSchema {
        combinators::intersection(vec![self.into_node(), other.into_node()])
    }

    fn brand<B: Brand>(self) -> BrandedSchema<B> {
        combinators::brand::<B>(self)
    }

    fn readonly(self) -> ReadonlySchema {
        combinators::readonly(self)
    }

    fn readonly_deep(self) -> ReadonlySchema {
        combinators::readonly_deep(self)
    }

    fn transform(self, map: impl Fn(Value) -> Value + Send + Sync + 'static) -> TransformSchema {
        combinators::transform(self, map)
    }

    fn preprocess(self, map: impl Fn(Value) -> Value + Send + Sync + 'static) -> PreprocessSchema {
        combinators::preprocess(map, self)
    }

    /// Add a predicate; a `false` answer is reported as `any.custom` with
    /// `message` (which may use `{{#label}}` and `{{#value}}`).
    fn refine(
        mut self,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        self.node_mut().map_constraint(|c| {
            c.custom(move |value, _| {
                if check(value) {
                    Verdict::Pass
                } else {
                    Verdict::reject("any.custom").with_template(message.clone())
                }
            })
        });
        self
    }

    /// Name used for `{{#label}}` instead of the path.
    fn label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.node_mut().map_constraint(|c| c.label(label));
        self
    }

    /// Message template for one issue code raised by this node.
    fn message(mut self, code: impl Into<String>, template: impl Into<String>) -> Self {
        let (code, template) = (code.into(), template.into());
        self.node_mut().map_constraint(|c| c.message(code, template));
        self
    }

    /// Node-local preferences, layered between the process defaults and the
    /// call-site options.
    fn prefs(mut self, patch: PreferencesPatch) -> Self {
        let layered = self.node().prefs().layered(&patch);
        *self.node_mut().prefs_mut() = layered;
        self
    }
}

impl<T: AsNode> Compose for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{number, string};
    use crate::value;

    #[test]
    fn tags_append_titles_overwrite() {
        let s = string().tags("a").tags("b").title("one").title("two");
        assert_eq!(s.manifest().get_one("tags"), Some(&json!([{"value": "a"}, {"value": "b"}])));
        assert_eq!(s.manifest().get_one("title"), Some(&json!("two")));
    }

    #[test]
    fn is_valid_agrees_with_safe_parse() {
        let s = number().min(3.0);
        for v in [value!(1), value!(3), value!("4"), value!(null)] {
            assert_eq!(s.is_valid(&v), s.safe_parse(&v).is_ok());
        }
    }

    #[test]
    fn refine_reports_custom_issue() {
        let even = number().refine(|v| v.as_f64().is_some_and(|n| n % 2.0 == 0.0), "{{#label}} must be even");
        let err = even.parse(&value!(3)).err();
        let issue = err.as_ref().and_then(|e| e.first());
        assert_eq!(issue.map(|i| i.code.as_str()), Some("any.custom"));
        assert_eq!(issue.map(|i| i.message.as_str()), Some("\"value\" must be even"));
    }

    #[test]
    fn label_replaces_path_in_messages() {
        let err = string().label("Name").parse(&value!(1)).err();
        assert_eq!(err.map(|e| e.message), Some("\"Name\" must be a string".to_string()));
    }

    #[test]
    fn node_prefs_sit_between_defaults_and_call() {
        let strict = number().prefs(PreferencesPatch::default().convert(false));
        assert!(!strict.is_valid(&value!("4")));
        assert!(strict.is_valid_with(&value!("4"), &PreferencesPatch::default().convert(true).into()));
    }

    #[test]
    fn parse_as_deserializes_with_path() {
        #[derive(serde::Deserialize, Debug)]
        struct Point {
            #[allow(dead_code)]
            x: u8,
        }
        let any = combinators::any();
        assert!(any.parse_as::<Point>(&value!({"x": 3})).is_ok());
        match any.parse_as::<Point>(&value!({"x": "no"})) {
            Err(ParseAsError::Shape { path, .. }) => assert_eq!(path, "x"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_async_resolves_immediately() {
        let fut = string().parse_async(&value!("x"));
        assert_eq!(fut.into_inner().ok(), Some(value!("x")));
    }
}
