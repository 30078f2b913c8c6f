//! Leaf schemas.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Value as Json, json};

use super::impl_as_node;
use crate::engine::{Constraint, Presence, Rule, Verdict};
use crate::error::SchemaError;
use crate::node::{SchemaNode, TypeTag};
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug)]
pub struct StringSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct NumberSchema {
    node: SchemaNode,
}

#[derive(Clone, Debug)]
pub struct DateSchema {
    node: SchemaNode,
}

/// Any leaf without type-specific rules (`boolean`, `bigint`, `never`, ...).
#[derive(Clone, Debug)]
pub struct PrimitiveSchema {
    node: SchemaNode,
}

impl_as_node!(StringSchema, NumberSchema, DateSchema, PrimitiveSchema);

// ————————————————————————————————————————————————————————————————————————————
// FACTORIES
// ————————————————————————————————————————————————————————————————————————————

pub fn string() -> StringSchema {
    StringSchema { node: SchemaNode::new(TypeTag::String, "string", Constraint::string()) }
}

pub fn number() -> NumberSchema {
    NumberSchema { node: SchemaNode::new(TypeTag::Number, "number", Constraint::number()) }
}

pub fn date() -> DateSchema {
    DateSchema { node: SchemaNode::new(TypeTag::Date, "Date", Constraint::date()) }
}

pub fn boolean() -> PrimitiveSchema {
    leaf(TypeTag::Boolean, "boolean", Constraint::boolean())
}

/// Big integers. Under `convert`, integral numbers and integer strings are
/// promoted.
pub fn bigint() -> PrimitiveSchema {
    let constraint = Constraint::custom_kind("bigint", |value, prefs| match value.resolved() {
        Value::BigInt(_) => Verdict::Pass,
        Value::Number(n) if prefs.convert && n.fract() == 0.0 && in_i128_range(*n) => {
            Verdict::Replace(Value::BigInt(*n as i128))
        }
        Value::String(s) if prefs.convert => match s.trim().parse::<i128>() {
            Ok(n) => Verdict::Replace(Value::BigInt(n)),
            Err(_) => Verdict::reject("bigint.base"),
        },
        _ => Verdict::reject("bigint.base"),
    });
    leaf(TypeTag::BigInt, "bigint", constraint)
}

pub fn symbol() -> PrimitiveSchema {
    let constraint = Constraint::custom_kind("symbol", |value, _| match value.resolved() {
        Value::Symbol(_) => Verdict::Pass,
        _ => Verdict::reject("symbol.base"),
    });
    leaf(TypeTag::Symbol, "symbol", constraint)
}

pub fn nan() -> PrimitiveSchema {
    let constraint = Constraint::custom_kind("nan", |value, _| match value.resolved() {
        Value::Number(n) if n.is_nan() => Verdict::Pass,
        _ => Verdict::reject("nan.base"),
    });
    leaf(TypeTag::NaN, "number", constraint)
}

pub fn null() -> PrimitiveSchema {
    leaf(TypeTag::Null, "null", Constraint::valid(vec![Value::Null]))
}

/// Accepts only a missing value.
pub fn undefined() -> PrimitiveSchema {
    leaf(TypeTag::Undefined, "undefined", Constraint::any().presence(Presence::Forbidden))
}

pub fn any() -> PrimitiveSchema {
    leaf(TypeTag::Any, "any", Constraint::any().presence(Presence::Optional))
}

pub fn unknown() -> PrimitiveSchema {
    leaf(TypeTag::Unknown, "unknown", Constraint::any().presence(Presence::Optional))
}

pub fn never() -> PrimitiveSchema {
    let constraint = Constraint::custom_kind("never", |_, _| Verdict::reject("never.base"));
    leaf(TypeTag::Never, "never", constraint)
}

/// Values for which `check` answers `true`; anything else is `any.custom`.
pub fn custom(check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> PrimitiveSchema {
    let constraint = Constraint::custom_kind("custom", move |value, _| {
        if check(value) { Verdict::Pass } else { Verdict::reject("any.custom") }
    })
    .presence(Presence::Optional);
    leaf(TypeTag::Custom, "unknown", constraint)
}

/// `i128::MIN` is exactly representable; `i128::MAX` rounds up to 2^127.
fn in_i128_range(n: f64) -> bool {
    n >= i128::MIN as f64 && n < i128::MAX as f64
}

fn leaf(tag: TypeTag, hint: &str, constraint: Constraint) -> PrimitiveSchema {
    PrimitiveSchema { node: SchemaNode::new(tag, hint, constraint) }
}

// ————————————————————————————————————————————————————————————————————————————
// RULES
// ————————————————————————————————————————————————————————————————————————————

fn push(node: &mut SchemaNode, rule: Rule) {
    node.map_constraint(|c| c.rule(rule));
}

fn note(node: &mut SchemaNode, key: &str, value: Json) {
    node.manifest_mut().update(key, value);
}

impl StringSchema {
    fn rule(mut self, rule: Rule) -> Self {
        push(&mut self.node, rule);
        self
    }

    pub fn min(mut self, limit: usize) -> Self {
        note(&mut self.node, "minLength", json!(limit));
        self.rule(Rule::MinLength(limit))
    }

    pub fn max(mut self, limit: usize) -> Self {
        note(&mut self.node, "maxLength", json!(limit));
        self.rule(Rule::MaxLength(limit))
    }

    pub fn length(mut self, exact: usize) -> Self {
        note(&mut self.node, "minLength", json!(exact));
        note(&mut self.node, "maxLength", json!(exact));
        self.rule(Rule::Length(exact))
    }

    pub fn nonempty(self) -> Self {
        self.min(1)
    }

    /// Compile `pattern` and require a match.
    pub fn regex(self, pattern: &str) -> Result<Self, SchemaError> {
        let regex = Regex::new(pattern).map_err(|err| SchemaError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })?;
        Ok(self.pattern(regex))
    }

    pub fn pattern(mut self, regex: Regex) -> Self {
        note(&mut self.node, "pattern", json!(regex.as_str()));
        self.rule(Rule::Pattern { regex, name: None })
    }

    pub fn email(mut self) -> Self {
        note(&mut self.node, "format", json!("email"));
        self.rule(Rule::Email)
    }

    pub fn url(mut self) -> Self {
        note(&mut self.node, "format", json!("uri"));
        self.rule(Rule::Uri)
    }

    pub fn uuid(mut self) -> Self {
        note(&mut self.node, "format", json!("uuid"));
        self.rule(Rule::Guid)
    }

    pub fn starts_with(self, prefix: &str) -> Self {
        self.named_pattern(format!("^{}", regex::escape(prefix)), format!("starts with {prefix:?}"))
    }

    pub fn ends_with(self, suffix: &str) -> Self {
        self.named_pattern(format!("{}$", regex::escape(suffix)), format!("ends with {suffix:?}"))
    }

    fn named_pattern(self, source: String, name: String) -> Self {
        match Regex::new(&source) {
            Ok(regex) => self.rule(Rule::Pattern { regex, name: Some(name) }),
            // escaped literals always compile
            Err(_) => self,
        }
    }

    pub fn trim(self) -> Self {
        self.rule(Rule::Trim)
    }

    pub fn lowercase(self) -> Self {
        self.rule(Rule::Lowercase)
    }

    pub fn uppercase(self) -> Self {
        self.rule(Rule::Uppercase)
    }
}

impl NumberSchema {
    fn rule(mut self, rule: Rule) -> Self {
        push(&mut self.node, rule);
        self
    }

    pub fn min(mut self, limit: f64) -> Self {
        note(&mut self.node, "minimum", json!(limit));
        self.rule(Rule::Min(limit))
    }

    pub fn gte(self, limit: f64) -> Self {
        self.min(limit)
    }

    pub fn max(mut self, limit: f64) -> Self {
        note(&mut self.node, "maximum", json!(limit));
        self.rule(Rule::Max(limit))
    }

    pub fn lte(self, limit: f64) -> Self {
        self.max(limit)
    }

    pub fn gt(mut self, limit: f64) -> Self {
        note(&mut self.node, "exclusiveMinimum", json!(limit));
        self.rule(Rule::Greater(limit))
    }

    pub fn lt(mut self, limit: f64) -> Self {
        note(&mut self.node, "exclusiveMaximum", json!(limit));
        self.rule(Rule::Less(limit))
    }

    pub fn int(mut self) -> Self {
        note(&mut self.node, "format", json!("integer"));
        self.rule(Rule::Integer)
    }

    pub fn positive(self) -> Self {
        self.gt(0.0)
    }

    pub fn negative(self) -> Self {
        self.lt(0.0)
    }

    pub fn nonnegative(self) -> Self {
        self.min(0.0)
    }

    pub fn nonpositive(self) -> Self {
        self.max(0.0)
    }

    pub fn multiple_of(mut self, base: f64) -> Self {
        note(&mut self.node, "multipleOf", json!(base));
        self.rule(Rule::Multiple(base))
    }
}

impl DateSchema {
    pub fn min(mut self, limit: DateTime<Utc>) -> Self {
        note(&mut self.node, "minimum", Value::Date(limit).to_json());
        push(&mut self.node, Rule::After(limit));
        self
    }

    pub fn max(mut self, limit: DateTime<Utc>) -> Self {
        note(&mut self.node, "maximum", Value::Date(limit).to_json());
        push(&mut self.node, Rule::Before(limit));
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;
    use crate::node::{Compose, Describe, Validate};
    use crate::value;

    fn codes(result: crate::parser::ParseResult) -> Vec<String> {
        result.error().map(|e| e.issues.iter().map(|i| i.code.clone()).collect()).unwrap_or_default()
    }

    #[test]
    fn string_rules() {
        let s = string().min(2).max(4);
        assert!(s.is_valid(&value!("abc")));
        assert_eq!(codes(s.safe_parse(&value!("a"))), ["string.min"]);
        assert_eq!(codes(s.safe_parse(&value!(5))), ["string.base"]);
        assert_eq!(codes(string().email().safe_parse(&value!("x"))), ["string.email"]);
        assert!(string().starts_with("ab").is_valid(&value!("abc")));
        assert_eq!(codes(string().ends_with("z").safe_parse(&value!("abc"))), ["string.pattern.name"]);
    }

    #[test]
    fn regex_errors_are_configuration_errors() {
        assert!(matches!(string().regex("("), Err(SchemaError::InvalidRegex { .. })));
        let digits = string().regex(r"^\d+$");
        assert!(digits.is_ok_and(|s| s.is_valid(&value!("123"))));
    }

    #[test]
    fn trim_converts_or_rejects() {
        let s = string().trim();
        assert_eq!(s.parse(&value!(" a ")).ok(), Some(value!("a")));
        assert_eq!(codes(s.safe_parse_with(&value!(" a "), &ParseOptions::no_convert())), ["string.trim"]);
    }

    #[test]
    fn number_rules() {
        let n = number().int().positive();
        assert!(n.is_valid(&value!(3)));
        assert_eq!(codes(n.safe_parse(&value!(1.5))), ["number.integer"]);
        assert_eq!(codes(n.safe_parse(&value!(-2))), ["number.greater"]);
        assert_eq!(n.parse(&value!("7")).ok(), Some(value!(7)));
        assert_eq!(codes(number().safe_parse(&Value::Number(f64::INFINITY))), ["number.infinity"]);
        assert_eq!(number().multiple_of(5.0).manifest().get_one("multipleOf"), Some(&json!(5.0)));
    }

    #[test]
    fn bigint_compares_by_value() {
        let b = bigint();
        assert!(b.is_valid(&Value::bigint(1 << 100)));
        assert_eq!(b.parse(&value!("12")).ok(), Some(Value::bigint(12)));
        assert_eq!(codes(b.safe_parse(&value!(true))), ["bigint.base"]);
    }

    #[test]
    fn bigint_rejects_numbers_beyond_i128() {
        let b = bigint();
        assert_eq!(codes(b.safe_parse(&Value::Number(1e39))), ["bigint.base"]);
        assert_eq!(codes(b.safe_parse(&Value::Number(-1e39))), ["bigint.base"]);
        assert_eq!(b.parse(&Value::Number(-(2f64.powi(127)))).ok(), Some(Value::BigInt(i128::MIN)));
        assert_eq!(b.parse(&Value::Number(1e20)).ok(), Some(Value::bigint(100_000_000_000_000_000_000)));
    }

    #[test]
    fn special_leaves() {
        assert!(nan().is_valid(&Value::Number(f64::NAN)));
        assert!(!nan().is_valid(&value!(1)));
        assert!(symbol().is_valid(&Value::Symbol(crate::value::Symbol::new("s"))));
        assert!(null().is_valid(&value!(null)));
        assert!(undefined().is_valid(&Value::Undefined));
        assert_eq!(codes(undefined().safe_parse(&value!(1))), ["any.unknown"]);
        assert!(any().is_valid(&Value::Undefined));
        assert_eq!(codes(never().safe_parse(&value!(1))), ["never.base"]);
        assert!(custom(|v| v.as_str() == Some("ok")).is_valid(&value!("ok")));
    }

    #[test]
    fn optional_on_undefined_passes_through() {
        let u = undefined().optional();
        assert_eq!(u.hint(), "undefined");
        assert!(!u.is_valid(&value!(1)));
    }

    #[test]
    fn dates_convert_and_bound() {
        let floor = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").map(|d| d.with_timezone(&Utc));
        let Ok(floor) = floor else { panic!("fixture date parses") };
        let d = date().min(floor);
        assert!(d.is_valid(&value!("2024-06-01T00:00:00Z")));
        assert_eq!(codes(d.safe_parse(&value!("2023-06-01T00:00:00Z"))), ["date.min"]);
        assert_eq!(codes(d.safe_parse(&value!("nope"))), ["date.base"]);
    }
}
