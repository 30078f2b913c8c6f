use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{Rule, Verdict};
use crate::config::Preferences;
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A compiled matching constraint. Opaque to schema nodes apart from the
/// composition entry points (`concat`, `with_match`, `custom`, annotations).
#[derive(Clone, Debug)]
pub struct Constraint {
    pub(crate) kind: Kind,
    pub(crate) presence: Presence,
    /// Values accepted before any type check (`null` for nullable, ...).
    pub(crate) allow: Vec<Value>,
    /// Values rejected before any type check.
    pub(crate) invalid: Vec<Value>,
    /// Only `allow` values are accepted.
    pub(crate) only: bool,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) label: Option<String>,
    pub(crate) messages: IndexMap<String, String>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) prepare: Vec<Mapper>,
    pub(crate) finalize: Vec<Mapper>,
}

#[derive(Clone, Debug)]
pub enum Kind {
    Any,
    String,
    Number,
    Boolean,
    Date,
    Array(ArrayDef),
    Object(ObjectDef),
    /// Multi-option constraint. Composition concatenates into it instead of
    /// nesting a new one.
    Alternatives(Alternatives),
    Switch(SwitchDef),
    Custom(CustomKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Only `undefined` is accepted.
    Forbidden,
}

#[derive(Clone, Debug, Default)]
pub struct ArrayDef {
    /// Constraint for every element past `ordered`.
    pub items: Option<Box<Constraint>>,
    /// Positional constraints (tuples).
    pub ordered: Vec<Constraint>,
}

#[derive(Clone, Debug, Default)]
pub struct ObjectDef {
    pub keys: IndexMap<String, Constraint>,
    pub unknown: UnknownKeys,
    /// When set, unknown keys are matched against it instead of `unknown`.
    pub pattern: Option<Pattern>,
}

#[derive(Clone, Debug)]
pub struct Pattern {
    pub key: Option<Box<Constraint>>,
    pub value: Box<Constraint>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    #[default]
    Strip,
    Strict,
    Passthrough,
}

#[derive(Clone, Debug)]
pub struct Alternatives {
    pub options: Vec<Constraint>,
    pub mode: Match,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Match {
    /// First matching option wins.
    Any,
    /// Every option must match.
    All,
}

/// Dispatch on the literal value of one object key.
#[derive(Clone, Debug)]
pub struct SwitchDef {
    pub key: String,
    pub cases: Vec<(Value, Constraint)>,
}

#[derive(Clone, Debug)]
pub struct CustomKind {
    /// Type half of the base failure code, e.g. `bigint`.
    pub name: String,
    pub check: CustomCheck,
}

#[derive(Clone)]
pub struct CustomCheck(Arc<dyn Fn(&Value, &Preferences) -> Verdict + Send + Sync>);

#[derive(Clone)]
pub struct Mapper(Arc<dyn Fn(Value) -> Value + Send + Sync>);

#[derive(Clone)]
pub enum DefaultValue {
    Fixed(Value),
    Supplier(Arc<dyn Fn() -> Value + Send + Sync>),
}

// ————————————————————————————————————————————————————————————————————————————
// BUILD
// ————————————————————————————————————————————————————————————————————————————

impl Constraint {
    pub fn build(kind: Kind) -> Self {
        Self {
            kind,
            presence: Presence::Required,
            allow: Vec::new(),
            invalid: Vec::new(),
            only: false,
            default: None,
            label: None,
            messages: IndexMap::new(),
            rules: Vec::new(),
            prepare: Vec::new(),
            finalize: Vec::new(),
        }
    }

    pub fn any() -> Self {
        Self::build(Kind::Any)
    }
    pub fn string() -> Self {
        Self::build(Kind::String)
    }
    pub fn number() -> Self {
        Self::build(Kind::Number)
    }
    pub fn boolean() -> Self {
        Self::build(Kind::Boolean)
    }
    pub fn date() -> Self {
        Self::build(Kind::Date)
    }
    pub fn array(items: Constraint) -> Self {
        Self::build(Kind::Array(ArrayDef { items: Some(Box::new(items)), ordered: Vec::new() }))
    }
    pub fn tuple(ordered: Vec<Constraint>, rest: Option<Constraint>) -> Self {
        Self::build(Kind::Array(ArrayDef { items: rest.map(Box::new), ordered }))
    }
    pub fn object(keys: IndexMap<String, Constraint>) -> Self {
        Self::build(Kind::Object(ObjectDef { keys, ..ObjectDef::default() }))
    }
    pub fn alternatives(options: Vec<Constraint>, mode: Match) -> Self {
        Self::build(Kind::Alternatives(Alternatives { options, mode }))
    }
    pub fn switch(key: impl Into<String>, cases: Vec<(Value, Constraint)>) -> Self {
        Self::build(Kind::Switch(SwitchDef { key: key.into(), cases }))
    }
    pub fn custom_kind(
        name: impl Into<String>,
        check: impl Fn(&Value, &Preferences) -> Verdict + Send + Sync + 'static,
    ) -> Self {
        Self::build(Kind::Custom(CustomKind { name: name.into(), check: CustomCheck::new(check) }))
    }
    /// Exactly the listed values.
    pub fn valid(values: Vec<Value>) -> Self {
        let mut c = Self::any();
        c.allow = values;
        c.only = true;
        c
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COMPOSITION
// ————————————————————————————————————————————————————————————————————————————

impl Constraint {
    /// Join `other` into a multi-option constraint. When `self` already is a
    /// plain multi-option constraint its option list grows instead of being
    /// nested; the same holds for `other`.
    pub fn concat(self, other: Constraint) -> Constraint {
        let mode = match &self.kind {
            Kind::Alternatives(alt) if self.is_plain() => alt.mode,
            _ => Match::Any,
        };
        Self::join(vec![self, other], mode)
    }

    /// Multi-option constraint over `parts`; parts that already are plain
    /// multi-option constraints in the same `mode` are spliced, not nested.
    pub fn join(parts: Vec<Constraint>, mode: Match) -> Constraint {
        let mut options = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_plain_alternatives(mode) {
                if let Kind::Alternatives(alt) = part.kind {
                    options.extend(alt.options);
                }
            } else {
                options.push(part);
            }
        }
        Constraint::alternatives(options, mode)
    }

    /// Switch the matching mode of a multi-option constraint. Single
    /// constraints are first lifted into a one-option constraint.
    pub fn with_match(self, mode: Match) -> Constraint {
        let mut out = match self.kind {
            Kind::Alternatives(_) => self,
            _ => Constraint::alternatives(vec![self], mode),
        };
        if let Kind::Alternatives(alt) = &mut out.kind {
            alt.mode = mode;
        }
        out
    }

    /// Multi-option constraint in `mode` carrying no flags of its own, so its
    /// options can be spliced into a sibling without changing semantics.
    pub fn is_plain_alternatives(&self, mode: Match) -> bool {
        matches!(&self.kind, Kind::Alternatives(alt) if alt.mode == mode) && self.is_plain()
    }

    fn is_plain(&self) -> bool {
        self.presence == Presence::Required
            && self.allow.is_empty()
            && self.invalid.is_empty()
            && !self.only
            && self.default.is_none()
            && self.label.is_none()
            && self.messages.is_empty()
            && self.rules.is_empty()
            && self.prepare.is_empty()
            && self.finalize.is_empty()
    }

    pub fn custom(self, check: impl Fn(&Value, &Preferences) -> Verdict + Send + Sync + 'static) -> Self {
        self.rule(Rule::Custom(CustomCheck::new(check)))
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn allow(mut self, value: Value) -> Self {
        self.invalid.retain(|v| *v != value);
        if !self.allow.contains(&value) {
            self.allow.push(value);
        }
        self
    }

    pub fn disallow(mut self, value: Value) -> Self {
        self.allow.retain(|v| *v != value);
        if !self.invalid.contains(&value) {
            self.invalid.push(value);
        }
        self
    }

    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn without_default(mut self) -> Self {
        self.default = None;
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn message(mut self, kind: impl Into<String>, template: impl Into<String>) -> Self {
        self.messages.insert(kind.into(), template.into());
        self
    }

    pub fn prepare(mut self, mapper: Mapper) -> Self {
        self.prepare.push(mapper);
        self
    }

    pub fn finalize(mut self, mapper: Mapper) -> Self {
        self.finalize.push(mapper);
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }
    pub fn kind_mut(&mut self) -> &mut Kind {
        &mut self.kind
    }
    pub fn current_presence(&self) -> Presence {
        self.presence
    }
    pub fn allowed(&self) -> &[Value] {
        &self.allow
    }
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The option list of a multi-option constraint.
    pub fn options(&self) -> Option<&[Constraint]> {
        match &self.kind {
            Kind::Alternatives(alt) => Some(&alt.options),
            _ => None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CALLABLES
// ————————————————————————————————————————————————————————————————————————————

impl CustomCheck {
    pub fn new(check: impl Fn(&Value, &Preferences) -> Verdict + Send + Sync + 'static) -> Self {
        Self(Arc::new(check))
    }
    pub fn call(&self, value: &Value, prefs: &Preferences) -> Verdict {
        (self.0)(value, prefs)
    }
}

impl Mapper {
    pub fn new(map: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(map))
    }
    pub fn from_arc(map: Arc<dyn Fn(Value) -> Value + Send + Sync>) -> Self {
        Self(map)
    }
    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl DefaultValue {
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Fixed(v) => v.clone(),
            DefaultValue::Supplier(f) => f(),
        }
    }
}

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCheck(..)")
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mapper(..)")
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            DefaultValue::Supplier(_) => f.write_str("Supplier(..)"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
