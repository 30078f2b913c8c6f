//! Value-matching engine.
//!
//! Schema nodes never match values themselves: each node owns a [`Constraint`]
//! and hands values to [`Constraint::validate`], which either returns the
//! (possibly coerced) value or a list of raw [`Failure`]s carrying a kind code
//! and a context map. Turning failures into public issues is the job of
//! `error::builder`.
pub mod constraint;
pub mod rules;
mod walk;

use indexmap::IndexMap;

use crate::value::{PathSegment, Value};

pub use constraint::{
    Alternatives, ArrayDef, Constraint, CustomCheck, CustomKind, DefaultValue, Kind, Mapper,
    Match, ObjectDef, Pattern, Presence, SwitchDef, UnknownKeys,
};
pub use rules::{Rule, SortOrder};

/// One raw engine failure.
#[derive(Clone, Debug)]
pub struct Failure {
    /// Dot-namespaced kind code, e.g. `array.min`.
    pub kind: String,
    pub path: Vec<PathSegment>,
    /// The offending value as the engine saw it.
    pub value: Value,
    pub context: IndexMap<String, Value>,
    /// Label attached to the failing constraint, if any.
    pub label: Option<String>,
    /// Message template attached to the failing constraint for this kind.
    pub template: Option<String>,
}

/// Result of a rule or custom check.
#[derive(Clone, Debug)]
pub enum Verdict {
    Pass,
    /// Accept, replacing the value (coercion, trimming, ...).
    Replace(Value),
    Reject {
        kind: String,
        context: IndexMap<String, Value>,
        /// Message template overriding the catalog for this one rejection.
        template: Option<String>,
    },
}

impl Verdict {
    pub fn reject(kind: impl Into<String>) -> Self {
        Verdict::Reject { kind: kind.into(), context: IndexMap::new(), template: None }
    }

    pub fn with_template(mut self, message: impl Into<String>) -> Self {
        if let Verdict::Reject { template, .. } = &mut self {
            *template = Some(message.into());
        }
        self
    }

    /// Attach a context entry to a rejection; no-op on acceptance.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Verdict::Reject { context, .. } = &mut self {
            context.insert(key.to_string(), value.into());
        }
        self
    }
}

impl Failure {
    /// The type half of the kind code (`array` in `array.min`).
    pub fn type_name(&self) -> &str {
        self.kind.split_once('.').map(|(ty, _)| ty).unwrap_or(&self.kind)
    }

    /// A base type mismatch such as `string.base` (not `string.pattern.base`).
    pub fn is_base(&self) -> bool {
        self.kind.strip_suffix(".base").is_some_and(|ty| !ty.contains('.'))
    }
}
