//! Public error types.
//!
//! Parse-time failures travel as data: a [`ValidationError`] holding an
//! ordered list of [`Issue`]s. Programmer mistakes made while composing
//! schemas are [`SchemaError`]s, returned from the fallible constructors.
pub mod builder;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::manifest::Manifest;
use crate::value::{PathSegment, Value};

pub use builder::ErrorBuilder;

// ————————————————————————————————————————————————————————————————————————————
// ISSUES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Issue {
    /// Dot-namespaced code, e.g. `array.min`.
    pub code: String,
    /// Fully rendered message.
    pub message: String,
    pub path: Vec<PathSegment>,
    /// The offending value.
    pub received: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    /// Wrong base type or shape, missing or unexpected key.
    Structural,
    /// Right shape, but a bound or format rule failed.
    Constraint,
    /// Raised by a user predicate.
    Custom,
}

impl IssueCategory {
    pub fn of(code: &str) -> IssueCategory {
        match code {
            "any.custom" => IssueCategory::Custom,
            "any.required" | "any.unknown" | "object.unknown" | "array.orderedLength" => {
                IssueCategory::Structural
            }
            _ if code.matches('.').count() == 1 && code.ends_with(".base") => IssueCategory::Structural,
            _ if code.starts_with("alternatives.") => IssueCategory::Structural,
            _ => IssueCategory::Constraint,
        }
    }
}

impl Issue {
    pub fn category(&self) -> IssueCategory {
        IssueCategory::of(&self.code)
    }

    /// `a.b[0]` style rendering of the path; empty at the root.
    pub fn path_string(&self) -> String {
        render_path(&self.path)
    }
}

pub(crate) fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) if out.is_empty() => out.push_str(key),
            PathSegment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            PathSegment::Index(i) => out.push_str(&format!("[{i}]")),
        }
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// AGGREGATE
// ————————————————————————————————————————————————————————————————————————————

/// Every issue of one rejected parse, plus the node it came from.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationError {
    pub issues: Vec<Issue>,
    /// The first issue's message unless overridden.
    pub message: String,
    /// Type name of the originating node, e.g. `ObjectSchema`.
    pub name: String,
    pub hint: String,
    pub manifest: Manifest,
}

impl ValidationError {
    pub fn first(&self) -> Option<&Issue> {
        self.issues.first()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.issues.iter().map(|issue| issue.code.as_str()).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

// ————————————————————————————————————————————————————————————————————————————
// CONFIGURATION ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// A schema was composed incorrectly. Never produced at parse time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("process-wide preferences were already installed")]
    PreferencesAlreadyInstalled,

    #[error("a discriminated union on '{key}' needs at least two options, got {count}")]
    TooFewOptions { key: String, count: usize },

    #[error("option {index} of the discriminated union has no literal '{key}' key")]
    MissingDiscriminator { key: String, index: usize },

    #[error("discriminator value {value} on '{key}' is used by more than one option")]
    DuplicateDiscriminator { key: String, value: String },

    #[error("cannot brand with a symbol that has no description")]
    AnonymousBrand,

    #[error("an enum needs at least one value")]
    EmptyEnum,

    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Failure of [`crate::Validate::parse_as`].
#[derive(Debug, Error)]
pub enum ParseAsError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("at {path}: {source}")]
    Shape {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
