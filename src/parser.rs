//! One validation call: clone, pre-parse hooks, engine, post-parse hooks.

use crate::config::{ParseOptions, Preferences};
use crate::error::{ErrorBuilder, ValidationError};
use crate::hooks::Trigger;
use crate::node::SchemaNode;
use crate::value::Value;

/// Outcome of `safe_parse`.
#[derive(Clone, Debug)]
pub enum ParseResult {
    /// Engine validation and every post-parse hook succeeded.
    Accepted(Value),
    /// The engine reported at least one failure; post-parse hooks did not run.
    Rejected(ValidationError),
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ParseResult::Accepted(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ParseResult::Accepted(value) => Some(value),
            ParseResult::Rejected(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ParseResult::Accepted(_) => None,
            ParseResult::Rejected(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<Value, ValidationError> {
        match self {
            ParseResult::Accepted(value) => Ok(value),
            ParseResult::Rejected(error) => Err(error),
        }
    }
}

pub struct Parser<'a> {
    node: &'a SchemaNode,
    base: &'a Preferences,
}

impl<'a> Parser<'a> {
    /// Parser reading the process-wide preferences.
    pub fn new(node: &'a SchemaNode) -> Self {
        Self { node, base: Preferences::global() }
    }

    /// Parser over an explicit preferences context; the process-wide
    /// defaults are not consulted.
    pub fn with_preferences(node: &'a SchemaNode, base: &'a Preferences) -> Self {
        Self { node, base }
    }

    pub fn run(&self, input: &Value, options: &ParseOptions) -> ParseResult {
        let node = self.node;
        let value = node.hooks().apply(Trigger::BeforeParse, input.clone());
        let prefs = self.base.merged(node.prefs()).merged(&options.prefs);
        tracing::debug!(node = %node.id(), hint = node.hint(), "parsing");

        match node.constraint().validate(value, &prefs) {
            Ok(value) => {
                let value = node.hooks().apply(Trigger::AfterParse, value);
                tracing::debug!(node = %node.id(), "accepted");
                ParseResult::Accepted(value)
            }
            Err(failures) => {
                tracing::debug!(node = %node.id(), failures = failures.len(), "rejected");
                ParseResult::Rejected(ErrorBuilder::new(&prefs).build(failures, node))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreferencesPatch;
    use crate::engine::{Constraint, Rule};
    use crate::hooks::Hook;
    use crate::node::TypeTag;

    fn node() -> SchemaNode {
        let constraint = Constraint::array(Constraint::string()).rule(Rule::MinItems(2));
        SchemaNode::new(TypeTag::Array, "string[]", constraint)
    }

    #[test]
    fn caller_value_is_untouched() {
        let mut n = node();
        n.hooks_mut().add(Trigger::BeforeParse, Hook::new("pad", |_| crate::value!(["a", "b"])));
        let input = crate::value!(["x"]);
        let out = Parser::new(&n).run(&input, &ParseOptions::default());
        assert_eq!(out.value(), Some(&crate::value!(["a", "b"])));
        assert_eq!(input, crate::value!(["x"]));
    }

    #[test]
    fn after_hooks_skip_rejections() {
        let mut n = node();
        n.hooks_mut().add(Trigger::AfterParse, Hook::new("boom", |_| panic!("must not run")));
        let out = Parser::new(&n).run(&crate::value!(["a"]), &ParseOptions::default());
        assert_eq!(out.error().map(|e| e.codes()), Some(vec!["array.min"]));
    }

    #[test]
    fn explicit_preferences_and_call_options_layer() {
        let n = node();
        let base = Preferences { abort_early: true, ..Preferences::default() };
        let parser = Parser::with_preferences(&n, &base);
        let input = crate::value!([1, 2]);
        let first = parser.run(&input, &ParseOptions::default());
        assert_eq!(first.error().map(|e| e.issues.len()), Some(1));
        let all = parser.run(&input, &PreferencesPatch::default().abort_early(false).into());
        assert_eq!(all.error().map(|e| e.issues.len()), Some(2));
    }
}
