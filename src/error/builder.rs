use super::{Issue, ValidationError, render_path};
use crate::catalog::{self, IssueCatalog};
use crate::config::Preferences;
use crate::engine::Failure;
use crate::node::SchemaNode;
use crate::value::Value;

/// Turns raw engine failures into [`Issue`]s.
///
/// Template lookup order for a failure with code `c`:
/// 1. the template attached to the failing constraint (`message`, `refine`),
/// 2. `prefs.messages[c]` (call-site, node and process layers already merged),
/// 3. the [`IssueCatalog`] entry for `c`,
/// 4. a generic fallback, logged at `warn`.
pub struct ErrorBuilder<'p> {
    prefs: &'p Preferences,
}

impl<'p> ErrorBuilder<'p> {
    pub fn new(prefs: &'p Preferences) -> Self {
        Self { prefs }
    }

    pub fn build(&self, failures: Vec<Failure>, node: &SchemaNode) -> ValidationError {
        let limit = if self.prefs.abort_early { 1 } else { failures.len() };
        let issues: Vec<Issue> = failures.into_iter().take(limit).map(|f| self.issue(f)).collect();
        let message = issues
            .first()
            .map(|issue| issue.message.clone())
            .unwrap_or_else(|| format!("{} rejected the value", node.tag().name()));
        ValidationError {
            issues,
            message,
            name: node.tag().name().to_string(),
            hint: node.hint().to_string(),
            manifest: node.manifest().clone(),
        }
    }

    pub fn issue(&self, failure: Failure) -> Issue {
        let Failure { kind, path, value, mut context, label, template } = failure;
        let label = label.unwrap_or_else(|| match render_path(&path) {
            rendered if rendered.is_empty() => "value".to_string(),
            rendered => rendered,
        });
        context.insert("label".to_string(), Value::String(format!("\"{label}\"")));
        context.entry("value".to_string()).or_insert_with(|| value.clone());

        let template = template
            .or_else(|| self.prefs.messages.get(&kind).cloned())
            .unwrap_or_else(|| self.catalog_template(&kind));
        Issue { message: catalog::render(&template, &context), code: kind, path, received: value }
    }

    fn catalog_template(&self, code: &str) -> String {
        match IssueCatalog::get(code) {
            Some(template) => template.to_string(),
            None => {
                tracing::warn!(code, "no message template for issue code");
                IssueCatalog::fallback().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use crate::value::PathSegment;

    fn failure(kind: &str, path: Vec<PathSegment>) -> Failure {
        Failure {
            kind: kind.to_string(),
            path,
            value: Value::from(1.0),
            context: IndexMap::new(),
            label: None,
            template: None,
        }
    }

    #[test]
    fn label_comes_from_path() {
        let prefs = Preferences::default();
        let builder = ErrorBuilder::new(&prefs);
        let issue = builder.issue(failure("string.base", vec!["tags".into(), PathSegment::Index(0)]));
        assert_eq!(issue.message, "\"tags[0]\" must be a string");
        let root = builder.issue(failure("string.base", vec![]));
        assert_eq!(root.message, "\"value\" must be a string");
    }

    #[test]
    fn local_template_beats_preferences() {
        let mut prefs = Preferences::default();
        prefs.messages.insert("any.custom".into(), "from prefs".into());
        let builder = ErrorBuilder::new(&prefs);
        let mut f = failure("any.custom", vec![]);
        assert_eq!(builder.issue(f.clone()).message, "from prefs");
        f.template = Some("{{#label}} is odd".into());
        assert_eq!(builder.issue(f).message, "\"value\" is odd");
    }

    #[test]
    fn unknown_codes_fall_back() {
        let prefs = Preferences::default();
        let issue = ErrorBuilder::new(&prefs).issue(failure("thing.weird", vec![]));
        assert_eq!(issue.message, "\"value\" is invalid");
        assert_eq!(issue.code, "thing.weird");
    }
}
