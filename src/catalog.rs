//! Issue catalog: issue code → message template.
//!
//! Templates carry `{{#tag}}` placeholders filled from a failure's context
//! map; `{{#label}}` is always available.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::value::Value;

static CATALOG: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        ("any.required", "{{#label}} is required"),
        ("any.unknown", "{{#label}} is not allowed"),
        ("any.invalid", "{{#label}} contains an invalid value"),
        ("any.only", "{{#label}} must be one of {{#valids}}"),
        ("any.custom", "{{#label}} failed custom validation"),
        ("string.base", "{{#label}} must be a string"),
        ("string.min", "{{#label}} length must be at least {{#limit}} characters long"),
        ("string.max", "{{#label}} length must be less than or equal to {{#limit}} characters long"),
        ("string.length", "{{#label}} length must be {{#limit}} characters long"),
        ("string.pattern.base", "{{#label}} with value {{#value}} fails to match the required pattern: {{#regex}}"),
        ("string.pattern.name", "{{#label}} with value {{#value}} fails to match the {{#name}} pattern"),
        ("string.email", "{{#label}} must be a valid email"),
        ("string.uri", "{{#label}} must be a valid uri"),
        ("string.guid", "{{#label}} must be a valid GUID"),
        ("string.trim", "{{#label}} must not have leading or trailing whitespace"),
        ("string.lowercase", "{{#label}} must only contain lowercase characters"),
        ("string.uppercase", "{{#label}} must only contain uppercase characters"),
        ("number.base", "{{#label}} must be a number"),
        ("number.infinity", "{{#label}} cannot be infinity"),
        ("number.min", "{{#label}} must be greater than or equal to {{#limit}}"),
        ("number.max", "{{#label}} must be less than or equal to {{#limit}}"),
        ("number.greater", "{{#label}} must be greater than {{#limit}}"),
        ("number.less", "{{#label}} must be less than {{#limit}}"),
        ("number.integer", "{{#label}} must be an integer"),
        ("number.multiple", "{{#label}} must be a multiple of {{#multiple}}"),
        ("boolean.base", "{{#label}} must be a boolean"),
        ("date.base", "{{#label}} must be a valid date"),
        ("date.min", "{{#label}} must be greater than or equal to {{#limit}}"),
        ("date.max", "{{#label}} must be less than or equal to {{#limit}}"),
        ("array.base", "{{#label}} must be an array"),
        ("array.min", "{{#label}} must contain at least {{#limit}} items"),
        ("array.max", "{{#label}} must contain less than or equal to {{#limit}} items"),
        ("array.length", "{{#label}} must contain {{#limit}} items"),
        ("array.sort", "{{#label}} must be sorted in {{#order}} order"),
        ("array.sort.mismatching", "{{#label}} cannot be sorted due to mismatching types"),
        ("array.orderedLength", "{{#label}} must contain at most {{#limit}} items"),
        ("object.base", "{{#label}} must be of type object"),
        ("object.unknown", "{{#label}} is not allowed"),
        ("alternatives.types", "{{#label}} must be one of {{#types}}"),
        ("alternatives.match", "{{#label}} does not match any of the allowed types"),
        ("alternatives.discriminator", "{{#label}} must be one of {{#valids}}"),
        ("bigint.base", "{{#label}} must be a bigint"),
        ("symbol.base", "{{#label}} must be a symbol"),
        ("nan.base", "{{#label}} must be NaN"),
        ("never.base", "{{#label}} is not allowed"),
    ])
});

const FALLBACK: &str = "{{#label}} is invalid";

/// Read access to the built-in templates.
pub struct IssueCatalog;

impl IssueCatalog {
    /// Template for `code`, e.g. `array.min`.
    pub fn get(code: &str) -> Option<&'static str> {
        CATALOG.get(code).copied()
    }

    /// Template for `(type_name, kind)`, e.g. `("array", "min")`.
    pub fn lookup(type_name: &str, kind: &str) -> Option<&'static str> {
        Self::get(&format!("{type_name}.{kind}"))
    }

    pub fn fallback() -> &'static str {
        FALLBACK
    }

    pub fn codes() -> impl Iterator<Item = &'static str> {
        CATALOG.keys().copied()
    }
}

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{#\s*([A-Za-z0-9_]+)\s*\}\}").expect("tag regex compiles"));

/// Substitute `{{#tag}}` placeholders. Unknown tags render empty.
pub fn render(template: &str, context: &IndexMap<String, Value>) -> String {
    TAG.replace_all(template, |caps: &Captures<'_>| {
        context.get(&caps[1]).map(display).unwrap_or_default()
    })
    .into_owned()
}

/// Strings render bare so that labels and names read naturally; everything
/// else uses the value's own display form.
fn display(value: &Value) -> String {
    match value.resolved() {
        Value::String(s) => s.clone(),
        Value::Array(xs) => {
            let parts: Vec<String> = xs.iter().map(|x| x.to_string()).collect();
            format!("[{}]", parts.join(", "))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_is_namespaced() {
        for code in IssueCatalog::codes() {
            assert!(code.contains('.'), "{code}");
        }
    }

    #[test]
    fn lookup_joins_type_and_kind() {
        assert_eq!(IssueCatalog::lookup("array", "min"), IssueCatalog::get("array.min"));
        assert!(IssueCatalog::lookup("array", "nope").is_none());
    }

    #[test]
    fn renders_tags() {
        let mut context = IndexMap::new();
        context.insert("label".to_string(), Value::from("\"tags\""));
        context.insert("limit".to_string(), Value::Number(2.0));
        let out = render(IssueCatalog::get("array.min").unwrap_or_default(), &context);
        assert_eq!(out, "\"tags\" must contain at least 2 items");
    }

    #[test]
    fn renders_lists_and_unknown_tags() {
        let mut context = IndexMap::new();
        context.insert("valids".to_string(), crate::value!(["A", "B"]));
        assert_eq!(render("one of {{#valids}}{{#missing}}", &context), "one of [\"A\", \"B\"]");
        assert_eq!(render("broken {{#label", &context), "broken {{#label");
    }
}
