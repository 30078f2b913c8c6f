//! Human-readable type signatures.
//!
//! Hints are derived purely from the children's hint strings, so the same
//! composition always yields the same text.

use crate::value::Value;

/// A hint is "simple" when it can take a `[]` suffix without brackets.
fn is_simple(hint: &str) -> bool {
    !hint.is_empty()
        && hint.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '"' | '\'' | '.' | '-'))
}

pub fn array(element: &str) -> String {
    if is_simple(element) { format!("{element}[]") } else { format!("Array<{element}>") }
}

/// `[T, ...T[]]`
pub fn nonempty(element: &str) -> String {
    format!("[{element}, ...{}]", array(element))
}

pub fn tuple(items: &[&str], rest: Option<&str>) -> String {
    let mut parts: Vec<String> = items.iter().map(|s| s.to_string()).collect();
    if let Some(rest) = rest {
        parts.push(format!("...{}", array(rest)));
    }
    format!("[{}]", parts.join(", "))
}

/// Options join verbatim; duplicates are kept.
pub fn union<S: AsRef<str>>(options: &[S]) -> String {
    join(options, " | ")
}

pub fn intersection<S: AsRef<str>>(parts: &[S]) -> String {
    join(parts, " & ")
}

fn join<S: AsRef<str>>(parts: &[S], separator: &str) -> String {
    if parts.is_empty() {
        return "never".to_string();
    }
    parts.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(separator)
}

pub fn optional(hint: &str) -> String {
    format!("{hint} | undefined")
}

pub fn nullable(hint: &str) -> String {
    format!("{hint} | null")
}

/// Remove every top-level `arm` from a union hint. Hints without that arm are
/// returned unchanged, as is a hint consisting of nothing but the arm.
pub fn strip_arm(hint: &str, arm: &str) -> String {
    let arms = split_top_level(hint, " | ");
    let kept: Vec<&str> = arms.iter().copied().filter(|a| a.trim() != arm).collect();
    if kept.is_empty() || kept.len() == arms.len() {
        return hint.to_string();
    }
    kept.join(" | ")
}

/// Split on `separator` outside of any bracket pair or string literal.
fn split_top_level<'a>(hint: &'a str, separator: &str) -> Vec<&'a str> {
    let bytes = hint.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if in_string {
            if c == b'\\' {
                i += 1;
            } else if c == b'"' {
                in_string = false;
            }
        } else {
            match c {
                b'"' => in_string = true,
                b'<' | b'[' | b'{' | b'(' => depth += 1,
                b'>' | b']' | b'}' | b')' => depth -= 1,
                _ if depth == 0 && hint[i..].starts_with(separator) => {
                    parts.push(&hint[start..i]);
                    i += separator.len();
                    start = i;
                    continue;
                }
                _ => {}
            }
        }
        i += 1;
    }
    parts.push(&hint[start..]);
    parts
}

/// Object hint: `{ a: string; b?: number }`.
pub fn object(entries: &[(String, String, bool)], catchall: Option<&str>) -> String {
    let mut fields: Vec<String> = entries
        .iter()
        .map(|(key, hint, optional)| {
            if *optional {
                format!("{}?: {}", property(key), strip_arm(hint, "undefined"))
            } else {
                format!("{}: {hint}", property(key))
            }
        })
        .collect();
    if let Some(catchall) = catchall {
        fields.push(format!("[key: string]: {catchall}"));
    }
    if fields.is_empty() { "{}".to_string() } else { format!("{{ {} }}", fields.join("; ")) }
}

fn property(key: &str) -> String {
    let plain = key.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if plain { key.to_string() } else { quote(key) }
}

pub fn record(key: &str, value: &str) -> String {
    format!("Record<{key}, {value}>")
}

pub fn map(key: &str, value: &str) -> String {
    format!("Map<{key}, {value}>")
}

pub fn set(element: &str) -> String {
    format!("Set<{element}>")
}

/// Sorted, quoted union of enum members.
pub fn enumeration(values: &[String]) -> String {
    let mut sorted: Vec<&String> = values.iter().collect();
    sorted.sort();
    sorted.into_iter().map(|v| quote(v)).collect::<Vec<_>>().join(" | ")
}

pub fn literal(value: &Value) -> String {
    match value.resolved() {
        Value::String(s) => quote(s),
        other => other.to_string(),
    }
}

pub fn readonly(hint: &str) -> String {
    format!("Readonly<{hint}>")
}

pub fn readonly_deep(hint: &str) -> String {
    format!("ReadonlyDeep<{hint}>")
}

/// Undo `Wrapper<...>` around a hint; other hints are returned unchanged.
pub fn strip_wrapper(hint: &str, wrapper: &str) -> String {
    hint.strip_prefix(wrapper)
        .and_then(|rest| rest.strip_prefix('<'))
        .and_then(|rest| rest.strip_suffix('>'))
        .map(str::to_string)
        .unwrap_or_else(|| hint.to_string())
}

pub fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_bracket_multi_token_elements() {
        assert_eq!(array("string"), "string[]");
        assert_eq!(array("string | null"), "Array<string | null>");
        assert_eq!(array("Record<string, number>"), "Array<Record<string, number>>");
        assert_eq!(nonempty("number"), "[number, ...number[]]");
    }

    #[test]
    fn tuples_show_rest_only_when_set() {
        assert_eq!(tuple(&["string", "number"], None), "[string, number]");
        assert_eq!(tuple(&["string"], Some("boolean")), "[string, ...boolean[]]");
    }

    #[test]
    fn union_keeps_duplicates() {
        assert_eq!(union(&["string", "string", "number"]), "string | string | number");
    }

    #[test]
    fn strip_arm_is_textual_and_top_level() {
        assert_eq!(strip_arm("string | undefined", "undefined"), "string");
        assert_eq!(strip_arm("string | null | undefined", "null"), "string | undefined");
        assert_eq!(strip_arm("Array<string | null>", "null"), "Array<string | null>");
        assert_eq!(strip_arm("string", "null"), "string");
        assert_eq!(strip_arm("\"a | null\" | null", "null"), "\"a | null\"");
    }

    #[test]
    fn object_hints() {
        let entries = vec![
            ("name".to_string(), "string".to_string(), false),
            ("age".to_string(), "number | undefined".to_string(), true),
            ("x-y".to_string(), "boolean".to_string(), false),
        ];
        assert_eq!(object(&entries, None), "{ name: string; age?: number; \"x-y\": boolean }");
        assert_eq!(object(&[], Some("number")), "{ [key: string]: number }");
        assert_eq!(object(&[], None), "{}");
    }

    #[test]
    fn enum_hint_is_sorted() {
        let values = vec!["C".to_string(), "A".to_string(), "B".to_string()];
        assert_eq!(enumeration(&values), "\"A\" | \"B\" | \"C\"");
    }

    #[test]
    fn readonly_round_trips() {
        assert_eq!(strip_wrapper(&readonly("string[]"), "Readonly"), "string[]");
        assert_eq!(strip_wrapper(&readonly_deep("{}"), "ReadonlyDeep"), "{}");
        assert_eq!(strip_wrapper("string", "Readonly"), "string");
    }
}
