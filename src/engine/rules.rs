//! Bound and format rules evaluated after a value passed its base type check.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::Verdict;
use super::constraint::CustomCheck;
use crate::config::Preferences;
use crate::value::Value;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex compiles")
});
static URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s]+$").expect("uri regex compiles")
});
static GUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}$")
        .expect("guid regex compiles")
});

#[derive(Clone, Debug)]
pub enum Rule {
    // strings
    MinLength(usize),
    MaxLength(usize),
    Length(usize),
    Pattern { regex: Regex, name: Option<String> },
    Email,
    Uri,
    Guid,
    Trim,
    Lowercase,
    Uppercase,
    // numbers
    Min(f64),
    Max(f64),
    Greater(f64),
    Less(f64),
    Integer,
    Multiple(f64),
    // arrays and sets
    MinItems(usize),
    MaxItems(usize),
    Items(usize),
    Sort(SortOrder),
    // dates
    After(DateTime<Utc>),
    Before(DateTime<Utc>),
    Custom(CustomCheck),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

impl Rule {
    /// Evaluate against a value that already passed the base type check.
    pub fn apply(&self, value: &Value, prefs: &Preferences) -> Verdict {
        match (self, value.resolved()) {
            (Rule::MinLength(n), Value::String(s)) => {
                check(s.chars().count() >= *n, "string.min").with("limit", *n as f64)
            }
            (Rule::MaxLength(n), Value::String(s)) => {
                check(s.chars().count() <= *n, "string.max").with("limit", *n as f64)
            }
            (Rule::Length(n), Value::String(s)) => {
                check(s.chars().count() == *n, "string.length").with("limit", *n as f64)
            }
            (Rule::Pattern { regex, name }, Value::String(s)) => {
                if regex.is_match(s) {
                    Verdict::Pass
                } else if let Some(name) = name {
                    Verdict::reject("string.pattern.name").with("name", name.as_str())
                } else {
                    Verdict::reject("string.pattern.base").with("regex", regex.as_str())
                }
            }
            (Rule::Email, Value::String(s)) => check(EMAIL.is_match(s), "string.email"),
            (Rule::Uri, Value::String(s)) => check(URI.is_match(s), "string.uri"),
            (Rule::Guid, Value::String(s)) => check(GUID.is_match(s), "string.guid"),
            (Rule::Trim, Value::String(s)) => {
                rewrite(s, s.trim().to_string(), prefs, "string.trim")
            }
            (Rule::Lowercase, Value::String(s)) => {
                rewrite(s, s.to_lowercase(), prefs, "string.lowercase")
            }
            (Rule::Uppercase, Value::String(s)) => {
                rewrite(s, s.to_uppercase(), prefs, "string.uppercase")
            }

            (Rule::Min(limit), Value::Number(n)) => check(n >= limit, "number.min").with("limit", *limit),
            (Rule::Max(limit), Value::Number(n)) => check(n <= limit, "number.max").with("limit", *limit),
            (Rule::Greater(limit), Value::Number(n)) => {
                check(n > limit, "number.greater").with("limit", *limit)
            }
            (Rule::Less(limit), Value::Number(n)) => check(n < limit, "number.less").with("limit", *limit),
            (Rule::Integer, Value::Number(n)) => check(n.fract() == 0.0, "number.integer"),
            (Rule::Multiple(base), Value::Number(n)) => {
                check(is_multiple(*n, *base), "number.multiple").with("multiple", *base)
            }

            (Rule::MinItems(n), Value::Array(xs) | Value::Set(xs)) => {
                check(xs.len() >= *n, "array.min").with("limit", *n as f64)
            }
            (Rule::MaxItems(n), Value::Array(xs) | Value::Set(xs)) => {
                check(xs.len() <= *n, "array.max").with("limit", *n as f64)
            }
            (Rule::Items(n), Value::Array(xs) | Value::Set(xs)) => {
                check(xs.len() == *n, "array.length").with("limit", *n as f64)
            }
            (Rule::Sort(order), Value::Array(xs)) => check_sorted(xs, *order),

            (Rule::After(limit), Value::Date(d)) => {
                check(d >= limit, "date.min").with("limit", Value::Date(*limit))
            }
            (Rule::Before(limit), Value::Date(d)) => {
                check(d <= limit, "date.max").with("limit", Value::Date(*limit))
            }

            (Rule::Custom(custom), _) => custom.call(value, prefs),
            // a rule on a value of another kind never applies
            _ => Verdict::Pass,
        }
    }
}

fn check(ok: bool, kind: &str) -> Verdict {
    if ok { Verdict::Pass } else { Verdict::reject(kind) }
}

/// Under `convert` a normalising rule rewrites the value; otherwise it only
/// verifies the value already is normalised.
fn rewrite(original: &str, normalised: String, prefs: &Preferences, kind: &str) -> Verdict {
    if original == normalised {
        Verdict::Pass
    } else if prefs.convert {
        Verdict::Replace(Value::String(normalised))
    } else {
        Verdict::reject(kind)
    }
}

fn is_multiple(n: f64, base: f64) -> bool {
    if base == 0.0 {
        return false;
    }
    let ratio = n / base;
    (ratio - ratio.round()).abs() < 1e-9
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a.resolved(), b.resolved()) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::BigInt(x), Value::BigInt(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Date(x), Value::Date(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn check_sorted(xs: &[Value], order: SortOrder) -> Verdict {
    for pair in xs.windows(2) {
        let Some(ordering) = compare(&pair[0], &pair[1]) else {
            return Verdict::reject("array.sort.mismatching");
        };
        let in_order = match order {
            SortOrder::Ascending => ordering != Ordering::Greater,
            SortOrder::Descending => ordering != Ordering::Less,
        };
        if !in_order {
            return Verdict::reject("array.sort").with("order", order.as_str());
        }
    }
    Verdict::Pass
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(v: Verdict) -> Option<String> {
        match v {
            Verdict::Reject { kind, .. } => Some(kind),
            _ => None,
        }
    }

    #[test]
    fn string_bounds_count_chars() {
        let prefs = Preferences::default();
        let v = Value::from("αβγ");
        assert!(kind(Rule::MaxLength(3).apply(&v, &prefs)).is_none());
        assert_eq!(kind(Rule::MinLength(4).apply(&v, &prefs)).as_deref(), Some("string.min"));
    }

    #[test]
    fn trim_rewrites_only_when_converting() {
        let v = Value::from("  x ");
        let converting = Preferences::default();
        assert!(matches!(Rule::Trim.apply(&v, &converting), Verdict::Replace(Value::String(s)) if s == "x"));
        let strict = Preferences { convert: false, ..Preferences::default() };
        assert_eq!(kind(Rule::Trim.apply(&v, &strict)).as_deref(), Some("string.trim"));
    }

    #[test]
    fn sort_order_and_mismatch() {
        let prefs = Preferences::default();
        let asc = crate::value!([1, 2, 2, 5]);
        assert!(kind(Rule::Sort(SortOrder::Ascending).apply(&asc, &prefs)).is_none());
        assert_eq!(
            kind(Rule::Sort(SortOrder::Descending).apply(&asc, &prefs)).as_deref(),
            Some("array.sort")
        );
        let mixed = crate::value!([1, "a"]);
        assert_eq!(
            kind(Rule::Sort(SortOrder::Ascending).apply(&mixed, &prefs)).as_deref(),
            Some("array.sort.mismatching")
        );
    }

    #[test]
    fn multiple_tolerates_float_noise() {
        let prefs = Preferences::default();
        assert!(kind(Rule::Multiple(0.1).apply(&Value::Number(0.3), &prefs)).is_none());
        assert!(kind(Rule::Multiple(3.0).apply(&Value::Number(10.0), &prefs)).is_some());
    }

    #[test]
    fn formats() {
        let prefs = Preferences::default();
        assert!(kind(Rule::Email.apply(&Value::from("a@b.co"), &prefs)).is_none());
        assert!(kind(Rule::Email.apply(&Value::from("nope"), &prefs)).is_some());
        assert!(kind(Rule::Uri.apply(&Value::from("https://x.y/z"), &prefs)).is_none());
        assert!(
            kind(Rule::Guid.apply(&Value::from("123e4567-e89b-12d3-a456-426614174000"), &prefs)).is_none()
        );
    }
}
