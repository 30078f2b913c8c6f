//! Parse-time value model.
//!
//! Schemas validate dynamically-shaped input, so everything flowing through a
//! parse is a [`Value`]. The model is a superset of JSON: it keeps
//! `undefined` apart from `null`, carries big integers, symbols, dates and
//! native map/set collections, and can mark a subtree immutable (`Frozen`).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    Symbol(Symbol),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    /// Insertion-ordered entries; keys may be any value.
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    /// Immutable, shared subtree produced by `readonly` schemas.
    Frozen(Arc<Value>),
}

/// Unique symbol. Two symbols are equal only if they are the same symbol,
/// whatever their descriptions say.
#[derive(Clone, Debug)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

/// One step of an issue path: an object key or an array index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

// ————————————————————————————————————————————————————————————————————————————
// SYMBOL
// ————————————————————————————————————————————————————————————————————————————

impl Symbol {
    pub fn new(description: impl Into<String>) -> Self {
        let description: String = description.into();
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: Some(Arc::from(description)),
        }
    }
    pub fn anonymous() -> Self {
        Self { id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed), description: None }
    }
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or_default())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALUE
// ————————————————————————————————————————————————————————————————————————————

impl Value {
    pub fn bigint(n: i128) -> Self {
        Value::BigInt(n)
    }

    /// Runtime type name as used in issue messages and hints.
    pub fn type_name(&self) -> &'static str {
        match self.resolved() {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Frozen(inner) => inner.type_name(),
        }
    }

    /// Look through any number of `Frozen` layers.
    pub fn resolved(&self) -> &Value {
        let mut current = self;
        while let Value::Frozen(inner) = current {
            current = inner;
        }
        current
    }

    /// Take ownership of the content behind `Frozen` layers, cloning only when
    /// the shared subtree is still referenced elsewhere.
    pub fn thaw(self) -> Value {
        match self {
            Value::Frozen(inner) => Arc::unwrap_or_clone(inner).thaw(),
            other => other,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.resolved(), Value::Undefined)
    }
    pub fn is_null(&self) -> bool {
        matches!(self.resolved(), Value::Null)
    }
    pub fn is_frozen(&self) -> bool {
        matches!(self, Value::Frozen(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.resolved() {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self.resolved() {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self.resolved() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_array(&self) -> Option<&[Value]> {
        match self.resolved() {
            Value::Array(xs) => Some(xs),
            _ => None,
        }
    }
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self.resolved() {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Shallow freeze: the container becomes immutable, children untouched.
    pub fn freeze(self) -> Value {
        match self {
            Value::Array(_) | Value::Object(_) | Value::Map(_) | Value::Set(_) => {
                Value::Frozen(Arc::new(self))
            }
            other => other,
        }
    }

    /// Deep freeze: every nested container is frozen too.
    pub fn freeze_deep(self) -> Value {
        let thawed = self.thaw();
        let frozen_children = match thawed {
            Value::Array(xs) => Value::Array(xs.into_iter().map(Value::freeze_deep).collect()),
            Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, v.freeze_deep())).collect(),
            ),
            Value::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.freeze_deep(), v.freeze_deep()))
                    .collect(),
            ),
            Value::Set(xs) => Value::Set(xs.into_iter().map(Value::freeze_deep).collect()),
            scalar => return scalar,
        };
        frozen_children.freeze()
    }

    /// True when every container in the subtree is frozen.
    pub fn is_deep_frozen(&self) -> bool {
        match self {
            Value::Frozen(inner) => match inner.resolved() {
                Value::Array(xs) | Value::Set(xs) => xs.iter().all(Value::is_deep_frozen),
                Value::Object(map) => map.values().all(Value::is_deep_frozen),
                Value::Map(entries) => entries
                    .iter()
                    .all(|(k, v)| k.is_deep_frozen() && v.is_deep_frozen()),
                _ => true,
            },
            Value::Array(_) | Value::Object(_) | Value::Map(_) | Value::Set(_) => false,
            _ => true,
        }
    }

    /// Lossy JSON projection used for manifests and serialized output.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self.resolved() {
            Value::Undefined | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            // integral numbers keep an integer representation
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                Json::Number(serde_json::Number::from(*n as i64))
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::BigInt(n) => Json::String(n.to_string()),
            Value::String(s) => Json::String(s.clone()),
            Value::Symbol(sym) => Json::String(sym.to_string()),
            Value::Date(d) => Json::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Array(xs) | Value::Set(xs) => Json::Array(xs.iter().map(Value::to_json).collect()),
            Value::Object(map) => Json::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Map(entries) => Json::Array(
                entries
                    .iter()
                    .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
            Value::Frozen(inner) => inner.to_json(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.resolved(), other.resolved()) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            _ => false,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONVERSIONS
// ————————————————————————————————————————————————————————————————————————————

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(xs) => Value::Array(xs.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}
impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}
impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Value::Symbol(sym)
    }
}
impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}
impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self {
        Value::Array(xs)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, xs: &[Value]) -> fmt::Result {
            for (i, x) in xs.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{x}")?;
            }
            Ok(())
        }
        match self.resolved() {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.is_nan() => f.write_str("NaN"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) => write!(f, "{n}"),
            Value::BigInt(n) => write!(f, "{n}n"),
            Value::String(s) => write!(f, "{}", serde_json::Value::String(s.clone())),
            Value::Symbol(sym) => write!(f, "{sym}"),
            Value::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Array(xs) => {
                f.write_str("[")?;
                list(f, xs)?;
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {v}", serde_json::Value::String(k.clone()))?;
                }
                f.write_str("}")
            }
            Value::Map(entries) => {
                f.write_str("Map {")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} => {v}")?;
                }
                f.write_str("}")
            }
            Value::Set(xs) => {
                f.write_str("Set {")?;
                list(f, xs)?;
                f.write_str("}")
            }
            Value::Frozen(inner) => write!(f, "{inner}"),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self {
        PathSegment::Key(k.to_string())
    }
}
impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// Build a [`Value`] from JSON literal syntax.
///
/// ```
/// let v = schemata::value!({"name": "x", "tags": ["a"]});
/// assert_eq!(v.get("name").and_then(|n| n.as_str()), Some("x"));
/// ```
#[macro_export]
macro_rules! value {
    ($($json:tt)+) => {
        $crate::Value::from($crate::__json::json!($($json)+))
    };
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
