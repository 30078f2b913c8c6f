//! The recursive matcher behind [`Constraint::validate`].

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;

use super::constraint::{
    Alternatives, ArrayDef, Constraint, Kind, Match, ObjectDef, Presence, SwitchDef, UnknownKeys,
};
use super::{Failure, Verdict};
use crate::config::Preferences;
use crate::value::{PathSegment, Value};

type Outcome = Result<Value, Vec<Failure>>;

impl Constraint {
    /// Match `value`; on success the (possibly coerced) value is returned.
    pub fn validate(&self, value: Value, prefs: &Preferences) -> Outcome {
        Walk { prefs, path: Vec::new() }.run(self, value)
    }
}

struct Walk<'p> {
    prefs: &'p Preferences,
    path: Vec<PathSegment>,
}

impl Walk<'_> {
    fn run(&mut self, c: &Constraint, value: Value) -> Outcome {
        let mut value = c.prepare.iter().fold(value, |v, m| m.apply(v));

        if value.is_undefined() {
            match (&c.default, c.presence) {
                (Some(default), _) => value = default.produce(),
                (None, Presence::Required) => {
                    return Err(vec![self.failure(c, "any.required", Value::Undefined)]);
                }
                (None, Presence::Optional) if matches!(c.kind, Kind::Alternatives(_)) => {
                    // an option may still substitute its own default
                    let out = self.check_kind(c, Value::Undefined).unwrap_or_default();
                    return Ok(self.finish(c, out));
                }
                (None, Presence::Optional | Presence::Forbidden) => {
                    return Ok(self.finish(c, Value::Undefined));
                }
            }
        }

        if c.invalid.contains(&value) {
            return Err(vec![self.failure(c, "any.invalid", value)]);
        }
        if c.allow.contains(&value) {
            return Ok(self.finish(c, value));
        }
        if c.presence == Presence::Forbidden && !value.is_undefined() {
            return Err(vec![self.failure(c, "any.unknown", value)]);
        }
        if c.only {
            let failure = self
                .failure(c, "any.only", value)
                .with("valids", Value::Array(c.allow.clone()));
            return Err(vec![failure]);
        }

        let mut value = self.check_kind(c, value)?;

        let mut failures = Vec::new();
        for rule in &c.rules {
            match rule.apply(&value, self.prefs) {
                Verdict::Pass => {}
                Verdict::Replace(next) => value = next,
                Verdict::Reject { kind, context, template } => {
                    let mut failure = self.failure(c, &kind, value.clone());
                    failure.context.extend(context);
                    failure.template = template.or(failure.template);
                    failures.push(failure);
                    if self.prefs.abort_early {
                        break;
                    }
                }
            }
        }
        if !failures.is_empty() {
            return Err(failures);
        }
        Ok(self.finish(c, value))
    }

    fn finish(&self, c: &Constraint, value: Value) -> Value {
        c.finalize.iter().fold(value, |v, m| m.apply(v))
    }

    fn failure(&self, c: &Constraint, kind: &str, value: Value) -> Failure {
        Failure {
            kind: kind.to_string(),
            path: self.path.clone(),
            value,
            context: IndexMap::new(),
            label: c.label.clone(),
            template: c.messages.get(kind).cloned(),
        }
    }

    fn nested(&mut self, segment: PathSegment, c: &Constraint, value: Value) -> Outcome {
        self.path.push(segment);
        let out = self.run(c, value);
        self.path.pop();
        out
    }

    // ————————————————————————————————————————————————————————————————————————
    // BASE TYPES
    // ————————————————————————————————————————————————————————————————————————

    fn check_kind(&mut self, c: &Constraint, value: Value) -> Outcome {
        let convert = self.prefs.convert;
        let base = |walk: &Self, name: &str, value: Value| -> Outcome {
            Err(vec![walk.failure(c, &format!("{name}.base"), value)])
        };
        match &c.kind {
            Kind::Any => Ok(value),
            Kind::String => match value.thaw() {
                s @ Value::String(_) => Ok(s),
                other => base(self, "string", other),
            },
            Kind::Number => match value.thaw() {
                Value::Number(n) if n.is_nan() => base(self, "number", Value::Number(n)),
                Value::Number(n) if n.is_infinite() => {
                    Err(vec![self.failure(c, "number.infinity", Value::Number(n))])
                }
                n @ Value::Number(_) => Ok(n),
                Value::String(s) if convert => match coerce_number(&s) {
                    Some(n) => Ok(Value::Number(n)),
                    None => base(self, "number", Value::String(s)),
                },
                other => base(self, "number", other),
            },
            Kind::Boolean => match value.thaw() {
                b @ Value::Bool(_) => Ok(b),
                Value::String(s) if convert && s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                Value::String(s) if convert && s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                other => base(self, "boolean", other),
            },
            Kind::Date => match value.thaw() {
                d @ Value::Date(_) => Ok(d),
                Value::String(s) if convert => match DateTime::parse_from_rfc3339(s.trim()) {
                    Ok(d) => Ok(Value::Date(d.with_timezone(&Utc))),
                    Err(_) => base(self, "date", Value::String(s)),
                },
                Value::Number(ms) if convert && ms.is_finite() => {
                    match Utc.timestamp_millis_opt(ms as i64).single() {
                        Some(d) => Ok(Value::Date(d)),
                        None => base(self, "date", Value::Number(ms)),
                    }
                }
                other => base(self, "date", other),
            },
            Kind::Array(def) => match value.thaw() {
                Value::Array(xs) => self.check_array(c, def, xs),
                other => base(self, "array", other),
            },
            Kind::Object(def) => match value.thaw() {
                Value::Object(map) => self.check_object(c, def, map),
                other => base(self, "object", other),
            },
            Kind::Alternatives(alt) => self.check_alternatives(c, alt, value),
            Kind::Switch(def) => match value.thaw() {
                Value::Object(map) => self.check_switch(c, def, map),
                other => base(self, "object", other),
            },
            Kind::Custom(custom) => match custom.check.call(&value, self.prefs) {
                Verdict::Pass => Ok(value),
                Verdict::Replace(next) => Ok(next),
                Verdict::Reject { kind, context, template } => {
                    let mut failure = self.failure(c, &kind, value);
                    failure.context.extend(context);
                    failure.template = template.or(failure.template);
                    Err(vec![failure])
                }
            },
        }
    }

    // ————————————————————————————————————————————————————————————————————————
    // COMPOSITES
    // ————————————————————————————————————————————————————————————————————————

    fn check_array(&mut self, c: &Constraint, def: &ArrayDef, xs: Vec<Value>) -> Outcome {
        let abort = self.prefs.abort_early;
        let mut failures = Vec::new();

        if def.items.is_none() && xs.len() > def.ordered.len() {
            let failure = self
                .failure(c, "array.orderedLength", Value::Array(xs.clone()))
                .with("limit", def.ordered.len() as f64);
            failures.push(failure);
            if abort {
                return Err(failures);
            }
        }

        let len = xs.len();
        let mut out = Vec::with_capacity(len);
        for (i, el) in xs.into_iter().enumerate() {
            let target = def.ordered.get(i).or(def.items.as_deref());
            let Some(target) = target else { break };
            match self.nested(PathSegment::Index(i), target, el) {
                Ok(v) => out.push(v),
                Err(fs) => {
                    failures.extend(fs);
                    if abort {
                        return Err(failures);
                    }
                }
            }
        }
        // positional slots the input did not reach; a later default keeps
        // its index, so skipped slots are filled with `undefined`
        for (i, target) in def.ordered.iter().enumerate().skip(len) {
            match self.nested(PathSegment::Index(i), target, Value::Undefined) {
                Ok(Value::Undefined) => {}
                Ok(v) => {
                    out.resize(i, Value::Undefined);
                    out.push(v);
                }
                Err(fs) => {
                    failures.extend(fs);
                    if abort {
                        return Err(failures);
                    }
                }
            }
        }

        if failures.is_empty() { Ok(Value::Array(out)) } else { Err(failures) }
    }

    fn check_object(
        &mut self,
        c: &Constraint,
        def: &ObjectDef,
        mut input: IndexMap<String, Value>,
    ) -> Outcome {
        let abort = self.prefs.abort_early;
        let mut failures = Vec::new();
        let mut out = IndexMap::with_capacity(input.len());

        for (key, key_c) in &def.keys {
            let present = input.shift_remove(key);
            let was_present = present.is_some();
            let segment = PathSegment::Key(key.clone());
            match self.nested(segment, key_c, present.unwrap_or_default()) {
                Ok(v) => {
                    if was_present || !v.is_undefined() {
                        out.insert(key.clone(), v);
                    }
                }
                Err(fs) => {
                    failures.extend(fs);
                    if abort {
                        return Err(failures);
                    }
                }
            }
        }

        for (key, v) in input {
            let segment = PathSegment::Key(key.clone());
            if let Some(pattern) = &def.pattern {
                if let Some(key_c) = &pattern.key {
                    if let Err(fs) = self.nested(segment.clone(), key_c, Value::String(key.clone())) {
                        failures.extend(fs);
                        if abort {
                            return Err(failures);
                        }
                        continue;
                    }
                }
                match self.nested(segment, &pattern.value, v) {
                    Ok(v) => {
                        out.insert(key, v);
                    }
                    Err(fs) => {
                        failures.extend(fs);
                        if abort {
                            return Err(failures);
                        }
                    }
                }
                continue;
            }
            match def.unknown {
                UnknownKeys::Strip => {}
                UnknownKeys::Passthrough => {
                    out.insert(key, v);
                }
                UnknownKeys::Strict => {
                    self.path.push(segment);
                    let failure = self.failure(c, "object.unknown", v).with("child", key.as_str());
                    self.path.pop();
                    failures.push(failure);
                    if abort {
                        return Err(failures);
                    }
                }
            }
        }

        if failures.is_empty() { Ok(Value::Object(out)) } else { Err(failures) }
    }

    fn check_alternatives(&mut self, c: &Constraint, alt: &Alternatives, value: Value) -> Outcome {
        match alt.mode {
            Match::Any => {
                let mut attempts = Vec::with_capacity(alt.options.len());
                for option in &alt.options {
                    match self.run(option, value.clone()) {
                        Ok(v) => return Ok(v),
                        Err(fs) => attempts.push(fs),
                    }
                }
                Err(self.explain_mismatch(c, value, attempts))
            }
            Match::All => {
                let mut outputs = Vec::with_capacity(alt.options.len());
                let mut failures = Vec::new();
                for option in &alt.options {
                    match self.run(option, value.clone()) {
                        Ok(v) => outputs.push(v),
                        Err(fs) => {
                            failures.extend(fs);
                            if self.prefs.abort_early {
                                return Err(failures);
                            }
                        }
                    }
                }
                if !failures.is_empty() {
                    return Err(failures);
                }
                let mut merged = outputs.into_iter();
                let Some(first) = merged.next() else { return Ok(value) };
                Ok(merged.fold(first, merge_outputs))
            }
        }
    }

    /// Report a value no option accepted. When exactly one option got past its
    /// base type check its own failures are the most useful report; when all
    /// options rejected the type, name the expected types.
    fn explain_mismatch(&self, c: &Constraint, value: Value, attempts: Vec<Vec<Failure>>) -> Vec<Failure> {
        let depth = self.path.len();
        let type_mismatch =
            |fs: &Vec<Failure>| fs.iter().all(|f| f.is_base() && f.path.len() == depth);
        let mut typed: Vec<Vec<Failure>> = Vec::new();
        let mut types: Vec<Value> = Vec::new();
        for fs in attempts {
            if type_mismatch(&fs) {
                for f in &fs {
                    let ty = Value::from(f.type_name());
                    if !types.contains(&ty) {
                        types.push(ty);
                    }
                }
            } else {
                typed.push(fs);
            }
        }
        match typed.len() {
            0 => vec![self.failure(c, "alternatives.types", value).with("types", Value::Array(types))],
            1 => typed.remove(0),
            _ => vec![self.failure(c, "alternatives.match", value)],
        }
    }

    fn check_switch(&mut self, c: &Constraint, def: &SwitchDef, map: IndexMap<String, Value>) -> Outcome {
        let tag = map.get(&def.key).cloned().unwrap_or_default();
        match def.cases.iter().find(|(literal, _)| *literal == tag) {
            Some((_, case)) => self.run(case, Value::Object(map)),
            None => {
                let valids = Value::Array(def.cases.iter().map(|(v, _)| v.clone()).collect());
                self.path.push(PathSegment::Key(def.key.clone()));
                let failure = self
                    .failure(c, "alternatives.discriminator", tag)
                    .with("valids", valids)
                    .with("key", def.key.as_str());
                self.path.pop();
                Err(vec![failure])
            }
        }
    }
}

impl Failure {
    pub(crate) fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

fn coerce_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Combine the outputs of an all-match constraint. Objects merge key-wise
/// and equal-length arrays element-wise; otherwise the later output wins.
fn merge_outputs(a: Value, b: Value) -> Value {
    match (a.thaw(), b.thaw()) {
        (Value::Object(mut left), Value::Object(right)) => {
            for (key, rv) in right {
                let merged = match left.get_mut(&key) {
                    Some(lv) => merge_outputs(std::mem::take(lv), rv),
                    None => rv,
                };
                left.insert(key, merged);
            }
            Value::Object(left)
        }
        (Value::Array(left), Value::Array(right)) if left.len() == right.len() => {
            Value::Array(left.into_iter().zip(right).map(|(l, r)| merge_outputs(l, r)).collect())
        }
        (_, right) => right,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Pattern, Rule};
    use crate::value;

    fn prefs() -> Preferences {
        Preferences::default()
    }

    fn kinds(out: Outcome) -> Vec<String> {
        out.err().unwrap_or_default().into_iter().map(|f| f.kind).collect()
    }

    #[test]
    fn required_undefined_fails() {
        assert_eq!(kinds(Constraint::string().validate(Value::Undefined, &prefs())), ["any.required"]);
    }

    #[test]
    fn default_substitutes_before_checks() {
        let c = Constraint::number()
            .default_value(crate::engine::DefaultValue::Fixed(Value::Number(3.0)))
            .rule(Rule::Min(1.0));
        assert_eq!(c.validate(Value::Undefined, &prefs()).ok(), Some(Value::Number(3.0)));
    }

    #[test]
    fn number_coercion_respects_convert() {
        let c = Constraint::number();
        assert_eq!(c.validate(Value::from("4.5"), &prefs()).ok(), Some(Value::Number(4.5)));
        let strict = Preferences { convert: false, ..prefs() };
        assert_eq!(kinds(c.validate(Value::from("4.5"), &strict)), ["number.base"]);
    }

    #[test]
    fn object_modes() {
        let mut keys = IndexMap::new();
        keys.insert("name".to_string(), Constraint::string());
        let strip = Constraint::object(keys.clone());
        let input = value!({"name": "x", "extra": 1});
        assert_eq!(strip.validate(input.clone(), &prefs()).ok(), Some(value!({"name": "x"})));

        let mut strict = Constraint::object(keys);
        if let Kind::Object(def) = strict.kind_mut() {
            def.unknown = UnknownKeys::Strict;
        }
        let errs = strict.validate(input, &prefs()).err().unwrap_or_default();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, "object.unknown");
        assert_eq!(errs[0].path, vec![PathSegment::from("extra")]);
    }

    #[test]
    fn pattern_validates_unknown_keys() {
        let mut c = Constraint::object(IndexMap::new());
        if let Kind::Object(def) = c.kind_mut() {
            def.pattern = Some(Pattern { key: None, value: Box::new(Constraint::number()) });
        }
        let errs = kinds(c.validate(value!({"a": 1, "b": "x"}), &prefs()));
        assert_eq!(errs, ["number.base"]);
    }

    #[test]
    fn collects_all_failures_unless_abort_early() {
        let c = Constraint::array(Constraint::string()).rule(Rule::MinItems(5));
        let input = value!([1, 2]);
        assert_eq!(kinds(c.validate(input.clone(), &prefs())), ["string.base", "string.base"]);
        let abort = Preferences { abort_early: true, ..prefs() };
        assert_eq!(kinds(c.validate(input, &abort)), ["string.base"]);
    }

    #[test]
    fn tuple_extra_elements() {
        let c = Constraint::tuple(vec![Constraint::string()], None);
        assert_eq!(kinds(c.validate(value!(["a", "b"]), &prefs())), ["array.orderedLength"]);
        let with_rest = Constraint::tuple(vec![Constraint::string()], Some(Constraint::number()));
        assert!(with_rest.validate(value!(["a", 1, 2]), &prefs()).is_ok());
    }

    #[test]
    fn alternatives_report_types_when_nothing_matches_type() {
        let c = Constraint::string().concat(Constraint::number());
        let errs = c.validate(Value::Bool(true), &prefs()).err().unwrap_or_default();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, "alternatives.types");
        assert_eq!(errs[0].context.get("types"), Some(&value!(["string", "number"])));
    }

    #[test]
    fn alternatives_surface_the_single_type_match() {
        let c = Constraint::string().rule(Rule::MinLength(3)).concat(Constraint::number());
        assert_eq!(kinds(c.validate(Value::from("ab"), &prefs())), ["string.min"]);
    }

    #[test]
    fn all_match_merges_objects() {
        let mut a = IndexMap::new();
        a.insert("a".to_string(), Constraint::number());
        let mut b = IndexMap::new();
        b.insert("b".to_string(), Constraint::string());
        let c = Constraint::join(vec![Constraint::object(a), Constraint::object(b)], Match::All);
        let out = c.validate(value!({"a": 1, "b": "x", "c": true}), &prefs()).ok();
        assert_eq!(out, Some(value!({"a": 1, "b": "x"})));
    }

    #[test]
    fn switch_dispatches_on_tag() {
        let mut a = IndexMap::new();
        a.insert("kind".to_string(), Constraint::valid(vec![Value::from("a")]));
        a.insert("x".to_string(), Constraint::number());
        let c = Constraint::switch("kind", vec![(Value::from("a"), Constraint::object(a))]);
        assert!(c.validate(value!({"kind": "a", "x": 1}), &prefs()).is_ok());
        let errs = c.validate(value!({"kind": "z"}), &prefs()).err().unwrap_or_default();
        assert_eq!(errs[0].kind, "alternatives.discriminator");
        assert_eq!(errs[0].path, vec![PathSegment::from("kind")]);
    }

    #[test]
    fn frozen_input_is_validated_through() {
        let c = Constraint::array(Constraint::number());
        let out = c.validate(value!([1, 2]).freeze(), &prefs());
        assert_eq!(out.ok(), Some(value!([1, 2])));
    }
}
