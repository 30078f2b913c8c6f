//! Named pre-/post-parse transformations attached to a node.

use std::fmt;
use std::sync::Arc;

use crate::engine::Mapper;
use crate::value::Value;

pub type Handler = Arc<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Raw input, before the engine sees it.
    BeforeParse,
    /// Accepted engine output. Never runs on rejection.
    AfterParse,
}

#[derive(Clone)]
pub struct Hook {
    name: String,
    handler: Handler,
}

#[derive(Clone, Debug, Default)]
pub struct HookSet {
    before_parse: Vec<Hook>,
    after_parse: Vec<Hook>,
}

impl Hook {
    pub fn new(name: impl Into<String>, handler: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self { name: name.into(), handler: Arc::new(handler) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, value: Value) -> Value {
        (self.handler)(value)
    }
}

impl HookSet {
    fn list(&self, trigger: Trigger) -> &Vec<Hook> {
        match trigger {
            Trigger::BeforeParse => &self.before_parse,
            Trigger::AfterParse => &self.after_parse,
        }
    }

    fn list_mut(&mut self, trigger: Trigger) -> &mut Vec<Hook> {
        match trigger {
            Trigger::BeforeParse => &mut self.before_parse,
            Trigger::AfterParse => &mut self.after_parse,
        }
    }

    /// Append `hook` unless one with the same name is already registered for
    /// `trigger`. Returns whether it was added.
    pub fn add(&mut self, trigger: Trigger, hook: Hook) -> bool {
        if self.contains(trigger, &hook.name) {
            return false;
        }
        self.list_mut(trigger).push(hook);
        true
    }

    /// Returns whether a hook was removed.
    pub fn remove(&mut self, trigger: Trigger, name: &str) -> bool {
        let list = self.list_mut(trigger);
        let before = list.len();
        list.retain(|hook| hook.name != name);
        list.len() != before
    }

    pub fn contains(&self, trigger: Trigger, name: &str) -> bool {
        self.list(trigger).iter().any(|hook| hook.name == name)
    }

    pub fn hooks(&self, trigger: Trigger) -> &[Hook] {
        self.list(trigger)
    }

    pub fn is_empty(&self) -> bool {
        self.before_parse.is_empty() && self.after_parse.is_empty()
    }

    /// Fold `value` through the hooks of `trigger` in insertion order. A
    /// panicking handler propagates to the caller.
    pub fn apply(&self, trigger: Trigger, value: Value) -> Value {
        self.list(trigger).iter().fold(value, |value, hook| {
            tracing::trace!(hook = %hook.name, ?trigger, "applying hook");
            hook.call(value)
        })
    }

    /// Engine-level steps equivalent to the hooks of `trigger`, for nodes that
    /// are embedded inside a composite constraint.
    pub(crate) fn mappers(&self, trigger: Trigger) -> Vec<Mapper> {
        self.list(trigger)
            .iter()
            .map(|hook| Mapper::from_arc(hook.handler.clone()))
            .collect()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append(suffix: &'static str) -> impl Fn(Value) -> Value + Send + Sync {
        move |v| Value::from(format!("{}{suffix}", v.as_str().unwrap_or_default()))
    }

    #[test]
    fn add_is_idempotent_by_name() {
        let mut set = HookSet::default();
        assert!(set.add(Trigger::AfterParse, Hook::new("x", append("1"))));
        assert!(!set.add(Trigger::AfterParse, Hook::new("x", append("2"))));
        assert!(set.add(Trigger::BeforeParse, Hook::new("x", append("3"))));
        assert_eq!(set.hooks(Trigger::AfterParse).len(), 1);
        assert_eq!(set.apply(Trigger::AfterParse, Value::from("v")), Value::from("v1"));
    }

    #[test]
    fn apply_runs_in_insertion_order() {
        let mut set = HookSet::default();
        set.add(Trigger::BeforeParse, Hook::new("a", append("a")));
        set.add(Trigger::BeforeParse, Hook::new("b", append("b")));
        assert_eq!(set.apply(Trigger::BeforeParse, Value::from("")), Value::from("ab"));
    }

    #[test]
    fn remove_targets_one_trigger() {
        let mut set = HookSet::default();
        set.add(Trigger::BeforeParse, Hook::new("a", append("a")));
        set.add(Trigger::AfterParse, Hook::new("a", append("a")));
        assert!(set.remove(Trigger::AfterParse, "a"));
        assert!(!set.remove(Trigger::AfterParse, "a"));
        assert!(set.contains(Trigger::BeforeParse, "a"));
    }
}
