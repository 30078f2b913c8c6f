//! Parse preferences.
//!
//! Three layers feed one parse, later layers winning key by key:
//! process defaults ([`Preferences::global`]) → the node's own
//! [`PreferencesPatch`] → the call-site [`ParseOptions`].
//!
//! The process default is installed at most once, at startup. Code that must
//! not depend on process state threads a [`Preferences`] explicitly through
//! `Parser::with_preferences`.

use indexmap::IndexMap;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

static GLOBAL: OnceCell<Preferences> = OnceCell::new();
static BUILTIN: Lazy<Preferences> = Lazy::new(Preferences::default);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Stop at the first failure.
    pub abort_early: bool,
    /// Coerce strings to numbers/booleans/dates and apply normalising rules.
    pub convert: bool,
    /// Issue code → message template overrides.
    pub messages: IndexMap<String, String>,
}

/// Sparse override of [`Preferences`]; `None` keeps the lower layer's value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    pub abort_early: Option<bool>,
    pub convert: Option<bool>,
    pub messages: IndexMap<String, String>,
}

/// Call-site options for `parse`, `safe_parse`, `parse_async`, `is_valid`.
#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    pub prefs: PreferencesPatch,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { abort_early: false, convert: true, messages: IndexMap::new() }
    }
}

impl Preferences {
    /// Install the process-wide defaults. Succeeds once; later calls fail
    /// instead of silently changing what every node reads.
    pub fn install(prefs: Preferences) -> Result<(), SchemaError> {
        GLOBAL.set(prefs).map_err(|_| SchemaError::PreferencesAlreadyInstalled)?;
        tracing::debug!("installed process-wide parse preferences");
        Ok(())
    }

    /// Process-wide defaults, or the built-in defaults if none were installed.
    pub fn global() -> &'static Preferences {
        GLOBAL.get().unwrap_or(&*BUILTIN)
    }

    /// Apply a patch on top of `self`. Message maps merge key by key.
    pub fn merged(&self, patch: &PreferencesPatch) -> Preferences {
        let mut out = self.clone();
        if let Some(abort_early) = patch.abort_early {
            out.abort_early = abort_early;
        }
        if let Some(convert) = patch.convert {
            out.convert = convert;
        }
        for (code, template) in &patch.messages {
            out.messages.insert(code.clone(), template.clone());
        }
        out
    }
}

impl PreferencesPatch {
    pub fn abort_early(mut self, on: bool) -> Self {
        self.abort_early = Some(on);
        self
    }
    pub fn convert(mut self, on: bool) -> Self {
        self.convert = Some(on);
        self
    }
    pub fn message(mut self, code: impl Into<String>, template: impl Into<String>) -> Self {
        self.messages.insert(code.into(), template.into());
        self
    }

    /// Stack `other` on top of `self`.
    pub fn layered(&self, other: &PreferencesPatch) -> PreferencesPatch {
        let mut out = self.clone();
        if other.abort_early.is_some() {
            out.abort_early = other.abort_early;
        }
        if other.convert.is_some() {
            out.convert = other.convert;
        }
        for (code, template) in &other.messages {
            out.messages.insert(code.clone(), template.clone());
        }
        out
    }
}

impl ParseOptions {
    pub fn abort_early() -> Self {
        Self { prefs: PreferencesPatch::default().abort_early(true) }
    }
    pub fn no_convert() -> Self {
        Self { prefs: PreferencesPatch::default().convert(false) }
    }
}

impl From<PreferencesPatch> for ParseOptions {
    fn from(prefs: PreferencesPatch) -> Self {
        Self { prefs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layers_win() {
        let base = Preferences::default().merged(&PreferencesPatch::default().convert(false));
        assert!(!base.convert);
        let call = base.merged(&PreferencesPatch::default().abort_early(true).convert(true));
        assert!(call.abort_early);
        assert!(call.convert);
    }

    #[test]
    fn messages_merge_per_code() {
        let node = PreferencesPatch::default().message("a.x", "node").message("a.y", "node");
        let call = PreferencesPatch::default().message("a.y", "call");
        let prefs = Preferences::default().merged(&node).merged(&call);
        assert_eq!(prefs.messages.get("a.x").map(String::as_str), Some("node"));
        assert_eq!(prefs.messages.get("a.y").map(String::as_str), Some("call"));
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let prefs: Preferences = serde_json::from_value(serde_json::json!({
            "abortEarly": true,
            "messages": {"any.required": "{{#label}} please"}
        }))
        .unwrap();
        assert!(prefs.abort_early);
        assert!(prefs.convert);
        assert_eq!(prefs.messages.len(), 1);
    }

    #[test]
    fn global_falls_back_to_builtin() {
        let prefs = Preferences::global();
        assert!(prefs.convert || GLOBAL.get().is_some());
    }
}
