//! Property dispatch tables.
//!
//! Each view-manager type declares its props once, through an explicit
//! builder, and the finished table is cached behind a `OnceLock` for the
//! process lifetime. Dispatch is a case-sensitive name lookup; unknown names
//! are ignored so newer description-side code can ship props this build does
//! not know yet.

use std::collections::HashMap;

use serde_json::{Map, Value};

use casement_core::{CoerceError, ColorParseError, TransformError};
use casement_host::{HostError, ViewHandle};

use crate::manager::UiCtx;

/// Failure of a single property application. Never escalates past the one
/// property it belongs to.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropError {
    #[error(transparent)]
    Coerce(#[from] CoerceError),
    #[error(transparent)]
    Color(#[from] ColorParseError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// A declared default, re-applied when the wire sends an explicit null for
/// the prop ("prop reset").
#[derive(Clone, Copy, Debug)]
pub enum PropDefault {
    Number(f64),
    Bool(bool),
    Str(&'static str),
}

impl PropDefault {
    pub fn to_value(self) -> Value {
        match self {
            PropDefault::Number(n) => Value::from(n),
            PropDefault::Bool(b) => Value::Bool(b),
            PropDefault::Str(s) => Value::from(s),
        }
    }
}

pub type PropSetter = fn(&mut UiCtx<'_>, ViewHandle, &Value) -> Result<(), PropError>;

struct PropEntry {
    default: Option<PropDefault>,
    setter: PropSetter,
}

#[derive(Debug)]
pub enum ApplyOutcome {
    Applied,
    /// Forward-compatibility: the name is not in the table and was skipped.
    Unknown,
    Failed(PropError),
}

pub struct PropTable {
    entries: HashMap<&'static str, PropEntry>,
}

impl PropTable {
    pub fn builder() -> PropTableBuilder {
        PropTableBuilder {
            entries: HashMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn apply(
        &self,
        ctx: &mut UiCtx<'_>,
        view: ViewHandle,
        name: &str,
        value: &Value,
    ) -> ApplyOutcome {
        let Some(entry) = self.entries.get(name) else {
            log::debug!("ignoring unknown property `{name}`");
            return ApplyOutcome::Unknown;
        };
        let reset;
        let effective = if value.is_null() {
            match entry.default {
                Some(default) => {
                    reset = default.to_value();
                    &reset
                }
                // No declared default: the setter sees the null and decides
                // what "cleared" means for its type.
                None => value,
            }
        } else {
            value
        };
        match (entry.setter)(ctx, view, effective) {
            Ok(()) => ApplyOutcome::Applied,
            Err(err) => ApplyOutcome::Failed(err),
        }
    }

    /// Applies a whole update payload; failures are collected per property
    /// and the rest of the payload still goes through.
    pub fn apply_object(
        &self,
        ctx: &mut UiCtx<'_>,
        view: ViewHandle,
        props: &Map<String, Value>,
    ) -> Vec<(String, PropError)> {
        let mut failures = Vec::new();
        for (name, value) in props {
            if let ApplyOutcome::Failed(error) = self.apply(ctx, view, name, value) {
                log::warn!("applying `{name}` failed: {error}");
                failures.push((name.clone(), error));
            }
        }
        failures
    }
}

pub struct PropTableBuilder {
    entries: HashMap<&'static str, PropEntry>,
}

impl PropTableBuilder {
    pub fn prop(self, name: &'static str, setter: PropSetter) -> Self {
        self.insert(name, None, setter)
    }

    pub fn prop_with_default(
        self,
        name: &'static str,
        default: PropDefault,
        setter: PropSetter,
    ) -> Self {
        self.insert(name, Some(default), setter)
    }

    fn insert(
        mut self,
        name: &'static str,
        default: Option<PropDefault>,
        setter: PropSetter,
    ) -> Self {
        let previous = self.entries.insert(name, PropEntry { default, setter });
        assert!(
            previous.is_none(),
            "duplicate property `{name}` in dispatch table"
        );
        self
    }

    pub fn build(self) -> PropTable {
        PropTable {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop(_: &mut UiCtx<'_>, _: ViewHandle, _: &Value) -> Result<(), PropError> {
        Ok(())
    }

    #[test]
    #[should_panic(expected = "duplicate property")]
    fn test_duplicate_prop_is_a_startup_bug() {
        let _ = PropTable::builder()
            .prop("opacity", noop)
            .prop("opacity", noop)
            .build();
    }

    #[test]
    fn test_declared_defaults_materialize() {
        assert_eq!(PropDefault::Number(1.0).to_value(), json!(1.0));
        assert_eq!(PropDefault::Bool(false).to_value(), json!(false));
        assert_eq!(PropDefault::Str("visible").to_value(), json!("visible"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let table = PropTable::builder().prop("zIndex", noop).build();
        assert!(table.contains("zIndex"));
        assert!(!table.contains("zindex"));
        assert_eq!(table.len(), 1);
    }
}
