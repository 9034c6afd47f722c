//! Value change tracking.
//!
//! A [`ChangeSet`] collects every `Changed` result of an invocation, in the
//! order the keys were processed. It drives both the commit messages and the
//! "anything changed" decision.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::{GitOpsError, Result};
use crate::yaml::render_value;

/// A single value that was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueChange {
    /// Dotted key path that changed.
    pub key_path: String,
    /// Value now stored at `key_path`.
    pub new_value: Value,
}

impl ValueChange {
    /// Creates a new value change.
    #[must_use]
    pub fn new(key_path: impl Into<String>, new_value: Value) -> Self {
        Self {
            key_path: key_path.into(),
            new_value,
        }
    }
}

impl std::fmt::Display for ValueChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.key_path, render_value(&self.new_value))
    }
}

/// Ordered collection of value changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: Vec<ValueChange>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Records a change.
    pub fn record(&mut self, change: ValueChange) {
        self.changes.push(change);
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of changes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.changes.len()
    }

    /// Iterates over the changes in processing order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValueChange> {
        self.changes.iter()
    }

    /// Returns the only change, if exactly one was recorded.
    #[must_use]
    pub fn single(&self) -> Option<&ValueChange> {
        match self.changes.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Renders the changes as a YAML mapping of key path to value.
    ///
    /// # Errors
    ///
    /// Returns a YAML error if a value cannot be serialized.
    pub fn to_yaml(&self) -> Result<String> {
        let mut mapping = Mapping::new();
        for change in &self.changes {
            mapping.insert(Value::from(change.key_path.as_str()), change.new_value.clone());
        }
        serde_yaml::to_string(&mapping).map_err(|e| GitOpsError::yaml("change set", e))
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ValueChange;
    type IntoIter = std::slice::Iter<'a, ValueChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set() {
        let set = ChangeSet::new();
        assert!(set.is_empty());
        assert!(set.single().is_none());
    }

    #[test]
    fn test_yaml_keeps_processing_order() {
        let mut set = ChangeSet::new();
        set.record(ValueChange::new("replicaCount", Value::from(3)));
        set.record(ValueChange::new("image.tag", Value::from("v2")));

        assert_eq!(set.len(), 2);
        assert_eq!(set.to_yaml().unwrap(), "replicaCount: 3\nimage.tag: v2\n");
    }

    #[test]
    fn test_single() {
        let mut set = ChangeSet::new();
        set.record(ValueChange::new("replicaCount", Value::from(3)));

        assert_eq!(set.single().map(ToString::to_string).as_deref(), Some("replicaCount = 3"));
    }
}
