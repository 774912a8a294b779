use std::collections::BTreeMap;

use serde::Serialize;

use super::value::Value;

/// Variable bindings of one scope.
///
/// Loop bodies run in a child environment, which is a copy of the enclosing
/// one plus loop-local bindings; nothing written to the copy reaches the
/// parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Environment {
    bindings: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn child<I>(&self, locals: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let mut child = self.clone();
        for (name, value) in locals {
            child.set(name, value);
        }
        child
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Indented JSON object with sorted keys.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
