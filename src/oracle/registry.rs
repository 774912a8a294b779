use std::path::Path;

use tracing::debug;

use super::definition::OracleDefinition;
use super::types::{DispatchError, DispatchResult};

/// The oracle definitions available to one run, in definition order.
///
/// Passed explicitly to the evaluator, dispatcher and rewrite engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleRegistry {
    definitions: Vec<OracleDefinition>,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of definitions.
    pub fn from_json_str(json: &str) -> DispatchResult<Self> {
        let definitions: Vec<OracleDefinition> = serde_json::from_str(json)
            .map_err(|e| DispatchError::Configuration(format!("invalid oracle definitions: {}", e)))?;
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition);
        }
        Ok(registry)
    }

    pub fn load(path: impl AsRef<Path>) -> DispatchResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let registry = Self::from_json_str(&json)?;
        debug!("loaded {} oracle definitions from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Adds a definition; a later definition with the same name replaces the
    /// earlier one in place.
    pub fn register(&mut self, definition: OracleDefinition) {
        match self
            .definitions
            .iter_mut()
            .find(|existing| existing.name == definition.name)
        {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
    }

    pub fn get(&self, name: &str) -> Option<&OracleDefinition> {
        self.definitions.iter().find(|def| def.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|def| def.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &OracleDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_replace_in_place() {
        let registry = OracleRegistry::from_json_str(
            r#"[
                {"name": "a", "model": "first"},
                {"name": "b"},
                {"name": "a", "model": "second"}
            ]"#,
        )
        .unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().model, "second");
        assert!(!registry.contains("c"));
    }

    #[test]
    fn test_invalid_json_is_configuration_error() {
        assert!(matches!(
            OracleRegistry::from_json_str("{\"name\": 1}"),
            Err(DispatchError::Configuration(_))
        ));
    }
}
