use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use strum::EnumString;

use super::types::{DispatchError, DispatchResult};

fn default_model() -> String {
    "unknown".to_string()
}

/// One externally defined function the language can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleDefinition {
    pub name: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub adapter: Option<AdapterSpec>,
    #[serde(default)]
    pub parameters: Map<String, JsonValue>,
}

impl OracleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: default_model(),
            adapter: None,
            parameters: Map::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_adapter(mut self, adapter: AdapterSpec) -> Self {
        self.adapter = Some(adapter);
        self
    }
}

/// `{"type": <kind>, ...parameters}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterSpec {
    #[serde(rename = "type")]
    pub kind: AdapterKind,
    #[serde(flatten)]
    pub parameters: Map<String, JsonValue>,
}

impl AdapterSpec {
    pub fn new(kind: AdapterKind) -> Self {
        Self {
            kind,
            parameters: Map::new(),
        }
    }

    pub fn with_parameter(mut self, key: &str, value: JsonValue) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }

    pub fn optional_str(&self, key: &str) -> DispatchResult<Option<&str>> {
        match self.parameters.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s)),
            Some(other) => Err(DispatchError::Configuration(format!(
                "{} adapter parameter '{}' must be a string, got {}",
                self.kind, key, other
            ))),
        }
    }

    pub fn required_str(&self, key: &str) -> DispatchResult<&str> {
        self.optional_str(key)?.ok_or_else(|| {
            DispatchError::Configuration(format!(
                "{} adapter requires parameter '{}'",
                self.kind, key
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(from = "String", into = "String")]
pub enum AdapterKind {
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "local-function", serialize = "python")]
    LocalFunction,
    #[strum(serialize = "remote-http", serialize = "http")]
    RemoteHttp,
    /// Unrecognised kinds fail at dispatch time.
    #[strum(disabled)]
    Other(String),
}

impl AdapterKind {
    pub fn as_str(&self) -> &str {
        match self {
            AdapterKind::None => "none",
            AdapterKind::LocalFunction => "local-function",
            AdapterKind::RemoteHttp => "remote-http",
            AdapterKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AdapterKind {
    fn from(kind: String) -> Self {
        kind.parse().unwrap_or(AdapterKind::Other(kind))
    }
}

impl From<AdapterKind> for String {
    fn from(kind: AdapterKind) -> Self {
        kind.as_str().to_string()
    }
}
