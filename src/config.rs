use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eval::LoopLimits;
use crate::parser::ParserOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything a run can be configured with. Command-line flags override
/// values read from the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub parser: ParserOptions,
    #[serde(default)]
    pub passes: PassConfig,
    #[serde(default)]
    pub limits: LoopLimits,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        from_file(path.as_ref())
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassConfig {
    #[serde(default)]
    pub accuracy_passes: usize,
    #[serde(default)]
    pub decomposition_passes: usize,
    /// Oracle asked to improve a prompt.
    #[serde(default = "default_accuracy_oracle")]
    pub accuracy_oracle: String,
    /// Oracle asked to split a prompt into steps.
    #[serde(default = "default_decomposition_oracle")]
    pub decomposition_oracle: String,
}

fn default_accuracy_oracle() -> String {
    "accuracy_opt_passes".to_string()
}

fn default_decomposition_oracle() -> String {
    "decomposition_opt_passes".to_string()
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            accuracy_passes: 0,
            decomposition_passes: 0,
            accuracy_oracle: default_accuracy_oracle(),
            decomposition_oracle: default_decomposition_oracle(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Bound on a single remote request. No bound when absent.
    #[serde(default, with = "option_duration_ms")]
    pub request_timeout: Option<Duration>,
}

fn from_file<T: serde::de::DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

pub(crate) mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.parser.reparse_iterations, 1);
        assert_eq!(config.passes.accuracy_oracle, "accuracy_opt_passes");
        assert_eq!(config.limits.max_iterations, None);
        assert_eq!(config.dispatcher.request_timeout, None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "parser": {{"reparse_iterations": 3}},
                "passes": {{"accuracy_passes": 2}},
                "limits": {{"max_iterations": 1000, "timeout": 250}},
                "dispatcher": {{"request_timeout": 5000}}
            }}"#
        )
        .unwrap();

        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.parser.reparse_iterations, 3);
        assert_eq!(config.passes.accuracy_passes, 2);
        assert_eq!(config.passes.decomposition_passes, 0);
        assert_eq!(config.limits.max_iterations, Some(1000));
        assert_eq!(config.limits.timeout, Some(Duration::from_millis(250)));
        assert_eq!(
            config.dispatcher.request_timeout,
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RunConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
