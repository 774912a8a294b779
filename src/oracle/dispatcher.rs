use std::collections::BTreeMap;
use std::sync::OnceLock;

use mockall::automock;
use reqwest::blocking::Client;
use tracing::debug;

use crate::config::DispatcherConfig;
use crate::eval::Value;

use super::definition::{AdapterKind, OracleDefinition};
use super::http::{CallPayload, HttpAdapter};
use super::registry::OracleRegistry;
use super::resolver::{FunctionResolver, InProcessResolver};
use super::types::{DispatchError, DispatchResult};

/// Anything that can answer an oracle call. The evaluator and the rewrite
/// engine both call through this.
#[automock]
pub trait Oracle {
    fn invoke(
        &self,
        name: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> DispatchResult<Value>;
}

/// Routes a call to the adapter configured on its definition.
pub struct AdapterDispatcher {
    registry: OracleRegistry,
    resolver: Box<dyn FunctionResolver>,
    config: DispatcherConfig,
    client: OnceLock<Client>,
}

impl AdapterDispatcher {
    pub fn new(registry: OracleRegistry) -> Self {
        Self {
            registry,
            resolver: Box::new(InProcessResolver::new()),
            config: DispatcherConfig::default(),
            client: OnceLock::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: impl FunctionResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &OracleRegistry {
        &self.registry
    }

    fn client(&self) -> DispatchResult<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(self.config.request_timeout)
            .build()
            .map_err(|e| DispatchError::Configuration(format!("cannot build HTTP client: {}", e)))?;
        Ok(self.client.get_or_init(|| client))
    }

    /// Dry-run answer: the call itself, as a map.
    fn echo(definition: &OracleDefinition, args: &[Value], kwargs: &[(String, Value)]) -> Value {
        let mut map = BTreeMap::new();
        map.insert("model".to_string(), Value::from(definition.model.as_str()));
        map.insert("name".to_string(), Value::from(definition.name.as_str()));
        map.insert("args".to_string(), Value::List(args.to_vec()));
        map.insert(
            "kwargs".to_string(),
            Value::Map(kwargs.iter().cloned().collect()),
        );
        Value::Map(map)
    }
}

impl Oracle for AdapterDispatcher {
    fn invoke(
        &self,
        name: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> DispatchResult<Value> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| DispatchError::UnknownOracle(name.to_string()))?;

        let Some(adapter) = &definition.adapter else {
            debug!("{}: no adapter, echoing", name);
            return Ok(Self::echo(definition, args, kwargs));
        };

        match &adapter.kind {
            AdapterKind::None => Ok(Self::echo(definition, args, kwargs)),
            AdapterKind::LocalFunction => {
                let path = adapter.required_str("path")?;
                let function = adapter.required_str("function")?;
                debug!("{}: calling {}::{}", name, path, function);
                let callable = self.resolver.resolve(path, function)?;
                callable(args, kwargs)
            }
            AdapterKind::RemoteHttp => {
                let http = HttpAdapter::from_spec(adapter)?;
                let call = CallPayload {
                    model: &definition.model,
                    name,
                    args,
                    kwargs,
                };
                http.invoke(self.client()?, &call)
            }
            AdapterKind::Other(kind) => Err(DispatchError::Configuration(format!(
                "unsupported adapter type '{}' for oracle {}",
                kind, name
            ))),
        }
    }
}
