use std::collections::HashMap;
use std::sync::Arc;

use crate::eval::Value;

use super::types::{DispatchError, DispatchResult};

/// A resolved local function: positional and keyword arguments in, value out.
pub type Callable = Arc<dyn Fn(&[Value], &[(String, Value)]) -> DispatchResult<Value> + Send + Sync>;

/// Finds the callable a `local-function` adapter names by `(path, symbol)`.
pub trait FunctionResolver: Send + Sync {
    fn resolve(&self, path: &str, symbol: &str) -> DispatchResult<Callable>;
}

/// Resolves against functions the embedding program registered up front.
#[derive(Default, Clone)]
pub struct InProcessResolver {
    functions: HashMap<(String, String), Callable>,
}

impl InProcessResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, path: &str, symbol: &str, function: F)
    where
        F: Fn(&[Value], &[(String, Value)]) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.functions
            .insert((path.to_string(), symbol.to_string()), Arc::new(function));
    }

    pub fn with_function<F>(mut self, path: &str, symbol: &str, function: F) -> Self
    where
        F: Fn(&[Value], &[(String, Value)]) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.register(path, symbol, function);
        self
    }
}

impl FunctionResolver for InProcessResolver {
    fn resolve(&self, path: &str, symbol: &str) -> DispatchResult<Callable> {
        self.functions
            .get(&(path.to_string(), symbol.to_string()))
            .cloned()
            .ok_or_else(|| {
                DispatchError::AdapterInvocation(format!(
                    "function '{}' not found in '{}'",
                    symbol, path
                ))
            })
    }
}
