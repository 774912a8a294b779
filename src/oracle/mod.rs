//! Oracles: externally defined functions reached through adapters.

pub mod definition;
pub mod dispatcher;
pub mod http;
pub mod registry;
pub mod resolver;
pub mod types;

pub use definition::{AdapterKind, AdapterSpec, OracleDefinition};
pub use dispatcher::{AdapterDispatcher, MockOracle, Oracle};
pub use registry::OracleRegistry;
pub use resolver::{Callable, FunctionResolver, InProcessResolver};
pub use types::{DispatchError, DispatchResult};
