use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("ConfigurationError: {0}")]
    Configuration(String),

    #[error("AdapterInvocationError: {0}")]
    AdapterInvocation(String),

    #[error("Oracle not found: {0}")]
    UnknownOracle(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
