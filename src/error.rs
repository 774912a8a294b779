use thiserror::Error;

use crate::config::ConfigError;
use crate::eval::EvalError;
use crate::formatter::FormatterError;
use crate::oracle::DispatchError;
use crate::parser::ParserError;
use crate::rewrite::RewriteError;

#[derive(Error, Debug)]
pub enum AissemblyError {
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Format(#[from] FormatterError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AissemblyError>;

impl AissemblyError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AissemblyError::Io {
            path: path.into(),
            source,
        }
    }
}
