use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatterError {
    #[error("Formatting error: float {0} has no source form")]
    NonFiniteNumber(f64),
    #[error("Formatting error: not a block expression: {0}")]
    NotABlock(String),
}
