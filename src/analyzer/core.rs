//! # Core Parser Definitions
//!
//! The parser interface and error type the combinator layer is built on.

use thiserror::Error;

/// Parser trait defines the core parsing interface.
///
/// A parser reads `input` starting at `pos` and either returns the position
/// after what it consumed together with its output, or a [`ParseError`].
///
/// # Type Parameters
///
/// * `I` - The input token type
/// * `O` - The output value type
pub trait Parser<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

/// Plain functions and closures with the right shape are parsers too.
impl<I, O, F> Parser<I, O> for F
where
    F: Fn(&[I], usize) -> ParseResult<O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self(input, pos)
    }
}

/// On success, the new position and the parsed value.
pub type ParseResult<O> = Result<(usize, O), ParseError>;

/// Error type for parsing operations.
///
/// Every variant carries the token position it failed at. Alternatives and
/// repetitions use that position to decide between backtracking and
/// reporting; a [`ParseError::Committed`] error is never backtracked over.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Ran past the end of the token stream
    #[error("Unexpected EOF: {message} at position {position}, context: {context:?}")]
    UnexpectedEOF {
        message: String,
        position: usize,
        context: Option<String>,
    },
    /// Token did not match
    #[error("Unexpected: expected {expected}, found {found} at position {position}, context: {context:?}")]
    Unexpected {
        expected: String,
        found: String,
        position: usize,
        context: Option<String>,
    },
    /// No alternative matched
    #[error("No alternative matched at position {position}, context: {context:?}")]
    NoAlternative {
        position: usize,
        context: Option<String>,
    },
    /// Explicit failure
    #[error("Failure: {message} at position {position}, context: {context:?}")]
    Failure {
        message: String,
        position: usize,
        context: Option<String>,
    },
    /// Failure after a construct's leading tokens were recognised
    #[error("{0}")]
    Committed(Box<ParseError>),
}

impl ParseError {
    /// Attaches `ctx` unless a more specific context is already present.
    pub fn with_context(self, ctx: &str) -> Self {
        let fill = |context: Option<String>| context.or_else(|| Some(ctx.to_string()));
        match self {
            ParseError::UnexpectedEOF {
                message,
                position,
                context,
            } => ParseError::UnexpectedEOF {
                message,
                position,
                context: fill(context),
            },
            ParseError::Unexpected {
                expected,
                found,
                position,
                context,
            } => ParseError::Unexpected {
                expected,
                found,
                position,
                context: fill(context),
            },
            ParseError::NoAlternative { position, context } => ParseError::NoAlternative {
                position,
                context: fill(context),
            },
            ParseError::Failure {
                message,
                position,
                context,
            } => ParseError::Failure {
                message,
                position,
                context: fill(context),
            },
            ParseError::Committed(inner) => ParseError::Committed(Box::new(inner.with_context(ctx))),
        }
    }

    pub fn get_position(&self) -> usize {
        match self {
            ParseError::UnexpectedEOF { position, .. } => *position,
            ParseError::Unexpected { position, .. } => *position,
            ParseError::NoAlternative { position, .. } => *position,
            ParseError::Failure { position, .. } => *position,
            ParseError::Committed(inner) => inner.get_position(),
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            ParseError::UnexpectedEOF { context, .. }
            | ParseError::Unexpected { context, .. }
            | ParseError::NoAlternative { context, .. }
            | ParseError::Failure { context, .. } => context.as_deref(),
            ParseError::Committed(inner) => inner.context(),
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, ParseError::Committed(_))
    }

    /// Marks the error as non-backtrackable.
    pub fn commit(self) -> Self {
        match self {
            ParseError::Committed(_) => self,
            other => ParseError::Committed(Box::new(other)),
        }
    }

    /// The error with any commit marker removed.
    pub fn innermost(&self) -> &ParseError {
        match self {
            ParseError::Committed(inner) => inner.innermost(),
            other => other,
        }
    }

    /// Whether a repetition or option that started at `start` must report this
    /// error instead of stopping.
    pub fn is_fatal_from(&self, start: usize) -> bool {
        self.is_committed() || self.get_position() > start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_context_wins() {
        let err = ParseError::NoAlternative {
            position: 3,
            context: None,
        }
        .with_context("call arguments")
        .with_context("expression");
        assert_eq!(err.context(), Some("call arguments"));
    }

    #[test]
    fn test_commit_keeps_position() {
        let err = ParseError::Failure {
            message: "boom".to_string(),
            position: 7,
            context: None,
        }
        .commit()
        .commit();
        assert!(err.is_committed());
        assert_eq!(err.get_position(), 7);
        assert!(matches!(err.innermost(), ParseError::Failure { .. }));
        assert!(err.is_fatal_from(10));
    }

    #[test]
    fn test_closure_is_parser() {
        let first = |input: &[i32], pos: usize| -> ParseResult<i32> {
            input.get(pos).map(|x| (pos + 1, *x)).ok_or(ParseError::UnexpectedEOF {
                message: "no input".to_string(),
                position: pos,
                context: None,
            })
        };
        assert_eq!(first.parse(&[4, 5], 1), Ok((2, 5)));
        assert!(first.parse(&[4, 5], 2).is_err());
    }
}
