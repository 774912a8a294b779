//! Incremental parsing driver.
//!
//! Source is fed one line at a time. After every line the accumulated buffer
//! is parsed from scratch; the attempt either yields complete statements (the
//! buffer is then cleared), reports that more input is needed, or fails with a
//! syntax or indentation error that is returned immediately.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::{parsers::statement::parse_program as program_parser, ParseError};
use crate::ast::{Program, Statement};
use crate::formatter::unparse_program;
use crate::tokenizer::{
    lex,
    token::{Token, TokenSpan, TokenizerError},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParserError {
    #[error("SyntaxError: {message} (line {line}, column {column})")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("IndentationError: {message} (line {line}, column {column})")]
    Indentation {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Round trip mismatch: {message}")]
    RoundTrip { message: String },
}

pub type ParserResult<T> = Result<T, ParserError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Total number of parses; every parse after the first re-reads the
    /// canonical text of the previous result.
    #[serde(default = "default_reparse_iterations")]
    pub reparse_iterations: usize,
}

fn default_reparse_iterations() -> usize {
    1
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            reparse_iterations: default_reparse_iterations(),
        }
    }
}

/// Result of feeding one line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The buffer held whole statements; they have been appended.
    Complete(Vec<Statement>),
    /// The buffer ends inside a statement.
    Incomplete,
}

enum BufferParse {
    Complete(Program),
    Incomplete(ParserError),
}

/// Parses a complete buffer. `first_line` is the absolute line number of its
/// first line, used for error positions.
fn parse_buffer(buffer: &str, first_line: usize) -> ParserResult<BufferParse> {
    let locate = |line: usize| first_line + line - 1;

    let spans = match lex(buffer) {
        Ok(spans) => spans,
        Err(e) => {
            let span = e.span();
            let (line, column) = (locate(span.line), span.column);
            return match e {
                TokenizerError::Indentation { message, .. } => Err(ParserError::Indentation {
                    message,
                    line,
                    column,
                }),
                ref other if other.needs_more_input() => {
                    Ok(BufferParse::Incomplete(ParserError::Syntax {
                        message: "unterminated triple-quoted string".to_string(),
                        line,
                        column,
                    }))
                }
                other => Err(ParserError::Syntax {
                    message: other.to_string(),
                    line,
                    column,
                }),
            };
        }
    };

    let tokens: Vec<Token> = spans.iter().map(|s| s.token.clone()).collect();
    match program_parser(&tokens, 0) {
        Ok((_, program)) => Ok(BufferParse::Complete(program)),
        Err(e) => {
            let position = e.get_position().min(spans.len().saturating_sub(1));
            let error = syntax_error(&e, &spans, position, first_line);
            if tokens[position..].iter().all(Token::is_trailing_layout) {
                Ok(BufferParse::Incomplete(error))
            } else {
                Err(error)
            }
        }
    }
}

fn syntax_error(
    error: &ParseError,
    spans: &[TokenSpan],
    position: usize,
    first_line: usize,
) -> ParserError {
    let (line, column) = spans
        .get(position)
        .map_or((first_line, 1), |s| (first_line + s.line - 1, s.column));
    let found = spans
        .get(position)
        .map_or_else(|| "end of input".to_string(), |s| s.token.to_string());

    let message = match error.innermost() {
        ParseError::Unexpected {
            expected, found, ..
        } => format!("expected {}, found {}", expected, found),
        ParseError::Failure { message, .. } => message.clone(),
        ParseError::UnexpectedEOF { .. } => "unexpected end of input".to_string(),
        _ => format!("unexpected {}", found),
    };
    let message = match error.context() {
        Some(context) => format!("{} in {}", message, context),
        None => message,
    };
    ParserError::Syntax {
        message,
        line,
        column,
    }
}

fn end_of_input(error: ParserError) -> ParserError {
    match error {
        ParserError::Syntax { line, column, .. } => ParserError::Syntax {
            message: "unexpected end of input".to_string(),
            line,
            column,
        },
        other => other,
    }
}

/// Line-at-a-time parser that accumulates a [`Program`].
#[derive(Debug, Clone)]
pub struct IncrementalParser {
    buffer: String,
    /// Absolute line number of the first buffered line.
    buffer_start_line: usize,
    next_line: usize,
    program: Program,
}

impl Default for IncrementalParser {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementalParser {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            buffer_start_line: 1,
            next_line: 1,
            program: Program::default(),
        }
    }

    /// Appends one line (without its terminator) and tries to parse the buffer.
    pub fn feed_line(&mut self, line: &str) -> ParserResult<ParseOutcome> {
        self.buffer.push_str(line);
        self.buffer.push('\n');
        self.next_line += 1;

        if self.buffer.trim().is_empty() {
            self.reset_buffer();
            return Ok(ParseOutcome::Complete(Vec::new()));
        }

        let parsed = parse_buffer(&self.buffer, self.buffer_start_line);
        match parsed {
            Ok(BufferParse::Complete(program)) => {
                tracing::debug!(
                    "buffer complete with {} statement(s)",
                    program.statements.len()
                );
                self.program.statements.extend(program.statements.iter().cloned());
                self.reset_buffer();
                Ok(ParseOutcome::Complete(program.statements))
            }
            Ok(BufferParse::Incomplete(_)) => Ok(ParseOutcome::Incomplete),
            Err(e) => {
                self.reset_buffer();
                Err(e)
            }
        }
    }

    /// Parses whatever is still buffered and returns the whole program.
    pub fn finish(mut self) -> ParserResult<Program> {
        if !self.buffer.trim().is_empty() {
            match parse_buffer(&self.buffer, self.buffer_start_line)? {
                BufferParse::Complete(program) => {
                    self.program.statements.extend(program.statements);
                }
                BufferParse::Incomplete(error) => return Err(end_of_input(error)),
            }
        }
        Ok(self.program)
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Whether a statement is still waiting for more lines.
    pub fn is_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn reset_buffer(&mut self) {
        self.buffer.clear();
        self.buffer_start_line = self.next_line;
    }
}

/// Parses `source` as a whole, without line-by-line feeding.
pub fn parse_source(source: &str) -> ParserResult<Program> {
    match parse_buffer(source, 1)? {
        BufferParse::Complete(program) => Ok(program),
        BufferParse::Incomplete(error) => Err(end_of_input(error)),
    }
}

fn parse_incrementally(source: &str) -> ParserResult<Program> {
    let mut parser = IncrementalParser::new();
    for line in source.lines() {
        parser.feed_line(line)?;
    }
    parser.finish()
}

/// Parses `source` line by line, then re-parses the canonical text of the
/// result `reparse_iterations - 1` more times, requiring each to agree.
#[tracing::instrument(level = "debug", skip(source))]
pub fn parse_program(source: &str, options: &ParserOptions) -> ParserResult<Program> {
    let program = parse_incrementally(source)?;

    for iteration in 1..options.reparse_iterations.max(1) {
        let text = unparse_program(&program).map_err(|e| ParserError::RoundTrip {
            message: e.to_string(),
        })?;
        let reparsed = parse_incrementally(&text)?;
        if reparsed != program {
            return Err(ParserError::RoundTrip {
                message: format!("canonical text parsed differently on iteration {}", iteration + 1),
            });
        }
    }

    Ok(program)
}
