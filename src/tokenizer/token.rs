use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    combinator::recognize,
    error::{context, VerboseError},
    sequence::pair,
    IResult,
};
use thiserror::Error;

use super::{
    comment::parse_comment,
    keyword::Keyword,
    literal::{parse_literal, Literal},
    symbol::{parse_delimiter, parse_operator, Delimiter, Operator},
    whitespace::{parse_newline, parse_whitespace},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Keyword(Keyword),
    // Identifiers
    Identifier(String),
    // Symbols
    Operator(Operator),
    Delimiter(Delimiter),
    // Literals
    Literal(Literal),
    // Formatting
    Whitespace(String),
    Newline,
    Comment(String),
    // Layout, produced by the layout pass only
    Indent,
    Dedent,
    Eof,
}

impl Token {
    /// Tokens the layout pass drops before parsing.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace(_) | Token::Comment(_))
    }

    /// Tokens that may trail an unfinished statement without making it wrong.
    pub fn is_trailing_layout(&self) -> bool {
        matches!(self, Token::Newline | Token::Dedent | Token::Eof)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(keyword) => write!(f, "'{}'", keyword),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::Operator(op) => write!(f, "'{}'", op),
            Token::Delimiter(delimiter) => write!(f, "'{}'", delimiter),
            Token::Literal(literal) => write!(f, "{}", literal),
            Token::Whitespace(_) => write!(f, "whitespace"),
            Token::Newline => write!(f, "newline"),
            Token::Comment(_) => write!(f, "comment"),
            Token::Indent => write!(f, "indent"),
            Token::Dedent => write!(f, "dedent"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    current_position: usize,
    current_line: usize,
    current_column: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            current_position: 0,
            current_line: 1,   // 1-based
            current_column: 1, // 1-based
        }
    }

    /// Splits `input` into raw tokens, keeping whitespace, comments and newlines.
    #[tracing::instrument(level = "debug", skip(input))]
    pub fn tokenize(&mut self, input: &str) -> TokenizerResult<Vec<TokenSpan>> {
        let mut tokens = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            let start_position = self.current_position;
            let start_line = self.current_line;
            let start_column = self.current_column;

            let result = alt((
                // Formatting
                parse_whitespace,
                parse_newline,
                // Literals
                parse_literal,
                // Comments
                parse_comment,
                // Code elements
                parse_operator,
                parse_delimiter,
                parse_identifier,
            ))(remaining);

            match result {
                Ok((new_remaining, token)) => {
                    let consumed = &remaining[..(remaining.len() - new_remaining.len())];
                    self.update_position(consumed);

                    tokens.push(TokenSpan {
                        token,
                        start: start_position,
                        end: self.current_position,
                        line: start_line,
                        column: start_column,
                    });

                    remaining = new_remaining;
                }
                Err(e) => {
                    let error = self.error_at(remaining, e);
                    tracing::error!("{}", error);
                    return Err(error);
                }
            }
        }

        Ok(tokens)
    }

    /// Zero-width span at the current position, used for the synthetic end tokens.
    pub fn end_span(&self) -> Span {
        Span {
            start: self.current_position,
            end: self.current_position,
            line: self.current_line,
            column: self.current_column,
        }
    }

    fn error_at(
        &self,
        remaining: &str,
        error: nom::Err<VerboseError<&str>>,
    ) -> TokenizerError {
        let found = remaining.chars().take(20).collect::<String>();
        let span = Span {
            start: self.current_position,
            end: self.current_position + 1,
            line: self.current_line,
            column: self.current_column,
        };

        if remaining.starts_with("\"\"\"") || remaining.starts_with("'''") {
            return TokenizerError::UnterminatedString {
                multiline: true,
                span,
            };
        }
        if remaining.starts_with('"') || remaining.starts_with('\'') {
            return TokenizerError::UnterminatedString {
                multiline: false,
                span,
            };
        }

        let message = match error {
            nom::Err::Incomplete(needed) => format!("Incomplete input, {:?}", needed),
            nom::Err::Error(e) | nom::Err::Failure(e) => nom::error::convert_error(remaining, e),
        };
        TokenizerError::ParseError {
            message,
            found,
            span,
        }
    }

    fn update_position(&mut self, text: &str) {
        for c in text.chars() {
            self.current_position += c.len_utf8();
            if c == '\n' {
                self.current_line += 1;
                self.current_column = 1;
            } else {
                self.current_column += 1;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl TokenSpan {
    pub fn synthetic(token: Token, span: &Span) -> Self {
        Self {
            token,
            start: span.start,
            end: span.start,
            line: span.line,
            column: span.column,
        }
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
            line: self.line,
            column: self.column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line: {}, column: {}, start: {}, end: {}",
            self.line, self.column, self.start, self.end
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    #[error("Failed to parse token: {message}, found: {found}, at {span}")]
    ParseError {
        message: String,
        found: String,
        span: Span,
    },
    #[error("Unterminated string literal at {span}")]
    UnterminatedString { multiline: bool, span: Span },
    #[error("{message} at {span}")]
    Indentation { message: String, span: Span },
}

impl TokenizerError {
    pub fn span(&self) -> &Span {
        match self {
            TokenizerError::ParseError { span, .. } => span,
            TokenizerError::UnterminatedString { span, .. } => span,
            TokenizerError::Indentation { span, .. } => span,
        }
    }

    /// An unterminated triple-quoted string can still be closed by more input.
    pub fn needs_more_input(&self) -> bool {
        matches!(
            self,
            TokenizerError::UnterminatedString {
                multiline: true,
                ..
            }
        )
    }
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_identifier(input: &str) -> ParserResult<Token> {
    let (input, id) = context(
        "identifier",
        recognize(pair(
            take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
    )(input)?;

    match id {
        "true" => return Ok((input, Token::Literal(Literal::Boolean(true)))),
        "false" => return Ok((input, Token::Literal(Literal::Boolean(false)))),
        _ => {}
    }
    if let Ok(kw) = Keyword::try_from(id) {
        return Ok((input, Token::Keyword(kw)));
    }

    Ok((input, Token::Identifier(id.to_string())))
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub type TokenizerResult<T> = Result<T, TokenizerError>;
