//! # Symbol Token Handling
//!
//! Operators and delimiters recognised by the Aissembly lexer.
//!
//! Symbols are parsed longest-match first so that `->`, `::`, `==`, `!=`, `<=`
//! and `>=` are never split into their single-character prefixes. Infix
//! operators are later desugared by the parser into calls of builtin operations
//! (`+` becomes `add`, `==` becomes `eq`, ...).

use std::fmt;

use strum_macros::{AsRefStr, Display, EnumString};

use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{map, value},
    error::context,
};

use super::token::{ParserResult, Token};

/// Represents operators in the Aissembly language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Operator {
    /// Loop and branch body arrow (`->`)
    #[strum(serialize = "->")]
    ThinArrow,
    /// Separator of the inline `::else->` branch (`::`)
    #[strum(serialize = "::")]
    Scope,
    /// Dotted-name separator (`.`)
    #[strum(serialize = ".")]
    Dot,
    /// Inline conditional marker (`?`)
    #[strum(serialize = "?")]
    Question,

    /// Equality comparison operator (`==`)
    #[strum(serialize = "==")]
    EqualEqual,
    /// Inequality comparison operator (`!=`)
    #[strum(serialize = "!=")]
    NotEqual,
    /// Greater than comparison operator (`>`)
    #[strum(serialize = ">")]
    Greater,
    /// Greater than or equal comparison operator (`>=`)
    #[strum(serialize = ">=")]
    GreaterEqual,
    /// Less than comparison operator (`<`)
    #[strum(serialize = "<")]
    Less,
    /// Less than or equal comparison operator (`<=`)
    #[strum(serialize = "<=")]
    LessEqual,

    /// Addition operator (`+`)
    #[strum(serialize = "+")]
    Plus,
    /// Subtraction and negation operator (`-`)
    #[strum(serialize = "-")]
    Minus,
    /// Multiplication operator (`*`)
    #[strum(serialize = "*")]
    Multiply,
    /// Division operator (`/`)
    #[strum(serialize = "/")]
    Divide,
    /// Remainder operator (`%`)
    #[strum(serialize = "%")]
    Percent,
}

/// Represents delimiters in the Aissembly language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
pub enum Delimiter {
    /// Opening brace (`{`) for dict literals
    #[strum(serialize = "{")]
    OpenBrace,
    /// Closing brace (`}`) for dict literals
    #[strum(serialize = "}")]
    CloseBrace,
    /// Opening parenthesis (`(`) for grouping and calls
    #[strum(serialize = "(")]
    OpenParen,
    /// Closing parenthesis (`)`) for grouping and calls
    #[strum(serialize = ")")]
    CloseParen,
    /// Opening bracket (`[`) for lists, indexing and slicing
    #[strum(serialize = "[")]
    OpenBracket,
    /// Closing bracket (`]`) for lists, indexing and slicing
    #[strum(serialize = "]")]
    CloseBracket,
    /// Comma (`,`) for separating elements and arguments
    #[strum(serialize = ",")]
    Comma,
    /// Semicolon (`;`) for terminating statements
    #[strum(serialize = ";")]
    Semicolon,
    /// Colon (`:`) for blocks, dict entries and slices
    #[strum(serialize = ":")]
    Colon,
    /// Equal sign (`=`) for bindings and keyword arguments
    #[strum(serialize = "=")]
    Equal,
}

impl Delimiter {
    pub fn is_opening(&self) -> bool {
        matches!(
            self,
            Delimiter::OpenParen | Delimiter::OpenBracket | Delimiter::OpenBrace
        )
    }

    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            Delimiter::CloseParen | Delimiter::CloseBracket | Delimiter::CloseBrace
        )
    }
}

// Written by hand: a derived Display would feed the braces through a format string.
impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Parses an operator token, trying multi-character operators first.
///
/// ```
/// # use aissembly::tokenizer::symbol::{parse_operator, Operator};
/// # use aissembly::tokenizer::token::Token;
/// let (rest, token) = parse_operator("-> rest").unwrap();
/// assert_eq!(token, Token::Operator(Operator::ThinArrow));
/// assert_eq!(rest, " rest");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                // Multi-character operators (matched first for longest-match)
                value(Operator::ThinArrow, tag("->")),
                value(Operator::Scope, tag("::")),
                value(Operator::EqualEqual, tag("==")),
                value(Operator::NotEqual, tag("!=")),
                value(Operator::GreaterEqual, tag(">=")),
                value(Operator::LessEqual, tag("<=")),
                // Single-character operators
                value(Operator::Dot, tag(".")),
                value(Operator::Question, tag("?")),
                value(Operator::Greater, tag(">")),
                value(Operator::Less, tag("<")),
                value(Operator::Plus, tag("+")),
                value(Operator::Minus, tag("-")),
                value(Operator::Multiply, tag("*")),
                value(Operator::Divide, tag("/")),
                value(Operator::Percent, tag("%")),
            )),
            Token::Operator,
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                value(Delimiter::OpenBrace, tag("{")),
                value(Delimiter::CloseBrace, tag("}")),
                value(Delimiter::OpenParen, tag("(")),
                value(Delimiter::CloseParen, tag(")")),
                value(Delimiter::OpenBracket, tag("[")),
                value(Delimiter::CloseBracket, tag("]")),
                value(Delimiter::Comma, tag(",")),
                value(Delimiter::Semicolon, tag(";")),
                value(Delimiter::Colon, tag(":")),
                value(Delimiter::Equal, tag("=")),
            )),
            Token::Delimiter,
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators() {
        let test_cases = [
            ("->", Token::Operator(Operator::ThinArrow)),
            ("::", Token::Operator(Operator::Scope)),
            ("==", Token::Operator(Operator::EqualEqual)),
            ("!=", Token::Operator(Operator::NotEqual)),
            (">=", Token::Operator(Operator::GreaterEqual)),
            ("<=", Token::Operator(Operator::LessEqual)),
            (".", Token::Operator(Operator::Dot)),
            ("?", Token::Operator(Operator::Question)),
            ("%", Token::Operator(Operator::Percent)),
        ];

        for (input, expected) in test_cases.iter() {
            let (rest, token) = parse_operator(input).unwrap();
            assert_eq!(token, *expected);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_delimiters() {
        let test_cases = [
            ("{", Token::Delimiter(Delimiter::OpenBrace)),
            ("}", Token::Delimiter(Delimiter::CloseBrace)),
            ("(", Token::Delimiter(Delimiter::OpenParen)),
            (")", Token::Delimiter(Delimiter::CloseParen)),
            ("[", Token::Delimiter(Delimiter::OpenBracket)),
            ("]", Token::Delimiter(Delimiter::CloseBracket)),
            (",", Token::Delimiter(Delimiter::Comma)),
            (";", Token::Delimiter(Delimiter::Semicolon)),
            (":", Token::Delimiter(Delimiter::Colon)),
            ("=", Token::Delimiter(Delimiter::Equal)),
        ];

        for (input, expected) in test_cases.iter() {
            let (rest, token) = parse_delimiter(input).unwrap();
            assert_eq!(token, *expected);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_operator_precedence() {
        let (rest, token) = parse_operator(">=").unwrap();
        assert_eq!(token, Token::Operator(Operator::GreaterEqual));
        assert_eq!(rest, "");

        let (rest, token) = parse_operator("-5").unwrap();
        assert_eq!(token, Token::Operator(Operator::Minus));
        assert_eq!(rest, "5");
    }

    #[test]
    fn test_delimiter_display() {
        assert_eq!(Delimiter::CloseBrace.to_string(), "}");
        assert_eq!(Delimiter::OpenBrace.to_string(), "{");
    }
}
