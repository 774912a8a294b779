//! # Whitespace Token Handling
//!
//! Spaces, tabs and line breaks are kept as tokens by the lexer. The layout
//! pass reads the whitespace that starts each physical line to compute
//! indentation, then drops it.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::map,
    error::context,
};

use super::token::{ParserResult, Token};

/// Column width a tab advances to.
pub const TAB_WIDTH: usize = 8;

/// Parses a run of spaces and tabs, preserving it verbatim.
///
/// ```
/// # use aissembly::tokenizer::whitespace::parse_whitespace;
/// # use aissembly::tokenizer::token::Token;
/// let (rest, token) = parse_whitespace("   hello").unwrap();
/// assert_eq!(token, Token::Whitespace("   ".to_string()));
/// assert_eq!(rest, "hello");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace expected",
        map(take_while1(|c| c == ' ' || c == '\t'), |ws: &str| {
            Token::Whitespace(ws.to_string())
        }),
    )(input)
}

/// Parses `\n` or `\r\n`.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_newline(input: &str) -> ParserResult<Token> {
    context(
        "newline expected",
        map(alt((tag("\r\n"), tag("\n"))), |_| Token::Newline),
    )(input)
}

/// Indentation width of a leading whitespace run, with tabs moving to the next
/// multiple of [`TAB_WIDTH`].
pub fn indent_width(ws: &str) -> usize {
    ws.chars().fold(0, |width, c| match c {
        '\t' => (width / TAB_WIDTH + 1) * TAB_WIDTH,
        _ => width + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace() {
        let (rest, token) = parse_whitespace("\t\t  hello").unwrap();
        assert_eq!(token, Token::Whitespace("\t\t  ".to_string()));
        assert_eq!(rest, "hello");
    }

    #[test]
    fn test_newline() {
        let (rest, token) = parse_newline("\nhello").unwrap();
        assert_eq!(token, Token::Newline);
        assert_eq!(rest, "hello");

        let (rest, token) = parse_newline("\r\nworld").unwrap();
        assert_eq!(token, Token::Newline);
        assert_eq!(rest, "world");
    }

    #[test]
    fn test_error() {
        assert!(parse_whitespace("hello").is_err());
        assert!(parse_newline("hello").is_err());
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("    "), 4);
        assert_eq!(indent_width("\t"), 8);
        assert_eq!(indent_width("  \t"), 8);
        assert_eq!(indent_width("\t  "), 10);
    }
}
