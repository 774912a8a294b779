use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::not_line_ending,
    combinator::map,
    error::context,
    sequence::preceded,
};

use super::token::{ParserResult, Token};

/// Parses a `#` or `//` comment running to the end of the line.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_comment(input: &str) -> ParserResult<Token> {
    context(
        "comment",
        map(
            preceded(alt((tag("#"), tag("//"))), not_line_ending),
            |content: &str| Token::Comment(content.trim().to_string()),
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_comment() {
        let (rest, token) = parse_comment("# a note\nlet").unwrap();
        assert_eq!(token, Token::Comment("a note".to_string()));
        assert_eq!(rest, "\nlet");
    }

    #[test]
    fn test_slash_comment() {
        let (rest, token) = parse_comment("// another one").unwrap();
        assert_eq!(token, Token::Comment("another one".to_string()));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_single_slash_is_not_comment() {
        assert!(parse_comment("/ 2").is_err());
    }
}
