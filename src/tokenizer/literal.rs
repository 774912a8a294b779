use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while_m_n},
    character::complete::{anychar, char, digit1, one_of},
    combinator::{map, map_opt, map_res, opt, recognize, value},
    error::context,
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "string {:?}", s),
            Literal::Integer(i) => write!(f, "integer {}", i),
            Literal::Float(x) => write!(f, "float {:?}", x),
            Literal::Boolean(b) => write!(f, "'{}'", b),
        }
    }
}

/// Triple-quoted strings are taken verbatim and may span lines.
#[tracing::instrument(level = "debug", skip(input))]
fn parse_triple_quoted(input: &str) -> ParserResult<Literal> {
    context(
        "triple-quoted string",
        map(
            alt((
                delimited(tag("\"\"\""), take_until("\"\"\""), tag("\"\"\"")),
                delimited(tag("'''"), take_until("'''"), tag("'''")),
            )),
            |content: &str| Literal::String(content.to_string()),
        ),
    )(input)
}

fn parse_unicode_escape(input: &str) -> ParserResult<char> {
    map_opt(
        preceded(
            char('u'),
            take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
        ),
        |hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32),
    )(input)
}

fn parse_escape(input: &str) -> ParserResult<String> {
    preceded(
        char('\\'),
        alt((
            map(parse_unicode_escape, String::from),
            value("\n".to_string(), char('n')),
            value("\t".to_string(), char('t')),
            value("\r".to_string(), char('r')),
            value("\u{08}".to_string(), char('b')),
            value("\u{0c}".to_string(), char('f')),
            value("\"".to_string(), char('"')),
            value("'".to_string(), char('\'')),
            value("\\".to_string(), char('\\')),
            value("/".to_string(), char('/')),
            // Unknown escapes keep their backslash.
            map(anychar, |c| format!("\\{}", c)),
        )),
    )(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> ParserResult<'a, Literal> {
    let stop = if quote == '"' { "\"\\\n\r" } else { "'\\\n\r" };
    map(
        delimited(
            char(quote),
            many0(alt((parse_escape, map(is_not(stop), String::from)))),
            char(quote),
        ),
        |parts: Vec<String>| Literal::String(parts.concat()),
    )
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    // An opening triple quote never falls back to an empty string.
    if input.starts_with("\"\"\"") || input.starts_with("'''") {
        return context("string literal", parse_triple_quoted)(input);
    }
    context("string literal", alt((quoted('"'), quoted('\''))))(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_number_literal(input: &str) -> ParserResult<Literal> {
    context(
        "number literal",
        map_res(
            recognize(tuple((
                digit1,
                opt(pair(char('.'), digit1)),
                opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            ))),
            |s: &str| {
                if s.contains(['.', 'e', 'E']) {
                    s.parse::<f64>()
                        .map(Literal::Float)
                        .map_err(|e| e.to_string())
                } else {
                    s.parse::<i64>()
                        .map(Literal::Integer)
                        .map_err(|e| e.to_string())
                }
            },
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((parse_string_literal, parse_number_literal)),
            Token::Literal,
        ),
    )(input)
}
