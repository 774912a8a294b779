use super::super::{core::*, prelude::*};
use crate::ast;
use crate::tokenizer::{
    keyword::Keyword,
    literal::Literal,
    symbol::{Delimiter, Operator},
    token::Token,
};

// Basic parsers
pub fn parse_identifier() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token| match token {
            Token::Identifier(s) => Some(s.clone()),
            _ => None,
        }),
        "identifier",
    )
}

/// Matches a contextual word such as `for`, `range` or `else`.
pub fn parse_word(word: &'static str) -> impl Parser<Token, ()> {
    with_context(
        as_unit(equal(Token::Identifier(word.to_string()))),
        word,
    )
}

/// `a.b.c`, joined into one name.
pub fn parse_dotted_name() -> impl Parser<Token, String> {
    with_context(
        map(
            tuple2(
                parse_identifier(),
                many(preceded(as_unit(parse_dot()), parse_identifier())),
            ),
            |(first, rest)| {
                std::iter::once(first)
                    .chain(rest)
                    .collect::<Vec<_>>()
                    .join(".")
            },
        ),
        "name",
    )
}

pub fn parse_keyword(keyword: Keyword) -> impl Parser<Token, ()> {
    as_unit(equal(Token::Keyword(keyword)))
}

pub fn parse_operator(operator: Operator) -> impl Parser<Token, ()> {
    as_unit(equal(Token::Operator(operator)))
}

pub fn parse_delimiter(delimiter: Delimiter) -> impl Parser<Token, ()> {
    as_unit(equal(Token::Delimiter(delimiter)))
}

// Delimiters
pub fn parse_comma() -> impl Parser<Token, ()> {
    with_context(parse_delimiter(Delimiter::Comma), "comma")
}

pub fn parse_semicolon() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::Semicolon)
}

pub fn parse_colon() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::Colon)
}

pub fn parse_equal() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::Equal)
}

pub fn parse_open_paren() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::OpenParen)
}

pub fn parse_close_paren() -> impl Parser<Token, ()> {
    with_context(parse_delimiter(Delimiter::CloseParen), "closing parenthesis")
}

pub fn parse_open_bracket() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::OpenBracket)
}

pub fn parse_close_bracket() -> impl Parser<Token, ()> {
    with_context(parse_delimiter(Delimiter::CloseBracket), "closing bracket")
}

pub fn parse_open_brace() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::OpenBrace)
}

pub fn parse_close_brace() -> impl Parser<Token, ()> {
    with_context(parse_delimiter(Delimiter::CloseBrace), "closing brace")
}

pub fn parse_dot() -> impl Parser<Token, ()> {
    parse_operator(Operator::Dot)
}

pub fn parse_arrow() -> impl Parser<Token, ()> {
    with_context(parse_operator(Operator::ThinArrow), "arrow")
}

// Layout
pub fn parse_newline() -> impl Parser<Token, ()> {
    as_unit(equal(Token::Newline))
}

pub fn parse_indent() -> impl Parser<Token, ()> {
    with_context(as_unit(equal(Token::Indent)), "indented block")
}

pub fn parse_dedent() -> impl Parser<Token, ()> {
    with_context(as_unit(equal(Token::Dedent)), "end of block")
}

// Literals
pub fn parse_number() -> impl Parser<Token, ast::Number> {
    with_context(
        satisfy(|token| match token {
            Token::Literal(Literal::Integer(i)) => Some(ast::Number::Integer(*i)),
            Token::Literal(Literal::Float(f)) => Some(ast::Number::Float(*f)),
            _ => None,
        }),
        "number",
    )
}

pub fn parse_string() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token| match token {
            Token::Literal(Literal::String(s)) => Some(s.clone()),
            _ => None,
        }),
        "string",
    )
}

pub fn parse_boolean() -> impl Parser<Token, bool> {
    with_context(
        satisfy(|token| match token {
            Token::Literal(Literal::Boolean(b)) => Some(*b),
            _ => None,
        }),
        "boolean",
    )
}
