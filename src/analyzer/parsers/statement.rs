use super::{
    super::{core::*, prelude::*},
    expression::*,
    *,
};
use crate::ast;
use crate::tokenizer::{keyword::Keyword, symbol::Delimiter, token::Token};

pub fn parse_statement() -> impl Parser<Token, ast::Statement> {
    with_context(
        choice(vec![
            Box::new(parse_let_statement()),
            Box::new(map(parse_expression(), ast::Statement::Expression)),
        ]),
        "statement",
    )
}

fn parse_let_statement() -> impl Parser<Token, ast::Statement> {
    with_context(
        map(
            preceded(
                parse_keyword(Keyword::Let),
                cut(tuple2(
                    parse_identifier(),
                    preceded(parse_equal(), lazy(parse_expression)),
                )),
            ),
            |(name, expression)| ast::Statement::Let { name, expression },
        ),
        "let statement",
    )
}

fn is_separator(token: &Token) -> bool {
    matches!(token, Token::Newline | Token::Delimiter(Delimiter::Semicolon))
}

fn skip_separators(input: &[Token], mut pos: usize) -> usize {
    while input.get(pos).is_some_and(is_separator) {
        pos += 1;
    }
    pos
}

/// Parses statements until `Eof`.
///
/// A statement must be followed by `;`, a newline or the end of input, unless
/// it ended with a block (its last token is a `Dedent`).
pub fn parse_program(input: &[Token], pos: usize) -> ParseResult<ast::Program> {
    let statement = parse_statement();
    let mut pos = skip_separators(input, pos);
    let mut statements = Vec::new();

    loop {
        match input.get(pos) {
            Some(Token::Eof) => return Ok((pos + 1, ast::Program::new(statements))),
            None => return Ok((pos, ast::Program::new(statements))),
            Some(_) => {}
        }

        let (next, parsed) = statement.parse(input, pos)?;
        tracing::debug!("parsed statement: {:?}", parsed);
        statements.push(parsed);

        let closed_block = next > 0 && matches!(input.get(next - 1), Some(Token::Dedent));
        match input.get(next) {
            Some(token) if is_separator(token) || *token == Token::Eof => {}
            Some(_) if closed_block => {}
            Some(found) => {
                return Err(ParseError::Unexpected {
                    expected: "end of statement".to_string(),
                    found: found.to_string(),
                    position: next,
                    context: Some("statement".to_string()),
                })
            }
            None => {}
        }
        pos = skip_separators(input, next);
    }
}
