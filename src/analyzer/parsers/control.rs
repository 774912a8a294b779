//! Loops and conditionals.
//!
//! Each construct commits once its leading tokens are recognised
//! (`for ( range`, `while ( test =`, `cond ( test =`, `if ( e ) ?`), so a
//! later mistake is reported against that construct instead of being retried
//! as an ordinary call.

use super::{
    super::{core::*, prelude::*},
    expression::parse_expression,
    *,
};
use crate::ast::Expression;
use crate::tokenizer::{symbol::Operator, token::Token};

/// `name = expr` for a fixed contextual name.
fn parse_named(name: &'static str) -> impl Parser<Token, Expression> {
    preceded(
        as_unit(tuple2(parse_word(name), parse_equal())),
        lazy(parse_expression),
    )
}

/// `-> expr` on the same line, or an indented block holding one `-> expr`.
pub fn parse_body() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(parse_block_body()),
            Box::new(preceded(parse_arrow(), lazy(parse_expression))),
        ]),
        "loop body",
    )
}

fn parse_block_body() -> impl Parser<Token, Expression> {
    preceded(
        as_unit(tuple3(parse_colon(), parse_newline(), parse_indent())),
        cut(parse_block_tail()),
    )
}

/// `-> expr NEWLINE? DEDENT`
fn parse_block_tail() -> impl Parser<Token, Expression> {
    map(
        tuple3(
            preceded(parse_arrow(), lazy(parse_expression)),
            optional(parse_newline()),
            parse_dedent(),
        ),
        |(expr, _, _)| expr,
    )
}

pub fn parse_for_loop() -> impl Parser<Token, Expression> {
    with_context(
        map(
            preceded(
                as_unit(tuple3(
                    parse_word("for"),
                    parse_open_paren(),
                    parse_word("range"),
                )),
                cut(tuple4(
                    parse_range_arguments(),
                    preceded(parse_comma(), parse_named("init")),
                    parse_close_paren(),
                    parse_body(),
                )),
            ),
            |((start, end, step), init, _, body)| Expression::ForLoop {
                start: Box::new(start),
                end: Box::new(end),
                step: Box::new(step.unwrap_or_else(|| Expression::integer(1))),
                init: Box::new(init),
                body: Box::new(body),
            },
        ),
        "for loop",
    )
}

type RangeArguments = (Expression, Expression, Option<Expression>);

fn parse_range_arguments() -> impl Parser<Token, RangeArguments> {
    with_context(
        delimited(
            parse_open_paren(),
            tuple3(
                lazy(parse_expression),
                preceded(parse_comma(), lazy(parse_expression)),
                optional(preceded(parse_comma(), lazy(parse_expression))),
            ),
            parse_close_paren(),
        ),
        "range",
    )
}

pub fn parse_while_loop() -> impl Parser<Token, Expression> {
    with_context(
        map(
            preceded(
                as_unit(tuple4(
                    parse_word("while"),
                    parse_open_paren(),
                    parse_word("test"),
                    parse_equal(),
                )),
                cut(tuple4(
                    lazy(parse_expression),
                    preceded(parse_comma(), parse_named("init")),
                    parse_close_paren(),
                    parse_body(),
                )),
            ),
            |(test, init, _, body)| Expression::WhileLoop {
                test: Box::new(test),
                init: Box::new(init),
                body: Box::new(body),
            },
        ),
        "while loop",
    )
}

/// Both the block form and the inline `-> a ::else-> b` form.
pub fn parse_cond() -> impl Parser<Token, Expression> {
    with_context(
        map(
            preceded(
                as_unit(tuple4(
                    parse_word("cond"),
                    parse_open_paren(),
                    parse_word("test"),
                    parse_equal(),
                )),
                cut(tuple3(
                    lazy(parse_expression),
                    parse_close_paren(),
                    choice(vec![
                        Box::new(parse_cond_block_branches()),
                        Box::new(parse_cond_inline_branches()),
                    ]),
                )),
            ),
            |(test, _, (then, otherwise))| Expression::Cond {
                test: Box::new(test),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
        ),
        "cond",
    )
}

fn parse_branch(name: &'static str) -> impl Parser<Token, Expression> {
    with_context(
        preceded(
            as_unit(tuple4(
                parse_word(name),
                parse_colon(),
                parse_newline(),
                parse_indent(),
            )),
            parse_block_tail(),
        ),
        name,
    )
}

fn parse_cond_block_branches() -> impl Parser<Token, (Expression, Expression)> {
    map(
        preceded(
            as_unit(tuple3(parse_colon(), parse_newline(), parse_indent())),
            tuple4(
                parse_branch("then"),
                parse_branch("else"),
                optional(parse_newline()),
                parse_dedent(),
            ),
        ),
        |(then, otherwise, _, _)| (then, otherwise),
    )
}

fn parse_cond_inline_branches() -> impl Parser<Token, (Expression, Expression)> {
    map(
        tuple4(
            preceded(parse_arrow(), lazy(parse_expression)),
            parse_operator(Operator::Scope),
            parse_word("else"),
            preceded(parse_arrow(), lazy(parse_expression)),
        ),
        |(then, _, _, otherwise)| (then, otherwise),
    )
}

/// `if ( c ) ? a : b`, parsed into the same node as `cond`.
pub fn parse_if_inline() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                delimited(
                    as_unit(tuple2(parse_word("if"), parse_open_paren())),
                    lazy(parse_expression),
                    as_unit(tuple2(parse_close_paren(), parse_operator(Operator::Question))),
                ),
                cut(tuple3(lazy(parse_expression), parse_colon(), lazy(parse_expression))),
            ),
            |(test, (then, _, otherwise))| Expression::Cond {
                test: Box::new(test),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
        ),
        "if",
    )
}
