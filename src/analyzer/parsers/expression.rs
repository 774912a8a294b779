//! Expression grammar, lowest precedence first.
//!
//! Operators desugar into builtin calls as they are parsed: `a + b` becomes
//! `add(a, b)`, `-x` becomes `sub(0, x)`, `x[i]` becomes `get(x, i)` and
//! `x[a:b]` becomes `slice(x, start=a, end=b)`.

use super::{
    super::{core::*, prelude::*},
    control, *,
};
use crate::ast::{self, Expression};
use crate::tokenizer::{keyword::Keyword, symbol::Operator};
use crate::tokenizer::token::Token;

pub fn parse_expression() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(control::parse_cond()),
            Box::new(control::parse_if_inline()),
            Box::new(control::parse_for_loop()),
            Box::new(control::parse_while_loop()),
            Box::new(parse_logical_or()),
        ]),
        "expression",
    )
}

fn binary(name: &str, left: Expression, right: Expression) -> Expression {
    Expression::call(name, vec![left, right])
}

fn fold_binary(first: Expression, rest: Vec<(&'static str, Expression)>) -> Expression {
    rest.into_iter()
        .fold(first, |left, (name, right)| binary(name, left, right))
}

fn parse_logical_or() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_logical_and(),
                many(preceded(parse_keyword(Keyword::Or), lazy(parse_logical_and))),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, right| binary("lor", left, right))
            },
        ),
        "logical or",
    )
}

fn parse_logical_and() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_logical_not(),
                many(preceded(parse_keyword(Keyword::And), lazy(parse_logical_not))),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, right| binary("land", left, right))
            },
        ),
        "logical and",
    )
}

fn parse_logical_not() -> impl Parser<Token, Expression> {
    choice(vec![
        Box::new(map(
            preceded(parse_keyword(Keyword::Not), lazy(parse_logical_not)),
            |operand| Expression::call("lnot", vec![operand]),
        )),
        Box::new(parse_comparison()),
    ])
}

fn parse_comparison() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_additive(),
                optional(tuple2(parse_comparison_operator(), lazy(parse_additive))),
            ),
            |(left, rest)| match rest {
                Some((name, right)) => binary(name, left, right),
                None => left,
            },
        ),
        "comparison",
    )
}

fn operator_name(operator: Operator, name: &'static str) -> impl Parser<Token, &'static str> {
    map(parse_operator(operator), move |_| name)
}

fn parse_comparison_operator() -> impl Parser<Token, &'static str> {
    with_context(
        choice(vec![
            Box::new(operator_name(Operator::EqualEqual, "eq")),
            Box::new(operator_name(Operator::NotEqual, "neq")),
            Box::new(operator_name(Operator::LessEqual, "le")),
            Box::new(operator_name(Operator::GreaterEqual, "ge")),
            Box::new(operator_name(Operator::Less, "lt")),
            Box::new(operator_name(Operator::Greater, "gt")),
        ]),
        "comparison operator",
    )
}

fn parse_additive() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_multiplicative(),
                many(tuple2(
                    choice(vec![
                        Box::new(operator_name(Operator::Plus, "add")),
                        Box::new(operator_name(Operator::Minus, "sub")),
                    ]),
                    lazy(parse_multiplicative),
                )),
            ),
            |(first, rest)| fold_binary(first, rest),
        ),
        "additive",
    )
}

fn parse_multiplicative() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_unary(),
                many(tuple2(
                    choice(vec![
                        Box::new(operator_name(Operator::Multiply, "mul")),
                        Box::new(operator_name(Operator::Divide, "div")),
                        Box::new(operator_name(Operator::Percent, "mod")),
                    ]),
                    lazy(parse_unary),
                )),
            ),
            |(first, rest)| fold_binary(first, rest),
        ),
        "multiplicative",
    )
}

fn parse_unary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                preceded(parse_operator(Operator::Minus), lazy(parse_unary)),
                |operand| binary("sub", Expression::integer(0), operand),
            )),
            Box::new(parse_postfix()),
        ]),
        "unary",
    )
}

enum Suffix {
    Index(Expression),
    Slice(Option<Expression>, Option<Expression>),
}

fn parse_postfix() -> impl Parser<Token, Expression> {
    map(
        tuple2(parse_primary(), many(parse_suffix())),
        |(base, suffixes)| {
            suffixes
                .into_iter()
                .fold(base, |target, suffix| match suffix {
                    Suffix::Index(index) => Expression::call("get", vec![target, index]),
                    Suffix::Slice(start, end) => {
                        let kwargs = [("start", start), ("end", end)]
                            .into_iter()
                            .filter_map(|(name, bound)| bound.map(|b| (name.to_string(), b)))
                            .collect();
                        Expression::call_with_kwargs("slice", vec![target], kwargs)
                    }
                })
        },
    )
}

fn parse_suffix() -> impl Parser<Token, Suffix> {
    with_context(
        choice(vec![
            Box::new(map(
                delimited(
                    parse_open_bracket(),
                    lazy(parse_expression),
                    parse_close_bracket(),
                ),
                Suffix::Index,
            )),
            Box::new(map(
                delimited(
                    parse_open_bracket(),
                    tuple3(
                        optional(lazy(parse_expression)),
                        parse_colon(),
                        optional(lazy(parse_expression)),
                    ),
                    parse_close_bracket(),
                ),
                |(start, _, end)| Suffix::Slice(start, end),
            )),
        ]),
        "index or slice",
    )
}

fn parse_primary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(parse_list()),
            Box::new(parse_dict()),
            Box::new(parse_function_call()),
            Box::new(map(parse_dotted_name(), Expression::Var)),
            Box::new(map(parse_string(), Expression::String)),
            Box::new(map(parse_number(), Expression::Number)),
            Box::new(map(parse_boolean(), Expression::Boolean)),
            Box::new(delimited(
                parse_open_paren(),
                lazy(parse_expression),
                parse_close_paren(),
            )),
        ]),
        "primary",
    )
}

fn parse_list() -> impl Parser<Token, Expression> {
    with_context(
        map(
            preceded(
                parse_open_bracket(),
                cut(tuple2(
                    separated_list(lazy(parse_expression), parse_comma()),
                    parse_close_bracket(),
                )),
            ),
            |(items, _)| Expression::List(items),
        ),
        "list",
    )
}

fn parse_dict() -> impl Parser<Token, Expression> {
    with_context(
        map(
            preceded(
                parse_open_brace(),
                cut(tuple2(
                    separated_list(
                        tuple3(lazy(parse_expression), parse_colon(), lazy(parse_expression)),
                        parse_comma(),
                    ),
                    parse_close_brace(),
                )),
            ),
            |(entries, _)| {
                Expression::Dict(
                    entries
                        .into_iter()
                        .map(|(key, _, value)| (key, value))
                        .collect(),
                )
            },
        ),
        "dict",
    )
}

type Arguments = (Vec<Expression>, Vec<(String, Expression)>);

fn parse_function_call() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(parse_dotted_name(), parse_arguments()),
            |(name, (args, kwargs))| Expression::Call { name, args, kwargs },
        ),
        "function call",
    )
}

/// `( arg, ..., name = arg, ... )`; commits once the parenthesis is open.
pub fn parse_arguments() -> impl Parser<Token, Arguments> {
    preceded(
        parse_open_paren(),
        cut(map_res(
            tuple2(
                separated_list(parse_argument(), parse_comma()),
                parse_close_paren(),
            ),
            |(arguments, _)| split_arguments(arguments),
        )),
    )
}

fn parse_argument() -> impl Parser<Token, (Option<String>, Expression)> {
    with_context(
        choice(vec![
            Box::new(map(
                tuple2(parse_identifier(), preceded(parse_equal(), lazy(parse_expression))),
                |(name, value)| (Some(name), value),
            )),
            Box::new(map(lazy(parse_expression), |value| (None, value))),
        ]),
        "argument",
    )
}

fn split_arguments(arguments: Vec<(Option<String>, Expression)>) -> Result<Arguments, String> {
    let mut args = Vec::new();
    let mut kwargs: Vec<(String, Expression)> = Vec::new();
    for (name, value) in arguments {
        match name {
            Some(name) => {
                if kwargs.iter().any(|(existing, _)| *existing == name) {
                    return Err(format!("keyword argument repeated: {}", name));
                }
                kwargs.push((name, value));
            }
            None if !kwargs.is_empty() => {
                return Err("positional argument follows keyword argument".to_string());
            }
            None => args.push(value),
        }
    }
    Ok((args, kwargs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::lex;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Expression {
        let tokens: Vec<Token> = lex(source).unwrap().into_iter().map(|t| t.token).collect();
        let (pos, expr) = parse_expression().parse(&tokens, 0).unwrap();
        assert_eq!(tokens[pos], Token::Newline, "unconsumed input in {:?}", source);
        expr
    }

    fn call(name: &str, args: Vec<Expression>) -> Expression {
        Expression::call(name, args)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1 + 2 * 3"),
            call(
                "add",
                vec![
                    Expression::integer(1),
                    call("mul", vec![Expression::integer(2), Expression::integer(3)])
                ]
            )
        );
        assert_eq!(
            parse("a - b - c"),
            call(
                "sub",
                vec![
                    call("sub", vec![Expression::var("a"), Expression::var("b")]),
                    Expression::var("c")
                ]
            )
        );
    }

    #[test]
    fn test_logic_and_comparison() {
        assert_eq!(
            parse("not a == 1 or b"),
            call(
                "lor",
                vec![
                    call(
                        "lnot",
                        vec![call("eq", vec![Expression::var("a"), Expression::integer(1)])]
                    ),
                    Expression::var("b"),
                ]
            )
        );
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(
            parse("-x * 2"),
            call(
                "mul",
                vec![
                    call("sub", vec![Expression::integer(0), Expression::var("x")]),
                    Expression::integer(2)
                ]
            )
        );
    }

    #[test]
    fn test_index_and_slice() {
        assert_eq!(
            parse("s[1:4]"),
            Expression::call_with_kwargs(
                "slice",
                vec![Expression::var("s")],
                vec![
                    ("start".to_string(), Expression::integer(1)),
                    ("end".to_string(), Expression::integer(4)),
                ]
            )
        );
        assert_eq!(
            parse("s[:2]"),
            Expression::call_with_kwargs(
                "slice",
                vec![Expression::var("s")],
                vec![("end".to_string(), Expression::integer(2))]
            )
        );
        assert_eq!(
            parse("d[\"y\"][0]"),
            call(
                "get",
                vec![
                    call("get", vec![Expression::var("d"), Expression::string("y")]),
                    Expression::integer(0)
                ]
            )
        );
    }

    #[test]
    fn test_call_with_kwargs_and_dotted_name() {
        assert_eq!(
            parse("op.append(lst, v, at=1)"),
            Expression::call_with_kwargs(
                "op.append",
                vec![Expression::var("lst"), Expression::var("v")],
                vec![("at".to_string(), Expression::integer(1))]
            )
        );
    }

    #[test]
    fn test_collections() {
        assert_eq!(
            parse("{\"mode\": \"dev\", \"limit\": [1, 2,]}"),
            Expression::Dict(vec![
                (Expression::string("mode"), Expression::string("dev")),
                (
                    Expression::string("limit"),
                    Expression::List(vec![Expression::integer(1), Expression::integer(2)])
                ),
            ])
        );
    }

    #[test]
    fn test_argument_order_errors() {
        let tokens: Vec<Token> = lex("f(a=1, 2)").unwrap().into_iter().map(|t| t.token).collect();
        let err = parse_expression().parse(&tokens, 0).unwrap_err();
        assert!(err.is_committed());

        let tokens: Vec<Token> = lex("f(a=1, a=2)").unwrap().into_iter().map(|t| t.token).collect();
        let err = parse_expression().parse(&tokens, 0).unwrap_err();
        assert!(matches!(err.innermost(), ParseError::Failure { message, .. } if message.contains("repeated")));
    }
}
