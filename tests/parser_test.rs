mod common;

use aissembly::{
    parse_program, parse_source, Expression, IncrementalParser, ParseOutcome, ParserError,
    ParserOptions, Statement,
};
use pretty_assertions::assert_eq;

#[test]
fn test_incremental_matches_whole_program() {
    let source = std::fs::read_to_string(common::demo_path("loops.asl")).unwrap();

    let mut parser = IncrementalParser::new();
    let mut pending_lines = 0;
    for line in source.lines() {
        match parser.feed_line(line).unwrap() {
            ParseOutcome::Complete(_) => pending_lines = 0,
            ParseOutcome::Incomplete => pending_lines += 1,
        }
    }
    assert_eq!(pending_lines, 0);
    assert!(!parser.is_pending());

    let incremental = parser.finish().unwrap();
    let whole = parse_source(&source).unwrap();
    assert_eq!(incremental, whole);
    assert_eq!(whole.statements.len(), 6);
}

#[test]
fn test_cond_block_stays_incomplete_until_else_branch() {
    let mut parser = IncrementalParser::new();
    let lines = [
        "let label = cond(test=1 > 0):",
        "    then:",
        "        -> \"yes\"",
        "    else:",
    ];
    for line in lines {
        assert_eq!(parser.feed_line(line).unwrap(), ParseOutcome::Incomplete);
    }
    match parser.feed_line("        -> \"no\"").unwrap() {
        ParseOutcome::Complete(statements) => assert_eq!(
            statements,
            vec![Statement::Let {
                name: "label".to_string(),
                expression: Expression::Cond {
                    test: Box::new(Expression::call(
                        "gt",
                        vec![Expression::integer(1), Expression::integer(0)]
                    )),
                    then: Box::new(Expression::string("yes")),
                    otherwise: Box::new(Expression::string("no")),
                },
            }]
        ),
        other => panic!("Expected Complete, got {:?}", other),
    }
}

#[test]
fn test_syntax_and_indentation_errors_are_distinct() {
    assert!(matches!(
        parse_source("let x = )"),
        Err(ParserError::Syntax { line: 1, .. })
    ));
    assert!(matches!(
        parse_source("let x = 1\nlet y = 2\n  let z = 3\n"),
        Err(ParserError::Indentation { line: 3, .. })
    ));
}

#[test]
fn test_error_stops_incremental_parse() {
    let source = "let a = 1\nlet b = [1, 2\nlet c = 3\n";
    let err = parse_program(source, &ParserOptions::default()).unwrap_err();
    assert!(matches!(err, ParserError::Syntax { line: 3, .. }), "{:?}", err);
}

#[test]
fn test_unfinished_statement_at_end_of_input() {
    let mut parser = IncrementalParser::new();
    parser.feed_line("let a = 1").unwrap();
    assert_eq!(
        parser.feed_line("let t = for (range(0, 3), init=0):").unwrap(),
        ParseOutcome::Incomplete
    );
    let err = parser.finish().unwrap_err();
    assert!(
        matches!(err, ParserError::Syntax { ref message, .. } if message == "unexpected end of input"),
        "{:?}",
        err
    );
}

#[test]
fn test_reparse_iterations_on_demo() {
    let source = std::fs::read_to_string(common::demo_path("collections.asl")).unwrap();
    let once = parse_program(&source, &ParserOptions::default()).unwrap();
    let thrice = parse_program(
        &source,
        &ParserOptions {
            reparse_iterations: 3,
        },
    )
    .unwrap();
    assert_eq!(once, thrice);
}

#[test]
fn test_operator_desugaring() {
    let program = parse_source("let r = not a and b or c[1:]").unwrap();
    assert_eq!(
        program.statements[0],
        Statement::Let {
            name: "r".to_string(),
            expression: Expression::call(
                "lor",
                vec![
                    Expression::call(
                        "land",
                        vec![
                            Expression::call("lnot", vec![Expression::var("a")]),
                            Expression::var("b"),
                        ]
                    ),
                    Expression::call_with_kwargs(
                        "slice",
                        vec![Expression::var("c")],
                        vec![("start".to_string(), Expression::integer(1))]
                    ),
                ]
            ),
        }
    );
}
