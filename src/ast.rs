//! Program representation produced by the parser.
//!
//! Everything except literals, variables and the loop/conditional forms is a
//! [`Expression::Call`]: infix operators, unary minus, indexing and slicing are
//! desugared into calls of the builtin operations (`add`, `sub`, `get`,
//! `slice`, ...).

// Root AST Definition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let { name: String, expression: Expression },
    Expression(Expression),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Var(String),
    Number(Number),
    String(String),
    Boolean(bool),
    List(Vec<Expression>),
    Dict(Vec<(Expression, Expression)>),
    Call {
        name: String,
        args: Vec<Expression>,
        kwargs: Vec<(String, Expression)>,
    },
    ForLoop {
        start: Box<Expression>,
        end: Box<Expression>,
        step: Box<Expression>,
        init: Box<Expression>,
        body: Box<Expression>,
    },
    WhileLoop {
        test: Box<Expression>,
        init: Box<Expression>,
        body: Box<Expression>,
    },
    Cond {
        test: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
}

impl Expression {
    pub fn var(name: impl Into<String>) -> Self {
        Expression::Var(name.into())
    }

    pub fn integer(value: i64) -> Self {
        Expression::Number(Number::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Expression::Number(Number::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::String(value.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call {
            name: name.into(),
            args,
            kwargs: Vec::new(),
        }
    }

    pub fn call_with_kwargs(
        name: impl Into<String>,
        args: Vec<Expression>,
        kwargs: Vec<(String, Expression)>,
    ) -> Self {
        Expression::Call {
            name: name.into(),
            args,
            kwargs,
        }
    }

    /// Loops and conditionals, which render as indented blocks.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Expression::ForLoop { .. } | Expression::WhileLoop { .. } | Expression::Cond { .. }
        )
    }
}
