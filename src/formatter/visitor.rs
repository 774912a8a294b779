use crate::ast::{Expression, Number, Program, Statement};
use crate::formatter::config::FormatterConfig;
use crate::formatter::error::FormatterError;

/// Where an expression is being written. Loops and conditionals only appear
/// bare at the top of a statement, after `->` and as a cond branch; anywhere
/// else they are wrapped in parentheses so the layout rules can close them.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Placement {
    Top,
    Nested,
}

const INFIX: &[(&str, &str)] = &[
    ("lor", "or"),
    ("land", "and"),
    ("eq", "=="),
    ("neq", "!="),
    ("lt", "<"),
    ("le", "<="),
    ("gt", ">"),
    ("ge", ">="),
    ("add", "+"),
    ("sub", "-"),
    ("mul", "*"),
    ("div", "/"),
    ("mod", "%"),
];

/// How a call is rendered.
enum CallShape<'a> {
    Infix(&'a str, &'a Expression, &'a Expression),
    Negate(&'a Expression),
    Not(&'a Expression),
    Index(&'a Expression, &'a Expression),
    Slice(&'a Expression, Option<&'a Expression>, Option<&'a Expression>),
    Plain,
}

fn call_shape<'a>(
    name: &str,
    args: &'a [Expression],
    kwargs: &'a [(String, Expression)],
) -> CallShape<'a> {
    match (name, args, kwargs) {
        ("sub", [Expression::Number(Number::Integer(0)), operand], []) => CallShape::Negate(operand),
        ("lnot", [operand], []) => CallShape::Not(operand),
        ("get", [target, index], []) => CallShape::Index(target, index),
        ("slice", [target], kwargs) => match kwargs {
            [] => CallShape::Slice(target, None, None),
            [(k, start)] if k == "start" => CallShape::Slice(target, Some(start), None),
            [(k, end)] if k == "end" => CallShape::Slice(target, None, Some(end)),
            [(k1, start), (k2, end)] if k1 == "start" && k2 == "end" => {
                CallShape::Slice(target, Some(start), Some(end))
            }
            _ => CallShape::Plain,
        },
        (name, [left, right], []) => INFIX
            .iter()
            .find(|(call, _)| *call == name)
            .map_or(CallShape::Plain, |(_, symbol)| {
                CallShape::Infix(symbol, left, right)
            }),
        _ => CallShape::Plain,
    }
}

/// Operands that never need parentheses.
fn is_atomic(expr: &Expression) -> bool {
    match expr {
        Expression::Call { name, args, kwargs } => matches!(
            call_shape(name, args, kwargs),
            CallShape::Plain | CallShape::Index(..) | CallShape::Slice(..)
        ),
        other => !other.is_block(),
    }
}

/// Double-quoted source form of `value`.
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

pub struct FormatterVisitor {
    config: FormatterConfig,
    indent_level: usize,
    output: String,
}

impl FormatterVisitor {
    pub fn new(config: FormatterConfig) -> Self {
        Self {
            config,
            indent_level: 0,
            output: String::new(),
        }
    }

    pub fn format_program(&mut self, program: &Program) -> Result<String, FormatterError> {
        for (i, statement) in program.statements.iter().enumerate() {
            if i > 0 {
                self.newline()?;
            }
            self.format_statement(statement)?;
        }
        Ok(self.output.clone())
    }

    pub fn format_statement(&mut self, statement: &Statement) -> Result<(), FormatterError> {
        let expression = match statement {
            Statement::Let { name, expression } => {
                self.write("let ")?;
                self.write(name)?;
                self.write(" = ")?;
                expression
            }
            Statement::Expression(expression) => expression,
        };
        self.format_expression(expression, Placement::Top)?;
        if !expression.is_block() {
            self.write(";")?;
        }
        Ok(())
    }

    /// Formats a single expression as it would appear at statement level.
    pub fn format_root_expression(&mut self, expr: &Expression) -> Result<String, FormatterError> {
        self.format_expression(expr, Placement::Top)?;
        Ok(self.output.clone())
    }

    fn format_expression(
        &mut self,
        expr: &Expression,
        placement: Placement,
    ) -> Result<(), FormatterError> {
        if expr.is_block() && placement == Placement::Nested {
            self.write("(")?;
            self.format_block(expr)?;
            return self.write(")");
        }

        match expr {
            Expression::Var(name) => self.write(name),
            Expression::Number(number) => self.format_number(number),
            Expression::String(value) => self.write(&quote_string(value)),
            Expression::Boolean(value) => self.write(if *value { "true" } else { "false" }),
            Expression::List(items) => {
                self.write("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write(", ")?;
                    }
                    self.format_expression(item, Placement::Nested)?;
                }
                self.write("]")
            }
            Expression::Dict(entries) => {
                self.write("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.write(", ")?;
                    }
                    self.format_expression(key, Placement::Nested)?;
                    self.write(": ")?;
                    self.format_expression(value, Placement::Nested)?;
                }
                self.write("}")
            }
            Expression::Call { name, args, kwargs } => self.format_call(name, args, kwargs),
            block => self.format_block(block),
        }
    }

    fn format_number(&mut self, number: &Number) -> Result<(), FormatterError> {
        match number {
            Number::Integer(i) => self.write(&i.to_string()),
            Number::Float(f) if f.is_finite() => self.write(&format!("{:?}", f)),
            Number::Float(f) => Err(FormatterError::NonFiniteNumber(*f)),
        }
    }

    fn format_operand(&mut self, expr: &Expression) -> Result<(), FormatterError> {
        if is_atomic(expr) || expr.is_block() {
            self.format_expression(expr, Placement::Nested)
        } else {
            self.write("(")?;
            self.format_expression(expr, Placement::Nested)?;
            self.write(")")
        }
    }

    fn format_call(
        &mut self,
        name: &str,
        args: &[Expression],
        kwargs: &[(String, Expression)],
    ) -> Result<(), FormatterError> {
        match call_shape(name, args, kwargs) {
            CallShape::Infix(symbol, left, right) => {
                self.format_operand(left)?;
                if self.config.operator_spacing || symbol.chars().all(char::is_alphabetic) {
                    self.write(&format!(" {} ", symbol))?;
                } else {
                    self.write(symbol)?;
                }
                self.format_operand(right)
            }
            CallShape::Negate(operand) => {
                self.write("-")?;
                self.format_operand(operand)
            }
            CallShape::Not(operand) => {
                self.write("not ")?;
                self.format_operand(operand)
            }
            CallShape::Index(target, index) => {
                self.format_operand(target)?;
                self.write("[")?;
                self.format_expression(index, Placement::Nested)?;
                self.write("]")
            }
            CallShape::Slice(target, start, end) => {
                self.format_operand(target)?;
                self.write("[")?;
                if let Some(start) = start {
                    self.format_expression(start, Placement::Nested)?;
                }
                self.write(":")?;
                if let Some(end) = end {
                    self.format_expression(end, Placement::Nested)?;
                }
                self.write("]")
            }
            CallShape::Plain => {
                self.write(name)?;
                self.write("(")?;
                let mut first = true;
                for arg in args {
                    if !first {
                        self.write(", ")?;
                    }
                    first = false;
                    self.format_expression(arg, Placement::Nested)?;
                }
                for (key, value) in kwargs {
                    if !first {
                        self.write(", ")?;
                    }
                    first = false;
                    self.write(key)?;
                    self.write("=")?;
                    self.format_expression(value, Placement::Nested)?;
                }
                self.write(")")
            }
        }
    }

    fn format_block(&mut self, expr: &Expression) -> Result<(), FormatterError> {
        match expr {
            Expression::ForLoop {
                start,
                end,
                step,
                init,
                body,
            } => {
                self.write("for (range(")?;
                self.format_expression(start, Placement::Nested)?;
                self.write(", ")?;
                self.format_expression(end, Placement::Nested)?;
                if **step != Expression::integer(1) {
                    self.write(", ")?;
                    self.format_expression(step, Placement::Nested)?;
                }
                self.write("), init=")?;
                self.format_expression(init, Placement::Nested)?;
                self.write("):")?;
                self.format_body(body)
            }
            Expression::WhileLoop { test, init, body } => {
                self.write("while (test=")?;
                self.format_expression(test, Placement::Nested)?;
                self.write(", init=")?;
                self.format_expression(init, Placement::Nested)?;
                self.write("):")?;
                self.format_body(body)
            }
            Expression::Cond {
                test,
                then,
                otherwise,
            } => {
                self.write("cond(test=")?;
                self.format_expression(test, Placement::Nested)?;
                self.write("):")?;
                self.indent();
                self.newline()?;
                self.write("then:")?;
                self.format_body(then)?;
                self.newline()?;
                self.write("else:")?;
                self.format_body(otherwise)?;
                self.dedent();
                Ok(())
            }
            other => Err(FormatterError::NotABlock(format!("{:?}", other))),
        }
    }

    /// Newline, one level deeper, `-> body`.
    fn format_body(&mut self, body: &Expression) -> Result<(), FormatterError> {
        self.indent();
        self.newline()?;
        self.write("-> ")?;
        self.format_expression(body, Placement::Top)?;
        self.dedent();
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<(), FormatterError> {
        self.output.push_str(text);
        Ok(())
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    fn newline(&mut self) -> Result<(), FormatterError> {
        self.output.push('\n');
        self.write(&" ".repeat(self.indent_level * self.config.indent_spaces))
    }
}
