//! Unparser: renders an AST back into canonical Aissembly source.
//!
//! Desugared operator calls come back as infix, prefix and postfix syntax.
//! Loops and conditionals always use the block form. For any program the
//! parser produces, parsing the formatted text yields the same AST.

pub mod config;
pub mod error;
pub mod visitor;

use crate::ast::{Expression, Program};

pub use config::FormatterConfig;
pub use error::FormatterError;
pub use visitor::{quote_string, FormatterVisitor};

pub fn unparse_program(program: &Program) -> Result<String, FormatterError> {
    FormatterVisitor::new(FormatterConfig::default()).format_program(program)
}

pub fn unparse_expression(expr: &Expression) -> Result<String, FormatterError> {
    FormatterVisitor::new(FormatterConfig::default()).format_root_expression(expr)
}
