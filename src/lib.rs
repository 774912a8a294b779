//! Aissembly: a small language whose programs mix loops, conditionals and
//! collection operations with calls to external "oracles", plus rewrite
//! passes that improve the prompts embedded in those calls.
//!
//! ```
//! use aissembly::{Environment, Evaluator, MockOracle, OracleRegistry, parse_source};
//!
//! let program = parse_source("let total = for(range(1, 6), init=0) -> acc + i").unwrap();
//! let registry = OracleRegistry::new();
//! let oracle = MockOracle::new();
//! let mut env = Environment::new();
//! Evaluator::new(&registry, &oracle).eval_program(&program, &mut env).unwrap();
//! assert_eq!(env.get("total"), Some(&aissembly::Value::Integer(15)));
//! ```

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod formatter;
pub mod oracle;
pub mod parser;
pub mod pipeline;
pub mod rewrite;
pub mod scanner;
pub mod tokenizer;

// Re-exports
pub use ast::*;
pub use config::{DispatcherConfig, PassConfig, RunConfig};
pub use error::{AissemblyError, Result};
pub use eval::{Builtin, Environment, EvalError, Evaluator, LoopLimits, LoopSignal, Value};
pub use formatter::{unparse_expression, unparse_program, FormatterError};
pub use oracle::{
    AdapterDispatcher, AdapterKind, AdapterSpec, DispatchError, FunctionResolver,
    InProcessResolver, MockOracle, Oracle, OracleDefinition, OracleRegistry,
};
pub use parser::{
    parse_program, parse_source, IncrementalParser, ParseOutcome, ParserError, ParserOptions,
};
pub use pipeline::Pipeline;
pub use rewrite::{RewriteEngine, RewriteError, RewritePass};
pub use scanner::{scan_calls, CallMatch, CallScanner};
