//! Strict, tree-walking evaluation of a parsed [`Program`](crate::ast::Program).
//!
//! A single [`Environment`] is threaded through the top-level statements.
//! `for`/`while` bodies run in a copy of it seeded with `i`/`acc`, so the only
//! thing a loop hands back is its accumulator. `cond` evaluates the taken
//! branch only.

pub mod builtins;
pub mod environment;
pub mod evaluator;
pub mod value;

pub use builtins::Builtin;
pub use environment::Environment;
pub use evaluator::{EvalError, EvalResult, Evaluator, LoopLimits, LoopSignal};
pub use value::Value;
