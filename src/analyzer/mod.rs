//! # Aissembly Analyzer
//!
//! Token-level parser combinators and the grammar built from them.
//!
//! ```text
//! Source → Tokenizer → Layout → Analyzer → AST → Evaluator / Unparser
//! ```
//!
//! Parsers work on `&[Token]` with an explicit position, so a failure carries
//! the index of the token it stopped at. The incremental driver in
//! [`crate::parser`] uses that index to tell unfinished input from a real
//! syntax error.

pub mod combinators;
pub mod core;
pub mod parsers;
pub mod prelude;

pub use core::ParseError;
pub use core::ParseResult;
pub use core::Parser;
