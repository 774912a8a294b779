//! # Tokenizer
//!
//! The lexer runs in two steps. [`token::Tokenizer`] splits the source into raw
//! tokens with nom, keeping whitespace, comments and newlines. [`layout::layout`]
//! then turns those into the significant stream with `Newline`, `Indent`,
//! `Dedent` and `Eof` markers that the grammar consumes.

pub mod comment;
pub mod keyword;
pub mod layout;
pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;

use token::{Tokenizer, TokenSpan, TokenizerResult};

/// Tokenizes `source` and applies the layout rules.
pub fn lex(source: &str) -> TokenizerResult<Vec<TokenSpan>> {
    let mut tokenizer = Tokenizer::new();
    let raw = tokenizer.tokenize(source)?;
    layout::layout(raw, &tokenizer.end_span())
}
