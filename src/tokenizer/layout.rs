//! # Layout Pass
//!
//! Turns the raw token stream into the significant stream the grammar reads.
//! Whitespace and comments are dropped, physical line breaks become
//! [`Token::Newline`] where they end a logical line, and indentation changes
//! become [`Token::Indent`] / [`Token::Dedent`].
//!
//! Rules:
//!
//! * Blank and comment-only lines are ignored.
//! * Inside `(`, `[` or `{` line breaks are joined, unless the line ends with a
//!   block-opening `:` (at top level or directly inside `(`). Such a block keeps
//!   its lines significant until it is dedented or its enclosing bracket closes.
//! * A closing bracket closes every block opened inside it.
//! * A dedent must land on a previously opened indentation level.
//! * The stream always ends with `Newline`, the remaining `Dedent`s and `Eof`.

use super::{
    symbol::Delimiter,
    token::{Span, Token, TokenSpan, TokenizerError, TokenizerResult},
    whitespace::indent_width,
};

struct OpenBracket {
    delimiter: Delimiter,
    /// Depth of the indentation stack when the bracket opened.
    depth: usize,
}

#[derive(Default)]
struct Layout {
    indents: Vec<usize>,
    brackets: Vec<OpenBracket>,
    output: Vec<TokenSpan>,
    line_start: bool,
    line_indent: usize,
    continuation: bool,
    expect_indent: bool,
}

impl Layout {
    fn new() -> Self {
        Self {
            indents: vec![0],
            line_start: true,
            ..Default::default()
        }
    }

    /// Newlines are significant at top level and inside blocks opened within
    /// the innermost bracket.
    fn layout_active(&self) -> bool {
        self.brackets
            .last()
            .map_or(true, |bracket| self.indents.len() > bracket.depth)
    }

    fn last_significant(&self) -> Option<&Token> {
        self.output.last().map(|t| &t.token)
    }

    fn ends_with_block_opener(&self) -> bool {
        let colon = matches!(
            self.last_significant(),
            Some(Token::Delimiter(Delimiter::Colon))
        );
        let bracket_allows = self
            .brackets
            .last()
            .map_or(true, |b| b.delimiter == Delimiter::OpenParen);
        colon && bracket_allows
    }

    fn push_synthetic(&mut self, token: Token, span: &Span) {
        self.output.push(TokenSpan::synthetic(token, span));
    }

    fn newline(&mut self, token: TokenSpan) {
        if self.line_start {
            // blank or comment-only line
            self.line_indent = 0;
            return;
        }

        let opener = self.ends_with_block_opener();
        if opener || self.layout_active() {
            self.output.push(token);
            self.expect_indent = opener;
            self.continuation = false;
        } else {
            self.continuation = true;
        }
        self.line_start = true;
        self.line_indent = 0;
    }

    fn indentation(&mut self, span: &Span) -> TokenizerResult<()> {
        let current = self.indents.last().copied().unwrap_or(0);

        if self.line_indent > current {
            if !self.expect_indent {
                return Err(TokenizerError::Indentation {
                    message: "unexpected indent".to_string(),
                    span: span.clone(),
                });
            }
            self.indents.push(self.line_indent);
            self.push_synthetic(Token::Indent, span);
        } else if self.expect_indent {
            return Err(TokenizerError::Indentation {
                message: "expected an indented block".to_string(),
                span: span.clone(),
            });
        } else {
            let floor = self.brackets.last().map_or(1, |b| b.depth.max(1));
            while self.line_indent < self.indents.last().copied().unwrap_or(0)
                && self.indents.len() > floor
            {
                self.indents.pop();
                self.push_synthetic(Token::Dedent, span);
            }
            if self.indents.last().copied().unwrap_or(0) != self.line_indent {
                return Err(TokenizerError::Indentation {
                    message: "unindent does not match any outer indentation level".to_string(),
                    span: span.clone(),
                });
            }
        }
        self.expect_indent = false;
        Ok(())
    }

    fn significant(&mut self, token: TokenSpan) -> TokenizerResult<()> {
        let span = token.span();
        if self.line_start {
            if !self.continuation {
                self.indentation(&span)?;
            }
            self.line_start = false;
            self.continuation = false;
        }

        if let Token::Delimiter(delimiter) = &token.token {
            if delimiter.is_opening() {
                self.brackets.push(OpenBracket {
                    delimiter: *delimiter,
                    depth: self.indents.len(),
                });
            } else if delimiter.is_closing() {
                if let Some(bracket) = self.brackets.pop() {
                    while self.indents.len() > bracket.depth {
                        self.indents.pop();
                        self.push_synthetic(Token::Dedent, &span);
                    }
                }
            }
        }

        self.output.push(token);
        Ok(())
    }

    fn finish(mut self, end: &Span) -> Vec<TokenSpan> {
        if !self.line_start {
            self.push_synthetic(Token::Newline, end);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push_synthetic(Token::Dedent, end);
        }
        self.push_synthetic(Token::Eof, end);
        self.output
    }
}

/// Applies the layout rules to a raw token stream. `end` is the position just
/// past the source, used for the closing synthetic tokens.
#[tracing::instrument(level = "debug", skip(raw))]
pub fn layout(raw: Vec<TokenSpan>, end: &Span) -> TokenizerResult<Vec<TokenSpan>> {
    let mut state = Layout::new();

    for token in raw {
        match &token.token {
            Token::Whitespace(ws) => {
                if state.line_start {
                    state.line_indent = indent_width(ws);
                }
            }
            Token::Comment(_) => {}
            Token::Newline => state.newline(token),
            _ => state.significant(token)?,
        }
    }

    Ok(state.finish(end))
}
