//! Text-level call-site scanner.
//!
//! Finds `name(...)` occurrences of a set of candidate names in raw source,
//! without parsing it. String and comment literals are skipped whole, so a
//! call written inside a literal is never reported. The parameter group is
//! matched with balanced parentheses and may contain literals and newlines.
//! A call to a candidate nested inside another candidate's parameters is part
//! of the outer match's parameter text, not a separate match. Unbalanced
//! parentheses produce no match.

use std::collections::HashSet;
use std::ops::Range;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until},
    character::complete::{alpha1, alphanumeric1, anychar, char, multispace0, not_line_ending},
    combinator::{not, opt, recognize, rest, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use tracing::debug;

/// One located call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallMatch {
    pub name: String,
    /// The whole `name(...)` text.
    pub text: String,
    /// Raw text between the outer parentheses.
    pub params: String,
    pub span: Range<usize>,
    pub params_span: Range<usize>,
}

fn triple_quoted<'a>(quotes: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    // An unterminated triple-quoted string runs to the end of the text.
    recognize(preceded(
        tag(quotes),
        alt((terminated(take_until(quotes), tag(quotes)), rest)),
    ))
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    let stop = if quote == '"' { "\"\\\n" } else { "'\\\n" };
    recognize(tuple((
        char(quote),
        many0(alt((
            value((), preceded(char('\\'), anychar)),
            value((), is_not(stop)),
        ))),
        // A single-line string missing its closing quote ends at the newline.
        opt(char(quote)),
    )))
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(alt((tag("#"), tag("//"))), not_line_ending))(input)
}

/// A string or comment literal; triple quotes are tried before single ones.
pub fn literal(input: &str) -> IResult<&str, &str> {
    alt((
        triple_quoted("\"\"\""),
        triple_quoted("'''"),
        quoted('"'),
        quoted('\''),
        comment,
    ))(input)
}

/// `( ... )` with nested groups and literals.
fn param_group(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('('),
        many0(alt((
            value((), literal),
            value((), param_group),
            value((), is_not("()\"'#/")),
            value((), terminated(char('/'), not(char('/')))),
        ))),
        char(')'),
    ))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn dotted_name(input: &str) -> IResult<&str, &str> {
    recognize(separated_list1(char('.'), identifier))(input)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

pub struct CallScanner {
    names: HashSet<String>,
}

impl CallScanner {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Every candidate call outside literals, in source order.
    pub fn scan(&self, source: &str) -> Vec<CallMatch> {
        let mut matches = Vec::new();
        let mut pos = 0;
        let mut previous: Option<char> = None;

        while pos < source.len() {
            let input = &source[pos..];

            if let Ok((remaining, _)) = literal(input) {
                pos = source.len() - remaining.len();
                previous = source[..pos].chars().next_back();
                continue;
            }

            let at_boundary = !previous.is_some_and(is_name_char);
            if at_boundary {
                if let Ok((after_name, name)) = dotted_name(input) {
                    let name_end = source.len() - after_name.len();
                    if self.names.contains(name) {
                        if let Some(found) = Self::match_call(source, pos, name, after_name) {
                            debug!("matched {} at {:?}", found.name, found.span);
                            pos = found.span.end;
                            previous = Some(')');
                            matches.push(found);
                            continue;
                        }
                    }
                    pos = name_end;
                    previous = name.chars().next_back();
                    continue;
                }
            }

            let c = input.chars().next().unwrap_or_default();
            pos += c.len_utf8().max(1);
            previous = Some(c);
        }
        matches
    }

    fn match_call(source: &str, start: usize, name: &str, after_name: &str) -> Option<CallMatch> {
        let (after_space, _) = multispace0::<&str, nom::error::Error<&str>>(after_name).ok()?;
        let (remaining, group) = param_group(after_space).ok()?;
        let end = source.len() - remaining.len();
        let group_start = end - group.len();
        let params_span = (group_start + 1)..(end - 1);
        Some(CallMatch {
            name: name.to_string(),
            text: source[start..end].to_string(),
            params: source[params_span.clone()].to_string(),
            span: start..end,
            params_span,
        })
    }
}

/// Byte spans of every string and comment literal in `source`.
pub fn literal_spans(source: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while pos < source.len() {
        let input = &source[pos..];
        match literal(input) {
            Ok((remaining, _)) => {
                let end = source.len() - remaining.len();
                spans.push(pos..end);
                pos = end;
            }
            Err(_) => pos += input.chars().next().map_or(1, char::len_utf8),
        }
    }
    spans
}

/// Convenience wrapper over [`CallScanner::scan`].
pub fn scan_calls<I, S>(source: &str, names: I) -> Vec<CallMatch>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CallScanner::new(names).scan(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(matches: &[CallMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn test_skips_calls_inside_literals() {
        let source = "let s = 'TARGET(not a call)'\nlet x = TARGET(a, b)\n# TARGET(c)\n";
        let found = scan_calls(source, ["TARGET"]);
        assert_eq!(names(&found), vec!["TARGET(a, b)"]);
        assert_eq!(found[0].params, "a, b");
        assert_eq!(&source[found[0].span.clone()], "TARGET(a, b)");
        assert_eq!(&source[found[0].params_span.clone()], "a, b");
    }

    #[test]
    fn test_triple_quoted_with_embedded_quote() {
        let source = "let doc = \"\"\"say \"ask(1)\" twice\nask(2)\"\"\"\nask(3)";
        let found = scan_calls(source, ["ask"]);
        assert_eq!(names(&found), vec!["ask(3)"]);
    }

    #[test]
    fn test_nested_parens_and_literals_across_lines() {
        let source = "ask(prompt=concat(\"a)\", f(1,\n  2)), n=(3))\nrest";
        let found = scan_calls(source, ["ask"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].params, "prompt=concat(\"a)\", f(1,\n  2)), n=(3)");
    }

    #[test]
    fn test_nested_same_name_is_captured_whole() {
        let found = scan_calls("ask(prompt=ask(prompt=\"x\"))", ["ask"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].params, "prompt=ask(prompt=\"x\")");
    }

    #[test]
    fn test_unbalanced_parens_yield_no_match() {
        let found = scan_calls("ask(1, (2)\nlet y = 3", ["ask"]);
        assert!(found.is_empty());
    }

    #[test]
    fn test_name_boundaries() {
        let source = "task(1) + ask (2) + m.ask(3) + lib.ask(4)";
        let found = scan_calls(source, ["ask", "lib.ask"]);
        assert_eq!(names(&found), vec!["ask (2)", "lib.ask(4)"]);
    }

    #[test]
    fn test_literal_spans() {
        let source = "a = \"x;y\" // c;\nb = 'z'";
        let spans: Vec<&str> = literal_spans(source)
            .into_iter()
            .map(|span| &source[span])
            .collect();
        assert_eq!(spans, vec!["\"x;y\"", "// c;", "'z'"]);
    }
}
