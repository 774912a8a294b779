use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

use crate::tokenizer::{lex, literal::Literal, token::Token};

lazy_static! {
    static ref PROMPT_ARG: Regex = Regex::new(r"\bprompt\s*=\s*([^,]*)").unwrap();
}

/// The `prompt=` argument found in a call's raw parameter text.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptArgument {
    /// Source text of the argument value, e.g. `"summarize this"`.
    pub raw: String,
    /// Byte range of `raw` within the parameter text.
    pub range: Range<usize>,
    /// The decoded string.
    pub value: String,
}

/// Finds the `prompt=` argument. The value must be a single string literal
/// without top-level commas.
pub fn extract_prompt(params: &str) -> Result<PromptArgument, String> {
    let captures = PROMPT_ARG
        .captures(params)
        .ok_or_else(|| "no prompt= argument".to_string())?;
    let group = captures
        .get(1)
        .ok_or_else(|| "empty prompt= argument".to_string())?;

    let raw = group
        .as_str()
        .trim_end_matches(|c: char| c.is_whitespace() || c == ';');
    if raw.is_empty() {
        return Err("empty prompt= argument".to_string());
    }

    let tokens = lex(raw).map_err(|e| format!("prompt value {:?} does not lex: {}", raw, e))?;
    let mut values = tokens
        .into_iter()
        .map(|span| span.token)
        .filter(|token| !matches!(token, Token::Newline | Token::Eof));
    match (values.next(), values.next()) {
        (Some(Token::Literal(Literal::String(value))), None) => Ok(PromptArgument {
            raw: raw.to_string(),
            range: group.start()..group.start() + raw.len(),
            value,
        }),
        _ => Err(format!("prompt value {:?} is not a single string literal", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_string_prompt() {
        let params = "x, prompt = \"Summarize: \\\"a\\\"\" , n=2";
        let arg = extract_prompt(params).unwrap();
        assert_eq!(arg.raw, "\"Summarize: \\\"a\\\"\"");
        assert_eq!(&params[arg.range.clone()], arg.raw);
        assert_eq!(arg.value, "Summarize: \"a\"");
    }

    #[test]
    fn test_missing_or_non_literal_prompt() {
        assert!(extract_prompt("question=\"hi\"").is_err());
        assert!(extract_prompt("system_prompt=\"hi\"").is_err());
        assert!(extract_prompt("prompt=concat(\"a\", b)").is_err());
        assert!(extract_prompt("prompt=name").is_err());
    }

    #[test]
    fn test_comma_inside_prompt_is_not_supported() {
        assert!(extract_prompt("prompt=\"a, b\"").is_err());
    }
}
