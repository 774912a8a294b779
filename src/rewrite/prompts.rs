use crate::eval::Value;

use super::RewritePass;

pub const SYSTEM_PERSONA: &str = "You are an expert prompt engineer. You rewrite prompts that \
will be sent to a language model so that the model's answers become more accurate and more \
useful, without changing what is being asked.";

const ACCURACY_INSTRUCTION: &str = "Rewrite the prompt below so that it is clearer, more \
specific and more likely to produce a correct answer. Reply with the rewritten prompt only.";

const DECOMPOSITION_INSTRUCTION: &str = "Break the task in the prompt below into a short \
sequence of intermediate steps, each solvable on its own and building on the previous one. \
Reply with one step per line and nothing else.";

const GRAMMAR_NOTE: &str = "Your reply is embedded verbatim as a string value in program \
source: do not add explanations, markdown, code fences or surrounding quotes.";

/// The `prompt` sent to the optimizer oracle.
pub fn optimizer_prompt(pass: RewritePass, prompt: &str) -> String {
    let instruction = match pass {
        RewritePass::Accuracy => ACCURACY_INSTRUCTION,
        RewritePass::Decomposition => DECOMPOSITION_INSTRUCTION,
    };
    format!("{}\n{}\n\nGIVEN PROMPT: {}", instruction, GRAMMAR_NOTE, prompt)
}

/// Keyword arguments for one optimizer call.
pub fn optimizer_kwargs(pass: RewritePass, prompt: &str) -> Vec<(String, Value)> {
    vec![
        ("system".to_string(), Value::from(SYSTEM_PERSONA)),
        ("prompt".to_string(), Value::from(optimizer_prompt(pass, prompt))),
    ]
}

const THINK_END: &str = "</think>";

/// Reads the optimizer's answer: a string, or a map carrying one under
/// `output`, `content` or `text`. Reasoning before `</think>` is dropped, and
/// surrounding whitespace and one pair of wrapping quotes are trimmed.
pub fn output_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Map(entries) => ["output", "content", "text"]
            .iter()
            .find_map(|key| entries.get(*key).and_then(Value::as_str))?,
        _ => return None,
    };

    let text = match text.rfind(THINK_END) {
        Some(index) => &text[index + THINK_END.len()..],
        None => text,
    };
    let text = text.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| text.strip_prefix(*q).and_then(|t| t.strip_suffix(*q)))
        .unwrap_or(text);
    Some(unquoted.to_string())
}
