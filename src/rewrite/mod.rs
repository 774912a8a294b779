//! Prompt rewrite passes.
//!
//! A pass scans the raw source for calls to registered oracles, pulls out each
//! call's `prompt=` string, asks an optimizer oracle for a better prompt (or a
//! chain of steps) and splices new `let` statements in front of the statement
//! holding the call. The call site itself is replaced by the last generated
//! binding. Generated names are namespaced with a leading `__<pass>_` so a
//! later pass never mistakes them for oracle calls.

pub mod extract;
pub mod prompts;
pub mod splice;

use std::collections::HashSet;
use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use strum::{AsRefStr, Display};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PassConfig;
use crate::eval::Builtin;
use crate::formatter::{quote_string, unparse_program};
use crate::oracle::{DispatchError, Oracle, OracleRegistry};
use crate::parser::{parse_source, ParserError};
use crate::scanner::{literal_spans, CallMatch, CallScanner};

use extract::extract_prompt;
use splice::{apply_edits, find_anchor, Edit};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewriteError {
    /// A matched call had no usable `prompt=` argument. The match is skipped.
    #[error("RewriteExtractionError in {callee}: {message}")]
    Extraction { callee: String, message: String },
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("rewritten source is invalid: {0}")]
    Validation(String),
    #[error(transparent)]
    Parse(#[from] ParserError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum RewritePass {
    Accuracy,
    Decomposition,
}

/// The splice computed for one call site.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteResult {
    /// New statements, in evaluation order.
    pub statements: Vec<String>,
    /// Binding that replaces the call.
    pub binding: String,
    /// Where the statements are inserted in the original text.
    pub insert_at: usize,
    pub call_span: Range<usize>,
}

pub struct RewriteEngine<'a> {
    registry: &'a OracleRegistry,
    oracle: &'a dyn Oracle,
    config: PassConfig,
}

impl<'a> RewriteEngine<'a> {
    pub fn new(registry: &'a OracleRegistry, oracle: &'a dyn Oracle, config: PassConfig) -> Self {
        Self {
            registry,
            oracle,
            config,
        }
    }

    /// Applies the accuracy pass `accuracy_passes` times, then the
    /// decomposition pass `decomposition_passes` times.
    pub fn run(
        &self,
        source: &str,
        accuracy_passes: usize,
        decomposition_passes: usize,
    ) -> Result<String, RewriteError> {
        let mut text = source.to_string();
        for _ in 0..accuracy_passes {
            text = self.apply_pass(&text, RewritePass::Accuracy)?;
        }
        for _ in 0..decomposition_passes {
            text = self.apply_pass(&text, RewritePass::Decomposition)?;
        }
        Ok(text)
    }

    fn optimizer(&self, pass: RewritePass) -> &str {
        match pass {
            RewritePass::Accuracy => &self.config.accuracy_oracle,
            RewritePass::Decomposition => &self.config.decomposition_oracle,
        }
    }

    /// Oracle names whose calls are rewritten.
    fn candidates(&self) -> Vec<String> {
        self.registry
            .names()
            .filter(|name| {
                !Builtin::is_builtin(name)
                    && *name != self.config.accuracy_oracle
                    && *name != self.config.decomposition_oracle
            })
            .map(str::to_string)
            .collect()
    }

    pub fn apply_pass(&self, source: &str, pass: RewritePass) -> Result<String, RewriteError> {
        let matches = CallScanner::new(self.candidates()).scan(source);
        if matches.is_empty() {
            debug!("{} pass: no candidate calls", pass);
            return Ok(source.to_string());
        }

        let mut protected = literal_spans(source);
        protected.extend(matches.iter().map(|m| m.span.clone()));

        let mut used: HashSet<String> = IDENTIFIER
            .find_iter(source)
            .map(|m| m.as_str().to_string())
            .chain(self.registry.names().map(str::to_string))
            .collect();

        let mut edits = Vec::new();
        let mut rewritten = 0;
        for call in &matches {
            let result = match self.rewrite_call(source, call, pass, &protected, &mut used) {
                Ok(Some(result)) => result,
                Ok(None) => continue,
                Err(RewriteError::Extraction { callee, message }) => {
                    warn!("skipping {} at {:?}: {}", callee, call.span, message);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let block = result.statements.join("\n");
            let insert = if result.insert_at == 0 {
                format!("{}\n", block)
            } else {
                format!("\n{}", block)
            };
            edits.push(Edit::insert(result.insert_at, insert));
            edits.push(Edit::replace(result.call_span, result.binding));
            rewritten += 1;
        }

        let output = apply_edits(source, edits);
        parse_source(&output).map_err(|e| {
            RewriteError::Validation(format!("{} pass produced unparsable source: {}", pass, e))
        })?;
        info!(
            "{} pass rewrote {} of {} call(s)",
            pass,
            rewritten,
            matches.len()
        );
        Ok(output)
    }

    /// Computes the splice for one call, or `None` when the generated
    /// statements do not survive validation.
    fn rewrite_call(
        &self,
        source: &str,
        call: &CallMatch,
        pass: RewritePass,
        protected: &[Range<usize>],
        used: &mut HashSet<String>,
    ) -> Result<Option<RewriteResult>, RewriteError> {
        let prompt = extract_prompt(&call.params).map_err(|message| RewriteError::Extraction {
            callee: call.name.clone(),
            message,
        })?;

        let kwargs = prompts::optimizer_kwargs(pass, &prompt.value);
        let answer = self.oracle.invoke(self.optimizer(pass), &[], &kwargs)?;
        let text = prompts::output_text(&answer).ok_or_else(|| {
            DispatchError::AdapterInvocation(format!(
                "{} returned {} instead of text",
                self.optimizer(pass),
                answer.type_name()
            ))
        })?;

        // The prompt argument's position inside the full call text.
        let offset = call.params_span.start - call.span.start;
        let prompt_range = (offset + prompt.range.start)..(offset + prompt.range.end);
        let with_prompt = |expr: &str| {
            let mut text = call.text.clone();
            text.replace_range(prompt_range.clone(), expr);
            text
        };

        let mut statements = Vec::new();
        let mut binding = String::new();
        match pass {
            RewritePass::Accuracy => {
                binding = fresh_name(pass, &call.name, used);
                statements.push(format!(
                    "let {} = {};",
                    binding,
                    with_prompt(&quote_string(&text))
                ));
            }
            RewritePass::Decomposition => {
                for step in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
                    let step_prompt = if binding.is_empty() {
                        quote_string(step)
                    } else {
                        format!(
                            "concat({}, {}, {}, {})",
                            quote_string("[[[[Context]]]] "),
                            binding,
                            quote_string("\n[[[[Prompt]]]] "),
                            quote_string(step)
                        )
                    };
                    binding = fresh_name(pass, &call.name, used);
                    statements.push(format!("let {} = {};", binding, with_prompt(&step_prompt)));
                }
            }
        }

        if statements.is_empty() {
            warn!("{} returned no steps for {}", self.optimizer(pass), call.name);
            return Ok(None);
        }
        if let Some(bad) = statements.iter().find(|s| !round_trips(s)) {
            warn!("discarding generated statement that does not round-trip: {}", bad);
            return Ok(None);
        }

        Ok(Some(RewriteResult {
            statements,
            binding,
            insert_at: find_anchor(source, call.span.start, protected),
            call_span: call.span.clone(),
        }))
    }
}

/// `__<pass>_<callee>_<n>` with the smallest `n` not yet in use.
fn fresh_name(pass: RewritePass, callee: &str, used: &mut HashSet<String>) -> String {
    let stem = format!("__{}_{}", pass.as_ref(), callee.replace('.', "_"));
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}", stem, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Parse, unparse and parse again must agree.
fn round_trips(statement: &str) -> bool {
    let Ok(program) = parse_source(statement) else {
        return false;
    };
    if program.statements.len() != 1 {
        return false;
    }
    unparse_program(&program)
        .ok()
        .and_then(|text| parse_source(&text).ok())
        .is_some_and(|reparsed| reparsed == program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Value;
    use crate::oracle::{MockOracle, OracleDefinition};
    use pretty_assertions::assert_eq;

    fn registry() -> OracleRegistry {
        let mut registry = OracleRegistry::new();
        for name in ["ask", "accuracy_opt_passes", "decomposition_opt_passes"] {
            registry.register(OracleDefinition::new(name));
        }
        registry
    }

    fn answering(text: &'static str, times: usize) -> MockOracle {
        let mut oracle = MockOracle::new();
        oracle
            .expect_invoke()
            .times(times)
            .returning(move |_, _, _| Ok(Value::from(text)));
        oracle
    }

    #[test]
    fn test_accuracy_pass_splices_binding() {
        let registry = registry();
        let oracle = answering("HI", 1);
        let engine = RewriteEngine::new(&registry, &oracle, PassConfig::default());

        let output = engine.run("let x = ask(prompt=\"hi\");", 1, 0).unwrap();
        assert_eq!(
            output,
            "let __accuracy_ask_1 = ask(prompt=\"HI\");\nlet x = __accuracy_ask_1;"
        );
    }

    #[test]
    fn test_decomposition_chain() {
        let registry = registry();
        let oracle = answering("step one\n\nstep two\n", 1);
        let engine = RewriteEngine::new(&registry, &oracle, PassConfig::default());

        let output = engine
            .run("let a = 1;\nlet x = ask(a, prompt=\"do it\");", 0, 1)
            .unwrap();
        assert_eq!(
            output,
            "let a = 1;\n\
             let __decomposition_ask_1 = ask(a, prompt=\"step one\");\n\
             let __decomposition_ask_2 = ask(a, prompt=concat(\"[[[[Context]]]] \", \
             __decomposition_ask_1, \"\\n[[[[Prompt]]]] \", \"step two\"));\n\
             let x = __decomposition_ask_2;"
        );
    }

    #[test]
    fn test_extraction_failure_skips_match() {
        let registry = registry();
        let oracle = answering("better", 1);
        let engine = RewriteEngine::new(&registry, &oracle, PassConfig::default());

        let source = "let a = ask(prompt=name);\nlet b = ask(prompt=\"ok\");";
        let output = engine.apply_pass(source, RewritePass::Accuracy).unwrap();
        assert_eq!(
            output,
            "let a = ask(prompt=name);\nlet __accuracy_ask_1 = ask(prompt=\"better\");\nlet b = __accuracy_ask_1;"
        );
    }

    #[test]
    fn test_second_pass_does_not_rematch_bindings() {
        let registry = registry();
        let oracle = answering("v", 2);
        let engine = RewriteEngine::new(&registry, &oracle, PassConfig::default());

        let output = engine.run("let x = ask(prompt=\"hi\");", 2, 0).unwrap();
        assert_eq!(
            output,
            "let __accuracy_ask_2 = ask(prompt=\"v\");\n\
             let __accuracy_ask_1 = __accuracy_ask_2;\n\
             let x = __accuracy_ask_1;"
        );
    }

    #[test]
    fn test_non_text_answer_fails_pass() {
        let registry = registry();
        let mut oracle = MockOracle::new();
        oracle
            .expect_invoke()
            .returning(|_, _, _| Ok(Value::Integer(1)));
        let engine = RewriteEngine::new(&registry, &oracle, PassConfig::default());
        assert!(matches!(
            engine.run("ask(prompt=\"x\")", 1, 0),
            Err(RewriteError::Dispatch(DispatchError::AdapterInvocation(_)))
        ));
    }

    #[test]
    fn test_calls_in_literals_are_untouched() {
        let registry = registry();
        let oracle = MockOracle::new();
        let engine = RewriteEngine::new(&registry, &oracle, PassConfig::default());
        let source = "let s = \"ask(prompt='no')\"; # ask(prompt=\"no\")";
        assert_eq!(engine.run(source, 1, 1).unwrap(), source);
    }
}
