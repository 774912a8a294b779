use tracing::{debug, info};

use crate::ast::Program;
use crate::config::RunConfig;
use crate::error::Result;
use crate::eval::{Environment, Evaluator};
use crate::oracle::{AdapterDispatcher, FunctionResolver, OracleRegistry};
use crate::parser::parse_program;
use crate::rewrite::RewriteEngine;

/// Rewrite, parse and evaluate one program with a fixed configuration and
/// oracle table.
pub struct Pipeline {
    config: RunConfig,
    dispatcher: AdapterDispatcher,
}

impl Pipeline {
    pub fn new(config: RunConfig, registry: OracleRegistry) -> Self {
        let dispatcher = AdapterDispatcher::new(registry).with_config(config.dispatcher.clone());
        Self { config, dispatcher }
    }

    pub fn with_resolver(mut self, resolver: impl FunctionResolver + 'static) -> Self {
        self.dispatcher = self.dispatcher.with_resolver(resolver);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn registry(&self) -> &OracleRegistry {
        self.dispatcher.registry()
    }

    /// Runs the configured rewrite passes over the source text.
    pub fn rewrite(&self, source: &str) -> Result<String> {
        let passes = &self.config.passes;
        if passes.accuracy_passes == 0 && passes.decomposition_passes == 0 {
            return Ok(source.to_string());
        }
        let engine = RewriteEngine::new(self.registry(), &self.dispatcher, passes.clone());
        let rewritten = engine.run(source, passes.accuracy_passes, passes.decomposition_passes)?;
        info!(
            "rewrite passes done ({} accuracy, {} decomposition)",
            passes.accuracy_passes, passes.decomposition_passes
        );
        Ok(rewritten)
    }

    pub fn parse(&self, source: &str) -> Result<Program> {
        let program = parse_program(source, &self.config.parser)?;
        debug!("parsed {} statements", program.statements.len());
        Ok(program)
    }

    pub fn evaluate(&self, program: &Program) -> Result<Environment> {
        let mut env = Environment::new();
        Evaluator::new(self.registry(), &self.dispatcher)
            .with_limits(self.config.limits)
            .eval_program(program, &mut env)?;
        Ok(env)
    }

    /// Rewrite, parse, evaluate; returns the final environment.
    pub fn run(&self, source: &str) -> Result<Environment> {
        let source = self.rewrite(source)?;
        let program = self.parse(&source)?;
        self.evaluate(&program)
    }
}
