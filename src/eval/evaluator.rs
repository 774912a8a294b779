use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::ast::{Expression, Number, Program, Statement};
use crate::oracle::{DispatchError, Oracle, OracleRegistry};

use super::builtins::{build_map, Builtin};
use super::environment::Environment;
use super::value::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("NameError: '{0}' is not defined")]
    Name(String),
    #[error("UnknownFunctionError: '{0}' is neither a builtin nor a registered oracle")]
    UnknownFunction(String),
    #[error("RuntimeError: {0}")]
    Runtime(String),
    #[error("LimitExceeded: {0}")]
    LimitExceeded(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Outcome of one loop-body evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopSignal {
    Continue,
    Break(Value),
    Value(Value),
}

/// Optional bounds applied to every `for` and `while` loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopLimits {
    #[serde(default)]
    pub max_iterations: Option<u64>,
    #[serde(default, with = "crate::config::option_duration_ms")]
    pub timeout: Option<Duration>,
}

struct LoopGuard {
    limits: LoopLimits,
    started: Instant,
    iterations: u64,
}

impl LoopGuard {
    fn new(limits: LoopLimits) -> Self {
        Self {
            limits,
            started: Instant::now(),
            iterations: 0,
        }
    }

    fn tick(&mut self) -> EvalResult<()> {
        self.iterations += 1;
        if let Some(max) = self.limits.max_iterations {
            if self.iterations > max {
                return Err(EvalError::LimitExceeded(format!(
                    "loop exceeded {} iterations",
                    max
                )));
            }
        }
        if let Some(timeout) = self.limits.timeout {
            if self.started.elapsed() > timeout {
                return Err(EvalError::LimitExceeded(format!(
                    "loop exceeded {} ms",
                    timeout.as_millis()
                )));
            }
        }
        Ok(())
    }
}

const BREAK: [&str; 2] = ["break", "ctrl.break"];
const CONTINUE: [&str; 2] = ["continue", "ctrl.continue"];

/// Tree-walking evaluator. Call names resolve to builtins first, then to
/// oracles registered in `registry`, which are invoked through `oracle`.
pub struct Evaluator<'a> {
    registry: &'a OracleRegistry,
    oracle: &'a dyn Oracle,
    limits: LoopLimits,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a OracleRegistry, oracle: &'a dyn Oracle) -> Self {
        Self {
            registry,
            oracle,
            limits: LoopLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Runs every statement against `env`; returns the value of the last one.
    pub fn eval_program(&self, program: &Program, env: &mut Environment) -> EvalResult<Value> {
        let mut last = Value::Null;
        for statement in &program.statements {
            last = self.eval_statement(statement, env)?;
        }
        Ok(last)
    }

    pub fn eval_statement(&self, statement: &Statement, env: &mut Environment) -> EvalResult<Value> {
        match statement {
            Statement::Let { name, expression } => {
                let value = self.eval_expression(expression, env)?;
                debug!("let {} = {}", name, value);
                env.set(name.clone(), value.clone());
                Ok(value)
            }
            Statement::Expression(expression) => self.eval_expression(expression, env),
        }
    }

    pub fn eval_expression(&self, expr: &Expression, env: &Environment) -> EvalResult<Value> {
        match expr {
            Expression::Var(name) => env
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::Name(name.clone())),
            Expression::Number(Number::Integer(i)) => Ok(Value::Integer(*i)),
            Expression::Number(Number::Float(x)) => Ok(Value::Float(*x)),
            Expression::String(s) => Ok(Value::String(s.clone())),
            Expression::Boolean(b) => Ok(Value::Boolean(*b)),
            Expression::List(items) => items
                .iter()
                .map(|item| self.eval_expression(item, env))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List),
            Expression::Dict(entries) => {
                let mut evaluated = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    evaluated.push((
                        self.eval_expression(key, env)?,
                        self.eval_expression(value, env)?,
                    ));
                }
                build_map(evaluated)
            }
            Expression::Call { name, args, kwargs } => self.eval_call(name, args, kwargs, env),
            Expression::ForLoop {
                start,
                end,
                step,
                init,
                body,
            } => self.eval_for(start, end, step, init, body, env),
            Expression::WhileLoop { test, init, body } => self.eval_while(test, init, body, env),
            Expression::Cond {
                test,
                then,
                otherwise,
            } => {
                // Only the taken branch is evaluated.
                if self.eval_expression(test, env)?.is_truthy() {
                    self.eval_expression(then, env)
                } else {
                    self.eval_expression(otherwise, env)
                }
            }
        }
    }

    /// Evaluates a loop body, where `break`/`continue` may appear in tail
    /// position.
    fn eval_tail(&self, expr: &Expression, env: &Environment) -> EvalResult<LoopSignal> {
        match expr {
            Expression::Call { name, args, kwargs } if BREAK.contains(&name.as_str()) => {
                if !kwargs.is_empty() || args.len() > 1 {
                    return Err(EvalError::Runtime(
                        "break takes at most one positional argument".to_string(),
                    ));
                }
                let value = match args.first() {
                    Some(arg) => self.eval_expression(arg, env)?,
                    None => Value::Null,
                };
                Ok(LoopSignal::Break(value))
            }
            Expression::Call { name, args, kwargs } if CONTINUE.contains(&name.as_str()) => {
                if !args.is_empty() || !kwargs.is_empty() {
                    return Err(EvalError::Runtime(
                        "continue takes no arguments".to_string(),
                    ));
                }
                Ok(LoopSignal::Continue)
            }
            Expression::Cond {
                test,
                then,
                otherwise,
            } => {
                if self.eval_expression(test, env)?.is_truthy() {
                    self.eval_tail(then, env)
                } else {
                    self.eval_tail(otherwise, env)
                }
            }
            other => self.eval_expression(other, env).map(LoopSignal::Value),
        }
    }

    fn eval_call(
        &self,
        name: &str,
        args: &[Expression],
        kwargs: &[(String, Expression)],
        env: &Environment,
    ) -> EvalResult<Value> {
        if BREAK.contains(&name) || CONTINUE.contains(&name) {
            return Err(EvalError::Runtime(format!(
                "{}() is only allowed in the tail position of a loop body",
                name
            )));
        }

        let builtin = Builtin::lookup(name);
        if builtin.is_none() && !self.registry.contains(name) {
            return Err(EvalError::UnknownFunction(name.to_string()));
        }

        let args = args
            .iter()
            .map(|arg| self.eval_expression(arg, env))
            .collect::<EvalResult<Vec<_>>>()?;
        let mut evaluated_kwargs = Vec::with_capacity(kwargs.len());
        for (key, value) in kwargs {
            evaluated_kwargs.push((key.clone(), self.eval_expression(value, env)?));
        }

        match builtin {
            Some(builtin) => builtin.apply(args, evaluated_kwargs),
            None => {
                debug!("invoking oracle {}", name);
                Ok(self.oracle.invoke(name, &args, &evaluated_kwargs)?)
            }
        }
    }

    fn eval_integer(&self, expr: &Expression, env: &Environment, what: &str) -> EvalResult<i64> {
        match self.eval_expression(expr, env)? {
            Value::Integer(i) => Ok(i),
            other => Err(EvalError::Runtime(format!(
                "for-loop {} must be an integer, got {}",
                what,
                other.type_name()
            ))),
        }
    }

    fn eval_for(
        &self,
        start: &Expression,
        end: &Expression,
        step: &Expression,
        init: &Expression,
        body: &Expression,
        env: &Environment,
    ) -> EvalResult<Value> {
        let start = self.eval_integer(start, env, "start")?;
        let end = self.eval_integer(end, env, "end")?;
        let step = self.eval_integer(step, env, "step")?;
        if step == 0 {
            return Err(EvalError::Runtime("for-loop step must not be zero".to_string()));
        }
        let mut acc = self.eval_expression(init, env)?;
        debug!("for {}..{} step {}", start, end, step);

        let mut guard = LoopGuard::new(self.limits);
        let mut i = start;
        while (step > 0 && i < end) || (step < 0 && i > end) {
            guard.tick()?;
            let scope = env.child([("i", Value::Integer(i)), ("acc", acc.clone())]);
            match self.eval_tail(body, &scope)? {
                LoopSignal::Value(next) => acc = next,
                LoopSignal::Continue => {}
                LoopSignal::Break(value) => return Ok(value),
            }
            i = match i.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(acc)
    }

    fn eval_while(
        &self,
        test: &Expression,
        init: &Expression,
        body: &Expression,
        env: &Environment,
    ) -> EvalResult<Value> {
        let mut acc = self.eval_expression(init, env)?;
        let mut guard = LoopGuard::new(self.limits);
        loop {
            let scope = env.child([("acc", acc.clone())]);
            if !self.eval_expression(test, &scope)?.is_truthy() {
                return Ok(acc);
            }
            guard.tick()?;
            match self.eval_tail(body, &scope)? {
                LoopSignal::Value(next) => acc = next,
                LoopSignal::Continue => {}
                LoopSignal::Break(value) => return Ok(value),
            }
        }
    }
}
