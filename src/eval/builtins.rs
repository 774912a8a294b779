//! Builtin operations. Infix operators, indexing and slicing are desugared into
//! calls of these by the parser, so they are the whole primitive surface of the
//! language. Names may also be written with an `op.` prefix.

use std::collections::BTreeMap;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::evaluator::{EvalError, EvalResult};
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    #[strum(to_string = "neq", serialize = "ne")]
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Land,
    Lor,
    Lnot,
    Concat,
    Len,
    Substr,
    Get,
    Set,
    Append,
    Slice,
    Has,
    Keys,
    Str,
}

pub const OP_PREFIX: &str = "op.";

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        name.strip_prefix(OP_PREFIX).unwrap_or(name).parse().ok()
    }

    pub fn is_builtin(name: &str) -> bool {
        Self::lookup(name).is_some()
    }

    /// Every name that resolves to a builtin, prefixed forms included.
    pub fn all_names() -> Vec<String> {
        let mut names = Vec::new();
        for builtin in Builtin::iter() {
            let base = builtin.to_string();
            names.push(format!("{}{}", OP_PREFIX, base));
            names.push(base);
        }
        names.push("ne".to_string());
        names.push(format!("{}ne", OP_PREFIX));
        names
    }

    pub fn apply(self, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult<Value> {
        if self != Builtin::Slice {
            if let Some((key, _)) = kwargs.first() {
                return Err(EvalError::Runtime(format!(
                    "{} does not accept keyword argument '{}'",
                    self, key
                )));
            }
        }

        match self {
            Builtin::Add => binary(self, &args).and_then(|(l, r)| add(l, r)),
            Builtin::Sub => binary(self, &args).and_then(|(l, r)| sub(l, r)),
            Builtin::Mul => binary(self, &args).and_then(|(l, r)| mul(l, r)),
            Builtin::Div => binary(self, &args).and_then(|(l, r)| div(l, r)),
            Builtin::Mod => binary(self, &args).and_then(|(l, r)| modulo(l, r)),
            Builtin::Eq => binary(self, &args).map(|(l, r)| Value::Boolean(l.loosely_equals(r))),
            Builtin::Neq => {
                binary(self, &args).map(|(l, r)| Value::Boolean(!l.loosely_equals(r)))
            }
            Builtin::Lt => compare(self, &args, |o| o.is_lt()),
            Builtin::Le => compare(self, &args, |o| o.is_le()),
            Builtin::Gt => compare(self, &args, |o| o.is_gt()),
            Builtin::Ge => compare(self, &args, |o| o.is_ge()),
            Builtin::Land => binary(self, &args)
                .map(|(l, r)| if l.is_truthy() { r.clone() } else { l.clone() }),
            Builtin::Lor => binary(self, &args)
                .map(|(l, r)| if l.is_truthy() { l.clone() } else { r.clone() }),
            Builtin::Lnot => unary(self, &args).map(|v| Value::Boolean(!v.is_truthy())),
            Builtin::Concat => Ok(Value::String(
                args.iter().map(|v| v.to_string()).collect::<String>(),
            )),
            Builtin::Len => unary(self, &args).and_then(len),
            Builtin::Substr => substr(&args),
            Builtin::Get => binary(self, &args).and_then(|(c, k)| get(c, k)),
            Builtin::Set => set(args),
            Builtin::Append => append(args),
            Builtin::Has => binary(self, &args).and_then(|(c, i)| has(c, i)),
            Builtin::Keys => unary(self, &args).and_then(keys),
            Builtin::Str => unary(self, &args).map(|v| Value::String(v.to_string())),
            Builtin::Slice => slice_call(args, kwargs),
        }
    }
}

fn arity_error(builtin: Builtin, expected: &str, got: usize) -> EvalError {
    EvalError::Runtime(format!(
        "{} expects {} argument(s), got {}",
        builtin, expected, got
    ))
}

fn unary(builtin: Builtin, args: &[Value]) -> EvalResult<&Value> {
    match args {
        [value] => Ok(value),
        _ => Err(arity_error(builtin, "1", args.len())),
    }
}

fn binary(builtin: Builtin, args: &[Value]) -> EvalResult<(&Value, &Value)> {
    match args {
        [left, right] => Ok((left, right)),
        _ => Err(arity_error(builtin, "2", args.len())),
    }
}

fn type_error(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::Runtime(format!(
        "unsupported operand types for {}: {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn overflow(op: &str) -> EvalError {
    EvalError::Runtime(format!("integer overflow in {}", op))
}

fn add(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => {
            l.checked_add(*r).map(Value::Integer).ok_or_else(|| overflow("add"))
        }
        (Value::String(l), Value::String(r)) => Ok(Value::String(l.clone() + r)),
        (Value::List(l), Value::List(r)) => {
            Ok(Value::List(l.iter().chain(r.iter()).cloned().collect()))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => Ok(Value::Float(l + r)),
            _ => Err(type_error("add", left, right)),
        },
    }
}

fn sub(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => {
            l.checked_sub(*r).map(Value::Integer).ok_or_else(|| overflow("sub"))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => Ok(Value::Float(l - r)),
            _ => Err(type_error("sub", left, right)),
        },
    }
}

fn mul(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => {
            l.checked_mul(*r).map(Value::Integer).ok_or_else(|| overflow("mul"))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => Ok(Value::Float(l * r)),
            _ => Err(type_error("mul", left, right)),
        },
    }
}

fn div(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left.as_f64(), right.as_f64()) {
        (Some(_), Some(r)) if r == 0.0 => Err(EvalError::Runtime("division by zero".to_string())),
        (Some(l), Some(r)) => Ok(Value::Float(l / r)),
        _ => Err(type_error("div", left, right)),
    }
}

/// Floored modulo: the result takes the sign of the divisor.
fn modulo(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Integer(_), Value::Integer(0)) => {
            Err(EvalError::Runtime("modulo by zero".to_string()))
        }
        (Value::Integer(l), Value::Integer(r)) => {
            let rem = l.checked_rem(*r).ok_or_else(|| overflow("mod"))?;
            if rem != 0 && (rem < 0) != (*r < 0) {
                Ok(Value::Integer(rem + r))
            } else {
                Ok(Value::Integer(rem))
            }
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(_), Some(r)) if r == 0.0 => {
                Err(EvalError::Runtime("modulo by zero".to_string()))
            }
            (Some(l), Some(r)) => {
                let rem = l % r;
                if rem != 0.0 && (rem < 0.0) != (r < 0.0) {
                    Ok(Value::Float(rem + r))
                } else {
                    Ok(Value::Float(rem))
                }
            }
            _ => Err(type_error("mod", left, right)),
        },
    }
}

fn compare<F>(builtin: Builtin, args: &[Value], check: F) -> EvalResult<Value>
where
    F: Fn(std::cmp::Ordering) -> bool,
{
    let (left, right) = binary(builtin, args)?;
    left.compare(right).map(|ordering| Value::Boolean(check(ordering)))
}

fn len(value: &Value) -> EvalResult<Value> {
    let n = match value {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => {
            return Err(EvalError::Runtime(format!(
                "len() of {} is undefined",
                other.type_name()
            )))
        }
    };
    Ok(Value::Integer(n as i64))
}

fn as_index(value: &Value, what: &str) -> EvalResult<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        other => Err(EvalError::Runtime(format!(
            "{} must be an integer, got {}",
            what,
            other.type_name()
        ))),
    }
}

fn optional_index(value: Option<&Value>, what: &str) -> EvalResult<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => as_index(v, what).map(Some),
    }
}

/// Resolves a possibly negative index against `len`.
fn element_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

/// Clamped `[start, end)` range with negative bounds counted from the end.
fn slice_bounds(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let len = len as i64;
    let clamp = |bound: i64| {
        if bound < 0 {
            (bound + len).max(0)
        } else {
            bound.min(len)
        }
    };
    let start = start.map_or(0, clamp);
    let end = end.map_or(len, clamp);
    (start as usize, end.max(start) as usize)
}

fn slice_value(target: &Value, start: Option<i64>, end: Option<i64>) -> EvalResult<Value> {
    match target {
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (from, to) = slice_bounds(start, end, chars.len());
            Ok(Value::String(chars[from..to].iter().collect()))
        }
        Value::List(items) => {
            let (from, to) = slice_bounds(start, end, items.len());
            Ok(Value::List(items[from..to].to_vec()))
        }
        other => Err(EvalError::Runtime(format!(
            "cannot slice {}",
            other.type_name()
        ))),
    }
}

fn slice_call(args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult<Value> {
    if args.is_empty() || args.len() > 3 {
        return Err(arity_error(Builtin::Slice, "1 to 3", args.len()));
    }
    let mut start = optional_index(args.get(1), "slice start")?;
    let mut end = optional_index(args.get(2), "slice end")?;
    for (key, value) in &kwargs {
        match key.as_str() {
            "start" => start = optional_index(Some(value), "slice start")?,
            "end" => end = optional_index(Some(value), "slice end")?,
            other => {
                return Err(EvalError::Runtime(format!(
                    "slice does not accept keyword argument '{}'",
                    other
                )))
            }
        }
    }
    slice_value(&args[0], start, end)
}

fn substr(args: &[Value]) -> EvalResult<Value> {
    let (text, start, end) = match args {
        [text, start] => (text, start, None),
        [text, start, end] => (text, start, Some(end)),
        _ => return Err(arity_error(Builtin::Substr, "2 or 3", args.len())),
    };
    if !matches!(text, Value::String(_)) {
        return Err(EvalError::Runtime(format!(
            "substr expects a string, got {}",
            text.type_name()
        )));
    }
    slice_value(
        text,
        Some(as_index(start, "substr start")?),
        optional_index(end, "substr end")?,
    )
}

fn get(container: &Value, key: &Value) -> EvalResult<Value> {
    match container {
        Value::List(items) => {
            let index = as_index(key, "list index")?;
            element_index(index, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| EvalError::Runtime(format!("list index {} out of range", index)))
        }
        Value::String(s) => {
            let index = as_index(key, "string index")?;
            let chars: Vec<char> = s.chars().collect();
            element_index(index, chars.len())
                .map(|i| Value::String(chars[i].to_string()))
                .ok_or_else(|| {
                    EvalError::Runtime(format!("string index {} out of range", index))
                })
        }
        Value::Map(entries) => {
            let key = key.to_map_key()?;
            entries
                .get(&key)
                .cloned()
                .ok_or_else(|| EvalError::Runtime(format!("key '{}' not found", key)))
        }
        other => Err(EvalError::Runtime(format!(
            "cannot index {}",
            other.type_name()
        ))),
    }
}

fn set(args: Vec<Value>) -> EvalResult<Value> {
    let [container, key, value]: [Value; 3] = args
        .try_into()
        .map_err(|args: Vec<Value>| arity_error(Builtin::Set, "3", args.len()))?;
    match container {
        Value::List(mut items) => {
            let index = as_index(&key, "list index")?;
            let slot = element_index(index, items.len()).ok_or_else(|| {
                EvalError::Runtime(format!("list index {} out of range", index))
            })?;
            items[slot] = value;
            Ok(Value::List(items))
        }
        Value::Map(mut entries) => {
            entries.insert(key.to_map_key()?, value);
            Ok(Value::Map(entries))
        }
        other => Err(EvalError::Runtime(format!(
            "cannot set an item on {}",
            other.type_name()
        ))),
    }
}

fn append(args: Vec<Value>) -> EvalResult<Value> {
    let [list, value]: [Value; 2] = args
        .try_into()
        .map_err(|args: Vec<Value>| arity_error(Builtin::Append, "2", args.len()))?;
    match list {
        Value::List(mut items) => {
            items.push(value);
            Ok(Value::List(items))
        }
        other => Err(EvalError::Runtime(format!(
            "cannot append to {}",
            other.type_name()
        ))),
    }
}

fn has(container: &Value, item: &Value) -> EvalResult<Value> {
    let found = match (container, item) {
        (Value::List(items), item) => items.iter().any(|v| v.loosely_equals(item)),
        (Value::Map(entries), key) => entries.contains_key(&key.to_map_key()?),
        (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
        (container, item) => return Err(type_error("has", container, item)),
    };
    Ok(Value::Boolean(found))
}

fn keys(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Map(entries) => Ok(Value::List(
            entries.keys().cloned().map(Value::String).collect(),
        )),
        other => Err(EvalError::Runtime(format!(
            "keys() of {} is undefined",
            other.type_name()
        ))),
    }
}

/// Builds a map value from evaluated entries, converting keys.
pub fn build_map(entries: Vec<(Value, Value)>) -> EvalResult<Value> {
    let mut map = BTreeMap::new();
    for (key, value) in entries {
        map.insert(key.to_map_key()?, value);
    }
    Ok(Value::Map(map))
}
