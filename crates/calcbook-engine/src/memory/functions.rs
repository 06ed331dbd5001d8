//! Built-in function registry for the in-memory engine.
//!
//! The registry is built once per process during module initialization and
//! shared by every [`MemoryEngine`](super::MemoryEngine) the factory hands
//! out.

use std::collections::HashMap;

use super::eval::{as_number, EvalError};
use crate::CellValue;

type BuiltinFn = fn(&[CellValue]) -> Result<CellValue, EvalError>;

/// Lookup table of built-in functions, keyed by upper-case name.
pub struct FunctionRegistry {
    builtins: HashMap<&'static str, BuiltinFn>,
}

impl FunctionRegistry {
    /// Build the standard registry.
    pub fn standard() -> Self {
        let mut builtins: HashMap<&'static str, BuiltinFn> = HashMap::new();
        builtins.insert("SUM", builtin_sum);
        builtins.insert("IF", builtin_if);
        builtins.insert("ISTEXT", builtin_istext);
        builtins.insert("ISNUMBER", builtin_isnumber);
        FunctionRegistry { builtins }
    }

    pub(super) fn get(&self, name: &str) -> Option<&BuiltinFn> {
        self.builtins.get(name)
    }
}

fn builtin_sum(args: &[CellValue]) -> Result<CellValue, EvalError> {
    let mut total = 0.0;
    for arg in args {
        total += as_number(arg)?;
    }
    Ok(CellValue::Number(total))
}

fn builtin_if(args: &[CellValue]) -> Result<CellValue, EvalError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EvalError::new("IF expects 2 or 3 arguments"));
    }
    let condition = match &args[0] {
        CellValue::Boolean(b) => *b,
        CellValue::Number(n) => *n != 0.0,
        other => return Err(EvalError::new(format!("IF condition is not logical: {other}"))),
    };
    if condition {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or(CellValue::Boolean(false)))
    }
}

fn builtin_istext(args: &[CellValue]) -> Result<CellValue, EvalError> {
    match args {
        [value] => Ok(CellValue::Boolean(matches!(value, CellValue::String(_)))),
        _ => Err(EvalError::new("ISTEXT expects exactly 1 argument")),
    }
}

fn builtin_isnumber(args: &[CellValue]) -> Result<CellValue, EvalError> {
    match args {
        [value] => Ok(CellValue::Boolean(matches!(value, CellValue::Number(_)))),
        _ => Err(EvalError::new("ISNUMBER expects exactly 1 argument")),
    }
}
