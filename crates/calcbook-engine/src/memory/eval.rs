//! Minimal formula interpreter for the in-memory engine.
//!
//! Supports literals, same-sheet A1 references, unary minus, the four
//! arithmetic operators, comparisons and registry function calls. Anything
//! the interpreter cannot handle yields an empty derived value; evaluation
//! semantics are explicitly outside the SDK contract.

use std::collections::HashSet;

use super::functions::FunctionRegistry;
use super::SheetState;
use crate::CellValue;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct EvalError(pub String);

impl EvalError {
    pub(super) fn new(message: impl Into<String>) -> Self {
        EvalError(message.into())
    }
}

type EvalResult = Result<CellValue, EvalError>;

/// Evaluate `formula` (leading `=` included) against a sheet's stored cells.
pub(super) fn evaluate_formula(
    formula: &str,
    sheet: &SheetState,
    registry: &FunctionRegistry,
) -> CellValue {
    let Some(body) = formula.strip_prefix('=') else {
        return CellValue::Empty;
    };
    let mut evaluator = Evaluator {
        sheet,
        registry,
        visiting: HashSet::new(),
    };
    match parse(body).and_then(|expr| evaluator.eval(&expr)) {
        Ok(value) => value,
        Err(_) => CellValue::Empty,
    }
}

struct Evaluator<'a> {
    sheet: &'a SheetState,
    registry: &'a FunctionRegistry,
    visiting: HashSet<(u32, u32)>,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Number(n) => Ok(CellValue::Number(*n)),
            Expr::Str(s) => Ok(CellValue::String(s.clone())),
            Expr::Bool(b) => Ok(CellValue::Boolean(*b)),
            Expr::Ref(row, column) => self.eval_ref(*row, *column),
            Expr::Unary(op, inner) => {
                let value = self.eval(inner)?;
                match op {
                    UnOp::Neg => Ok(CellValue::Number(-as_number(&value)?)),
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                apply_binary(*op, &lhs, &rhs)
            }
            Expr::Func(name, args) => {
                let func = self
                    .registry
                    .get(name)
                    .ok_or_else(|| EvalError::new(format!("Unknown function: {name}")))?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                func(&values)
            }
        }
    }

    fn eval_ref(&mut self, row: u32, column: u32) -> EvalResult {
        if !self.visiting.insert((row, column)) {
            return Err(EvalError::new("Circular reference"));
        }
        let result = match self.sheet.cell(row, column) {
            Some(cell) => match cell.formula.as_deref().and_then(|f| f.strip_prefix('=')) {
                Some(body) => parse(body).and_then(|expr| self.eval(&expr)),
                None => Ok(cell.value.clone()),
            },
            None => Ok(CellValue::Empty),
        };
        self.visiting.remove(&(row, column));
        result
    }
}

/// Numeric coercion used by arithmetic: empty counts as zero.
pub(super) fn as_number(value: &CellValue) -> Result<f64, EvalError> {
    match value {
        CellValue::Number(n) => Ok(*n),
        CellValue::Empty => Ok(0.0),
        other => Err(EvalError::new(format!("Expected a number, got {other}"))),
    }
}

fn apply_binary(op: BinOp, lhs: &CellValue, rhs: &CellValue) -> EvalResult {
    use std::cmp::Ordering;
    match op {
        BinOp::Add => Ok(CellValue::Number(as_number(lhs)? + as_number(rhs)?)),
        BinOp::Sub => Ok(CellValue::Number(as_number(lhs)? - as_number(rhs)?)),
        BinOp::Mul => Ok(CellValue::Number(as_number(lhs)? * as_number(rhs)?)),
        BinOp::Div => {
            let divisor = as_number(rhs)?;
            if divisor == 0.0 {
                return Err(EvalError::new("Division by zero"));
            }
            Ok(CellValue::Number(as_number(lhs)? / divisor))
        }
        BinOp::Eq | BinOp::Ne => {
            let equal = values_equal(lhs, rhs);
            Ok(CellValue::Boolean(if op == BinOp::Eq { equal } else { !equal }))
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = compare(lhs, rhs)?;
            let holds = match op {
                BinOp::Lt => ordering == Ordering::Less,
                BinOp::Le => ordering != Ordering::Greater,
                BinOp::Gt => ordering == Ordering::Greater,
                BinOp::Ge => ordering != Ordering::Less,
                _ => unreachable!(),
            };
            Ok(CellValue::Boolean(holds))
        }
    }
}

fn values_equal(lhs: &CellValue, rhs: &CellValue) -> bool {
    match (lhs, rhs) {
        (CellValue::String(a), CellValue::String(b)) => a.eq_ignore_ascii_case(b),
        _ => lhs == rhs,
    }
}

fn compare(lhs: &CellValue, rhs: &CellValue) -> Result<std::cmp::Ordering, EvalError> {
    match (lhs, rhs) {
        (CellValue::String(a), CellValue::String(b)) => {
            Ok(a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()))
        }
        (CellValue::Boolean(a), CellValue::Boolean(b)) => Ok(a.cmp(b)),
        _ => {
            let a = as_number(lhs)?;
            let b = as_number(rhs)?;
            a.partial_cmp(&b)
                .ok_or_else(|| EvalError::new("Values are not comparable"))
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum UnOp {
    Neg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Ref(u32, u32),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Func(String, Vec<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b' ' | b'\t' => i += 1,
            b'+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            b'*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            b'/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            b',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            b'=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else if bytes.get(i + 1) == Some(&b'>') {
                    tokens.push(Token::Ne);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            b'"' => {
                let start = i + 1;
                let mut j = start;
                while j < bytes.len() && bytes[j] != b'"' {
                    j += 1;
                }
                if j == bytes.len() {
                    return Err(EvalError::new("Unterminated string literal"));
                }
                tokens.push(Token::Str(input[start..j].to_string()));
                i = j + 1;
            }
            b'0'..=b'9' | b'.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let number: f64 = input[start..i]
                    .parse()
                    .map_err(|_| EvalError::new("Invalid number literal"))?;
                tokens.push(Token::Number(number));
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(input[start..i].to_string()));
            }
            other => {
                return Err(EvalError::new(format!(
                    "Unexpected character: {}",
                    other as char
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

fn parse(input: &str) -> Result<Expr, EvalError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
    };
    let expr = parser.comparison()?;
    if parser.pos != parser.tokens.len() {
        return Err(EvalError::new("Trailing tokens in formula"));
    }
    Ok(expr)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.additive()?;
        while let Some(op) = match self.peek() {
            Some(Token::Eq) => Some(BinOp::Eq),
            Some(Token::Ne) => Some(BinOp::Ne),
            Some(Token::Lt) => Some(BinOp::Lt),
            Some(Token::Le) => Some(BinOp::Le),
            Some(Token::Gt) => Some(BinOp::Gt),
            Some(Token::Ge) => Some(BinOp::Ge),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.multiplicative()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.pos += 1;
            return Ok(Expr::Unary(UnOp::Neg, Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::LParen) => {
                let expr = self.comparison()?;
                match self.next() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err(EvalError::new("Expected closing parenthesis")),
                }
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if matches!(self.peek(), Some(Token::RParen)) {
                        self.pos += 1;
                    } else {
                        loop {
                            args.push(self.comparison()?);
                            match self.next() {
                                Some(Token::Comma) => continue,
                                Some(Token::RParen) => break,
                                _ => return Err(EvalError::new("Expected ',' or ')'")),
                            }
                        }
                    }
                    return Ok(Expr::Func(name.to_ascii_uppercase(), args));
                }
                if name.eq_ignore_ascii_case("TRUE") {
                    return Ok(Expr::Bool(true));
                }
                if name.eq_ignore_ascii_case("FALSE") {
                    return Ok(Expr::Bool(false));
                }
                parse_a1_reference(&name)
                    .map(|(row, column)| Expr::Ref(row, column))
                    .ok_or_else(|| EvalError::new(format!("Unknown name: {name}")))
            }
            _ => Err(EvalError::new("Unexpected end of formula")),
        }
    }
}

fn parse_a1_reference(name: &str) -> Option<(u32, u32)> {
    let letters_end = name.bytes().take_while(|b| b.is_ascii_alphabetic()).count();
    if letters_end == 0 || letters_end == name.len() {
        return None;
    }
    let (letters, digits) = name.split_at(letters_end);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut column: u32 = 0;
    for b in letters.bytes() {
        let v = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        column = column.checked_mul(26)?.checked_add(v)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row, column))
}
