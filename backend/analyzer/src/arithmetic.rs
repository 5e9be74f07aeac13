//! Restricted arithmetic evaluator.
//!
//! Grammar (whitespace ignored):
//!
//! ```text
//! expr := term (('+' | '-') term)*
//! term := int  (('*' | '/') int)*
//! int  := [0-9]+
//! ```
//!
//! Only integer literals and the four operators are reachable. Integers
//! that leave the `i64` range continue as floats; `/` always yields a float.

use std::fmt;

use serde_json::{Number, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ArithmeticError {
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
}

/// Numeric result of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn checked(self) -> Result<Self, ArithmeticError> {
        match self {
            Num::Float(f) if !f.is_finite() => Err(ArithmeticError::NonFinite),
            other => Ok(other),
        }
    }

    fn apply(self, op: char, rhs: Num) -> Result<Num, ArithmeticError> {
        let out = match (op, self, rhs) {
            ('/', _, rhs) if rhs.as_f64() == 0.0 => return Err(ArithmeticError::DivisionByZero),
            ('/', lhs, rhs) => Num::Float(lhs.as_f64() / rhs.as_f64()),
            ('+', Num::Int(a), Num::Int(b)) => widen(a.checked_add(b), a as f64 + b as f64),
            ('-', Num::Int(a), Num::Int(b)) => widen(a.checked_sub(b), a as f64 - b as f64),
            ('*', Num::Int(a), Num::Int(b)) => widen(a.checked_mul(b), a as f64 * b as f64),
            ('+', a, b) => Num::Float(a.as_f64() + b.as_f64()),
            ('-', a, b) => Num::Float(a.as_f64() - b.as_f64()),
            ('*', a, b) => Num::Float(a.as_f64() * b.as_f64()),
            (other, _, _) => return Err(ArithmeticError::UnexpectedChar(other, 0)),
        };
        out.checked()
    }
}

fn widen(exact: Option<i64>, approx: f64) -> Num {
    exact.map(Num::Int).unwrap_or(Num::Float(approx))
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::Int(i) => write!(f, "{}", i),
            Num::Float(x) if x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{:.1}", x),
            Num::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<Num> for Value {
    fn from(n: Num) -> Self {
        match n {
            Num::Int(i) => Value::Number(i.into()),
            Num::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn peek_op(&mut self, ops: &[char]) -> Option<char> {
        self.skip_ws();
        match self.chars.peek() {
            Some(&(_, c)) if ops.contains(&c) => {
                self.chars.next();
                Some(c)
            }
            _ => None,
        }
    }

    fn expr(&mut self) -> Result<Num, ArithmeticError> {
        let mut acc = self.term()?;
        while let Some(op) = self.peek_op(&['+', '-']) {
            let rhs = self.term()?;
            acc = acc.apply(op, rhs)?;
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Num, ArithmeticError> {
        let mut acc = self.int()?;
        while let Some(op) = self.peek_op(&['*', '/']) {
            let rhs = self.int()?;
            acc = acc.apply(op, rhs)?;
        }
        Ok(acc)
    }

    fn int(&mut self) -> Result<Num, ArithmeticError> {
        self.skip_ws();
        let mut digits = String::new();
        while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_ascii_digit()) {
            digits.push(c);
        }
        if digits.is_empty() {
            return match self.chars.peek() {
                Some(&(at, c)) => Err(ArithmeticError::UnexpectedChar(c, at)),
                None => Err(ArithmeticError::UnexpectedEnd),
            };
        }
        match digits.parse::<i64>() {
            Ok(i) => Ok(Num::Int(i)),
            Err(_) => digits
                .parse::<f64>()
                .map(Num::Float)
                .map_err(|_| ArithmeticError::NonFinite)?
                .checked(),
        }
    }

    fn finish(&mut self) -> Result<(), ArithmeticError> {
        self.skip_ws();
        match self.chars.peek() {
            Some(&(at, c)) => Err(ArithmeticError::UnexpectedChar(c, at)),
            None => Ok(()),
        }
    }
}

/// Evaluate an expression of integers joined by `+ - * /`.
pub fn evaluate(src: &str) -> Result<Num, ArithmeticError> {
    let mut parser = Parser::new(src);
    let value = parser.expr()?;
    parser.finish()?;
    Ok(value)
}
