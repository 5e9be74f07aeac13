//! Parser for literal data structures as models tend to write them.
//!
//! Accepts lists `[..]`, tuples `(..)` (read as lists), mappings `{..}`,
//! single- or double-quoted strings, integers, floats, and the constants
//! `True`/`False`/`None` (plus their JSON spellings). Trailing commas are
//! allowed. Anything else is an error: there are no names, calls or
//! operators.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LiteralError {
    #[error("unexpected character {0:?} at offset {1}")]
    Unexpected(char, usize),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("invalid escape at offset {0}")]
    InvalidEscape(usize),
    #[error("trailing input at offset {0}")]
    Trailing(usize),
}

type Result<T> = std::result::Result<T, LiteralError>;

/// Parse `src` as a single literal, rejecting trailing content.
pub fn parse_literal(src: &str) -> Result<Value> {
    let mut parser = Parser { src, pos: 0 };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < src.len() {
        return Err(LiteralError::Trailing(parser.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<()> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(LiteralError::Unexpected(c, self.pos - c.len_utf8())),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    /// Consume `close` (after optional whitespace) if it is next.
    fn eat_close(&mut self, close: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(close) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_ws();
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('[') => self.sequence('[', ']'),
            Some('(') => self.sequence('(', ')'),
            Some('{') => self.mapping(),
            Some(q @ ('\'' | '"')) => self.string(q).map(Value::String),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_alphabetic() => self.constant(),
            Some(c) => Err(LiteralError::Unexpected(c, self.pos)),
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            if self.eat_close(close) {
                break;
            }
            items.push(self.value()?);
            if self.eat_close(close) {
                break;
            }
            self.expect(',')?;
        }
        Ok(Value::Array(items))
    }

    fn mapping(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            if self.eat_close('}') {
                break;
            }
            let key = match self.value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => "null".to_string(),
                _ => return Err(LiteralError::Unexpected('{', self.pos)),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);
            if self.eat_close('}') {
                break;
            }
            self.expect(',')?;
        }
        Ok(Value::Object(map))
    }

    fn string(&mut self, quote: char) -> Result<String> {
        self.bump();
        let mut out = String::new();
        loop {
            let at = self.pos;
            match self.bump() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(LiteralError::UnexpectedEnd),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('"') => out.push('"'),
                    Some('\n') => {}
                    Some('x') => out.push(self.hex_escape(2, at)?),
                    Some('u') => out.push(self.hex_escape(4, at)?),
                    // Unknown escapes such as `\f` in LaTeX-ish output stay verbatim.
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn hex_escape(&mut self, len: usize, at: usize) -> Result<char> {
        let end = self.pos + len;
        let digits = self.src.get(self.pos..end).ok_or(LiteralError::InvalidEscape(at))?;
        let code = u32::from_str_radix(digits, 16).map_err(|_| LiteralError::InvalidEscape(at))?;
        self.pos = end;
        char::from_u32(code).ok_or(LiteralError::InvalidEscape(at))
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_'))
        {
            let c = self.bump();
            if matches!(c, Some('e' | 'E')) && matches!(self.peek(), Some('-' | '+')) {
                self.bump();
            }
        }
        let text = &self.src[start..self.pos];
        let clean = text.trim_start_matches('+').replace('_', "");
        if let Ok(i) = clean.parse::<i64>() {
            return Ok(Value::Number(i.into()));
        }
        clean
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| LiteralError::InvalidNumber(text.to_string()))
    }

    fn constant(&mut self) -> Result<Value> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => Err(LiteralError::Unexpected(
                self.src[start..].chars().next().unwrap_or(' '),
                start,
            )),
        }
    }
}
