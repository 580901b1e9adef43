//! Literal evaluator — turns one bracketed expression into a [`Value`].
//!
//! Evaluation runs in three stages and never fails:
//!
//! 1. strict decode with the small literal grammar below; a top-level string
//!    result is offered to [`ident::parse_identifier`],
//! 2. a parenthesised value with no comma in it is treated as a bare
//!    identifier token: the parentheses are stripped and the rest normalised,
//! 3. otherwise the raw text is kept as [`Value::Opaque`].
//!
//! The grammar covers the literal syntax services interpolate into log lines:
//! integers (decimal, `0x`, `0o`, `0b`, `_` separators), floats, `True`,
//! `False`, `None`, quoted strings (single, double, triple, `r`/`u` prefixes,
//! adjacent-literal concatenation), lists, tuples, sets and dicts. Nothing is
//! ever executed; names, calls and operators are rejected.

use std::collections::BTreeMap;

use crate::parser::ident;
use crate::types::Value;

/// Deepest container nesting the decoder will follow.
const MAX_DEPTH: usize = 64;

/// Evaluate one raw expression. Total: unreadable input becomes
/// [`Value::Opaque`].
pub fn evaluate(raw: &str) -> Value {
    match decode(raw) {
        Ok(Value::Str(s)) => match ident::parse_identifier(&s) {
            Some(id) => Value::Identifier(id),
            None => Value::Str(s),
        },
        Ok(value) => value,
        Err(_) if looks_like_wrapped_token(raw) => {
            let inner: String = raw.chars().filter(|c| !matches!(c, '(' | ')')).collect();
            ident::normalize(&inner)
        }
        Err(_) => Value::Opaque(raw.to_string()),
    }
}

fn looks_like_wrapped_token(raw: &str) -> bool {
    raw.starts_with('(') && raw.ends_with(')') && !raw.contains(',')
}

/// Why strict decoding rejected an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    UnexpectedEnd,
    Unexpected { pos: usize, found: char },
    InvalidNumber(String),
    InvalidEscape { pos: usize },
    UnhashableKey,
    TooDeep,
}

/// Strict decode of `src` as a single literal, surrounding whitespace allowed.
pub fn decode(src: &str) -> Result<Value, DecodeError> {
    let mut decoder = Decoder { src, pos: 0, depth: 0 };
    decoder.skip_ws();
    let value = decoder.value()?;
    decoder.skip_ws();
    match decoder.peek() {
        None => Ok(value),
        Some(found) => Err(DecodeError::Unexpected {
            pos: decoder.pos,
            found,
        }),
    }
}

struct Decoder<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), DecodeError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(found) => Err(DecodeError::Unexpected {
                pos: self.pos - found.len_utf8(),
                found,
            }),
            None => Err(DecodeError::UnexpectedEnd),
        }
    }

    fn unexpected(&self) -> DecodeError {
        match self.peek() {
            Some(found) => DecodeError::Unexpected {
                pos: self.pos,
                found,
            },
            None => DecodeError::UnexpectedEnd,
        }
    }

    fn value(&mut self) -> Result<Value, DecodeError> {
        match self.peek() {
            None => Err(DecodeError::UnexpectedEnd),
            Some('(') => self.nested(Self::tuple_or_group),
            Some('[') => self.nested(Self::list),
            Some('{') => self.nested(Self::dict_or_set),
            Some('+') | Some('-') => self.signed_number(),
            Some(c) if c.is_ascii_digit() => self.number(false),
            Some('.') if matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit()) => {
                self.number(false)
            }
            Some(_) if self.at_string_start() => self.strings(),
            Some(c) if c.is_alphabetic() || c == '_' => self.keyword(),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, DecodeError>,
    ) -> Result<Value, DecodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(DecodeError::TooDeep);
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    // ── Containers ──────────────────────────────────────────────

    /// Comma-separated values up to `close`, trailing comma allowed.
    fn items(&mut self, close: char) -> Result<Vec<Value>, DecodeError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(c) if c == close => {}
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn list(&mut self) -> Result<Value, DecodeError> {
        self.expect('[')?;
        Ok(Value::Seq(self.items(']')?))
    }

    fn tuple_or_group(&mut self) -> Result<Value, DecodeError> {
        self.expect('(')?;
        self.skip_ws();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(Value::Seq(Vec::new()));
        }
        let first = self.value()?;
        self.skip_ws();
        match self.bump() {
            Some(')') => Ok(first),
            Some(',') => {
                let mut items = vec![first];
                items.extend(self.items(')')?);
                Ok(Value::Seq(items))
            }
            Some(found) => Err(DecodeError::Unexpected {
                pos: self.pos - found.len_utf8(),
                found,
            }),
            None => Err(DecodeError::UnexpectedEnd),
        }
    }

    fn dict_or_set(&mut self) -> Result<Value, DecodeError> {
        self.expect('{')?;
        self.skip_ws();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Value::Map(BTreeMap::new()));
        }
        let first = self.value()?;
        self.skip_ws();
        if self.peek() == Some(':') {
            self.bump();
            return self.dict_from(first);
        }

        // `{{...}}` is a doubled-brace template escape; a set cannot hold a dict.
        if let Value::Map(_) = first {
            self.skip_ws();
            self.expect('}')?;
            return Ok(first);
        }

        let mut items = vec![hashable(first)?];
        match self.bump() {
            Some('}') => return Ok(Value::Seq(items)),
            Some(',') => {}
            Some(found) => {
                return Err(DecodeError::Unexpected {
                    pos: self.pos - found.len_utf8(),
                    found,
                })
            }
            None => return Err(DecodeError::UnexpectedEnd),
        }
        for item in self.items('}')? {
            let item = hashable(item)?;
            if !items.contains(&item) {
                items.push(item);
            }
        }
        Ok(Value::Seq(items))
    }

    fn dict_from(&mut self, first_key: Value) -> Result<Value, DecodeError> {
        let mut map = BTreeMap::new();
        let mut key = first_key;
        loop {
            self.skip_ws();
            let value = self.value()?;
            map.insert(key_string(key)?, value);
            self.skip_ws();
            match self.bump() {
                Some('}') => return Ok(Value::Map(map)),
                Some(',') => {}
                Some(found) => {
                    return Err(DecodeError::Unexpected {
                        pos: self.pos - found.len_utf8(),
                        found,
                    })
                }
                None => return Err(DecodeError::UnexpectedEnd),
            }
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Map(map));
            }
            key = self.value()?;
            self.skip_ws();
            self.expect(':')?;
        }
    }

    // ── Scalars ─────────────────────────────────────────────────

    fn keyword(&mut self) -> Result<Value, DecodeError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            _ => Err(DecodeError::Unexpected {
                pos: start,
                found: self.src[start..].chars().next().unwrap_or(' '),
            }),
        }
    }

    fn signed_number(&mut self) -> Result<Value, DecodeError> {
        let negative = self.bump() == Some('-');
        self.skip_ws();
        match self.peek() {
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(negative),
            _ => Err(self.unexpected()),
        }
    }

    fn number(&mut self, negative: bool) -> Result<Value, DecodeError> {
        let start = self.pos;
        let radix = match (self.peek(), self.peek_nth(1)) {
            (Some('0'), Some('x' | 'X')) => 16,
            (Some('0'), Some('o' | 'O')) => 8,
            (Some('0'), Some('b' | 'B')) => 2,
            _ => 10,
        };

        if radix != 10 {
            self.bump();
            self.bump();
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                self.bump();
            }
            let digits = strip_separators(&self.src[digits_start..self.pos], true)
                .ok_or_else(|| self.bad_number(start))?;
            let signed = if negative { format!("-{digits}") } else { digits };
            return i64::from_str_radix(&signed, radix)
                .map(Value::Int)
                .map_err(|_| self.bad_number(start));
        }

        let mut is_float = false;
        self.digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.digits();
        }
        if matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            return Err(self.bad_number(start));
        }

        let text = &self.src[start..self.pos];
        let cleaned = strip_separators(text, false).ok_or_else(|| self.bad_number(start))?;
        if is_float {
            let x: f64 = cleaned.parse().map_err(|_| self.bad_number(start))?;
            return Ok(Value::Float(if negative { -x } else { x }));
        }

        if cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.bytes().any(|b| b != b'0') {
            return Err(self.bad_number(start));
        }
        let signed = if negative {
            format!("-{cleaned}")
        } else {
            cleaned
        };
        signed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| self.bad_number(start))
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }

    fn bad_number(&self, start: usize) -> DecodeError {
        DecodeError::InvalidNumber(self.src[start..self.pos].to_string())
    }

    // ── Strings ─────────────────────────────────────────────────

    fn at_string_start(&self) -> bool {
        match (self.peek(), self.peek_nth(1)) {
            (Some('\'' | '"'), _) => true,
            (Some('r' | 'R' | 'u' | 'U'), Some('\'' | '"')) => true,
            _ => false,
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Value, DecodeError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            if self.at_string_start() {
                out.push_str(&self.string()?);
            } else {
                self.pos = save;
                return Ok(Value::Str(out));
            }
        }
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let mut raw = false;
        if let Some(prefix @ ('r' | 'R' | 'u' | 'U')) = self.peek() {
            raw = matches!(prefix, 'r' | 'R');
            self.bump();
        }
        let quote = self.bump().ok_or(DecodeError::UnexpectedEnd)?;
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut out = String::new();
        loop {
            let ch = self.bump().ok_or(DecodeError::UnexpectedEnd)?;
            if ch == quote {
                if !triple {
                    return Ok(out);
                }
                if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    return Ok(out);
                }
                out.push(ch);
            } else if ch == '\n' && !triple {
                return Err(DecodeError::Unexpected {
                    pos: self.pos - 1,
                    found: ch,
                });
            } else if ch == '\\' {
                if raw {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                } else {
                    self.escape(&mut out)?;
                }
            } else {
                out.push(ch);
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), DecodeError> {
        let pos = self.pos;
        let ch = self.bump().ok_or(DecodeError::UnexpectedEnd)?;
        match ch {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(ch),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0B}'),
            '0'..='7' => {
                let mut code = ch.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).ok_or(DecodeError::InvalidEscape { pos })?);
            }
            'x' => out.push(self.hex_escape(2, pos)?),
            'u' => out.push(self.hex_escape(4, pos)?),
            'U' => out.push(self.hex_escape(8, pos)?),
            'N' => return Err(DecodeError::InvalidEscape { pos }),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, len: usize, pos: usize) -> Result<char, DecodeError> {
        let start = self.pos;
        for _ in 0..len {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.bump();
                }
                _ => return Err(DecodeError::InvalidEscape { pos }),
            }
        }
        u32::from_str_radix(&self.src[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or(DecodeError::InvalidEscape { pos })
    }
}

/// Remove `_` digit separators. Separators may only sit between digits (or,
/// for prefixed literals, directly after the prefix).
fn strip_separators(text: &str, after_prefix: bool) -> Option<String> {
    if text.is_empty() || text.ends_with('_') || text.contains("__") {
        return None;
    }
    if text.starts_with('_') && !after_prefix {
        return None;
    }
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'_' && i > 0 && !bytes[i - 1].is_ascii_alphanumeric() {
            return None;
        }
    }
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Dict keys and set members must be scalars. Tuple keys are rejected along
/// with lists since both decode to [`Value::Seq`].
fn hashable(value: Value) -> Result<Value, DecodeError> {
    match value {
        Value::Map(_) | Value::Seq(_) => Err(DecodeError::UnhashableKey),
        _ => Ok(value),
    }
}

fn key_string(key: Value) -> Result<String, DecodeError> {
    match hashable(key)? {
        Value::Str(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}
