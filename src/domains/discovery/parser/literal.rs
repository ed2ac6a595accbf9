//! Read-only reader for JavaScript/TypeScript object and array literals.
//!
//! Converts the literal subset (strings, numbers, booleans, `null`, objects,
//! arrays) into `serde_json::Value`. Anything else (identifiers, calls,
//! spreads, arrow functions) is skipped and treated as absent, so a single
//! odd field never invalidates the surrounding descriptor.

use serde_json::{Map, Number, Value};

pub(crate) struct LiteralReader<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> LiteralReader<'a> {
    pub fn new(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b), _) if b.is_ascii_whitespace() => self.pos += 1,
                (Some(b'/'), Some(b'/')) => {
                    while let Some(b) = self.peek() {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    self.pos += 2;
                    while self.pos < self.bytes.len() {
                        if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Parse the array literal starting at the current `[`.
    ///
    /// Returns `None` when the array is never closed.
    pub fn parse_array(&mut self) -> Option<Vec<Value>> {
        if !self.eat(b'[') {
            return None;
        }

        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek()? {
                b']' => {
                    self.pos += 1;
                    return Some(items);
                }
                b'}' | b')' => return None,
                b',' => {
                    self.pos += 1;
                }
                _ => {
                    if let Some(value) = self.parse_value() {
                        items.push(value);
                    }
                    self.skip_trivia();
                    if !matches!(self.peek()?, b',' | b']') {
                        self.skip_expression();
                    }
                }
            }
        }
    }

    fn parse_object(&mut self) -> Option<Map<String, Value>> {
        if !self.eat(b'{') {
            return None;
        }

        let mut map = Map::new();
        loop {
            self.skip_trivia();
            match self.peek()? {
                b'}' => {
                    self.pos += 1;
                    return Some(map);
                }
                b']' | b')' => return None,
                b',' => {
                    self.pos += 1;
                    continue;
                }
                b'.' => {
                    // `...spread`
                    self.skip_expression();
                    continue;
                }
                _ => {}
            }

            let Some(key) = self.parse_key() else {
                self.skip_expression();
                if self.peek().is_none() {
                    return None;
                }
                continue;
            };

            self.skip_trivia();
            match self.peek()? {
                b':' => {
                    self.pos += 1;
                    self.skip_trivia();
                    if let Some(value) = self.parse_value() {
                        map.insert(key, value);
                    }
                    self.skip_trivia();
                    if !matches!(self.peek()?, b',' | b'}') {
                        self.skip_expression();
                    }
                }
                // Shorthand property: `{ name }`
                b',' | b'}' => {}
                // Method shorthand or anything else we cannot read.
                _ => self.skip_expression(),
            }
        }
    }

    fn parse_key(&mut self) -> Option<String> {
        match self.peek()? {
            b'\'' | b'"' | b'`' => self.parse_string(),
            b'[' => None,
            _ => {
                let ident = self.read_word();
                (!ident.is_empty()).then(|| ident.to_string())
            }
        }
    }

    fn read_word(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }

    /// Parse a literal value; non-literal expressions are skipped and yield `None`.
    fn parse_value(&mut self) -> Option<Value> {
        self.skip_trivia();
        match self.peek()? {
            b'{' => {
                let start = self.pos;
                match self.parse_object() {
                    Some(map) => Some(Value::Object(map)),
                    None => {
                        self.pos = start;
                        self.skip_expression();
                        None
                    }
                }
            }
            b'[' => {
                let start = self.pos;
                match self.parse_array() {
                    Some(items) => Some(Value::Array(items)),
                    None => {
                        self.pos = start;
                        self.skip_expression();
                        None
                    }
                }
            }
            b'\'' | b'"' | b'`' => self.parse_string_value(),
            b'-' | b'+' | b'.' | b'0'..=b'9' => self.parse_number(),
            _ => {
                let start = self.pos;
                let word = self.read_word();
                let literal = match word {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    "null" | "undefined" => Some(Value::Null),
                    _ => None,
                };
                self.skip_trivia();
                let ends_here = matches!(self.peek(), Some(b',' | b'}' | b']') | None);
                match literal {
                    Some(value) if ends_here => Some(value),
                    _ => {
                        self.pos = start;
                        self.skip_expression();
                        None
                    }
                }
            }
        }
    }

    /// A string literal, possibly concatenated with `+`.
    fn parse_string_value(&mut self) -> Option<Value> {
        let start = self.pos;
        let mut out = self.parse_string()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            if self.peek() != Some(b'+') {
                self.pos = save;
                break;
            }
            self.pos += 1;
            self.skip_trivia();
            match self.peek() {
                Some(b'\'' | b'"' | b'`') => out.push_str(&self.parse_string()?),
                _ => {
                    self.pos = start;
                    self.skip_expression();
                    return None;
                }
            }
        }
        Some(Value::String(out))
    }

    fn parse_string(&mut self) -> Option<String> {
        let quote = self.peek()?;
        self.pos += 1;

        let mut out = String::new();
        let mut chars = self.src[self.pos..].char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                c if c as u32 == u32::from(quote) => {
                    self.pos += offset + 1;
                    return Some(out);
                }
                '\\' => {
                    let (_, escaped) = chars.next()?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        '0' => out.push('\0'),
                        'u' => {
                            let hex: String = chars.by_ref().take(4).map(|(_, h)| h).collect();
                            if let Some(ch) =
                                u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
                            {
                                out.push(ch);
                            }
                        }
                        // Line continuation.
                        '\n' => {}
                        other => out.push(other),
                    }
                }
                '\n' if quote != b'`' => return None,
                c => out.push(c),
            }
        }
        None
    }

    fn parse_number(&mut self) -> Option<Value> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'+' | b'_') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw = self.src[start..self.pos].replace('_', "");
        let raw = raw.trim_start_matches('+');

        let number = raw
            .parse::<i64>()
            .ok()
            .map(Number::from)
            .or_else(|| raw.parse::<f64>().ok().and_then(Number::from_f64));

        match number {
            Some(n) => Some(Value::Number(n)),
            None => {
                self.pos = start;
                self.skip_expression();
                None
            }
        }
    }

    /// Advance to the next top-level `,` or the closing bracket of the
    /// enclosing literal, without consuming it.
    fn skip_expression(&mut self) {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'\'' | b'"' | b'`' => {
                    let quote_at = self.pos;
                    if self.parse_string().is_none() {
                        // Unterminated string; step past the quote only.
                        self.pos = quote_at + 1;
                    }
                    continue;
                }
                b'/' if matches!(self.peek_at(1), Some(b'/' | b'*')) => {
                    self.skip_trivia();
                    continue;
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                b',' if depth == 0 => return,
                _ => {}
            }
            self.pos += 1;
        }
    }
}
