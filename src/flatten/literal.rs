//! Mapping-string detection and parsing
//!
//! Some datasets store nested attributes as strings holding a serialized
//! mapping, either as JSON (`{"garage": false}`) or as a Python literal
//! (`{'garage': False}`). Parsing is two-stage: strict JSON first, then a
//! restricted literal grammar. Nothing is ever evaluated.

use crate::types::{JsonObject, JsonValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static MAPPING_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\{.*\}\s*$").expect("mapping shape regex is valid"));

/// Check whether a string is shaped like a serialized mapping
pub fn looks_like_mapping(s: &str) -> bool {
    MAPPING_SHAPE.is_match(s)
}

/// Parse a string holding a serialized mapping
///
/// Returns `None` when the string is not mapping-shaped, fails both parse
/// stages, or parses to something other than a mapping.
pub fn parse_mapping(s: &str) -> Option<JsonObject> {
    if !looks_like_mapping(s) {
        return None;
    }

    if let Ok(JsonValue::Object(map)) = serde_json::from_str::<JsonValue>(s) {
        return Some(map);
    }

    match LiteralParser::new(s).parse_document() {
        Some(JsonValue::Object(map)) => Some(map),
        _ => None,
    }
}

/// Replace a mapping-shaped string with the mapping it encodes
///
/// Any other value, including a malformed mapping string, is returned as is.
pub fn expand_value(value: &JsonValue) -> Cow<'_, JsonValue> {
    match value {
        JsonValue::String(s) => match parse_mapping(s) {
            Some(map) => Cow::Owned(JsonValue::Object(map)),
            None => Cow::Borrowed(value),
        },
        _ => Cow::Borrowed(value),
    }
}

// ============================================================================
// Restricted literal parser
// ============================================================================

/// Recursive-descent parser for dict/list/tuple/str/number/bool/None literals
struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Parse a single literal that must span the whole input
    fn parse_document(mut self) -> Option<JsonValue> {
        let value = self.parse_value()?;
        self.skip_whitespace();
        (self.pos == self.chars.len()).then_some(value)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Option<JsonValue> {
        self.skip_whitespace();
        match self.peek()? {
            '{' => self.parse_dict(),
            '[' => self.parse_sequence('[', ']'),
            '(' => self.parse_sequence('(', ')'),
            '\'' | '"' => self.parse_string(false).map(JsonValue::String),
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.parse_number(),
            c if c.is_ascii_alphabetic() => self.parse_word(),
            _ => None,
        }
    }

    fn parse_dict(&mut self) -> Option<JsonValue> {
        self.bump();
        let mut map = JsonObject::new();

        loop {
            self.skip_whitespace();
            if self.eat('}') {
                return Some(JsonValue::Object(map));
            }

            let key = match self.parse_value()? {
                JsonValue::String(s) => s,
                JsonValue::Number(n) => n.to_string(),
                JsonValue::Bool(b) => (if b { "True" } else { "False" }).to_string(),
                _ => return None,
            };

            self.skip_whitespace();
            if !self.eat(':') {
                return None;
            }
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            self.skip_whitespace();
            return self.eat('}').then_some(JsonValue::Object(map));
        }
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Option<JsonValue> {
        if !self.eat(open) {
            return None;
        }
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.eat(close) {
                return Some(JsonValue::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            self.skip_whitespace();
            return self.eat(close).then_some(JsonValue::Array(items));
        }
    }

    fn parse_string(&mut self, raw: bool) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();

        loop {
            let c = self.bump()?;
            if c == quote {
                return Some(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }

            let escaped = self.bump()?;
            if raw {
                out.push('\\');
                out.push(escaped);
                continue;
            }
            match escaped {
                '\\' | '\'' | '"' => out.push(escaped),
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                'x' => out.push(self.parse_hex_escape(2)?),
                'u' => out.push(self.parse_hex_escape(4)?),
                'U' => out.push(self.parse_hex_escape(8)?),
                // Unknown escapes keep their backslash
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn parse_hex_escape(&mut self, digits: usize) -> Option<char> {
        let end = self.pos.checked_add(digits)?;
        let hex: String = self.chars.get(self.pos..end)?.iter().collect();
        self.pos = end;
        u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
    }

    fn parse_number(&mut self) -> Option<JsonValue> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();

        if let Ok(i) = text.parse::<i64>() {
            return Some(JsonValue::from(i));
        }
        let f = text.parse::<f64>().ok()?;
        serde_json::Number::from_f64(f).map(JsonValue::Number)
    }

    fn parse_word(&mut self) -> Option<JsonValue> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        match word.as_str() {
            "True" => Some(JsonValue::Bool(true)),
            "False" => Some(JsonValue::Bool(false)),
            "None" => Some(JsonValue::Null),
            // String prefixes: u'..', b'..', r'..'
            "u" | "U" | "b" | "B" if matches!(self.peek(), Some('\'' | '"')) => {
                self.parse_string(false).map(JsonValue::String)
            }
            "r" | "R" if matches!(self.peek(), Some('\'' | '"')) => {
                self.parse_string(true).map(JsonValue::String)
            }
            _ => None,
        }
    }
}
