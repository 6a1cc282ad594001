//! Recursive-descent scanner recording the source offset of every object key.
//!
//! Standard JSON decoders discard positions, so this scanner walks the text
//! once with an explicit cursor. It records `dotted.path -> key offset` for
//! object keys (never array elements or scalars) and builds the decoded value
//! tree on the way, so callers can answer both "where" and "what" from one pass.

use regex::Regex;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{ScanError, ScanResult};

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:0|[1-9][0-9]*)(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?")
        .expect("number pattern is valid")
});

/// Byte span of a key's characters, excluding the surrounding quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpan {
    pub start: usize,
    pub end: usize,
}

/// Result of one scan: key offsets plus the decoded value tree.
///
/// Never cached; callers rescan the current text for every query.
#[derive(Debug, Clone, Default)]
pub struct KeyOffsetTable {
    spans: HashMap<String, KeySpan>,
    tree: Option<Value>,
}

impl KeyOffsetTable {
    pub fn contains(&self, path: &str) -> bool {
        self.spans.contains_key(path)
    }

    /// Offset of the first character of the key at `path`
    pub fn offset(&self, path: &str) -> Option<usize> {
        self.spans.get(path).map(|span| span.start)
    }

    pub fn span(&self, path: &str) -> Option<KeySpan> {
        self.spans.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn tree(&self) -> Option<&Value> {
        self.tree.as_ref()
    }

    /// Decoded value at a dotted path, walking objects only
    pub fn value_at(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(self.tree.as_ref()?, |current, segment| {
                current.as_object()?.get(segment)
            })
    }
}

/// Scan `text`, failing on any syntax error.
pub fn scan(text: &str) -> ScanResult<KeyOffsetTable> {
    KeyScanner::new(text).scan()
}

/// Scan `text`, treating malformed input as a file without keys.
pub fn scan_lenient(text: &str) -> KeyOffsetTable {
    match scan(text) {
        Ok(table) => table,
        Err(e) => {
            tracing::debug!("structured text scan failed: {e}");
            KeyOffsetTable::default()
        }
    }
}

/// Maximum nesting of objects and arrays, the same limit serde_json applies
pub const MAX_DEPTH: usize = 128;

struct KeyScanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    index: usize,
    depth: usize,
    spans: HashMap<String, KeySpan>,
}

impl<'a> KeyScanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            index: 0,
            depth: 0,
            spans: HashMap::new(),
        }
    }

    fn scan(mut self) -> ScanResult<KeyOffsetTable> {
        self.skip_whitespace();
        let tree = self.parse_value(&mut Vec::new())?;
        self.skip_whitespace();

        if self.index < self.bytes.len() {
            return Err(ScanError::TrailingContent { offset: self.index });
        }

        Ok(KeyOffsetTable {
            spans: self.spans,
            tree: Some(tree),
        })
    }

    fn parse_value(&mut self, path: &mut Vec<String>) -> ScanResult<Value> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(ScanError::UnexpectedEnd { offset: self.index }),
            Some(open @ (b'{' | b'[')) => {
                self.depth += 1;
                if self.depth >= MAX_DEPTH {
                    return Err(ScanError::TooDeep { offset: self.index });
                }
                let value = if open == b'{' {
                    self.parse_object(path)
                } else {
                    self.parse_array(path)
                };
                self.depth -= 1;
                value
            }
            Some(b'"') => self.parse_string().map(|(value, _)| Value::String(value)),
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(_) => self.parse_literal(),
        }
    }

    fn parse_object(&mut self, path: &mut Vec<String>) -> ScanResult<Value> {
        self.expect(b'{')?;
        self.skip_whitespace();

        let mut object = Map::new();
        if self.peek() == Some(b'}') {
            self.index += 1;
            return Ok(Value::Object(object));
        }

        loop {
            self.skip_whitespace();
            let (key, span) = self.parse_string()?;

            path.push(key);
            self.spans.insert(path.join("."), span);

            self.skip_whitespace();
            self.expect(b':')?;
            let value = self.parse_value(path)?;
            let key = path.pop().unwrap_or_default();
            object.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.index += 1,
                Some(b'}') => {
                    self.index += 1;
                    return Ok(Value::Object(object));
                }
                None => return Err(ScanError::UnexpectedEnd { offset: self.index }),
                Some(_) => {
                    return Err(ScanError::Expected {
                        expected: '}',
                        offset: self.index,
                    });
                }
            }
        }
    }

    fn parse_array(&mut self, path: &mut Vec<String>) -> ScanResult<Value> {
        self.expect(b'[')?;
        self.skip_whitespace();

        let mut items = Vec::new();
        if self.peek() == Some(b']') {
            self.index += 1;
            return Ok(Value::Array(items));
        }

        loop {
            // Elements share the array's path: indices never become keys
            items.push(self.parse_value(path)?);
            self.skip_whitespace();

            match self.peek() {
                Some(b',') => self.index += 1,
                Some(b']') => {
                    self.index += 1;
                    return Ok(Value::Array(items));
                }
                None => return Err(ScanError::UnexpectedEnd { offset: self.index }),
                Some(_) => {
                    return Err(ScanError::Expected {
                        expected: ']',
                        offset: self.index,
                    });
                }
            }
        }
    }

    /// Parse a string token, returning the decoded text and the raw span
    /// between the quotes.
    fn parse_string(&mut self) -> ScanResult<(String, KeySpan)> {
        let opening = self.index;
        self.expect(b'"')?;
        let start = self.index;

        while let Some(byte) = self.peek() {
            match byte {
                b'"' => {
                    let end = self.index;
                    self.index += 1;
                    let decoded = unescape(&self.source[start..end])
                        .ok_or(ScanError::InvalidEscape { offset: start })?;
                    return Ok((decoded, KeySpan { start, end }));
                }
                b'\\' => {
                    let escape_at = self.index;
                    self.index += 1;
                    match self.peek() {
                        None => return Err(ScanError::InvalidEscape { offset: escape_at }),
                        Some(b'u') => {
                            self.index += 1;
                            let hex = self.bytes.get(self.index..self.index + 4);
                            if !hex.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                                return Err(ScanError::InvalidUnicodeEscape { offset: escape_at });
                            }
                            self.index += 4;
                        }
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                            self.index += 1;
                        }
                        Some(_) => return Err(ScanError::InvalidEscape { offset: escape_at }),
                    }
                }
                _ => self.index += 1,
            }
        }

        Err(ScanError::UnterminatedString { offset: opening })
    }

    fn parse_number(&mut self) -> ScanResult<Value> {
        let invalid = ScanError::InvalidNumber { offset: self.index };
        let matched = NUMBER_PATTERN
            .find(&self.source[self.index..])
            .ok_or(invalid.clone())?;
        let number: Number = matched.as_str().parse().map_err(|_| invalid)?;

        self.index += matched.end();
        Ok(Value::Number(number))
    }

    fn parse_literal(&mut self) -> ScanResult<Value> {
        let rest = &self.source[self.index..];
        let (value, width) = if rest.starts_with("true") {
            (Value::Bool(true), 4)
        } else if rest.starts_with("false") {
            (Value::Bool(false), 5)
        } else if rest.starts_with("null") {
            (Value::Null, 4)
        } else {
            return Err(ScanError::InvalidValue { offset: self.index });
        };

        self.index += width;
        Ok(value)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.index += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> ScanResult<()> {
        match self.peek() {
            Some(byte) if byte == expected => {
                self.index += 1;
                Ok(())
            }
            None => Err(ScanError::UnexpectedEnd { offset: self.index }),
            Some(_) => Err(ScanError::Expected {
                expected: expected as char,
                offset: self.index,
            }),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.index).copied()
    }
}

/// Decode the raw body of a string token.
///
/// Escape validation already happened while scanning; codepoint decoding
/// (including surrogate pairs) is delegated to the JSON decoder.
fn unescape(raw: &str) -> Option<String> {
    if !raw.contains('\\') {
        return Some(raw.to_string());
    }
    serde_json::from_str(&format!("\"{raw}\"")).ok()
}
