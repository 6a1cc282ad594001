//! Call-site literal detection for caller documents.
//!
//! Finds `callee("literal")` / `callee<T>('literal')` patterns and resolves
//! which literal, and for dotted keys which segment, sits under a cursor.

use regex::Regex;

const IDENTIFIER_BODY: &str = r"[A-Za-z_][A-Za-z0-9_]*";
const DOTTED_KEY_BODY: &str = r"[A-Za-z0-9_.-]+";

/// Alphabet accepted inside the quoted literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// A single identifier, e.g. a command name
    Identifier,
    /// Dot-separated key, e.g. a translation key
    DottedKey,
}

impl LiteralKind {
    fn body(self) -> &'static str {
        match self {
            LiteralKind::Identifier => IDENTIFIER_BODY,
            LiteralKind::DottedKey => DOTTED_KEY_BODY,
        }
    }
}

/// A string literal argument found at a call site.
///
/// `start..end` is the byte span of the literal's inner text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralMatch {
    pub callee: String,
    pub literal: String,
    pub start: usize,
    pub end: usize,
}

/// Cursor selection inside a dotted literal.
///
/// `scoped_key` joins the segments up to and including the selected one;
/// `start..end` is the byte span of the selected segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationKeySelection {
    pub full_key: String,
    pub segments: Vec<String>,
    pub segment_index: usize,
    pub scoped_key: String,
    pub start: usize,
    pub end: usize,
}

impl TranslationKeySelection {
    /// The segment under the cursor; `None` if `segment_index` is out of range
    pub fn selected_segment(&self) -> Option<&str> {
        self.segments.get(self.segment_index).map(String::as_str)
    }

    /// Whether the selection is the last segment of the literal
    pub fn is_leaf(&self) -> bool {
        self.segment_index + 1 == self.segments.len()
    }
}

/// Segment of a dotted key containing an offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHit {
    pub segments: Vec<String>,
    pub segment_index: usize,
    pub start: usize,
    pub end: usize,
}

/// One compiled regex for a set of recognized callee names.
#[derive(Debug, Clone)]
pub struct CallSitePattern {
    regex: Regex,
}

impl CallSitePattern {
    /// Compile a pattern for `callees`; `None` when no usable name remains.
    pub fn new(callees: &[String], kind: LiteralKind) -> Option<Self> {
        let escaped: Vec<String> = callees
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(regex::escape)
            .collect();

        if escaped.is_empty() {
            return None;
        }

        let body = kind.body();
        let pattern = format!(
            r#"\b(?P<callee>{})(?:\s*<[^>\n]+>)?\s*\(\s*(?:'(?P<single>{body})'|"(?P<double>{body})"|`(?P<tick>{body})`)"#,
            escaped.join("|")
        );

        match Regex::new(&pattern) {
            Ok(regex) => Some(Self { regex }),
            Err(e) => {
                tracing::warn!("failed to compile call-site pattern: {e}");
                None
            }
        }
    }

    pub fn invoke(callees: &[String]) -> Option<Self> {
        Self::new(callees, LiteralKind::Identifier)
    }

    pub fn translation(callees: &[String]) -> Option<Self> {
        Self::new(callees, LiteralKind::DottedKey)
    }

    /// Every literal match in document order
    pub fn literals<'t>(&'t self, text: &'t str) -> impl Iterator<Item = LiteralMatch> + 't {
        self.regex.captures_iter(text).filter_map(|caps| {
            let callee = caps.name("callee")?;
            let literal = caps
                .name("single")
                .or_else(|| caps.name("double"))
                .or_else(|| caps.name("tick"))?;

            Some(LiteralMatch {
                callee: callee.as_str().to_string(),
                literal: literal.as_str().to_string(),
                start: literal.start(),
                end: literal.end(),
            })
        })
    }

    /// First literal whose inner span contains `offset` (both ends inclusive)
    pub fn find_literal_at(&self, text: &str, offset: usize) -> Option<LiteralMatch> {
        self.literals(text)
            .find(|literal| offset >= literal.start && offset <= literal.end)
    }

    /// Resolve the dotted-key segment under `offset`.
    ///
    /// Literals with empty segments are skipped, so a later call site may
    /// still match.
    pub fn find_translation_key_at(
        &self,
        text: &str,
        offset: usize,
    ) -> Option<TranslationKeySelection> {
        self.literals(text)
            .filter(|literal| offset >= literal.start && offset <= literal.end)
            .find_map(|literal| {
                let hit = resolve_segment_at_offset(&literal.literal, offset - literal.start)?;
                let scoped_key = hit.segments[..=hit.segment_index].join(".");

                Some(TranslationKeySelection {
                    full_key: literal.literal,
                    segments: hit.segments,
                    segment_index: hit.segment_index,
                    scoped_key,
                    start: literal.start + hit.start,
                    end: literal.start + hit.end,
                })
            })
    }
}

/// Find which segment of `key` contains `raw_offset` (relative to the key).
///
/// The offset clamps into the key; an offset on a dot belongs to the
/// segment before it. Keys with leading, trailing or doubled dots yield `None`.
pub fn resolve_segment_at_offset(key: &str, raw_offset: usize) -> Option<SegmentHit> {
    if key.is_empty() {
        return None;
    }

    let segments: Vec<String> = key.split('.').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }

    let bytes = key.as_bytes();
    let mut offset = raw_offset.min(key.len() - 1);
    while offset > 0 && bytes[offset] == b'.' {
        offset -= 1;
    }
    if bytes[offset] == b'.' {
        return None;
    }

    let mut cursor = 0;
    for (segment_index, segment) in segments.iter().enumerate() {
        let start = cursor;
        let end = start + segment.len();
        if offset >= start && offset <= end {
            return Some(SegmentHit {
                segments,
                segment_index,
                start,
                end,
            });
        }
        cursor = end + 1;
    }

    None
}
