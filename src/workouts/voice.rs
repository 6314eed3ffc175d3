//! Voice instruction extraction.
//!
//! Narration is tagged inline with markers such as `**[VOICE]**: "text"`.
//! Markers are recognized anywhere in a line. Array-valued markers hold a
//! bracketed list of double-quoted strings that may span several lines:
//!
//! ```text
//! **[VOICE_MOTIVATION]**: [
//!   "That's it!",
//!   "Keep that rhythm going!",
//! ]
//! ```
//!
//! [`scan_voice`] walks a block of lines and returns one [`VoiceEntry`] per
//! marker. Multi-line values are read by sub-scanners that report how many
//! lines they consumed, so the main scan simply skips past them.

use crate::workouts::types::DecodeError;

/// Substituted when a motivation array is malformed or empty.
pub const DEFAULT_MOTIVATION: &str = "Keep going! You're doing great!";

/// Substituted when a phase-end array is malformed.
pub const DEFAULT_PHASE_END: &str = "Excellent work completing your workout!";

const MARKER_OPEN: &str = "**[";
const MARKER_CLOSE: &str = "]**";

/// Narration slot a marker fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceTag {
    /// `VOICE`
    Main,
    /// `VOICE_START`
    Start,
    /// `VOICE_FORM`
    Form,
    /// `VOICE_COUNT`
    Count,
    /// `VOICE_MOTIVATION`
    Motivation,
    /// `VOICE_END`
    End,
}

impl VoiceTag {
    /// Map a marker name to its tag.
    pub fn from_marker(name: &str) -> Option<Self> {
        match name {
            "VOICE" => Some(VoiceTag::Main),
            "VOICE_START" => Some(VoiceTag::Start),
            "VOICE_FORM" => Some(VoiceTag::Form),
            "VOICE_COUNT" => Some(VoiceTag::Count),
            "VOICE_MOTIVATION" => Some(VoiceTag::Motivation),
            "VOICE_END" => Some(VoiceTag::End),
            _ => None,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            VoiceTag::Main => "VOICE",
            VoiceTag::Start => "VOICE_START",
            VoiceTag::Form => "VOICE_FORM",
            VoiceTag::Count => "VOICE_COUNT",
            VoiceTag::Motivation => "VOICE_MOTIVATION",
            VoiceTag::End => "VOICE_END",
        }
    }
}

/// Decoded marker value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceValue {
    Text(String),
    List(Vec<String>),
}

impl VoiceValue {
    /// The text, or the first entry of a list.
    pub fn first(&self) -> Option<&str> {
        match self {
            VoiceValue::Text(text) => Some(text),
            VoiceValue::List(items) => items.first().map(String::as_str),
        }
    }

    /// The value as a pool of messages.
    pub fn into_list(self) -> Vec<String> {
        match self {
            VoiceValue::Text(text) => vec![text],
            VoiceValue::List(items) => items,
        }
    }
}

/// One marker found in a block.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceEntry {
    pub tag: VoiceTag,
    /// Index of the marker line within the scanned block
    pub line: usize,
    /// Lines spanned by the value, marker line included
    pub span: usize,
    pub value: Result<VoiceValue, DecodeError>,
}

impl VoiceEntry {
    /// True when the value was written in bracketed array notation.
    pub fn is_bracketed(&self) -> bool {
        matches!(self.value, Ok(VoiceValue::List(_)) | Err(_))
    }
}

/// A marker's position inside a single line.
struct Marker<'a> {
    start: usize,
    name: &'a str,
    value_start: usize,
}

/// Scan a block of lines for voice markers, in document order.
///
/// Unknown marker names are skipped.
pub fn scan_voice(lines: &[&str]) -> Vec<VoiceEntry> {
    let mut entries = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        let markers = find_markers(line);
        let mut advance = 1;

        for (n, marker) in markers.iter().enumerate() {
            let is_last = n + 1 == markers.len();
            let value_end = markers.get(n + 1).map(|m| m.start).unwrap_or(line.len());
            let rest = line[marker.value_start..value_end].trim();

            let Some(tag) = VoiceTag::from_marker(marker.name) else {
                tracing::debug!("Ignoring unknown voice marker '{}'", marker.name);
                continue;
            };

            let scanned = if is_last {
                scan_value(tag, lines, idx, rest)
            } else {
                scan_inline_value(tag, rest)
            };

            if let Some((value, span)) = scanned {
                if is_last {
                    advance = span.max(1);
                }
                entries.push(VoiceEntry {
                    tag,
                    line: idx,
                    span,
                    value,
                });
            }
        }

        idx += advance;
    }

    entries
}

/// Locate every `**[NAME]**:` marker in a line.
fn find_markers(line: &str) -> Vec<Marker<'_>> {
    let mut markers = Vec::new();
    let mut from = 0;

    while let Some(offset) = line[from..].find(MARKER_OPEN) {
        let start = from + offset;
        let name_start = start + MARKER_OPEN.len();

        let Some(close) = line[name_start..].find(MARKER_CLOSE) else {
            break;
        };
        let name_end = name_start + close;
        let after_close = name_end + MARKER_CLOSE.len();
        let tail = &line[after_close..];
        let trimmed = tail.trim_start();

        if let Some(after_colon) = trimmed.strip_prefix(':') {
            markers.push(Marker {
                start,
                name: line[name_start..name_end].trim(),
                value_start: line.len() - after_colon.len(),
            });
            from = line.len() - after_colon.len();
        } else {
            from = name_start;
        }
    }

    markers
}

/// Read the value of the last marker on a line, following it onto later
/// lines when it is an open array or an unterminated quoted string.
fn scan_value(
    tag: VoiceTag,
    lines: &[&str],
    idx: usize,
    rest: &str,
) -> Option<(Result<VoiceValue, DecodeError>, usize)> {
    if rest.starts_with('[') {
        return Some(scan_array(tag, lines, idx, rest));
    }

    if rest.starts_with('"') {
        return Some(scan_quoted(lines, idx, rest));
    }

    if rest.is_empty() {
        // Array opened on the following line
        let next = lines.get(idx + 1)?.trim();
        if next.starts_with('[') {
            let (value, span) = scan_array(tag, lines, idx + 1, next);
            return Some((value, span + 1));
        }
        return None;
    }

    Some((Ok(VoiceValue::Text(rest.to_string())), 1))
}

/// Value of a marker followed by another marker on the same line.
fn scan_inline_value(
    tag: VoiceTag,
    rest: &str,
) -> Option<(Result<VoiceValue, DecodeError>, usize)> {
    if rest.is_empty() {
        return None;
    }
    if rest.starts_with('[') {
        return Some((decode_array(tag, rest), 1));
    }
    let text = match rest.strip_prefix('"') {
        Some(body) => match find_closing_quote(body) {
            Some(end) => unescape(&body[..end]),
            None => body.to_string(),
        },
        None => rest.to_string(),
    };
    Some((Ok(VoiceValue::Text(text)), 1))
}

/// Accumulate lines until the bracket opened in `rest` closes, then decode.
///
/// Accumulation stops early at a heading line so an unterminated array
/// cannot swallow the following block.
fn scan_array(
    tag: VoiceTag,
    lines: &[&str],
    idx: usize,
    rest: &str,
) -> (Result<VoiceValue, DecodeError>, usize) {
    let mut text = rest.to_string();
    let mut next = idx + 1;

    while !brackets_closed(&text) && next < lines.len() {
        let line = lines[next].trim();
        if line.starts_with('#') {
            break;
        }
        text.push('\n');
        text.push_str(line);
        next += 1;
    }

    (decode_array(tag, &text), next - idx)
}

/// Read a quoted scalar, joining continuation lines with a single space.
fn scan_quoted(
    lines: &[&str],
    idx: usize,
    rest: &str,
) -> (Result<VoiceValue, DecodeError>, usize) {
    let body = &rest[1..];
    if let Some(end) = find_closing_quote(body) {
        return (Ok(VoiceValue::Text(unescape(&body[..end]))), 1);
    }

    let mut parts = vec![body.trim().to_string()];
    for (offset, line) in lines.iter().enumerate().skip(idx + 1) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            break;
        }
        if let Some(end) = find_closing_quote(line) {
            parts.push(line[..end].trim().to_string());
            let text = parts
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| unescape(p))
                .collect::<Vec<_>>()
                .join(" ");
            return (Ok(VoiceValue::Text(text)), offset - idx + 1);
        }
        parts.push(line.to_string());
    }

    // Unterminated: keep what the marker line holds
    (Ok(VoiceValue::Text(unescape(body.trim()))), 1)
}

/// Byte index of the first unescaped `"`.
fn find_closing_quote(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(idx),
            _ => {}
        }
    }
    None
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

/// True once the first `[` has a matching `]` outside string literals.
fn brackets_closed(text: &str) -> bool {
    let mut depth = 0usize;
    let mut opened = false;
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => {
                depth += 1;
                opened = true;
            }
            ']' => {
                depth = depth.saturating_sub(1);
                if opened && depth == 0 {
                    return true;
                }
            }
            _ => {}
        }
    }

    false
}

/// Decode a bracketed list of double-quoted strings.
///
/// Trailing commas are accepted and a raw newline inside a string becomes a
/// single space.
pub fn decode_array(tag: VoiceTag, text: &str) -> Result<VoiceValue, DecodeError> {
    let normalized = normalize_array(text.trim());
    serde_json::from_str::<Vec<String>>(&normalized)
        .map(VoiceValue::List)
        .map_err(|e| DecodeError::VoiceArray {
            tag: tag.marker().to_string(),
            reason: e.to_string(),
        })
}

/// Fold line breaks inside string literals and drop commas that directly
/// precede a closing bracket, leaving plain JSON.
fn normalize_array(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if in_string {
            match ch {
                _ if escaped => {
                    escaped = false;
                    result.push(ch);
                }
                '\\' => {
                    escaped = true;
                    result.push(ch);
                }
                '"' => {
                    in_string = false;
                    result.push(ch);
                }
                '\n' | '\r' => {
                    while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                        chars.next();
                    }
                    if !result.ends_with(' ') {
                        result.push(' ');
                    }
                }
                '\t' => result.push(' '),
                _ => result.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                result.push(ch);
            }
            ',' => {
                let rest = chars.clone().find(|c| !c.is_whitespace());
                if rest != Some(']') {
                    result.push(ch);
                }
            }
            _ => result.push(ch),
        }
    }

    result
}
