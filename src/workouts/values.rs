//! Scalar decoding shared by every block of a workout document.
//!
//! - [`coerce_value`] turns a raw token into a [`MetadataValue`]
//! - [`parse_clock`] decodes `M:SS` into seconds
//! - [`parse_time_range`] decodes `M:SS - M:SS` into a [`TimeRange`]
//! - [`parse_tempo`] decodes `E-B-C-T` into a [`TempoBreakdown`]

use crate::workouts::types::{DecodeError, MetadataValue, TempoBreakdown, TimeRange};

/// Coerce a raw metadata token.
///
/// Checked in order: quoted string, integer, decimal, the `continuous`
/// keyword, anything else. No range validation is performed.
pub fn coerce_value(raw: &str) -> MetadataValue {
    let token = raw.trim();

    if let Some(inner) = strip_quotes(token) {
        return MetadataValue::Text(inner.to_string());
    }

    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = token.parse::<i64>() {
            return MetadataValue::Integer(n);
        }
    }

    if is_decimal(token) {
        if let Ok(x) = token.parse::<f64>() {
            return MetadataValue::Float(x);
        }
    }

    // `continuous` stays the literal string, same as any other bare word.
    MetadataValue::Text(token.to_string())
}

/// Strip one pair of matching surrounding quotes.
fn strip_quotes(token: &str) -> Option<&str> {
    if token.len() < 2 {
        return None;
    }
    let first = token.chars().next()?;
    let last = token.chars().last()?;
    if (first == '"' || first == '\'') && (last == '"' || last == '\'') {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

/// Strip surrounding quotes from a token, if present.
pub fn unquote(token: &str) -> &str {
    let token = token.trim();
    strip_quotes(token).unwrap_or(token)
}

/// `\d*\.\d+`
fn is_decimal(token: &str) -> bool {
    match token.split_once('.') {
        Some((whole, fraction)) => {
            whole.bytes().all(|b| b.is_ascii_digit())
                && !fraction.is_empty()
                && fraction.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Remove a trailing ` # comment` from a metadata value.
///
/// A `#` only starts a comment outside quotes and after whitespace, so
/// `"Set #2"` and `abc#def` are kept intact.
pub fn strip_inline_comment(value: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut previous_blank = true;

    for (idx, ch) in value.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '#' && previous_blank && idx > 0 => return value[..idx].trim_end(),
            None => {}
        }
        previous_blank = ch.is_whitespace();
    }

    value.trim_end()
}

/// Split a `key: value` pair on the first colon, stripping any inline
/// comment from the value. Returns `None` when either side is empty.
pub fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    let value = strip_inline_comment(value.trim());
    if key.is_empty() || value.is_empty() {
        None
    } else {
        Some((key, value))
    }
}

/// Convert `snake_case`, `kebab-case` or spaced keys to camelCase.
pub fn camel_case(key: &str) -> String {
    let mut result = String::with_capacity(key.len());
    let mut upper_next = false;

    for ch in key.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if upper_next && !result.is_empty() {
                result.push(ch.to_ascii_uppercase());
            } else {
                result.push(ch);
            }
            upper_next = false;
        } else if !ch.is_alphanumeric() {
            upper_next = true;
        } else {
            result.push(ch);
            upper_next = false;
        }
    }

    result
}

/// Decode a `M:SS` clock reading into seconds.
///
/// Seconds default to `00` when omitted (`"5"` is five minutes).
pub fn parse_clock(text: &str) -> Result<u32, DecodeError> {
    let text = text.trim();
    let (minutes, seconds) = match text.split_once(':') {
        Some((m, s)) => (m.trim(), s.trim()),
        None => (text, "00"),
    };

    let minutes: u32 = minutes
        .parse()
        .map_err(|_| DecodeError::TimeRange(text.to_string()))?;
    let seconds: u32 = seconds
        .parse()
        .map_err(|_| DecodeError::TimeRange(text.to_string()))?;

    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(|| DecodeError::TimeRange(text.to_string()))
}

/// Decode a `M:SS - M:SS` range into whole seconds.
pub fn parse_time_range(text: &str) -> Result<TimeRange, DecodeError> {
    let text = text.trim();
    let (start, end) = text
        .split_once(" - ")
        .or_else(|| text.split_once('-'))
        .ok_or_else(|| DecodeError::TimeRange(text.to_string()))?;

    Ok(TimeRange {
        start: parse_clock(start)?,
        end: parse_clock(end)?,
    })
}

/// Decode `E-B-C-T` tempo notation.
///
/// Missing or non-numeric parts decode as `None` components; the returned
/// error describes the problem so the caller can log it.
pub fn parse_tempo(tempo: &str) -> (TempoBreakdown, Option<DecodeError>) {
    let parts: Vec<Option<u32>> = tempo.split('-').map(|p| p.trim().parse().ok()).collect();
    let part = |idx: usize| parts.get(idx).copied().flatten();

    let breakdown = TempoBreakdown {
        eccentric: part(0),
        bottom_hold: part(1),
        concentric: part(2),
        top_hold: part(3),
    };

    let error = if parts.len() != 4 || !breakdown.is_complete() {
        Some(DecodeError::Tempo(tempo.to_string()))
    } else {
        None
    };

    (breakdown, error)
}

/// Leading integer of a value such as `"5 minutes"`.
pub fn leading_integer(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
