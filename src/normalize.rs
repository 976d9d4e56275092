//! Response normalizer — raw model text to a schema-valid JSON object.
//!
//! DESIGN
//! ======
//! Models wrap JSON in fences, prepend chatter, leave raw newlines inside
//! strings and add trailing commas. Recovery is a ladder of pure stages
//! tried in order, stopping at the first that parses:
//!
//! 1. strip one leading and one trailing code fence
//! 2. lenient parse (control characters inside strings escaped)
//! 3. largest balanced `{...}` substring, lenient parse
//! 4. repair of that substring, strict parse
//!
//! The parsed value is then reduced to an object (first element of an
//! array) and validated against the request's schema. The normalizer never
//! invents fields: a missing or mistyped field is a `SchemaInvalid` failure
//! for the caller's fallback policy to handle.

use std::fmt::Write;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::feature::FeatureKind;
use crate::llm::types::{FailureKind, FailureRecord, preview};
use crate::schema::ResultSchema;

/// Characters of raw text kept in an `Unparseable` detail.
const UNPARSEABLE_PREVIEW_CHARS: usize = 200;

/// A JSON object satisfying its feature's schema. Serializes as the bare
/// object.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    pub feature: FeatureKind,
    pub value: Map<String, Value>,
}

impl Serialize for NormalizedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// Normalize raw model output against `schema`.
///
/// # Errors
///
/// `Unparseable` when no stage yields JSON, `SchemaInvalid` when the JSON
/// is not an object (or is an empty array) or violates the schema.
pub fn normalize(raw: &str, schema: &ResultSchema) -> Result<NormalizedResult, FailureRecord> {
    let parsed = parse_ladder(raw).ok_or_else(|| {
        FailureRecord::new(
            FailureKind::Unparseable,
            format!("no JSON object in response: {}", preview(raw, UNPARSEABLE_PREVIEW_CHARS)),
        )
    })?;
    let value = into_object(parsed)?;
    schema
        .validate(&value)
        .map_err(|violation| FailureRecord::new(FailureKind::SchemaInvalid, violation.to_string()))?;
    Ok(NormalizedResult { feature: schema.feature, value })
}

/// Render a result as fenced, pretty-printed JSON.
#[must_use]
pub fn normalize_to_text(result: &NormalizedResult) -> String {
    let mut out = String::from("```json\n");
    let _ = writeln!(out, "{:#}", Value::Object(result.value.clone()));
    out.push_str("```");
    out
}

// =============================================================================
// LADDER
// =============================================================================

pub(crate) fn parse_ladder(raw: &str) -> Option<Value> {
    let body = strip_code_fence(raw);
    if let Some(value) = lenient_parse(body) {
        return Some(value);
    }
    let candidate = largest_balanced_object(body)?;
    lenient_parse(candidate).or_else(|| serde_json::from_str(&repair(candidate)).ok())
}

fn into_object(value: Value) -> Result<Map<String, Value>, FailureRecord> {
    let value = match value {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| FailureRecord::new(FailureKind::SchemaInvalid, "empty array"))?,
        other => other,
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(FailureRecord::new(
            FailureKind::SchemaInvalid,
            format!("expected a JSON object, found {}", kind_name(&other)),
        )),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// STAGES
// =============================================================================

/// Drop one leading fence line (```` ``` ```` with an optional language
/// tag) and one trailing fence. Text without a leading fence is returned
/// trimmed.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match after_open.find('\n') {
        Some(idx) => &after_open[idx + 1..],
        None => after_open,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Strict parse after escaping raw control characters inside strings.
pub(crate) fn lenient_parse(text: &str) -> Option<Value> {
    serde_json::from_str(&escape_controls_in_strings(text)).ok()
}

fn escape_controls_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' => {
                    in_string = false;
                    out.push(ch);
                }
                c if (c as u32) < 0x20 => push_escaped_control(&mut out, c),
                c => out.push(c),
            }
        } else {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
        }
    }
    out
}

fn push_escaped_control(out: &mut String, ch: char) {
    match ch {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c => {
            let _ = write!(out, "\\u{:04x}", c as u32);
        }
    }
}

/// The longest balanced `{...}` substring, skipping braces inside string
/// literals.
pub(crate) fn largest_balanced_object(text: &str) -> Option<&str> {
    let mut best: Option<&str> = None;
    let mut idx = 0;
    while let Some(offset) = text[idx..].find('{') {
        let start = idx + offset;
        match balanced_end(text, start) {
            Some(end) => {
                let candidate = &text[start..end];
                if best.is_none_or(|b| candidate.len() > b.len()) {
                    best = Some(candidate);
                }
                idx = end;
            }
            None => idx = start + 1,
        }
    }
    best
}

/// Byte offset just past the bracket closing the one at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Best-effort repair of near-JSON: raw newlines inside strings escaped,
/// raw newlines between tokens turned into spaces, quotes that do not end
/// a string escaped, and trailing commas removed.
pub(crate) fn repair(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' if closes_string(&chars[i + 1..]) => {
                    in_string = false;
                    out.push(ch);
                }
                '"' => out.push_str("\\\""),
                c if (c as u32) < 0x20 => push_escaped_control(&mut out, c),
                c => out.push(c),
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '\n' | '\r' => out.push(' '),
            ',' if next_significant(&chars[i + 1..]).is_some_and(|c| c == '}' || c == ']') => {}
            c => out.push(c),
        }
    }
    out
}

/// A quote ends its string when the next significant character is one that
/// can follow a string value or key.
fn closes_string(rest: &[char]) -> bool {
    next_significant(rest).is_none_or(|c| matches!(c, ',' | '}' | ']' | ':'))
}

fn next_significant(rest: &[char]) -> Option<char> {
    rest.iter().copied().find(|c| !c.is_whitespace())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
