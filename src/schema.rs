//! Result schemas — the declared shape of every feature's output.
//!
//! DESIGN
//! ======
//! A schema is plain data: typed fields with required flags plus a short
//! list of cross-field constraints. The same value renders the field list
//! embedded in prompts and validates parsed provider output. Schemas are
//! built per request so values the caller pinned (the requested instrument
//! or time signature) become single-value enums.
//!
//! Validation never coerces: `"3"` is not an integer and a missing field is
//! not defaulted. Unknown extra fields are allowed and kept.

use std::fmt::{self, Write};

use serde_json::{Map, Value};

use crate::feature::{FeatureKind, GenerationRequest};

/// Marker for a muted string in a chord diagram.
pub const MUTED_FRET: &str = "X";

pub const BACKING_TRACK_INSTRUMENTS: &[&str] = &["drums", "bass", "keys", "guitar", "synth"];
pub const RHYTHM_VOICES: &[&str] = &["kick", "snare", "hihat", "tom", "cymbal", "rest"];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    /// A string restricted to the listed values.
    Enum(Vec<String>),
    Array(Box<FieldType>),
    Object(Vec<Field>),
    /// Any one of the alternatives.
    OneOf(Vec<FieldType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

/// Checks spanning more than one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Every chord diagram lists one fret and one finger per string of the
    /// arrangement's tuning.
    DiagramsMatchTuning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSchema {
    pub feature: FeatureKind,
    pub fields: Vec<Field>,
    pub constraints: Vec<Constraint>,
}

/// First violation found, with a dotted/indexed path such as
/// `chordDiagrams[0].frets[2]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {message}")]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

fn req(name: &'static str, ty: FieldType) -> Field {
    Field { name, ty, required: true }
}

fn opt(name: &'static str, ty: FieldType) -> Field {
    Field { name, ty, required: false }
}

fn array(ty: FieldType) -> FieldType {
    FieldType::Array(Box::new(ty))
}

fn strings() -> FieldType {
    array(FieldType::String)
}

fn one_of_values(values: &[&str]) -> FieldType {
    FieldType::Enum(values.iter().map(|v| (*v).to_string()).collect())
}

/// Build the result schema for a request.
#[must_use]
pub fn schema_for(request: &GenerationRequest) -> ResultSchema {
    use FieldType::{Boolean, Integer, Null, Number, Object, OneOf, String};

    let feature = request.kind();
    let mut constraints = Vec::new();
    let fields = match request {
        GenerationRequest::SongArrangement(p) => {
            constraints.push(Constraint::DiagramsMatchTuning);
            vec![
                req("songTitle", String),
                req("artist", String),
                req("key", String),
                req("instrument", one_of_values(&[p.instrument.as_str()])),
                req("tuning", String),
                req("capoFret", Integer),
                req("progressionSummary", strings()),
                req(
                    "tablature",
                    array(Object(vec![
                        req("section", String),
                        req("lines", array(Object(vec![req("lyrics", String), req("isChordLine", Boolean)]))),
                    ])),
                ),
                req(
                    "chordDiagrams",
                    array(Object(vec![
                        req("chord", String),
                        req("frets", array(OneOf(vec![Integer, one_of_values(&[MUTED_FRET])]))),
                        req("fingers", array(OneOf(vec![Integer, Null]))),
                        opt("capoFret", Integer),
                    ])),
                ),
                req(
                    "substitutions",
                    array(Object(vec![
                        req("originalChord", String),
                        req("substitutedChord", String),
                        req("theory", String),
                    ])),
                ),
                req("practiceTips", strings()),
            ]
        }
        GenerationRequest::BackingTrack(_) => vec![
            req("title", String),
            req("style", String),
            req("bpm", Integer),
            req("key", String),
            req(
                "tracks",
                array(Object(vec![
                    req("instrument", one_of_values(BACKING_TRACK_INSTRUMENTS)),
                    req(
                        "steps",
                        array(Object(vec![req("beat", Integer), req("notes", strings()), opt("duration", Number)])),
                    ),
                ])),
            ),
            opt("youtubeQueries", strings()),
            opt("description", String),
        ],
        GenerationRequest::RhythmPattern(p) => vec![
            req("name", String),
            req("timeSignature", one_of_values(&[p.time_signature.as_str()])),
            req("description", String),
            req(
                "pattern",
                array(Object(vec![
                    req("beat", Integer),
                    req("voice", one_of_values(RHYTHM_VOICES)),
                    opt("accent", Boolean),
                ])),
            ),
            opt("grid", String),
        ],
        GenerationRequest::Melody(_) => vec![
            req("scale", String),
            req("key", String),
            req("notes", strings()),
            req("intervals", strings()),
            req("suggestion", String),
        ],
        GenerationRequest::ImprovTips(_) => vec![
            req("style", String),
            req("recommendedScales", strings()),
            req("tips", strings()),
            opt("backingTrackSearch", String),
        ],
        GenerationRequest::Lyrics(_) => vec![opt("title", String), req("structure", strings()), req("lyrics", String)],
        GenerationRequest::PracticeAdvice(_) => {
            vec![req("insight", String), req("recommendation", String), req("focusArea", String)]
        }
        GenerationRequest::Lesson(_) => {
            vec![req("title", String), req("lesson", String), req("duration", String), req("goals", strings())]
        }
    };
    ResultSchema { feature, fields, constraints }
}

// =============================================================================
// VALIDATION
// =============================================================================

impl ResultSchema {
    /// Validate a parsed mapping. Reports the first violation.
    ///
    /// # Errors
    ///
    /// Returns the offending path and what was expected there.
    pub fn validate(&self, value: &Map<String, Value>) -> Result<(), SchemaViolation> {
        validate_fields(&self.fields, value, "")?;
        for constraint in &self.constraints {
            check_constraint(*constraint, value)?;
        }
        Ok(())
    }

    /// Human-readable field list for prompts, one line per field.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        describe_fields(&self.fields, 0, &mut out);
        out
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() { name.to_string() } else { format!("{parent}.{name}") }
}

fn violation(path: &str, message: impl Into<String>) -> SchemaViolation {
    let path = if path.is_empty() { "$".to_string() } else { path.to_string() };
    SchemaViolation { path, message: message.into() }
}

fn validate_fields(fields: &[Field], object: &Map<String, Value>, parent: &str) -> Result<(), SchemaViolation> {
    for field in fields {
        let path = join_path(parent, field.name);
        match object.get(field.name) {
            Some(value) => validate_value(&field.ty, value, &path)?,
            None if field.required => return Err(violation(&path, "missing required field")),
            None => {}
        }
    }
    Ok(())
}

fn validate_value(ty: &FieldType, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    match (ty, value) {
        (FieldType::String, Value::String(_))
        | (FieldType::Boolean, Value::Bool(_))
        | (FieldType::Null, Value::Null) => Ok(()),
        (FieldType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
        (FieldType::Number, Value::Number(_)) => Ok(()),
        (FieldType::Enum(allowed), Value::String(s)) => {
            if allowed.iter().any(|a| a == s) {
                Ok(())
            } else {
                Err(violation(path, format!("expected one of {}, found {s:?}", quoted_list(allowed))))
            }
        }
        (FieldType::Array(item), Value::Array(items)) => {
            for (i, v) in items.iter().enumerate() {
                validate_value(item, v, &format!("{path}[{i}]"))?;
            }
            Ok(())
        }
        (FieldType::Object(fields), Value::Object(map)) => validate_fields(fields, map, path),
        (FieldType::OneOf(alternatives), v) => {
            if alternatives
                .iter()
                .any(|alt| validate_value(alt, v, path).is_ok())
            {
                Ok(())
            } else {
                Err(violation(path, format!("expected {ty}, found {}", value_kind(v))))
            }
        }
        (expected, found) => Err(violation(path, format!("expected {expected}, found {}", value_kind(found)))),
    }
}

fn check_constraint(constraint: Constraint, object: &Map<String, Value>) -> Result<(), SchemaViolation> {
    match constraint {
        Constraint::DiagramsMatchTuning => {
            let Some(tuning) = object.get("tuning").and_then(Value::as_str) else {
                return Ok(());
            };
            let strings = string_count(tuning);
            if strings == 0 {
                return Ok(());
            }
            let diagrams = object
                .get("chordDiagrams")
                .and_then(Value::as_array)
                .map_or(&[][..], Vec::as_slice);
            for (i, diagram) in diagrams.iter().enumerate() {
                for key in ["frets", "fingers"] {
                    let len = diagram
                        .get(key)
                        .and_then(Value::as_array)
                        .map_or(0, Vec::len);
                    if len != strings {
                        return Err(violation(
                            &format!("chordDiagrams[{i}].{key}"),
                            format!("expected {strings} entries to match tuning {tuning:?}, found {len}"),
                        ));
                    }
                }
            }
            Ok(())
        }
    }
}

/// Number of strings implied by a tuning. Only note tokens count: a label
/// such as `"Drop D (D A D G B E)"` or `"Open G: D G D G B D"` is read from
/// the parenthesized or post-colon part, and within it `"E A D G B E"`,
/// `"EADGBE"` and `"Eb Ab Db Gb Bb Eb"` all count six.
#[must_use]
pub fn string_count(tuning: &str) -> usize {
    let notes = match (tuning.rfind('('), tuning.rfind(')')) {
        (Some(open), Some(close)) if open < close => &tuning[open + 1..close],
        _ => tuning.rsplit(':').next().unwrap_or(tuning),
    };
    notes
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '-' | '/'))
        .filter(|token| !token.is_empty() && token.chars().all(is_note_char))
        .map(|token| token.chars().filter(|c| matches!(c, 'A'..='G')).count())
        .sum()
}

fn is_note_char(c: char) -> bool {
    matches!(c, 'A'..='G' | 'b' | '#' | '\u{266d}' | '\u{266f}' | '0'..='9')
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn quoted_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("{v:?}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

// =============================================================================
// DESCRIPTION
// =============================================================================

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Number => f.write_str("number"),
            Self::Boolean => f.write_str("boolean"),
            Self::Null => f.write_str("null"),
            Self::Enum(values) => write!(f, "one of {}", quoted_list(values)),
            Self::Array(item) => write!(f, "array of {item}"),
            Self::Object(_) => f.write_str("object"),
            Self::OneOf(alternatives) => {
                let parts: Vec<String> = alternatives.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(" or "))
            }
        }
    }
}

fn describe_fields(fields: &[Field], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for field in fields {
        let flag = if field.required { "required" } else { "optional" };
        let _ = writeln!(out, "{indent}- {}: {} ({flag})", field.name, field.ty);
        match &field.ty {
            FieldType::Object(children) => describe_fields(children, depth + 1, out),
            FieldType::Array(item) => {
                if let FieldType::Object(children) = item.as_ref() {
                    describe_fields(children, depth + 1, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
