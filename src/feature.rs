//! Feature requests — the tagged union over supported content types.
//!
//! Parameter structs double as HTTP request bodies, so their serde
//! attributes carry the wire names and the defaults clients rely on when
//! they omit a field.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// FEATURE KIND
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    SongArrangement,
    BackingTrack,
    RhythmPattern,
    Melody,
    ImprovTips,
    Lyrics,
    PracticeAdvice,
    Lesson,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 8] = [
        Self::SongArrangement,
        Self::BackingTrack,
        Self::RhythmPattern,
        Self::Melody,
        Self::ImprovTips,
        Self::Lyrics,
        Self::PracticeAdvice,
        Self::Lesson,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SongArrangement => "song_arrangement",
            Self::BackingTrack => "backing_track",
            Self::RhythmPattern => "rhythm_pattern",
            Self::Melody => "melody",
            Self::ImprovTips => "improv_tips",
            Self::Lyrics => "lyrics",
            Self::PracticeAdvice => "practice_advice",
            Self::Lesson => "lesson",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PARAMETERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Instrument {
    #[default]
    #[serde(alias = "guitar")]
    Guitar,
    #[serde(alias = "ukulele")]
    Ukulele,
    #[serde(alias = "piano")]
    Piano,
}

impl Instrument {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guitar => "Guitar",
            Self::Ukulele => "Ukulele",
            Self::Piano => "Piano",
        }
    }

    /// Standard tuning, low string first. Empty for unfretted instruments.
    #[must_use]
    pub fn standard_tuning(self) -> &'static str {
        match self {
            Self::Guitar => "E A D G B E",
            Self::Ukulele => "G C E A",
            Self::Piano => "",
        }
    }
}

/// Target key meaning "keep the recording's key".
pub const ORIGINAL_KEY: &str = "Original";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongArrangementParams {
    pub song_query: String,
    #[serde(default)]
    pub instrument: Instrument,
    #[serde(default = "default_true")]
    pub simplify: bool,
    #[serde(default = "default_true")]
    pub help_practice: bool,
    #[serde(default = "default_true")]
    pub show_substitutions: bool,
    #[serde(default = "default_target_key")]
    pub target_key: String,
}

impl SongArrangementParams {
    #[must_use]
    pub fn new(song_query: impl Into<String>) -> Self {
        Self {
            song_query: song_query.into(),
            instrument: Instrument::default(),
            simplify: true,
            help_practice: true,
            show_substitutions: true,
            target_key: default_target_key(),
        }
    }

    /// `Some(key)` when the caller asked for a transposition.
    #[must_use]
    pub fn transpose_to(&self) -> Option<&str> {
        let key = self.target_key.trim();
        (!key.is_empty() && !key.eq_ignore_ascii_case(ORIGINAL_KEY)).then_some(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackingTrackParams {
    pub prompt: String,
}

impl Default for BackingTrackParams {
    fn default() -> Self {
        Self { prompt: "Create a pop rock backing track in C major".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RhythmParams {
    pub time_signature: String,
    pub level: String,
}

impl Default for RhythmParams {
    fn default() -> Self {
        Self { time_signature: "4/4".into(), level: "intermediate".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodyParams {
    pub key: String,
    pub style: String,
}

impl Default for MelodyParams {
    fn default() -> Self {
        Self { key: "C".into(), style: "pop".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprovParams {
    pub query: String,
}

impl Default for ImprovParams {
    fn default() -> Self {
        Self { query: "blues".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsParams {
    pub topic: String,
    pub genre: String,
    pub mood: String,
}

impl Default for LyricsParams {
    fn default() -> Self {
        Self { topic: "love".into(), genre: "pop".into(), mood: "hopeful".into() }
    }
}

/// One practice-history record as the client stores it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeAdviceParams {
    pub sessions: Vec<PracticeSession>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonParams {
    #[serde(alias = "skillLevel")]
    pub skill_level: String,
    pub instrument: String,
    pub focus: String,
}

impl Default for LessonParams {
    fn default() -> Self {
        Self { skill_level: "intermediate".into(), instrument: "guitar".into(), focus: "chord transitions".into() }
    }
}

fn default_true() -> bool {
    true
}

fn default_target_key() -> String {
    ORIGINAL_KEY.to_string()
}

// =============================================================================
// REQUEST
// =============================================================================

/// A provider-agnostic generation request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    SongArrangement(SongArrangementParams),
    BackingTrack(BackingTrackParams),
    RhythmPattern(RhythmParams),
    Melody(MelodyParams),
    ImprovTips(ImprovParams),
    Lyrics(LyricsParams),
    PracticeAdvice(PracticeAdviceParams),
    Lesson(LessonParams),
}

impl GenerationRequest {
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::SongArrangement(_) => FeatureKind::SongArrangement,
            Self::BackingTrack(_) => FeatureKind::BackingTrack,
            Self::RhythmPattern(_) => FeatureKind::RhythmPattern,
            Self::Melody(_) => FeatureKind::Melody,
            Self::ImprovTips(_) => FeatureKind::ImprovTips,
            Self::Lyrics(_) => FeatureKind::Lyrics,
            Self::PracticeAdvice(_) => FeatureKind::PracticeAdvice,
            Self::Lesson(_) => FeatureKind::Lesson,
        }
    }
}

#[cfg(test)]
#[path = "feature_test.rs"]
mod tests;
