//! Static payloads served when every backend fails.
//!
//! Only the lighter features have a default. A made-up song arrangement or
//! backing track would mislead the player, so those propagate the failure.
//! Every default satisfies its feature's schema.

use serde_json::{Value, json};

use crate::feature::{GenerationRequest, LessonParams, RhythmParams};
use crate::normalize::NormalizedResult;

/// Default result for `request`, or `None` when the feature has none.
#[must_use]
pub fn fallback_for(request: &GenerationRequest) -> Option<NormalizedResult> {
    let value = match request {
        GenerationRequest::SongArrangement(_) | GenerationRequest::BackingTrack(_) => return None,
        GenerationRequest::RhythmPattern(p) => rhythm(p),
        GenerationRequest::Melody(_) => json!({
            "scale": "major",
            "key": "C",
            "notes": ["C4", "E4", "G4", "C5", "B4", "G4", "E4", "C4"],
            "intervals": ["M3", "m3", "P4", "m2", "M3", "m3", "M3"],
            "suggestion": "Simple motif in C major: climb the triad to the octave, then step back down. Transpose it to your key."
        }),
        GenerationRequest::ImprovTips(_) => json!({
            "style": "general",
            "recommendedScales": ["pentatonic"],
            "tips": ["Target chord tones on strong beats.", "Use bends to add expression."]
        }),
        GenerationRequest::Lyrics(_) => json!({
            "structure": ["Verse 1", "Chorus"],
            "lyrics": "[Verse 1]\nDefault lyrics generated...\n[Chorus]\nThis is a song..."
        }),
        GenerationRequest::PracticeAdvice(_) => json!({
            "insight": "Keep practicing daily!",
            "recommendation": "Increase the tempo a little each session and record yourself.",
            "focusArea": "consistency"
        }),
        GenerationRequest::Lesson(p) => lesson(p),
    };
    match value {
        Value::Object(value) => Some(NormalizedResult { feature: request.kind(), value }),
        _ => None,
    }
}

fn rhythm(p: &RhythmParams) -> Value {
    let beats = p
        .time_signature
        .split('/')
        .next()
        .and_then(|n| n.trim().parse::<usize>().ok())
        .filter(|n| (1..=16).contains(n))
        .unwrap_or(4);
    let pattern: Vec<Value> = (1..=beats)
        .map(|beat| {
            let voice = if beat % 2 == 1 { "kick" } else { "snare" };
            json!({ "beat": beat, "voice": voice, "accent": beat == 1 })
        })
        .collect();
    json!({
        "name": "Basic rock beat",
        "timeSignature": p.time_signature,
        "description": "Basic rock beat: kick on the odd beats, snare on the even beats.",
        "pattern": pattern,
        "grid": "x---".repeat(beats)
    })
}

fn lesson(p: &LessonParams) -> Value {
    let focus = title_case(&p.focus);
    let skill = title_case(&p.skill_level);
    let body = format!(
        "# {focus} Lesson ({skill})\n\n**Instrument**: {}\n\n\
         1. Warm-up (5 mins)\n2. Technique drills\n3. Apply to a real song\n4. Record & review",
        title_case(&p.instrument),
    );
    json!({
        "title": format!("{focus} Lesson"),
        "lesson": body,
        "duration": "30 minutes",
        "goals": [format!("Practice {} with a steady tempo", p.focus.trim()), "Apply it to a real song"]
    })
}

/// Capitalize each word, lowercasing the rest.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
#[path = "defaults_test.rs"]
mod tests;
