use super::*;
use crate::feature::{
    BackingTrackParams, ImprovParams, LyricsParams, MelodyParams, PracticeAdviceParams, SongArrangementParams,
};
use crate::schema::schema_for;

#[test]
fn every_default_satisfies_its_schema() {
    let requests = [
        GenerationRequest::RhythmPattern(RhythmParams::default()),
        GenerationRequest::RhythmPattern(RhythmParams { time_signature: "6/8".into(), level: "beginner".into() }),
        GenerationRequest::RhythmPattern(RhythmParams { time_signature: "odd".into(), level: "beginner".into() }),
        GenerationRequest::Melody(MelodyParams::default()),
        GenerationRequest::ImprovTips(ImprovParams::default()),
        GenerationRequest::Lyrics(LyricsParams::default()),
        GenerationRequest::PracticeAdvice(PracticeAdviceParams::default()),
        GenerationRequest::Lesson(LessonParams::default()),
    ];
    for request in &requests {
        let result = fallback_for(request).unwrap();
        assert_eq!(result.feature, request.kind());
        schema_for(request)
            .validate(&result.value)
            .unwrap_or_else(|v| panic!("{} default invalid: {v}", request.kind()));
    }
}

#[test]
fn song_and_backing_track_have_no_default() {
    assert!(fallback_for(&GenerationRequest::SongArrangement(SongArrangementParams::new("x"))).is_none());
    assert!(fallback_for(&GenerationRequest::BackingTrack(BackingTrackParams::default())).is_none());
}

#[test]
fn lesson_default_names_the_request() {
    let request = GenerationRequest::Lesson(LessonParams {
        skill_level: "beginner".into(),
        instrument: "ukulele".into(),
        focus: "strumming PATTERNS".into(),
    });
    let result = fallback_for(&request).unwrap();
    let lesson = result.value["lesson"].as_str().unwrap();
    assert!(lesson.starts_with("# Strumming Patterns Lesson (Beginner)\n\n**Instrument**: Ukulele"));
    assert!(lesson.contains("4. Record & review"));
}

#[test]
fn rhythm_default_follows_time_signature() {
    let request = GenerationRequest::RhythmPattern(RhythmParams { time_signature: "3/4".into(), level: "x".into() });
    let result = fallback_for(&request).unwrap();
    assert_eq!(result.value["timeSignature"], "3/4");
    assert_eq!(result.value["pattern"].as_array().unwrap().len(), 3);
    assert_eq!(result.value["grid"], "x---x---x---");
}

#[test]
fn title_case_matches_word_capitalization() {
    assert_eq!(title_case("chord transitions"), "Chord Transitions");
    assert_eq!(title_case("  INTERMEDIATE "), "Intermediate");
    assert_eq!(title_case(""), "");
}

#[test]
fn melody_default_names_the_key_its_notes_are_in() {
    let request = GenerationRequest::Melody(MelodyParams { key: "F#".into(), style: "jazz".into() });
    let result = fallback_for(&request).unwrap();
    assert_eq!(result.value["key"], "C");
    assert_eq!(result.value["notes"][0], "C4");
}
