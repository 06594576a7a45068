//! Export readiness: the flag, repair before the writer, and header resolution.

use pretty_assertions::assert_eq;

use tabforge_chat::checklist::Checklist;
use tabforge_chat::turn::run_turn;
use tabforge_spec::export::prepare_for_export;
use tabforge_spec::key::Mode;
use tabforge_spec::ops::{empty_song, ensure_musical_completeness};
use tabforge_spec::song::{MeasureHeader, TimeSignature, Track};
use tabforge_spec::validation::{parse_song_json, validate_song};
use tabforge_tests::fixtures::SAMPLE_SONG_JSON;

#[test]
fn generate_gp5_sets_flag_and_export_repairs_empty_song() {
    let outcome = run_turn(&empty_song(), "generate the gp5 file", None).unwrap();
    assert!(outcome.song.ready_for_export);
    assert!(outcome.song.tracks.is_empty());
    assert!(!Checklist::evaluate(&outcome.song).is_complete());

    let document = prepare_for_export(outcome.song).unwrap();
    let song = &document.song;
    assert_eq!(song.tracks.len(), 1);
    assert_eq!(song.tracks[0].measures.len(), 1);
    assert_eq!(song.beat_count(), 1);
    assert!(validate_song(song).is_ok());
    assert!(song.ready_for_export);
}

#[test]
fn export_does_not_require_the_flag() {
    let song = empty_song();
    assert!(!song.ready_for_export);
    let document = prepare_for_export(song).unwrap();
    assert!(!document.song.ready_for_export);
    assert_eq!(document.headers.len(), 1);
}

#[test]
fn invalid_song_is_not_exported() {
    let mut song = empty_song();
    song.metadata.tempo = 400;
    let err = prepare_for_export(song).unwrap_err();
    assert_eq!(err.paths(), vec!["metadata.tempo"]);
}

#[test]
fn empty_tuning_is_rejected_before_repair() {
    let json = r#"{"metadata": {"title": "x"}, "tracks": [{"id": "g", "name": "G", "tuning": []}]}"#;
    let err = parse_song_json(json).unwrap_err();
    assert_eq!(err.paths(), vec!["tracks[0].tuning"]);

    // Built in code, the same track never reaches the writer either.
    let mut song = empty_song();
    song.tracks.push(Track::guitar("g", "G"));
    song.tracks[0].string_count = None;
    song.tracks[0].tuning = Some(Vec::new());
    let err = prepare_for_export(song).unwrap_err();
    assert_eq!(err.paths(), vec!["tracks[0].tuning"]);
}

#[test]
fn headers_resolve_per_measure() {
    let mut song = parse_song_json(SAMPLE_SONG_JSON).unwrap().song;
    // The bass also carries a header at measure 1.
    song.tracks[1].measures[1].header = Some(MeasureHeader {
        time_signature: Some(TimeSignature::new(3, 4)),
        ..MeasureHeader::default()
    });

    let document = prepare_for_export(song).unwrap();
    assert_eq!(document.headers.len(), 2);
    assert!(document.headers[0].repeat_start);
    assert_eq!(document.headers[0].marker.as_deref(), Some("Intro"));
    // The first track has a header at measure 1, so it wins.
    assert!(document.headers[1].repeat_end);
    assert_eq!(document.headers[1].time_signature, TimeSignature::new(4, 4));

    let key = document.key.unwrap();
    assert_eq!(key.tonic, "A");
    assert_eq!(key.mode, Mode::Minor);
}

#[test]
fn composed_draft_exports_with_content_everywhere() {
    let song = ensure_musical_completeness(empty_song());
    let document = prepare_for_export(song).unwrap();
    assert_eq!(document.song.tracks.len(), 3);
    assert_eq!(document.headers.len(), 4);
    assert!(document
        .song
        .tracks
        .iter()
        .all(|t| t.measures.iter().all(|m| !m.beats.is_empty())));
}
