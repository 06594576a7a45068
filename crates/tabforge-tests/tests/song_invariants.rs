//! Property-based tests for the song-model invariants.
//!
//! These tests check measure-count equalization, total defaulting and the
//! fretboard mapper over arbitrary inputs.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tabforge-tests --test song_invariants
//! ```

use proptest::prelude::*;
use serde_json::json;

use tabforge_spec::fretboard::{locate, pitch_at, Placement};
use tabforge_spec::ops::{add_track, equalize_measure_counts, ensure_minimum_song};
use tabforge_spec::song::{Track, STANDARD_BASS_TUNING, STANDARD_GUITAR_TUNING};
use tabforge_spec::validation::{parse_song_json, parse_song_value, validate_song};
use tabforge_tests::fixtures::song_with_measure_counts;

fn measure_counts() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..12, 0..6)
}

// ============================================================================
// 1. Equalize Measure Counts
// ============================================================================

proptest! {
    /// Equalizing twice gives the same song as equalizing once.
    #[test]
    fn equalize_is_idempotent(counts in measure_counts()) {
        let once = equalize_measure_counts(song_with_measure_counts(&counts));
        let twice = equalize_measure_counts(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// After equalizing, every track has the maximum count and sequential indices.
    #[test]
    fn equalize_establishes_cross_track_invariant(counts in measure_counts()) {
        let max = counts.iter().copied().max().unwrap_or(0);
        let song = equalize_measure_counts(song_with_measure_counts(&counts));
        for track in &song.tracks {
            prop_assert_eq!(track.measures.len(), max);
            for (i, measure) in track.measures.iter().enumerate() {
                prop_assert_eq!(measure.index as usize, i);
            }
        }
        prop_assert!(song.has_equal_measure_counts());
    }

    /// Add Track keeps the invariant whatever the new track's length.
    #[test]
    fn add_track_preserves_invariant(counts in measure_counts(), extra in 0usize..15) {
        let song = equalize_measure_counts(song_with_measure_counts(&counts));
        let mut track = Track::bass("new-bass", "New Bass");
        track.measures = song_with_measure_counts(&[extra]).tracks.remove(0).measures;
        let song = add_track(song, track);
        prop_assert!(song.has_equal_measure_counts());
        prop_assert_eq!(song.max_measure_count(), counts.iter().copied().max().unwrap_or(0).max(extra));
    }

    /// Ensure Minimum Song always yields a valid song with a beat in every track.
    #[test]
    fn ensure_minimum_always_valid(counts in measure_counts()) {
        let song = ensure_minimum_song(song_with_measure_counts(&counts));
        prop_assert!(!song.tracks.is_empty());
        prop_assert!(song.tracks.iter().all(|t| t.has_beats()));
        prop_assert!(validate_song(&song).is_ok());
    }
}

// ============================================================================
// 2. Total Defaulting
// ============================================================================

proptest! {
    /// Any in-range tempo with any title parses and fills every default.
    #[test]
    fn metadata_only_documents_default(tempo in 30u64..=300, title in "[a-zA-Z0-9 ]{0,40}") {
        let parsed = parse_song_value(&json!({"metadata": {"title": title, "tempo": tempo}}));
        prop_assert!(parsed.is_ok());
        let song = parsed.unwrap().song;
        prop_assert_eq!(u64::from(song.metadata.tempo), tempo);
        prop_assert_eq!(song.metadata.key_signature.as_str(), "C");
        prop_assert_eq!(song.metadata.time_signature.beats, 4);
        prop_assert_eq!(song.metadata.version.as_str(), "5.00");
        prop_assert!(!song.ready_for_export);
    }

    /// Out-of-range tempos are rejected at metadata.tempo, never clamped.
    #[test]
    fn out_of_range_tempo_rejected(tempo in prop_oneof![0u64..30, 301u64..100_000]) {
        let err = parse_song_value(&json!({"metadata": {"title": "", "tempo": tempo}})).unwrap_err();
        prop_assert_eq!(err.paths(), vec!["metadata.tempo"]);
    }

    /// The validator never panics on arbitrary text.
    #[test]
    fn validator_never_panics(text in "\\PC{0,200}") {
        let _ = parse_song_json(&text);
    }
}

// ============================================================================
// 3. Fretboard Mapper
// ============================================================================

proptest! {
    /// Mapped placements sound the original pitch; unmapped ones use the fallback.
    #[test]
    fn mapped_positions_round_trip(pitch in 0u8..=127) {
        for tuning in [&STANDARD_GUITAR_TUNING[..], &STANDARD_BASS_TUNING[..]] {
            match locate(pitch, tuning) {
                Placement::Mapped(pos) => {
                    prop_assert_eq!(pitch_at(pos, tuning), Some(pitch));
                    prop_assert!(pos.fret <= 24);
                }
                Placement::Unmapped(pos) => {
                    prop_assert_eq!((pos.string, pos.fret), (1, 0));
                }
            }
        }
    }

    /// Mapping is deterministic.
    #[test]
    fn mapping_is_deterministic(pitch in 0u8..=127) {
        prop_assert_eq!(
            locate(pitch, &STANDARD_GUITAR_TUNING),
            locate(pitch, &STANDARD_GUITAR_TUNING)
        );
    }
}
