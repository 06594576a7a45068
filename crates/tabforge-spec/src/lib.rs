//! tabforge Song Model Library
//!
//! This crate provides the song document model, schema validation, fretboard
//! mapping and the pure operations that evolve a song from one turn to the
//! next.
//!
//! # Overview
//!
//! A song is a single owned JSON-shaped document:
//!
//! - **Metadata**: title, artist, tempo, key and time signature
//! - **Tracks**: instrument lines holding measures, beats and notes
//! - **Working state**: sections, chords by section, draft text and the
//!   advisory `readyForExport` flag
//!
//! Anything arriving from outside (files, agents, transcriptions) goes through
//! [`validation::parse_song_value`] before it is trusted.
//!
//! # Example
//!
//! ```
//! use tabforge_spec::ops::{add_track, empty_song, ensure_minimum_song};
//! use tabforge_spec::validation::validate_song;
//! use tabforge_spec::hash::canonical_song_hash;
//! use tabforge_spec::Track;
//!
//! let song = add_track(empty_song(), Track::guitar("lead", "Lead"));
//! let song = ensure_minimum_song(song);
//!
//! assert!(validate_song(&song).is_ok());
//! let hash = canonical_song_hash(&song).unwrap();
//! println!("snapshot: {}", hash);
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error and warning types for validation
//! - [`song`]: Song document types
//! - [`validation`]: Shape and semantic validation
//! - [`fretboard`]: Pitch to string/fret mapping
//! - [`ops`]: Song model operations
//! - [`key`]: Key-signature parsing
//! - [`export`]: Export preparation
//! - [`hash`]: Canonical snapshot hashing

pub mod error;
pub mod export;
pub mod fretboard;
pub mod hash;
pub mod key;
pub mod ops;
pub mod song;
pub mod validation;

pub use error::{
    BackendError, ErrorCode, SchemaViolation, SongError, ValidationError, ValidationResult,
    ValidationWarning, WarningCode,
};
pub use export::{prepare_for_export, ExportDocument, ResolvedHeader};
pub use fretboard::{locate, map_pitch, FretPosition, Placement, MAX_MAPPED_FRET};
pub use hash::canonical_song_hash;
pub use key::{parse_key, KeySignature, Mode};
pub use ops::MetadataPatch;
pub use song::{
    Beat, Bend, BendKind, Duration, Effects, Measure, MeasureHeader, Metadata, Note, NoteKind,
    Section, Song, TimeSignature, Track, TripletFeel, Tuplet, STANDARD_BASS_TUNING,
    STANDARD_GUITAR_TUNING,
};
pub use validation::{ensure_valid, parse_song_json, parse_song_value, validate_song, ValidatedSong};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::ops::{ensure_musical_completeness, update_metadata};

    /// A document as the tablature writer expects it.
    #[test]
    fn test_parse_writer_document() {
        let json = r#"{
            "metadata": {
                "title": "Sample Song",
                "artist": "Test Artist",
                "tempo": 120,
                "keySignature": "key of G",
                "timeSignature": {"beats": 4, "beatType": 4}
            },
            "tracks": [
                {
                    "id": "guitar",
                    "name": "Lead Guitar",
                    "instrument": "Guitar",
                    "tuning": [40, 45, 50, 55, 59, 64],
                    "measures": [
                        {
                            "index": 0,
                            "header": {"marker": "Intro", "repeatStart": true},
                            "beats": [
                                {
                                    "start": 0,
                                    "chord": "G",
                                    "notes": [
                                        {"string": 1, "fret": 3, "duration": {"numerator": 1, "denominator": 4}},
                                        {"string": 5, "fret": 3, "effects": {"vibrato": true, "bend": {"kind": "bend", "quarterTones": 2}}}
                                    ]
                                },
                                {"start": 1, "notes": [{"type": "rest", "duration": {"numerator": 1, "denominator": 2, "dotted": true}}]}
                            ]
                        }
                    ]
                }
            ]
        }"#;

        let parsed = parse_song_json(json).unwrap();
        assert!(parsed.warnings.is_empty());

        let song = parsed.song;
        assert_eq!(song.metadata.title, "Sample Song");
        let measure = &song.tracks[0].measures[0];
        assert_eq!(
            measure.header.as_ref().unwrap().marker.as_deref(),
            Some("Intro")
        );
        let bent = &measure.beats[0].notes[1];
        assert!(bent.effects.vibrato);
        assert_eq!(bent.effects.bend.unwrap().kind, BendKind::Bend);
        assert!(measure.beats[1].notes[0].is_rest());
        assert!(measure.beats[1].notes[0].duration.dotted);

        let doc = prepare_for_export(song).unwrap();
        assert!(doc.headers[0].repeat_start);
        assert_eq!(doc.key.unwrap().tonic, "G");
    }

    /// Serialized songs parse back through the validator unchanged.
    #[test]
    fn test_complete_song_survives_validation() {
        let song = update_metadata(
            ops::empty_song(),
            MetadataPatch {
                title: Some("Loop".to_string()),
                tempo: Some(96),
                ..MetadataPatch::default()
            },
        );
        let song = ensure_musical_completeness(song);
        let parsed = parse_song_value(&song.to_value().unwrap()).unwrap();
        assert_eq!(parsed.song, song);
        assert!(parsed.warnings.is_empty());
    }
}
