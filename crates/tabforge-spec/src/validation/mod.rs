//! Song validation.
//!
//! Boundary data goes through [`parse_song_value`] (or [`parse_song_json`]):
//! a shape pass over the raw JSON followed by decoding and a semantic pass on
//! the typed [`Song`]. Songs built in code are checked with [`validate_song`].

pub mod common;
mod shape;


use std::collections::HashSet;

use serde_json::Value;

use crate::error::{
    ErrorCode, SchemaViolation, ValidationError, ValidationResult, ValidationWarning, WarningCode,
};
use crate::key::parse_key;
use crate::song::{Duration, Measure, Note, NoteKind, Song, TimeSignature, Track};

use common::*;

/// A decoded song together with the warnings raised while checking it.
#[derive(Debug, Clone)]
pub struct ValidatedSong {
    pub song: Song,
    pub warnings: Vec<ValidationWarning>,
}

/// Parses and validates a song from a JSON string.
pub fn parse_song_json(json: &str) -> Result<ValidatedSong, SchemaViolation> {
    let value: Value = serde_json::from_str(json).map_err(|e| {
        SchemaViolation::single(ValidationError::with_path(
            ErrorCode::InvalidDocument,
            format!("not valid JSON: {}", e),
            "$",
        ))
    })?;
    parse_song_value(&value)
}

/// Parses and validates a song from an arbitrary JSON value.
///
/// Missing optional fields are filled with their documented defaults and
/// `null` counts as absent. Out-of-range values are rejected, never clamped.
///
/// # Example
/// ```
/// use serde_json::json;
/// use tabforge_spec::validation::parse_song_value;
///
/// let parsed = parse_song_value(&json!({"metadata": {"title": "Sketch"}})).unwrap();
/// assert_eq!(parsed.song.metadata.tempo, 120);
///
/// let err = parse_song_value(&json!({"metadata": {"title": "", "tempo": 301}})).unwrap_err();
/// assert_eq!(err.paths(), vec!["metadata.tempo"]);
/// ```
pub fn parse_song_value(value: &Value) -> Result<ValidatedSong, SchemaViolation> {
    let cleaned = strip_nulls(value.clone());

    let mut result = ValidationResult::default();
    shape::check_song(&cleaned, &mut result);
    if !result.is_ok() {
        return Err(SchemaViolation {
            errors: result.errors,
            warnings: result.warnings,
        });
    }

    let song = Song::from_value(cleaned).map_err(|e| SchemaViolation {
        errors: vec![ValidationError::with_path(
            ErrorCode::InvalidDocument,
            format!("document could not be decoded: {}", e),
            "$",
        )],
        warnings: result.warnings.clone(),
    })?;

    result.merge(validate_song(&song));
    let warnings = result.into_result()?;
    Ok(ValidatedSong { song, warnings })
}

/// Validates an already typed song.
///
/// Runs the numeric bounds (the types only constrain representation) and the
/// semantic checks.
///
/// # Returns
/// * `ValidationResult` with `ok=true` if the song is valid, with any warnings.
/// * `ValidationResult` with `ok=false` and every error otherwise.
pub fn validate_song(song: &Song) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_metadata(song, &mut result);
    validate_tracks(song, &mut result);

    if song.tracks.is_empty() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::NoTracks,
            "song has no tracks",
            "tracks",
        ));
    } else if !song.has_equal_measure_counts() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::UnequalMeasureCounts,
            format!(
                "tracks have different measure counts: {:?}",
                song.measure_counts()
            ),
            "tracks",
        ));
    }

    result
}

/// Returns the song unchanged if it validates, otherwise every violation.
pub fn ensure_valid(song: Song) -> Result<Song, SchemaViolation> {
    validate_song(&song).into_result()?;
    Ok(song)
}

/// Removes `null` object members recursively so they decode as absent.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

fn range_error(
    name: &str,
    value: i64,
    min: i64,
    max: i64,
    path: impl Into<String>,
    result: &mut ValidationResult,
) {
    if let Err(e) = validate_range(name, value, min, max) {
        result.add_error(ValidationError::with_path(
            ErrorCode::OutOfRange,
            e.message,
            path,
        ));
    }
}

fn validate_time_signature(ts: &TimeSignature, path: &str, result: &mut ValidationResult) {
    range_error(
        "beats",
        i64::from(ts.beats),
        TIME_SIG_BEATS_MIN,
        TIME_SIG_BEATS_MAX,
        format!("{}.beats", path),
        result,
    );
    if let Err(e) = validate_one_of("beatType", i64::from(ts.beat_type), BEAT_TYPES) {
        result.add_error(ValidationError::with_path(
            ErrorCode::OutOfRange,
            e.message,
            format!("{}.beatType", path),
        ));
    }
}

fn check_key(key: &str, path: &str, result: &mut ValidationResult) {
    if parse_key(key).is_none() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::UnrecognizedKey,
            format!("key signature '{}' is not recognized", key),
            path,
        ));
    }
}

fn validate_metadata(song: &Song, result: &mut ValidationResult) {
    let metadata = &song.metadata;
    range_error(
        "tempo",
        i64::from(metadata.tempo),
        TEMPO_MIN,
        TEMPO_MAX,
        "metadata.tempo",
        result,
    );
    validate_time_signature(&metadata.time_signature, "metadata.timeSignature", result);
    check_key(&metadata.key_signature, "metadata.keySignature", result);
}

fn validate_tracks(song: &Song, result: &mut ValidationResult) {
    let mut seen_ids = HashSet::new();
    for (i, track) in song.tracks.iter().enumerate() {
        let path = format!("tracks[{}]", i);
        if !seen_ids.insert(track.id.as_str()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateTrackId,
                format!("duplicate track id '{}'", track.id),
                format!("{}.id", path),
            ));
        }
        validate_track(track, &path, result);
    }
}

fn validate_track(track: &Track, path: &str, result: &mut ValidationResult) {
    if let Some(count) = track.string_count {
        range_error(
            "stringCount",
            i64::from(count),
            STRING_COUNT_MIN,
            STRING_COUNT_MAX,
            format!("{}.stringCount", path),
            result,
        );
    }
    if let Some(ref tuning) = track.tuning {
        if let Err(e) = validate_tuning_length(tuning.len()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::OutOfRange,
                e.message,
                format!("{}.tuning", path),
            ));
        }
        for (i, pitch) in tuning.iter().enumerate() {
            range_error(
                "tuning pitch",
                i64::from(*pitch),
                0,
                MIDI_MAX,
                format!("{}.tuning[{}]", path, i),
                result,
            );
        }
        if let Some(count) = track.string_count {
            if usize::from(count) != tuning.len() {
                result.add_warning(ValidationWarning::with_path(
                    WarningCode::TuningLengthMismatch,
                    format!(
                        "tuning has {} pitches but stringCount is {}",
                        tuning.len(),
                        count
                    ),
                    format!("{}.tuning", path),
                ));
            }
        }
    }
    range_error(
        "capo",
        i64::from(track.capo),
        0,
        CAPO_MAX,
        format!("{}.capo", path),
        result,
    );
    range_error(
        "volume",
        i64::from(track.volume),
        0,
        MIDI_MAX,
        format!("{}.volume", path),
        result,
    );
    range_error(
        "pan",
        i64::from(track.pan),
        0,
        MIDI_MAX,
        format!("{}.pan", path),
        result,
    );

    for (j, measure) in track.measures.iter().enumerate() {
        validate_measure(track, measure, j, &format!("{}.measures[{}]", path, j), result);
    }
}

fn validate_measure(
    track: &Track,
    measure: &Measure,
    position: usize,
    path: &str,
    result: &mut ValidationResult,
) {
    if measure.index as usize != position {
        result.add_error(ValidationError::with_path(
            ErrorCode::MeasureIndexMismatch,
            format!(
                "measure index {} does not match its position {}",
                measure.index, position
            ),
            format!("{}.index", path),
        ));
    }

    if let Some(ref header) = measure.header {
        if let Some(ref ts) = header.time_signature {
            validate_time_signature(ts, &format!("{}.header.timeSignature", path), result);
        }
        if let Some(ref key) = header.key_signature {
            check_key(key, &format!("{}.header.keySignature", path), result);
        }
    }

    for (k, beat) in measure.beats.iter().enumerate() {
        let beat_path = format!("{}.beats[{}]", path, k);
        range_error(
            "start",
            i64::from(beat.start),
            0,
            BEAT_START_MAX,
            format!("{}.start", beat_path),
            result,
        );
        for (n, note) in beat.notes.iter().enumerate() {
            validate_note(track, note, &format!("{}.notes[{}]", beat_path, n), result);
        }
    }
}

fn validate_note(track: &Track, note: &Note, path: &str, result: &mut ValidationResult) {
    if note.kind == NoteKind::Note && !note.has_position() {
        result.add_error(ValidationError::with_path(
            ErrorCode::MissingPosition,
            "pitched note needs string and fret, or a midi pitch",
            path,
        ));
    }

    if let Some(string) = note.string {
        range_error(
            "string",
            i64::from(string),
            STRING_COUNT_MIN,
            STRING_COUNT_MAX,
            format!("{}.string", path),
            result,
        );
        if let Some(strings) = track.strings() {
            if usize::from(string) > strings {
                result.add_error(ValidationError::with_path(
                    ErrorCode::StringBeyondInstrument,
                    format!(
                        "string {} does not exist on a {}-string track",
                        string, strings
                    ),
                    format!("{}.string", path),
                ));
            }
        }
    }
    if let Some(fret) = note.fret {
        range_error(
            "fret",
            i64::from(fret),
            0,
            FRET_MAX,
            format!("{}.fret", path),
            result,
        );
    }
    if let Some(midi) = note.midi {
        range_error(
            "midi",
            i64::from(midi),
            0,
            MIDI_MAX,
            format!("{}.midi", path),
            result,
        );
    }
    range_error(
        "velocity",
        i64::from(note.velocity),
        VELOCITY_MIN,
        MIDI_MAX,
        format!("{}.velocity", path),
        result,
    );
    validate_duration(&note.duration, &format!("{}.duration", path), result);

    if let Some(bend) = note.effects.bend {
        range_error(
            "quarterTones",
            i64::from(bend.quarter_tones),
            BEND_QUARTER_TONES_MIN,
            BEND_QUARTER_TONES_MAX,
            format!("{}.effects.bend.quarterTones", path),
            result,
        );
    }
}

fn validate_duration(duration: &Duration, path: &str, result: &mut ValidationResult) {
    range_error(
        "numerator",
        i64::from(duration.numerator),
        DURATION_NUMERATOR_MIN,
        DURATION_NUMERATOR_MAX,
        format!("{}.numerator", path),
        result,
    );
    if let Err(e) = validate_one_of(
        "denominator",
        i64::from(duration.denominator),
        DURATION_DENOMINATORS,
    ) {
        result.add_error(ValidationError::with_path(
            ErrorCode::OutOfRange,
            e.message,
            format!("{}.denominator", path),
        ));
    }
    if let Some(tuplet) = duration.tuplet {
        for (name, value) in [("enters", tuplet.enters), ("times", tuplet.times)] {
            range_error(
                name,
                i64::from(value),
                TUPLET_MIN,
                TUPLET_MAX,
                format!("{}.tuplet.{}", path, name),
                result,
            );
        }
    }
}
