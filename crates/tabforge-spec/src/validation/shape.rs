//! Shape pass over raw JSON.
//!
//! Checks required fields, JSON types, enumerations and numeric bounds before
//! anything is decoded, so every offending path is reported instead of only
//! the first decode failure.

use serde_json::{Map, Value};

use super::common::*;
use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};

const SONG_FIELDS: &[&str] = &[
    "metadata",
    "sections",
    "tracks",
    "draftText",
    "chordsBySection",
    "readyForExport",
];
const METADATA_FIELDS: &[&str] = &[
    "title",
    "artist",
    "tempo",
    "keySignature",
    "timeSignature",
    "version",
];
const TIME_SIGNATURE_FIELDS: &[&str] = &["beats", "beatType"];
const SECTION_FIELDS: &[&str] = &["name", "startMeasure", "measureCount"];
const TRACK_FIELDS: &[&str] = &[
    "id",
    "name",
    "instrument",
    "isDrums",
    "stringCount",
    "tuning",
    "capo",
    "volume",
    "pan",
    "measures",
];
const MEASURE_FIELDS: &[&str] = &["index", "header", "beats", "lyric"];
const HEADER_FIELDS: &[&str] = &[
    "timeSignature",
    "keySignature",
    "repeatStart",
    "repeatEnd",
    "marker",
    "tripletFeel",
];
const BEAT_FIELDS: &[&str] = &["start", "notes", "chord", "text"];
const NOTE_FIELDS: &[&str] = &[
    "type", "string", "fret", "midi", "duration", "velocity", "effects",
];
const DURATION_FIELDS: &[&str] = &["numerator", "denominator", "dotted", "tuplet"];
const TUPLET_FIELDS: &[&str] = &["enters", "times"];
const EFFECT_FIELDS: &[&str] = &[
    "slide", "bend", "hammerOn", "pullOff", "vibrato", "palmMute", "letRing",
];
const BEND_FIELDS: &[&str] = &["kind", "quarterTones"];

const NOTE_TYPES: &[&str] = &["note", "rest"];
const TRIPLET_FEELS: &[&str] = &["none", "eighth", "sixteenth"];
const BEND_KINDS: &[&str] = &["bend", "bendRelease", "prebend", "prebendRelease"];

/// Largest accepted measure index or section offset.
const MEASURE_INDEX_MAX: i64 = u32::MAX as i64;

/// Runs the shape pass on a null-stripped song value.
pub(crate) fn check_song(value: &Value, result: &mut ValidationResult) {
    let Some(song) = as_object(value, "", result) else {
        return;
    };
    check_unknown(song, SONG_FIELDS, "", result);

    match song.get("metadata") {
        Some(metadata) => check_metadata(metadata, "metadata", result),
        None => missing("metadata", result),
    }

    if let Some(sections) = optional_array(song, "sections", "", result) {
        for (i, section) in sections.iter().enumerate() {
            check_section(section, &format!("sections[{}]", i), result);
        }
    }

    if let Some(tracks) = optional_array(song, "tracks", "", result) {
        for (i, track) in tracks.iter().enumerate() {
            check_track(track, &format!("tracks[{}]", i), result);
        }
    }

    optional_string(song, "draftText", "", result);
    optional_bool(song, "readyForExport", "", result);

    if let Some(chords) = song.get("chordsBySection") {
        if let Some(map) = as_object(chords, "chordsBySection", result) {
            for (section, names) in map {
                let path = format!("chordsBySection.{}", section);
                check_string_array(names, &path, result);
            }
        }
    }
}

fn check_metadata(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, METADATA_FIELDS, path, result);
    required_string(map, "title", path, result);
    optional_string(map, "artist", path, result);
    optional_int_in(map, "tempo", path, TEMPO_MIN, TEMPO_MAX, result);
    optional_string(map, "keySignature", path, result);
    optional_string(map, "version", path, result);
    if let Some(ts) = map.get("timeSignature") {
        check_time_signature(ts, &child(path, "timeSignature"), result);
    }
}

fn check_time_signature(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, TIME_SIGNATURE_FIELDS, path, result);
    optional_int_in(
        map,
        "beats",
        path,
        TIME_SIG_BEATS_MIN,
        TIME_SIG_BEATS_MAX,
        result,
    );
    optional_int_one_of(map, "beatType", path, BEAT_TYPES, result);
}

fn check_section(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, SECTION_FIELDS, path, result);
    required_string(map, "name", path, result);
    optional_int_in(map, "startMeasure", path, 0, MEASURE_INDEX_MAX, result);
    optional_int_in(map, "measureCount", path, 0, MEASURE_INDEX_MAX, result);
}

fn check_track(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, TRACK_FIELDS, path, result);
    required_string(map, "id", path, result);
    required_string(map, "name", path, result);
    optional_string(map, "instrument", path, result);
    optional_bool(map, "isDrums", path, result);
    optional_int_in(
        map,
        "stringCount",
        path,
        STRING_COUNT_MIN,
        STRING_COUNT_MAX,
        result,
    );
    optional_int_in(map, "capo", path, 0, CAPO_MAX, result);
    optional_int_in(map, "volume", path, 0, MIDI_MAX, result);
    optional_int_in(map, "pan", path, 0, MIDI_MAX, result);

    if let Some(tuning) = optional_array(map, "tuning", path, result) {
        let tuning_path = child(path, "tuning");
        if let Err(e) = validate_tuning_length(tuning.len()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::OutOfRange,
                e.message,
                tuning_path.as_str(),
            ));
        }
        for (i, pitch) in tuning.iter().enumerate() {
            int_in(
                pitch,
                "tuning pitch",
                &format!("{}[{}]", tuning_path, i),
                0,
                MIDI_MAX,
                result,
            );
        }
    }

    if let Some(measures) = optional_array(map, "measures", path, result) {
        for (i, measure) in measures.iter().enumerate() {
            check_measure(measure, &format!("{}.measures[{}]", path, i), result);
        }
    }
}

fn check_measure(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, MEASURE_FIELDS, path, result);
    match map.get("index") {
        Some(index) => int_in(
            index,
            "index",
            &child(path, "index"),
            0,
            MEASURE_INDEX_MAX,
            result,
        ),
        None => missing(&child(path, "index"), result),
    }
    optional_string(map, "lyric", path, result);

    if let Some(header) = map.get("header") {
        check_header(header, &child(path, "header"), result);
    }

    if let Some(beats) = optional_array(map, "beats", path, result) {
        for (i, beat) in beats.iter().enumerate() {
            check_beat(beat, &format!("{}.beats[{}]", path, i), result);
        }
    }
}

fn check_header(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, HEADER_FIELDS, path, result);
    if let Some(ts) = map.get("timeSignature") {
        check_time_signature(ts, &child(path, "timeSignature"), result);
    }
    optional_string(map, "keySignature", path, result);
    optional_bool(map, "repeatStart", path, result);
    optional_bool(map, "repeatEnd", path, result);
    optional_string(map, "marker", path, result);
    optional_enum(map, "tripletFeel", path, TRIPLET_FEELS, result);
}

fn check_beat(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, BEAT_FIELDS, path, result);
    optional_int_in(map, "start", path, 0, BEAT_START_MAX, result);
    optional_string(map, "chord", path, result);
    optional_string(map, "text", path, result);

    if let Some(notes) = optional_array(map, "notes", path, result) {
        for (i, note) in notes.iter().enumerate() {
            check_note(note, &format!("{}.notes[{}]", path, i), result);
        }
    }
}

fn check_note(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, NOTE_FIELDS, path, result);
    optional_enum(map, "type", path, NOTE_TYPES, result);
    optional_int_in(
        map,
        "string",
        path,
        STRING_COUNT_MIN,
        STRING_COUNT_MAX,
        result,
    );
    optional_int_in(map, "fret", path, 0, FRET_MAX, result);
    optional_int_in(map, "midi", path, 0, MIDI_MAX, result);
    optional_int_in(map, "velocity", path, VELOCITY_MIN, MIDI_MAX, result);

    if let Some(duration) = map.get("duration") {
        check_duration(duration, &child(path, "duration"), result);
    }
    if let Some(effects) = map.get("effects") {
        check_effects(effects, &child(path, "effects"), result);
    }
}

fn check_duration(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, DURATION_FIELDS, path, result);
    optional_int_in(
        map,
        "numerator",
        path,
        DURATION_NUMERATOR_MIN,
        DURATION_NUMERATOR_MAX,
        result,
    );
    optional_int_one_of(map, "denominator", path, DURATION_DENOMINATORS, result);
    optional_bool(map, "dotted", path, result);

    if let Some(tuplet) = map.get("tuplet") {
        let tuplet_path = child(path, "tuplet");
        if let Some(tuplet) = as_object(tuplet, &tuplet_path, result) {
            check_unknown(tuplet, TUPLET_FIELDS, &tuplet_path, result);
            required_int_in(
                tuplet,
                "enters",
                &tuplet_path,
                TUPLET_MIN,
                TUPLET_MAX,
                result,
            );
            required_int_in(tuplet, "times", &tuplet_path, TUPLET_MIN, TUPLET_MAX, result);
        }
    }
}

fn check_effects(value: &Value, path: &str, result: &mut ValidationResult) {
    let Some(map) = as_object(value, path, result) else {
        return;
    };
    check_unknown(map, EFFECT_FIELDS, path, result);
    for flag in ["slide", "hammerOn", "pullOff", "vibrato", "palmMute", "letRing"] {
        optional_bool(map, flag, path, result);
    }

    if let Some(bend) = map.get("bend") {
        let bend_path = child(path, "bend");
        if let Some(bend) = as_object(bend, &bend_path, result) {
            check_unknown(bend, BEND_FIELDS, &bend_path, result);
            if bend.contains_key("kind") {
                optional_enum(bend, "kind", &bend_path, BEND_KINDS, result);
            } else {
                missing(&child(&bend_path, "kind"), result);
            }
            required_int_in(
                bend,
                "quarterTones",
                &bend_path,
                BEND_QUARTER_TONES_MIN,
                BEND_QUARTER_TONES_MAX,
                result,
            );
        }
    }
}

fn check_string_array(value: &Value, path: &str, result: &mut ValidationResult) {
    match value.as_array() {
        Some(items) => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    wrong_type(&format!("{}[{}]", path, i), "string", item, result);
                }
            }
        }
        None => wrong_type(path, "array", value, result),
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "$"
    } else {
        path
    }
}

fn missing(path: &str, result: &mut ValidationResult) {
    result.add_error(ValidationError::with_path(
        ErrorCode::MissingField,
        "required field is missing",
        display_path(path),
    ));
}

fn wrong_type(path: &str, expected: &str, value: &Value, result: &mut ValidationResult) {
    result.add_error(ValidationError::with_path(
        ErrorCode::WrongType,
        format!("expected {}, got {}", expected, json_type(value)),
        display_path(path),
    ));
}

fn as_object<'v>(
    value: &'v Value,
    path: &str,
    result: &mut ValidationResult,
) -> Option<&'v Map<String, Value>> {
    match value.as_object() {
        Some(map) => Some(map),
        None => {
            wrong_type(path, "object", value, result);
            None
        }
    }
}

fn check_unknown(
    map: &Map<String, Value>,
    allowed: &[&str],
    path: &str,
    result: &mut ValidationResult,
) {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::UnknownField,
                format!("unknown field '{}' is ignored", key),
                child(path, key),
            ));
        }
    }
}

fn required_string(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    result: &mut ValidationResult,
) {
    match map.get(key) {
        Some(Value::String(_)) => {}
        Some(other) => wrong_type(&child(path, key), "string", other, result),
        None => missing(&child(path, key), result),
    }
}

fn optional_string(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    result: &mut ValidationResult,
) {
    if let Some(value) = map.get(key) {
        if !value.is_string() {
            wrong_type(&child(path, key), "string", value, result);
        }
    }
}

fn optional_bool(map: &Map<String, Value>, key: &str, path: &str, result: &mut ValidationResult) {
    if let Some(value) = map.get(key) {
        if !value.is_boolean() {
            wrong_type(&child(path, key), "boolean", value, result);
        }
    }
}

fn optional_array<'v>(
    map: &'v Map<String, Value>,
    key: &str,
    path: &str,
    result: &mut ValidationResult,
) -> Option<&'v Vec<Value>> {
    match map.get(key) {
        Some(Value::Array(items)) => Some(items),
        Some(other) => {
            wrong_type(&child(path, key), "array", other, result);
            None
        }
        None => None,
    }
}

fn optional_enum(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    allowed: &[&str],
    result: &mut ValidationResult,
) {
    match map.get(key) {
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
        Some(Value::String(s)) => result.add_error(ValidationError::with_path(
            ErrorCode::InvalidEnum,
            format!("{} must be one of {:?}, got '{}'", key, allowed, s),
            child(path, key),
        )),
        Some(other) => wrong_type(&child(path, key), "string", other, result),
        None => {}
    }
}

/// Reads an integer, reporting a type error for floats and non-numbers.
fn integer(value: &Value, path: &str, result: &mut ValidationResult) -> Option<i64> {
    match value.as_i64() {
        Some(n) => Some(n),
        None => {
            // u64 beyond i64 is still an integer; treat it as out of every bound.
            if let Some(n) = value.as_u64() {
                return Some(i64::try_from(n).unwrap_or(i64::MAX));
            }
            wrong_type(path, "integer", value, result);
            None
        }
    }
}

fn int_in(value: &Value, name: &str, path: &str, min: i64, max: i64, result: &mut ValidationResult) {
    if let Some(n) = integer(value, path, result) {
        if let Err(e) = validate_range(name, n, min, max) {
            result.add_error(ValidationError::with_path(
                ErrorCode::OutOfRange,
                e.message,
                path,
            ));
        }
    }
}

fn optional_int_in(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    min: i64,
    max: i64,
    result: &mut ValidationResult,
) {
    if let Some(value) = map.get(key) {
        int_in(value, key, &child(path, key), min, max, result);
    }
}

fn required_int_in(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    min: i64,
    max: i64,
    result: &mut ValidationResult,
) {
    match map.get(key) {
        Some(value) => int_in(value, key, &child(path, key), min, max, result),
        None => missing(&child(path, key), result),
    }
}

fn optional_int_one_of(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    allowed: &[i64],
    result: &mut ValidationResult,
) {
    if let Some(value) = map.get(key) {
        let field_path = child(path, key);
        if let Some(n) = integer(value, &field_path, result) {
            if let Err(e) = validate_one_of(key, n, allowed) {
                result.add_error(ValidationError::with_path(
                    ErrorCode::OutOfRange,
                    e.message,
                    field_path,
                ));
            }
        }
    }
}
