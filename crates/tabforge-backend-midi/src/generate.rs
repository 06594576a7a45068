//! Local MIDI progression generator.
//!
//! Produces a format-1 SMF with a meta track (tempo, 4/4) followed by Guitar,
//! Bass and Drums tracks. Pitched tracks play four quarter notes per measure
//! on a root that cycles through `[0, 3, 5, 8]` semitones above the key's
//! tonic in the C3 octave; drums play kick on beats 1 and 3, snare on 2 and 4
//! and a closed hi-hat on every beat.

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tabforge_spec::error::BackendError;
use tabforge_spec::key::parse_key;
use tabforge_spec::ops::{CLOSED_HAT, KICK, PROGRESSION_FRETS, SNARE};
use tabforge_spec::validation::common::{TEMPO_MAX, TEMPO_MIN};

/// Ticks per quarter note in generated files.
pub const TICKS_PER_BEAT: u16 = 480;

/// Largest number of measures a request may ask for.
pub const MAX_MEASURES: u32 = 1024;

/// C3, the root of the progression in C.
const PROGRESSION_BASE: u8 = 48;

const NOTE_VELOCITY: u8 = 90;
const HAT_VELOCITY: u8 = 60;

const GUITAR_PROGRAM: u8 = 30;
const BASS_PROGRAM: u8 = 32;
const GUITAR_CHANNEL: u8 = 0;
const BASS_CHANNEL: u8 = 1;
const DRUM_CHANNEL: u8 = 9;

/// Errors from MIDI generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Invalid request parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// SMF serialization failed.
    #[error("Failed to write MIDI: {0}")]
    Write(String),
}

impl BackendError for GenerateError {
    fn code(&self) -> &'static str {
        match self {
            GenerateError::InvalidParameter(_) => "MIDI_010",
            GenerateError::Write(_) => "MIDI_011",
        }
    }

    fn category(&self) -> &'static str {
        "midi"
    }
}

fn default_tempo() -> u16 {
    tabforge_spec::song::DEFAULT_TEMPO
}

fn default_key() -> String {
    tabforge_spec::song::DEFAULT_KEY.to_string()
}

fn default_measures() -> u32 {
    8
}

/// MIDI source request: `{tempo, key, measures}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default = "default_tempo")]
    pub tempo: u16,
    #[serde(default = "default_key")]
    pub key: String,
    /// Number of measures, at most [`MAX_MEASURES`]; values below 1 are
    /// raised to 1.
    #[serde(default = "default_measures")]
    pub measures: u32,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        Self {
            tempo: default_tempo(),
            key: default_key(),
            measures: default_measures(),
        }
    }
}

/// Generated MIDI file.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    /// SMF bytes.
    pub data: Vec<u8>,
    /// BLAKE3 hash of the bytes.
    pub hash: String,
    pub measures: u32,
}

/// Generates a progression for the request.
///
/// Unrecognized keys fall back to C.
pub fn generate_midi(request: &GenerateRequest) -> Result<GenerateResult, GenerateError> {
    let tempo = i64::from(request.tempo);
    if !(TEMPO_MIN..=TEMPO_MAX).contains(&tempo) {
        return Err(GenerateError::InvalidParameter(format!(
            "tempo must be between {} and {}, got {}",
            TEMPO_MIN, TEMPO_MAX, request.tempo
        )));
    }
    if request.measures > MAX_MEASURES {
        return Err(GenerateError::InvalidParameter(format!(
            "measures must be at most {}, got {}",
            MAX_MEASURES, request.measures
        )));
    }
    let measures = request.measures.max(1);
    let tonic = parse_key(&request.key).map(|k| k.pitch_class).unwrap_or(0);
    let roots: Vec<u8> = PROGRESSION_FRETS
        .iter()
        .map(|offset| PROGRESSION_BASE + tonic + offset)
        .collect();

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_BEAT)),
    ));
    smf.tracks.push(meta_track(request.tempo));
    smf.tracks.push(pitched_track(
        b"Guitar",
        GUITAR_PROGRAM,
        GUITAR_CHANNEL,
        &roots,
        measures,
    ));
    smf.tracks.push(pitched_track(
        b"Bass",
        BASS_PROGRAM,
        BASS_CHANNEL,
        &roots,
        measures,
    ));
    smf.tracks.push(drum_track(measures));

    let mut data = Vec::new();
    smf.write(&mut data)
        .map_err(|e| GenerateError::Write(e.to_string()))?;
    let hash = blake3::hash(&data).to_hex().to_string();
    debug!(
        bytes = data.len(),
        measures,
        tempo = request.tempo,
        "generated progression"
    );

    Ok(GenerateResult {
        data,
        hash,
        measures,
    })
}

fn meta_track(tempo: u16) -> Vec<TrackEvent<'static>> {
    let micros_per_beat = 60_000_000 / u32::from(tempo);
    vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros_per_beat))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]
}

fn note_on(channel: u8, key: u8, vel: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::new(channel),
        message: MidiMessage::NoteOn {
            key: u7::new(key),
            vel: u7::new(vel),
        },
    }
}

fn note_off(channel: u8, key: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::new(channel),
        message: MidiMessage::NoteOff {
            key: u7::new(key),
            vel: u7::new(0),
        },
    }
}

/// Converts absolute-tick events to a delta-timed track.
///
/// Events at the same tick keep their insertion order.
fn into_track(
    name: &'static [u8],
    mut events: Vec<(u32, TrackEventKind<'static>)>,
) -> Vec<TrackEvent<'static>> {
    events.sort_by_key(|(tick, _)| *tick);
    let mut track = vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name)),
    }];
    let mut last = 0;
    for (tick, kind) in events {
        track.push(TrackEvent {
            delta: u28::new(tick - last),
            kind,
        });
        last = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

fn pitched_track(
    name: &'static [u8],
    program: u8,
    channel: u8,
    roots: &[u8],
    measures: u32,
) -> Vec<TrackEvent<'static>> {
    let tpb = u32::from(TICKS_PER_BEAT);
    let mut events = vec![(
        0,
        TrackEventKind::Midi {
            channel: u4::new(channel),
            message: MidiMessage::ProgramChange {
                program: u7::new(program),
            },
        },
    )];
    for measure in 0..measures {
        let root = roots[measure as usize % roots.len()];
        for beat in 0..4 {
            let start = (measure * 4 + beat) * tpb;
            events.push((start, note_on(channel, root, NOTE_VELOCITY)));
            events.push((start + tpb, note_off(channel, root)));
        }
    }
    into_track(name, events)
}

fn drum_track(measures: u32) -> Vec<TrackEvent<'static>> {
    let tpb = u32::from(TICKS_PER_BEAT);
    let mut events = Vec::new();
    for measure in 0..measures {
        for beat in 0..4 {
            let start = (measure * 4 + beat) * tpb;
            let drum = if beat % 2 == 0 { KICK } else { SNARE };
            events.push((start, note_on(DRUM_CHANNEL, drum, NOTE_VELOCITY)));
            events.push((start, note_on(DRUM_CHANNEL, CLOSED_HAT, HAT_VELOCITY)));
            events.push((start + tpb / 2, note_off(DRUM_CHANNEL, drum)));
            events.push((start + tpb / 2, note_off(DRUM_CHANNEL, CLOSED_HAT)));
        }
    }
    into_track(b"Drums", events)
}
