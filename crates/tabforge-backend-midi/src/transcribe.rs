//! MIDI to tablature transcription.
//!
//! Source track 0 is the tempo/meta track and is skipped. Source track `i`
//! (`i >= 1`) feeds destination `min(i - 1, 2)`: Guitar, Bass, then Drums for
//! every remaining track. Each note-on with non-zero velocity becomes a quarter
//! note in a new beat at
//!
//! ```text
//! measure = abs_tick / (4 * ticks_per_beat)
//! beat    = (abs_tick % (4 * ticks_per_beat)) / ticks_per_beat
//! ```
//!
//! Note-offs and zero-velocity note-ons are ignored, so durations and
//! sub-beat timing are lost.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use tabforge_spec::error::BackendError;
use tabforge_spec::fretboard::locate;
use tabforge_spec::ops::{equalize_measure_counts, update_metadata, upsert_track, MetadataPatch};
use tabforge_spec::song::{Beat, Duration, Measure, Note, Song, Track};
use tabforge_spec::validation::common::{validate_tuning_length, TEMPO_MAX, TEMPO_MIN};

/// Beats per transcribed measure.
pub const BEATS_PER_MEASURE: u32 = 4;

/// Upper bound on the measure a note may land in.
pub const MAX_TRANSCRIBED_MEASURES: u32 = 4096;

/// Destination track ids, in destination order.
pub const DESTINATION_IDS: [&str; 3] = ["guitar", "bass", "drums"];

/// Errors from MIDI transcription.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// Bytes are not a valid SMF.
    #[error("Invalid MIDI data: {0}")]
    Parse(String),

    /// SMPTE timecode timing cannot be mapped to beats.
    #[error("Timecode (SMPTE) timing is not supported")]
    TimecodeTiming,

    /// Zero ticks per beat.
    #[error("Ticks per beat must be positive")]
    ZeroTicksPerBeat,

    /// A note starts beyond the transcription limit.
    #[error("Note at measure {measure} exceeds the limit of {limit} measures")]
    TooLong { measure: u32, limit: u32 },
}

impl BackendError for TranscribeError {
    fn code(&self) -> &'static str {
        match self {
            TranscribeError::Parse(_) => "MIDI_001",
            TranscribeError::TimecodeTiming => "MIDI_002",
            TranscribeError::ZeroTicksPerBeat => "MIDI_003",
            TranscribeError::TooLong { .. } => "MIDI_004",
        }
    }

    fn category(&self) -> &'static str {
        "midi"
    }
}

/// Counters describing transcription quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionStats {
    /// Notes written to a destination track.
    pub notes_placed: usize,
    /// Pitched notes that fell back to string 1 / fret 0.
    pub unmapped: usize,
    /// Note-offs and zero-velocity note-ons.
    pub ignored_events: usize,
}

/// Result of transcribing one SMF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    /// Guitar, Bass and Drums tracks, in that order.
    pub tracks: Vec<Track>,
    pub ticks_per_beat: u16,
    /// Tempo of the first tempo meta event, rounded to whole BPM.
    pub tempo_bpm: Option<u32>,
    pub stats: TranscriptionStats,
}

/// Parses SMF bytes and transcribes them.
pub fn transcribe_bytes(bytes: &[u8], base: &Song) -> Result<Transcription, TranscribeError> {
    let smf = Smf::parse(bytes).map_err(|e| TranscribeError::Parse(e.to_string()))?;
    transcribe_smf(&smf, base)
}

/// Builds the destination track at `slot`, taking the tuning of a same-id
/// track in `base` when present.
fn destination_track(slot: usize, base: &Song) -> Track {
    let id = DESTINATION_IDS[slot];
    let mut track = match slot {
        0 => Track::guitar(id, "Guitar"),
        1 => Track::bass(id, "Bass"),
        _ => Track::drums(id, "Drums"),
    };
    if let Some(existing) = base.track(id) {
        if !track.is_drums {
            if let Some(ref tuning) = existing.tuning {
                if validate_tuning_length(tuning.len()).is_ok() {
                    track.string_count = u8::try_from(tuning.len()).ok();
                    track.tuning = Some(tuning.clone());
                }
            }
        }
    }
    track
}

/// Transcribes a parsed SMF onto Guitar, Bass and Drums tracks.
///
/// `base` only supplies tunings; it is not modified.
pub fn transcribe_smf(smf: &Smf, base: &Song) -> Result<Transcription, TranscribeError> {
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        Timing::Timecode(..) => return Err(TranscribeError::TimecodeTiming),
    };
    if ticks_per_beat == 0 {
        return Err(TranscribeError::ZeroTicksPerBeat);
    }
    let tpb = u64::from(ticks_per_beat);
    let ticks_per_measure = tpb * u64::from(BEATS_PER_MEASURE);

    let mut tracks: Vec<Track> = (0..DESTINATION_IDS.len())
        .map(|slot| destination_track(slot, base))
        .collect();
    let mut stats = TranscriptionStats::default();
    let mut tempo_bpm = None;

    for (i, source) in smf.tracks.iter().enumerate() {
        let mut abs: u64 = 0;
        for event in source {
            abs += u64::from(event.delta.as_int());

            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(micros)) => {
                    if tempo_bpm.is_none() && micros.as_int() > 0 {
                        let bpm = (60_000_000.0 / f64::from(micros.as_int())).round() as u32;
                        tempo_bpm = Some(bpm);
                    }
                }
                TrackEventKind::Midi { message, .. } if i > 0 => match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        let slot = (i - 1).min(DESTINATION_IDS.len() - 1);
                        let measure = abs / ticks_per_measure;
                        if measure >= u64::from(MAX_TRANSCRIBED_MEASURES) {
                            return Err(TranscribeError::TooLong {
                                measure: u32::try_from(measure).unwrap_or(u32::MAX),
                                limit: MAX_TRANSCRIBED_MEASURES,
                            });
                        }
                        let beat = (abs % ticks_per_measure) / tpb;
                        place_note(
                            &mut tracks[slot],
                            measure as u32,
                            beat as u16,
                            key.as_int(),
                            vel.as_int(),
                            &mut stats,
                        );
                    }
                    MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. } => {
                        stats.ignored_events += 1;
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    if stats.unmapped > 0 {
        warn!(
            unmapped = stats.unmapped,
            placed = stats.notes_placed,
            "some pitches fell back to string 1 fret 0"
        );
    }
    debug!(
        placed = stats.notes_placed,
        ignored = stats.ignored_events,
        ticks_per_beat,
        "transcription finished"
    );

    Ok(Transcription {
        tracks,
        ticks_per_beat,
        tempo_bpm,
        stats,
    })
}

fn place_note(
    track: &mut Track,
    measure: u32,
    beat: u16,
    pitch: u8,
    velocity: u8,
    stats: &mut TranscriptionStats,
) {
    while track.measures.len() <= measure as usize {
        let index = track.measures.len() as u32;
        track.measures.push(Measure::empty(index));
    }

    let note = if track.is_drums {
        Note::midi(pitch, Duration::quarter())
    } else {
        let placement = locate(pitch, track.effective_tuning());
        if !placement.is_mapped() {
            stats.unmapped += 1;
        }
        let position = placement.position();
        let mut note = Note::fretted(position.string, position.fret, Duration::quarter());
        note.midi = Some(pitch);
        note
    };

    track.measures[measure as usize]
        .beats
        .push(Beat::new(beat, vec![note.with_velocity(velocity)]));
    stats.notes_placed += 1;
}

/// Merges a transcription into a song.
///
/// Transcribed tracks replace same-id tracks or are added; tracks that
/// received no notes are skipped. The reported tempo is applied when within
/// bounds. Measure counts are equalized.
pub fn merge_transcription(song: Song, transcription: Transcription) -> Song {
    let mut song = song;
    if let Some(bpm) = transcription.tempo_bpm {
        if (TEMPO_MIN..=TEMPO_MAX).contains(&i64::from(bpm)) {
            song = update_metadata(
                song,
                MetadataPatch {
                    tempo: Some(bpm as u16),
                    ..MetadataPatch::default()
                },
            );
        } else {
            warn!(bpm, "transcribed tempo out of range, keeping song tempo");
        }
    }
    for track in transcription.tracks {
        if track.measures.is_empty() {
            continue;
        }
        song = upsert_track(song, track);
    }
    equalize_measure_counts(song)
}
