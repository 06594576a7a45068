//! Song document types.
//!
//! A [`Song`] is the single owned aggregate exchanged between turns. Tracks,
//! measures, beats and notes are owned by their parent and never shared.
//! Field names serialize in camelCase, matching the payload consumed by the
//! external tablature writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default tempo in beats per minute.
pub const DEFAULT_TEMPO: u16 = 120;

/// Default key signature.
pub const DEFAULT_KEY: &str = "C";

/// Default document format version.
pub const DEFAULT_VERSION: &str = "5.00";

/// Default instrument label for tracks that omit one.
pub const DEFAULT_INSTRUMENT: &str = "Guitar";

/// Default track volume.
pub const DEFAULT_VOLUME: u8 = 100;

/// Default track pan (center).
pub const DEFAULT_PAN: u8 = 64;

/// Default note velocity.
pub const DEFAULT_VELOCITY: u8 = 90;

/// Standard six-string guitar tuning (E2 A2 D3 G3 B3 E4), string 1 first.
pub const STANDARD_GUITAR_TUNING: [u8; 6] = [40, 45, 50, 55, 59, 64];

/// Standard four-string bass tuning (E1 A1 D2 G2), string 1 first.
pub const STANDARD_BASS_TUNING: [u8; 4] = [28, 33, 38, 43];

fn default_tempo() -> u16 {
    DEFAULT_TEMPO
}

fn default_key() -> String {
    DEFAULT_KEY.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_instrument() -> String {
    DEFAULT_INSTRUMENT.to_string()
}

fn default_volume() -> u8 {
    DEFAULT_VOLUME
}

fn default_pan() -> u8 {
    DEFAULT_PAN
}

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

fn default_beats() -> u8 {
    4
}

fn default_beat_type() -> u8 {
    4
}

fn default_numerator() -> u8 {
    1
}

fn default_denominator() -> u8 {
    4
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Root song document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Song-level metadata.
    pub metadata: Metadata,

    /// Named structural regions in playback order.
    #[serde(default)]
    pub sections: Vec<Section>,

    /// Instrument lines.
    #[serde(default)]
    pub tracks: Vec<Track>,

    /// Free-form working notes.
    #[serde(default)]
    pub draft_text: String,

    /// Chord names per section, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chords_by_section: Option<BTreeMap<String, Vec<String>>>,

    /// Advisory flag; does not imply the document is valid.
    #[serde(default)]
    pub ready_for_export: bool,
}

impl Song {
    /// Parses a song from a JSON string without validation.
    ///
    /// Untrusted input should go through [`crate::validation::parse_song_json`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parses a song from a JSON value without validation.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Serializes the song to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the song to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the song to a JSON value.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Returns the track with the given id.
    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Returns true if any track is a drum track.
    pub fn has_drums(&self) -> bool {
        self.tracks.iter().any(|t| t.is_drums)
    }

    /// Returns true if any pitched track looks like a bass line.
    pub fn has_bass(&self) -> bool {
        self.tracks.iter().any(Track::is_bass)
    }

    /// Measure count of every track, in track order.
    pub fn measure_counts(&self) -> Vec<usize> {
        self.tracks.iter().map(|t| t.measures.len()).collect()
    }

    /// Largest measure count across tracks (0 with no tracks).
    pub fn max_measure_count(&self) -> usize {
        self.tracks
            .iter()
            .map(|t| t.measures.len())
            .max()
            .unwrap_or(0)
    }

    /// Returns true if all tracks have the same number of measures.
    pub fn has_equal_measure_counts(&self) -> bool {
        let max = self.max_measure_count();
        self.tracks.iter().all(|t| t.measures.len() == max)
    }

    /// Total number of beats across all tracks.
    pub fn beat_count(&self) -> usize {
        self.tracks
            .iter()
            .flat_map(|t| t.measures.iter())
            .map(|m| m.beats.len())
            .sum()
    }
}

/// Song-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Song title; may be blank until the user names the song.
    pub title: String,

    #[serde(default)]
    pub artist: String,

    /// Tempo in BPM, 30..=300.
    #[serde(default = "default_tempo")]
    pub tempo: u16,

    /// Key signature, e.g. "C", "D minor", "Bb".
    #[serde(default = "default_key")]
    pub key_signature: String,

    #[serde(default)]
    pub time_signature: TimeSignature,

    /// Document format version.
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            tempo: DEFAULT_TEMPO,
            key_signature: default_key(),
            time_signature: TimeSignature::default(),
            version: default_version(),
        }
    }
}

/// A time signature such as 4/4 or 6/8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignature {
    /// Beats per measure.
    #[serde(default = "default_beats")]
    pub beats: u8,
    /// Note value of one beat (4 = quarter).
    #[serde(default = "default_beat_type")]
    pub beat_type: u8,
}

impl TimeSignature {
    pub fn new(beats: u8, beat_type: u8) -> Self {
        Self { beats, beat_type }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats: default_beats(),
            beat_type: default_beat_type(),
        }
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_type)
    }
}

/// A named structural region (verse, chorus, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_measure: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_count: Option<u32>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_measure: None,
            measure_count: None,
        }
    }
}

/// One instrument line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Identifier, unique within the song.
    pub id: String,

    /// Display name.
    pub name: String,

    #[serde(default = "default_instrument")]
    pub instrument: String,

    #[serde(default)]
    pub is_drums: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_count: Option<u8>,

    /// Open-string MIDI pitches; string 1 is index 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<Vec<u8>>,

    #[serde(default)]
    pub capo: u8,

    #[serde(default = "default_volume")]
    pub volume: u8,

    #[serde(default = "default_pan")]
    pub pan: u8,

    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl Track {
    /// Creates a pitched track with the given tuning and no measures.
    pub fn pitched(
        id: impl Into<String>,
        name: impl Into<String>,
        instrument: impl Into<String>,
        tuning: &[u8],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instrument: instrument.into(),
            is_drums: false,
            string_count: u8::try_from(tuning.len()).ok(),
            tuning: Some(tuning.to_vec()),
            capo: 0,
            volume: DEFAULT_VOLUME,
            pan: DEFAULT_PAN,
            measures: Vec::new(),
        }
    }

    /// Standard-tuned six-string guitar.
    pub fn guitar(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::pitched(id, name, "Guitar", &STANDARD_GUITAR_TUNING)
    }

    /// Standard-tuned four-string bass.
    pub fn bass(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::pitched(id, name, "Bass", &STANDARD_BASS_TUNING)
    }

    /// Drum kit track (no tuning).
    pub fn drums(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instrument: "Drums".to_string(),
            is_drums: true,
            string_count: None,
            tuning: None,
            capo: 0,
            volume: DEFAULT_VOLUME,
            pan: DEFAULT_PAN,
            measures: Vec::new(),
        }
    }

    /// Number of playable strings, from `stringCount` or the tuning length.
    /// An empty tuning counts as absent, matching [`Track::effective_tuning`].
    pub fn strings(&self) -> Option<usize> {
        self.string_count.map(usize::from).or_else(|| {
            self.tuning
                .as_ref()
                .filter(|tuning| !tuning.is_empty())
                .map(Vec::len)
        })
    }

    /// Tuning used for fretboard mapping; falls back to standard guitar.
    pub fn effective_tuning(&self) -> &[u8] {
        match &self.tuning {
            Some(tuning) if !tuning.is_empty() => tuning.as_slice(),
            _ => &STANDARD_GUITAR_TUNING,
        }
    }

    /// Heuristic: a pitched track whose name or instrument mentions bass.
    pub fn is_bass(&self) -> bool {
        !self.is_drums
            && (self.instrument.to_lowercase().contains("bass")
                || self.name.to_lowercase().contains("bass"))
    }

    /// Returns true if at least one measure holds a beat.
    pub fn has_beats(&self) -> bool {
        self.measures.iter().any(|m| !m.beats.is_empty())
    }
}

/// One bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    /// Zero-based position in the track's measure list.
    pub index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<MeasureHeader>,

    #[serde(default)]
    pub beats: Vec<Beat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyric: Option<String>,
}

impl Measure {
    /// Creates an empty measure at the given index.
    pub fn empty(index: u32) -> Self {
        Self {
            index,
            header: None,
            beats: Vec::new(),
            lyric: None,
        }
    }

    /// Creates a measure holding the given beats.
    pub fn with_beats(index: u32, beats: Vec<Beat>) -> Self {
        Self {
            index,
            header: None,
            beats,
            lyric: None,
        }
    }
}

/// Per-measure overrides and markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<TimeSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_signature: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub repeat_start: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub repeat_end: bool,
    /// Section marker text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triplet_feel: Option<TripletFeel>,
}

/// Triplet-feel hint for a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TripletFeel {
    None,
    Eighth,
    Sixteenth,
}

impl TripletFeel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripletFeel::None => "none",
            TripletFeel::Eighth => "eighth",
            TripletFeel::Sixteenth => "sixteenth",
        }
    }

    pub fn all() -> &'static [TripletFeel] {
        &[TripletFeel::None, TripletFeel::Eighth, TripletFeel::Sixteenth]
    }
}

/// A rhythmic event group at a measure-relative offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beat {
    /// Offset from the start of the measure, in beats.
    #[serde(default)]
    pub start: u16,

    #[serde(default)]
    pub notes: Vec<Note>,

    /// Chord-name label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chord: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Beat {
    /// Creates a beat at `start` holding the given notes.
    pub fn new(start: u16, notes: Vec<Note>) -> Self {
        Self {
            start,
            notes,
            chord: None,
            text: None,
        }
    }
}

/// Whether a note sounds or is a rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    #[default]
    Note,
    Rest,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Note => "note",
            NoteKind::Rest => "rest",
        }
    }
}

/// A pitched note or a rest.
///
/// Pitched notes carry a `string`/`fret` position, a raw `midi` pitch, or
/// both (transcribed notes keep the source pitch for fidelity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "type", default)]
    pub kind: NoteKind,

    /// String number, 1-based (string 1 = tuning index 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fret: Option<u8>,

    /// Source MIDI pitch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi: Option<u8>,

    #[serde(default)]
    pub duration: Duration,

    #[serde(default = "default_velocity")]
    pub velocity: u8,

    #[serde(default)]
    pub effects: Effects,
}

impl Note {
    /// A fretted note.
    pub fn fretted(string: u8, fret: u8, duration: Duration) -> Self {
        Self {
            kind: NoteKind::Note,
            string: Some(string),
            fret: Some(fret),
            midi: None,
            duration,
            velocity: DEFAULT_VELOCITY,
            effects: Effects::default(),
        }
    }

    /// A note known only by its MIDI pitch (drums, unmapped material).
    pub fn midi(pitch: u8, duration: Duration) -> Self {
        Self {
            kind: NoteKind::Note,
            string: None,
            fret: None,
            midi: Some(pitch),
            duration,
            velocity: DEFAULT_VELOCITY,
            effects: Effects::default(),
        }
    }

    /// A rest.
    pub fn rest(duration: Duration) -> Self {
        Self {
            kind: NoteKind::Rest,
            string: None,
            fret: None,
            midi: None,
            duration,
            velocity: DEFAULT_VELOCITY,
            effects: Effects::default(),
        }
    }

    /// Sets the velocity.
    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn is_rest(&self) -> bool {
        self.kind == NoteKind::Rest
    }

    /// Returns true if the note has a usable position.
    pub fn has_position(&self) -> bool {
        (self.string.is_some() && self.fret.is_some()) || self.midi.is_some()
    }
}

/// Rhythmic value of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duration {
    #[serde(default = "default_numerator")]
    pub numerator: u8,
    #[serde(default = "default_denominator")]
    pub denominator: u8,
    #[serde(default)]
    pub dotted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuplet: Option<Tuplet>,
}

impl Duration {
    /// A plain `1/denominator` duration.
    pub fn of(denominator: u8) -> Self {
        Self {
            numerator: 1,
            denominator,
            dotted: false,
            tuplet: None,
        }
    }

    pub fn whole() -> Self {
        Self::of(1)
    }

    pub fn half() -> Self {
        Self::of(2)
    }

    pub fn quarter() -> Self {
        Self::of(4)
    }

    pub fn eighth() -> Self {
        Self::of(8)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::quarter()
    }
}

/// Tuplet ratio: `enters` notes in the time of `times`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tuplet {
    pub enters: u8,
    pub times: u8,
}

/// Per-note articulation flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    #[serde(default, skip_serializing_if = "is_false")]
    pub slide: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bend: Option<Bend>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hammer_on: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub pull_off: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub vibrato: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub palm_mute: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub let_ring: bool,
}

impl Effects {
    /// Returns true if no effect is set.
    pub fn is_empty(&self) -> bool {
        *self == Effects::default()
    }
}

/// Typed bend descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bend {
    pub kind: BendKind,
    /// Bend amount in quarter tones, 1..=12.
    pub quarter_tones: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BendKind {
    Bend,
    BendRelease,
    Prebend,
    PrebendRelease,
}

impl BendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BendKind::Bend => "bend",
            BendKind::BendRelease => "bendRelease",
            BendKind::Prebend => "prebend",
            BendKind::PrebendRelease => "prebendRelease",
        }
    }

    pub fn all() -> &'static [BendKind] {
        &[
            BendKind::Bend,
            BendKind::BendRelease,
            BendKind::Prebend,
            BendKind::PrebendRelease,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_defaults_from_minimal_json() {
        let song = Song::from_json(r#"{"metadata": {"title": "Night Drive"}}"#).unwrap();
        assert_eq!(song.metadata.tempo, 120);
        assert_eq!(song.metadata.key_signature, "C");
        assert_eq!(song.metadata.time_signature, TimeSignature::new(4, 4));
        assert_eq!(song.metadata.version, "5.00");
        assert!(song.tracks.is_empty());
        assert!(!song.ready_for_export);
    }

    #[test]
    fn test_note_type_field() {
        let json = serde_json::to_value(Note::rest(Duration::eighth())).unwrap();
        assert_eq!(json["type"], "rest");
        assert_eq!(json["duration"]["denominator"], 8);
        assert!(json.get("string").is_none());

        let note: Note = serde_json::from_str(r#"{"string": 2, "fret": 3}"#).unwrap();
        assert_eq!(note.kind, NoteKind::Note);
        assert_eq!(note.velocity, DEFAULT_VELOCITY);
        assert_eq!(note.duration, Duration::quarter());
        assert!(note.effects.is_empty());
    }

    #[test]
    fn test_track_camel_case_fields() {
        let track = Track::drums("drums", "Drums");
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["isDrums"], true);
        assert!(json.get("tuning").is_none());

        let bass = Track::bass("bass", "Bass");
        assert_eq!(bass.strings(), Some(4));
        assert!(bass.is_bass());
        assert!(!Track::guitar("gtr", "Lead").is_bass());
    }

    #[test]
    fn test_effective_tuning_falls_back_to_guitar() {
        let mut track = Track::guitar("gtr", "Guitar");
        track.tuning = None;
        assert_eq!(track.effective_tuning(), &STANDARD_GUITAR_TUNING);
    }

    #[test]
    fn test_measure_count_helpers() {
        let mut song = Song {
            metadata: Metadata::default(),
            sections: Vec::new(),
            tracks: vec![Track::guitar("a", "A"), Track::bass("b", "B")],
            draft_text: String::new(),
            chords_by_section: None,
            ready_for_export: false,
        };
        song.tracks[0].measures.push(Measure::empty(0));
        assert_eq!(song.measure_counts(), vec![1, 0]);
        assert_eq!(song.max_measure_count(), 1);
        assert!(!song.has_equal_measure_counts());
    }
}
