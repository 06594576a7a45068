//! Intent extractors.
//!
//! Each extractor is an independent function over the instruction text that
//! returns an optional match. New intents get a new function; existing ones
//! are not touched.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const TEMPO_PATTERN: &str = r"(?i)\b(\d{2,3})\s*bpm\b";
const KEY_PATTERN: &str = r"(?i)\bkey of ([a-g])([#b])?(?:\s*(major|minor|min|m)\b)?";
const TITLE_PATTERN: &str = r#"["“]([^"”]+)["”]"#;
const EXPORT_PATTERN: &str =
    r"(?i)\b(generate|export|create|make|build|render)\b.*\b(gp5|guitar\s*pro|file|tab)\b";
const BASS_GUITAR_PATTERN: &str = r"(?i)\bbass\s+guitars?\b";
const GUITAR_PATTERN: &str = r"(?i)\bguitars?\b";
const BASS_PATTERN: &str = r"(?i)\bbass\b";
const DRUMS_PATTERN: &str = r"(?i)\b(drums?|drum\s*kit|percussion)\b";

static TEMPO_REGEX: OnceLock<Regex> = OnceLock::new();
static KEY_REGEX: OnceLock<Regex> = OnceLock::new();
static TITLE_REGEX: OnceLock<Regex> = OnceLock::new();
static EXPORT_REGEX: OnceLock<Regex> = OnceLock::new();
static BASS_GUITAR_REGEX: OnceLock<Regex> = OnceLock::new();
static GUITAR_REGEX: OnceLock<Regex> = OnceLock::new();
static BASS_REGEX: OnceLock<Regex> = OnceLock::new();
static DRUMS_REGEX: OnceLock<Regex> = OnceLock::new();

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("invalid regex pattern"))
}

/// Instruments the rules know how to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Guitar,
    Bass,
    Drums,
}

impl Instrument {
    pub fn label(&self) -> &'static str {
        match self {
            Instrument::Guitar => "Guitar",
            Instrument::Bass => "Bass",
            Instrument::Drums => "Drums",
        }
    }

    /// Default track id for a new track of this instrument.
    pub fn track_id(&self) -> &'static str {
        match self {
            Instrument::Guitar => "guitar",
            Instrument::Bass => "bass",
            Instrument::Drums => "drums",
        }
    }
}

/// Tempo in BPM from "<NN> bpm". Bounds are not checked here.
pub fn extract_tempo(text: &str) -> Option<u32> {
    cached(&TEMPO_REGEX, TEMPO_PATTERN)
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Key from "key of <X> [major|minor|min|m]", normalized to e.g. "D minor"
/// or "Bb". "Am" and "F#m" read as minor.
pub fn extract_key(text: &str) -> Option<String> {
    let caps = cached(&KEY_REGEX, KEY_PATTERN).captures(text)?;
    let mut key = caps.get(1)?.as_str().to_ascii_uppercase();
    if let Some(acc) = caps.get(2) {
        key.push_str(&acc.as_str().to_ascii_lowercase());
    }
    if let Some(mode) = caps.get(3) {
        if !mode.as_str().eq_ignore_ascii_case("major") {
            key.push_str(" minor");
        }
    }
    Some(key)
}

/// First quoted string, trimmed; blank quotes are ignored.
pub fn extract_title(text: &str) -> Option<String> {
    cached(&TITLE_REGEX, TITLE_PATTERN)
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Instruments mentioned, in Guitar, Bass, Drums order.
///
/// "bass guitar" counts as bass only.
pub fn extract_instruments(text: &str) -> Vec<Instrument> {
    let without_bass_guitar = cached(&BASS_GUITAR_REGEX, BASS_GUITAR_PATTERN).replace_all(text, "bass");
    let mut found = Vec::new();
    if cached(&GUITAR_REGEX, GUITAR_PATTERN).is_match(&without_bass_guitar) {
        found.push(Instrument::Guitar);
    }
    if cached(&BASS_REGEX, BASS_PATTERN).is_match(&without_bass_guitar) {
        found.push(Instrument::Bass);
    }
    if cached(&DRUMS_REGEX, DRUMS_PATTERN).is_match(&without_bass_guitar) {
        found.push(Instrument::Drums);
    }
    found
}

/// True if the text asks to generate or export a file.
pub fn has_export_intent(text: &str) -> bool {
    cached(&EXPORT_REGEX, EXPORT_PATTERN).is_match(text)
}

/// All extractor results for one instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub tempo: Option<u32>,
    pub key: Option<String>,
    pub title: Option<String>,
    pub instruments: Vec<Instrument>,
    pub export: bool,
}

impl Extraction {
    /// Runs every extractor over `text`.
    pub fn from_instruction(text: &str) -> Self {
        Self {
            tempo: extract_tempo(text),
            key: extract_key(text),
            title: extract_title(text),
            instruments: extract_instruments(text),
            export: has_export_intent(text),
        }
    }

    /// True if no extractor matched.
    pub fn is_empty(&self) -> bool {
        *self == Extraction::default()
    }
}
