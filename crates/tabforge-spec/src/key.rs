//! Key-signature parsing and key-relative chord names.

use serde::{Deserialize, Serialize};

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Major or minor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

/// A parsed key signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignature {
    /// Tonic spelled as written, e.g. "Bb" or "F#".
    pub tonic: String,
    /// Tonic pitch class, 0 = C.
    pub pitch_class: u8,
    pub mode: Mode,
}

impl KeySignature {
    /// Key name in the document's spelling, e.g. "D minor" or "C".
    pub fn name(&self) -> String {
        match self.mode {
            Mode::Major => self.tonic.clone(),
            Mode::Minor => format!("{} minor", self.tonic),
        }
    }

    fn prefers_flats(&self) -> bool {
        if self.tonic.ends_with('b') {
            return true;
        }
        match self.mode {
            Mode::Major => self.tonic == "F",
            Mode::Minor => matches!(self.tonic.as_str(), "D" | "G" | "C" | "F"),
        }
    }

    fn note_name(&self, semitones_above_tonic: u8) -> &'static str {
        let pc = usize::from((self.pitch_class + semitones_above_tonic) % 12);
        if self.prefers_flats() {
            FLAT_NAMES[pc]
        } else {
            SHARP_NAMES[pc]
        }
    }

    /// Four-chord progression in this key.
    ///
    /// Major keys use I-V-vi-IV, minor keys i-VI-III-VII.
    pub fn progression_chords(&self) -> Vec<String> {
        let degrees: [(u8, bool); 4] = match self.mode {
            Mode::Major => [(0, false), (7, false), (9, true), (5, false)],
            Mode::Minor => [(0, true), (8, false), (3, false), (10, false)],
        };
        degrees
            .iter()
            .map(|&(offset, minor)| {
                let root = self.note_name(offset);
                if minor {
                    format!("{}m", root)
                } else {
                    root.to_string()
                }
            })
            .collect()
    }
}

impl std::fmt::Display for KeySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parses a key signature string.
///
/// Accepts forms like "C", "Bb", "F# minor", "key of D minor", "Am" and
/// "E major". Returns `None` for anything else.
///
/// # Example
/// ```
/// use tabforge_spec::key::{parse_key, Mode};
///
/// let key = parse_key("key of D minor").unwrap();
/// assert_eq!(key.tonic, "D");
/// assert_eq!(key.mode, Mode::Minor);
/// assert!(parse_key("H").is_none());
/// ```
pub fn parse_key(input: &str) -> Option<KeySignature> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    let body = if lower.starts_with("key of") {
        trimmed["key of".len()..].trim_start()
    } else {
        trimmed
    };

    let mut chars = body.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let natural: u8 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (accidental, rest) = match rest.chars().next() {
        Some('#') => (Some('#'), &rest[1..]),
        Some('b') => (Some('b'), &rest[1..]),
        _ => (None, rest),
    };

    let mode = match rest.trim().to_ascii_lowercase().as_str() {
        "" | "major" | "maj" => Mode::Major,
        "minor" | "min" | "m" => Mode::Minor,
        _ => return None,
    };

    let pitch_class = match accidental {
        Some('#') => (natural + 1) % 12,
        Some(_) => (natural + 11) % 12,
        None => natural,
    };

    let mut tonic = letter.to_string();
    if let Some(acc) = accidental {
        tonic.push(acc);
    }

    Some(KeySignature {
        tonic,
        pitch_class,
        mode,
    })
}
