//! Pitch to string/fret mapping.

use serde::{Deserialize, Serialize};

/// Highest fret the mapper will place a note on.
pub const MAX_MAPPED_FRET: u8 = 24;

/// A position on a fretted instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FretPosition {
    /// String number, 1-based in tuning order.
    pub string: u8,
    pub fret: u8,
}

/// Outcome of mapping one pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// The pitch is playable at this position.
    Mapped(FretPosition),
    /// No string could play the pitch; the position is the string 1 / fret 0
    /// fallback.
    Unmapped(FretPosition),
}

impl Placement {
    /// The position to write, whether mapped or fallback.
    pub fn position(&self) -> FretPosition {
        match self {
            Placement::Mapped(pos) | Placement::Unmapped(pos) => *pos,
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Placement::Mapped(_))
    }
}

const FALLBACK: FretPosition = FretPosition { string: 1, fret: 0 };

/// Maps a MIDI pitch onto a tuning.
///
/// Strings are scanned in tuning order and every string whose fret
/// `pitch - open` lands in `0..=24` is a candidate; the last candidate wins,
/// so higher-indexed strings (lower frets) are preferred. With no candidate
/// the result is [`Placement::Unmapped`] at string 1, fret 0. Never fails.
///
/// # Example
/// ```
/// use tabforge_spec::fretboard::{locate, FretPosition, Placement};
///
/// let standard = [40, 45, 50, 55, 59, 64];
/// assert_eq!(locate(45, &standard), Placement::Mapped(FretPosition { string: 2, fret: 0 }));
/// assert!(!locate(127, &standard).is_mapped());
/// ```
pub fn locate(pitch: u8, tuning: &[u8]) -> Placement {
    let mut best = None;
    for (string, &open) in (1..=u8::MAX).zip(tuning) {
        if pitch < open {
            continue;
        }
        let fret = pitch - open;
        if fret <= MAX_MAPPED_FRET {
            best = Some(FretPosition { string, fret });
        }
    }
    match best {
        Some(pos) => Placement::Mapped(pos),
        None => Placement::Unmapped(FALLBACK),
    }
}

/// Maps a MIDI pitch onto a tuning, discarding whether the fallback was taken.
pub fn map_pitch(pitch: u8, tuning: &[u8]) -> FretPosition {
    locate(pitch, tuning).position()
}

/// Sounding pitch of a position on a tuning, if the string exists.
pub fn pitch_at(position: FretPosition, tuning: &[u8]) -> Option<u8> {
    let open = *tuning.get(usize::from(position.string).checked_sub(1)?)?;
    open.checked_add(position.fret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::{STANDARD_BASS_TUNING, STANDARD_GUITAR_TUNING};

    #[test]
    fn test_open_string_match() {
        assert_eq!(
            locate(45, &STANDARD_GUITAR_TUNING),
            Placement::Mapped(FretPosition { string: 2, fret: 0 })
        );
    }

    #[test]
    fn test_too_high_falls_back() {
        let placement = locate(127, &STANDARD_GUITAR_TUNING);
        assert_eq!(placement, Placement::Unmapped(FretPosition { string: 1, fret: 0 }));
        assert_eq!(map_pitch(127, &STANDARD_GUITAR_TUNING), FretPosition { string: 1, fret: 0 });
    }

    #[test]
    fn test_too_low_falls_back() {
        assert!(!locate(20, &STANDARD_GUITAR_TUNING).is_mapped());
        assert!(!locate(60, &[]).is_mapped());
    }

    #[test]
    fn test_last_candidate_wins() {
        // E4 (64) is playable on every string; the highest string wins.
        assert_eq!(
            map_pitch(64, &STANDARD_GUITAR_TUNING),
            FretPosition { string: 6, fret: 0 }
        );
        // 62 misses string 6 (below open) so string 5 fret 3 wins.
        assert_eq!(
            map_pitch(62, &STANDARD_GUITAR_TUNING),
            FretPosition { string: 5, fret: 3 }
        );
        // 28 is only on bass string 1.
        assert_eq!(
            map_pitch(28, &STANDARD_BASS_TUNING),
            FretPosition { string: 1, fret: 0 }
        );
    }

    #[test]
    fn test_fret_24_is_the_limit() {
        assert_eq!(
            locate(88, &STANDARD_GUITAR_TUNING),
            Placement::Mapped(FretPosition { string: 6, fret: 24 })
        );
        assert!(!locate(89, &STANDARD_GUITAR_TUNING).is_mapped());
    }

    #[test]
    fn test_pitch_at_inverts_mapping() {
        for pitch in 40..=88u8 {
            let pos = map_pitch(pitch, &STANDARD_GUITAR_TUNING);
            assert_eq!(pitch_at(pos, &STANDARD_GUITAR_TUNING), Some(pitch));
        }
        assert_eq!(pitch_at(FretPosition { string: 7, fret: 0 }, &STANDARD_GUITAR_TUNING), None);
    }
}
