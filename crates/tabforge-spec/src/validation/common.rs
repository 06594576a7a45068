//! Field bounds and range checks shared by both validation passes.

use std::fmt;

pub const TEMPO_MIN: i64 = 30;
pub const TEMPO_MAX: i64 = 300;
pub const TIME_SIG_BEATS_MIN: i64 = 1;
pub const TIME_SIG_BEATS_MAX: i64 = 32;
/// Allowed time-signature beat types.
pub const BEAT_TYPES: &[i64] = &[1, 2, 4, 8, 16, 32];
pub const STRING_COUNT_MIN: i64 = 1;
pub const STRING_COUNT_MAX: i64 = 12;
pub const MIDI_MAX: i64 = 127;
pub const CAPO_MAX: i64 = 24;
pub const BEAT_START_MAX: i64 = 63;
pub const FRET_MAX: i64 = 36;
pub const VELOCITY_MIN: i64 = 1;
pub const DURATION_NUMERATOR_MIN: i64 = 1;
pub const DURATION_NUMERATOR_MAX: i64 = 64;
/// Allowed duration denominators.
pub const DURATION_DENOMINATORS: &[i64] = &[1, 2, 4, 8, 16, 32, 64];
pub const TUPLET_MIN: i64 = 1;
pub const TUPLET_MAX: i64 = 16;
pub const BEND_QUARTER_TONES_MIN: i64 = 1;
pub const BEND_QUARTER_TONES_MAX: i64 = 12;

/// Error type for a failed range or set check.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeError {
    pub message: String,
}

impl RangeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RangeError {}

/// Validate that an integer lies in `[min, max]`.
///
/// # Example
/// ```
/// use tabforge_spec::validation::common::validate_range;
///
/// assert!(validate_range("tempo", 140, 30, 300).is_ok());
/// assert!(validate_range("tempo", 301, 30, 300).is_err());
/// ```
pub fn validate_range(name: &str, value: i64, min: i64, max: i64) -> Result<(), RangeError> {
    if value < min || value > max {
        return Err(RangeError::new(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

/// Validate that an integer is one of `allowed`.
pub fn validate_one_of(name: &str, value: i64, allowed: &[i64]) -> Result<(), RangeError> {
    if !allowed.contains(&value) {
        let list = allowed
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(RangeError::new(format!(
            "{} must be one of [{}], got {}",
            name, list, value
        )));
    }
    Ok(())
}

/// Validate that a tuning has one pitch per string, within the string-count bounds.
pub fn validate_tuning_length(len: usize) -> Result<(), RangeError> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    validate_range("tuning length", len, STRING_COUNT_MIN, STRING_COUNT_MAX)
}
