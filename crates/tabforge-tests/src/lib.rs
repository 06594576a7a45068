//! tabforge Integration Test Infrastructure
//!
//! Cross-crate tests for the flows a conversation goes through:
//!
//! - Validation: arbitrary JSON to typed songs, with field paths on failure
//! - Turns: instructions through rules or a scripted agent
//! - Transcription: MIDI bytes to merged Guitar, Bass and Drums tracks
//! - Export: repair and validation before the writer
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tabforge-tests
//! ```

pub mod agents;
pub mod fixtures;
