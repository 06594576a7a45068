//! tabforge MIDI Backend
//!
//! Two directions between Standard MIDI Files and the song model:
//!
//! - [`transcribe`]: decoded SMF events to Guitar, Bass and Drums tracks, with
//!   pitches placed on the fretboard. The transcription is lossy and
//!   best-effort: every note becomes a quarter note in a new beat at the
//!   beat it starts on, and note lengths are discarded.
//! - [`generate`]: a small deterministic progression generator used when no
//!   external MIDI source is configured.
//!
//! # Example
//!
//! ```
//! use tabforge_backend_midi::generate::{generate_midi, GenerateRequest};
//! use tabforge_backend_midi::transcribe::{merge_transcription, transcribe_bytes};
//! use tabforge_spec::ops::empty_song;
//!
//! let midi = generate_midi(&GenerateRequest { tempo: 100, key: "A".into(), measures: 2 }).unwrap();
//! let base = empty_song();
//! let transcription = transcribe_bytes(&midi.data, &base).unwrap();
//! let song = merge_transcription(base, transcription);
//! assert_eq!(song.metadata.tempo, 100);
//! assert_eq!(song.tracks.len(), 3);
//! ```

pub mod generate;
pub mod transcribe;

pub use generate::{generate_midi, GenerateError, GenerateRequest, GenerateResult};
pub use transcribe::{
    merge_transcription, transcribe_bytes, transcribe_smf, TranscribeError, Transcription,
    TranscriptionStats,
};

/// Crate version for backend identification.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend identifier.
pub const BACKEND_ID: &str = "tabforge-backend-midi";
