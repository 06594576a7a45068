//! Conversational update resolver for tabforge songs.
//!
//! Turns a free-text instruction into the next song snapshot, a reply and
//! follow-up questions. A generative agent may propose the next song; its
//! proposal is validated, repaired once, and otherwise replaced by the
//! deterministic rules in [`resolver`].
//!
//! # Example
//!
//! ```
//! use tabforge_chat::turn::{run_turn, TurnSource};
//! use tabforge_spec::ops::empty_song;
//!
//! let outcome = run_turn(&empty_song(), "90 bpm in the key of A minor with drums", None).unwrap();
//! assert_eq!(outcome.source, TurnSource::Rules);
//! assert_eq!(outcome.song.metadata.tempo, 90);
//! assert_eq!(outcome.song.metadata.key_signature, "A minor");
//! assert!(outcome.song.has_drums());
//! ```

pub mod agent;
pub mod checklist;
pub mod extract;
pub mod prompt;
pub mod resolver;
pub mod turn;

pub use agent::{AgentError, AgentRequest, AgentResponse, HttpAgent, SongAgent};
pub use checklist::{Checklist, ChecklistItem};
pub use extract::{Extraction, Instrument};
pub use resolver::{resolve_with_rules, RuleOutcome};
pub use turn::{run_turn, TurnOutcome, TurnSource};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
