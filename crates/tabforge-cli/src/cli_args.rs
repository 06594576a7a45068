//! CLI argument definitions for the tabforge command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{Parser, Subcommand};

/// tabforge - Conversational song building for guitar tablature
#[derive(Parser)]
#[command(name = "tabforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Show debug logs on stderr (overridden by TABFORGE_LOG / RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Validate a song file and report every offending field
    Validate {
        /// Path to the song JSON file
        #[arg(short, long)]
        song: String,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Show the completeness checklist and follow-up questions for a song
    Checklist {
        /// Path to the song JSON file
        #[arg(short, long)]
        song: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Apply one instruction to a song
    Turn {
        /// Current song (default: a new empty song)
        #[arg(short, long)]
        song: Option<String>,

        /// The instruction, e.g. "140 bpm in the key of D minor with drums"
        #[arg(short, long)]
        message: String,

        /// Where to write the next song (may equal --song)
        #[arg(short, long)]
        out: Option<String>,

        /// Agent service URL (overrides TABFORGE_AGENT_URL)
        #[arg(long)]
        agent_url: Option<String>,

        /// Agent model (overrides TABFORGE_AGENT_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Use the rule-based resolver only
        #[arg(long, conflicts_with = "agent_url")]
        no_agent: bool,

        /// Output the full turn outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Produce a progression MIDI file
    Midi {
        /// Tempo in BPM
        #[arg(long, default_value_t = 120)]
        tempo: u16,

        /// Key, e.g. "A" or "F# minor"
        #[arg(short, long, default_value = "C")]
        key: String,

        /// Number of measures
        #[arg(long, default_value_t = 8)]
        measures: u32,

        /// Output MIDI file
        #[arg(short, long)]
        out: String,

        /// MIDI source URL (overrides TABFORGE_MIDI_URL)
        #[arg(long)]
        midi_url: Option<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Transcribe a MIDI file into Guitar, Bass and Drums tracks
    Transcribe {
        /// MIDI file to transcribe
        #[arg(long)]
        midi: String,

        /// Base song supplying tunings (default: a new empty song)
        #[arg(short, long)]
        song: Option<String>,

        /// Where to write the merged song
        #[arg(short, long)]
        out: Option<String>,

        /// Output stats and the merged song as JSON
        #[arg(long)]
        json: bool,
    },

    /// Prepare a song for export and send it to the tablature writer
    Export {
        /// Path to the song JSON file
        #[arg(short, long)]
        song: String,

        /// Output file
        #[arg(short, long)]
        out: String,

        /// Write the prepared JSON document instead of calling the writer
        #[arg(long)]
        prepare_only: bool,

        /// Writer URL (overrides TABFORGE_WRITER_URL)
        #[arg(long)]
        writer_url: Option<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Fill a song out with bass, drums and a starter progression
    Compose {
        /// Song to complete (default: a new empty song)
        #[arg(short, long)]
        song: Option<String>,

        /// Where to write the completed song
        #[arg(short, long)]
        out: Option<String>,

        /// Output the completed song as JSON
        #[arg(long)]
        json: bool,
    },
}
