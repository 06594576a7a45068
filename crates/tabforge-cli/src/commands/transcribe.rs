//! Transcribe command implementation
//!
//! Transcribes a MIDI file onto Guitar, Bass and Drums tracks and merges them
//! into a song.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use tabforge_backend_midi::transcribe::{merge_transcription, transcribe_bytes, TranscriptionStats};
use tabforge_spec::song::Song;
use tabforge_spec::validation::ensure_valid;

use super::reporting::{print_json, print_saved, save_song};
use crate::input::load_song_or_empty;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeOutput {
    stats: TranscriptionStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    tempo_bpm: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    written: Option<String>,
    song: Song,
}

/// Run the transcribe command
///
/// # Arguments
/// * `midi_path` - SMF file to transcribe
/// * `song_path` - Base song; supplies tunings and receives the tracks
/// * `out` - Where to write the merged song
/// * `json_output` - Print stats and the merged song as JSON
pub fn run(
    midi_path: &str,
    song_path: Option<&str>,
    out: Option<&str>,
    json_output: bool,
) -> Result<ExitCode> {
    let bytes =
        fs::read(midi_path).with_context(|| format!("Failed to read MIDI file: {}", midi_path))?;
    let base = load_song_or_empty(song_path.map(Path::new))?;

    let transcription = transcribe_bytes(&bytes, &base)
        .with_context(|| format!("Failed to transcribe MIDI file: {}", midi_path))?;
    let stats = transcription.stats;
    let tempo_bpm = transcription.tempo_bpm;
    let song = ensure_valid(merge_transcription(base, transcription))
        .context("Merged song failed validation")?;
    let written = save_song(out, &song)?;

    if json_output {
        print_json(&TranscribeOutput {
            stats,
            tempo_bpm,
            written,
            song,
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Transcribed:".cyan().bold(), midi_path);
    println!("  notes placed:   {}", stats.notes_placed);
    if stats.unmapped > 0 {
        println!(
            "  {} {} note(s) fell outside the fretboard and were placed at string 1 fret 0",
            "!".yellow(),
            stats.unmapped
        );
    }
    println!("  ignored events: {}", stats.ignored_events);
    if let Some(bpm) = tempo_bpm {
        println!("  tempo:          {} BPM", bpm);
    }
    println!(
        "  tracks:         {} ({} measure(s))",
        song.tracks.len(),
        song.max_measure_count()
    );
    print_saved(&written);
    Ok(ExitCode::SUCCESS)
}
