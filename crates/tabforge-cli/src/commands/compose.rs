//! Compose command implementation
//!
//! Fills a song out to a playable draft: bass and drums tracks, a starter
//! progression, chords by section and draft text.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use tabforge_spec::ops::ensure_musical_completeness;
use tabforge_spec::validation::ensure_valid;

use super::reporting::{print_json, print_saved, save_song};
use crate::input::load_song_or_empty;

/// Run the compose command
pub fn run(song_path: Option<&str>, out: Option<&str>, json_output: bool) -> Result<ExitCode> {
    let song = load_song_or_empty(song_path.map(Path::new))?;
    let song = ensure_valid(ensure_musical_completeness(song))
        .context("Completed song failed validation")?;
    let saved = save_song(out, &song)?;

    if json_output {
        print_json(&song)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Composed draft:".cyan().bold());
    for track in &song.tracks {
        println!(
            "  {} {} ({} measure(s))",
            "-".dimmed(),
            track.name,
            track.measures.len()
        );
    }
    if let Some(ref chords) = song.chords_by_section {
        for (section, names) in chords {
            println!("  {} {}: {}", "~".dimmed(), section, names.join(" "));
        }
    }
    print_saved(&saved);
    Ok(ExitCode::SUCCESS)
}
