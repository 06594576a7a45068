//! Checklist command implementation
//!
//! Shows which completeness items a song satisfies and the follow-up
//! questions for the rest.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use tabforge_chat::checklist::{Checklist, ChecklistItem};

use super::reporting::print_json;
use crate::input::load_song;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChecklistOutput {
    complete: bool,
    satisfied: Vec<ChecklistItem>,
    missing: Vec<ChecklistItem>,
    follow_ups: Vec<String>,
}

/// Run the checklist command
///
/// # Returns
/// Exit code: 0 if every item is satisfied, 2 otherwise
pub fn run(song_path: &str, json_output: bool) -> Result<ExitCode> {
    let loaded = load_song(Path::new(song_path))
        .with_context(|| format!("Failed to load song file: {}", song_path))?;
    let checklist = Checklist::evaluate(&loaded.song);

    if json_output {
        print_json(&ChecklistOutput {
            complete: checklist.is_complete(),
            satisfied: checklist.satisfied.clone(),
            missing: checklist.missing.clone(),
            follow_ups: checklist.follow_ups(),
        })?;
    } else {
        println!("{} {}", "Checklist:".cyan().bold(), song_path);
        for item in ChecklistItem::all() {
            if checklist.satisfied.contains(item) {
                println!("  {} {}", "✓".green(), item.label());
            } else {
                println!("  {} {}", "x".red(), item.label().dimmed());
            }
        }
        if !checklist.is_complete() {
            println!("\n{}", "Follow-ups:".yellow().bold());
            for question in checklist.follow_ups() {
                println!("  - {}", question);
            }
        }
    }

    if checklist.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::write_song;
    use tabforge_spec::ops::{empty_song, ensure_minimum_song};

    #[test]
    fn checklist_incomplete_and_complete() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("song.json");

        write_song(&path, &empty_song()).unwrap();
        let path_str = path.to_str().unwrap();
        assert_eq!(run(path_str, false).unwrap(), ExitCode::from(2));

        let mut song = ensure_minimum_song(empty_song());
        song.metadata.title = "Whole".to_string();
        write_song(&path, &song).unwrap();
        assert_eq!(run(path_str, true).unwrap(), ExitCode::SUCCESS);
    }
}
