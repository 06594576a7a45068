//! Validate command implementation
//!
//! Validates a song file and reports every offending field path.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use tabforge_spec::hash::{canonical_song_hash, short_hash};

use super::reporting::{
    errors_json, print_json, print_violation, print_warnings, warnings_json, JsonIssue,
};
use crate::input::{load_song, InputError, LoadResult};

/// JSON output of `validate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateOutput {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    song_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_hash: Option<String>,
    errors: Vec<JsonIssue>,
    warnings: Vec<JsonIssue>,
}

/// Run the validate command
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(song_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(song_path)
    } else {
        run_human(song_path)
    }
}

fn run_human(song_path: &str) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), song_path);

    let LoadResult {
        song,
        warnings,
        source_hash,
    } = match load_song(Path::new(song_path)) {
        Ok(loaded) => loaded,
        Err(InputError::Invalid { violation }) => {
            print_violation(&violation);
            return Ok(ExitCode::from(1));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load song file: {}", song_path))
        }
    };

    let song_hash = canonical_song_hash(&song)?;
    println!(
        "{} {} (source {})",
        "Hash:".dimmed(),
        short_hash(&song_hash),
        short_hash(&source_hash)
    );
    print_warnings(&warnings);
    println!(
        "\n{} Song is valid: {} track(s), {} measure(s)",
        "SUCCESS".green().bold(),
        song.tracks.len(),
        song.max_measure_count()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_json(song_path: &str) -> Result<ExitCode> {
    let output = match load_song(Path::new(song_path)) {
        Ok(loaded) => ValidateOutput {
            success: true,
            song_hash: Some(canonical_song_hash(&loaded.song)?),
            source_hash: Some(loaded.source_hash),
            errors: Vec::new(),
            warnings: warnings_json(&loaded.warnings),
        },
        Err(InputError::Invalid { violation }) => ValidateOutput {
            success: false,
            song_hash: None,
            source_hash: None,
            errors: errors_json(&violation.errors),
            warnings: warnings_json(&violation.warnings),
        },
        Err(e @ InputError::FileRead { .. }) => ValidateOutput {
            success: false,
            song_hash: None,
            source_hash: None,
            errors: vec![JsonIssue {
                code: "CLI_001".to_string(),
                message: e.to_string(),
                path: None,
            }],
            warnings: Vec::new(),
        },
    };

    print_json(&output)?;
    if output.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
