//! Export command implementation
//!
//! Repairs and validates a song, then hands it to the tablature writer or
//! writes the prepared document.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use tabforge_spec::export::{prepare_for_export, ExportDocument};
use tabforge_spec::hash::{canonical_song_hash, short_hash};

use super::reporting::{errors_json, print_json, print_violation, JsonIssue};
use crate::config::ServiceConfig;
use crate::input::{load_song, write_bytes};
use crate::services::WriterClient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportOutput {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    song_hash: Option<String>,
    errors: Vec<JsonIssue>,
}

/// Run the export command
///
/// # Arguments
/// * `song_path` - Song to export
/// * `out` - Output file (tablature bytes, or the prepared JSON document)
/// * `prepare_only` - Write the prepared document instead of calling the writer
/// * `config` - Writer endpoint and timeout
/// * `json_output` - Machine-readable output
///
/// # Returns
/// Exit code: 0 on success, 1 if the song cannot be made valid
pub fn run(
    song_path: &str,
    out: &str,
    prepare_only: bool,
    config: &ServiceConfig,
    json_output: bool,
) -> Result<ExitCode> {
    let loaded = load_song(Path::new(song_path))
        .with_context(|| format!("Failed to load song file: {}", song_path))?;

    let document = match prepare_for_export(loaded.song) {
        Ok(document) => document,
        Err(violation) => {
            if json_output {
                print_json(&ExportOutput {
                    success: false,
                    path: None,
                    bytes: None,
                    song_hash: None,
                    errors: errors_json(&violation.errors),
                })?;
            } else {
                print_violation(&violation);
            }
            return Ok(ExitCode::from(1));
        }
    };

    let bytes = if prepare_only {
        prepared_json(&document)?
    } else {
        WriterClient::new(&config.writer_url, config.timeout)
            .write(&document.song)
            .context("Tablature writer failed")?
    };
    write_bytes(Path::new(out), &bytes)?;
    let song_hash = canonical_song_hash(&document.song)?;

    if json_output {
        print_json(&ExportOutput {
            success: true,
            path: Some(out.to_string()),
            bytes: Some(bytes.len()),
            song_hash: Some(song_hash),
            errors: Vec::new(),
        })?;
    } else {
        println!(
            "{} {} track(s), {} measure(s), snapshot {}",
            "Prepared:".cyan().bold(),
            document.song.tracks.len(),
            document.headers.len(),
            short_hash(&song_hash)
        );
        println!(
            "{} {} ({} bytes)",
            "Written:".green().bold(),
            out,
            bytes.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn prepared_json(document: &ExportDocument) -> Result<Vec<u8>> {
    let mut json =
        serde_json::to_vec_pretty(document).context("Failed to serialize export document")?;
    json.push(b'\n');
    Ok(json)
}
