//! MIDI command implementation
//!
//! Produces a progression MIDI file, from the configured MIDI source or the
//! local generator.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::warn;

use tabforge_backend_midi::generate::{generate_midi, GenerateRequest};
use tabforge_spec::error::BackendError;
use tabforge_spec::hash::short_hash;

use super::reporting::print_json;
use crate::config::ServiceConfig;
use crate::input::write_bytes;
use crate::services::MidiSourceClient;

/// Where the MIDI bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MidiOrigin {
    Service,
    Local,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MidiOutput {
    path: String,
    origin: MidiOrigin,
    bytes: usize,
    hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

/// Fetches MIDI for `request`, falling back to the local generator when the
/// service is unset or fails.
pub fn fetch_midi(
    request: &GenerateRequest,
    config: &ServiceConfig,
) -> Result<(Vec<u8>, MidiOrigin, Option<String>)> {
    let mut notice = None;
    if let Some(ref url) = config.midi_url {
        match MidiSourceClient::new(url, config.timeout).generate(request) {
            Ok(bytes) => return Ok((bytes, MidiOrigin::Service, None)),
            Err(e) => {
                warn!(code = e.code(), error = %e, "MIDI source failed, using local generator");
                notice = Some(format!("MIDI source failed ({}), used the local generator", e));
            }
        }
    }
    let generated = generate_midi(request).context("Failed to generate MIDI")?;
    Ok((generated.data, MidiOrigin::Local, notice))
}

/// Run the midi command
pub fn run(
    request: &GenerateRequest,
    out: &str,
    config: &ServiceConfig,
    json_output: bool,
) -> Result<ExitCode> {
    let (bytes, origin, notice) = fetch_midi(request, config)?;
    write_bytes(Path::new(out), &bytes)?;
    let hash = blake3::hash(&bytes).to_hex().to_string();

    if json_output {
        print_json(&MidiOutput {
            path: out.to_string(),
            origin,
            bytes: bytes.len(),
            hash,
            notice,
        })?;
    } else {
        if let Some(notice) = notice {
            println!("{} {}", "!".yellow(), notice.yellow());
        }
        println!(
            "{} {} BPM, key {}, {} measure(s)",
            "MIDI:".cyan().bold(),
            request.tempo,
            request.key,
            request.measures.max(1)
        );
        println!(
            "{} {} ({} bytes, {})",
            "Written:".green().bold(),
            out,
            bytes.len(),
            short_hash(&hash)
        );
    }
    Ok(ExitCode::SUCCESS)
}
