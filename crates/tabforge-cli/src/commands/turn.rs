//! Turn command implementation
//!
//! Applies one conversational instruction to a song file.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use tabforge_chat::agent::{HttpAgent, SongAgent};
use tabforge_chat::turn::{run_turn, TurnOutcome, TurnSource};
use tabforge_spec::hash::short_hash;

use super::reporting::{print_json, print_saved, save_song};
use crate::config::ServiceConfig;
use crate::input::load_song_or_empty;

/// Run the turn command
///
/// # Arguments
/// * `song_path` - Current song; an empty song when absent
/// * `message` - The user's instruction
/// * `out` - Where to write the next song
/// * `config` - Service endpoints; no agent URL means rules only
/// * `json_output` - Print the full turn outcome as JSON
pub fn run(
    song_path: Option<&str>,
    message: &str,
    out: Option<&str>,
    config: &ServiceConfig,
    json_output: bool,
) -> Result<ExitCode> {
    let song = load_song_or_empty(song_path.map(Path::new))?;

    let agent = config
        .agent_url
        .as_deref()
        .map(|url| HttpAgent::new(url, config.agent_model.as_str(), config.timeout));
    let outcome = run_turn(
        &song,
        message,
        agent.as_ref().map(|a| a as &dyn SongAgent),
    )
    .context("Turn produced an invalid song")?;

    let saved = save_song(out, &outcome.song)?;

    if json_output {
        print_json(&outcome)?;
    } else {
        print_outcome(&outcome);
        print_saved(&saved);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_outcome(outcome: &TurnOutcome) {
    if let Some(ref notice) = outcome.notice {
        println!("{} {}", "!".yellow(), notice.yellow());
    }
    println!("{}", outcome.reply);
    if !outcome.follow_ups.is_empty() {
        println!("\n{}", "Follow-ups:".cyan().bold());
        for question in &outcome.follow_ups {
            println!("  - {}", question);
        }
    }
    for warning in &outcome.warnings {
        println!("  {} {}", "!".yellow(), warning.dimmed());
    }

    let source = match outcome.source {
        TurnSource::Agent => "agent".green(),
        TurnSource::RepairedAgent => "agent (repaired)".yellow(),
        TurnSource::Rules => "rules".normal(),
    };
    println!(
        "\n{} {}  {} {}",
        "Source:".dimmed(),
        source,
        "Snapshot:".dimmed(),
        short_hash(&outcome.snapshot_hash)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::load_song;

    #[test]
    fn turn_without_agent_writes_next_song() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("next.json");
        let out_str = out.to_str().unwrap();

        let code = run(
            None,
            "140 bpm in the key of D minor with guitar and drums",
            Some(out_str),
            &ServiceConfig::default(),
            false,
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let song = load_song(&out).unwrap().song;
        assert_eq!(song.metadata.tempo, 140);
        assert_eq!(song.tracks.len(), 2);

        // Second turn continues from the written snapshot.
        run(Some(out_str), r#"call it "Ash""#, Some(out_str), &ServiceConfig::default(), true)
            .unwrap();
        let song = load_song(&out).unwrap().song;
        assert_eq!(song.metadata.title, "Ash");
        assert_eq!(song.metadata.key_signature, "D minor");
    }

    #[test]
    fn turn_with_unreachable_agent_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("next.json");
        let config = ServiceConfig {
            agent_url: Some("http://127.0.0.1:9".to_string()),
            timeout: std::time::Duration::from_secs(2),
            ..ServiceConfig::default()
        };
        run(None, "add bass", Some(out.to_str().unwrap()), &config, true).unwrap();
        let song = load_song(&out).unwrap().song;
        assert!(song.has_bass());
    }
}
