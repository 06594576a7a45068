//! tabforge CLI - Command-line interface for conversational song building
//!
//! This binary provides commands for validating songs, applying
//! instructions, working with MIDI and preparing songs for export.

use clap::Parser;
use std::process::ExitCode;

use tabforge_backend_midi::generate::GenerateRequest;
use tabforge_cli::commands;
use tabforge_cli::config::ServiceConfig;
use tabforge_cli::logging;

mod cli_args;

use cli_args::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Commands::Validate { song, json } => commands::validate::run(&song, json),
        Commands::Checklist { song, json } => commands::checklist::run(&song, json),
        Commands::Turn {
            song,
            message,
            out,
            agent_url,
            model,
            no_agent,
            json,
        } => {
            let config = config.with_overrides(agent_url, model, no_agent);
            commands::turn::run(song.as_deref(), &message, out.as_deref(), &config, json)
        }
        Commands::Midi {
            tempo,
            key,
            measures,
            out,
            midi_url,
            json,
        } => {
            let mut config = config;
            if midi_url.is_some() {
                config.midi_url = midi_url;
            }
            let request = GenerateRequest {
                tempo,
                key,
                measures,
            };
            commands::midi::run(&request, &out, &config, json)
        }
        Commands::Transcribe {
            midi,
            song,
            out,
            json,
        } => commands::transcribe::run(&midi, song.as_deref(), out.as_deref(), json),
        Commands::Export {
            song,
            out,
            prepare_only,
            writer_url,
            json,
        } => {
            let mut config = config;
            if let Some(url) = writer_url {
                config.writer_url = url;
            }
            commands::export::run(&song, &out, prepare_only, &config, json)
        }
        Commands::Compose { song, out, json } => {
            commands::compose::run(song.as_deref(), out.as_deref(), json)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
