use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use tabforge_spec::error::{SchemaViolation, ValidationError, ValidationWarning};
use tabforge_spec::song::Song;

use crate::input::write_song;

/// A validation finding in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub(crate) struct JsonIssue {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl From<&ValidationError> for JsonIssue {
    fn from(error: &ValidationError) -> Self {
        Self {
            code: error.code.to_string(),
            message: error.message.clone(),
            path: error.path.clone(),
        }
    }
}

impl From<&ValidationWarning> for JsonIssue {
    fn from(warning: &ValidationWarning) -> Self {
        Self {
            code: warning.code.to_string(),
            message: warning.message.clone(),
            path: warning.path.clone(),
        }
    }
}

pub(crate) fn errors_json(errors: &[ValidationError]) -> Vec<JsonIssue> {
    errors.iter().map(JsonIssue::from).collect()
}

pub(crate) fn warnings_json(warnings: &[ValidationWarning]) -> Vec<JsonIssue> {
    warnings.iter().map(JsonIssue::from).collect()
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

pub(crate) fn print_errors(errors: &[ValidationError]) {
    if errors.is_empty() {
        return;
    }
    println!("\n{}", "Errors:".red().bold());
    for error in errors {
        let path_info = error
            .path
            .as_ref()
            .map(|p| format!(" at {}", p))
            .unwrap_or_default();
        println!(
            "  {} [{}]{}: {}",
            "x".red(),
            error.code.to_string().red(),
            path_info.dimmed(),
            error.message
        );
    }
}

pub(crate) fn print_warnings(warnings: &[ValidationWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n{}", "Warnings:".yellow().bold());
    for warning in warnings {
        let path_info = warning
            .path
            .as_ref()
            .map(|p| format!(" at {}", p))
            .unwrap_or_default();
        println!(
            "  {} [{}]{}: {}",
            "!".yellow(),
            warning.code.to_string().yellow(),
            path_info.dimmed(),
            warning.message
        );
    }
}

pub(crate) fn print_violation(violation: &SchemaViolation) {
    print_errors(&violation.errors);
    print_warnings(&violation.warnings);
    println!(
        "\n{} Song has {} error(s)",
        "FAILED".red().bold(),
        violation.errors.len()
    );
}

/// Writes `song` to `out` when given; returns the written path.
pub(crate) fn save_song(out: Option<&str>, song: &Song) -> Result<Option<String>> {
    match out {
        Some(path) => {
            write_song(Path::new(path), song)?;
            Ok(Some(path.to_string()))
        }
        None => Ok(None),
    }
}

pub(crate) fn print_saved(saved: &Option<String>) {
    match saved {
        Some(path) => println!("{} {}", "Song written to:".dimmed(), path),
        None => println!("{}", "Song not written (pass --out to save it)".dimmed()),
    }
}
