//! One conversational turn.
//!
//! A turn asks the agent (if any) for a proposal, gates it through the
//! validator, retries once with the violations embedded, and otherwise falls
//! back to the rule-based resolver. Every path ends in a validated song.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tabforge_spec::error::{BackendError, SongError};
use tabforge_spec::hash::canonical_song_hash;
use tabforge_spec::song::Song;
use tabforge_spec::validation::{parse_song_value, validate_song, ValidatedSong};

use crate::agent::{AgentError, AgentRequest, AgentResponse, SongAgent};
use crate::checklist::Checklist;
use crate::extract::has_export_intent;
use crate::resolver::resolve_with_rules;

/// Notice shown when the agent could not be reached.
pub const UNAVAILABLE_NOTICE: &str =
    "The song assistant is unavailable right now, so I applied the basic rules instead.";

/// Notice shown when the agent's proposals failed validation twice.
pub const REJECTED_NOTICE: &str =
    "The song assistant's proposal did not pass validation, so I applied the basic rules instead.";

const DEFAULT_AGENT_REPLY: &str = "Updated the song.";

/// Where the accepted song of a turn came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnSource {
    /// First agent proposal passed validation.
    Agent,
    /// Agent proposal passed validation after the repair call.
    RepairedAgent,
    /// Deterministic rules.
    Rules,
}

impl TurnSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnSource::Agent => "agent",
            TurnSource::RepairedAgent => "repairedAgent",
            TurnSource::Rules => "rules",
        }
    }
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub song: Song,
    pub reply: String,
    pub follow_ups: Vec<String>,
    pub source: TurnSource,
    /// Soft notice when the agent path was abandoned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Canonical hash of `song`.
    pub snapshot_hash: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

enum AttemptFailure {
    /// The agent answered with something the validator rejected.
    Rejected(Vec<String>),
    /// The agent could not be used at all.
    Unavailable(AgentError),
}

fn attempt(
    agent: &dyn SongAgent,
    request: &AgentRequest<'_>,
) -> Result<(AgentResponse, ValidatedSong), AttemptFailure> {
    let response = match agent.propose(request) {
        Ok(response) => response,
        Err(err) if err.is_content_error() => {
            return Err(AttemptFailure::Rejected(vec![err.to_string()]))
        }
        Err(err) => return Err(AttemptFailure::Unavailable(err)),
    };
    match parse_song_value(&response.song) {
        Ok(validated) => Ok((response, validated)),
        Err(violation) => Err(AttemptFailure::Rejected(
            violation.errors.iter().map(|e| e.to_string()).collect(),
        )),
    }
}

/// Runs the agent path; `Err` carries the notice for the fallback.
fn run_agent(
    agent: &dyn SongAgent,
    song: &Song,
    instruction: &str,
) -> Result<(AgentResponse, ValidatedSong, TurnSource), &'static str> {
    let request = AgentRequest::new(song, instruction);
    let violations = match attempt(agent, &request) {
        Ok((response, validated)) => return Ok((response, validated, TurnSource::Agent)),
        Err(AttemptFailure::Unavailable(err)) => {
            warn!(code = err.code(), error = %err, "agent unavailable");
            return Err(UNAVAILABLE_NOTICE);
        }
        Err(AttemptFailure::Rejected(violations)) => violations,
    };

    warn!(
        violations = violations.len(),
        "agent proposal rejected, requesting repair"
    );
    match attempt(agent, &request.repair(violations)) {
        Ok((response, validated)) => Ok((response, validated, TurnSource::RepairedAgent)),
        Err(AttemptFailure::Unavailable(err)) => {
            warn!(code = err.code(), error = %err, "agent unavailable during repair");
            Err(UNAVAILABLE_NOTICE)
        }
        Err(AttemptFailure::Rejected(violations)) => {
            warn!(
                violations = violations.len(),
                "repaired proposal rejected"
            );
            Err(REJECTED_NOTICE)
        }
    }
}

/// Runs one turn over `song`.
///
/// `readyForExport` of the result is the export intent of `instruction` OR
/// the prior value, whichever path produced the song. Fails only if the
/// resulting song cannot be validated, which happens when `song` itself was
/// invalid and the rules could not repair it.
pub fn run_turn(
    song: &Song,
    instruction: &str,
    agent: Option<&dyn SongAgent>,
) -> Result<TurnOutcome, SongError> {
    let ready = song.ready_for_export || has_export_intent(instruction);

    let agent_result = match agent {
        Some(agent) => Some(run_agent(agent, song, instruction)),
        None => None,
    };

    let outcome = match agent_result {
        Some(Ok((response, validated, source))) => {
            let mut next = validated.song;
            next.ready_for_export = ready;
            let follow_ups = if response.follow_ups.is_empty() {
                Checklist::evaluate(&next).follow_ups()
            } else {
                response.follow_ups
            };
            let reply = if response.reply.trim().is_empty() {
                DEFAULT_AGENT_REPLY.to_string()
            } else {
                response.reply
            };
            TurnOutcome {
                snapshot_hash: canonical_song_hash(&next)?,
                song: next,
                reply,
                follow_ups,
                source,
                notice: None,
                warnings: validated.warnings.iter().map(|w| w.to_string()).collect(),
            }
        }
        fallback => {
            let notice = match fallback {
                Some(Err(notice)) => Some(notice.to_string()),
                _ => None,
            };
            let rules = resolve_with_rules(song.clone(), instruction);
            let mut next = rules.song;
            next.ready_for_export = ready;
            let warnings = validate_song(&next).into_result()?;
            TurnOutcome {
                snapshot_hash: canonical_song_hash(&next)?,
                song: next,
                reply: rules.reply,
                follow_ups: rules.follow_ups,
                source: TurnSource::Rules,
                notice,
                warnings: warnings.iter().map(|w| w.to_string()).collect(),
            }
        }
    };

    info!(
        source = outcome.source.as_str(),
        tracks = outcome.song.tracks.len(),
        follow_ups = outcome.follow_ups.len(),
        hash = %outcome.snapshot_hash,
        "turn complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests;
