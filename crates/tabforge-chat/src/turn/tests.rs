//! Tests for the turn pipeline.

use std::cell::RefCell;
use std::collections::VecDeque;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use tabforge_spec::ops::{empty_song, ensure_minimum_song, set_ready_for_export};

/// Agent returning queued answers and recording every request it saw.
struct QueuedAgent {
    answers: RefCell<VecDeque<Result<AgentResponse, AgentError>>>,
    seen: RefCell<Vec<Vec<String>>>,
}

impl QueuedAgent {
    fn new(answers: Vec<Result<AgentResponse, AgentError>>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl SongAgent for QueuedAgent {
    fn propose(&self, request: &AgentRequest<'_>) -> Result<AgentResponse, AgentError> {
        self.seen.borrow_mut().push(request.violations.clone());
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(AgentError::Timeout))
    }
}

fn proposal(song: serde_json::Value) -> Result<AgentResponse, AgentError> {
    Ok(AgentResponse {
        reply: "Done.".to_string(),
        follow_ups: Vec::new(),
        song,
    })
}

fn titled_song(title: &str, tempo: u64) -> serde_json::Value {
    json!({"metadata": {"title": title, "tempo": tempo}})
}

#[test]
fn test_rules_only_turn() {
    let outcome = run_turn(&empty_song(), "120 bpm with bass", None).unwrap();
    assert_eq!(outcome.source, TurnSource::Rules);
    assert_eq!(outcome.notice, None);
    assert_eq!(outcome.song.tracks.len(), 1);
    assert_eq!(
        outcome.snapshot_hash,
        canonical_song_hash(&outcome.song).unwrap()
    );
}

#[test]
fn test_valid_agent_proposal_is_accepted() {
    let agent = QueuedAgent::new(vec![proposal(titled_song("Ember", 96))]);
    let outcome = run_turn(&empty_song(), "call it Ember", Some(&agent)).unwrap();
    assert_eq!(outcome.source, TurnSource::Agent);
    assert_eq!(outcome.song.metadata.title, "Ember");
    assert_eq!(outcome.song.metadata.tempo, 96);
    assert_eq!(outcome.reply, "Done.");
    // No agent follow-ups, so the checklist supplies them.
    assert_eq!(outcome.follow_ups[0], "Which instruments should play (guitar, bass, drums)?");
    assert_eq!(agent.calls(), 1);
}

#[test]
fn test_one_repair_call_with_violation_paths() {
    let agent = QueuedAgent::new(vec![
        proposal(titled_song("Fast", 301)),
        proposal(titled_song("Fast", 300)),
    ]);
    let outcome = run_turn(&empty_song(), "as fast as possible", Some(&agent)).unwrap();
    assert_eq!(outcome.source, TurnSource::RepairedAgent);
    assert_eq!(outcome.song.metadata.tempo, 300);

    let seen = agent.seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].is_empty());
    assert_eq!(seen[1].len(), 1);
    assert!(seen[1][0].contains("metadata.tempo"));
}

#[test]
fn test_second_rejection_falls_back_to_rules() {
    let agent = QueuedAgent::new(vec![
        proposal(titled_song("Fast", 301)),
        proposal(json!({"tracks": "nope"})),
    ]);
    let prior = empty_song();
    let outcome = run_turn(&prior, "140 bpm with drums", Some(&agent)).unwrap();
    assert_eq!(outcome.source, TurnSource::Rules);
    assert_eq!(outcome.notice.as_deref(), Some(REJECTED_NOTICE));
    assert_eq!(outcome.song.metadata.tempo, 140);
    assert!(outcome.song.has_drums());
    assert_eq!(agent.calls(), 2);
}

#[test]
fn test_unparseable_output_gets_repair_call() {
    let agent = QueuedAgent::new(vec![
        Err(AgentError::InvalidResponse("expected value".to_string())),
        proposal(titled_song("Fixed", 120)),
    ]);
    let outcome = run_turn(&empty_song(), "anything", Some(&agent)).unwrap();
    assert_eq!(outcome.source, TurnSource::RepairedAgent);
    assert_eq!(outcome.song.metadata.title, "Fixed");
}

#[test]
fn test_timeout_falls_back_without_repair() {
    let agent = QueuedAgent::new(vec![Err(AgentError::Timeout)]);
    let outcome = run_turn(&empty_song(), "key of E minor", Some(&agent)).unwrap();
    assert_eq!(outcome.source, TurnSource::Rules);
    assert_eq!(outcome.notice.as_deref(), Some(UNAVAILABLE_NOTICE));
    assert_eq!(outcome.song.metadata.key_signature, "E minor");
    assert_eq!(agent.calls(), 1);
}

#[test]
fn test_agent_cannot_clear_export_flag() {
    let prior = set_ready_for_export(ensure_minimum_song(empty_song()), true);
    let agent = QueuedAgent::new(vec![proposal(titled_song("Kept", 120))]);
    let outcome = run_turn(&prior, "rename it", Some(&agent)).unwrap();
    assert!(outcome.song.ready_for_export);
}

#[test]
fn test_export_intent_sets_flag_on_agent_path() {
    let agent = QueuedAgent::new(vec![proposal(titled_song("Out", 120))]);
    let outcome = run_turn(&empty_song(), "export the gp5 file", Some(&agent)).unwrap();
    assert!(outcome.song.ready_for_export);
}

#[test]
fn test_agent_follow_ups_are_kept() {
    let agent = QueuedAgent::new(vec![Ok(AgentResponse {
        reply: String::new(),
        follow_ups: vec!["Want a bridge?".to_string()],
        song: titled_song("Q", 120),
    })]);
    let outcome = run_turn(&empty_song(), "go", Some(&agent)).unwrap();
    assert_eq!(outcome.follow_ups, vec!["Want a bridge?".to_string()]);
    assert_eq!(outcome.reply, "Updated the song.");
}

#[test]
fn test_unknown_field_warning_is_reported() {
    let agent = QueuedAgent::new(vec![proposal(json!({
        "metadata": {"title": "W", "mood": "dark"}
    }))]);
    let outcome = run_turn(&empty_song(), "go", Some(&agent)).unwrap();
    assert_eq!(outcome.source, TurnSource::Agent);
    assert!(outcome.warnings.iter().any(|w| w.contains("metadata.mood")));
}

#[test]
fn test_invalid_prior_song_is_an_error() {
    let mut prior = empty_song();
    prior.metadata.tempo = 500;
    let err = run_turn(&prior, "hello", None).unwrap_err();
    assert!(matches!(err, SongError::Validation(_)));
}
