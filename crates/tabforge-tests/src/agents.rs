//! Scripted agents for driving the turn pipeline without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;
use tabforge_chat::agent::{AgentError, AgentRequest, AgentResponse, SongAgent};

/// One scripted answer.
pub enum Script {
    /// Answer with this song JSON.
    Song(Value),
    /// Answer with this song JSON, reply and follow-ups.
    Full {
        reply: String,
        follow_ups: Vec<String>,
        song: Value,
    },
    /// Fail with this error.
    Fail(AgentError),
}

/// A request as the agent saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub instruction: String,
    pub violations: Vec<String>,
}

/// Agent that plays back scripted answers in order and records requests.
///
/// Once the script runs out every call times out.
pub struct ScriptedAgent {
    script: Mutex<VecDeque<Script>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedAgent {
    pub fn new(script: Vec<Script>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().expect("seen lock").clone()
    }
}

impl SongAgent for ScriptedAgent {
    fn propose(&self, request: &AgentRequest<'_>) -> Result<AgentResponse, AgentError> {
        self.seen.lock().expect("seen lock").push(SeenRequest {
            instruction: request.instruction.to_string(),
            violations: request.violations.clone(),
        });
        match self.script.lock().expect("script lock").pop_front() {
            Some(Script::Song(song)) => Ok(AgentResponse {
                reply: "Updated.".to_string(),
                follow_ups: Vec::new(),
                song,
            }),
            Some(Script::Full {
                reply,
                follow_ups,
                song,
            }) => Ok(AgentResponse {
                reply,
                follow_ups,
                song,
            }),
            Some(Script::Fail(err)) => Err(err),
            None => Err(AgentError::Timeout),
        }
    }
}
