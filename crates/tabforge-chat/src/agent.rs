//! Generative agent boundary.
//!
//! An agent receives the current song and the instruction and answers with
//! `{reply, followUps, song}`. Its `song` is untyped and untrusted: callers
//! always run it through the validator.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use tabforge_spec::error::BackendError;
use tabforge_spec::song::Song;

use crate::prompt::{build_prompt, build_repair_prompt};

/// Default model requested from the agent service.
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// One request to the agent.
#[derive(Debug, Clone)]
pub struct AgentRequest<'a> {
    pub song: &'a Song,
    pub instruction: &'a str,
    /// Violations from the previous attempt; non-empty only on the repair call.
    pub violations: Vec<String>,
}

impl<'a> AgentRequest<'a> {
    pub fn new(song: &'a Song, instruction: &'a str) -> Self {
        Self {
            song,
            instruction,
            violations: Vec::new(),
        }
    }

    /// The repair request for this request, embedding `violations`.
    pub fn repair(&self, violations: Vec<String>) -> Self {
        Self {
            song: self.song,
            instruction: self.instruction,
            violations,
        }
    }

    pub fn is_repair(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// The agent's proposal. `song` has not been validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub follow_ups: Vec<String>,
    #[serde(default)]
    pub song: Value,
}

/// Errors from an agent call.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The service could not be reached.
    #[error("agent unreachable: {0}")]
    Transport(String),

    /// The call did not finish within the timeout.
    #[error("agent timed out")]
    Timeout,

    /// The service answered with an error status.
    #[error("agent returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The answer was not the expected JSON shape.
    #[error("agent response is not usable: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    /// True if the agent answered but its content was unusable; such
    /// failures are worth a repair call.
    pub fn is_content_error(&self) -> bool {
        matches!(self, AgentError::InvalidResponse(_))
    }
}

impl BackendError for AgentError {
    fn code(&self) -> &'static str {
        match self {
            AgentError::Transport(_) => "AGENT_001",
            AgentError::Timeout => "AGENT_002",
            AgentError::Status { .. } => "AGENT_003",
            AgentError::InvalidResponse(_) => "AGENT_004",
        }
    }

    fn category(&self) -> &'static str {
        "agent"
    }
}

/// A source of song proposals.
pub trait SongAgent {
    /// Asks the agent for a proposal.
    fn propose(&self, request: &AgentRequest<'_>) -> Result<AgentResponse, AgentError>;
}

/// Agent served over HTTP with the Ollama `/api/generate` protocol.
///
/// Sends `{model, prompt, stream: false, format: "json"}` and expects the
/// proposal JSON as the text of the `response` field.
pub struct HttpAgent {
    base_url: String,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
}

impl HttpAgent {
    /// Creates an agent for `base_url` (e.g. `http://localhost:11434`).
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn transport_error(err: ureq::Transport) -> AgentError {
    if is_timeout(&err) {
        AgentError::Timeout
    } else {
        AgentError::Transport(err.to_string())
    }
}

/// True if an I/O error in the source chain is a timeout. Socket read
/// timeouts surface as `WouldBlock` on some platforms.
fn is_timeout(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) {
                return true;
            }
        }
        source = e.source();
    }
    false
}

/// Parses the agent's text answer into a response.
///
/// Models sometimes wrap JSON in prose or code fences; the outermost object
/// is used.
pub fn parse_agent_text(text: &str) -> Result<AgentResponse, AgentError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if e > s => &text[s..=e],
        _ => {
            return Err(AgentError::InvalidResponse(
                "no JSON object in agent output".to_string(),
            ))
        }
    };
    serde_json::from_str(json).map_err(|e| AgentError::InvalidResponse(e.to_string()))
}

impl SongAgent for HttpAgent {
    fn propose(&self, request: &AgentRequest<'_>) -> Result<AgentResponse, AgentError> {
        let prompt = if request.is_repair() {
            build_repair_prompt(request.song, request.instruction, &request.violations)
        } else {
            build_prompt(request.song, request.instruction)
        };
        let body = GenerateBody {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
        };
        debug!(
            endpoint = %self.endpoint(),
            repair = request.is_repair(),
            "calling agent"
        );

        let response = match self.agent.post(&self.endpoint()).send_json(&body) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(AgentError::Status { status, body });
            }
            Err(ureq::Error::Transport(t)) => return Err(transport_error(t)),
        };

        let reply: GenerateReply = response
            .into_json()
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        parse_agent_text(&reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_json() {
        let response = parse_agent_text(
            r#"{"reply": "Done", "followUps": ["Title?"], "song": {"metadata": {"title": "x"}}}"#,
        )
        .unwrap();
        assert_eq!(response.reply, "Done");
        assert_eq!(response.follow_ups, vec!["Title?"]);
        assert_eq!(response.song["metadata"]["title"], json!("x"));
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "Sure!\n```json\n{\"reply\": \"ok\", \"song\": {}}\n```";
        let response = parse_agent_text(text).unwrap();
        assert_eq!(response.reply, "ok");
        assert!(response.follow_ups.is_empty());
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_agent_text("I cannot help with that").unwrap_err();
        assert!(err.is_content_error());
        assert_eq!(err.code(), "AGENT_004");
        assert!(parse_agent_text("{not json}").unwrap_err().is_content_error());
    }

    #[test]
    fn test_timeout_found_in_source_chain() {
        #[derive(Debug, Error)]
        #[error("request failed")]
        struct Wrapper(#[source] std::io::Error);

        let timed_out = Wrapper(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        assert!(is_timeout(&timed_out));
        let refused = Wrapper(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "timed out",
        ));
        assert!(!is_timeout(&refused));
    }

    #[test]
    fn test_silent_server_times_out() {
        // Accepts the connection in the backlog but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let agent = HttpAgent::new(url, DEFAULT_MODEL, Duration::from_millis(300));

        let song = tabforge_spec::ops::empty_song();
        let err = agent.propose(&AgentRequest::new(&song, "hi")).unwrap_err();
        assert!(matches!(err, AgentError::Timeout), "{:?}", err);
        assert_eq!(err.code(), "AGENT_002");
        drop(listener);
    }

    #[test]
    fn test_endpoint() {
        let agent = HttpAgent::new("http://localhost:11434/", DEFAULT_MODEL, DEFAULT_TIMEOUT);
        assert_eq!(agent.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(agent.model(), "llama3.1");
    }

    #[test]
    fn test_unreachable_agent_is_transport_error() {
        let agent = HttpAgent::new("http://127.0.0.1:9", DEFAULT_MODEL, Duration::from_secs(2));
        let song = tabforge_spec::ops::empty_song();
        let err = agent.propose(&AgentRequest::new(&song, "hi")).unwrap_err();
        assert!(!err.is_content_error());
    }
}
