//! HTTP clients for the MIDI source and the tablature writer.

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use tabforge_backend_midi::generate::GenerateRequest;
use tabforge_spec::error::BackendError;
use tabforge_spec::song::Song;

/// Largest response body read from either service.
pub const MAX_RESPONSE_BYTES: u64 = 16 * 1024 * 1024;

/// Errors from an external service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service could not be reached.
    #[error("{service} unreachable: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// The service rejected the request.
    #[error("{service} returned status {status}: {detail}")]
    Rejected {
        service: &'static str,
        status: u16,
        detail: String,
    },

    /// The response body could not be read.
    #[error("{service} response could not be read: {message}")]
    Body {
        service: &'static str,
        message: String,
    },

    /// The response body exceeded [`MAX_RESPONSE_BYTES`].
    #[error("{service} response exceeds {limit} bytes")]
    TooLarge { service: &'static str, limit: u64 },
}

impl BackendError for ServiceError {
    fn code(&self) -> &'static str {
        match self {
            ServiceError::Transport { .. } => "SERVICE_001",
            ServiceError::Rejected { .. } => "SERVICE_002",
            ServiceError::Body { .. } => "SERVICE_003",
            ServiceError::TooLarge { .. } => "SERVICE_004",
        }
    }

    fn category(&self) -> &'static str {
        "service"
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Extracts the `detail` of an error body, or the raw text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn post_json<T: serde::Serialize>(
    agent: &ureq::Agent,
    service: &'static str,
    url: &str,
    body: &T,
) -> Result<Vec<u8>, ServiceError> {
    debug!(service, url, "posting request");
    let response = match agent.post(url).send_json(body) {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            return Err(ServiceError::Rejected {
                service,
                status,
                detail: error_detail(&body),
            });
        }
        Err(ureq::Error::Transport(t)) => {
            return Err(ServiceError::Transport {
                service,
                message: t.to_string(),
            })
        }
    };

    let bytes = read_limited(response.into_reader(), service, MAX_RESPONSE_BYTES)?;
    debug!(service, bytes = bytes.len(), "response received");
    Ok(bytes)
}

/// Reads a whole body, failing rather than truncating past `limit` bytes.
fn read_limited<R: Read>(
    reader: R,
    service: &'static str,
    limit: u64,
) -> Result<Vec<u8>, ServiceError> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| ServiceError::Body {
            service,
            message: e.to_string(),
        })?;
    if bytes.len() as u64 > limit {
        return Err(ServiceError::TooLarge { service, limit });
    }
    Ok(bytes)
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Client for `POST {url}/generate {tempo, key, measures}` returning MIDI bytes.
pub struct MidiSourceClient {
    base_url: String,
    agent: ureq::Agent,
}

impl MidiSourceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: build_agent(timeout),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/generate", self.base_url)
    }

    /// Requests a MIDI file.
    pub fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>, ServiceError> {
        post_json(&self.agent, "midi source", &self.endpoint(), request)
    }
}

/// Client for `POST {url}/write <song JSON>` returning tablature bytes.
pub struct WriterClient {
    base_url: String,
    agent: ureq::Agent,
}

impl WriterClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: build_agent(timeout),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/write", self.base_url)
    }

    /// Sends a validated song to the writer.
    pub fn write(&self, song: &Song) -> Result<Vec<u8>, ServiceError> {
        post_json(&self.agent, "writer", &self.endpoint(), song)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail": "bad tempo"}"#), "bad tempo");
        assert_eq!(
            error_detail(r#"{"detail": [{"loc": ["tempo"]}]}"#),
            r#"[{"loc":["tempo"]}]"#
        );
        assert_eq!(error_detail("  Internal Server Error\n"), "Internal Server Error");
    }

    #[test]
    fn test_read_limited() {
        let body = vec![7u8; 32];
        assert_eq!(read_limited(&body[..], "writer", 32).unwrap(), body);

        let err = read_limited(&body[..], "writer", 31).unwrap_err();
        assert!(matches!(err, ServiceError::TooLarge { limit: 31, .. }));
        assert_eq!(err.code(), "SERVICE_004");
        assert_eq!(err.to_string(), "writer response exceeds 31 bytes");
    }

    #[test]
    fn test_endpoints() {
        let midi = MidiSourceClient::new("http://midi:8001/", Duration::from_secs(1));
        assert_eq!(midi.endpoint(), "http://midi:8001/generate");
        let writer = WriterClient::new("http://localhost:8000", Duration::from_secs(1));
        assert_eq!(writer.endpoint(), "http://localhost:8000/write");
    }

    #[test]
    fn test_unreachable_writer() {
        let writer = WriterClient::new("http://127.0.0.1:9", Duration::from_secs(2));
        let err = writer.write(&tabforge_spec::ops::empty_song()).unwrap_err();
        assert_eq!(err.code(), "SERVICE_001");
    }
}
