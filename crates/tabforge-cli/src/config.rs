//! Service configuration from the environment.

use std::time::Duration;

use anyhow::{Context, Result};

/// Agent service base URL. Unset means rule-based turns only.
pub const AGENT_URL_VAR: &str = "TABFORGE_AGENT_URL";
/// Agent model name.
pub const AGENT_MODEL_VAR: &str = "TABFORGE_AGENT_MODEL";
/// MIDI source base URL. Unset means the local generator.
pub const MIDI_URL_VAR: &str = "TABFORGE_MIDI_URL";
/// Tablature writer base URL.
pub const WRITER_URL_VAR: &str = "TABFORGE_WRITER_URL";
/// Timeout in whole seconds for every outbound call.
pub const TIMEOUT_VAR: &str = "TABFORGE_TIMEOUT_SECS";

pub const DEFAULT_WRITER_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Endpoints and limits for the external services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub agent_url: Option<String>,
    pub agent_model: String,
    pub midi_url: Option<String>,
    pub writer_url: String,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            agent_url: None,
            agent_model: tabforge_chat::agent::DEFAULT_MODEL.to_string(),
            midi_url: None,
            writer_url: DEFAULT_WRITER_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let timeout = match get(TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("{} must be a whole number of seconds, got '{}'", TIMEOUT_VAR, raw))?;
                anyhow::ensure!(secs > 0, "{} must be greater than zero", TIMEOUT_VAR);
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Self {
            agent_url: get(AGENT_URL_VAR),
            agent_model: get(AGENT_MODEL_VAR).unwrap_or(defaults.agent_model),
            midi_url: get(MIDI_URL_VAR),
            writer_url: get(WRITER_URL_VAR).unwrap_or(defaults.writer_url),
            timeout,
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        agent_url: Option<String>,
        model: Option<String>,
        no_agent: bool,
    ) -> Self {
        if let Some(url) = agent_url {
            self.agent_url = Some(url);
        }
        if let Some(model) = model {
            self.agent_model = model;
        }
        if no_agent {
            self.agent_url = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.agent_model, "llama3.1");
        assert_eq!(config.writer_url, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.agent_url.is_none());
    }

    #[test]
    fn test_env_values() {
        let config = ServiceConfig::from_lookup(lookup(&[
            (AGENT_URL_VAR, "http://agent:11434"),
            (AGENT_MODEL_VAR, "mistral"),
            (MIDI_URL_VAR, " "),
            (TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.agent_url.as_deref(), Some("http://agent:11434"));
        assert_eq!(config.agent_model, "mistral");
        assert!(config.midi_url.is_none());
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_timeout() {
        assert!(ServiceConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "0")])).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::default().with_overrides(
            Some("http://x".to_string()),
            Some("m".to_string()),
            false,
        );
        assert_eq!(config.agent_url.as_deref(), Some("http://x"));
        assert_eq!(config.agent_model, "m");

        let config = config.with_overrides(None, None, true);
        assert!(config.agent_url.is_none());
    }
}
