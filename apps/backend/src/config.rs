//! Runtime configuration from environment variables.

use std::time::Duration;

use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

/// Settings for the OpenAI-compatible provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub transcription_model: String,
    pub speech_model: String,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `None` disables every external collaborator.
    pub ai: Option<AiConfig>,
    pub ai_timeout: Duration,
    /// Idle time after which a session is evicted.
    pub session_ttl: Duration,
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Recognized variables:
    /// - HOST (default "0.0.0.0"), PORT (default 3000)
    /// - OPENAI_API_KEY: enables the AI collaborators when set and non-empty
    /// - OPENAI_BASE_URL, CHAT_MODEL, TRANSCRIPTION_MODEL, SPEECH_MODEL
    /// - AI_TIMEOUT_SECS (default 30)
    /// - SESSION_TTL_SECS (default 86400)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match var("PORT") {
            Some(value) => parse_number::<u16>("PORT", &value)?,
            None => 3000,
        };

        let timeout_secs = positive_secs(&var, "AI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let session_ttl_secs =
            positive_secs(&var, "SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;

        let ai = var("OPENAI_API_KEY").map(|api_key| AiConfig {
            api_key,
            base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            chat_model: var("CHAT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            transcription_model: var("TRANSCRIPTION_MODEL")
                .unwrap_or_else(|| "whisper-1".to_string()),
            speech_model: var("SPEECH_MODEL").unwrap_or_else(|| "tts-1".to_string()),
        });

        Ok(Self {
            host,
            port,
            ai,
            ai_timeout: Duration::from_secs(timeout_secs),
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn positive_secs(
    var: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let secs = match var(name) {
        Some(value) => parse_number::<u64>(name, &value)?,
        None => default,
    };
    if secs == 0 {
        return Err(ConfigError::Zero { name });
    }
    Ok(secs)
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}
