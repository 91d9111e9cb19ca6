use std::net::{Ipv4Addr, SocketAddr};
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where and how to fetch the voice catalog.
#[derive(Clone)]
pub struct VoiceProviderConfig {
    pub voices_url: String,
    pub api_key: String,
    pub api_version: String,
}

impl std::fmt::Debug for VoiceProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceProviderConfig")
            .field("voices_url", &self.voices_url)
            .field("api_key", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Models and instructions the gateway wires into the speech pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
    pub instructions: String,
    pub stt_model: String,
    pub llm_model: String,
    pub tts_model: String,
}

pub const DEFAULT_INSTRUCTIONS: &str = "You are a voice assistant. Your interface with users will be voice. Pretend we're having a conversation, no special formatting or headings, just natural speech.";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address of the session control endpoint.
    pub bind_address: SocketAddr,
    /// Address of the liveness responder.
    pub liveness_address: SocketAddr,
    pub voice_provider: VoiceProviderConfig,
    pub pipeline: PipelineSettings,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let port = match std::env::var("PORT") {
            Ok(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?,
            Err(_) => 8080,
        };
        let liveness_address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

        let voice_provider = VoiceProviderConfig {
            voices_url: std::env::var("VOICES_URL")
                .unwrap_or_else(|_| "https://api.cartesia.ai/voices".to_string()),
            api_key: std::env::var("CARTESIA_API_KEY").unwrap_or_default(),
            api_version: std::env::var("CARTESIA_VERSION")
                .unwrap_or_else(|_| "2024-08-01".to_string()),
        };

        let pipeline = PipelineSettings {
            instructions: std::env::var("SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_INSTRUCTIONS.to_string()),
            stt_model: std::env::var("STT_MODEL").unwrap_or_else(|_| "nova-2".to_string()),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            tts_model: std::env::var("TTS_MODEL").unwrap_or_else(|_| "sonic-2".to_string()),
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            liveness_address,
            voice_provider,
            pipeline,
            log_level,
        })
    }
}
