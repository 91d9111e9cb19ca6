//! Defines the JSON message protocol between the media gateway and the agent.

use cadence_core::{Participant, ParticipantKind, SessionEvent, SpeakingSignal, VoiceSelection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Messages sent from the gateway to the agent.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayMessage {
    /// A remote participant updated its metadata.
    ParticipantMetadataChanged {
        identity: String,
        #[serde(default)]
        kind: ParticipantKind,
        #[serde(default)]
        old_metadata: Option<String>,
        #[serde(default)]
        new_metadata: Option<String>,
    },
    UserStartedSpeaking,
    UserStoppedSpeaking,
    AgentStartedSpeaking,
    AgentStoppedSpeaking,
}

impl From<GatewayMessage> for SessionEvent {
    fn from(msg: GatewayMessage) -> Self {
        match msg {
            GatewayMessage::ParticipantMetadataChanged {
                identity,
                kind,
                old_metadata,
                new_metadata,
            } => SessionEvent::ParticipantMetadataChanged {
                participant: Participant::new(identity, kind),
                old_metadata: old_metadata.unwrap_or_default(),
                new_metadata: new_metadata.unwrap_or_default(),
            },
            GatewayMessage::UserStartedSpeaking => SessionEvent::Speaking(SpeakingSignal::UserStarted),
            GatewayMessage::UserStoppedSpeaking => SessionEvent::Speaking(SpeakingSignal::UserStopped),
            GatewayMessage::AgentStartedSpeaking => {
                SessionEvent::Speaking(SpeakingSignal::AgentStarted)
            }
            GatewayMessage::AgentStoppedSpeaking => {
                SessionEvent::Speaking(SpeakingSignal::AgentStopped)
            }
        }
    }
}

/// Messages sent from the agent to the gateway.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentMessage {
    /// The agent joined the session.
    Connected { session_id: Uuid },
    /// Attributes to set on the agent's participant.
    SetAttributes { attributes: HashMap<String, String> },
    /// Wire up VAD, STT, LLM and TTS with these settings.
    PipelineStarted {
        instructions: String,
        stt_model: String,
        llm_model: String,
        tts_model: String,
        voice: VoiceSelection,
    },
    /// Synthesize `text` with `voice`.
    Say {
        text: String,
        allow_interruptions: bool,
        voice: VoiceSelection,
    },
}
