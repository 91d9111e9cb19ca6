//! Narrow interfaces to the collaborators a session drives: the room
//! transport and the speech pipeline. Concrete implementations live in the
//! service that hosts sessions.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

/// Kind of a remote participant, as reported by the transport.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    /// A regular end-user. The only kind allowed to request voice changes.
    #[default]
    Standard,
    Agent,
    Ingress,
    Egress,
    Sip,
}

/// A remote participant in the session's room.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub identity: String,
    #[serde(default)]
    pub kind: ParticipantKind,
}

impl Participant {
    pub fn new(identity: impl Into<String>, kind: ParticipantKind) -> Self {
        Self {
            identity: identity.into(),
            kind,
        }
    }

    /// The standard human end-user, as opposed to bots and bridges.
    pub fn is_primary(&self) -> bool {
        self.kind == ParticipantKind::Standard
    }
}

/// The room connection a session runs over.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Joins the room. A session cannot proceed without it.
    async fn connect(&self) -> Result<()>;

    /// Publishes attributes on the agent's own participant.
    async fn set_attributes(&self, attributes: HashMap<String, String>) -> Result<()>;
}

/// The VAD, STT, LLM and TTS stages wired together.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechPipeline: Send + Sync {
    /// Starts listening and responding over the connected transport.
    async fn start(&self) -> Result<()>;

    /// Queues an utterance. Resolves once the pipeline has accepted it,
    /// not when playback finishes.
    async fn say(&self, text: String, allow_interruptions: bool) -> Result<()>;
}
