//! Session collaborators backed by the gateway's WebSocket.
//!
//! The gateway owns the room connection and the speech engines; these types
//! turn the core's transport and pipeline calls into protocol messages.

use super::protocol::AgentMessage;
use crate::config::PipelineSettings;
use anyhow::Result;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use cadence_core::{ActiveVoiceConfig, SessionTransport, SpeechPipeline};
use futures_util::{SinkExt, stream::SplitSink};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Write half of the gateway socket, shared by the session's collaborators.
pub type GatewaySink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// A helper function to serialize and send an `AgentMessage` to the gateway.
pub(crate) async fn send_msg(sink: &GatewaySink, msg: AgentMessage) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    sink.lock().await.send(Message::Text(serialized.into())).await?;
    Ok(())
}

pub struct GatewayTransport {
    sink: GatewaySink,
    session_id: Uuid,
}

impl GatewayTransport {
    pub fn new(sink: GatewaySink, session_id: Uuid) -> Self {
        Self { sink, session_id }
    }
}

#[async_trait]
impl SessionTransport for GatewayTransport {
    async fn connect(&self) -> Result<()> {
        send_msg(
            &self.sink,
            AgentMessage::Connected {
                session_id: self.session_id,
            },
        )
        .await
    }

    async fn set_attributes(&self, attributes: HashMap<String, String>) -> Result<()> {
        send_msg(&self.sink, AgentMessage::SetAttributes { attributes }).await
    }
}

/// Speech pipeline hosted by the gateway.
///
/// Every utterance carries the voice selection read at dispatch time, so a
/// hot-swap takes effect on the next utterance without touching ones already
/// queued.
pub struct GatewayPipeline {
    sink: GatewaySink,
    voice: ActiveVoiceConfig,
    settings: PipelineSettings,
}

impl GatewayPipeline {
    pub fn new(sink: GatewaySink, voice: ActiveVoiceConfig, settings: PipelineSettings) -> Self {
        Self {
            sink,
            voice,
            settings,
        }
    }
}

#[async_trait]
impl SpeechPipeline for GatewayPipeline {
    async fn start(&self) -> Result<()> {
        send_msg(
            &self.sink,
            AgentMessage::PipelineStarted {
                instructions: self.settings.instructions.clone(),
                stt_model: self.settings.stt_model.clone(),
                llm_model: self.settings.llm_model.clone(),
                tts_model: self.settings.tts_model.clone(),
                voice: self.voice.snapshot(),
            },
        )
        .await
    }

    async fn say(&self, text: String, allow_interruptions: bool) -> Result<()> {
        send_msg(
            &self.sink,
            AgentMessage::Say {
                text,
                allow_interruptions,
                voice: self.voice.snapshot(),
            },
        )
        .await
    }
}
