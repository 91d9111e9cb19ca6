//! Session Sequencer
//!
//! Drives one session from connect to greeting, then hands control to the
//! notification dispatcher until the transport disconnects:
//!
//! `Init -> Connected -> CatalogPublished -> PipelineStarted -> GreetingSent`
//!
//! Only a failed connect or a pipeline that cannot start ends the session.
//! The conversation works without a published catalog or a greeting, so
//! those failures are logged and startup continues.

use crate::{
    catalog::VoiceCatalog,
    dispatcher::{NotificationDispatcher, SessionEvent, SpeakingSignal},
    error::SessionError,
    speaking::SpeakingState,
    switch::VoiceSwitchController,
    transport::{SessionTransport, SpeechPipeline},
    voice::ActiveVoiceConfig,
};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Opening line spoken once the pipeline is running.
pub const GREETING_UTTERANCE: &str = "Hi there, how are you doing today?";

/// Startup progress of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionPhase {
    Init,
    Connected,
    CatalogPublished,
    PipelineStarted,
    GreetingSent,
}

pub struct SessionSequencer {
    catalog: Arc<VoiceCatalog>,
    transport: Arc<dyn SessionTransport>,
    pipeline: Arc<dyn SpeechPipeline>,
    voice: ActiveVoiceConfig,
    speaking: SpeakingState,
    dispatcher: NotificationDispatcher,
    phase: SessionPhase,
}

impl SessionSequencer {
    /// Creates a sequencer for a fresh session.
    ///
    /// `voice` is the selection the pipeline reads before each utterance;
    /// the sequencer hands the only writer to its voice switch controller.
    pub fn new(
        catalog: Arc<VoiceCatalog>,
        transport: Arc<dyn SessionTransport>,
        pipeline: Arc<dyn SpeechPipeline>,
        voice: ActiveVoiceConfig,
    ) -> Self {
        Self {
            catalog,
            transport,
            pipeline,
            voice,
            speaking: SpeakingState::new(),
            dispatcher: NotificationDispatcher::new(),
            phase: SessionPhase::Init,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn speaking(&self) -> &SpeakingState {
        &self.speaking
    }

    /// Runs startup and then serves notifications until disconnect.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> Result<(), SessionError> {
        self.start().await?;
        self.serve(&mut events).await;
        info!("Session ended");
        Ok(())
    }

    /// Performs the one-time startup sequence.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        self.register_handlers();

        self.transport
            .connect()
            .await
            .map_err(SessionError::Connect)?;
        self.advance(SessionPhase::Connected);

        if let Err(e) = publish_catalog(&self.catalog, self.transport.as_ref()).await {
            warn!(error = %e, "Continuing without a published voice catalog");
        }
        self.advance(SessionPhase::CatalogPublished);

        self.pipeline
            .start()
            .await
            .map_err(SessionError::PipelineStart)?;
        self.advance(SessionPhase::PipelineStarted);

        if let Err(e) = self.pipeline.say(GREETING_UTTERANCE.to_string(), true).await {
            warn!(error = %SessionError::Speech(e), "Continuing without a greeting");
        }
        self.advance(SessionPhase::GreetingSent);
        Ok(())
    }

    /// Delivers notifications in order until the transport disconnects.
    pub async fn serve(&mut self, events: &mut mpsc::Receiver<SessionEvent>) {
        self.dispatcher.run(events).await;
    }

    fn advance(&mut self, phase: SessionPhase) {
        debug!(from = ?self.phase, to = ?phase, "Session phase transition");
        self.phase = phase;
    }

    fn register_handlers(&mut self) {
        let controller = VoiceSwitchController::new(
            Arc::clone(&self.catalog),
            self.voice.clone(),
            self.speaking.clone(),
            Arc::clone(&self.pipeline),
        );
        self.dispatcher
            .on_metadata_changed(move |participant, old_metadata, new_metadata| {
                let outcome =
                    controller.handle_metadata_changed(participant, old_metadata, new_metadata);
                debug!(?outcome, participant = %participant.identity, "Handled metadata change");
            });

        let speaking = self.speaking.clone();
        self.dispatcher
            .on_speaking(SpeakingSignal::UserStarted, move || speaking.on_user_started());
        let speaking = self.speaking.clone();
        self.dispatcher
            .on_speaking(SpeakingSignal::UserStopped, move || speaking.on_user_stopped());
        let speaking = self.speaking.clone();
        self.dispatcher
            .on_speaking(SpeakingSignal::AgentStarted, move || speaking.on_agent_started());
        let speaking = self.speaking.clone();
        self.dispatcher
            .on_speaking(SpeakingSignal::AgentStopped, move || speaking.on_agent_stopped());
    }
}

async fn publish_catalog(
    catalog: &VoiceCatalog,
    transport: &dyn SessionTransport,
) -> Result<(), SessionError> {
    let attributes = catalog
        .session_metadata()
        .to_attributes()
        .context("Failed to encode voice listing")
        .map_err(SessionError::Publish)?;
    transport
        .set_attributes(attributes)
        .await
        .map_err(SessionError::Publish)?;
    info!(voices = catalog.len(), "Published voice catalog");
    Ok(())
}
