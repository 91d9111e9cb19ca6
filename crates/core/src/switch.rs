//! Voice Switch Controller
//!
//! Applies voice change requests that a participant publishes through its
//! metadata. Remote metadata is untrusted: every malformed, unknown or
//! incomplete request ends in a no-op, never in an error for the session.

use crate::{
    catalog::VoiceCatalog,
    error::SessionError,
    speaking::SpeakingState,
    transport::{Participant, SpeechPipeline},
    voice::{ActiveVoiceConfig, DEFAULT_LANGUAGE, VoiceSelection},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, info, warn};

/// Spoken after a switch so the user can hear the new voice.
pub const CONFIRMATION_UTTERANCE: &str = "How do I sound now?";

/// Metadata key carrying the requested voice id.
pub const VOICE_ID_KEY: &str = "voiceId";

/// What the controller did with a metadata change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Sent by a bot or bridge participant.
    NotPrimary,
    /// The new metadata was not valid JSON.
    MalformedMetadata,
    /// The metadata carried no voice request.
    NoVoiceRequested,
    /// The requested id is not in the catalog.
    UnknownVoice(String),
    /// The voice exists but has no embedding to synthesize with.
    MissingEmbedding(String),
    /// The voice was applied. `confirmation_scheduled` is false when someone
    /// was speaking at the time of the switch.
    Switched {
        voice_id: String,
        confirmation_scheduled: bool,
    },
}

/// Hot-swaps the session's synthesis voice.
pub struct VoiceSwitchController {
    catalog: Arc<VoiceCatalog>,
    voice: ActiveVoiceConfig,
    speaking: SpeakingState,
    pipeline: Arc<dyn SpeechPipeline>,
}

impl VoiceSwitchController {
    pub fn new(
        catalog: Arc<VoiceCatalog>,
        voice: ActiveVoiceConfig,
        speaking: SpeakingState,
        pipeline: Arc<dyn SpeechPipeline>,
    ) -> Self {
        Self {
            catalog,
            voice,
            speaking,
            pipeline,
        }
    }

    /// Handles a participant metadata change.
    ///
    /// Must run inside a Tokio runtime: the confirmation utterance is
    /// spawned onto it and never awaited here.
    pub fn handle_metadata_changed(
        &self,
        participant: &Participant,
        _old_metadata: &str,
        new_metadata: &str,
    ) -> SwitchOutcome {
        if !participant.is_primary() {
            return SwitchOutcome::NotPrimary;
        }

        let metadata = if new_metadata.trim().is_empty() {
            "{}"
        } else {
            new_metadata
        };
        let data: Value = match serde_json::from_str(metadata) {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    participant = %participant.identity,
                    metadata = %new_metadata,
                    error = %e,
                    "Failed to parse participant metadata JSON"
                );
                return SwitchOutcome::MalformedMetadata;
            }
        };
        info!(participant = %participant.identity, metadata = %new_metadata, "Participant metadata changed");

        let Some(voice_id) = data
            .get(VOICE_ID_KEY)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
        else {
            return SwitchOutcome::NoVoiceRequested;
        };
        info!(participant = %participant.identity, %voice_id, "Participant requested voice change");

        let Some(voice) = self.catalog.find(voice_id) else {
            warn!(%voice_id, "Requested voice not found in catalog");
            return SwitchOutcome::UnknownVoice(voice_id.to_string());
        };
        let Some(embedding) = voice.embedding.clone() else {
            return SwitchOutcome::MissingEmbedding(voice_id.to_string());
        };

        let language = voice
            .language
            .as_deref()
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();

        self.voice.apply(VoiceSelection {
            voice_id: Some(voice_id.to_string()),
            embedding: Some(embedding),
            language,
        });
        info!(%voice_id, "Switched voice");

        // The switch itself is never deferred; only the announcement waits
        // for a quiet moment.
        let confirmation_scheduled = !self.speaking.anyone_speaking();
        if confirmation_scheduled {
            self.schedule_confirmation();
        }

        SwitchOutcome::Switched {
            voice_id: voice_id.to_string(),
            confirmation_scheduled,
        }
    }

    fn schedule_confirmation(&self) {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(
            async move {
                if let Err(e) = pipeline.say(CONFIRMATION_UTTERANCE.to_string(), true).await {
                    warn!(error = %SessionError::Speech(e), "Voice change confirmation was not spoken");
                }
            }
            .in_current_span(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::Voice,
        testing::{RecordingPipeline, count_warnings},
        transport::ParticipantKind,
    };
    use serde_json::json;

    fn standard() -> Participant {
        Participant::new("user-1", ParticipantKind::Standard)
    }

    fn catalog() -> Arc<VoiceCatalog> {
        Arc::new(VoiceCatalog::new(vec![
            Voice {
                id: "v1".to_string(),
                name: "Alice".to_string(),
                language: None,
                embedding: Some(json!("e1")),
            },
            Voice {
                id: "v2".to_string(),
                name: "Bruno".to_string(),
                language: Some("es".to_string()),
                embedding: Some(json!([0.25, 0.5])),
            },
            Voice {
                id: "v3".to_string(),
                name: "Claire".to_string(),
                language: Some("en".to_string()),
                embedding: Some(json!("e3")),
            },
            Voice {
                id: "hollow".to_string(),
                name: "No Embedding".to_string(),
                language: Some("fr".to_string()),
                embedding: None,
            },
        ]))
    }

    struct Harness {
        controller: VoiceSwitchController,
        voice: ActiveVoiceConfig,
        speaking: SpeakingState,
        pipeline: RecordingPipeline,
    }

    fn harness(catalog: Arc<VoiceCatalog>) -> Harness {
        let voice = ActiveVoiceConfig::default();
        let speaking = SpeakingState::new();
        let pipeline = RecordingPipeline::new();
        let controller = VoiceSwitchController::new(
            catalog,
            voice.clone(),
            speaking.clone(),
            Arc::new(pipeline.clone()),
        );
        Harness {
            controller,
            voice,
            speaking,
            pipeline,
        }
    }

    #[tokio::test]
    async fn test_switch_while_silent_confirms_once() {
        let h = harness(catalog());

        let outcome = h
            .controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"v1"}"#);

        assert_eq!(
            outcome,
            SwitchOutcome::Switched {
                voice_id: "v1".to_string(),
                confirmation_scheduled: true
            }
        );
        let selection = h.voice.snapshot();
        assert_eq!(selection.embedding, Some(json!("e1")));
        assert_eq!(selection.language, "en");
        assert_eq!(selection.voice_id.as_deref(), Some("v1"));

        assert_eq!(
            h.pipeline.next_utterance().await,
            Some((CONFIRMATION_UTTERANCE.to_string(), true))
        );
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_switch_while_user_speaking_skips_confirmation() {
        let h = harness(catalog());
        h.speaking.on_user_started();

        let outcome = h
            .controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"v1"}"#);

        assert_eq!(
            outcome,
            SwitchOutcome::Switched {
                voice_id: "v1".to_string(),
                confirmation_scheduled: false
            }
        );
        assert_eq!(h.voice.snapshot().embedding, Some(json!("e1")));
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_switch_while_agent_speaking_skips_confirmation() {
        let h = harness(catalog());
        h.speaking.on_agent_started();

        let outcome = h
            .controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"v2"}"#);

        assert!(matches!(
            outcome,
            SwitchOutcome::Switched {
                confirmation_scheduled: false,
                ..
            }
        ));
        assert_eq!(h.voice.snapshot().language, "es");
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_confirmation_resumes_after_speech_ends() {
        let h = harness(catalog());
        h.speaking.on_user_started();
        h.controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"v1"}"#);
        h.speaking.on_user_stopped();

        h.controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"v3"}"#);

        assert_eq!(
            h.pipeline.next_utterance().await,
            Some((CONFIRMATION_UTTERANCE.to_string(), true))
        );
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_repeated_request_is_not_deduplicated() {
        let h = harness(catalog());
        let metadata = r#"{"voiceId":"v2"}"#;

        h.controller.handle_metadata_changed(&standard(), "", metadata);
        let first = h.voice.snapshot();
        h.controller
            .handle_metadata_changed(&standard(), metadata, metadata);
        let second = h.voice.snapshot();

        assert_eq!(first, second);
        assert!(h.pipeline.next_utterance().await.is_some());
        assert!(h.pipeline.next_utterance().await.is_some());
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_declared_language_wins_over_default() {
        let h = harness(catalog());
        h.controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"v2"}"#);

        let selection = h.voice.snapshot();
        assert_eq!(selection.language, "es");
        assert_eq!(selection.embedding, Some(json!([0.25, 0.5])));
    }

    #[tokio::test]
    async fn test_explicit_english_voice_keeps_default_language() {
        let h = harness(catalog());
        h.controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"v2"}"#);
        h.controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"v3"}"#);

        assert_eq!(h.voice.snapshot().language, "en");
    }

    #[tokio::test]
    async fn test_unknown_voice_changes_nothing() {
        let h = harness(catalog());
        let before = h.voice.snapshot();

        let (outcome, warnings) = count_warnings(|| {
            h.controller
                .handle_metadata_changed(&standard(), "", r#"{"voiceId":"nope"}"#)
        });

        assert_eq!(outcome, SwitchOutcome::UnknownVoice("nope".to_string()));
        assert_eq!(warnings, 1);
        assert_eq!(h.voice.snapshot(), before);
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_voice_without_embedding_changes_nothing() {
        let h = harness(catalog());
        let before = h.voice.snapshot();

        let outcome = h
            .controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"hollow"}"#);

        assert_eq!(outcome, SwitchOutcome::MissingEmbedding("hollow".to_string()));
        assert_eq!(h.voice.snapshot(), before);
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_metadata_is_swallowed() {
        let h = harness(catalog());
        let before = h.voice.snapshot();

        let (outcome, warnings) = count_warnings(|| {
            h.controller
                .handle_metadata_changed(&standard(), "", "{not valid json")
        });

        assert_eq!(outcome, SwitchOutcome::MalformedMetadata);
        assert_eq!(warnings, 1);
        assert_eq!(h.voice.snapshot(), before);
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_metadata_without_voice_request_is_ignored() {
        let h = harness(catalog());
        for metadata in [
            "",
            "{}",
            r#"{"theme":"dark"}"#,
            r#"{"voiceId":""}"#,
            r#"{"voiceId":42}"#,
            r#"["v1"]"#,
        ] {
            let outcome = h.controller.handle_metadata_changed(&standard(), "", metadata);
            assert_eq!(outcome, SwitchOutcome::NoVoiceRequested, "metadata: {metadata}");
        }
        assert_eq!(h.voice.snapshot(), VoiceSelection::default());
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_non_primary_participants_are_ignored() {
        let h = harness(catalog());
        let bot = Participant::new("agent-7", ParticipantKind::Agent);

        let (outcome, warnings) = count_warnings(|| {
            h.controller
                .handle_metadata_changed(&bot, "", r#"{"voiceId":"v1"}"#)
        });

        assert_eq!(outcome, SwitchOutcome::NotPrimary);
        assert_eq!(warnings, 0);
        assert_eq!(h.voice.snapshot(), VoiceSelection::default());
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_unrecognized_keys_are_ignored() {
        let h = harness(catalog());
        let outcome = h.controller.handle_metadata_changed(
            &standard(),
            "",
            r#"{"voiceId":"v1","theme":"dark","volume":3}"#,
        );
        assert!(matches!(outcome, SwitchOutcome::Switched { .. }));
    }

    #[tokio::test]
    async fn test_empty_catalog_rejects_every_request() {
        let h = harness(Arc::new(VoiceCatalog::empty()));
        for id in ["v1", "v2", "anything"] {
            let metadata = json!({ "voiceId": id }).to_string();
            let outcome = h.controller.handle_metadata_changed(&standard(), "", &metadata);
            assert_eq!(outcome, SwitchOutcome::UnknownVoice(id.to_string()));
        }
        assert_eq!(h.voice.snapshot(), VoiceSelection::default());
        assert_eq!(h.pipeline.settled_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_confirmation_keeps_switch() {
        let h = harness(catalog());
        h.pipeline.fail_utterances();

        h.controller
            .handle_metadata_changed(&standard(), "", r#"{"voiceId":"v1"}"#);

        assert!(h.pipeline.next_utterance().await.is_some());
        assert_eq!(h.voice.snapshot().voice_id.as_deref(), Some("v1"));
    }
}
