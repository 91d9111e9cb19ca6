//! Active voice configuration shared between a session and its synthesizer.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Language used when a voice does not declare one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// The voice the synthesizer should use for its next utterance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VoiceSelection {
    /// Catalog id of the selected voice; `None` while on the model default.
    pub voice_id: Option<String>,
    /// Speaker embedding; `None` lets the engine use its built-in voice.
    pub embedding: Option<serde_json::Value>,
    pub language: String,
}

impl Default for VoiceSelection {
    fn default() -> Self {
        Self {
            voice_id: None,
            embedding: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Handle to a session's current voice selection.
///
/// Clones share the selection. The voice switch controller is the only
/// writer; the synthesis collaborator takes a snapshot before each utterance.
#[derive(Debug, Clone, Default)]
pub struct ActiveVoiceConfig {
    inner: Arc<RwLock<VoiceSelection>>,
}

impl ActiveVoiceConfig {
    pub fn new(initial: VoiceSelection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn snapshot(&self) -> VoiceSelection {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the selection in one write so readers never see a new
    /// embedding paired with a stale language.
    pub(crate) fn apply(&self, selection: VoiceSelection) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = selection;
    }
}
