//! Speaking-State Tracker
//!
//! Tracks whether the user and the agent are currently vocalizing. The two
//! flags are independent: a user start never touches the agent flag and
//! start/stop pairs are not assumed to nest across parties.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Shared turn-taking flags for one session.
///
/// Clones share the same flags, so the pipeline-facing handlers and the
/// voice switch controller observe one state.
#[derive(Debug, Clone, Default)]
pub struct SpeakingState {
    user_speaking: Arc<AtomicBool>,
    agent_speaking: Arc<AtomicBool>,
}

impl SpeakingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_user_started(&self) {
        self.user_speaking.store(true, Ordering::SeqCst);
        debug!("User started speaking");
    }

    pub fn on_user_stopped(&self) {
        self.user_speaking.store(false, Ordering::SeqCst);
        debug!("User stopped speaking");
    }

    pub fn on_agent_started(&self) {
        self.agent_speaking.store(true, Ordering::SeqCst);
        debug!("Agent started speaking");
    }

    pub fn on_agent_stopped(&self) {
        self.agent_speaking.store(false, Ordering::SeqCst);
        debug!("Agent stopped speaking");
    }

    pub fn user_speaking(&self) -> bool {
        self.user_speaking.load(Ordering::SeqCst)
    }

    pub fn agent_speaking(&self) -> bool {
        self.agent_speaking.load(Ordering::SeqCst)
    }

    /// True while either party holds the floor.
    pub fn anyone_speaking(&self) -> bool {
        // Agent first: its flag flips on our own utterances, so reading it
        // first narrows the window where a fresh start is missed.
        self.agent_speaking() || self.user_speaking()
    }
}
