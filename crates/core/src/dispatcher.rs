//! Notification Dispatcher
//!
//! Delivers session notifications to registered handlers one at a time, in
//! the order they were received. Handlers never overlap within a session, so
//! they can run check-then-act sequences without further locking.

use crate::transport::Participant;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

/// A zero-argument turn-taking signal from the speech pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeakingSignal {
    UserStarted,
    UserStopped,
    AgentStarted,
    AgentStopped,
}

/// Everything that can happen to a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ParticipantMetadataChanged {
        participant: Participant,
        old_metadata: String,
        new_metadata: String,
    },
    Speaking(SpeakingSignal),
    /// The transport went away. Nothing is delivered after this.
    Disconnected,
}

type MetadataHandler = Box<dyn FnMut(&Participant, &str, &str) + Send>;
type SignalHandler = Box<dyn FnMut() + Send>;

/// Typed handler registry for one session.
#[derive(Default)]
pub struct NotificationDispatcher {
    metadata_handlers: Vec<MetadataHandler>,
    signal_handlers: HashMap<SpeakingSignal, Vec<SignalHandler>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_metadata_changed<F>(&mut self, handler: F)
    where
        F: FnMut(&Participant, &str, &str) + Send + 'static,
    {
        self.metadata_handlers.push(Box::new(handler));
    }

    pub fn on_speaking<F>(&mut self, signal: SpeakingSignal, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.signal_handlers
            .entry(signal)
            .or_default()
            .push(Box::new(handler));
    }

    /// Runs every handler registered for `event`, in registration order.
    ///
    /// Returns `false` once the session is disconnected.
    pub fn dispatch(&mut self, event: &SessionEvent) -> bool {
        match event {
            SessionEvent::ParticipantMetadataChanged {
                participant,
                old_metadata,
                new_metadata,
            } => {
                for handler in &mut self.metadata_handlers {
                    handler(participant, old_metadata, new_metadata);
                }
                true
            }
            SessionEvent::Speaking(signal) => {
                if let Some(handlers) = self.signal_handlers.get_mut(signal) {
                    for handler in handlers {
                        handler();
                    }
                }
                true
            }
            SessionEvent::Disconnected => false,
        }
    }

    /// Pumps events until the transport disconnects or every sender is gone.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            debug!(?event, "Dispatching session event");
            if !self.dispatch(&event) {
                break;
            }
        }
        // Anything still buffered belongs to a session that is over.
        events.close();
    }
}
