//! Session orchestration for real-time voice conversations.
//!
//! A session wires a room transport and a speech pipeline together, tracks
//! who is speaking, and lets the remote participant hot-swap the synthesized
//! voice mid-conversation. The engines themselves live behind the traits in
//! [`transport`]; this crate only decides when and what to ask of them.

pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod sequencer;
pub mod speaking;
pub mod switch;
pub mod transport;
pub mod voice;

#[cfg(test)]
mod testing;

pub use catalog::{SessionMetadata, Voice, VoiceCatalog, VoiceListing};
pub use dispatcher::{NotificationDispatcher, SessionEvent, SpeakingSignal};
pub use error::SessionError;
pub use sequencer::{GREETING_UTTERANCE, SessionPhase, SessionSequencer};
pub use speaking::SpeakingState;
pub use switch::{CONFIRMATION_UTTERANCE, SwitchOutcome, VoiceSwitchController};
pub use transport::{Participant, ParticipantKind, SessionTransport, SpeechPipeline};
pub use voice::{ActiveVoiceConfig, VoiceSelection};
