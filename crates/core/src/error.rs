use thiserror::Error;

/// Failures that end a session or are reported by the sequencer.
///
/// Only `Connect` and `PipelineStart` are fatal; the sequencer logs the
/// others and keeps the session running.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to connect session transport: {0:#}")]
    Connect(anyhow::Error),

    #[error("Failed to start speech pipeline: {0:#}")]
    PipelineStart(anyhow::Error),

    #[error("Failed to publish session metadata: {0:#}")]
    Publish(anyhow::Error),

    #[error("Failed to queue utterance: {0:#}")]
    Speech(anyhow::Error),
}
