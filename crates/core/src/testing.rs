//! In-memory collaborators for unit tests.

use crate::transport::{SessionTransport, SpeechPipeline};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Ordered record of collaborator calls, shared across fakes.
pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Pipeline fake that forwards every queued utterance to a channel.
#[derive(Clone)]
pub(crate) struct RecordingPipeline {
    log: CallLog,
    tx: mpsc::UnboundedSender<(String, bool)>,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<(String, bool)>>>,
    fail_utterances: Arc<AtomicBool>,
}

impl RecordingPipeline {
    pub(crate) fn new() -> Self {
        Self::with_log(CallLog::default())
    }

    pub(crate) fn with_log(log: CallLog) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            log,
            tx,
            rx: Arc::new(tokio::sync::Mutex::new(rx)),
            fail_utterances: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn fail_utterances(&self) {
        self.fail_utterances.store(true, Ordering::SeqCst);
    }

    /// Waits for the next queued utterance.
    pub(crate) async fn next_utterance(&self) -> Option<(String, bool)> {
        let mut rx = self.rx.lock().await;
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Lets spawned tasks run, then counts utterances not yet consumed.
    pub(crate) async fn settled_count(&self) -> usize {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        let mut rx = self.rx.lock().await;
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}

#[async_trait]
impl SpeechPipeline for RecordingPipeline {
    async fn start(&self) -> Result<()> {
        self.log.lock().unwrap().push("start".to_string());
        Ok(())
    }

    async fn say(&self, text: String, allow_interruptions: bool) -> Result<()> {
        self.log.lock().unwrap().push(format!("say:{text}"));
        let _ = self.tx.send((text, allow_interruptions));
        if self.fail_utterances.load(Ordering::SeqCst) {
            bail!("synthesizer offline");
        }
        Ok(())
    }
}

/// Transport fake that records published attributes.
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    log: CallLog,
    pub(crate) attributes: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl RecordingTransport {
    pub(crate) fn with_log(log: CallLog) -> Self {
        Self {
            log,
            attributes: Arc::default(),
        }
    }
}

#[async_trait]
impl SessionTransport for RecordingTransport {
    async fn connect(&self) -> Result<()> {
        self.log.lock().unwrap().push("connect".to_string());
        Ok(())
    }

    async fn set_attributes(&self, attributes: HashMap<String, String>) -> Result<()> {
        self.log.lock().unwrap().push("set_attributes".to_string());
        self.attributes.lock().unwrap().push(attributes);
        Ok(())
    }
}

/// Counts `WARN` events seen by the subscriber it is layered on.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs `f` under a thread-local subscriber and returns how many warnings it logged.
pub(crate) fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, count.load(Ordering::SeqCst))
}
