//! Progress and log reporting
//!
//! The workflows report to a `ProgressSink` synchronously. Every call is
//! expected to be observable by the caller immediately; nothing is buffered.

use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

/// Named steps of the upload and download workflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Translate,
    AddKeys,
    AddTranslations,
    Build,
    Download,
    Extract,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Translate => "translate",
            Stage::AddKeys => "add-keys",
            Stage::AddTranslations => "add-translations",
            Stage::Build => "build",
            Stage::Download => "download",
            Stage::Extract => "extract",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// One observation delivered to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Message(String),
    Progress {
        stage: Stage,
        current: usize,
        total: usize,
    },
}

/// Receiver of workflow messages and numeric progress
pub trait ProgressSink: Send + Sync {
    /// Human readable log line
    fn report(&self, message: &str);

    /// `current` of `total` units of `stage` are done. `total` may be an estimate.
    fn report_progress(&self, stage: Stage, current: usize, total: usize);
}

/// Forwards everything to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn report_progress(&self, stage: Stage, current: usize, total: usize) {
        tracing::debug!(%stage, current, total, "progress");
    }
}

/// Sends events over a channel so another task can render them
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<SyncEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<SyncEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: SyncEvent) {
        // A dropped receiver means nobody is watching any more.
        if self.sender.send(event).is_err() {
            tracing::trace!("progress receiver dropped");
        }
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, message: &str) {
        self.send(SyncEvent::Message(message.to_string()));
    }

    fn report_progress(&self, stage: Stage, current: usize, total: usize) {
        self.send(SyncEvent::Progress {
            stage,
            current,
            total,
        });
    }
}

/// Keeps every event in memory. Handy for tests and for rendering after the fact.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SyncEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SyncEvent::Message(message) => Some(message),
                SyncEvent::Progress { .. } => None,
            })
            .collect()
    }

    /// The (current, total) pairs reported for one stage, in order
    pub fn progress_for(&self, stage: Stage) -> Vec<(usize, usize)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SyncEvent::Progress {
                    stage: s,
                    current,
                    total,
                } if s == stage => Some((current, total)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SyncEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressSink for MemorySink {
    fn report(&self, message: &str) {
        self.push(SyncEvent::Message(message.to_string()));
    }

    fn report_progress(&self, stage: Stage, current: usize, total: usize) {
        self.push(SyncEvent::Progress {
            stage,
            current,
            total,
        });
    }
}
