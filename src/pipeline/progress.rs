//! Per-call progress reporting.
//!
//! Each call gets its own channel, created with [`channel`]. There is no
//! progress state on the coordinator itself, so concurrent calls on one
//! coordinator never see each other's events.
//!
//! Single-image calls report [`Stage`] checkpoints; batch calls report
//! `completed / total` after each item.

use serde::Serialize;
use tokio::sync::mpsc;

/// Checkpoints of a single-image call, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Started,
    SizeEstimated,
    Resized,
    Encoded,
    BudgetChecked,
    Finished,
}

impl Stage {
    /// Fraction complete at this checkpoint.
    pub fn fraction(&self) -> f64 {
        match self {
            Stage::Started => 0.0,
            Stage::SizeEstimated => 0.1,
            Stage::Resized => 0.3,
            Stage::Encoded => 0.6,
            Stage::BudgetChecked => 0.8,
            Stage::Finished => 1.0,
        }
    }
}

/// One progress update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    Stage { stage: Stage },
    Batch { completed: usize, total: usize },
}

impl ProgressEvent {
    /// Fraction complete in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        match self {
            ProgressEvent::Stage { stage } => stage.fraction(),
            ProgressEvent::Batch { total: 0, .. } => 1.0,
            ProgressEvent::Batch { completed, total } => *completed as f64 / *total as f64,
        }
    }
}

/// Sending half of a progress channel.
///
/// Sending never blocks and never fails: if the receiver was dropped the
/// caller simply stopped listening.
#[derive(Debug, Clone, Default)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSender {
    /// A sender that discards every event.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn report(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub(crate) fn stage(&self, stage: Stage) {
        self.report(ProgressEvent::Stage { stage });
    }

    pub(crate) fn batch(&self, completed: usize, total: usize) {
        self.report(ProgressEvent::Batch { completed, total });
    }
}

/// Receiving half of a progress channel.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Wait for the next event; `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Next buffered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }

    /// All currently buffered events.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Create a progress channel for one call.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx: Some(tx) }, ProgressReceiver { rx })
}
