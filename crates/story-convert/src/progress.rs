//! Observation hooks: progress events, trace steps, cancellation
//!
//! All three are injected per call through
//! [`ConvertOptions`](crate::converter::ConvertOptions). Emission is
//! synchronous and can never change the outcome of a conversion.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Conversion stage a progress event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStage {
    /// Legacy format detection
    Classify,
    /// Graph construction
    Build,
    /// A unique media transfer is about to start
    TransferStart,
    /// A unique media transfer finished; the media is stored locally or
    /// intentionally kept remote by the uploader
    TransferDone,
    /// A unique media transfer failed; the remote URL is kept
    TransferFailed,
    /// Structural validation
    Validate,
    /// Conversion finished
    Done,
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Stage tag
    pub stage: ProgressStage,
    /// Human-readable message
    pub message: String,
    /// Position within the stage, 1-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    /// Total work items of the stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl ProgressEvent {
    /// Event without counters
    #[must_use]
    pub fn new(stage: ProgressStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            current: None,
            total: None,
        }
    }

    /// Add `(current, total)` counters
    #[must_use]
    pub fn with_counts(mut self, current: usize, total: usize) -> Self {
        self.current = Some(current);
        self.total = Some(total);
        self
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    /// Handle one event
    fn emit(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: &ProgressEvent) {
        self(event);
    }
}

/// Progress sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: &ProgressEvent) {}
}

/// Cooperative cancellation predicate
pub trait CancelProbe: Send + Sync {
    /// Whether the caller asked to stop
    fn is_cancelled(&self) -> bool;
}

impl<F> CancelProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Probe that never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelProbe for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared flag flipped by the caller to cancel a running conversion
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// New, not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl CancelProbe for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Observer of conversion steps
///
/// Purely observational; default methods do nothing.
pub trait TraceSink: Send + Sync {
    /// A step is starting
    fn on_enter(&self, _step: &str, _payload: &Value) {}

    /// A step finished
    fn on_exit(&self, _step: &str, _payload: &Value) {}
}

/// Trace sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl TraceSink for NoTrace {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |event: &ProgressEvent| seen.lock().unwrap().push(event.stage);
        sink.emit(&ProgressEvent::new(ProgressStage::Build, "building"));
        assert_eq!(*seen.lock().unwrap(), vec![ProgressStage::Build]);
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let probe: Arc<dyn CancelProbe> = Arc::new(flag.clone());
        assert!(!probe.is_cancelled());
        flag.cancel();
        assert!(probe.is_cancelled());
    }

    #[test]
    fn test_event_serializes_without_missing_counts() {
        let value = serde_json::to_value(ProgressEvent::new(ProgressStage::Done, "ok")).unwrap();
        assert_eq!(value, serde_json::json!({"stage": "done", "message": "ok"}));

        let value = serde_json::to_value(
            ProgressEvent::new(ProgressStage::TransferStart, "a.png").with_counts(1, 3),
        )
        .unwrap();
        assert_eq!(value["current"], 1);
        assert_eq!(value["total"], 3);
    }
}
