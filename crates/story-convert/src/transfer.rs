//! Resource Transfer Orchestrator
//!
//! Resolves queued media references through an injected [`Uploader`]:
//! one transfer per normalized URL, bounded batches, cooperative
//! cancellation before every transfer start, and start/finish progress
//! events per unique URL.

use crate::error::{ConvertError, TransferError};
use crate::progress::{CancelProbe, NeverCancel, NoProgress, ProgressEvent, ProgressSink, ProgressStage};
use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use story_graph::{MediaContext, MediaRequest, TransferOutcome};
use tokio::sync::OnceCell;

/// What an uploader did with one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Local resource name, `None` when the media stays remote
    pub resource_name: Option<String>,
}

impl TransferReceipt {
    /// Media now stored under `name`
    #[must_use]
    pub fn stored(name: impl Into<String>) -> Self {
        Self {
            resource_name: Some(name.into()),
        }
    }

    /// Media intentionally left at its remote URL
    #[must_use]
    pub fn remote() -> Self {
        Self { resource_name: None }
    }
}

/// Moves one external media file into story-local storage
///
/// The only I/O boundary of a conversion. Timeouts and retries are the
/// implementation's business.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Transfer the media at the normalized `url`
    async fn transfer(&self, url: &str, context: &MediaContext) -> Result<TransferReceipt, TransferError>;
}

/// Uploader that leaves every reference pointing at its remote URL
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepRemote;

#[async_trait]
impl Uploader for KeepRemote {
    async fn transfer(&self, _url: &str, _context: &MediaContext) -> Result<TransferReceipt, TransferError> {
        Ok(TransferReceipt::remote())
    }
}

/// Result of a transfer phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    /// Normalized URL -> outcome
    pub outcomes: HashMap<String, TransferOutcome>,
    /// Uploader invocations made by this phase
    pub attempted: usize,
    /// Sources now stored locally
    pub transferred: usize,
    /// Sources whose transfer failed
    pub failed: usize,
    /// References served from an earlier outcome instead of a new transfer
    pub reused: usize,
}

/// Deduplicating, cancellable transfer driver
pub struct TransferOrchestrator {
    uploader: Arc<dyn Uploader>,
    progress: Arc<dyn ProgressSink>,
    cancel: Arc<dyn CancelProbe>,
    concurrency: usize,
    cache: DashMap<String, Arc<OnceCell<Resolved>>>,
}

#[derive(Debug, Clone)]
struct Resolved {
    outcome: TransferOutcome,
    failed: bool,
}

impl TransferOrchestrator {
    /// Orchestrator with no progress sink and no cancellation
    #[must_use]
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self {
            uploader,
            progress: Arc::new(NoProgress),
            cancel: Arc::new(NeverCancel),
            concurrency: 4,
            cache: DashMap::new(),
        }
    }

    /// With progress sink
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// With cancellation probe
    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<dyn CancelProbe>) -> Self {
        self.cancel = cancel;
        self
    }

    /// With maximum in-flight transfers (clamped to at least 1)
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Number of unique sources resolved so far
    #[inline]
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.cache.iter().filter(|entry| entry.value().initialized()).count()
    }

    /// Resolve every queued reference
    ///
    /// References are deduplicated by normalized URL, keeping discovery
    /// order. Unique sources run in batches of the configured concurrency.
    /// Cancellation is checked before each not-yet-resolved source starts;
    /// once observed, no further transfer starts and nothing partial is
    /// returned.
    #[tracing::instrument(skip_all, fields(requests = requests.len()))]
    pub async fn resolve_all(&self, requests: &[MediaRequest]) -> Result<TransferReport, ConvertError> {
        let mut unique: IndexMap<String, &MediaRequest> = IndexMap::new();
        for request in requests {
            unique.entry(request.key()).or_insert(request);
        }

        let total = unique.len();
        let mut report = TransferReport {
            reused: requests.len() - total,
            ..TransferReport::default()
        };
        let pending: Vec<(String, &MediaRequest)> = unique.into_iter().collect();

        let mut position = 0;
        for batch in pending.chunks(self.concurrency) {
            let mut started = Vec::with_capacity(batch.len());
            for (key, request) in batch {
                if !self.is_resolved(key) && self.cancel.is_cancelled() {
                    tracing::info!(completed = report.attempted, total, "media transfer cancelled");
                    return Err(ConvertError::Cancelled {
                        completed: report.attempted,
                    });
                }
                position += 1;
                started.push(self.resolve_one(key, request, position, total));
            }

            for (resolved, fresh) in futures::future::join_all(started).await {
                if fresh {
                    report.attempted += 1;
                } else {
                    report.reused += 1;
                }
                if resolved.outcome.transferred {
                    report.transferred += 1;
                }
                if resolved.failed {
                    report.failed += 1;
                }
                report
                    .outcomes
                    .insert(resolved.outcome.source.clone(), resolved.outcome);
            }
        }

        tracing::info!(
            unique = total,
            attempted = report.attempted,
            transferred = report.transferred,
            failed = report.failed,
            "media transfer finished"
        );
        Ok(report)
    }

    fn is_resolved(&self, key: &str) -> bool {
        self.cache.get(key).is_some_and(|cell| cell.initialized())
    }

    /// Resolve one source, sharing the transfer with concurrent callers
    ///
    /// Returns the outcome and whether this call performed the transfer.
    async fn resolve_one(
        &self,
        key: &str,
        request: &MediaRequest,
        position: usize,
        total: usize,
    ) -> (Resolved, bool) {
        let cell = Arc::clone(&self.cache.entry(key.to_string()).or_default());
        let fresh = AtomicBool::new(false);
        let resolved = cell
            .get_or_init(|| async {
                fresh.store(true, Ordering::Relaxed);
                self.transfer(key, request, position, total).await
            })
            .await
            .clone();
        (resolved, fresh.load(Ordering::Relaxed))
    }

    /// The uploader sees the first-discovered source as written; `key` only
    /// identifies the outcome.
    async fn transfer(&self, key: &str, request: &MediaRequest, position: usize, total: usize) -> Resolved {
        let url = request.url.trim();
        self.progress.emit(
            &ProgressEvent::new(ProgressStage::TransferStart, format!("transferring {} {url}", request.context.kind))
                .with_counts(position, total),
        );

        match self.uploader.transfer(url, &request.context).await {
            Ok(TransferReceipt {
                resource_name: Some(name),
            }) => {
                tracing::debug!(url, resource = %name, "media transferred");
                self.progress.emit(
                    &ProgressEvent::new(ProgressStage::TransferDone, format!("transferred {url}"))
                        .with_counts(position, total),
                );
                Resolved {
                    outcome: TransferOutcome::transferred(key, name),
                    failed: false,
                }
            }
            Ok(TransferReceipt { resource_name: None }) => {
                self.progress.emit(
                    &ProgressEvent::new(ProgressStage::TransferDone, format!("kept remote {url}"))
                        .with_counts(position, total),
                );
                Resolved {
                    outcome: TransferOutcome::kept_remote(key),
                    failed: false,
                }
            }
            Err(err) => {
                tracing::warn!(url, error = %err, retryable = err.is_retryable(), "media transfer failed, keeping remote url");
                self.progress.emit(
                    &ProgressEvent::new(ProgressStage::TransferFailed, format!("failed {url}: {err}"))
                        .with_counts(position, total),
                );
                Resolved {
                    outcome: TransferOutcome::kept_remote(key),
                    failed: true,
                }
            }
        }
    }
}

impl std::fmt::Debug for TransferOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOrchestrator")
            .field("concurrency", &self.concurrency)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}
