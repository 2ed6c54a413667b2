//! Export: the push side of the pipeline.
//!
//! An [`Exporter`] is the capability that actually delivers a snapshot (an
//! OTLP driver, a log sink, an in-memory buffer). [`MetricExporter`] wraps
//! one with shutdown and force-flush gating; readers only ever talk to the
//! wrapper.

pub mod memory;
pub mod stdout;

use crate::core::{MetricError, Result};
use crate::data::MetricsData;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use self::memory::InMemoryExporter;
pub use self::stdout::StdoutExporter;

/// A destination for metric snapshots.
///
/// The snapshot is borrowed for the duration of the call; implementations
/// must copy anything they need to retain.
#[async_trait]
pub trait Exporter: Send + Sync + fmt::Debug {
    /// Delivers one collection snapshot.
    async fn export_batch(&self, metrics: &MetricsData) -> Result<()>;
}

/// Gating adapter around an [`Exporter`].
///
/// Tracks shutdown state and whether at least one export has completed,
/// which is what [`force_flush`](Self::force_flush) polls for. The
/// completion flag is scoped to this instance.
#[derive(Debug)]
pub struct MetricExporter {
    target: Arc<dyn Exporter>,
    has_shut_down: AtomicBool,
    export_completed: AtomicBool,
    exports_completed: AtomicU64,
    exports_failed: AtomicU64,
}

impl MetricExporter {
    /// Wraps an export target.
    pub fn new<E: Exporter + 'static>(target: E) -> Self {
        Self {
            target: Arc::new(target),
            has_shut_down: AtomicBool::new(false),
            export_completed: AtomicBool::new(false),
            exports_completed: AtomicU64::new(0),
            exports_failed: AtomicU64::new(0),
        }
    }

    /// Delivers a snapshot to the underlying target.
    ///
    /// Fails once the exporter has shut down, and on any target error; the
    /// error is logged before being surfaced.
    pub async fn export_batch(&self, metrics: &MetricsData) -> Result<()> {
        if self.has_shut_down.load(Ordering::Acquire) {
            return Err(MetricError::export("exporter has shut down"));
        }

        match self.target.export_batch(metrics).await {
            Ok(()) => {
                self.export_completed.store(true, Ordering::Release);
                self.exports_completed.fetch_add(1, Ordering::Relaxed);
                Ok(())
            },
            Err(error) => {
                self.exports_failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(category = error.category(), %error, "metric export failed");
                let reason = match error {
                    MetricError::ExportFailed(reason) => reason,
                    other => other.to_string(),
                };
                Err(MetricError::ExportFailed(reason))
            },
        }
    }

    /// Blocks until an export has completed or `timeout_ms` elapses.
    ///
    /// Completion is rare-event, so this polls with short sleeps rather
    /// than maintaining a wait queue.
    pub async fn force_flush(&self, timeout_ms: u64) -> Result<()> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.export_completed.load(Ordering::Acquire) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(MetricError::ForceFlushTimedOut { timeout_ms });
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Marks the exporter as shut down; subsequent exports fail.
    pub fn shutdown(&self) {
        self.has_shut_down.store(true, Ordering::Release);
    }

    /// True once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.has_shut_down.load(Ordering::Acquire)
    }

    /// Number of exports delivered successfully.
    pub fn exports_completed(&self) -> u64 {
        self.exports_completed.load(Ordering::Relaxed)
    }

    /// Number of exports that failed.
    pub fn exports_failed(&self) -> u64 {
        self.exports_failed.load(Ordering::Relaxed)
    }
}
