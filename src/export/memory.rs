//! In-memory export target, the reference sink for tests.

use crate::core::Result;
use crate::data::MetricsData;
use crate::export::Exporter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Stores a deep copy of the most recent snapshot.
///
/// Clones share the same cell, so a test can keep one handle while the
/// pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExporter {
    last: Arc<Mutex<Option<MetricsData>>>,
}

impl InMemoryExporter {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an owned copy of the most recent snapshot, if any.
    pub fn fetch(&self) -> Option<MetricsData> {
        self.last.lock().clone()
    }

    /// Drops the stored snapshot.
    pub fn clear(&self) {
        *self.last.lock() = None;
    }
}

#[async_trait]
impl Exporter for InMemoryExporter {
    async fn export_batch(&self, metrics: &MetricsData) -> Result<()> {
        *self.last.lock() = Some(metrics.clone());
        Ok(())
    }
}
