//! Line-oriented JSON export target.
//!
//! Writes each snapshot as one JSON line, to stdout by default or to any
//! caller-supplied writer. Useful as a log-style destination and for
//! debugging pipelines without a collector.

use crate::core::{MetricError, Result};
use crate::data::MetricsData;
use crate::export::Exporter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;

/// Serializes snapshots to JSON lines on a writer.
pub struct StdoutExporter {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl StdoutExporter {
    /// Creates an exporter writing to stdout.
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    /// Creates an exporter writing to the given writer.
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl Default for StdoutExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdoutExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdoutExporter").finish_non_exhaustive()
    }
}

#[async_trait]
impl Exporter for StdoutExporter {
    async fn export_batch(&self, metrics: &MetricsData) -> Result<()> {
        let line = serde_json::to_string(metrics)
            .map_err(|e| MetricError::export(format!("failed to encode snapshot: {}", e)))?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|e| MetricError::export(format!("failed to write snapshot: {}", e)))
    }
}
