//! Periodic exporting reader: a [`MetricReader`] driven by a background
//! worker that collects on a fixed interval.

use crate::core::Result;
use crate::export::MetricExporter;
use crate::reader::MetricReader;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Default time between collection passes.
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_millis(60_000);
/// Default upper bound on a single collect-and-export pass.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Timing configuration for the periodic reader.
#[derive(Debug, Clone)]
pub struct PeriodicReaderConfig {
    /// Time between collection passes.
    pub export_interval: Duration,
    /// Upper bound on a single collect-and-export pass.
    pub export_timeout: Duration,
}

impl Default for PeriodicReaderConfig {
    fn default() -> Self {
        Self {
            export_interval: DEFAULT_EXPORT_INTERVAL,
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
        }
    }
}

impl PeriodicReaderConfig {
    /// Sets the export interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.export_interval = interval;
        self
    }

    /// Sets the export timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = timeout;
        self
    }
}

/// Wraps a [`MetricReader`] in a background collection loop.
///
/// [`start`](Self::start) spawns the worker on the current tokio runtime
/// and returns the embedded reader for attachment to a provider. The worker
/// collects once per interval while a provider is attached; collect errors
/// are logged, never fatal. Shutdown is cooperative and observed within one
/// interval at worst.
#[derive(Debug)]
pub struct PeriodicExportingMetricReader {
    reader: Arc<MetricReader>,
    config: PeriodicReaderConfig,
    shutting_down: Arc<AtomicBool>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicExportingMetricReader {
    /// Creates a periodic reader over `exporter` with default timing.
    pub fn new(exporter: MetricExporter) -> Self {
        Self::with_config(exporter, PeriodicReaderConfig::default())
    }

    /// Creates a periodic reader with explicit timing.
    pub fn with_config(exporter: MetricExporter, config: PeriodicReaderConfig) -> Self {
        Self {
            reader: Arc::new(MetricReader::new(exporter)),
            config,
            shutting_down: Arc::new(AtomicBool::new(false)),
            shutdown_tx: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the background worker and returns the embedded reader for
    /// attachment to a provider. Spawning twice is a no-op.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&self) -> Arc<MetricReader> {
        let mut worker = self.worker.lock();
        if worker.is_none() {
            let (tx, rx) = oneshot::channel();
            *self.shutdown_tx.lock() = Some(tx);
            *worker = Some(tokio::spawn(run_worker(
                Arc::clone(&self.reader),
                Arc::clone(&self.shutting_down),
                self.config.clone(),
                rx,
            )));
        }
        Arc::clone(&self.reader)
    }

    /// The embedded reader.
    pub fn reader(&self) -> Arc<MetricReader> {
        Arc::clone(&self.reader)
    }

    /// Stops the worker and shuts the embedded reader down (which performs
    /// the final collect and shuts the exporter down). Idempotent.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutting_down.store(true, Ordering::Release);
        self.reader.shutdown().await?;

        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(error) = worker.await {
                tracing::warn!(%error, "periodic reader worker did not stop cleanly");
            }
        }
        Ok(())
    }

    /// True once shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }
}

async fn run_worker(
    reader: Arc<MetricReader>,
    shutting_down: Arc<AtomicBool>,
    config: PeriodicReaderConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut interval = tokio::time::interval(config.export_interval);
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = interval.tick() => {
                if shutting_down.load(Ordering::Acquire) {
                    break;
                }
                if !reader.has_live_provider() {
                    continue;
                }
                match tokio::time::timeout(config.export_timeout, reader.collect()).await {
                    Ok(Ok(())) => {},
                    Ok(Err(error)) if error.is_recoverable() => {
                        tracing::warn!(
                            category = error.category(),
                            %error,
                            "periodic collect failed, retrying next interval"
                        );
                    },
                    Ok(Err(error)) => {
                        tracing::error!(category = error.category(), %error, "periodic collect failed");
                    },
                    Err(_) => {
                        tracing::warn!(
                            timeout_ms = config.export_timeout.as_millis() as u64,
                            "periodic collect timed out"
                        );
                    },
                }
            },
        }
    }
}
