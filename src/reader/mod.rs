//! Metric readers: the pull side of the pipeline.
//!
//! A [`MetricReader`] walks its provider's meters, snapshots every
//! instrument into the internal metric model, and hands the result to its
//! exporter. The [`periodic`] module wraps a reader in a background loop.

pub mod periodic;

use crate::core::{MetricError, Result};
use crate::data::{self, MetricsData, Temporality};
use crate::export::MetricExporter;
use crate::instruments::{InstrumentKind, InstrumentState};
use crate::provider::ProviderInner;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

pub use self::periodic::{PeriodicExportingMetricReader, PeriodicReaderConfig};

/// Selects the temporality reported for an instrument kind.
pub trait TemporalitySelector: Send + Sync + fmt::Debug {
    /// The temporality for streams of `kind`.
    fn temporality(&self, kind: InstrumentKind) -> Temporality;
}

/// The default temporality selection: Cumulative for the sum-like kinds,
/// Delta for gauges.
///
/// Slots do not keep per-collection start timestamps, so a Delta selection
/// changes only the temporality reported on the stream; the emitted values
/// remain cumulative.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTemporalitySelector;

impl TemporalitySelector for DefaultTemporalitySelector {
    fn temporality(&self, kind: InstrumentKind) -> Temporality {
        kind.default_temporality()
    }
}

/// The rule mapping raw measurements to stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Exclude the instrument from snapshots entirely.
    Drop,
    /// Running sum.
    Sum,
    /// Most recently written value.
    LastValue,
    /// Explicit-bucket histogram.
    ExplicitBucketHistogram,
}

/// Selects the aggregation for an instrument kind.
pub trait AggregationSelector: Send + Sync + fmt::Debug {
    /// The aggregation for instruments of `kind`.
    fn aggregation(&self, kind: InstrumentKind) -> Aggregation;
}

/// The default aggregation per kind. Returning [`Aggregation::Drop`] from a
/// custom selector removes that kind from snapshots; other overrides are
/// not re-aggregated.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAggregationSelector;

impl AggregationSelector for DefaultAggregationSelector {
    fn aggregation(&self, kind: InstrumentKind) -> Aggregation {
        match kind {
            InstrumentKind::Counter | InstrumentKind::UpDownCounter => Aggregation::Sum,
            InstrumentKind::Gauge => Aggregation::LastValue,
            InstrumentKind::Histogram => Aggregation::ExplicitBucketHistogram,
        }
    }
}

/// Snapshots instrument state on demand and pushes it to an exporter.
///
/// A reader is attached to at most one provider, once; it holds only a weak
/// reference back, so it never keeps a dropped provider alive.
#[derive(Debug)]
pub struct MetricReader {
    exporter: MetricExporter,
    temporality: Box<dyn TemporalitySelector>,
    aggregation: Box<dyn AggregationSelector>,
    provider: RwLock<Weak<ProviderInner>>,
    attached: AtomicBool,
    has_shut_down: AtomicBool,
}

impl MetricReader {
    /// Creates a reader pushing to `exporter`, with default selectors.
    pub fn new(exporter: MetricExporter) -> Self {
        Self {
            exporter,
            temporality: Box::new(DefaultTemporalitySelector),
            aggregation: Box::new(DefaultAggregationSelector),
            provider: RwLock::new(Weak::new()),
            attached: AtomicBool::new(false),
            has_shut_down: AtomicBool::new(false),
        }
    }

    /// Replaces the temporality selector.
    pub fn with_temporality_selector<S: TemporalitySelector + 'static>(mut self, selector: S) -> Self {
        self.temporality = Box::new(selector);
        self
    }

    /// Replaces the aggregation selector.
    pub fn with_aggregation_selector<S: AggregationSelector + 'static>(mut self, selector: S) -> Self {
        self.aggregation = Box::new(selector);
        self
    }

    /// Binds this reader to a provider. A reader can be attached once.
    pub(crate) fn attach(&self, provider: Weak<ProviderInner>) -> Result<()> {
        if self.attached.swap(true, Ordering::AcqRel) {
            return Err(MetricError::MetricReaderAlreadyAttached);
        }
        *self.provider.write() = provider;
        Ok(())
    }

    /// True once the reader has been attached to a provider.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub(crate) fn has_live_provider(&self) -> bool {
        self.provider.read().strong_count() > 0
    }

    /// The exporter this reader pushes to.
    pub fn exporter(&self) -> &MetricExporter {
        &self.exporter
    }

    /// Snapshots all instruments and exports the result.
    ///
    /// A no-op after shutdown. Fails when no provider is attached (or the
    /// provider has been dropped) and when the export fails.
    pub async fn collect(&self) -> Result<()> {
        if self.has_shut_down.load(Ordering::Acquire) {
            return Ok(());
        }
        self.collect_inner().await
    }

    async fn collect_inner(&self) -> Result<()> {
        let provider = self
            .provider
            .read()
            .upgrade()
            .ok_or(MetricError::CollectFailedOnMissingMeterProvider)?;

        let meters: Vec<_> = provider.meters.read().values().cloned().collect();
        let time_unix_nano = data::now_unix_nanos();

        let mut resource_metrics = Vec::with_capacity(meters.len());
        for meter in meters {
            let mut metrics = Vec::new();
            for instrument in meter.instruments() {
                if self.aggregation.aggregation(instrument.kind) == Aggregation::Drop {
                    tracing::debug!(instrument = %instrument.name, "instrument dropped by aggregation selector");
                    continue;
                }
                let temporality = self.temporality.temporality(instrument.kind);
                metrics.push(data::Metric {
                    name: instrument.name.clone(),
                    description: instrument.description.clone(),
                    unit: instrument.unit.clone(),
                    data: instrument.state.snapshot(temporality, time_unix_nano),
                });
            }
            resource_metrics.push(data::ResourceMetrics {
                resource: data::Resource {
                    attributes: meter.attributes().iter().cloned().collect(),
                },
                scope_metrics: vec![data::ScopeMetrics {
                    scope: Some(meter.scope()),
                    metrics,
                }],
            });
        }

        self.exporter
            .export_batch(&MetricsData { resource_metrics })
            .await
    }

    /// Shuts the reader down: one final collect (errors logged, not
    /// propagated), then the shutdown flag is set and the exporter is shut
    /// down. Idempotent; later collects are no-ops.
    pub async fn shutdown(&self) -> Result<()> {
        if self.has_shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(error) = self.collect_inner().await {
            tracing::error!(category = error.category(), %error, "final collect during reader shutdown failed");
        }
        self.exporter.shutdown();
        Ok(())
    }

    /// True once [`shutdown`](Self::shutdown) has run.
    pub fn is_shutdown(&self) -> bool {
        self.has_shut_down.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttributeSet, KeyValue};
    use crate::export::InMemoryExporter;
    use crate::instruments::InstrumentOptions;
    use crate::meter::MeterOptions;
    use crate::provider::MeterProvider;
    use std::sync::Arc;

    fn reader_with_sink() -> (Arc<MetricReader>, InMemoryExporter) {
        let sink = InMemoryExporter::new();
        let reader = Arc::new(MetricReader::new(MetricExporter::new(sink.clone())));
        (reader, sink)
    }

    #[tokio::test]
    async fn test_collect_without_provider_fails() {
        let (reader, _sink) = reader_with_sink();
        let result = reader.collect().await;
        assert!(matches!(
            result,
            Err(MetricError::CollectFailedOnMissingMeterProvider)
        ));
    }

    #[tokio::test]
    async fn test_reader_attaches_only_once() {
        let (reader, _sink) = reader_with_sink();
        let first = MeterProvider::new();
        let second = MeterProvider::new();

        first.add_reader(Arc::clone(&reader)).unwrap();
        assert!(reader.is_attached());

        let again = second.add_reader(Arc::clone(&reader));
        assert!(matches!(again, Err(MetricError::MetricReaderAlreadyAttached)));

        // Re-attaching to the same provider is rejected too.
        let same = first.add_reader(reader);
        assert!(matches!(same, Err(MetricError::MetricReaderAlreadyAttached)));
    }

    #[tokio::test]
    async fn test_collect_builds_resource_scope_tree() {
        let (reader, sink) = reader_with_sink();
        let provider = MeterProvider::new();
        provider.add_reader(Arc::clone(&reader)).unwrap();

        let meter = provider
            .get_meter(
                MeterOptions::new("payments")
                    .with_version("1.2.3")
                    .with_attributes(AttributeSet::new(vec![KeyValue::new("host", "a1")])),
            )
            .unwrap();
        let counter = meter
            .create_counter::<u64>(InstrumentOptions::new("requests").with_unit("1"))
            .unwrap();
        counter.add(3, AttributeSet::empty());

        reader.collect().await.unwrap();

        let snapshot = sink.fetch().expect("snapshot exported");
        assert_eq!(snapshot.resource_metrics.len(), 1);
        let rm = &snapshot.resource_metrics[0];
        assert_eq!(rm.resource.attributes, vec![KeyValue::new("host", "a1")]);
        assert_eq!(rm.scope_metrics.len(), 1);

        let scope = rm.scope_metrics[0].scope.as_ref().expect("scope");
        assert_eq!(scope.name, "payments");
        assert_eq!(scope.version, "1.2.3");
        assert_eq!(rm.scope_metrics[0].metrics.len(), 1);
        assert_eq!(rm.scope_metrics[0].metrics[0].name, "requests");
    }

    #[tokio::test]
    async fn test_collect_after_shutdown_is_noop() {
        let (reader, sink) = reader_with_sink();
        let provider = MeterProvider::new();
        provider.add_reader(Arc::clone(&reader)).unwrap();

        reader.shutdown().await.unwrap();
        assert!(reader.is_shutdown());
        assert!(reader.exporter().is_shutdown());
        // The final collect during shutdown exported once.
        assert!(sink.fetch().is_some());
        sink.clear();

        // No-op, no error, nothing exported.
        reader.collect().await.unwrap();
        assert!(sink.fetch().is_none());

        // Shutdown stays idempotent.
        reader.shutdown().await.unwrap();
    }

    #[derive(Debug)]
    struct DropEverything;

    impl AggregationSelector for DropEverything {
        fn aggregation(&self, _kind: InstrumentKind) -> Aggregation {
            Aggregation::Drop
        }
    }

    #[tokio::test]
    async fn test_drop_aggregation_skips_instruments() {
        let sink = InMemoryExporter::new();
        let reader = Arc::new(
            MetricReader::new(MetricExporter::new(sink.clone()))
                .with_aggregation_selector(DropEverything),
        );
        let provider = MeterProvider::new();
        provider.add_reader(Arc::clone(&reader)).unwrap();

        let meter = provider.get_meter(MeterOptions::new("scope")).unwrap();
        let counter = meter
            .create_counter::<u32>(InstrumentOptions::new("requests"))
            .unwrap();
        counter.add(1, AttributeSet::empty());

        reader.collect().await.unwrap();
        let snapshot = sink.fetch().unwrap();
        assert!(snapshot.resource_metrics[0].scope_metrics[0].metrics.is_empty());
    }
}
