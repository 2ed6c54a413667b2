//! The internal metric model handed to exporters.
//!
//! Snapshots produced by a reader are plain owned data, serializable with
//! serde and convertible to OTLP protobuf messages via [`transform`]. The
//! exporter receives a borrowed snapshot and must copy anything it wants to
//! retain beyond the call.

pub mod transform;

use crate::core::{AttributeSet, KeyValue};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Whether emitted sums are since-process-start or since-last-collect.
///
/// The discriminants are the OTLP `AggregationTemporality` enum values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Temporality {
    /// Values accumulate since the last collection.
    Delta = 1,
    /// Values accumulate since the start of the process.
    Cumulative = 2,
}

impl Temporality {
    /// The OTLP wire value for this temporality.
    pub fn wire_value(self) -> i32 {
        self as i32
    }
}

/// A full collection snapshot: everything one reader pass produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsData {
    /// One entry per meter that contributed metrics.
    pub resource_metrics: Vec<ResourceMetrics>,
}

/// Metrics from a single resource (one meter's attribute set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    /// Resource attributes, taken from the owning meter.
    pub resource: Resource,
    /// Scoped metric groups under this resource.
    pub scope_metrics: Vec<ScopeMetrics>,
}

/// The entity producing telemetry, described by its attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Attributes describing the resource.
    pub attributes: Vec<KeyValue>,
}

/// Metrics produced by one instrumentation scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeMetrics {
    /// The scope that produced these metrics, if known.
    pub scope: Option<InstrumentationScope>,
    /// The metric streams.
    pub metrics: Vec<Metric>,
}

/// A named and versioned instrumentation scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationScope {
    /// Scope name, usually a library or component name.
    pub name: String,
    /// Scope version.
    pub version: String,
    /// Schema URL the scope adheres to.
    pub schema_url: Option<String>,
}

/// One metric stream: identity plus aggregated data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Instrument name.
    pub name: String,
    /// Instrument description.
    pub description: String,
    /// Instrument unit.
    pub unit: String,
    /// The aggregated data for this stream.
    pub data: MetricData,
}

/// The aggregated payload of a metric stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricData {
    /// A monotonic or non-monotonic sum.
    Sum(Sum),
    /// A last-value gauge.
    Gauge(Gauge),
    /// An explicit-bucket histogram.
    Histogram(Histogram),
}

/// Sum aggregation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sum {
    /// One point per attribute set.
    pub data_points: Vec<NumberDataPoint>,
    /// Reported temporality of the stream.
    pub aggregation_temporality: Temporality,
    /// True when the sum never decreases (counters).
    pub is_monotonic: bool,
}

/// Gauge aggregation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gauge {
    /// One point per attribute set.
    pub data_points: Vec<NumberDataPoint>,
}

/// Explicit-bucket histogram aggregation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// One point per attribute set.
    pub data_points: Vec<HistogramDataPoint>,
    /// Reported temporality of the stream.
    pub aggregation_temporality: Temporality,
}

/// A scalar value carried by a sum or gauge point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumberValue {
    /// Signed integer value
    I64(i64),
    /// Floating point value
    F64(f64),
}

/// A single sum or gauge data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberDataPoint {
    /// The attribute set identifying this series.
    pub attributes: AttributeSet,
    /// Snapshot timestamp in nanoseconds since the Unix epoch.
    pub time_unix_nano: u64,
    /// The aggregated value.
    pub value: NumberValue,
}

/// A single histogram data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramDataPoint {
    /// The attribute set identifying this series.
    pub attributes: AttributeSet,
    /// Snapshot timestamp in nanoseconds since the Unix epoch.
    pub time_unix_nano: u64,
    /// Number of recorded values.
    pub count: u64,
    /// Sum of recorded values.
    pub sum: f64,
    /// Per-bucket counts; one entry more than `explicit_bounds`, the last
    /// being the overflow bucket.
    pub bucket_counts: Vec<u64>,
    /// The bucket boundaries.
    pub explicit_bounds: Vec<f64>,
    /// Smallest recorded value, when min/max recording is enabled.
    pub min: Option<f64>,
    /// Largest recorded value, when min/max recording is enabled.
    pub max: Option<f64>,
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
pub(crate) fn now_unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporality_wire_values() {
        assert_eq!(Temporality::Delta.wire_value(), 1);
        assert_eq!(Temporality::Cumulative.wire_value(), 2);
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let data = MetricsData {
            resource_metrics: vec![ResourceMetrics {
                resource: Resource {
                    attributes: vec![KeyValue::new("service.name", "checkout")],
                },
                scope_metrics: vec![ScopeMetrics {
                    scope: Some(InstrumentationScope {
                        name: "checkout".into(),
                        version: "0.1.0".into(),
                        schema_url: None,
                    }),
                    metrics: vec![Metric {
                        name: "requests".into(),
                        description: String::new(),
                        unit: "1".into(),
                        data: MetricData::Sum(Sum {
                            data_points: vec![NumberDataPoint {
                                attributes: AttributeSet::empty(),
                                time_unix_nano: 12345,
                                value: NumberValue::I64(10),
                            }],
                            aggregation_temporality: Temporality::Cumulative,
                            is_monotonic: true,
                        }),
                    }],
                }],
            }],
        };

        let json = serde_json::to_string(&data).expect("serialize");
        let back: MetricsData = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(data, back);
    }

    #[test]
    fn test_now_unix_nanos_is_monotonic_enough() {
        let a = now_unix_nanos();
        let b = now_unix_nanos();
        assert!(b >= a);
        assert!(a > 0);
    }
}
