//! Aggregation state: per-instrument maps from attribute set to slot.
//!
//! The maps are sharded concurrent maps; updates to a single slot are
//! linearizable under the shard lock, and recording never blocks on I/O.

use crate::core::AttributeSet;
use crate::data::{
    Gauge, Histogram, HistogramDataPoint, MetricData, NumberDataPoint, Sum, Temporality,
};
use crate::instruments::{InstrumentState, MeasurementValue};
use dashmap::DashMap;

/// Running-sum aggregation for counters and up/down counters.
#[derive(Debug)]
pub(crate) struct SumState<T: MeasurementValue> {
    slots: DashMap<AttributeSet, T>,
    monotonic: bool,
}

impl<T: MeasurementValue> SumState<T> {
    pub(crate) fn new(monotonic: bool) -> Self {
        Self {
            slots: DashMap::new(),
            monotonic,
        }
    }

    pub(crate) fn add(&self, delta: T, attributes: AttributeSet) {
        let mut slot = self.slots.entry(attributes).or_insert_with(T::zero);
        *slot = slot.accumulate(delta);
    }
}

impl<T: MeasurementValue> InstrumentState for SumState<T> {
    fn snapshot(&self, temporality: Temporality, time_unix_nano: u64) -> MetricData {
        let data_points = self
            .slots
            .iter()
            .map(|entry| NumberDataPoint {
                attributes: entry.key().clone(),
                time_unix_nano,
                value: entry.value().into_number(),
            })
            .collect();
        MetricData::Sum(Sum {
            data_points,
            aggregation_temporality: temporality,
            is_monotonic: self.monotonic,
        })
    }
}

/// Last-value aggregation for gauges.
#[derive(Debug)]
pub(crate) struct LastValueState<T: MeasurementValue> {
    slots: DashMap<AttributeSet, T>,
}

impl<T: MeasurementValue> LastValueState<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    pub(crate) fn record(&self, value: T, attributes: AttributeSet) {
        self.slots.insert(attributes, value);
    }
}

impl<T: MeasurementValue> InstrumentState for LastValueState<T> {
    fn snapshot(&self, _temporality: Temporality, time_unix_nano: u64) -> MetricData {
        let data_points = self
            .slots
            .iter()
            .map(|entry| NumberDataPoint {
                attributes: entry.key().clone(),
                time_unix_nano,
                value: entry.value().into_number(),
            })
            .collect();
        MetricData::Gauge(Gauge { data_points })
    }
}

/// A single histogram series.
#[derive(Debug)]
struct HistogramSlot<T: MeasurementValue> {
    sum: T,
    count: u64,
    bucket_counts: Vec<u64>,
    min: f64,
    max: f64,
}

impl<T: MeasurementValue> HistogramSlot<T> {
    fn new(bucket_len: usize) -> Self {
        Self {
            sum: T::zero(),
            count: 0,
            // One extra slot: the overflow bucket past the last boundary.
            bucket_counts: vec![0; bucket_len + 1],
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

/// Explicit-bucket histogram aggregation.
#[derive(Debug)]
pub(crate) struct HistogramState<T: MeasurementValue> {
    slots: DashMap<AttributeSet, HistogramSlot<T>>,
    bounds: Vec<f64>,
    record_min_max: bool,
}

impl<T: MeasurementValue> HistogramState<T> {
    pub(crate) fn new(bounds: Vec<f64>, record_min_max: bool) -> Self {
        Self {
            slots: DashMap::new(),
            bounds,
            record_min_max,
        }
    }

    pub(crate) fn record(&self, value: T, attributes: AttributeSet) {
        let v = value.as_f64();
        let index = bucket_index(&self.bounds, v);

        let mut slot = self
            .slots
            .entry(attributes)
            .or_insert_with(|| HistogramSlot::new(self.bounds.len()));
        slot.sum = slot.sum.accumulate(value);
        slot.count += 1;
        slot.bucket_counts[index] += 1;
        if self.record_min_max {
            slot.min = slot.min.min(v);
            slot.max = slot.max.max(v);
        }
    }
}

impl<T: MeasurementValue> InstrumentState for HistogramState<T> {
    fn snapshot(&self, temporality: Temporality, time_unix_nano: u64) -> MetricData {
        let data_points = self
            .slots
            .iter()
            .map(|entry| {
                let slot = entry.value();
                HistogramDataPoint {
                    attributes: entry.key().clone(),
                    time_unix_nano,
                    count: slot.count,
                    sum: slot.sum.as_f64(),
                    bucket_counts: slot.bucket_counts.clone(),
                    explicit_bounds: self.bounds.clone(),
                    min: self.record_min_max.then_some(slot.min),
                    max: self.record_min_max.then_some(slot.max),
                }
            })
            .collect();
        MetricData::Histogram(Histogram {
            data_points,
            aggregation_temporality: temporality,
        })
    }
}

/// Selects the bucket for `value`: the first boundary that is greater than
/// or equal to it wins; values past the last boundary, and NaN, land in the
/// overflow bucket.
fn bucket_index(bounds: &[f64], value: f64) -> usize {
    bounds
        .iter()
        .position(|bound| *bound >= value)
        .unwrap_or(bounds.len())
}
