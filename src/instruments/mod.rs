//! Instruments: the application-facing recorders of measurements.
//!
//! Each instrument kind is generic over a sealed set of numeric value types
//! and owns its aggregation state, a map from attribute set to slot. The
//! record path is monomorphic; readers snapshot instruments through the
//! type-erased [`InstrumentState`] seam.

pub(crate) mod aggregation;

use crate::core::{AttributeSet, Result};
use crate::data::{MetricData, NumberValue, Temporality};
use self::aggregation::{HistogramState, LastValueState, SumState};
use std::fmt;
use std::sync::Arc;

mod sealed {
    pub trait Sealed {}

    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A numeric type measurements can be recorded in.
///
/// The trait is sealed; only the value types of the supported instrument
/// kinds implement it, so unsupported types are rejected at compile time.
pub trait MeasurementValue: sealed::Sealed + Copy + Send + Sync + fmt::Debug + 'static {
    /// The additive identity.
    fn zero() -> Self;
    /// Adds `rhs`, saturating at the numeric bounds for integer types.
    fn accumulate(self, rhs: Self) -> Self;
    /// The value promoted to f64 for bucket comparison and min/max tracking.
    fn as_f64(self) -> f64;
    /// The value as carried by a data point.
    fn into_number(self) -> NumberValue;
}

macro_rules! impl_integer_value {
    ($($ty:ty),*) => {
        $(impl MeasurementValue for $ty {
            fn zero() -> Self {
                0
            }
            fn accumulate(self, rhs: Self) -> Self {
                self.saturating_add(rhs)
            }
            fn as_f64(self) -> f64 {
                self as f64
            }
            fn into_number(self) -> NumberValue {
                NumberValue::I64(self as i64)
            }
        })*
    };
}

macro_rules! impl_float_value {
    ($($ty:ty),*) => {
        $(impl MeasurementValue for $ty {
            fn zero() -> Self {
                0.0
            }
            fn accumulate(self, rhs: Self) -> Self {
                self + rhs
            }
            fn as_f64(self) -> f64 {
                self as f64
            }
            fn into_number(self) -> NumberValue {
                NumberValue::F64(self as f64)
            }
        })*
    };
}

impl_integer_value!(u16, u32, u64, i16, i32, i64);
impl_float_value!(f32, f64);

/// Value types a [`Counter`] accepts. Unsigned, so deltas cannot be negative.
pub trait CounterValue: MeasurementValue {}
impl CounterValue for u16 {}
impl CounterValue for u32 {}
impl CounterValue for u64 {}

/// Value types an [`UpDownCounter`] accepts.
pub trait UpDownValue: MeasurementValue {}
impl UpDownValue for i16 {}
impl UpDownValue for i32 {}
impl UpDownValue for i64 {}

/// Value types a [`Gauge`] accepts.
pub trait GaugeValue: MeasurementValue {}
impl GaugeValue for i16 {}
impl GaugeValue for i32 {}
impl GaugeValue for i64 {}
impl GaugeValue for f32 {}
impl GaugeValue for f64 {}

/// Value types a [`Histogram`] accepts.
pub trait HistogramValue: MeasurementValue {}
impl HistogramValue for u16 {}
impl HistogramValue for u32 {}
impl HistogramValue for u64 {}
impl HistogramValue for f32 {}
impl HistogramValue for f64 {}

/// The functional group of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// Records monotonically increasing values.
    Counter,
    /// Records values that may increase and decrease.
    UpDownCounter,
    /// Records a distribution of values.
    Histogram,
    /// Records the current value.
    Gauge,
}

impl InstrumentKind {
    /// The single-character tag used in instrument identifiers.
    pub fn tag(self) -> char {
        match self {
            InstrumentKind::Counter => 'c',
            InstrumentKind::UpDownCounter => 'u',
            InstrumentKind::Histogram => 'h',
            InstrumentKind::Gauge => 'g',
        }
    }

    /// The default temporality for streams of this kind.
    pub fn default_temporality(self) -> Temporality {
        match self {
            InstrumentKind::Counter
            | InstrumentKind::UpDownCounter
            | InstrumentKind::Histogram => Temporality::Cumulative,
            InstrumentKind::Gauge => Temporality::Delta,
        }
    }
}

/// Options for creating an instrument.
#[derive(Debug, Clone, Default)]
pub struct InstrumentOptions {
    /// Instrument name (required; validated on creation).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Unit of measurement.
    pub unit: String,
    /// Histogram-specific options; ignored by other kinds.
    pub histogram_options: Option<HistogramOptions>,
}

impl InstrumentOptions {
    /// Creates options with the given name and empty identifying fields.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the description.
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the unit.
    pub fn with_unit<S: Into<String>>(mut self, unit: S) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets histogram options.
    pub fn with_histogram_options(mut self, options: HistogramOptions) -> Self {
        self.histogram_options = Some(options);
        self
    }
}

/// Bucket configuration for histograms.
#[derive(Debug, Clone)]
pub struct HistogramOptions {
    /// Explicit bucket boundaries; the built-in defaults when absent.
    pub explicit_buckets: Option<Vec<f64>>,
    /// Whether min and max are tracked per series.
    pub record_min_max: bool,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            explicit_buckets: None,
            record_min_max: true,
        }
    }
}

impl HistogramOptions {
    /// Sets explicit bucket boundaries.
    pub fn with_explicit_buckets(mut self, boundaries: Vec<f64>) -> Self {
        self.explicit_buckets = Some(boundaries);
        self
    }

    /// Enables or disables min/max tracking.
    pub fn with_record_min_max(mut self, record: bool) -> Self {
        self.record_min_max = record;
        self
    }
}

/// The snapshot seam between an instrument's typed aggregation state and the
/// reader's type-erased traversal.
pub(crate) trait InstrumentState: Send + Sync + fmt::Debug {
    /// Snapshots the current aggregation state into stream data, stamping
    /// every data point with `time_unix_nano`.
    fn snapshot(&self, temporality: Temporality, time_unix_nano: u64) -> MetricData;
}

/// A registered instrument: identity plus type-erased aggregation state.
#[derive(Debug, Clone)]
pub(crate) struct Instrument {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) unit: String,
    pub(crate) kind: InstrumentKind,
    pub(crate) state: Arc<dyn InstrumentState>,
}

/// A monotonic counter.
#[derive(Debug, Clone)]
pub struct Counter<T: CounterValue> {
    state: Arc<SumState<T>>,
}

impl<T: CounterValue> Counter<T> {
    pub(crate) fn new(state: Arc<SumState<T>>) -> Self {
        Self { state }
    }

    /// Adds `delta` to the series identified by `attributes`.
    pub fn add(&self, delta: T, attributes: AttributeSet) {
        self.state.add(delta, attributes);
    }
}

/// A counter whose value may go up and down.
#[derive(Debug, Clone)]
pub struct UpDownCounter<T: UpDownValue> {
    state: Arc<SumState<T>>,
}

impl<T: UpDownValue> UpDownCounter<T> {
    pub(crate) fn new(state: Arc<SumState<T>>) -> Self {
        Self { state }
    }

    /// Adds `delta` (which may be negative) to the series identified by
    /// `attributes`.
    pub fn add(&self, delta: T, attributes: AttributeSet) {
        self.state.add(delta, attributes);
    }
}

/// A last-value gauge.
#[derive(Debug, Clone)]
pub struct Gauge<T: GaugeValue> {
    state: Arc<LastValueState<T>>,
}

impl<T: GaugeValue> Gauge<T> {
    pub(crate) fn new(state: Arc<LastValueState<T>>) -> Self {
        Self { state }
    }

    /// Records `value` for the series identified by `attributes`,
    /// overwriting any previous value.
    pub fn record(&self, value: T, attributes: AttributeSet) {
        self.state.record(value, attributes);
    }
}

/// An explicit-bucket histogram.
#[derive(Debug, Clone)]
pub struct Histogram<T: HistogramValue> {
    state: Arc<HistogramState<T>>,
}

impl<T: HistogramValue> Histogram<T> {
    pub(crate) fn new(state: Arc<HistogramState<T>>) -> Self {
        Self { state }
    }

    /// Records `value` into the distribution of the series identified by
    /// `attributes`.
    pub fn record(&self, value: T, attributes: AttributeSet) {
        self.state.record(value, attributes);
    }
}

/// Validates histogram options and resolves the effective boundaries.
pub(crate) fn resolve_histogram_options(options: Option<&HistogramOptions>) -> Result<(Vec<f64>, bool)> {
    let record_min_max = options.map(|o| o.record_min_max).unwrap_or(true);
    let bounds = match options.and_then(|o| o.explicit_buckets.as_deref()) {
        Some(explicit) => {
            crate::core::validate_explicit_buckets(explicit)?;
            explicit.to_vec()
        },
        None => crate::core::DEFAULT_HISTOGRAM_BOUNDARIES.to_vec(),
    };
    Ok((bounds, record_min_max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_distinct() {
        let tags = [
            InstrumentKind::Counter.tag(),
            InstrumentKind::UpDownCounter.tag(),
            InstrumentKind::Histogram.tag(),
            InstrumentKind::Gauge.tag(),
        ];
        for (i, a) in tags.iter().enumerate() {
            for b in &tags[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_default_temporalities() {
        assert_eq!(InstrumentKind::Counter.default_temporality(), Temporality::Cumulative);
        assert_eq!(
            InstrumentKind::UpDownCounter.default_temporality(),
            Temporality::Cumulative
        );
        assert_eq!(InstrumentKind::Histogram.default_temporality(), Temporality::Cumulative);
        assert_eq!(InstrumentKind::Gauge.default_temporality(), Temporality::Delta);
    }

    #[test]
    fn test_integer_accumulate_saturates() {
        assert_eq!(u16::MAX.accumulate(1), u16::MAX);
        assert_eq!(10u32.accumulate(5), 15);
        assert_eq!(i16::MIN.accumulate(-1), i16::MIN);
        assert_eq!(10i32.accumulate(-4), 6);
    }

    #[test]
    fn test_number_promotion() {
        assert_eq!(7u64.into_number(), NumberValue::I64(7));
        assert_eq!((-3i16).into_number(), NumberValue::I64(-3));
        assert_eq!(1.5f32.into_number(), NumberValue::F64(1.5));
        assert_eq!(2.5f64.as_f64(), 2.5);
    }

    #[test]
    fn test_resolve_histogram_defaults() {
        let (bounds, record_min_max) = resolve_histogram_options(None).unwrap();
        assert_eq!(bounds.len(), 15);
        assert_eq!(bounds[0], 0.0);
        assert_eq!(bounds[14], 10000.0);
        assert!(record_min_max);
    }

    #[test]
    fn test_resolve_histogram_explicit() {
        let options = HistogramOptions::default()
            .with_explicit_buckets(vec![1.0, 10.0, 100.0, 1000.0])
            .with_record_min_max(false);
        let (bounds, record_min_max) = resolve_histogram_options(Some(&options)).unwrap();
        assert_eq!(bounds, vec![1.0, 10.0, 100.0, 1000.0]);
        assert!(!record_min_max);
    }

    #[test]
    fn test_resolve_histogram_rejects_bad_buckets() {
        let options = HistogramOptions::default().with_explicit_buckets(vec![10.0, 1.0]);
        assert!(resolve_histogram_options(Some(&options)).is_err());
    }
}
