//! Meters: named instrumentation scopes that own instruments.

use crate::core::{
    instrument_identifier, meter_identifier, validate_instrument_options, AttributeSet,
    MetricError, Result,
};
use crate::data::InstrumentationScope;
use crate::instruments::{
    aggregation::{HistogramState, LastValueState, SumState},
    resolve_histogram_options, Counter, CounterValue, Gauge, GaugeValue, Histogram,
    HistogramValue, Instrument, InstrumentKind, InstrumentOptions, UpDownCounter, UpDownValue,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Default meter version when none is given.
pub const DEFAULT_METER_VERSION: &str = "0.1.0";

/// Options identifying a meter.
///
/// A meter's identity is the hash of name, version, and schema URL;
/// attributes do not participate in identity but must match on repeated
/// lookups of the same meter.
#[derive(Debug, Clone)]
pub struct MeterOptions {
    /// Scope name, usually a library or component name.
    pub name: String,
    /// Scope version.
    pub version: String,
    /// Schema URL the scope adheres to.
    pub schema_url: Option<String>,
    /// Resource attributes attached to everything this meter produces.
    pub attributes: Option<AttributeSet>,
}

impl MeterOptions {
    /// Creates options with the given name and the default version.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            version: DEFAULT_METER_VERSION.to_owned(),
            schema_url: None,
            attributes: None,
        }
    }

    /// Sets the version.
    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the schema URL.
    pub fn with_schema_url<S: Into<String>>(mut self, schema_url: S) -> Self {
        self.schema_url = Some(schema_url.into());
        self
    }

    /// Sets the resource attributes.
    pub fn with_attributes(mut self, attributes: AttributeSet) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub(crate) fn identity(&self) -> u64 {
        meter_identifier(&self.name, &self.version, self.schema_url.as_deref())
    }
}

/// A named and versioned scope owning a collection of instruments.
///
/// Meters are created through
/// [`MeterProvider::get_meter`](crate::provider::MeterProvider::get_meter)
/// and live until the provider shuts down.
#[derive(Debug)]
pub struct Meter {
    name: String,
    version: String,
    schema_url: Option<String>,
    attributes: AttributeSet,
    identity: u64,
    instruments: RwLock<HashMap<String, Instrument>>,
}

impl Meter {
    pub(crate) fn new(options: MeterOptions) -> Self {
        let identity = options.identity();
        Self {
            name: options.name,
            version: options.version,
            schema_url: options.schema_url,
            attributes: options.attributes.unwrap_or_default(),
            identity,
            instruments: RwLock::new(HashMap::new()),
        }
    }

    /// Scope name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scope version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Schema URL, if set.
    pub fn schema_url(&self) -> Option<&str> {
        self.schema_url.as_deref()
    }

    /// The resource attributes attached to this meter.
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub(crate) fn identity(&self) -> u64 {
        self.identity
    }

    pub(crate) fn scope(&self) -> InstrumentationScope {
        InstrumentationScope {
            name: self.name.clone(),
            version: self.version.clone(),
            schema_url: self.schema_url.clone(),
        }
    }

    /// Creates a monotonic counter. Fails on invalid options or if an
    /// instrument with the same identifying fields already exists.
    pub fn create_counter<T: CounterValue>(&self, options: InstrumentOptions) -> Result<Counter<T>> {
        validate_instrument_options(&options.name, &options.unit, &options.description)?;
        let state = Arc::new(SumState::<T>::new(true));
        self.register(InstrumentKind::Counter, &options, state.clone())?;
        Ok(Counter::new(state))
    }

    /// Creates an up/down counter.
    pub fn create_up_down_counter<T: UpDownValue>(
        &self,
        options: InstrumentOptions,
    ) -> Result<UpDownCounter<T>> {
        validate_instrument_options(&options.name, &options.unit, &options.description)?;
        let state = Arc::new(SumState::<T>::new(false));
        self.register(InstrumentKind::UpDownCounter, &options, state.clone())?;
        Ok(UpDownCounter::new(state))
    }

    /// Creates a last-value gauge.
    pub fn create_gauge<T: GaugeValue>(&self, options: InstrumentOptions) -> Result<Gauge<T>> {
        validate_instrument_options(&options.name, &options.unit, &options.description)?;
        let state = Arc::new(LastValueState::<T>::new());
        self.register(InstrumentKind::Gauge, &options, state.clone())?;
        Ok(Gauge::new(state))
    }

    /// Creates an explicit-bucket histogram. Fails on invalid options or
    /// bucket boundaries.
    pub fn create_histogram<T: HistogramValue>(
        &self,
        options: InstrumentOptions,
    ) -> Result<Histogram<T>> {
        validate_instrument_options(&options.name, &options.unit, &options.description)?;
        let (bounds, record_min_max) = resolve_histogram_options(options.histogram_options.as_ref())?;
        let state = Arc::new(HistogramState::<T>::new(bounds, record_min_max));
        self.register(InstrumentKind::Histogram, &options, state.clone())?;
        Ok(Histogram::new(state))
    }

    fn register(
        &self,
        kind: InstrumentKind,
        options: &InstrumentOptions,
        state: Arc<dyn crate::instruments::InstrumentState>,
    ) -> Result<()> {
        let identifier =
            instrument_identifier(&options.name, kind, &options.unit, &options.description);
        let mut instruments = self.instruments.write();
        if instruments.contains_key(&identifier) {
            return Err(MetricError::InstrumentExistsWithSameNameAndIdentifyingFields(
                options.name.clone(),
            ));
        }
        instruments.insert(
            identifier,
            Instrument {
                name: options.name.clone(),
                description: options.description.clone(),
                unit: options.unit.clone(),
                kind,
                state,
            },
        );
        Ok(())
    }

    /// Clones out the registered instruments for snapshotting.
    pub(crate) fn instruments(&self) -> Vec<Instrument> {
        self.instruments.read().values().cloned().collect()
    }

    pub(crate) fn clear_instruments(&self) {
        self.instruments.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KeyValue;
    use crate::instruments::HistogramOptions;

    fn meter() -> Meter {
        Meter::new(MeterOptions::new("test-scope"))
    }

    #[test]
    fn test_meter_defaults() {
        let m = meter();
        assert_eq!(m.name(), "test-scope");
        assert_eq!(m.version(), DEFAULT_METER_VERSION);
        assert_eq!(m.schema_url(), None);
        assert!(m.attributes().is_empty());
    }

    #[test]
    fn test_identity_covers_name_version_schema() {
        let base = MeterOptions::new("scope");
        let same = MeterOptions::new("scope");
        let version = MeterOptions::new("scope").with_version("2.0.0");
        let schema = MeterOptions::new("scope").with_schema_url("https://example.com/schema");

        assert_eq!(base.identity(), same.identity());
        assert_ne!(base.identity(), version.identity());
        assert_ne!(base.identity(), schema.identity());

        // Attributes are not part of identity.
        let attrs = MeterOptions::new("scope")
            .with_attributes(AttributeSet::new(vec![KeyValue::new("k", "v")]));
        assert_eq!(base.identity(), attrs.identity());
    }

    #[test]
    fn test_create_counter_validates_name() {
        let m = meter();
        for name in ["123", "", "alpha-?"] {
            let result = m.create_counter::<u64>(InstrumentOptions::new(name));
            assert!(
                matches!(result, Err(MetricError::InvalidName(_))),
                "name {:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_duplicate_instrument_rejected() {
        let m = meter();
        m.create_counter::<u64>(InstrumentOptions::new("requests")).unwrap();

        // Same identifying fields, case-insensitive name.
        let dup = m.create_counter::<u64>(InstrumentOptions::new("Requests"));
        assert!(matches!(
            dup,
            Err(MetricError::InstrumentExistsWithSameNameAndIdentifyingFields(_))
        ));

        // Different unit changes identity.
        let other_unit =
            m.create_counter::<u64>(InstrumentOptions::new("requests").with_unit("ms"));
        assert!(other_unit.is_ok());

        // Different kind changes identity too.
        let other_kind = m.create_up_down_counter::<i64>(InstrumentOptions::new("requests"));
        assert!(other_kind.is_ok());
    }

    #[test]
    fn test_histogram_bucket_validation_at_creation() {
        let m = meter();
        let bad = m.create_histogram::<f64>(
            InstrumentOptions::new("latency").with_histogram_options(
                HistogramOptions::default().with_explicit_buckets(vec![10.0, 1.0]),
            ),
        );
        assert!(matches!(
            bad,
            Err(MetricError::InvalidExplicitBucketBoundaries(_))
        ));

        // The failed attempt must not occupy the identifier.
        let good = m.create_histogram::<f64>(InstrumentOptions::new("latency"));
        assert!(good.is_ok());
    }

    #[test]
    fn test_instruments_snapshot_lists_all() {
        let m = meter();
        m.create_counter::<u32>(InstrumentOptions::new("a")).unwrap();
        m.create_gauge::<f64>(InstrumentOptions::new("b")).unwrap();
        m.create_histogram::<u64>(InstrumentOptions::new("c")).unwrap();
        assert_eq!(m.instruments().len(), 3);
    }
}
