//! Core domain types: attribute sets, validation, identity, and the error
//! taxonomy shared by the whole pipeline.

pub mod attributes;
pub mod error;
pub mod validate;

pub use attributes::{AttributeSet, KeyValue, Value};
pub use error::{MetricError, Result};
pub use validate::{
    instrument_identifier, meter_identifier, validate_explicit_buckets,
    validate_instrument_options, DEFAULT_HISTOGRAM_BOUNDARIES,
};
