//! Telemeter - an in-process OpenTelemetry metrics SDK.
//!
//! Telemeter is the measurement aggregation and collection pipeline of a
//! metrics SDK: applications record measurements through typed instruments,
//! and readers periodically snapshot the aggregated state and hand it to an
//! exporter (an OTLP driver, a log sink, or an in-memory test sink).
//!
//! # Features
//!
//! - **Typed instruments**: counters, up/down counters, histograms, and
//!   gauges over a checked set of numeric value types
//! - **Attribute-keyed aggregation**: every measurement lands in exactly one
//!   series slot, selected by positional attribute equality
//! - **Lock-light hot path**: recording never blocks on I/O; per-slot
//!   updates are linearizable
//! - **Periodic export**: a background worker with configurable interval
//!   and timeout, cooperative shutdown, and force-flush
//! - **OTLP-ready snapshots**: the internal model converts losslessly to
//!   OTLP protobuf messages
//!
//! # Architecture
//!
//! - `core`: attributes, validation, identity, errors
//! - `instruments`: recorders and their aggregation state
//! - `meter` / `provider`: scope and registry layers
//! - `reader`: pull-side snapshotting, periodic worker
//! - `export`: push-side exporter seam and reference sinks
//! - `data`: the internal metric model and OTLP conversion
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use telemeter::export::{InMemoryExporter, MetricExporter};
//! use telemeter::reader::{PeriodicExportingMetricReader, PeriodicReaderConfig};
//! use telemeter::{AttributeSet, InstrumentOptions, KeyValue, MeterOptions, MeterProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = InMemoryExporter::new();
//!     let periodic = PeriodicExportingMetricReader::with_config(
//!         MetricExporter::new(sink.clone()),
//!         PeriodicReaderConfig::default().with_interval(Duration::from_secs(10)),
//!     );
//!
//!     let provider = MeterProvider::new();
//!     provider.add_reader(periodic.start())?;
//!
//!     let meter = provider.get_meter(MeterOptions::new("checkout"))?;
//!     let requests = meter.create_counter::<u64>(InstrumentOptions::new("requests"))?;
//!     requests.add(1, AttributeSet::new(vec![KeyValue::new("route", "/pay")]));
//!
//!     periodic.shutdown().await?;
//!     provider.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod core;
pub mod data;
pub mod export;
pub mod instruments;
pub mod meter;
pub mod provider;
pub mod reader;

pub use crate::core::{AttributeSet, KeyValue, MetricError, Result, Value};
pub use crate::instruments::{
    Counter, Gauge, Histogram, HistogramOptions, InstrumentKind, InstrumentOptions, UpDownCounter,
};
pub use crate::meter::{Meter, MeterOptions};
pub use crate::provider::MeterProvider;
