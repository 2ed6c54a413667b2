//! The meter provider: root registry of meters and attached readers.

use crate::core::{MetricError, Result};
use crate::meter::{Meter, MeterOptions};
use crate::reader::MetricReader;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared provider state: meters keyed by identity, the reader list, and
/// the shutdown flag. Readers hold a weak reference back to this.
#[derive(Debug, Default)]
pub(crate) struct ProviderInner {
    pub(crate) meters: RwLock<HashMap<u64, Arc<Meter>>>,
    readers: RwLock<Vec<Arc<MetricReader>>>,
    has_shut_down: AtomicBool,
}

/// Root of the metrics API: owns meters and readers, orchestrates shutdown.
///
/// Cloning a provider is cheap and shares the underlying registry.
#[derive(Debug, Clone, Default)]
pub struct MeterProvider {
    inner: Arc<ProviderInner>,
}

impl MeterProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the meter for `options`, creating it on first request.
    ///
    /// Lookups are idempotent for the same identity (name, version, schema
    /// URL). A lookup whose identity matches an existing meter but whose
    /// attributes differ fails with
    /// [`MetricError::MeterExistsWithDifferentAttributes`].
    pub fn get_meter(&self, options: MeterOptions) -> Result<Arc<Meter>> {
        let identity = options.identity();
        let requested_attributes = options.attributes.clone().unwrap_or_default();

        if let Some(existing) = self.inner.meters.read().get(&identity) {
            if *existing.attributes() == requested_attributes {
                return Ok(Arc::clone(existing));
            }
            return Err(MetricError::MeterExistsWithDifferentAttributes(options.name));
        }

        let mut meters = self.inner.meters.write();
        // Another thread may have created the meter between the locks.
        if let Some(existing) = meters.get(&identity) {
            if *existing.attributes() == requested_attributes {
                return Ok(Arc::clone(existing));
            }
            return Err(MetricError::MeterExistsWithDifferentAttributes(options.name));
        }
        let meter = Arc::new(Meter::new(options));
        meters.insert(identity, Arc::clone(&meter));
        Ok(meter)
    }

    /// Attaches a reader to this provider.
    ///
    /// A reader can be attached at most once, to at most one provider; a
    /// second attempt fails with
    /// [`MetricError::MetricReaderAlreadyAttached`].
    pub fn add_reader(&self, reader: Arc<MetricReader>) -> Result<()> {
        reader.attach(Arc::downgrade(&self.inner))?;
        self.inner.readers.write().push(reader);
        Ok(())
    }

    /// Shuts the provider down: every attached reader performs its final
    /// collect and shuts down, then all meters and their instruments are
    /// released. Idempotent.
    pub async fn shutdown(&self) -> Result<()> {
        if self.inner.has_shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let readers: Vec<_> = self.inner.readers.write().drain(..).collect();
        for reader in readers {
            if let Err(error) = reader.shutdown().await {
                tracing::warn!(category = error.category(), %error, "reader shutdown failed");
            }
        }

        let meters: Vec<_> = {
            let mut meters = self.inner.meters.write();
            meters.drain().map(|(_, meter)| meter).collect()
        };
        for meter in meters {
            meter.clear_instruments();
        }
        Ok(())
    }

    /// True once [`shutdown`](Self::shutdown) has run.
    pub fn is_shutdown(&self) -> bool {
        self.inner.has_shut_down.load(Ordering::Acquire)
    }
}
