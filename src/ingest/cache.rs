//! Process-wide cache of raw datasets keyed by source.
//!
//! Only raw, pre-feature records are stored, so analysis parameters can change
//! without a reload. Each key has its own slot lock: concurrent callers for the
//! same key wait for the single in-flight load and share its result, while
//! different keys load independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use super::record::RawDataset;
use crate::error::LoadError;

type Slot = Arc<Mutex<Option<Arc<RawDataset>>>>;

/// Loaded datasets keyed by source descriptor (the remote URL).
#[derive(Debug, Default)]
pub struct LoadCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl LoadCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process.
    pub fn global() -> &'static LoadCache {
        static GLOBAL: OnceLock<LoadCache> = OnceLock::new();
        GLOBAL.get_or_init(LoadCache::new)
    }

    /// Returns the cached dataset for `key`, running `load` if absent.
    ///
    /// At most one `load` per key runs at a time. A failed load leaves the
    /// slot empty so the next caller retries.
    ///
    /// # Errors
    ///
    /// Propagates the `LoadError` returned by `load`.
    pub fn get_or_load<F>(&self, key: &str, load: F) -> Result<Arc<RawDataset>, LoadError>
    where
        F: FnOnce() -> Result<RawDataset, LoadError>,
    {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key.to_string()).or_default())
        };

        let mut entry = lock(&slot);
        if let Some(dataset) = entry.as_ref() {
            tracing::debug!(key, "load cache hit");
            return Ok(Arc::clone(dataset));
        }

        tracing::debug!(key, "load cache miss");
        let dataset = Arc::new(load()?);
        *entry = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Whether a dataset is currently cached for `key`.
    pub fn contains(&self, key: &str) -> bool {
        let slot = lock(&self.slots).get(key).cloned();
        slot.is_some_and(|s| {
            let entry = lock(&s);
            entry.is_some()
        })
    }

    /// Drops every cached dataset.
    pub fn clear(&self) {
        lock(&self.slots).clear();
        tracing::debug!("load cache cleared");
    }
}

/// A panic during a load must not wedge later callers.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn dataset_with(rows: usize) -> RawDataset {
        RawDataset {
            records: (0..rows)
                .map(|_| crate::ingest::record::RawRecord {
                    timestamp: None,
                    appliance_power: 60.0,
                    lights: None,
                    aux: Vec::new(),
                })
                .collect(),
            ..RawDataset::default()
        }
    }

    #[test]
    fn second_call_hits_cache() {
        let cache = LoadCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let ds = cache.get_or_load("uci", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(dataset_with(2))
            });
            assert_eq!(ds.map(|d| d.records.len()).ok(), Some(2));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("uci"));
    }

    #[test]
    fn keys_are_independent() {
        let cache = LoadCache::new();
        let a = cache.get_or_load("a", || Ok(dataset_with(1)));
        let b = cache.get_or_load("b", || Ok(dataset_with(4)));
        assert_eq!(a.map(|d| d.records.len()).ok(), Some(1));
        assert_eq!(b.map(|d| d.records.len()).ok(), Some(4));
    }

    #[test]
    fn failed_load_is_not_cached() {
        let cache = LoadCache::new();
        let err = cache.get_or_load("uci", || Err(LoadError::Http("offline".into())));
        assert!(err.is_err());
        assert!(!cache.contains("uci"));

        let ok = cache.get_or_load("uci", || Ok(dataset_with(1)));
        assert!(ok.is_ok());
    }

    #[test]
    fn clear_forces_reload() {
        let cache = LoadCache::new();
        let calls = AtomicUsize::new(0);
        let load = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(dataset_with(1))
        };
        assert!(cache.get_or_load("uci", load).is_ok());
        cache.clear();
        assert!(!cache.contains("uci"));
        assert!(cache.get_or_load("uci", load).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_callers_share_one_load() {
        let cache = LoadCache::new();
        let calls = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let ds = cache.get_or_load("uci", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok(dataset_with(3))
                    });
                    assert!(ds.is_ok());
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
