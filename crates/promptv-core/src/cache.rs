//! Time-boxed read-through cache for rendered prompt content.
//!
//! Entries carry the time they were stored and are checked for expiry on
//! every access; nothing runs in the background. Concurrent misses on the
//! same key are collapsed into a single load.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::error::{PromptvError, Result};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Identifies one cached lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub project: String,
    pub prompt: String,
    pub reference: String,
    /// Fingerprint of the substitution variables, empty when there are none
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(
        project: impl Into<String>,
        prompt: impl Into<String>,
        reference: impl Into<String>,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            prompt: prompt.into(),
            reference: reference.into(),
            fingerprint: fingerprint.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

/// Per-key slot. `load` serializes loaders for the key and remembers how the
/// last one failed; readers only touch `entry`.
#[derive(Debug)]
struct Slot<V> {
    entry: RwLock<Option<CacheEntry<V>>>,
    load: Mutex<Option<PromptvError>>,
    completed_loads: AtomicU64,
}

impl<V> Slot<V> {
    fn empty() -> Self {
        Self {
            entry: RwLock::new(None),
            load: Mutex::new(None),
            completed_loads: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub live_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub ttl_seconds: u64,
}

pub struct CacheLayer<V: Clone> {
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<CacheKey, Arc<Slot<V>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> CacheLayer<V> {
    /// A zero `ttl` disables caching: every lookup loads.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
            clock: Arc::new(SystemClock),
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live value for `key`, or run `loader` and cache its result.
    ///
    /// Concurrent callers missing on the same key wait for one loader run
    /// and share its outcome. A failed load is returned to everyone who
    /// waited on it but is not cached: the next caller loads again.
    pub fn get_or_load<F>(&self, key: &CacheKey, loader: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.lookup(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(project = %key.project, prompt = %key.prompt, reference = %key.reference, "cache hit");
            return Ok(value);
        }

        let Some(slot) = self.slot_for(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(project = %key.project, prompt = %key.prompt, reference = %key.reference, "cache full of pending loads, loading uncached");
            return loader();
        };
        let observed = slot.completed_loads.load(Ordering::Acquire);
        let mut last_error = slot.load.lock();

        if let Some(value) = self.live_value(&slot) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        // A load failed while we waited on it.
        if slot.completed_loads.load(Ordering::Acquire) != observed {
            if let Some(err) = last_error.as_ref() {
                return Err(err.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(project = %key.project, prompt = %key.prompt, reference = %key.reference, "cache miss");
        let outcome = loader();
        match &outcome {
            Ok(value) => {
                *slot.entry.write() = Some(CacheEntry {
                    value: value.clone(),
                    inserted_at: self.clock.now(),
                });
                *last_error = None;
            }
            Err(err) => *last_error = Some(err.clone()),
        }
        slot.completed_loads.fetch_add(1, Ordering::Release);
        outcome
    }

    /// Drop every entry for one prompt, whatever the reference or variables.
    pub fn invalidate_prompt(&self, project: &str, prompt: &str) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !(key.project == project && key.prompt == prompt));
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!(project, prompt, dropped, "invalidated cache entries");
        }
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let stored: Vec<&Arc<Slot<V>>> = entries
            .values()
            .filter(|slot| slot.entry.read().is_some())
            .collect();
        let live_entries = stored
            .iter()
            .filter(|slot| self.live_value(slot).is_some())
            .count();
        CacheStats {
            total_entries: stored.len(),
            live_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ttl_seconds: self.ttl.as_secs(),
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<V> {
        let slot = self.entries.read().get(key).cloned()?;
        self.live_value(&slot)
    }

    fn live_value(&self, slot: &Slot<V>) -> Option<V> {
        let entry = slot.entry.read();
        entry
            .as_ref()
            .filter(|entry| self.is_live(entry.inserted_at))
            .map(|entry| entry.value.clone())
    }

    fn is_live(&self, inserted_at: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        self.clock.now().signed_duration_since(inserted_at) < ttl
    }

    /// Existing slot for `key`, or a new empty one. Makes room first when
    /// the cache is full.
    ///
    /// Slots still being loaded count toward `max_entries` and are never
    /// evicted. When nothing else can go, returns `None` and the caller
    /// loads without caching, so the map never holds more than
    /// `max_entries` slots.
    fn slot_for(&self, key: &CacheKey) -> Option<Arc<Slot<V>>> {
        let mut entries = self.entries.write();
        if let Some(slot) = entries.get(key) {
            return Some(slot.clone());
        }

        if entries.len() >= self.max_entries {
            entries.retain(|_, slot| {
                let entry = slot.entry.read();
                match entry.as_ref() {
                    Some(entry) => self.is_live(entry.inserted_at),
                    // Keep slots that are still being loaded.
                    None => slot.load.is_locked(),
                }
            });
        }
        if entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .filter_map(|(key, slot)| {
                    slot.entry
                        .read()
                        .as_ref()
                        .map(|entry| (entry.inserted_at, key.clone()))
                })
                .min_by_key(|(inserted_at, _)| *inserted_at);
            let (_, oldest) = oldest?;
            entries.remove(&oldest);
            tracing::debug!(project = %oldest.project, prompt = %oldest.prompt, "evicted oldest cache entry");
        }

        let slot = Arc::new(Slot::empty());
        entries.insert(key.clone(), slot.clone());
        Some(slot)
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.entries.read().len()
    }
}
