// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The process-wide tag cache

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

use super::config::CacheConfig;
use super::entry::CacheEntry;

/// Callback invoked once per invalidated entry with (full key, tag set).
pub type InvalidationCallback = Arc<dyn Fn(&str, &HashSet<String>) + Send + Sync>;

/// Counters reported by [`ImpactCache::stats`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

#[derive(Default)]
struct StatCounters {
    hits: u64,
    misses: u64,
    evictions: u64,
}

static GLOBAL_CACHE: Lazy<ImpactCache> = Lazy::new(ImpactCache::with_defaults);

struct Shared {
    entries: RwLock<HashMap<String, CacheEntry>>,
    callbacks: RwLock<Vec<(u64, InvalidationCallback)>>,
    stats: RwLock<StatCounters>,
    shutdown: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            callbacks: RwLock::new(Vec::new()),
            stats: RwLock::new(StatCounters::default()),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Drop every expired entry, counting each as an eviction.
    fn sweep_expired(&self) -> usize {
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired());
            before - entries.len()
        };
        if removed > 0 {
            self.stats.write().evictions += removed as u64;
        }
        removed
    }

    /// Fire invalidation callbacks for one removed entry. Panics are
    /// logged and swallowed so a bad observer never aborts a sweep.
    fn notify(&self, full_key: &str, tags: &HashSet<String>) {
        let callbacks = self.callbacks.read().clone();
        for (id, callback) in callbacks {
            let result = catch_unwind(AssertUnwindSafe(|| callback(full_key, tags)));
            if result.is_err() {
                log::warn!(
                    "invalidation callback {} panicked for entry {}",
                    id,
                    full_key
                );
            }
        }
    }
}

/// Handle returned by [`ImpactCache::on_invalidation`]; call
/// [`unregister`](CallbackHandle::unregister) to remove the callback.
pub struct CallbackHandle {
    id: u64,
    shared: Weak<Shared>,
}

impl CallbackHandle {
    pub fn unregister(self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.callbacks.write().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Process-wide tenant-scoped cache with TTL expiry and tag-union
/// invalidation.
///
/// Keys are namespaced internally as `<tenant>:<key>`; every entry's tag
/// set implicitly contains the tenant id, which is what keeps tag sweeps
/// from crossing tenants. A background thread removes expired entries
/// every [`CacheConfig::sweep_interval`]; call
/// [`shutdown`](ImpactCache::shutdown) during orderly teardown.
pub struct ImpactCache {
    shared: Arc<Shared>,
    config: CacheConfig,
    next_callback_id: AtomicU64,
    sweeper: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl ImpactCache {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// The shared process-wide instance with default timings.
    pub fn global() -> &'static ImpactCache {
        &GLOBAL_CACHE
    }

    fn with_defaults() -> Self {
        Self::build(CacheConfig::default())
    }

    fn build(config: CacheConfig) -> Self {
        let shared = Arc::new(Shared::new());
        let sweeper = Self::spawn_sweeper(Arc::clone(&shared), config.sweep_interval);
        Self {
            shared,
            config,
            next_callback_id: AtomicU64::new(1),
            sweeper: Mutex::new(sweeper),
        }
    }

    fn spawn_sweeper(
        shared: Arc<Shared>,
        interval: Duration,
    ) -> Option<std::thread::JoinHandle<()>> {
        let result = std::thread::Builder::new()
            .name("impactlite-cache-sweep".to_string())
            .spawn(move || {
                while !shared.shutdown.load(Ordering::Acquire) {
                    std::thread::park_timeout(interval);
                    if shared.shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    let removed = shared.sweep_expired();
                    if removed > 0 {
                        log::debug!("cache sweep removed {} expired entries", removed);
                    }
                }
            });
        match result {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("failed to spawn cache sweep thread: {}", e);
                None
            }
        }
    }

    fn full_key(tenant_id: &str, key: &str) -> String {
        format!("{}:{}", tenant_id, key)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Store a value under the tenant's namespace. The entry's effective
    /// tag set is `{tenant} ∪ tags`; `ttl = None` applies the default.
    pub fn set<T: Any + Send + Sync>(
        &self,
        tenant_id: &str,
        key: &str,
        value: Arc<T>,
        ttl: Option<Duration>,
        tags: &[&str],
    ) {
        let mut tag_set: HashSet<String> = tags.iter().map(|t| t.to_string()).collect();
        tag_set.insert(tenant_id.to_string());

        let entry = CacheEntry::new(
            value,
            tag_set,
            ttl.unwrap_or(self.config.default_ttl),
        );
        self.shared
            .entries
            .write()
            .insert(Self::full_key(tenant_id, key), entry);
    }

    /// Fetch a value; expired entries are dropped inline and counted as
    /// one eviction each.
    pub fn get(&self, tenant_id: &str, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        let full_key = Self::full_key(tenant_id, key);

        enum Probe {
            Hit(Arc<dyn Any + Send + Sync>),
            Expired,
            Missing,
        }

        let probe = {
            let entries = self.shared.entries.read();
            match entries.get(&full_key) {
                Some(entry) if !entry.is_expired() => Probe::Hit(Arc::clone(&entry.value)),
                Some(_) => Probe::Expired,
                None => Probe::Missing,
            }
        };

        match probe {
            Probe::Hit(value) => {
                self.shared.stats.write().hits += 1;
                Some(value)
            }
            Probe::Expired => {
                let evicted = {
                    let mut entries = self.shared.entries.write();
                    // re-check under the write lock; a concurrent get or
                    // sweep may already have dropped the entry
                    let still_expired = entries
                        .get(&full_key)
                        .map(|entry| entry.is_expired())
                        .unwrap_or(false);
                    if still_expired {
                        entries.remove(&full_key);
                    }
                    still_expired
                };
                let mut stats = self.shared.stats.write();
                if evicted {
                    stats.evictions += 1;
                }
                stats.misses += 1;
                None
            }
            Probe::Missing => {
                self.shared.stats.write().misses += 1;
                None
            }
        }
    }

    /// Typed fetch; `None` on miss, expiry, or type mismatch.
    pub fn get_as<T: Any + Send + Sync>(&self, tenant_id: &str, key: &str) -> Option<Arc<T>> {
        self.get(tenant_id, key)
            .and_then(|value| value.downcast::<T>().ok())
    }

    pub fn has(&self, tenant_id: &str, key: &str) -> bool {
        self.get(tenant_id, key).is_some()
    }

    /// Remove one entry, firing invalidation callbacks with its tags.
    pub fn delete(&self, tenant_id: &str, key: &str) -> bool {
        let full_key = Self::full_key(tenant_id, key);
        let removed = self.shared.entries.write().remove(&full_key);
        match removed {
            Some(entry) => {
                self.shared.notify(&full_key, &entry.tags);
                true
            }
            None => false,
        }
    }

    /// Remove every entry whose tag set contains the tenant id.
    pub fn invalidate_tenant(&self, tenant_id: &str) -> usize {
        self.invalidate_where(|entry| entry.tags.contains(tenant_id))
    }

    /// Remove every entry carrying the tag, across tenants.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        self.invalidate_by_tags(&[tag])
    }

    /// Union semantics: remove every entry carrying any of the tags.
    pub fn invalidate_by_tags(&self, tags: &[&str]) -> usize {
        self.invalidate_where(|entry| tags.iter().any(|tag| entry.tags.contains(*tag)))
    }

    /// Tenant-scoped union: remove entries of this tenant carrying any of
    /// the tags. Other tenants' entries are never touched.
    pub fn invalidate_tenant_tags(&self, tenant_id: &str, tags: &[&str]) -> usize {
        self.invalidate_where(|entry| {
            entry.tags.contains(tenant_id) && tags.iter().any(|tag| entry.tags.contains(*tag))
        })
    }

    fn invalidate_where<F: Fn(&CacheEntry) -> bool>(&self, predicate: F) -> usize {
        let removed: Vec<(String, HashSet<String>)> = {
            let mut entries = self.shared.entries.write();
            let matching: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| predicate(entry))
                .map(|(key, _)| key.clone())
                .collect();
            matching
                .into_iter()
                .filter_map(|key| entries.remove(&key).map(|entry| (key, entry.tags)))
                .collect()
        };
        // callbacks run outside the entry lock so they may re-enter the cache
        for (key, tags) in &removed {
            self.shared.notify(key, tags);
        }
        removed.len()
    }

    /// Register an invalidation callback, invoked once per removed entry.
    pub fn on_invalidation<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&str, &HashSet<String>) + Send + Sync + 'static,
    {
        let id = self.next_callback_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .callbacks
            .write()
            .push((id, Arc::new(callback)));
        CallbackHandle {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let counters = self.shared.stats.read();
        CacheStats {
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            size: self.shared.entries.read().len(),
        }
    }

    pub fn reset_stats(&self) {
        *self.shared.stats.write() = StatCounters::default();
    }

    pub fn clear(&self) {
        self.shared.entries.write().clear();
    }

    /// Stop the background sweep and clear all state. Idempotent.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.sweeper.lock().take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
        self.clear();
    }
}

impl Drop for ImpactCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}
