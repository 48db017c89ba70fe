// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache entry metadata

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One stored value with its tag set and expiry.
///
/// Values are type-erased so graphs and other artifacts share one cache;
/// [`ImpactCache::get_as`](super::ImpactCache::get_as) recovers the
/// concrete type.
#[derive(Clone)]
pub struct CacheEntry {
    pub value: Arc<dyn Any + Send + Sync>,
    pub tags: HashSet<String>,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(value: Arc<dyn Any + Send + Sync>, tags: HashSet<String>, ttl: Duration) -> Self {
        Self {
            value,
            tags,
            created_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}
