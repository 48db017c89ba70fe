// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Tenant-scoped caching with tag invalidation
//!
//! This module provides the process-wide cache used for:
//! - Dependency graphs (one per tenant, rebuilt on invalidation)
//! - Any other per-tenant artifacts callers choose to park here
//!
//! Entries carry a TTL and a tag set; invalidation removes every entry
//! matching any of the given tags (union semantics) and notifies
//! registered callbacks once per removed entry. A background sweep drops
//! expired entries between accesses.

pub mod config;
pub mod entry;
pub mod invalidation;
pub mod manager;

pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use invalidation::{entity_tag, regulation_tag};
pub use invalidation::{TAG_DEPENDENCY_GRAPH, TAG_IMPACT_ANALYSIS, TAG_RISK_SCORES};
pub use manager::{CacheStats, CallbackHandle, ImpactCache};
