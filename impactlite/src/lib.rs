// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! ImpactLite - A regulatory impact propagation and risk scoring engine
//!
//! ImpactLite models how regulatory changes ripple across an enterprise
//! dependency graph: regulations flow through departments into budgets,
//! services, and key-performance indicators, and every affected entity is
//! continuously scored for risk. Each tenant owns an isolated graph of
//! typed nodes joined by weighted, typed edges.
//!
//! # Features
//!
//! - **Dependency graphs**: Per-tenant adjacency-indexed graphs over active
//!   impact edges, cached with tag-based invalidation
//! - **Impact propagation**: Breadth-first weighted traversal with depth and
//!   threshold cutoffs, edge-type rules, and cycle safety
//! - **Risk scoring**: Per-entity aggregation across all active regulations,
//!   weighted by regulation severity
//! - **Timeline comparison**: Before/after impact deltas for a single
//!   regulation against a reference date
//! - **Tenant isolation**: Graph state, cache entries, and notifications are
//!   scoped by tenant throughout
//!
//! # Usage
//!
//! ```rust,ignore
//! let store = Arc::new(MemoryStore::new());
//! let cache = Arc::new(ImpactCache::new(CacheConfig::default()));
//!
//! let engine = PropagationEngine::new(
//!     "tenant-1",
//!     store.clone(),
//!     cache.clone(),
//!     PropagationOptions::default(),
//! )?;
//!
//! let result = engine
//!     .propagate(PropagationSeed::new(NodeRef::regulation("reg-1")), &CancelToken::new())
//!     .await?;
//! ```

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod graph;
pub mod model;
pub mod observer;
pub mod propagation;
pub mod risk;
pub mod store;

// Re-export the primary API surface
pub use cache::{CacheConfig, CacheStats, ImpactCache};
pub use coordinator::ImpactCoordinator;
pub use error::{ImpactError, ImpactResult};
pub use graph::{DependencyGraph, GraphBuilder};
pub use model::{
    EntityKind, ImpactEdge, ImpactType, NodeRef, Regulation, RegulationImpact, RiskLevel,
    RiskScore, Severity,
};
pub use observer::{ObserverHub, RiskEvent, RiskEventKind};
pub use propagation::{
    CancelToken, PropagationEngine, PropagationOptions, PropagationResult, PropagationSeed,
};
pub use risk::{RiskAggregator, TimelineEngine};
pub use store::{EntityStore, MemoryStore};

/// ImpactLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ImpactLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
