// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache-aware graph construction

use std::sync::Arc;

use crate::cache::{ImpactCache, TAG_DEPENDENCY_GRAPH};
use crate::error::ImpactResult;
use crate::graph::DependencyGraph;
use crate::store::EntityStore;

/// Cache key (within a tenant's namespace) for the dependency graph.
pub const DEPENDENCY_GRAPH_KEY: &str = "dependency-graph";

/// Loads a tenant's active edges and materializes the adjacency indexes,
/// caching the result until the next graph-tag invalidation.
///
/// Deterministic and idempotent for a fixed edge set. A store failure
/// propagates to the caller; partial builds are never cached.
pub struct GraphBuilder {
    store: Arc<dyn EntityStore>,
    cache: Arc<ImpactCache>,
}

impl GraphBuilder {
    pub fn new(store: Arc<dyn EntityStore>, cache: Arc<ImpactCache>) -> Self {
        Self { store, cache }
    }

    /// Return the tenant's graph, building and caching it on miss.
    pub async fn build(&self, tenant_id: &str) -> ImpactResult<Arc<DependencyGraph>> {
        if let Some(graph) = self
            .cache
            .get_as::<DependencyGraph>(tenant_id, DEPENDENCY_GRAPH_KEY)
        {
            log::debug!("dependency graph cache hit for tenant {}", tenant_id);
            return Ok(graph);
        }

        let edges = self.store.active_edges(tenant_id).await?;
        let graph = Arc::new(DependencyGraph::from_edges(edges));
        log::debug!(
            "built dependency graph for tenant {} ({} edges)",
            tenant_id,
            graph.edge_count()
        );

        self.cache.set(
            tenant_id,
            DEPENDENCY_GRAPH_KEY,
            Arc::clone(&graph),
            Some(self.cache.config().graph_ttl),
            &[TAG_DEPENDENCY_GRAPH],
        );
        Ok(graph)
    }
}
