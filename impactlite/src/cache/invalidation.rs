// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Invalidation tag vocabulary and convenience routines
//!
//! Entity and edge mutations invalidate by well-known tag unions. The
//! routines here are tenant-scoped: they only remove entries that carry
//! both the tenant tag and one of the listed tags, so one tenant's
//! mutation never evicts another tenant's graphs or scores.

use super::manager::ImpactCache;
use crate::model::EntityKind;

/// Tag carried by every cached dependency graph.
pub const TAG_DEPENDENCY_GRAPH: &str = "dependency-graph";

/// Tag for cached risk score artifacts.
pub const TAG_RISK_SCORES: &str = "risk-scores";

/// Tag for cached impact analysis artifacts.
pub const TAG_IMPACT_ANALYSIS: &str = "impact-analysis";

/// Tag naming one regulation.
pub fn regulation_tag(regulation_id: &str) -> String {
    format!("regulation:{}", regulation_id)
}

/// Tag naming one non-regulation entity.
pub fn entity_tag(kind: EntityKind, id: &str) -> String {
    format!("entity:{}:{}", kind.as_str(), id)
}

impl ImpactCache {
    /// Invalidate everything a regulation change can stale: the
    /// regulation's own artifacts, the dependency graph, risk scores, and
    /// impact analyses of its tenant.
    pub fn invalidate_regulation(&self, tenant_id: &str, regulation_id: &str) -> usize {
        let regulation = regulation_tag(regulation_id);
        self.invalidate_tenant_tags(
            tenant_id,
            &[
                regulation.as_str(),
                TAG_DEPENDENCY_GRAPH,
                TAG_RISK_SCORES,
                TAG_IMPACT_ANALYSIS,
            ],
        )
    }

    /// Invalidate after any non-regulation entity change.
    pub fn invalidate_entity(&self, tenant_id: &str, kind: EntityKind, id: &str) -> usize {
        let entity = entity_tag(kind, id);
        self.invalidate_tenant_tags(
            tenant_id,
            &[entity.as_str(), TAG_DEPENDENCY_GRAPH, TAG_RISK_SCORES],
        )
    }

    /// Invalidate the tenant's dependency graph after an edge change.
    pub fn invalidate_edges(&self, tenant_id: &str) -> usize {
        self.invalidate_tenant_tags(tenant_id, &[TAG_DEPENDENCY_GRAPH])
    }
}
