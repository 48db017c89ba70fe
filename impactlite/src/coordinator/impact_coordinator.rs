// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The coordinator owning store, cache, and observers

use std::sync::Arc;

use crate::cache::ImpactCache;
use crate::error::{ImpactError, ImpactResult};
use crate::model::{
    EntityKind, ImpactEdge, NodeRef, RegulationImpact, RiskLevel, RiskScore,
};
use crate::observer::{ObserverHub, RiskEventKind};
use crate::propagation::{CancelToken, PropagationResult};
use crate::risk::RiskAggregator;
use crate::store::{AuditEntry, EntityStore};

/// Entry point tying the engine components together.
///
/// CRUD over entities lives outside the core; the wrappers here are what
/// that outer layer calls so that every mutation validates the domain
/// invariants, invalidates the right cache tags before returning success,
/// and leaves an audit trail.
pub struct ImpactCoordinator {
    store: Arc<dyn EntityStore>,
    cache: Arc<ImpactCache>,
    hub: Arc<ObserverHub>,
}

impl ImpactCoordinator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: Arc<ImpactCache>,
        hub: Arc<ObserverHub>,
    ) -> Self {
        Self { store, cache, hub }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<ImpactCache> {
        &self.cache
    }

    pub fn hub(&self) -> &Arc<ObserverHub> {
        &self.hub
    }

    /// Check every edge invariant that needs store context: the
    /// edge-local rules, both endpoints existing in the edge's tenant,
    /// and active (source, target) uniqueness.
    pub async fn validate_edge(&self, edge: &ImpactEdge) -> ImpactResult<()> {
        edge.validate()?;

        for endpoint in [&edge.source, &edge.target] {
            let tenant = self.entity_tenant(endpoint).await?.ok_or_else(|| {
                ImpactError::NotFound(format!("entity {} not found", endpoint))
            })?;
            if tenant != edge.tenant_id {
                return Err(ImpactError::Invalid(format!(
                    "entity {} belongs to tenant {}, edge {} to tenant {}",
                    endpoint, tenant, edge.id, edge.tenant_id
                )));
            }
        }

        if edge.active {
            let existing = self.store.active_edges(&edge.tenant_id).await?;
            let duplicate = existing.iter().any(|e| {
                e.id != edge.id && e.source == edge.source && e.target == edge.target
            });
            if duplicate {
                return Err(ImpactError::Conflict(format!(
                    "active edge {} -> {} already exists in tenant {}",
                    edge.source, edge.target, edge.tenant_id
                )));
            }
        }
        Ok(())
    }

    /// Invalidation discipline after an edge create/update/delete. Runs
    /// before the mutation is reported successful to the caller.
    pub async fn edge_mutated(&self, edge: &ImpactEdge, action: &str) -> ImpactResult<()> {
        let removed = self.cache.invalidate_edges(&edge.tenant_id);
        log::debug!(
            "edge {} {} invalidated {} cache entries for tenant {}",
            edge.id,
            action,
            removed,
            edge.tenant_id
        );
        self.store
            .append_audit(AuditEntry::new(
                &edge.tenant_id,
                format!("edge.{}", action),
                Some(edge.source.clone()),
                format!("{} -> {} ({})", edge.source, edge.target, edge.id),
            ))
            .await
    }

    /// Invalidation discipline after a non-regulation entity mutation.
    pub async fn entity_mutated(
        &self,
        tenant_id: &str,
        kind: EntityKind,
        id: &str,
        action: &str,
    ) -> ImpactResult<()> {
        self.cache.invalidate_entity(tenant_id, kind, id);
        self.store
            .append_audit(AuditEntry::new(
                tenant_id,
                format!("entity.{}", action),
                Some(NodeRef::new(kind, id)),
                String::new(),
            ))
            .await
    }

    /// Invalidation discipline after a regulation mutation.
    pub async fn regulation_mutated(
        &self,
        tenant_id: &str,
        regulation_id: &str,
        action: &str,
    ) -> ImpactResult<()> {
        self.cache.invalidate_regulation(tenant_id, regulation_id);
        self.store
            .append_audit(AuditEntry::new(
                tenant_id,
                format!("regulation.{}", action),
                Some(NodeRef::regulation(regulation_id)),
                String::new(),
            ))
            .await
    }

    /// Full recalculation pass for a tenant: propagate every active
    /// regulation, replace its derived impact rows, aggregate risk
    /// scores, and publish progress throughout.
    pub async fn run_recalculation(
        &self,
        tenant_id: &str,
        cancel: &CancelToken,
    ) -> ImpactResult<Vec<RiskScore>> {
        match self.recalculate(tenant_id, cancel).await {
            Ok(scores) => Ok(scores),
            Err(e) => {
                self.hub.publish(
                    tenant_id,
                    RiskEventKind::RecalculationError {
                        message: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    async fn recalculate(
        &self,
        tenant_id: &str,
        cancel: &CancelToken,
    ) -> ImpactResult<Vec<RiskScore>> {
        let aggregator = RiskAggregator::new(Arc::clone(&self.store), Arc::clone(&self.cache));
        let regulations = self.store.active_regulations(tenant_id).await?;
        self.hub.publish(
            tenant_id,
            RiskEventKind::RecalculationStart {
                regulation_count: regulations.len(),
            },
        );
        log::info!(
            "recalculating {} regulations for tenant {}",
            regulations.len(),
            tenant_id
        );

        let total = regulations.len();
        let mut runs = Vec::with_capacity(total);
        for (index, regulation) in regulations.into_iter().enumerate() {
            let result = aggregator
                .propagate_regulation(tenant_id, &regulation, cancel)
                .await?;
            if result.cancelled {
                return Err(ImpactError::Cancelled(format!(
                    "recalculation for tenant {} cancelled at regulation {}",
                    tenant_id, regulation.id
                )));
            }

            let impacts = impact_rows(tenant_id, &regulation.id, &result);
            let affected = impacts.len();
            self.store
                .replace_regulation_impacts(&regulation.id, impacts)
                .await?;
            self.hub.publish(
                tenant_id,
                RiskEventKind::ImpactUpdate {
                    regulation_id: regulation.id.clone(),
                    affected,
                },
            );
            self.hub.publish(
                tenant_id,
                RiskEventKind::RecalculationProgress {
                    regulation_id: regulation.id.clone(),
                    fraction: (index + 1) as f64 / total as f64,
                },
            );
            runs.push((regulation, result));
        }

        let scores = aggregator.aggregate(tenant_id, &runs);
        for score in &scores {
            self.store.upsert_risk_score(score.clone()).await?;
        }
        self.hub.publish(
            tenant_id,
            RiskEventKind::RiskUpdate {
                entities: scores.len(),
            },
        );

        let affected: Vec<NodeRef> = scores.iter().map(|s| s.entity.clone()).collect();
        self.store
            .append_audit(AuditEntry::new(
                tenant_id,
                "recalculation.complete",
                None,
                format!("{} entities scored", affected.len()),
            ))
            .await?;
        self.hub.publish(
            tenant_id,
            RiskEventKind::RecalculationComplete { affected },
        );
        Ok(scores)
    }

    async fn entity_tenant(&self, node: &NodeRef) -> ImpactResult<Option<String>> {
        Ok(match node.kind {
            EntityKind::Regulation => self
                .store
                .find_regulation(&node.id)
                .await?
                .map(|r| r.tenant_id),
            EntityKind::Department => self
                .store
                .find_department(&node.id)
                .await?
                .map(|d| d.tenant_id),
            EntityKind::Budget => self.store.find_budget(&node.id).await?.map(|b| b.tenant_id),
            EntityKind::Service => self
                .store
                .find_service(&node.id)
                .await?
                .map(|s| s.tenant_id),
            EntityKind::Kpi => self.store.find_kpi(&node.id).await?.map(|k| k.tenant_id),
        })
    }
}

/// Derive the wipe-and-insert impact rows from one propagation result:
/// one row per reachable non-source node.
fn impact_rows(
    tenant_id: &str,
    regulation_id: &str,
    result: &PropagationResult,
) -> Vec<RegulationImpact> {
    result
        .nodes
        .values()
        .filter(|affected| affected.node != result.source)
        .map(|affected| RegulationImpact {
            regulation_id: regulation_id.to_string(),
            tenant_id: tenant_id.to_string(),
            target: affected.node.clone(),
            impact_score: affected.impact_score,
            risk_level: RiskLevel::from_score(affected.impact_score),
            path: affected.path.clone(),
        })
        .collect()
}
