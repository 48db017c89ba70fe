// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory store implementation for tests and embedding
//!
//! Backs the full [`EntityStore`] contract with parking_lot-guarded maps.
//! Mutation helpers enforce the invariants the external store is
//! responsible for: per-tenant code uniqueness, single active edge per
//! (source, target) pair, soft deletion, and strictly increasing
//! regulation versions.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{AuditEntry, EntityStore, SimulationRun};
use crate::error::{ImpactError, ImpactResult};
use crate::model::{
    Budget, Department, ImpactEdge, Kpi, Regulation, RegulationImpact, RiskScore, Service, Tenant,
};

#[derive(Default)]
struct Inner {
    tenants: HashMap<String, Tenant>,
    regulations: HashMap<String, Regulation>,
    departments: HashMap<String, Department>,
    budgets: HashMap<String, Budget>,
    services: HashMap<String, Service>,
    kpis: HashMap<String, Kpi>,
    edges: HashMap<String, ImpactEdge>,
    impacts: HashMap<String, Vec<RegulationImpact>>,
    risk_scores: HashMap<(String, String), RiskScore>,
    audit: Vec<AuditEntry>,
    simulations: HashMap<String, SimulationRun>,
}

/// In-memory [`EntityStore`] for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tenant(&self, tenant: Tenant) {
        self.inner.write().tenants.insert(tenant.id.clone(), tenant);
    }

    /// Insert a new regulation. Codes are unique per tenant.
    pub fn insert_regulation(&self, regulation: Regulation) -> ImpactResult<()> {
        let mut inner = self.inner.write();
        let duplicate = inner.regulations.values().any(|r| {
            r.tenant_id == regulation.tenant_id && r.code == regulation.code && r.id != regulation.id
        });
        if duplicate {
            return Err(ImpactError::Conflict(format!(
                "regulation code {} already exists in tenant {}",
                regulation.code, regulation.tenant_id
            )));
        }
        inner
            .regulations
            .insert(regulation.id.clone(), regulation);
        Ok(())
    }

    /// Replace a regulation's state, bumping its version past the stored one.
    pub fn update_regulation(&self, mut regulation: Regulation) -> ImpactResult<Regulation> {
        let mut inner = self.inner.write();
        let current = inner.regulations.get(&regulation.id).ok_or_else(|| {
            ImpactError::NotFound(format!("regulation {} not found", regulation.id))
        })?;
        regulation.version = current.version + 1;
        inner
            .regulations
            .insert(regulation.id.clone(), regulation.clone());
        Ok(regulation)
    }

    pub fn insert_department(&self, department: Department) {
        self.inner
            .write()
            .departments
            .insert(department.id.clone(), department);
    }

    pub fn insert_budget(&self, budget: Budget) {
        self.inner.write().budgets.insert(budget.id.clone(), budget);
    }

    pub fn insert_service(&self, service: Service) {
        self.inner
            .write()
            .services
            .insert(service.id.clone(), service);
    }

    pub fn insert_kpi(&self, kpi: Kpi) {
        self.inner.write().kpis.insert(kpi.id.clone(), kpi);
    }

    /// Insert a new edge, enforcing the edge-local invariants plus active
    /// (source, target) uniqueness within the tenant.
    pub fn insert_edge(&self, edge: ImpactEdge) -> ImpactResult<()> {
        edge.validate()?;
        let mut inner = self.inner.write();
        if edge.active {
            let duplicate = inner.edges.values().any(|e| {
                e.active
                    && e.id != edge.id
                    && e.tenant_id == edge.tenant_id
                    && e.source == edge.source
                    && e.target == edge.target
            });
            if duplicate {
                return Err(ImpactError::Conflict(format!(
                    "active edge {} -> {} already exists in tenant {}",
                    edge.source, edge.target, edge.tenant_id
                )));
            }
        }
        inner.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    /// Soft-delete an edge.
    pub fn deactivate_edge(&self, edge_id: &str) -> ImpactResult<ImpactEdge> {
        let mut inner = self.inner.write();
        let edge = inner
            .edges
            .get_mut(edge_id)
            .ok_or_else(|| ImpactError::NotFound(format!("edge {} not found", edge_id)))?;
        edge.active = false;
        Ok(edge.clone())
    }

    /// Replace an edge's attributes in place.
    pub fn update_edge(&self, edge: ImpactEdge) -> ImpactResult<()> {
        edge.validate()?;
        let mut inner = self.inner.write();
        if !inner.edges.contains_key(&edge.id) {
            return Err(ImpactError::NotFound(format!("edge {} not found", edge.id)));
        }
        inner.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    pub fn regulation_impacts(&self, regulation_id: &str) -> Vec<RegulationImpact> {
        self.inner
            .read()
            .impacts
            .get(regulation_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn risk_score(&self, tenant_id: &str, node_key: &str) -> Option<RiskScore> {
        self.inner
            .read()
            .risk_scores
            .get(&(tenant_id.to_string(), node_key.to_string()))
            .cloned()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.inner.read().audit.clone()
    }

    pub fn simulation(&self, id: &str) -> Option<SimulationRun> {
        self.inner.read().simulations.get(id).cloned()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_tenant(&self, id: &str) -> ImpactResult<Option<Tenant>> {
        Ok(self.inner.read().tenants.get(id).cloned())
    }

    async fn find_regulation(&self, id: &str) -> ImpactResult<Option<Regulation>> {
        Ok(self.inner.read().regulations.get(id).cloned())
    }

    async fn find_department(&self, id: &str) -> ImpactResult<Option<Department>> {
        Ok(self.inner.read().departments.get(id).cloned())
    }

    async fn find_budget(&self, id: &str) -> ImpactResult<Option<Budget>> {
        Ok(self.inner.read().budgets.get(id).cloned())
    }

    async fn find_service(&self, id: &str) -> ImpactResult<Option<Service>> {
        Ok(self.inner.read().services.get(id).cloned())
    }

    async fn find_kpi(&self, id: &str) -> ImpactResult<Option<Kpi>> {
        Ok(self.inner.read().kpis.get(id).cloned())
    }

    async fn active_edges(&self, tenant_id: &str) -> ImpactResult<Vec<ImpactEdge>> {
        Ok(self
            .inner
            .read()
            .edges
            .values()
            .filter(|e| e.active && e.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn active_regulations(&self, tenant_id: &str) -> ImpactResult<Vec<Regulation>> {
        let mut regulations: Vec<Regulation> = self
            .inner
            .read()
            .regulations
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.is_enforceable())
            .cloned()
            .collect();
        // deterministic enumeration order for aggregation runs
        regulations.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(regulations)
    }

    async fn regulations_active_before(
        &self,
        tenant_id: &str,
        date: DateTime<Utc>,
        excluding: &str,
    ) -> ImpactResult<Vec<Regulation>> {
        let mut regulations: Vec<Regulation> = self
            .inner
            .read()
            .regulations
            .values()
            .filter(|r| {
                r.tenant_id == tenant_id
                    && r.is_enforceable()
                    && r.effective_date < date
                    && r.id != excluding
            })
            .cloned()
            .collect();
        regulations.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(regulations)
    }

    async fn replace_regulation_impacts(
        &self,
        regulation_id: &str,
        impacts: Vec<RegulationImpact>,
    ) -> ImpactResult<()> {
        self.inner
            .write()
            .impacts
            .insert(regulation_id.to_string(), impacts);
        Ok(())
    }

    async fn upsert_risk_score(&self, score: RiskScore) -> ImpactResult<()> {
        self.inner
            .write()
            .risk_scores
            .insert((score.tenant_id.clone(), score.entity.key()), score);
        Ok(())
    }

    async fn append_audit(&self, entry: AuditEntry) -> ImpactResult<()> {
        self.inner.write().audit.push(entry);
        Ok(())
    }

    async fn record_simulation(&self, run: SimulationRun) -> ImpactResult<()> {
        self.inner.write().simulations.insert(run.id.clone(), run);
        Ok(())
    }
}
