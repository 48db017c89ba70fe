// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! External store contract
//!
//! The persistent store is an external collaborator; this module defines
//! the interface the core consumes plus the append-only audit and
//! simulation records the core writes through it. [`MemoryStore`] provides
//! a complete in-memory implementation for tests and embedding.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ImpactResult;
use crate::model::{
    Budget, Department, EntityKind, ImpactEdge, Kpi, NodeRef, Regulation, RegulationImpact,
    RiskScore, Service, Tenant,
};

pub use memory::MemoryStore;

/// Append-only audit record written on mutations and recalculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub tenant_id: String,
    pub action: String,
    pub entity: Option<NodeRef>,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        tenant_id: impl Into<String>,
        action: impl Into<String>,
        entity: Option<NodeRef>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.into(),
            action: action.into(),
            entity,
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStatus {
    Running,
    Completed,
    Failed,
}

/// Tracking record for one timeline comparison run.
///
/// Any failure during the run transitions the record to `Failed` with the
/// error message captured; no partial results are emitted alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub id: String,
    pub tenant_id: String,
    pub regulation_id: String,
    pub status: SimulationStatus,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// What the core requires of the persistent store.
///
/// Finders return `Ok(None)` for absent entities; `Err` is reserved for
/// store failures, which the core surfaces as
/// [`ImpactError::Upstream`](crate::error::ImpactError) without retrying.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_tenant(&self, id: &str) -> ImpactResult<Option<Tenant>>;
    async fn find_regulation(&self, id: &str) -> ImpactResult<Option<Regulation>>;
    async fn find_department(&self, id: &str) -> ImpactResult<Option<Department>>;
    async fn find_budget(&self, id: &str) -> ImpactResult<Option<Budget>>;
    async fn find_service(&self, id: &str) -> ImpactResult<Option<Service>>;
    async fn find_kpi(&self, id: &str) -> ImpactResult<Option<Kpi>>;

    /// All active edges for the tenant.
    async fn active_edges(&self, tenant_id: &str) -> ImpactResult<Vec<ImpactEdge>>;

    /// All active, non-draft regulations for the tenant.
    async fn active_regulations(&self, tenant_id: &str) -> ImpactResult<Vec<Regulation>>;

    /// Active, non-draft regulations effective strictly before `date`,
    /// excluding the given regulation id.
    async fn regulations_active_before(
        &self,
        tenant_id: &str,
        date: DateTime<Utc>,
        excluding: &str,
    ) -> ImpactResult<Vec<Regulation>>;

    /// Atomic wipe-and-insert of one regulation's derived impact rows.
    async fn replace_regulation_impacts(
        &self,
        regulation_id: &str,
        impacts: Vec<RegulationImpact>,
    ) -> ImpactResult<()>;

    /// Idempotent upsert keyed on (tenant, entity).
    async fn upsert_risk_score(&self, score: RiskScore) -> ImpactResult<()>;

    /// Append-only.
    async fn append_audit(&self, entry: AuditEntry) -> ImpactResult<()>;

    /// Upsert a simulation tracking record by id.
    async fn record_simulation(&self, run: SimulationRun) -> ImpactResult<()>;

    /// Resolve an entity's display name, swallowing failures.
    ///
    /// Returns `None` on not-found or store error; callers fall back to the
    /// raw id. One lookup per node - batch callers should prefetch.
    async fn display_name(&self, node: &NodeRef) -> Option<String> {
        match node.kind {
            EntityKind::Regulation => self
                .find_regulation(&node.id)
                .await
                .ok()
                .flatten()
                .map(|r| r.name),
            EntityKind::Department => self
                .find_department(&node.id)
                .await
                .ok()
                .flatten()
                .map(|d| d.name),
            EntityKind::Budget => self.find_budget(&node.id).await.ok().flatten().map(|b| b.name),
            EntityKind::Service => self
                .find_service(&node.id)
                .await
                .ok()
                .flatten()
                .map(|s| s.name),
            EntityKind::Kpi => self.find_kpi(&node.id).await.ok().flatten().map(|k| k.name),
        }
    }
}
