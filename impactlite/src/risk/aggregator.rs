// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-entity risk aggregation across active regulations

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::ImpactCache;
use crate::error::ImpactResult;
use crate::model::{EntityKind, NodeRef, Regulation, RiskLevel, RiskScore};
use crate::propagation::{
    CancelToken, PropagationEngine, PropagationOptions, PropagationResult, PropagationSeed,
};
use crate::store::EntityStore;

/// Depth cap used for risk-scoring propagations.
const RISK_PROPAGATION_DEPTH: usize = 10;

/// One department's position in the risk ranking, enriched with its name
/// and code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentRisk {
    pub department_id: String,
    pub name: String,
    pub code: String,
    pub score: RiskScore,
}

/// Folds per-regulation propagation results into per-entity risk scores.
///
/// One propagation engine is constructed per regulation; runs proceed
/// serially within one aggregation call.
pub struct RiskAggregator {
    store: Arc<dyn EntityStore>,
    cache: Arc<ImpactCache>,
}

impl RiskAggregator {
    pub fn new(store: Arc<dyn EntityStore>, cache: Arc<ImpactCache>) -> Self {
        Self { store, cache }
    }

    /// Propagate every active regulation and aggregate the results into
    /// risk scores, upserted to the store and returned sorted descending
    /// by adjusted score.
    pub async fn calculate_all_risks(&self, tenant_id: &str) -> ImpactResult<Vec<RiskScore>> {
        let regulations = self.store.active_regulations(tenant_id).await?;
        if regulations.is_empty() {
            return Ok(Vec::new());
        }

        let cancel = CancelToken::new();
        let mut runs = Vec::with_capacity(regulations.len());
        for regulation in regulations {
            let result = self
                .propagate_regulation(tenant_id, &regulation, &cancel)
                .await?;
            runs.push((regulation, result));
        }

        let scores = self.aggregate(tenant_id, &runs);
        for score in &scores {
            self.store.upsert_risk_score(score.clone()).await?;
        }
        Ok(scores)
    }

    /// Run one regulation's propagation at the risk-scoring depth cap,
    /// seeded from its severity.
    pub async fn propagate_regulation(
        &self,
        tenant_id: &str,
        regulation: &Regulation,
        cancel: &CancelToken,
    ) -> ImpactResult<PropagationResult> {
        let engine = PropagationEngine::new(
            tenant_id,
            Arc::clone(&self.store),
            Arc::clone(&self.cache),
            PropagationOptions::with_depth(RISK_PROPAGATION_DEPTH),
        )?;
        let seed = PropagationSeed::with_impact(
            NodeRef::regulation(&regulation.id),
            regulation.severity.initial_impact(),
        );
        engine.propagate(seed, cancel).await
    }

    /// Fold completed runs into per-entity scores: each reached node
    /// accumulates `score × severity multiplier` per regulation, with the
    /// contribution recorded in the factors map. Source nodes are not
    /// scored against themselves.
    pub fn aggregate(
        &self,
        tenant_id: &str,
        runs: &[(Regulation, PropagationResult)],
    ) -> Vec<RiskScore> {
        let mut totals: HashMap<NodeRef, (f64, HashMap<String, f64>)> = HashMap::new();
        for (regulation, result) in runs {
            let multiplier = regulation.severity.risk_multiplier();
            for (node, affected) in &result.nodes {
                if *node == result.source {
                    continue;
                }
                let contribution = affected.impact_score * multiplier;
                let entry = totals.entry(node.clone()).or_default();
                entry.0 += contribution;
                entry.1.insert(regulation.id.clone(), contribution);
            }
        }

        let regulation_count = runs.len() as f64;
        let mut scores: Vec<RiskScore> = totals
            .into_iter()
            .map(|(entity, (total, factors))| {
                let base_score = total / regulation_count;
                RiskScore {
                    tenant_id: tenant_id.to_string(),
                    entity,
                    base_score,
                    adjusted_score: total,
                    risk_level: RiskLevel::from_score(base_score),
                    factors,
                }
            })
            .collect();
        scores.sort_by(|a, b| {
            b.adjusted_score
                .partial_cmp(&a.adjusted_score)
                .unwrap_or(Ordering::Equal)
        });
        scores
    }

    /// The risk ranking restricted to departments, enriched with each
    /// department's name and code. Enrichment failures fall back to the
    /// raw id.
    pub async fn department_risk_ranking(
        &self,
        tenant_id: &str,
    ) -> ImpactResult<Vec<DepartmentRisk>> {
        let scores = self.calculate_all_risks(tenant_id).await?;
        let mut ranking = Vec::new();
        for score in scores {
            if score.entity.kind != EntityKind::Department {
                continue;
            }
            let department_id = score.entity.id.clone();
            let (name, code) = match self.store.find_department(&department_id).await {
                Ok(Some(department)) => (department.name, department.code),
                _ => (department_id.clone(), department_id.clone()),
            };
            ranking.push(DepartmentRisk {
                department_id,
                name,
                code,
                score,
            });
        }
        // calculate_all_risks already sorts descending by adjusted score
        Ok(ranking)
    }
}
