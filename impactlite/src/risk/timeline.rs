// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Before/after timeline comparison
//!
//! Compares one regulation's impact against the combined impact of every
//! regulation that was already effective before a reference date. Each
//! comparison is tracked as a simulation run: any failure transitions the
//! record to Failed with the message captured and no partial deltas.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::ImpactCache;
use crate::error::{ImpactError, ImpactResult};
use crate::model::{NodeRef, Regulation};
use crate::observer::{ObserverHub, RiskEventKind};
use crate::propagation::{
    CancelToken, PropagationEngine, PropagationOptions, PropagationResult, PropagationSeed,
};
use crate::store::{EntityStore, SimulationRun, SimulationStatus};

/// Depth cap for comparison propagations.
const COMPARISON_DEPTH: usize = 5;

/// Flat weight applied to each prior regulation's contribution in the
/// before state. A documented design choice, not a tunable.
const BEFORE_STATE_WEIGHT: f64 = 0.5;

/// Deltas at or below this magnitude are dropped from the comparison.
const DELTA_FLOOR: f64 = 0.01;

/// One node's before/after movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactDelta {
    pub node: NodeRef,
    pub before: f64,
    pub after: f64,
    pub delta: f64,
    pub percent_change: f64,
}

/// Outcome of one timeline comparison, sorted descending by |delta|.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactComparison {
    pub simulation_id: String,
    pub tenant_id: String,
    pub regulation_id: String,
    pub before_date: DateTime<Utc>,
    pub after_date: DateTime<Utc>,
    pub deltas: Vec<ImpactDelta>,
}

/// Straight-line before/after comparison engine.
pub struct TimelineEngine {
    store: Arc<dyn EntityStore>,
    cache: Arc<ImpactCache>,
    hub: Arc<ObserverHub>,
}

impl TimelineEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: Arc<ImpactCache>,
        hub: Arc<ObserverHub>,
    ) -> Self {
        Self { store, cache, hub }
    }

    /// Compare the target regulation's impact against the aggregate state
    /// of every other regulation effective before `before_date`.
    pub async fn compare_impact(
        &self,
        regulation_id: &str,
        before_date: DateTime<Utc>,
        after_date: DateTime<Utc>,
    ) -> ImpactResult<ImpactComparison> {
        let regulation = self
            .store
            .find_regulation(regulation_id)
            .await?
            .ok_or_else(|| {
                ImpactError::NotFound(format!("regulation {} not found", regulation_id))
            })?;
        let tenant_id = regulation.tenant_id.clone();
        let simulation_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();

        self.store
            .record_simulation(SimulationRun {
                id: simulation_id.clone(),
                tenant_id: tenant_id.clone(),
                regulation_id: regulation_id.to_string(),
                status: SimulationStatus::Running,
                error: None,
                started_at,
                finished_at: None,
            })
            .await?;
        self.hub.publish(
            &tenant_id,
            RiskEventKind::SimulationStart {
                simulation_id: simulation_id.clone(),
                regulation_id: regulation_id.to_string(),
            },
        );

        match self
            .run_comparison(&tenant_id, &regulation, before_date, &simulation_id)
            .await
        {
            Ok(deltas) => {
                self.finish_simulation(
                    &tenant_id,
                    &simulation_id,
                    regulation_id,
                    started_at,
                    SimulationStatus::Completed,
                    None,
                )
                .await;
                self.hub.publish(
                    &tenant_id,
                    RiskEventKind::SimulationComplete {
                        simulation_id: simulation_id.clone(),
                        deltas: deltas.len(),
                    },
                );
                Ok(ImpactComparison {
                    simulation_id,
                    tenant_id,
                    regulation_id: regulation_id.to_string(),
                    before_date,
                    after_date,
                    deltas,
                })
            }
            Err(e) => {
                self.finish_simulation(
                    &tenant_id,
                    &simulation_id,
                    regulation_id,
                    started_at,
                    SimulationStatus::Failed,
                    Some(e.to_string()),
                )
                .await;
                self.hub.publish(
                    &tenant_id,
                    RiskEventKind::SimulationError {
                        simulation_id,
                        message: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    async fn run_comparison(
        &self,
        tenant_id: &str,
        regulation: &Regulation,
        before_date: DateTime<Utc>,
        simulation_id: &str,
    ) -> ImpactResult<Vec<ImpactDelta>> {
        let cancel = CancelToken::new();
        let priors = self
            .store
            .regulations_active_before(tenant_id, before_date, &regulation.id)
            .await?;
        let total_steps = priors.len() + 1;

        let mut before: HashMap<NodeRef, f64> = HashMap::new();
        for (step, prior) in priors.iter().enumerate() {
            let result = self.propagate(tenant_id, prior, &cancel).await?;
            for (node, affected) in &result.nodes {
                *before.entry(node.clone()).or_insert(0.0) +=
                    affected.impact_score * BEFORE_STATE_WEIGHT;
            }
            self.hub.publish(
                tenant_id,
                RiskEventKind::SimulationProgress {
                    simulation_id: simulation_id.to_string(),
                    fraction: (step + 1) as f64 / total_steps as f64,
                },
            );
        }

        let after_run = self.propagate(tenant_id, regulation, &cancel).await?;
        let after: HashMap<NodeRef, f64> = after_run
            .nodes
            .iter()
            .map(|(node, affected)| (node.clone(), affected.impact_score))
            .collect();

        let keys: HashSet<NodeRef> = before.keys().chain(after.keys()).cloned().collect();
        let mut deltas = Vec::new();
        for node in keys {
            let before_score = before.get(&node).copied().unwrap_or(0.0);
            let after_score = after.get(&node).copied().unwrap_or(0.0);
            let delta = after_score - before_score;
            if delta.abs() <= DELTA_FLOOR {
                continue;
            }
            let percent_change = if before_score == 0.0 {
                100.0
            } else {
                delta / before_score * 100.0
            };
            deltas.push(ImpactDelta {
                node,
                before: before_score,
                after: after_score,
                delta,
                percent_change,
            });
        }
        deltas.sort_by(|a, b| {
            b.delta
                .abs()
                .partial_cmp(&a.delta.abs())
                .unwrap_or(Ordering::Equal)
        });
        Ok(deltas)
    }

    async fn propagate(
        &self,
        tenant_id: &str,
        regulation: &Regulation,
        cancel: &CancelToken,
    ) -> ImpactResult<PropagationResult> {
        let engine = PropagationEngine::new(
            tenant_id,
            Arc::clone(&self.store),
            Arc::clone(&self.cache),
            PropagationOptions::with_depth(COMPARISON_DEPTH),
        )?;
        let seed = PropagationSeed::with_impact(
            NodeRef::regulation(&regulation.id),
            regulation.severity.initial_impact(),
        );
        engine.propagate(seed, cancel).await
    }

    /// Transition the simulation record; a store failure here is logged
    /// and swallowed since the comparison outcome is already decided.
    async fn finish_simulation(
        &self,
        tenant_id: &str,
        simulation_id: &str,
        regulation_id: &str,
        started_at: DateTime<Utc>,
        status: SimulationStatus,
        error: Option<String>,
    ) {
        let run = SimulationRun {
            id: simulation_id.to_string(),
            tenant_id: tenant_id.to_string(),
            regulation_id: regulation_id.to_string(),
            status,
            error,
            started_at,
            finished_at: Some(Utc::now()),
        };
        if let Err(e) = self.store.record_simulation(run).await {
            log::warn!(
                "failed to update simulation record {}: {}",
                simulation_id,
                e
            );
        }
    }
}
