// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Derived risk records
//!
//! The engine writes two kinds of derived rows: per-regulation impact rows
//! replaced wholesale on every propagation run, and per-entity risk scores
//! aggregated across all active regulations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::edge::TraversedEdge;
use super::node::NodeRef;

/// Categorical risk bands derived from a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Band a numeric impact or base-risk score.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            RiskLevel::Critical
        } else if score >= 0.7 {
            RiskLevel::High
        } else if score >= 0.5 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// One row per reachable non-source node for a given regulation, replaced
/// wholesale on each propagation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulationImpact {
    pub regulation_id: String,
    pub tenant_id: String,
    pub target: NodeRef,
    pub impact_score: f64,
    pub risk_level: RiskLevel,
    pub path: Vec<TraversedEdge>,
}

/// Aggregate risk for one entity across every active regulation.
///
/// `base_score` is the severity-weighted total divided by the regulation
/// count; `adjusted_score` is the raw total. `factors` records each
/// regulation's contribution, keyed by regulation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    pub tenant_id: String,
    pub entity: NodeRef,
    pub base_score: f64,
    pub adjusted_score: f64,
    pub risk_level: RiskLevel,
    pub factors: HashMap<String, f64>,
}
