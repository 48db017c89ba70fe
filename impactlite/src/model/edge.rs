// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Weighted, typed impact edges
//!
//! An edge is a directed relationship between two entities of the same
//! tenant, carrying an impact weight in [0, 1] and an impact type that
//! scales how strongly impact propagates across it. Conditional edges
//! additionally carry a free-form condition object evaluated per traversal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::node::NodeRef;
use crate::error::{ImpactError, ImpactResult};

/// How impact crosses an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactType {
    Direct,
    Indirect,
    Conditional,
}

impl ImpactType {
    /// Dampening applied on top of the edge weight.
    pub fn multiplier(&self) -> f64 {
        match self {
            ImpactType::Direct => 1.0,
            ImpactType::Indirect => 0.6,
            ImpactType::Conditional => 0.3,
        }
    }
}

/// A directed impact relationship between two entities of one tenant.
///
/// Invariants: no self-loops, weight within [0, 1], and at most one active
/// edge per (source, target) pair. The first two are checked by
/// [`ImpactEdge::validate`]; uniqueness is enforced where edges are
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactEdge {
    pub id: String,
    pub tenant_id: String,
    pub source: NodeRef,
    pub target: NodeRef,
    pub impact_weight: f64,
    pub impact_type: ImpactType,
    pub impact_category: Option<String>,
    pub condition: Option<Value>,
    pub active: bool,
}

impl ImpactEdge {
    /// Check the edge-local invariants: weight range and self-loop.
    pub fn validate(&self) -> ImpactResult<()> {
        if !(0.0..=1.0).contains(&self.impact_weight) {
            return Err(ImpactError::Invalid(format!(
                "impact weight {} outside [0, 1] on edge {}",
                self.impact_weight, self.id
            )));
        }
        if self.source == self.target {
            return Err(ImpactError::Invalid(format!(
                "self-loop on {} (edge {})",
                self.source, self.id
            )));
        }
        Ok(())
    }

    /// Evaluate this edge's condition object.
    ///
    /// A `required` key governs when present: pass iff it is the boolean
    /// `true`. Otherwise a `threshold` key passes iff its numeric value is
    /// strictly greater than zero. Anything else passes. The `required`
    /// check short-circuits: a condition carrying both keys obeys
    /// `required` only.
    pub fn condition_holds(&self) -> bool {
        let Some(condition) = &self.condition else {
            return true;
        };
        let Some(fields) = condition.as_object() else {
            return true;
        };
        if let Some(required) = fields.get("required") {
            return required.as_bool() == Some(true);
        }
        if let Some(threshold) = fields.get("threshold") {
            return threshold.as_f64().map_or(false, |t| t > 0.0);
        }
        true
    }
}

/// An edge as recorded in a propagation result: the accepted traversal step
/// stripped down to its wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversedEdge {
    pub source: NodeRef,
    pub target: NodeRef,
    pub weight: f64,
    pub impact_type: ImpactType,
}

impl From<&ImpactEdge> for TraversedEdge {
    fn from(edge: &ImpactEdge) -> Self {
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            weight: edge.impact_weight,
            impact_type: edge.impact_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edge_with_condition(condition: Option<Value>) -> ImpactEdge {
        ImpactEdge {
            id: "e1".into(),
            tenant_id: "t1".into(),
            source: NodeRef::regulation("r1"),
            target: NodeRef::department("d1"),
            impact_weight: 0.5,
            impact_type: ImpactType::Conditional,
            impact_category: None,
            condition,
            active: true,
        }
    }

    #[test]
    fn absent_condition_passes() {
        assert!(edge_with_condition(None).condition_holds());
        assert!(edge_with_condition(Some(json!({}))).condition_holds());
    }

    #[test]
    fn required_key_governs() {
        assert!(edge_with_condition(Some(json!({"required": true}))).condition_holds());
        assert!(!edge_with_condition(Some(json!({"required": false}))).condition_holds());
        assert!(!edge_with_condition(Some(json!({"required": 1}))).condition_holds());
    }

    #[test]
    fn threshold_must_be_strictly_positive() {
        assert!(edge_with_condition(Some(json!({"threshold": 0.2}))).condition_holds());
        assert!(!edge_with_condition(Some(json!({"threshold": 0.0}))).condition_holds());
        assert!(!edge_with_condition(Some(json!({"threshold": -1.0}))).condition_holds());
        assert!(!edge_with_condition(Some(json!({"threshold": "high"}))).condition_holds());
    }

    #[test]
    fn required_shadows_threshold_when_both_present() {
        // threshold alone would pass; required=false must win
        let both = json!({"required": false, "threshold": 5.0});
        assert!(!edge_with_condition(Some(both)).condition_holds());

        // and required=true wins over a failing threshold
        let both = json!({"required": true, "threshold": 0.0});
        assert!(edge_with_condition(Some(both)).condition_holds());
    }

    #[test]
    fn unrecognized_keys_pass() {
        assert!(edge_with_condition(Some(json!({"region": "eu"}))).condition_holds());
        assert!(edge_with_condition(Some(json!("free text"))).condition_holds());
    }

    #[test]
    fn validate_rejects_self_loop_and_bad_weight() {
        let mut edge = edge_with_condition(None);
        assert!(edge.validate().is_ok());

        edge.impact_weight = 1.5;
        assert!(edge.validate().is_err());
        edge.impact_weight = -0.1;
        assert!(edge.validate().is_err());

        edge.impact_weight = 0.5;
        edge.target = edge.source.clone();
        assert!(edge.validate().is_err());
    }
}
