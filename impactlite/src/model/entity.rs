// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Entity records owned by the external store
//!
//! The core reads selected fields from these records; it never persists
//! them itself. All entities are soft-deleted through their `active` flag
//! and carry a per-tenant-unique `code`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Regulation severity, driving both the initial impact a propagation is
/// seeded with and the weighting applied during risk aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Initial impact a propagation run is seeded with for this severity.
    pub fn initial_impact(&self) -> f64 {
        match self {
            Severity::Critical => 1.0,
            Severity::High => 0.8,
            Severity::Medium => 0.5,
            Severity::Low => 0.3,
        }
    }

    /// Multiplier applied to this regulation's contributions during risk
    /// aggregation.
    pub fn risk_multiplier(&self) -> f64 {
        match self {
            Severity::Critical => 2.0,
            Severity::High => 1.5,
            Severity::Medium => 1.0,
            Severity::Low => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegulationStatus {
    Draft,
    Active,
    Superseded,
    Revoked,
}

/// The isolation unit. All graph state, caches, and notifications are
/// scoped by tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regulation {
    pub id: String,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    pub severity: Severity,
    pub status: RegulationStatus,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: Option<DateTime<Utc>>,
    /// Strictly increases on every update.
    pub version: u64,
    pub active: bool,
}

impl Regulation {
    /// Whether this regulation participates in propagation and aggregation:
    /// active flag set and past the draft stage.
    pub fn is_enforceable(&self) -> bool {
        self.active && self.status != RegulationStatus::Draft
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    pub parent: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    pub amount: f64,
    pub currency: String,
    pub fiscal_year: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    pub service_type: String,
    pub status: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpi {
    pub id: String,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub target: f64,
    pub current: f64,
    pub frequency: String,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_seed_table() {
        assert_eq!(Severity::Critical.initial_impact(), 1.0);
        assert_eq!(Severity::High.initial_impact(), 0.8);
        assert_eq!(Severity::Medium.initial_impact(), 0.5);
        assert_eq!(Severity::Low.initial_impact(), 0.3);
    }

    #[test]
    fn severity_multiplier_table() {
        assert_eq!(Severity::Critical.risk_multiplier(), 2.0);
        assert_eq!(Severity::High.risk_multiplier(), 1.5);
        assert_eq!(Severity::Medium.risk_multiplier(), 1.0);
        assert_eq!(Severity::Low.risk_multiplier(), 0.5);
    }

    #[test]
    fn draft_regulations_are_not_enforceable() {
        let mut reg = Regulation {
            id: "r1".into(),
            tenant_id: "t1".into(),
            code: "GDPR".into(),
            name: "GDPR".into(),
            severity: Severity::High,
            status: RegulationStatus::Draft,
            effective_date: Utc::now(),
            expiration_date: None,
            version: 1,
            active: true,
        };
        assert!(!reg.is_enforceable());
        reg.status = RegulationStatus::Active;
        assert!(reg.is_enforceable());
        reg.active = false;
        assert!(!reg.is_enforceable());
    }
}
