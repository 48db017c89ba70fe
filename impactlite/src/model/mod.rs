// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Core data model
//!
//! This module defines the typed node identities, the entity records read
//! from the external store, the weighted impact edges joining them, and the
//! derived risk records the engine writes back.

pub mod edge;
pub mod entity;
pub mod node;
pub mod risk;

pub use edge::{ImpactEdge, ImpactType, TraversedEdge};
pub use entity::{
    Budget, Department, Kpi, Regulation, RegulationStatus, Service, Severity, Tenant,
};
pub use node::{EntityKind, NodeRef};
pub use risk::{RegulationImpact, RiskLevel, RiskScore};
