// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Risk aggregation and timeline comparison
//!
//! Pure consumers of the propagation engine: the aggregator folds
//! per-regulation impact maps into per-entity risk scores and rankings;
//! the timeline engine computes before/after deltas for one regulation
//! against a reference date.

pub mod aggregator;
pub mod timeline;

pub use aggregator::{DepartmentRisk, RiskAggregator};
pub use timeline::{ImpactComparison, ImpactDelta, TimelineEngine};
