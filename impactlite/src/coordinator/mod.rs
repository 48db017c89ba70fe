// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Orchestration facade
//!
//! The coordinator owns the store, cache, and observer hub, and is the
//! single place the invalidation discipline lives: every entity or edge
//! mutation flows through a wrapper here that invalidates the matching
//! cache tags and appends an audit entry before the mutation is reported
//! successful.

pub mod impact_coordinator;

pub use impact_coordinator::ImpactCoordinator;
