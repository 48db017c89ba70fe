// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Impact propagation
//!
//! The propagation engine expands accumulated impact outward from a seed
//! node, breadth-first over the tenant's dependency graph, honoring depth
//! and threshold cutoffs and per-edge-type rules. Each run is internally
//! sequential and owns all of its state; runs for different tenants may
//! proceed in parallel.

pub mod engine;
pub mod options;

pub use engine::{AffectedNode, PropagationEngine, PropagationResult, PropagationSeed};
pub use options::{CancelToken, PropagationOptions};
