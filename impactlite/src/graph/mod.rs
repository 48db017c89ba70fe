// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-tenant dependency graphs
//!
//! A dependency graph is the cached view of one tenant's active impact
//! edges, indexed by outgoing and incoming adjacency. Graphs are immutable
//! once built and shared behind `Arc`; mutations invalidate the cached
//! graph and the next build repopulates it.

pub mod builder;
pub mod dependency_graph;

pub use builder::{GraphBuilder, DEPENDENCY_GRAPH_KEY};
pub use dependency_graph::DependencyGraph;
