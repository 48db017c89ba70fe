// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Breadth-first weighted impact traversal

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::options::{CancelToken, PropagationOptions};
use crate::cache::ImpactCache;
use crate::error::{ImpactError, ImpactResult};
use crate::graph::{DependencyGraph, GraphBuilder};
use crate::model::{ImpactType, NodeRef, TraversedEdge};
use crate::store::EntityStore;

/// Where a propagation starts: the seed node and its initial impact.
#[derive(Debug, Clone)]
pub struct PropagationSeed {
    pub source: NodeRef,
    pub initial_impact: f64,
}

impl PropagationSeed {
    /// Seed with full initial impact.
    pub fn new(source: NodeRef) -> Self {
        Self {
            source,
            initial_impact: 1.0,
        }
    }

    pub fn with_impact(source: NodeRef, initial_impact: f64) -> Self {
        Self {
            source,
            initial_impact,
        }
    }
}

/// One node reached by a propagation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedNode {
    pub node: NodeRef,
    pub display_name: String,
    /// Strength of the best surviving path to this node.
    pub impact_score: f64,
    /// Depth at which the node was first reached.
    pub depth: usize,
    /// Every accepted edge that led here, in acceptance order.
    pub path: Vec<TraversedEdge>,
}

/// Outcome of one propagation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationResult {
    pub source: NodeRef,
    /// Reached nodes excluding the source.
    pub total_affected: usize,
    /// Deepest depth observed among reached nodes.
    pub max_depth_reached: usize,
    /// Reached nodes keyed by node key, source included at depth 0.
    pub nodes: HashMap<NodeRef, AffectedNode>,
    /// Edges in the order the traversal accepted them.
    pub edges: Vec<TraversedEdge>,
    pub execution_time_ms: u64,
    /// Set when cancellation fired mid-run; the result is then partial.
    pub cancelled: bool,
}

impl PropagationResult {
    /// Look up a reached node by reference.
    pub fn node(&self, node: &NodeRef) -> Option<&AffectedNode> {
        self.nodes.get(node)
    }
}

/// Tenant-scoped breadth-first impact traversal over the cached
/// dependency graph.
///
/// Each call to [`propagate`](PropagationEngine::propagate) owns its
/// entire working state; engines are cheap and constructed per run where
/// convenient.
pub struct PropagationEngine {
    tenant_id: String,
    store: Arc<dyn EntityStore>,
    builder: GraphBuilder,
    options: PropagationOptions,
}

impl PropagationEngine {
    pub fn new(
        tenant_id: impl Into<String>,
        store: Arc<dyn EntityStore>,
        cache: Arc<ImpactCache>,
        options: PropagationOptions,
    ) -> ImpactResult<Self> {
        options.validate()?;
        Ok(Self {
            tenant_id: tenant_id.into(),
            builder: GraphBuilder::new(Arc::clone(&store), cache),
            store,
            options,
        })
    }

    pub fn options(&self) -> &PropagationOptions {
        &self.options
    }

    /// Run one breadth-first expansion from the seed.
    ///
    /// An unknown source id is not an error: the result then holds only
    /// the source node with zero affected. Store failures during graph
    /// load surface as `Upstream`. When the token fires, the partial
    /// result comes back flagged `cancelled`; the caller decides whether
    /// to keep it.
    pub async fn propagate(
        &self,
        seed: PropagationSeed,
        cancel: &CancelToken,
    ) -> ImpactResult<PropagationResult> {
        if !(0.0..=1.0).contains(&seed.initial_impact) {
            return Err(ImpactError::Invalid(format!(
                "initial_impact {} outside [0, 1]",
                seed.initial_impact
            )));
        }

        let started = Instant::now();
        let graph = self.builder.build(&self.tenant_id).await?;
        let names = self.prefetch_names(&graph, &seed.source).await;

        let mut nodes: HashMap<NodeRef, AffectedNode> = HashMap::new();
        let mut edges: Vec<TraversedEdge> = Vec::new();
        let mut visited: HashSet<(NodeRef, NodeRef)> = HashSet::new();
        let mut frontier: VecDeque<(NodeRef, f64, usize)> = VecDeque::new();

        let source = seed.source.clone();
        nodes.insert(
            source.clone(),
            AffectedNode {
                display_name: resolve_name(&names, &source),
                node: source.clone(),
                impact_score: seed.initial_impact,
                depth: 0,
                path: Vec::new(),
            },
        );
        frontier.push_back((source.clone(), seed.initial_impact, 0));

        let mut cancelled = false;
        'expand: while let Some((current, impact, depth)) = frontier.pop_front() {
            for edge in graph.outgoing(&current) {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break 'expand;
                }
                if !edge.active {
                    continue;
                }
                if edge.impact_type == ImpactType::Indirect && !self.options.include_indirect {
                    continue;
                }
                if edge.impact_type == ImpactType::Conditional && !edge.condition_holds() {
                    continue;
                }

                let next = impact
                    * edge.impact_weight
                    * edge.impact_type.multiplier()
                    * edge.target.kind.severity_weight();
                if next < self.options.impact_threshold {
                    continue;
                }

                let next_depth = depth + 1;
                if next_depth > self.options.max_depth {
                    continue;
                }

                // cycle break: each directed (source, target) pair is
                // traversed at most once per run
                if !visited.insert((edge.source.clone(), edge.target.clone())) {
                    continue;
                }

                let traversed = TraversedEdge::from(edge);
                edges.push(traversed.clone());

                match nodes.entry(edge.target.clone()) {
                    Entry::Occupied(mut occupied) => {
                        // score is the best path's intensity, never a sum
                        let existing = occupied.get_mut();
                        existing.impact_score = existing.impact_score.max(next);
                        existing.path.push(traversed);
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(AffectedNode {
                            display_name: resolve_name(&names, &edge.target),
                            node: edge.target.clone(),
                            impact_score: next,
                            depth: next_depth,
                            path: vec![traversed],
                        });
                    }
                }

                if next_depth < self.options.max_depth {
                    frontier.push_back((edge.target.clone(), next, next_depth));
                }
            }
        }

        let max_depth_reached = nodes.values().map(|n| n.depth).max().unwrap_or(0);
        let total_affected = nodes.len() - 1;
        log::debug!(
            "propagation from {} reached {} nodes at depth {} in {:?}{}",
            source,
            total_affected,
            max_depth_reached,
            started.elapsed(),
            if cancelled { " (cancelled)" } else { "" }
        );

        Ok(PropagationResult {
            source,
            total_affected,
            max_depth_reached,
            nodes,
            edges,
            execution_time_ms: started.elapsed().as_millis() as u64,
            cancelled,
        })
    }

    /// Resolve display names for every node the traversal can reach, one
    /// store lookup per graph node, before the expansion starts. Lookup
    /// failures are swallowed; traversal falls back to the raw id.
    async fn prefetch_names(
        &self,
        graph: &DependencyGraph,
        source: &NodeRef,
    ) -> HashMap<NodeRef, String> {
        let mut names = HashMap::new();
        for node in graph.node_refs() {
            if let Some(name) = self.store.display_name(node).await {
                names.insert(node.clone(), name);
            }
        }
        if !names.contains_key(source) {
            if let Some(name) = self.store.display_name(source).await {
                names.insert(source.clone(), name);
            }
        }
        names
    }
}

fn resolve_name(names: &HashMap<NodeRef, String>, node: &NodeRef) -> String {
    names.get(node).cloned().unwrap_or_else(|| node.id.clone())
}
