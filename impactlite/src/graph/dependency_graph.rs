// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Adjacency-indexed view of one tenant's active edges

use std::collections::HashMap;

use crate::model::{ImpactEdge, NodeRef};

/// Immutable adjacency-indexed graph over a tenant's active edges.
///
/// Holds the same edges three ways: bucketed by source, bucketed by
/// target, and as the flat list. Only active edges are admitted; the
/// within-bucket order is the order edges were supplied in, which is the
/// order traversal visits them.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    outgoing: HashMap<NodeRef, Vec<ImpactEdge>>,
    incoming: HashMap<NodeRef, Vec<ImpactEdge>>,
    edges: Vec<ImpactEdge>,
}

impl DependencyGraph {
    /// Build from an edge set, dropping inactive edges.
    pub fn from_edges(edges: Vec<ImpactEdge>) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            if !edge.active {
                continue;
            }
            graph
                .outgoing
                .entry(edge.source.clone())
                .or_default()
                .push(edge.clone());
            graph
                .incoming
                .entry(edge.target.clone())
                .or_default()
                .push(edge.clone());
            graph.edges.push(edge);
        }
        graph
    }

    /// Edges leaving the given node, in adjacency-list order.
    pub fn outgoing(&self, node: &NodeRef) -> &[ImpactEdge] {
        self.outgoing.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges arriving at the given node.
    pub fn incoming(&self, node: &NodeRef) -> &[ImpactEdge] {
        self.incoming.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The full active edge list.
    pub fn edges(&self) -> &[ImpactEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every distinct node referenced by some edge.
    pub fn node_refs(&self) -> impl Iterator<Item = &NodeRef> {
        self.outgoing
            .keys()
            .chain(self.incoming.keys().filter(|n| !self.outgoing.contains_key(*n)))
    }

    pub fn contains_node(&self, node: &NodeRef) -> bool {
        self.outgoing.contains_key(node) || self.incoming.contains_key(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImpactType;

    fn edge(id: &str, source: NodeRef, target: NodeRef, active: bool) -> ImpactEdge {
        ImpactEdge {
            id: id.into(),
            tenant_id: "t1".into(),
            source,
            target,
            impact_weight: 0.5,
            impact_type: ImpactType::Direct,
            impact_category: None,
            condition: None,
            active,
        }
    }

    #[test]
    fn buckets_edges_both_ways() {
        let r1 = NodeRef::regulation("r1");
        let d1 = NodeRef::department("d1");
        let b1 = NodeRef::budget("b1");
        let graph = DependencyGraph::from_edges(vec![
            edge("e1", r1.clone(), d1.clone(), true),
            edge("e2", d1.clone(), b1.clone(), true),
        ]);

        assert_eq!(graph.outgoing(&r1).len(), 1);
        assert_eq!(graph.outgoing(&d1).len(), 1);
        assert_eq!(graph.incoming(&d1).len(), 1);
        assert_eq!(graph.incoming(&b1).len(), 1);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains_node(&b1));
    }

    #[test]
    fn inactive_edges_are_dropped() {
        let r1 = NodeRef::regulation("r1");
        let d1 = NodeRef::department("d1");
        let graph = DependencyGraph::from_edges(vec![edge("e1", r1.clone(), d1, false)]);
        assert!(graph.is_empty());
        assert!(graph.outgoing(&r1).is_empty());
    }

    #[test]
    fn node_refs_deduplicates_shared_nodes() {
        let r1 = NodeRef::regulation("r1");
        let d1 = NodeRef::department("d1");
        let b1 = NodeRef::budget("b1");
        let graph = DependencyGraph::from_edges(vec![
            edge("e1", r1.clone(), d1.clone(), true),
            edge("e2", d1.clone(), b1.clone(), true),
        ]);
        let mut refs: Vec<String> = graph.node_refs().map(|n| n.key()).collect();
        refs.sort();
        assert_eq!(refs, vec!["BUDGET:b1", "DEPARTMENT:d1", "REGULATION:r1"]);
    }
}
