//! Attack graph construction.
//!
//! Nodes are keyed by threat id and carry their display label as payload,
//! so two threats that happen to format identically stay distinct nodes.
//! The label-keyed edge list of the old drawing is still available through
//! [`AttackGraph::label_edges`], where such threats collapse into one.

use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashMap, HashSet};

use crate::aggregator::{AggregatedBranch, Aggregator, RootAggregate};
use crate::errors::{AttackTreeError, AttackTreeResult};
use crate::formatter::LabelFormatter;
use crate::models::{ThreatId, ThreatNode};

/// Position of a threat in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Root,
    Branch,
    Leaf,
}

/// A threat as drawn on the attack tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatVertex {
    pub id: ThreatId,
    pub label: String,
    pub role: NodeRole,
}

#[derive(Debug, Clone, Default)]
pub struct AttackGraph {
    /// The underlying petgraph structure
    pub graph: UnGraph<ThreatVertex, ()>,
    /// Mapping from threat id to node index
    pub id_to_node: HashMap<ThreatId, NodeIndex>,
}

impl AttackGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a threat. Ids are unique within a graph.
    pub fn add_threat(
        &mut self,
        id: ThreatId,
        label: String,
        role: NodeRole,
    ) -> AttackTreeResult<NodeIndex> {
        if self.id_to_node.contains_key(&id) {
            return Err(AttackTreeError::InvariantViolation(format!(
                "threat id {} is used more than once",
                id
            )));
        }
        let idx = self.graph.add_node(ThreatVertex { id, label, role });
        self.id_to_node.insert(id, idx);
        Ok(idx)
    }

    /// Connect a parent threat to one of its children.
    pub fn add_edge(&mut self, parent: ThreatId, child: ThreatId) -> AttackTreeResult<()> {
        let parent_idx = self.index_of(parent)?;
        let child_idx = self.index_of(child)?;
        self.graph.add_edge(parent_idx, child_idx, ());
        Ok(())
    }

    pub fn index_of(&self, id: ThreatId) -> AttackTreeResult<NodeIndex> {
        self.id_to_node
            .get(&id)
            .copied()
            .ok_or_else(|| AttackTreeError::Render(format!("threat {} is not in the graph", id)))
    }

    pub fn vertex(&self, id: ThreatId) -> Option<&ThreatVertex> {
        self.id_to_node.get(&id).map(|&idx| &self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Parent/child id pairs, in insertion order.
    pub fn edges(&self) -> Vec<(ThreatId, ThreatId)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].id, self.graph[b].id))
            .collect()
    }

    /// Edge list keyed by label text.
    ///
    /// Threats with identical labels become the same endpoint, and repeated
    /// undirected pairs are reported once.
    pub fn label_edges(&self) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for (a, b) in self.graph.edge_indices().filter_map(|e| self.graph.edge_endpoints(e)) {
            let u = self.graph[a].label.clone();
            let v = self.graph[b].label.clone();
            let key = if u <= v { (u.clone(), v.clone()) } else { (v.clone(), u.clone()) };
            if seen.insert(key) {
                edges.push((u, v));
            }
        }
        edges
    }

    /// Number of distinct labels, i.e. the node count of a label-keyed graph.
    pub fn distinct_label_count(&self) -> usize {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].label.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Turns an aggregated threat tree into an [`AttackGraph`].
pub struct GraphBuilder<'a> {
    aggregator: &'a Aggregator,
    formatter: &'a LabelFormatter,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(aggregator: &'a Aggregator, formatter: &'a LabelFormatter) -> Self {
        Self {
            aggregator,
            formatter,
        }
    }

    /// Label of the root node.
    pub fn root_label(&self, root: &ThreatNode, aggregate: &RootAggregate) -> String {
        self.formatter.format(
            &root.name,
            aggregate.total_monetary_amount,
            aggregate.overall_probability,
        )
    }

    /// One edge from the root to every immediate child and one edge from
    /// every child to each of its leaves. `branches` must be the aggregation
    /// of `root.children()`, in the same order.
    pub fn build(
        &self,
        root: &ThreatNode,
        aggregate: &RootAggregate,
        branches: &[AggregatedBranch],
    ) -> AttackTreeResult<AttackGraph> {
        let children = root.children();
        if children.len() != branches.len() {
            return Err(AttackTreeError::Render(format!(
                "{} aggregates supplied for {} threats",
                branches.len(),
                children.len()
            )));
        }

        let mut graph = AttackGraph::new();
        graph.add_threat(root.id, self.root_label(root, aggregate), NodeRole::Root)?;

        for (child, branch) in children.iter().zip(branches) {
            let label = self
                .formatter
                .format(&child.name, branch.monetary_total, branch.probability);
            graph.add_threat(child.id, label, NodeRole::Branch)?;
            graph.add_edge(root.id, child.id)?;

            for leaf in child.children() {
                if leaf.is_branch() {
                    return Err(AttackTreeError::UnsupportedDepth { id: leaf.id });
                }
                let (amount, probability) = leaf.leaf_data()?;
                let label = self.formatter.format(
                    &leaf.name,
                    amount,
                    self.aggregator.round_probability(probability),
                );
                graph.add_threat(leaf.id, label, NodeRole::Leaf)?;
                graph.add_edge(child.id, leaf.id)?;
            }
        }

        log::debug!(
            "Attack graph built: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}
