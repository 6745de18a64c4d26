// k-th order transition graph
//
// Adjacency is stored in compressed sparse row form: nodes are sorted, and
// the transitions leaving node i occupy transitions[row_offsets[i] ..
// row_offsets[i + 1]], sorted by the entity moved to. A transition is keyed
// by that entity rather than by the target node, because the target is fully
// determined by the source and the entity (drop the oldest step, append the
// new one). This lets order 0, whose single node loops onto itself, share the
// same representation as every other order.

use crate::node::{Alphabet, HigherOrderNode, NodeId};
use fnv::FnvHashMap;
use serde::Serialize;
use std::sync::Arc;

/// Edge semantics of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayerKind {
    /// Single state; transitions are marginal entity frequencies
    Order0Marginal,
    /// States are histories of length k
    OrderK(usize),
    /// First-order transitions lifted onto histories of length k
    NullModel(usize),
}

/// A weighted, normalized transition out of a layer node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    /// Entity moved to
    pub next: NodeId,
    /// Total observed weight
    pub weight: f64,
    /// weight / out-weight of the source node
    pub probability: f64,
}

/// A resolved edge of a layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: HigherOrderNode,
    pub target: HigherOrderNode,
    pub next: NodeId,
    pub weight: f64,
    pub probability: f64,
}

/// An edge with labels, for export to reporting collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    pub source: Vec<String>,
    pub target: Vec<String>,
    pub weight: f64,
    pub probability: f64,
}

/// Size summary of a layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub order: usize,
    pub nodes: usize,
    pub edges: usize,
    pub terminal_nodes: usize,
    pub total_weight: f64,
    pub degrees_of_freedom: usize,
}

/// Anything that assigns a probability to the next step of a walk
///
/// Likelihood evaluation only needs this interface, so it treats the order-0
/// marginal and every higher order identically.
pub trait TransitionSource {
    fn order(&self) -> usize;

    fn kind(&self) -> LayerKind {
        match self.order() {
            0 => LayerKind::Order0Marginal,
            k => LayerKind::OrderK(k),
        }
    }

    /// Probability of stepping to `next` after `history`
    ///
    /// Only the last `order()` entries of `history` are consulted. Returns
    /// `None` when the history is too short, or the transition was never
    /// observed.
    fn probability(&self, history: &[NodeId], next: NodeId) -> Option<f64>;
}

/// Directed weighted graph over the higher-order nodes of one order
#[derive(Debug, Clone)]
pub struct LayerGraph {
    order: usize,
    alphabet: Arc<Alphabet>,
    nodes: Vec<HigherOrderNode>,
    node_index: FnvHashMap<HigherOrderNode, usize>,
    row_offsets: Vec<usize>,
    transitions: Vec<Transition>,
    out_weights: Vec<f64>,
    null_model: bool,
}

impl LayerGraph {
    /// Assemble a layer from summed transition weights
    ///
    /// Normalization happens here, once per node, after every contribution
    /// has been added.
    pub(crate) fn from_counts(
        order: usize,
        alphabet: Arc<Alphabet>,
        counts: FnvHashMap<(HigherOrderNode, NodeId), f64>,
    ) -> Self {
        let mut entries: Vec<((HigherOrderNode, NodeId), f64)> =
            counts.into_iter().filter(|(_, w)| *w > 0.0).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        // node set: every source and every target
        let mut nodes: Vec<HigherOrderNode> = entries
            .iter()
            .flat_map(|((src, next), _)| [*src, src.successor(*next)])
            .collect();
        nodes.sort();
        nodes.dedup();

        let node_index: FnvHashMap<HigherOrderNode, usize> =
            nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        let mut row_offsets = vec![0usize; nodes.len() + 1];
        let mut out_weights = vec![0.0; nodes.len()];
        for ((src, _), w) in &entries {
            let i = node_index[src];
            row_offsets[i + 1] += 1;
            out_weights[i] += *w;
        }
        for i in 0..nodes.len() {
            row_offsets[i + 1] += row_offsets[i];
        }

        // entries are sorted by (source, next) and nodes by source, so rows
        // come out contiguous and in node order
        let transitions = entries
            .iter()
            .map(|((src, next), w)| Transition {
                next: *next,
                weight: *w,
                probability: *w / out_weights[node_index[src]],
            })
            .collect();

        Self {
            order,
            alphabet,
            nodes,
            node_index,
            row_offsets,
            transitions,
            out_weights,
            null_model: false,
        }
    }

    pub(crate) fn into_null_model(mut self) -> Self {
        self.null_model = true;
        self
    }

    pub(crate) fn empty(order: usize, alphabet: Arc<Alphabet>) -> Self {
        Self::from_counts(order, alphabet, FnvHashMap::default())
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    /// Nodes in ascending order
    pub fn nodes(&self) -> &[HigherOrderNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.transitions.len()
    }

    /// True for a null model built by `build_null_model`
    pub fn is_null_model(&self) -> bool {
        self.null_model
    }

    /// True when no transition was observed at this order
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn index_of(&self, node: &HigherOrderNode) -> Option<usize> {
        self.node_index.get(node).copied()
    }

    pub(crate) fn row(&self, index: usize) -> &[Transition] {
        &self.transitions[self.row_offsets[index]..self.row_offsets[index + 1]]
    }

    pub(crate) fn out_weight_at(&self, index: usize) -> f64 {
        self.out_weights[index]
    }

    /// Transitions leaving `node`, sorted by entity (empty for terminal or
    /// unknown nodes)
    pub fn successors(&self, node: &HigherOrderNode) -> &[Transition] {
        match self.index_of(node) {
            Some(i) => self.row(i),
            None => &[],
        }
    }

    pub fn out_weight(&self, node: &HigherOrderNode) -> f64 {
        self.index_of(node).map(|i| self.out_weights[i]).unwrap_or(0.0)
    }

    /// Sum of all transition weights
    pub fn total_weight(&self) -> f64 {
        self.out_weights.iter().sum()
    }

    /// Nodes without outgoing transitions
    pub fn terminal_nodes(&self) -> usize {
        (0..self.nodes.len())
            .filter(|&i| self.row_offsets[i] == self.row_offsets[i + 1])
            .count()
    }

    /// Free parameters: Σ over nodes with outgoing transitions of (out-degree - 1)
    ///
    /// For order 0 this is the number of observed entities minus one.
    pub fn degrees_of_freedom(&self) -> usize {
        (0..self.nodes.len())
            .map(|i| self.row_offsets[i + 1] - self.row_offsets[i])
            .filter(|&d| d > 0)
            .map(|d| d - 1)
            .sum()
    }

    fn transition(&self, source: &HigherOrderNode, next: NodeId) -> Option<&Transition> {
        let row = self.successors(source);
        row.binary_search_by(|t| t.next.cmp(&next))
            .ok()
            .map(|i| &row[i])
    }

    /// History node used for `history`: its last `order` entities
    pub(crate) fn history_node(&self, history: &[NodeId]) -> Option<HigherOrderNode> {
        if history.len() < self.order {
            return None;
        }
        Some(HigherOrderNode::from_window(
            &history[history.len() - self.order..],
        ))
    }

    /// (transition weight, out-weight of the history node), zeros when unseen
    pub fn counts(&self, history: &[NodeId], next: NodeId) -> (f64, f64) {
        let Some(node) = self.history_node(history) else {
            return (0.0, 0.0);
        };
        let weight = self.transition(&node, next).map(|t| t.weight).unwrap_or(0.0);
        (weight, self.out_weight(&node))
    }

    /// All edges with resolved targets, in (source, entity) order
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        (0..self.nodes.len()).flat_map(move |i| {
            let source = self.nodes[i];
            self.row(i).iter().map(move |t| Edge {
                source,
                target: source.successor(t.next),
                next: t.next,
                weight: t.weight,
                probability: t.probability,
            })
        })
    }

    /// Edges with labels instead of ids
    pub fn edge_records(&self) -> Vec<EdgeRecord> {
        self.edges()
            .map(|e| EdgeRecord {
                source: e.source.labels(&self.alphabet),
                target: if self.order == 0 {
                    vec![self.alphabet.label(e.next).to_string()]
                } else {
                    e.target.labels(&self.alphabet)
                },
                weight: e.weight,
                probability: e.probability,
            })
            .collect()
    }

    pub fn summary(&self) -> LayerSummary {
        LayerSummary {
            order: self.order,
            nodes: self.node_count(),
            edges: self.edge_count(),
            terminal_nodes: self.terminal_nodes(),
            total_weight: self.total_weight(),
            degrees_of_freedom: self.degrees_of_freedom(),
        }
    }
}

impl TransitionSource for LayerGraph {
    fn order(&self) -> usize {
        self.order
    }

    fn kind(&self) -> LayerKind {
        match (self.order, self.null_model) {
            (0, _) => LayerKind::Order0Marginal,
            (k, true) => LayerKind::NullModel(k),
            (k, false) => LayerKind::OrderK(k),
        }
    }

    fn probability(&self, history: &[NodeId], next: NodeId) -> Option<f64> {
        let node = self.history_node(history)?;
        self.transition(&node, next).map(|t| t.probability)
    }
}
