// Log-likelihood of observed paths under nested multi-order models
//
// The model with maximum order k scores a path n_0 .. n_L as
//
//   log p_0(n_0) + Σ_{i=1..L} log p_{min(i,k)}(n_i | n_0 .. n_{i-1})
//
// so the first step of every path falls back to the marginal model and
// paths shorter than k use the highest order their prefix supports.

use crate::config::MissingTransitionPolicy;
use crate::error::{PathError, Result};
use crate::layer::{LayerGraph, TransitionSource};
use crate::node::{Alphabet, NodeId};
use crate::paths::PathStatistics;
use std::collections::HashMap;
use std::sync::Arc;

/// Observed paths expressed in the model's ids
///
/// Labels unknown to the model get ids past the end of its alphabet, which
/// no layer contains.
pub(crate) struct ScoredPaths {
    paths: Vec<(Vec<NodeId>, f64)>,
    unknown: Vec<String>,
}

impl ScoredPaths {
    pub(crate) fn new(stats: &PathStatistics, alphabet: &Arc<Alphabet>) -> Self {
        if Arc::ptr_eq(stats.alphabet(), alphabet) || stats.alphabet().same_as(alphabet) {
            return Self {
                paths: stats
                    .paths()
                    .iter()
                    .map(|p| (p.nodes.clone(), p.weight))
                    .collect(),
                unknown: Vec::new(),
            };
        }

        let mut unknown: Vec<String> = Vec::new();
        let mut unknown_ids: HashMap<NodeId, NodeId> = HashMap::new();
        let source = stats.alphabet();

        let paths: Vec<(Vec<NodeId>, f64)> = stats
            .paths()
            .iter()
            .map(|p| {
                let nodes: Vec<NodeId> = p
                    .nodes
                    .iter()
                    .map(|&n| {
                        let label = source.label(n);
                        alphabet.get(label).unwrap_or_else(|| {
                            *unknown_ids.entry(n).or_insert_with(|| {
                                unknown.push(label.to_string());
                                NodeId((alphabet.len() + unknown.len() - 1) as u32)
                            })
                        })
                    })
                    .collect();
                (nodes, p.weight)
            })
            .collect();

        Self { paths, unknown }
    }
}

/// Transition probabilities of layers 0..=k under a missing-transition policy
pub(crate) struct Scorer<'a> {
    layers: &'a [LayerGraph],
    policy: MissingTransitionPolicy,
    alphabet: &'a Alphabet,
    unknown: &'a [String],
    /// Entities with non-zero marginal weight, the support of additive smoothing
    support: f64,
}

impl<'a> Scorer<'a> {
    pub(crate) fn new(
        layers: &'a [LayerGraph],
        policy: MissingTransitionPolicy,
        alphabet: &'a Alphabet,
        unknown: &'a [String],
    ) -> Self {
        let observed = layers.first().map(|l| l.edge_count()).unwrap_or(0);
        Self {
            layers,
            policy,
            alphabet,
            unknown,
            support: (observed + unknown.len()).max(1) as f64,
        }
    }

    fn label(&self, id: NodeId) -> String {
        match id.index().checked_sub(self.alphabet.len()) {
            Some(i) => self.unknown.get(i).cloned().unwrap_or_else(|| "?".into()),
            None => self.alphabet.label(id).to_string(),
        }
    }

    fn missing(&self, order: usize, history: &[NodeId], next: NodeId) -> PathError {
        let start = history.len().saturating_sub(order);
        PathError::MissingTransition {
            order,
            history: history[start..].iter().map(|&n| self.label(n)).collect(),
            next: self.label(next),
        }
    }

    /// p(next | history) under the layer of `order`
    fn probability(&self, order: usize, history: &[NodeId], next: NodeId) -> Result<f64> {
        let layer = &self.layers[order];
        match self.policy {
            MissingTransitionPolicy::Fail => layer
                .probability(history, next)
                .ok_or_else(|| self.missing(order, history, next)),
            MissingTransitionPolicy::BackOff => (0..=order)
                .rev()
                .find_map(|k| self.layers[k].probability(history, next))
                .ok_or_else(|| self.missing(0, history, next)),
            MissingTransitionPolicy::Additive { pseudocount } => {
                let (weight, total) = layer.counts(history, next);
                Ok((weight + pseudocount) / (total + pseudocount * self.support))
            }
        }
    }

    /// Log-likelihood of one path of nodes under the nested model of `order`
    fn path(&self, nodes: &[NodeId], order: usize) -> Result<f64> {
        let mut ll = 0.0;
        for i in 0..nodes.len() {
            let k = i.min(order);
            ll += self.probability(k, &nodes[..i], nodes[i])?.ln();
        }
        Ok(ll)
    }
}

/// Weighted log-likelihood of `paths` under the nested model of `order`
///
/// `layers` must contain orders 0..=order.
pub(crate) fn log_likelihood(
    paths: &ScoredPaths,
    layers: &[LayerGraph],
    order: usize,
    policy: MissingTransitionPolicy,
    alphabet: &Alphabet,
) -> Result<f64> {
    if order >= layers.len() {
        return Err(PathError::InvalidOrder {
            requested: order,
            available: layers.len().saturating_sub(1),
        });
    }

    let scorer = Scorer::new(layers, policy, alphabet, &paths.unknown);
    let mut total = 0.0;
    for (nodes, weight) in &paths.paths {
        total += weight * scorer.path(nodes, order)?;
    }
    Ok(total)
}
