// Betweenness preference: how much the way into an entity tells about the
// way out of it
//
// For an entity v, the paths of length two through v form a contingency
// table between predecessors s and successors d. The betweenness preference
// is the mutual information I(S; D) of that table. It is 0 when walks pass
// through v without memory and grows as the exit depends on the entry.

use crate::config::EntropyEstimator;
use crate::node::NodeId;
use crate::paths::PathStatistics;
use serde::Serialize;
use std::collections::BTreeSet;

/// Weights of the two-hop paths s -> v -> d through one entity
///
/// Rows follow `predecessors`, columns follow `successors`, both in id order.
/// Every first-order neighbour gets a row or column, including those never
/// seen on a two-hop path through v.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetweennessMatrix {
    pub predecessors: Vec<NodeId>,
    pub successors: Vec<NodeId>,
    pub counts: Vec<Vec<f64>>,
}

impl BetweennessMatrix {
    pub fn total(&self) -> f64 {
        self.counts.iter().flatten().sum()
    }
}

impl PathStatistics {
    /// Betweenness preference matrix of entity `label`
    ///
    /// `None` when the label is not part of the alphabet.
    pub fn betweenness_preference_matrix(&self, label: &str) -> Option<BetweennessMatrix> {
        let v = self.alphabet().get(label)?;

        let mut predecessors = BTreeSet::new();
        let mut successors = BTreeSet::new();
        for (edge, count) in self.subpath_counts(1) {
            if count.total() <= 0.0 {
                continue;
            }
            if edge[1] == v {
                predecessors.insert(edge[0]);
            }
            if edge[0] == v {
                successors.insert(edge[1]);
            }
        }
        let predecessors: Vec<NodeId> = predecessors.into_iter().collect();
        let successors: Vec<NodeId> = successors.into_iter().collect();

        let mut counts = vec![vec![0.0; successors.len()]; predecessors.len()];
        for (path, count) in self.subpath_counts(2) {
            if path[1] != v {
                continue;
            }
            // both searches succeed: the two hops are first-order edges
            if let (Ok(s), Ok(d)) = (
                predecessors.binary_search(&path[0]),
                successors.binary_search(&path[2]),
            ) {
                counts[s][d] += count.total();
            }
        }

        Some(BetweennessMatrix {
            predecessors,
            successors,
            counts,
        })
    }

    /// Betweenness preference of entity `label` in bits
    ///
    /// With `normalized`, the mutual information is divided by the smaller of
    /// the two marginal entropies, which bounds it by 1. The Miller estimator
    /// corrects each entropy by (K - 1) / 2N, K being the number of rows or
    /// columns and N the observations behind the distribution.
    ///
    /// Empty statistics yield `Some(0.0)`. `None` when the label is unknown or
    /// the entity lacks either a predecessor or a successor.
    pub fn betweenness_preference(
        &self,
        label: &str,
        normalized: bool,
        estimator: EntropyEstimator,
    ) -> Option<f64> {
        if self.is_empty() {
            return Some(0.0);
        }

        let matrix = self.betweenness_preference_matrix(label)?;
        if matrix.predecessors.is_empty() || matrix.successors.is_empty() {
            return None;
        }

        let total = matrix.total();
        if total <= 0.0 {
            return Some(0.0);
        }

        let marginal_s: Vec<f64> = matrix.counts.iter().map(|row| row.iter().sum()).collect();
        let marginal_d: Vec<f64> = (0..matrix.successors.len())
            .map(|d| matrix.counts.iter().map(|row| row[d]).sum())
            .collect();

        let h_s = entropy(&marginal_s, estimator);
        let h_d = entropy(&marginal_d, estimator);

        let information = match estimator {
            EntropyEstimator::MaximumLikelihood => {
                let mut information = 0.0;
                for (s, row) in matrix.counts.iter().enumerate() {
                    for (d, &count) in row.iter().enumerate() {
                        if count > 0.0 {
                            let p = count / total;
                            let independent = (marginal_s[s] / total) * (marginal_d[d] / total);
                            information += p * (p / independent).log2();
                        }
                    }
                }
                information
            }
            EntropyEstimator::Miller => {
                // H(D) - H(D|S); unobserved sources carry no weight
                let conditional: f64 = matrix
                    .counts
                    .iter()
                    .zip(marginal_s.iter().copied())
                    .filter(|(_, n_s)| *n_s > 0.0)
                    .map(|(row, n_s)| n_s / total * entropy(row, estimator))
                    .sum();
                h_d - conditional
            }
        };

        tracing::trace!(label, information, h_s, h_d, ?estimator, "Betweenness preference");

        if !normalized {
            return Some(information);
        }
        let bound = h_s.min(h_d);
        if bound <= 0.0 {
            return Some(0.0);
        }
        Some(information / bound)
    }

    /// All observed paths concatenated, each repeated by its whole number of
    /// observations
    ///
    /// `stop`, when given, is appended after every path. Paths appear in the
    /// order of `paths()`; fractional weights are truncated, so a path
    /// observed with weight below 1 does not appear.
    pub fn sequence(&self, stop: Option<&str>) -> Vec<String> {
        let mut sequence = Vec::new();
        for path in self.paths() {
            let mut segment = self.alphabet().labels_of(&path.nodes);
            if let Some(stop) = stop {
                segment.push(stop.to_string());
            }
            for _ in 0..path.weight.trunc() as usize {
                sequence.extend(segment.iter().cloned());
            }
        }
        sequence
    }
}

/// Entropy in bits of a distribution given by its (unnormalized) weights
fn entropy(weights: &[f64], estimator: EntropyEstimator) -> f64 {
    let observations: f64 = weights.iter().sum();
    if observations <= 0.0 {
        return 0.0;
    }
    let h: f64 = weights
        .iter()
        .filter(|&&w| w > 0.0)
        .map(|&w| {
            let p = w / observations;
            -p * p.log2()
        })
        .sum();
    h + estimator.correction(weights.len(), observations)
}
