// Weighted multiset of observed paths
//
// A `PathStatistics` stores every distinct observed path once, together with
// the total weight of its observations. Sub-path statistics (how often a
// shorter sequence occurs inside the observed paths) are derived on demand
// rather than stored, so no weight is ever counted twice.

use crate::error::{PathError, Result};
use crate::node::{Alphabet, NodeId};
use fnv::FnvHashMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// A distinct observed path and the total weight of its observations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedPath {
    pub nodes: Vec<NodeId>,
    pub weight: f64,
}

impl ObservedPath {
    /// Number of hops (nodes - 1)
    pub fn length(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// Occurrence weights of a sequence
///
/// `as_subpath` counts occurrences strictly inside longer observed paths,
/// `as_longest` counts occurrences as an observed path of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SubpathCount {
    pub as_subpath: f64,
    pub as_longest: f64,
}

impl SubpathCount {
    pub fn total(&self) -> f64 {
        self.as_subpath + self.as_longest
    }
}

/// Immutable path statistics over an interned alphabet
///
/// Paths are kept sorted by node sequence, so every traversal (and every
/// floating-point sum over paths) happens in the same order regardless of how
/// the statistics were assembled.
///
/// # Example
/// ```
/// use pathorder::paths::PathStatisticsBuilder;
///
/// let mut builder = PathStatisticsBuilder::new();
/// builder.add_path(&["a", "b", "c"], 2.0).unwrap();
/// builder.add_path(&["a", "b", "c"], 1.0).unwrap();
/// builder.add_path(&["b", "d"], 1.0).unwrap();
/// let stats = builder.build();
///
/// assert_eq!(stats.len(), 2);
/// assert_eq!(stats.weight_of(&["a", "b", "c"]), 3.0);
/// assert_eq!(stats.observation_count(), 4.0);
/// assert_eq!(stats.max_path_length(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PathStatistics {
    alphabet: Arc<Alphabet>,
    paths: Vec<ObservedPath>,
}

impl PathStatistics {
    pub fn empty() -> Self {
        Self {
            alphabet: Arc::new(Alphabet::new()),
            paths: Vec::new(),
        }
    }

    pub(crate) fn from_map(alphabet: Arc<Alphabet>, map: FnvHashMap<Vec<NodeId>, f64>) -> Self {
        let mut paths: Vec<ObservedPath> = map
            .into_iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(nodes, weight)| ObservedPath { nodes, weight })
            .collect();
        paths.sort_by(|a, b| a.nodes.cmp(&b.nodes));
        Self { alphabet, paths }
    }

    pub fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    /// Distinct observed paths, sorted by node sequence
    pub fn paths(&self) -> &[ObservedPath] {
        &self.paths
    }

    /// Number of distinct observed paths
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Total weight of the observed path with these ids (0 if never observed)
    pub fn weight(&self, nodes: &[NodeId]) -> f64 {
        self.paths
            .binary_search_by(|p| p.nodes.as_slice().cmp(nodes))
            .map(|i| self.paths[i].weight)
            .unwrap_or(0.0)
    }

    /// Total weight of the observed path with these labels (0 if never observed)
    pub fn weight_of<S: AsRef<str>>(&self, labels: &[S]) -> f64 {
        let ids: Option<Vec<NodeId>> = labels
            .iter()
            .map(|l| self.alphabet.get(l.as_ref()))
            .collect();
        ids.map(|ids| self.weight(&ids)).unwrap_or(0.0)
    }

    /// Total weight of all observed paths
    pub fn observation_count(&self) -> f64 {
        self.paths.iter().map(|p| p.weight).sum()
    }

    /// Length (hops) of the longest observed path; 0 when empty
    pub fn max_path_length(&self) -> usize {
        self.paths.iter().map(|p| p.length()).max().unwrap_or(0)
    }

    /// Distinct entities visited by any observed path, in id order
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut seen: Vec<NodeId> = self
            .paths
            .iter()
            .flat_map(|p| p.nodes.iter().copied())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        seen.sort();
        seen
    }

    /// Observed paths with labels instead of ids
    pub fn labelled_paths(&self) -> Vec<(Vec<String>, f64)> {
        self.paths
            .iter()
            .map(|p| (self.alphabet.labels_of(&p.nodes), p.weight))
            .collect()
    }

    /// Occurrence weights of every length-k sequence
    ///
    /// Every window of k+1 consecutive nodes in an observed path of length
    /// L > k adds the path weight to `as_subpath`; an observed path of length
    /// exactly k adds its weight to `as_longest`.
    pub fn subpath_counts(&self, k: usize) -> BTreeMap<Vec<NodeId>, SubpathCount> {
        let mut counts: BTreeMap<Vec<NodeId>, SubpathCount> = BTreeMap::new();

        for path in &self.paths {
            let len = path.length();
            if len == k {
                counts.entry(path.nodes.clone()).or_default().as_longest += path.weight;
            } else if len > k {
                for window in path.nodes.windows(k + 1) {
                    counts.entry(window.to_vec()).or_default().as_subpath += path.weight;
                }
            }
        }

        counts
    }

    /// Weighted number of occurrences of each entity across all observed paths
    ///
    /// This is the total order-0 weight per entity, sorted by id.
    pub fn node_weights(&self) -> Vec<(NodeId, f64)> {
        let mut weights: BTreeMap<NodeId, f64> = BTreeMap::new();
        for path in &self.paths {
            for &node in &path.nodes {
                *weights.entry(node).or_insert(0.0) += path.weight;
            }
        }
        weights.into_iter().collect()
    }

    /// Per path length: total sub-path and longest-path weight
    pub fn path_length_distribution(&self) -> BTreeMap<usize, SubpathCount> {
        let mut dist: BTreeMap<usize, SubpathCount> = BTreeMap::new();

        for path in &self.paths {
            let len = path.length();
            dist.entry(len).or_default().as_longest += path.weight;
            for k in 0..len {
                // a path of length L contains L-k+1 windows of length k
                dist.entry(k).or_default().as_subpath += path.weight * (len - k + 1) as f64;
            }
        }

        dist
    }

    /// Number of distinct observed paths with length >= `min_length`
    pub fn unique_paths(&self, min_length: usize) -> usize {
        self.paths
            .iter()
            .filter(|p| p.length() >= min_length)
            .count()
    }

    /// Fraction of node visits on observed paths that fall on each entity
    pub fn visitation_probabilities(&self) -> Vec<(NodeId, f64)> {
        let weights = self.node_weights();
        let visits: f64 = weights.iter().map(|(_, w)| w).sum();
        if visits <= 0.0 {
            return Vec::new();
        }
        weights.into_iter().map(|(n, w)| (n, w / visits)).collect()
    }

    /// Additive union of two path statistics
    ///
    /// Weights of equal sequences are summed. When the alphabets differ, the
    /// other statistics are relabelled into an extension of this alphabet.
    pub fn merge(&self, other: &PathStatistics) -> PathStatistics {
        let mut builder = PathStatisticsBuilder::with_alphabet(Arc::clone(&self.alphabet));
        for path in &self.paths {
            builder.add_unchecked(path.nodes.clone(), path.weight);
        }

        if Arc::ptr_eq(&self.alphabet, &other.alphabet) || self.alphabet.same_as(&other.alphabet)
        {
            for path in &other.paths {
                builder.add_unchecked(path.nodes.clone(), path.weight);
            }
        } else {
            for path in &other.paths {
                let nodes = path
                    .nodes
                    .iter()
                    .map(|&id| builder.intern(other.alphabet.label(id)))
                    .collect();
                builder.add_unchecked(nodes, path.weight);
            }
        }

        builder.build()
    }

    /// Restrict observed paths to the entities in `filter`
    ///
    /// Every observed path is cut into its maximal contiguous runs of
    /// filtered entities; runs whose length lies in `[min_length, max_length]`
    /// are kept with the weight of the path they came from.
    ///
    /// # Example
    /// ```
    /// use pathorder::paths::PathStatisticsBuilder;
    ///
    /// let mut builder = PathStatisticsBuilder::new();
    /// builder.add_path(&["a", "b", "c", "d", "e", "f", "g"], 1.0).unwrap();
    /// let stats = builder.build();
    ///
    /// let filtered = stats.filter_nodes(&["a", "b", "d", "f", "g"], 0, usize::MAX);
    /// assert_eq!(filtered.weight_of(&["a", "b"]), 1.0);
    /// assert_eq!(filtered.weight_of(&["d"]), 1.0);
    /// assert_eq!(filtered.weight_of(&["f", "g"]), 1.0);
    /// ```
    pub fn filter_nodes<S: AsRef<str>>(
        &self,
        filter: &[S],
        min_length: usize,
        max_length: usize,
    ) -> PathStatistics {
        let keep: HashSet<NodeId> = filter
            .iter()
            .filter_map(|l| self.alphabet.get(l.as_ref()))
            .collect();

        let mut builder = PathStatisticsBuilder::with_alphabet(Arc::clone(&self.alphabet));
        for path in &self.paths {
            for run in contained_runs(&path.nodes, &keep) {
                let len = run.len() - 1;
                if len >= min_length && len <= max_length {
                    builder.add_unchecked(run.to_vec(), path.weight);
                }
            }
        }

        builder.build()
    }

    /// Relabel every entity through `mapping` (e.g. page -> topic)
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` naming the first entity without a mapping.
    pub fn project(&self, mapping: &HashMap<String, String>) -> Result<PathStatistics> {
        let mut builder = PathStatisticsBuilder::new();
        for path in &self.paths {
            let mut labels = Vec::with_capacity(path.nodes.len());
            for &id in &path.nodes {
                let label = self.alphabet.label(id);
                let mapped = mapping.get(label).ok_or_else(|| {
                    PathError::config("mapping", format!("no mapping for node '{}'", label))
                })?;
                labels.push(mapped.as_str());
            }
            builder.add_path(&labels, path.weight)?;
        }
        Ok(builder.build())
    }

    /// Human-readable summary of the path statistics
    pub fn summary(&self) -> String {
        let mut report = String::new();
        let dist = self.path_length_distribution();
        let sub_total: f64 = dist.values().map(|c| c.as_subpath).sum();
        let longest_total = self.observation_count();

        report.push_str("📊 PATH STATISTICS\n\n");
        report.push_str(&format!("Total path count:\t\t{}\n", longest_total));
        report.push_str(&format!(
            "[Unique / Sub paths / Total]:\t[{} / {} / {}]\n",
            self.unique_paths(0),
            sub_total,
            sub_total + longest_total
        ));
        report.push_str(&format!("Nodes:\t\t\t\t{}\n", self.nodes().len()));
        report.push_str(&format!(
            "Edges:\t\t\t\t{}\n",
            self.subpath_counts(1).len()
        ));
        report.push_str(&format!("Max. path length:\t\t{}\n", self.max_path_length()));

        let avg = if longest_total > 0.0 {
            self.paths
                .iter()
                .map(|p| p.weight * p.length() as f64)
                .sum::<f64>()
                / longest_total
        } else {
            0.0
        };
        report.push_str(&format!("Avg path length:\t\t{:.4}\n", avg));

        for (k, count) in &dist {
            report.push_str(&format!(
                "Paths of length k = {}\t\t{} [ {} / {} / {} ]\n",
                k,
                count.as_longest,
                self.paths.iter().filter(|p| p.length() == *k).count(),
                count.as_subpath,
                count.total()
            ));
        }

        report
    }
}

/// Maximal contiguous runs of `path` whose entities are all in `keep`
fn contained_runs<'a>(path: &'a [NodeId], keep: &HashSet<NodeId>) -> Vec<&'a [NodeId]> {
    path.split(|n| !keep.contains(n))
        .filter(|run| !run.is_empty())
        .collect()
}

/// Accumulates weighted paths into a `PathStatistics`
///
/// Equal sequences are aggregated by summing their weights; insertion order
/// has no effect on the result.
#[derive(Debug, Clone, Default)]
pub struct PathStatisticsBuilder {
    alphabet: Arc<Alphabet>,
    paths: FnvHashMap<Vec<NodeId>, f64>,
}

impl PathStatisticsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing alphabet so ids stay comparable with it
    pub fn with_alphabet(alphabet: Arc<Alphabet>) -> Self {
        Self {
            alphabet,
            paths: FnvHashMap::default(),
        }
    }

    pub(crate) fn intern(&mut self, label: &str) -> NodeId {
        match self.alphabet.get(label) {
            Some(id) => id,
            None => Arc::make_mut(&mut self.alphabet).intern(label),
        }
    }

    /// Add an observation of a labelled path
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for an empty path or a negative / non-finite weight.
    pub fn add_path<S: AsRef<str>>(&mut self, labels: &[S], weight: f64) -> Result<()> {
        if labels.is_empty() {
            return Err(PathError::config("path", "a path needs at least one node"));
        }
        check_weight(weight)?;

        let nodes = labels.iter().map(|l| self.intern(l.as_ref())).collect();
        self.add_unchecked(nodes, weight);
        Ok(())
    }

    /// Add an observation of a path given by ids of this builder's alphabet
    pub fn add_ids(&mut self, nodes: &[NodeId], weight: f64) -> Result<()> {
        if nodes.is_empty() {
            return Err(PathError::config("path", "a path needs at least one node"));
        }
        check_weight(weight)?;

        if let Some(bad) = nodes.iter().find(|n| n.index() >= self.alphabet.len()) {
            return Err(PathError::config(
                "path",
                format!("{:?} is not part of the alphabet", bad),
            ));
        }

        self.add_unchecked(nodes.to_vec(), weight);
        Ok(())
    }

    pub(crate) fn add_unchecked(&mut self, nodes: Vec<NodeId>, weight: f64) {
        *self.paths.entry(nodes).or_insert(0.0) += weight;
    }

    /// Fold partial counts (e.g. from an extraction worker) into this builder
    pub(crate) fn absorb(&mut self, partial: FnvHashMap<Vec<NodeId>, f64>) {
        for (nodes, weight) in partial {
            self.add_unchecked(nodes, weight);
        }
    }

    pub fn build(self) -> PathStatistics {
        PathStatistics::from_map(self.alphabet, self.paths)
    }
}

fn check_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(PathError::config(
            "weight",
            format!("path weights must be finite and non-negative, got {}", weight),
        ));
    }
    Ok(())
}
