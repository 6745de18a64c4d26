// Layer construction from path statistics
//
// Every window of k+1 consecutive nodes on an observed path is one k-th order
// transition: the first k nodes are the history, the last one is the entity
// moved to. With k = 0 the window is a single node and the history is empty,
// which yields the marginal node-occurrence model.
//
// The null model of order k has no memory beyond one step: its states are all
// histories of length k that first-order edges allow, and each moves on with
// the first-order probabilities of its last entity.

use crate::error::{PathError, Result};
use crate::layer::graph::LayerGraph;
use crate::node::{HigherOrderNode, NodeId, MAX_ORDER};
use crate::parallel::map_parallel;
use crate::paths::PathStatistics;
use fnv::FnvHashMap;
use std::sync::Arc;

/// Edge count above which a layer build is logged as a warning
const LARGE_LAYER_EDGES: usize = 1 << 20;

/// Build the transition layer of one order
///
/// Layer size can grow as (alphabet size)^order in the worst case.
///
/// # Errors
///
/// `DegenerateConfiguration` when `order > MAX_ORDER`.
///
/// # Example
/// ```
/// use pathorder::layer::build_layer;
/// use pathorder::paths::from_sequences;
///
/// let stats = from_sequences(
///     vec![(vec!["a", "b", "c"], 1.0), (vec!["a", "b", "d"], 1.0)],
///     usize::MAX,
/// ).unwrap();
/// let layer = build_layer(&stats, 1).unwrap();
///
/// assert_eq!(layer.node_count(), 4);
/// assert_eq!(layer.edge_count(), 3);
/// ```
pub fn build_layer(stats: &PathStatistics, order: usize) -> Result<LayerGraph> {
    if order > MAX_ORDER {
        return Err(PathError::degenerate("order", order));
    }

    let mut counts: FnvHashMap<(HigherOrderNode, NodeId), f64> = FnvHashMap::default();
    for path in stats.paths() {
        for window in path.nodes.windows(order + 1) {
            let history = HigherOrderNode::from_window(&window[..order]);
            *counts.entry((history, window[order])).or_insert(0.0) += path.weight;
        }
    }

    let layer = LayerGraph::from_counts(order, Arc::clone(stats.alphabet()), counts);

    tracing::debug!(
        order,
        nodes = layer.node_count(),
        edges = layer.edge_count(),
        "Built layer"
    );
    if layer.edge_count() > LARGE_LAYER_EDGES {
        tracing::warn!(
            order,
            edges = layer.edge_count(),
            "Large layer, consider a lower maximum order"
        );
    }

    Ok(layer)
}

/// Build the order-k null model of `stats`
///
/// Every walk of k + 1 entities along first-order edges becomes a transition
/// weighted by the first-order weight of its last step, so the lifted chain
/// reproduces first-order dynamics in the state space of order k. The null
/// model of order 1 has the transitions of the first-order layer.
///
/// # Errors
///
/// `InvalidOrder` when `order == 0`, `DegenerateConfiguration` when
/// `order > MAX_ORDER`.
pub fn build_null_model(stats: &PathStatistics, order: usize) -> Result<LayerGraph> {
    if order == 0 {
        return Err(PathError::InvalidOrder {
            requested: 0,
            available: stats.max_path_length(),
        });
    }
    if order > MAX_ORDER {
        return Err(PathError::degenerate("order", order));
    }

    let first = build_layer(stats, 1)?;
    let step = |entity: NodeId| first.successors(&HigherOrderNode::from_window(&[entity]));

    // histories: walks of `order` entities along first-order edges
    let mut walks: Vec<Vec<NodeId>> = first
        .nodes()
        .iter()
        .map(|node| node.as_slice().to_vec())
        .collect();
    for _ in 1..order {
        let mut longer = Vec::new();
        for walk in &walks {
            let Some(&last) = walk.last() else { continue };
            for t in step(last) {
                let mut extended = walk.clone();
                extended.push(t.next);
                longer.push(extended);
            }
        }
        walks = longer;
    }

    let mut counts: FnvHashMap<(HigherOrderNode, NodeId), f64> = FnvHashMap::default();
    for walk in &walks {
        let Some(&last) = walk.last() else { continue };
        let history = HigherOrderNode::from_window(walk);
        for t in step(last) {
            *counts.entry((history, t.next)).or_insert(0.0) += t.weight;
        }
    }

    let layer =
        LayerGraph::from_counts(order, Arc::clone(stats.alphabet()), counts).into_null_model();

    tracing::debug!(
        order,
        nodes = layer.node_count(),
        edges = layer.edge_count(),
        "Built null model"
    );
    if layer.edge_count() > LARGE_LAYER_EDGES {
        tracing::warn!(
            order,
            edges = layer.edge_count(),
            "Large null model, consider a lower order"
        );
    }

    Ok(layer)
}

/// Build layers 0..=max_order, one order per worker
///
/// The result is indexed by order.
pub fn build_layers(
    stats: &PathStatistics,
    max_order: usize,
    workers: usize,
) -> Result<Vec<LayerGraph>> {
    if max_order > MAX_ORDER {
        return Err(PathError::degenerate("max_order", max_order));
    }

    let orders: Vec<usize> = (0..=max_order).collect();
    let layers = map_parallel(orders, workers, |k| build_layer(stats, k))
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        max_order,
        edges = layers.iter().map(|l| l.edge_count()).sum::<usize>(),
        "Built layers"
    );
    Ok(layers)
}
