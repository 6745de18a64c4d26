// Order selection by sequential likelihood-ratio tests
//
// Orders are tested pairwise, (0, 1), (1, 2), ...; the scan stops at the
// first test that fails to reject the lower order, so a non-significant
// (k, k+1) pins K* = k whatever later tests say.
//
// Training likelihoods use the maximum-likelihood transition probabilities of
// each layer. Every transition of the training paths is observed in its
// layer, and smoothing them would let LL(k + 1) fall below LL(k).

use crate::config::{MissingTransitionPolicy, SelectionConfig};
use crate::error::Result;
use crate::layer::build_layers;
use crate::parallel::map_parallel;
use crate::paths::PathStatistics;
use crate::selection::likelihood::{log_likelihood, ScoredPaths};
use crate::selection::model::{MultiOrderModel, OrderTrace};
use crate::selection::statistics::LikelihoodRatioTest;
use std::sync::Arc;

/// Select the maximum order of a multi-order model for `stats`
///
/// # Errors
///
/// Invalid configurations fail before any layer is built. Empty statistics
/// are not an error: they yield K* = 0 with every layer empty.
///
/// # Example
/// ```
/// use pathorder::config::SelectionConfig;
/// use pathorder::paths::from_sequences;
/// use pathorder::selection::select;
///
/// // the branch taken after b mostly depends on where the path came from
/// let stats = from_sequences(
///     vec![
///         (vec!["a", "b", "c"], 45.0),
///         (vec!["a", "b", "y"], 5.0),
///         (vec!["x", "b", "y"], 45.0),
///         (vec!["x", "b", "c"], 5.0),
///     ],
///     usize::MAX,
/// ).unwrap();
/// let model = select(&stats, &SelectionConfig::default()).unwrap();
///
/// assert_eq!(model.optimal_order(), 2);
/// ```
pub fn select(stats: &PathStatistics, config: &SelectionConfig) -> Result<MultiOrderModel> {
    config.validate()?;

    let longest = stats.max_path_length();
    if config.max_order > longest {
        tracing::warn!(
            max_order = config.max_order,
            longest_path = longest,
            "Maximum order exceeds the longest observed path, higher layers will be empty"
        );
    }

    let layers = build_layers(stats, config.max_order, config.workers)?;
    let alphabet = Arc::clone(stats.alphabet());
    let paths = ScoredPaths::new(stats, &alphabet);
    let orders: Vec<usize> = (0..=config.max_order).collect();
    let log_likelihoods = map_parallel(orders, config.workers, |k| {
        log_likelihood(&paths, &layers, k, MissingTransitionPolicy::Fail, &alphabet)
    })
    .into_iter()
    .collect::<Result<Vec<f64>>>()?;

    let mut trace: Vec<OrderTrace> = Vec::with_capacity(layers.len());
    let mut cumulative_dof = 0;
    for (k, layer) in layers.iter().enumerate() {
        let layer_dof = layer.degrees_of_freedom();
        cumulative_dof += layer_dof;

        let test = (k > 0).then(|| {
            LikelihoodRatioTest::new(
                k - 1,
                k,
                log_likelihoods[k - 1],
                log_likelihoods[k],
                layer_dof,
            )
        });
        let rejected = test.is_some_and(|t| t.rejects(config.significance));

        tracing::debug!(
            order = k,
            nodes = layer.node_count(),
            edges = layer.edge_count(),
            log_likelihood = log_likelihoods[k],
            dof = cumulative_dof,
            p_value = test.map(|t| t.p_value),
            "Evaluated order"
        );

        trace.push(OrderTrace {
            order: k,
            log_likelihood: log_likelihoods[k],
            degrees_of_freedom: cumulative_dof,
            layer: layer.summary(),
            test,
            rejected,
        });
    }

    let optimal_order = trace
        .iter()
        .skip(1)
        .take_while(|row| row.rejected)
        .count();

    tracing::info!(
        optimal_order,
        max_order = config.max_order,
        significance = config.significance,
        "Selected multi-order model"
    );

    Ok(MultiOrderModel::new(
        optimal_order,
        layers,
        alphabet,
        trace,
        config.clone(),
        stats.observation_count(),
    ))
}

/// `select` with the default configuration for the given bounds
pub fn select_order(
    stats: &PathStatistics,
    max_order: usize,
    significance: f64,
) -> Result<MultiOrderModel> {
    select(stats, &SelectionConfig::new(max_order, significance))
}
