// Spectral views of a layer
//
// A layer with at least one transition defines a (sub)stochastic matrix over
// its nodes. Terminal nodes have empty rows; power iteration hands their mass
// back uniformly so the chain stays stochastic. Iterating the lazy chain
// (I + T) / 2 instead of T keeps periodic layers (a -> b -> a) convergent
// without changing the stationary distribution.
//
// Both path-level measures compare a layer of order k against the null model
// of the same order, so that the comparison happens in one state space:
// - entropy growth rate ratio H_k / H_k^null (below 1: memory makes walks
//   more predictable)
// - slow-down factor ln|λ2(T_k^null)| / ln|λ2(T_k)| (above 1: memory slows
//   diffusion down)

use crate::config::{EntropyEstimator, StationaryConfig};
use crate::error::{PathError, Result};
use crate::layer::builder::{build_layer, build_null_model};
use crate::layer::graph::LayerGraph;
use crate::paths::PathStatistics;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Node count above which the dense eigenvalue solve is logged as a warning
const LARGE_DENSE_SOLVE: usize = 2048;

/// Second eigenvalues this close to 0 or 1 leave the slow-down factor undefined
const DEGENERATE_EIGENVALUE: f64 = 1e-10;

impl LayerGraph {
    /// Row-stochastic transition matrix over `nodes()`
    ///
    /// Rows of terminal nodes are empty. At order 0 every transition returns
    /// to the single node, so the matrix is [[1]].
    pub fn transition_matrix(&self) -> CsrMatrix<f64> {
        let n = self.node_count();
        let mut coo = CooMatrix::new(n, n);
        for (i, source) in self.nodes().iter().enumerate() {
            for t in self.row(i) {
                if let Some(j) = self.index_of(&source.successor(t.next)) {
                    coo.push(i, j, t.probability);
                }
            }
        }
        CsrMatrix::from(&coo)
    }

    /// Stationary distribution over `nodes()` by power iteration
    ///
    /// # Errors
    ///
    /// `EmptyInput` for a layer without transitions; invalid iteration
    /// settings are rejected up front.
    pub fn stationary_distribution(&self, config: &StationaryConfig) -> Result<Vec<f64>> {
        config.validate()?;
        if self.is_empty() {
            return Err(PathError::empty(format!(
                "stationary distribution of empty order-{} layer",
                self.order()
            )));
        }

        let matrix = self.transition_matrix();
        let n = matrix.nrows();
        let terminal: Vec<bool> = matrix
            .row_iter()
            .map(|row| row.values().iter().sum::<f64>() <= 0.0)
            .collect();
        // pi^T T computed as T^T pi
        let transposed = matrix.transpose();

        let mut pi = DVector::from_element(n, 1.0 / n as f64);
        let mut converged = false;
        let mut iterations = 0;

        while iterations < config.max_iterations {
            iterations += 1;
            let dangling: f64 = (0..n).filter(|&i| terminal[i]).map(|i| pi[i]).sum();
            let stepped: DVector<f64> = &transposed * &pi;
            let spread = dangling / n as f64;

            let next = pi.map(|p| 0.5 * p) + stepped.map(|s| 0.5 * (s + spread));
            let delta = (&next - &pi).lp_norm(1);
            pi = next;

            if delta < config.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::debug!(
                order = self.order(),
                iterations,
                "Power iteration stopped before reaching tolerance"
            );
        }

        let total = pi.sum();
        Ok(pi.iter().map(|p| p / total).collect())
    }

    /// Entropy rate in bits: -Σ_i π_i Σ_j T_ij log2 T_ij
    ///
    /// Transitions are taken per entity, so at order 0 this is the entropy
    /// of the marginal node distribution.
    pub fn entropy_rate(&self, config: &StationaryConfig) -> Result<f64> {
        let pi = self.stationary_distribution(config)?;
        let rate = (0..self.node_count())
            .map(|i| {
                let h: f64 = self
                    .row(i)
                    .iter()
                    .filter(|t| t.probability > 0.0)
                    .map(|t| -t.probability * t.probability.log2())
                    .sum();
                pi[i] * h
            })
            .sum();
        Ok(rate)
    }

    /// Eigenvalue magnitudes of the transition matrix, largest first
    ///
    /// Solved densely through a real Schur decomposition; `max_iterations`
    /// bounds the QR sweeps per node.
    ///
    /// # Errors
    ///
    /// `EmptyInput` for a layer without transitions, `Numerical` when the
    /// decomposition does not converge.
    pub fn eigenvalue_magnitudes(&self, config: &StationaryConfig) -> Result<Vec<f64>> {
        config.validate()?;
        if self.is_empty() {
            return Err(PathError::empty(format!(
                "spectrum of empty order-{} layer",
                self.order()
            )));
        }

        let n = self.node_count();
        if n > LARGE_DENSE_SOLVE {
            tracing::warn!(
                order = self.order(),
                nodes = n,
                "Dense eigenvalue solve on a large layer"
            );
        }

        let dense = DMatrix::from(&self.transition_matrix());
        let schur = dense
            .try_schur(f64::EPSILON, config.max_iterations.saturating_mul(n))
            .ok_or_else(|| {
                PathError::numerical(format!(
                    "Schur decomposition of order-{} layer did not converge",
                    self.order()
                ))
            })?;

        let mut magnitudes: Vec<f64> = schur
            .complex_eigenvalues()
            .iter()
            .map(|z| z.norm())
            .collect();
        magnitudes.sort_by(|a, b| b.total_cmp(a));
        Ok(magnitudes)
    }

    /// Magnitude of the second-largest eigenvalue
    ///
    /// # Errors
    ///
    /// As `eigenvalue_magnitudes`, plus `EmptyInput` for a single-node layer.
    pub fn second_eigenvalue_magnitude(&self, config: &StationaryConfig) -> Result<f64> {
        self.eigenvalue_magnitudes(config)?
            .get(1)
            .copied()
            .ok_or_else(|| {
                PathError::empty(format!(
                    "order-{} layer has a single node and no second eigenvalue",
                    self.order()
                ))
            })
    }
}

/// Entropy rate of the order-k layer relative to the order-k null model
///
/// Values below 1 indicate that longer histories make the next step more
/// predictable than first-order dynamics do. With `EntropyEstimator::Miller`
/// the entropy rate of the observed layer gets the correction (K - 1) / 2N,
/// where K counts the walks of k + 1 entities that first-order edges allow
/// and N is the total weight of the order-k layer. The null model holds
/// first-order probabilities as given, so it is never corrected. A null
/// model with zero entropy yields 1.
///
/// # Errors
///
/// `InvalidOrder` when `order == 0`, `EmptyInput` when the statistics
/// contain no transition of length `order`.
pub fn entropy_growth_rate_ratio(
    stats: &PathStatistics,
    order: usize,
    estimator: EntropyEstimator,
    config: &StationaryConfig,
) -> Result<f64> {
    if order == 0 {
        return Err(PathError::InvalidOrder {
            requested: 0,
            available: stats.max_path_length(),
        });
    }

    let layer = build_layer(stats, order)?;
    if layer.is_empty() {
        return Err(PathError::empty(format!(
            "entropy growth rate: no path of length {order}"
        )));
    }
    let null = build_null_model(stats, order)?;

    let correction = estimator.correction(null.edge_count(), layer.total_weight());
    let hk = layer.entropy_rate(config)? + correction;
    let h_null = null.entropy_rate(config)?;

    tracing::debug!(order, hk, h_null, ?estimator, "Entropy growth rate");

    if h_null <= 0.0 {
        return Ok(1.0);
    }
    Ok(hk / h_null)
}

/// How much slower (above 1) or faster (below 1) diffusion mixes on the
/// order-k layer than on its null model
///
/// Ratio of the logarithms of the second-largest eigenvalue magnitudes,
/// null model over observed layer.
///
/// # Errors
///
/// `InvalidOrder` when `order < 2`, `EmptyInput` when the statistics contain
/// no transition of length `order`, and `Numerical` when either chain mixes
/// in one step or never mixes (a second eigenvalue of magnitude 0 or 1).
pub fn slow_down_factor(
    stats: &PathStatistics,
    order: usize,
    config: &StationaryConfig,
) -> Result<f64> {
    if order < 2 {
        return Err(PathError::InvalidOrder {
            requested: order,
            available: stats.max_path_length(),
        });
    }

    let layer = build_layer(stats, order)?;
    if layer.is_empty() {
        return Err(PathError::empty(format!(
            "slow-down factor: no path of length {order}"
        )));
    }
    let null = build_null_model(stats, order)?;

    let lambda = layer.second_eigenvalue_magnitude(config)?;
    let lambda_null = null.second_eigenvalue_magnitude(config)?;
    let degenerate = |l: f64| l < DEGENERATE_EIGENVALUE || l > 1.0 - DEGENERATE_EIGENVALUE;
    let factor = lambda_null.ln() / lambda.ln();

    tracing::debug!(order, lambda, lambda_null, factor, "Slow-down factor");

    if degenerate(lambda) || degenerate(lambda_null) || !factor.is_finite() || factor <= 0.0 {
        return Err(PathError::numerical(format!(
            "slow-down factor undefined for second eigenvalues {lambda} (order {order}) and {lambda_null} (null model)"
        )));
    }
    Ok(factor)
}
