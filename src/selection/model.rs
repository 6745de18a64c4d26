// Selected multi-order model and its selection trace

use crate::config::{MissingTransitionPolicy, SelectionConfig};
use crate::error::{PathError, Result};
use crate::layer::{LayerGraph, LayerSummary};
use crate::node::Alphabet;
use crate::paths::PathStatistics;
use crate::selection::likelihood::{log_likelihood, ScoredPaths};
use crate::selection::statistics::LikelihoodRatioTest;
use serde::Serialize;
use std::sync::Arc;

/// One row of the selection trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderTrace {
    pub order: usize,

    /// Log-likelihood of the training paths under the nested model of this order
    pub log_likelihood: f64,

    /// Free parameters of the nested model (cumulative over layers 0..=order)
    pub degrees_of_freedom: usize,

    pub layer: LayerSummary,

    /// Test of order - 1 against this order; `None` at order 0
    pub test: Option<LikelihoodRatioTest>,

    /// Whether `test` rejected the lower order
    pub rejected: bool,
}

/// Serializable view of a selection run for reporting collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionReport {
    pub optimal_order: usize,
    pub max_order: usize,
    pub significance: f64,
    pub missing_transitions: MissingTransitionPolicy,
    pub observations: f64,
    pub orders: Vec<OrderTrace>,
}

/// Nested family of layers 0..=K* selected by likelihood-ratio tests
///
/// Layers are kept for every order up to the requested maximum, including
/// orders above K* and orders no observed path is long enough to support
/// (those are empty).
#[derive(Debug, Clone)]
pub struct MultiOrderModel {
    optimal_order: usize,
    layers: Vec<LayerGraph>,
    alphabet: Arc<Alphabet>,
    trace: Vec<OrderTrace>,
    config: SelectionConfig,
    observations: f64,
}

impl MultiOrderModel {
    pub(crate) fn new(
        optimal_order: usize,
        layers: Vec<LayerGraph>,
        alphabet: Arc<Alphabet>,
        trace: Vec<OrderTrace>,
        config: SelectionConfig,
        observations: f64,
    ) -> Self {
        Self {
            optimal_order,
            layers,
            alphabet,
            trace,
            config,
            observations,
        }
    }

    /// Selected maximum order K*
    pub fn optimal_order(&self) -> usize {
        self.optimal_order
    }

    /// Highest order that was built and tested
    pub fn max_order(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }

    pub fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Layers 0..=K*
    pub fn selected_layers(&self) -> &[LayerGraph] {
        &self.layers[..=self.optimal_order]
    }

    /// Every layer built, 0..=max_order
    pub fn layers(&self) -> &[LayerGraph] {
        &self.layers
    }

    pub fn layer(&self, order: usize) -> Result<&LayerGraph> {
        self.layers.get(order).ok_or(PathError::InvalidOrder {
            requested: order,
            available: self.max_order(),
        })
    }

    pub fn trace(&self) -> &[OrderTrace] {
        &self.trace
    }

    fn trace_at(&self, order: usize) -> Result<&OrderTrace> {
        self.trace.get(order).ok_or(PathError::InvalidOrder {
            requested: order,
            available: self.max_order(),
        })
    }

    /// Free parameters of the nested model with maximum order `order`
    pub fn degrees_of_freedom(&self, order: usize) -> Result<usize> {
        Ok(self.trace_at(order)?.degrees_of_freedom)
    }

    /// Log-likelihood of the training paths at `order`
    pub fn training_log_likelihood(&self, order: usize) -> Result<f64> {
        Ok(self.trace_at(order)?.log_likelihood)
    }

    /// Log-likelihood of arbitrary path statistics under the nested model of
    /// `order`, using the configured missing-transition policy
    ///
    /// Statistics with a different alphabet are matched by label.
    pub fn log_likelihood(&self, stats: &PathStatistics, order: usize) -> Result<f64> {
        let paths = ScoredPaths::new(stats, &self.alphabet);
        log_likelihood(
            &paths,
            &self.layers,
            order,
            self.config.missing_transitions,
            &self.alphabet,
        )
    }

    /// Likelihood-ratio test of any nested pair of built orders
    pub fn likelihood_ratio_test(
        &self,
        null_order: usize,
        alt_order: usize,
    ) -> Result<LikelihoodRatioTest> {
        if null_order >= alt_order {
            return Err(PathError::config(
                "null_order",
                format!("must be below alternative order {alt_order}, got {null_order}"),
            ));
        }
        let null = self.trace_at(null_order)?;
        let alt = self.trace_at(alt_order)?;

        Ok(LikelihoodRatioTest::new(
            null_order,
            alt_order,
            null.log_likelihood,
            alt.log_likelihood,
            alt.degrees_of_freedom - null.degrees_of_freedom,
        ))
    }

    pub fn report(&self) -> SelectionReport {
        SelectionReport {
            optimal_order: self.optimal_order,
            max_order: self.max_order(),
            significance: self.config.significance,
            missing_transitions: self.config.missing_transitions,
            observations: self.observations,
            orders: self.trace.clone(),
        }
    }

    /// Pretty-printed JSON of `report()`
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.report())
            .map_err(|e| PathError::Serialization(e.to_string()))
    }

    /// Human-readable summary of the selection
    pub fn summary(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "🧭 MULTI-ORDER MODEL: optimal order K* = {}\n\n",
            self.optimal_order
        ));
        report.push_str(&format!("Observed paths (weight): {}\n", self.observations));
        report.push_str(&format!(
            "Significance level: {} ({}% confidence)\n",
            self.config.significance,
            (1.0 - self.config.significance) * 100.0
        ));
        report.push_str(&format!("Orders tested: 0..={}\n", self.max_order()));

        report.push_str("\n📊 Layers:\n");
        for row in &self.trace {
            report.push_str(&format!(
                "  order {}: {} nodes, {} edges, LL={:.4}, dof={}\n",
                row.order,
                row.layer.nodes,
                row.layer.edges,
                row.log_likelihood,
                row.degrees_of_freedom
            ));
        }

        let tests: Vec<_> = self
            .trace
            .iter()
            .filter_map(|row| row.test.map(|t| (t, row.rejected)))
            .collect();
        if !tests.is_empty() {
            report.push_str("\n🔬 Likelihood-ratio tests:\n");
            for (test, rejected) in tests {
                report.push_str(&format!(
                    "  {} vs {}: x={:.4}, dof={}, p={:.4} {}\n",
                    test.null_order,
                    test.alt_order,
                    test.statistic,
                    test.degrees_of_freedom,
                    test.p_value,
                    if rejected { "✅ rejected" } else { "❌ not rejected" }
                ));
            }
        }

        report
    }
}
