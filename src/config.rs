//! Configuration for path extraction and order selection
//!
//! Every stage validates its configuration before touching data. Defaults
//! follow common practice for multi-order model selection: a 1% significance
//! level and a maximum order of two.

use crate::error::{PathError, Result};
use crate::node::MAX_ORDER;
use serde::{Deserialize, Serialize};

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Configuration for time-respecting path extraction
///
/// # Example
/// ```
/// use pathorder::config::ExtractionConfig;
///
/// let config = ExtractionConfig::with_max_delay(5);
/// assert_eq!(config.max_delay, 5);
/// assert!(config.directed);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum time difference between consecutive interactions of a path
    ///
    /// Must be positive: with a delay of zero no two interactions can ever be
    /// chained, since interactions sharing a timestamp are never chained.
    pub max_delay: i64,

    /// Maximum number of hops chained into a single path
    ///
    /// Default: unbounded. Dense temporal networks can produce a number of
    /// time-respecting paths exponential in the path length; set a cap when
    /// only orders up to a known K are of interest.
    ///
    /// A chain that reaches the cap is recorded and not continued. The
    /// interactions that would have continued it are counted only on paths
    /// where they are reached within the cap; an interaction reachable solely
    /// beyond the cap, and not a root itself, appears on no path at all.
    pub max_path_length: usize,

    /// Treat interactions as directed
    ///
    /// When false, every record (u, v, t) also yields (v, u, t).
    pub directed: bool,

    /// Number of worker threads used for extraction (1 = inline)
    pub workers: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_delay: 1,
            max_path_length: usize::MAX,
            directed: true,
            workers: default_workers(),
        }
    }
}

impl ExtractionConfig {
    /// Default configuration with the given maximum inter-event delay
    pub fn with_max_delay(max_delay: i64) -> Self {
        Self {
            max_delay,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_delay <= 0 {
            return Err(PathError::degenerate("max_delay", self.max_delay));
        }

        if self.max_path_length == 0 {
            return Err(PathError::degenerate("max_path_length", 0));
        }

        if self.workers == 0 {
            return Err(PathError::config("workers", "must be at least 1"));
        }

        Ok(())
    }
}

/// How held-out likelihood evaluation treats a transition that a layer never
/// observed
///
/// Order selection always scores the training statistics with the
/// maximum-likelihood probabilities of each layer, so the policy never
/// changes K*. It applies to `MultiOrderModel::log_likelihood`, identically
/// to every order so that likelihoods stay comparable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum MissingTransitionPolicy {
    /// Fail with `PathError::MissingTransition`
    #[default]
    Fail,

    /// Use the probability of the next-lower order, recursively down to the
    /// order-0 marginal; fails only if the entity was never observed at all
    BackOff,

    /// Additive smoothing: (w + pseudocount) / (W + pseudocount * |entities|),
    /// counting every entity seen in training or in the scored paths
    Additive { pseudocount: f64 },
}

impl MissingTransitionPolicy {
    pub fn validate(&self) -> Result<()> {
        if let MissingTransitionPolicy::Additive { pseudocount } = self {
            if !pseudocount.is_finite() || *pseudocount <= 0.0 {
                return Err(PathError::config(
                    "pseudocount",
                    format!("must be positive and finite, got {}", pseudocount),
                ));
            }
        }
        Ok(())
    }
}

/// Configuration for likelihood-ratio order selection
///
/// # Example
/// ```
/// use pathorder::config::SelectionConfig;
///
/// let config = SelectionConfig::default();
/// assert_eq!(config.significance, 0.01);
/// assert_eq!(config.max_order, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Highest order for which a layer is built and tested
    pub max_order: usize,

    /// Significance level (alpha) of each likelihood-ratio test
    ///
    /// An additional order is accepted when its test p-value is strictly
    /// below this threshold. Must lie in (0, 1).
    pub significance: f64,

    /// Treatment of unobserved transitions when scoring other statistics
    pub missing_transitions: MissingTransitionPolicy,

    /// Number of worker threads for per-order work (1 = inline)
    pub workers: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_order: 2,
            significance: 0.01,
            missing_transitions: MissingTransitionPolicy::Fail,
            workers: default_workers(),
        }
    }
}

impl SelectionConfig {
    /// Default configuration for the given order bound and significance level
    pub fn new(max_order: usize, significance: f64) -> Self {
        Self {
            max_order,
            significance,
            ..Self::default()
        }
    }

    /// Create a strict configuration (higher orders need stronger evidence)
    pub fn strict() -> Self {
        Self {
            significance: 0.001,
            ..Self::default()
        }
    }

    /// Create a permissive configuration (higher orders accepted more readily)
    pub fn permissive() -> Self {
        Self {
            significance: 0.05,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_order == 0 {
            return Err(PathError::degenerate("max_order", 0));
        }

        if self.max_order > MAX_ORDER {
            return Err(PathError::degenerate(
                "max_order",
                format!("{} (supported up to {})", self.max_order, MAX_ORDER),
            ));
        }

        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(PathError::config(
                "significance",
                format!("must be in (0, 1), got {}", self.significance),
            ));
        }

        if self.workers == 0 {
            return Err(PathError::config("workers", "must be at least 1"));
        }

        self.missing_transitions.validate()
    }
}

/// Configuration for power iteration on a layer's transition matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationaryConfig {
    pub max_iterations: usize,
    /// L1 distance between successive iterates at which iteration stops
    pub tolerance: f64,
}

impl Default for StationaryConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-10,
        }
    }
}

impl StationaryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(PathError::degenerate("max_iterations", 0));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(PathError::config(
                "tolerance",
                format!("{} is not a positive finite number", self.tolerance),
            ));
        }
        Ok(())
    }
}

/// Estimator for entropies of observed distributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntropyEstimator {
    /// Plug-in estimate from the observed frequencies
    #[default]
    MaximumLikelihood,

    /// Plug-in estimate plus the Miller-Madow bias correction (K - 1) / 2N
    /// for K possible outcomes and N observations
    Miller,
}

impl EntropyEstimator {
    /// Bias correction in bits added to the plug-in estimate
    ///
    /// Zero without observations.
    pub fn correction(&self, outcomes: usize, observations: f64) -> f64 {
        match self {
            EntropyEstimator::MaximumLikelihood => 0.0,
            EntropyEstimator::Miller if observations > 0.0 => {
                (outcomes.saturating_sub(1)) as f64 / (2.0 * observations)
            }
            EntropyEstimator::Miller => 0.0,
        }
    }
}

/// Combined configuration for an extraction + selection run
///
/// # Example
/// ```
/// use pathorder::config::AnalysisConfig;
///
/// let config = AnalysisConfig::from_toml_str(r#"
///     [extraction]
///     max_delay = 3
///
///     [selection]
///     max_order = 3
///     significance = 0.05
/// "#).unwrap();
///
/// assert_eq!(config.extraction.max_delay, 3);
/// assert_eq!(config.selection.max_order, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub extraction: ExtractionConfig,
    pub selection: SelectionConfig,
}

impl AnalysisConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(text).map_err(|e| PathError::config("toml", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.extraction.validate()?;
        self.selection.validate()
    }
}
