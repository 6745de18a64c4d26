//! Error types shared by every pipeline stage
//!
//! Configuration is validated eagerly, so most of these surface before any
//! path is extracted or any layer is built. Every variant carries the value,
//! order or node that triggered it.

use thiserror::Error;

/// Errors for path extraction, layer construction and order selection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    /// A configuration value that can never admit a usable model
    /// (non-positive max delay, zero max order, order above `MAX_ORDER`)
    #[error("Degenerate configuration: {parameter} = {value}")]
    DegenerateConfiguration { parameter: &'static str, value: String },

    /// A configuration or input value outside its admissible range
    #[error("Invalid configuration for {parameter}: {reason}")]
    ConfigurationError { parameter: &'static str, reason: String },

    /// An observed transition that a layer never saw during training
    #[error("Missing transition at order {order}: [{}] -> {next}", .history.join(","))]
    MissingTransition {
        order: usize,
        history: Vec<String>,
        next: String,
    },

    /// No data to operate on
    #[error("Empty input: {context}")]
    EmptyInput { context: String },

    /// A layer or test outside the range that was built
    #[error("Order {requested} not available (built orders 0..={available})")]
    InvalidOrder { requested: usize, available: usize },

    /// A spectral quantity that is undefined for the layer at hand, or an
    /// eigenvalue computation that did not converge
    #[error("Numerical failure: {context}")]
    Numerical { context: String },

    /// Report export failed
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl PathError {
    pub(crate) fn degenerate(parameter: &'static str, value: impl ToString) -> Self {
        PathError::DegenerateConfiguration {
            parameter,
            value: value.to_string(),
        }
    }

    pub(crate) fn config(parameter: &'static str, reason: impl Into<String>) -> Self {
        PathError::ConfigurationError {
            parameter,
            reason: reason.into(),
        }
    }

    pub(crate) fn numerical(context: impl Into<String>) -> Self {
        PathError::Numerical {
            context: context.into(),
        }
    }

    pub(crate) fn empty(context: impl Into<String>) -> Self {
        PathError::EmptyInput {
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PathError>;
