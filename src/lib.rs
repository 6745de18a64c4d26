//! Pathorder - Multi-order network models for path and temporal-network data
//!
//! This library extracts time-respecting paths from timestamped interaction
//! logs (or ingests path sequences directly), builds k-th order transition
//! layers from the path statistics, and selects the maximum order a
//! multi-order model needs through sequential likelihood-ratio tests.
//!
//! # Example
//!
//! ```
//! use pathorder::config::{ExtractionConfig, SelectionConfig};
//! use pathorder::paths::extract;
//! use pathorder::selection::select;
//! use pathorder::temporal_log::TemporalLog;
//!
//! let log = TemporalLog::new(vec![
//!     ("A", "B", 1), ("B", "C", 2),
//!     ("A", "B", 10), ("B", "D", 11),
//! ]);
//! let stats = extract(&log, &ExtractionConfig::with_max_delay(2)).unwrap();
//! let model = select(&stats, &SelectionConfig::default()).unwrap();
//!
//! assert_eq!(model.optimal_order(), 1);
//! println!("{}", model.summary());
//! ```

pub mod config;
pub mod error;
pub mod layer;
pub mod node;
pub mod paths;
pub mod selection;
pub mod temporal_log;

mod parallel;

pub use config::{
    AnalysisConfig, EntropyEstimator, ExtractionConfig, MissingTransitionPolicy, SelectionConfig,
    StationaryConfig,
};
pub use error::{PathError, Result};
pub use layer::{build_layer, build_layers, LayerGraph, LayerKind, TransitionSource};
pub use node::{Alphabet, HigherOrderNode, NodeId, MAX_ORDER};
pub use paths::{extract, from_sequences, PathStatistics, PathStatisticsBuilder};
pub use selection::{select, select_order, MultiOrderModel};
pub use temporal_log::{Interaction, TemporalLog};
