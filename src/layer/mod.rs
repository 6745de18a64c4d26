// Higher-order transition layers
//
// A layer of order k is a first-order Markov chain whose states are the last
// k entities visited. Layer 0 has a single state and models entities as
// independent draws from their marginal frequencies. Each layer is built
// directly from path statistics, never from another layer.
//
// Scientific Foundation:
// [1] Scholtes, I., Wider, N., Garas, A. (2016). Higher-order aggregate
//     networks in the analysis of temporal networks. Eur. Phys. J. B 89.
// [2] Rosvall, M., et al. (2014). Memory in network flows and its effects on
//     spreading dynamics and community detection. Nature Communications 5.
// [3] Scholtes, I., et al. (2014). Causality-driven slow-down and speed-up of
//     diffusion in non-Markovian temporal networks. Nature Communications 5.

mod builder;
mod graph;
mod spectral;

pub use builder::{build_layer, build_layers, build_null_model};
pub use graph::{
    Edge, EdgeRecord, LayerGraph, LayerKind, LayerSummary, Transition, TransitionSource,
};
pub use spectral::{entropy_growth_rate_ratio, slow_down_factor};
