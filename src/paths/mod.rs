// Path statistics: extraction from temporal networks and direct ingestion
//
// Observed paths are the sole input of layer construction. They come either
// from a temporal log (time-respecting paths under a maximum inter-event
// delay) or from data that is already path-structured, such as click
// streams.
//
// Scientific Foundation:
// [1] Scholtes, I. (2017). When is a network a network? Multi-order graphical
//     model selection in pathways and temporal networks. KDD'17.
// [2] Pan, R. K., & Saramäki, J. (2011). Path lengths, correlations, and
//     centrality in temporal networks. Physical Review E 84.
// [3] Scholtes, I., Wider, N., & Garas, A. (2016). Higher-order aggregate
//     networks in the analysis of temporal networks: path structures and
//     centralities. European Physical Journal B 89.

mod extraction;
mod preference;
mod statistics;

pub use extraction::{extract, from_sequences};
pub use preference::BetweennessMatrix;
pub use statistics::{ObservedPath, PathStatistics, PathStatisticsBuilder, SubpathCount};

#[cfg(test)]
mod tests;
