// Multi-order model selection with likelihood-ratio tests
//
// Layers 0..=max_order are nested: the model of maximum order k uses the
// order-0 marginal for the first node of a path and layer min(i, k) for its
// i-th transition. Successive orders are compared with Wilks' likelihood
// ratio test, and the largest order reached by an unbroken run of rejections
// is selected.
//
// Scientific Foundation:
// [1] Scholtes, I. (2017). When is a network a network? Multi-order graphical
//     model selection in pathways and temporal networks. KDD'17.
// [2] Wilks, S. S. (1938). The large-sample distribution of the likelihood
//     ratio for testing composite hypotheses. Ann. Math. Statist. 9.

mod likelihood;
mod model;
mod selector;
mod statistics;

pub use model::{MultiOrderModel, OrderTrace, SelectionReport};
pub use selector::{select, select_order};
pub use statistics::{chi_squared_survival, LikelihoodRatioTest};
