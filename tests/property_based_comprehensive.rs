//! Property-based tests for path statistics, layers and order selection
//!
//! Designed to run quickly as a pre-commit quality gate. Path weights are
//! small integers so that weight sums are exact regardless of summation
//! order.
//!
//! Properties tested:
//! 1. Weight conservation of order-0 statistics
//! 2. Probability normalization of every layer node
//! 3. Monotonic training log-likelihood in the order, under every policy
//! 4. Determinism of extraction and selection across worker counts
//! 5. Commutativity of statistics merge

use pathorder::config::{ExtractionConfig, MissingTransitionPolicy, SelectionConfig};
use pathorder::layer::build_layer;
use pathorder::paths::{extract, from_sequences};
use pathorder::selection::select;
use pathorder::temporal_log::TemporalLog;
use pathorder::PathStatistics;
use proptest::prelude::*;

const LABELS: [&str; 5] = ["a", "b", "c", "d", "e"];

fn sequences() -> impl Strategy<Value = Vec<(Vec<usize>, u32)>> {
    prop::collection::vec((prop::collection::vec(0usize..LABELS.len(), 1..7), 1u32..6), 1..25)
}

fn to_stats(raw: &[(Vec<usize>, u32)]) -> PathStatistics {
    from_sequences(
        raw.iter().map(|(nodes, weight)| {
            (
                nodes.iter().map(|&n| LABELS[n]).collect::<Vec<_>>(),
                f64::from(*weight),
            )
        }),
        usize::MAX,
    )
    .unwrap()
}

fn policies() -> impl Strategy<Value = MissingTransitionPolicy> {
    prop_oneof![
        Just(MissingTransitionPolicy::Fail),
        Just(MissingTransitionPolicy::BackOff),
        (0.1f64..5.0).prop_map(|pseudocount| MissingTransitionPolicy::Additive { pseudocount }),
    ]
}

fn sorted_labelled(stats: &PathStatistics) -> Vec<(Vec<String>, f64)> {
    let mut paths = stats.labelled_paths();
    paths.sort_by(|a, b| a.0.cmp(&b.0));
    paths
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_order_zero_weight_conservation(raw in sequences()) {
        // Property: every node appearance contributes its path weight once
        let stats = to_stats(&raw);
        let order_zero: f64 = stats.subpath_counts(0).values().map(|c| c.total()).sum();
        let expected: f64 = raw
            .iter()
            .map(|(nodes, w)| f64::from(*w) * nodes.len() as f64)
            .sum();
        prop_assert_eq!(order_zero, expected);
        prop_assert_eq!(stats.observation_count(), raw.iter().map(|(_, w)| f64::from(*w)).sum::<f64>());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_layer_probabilities_normalized(raw in sequences(), order in 0usize..4) {
        let stats = to_stats(&raw);
        let layer = build_layer(&stats, order).unwrap();

        for node in layer.nodes() {
            let row = layer.successors(node);
            if row.is_empty() {
                continue;
            }
            let sum: f64 = row.iter().map(|t| t.probability).sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "node {:?} sums to {}", node, sum);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_log_likelihood_monotonic(raw in sequences(), policy in policies()) {
        // Property: the held-out policy never breaks nesting on training data
        let stats = to_stats(&raw);
        let config = SelectionConfig {
            workers: 1,
            missing_transitions: policy,
            ..SelectionConfig::new(3, 0.01)
        };
        let model = select(&stats, &config).unwrap();

        for k in 0..3 {
            let lower = model.training_log_likelihood(k).unwrap();
            let higher = model.training_log_likelihood(k + 1).unwrap();
            prop_assert!(higher >= lower - 1e-9 * lower.abs().max(1.0));
        }
        for row in &model.trace()[1..] {
            let test = row.test.unwrap();
            prop_assert!(test.statistic >= -1e-9 * row.log_likelihood.abs().max(1.0));
            prop_assert!((0.0..=1.0).contains(&test.p_value));
        }
        prop_assert!(model.optimal_order() <= 3);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_selection_deterministic_across_workers(raw in sequences()) {
        let stats = to_stats(&raw);
        let serial = select(&stats, &SelectionConfig { workers: 1, ..SelectionConfig::new(3, 0.05) }).unwrap();
        let parallel = select(&stats, &SelectionConfig { workers: 3, ..SelectionConfig::new(3, 0.05) }).unwrap();

        prop_assert_eq!(serial.optimal_order(), parallel.optimal_order());
        prop_assert_eq!(serial.trace(), parallel.trace());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_extraction_deterministic_across_workers(
        events in prop::collection::vec((0usize..4, 0usize..4, 0i64..20), 0..30),
        max_delay in 1i64..4,
    ) {
        let log = TemporalLog::new(
            events.iter().map(|&(u, v, t)| (LABELS[u], LABELS[v], t)),
        );
        let config = ExtractionConfig {
            max_delay,
            max_path_length: 8,
            workers: 1,
            ..ExtractionConfig::default()
        };

        let serial = extract(&log, &config).unwrap();
        let parallel = extract(&log, &ExtractionConfig { workers: 4, ..config.clone() }).unwrap();
        prop_assert_eq!(serial.paths(), parallel.paths());

        // every interaction lies on at least one observed path
        let hops: f64 = serial.paths().iter().map(|p| p.weight * p.length() as f64).sum();
        prop_assert!(hops >= events.len() as f64 || serial.max_path_length() == 8);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_merge_commutative(left in sequences(), right in sequences()) {
        let a = to_stats(&left);
        let b = to_stats(&right);

        let ab = a.merge(&b);
        let ba = b.merge(&a);
        prop_assert_eq!(sorted_labelled(&ab), sorted_labelled(&ba));
        prop_assert_eq!(ab.observation_count(), a.observation_count() + b.observation_count());
    }
}
