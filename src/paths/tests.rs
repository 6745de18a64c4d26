// Tests for time-respecting path extraction and sequence ingestion
//
// Scenarios are small temporal networks whose time-respecting paths can be
// enumerated by hand.

use super::*;
use crate::config::{EntropyEstimator, ExtractionConfig};
use crate::error::PathError;
use crate::node::NodeId;
use crate::temporal_log::TemporalLog;

fn config(max_delay: i64) -> ExtractionConfig {
    ExtractionConfig {
        max_delay,
        workers: 1,
        ..ExtractionConfig::default()
    }
}

fn node_weight(stats: &PathStatistics, label: &str) -> f64 {
    let id = stats.alphabet().get(label).unwrap();
    stats
        .node_weights()
        .into_iter()
        .find(|(n, _)| *n == id)
        .map(|(_, w)| w)
        .unwrap_or(0.0)
}

/// Two separate bursts through the same hub
#[test]
fn test_two_bursts_through_hub() {
    let log = TemporalLog::new(vec![
        ("A", "B", 1),
        ("B", "C", 2),
        ("A", "B", 10),
        ("B", "D", 11),
    ]);

    let stats = extract(&log, &config(2)).unwrap();

    assert_eq!(stats.len(), 2);
    assert_eq!(stats.weight_of(&["A", "B", "C"]), 1.0);
    assert_eq!(stats.weight_of(&["A", "B", "D"]), 1.0);

    // order-0 view: one weight per node appearance
    assert_eq!(node_weight(&stats, "A"), 2.0);
    assert_eq!(node_weight(&stats, "B"), 2.0);
    assert_eq!(node_weight(&stats, "C"), 1.0);
    assert_eq!(node_weight(&stats, "D"), 1.0);
}

#[test]
fn test_simultaneous_interactions_never_chained() {
    let log = TemporalLog::new(vec![("a", "b", 1), ("b", "c", 1)]);
    let stats = extract(&log, &config(5)).unwrap();

    assert_eq!(stats.weight_of(&["a", "b"]), 1.0);
    assert_eq!(stats.weight_of(&["b", "c"]), 1.0);
    assert_eq!(stats.weight_of(&["a", "b", "c"]), 0.0);
}

#[test]
fn test_delay_bound_is_inclusive() {
    let log = TemporalLog::new(vec![("a", "b", 1), ("b", "c", 3)]);

    let chained = extract(&log, &config(2)).unwrap();
    assert_eq!(chained.weight_of(&["a", "b", "c"]), 1.0);
    assert_eq!(chained.len(), 1);

    let split = extract(&log, &config(1)).unwrap();
    assert_eq!(split.weight_of(&["a", "b"]), 1.0);
    assert_eq!(split.weight_of(&["b", "c"]), 1.0);
    assert_eq!(split.len(), 2);
}

#[test]
fn test_branching_continuations() {
    let log = TemporalLog::new(vec![("a", "b", 1), ("b", "c", 2), ("b", "d", 2)]);
    let stats = extract(&log, &config(1)).unwrap();

    assert_eq!(stats.weight_of(&["a", "b", "c"]), 1.0);
    assert_eq!(stats.weight_of(&["a", "b", "d"]), 1.0);
    assert_eq!(stats.len(), 2);
}

#[test]
fn test_long_chain() {
    let log = TemporalLog::new(vec![
        ("a", "b", 1),
        ("b", "c", 2),
        ("c", "d", 3),
        ("d", "e", 4),
    ]);
    let stats = extract(&log, &config(1)).unwrap();

    assert_eq!(stats.len(), 1);
    assert_eq!(stats.weight_of(&["a", "b", "c", "d", "e"]), 1.0);
    assert_eq!(stats.max_path_length(), 4);
}

#[test]
fn test_max_path_length_caps_hops() {
    let log = TemporalLog::new(vec![("a", "b", 1), ("b", "c", 2), ("c", "d", 3)]);
    let capped = ExtractionConfig {
        max_path_length: 2,
        ..config(1)
    };
    let stats = extract(&log, &capped).unwrap();

    assert_eq!(stats.weight_of(&["a", "b", "c"]), 1.0);
    assert_eq!(stats.max_path_length(), 2);

    // (c, d, 3) continues the capped chain and is no root of its own
    assert_eq!(stats.len(), 1);
    assert_eq!(node_weight(&stats, "d"), 0.0);
}

#[test]
fn test_undirected_extraction() {
    let log = TemporalLog::new(vec![("a", "b", 1), ("b", "c", 2)]);
    let undirected = ExtractionConfig {
        directed: false,
        ..config(1)
    };
    let stats = extract(&log, &undirected).unwrap();

    assert_eq!(stats.weight_of(&["a", "b", "c"]), 1.0);
    assert_eq!(stats.weight_of(&["b", "a"]), 1.0);
    assert_eq!(stats.weight_of(&["c", "b"]), 1.0);
    assert_eq!(stats.len(), 3);
}

#[test]
fn test_repeated_paths_aggregate() {
    let log = TemporalLog::new(vec![
        ("a", "b", 1),
        ("b", "c", 2),
        ("a", "b", 20),
        ("b", "c", 21),
        ("a", "b", 40),
        ("b", "c", 41),
    ]);
    let stats = extract(&log, &config(1)).unwrap();

    assert_eq!(stats.len(), 1);
    assert_eq!(stats.weight_of(&["a", "b", "c"]), 3.0);
}

#[test]
fn test_empty_log_yields_empty_statistics() {
    let stats = extract(&TemporalLog::empty(), &config(3)).unwrap();
    assert!(stats.is_empty());
    assert_eq!(stats.observation_count(), 0.0);
}

#[test]
fn test_zero_delay_is_degenerate() {
    let log = TemporalLog::new(vec![("a", "b", 1)]);
    assert!(matches!(
        extract(&log, &config(0)),
        Err(PathError::DegenerateConfiguration { .. })
    ));
}

#[test]
fn test_zero_delay_rejected_even_for_empty_log() {
    assert!(extract(&TemporalLog::empty(), &config(0)).is_err());
}

#[test]
fn test_worker_count_does_not_change_result() {
    let mut records = Vec::new();
    let labels = ["a", "b", "c", "d", "e"];
    for t in 0..200i64 {
        let u = labels[(t * 7 % 5) as usize];
        let v = labels[(t * 3 % 5) as usize];
        records.push((u, v, t / 2));
    }
    let log = TemporalLog::new(records);

    let bounded = ExtractionConfig {
        max_path_length: 6,
        ..config(2)
    };
    let serial = extract(&log, &bounded).unwrap();
    let parallel = extract(
        &log,
        &ExtractionConfig {
            workers: 4,
            ..bounded.clone()
        },
    )
    .unwrap();

    assert!(!serial.is_empty());

    assert_eq!(serial.paths(), parallel.paths());
}

#[test]
fn test_order_zero_weight_conservation() {
    let log = TemporalLog::new(vec![
        ("a", "b", 1),
        ("b", "c", 2),
        ("b", "d", 2),
        ("d", "a", 3),
        ("c", "a", 9),
    ]);
    let stats = extract(&log, &config(1)).unwrap();

    let order_zero: f64 = stats.subpath_counts(0).values().map(|c| c.total()).sum();
    let appearances: f64 = stats
        .paths()
        .iter()
        .map(|p| p.weight * p.nodes.len() as f64)
        .sum();
    assert_eq!(order_zero, appearances);
}

#[test]
fn test_from_sequences_aggregates_and_truncates() {
    let stats = from_sequences(
        vec![
            (vec!["a", "b", "c", "d"], 1.0),
            (vec!["a", "b", "c"], 2.0),
            (vec!["x"], 1.0),
        ],
        2,
    )
    .unwrap();

    // a,b,c,d is cut to a,b,c and aggregated with the existing a,b,c
    assert_eq!(stats.weight_of(&["a", "b", "c"]), 3.0);
    assert_eq!(stats.weight_of(&["x"]), 1.0);
    assert_eq!(stats.max_path_length(), 2);
}

#[test]
fn test_from_sequences_rejects_bad_input() {
    assert!(matches!(
        from_sequences(vec![(vec!["a", "b"], -2.0)], usize::MAX),
        Err(PathError::ConfigurationError { .. })
    ));
    assert!(matches!(
        from_sequences(vec![(Vec::<&str>::new(), 1.0)], usize::MAX),
        Err(PathError::ConfigurationError { .. })
    ));
    assert!(matches!(
        from_sequences(vec![(vec!["a"], 1.0)], 0),
        Err(PathError::DegenerateConfiguration { .. })
    ));
}

/// Entries through b predict the exit: a leaves towards c, x towards y
fn crossing() -> PathStatistics {
    from_sequences(
        vec![
            (vec!["a", "b", "c"], 45.0),
            (vec!["a", "b", "y"], 5.0),
            (vec!["x", "b", "y"], 45.0),
            (vec!["x", "b", "c"], 5.0),
        ],
        usize::MAX,
    )
    .unwrap()
}

fn binary_entropy(p: f64) -> f64 {
    -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
}

#[test]
fn test_betweenness_preference_matrix() {
    let stats = crossing();
    let matrix = stats.betweenness_preference_matrix("b").unwrap();
    let ids = |labels: &[&str]| -> Vec<NodeId> {
        labels
            .iter()
            .map(|l| stats.alphabet().get(l).unwrap())
            .collect()
    };

    // interned in order of appearance: a, b, c, y, x
    assert_eq!(matrix.predecessors, ids(&["a", "x"]));
    assert_eq!(matrix.successors, ids(&["c", "y"]));
    assert_eq!(matrix.counts, vec![vec![45.0, 5.0], vec![5.0, 45.0]]);
    assert_eq!(matrix.total(), 100.0);

    assert!(stats.betweenness_preference_matrix("z").is_none());
}

#[test]
fn test_betweenness_preference_is_mutual_information() {
    let stats = crossing();
    let mle = EntropyEstimator::MaximumLikelihood;

    let expected = 1.0 - binary_entropy(0.9);
    let preference = stats.betweenness_preference("b", false, mle).unwrap();
    assert!((preference - expected).abs() < 1e-9, "{preference}");

    // both marginals are uniform over two entities
    let normalized = stats.betweenness_preference("b", true, mle).unwrap();
    assert!((normalized - expected).abs() < 1e-9, "{normalized}");
}

#[test]
fn test_betweenness_preference_with_miller_correction() {
    let stats = crossing();

    // H(D) = 1 + 1/200, H(D|S) = H(0.9) + 1/100 in each row
    let expected = 1.005 - (binary_entropy(0.9) + 0.01);
    let preference = stats
        .betweenness_preference("b", false, EntropyEstimator::Miller)
        .unwrap();
    assert!((preference - expected).abs() < 1e-9, "{preference}");

    let normalized = stats
        .betweenness_preference("b", true, EntropyEstimator::Miller)
        .unwrap();
    assert!((normalized - expected / 1.005).abs() < 1e-9, "{normalized}");
}

#[test]
fn test_betweenness_preference_edge_cases() {
    let mle = EntropyEstimator::MaximumLikelihood;
    let hub = from_sequences(
        vec![(vec!["a", "b", "c"], 1.0), (vec!["a", "b", "d"], 1.0)],
        usize::MAX,
    )
    .unwrap();

    // a single way in tells nothing about the way out
    assert_eq!(hub.betweenness_preference("b", false, mle), Some(0.0));
    assert_eq!(hub.betweenness_preference("b", true, mle), Some(0.0));

    // sources and sinks have no preference
    assert_eq!(hub.betweenness_preference("a", false, mle), None);
    assert_eq!(hub.betweenness_preference("c", false, mle), None);
    assert_eq!(hub.betweenness_preference("z", false, mle), None);

    assert_eq!(
        PathStatistics::empty().betweenness_preference("a", false, mle),
        Some(0.0)
    );
}

#[test]
fn test_sequence_repeats_paths_by_weight() {
    let stats = from_sequences(
        vec![
            (vec!["a", "b"], 2.0),
            (vec!["c", "a"], 1.5),
            (vec!["b", "c"], 0.5),
        ],
        usize::MAX,
    )
    .unwrap();

    assert_eq!(
        stats.sequence(Some("|")),
        vec!["a", "b", "|", "a", "b", "|", "c", "a", "|"]
    );
    assert_eq!(stats.sequence(None), vec!["a", "b", "a", "b", "c", "a"]);
    assert!(PathStatistics::empty().sequence(Some("|")).is_empty());
}
