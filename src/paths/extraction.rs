// Time-respecting path extraction
//
// An interaction (u, v, t) continues a path that arrived at u at time t' when
// t' < t <= t' + max_delay. Interactions sharing a timestamp are never
// chained. Every maximal chain of continuations becomes one observed path.
//
// Roots are interactions that continue nothing: no interaction (x, u, t')
// with t - max_delay <= t' < t exists. From each root a depth-first search
// enumerates every continuation. Roots are independent of each other, so
// they are partitioned across workers and the partial counts are merged by
// adding weights.

use crate::config::ExtractionConfig;
use crate::error::{PathError, Result};
use crate::node::NodeId;
use crate::parallel::map_parallel;
use crate::paths::statistics::{PathStatistics, PathStatisticsBuilder};
use crate::temporal_log::{Interaction, TemporalLog};
use fnv::FnvHashMap;
use std::borrow::Cow;
use std::sync::Arc;

/// Per-node indexes over a time-sorted interaction slice
struct EventIndex<'a> {
    events: &'a [Interaction],
    /// event indices by source node, in time order
    outgoing: Vec<Vec<usize>>,
    /// arrival times by target node, ascending
    arrivals: Vec<Vec<i64>>,
}

impl<'a> EventIndex<'a> {
    fn new(events: &'a [Interaction], node_count: usize) -> Self {
        let mut outgoing = vec![Vec::new(); node_count];
        let mut arrivals = vec![Vec::new(); node_count];
        for (i, e) in events.iter().enumerate() {
            outgoing[e.source.index()].push(i);
            arrivals[e.target.index()].push(e.time);
        }
        Self {
            events,
            outgoing,
            arrivals,
        }
    }

    /// True if no interaction arrives at the source within the delay window
    fn is_root(&self, event: usize, max_delay: i64) -> bool {
        let e = &self.events[event];
        let times = &self.arrivals[e.source.index()];
        let lo = times.partition_point(|&t| t < e.time.saturating_sub(max_delay));
        !(lo < times.len() && times[lo] < e.time)
    }

    /// Range into `outgoing[target]` of the interactions continuing `event`
    fn continuations(&self, event: usize, max_delay: i64) -> (usize, usize) {
        let e = &self.events[event];
        let out = &self.outgoing[e.target.index()];
        let limit = e.time.saturating_add(max_delay);
        let start = out.partition_point(|&i| self.events[i].time <= e.time);
        let end = out.partition_point(|&i| self.events[i].time <= limit);
        (start, end.max(start))
    }
}

/// DFS frame: the interaction that was appended and the cursor over its
/// continuations
struct Frame {
    event: usize,
    cursor: usize,
    end: usize,
}

/// Enumerate every maximal time-respecting path starting with `root`
fn walk_from_root(
    index: &EventIndex<'_>,
    root: usize,
    max_delay: i64,
    max_hops: usize,
    counts: &mut FnvHashMap<Vec<NodeId>, f64>,
) {
    let first = &index.events[root];
    let mut nodes = vec![first.source, first.target];

    let open = |event: usize, hops: usize| -> Frame {
        // a chain at the cap is not continued, so events reachable only
        // past the cap stay off every path
        let (cursor, end) = if hops >= max_hops {
            (0, 0)
        } else {
            index.continuations(event, max_delay)
        };
        Frame { event, cursor, end }
    };

    let root_frame = open(root, 1);
    if root_frame.cursor == root_frame.end {
        *counts.entry(nodes).or_insert(0.0) += 1.0;
        return;
    }
    let mut stack = vec![root_frame];

    while let Some(top) = stack.last_mut() {
        if top.cursor < top.end {
            let target = index.events[top.event].target;
            let next = index.outgoing[target.index()][top.cursor];
            top.cursor += 1;

            nodes.push(index.events[next].target);
            let frame = open(next, nodes.len() - 1);
            if frame.cursor == frame.end {
                // maximal chain
                *counts.entry(nodes.clone()).or_insert(0.0) += 1.0;
                nodes.pop();
            } else {
                stack.push(frame);
            }
        } else {
            stack.pop();
            if !stack.is_empty() {
                nodes.pop();
            }
        }
    }
}

/// Extract time-respecting paths from a temporal log
///
/// # Errors
///
/// `DegenerateConfiguration` when `max_delay <= 0` or `max_path_length == 0`.
/// An empty log yields empty statistics.
///
/// # Example
/// ```
/// use pathorder::config::ExtractionConfig;
/// use pathorder::paths::extract;
/// use pathorder::temporal_log::TemporalLog;
///
/// let log = TemporalLog::new(vec![
///     ("a", "b", 1), ("b", "c", 2),
///     ("a", "b", 10), ("b", "d", 11),
/// ]);
/// let stats = extract(&log, &ExtractionConfig::with_max_delay(2)).unwrap();
///
/// assert_eq!(stats.weight_of(&["a", "b", "c"]), 1.0);
/// assert_eq!(stats.weight_of(&["a", "b", "d"]), 1.0);
/// assert_eq!(stats.len(), 2);
/// ```
pub fn extract(log: &TemporalLog, config: &ExtractionConfig) -> Result<PathStatistics> {
    config.validate()?;

    if log.is_empty() {
        tracing::debug!("Empty temporal log, no paths extracted");
        return Ok(PathStatistics::empty());
    }

    let log: Cow<'_, TemporalLog> = if config.directed {
        Cow::Borrowed(log)
    } else {
        Cow::Owned(log.symmetrized())
    };

    let index = EventIndex::new(log.records(), log.alphabet().len());
    let roots: Vec<usize> = (0..log.len())
        .filter(|&i| index.is_root(i, config.max_delay))
        .collect();

    tracing::debug!(
        interactions = log.len(),
        roots = roots.len(),
        max_delay = config.max_delay,
        "Starting time-respecting path extraction"
    );

    let chunk_len = roots.len().div_ceil(config.workers).max(1);
    let chunks: Vec<Vec<usize>> = roots.chunks(chunk_len).map(|c| c.to_vec()).collect();

    let partials = map_parallel(chunks, config.workers, |chunk| {
        let mut counts = FnvHashMap::default();
        for root in chunk {
            walk_from_root(
                &index,
                root,
                config.max_delay,
                config.max_path_length,
                &mut counts,
            );
        }
        tracing::trace!(distinct = counts.len(), "Extraction worker finished");
        counts
    });

    let mut builder = PathStatisticsBuilder::with_alphabet(Arc::clone(log.alphabet()));
    for partial in partials {
        builder.absorb(partial);
    }
    let stats = builder.build();

    tracing::info!(
        distinct_paths = stats.len(),
        observations = stats.observation_count(),
        max_length = stats.max_path_length(),
        "Extracted time-respecting paths"
    );

    Ok(stats)
}

/// Ingest already-observed path sequences, bypassing temporal extraction
///
/// Sequences longer than `max_path_length` hops are cut to their first
/// `max_path_length + 1` nodes.
///
/// # Errors
///
/// `DegenerateConfiguration` for `max_path_length == 0`; `ConfigurationError`
/// for empty sequences or negative / non-finite weights.
///
/// # Example
/// ```
/// use pathorder::paths::from_sequences;
///
/// let stats = from_sequences(
///     vec![(vec!["home", "search", "item"], 3.0), (vec!["home", "cart"], 1.0)],
///     usize::MAX,
/// ).unwrap();
///
/// assert_eq!(stats.observation_count(), 4.0);
/// ```
pub fn from_sequences<I, P, S>(sequences: I, max_path_length: usize) -> Result<PathStatistics>
where
    I: IntoIterator<Item = (P, f64)>,
    P: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if max_path_length == 0 {
        return Err(PathError::degenerate("max_path_length", 0));
    }

    let mut builder = PathStatisticsBuilder::new();
    let mut truncated = 0usize;

    for (sequence, weight) in sequences {
        let mut labels: Vec<S> = sequence.into_iter().collect();
        if labels.len() > max_path_length.saturating_add(1) {
            labels.truncate(max_path_length + 1);
            truncated += 1;
        }
        builder.add_path(&labels, weight)?;
    }

    if truncated > 0 {
        tracing::debug!(truncated, max_path_length, "Truncated long sequences");
    }

    let stats = builder.build();
    tracing::info!(
        distinct_paths = stats.len(),
        observations = stats.observation_count(),
        "Ingested path sequences"
    );
    Ok(stats)
}
