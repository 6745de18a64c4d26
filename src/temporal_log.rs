//! Immutable store of time-stamped directed interactions
//!
//! A `TemporalLog` is the raw input of time-respecting path extraction. Records
//! are kept sorted by timestamp (stable, so records sharing a timestamp keep
//! their insertion order). Filtering produces a new log; a log is never
//! mutated after construction.

use crate::error::{PathError, Result};
use crate::node::{Alphabet, NodeId};
use serde::Serialize;
use std::sync::Arc;

/// A single directed interaction `(source, target, time)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interaction {
    pub source: NodeId,
    pub target: NodeId,
    pub time: i64,
}

/// Time-ordered log of interactions over an interned node set
///
/// # Example
/// ```
/// use pathorder::temporal_log::TemporalLog;
///
/// let log = TemporalLog::new(vec![("b", "c", 2), ("a", "b", 1)]);
///
/// assert_eq!(log.len(), 2);
/// assert_eq!(log.records()[0].time, 1);
/// assert_eq!(log.time_span(), Some((1, 2)));
/// ```
#[derive(Debug, Clone)]
pub struct TemporalLog {
    alphabet: Arc<Alphabet>,
    records: Vec<Interaction>,
}

impl TemporalLog {
    /// Build a log from `(source, target, time)` records in any order
    pub fn new<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = (S, S, i64)>,
        S: AsRef<str>,
    {
        let mut alphabet = Alphabet::new();
        let records = records
            .into_iter()
            .map(|(u, v, t)| Interaction {
                source: alphabet.intern(u.as_ref()),
                target: alphabet.intern(v.as_ref()),
                time: t,
            })
            .collect();

        Self::sorted(Arc::new(alphabet), records)
    }

    /// Build a log from already-interned records
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a record refers to an id the alphabet
    /// never handed out.
    pub fn from_interactions(alphabet: Arc<Alphabet>, records: Vec<Interaction>) -> Result<Self> {
        let bound = alphabet.len();
        if let Some(bad) = records
            .iter()
            .find(|r| r.source.index() >= bound || r.target.index() >= bound)
        {
            return Err(PathError::config(
                "records",
                format!(
                    "interaction {:?} -> {:?} at t={} uses an id outside the alphabet ({} labels)",
                    bad.source, bad.target, bad.time, bound
                ),
            ));
        }

        Ok(Self::sorted(alphabet, records))
    }

    pub fn empty() -> Self {
        Self {
            alphabet: Arc::new(Alphabet::new()),
            records: Vec::new(),
        }
    }

    fn sorted(alphabet: Arc<Alphabet>, mut records: Vec<Interaction>) -> Self {
        records.sort_by_key(|r| r.time);
        Self { alphabet, records }
    }

    pub fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    /// Records sorted by timestamp
    pub fn records(&self) -> &[Interaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct endpoints of all records, in id order
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut seen = vec![false; self.alphabet.len()];
        for r in &self.records {
            seen[r.source.index()] = true;
            seen[r.target.index()] = true;
        }
        seen.iter()
            .enumerate()
            .filter(|&(_, &s)| s)
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// First and last timestamp, or `None` for an empty log
    pub fn time_span(&self) -> Option<(i64, i64)> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    /// New log with the records whose time lies in `[start, end)`
    ///
    /// The alphabet is shared with this log, so ids stay comparable.
    pub fn filter_time_window(&self, start: i64, end: i64) -> Self {
        let lo = self.records.partition_point(|r| r.time < start);
        let hi = self.records.partition_point(|r| r.time < end).max(lo);
        Self {
            alphabet: Arc::clone(&self.alphabet),
            records: self.records[lo..hi].to_vec(),
        }
    }

    /// Records grouped by timestamp, in time order
    pub fn by_timestamp(&self) -> Vec<(i64, &[Interaction])> {
        let mut groups = Vec::new();
        let mut start = 0;
        while start < self.records.len() {
            let t = self.records[start].time;
            let len = self.records[start..]
                .iter()
                .take_while(|r| r.time == t)
                .count();
            groups.push((t, &self.records[start..start + len]));
            start += len;
        }
        groups
    }

    /// Same log with every record also present in reverse direction
    pub fn symmetrized(&self) -> Self {
        let mut records = Vec::with_capacity(self.records.len() * 2);
        for r in &self.records {
            records.push(*r);
            records.push(Interaction {
                source: r.target,
                target: r.source,
                time: r.time,
            });
        }
        Self::sorted(Arc::clone(&self.alphabet), records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TemporalLog {
        TemporalLog::new(vec![
            ("a", "b", 5),
            ("b", "c", 1),
            ("c", "a", 5),
            ("a", "c", 3),
        ])
    }

    #[test]
    fn test_records_sorted_and_stable() {
        let log = sample();
        let times: Vec<i64> = log.records().iter().map(|r| r.time).collect();
        assert_eq!(times, vec![1, 3, 5, 5]);

        // ("a","b",5) was inserted before ("c","a",5)
        let a = log.alphabet().get("a").unwrap();
        assert_eq!(log.records()[2].source, a);
    }

    #[test]
    fn test_nodes_and_span() {
        let log = sample();
        assert_eq!(log.nodes().len(), 3);
        assert_eq!(log.time_span(), Some((1, 5)));
    }

    #[test]
    fn test_empty_log() {
        let log = TemporalLog::empty();
        assert!(log.is_empty());
        assert_eq!(log.time_span(), None);
        assert!(log.nodes().is_empty());
        assert!(log.by_timestamp().is_empty());
    }

    #[test]
    fn test_filter_time_window_is_half_open() {
        let log = sample();
        let window = log.filter_time_window(3, 5);
        assert_eq!(window.len(), 1);
        assert_eq!(window.records()[0].time, 3);
        assert!(Arc::ptr_eq(window.alphabet(), log.alphabet()));

        // original untouched
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn test_filter_inverted_window_is_empty() {
        let log = sample();
        assert!(log.filter_time_window(5, 1).is_empty());
    }

    #[test]
    fn test_by_timestamp_groups() {
        let log = sample();
        let groups = log.by_timestamp();
        let shape: Vec<(i64, usize)> = groups.iter().map(|(t, g)| (*t, g.len())).collect();
        assert_eq!(shape, vec![(1, 1), (3, 1), (5, 2)]);
    }

    #[test]
    fn test_symmetrized_doubles_records() {
        let log = sample().symmetrized();
        assert_eq!(log.len(), 8);
    }

    #[test]
    fn test_from_interactions_rejects_foreign_ids() {
        let mut alphabet = Alphabet::new();
        let a = alphabet.intern("a");
        let records = vec![Interaction {
            source: a,
            target: NodeId(3),
            time: 0,
        }];
        assert!(TemporalLog::from_interactions(Arc::new(alphabet), records).is_err());
    }
}
