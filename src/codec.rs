//! Self-describing wire shapes for footprint data (§9, "Matrix transport").
//!
//! The original reference implementation serializes the whole footprint
//! matrix with a pickled numpy array over HTTP. That snapshot format is
//! opaque to anything outside that one process's memory layout, so every
//! Rust boundary here carries a plain, explicit shape instead: a row is a
//! vector of direct-succession counts, a matrix is a list of such rows
//! tagged with the activity id they belong to. Self-describing end-to-end —
//! no pickle, no raw pointer-shaped bytes.

use serde::{Deserialize, Serialize};

use crate::types::ActivityId;

/// One Activity Node's knowledge of who comes directly after whom, keyed by
/// the *other* activity's id. `counts[j]` is the number of times this
/// activity has been directly followed by activity `j` (§3).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FootprintRow {
    /// `counts[j]` = number of observed direct successions `self -> j`.
    pub counts: Vec<u32>,
}

impl FootprintRow {
    /// A row with `n` activities, none observed yet.
    pub fn zeroed(n: usize) -> Self {
        Self {
            counts: vec![0; n],
        }
    }

    /// Record one more observation of `self -> other`.
    pub fn observe(&mut self, other: ActivityId) {
        if other.as_usize() >= self.counts.len() {
            self.counts.resize(other.as_usize() + 1, 0);
        }
        self.counts[other.as_usize()] += 1;
    }

    /// Whether `self -> other` has ever been observed.
    pub fn follows(&self, other: ActivityId) -> bool {
        self.counts.get(other.as_usize()).copied().unwrap_or(0) > 0
    }
}

/// One Activity Node's full summary, as served by `/current_data` (§4.5, §6).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorrelationSnapshot {
    /// Id of the activity this summary belongs to.
    pub activity: u32,
    /// Its row of the footprint matrix.
    pub row: FootprintRow,
    /// Whether this activity has ever been seen as a case's first event.
    pub is_start: bool,
    /// True iff some Neighborhood on this AN has no recorded successor.
    pub is_end: bool,
    /// Monotonic version counter, bumped on every local mutation (§4.6).
    pub seq: u64,
}

/// The whole fleet's summaries as assembled by the Central Node: the merged
/// boolean footprint matrix plus start/end activity sets used for
/// alpha-relation synthesis (§4.6, §4.7).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FootprintMatrix {
    /// `rows[a]` is activity `a`'s latest-seq snapshot, or `None` if never reported.
    pub rows: Vec<Option<CorrelationSnapshot>>,
}

impl FootprintMatrix {
    /// An empty matrix sized for `n` activities.
    pub fn empty(n: usize) -> Self {
        Self {
            rows: vec![None; n],
        }
    }

    /// Merge one node's snapshot in, keeping whichever side has the higher
    /// `seq` (§4.6 — max-seq-wins, makes the merge order-independent).
    pub fn merge(&mut self, snapshot: CorrelationSnapshot) {
        let idx = snapshot.activity as usize;
        if idx >= self.rows.len() {
            self.rows.resize(idx + 1, None);
        }
        match &self.rows[idx] {
            Some(existing) if existing.seq >= snapshot.seq => {}
            _ => self.rows[idx] = Some(snapshot),
        }
    }

    /// Number of activity slots this matrix is sized for.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `a -> b` per the merged footprint: `a` has directly-follows `b`.
    pub fn directly_follows(&self, a: ActivityId, b: ActivityId) -> bool {
        self.rows
            .get(a.as_usize())
            .and_then(|r| r.as_ref())
            .map(|s| s.row.follows(b))
            .unwrap_or(false)
    }

    /// Whether activity `a` was ever observed starting a case.
    pub fn is_start(&self, a: ActivityId) -> bool {
        self.rows
            .get(a.as_usize())
            .and_then(|r| r.as_ref())
            .map(|s| s.is_start)
            .unwrap_or(false)
    }

    /// Whether activity `a` was ever observed ending a case.
    pub fn is_end(&self, a: ActivityId) -> bool {
        self.rows
            .get(a.as_usize())
            .and_then(|r| r.as_ref())
            .map(|s| s.is_end)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_resizes_on_observe() {
        let mut row = FootprintRow::zeroed(2);
        row.observe(ActivityId(5));
        row.observe(ActivityId(5));
        assert!(row.follows(ActivityId(5)));
        assert_eq!(row.counts[5], 2);
        assert!(!row.follows(ActivityId(3)));
    }

    fn snapshot(activity: u32, is_start: bool, seq: u64) -> CorrelationSnapshot {
        CorrelationSnapshot {
            activity,
            row: FootprintRow::zeroed(2),
            is_start,
            is_end: false,
            seq,
        }
    }

    #[test]
    fn merge_keeps_higher_seq() {
        let mut matrix = FootprintMatrix::empty(2);
        matrix.merge(snapshot(0, false, 3));
        matrix.merge(snapshot(0, true, 1));
        assert!(!matrix.is_start(ActivityId(0)));
    }

    #[test]
    fn merge_accepts_newer_seq() {
        let mut matrix = FootprintMatrix::empty(1);
        matrix.merge(snapshot(0, false, 1));
        matrix.merge(snapshot(0, true, 2));
        assert!(matrix.is_start(ActivityId(0)));
    }
}
