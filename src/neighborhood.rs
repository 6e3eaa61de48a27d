//! Per-case neighborhood store owned by one Activity Node (§3, §4.1, §4.3, §4.4).
//!
//! A Neighborhood is the local half of one happens-before edge: the event it
//! was created for, the predecessor it was told about at creation, and the
//! successor it learns about later via `/get_chosen`. Predecessor and
//! successor fields are each set at most once — enforced here rather than
//! trusted to callers.

use std::collections::HashMap;

use crate::error::AlphaError;
use crate::types::{ActivityId, CaseId, Timestamp};

/// One observed event and what this node currently knows about its
/// immediate neighbors in the happens-before order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighborhood {
    /// The event this Neighborhood was created for. Immutable.
    pub event_timestamp: Timestamp,
    /// Predecessor activity, if known at creation time.
    pub pred_activity: Option<ActivityId>,
    /// Predecessor's own event timestamp, if known.
    pub pred_timestamp: Option<Timestamp>,
    /// Successor activity, set the first time a peer reports this event as
    /// its predecessor. Never overwritten once set.
    pub succ_activity: Option<ActivityId>,
    /// Successor's event timestamp, mirrors `succ_activity`.
    pub succ_timestamp: Option<Timestamp>,
}

impl Neighborhood {
    /// A fresh Neighborhood with no predecessor known yet (case start).
    pub fn start(event_timestamp: Timestamp) -> Self {
        Self {
            event_timestamp,
            pred_activity: None,
            pred_timestamp: None,
            succ_activity: None,
            succ_timestamp: None,
        }
    }

    /// A fresh Neighborhood created with a known predecessor.
    pub fn with_predecessor(
        event_timestamp: Timestamp,
        pred_activity: ActivityId,
        pred_timestamp: Timestamp,
    ) -> Self {
        Self {
            event_timestamp,
            pred_activity: Some(pred_activity),
            pred_timestamp: Some(pred_timestamp),
            succ_activity: None,
            succ_timestamp: None,
        }
    }

    /// Set the successor fields. Fails if they are already set (§4.4 step 2).
    pub fn set_successor(
        &mut self,
        activity: ActivityId,
        timestamp: Timestamp,
    ) -> Result<(), ()> {
        if self.succ_activity.is_some() {
            return Err(());
        }
        self.succ_activity = Some(activity);
        self.succ_timestamp = Some(timestamp);
        Ok(())
    }

    /// True iff this event has no recorded successor yet.
    pub fn is_open_end(&self) -> bool {
        self.succ_activity.is_none()
    }
}

/// A candidate predecessor returned by `/case_event_data` (§4.3). The caller
/// (the AN serving the request) stamps its own id onto the candidate; this
/// store only knows timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredecessorCandidate {
    /// Event timestamp of the candidate Neighborhood — what the requester
    /// will cite back in `/get_chosen` as `chosen_timestamp`.
    pub timestamp: Timestamp,
}

/// Per-case, ordered-by-timestamp Neighborhood lists, owned by one AN.
#[derive(Debug, Default)]
pub struct NeighborhoodStore {
    cases: HashMap<CaseId, Vec<Neighborhood>>,
}

impl NeighborhoodStore {
    /// A fresh, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new Neighborhood for `case_id`. The per-case list is kept
    /// sorted by `event_timestamp` ascending; the driver is expected to
    /// deliver events for a case in order (§5), so this is normally a
    /// push, but out-of-order insertion is still handled correctly.
    ///
    /// Fails with `DuplicateTimestamp` if this case already has a
    /// Neighborhood at the exact same timestamp (§9, duplicate-timestamp
    /// handling is the driver's job; the AN enforces the invariant).
    pub fn insert(&mut self, case_id: &CaseId, n: Neighborhood) -> Result<(), AlphaError> {
        let list = self.cases.entry(case_id.clone()).or_default();
        let pos = list.partition_point(|existing| existing.event_timestamp < n.event_timestamp);
        if let Some(existing) = list.get(pos) {
            if existing.event_timestamp == n.event_timestamp {
                return Err(AlphaError::DuplicateTimestamp {
                    case_id: case_id.clone(),
                    timestamp: n.event_timestamp.to_rfc3339(),
                });
            }
        }
        list.insert(pos, n);
        Ok(())
    }

    /// §4.3: scan `case_id`'s Neighborhoods in reverse (latest first) for a
    /// valid predecessor candidate for an event at `req_timestamp`.
    pub fn find_predecessor(
        &self,
        case_id: &CaseId,
        req_timestamp: Timestamp,
    ) -> Option<PredecessorCandidate> {
        let list = self.cases.get(case_id)?;
        for n in list.iter().rev() {
            if n.event_timestamp > req_timestamp {
                continue;
            }
            let valid = match n.succ_timestamp {
                Some(succ_ts) => n.event_timestamp < req_timestamp && req_timestamp < succ_ts,
                None => n.event_timestamp < req_timestamp,
            };
            if valid {
                return Some(PredecessorCandidate {
                    timestamp: n.event_timestamp,
                });
            }
        }
        None
    }

    /// §4.4: locate the Neighborhood at `chosen_timestamp` for `case_id` and
    /// set its successor fields. Returns `Ok(())` on success, `Err` if no
    /// such Neighborhood exists or its successor was already set.
    pub fn set_successor(
        &mut self,
        case_id: &CaseId,
        chosen_timestamp: Timestamp,
        requester: ActivityId,
        req_timestamp: Timestamp,
    ) -> Result<(), AlphaError> {
        let list = self
            .cases
            .get_mut(case_id)
            .ok_or_else(|| AlphaError::MalformedRequest(format!("unknown case {case_id}")))?;
        let n = list
            .iter_mut()
            .find(|n| n.event_timestamp == chosen_timestamp)
            .ok_or_else(|| {
                AlphaError::MalformedRequest(format!(
                    "no neighborhood at {chosen_timestamp} for case {case_id}"
                ))
            })?;
        n.set_successor(requester, req_timestamp)
            .map_err(|_| AlphaError::DoubleAssignment {
                case_id: case_id.clone(),
                timestamp: chosen_timestamp.to_rfc3339(),
            })
    }

    /// True iff any case has a Neighborhood with no recorded successor —
    /// this activity has been observed as a case's last event (§4.5).
    pub fn has_open_end(&self) -> bool {
        self.cases
            .values()
            .any(|list| list.iter().any(Neighborhood::is_open_end))
    }

    /// Whether `case_id` has any Neighborhoods recorded yet.
    pub fn knows_case(&self, case_id: &CaseId) -> bool {
        self.cases.contains_key(case_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_timestamp;

    fn ts(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn predecessor_scan_finds_latest_open_neighborhood() {
        let mut store = NeighborhoodStore::new();
        let case = "c1".to_string();
        store
            .insert(&case, Neighborhood::start(ts("2024-01-01T00:00:01Z")))
            .unwrap();
        store
            .insert(&case, Neighborhood::start(ts("2024-01-01T00:00:02Z")))
            .unwrap();

        let candidate = store
            .find_predecessor(&case, ts("2024-01-01T00:00:03Z"))
            .unwrap();
        assert_eq!(candidate.timestamp, ts("2024-01-01T00:00:02Z"));
    }

    #[test]
    fn successor_cannot_be_set_twice() {
        let mut store = NeighborhoodStore::new();
        let case = "c1".to_string();
        let t1 = ts("2024-01-01T00:00:01Z");
        store.insert(&case, Neighborhood::start(t1)).unwrap();

        store
            .set_successor(&case, t1, ActivityId(1), ts("2024-01-01T00:00:02Z"))
            .unwrap();
        let err = store
            .set_successor(&case, t1, ActivityId(2), ts("2024-01-01T00:00:03Z"))
            .unwrap_err();
        assert!(matches!(err, AlphaError::DoubleAssignment { .. }));
    }

    #[test]
    fn duplicate_timestamp_rejected() {
        let mut store = NeighborhoodStore::new();
        let case = "c1".to_string();
        let t1 = ts("2024-01-01T00:00:01Z");
        store.insert(&case, Neighborhood::start(t1)).unwrap();
        let err = store.insert(&case, Neighborhood::start(t1)).unwrap_err();
        assert!(matches!(err, AlphaError::DuplicateTimestamp { .. }));
    }

    #[test]
    fn open_end_detected() {
        let mut store = NeighborhoodStore::new();
        let case = "c1".to_string();
        let t1 = ts("2024-01-01T00:00:01Z");
        store.insert(&case, Neighborhood::start(t1)).unwrap();
        assert!(store.has_open_end());
        store
            .set_successor(&case, t1, ActivityId(1), ts("2024-01-01T00:00:02Z"))
            .unwrap();
        assert!(!store.has_open_end());
    }
}
