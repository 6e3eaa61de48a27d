//! The two predecessor-discovery strategies of §4.2, sharing one contract:
//! given `(case_id, timestamp)`, return `Option<(pred_activity,
//! pred_timestamp)>` and, as a side effect, notify the chosen peer.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::ActivityNodeState;
use crate::types::{ActivityId, CaseId, Timestamp};

/// Outcome of a predecessor search: the candidate (if any) plus the number
/// of outbound RPCs issued, for the `peers_queried` metric (§4.1 step 4).
pub struct PredecessorOutcome {
    /// The chosen predecessor, if one was found and successfully notified.
    pub predecessor: Option<(ActivityId, Timestamp)>,
    /// Outgoing RPC count, self-probe excluded (§4.2).
    pub peers_queried: u32,
}

/// Sort candidates by timestamp descending, tie-broken by lowest activity id
/// ascending — "pick the latest predecessor, lowest id on a tie" (§4.2).
fn pick_winner(mut candidates: Vec<(ActivityId, Timestamp)>) -> Option<(ActivityId, Timestamp)> {
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    candidates.into_iter().next()
}

async fn notify_winner(
    state: &ActivityNodeState,
    case_id: &CaseId,
    winner: ActivityId,
    req_timestamp: Timestamp,
    chosen_timestamp: Timestamp,
) -> bool {
    if winner == state.id {
        state
            .local_get_chosen(case_id, state.id, req_timestamp, chosen_timestamp)
            .await
    } else {
        state
            .peers
            .get_chosen(
                &state.servers[winner.as_usize()],
                case_id,
                state.id,
                req_timestamp,
                chosen_timestamp,
            )
            .await
    }
}

/// Query every AN (including self) exactly once; pick the winner; notify it.
pub async fn ask_baseline(
    state: &ActivityNodeState,
    case_id: &CaseId,
    timestamp: Timestamp,
) -> PredecessorOutcome {
    let mut candidates = Vec::new();
    let mut peers_queried = 0u32;
    for (idx, addr) in state.servers.iter().enumerate() {
        let aid = ActivityId(idx as u32);
        let found = if aid == state.id {
            state.local_case_event_data(case_id, timestamp).await
        } else {
            peers_queried += 1;
            state.peers.case_event_data(addr, case_id, timestamp).await
        };
        if let Some(c) = found {
            candidates.push((ActivityId(c.activity_id), c.timestamp));
        }
    }

    let winner = pick_winner(candidates);
    finalize(state, case_id, timestamp, winner, peers_queried).await
}

/// Probe the per-AN `most_frequent` list first (self always first, "probing
/// self is free"), falling back to the remaining ANs on a full miss.
pub async fn ask_optimized(
    state: &ActivityNodeState,
    case_id: &CaseId,
    timestamp: Timestamp,
) -> PredecessorOutcome {
    let probe_order = state.probe_order().await;
    let mut probed: HashSet<ActivityId> = HashSet::new();
    let mut peers_queried = 0u32;

    for aid in &probe_order {
        probed.insert(*aid);
        let found = if *aid == state.id {
            state.local_case_event_data(case_id, timestamp).await
        } else {
            peers_queried += 1;
            state
                .peers
                .case_event_data(&state.servers[aid.as_usize()], case_id, timestamp)
                .await
        };
        let Some(c) = found else { continue };
        if notify_winner(state, case_id, *aid, timestamp, c.timestamp).await {
            state.bump_most_frequent(*aid).await;
            debug!(activity = %aid, "predecessor found via most_frequent probe");
            return PredecessorOutcome {
                predecessor: Some((*aid, c.timestamp)),
                peers_queried,
            };
        }
        warn!(activity = %aid, "get_chosen rejected during most_frequent probe");
    }

    let mut candidates = Vec::new();
    for (idx, addr) in state.servers.iter().enumerate() {
        let aid = ActivityId(idx as u32);
        if probed.contains(&aid) {
            continue;
        }
        peers_queried += 1;
        if let Some(c) = state.peers.case_event_data(addr, case_id, timestamp).await {
            candidates.push((aid, c.timestamp));
        }
    }
    let winner = pick_winner(candidates);
    finalize(state, case_id, timestamp, winner, peers_queried).await
}

async fn finalize(
    state: &ActivityNodeState,
    case_id: &CaseId,
    timestamp: Timestamp,
    winner: Option<(ActivityId, Timestamp)>,
    peers_queried: u32,
) -> PredecessorOutcome {
    let Some((aid, chosen_ts)) = winner else {
        return PredecessorOutcome {
            predecessor: None,
            peers_queried,
        };
    };
    if notify_winner(state, case_id, aid, timestamp, chosen_ts).await {
        state.bump_most_frequent(aid).await;
        PredecessorOutcome {
            predecessor: Some((aid, chosen_ts)),
            peers_queried,
        }
    } else {
        warn!(activity = %aid, "chosen predecessor rejected the notification");
        PredecessorOutcome {
            predecessor: None,
            peers_queried,
        }
    }
}
