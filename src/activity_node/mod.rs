//! Activity Node: owns one activity's neighborhood store, start-activity
//! set, and correlation summary; serves the peer/coordinator endpoints of
//! §4.1-§4.5 and §6.

pub mod predecessor;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::codec::CorrelationSnapshot;
use crate::config::{ActivityNodeConfig, PredecessorStrategy};
use crate::correlation::CorrelationSummary;
use crate::error::AlphaError;
use crate::metrics::MetricsWriter;
use crate::neighborhood::{Neighborhood, NeighborhoodStore};
use crate::start_activities::StartActivitySet;
use crate::transport::{CaseEventCandidate, PeerClient};
use crate::types::{parse_timestamp, ActivityId, CaseId, Timestamp};

/// Mutated state, behind one lock per §4.1's concurrency contract ("one
/// logical lock per AN").
struct Inner {
    neighborhoods: NeighborhoodStore,
    start_set: StartActivitySet,
    summary: CorrelationSummary,
    most_frequent: Vec<(ActivityId, u64)>,
}

/// Everything one Activity Node process needs to serve its endpoints.
pub struct ActivityNodeState {
    /// This node's activity id.
    pub id: ActivityId,
    /// This node's activity name.
    pub activity_name: String,
    /// Addresses of every Activity Node in the fleet, indexed by id.
    pub servers: Vec<String>,
    /// Which §4.2 strategy to run.
    pub strategy: PredecessorStrategy,
    /// Outbound RPC client.
    pub peers: PeerClient,
    /// Per-event metrics CSV writer.
    pub metrics: MetricsWriter,
    inner: Mutex<Inner>,
}

impl ActivityNodeState {
    /// Build fresh state for `config`.
    pub fn new(config: &ActivityNodeConfig, peers: PeerClient) -> Self {
        Self::from_parts(
            config.id,
            config.activity_name.clone(),
            config.servers.activity_addrs().to_vec(),
            config.strategy,
            peers,
            &config.metrics_dir,
            &config.metrics_stem,
        )
    }

    /// Build fresh state directly from its parts, bypassing environment
    /// configuration — used by `new` and by tests that spin up a fleet of
    /// nodes in-process.
    pub fn from_parts(
        id: ActivityId,
        activity_name: String,
        servers: Vec<String>,
        strategy: PredecessorStrategy,
        peers: PeerClient,
        metrics_dir: &str,
        metrics_stem: &str,
    ) -> Self {
        let n = servers.len();
        Self {
            id,
            activity_name,
            servers,
            strategy,
            peers,
            metrics: MetricsWriter::new(metrics_dir, metrics_stem),
            inner: Mutex::new(Inner {
                neighborhoods: NeighborhoodStore::new(),
                start_set: StartActivitySet::new(),
                summary: CorrelationSummary::new(id, n),
                most_frequent: Vec::new(),
            }),
        }
    }

    /// §4.2 step 1: self always probed first, then the `most_frequent`
    /// list in count-descending order. K defaults to the fleet size, so
    /// this covers every already-seen predecessor before falling back.
    pub async fn probe_order(&self) -> Vec<ActivityId> {
        let inner = self.inner.lock().await;
        let mut order = vec![self.id];
        for (aid, _) in &inner.most_frequent {
            if *aid != self.id {
                order.push(*aid);
            }
        }
        order
    }

    /// Bump `most_frequent[activity]` and re-sort descending by count.
    pub async fn bump_most_frequent(&self, activity: ActivityId) {
        let mut inner = self.inner.lock().await;
        match inner.most_frequent.iter_mut().find(|(a, _)| *a == activity) {
            Some((_, count)) => *count += 1,
            None => inner.most_frequent.push((activity, 1)),
        }
        inner
            .most_frequent
            .sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    }

    /// Local equivalent of `/case_event_data` — used when this node probes
    /// itself (§4.2's "self-probe excluded" optimization).
    pub async fn local_case_event_data(
        &self,
        case_id: &CaseId,
        req_timestamp: Timestamp,
    ) -> Option<CaseEventCandidate> {
        let inner = self.inner.lock().await;
        inner
            .neighborhoods
            .find_predecessor(case_id, req_timestamp)
            .map(|c| CaseEventCandidate {
                case_id: case_id.clone(),
                activity_id: self.id.0,
                timestamp: c.timestamp,
            })
    }

    /// Local equivalent of `/get_chosen` (§4.4), shared by the HTTP handler
    /// and same-node predecessor notification.
    pub async fn local_get_chosen(
        &self,
        case_id: &CaseId,
        requester: ActivityId,
        req_timestamp: Timestamp,
        chosen_timestamp: Timestamp,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        match inner
            .neighborhoods
            .set_successor(case_id, chosen_timestamp, requester, req_timestamp)
        {
            Ok(()) => {
                inner.summary.record_successor(requester);
                true
            }
            Err(AlphaError::DoubleAssignment { .. }) => {
                warn!(%case_id, %chosen_timestamp, "get_chosen hit an already-assigned neighborhood");
                false
            }
            Err(e) => {
                warn!(error = %e, "get_chosen failed");
                false
            }
        }
    }

    /// §4.1: handle one triggered event for this node's own activity.
    pub async fn trigger_event(
        &self,
        case_id: CaseId,
        activity_id: ActivityId,
        timestamp: Timestamp,
    ) -> Result<(), AlphaError> {
        if activity_id != self.id {
            return Err(AlphaError::NotMyActivity {
                requested: activity_id.0,
                owned: self.id.0,
            });
        }

        let outcome = match self.strategy {
            PredecessorStrategy::Baseline => {
                predecessor::ask_baseline(self, &case_id, timestamp).await
            }
            PredecessorStrategy::Optimized => {
                predecessor::ask_optimized(self, &case_id, timestamp).await
            }
        };

        {
            let mut inner = self.inner.lock().await;
            let n = match outcome.predecessor {
                None => {
                    if inner.start_set.insert(case_id.clone()) {
                        inner.summary.mark_start();
                    }
                    Neighborhood::start(timestamp)
                }
                Some((pred_activity, pred_timestamp)) => {
                    Neighborhood::with_predecessor(timestamp, pred_activity, pred_timestamp)
                }
            };
            inner.neighborhoods.insert(&case_id, n)?;
        }

        self.metrics
            .record(&case_id, self.id, timestamp, outcome.peers_queried)
            .await?;
        info!(%case_id, activity = %self.id, %timestamp, "event triggered");
        Ok(())
    }

    /// §4.5: snapshot this node's correlation summary for `/current_data`.
    pub async fn current_data(&self) -> CorrelationSnapshot {
        let inner = self.inner.lock().await;
        inner.summary.snapshot(inner.neighborhoods.has_open_end())
    }
}

#[derive(Deserialize)]
struct TriggerEventForm {
    activity_id: u32,
    case_id: String,
    timestamp: String,
}

async fn trigger_event_handler(
    State(state): State<Arc<ActivityNodeState>>,
    Form(form): Form<TriggerEventForm>,
) -> Result<impl IntoResponse, AlphaError> {
    let timestamp = parse_timestamp(&form.timestamp)
        .map_err(|e| AlphaError::MalformedRequest(format!("timestamp: {e}")))?;
    state
        .trigger_event(form.case_id, ActivityId(form.activity_id), timestamp)
        .await?;
    Ok(axum::http::StatusCode::OK)
}

#[derive(Deserialize)]
struct CaseEventQuery {
    case_id: String,
    timestamp: String,
}

async fn case_event_data_handler(
    State(state): State<Arc<ActivityNodeState>>,
    Query(q): Query<CaseEventQuery>,
) -> Result<impl IntoResponse, AlphaError> {
    let timestamp = parse_timestamp(&q.timestamp)
        .map_err(|e| AlphaError::MalformedRequest(format!("timestamp: {e}")))?;
    let candidate = state.local_case_event_data(&q.case_id, timestamp).await;
    Ok(Json(candidate))
}

#[derive(Deserialize)]
struct GetChosenForm {
    case_id: String,
    activity_id: u32,
    req_timestamp: String,
    chosen_timestamp: String,
}

async fn get_chosen_handler(
    State(state): State<Arc<ActivityNodeState>>,
    Form(form): Form<GetChosenForm>,
) -> Result<impl IntoResponse, AlphaError> {
    let req_timestamp = parse_timestamp(&form.req_timestamp)
        .map_err(|e| AlphaError::MalformedRequest(format!("req_timestamp: {e}")))?;
    let chosen_timestamp = parse_timestamp(&form.chosen_timestamp)
        .map_err(|e| AlphaError::MalformedRequest(format!("chosen_timestamp: {e}")))?;
    let ok = state
        .local_get_chosen(
            &form.case_id,
            ActivityId(form.activity_id),
            req_timestamp,
            chosen_timestamp,
        )
        .await;
    Ok(Json(ok))
}

async fn current_data_handler(
    State(state): State<Arc<ActivityNodeState>>,
) -> impl IntoResponse {
    Json(state.current_data().await)
}

async fn healthz_handler(State(state): State<Arc<ActivityNodeState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "activity_id": state.id.0,
        "activity_name": state.activity_name,
    }))
}

/// Build the Axum router for an Activity Node process.
pub fn router(state: Arc<ActivityNodeState>) -> Router {
    Router::new()
        .route("/trigger_event", post(trigger_event_handler))
        .route("/case_event_data", get(case_event_data_handler))
        .route("/get_chosen", post(get_chosen_handler))
        .route("/current_data", get(current_data_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
