//! Central Node: polls every Activity Node, merges their summaries, and
//! synthesizes a Petri net on demand (§4.6-§4.8, §6).

pub mod alpha;
pub mod merge;
pub mod petri;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::CentralConfig;
use crate::transport::PeerClient;
use crate::types::ActivityId;

/// Everything the Central Node process needs to serve its endpoints.
pub struct CentralState {
    /// Activity Node addresses, indexed by activity id.
    pub activity_addrs: Vec<String>,
    /// Activity id → human name.
    pub activity_names: HashMap<u32, String>,
    /// Outbound RPC client.
    pub peers: PeerClient,
}

impl CentralState {
    /// Build state for `config`.
    pub fn new(config: &CentralConfig, peers: PeerClient) -> Self {
        Self::from_parts(
            config.servers.activity_addrs().to_vec(),
            config.activity_mapping.clone(),
            peers,
        )
    }

    /// Build state directly from its parts, bypassing environment
    /// configuration — used by `new` and by tests.
    pub fn from_parts(
        activity_addrs: Vec<String>,
        activity_names: HashMap<u32, String>,
        peers: PeerClient,
    ) -> Self {
        Self {
            activity_addrs,
            activity_names,
            peers,
        }
    }

    /// §4.6-§4.8: fan out `/current_data`, merge, synthesize, assemble.
    pub async fn discover_process_model(&self) -> petri::PetriNet {
        let n = self.activity_addrs.len();
        let matrix = merge::poll_and_merge(&self.peers, &self.activity_addrs).await;

        let start: BTreeSet<ActivityId> = (0..n)
            .map(|i| ActivityId(i as u32))
            .filter(|&a| matrix.is_start(a))
            .collect();
        let end: BTreeSet<ActivityId> = (0..n)
            .map(|i| ActivityId(i as u32))
            .filter(|&a| matrix.is_end(a))
            .collect();

        let pairs = alpha::synthesize(&matrix);
        petri::assemble(n, &pairs, &start, &end, &self.activity_names)
    }
}

async fn process_model_handler(State(state): State<Arc<CentralState>>) -> impl IntoResponse {
    let net = state.discover_process_model().await;
    info!(places = net.places.len(), transitions = net.transitions.len(), "process model synthesized");
    Json(serde_json::json!({ "net": net.render() }))
}

async fn healthz_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the Axum router for the Central Node process.
pub fn router(state: Arc<CentralState>) -> Router {
    Router::new()
        .route("/process_model", get(process_model_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
