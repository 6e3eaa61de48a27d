//! Error kinds shared by the Activity Node and Central Node handlers (§7).
//!
//! Domain errors are a closed `thiserror` enum so handlers can `?`-propagate
//! them straight into an HTTP response via `IntoResponse`. Binary-level glue
//! (config loading, server bootstrap) uses `anyhow::Result` the way the
//! teacher crate's `main()` functions do.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Domain errors surfaced by Activity Node / Central Node handlers.
#[derive(Debug, thiserror::Error)]
pub enum AlphaError {
    /// `/trigger_event` received an event for an activity this node doesn't own.
    #[error("event is for activity {requested}, this node owns {owned}")]
    NotMyActivity {
        /// Activity id carried on the request.
        requested: u32,
        /// Activity id this node actually owns.
        owned: u32,
    },

    /// An outbound peer RPC timed out or returned a non-2xx status.
    #[error("peer {0} unreachable")]
    PeerUnreachable(String),

    /// `/get_chosen` targeted a Neighborhood whose successor was already set.
    #[error("case {case_id} timestamp {timestamp} already has a successor")]
    DoubleAssignment {
        /// Case the neighborhood belongs to.
        case_id: String,
        /// `event_timestamp` of the neighborhood.
        timestamp: String,
    },

    /// A request was missing required fields or had an unparseable value.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// A second event arrived for a case at a timestamp already recorded.
    #[error("duplicate timestamp for case {case_id}: {timestamp}")]
    DuplicateTimestamp {
        /// Case the event belongs to.
        case_id: String,
        /// The timestamp that collided.
        timestamp: String,
    },

    /// Startup-time configuration is missing or unparseable.
    #[error("configuration error: {0}")]
    Config(String),

    /// A peer's `/current_data` body failed to decode.
    #[error("failed to decode summary from {peer}: {source}")]
    Codec {
        /// The peer whose payload failed to decode.
        peer: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

impl IntoResponse for AlphaError {
    fn into_response(self) -> Response {
        let status = match &self {
            AlphaError::NotMyActivity { .. } => StatusCode::BAD_REQUEST,
            AlphaError::PeerUnreachable(_) => StatusCode::BAD_GATEWAY,
            AlphaError::DoubleAssignment { .. } => StatusCode::CONFLICT,
            AlphaError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AlphaError::DuplicateTimestamp { .. } => StatusCode::BAD_REQUEST,
            AlphaError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AlphaError::Codec { .. } => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
