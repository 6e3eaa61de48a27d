//! Outbound peer RPC client, modeled on the teacher crate's small
//! `reqwest::Client` wrapper: one struct owns the client and the timeout,
//! exposes one method per call shape, and turns timeouts / non-2xx into
//! the domain error rather than leaking `reqwest::Error` up the stack.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::CorrelationSnapshot;
use crate::error::AlphaError;
use crate::types::{ActivityId, CaseId, Timestamp};

/// Wire shape for a `/case_event_data` response (§4.3, §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseEventCandidate {
    /// Case the candidate belongs to.
    pub case_id: CaseId,
    /// Activity that owns the candidate Neighborhood.
    pub activity_id: u32,
    /// The candidate's own event timestamp.
    pub timestamp: Timestamp,
}

/// Thin wrapper around a `reqwest::Client` for the handful of peer RPCs the
/// protocol needs (§4.2-§4.6).
#[derive(Clone, Debug)]
pub struct PeerClient {
    http: reqwest::Client,
}

impl PeerClient {
    /// Build a client with the given per-request timeout (§5, default 1 s).
    pub fn new(timeout: Duration) -> Result<Self, AlphaError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AlphaError::Config(format!("building http client: {e}")))?;
        Ok(Self { http })
    }

    /// `GET {peer}/case_event_data?case_id=...&timestamp=...` (§4.3).
    /// Timeout or non-2xx is treated as "no candidate", not propagated
    /// (§7, `PeerUnreachable` degrades to empty).
    pub async fn case_event_data(
        &self,
        peer: &str,
        case_id: &CaseId,
        timestamp: Timestamp,
    ) -> Option<CaseEventCandidate> {
        let url = format!("http://{peer}/case_event_data");
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("case_id", case_id.as_str()),
                ("timestamp", &timestamp.to_rfc3339()),
            ])
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json::<Option<CaseEventCandidate>>().await.ok()?
    }

    /// `POST {peer}/get_chosen` (§4.4). Returns `false` on any transport
    /// failure, same as an explicit `DoubleAssignment`/rejection from the peer.
    pub async fn get_chosen(
        &self,
        peer: &str,
        case_id: &CaseId,
        activity_id: ActivityId,
        req_timestamp: Timestamp,
        chosen_timestamp: Timestamp,
    ) -> bool {
        let url = format!("http://{peer}/get_chosen");
        let form = [
            ("case_id", case_id.clone()),
            ("activity_id", activity_id.0.to_string()),
            ("req_timestamp", req_timestamp.to_rfc3339()),
            ("chosen_timestamp", chosen_timestamp.to_rfc3339()),
        ];
        let resp = match self.http.post(&url).form(&form).send().await {
            Ok(r) if r.status().is_success() => r,
            _ => return false,
        };
        resp.json::<bool>().await.unwrap_or(false)
    }

    /// `GET {peer}/current_data` (§4.5). Used by the Central Node to poll
    /// every AN once per `/process_model` request (§4.6).
    pub async fn current_data(&self, peer: &str) -> Result<CorrelationSnapshot, AlphaError> {
        let url = format!("http://{peer}/current_data");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|_| AlphaError::PeerUnreachable(peer.to_string()))?;
        if !resp.status().is_success() {
            return Err(AlphaError::PeerUnreachable(peer.to_string()));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|_| AlphaError::PeerUnreachable(peer.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|source| AlphaError::Codec {
            peer: peer.to_string(),
            source,
        })
    }
}
