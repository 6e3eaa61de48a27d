//! Central Node fan-out poll and merge (§4.6).

use futures::future::join_all;
use tracing::warn;

use crate::codec::FootprintMatrix;
use crate::transport::PeerClient;

/// Poll every Activity Node once and merge their summaries into one
/// footprint matrix. An AN that fails to answer or whose body fails to
/// decode is skipped; synthesis proceeds with the remainder (§7).
pub async fn poll_and_merge(peers: &PeerClient, addrs: &[String]) -> FootprintMatrix {
    let mut matrix = FootprintMatrix::empty(addrs.len());
    let fetches = addrs.iter().map(|addr| peers.current_data(addr));
    for (addr, result) in addrs.iter().zip(join_all(fetches).await) {
        match result {
            Ok(snapshot) => matrix.merge(snapshot),
            Err(e) => warn!(peer = %addr, error = %e, "skipping unreachable activity node"),
        }
    }
    matrix
}
