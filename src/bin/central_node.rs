//! Central Node binary: the single coordinator that polls every Activity
//! Node and synthesizes the Petri net on demand (§4.6-§4.8).

use std::net::SocketAddr;
use std::sync::Arc;

use alpha_miner::central_node::{router, CentralState};
use alpha_miner::config::{default_log_filter, CentralConfig};
use alpha_miner::transport::PeerClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(default_log_filter(
            "central_node",
        )))
        .with_target(false)
        .compact()
        .init();

    let config = CentralConfig::from_env()?;
    let peers = PeerClient::new(config.peer_timeout)?;
    let port = config.bind_port();

    let state = Arc::new(CentralState::new(&config, peers));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, activities = config.activity_mapping.len(), "central node listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
