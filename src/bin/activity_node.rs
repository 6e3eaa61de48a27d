//! Activity Node binary: one process per activity, serving the peer and
//! coordinator endpoints of §4.1-§4.5.

use std::net::SocketAddr;
use std::sync::Arc;

use alpha_miner::activity_node::{router, ActivityNodeState};
use alpha_miner::config::{default_log_filter, ActivityNodeConfig};
use alpha_miner::transport::PeerClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(default_log_filter(
            "activity_node",
        )))
        .with_target(false)
        .compact()
        .init();

    let config = ActivityNodeConfig::from_env()?;
    let peers = PeerClient::new(config.peer_timeout)?;
    let port = config.bind_port();
    let id = config.id;
    let activity_name = config.activity_name.clone();

    let state = Arc::new(ActivityNodeState::new(&config, peers));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%id, %activity_name, %addr, "activity node listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
