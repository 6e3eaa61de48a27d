//! Environment-driven configuration for both binaries (§10).
//!
//! No config-file crate, no CLI flags — the source this crate replaces
//! bootstraps purely off the environment, and so does the teacher binary's
//! `main()`. We follow the same `std::env::var(...)` + `.parse()` idiom
//! throughout.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::AlphaError;
use crate::types::ActivityId;

/// `host:port` for every member of the fleet, in `SERVER_ID` order. The last
/// entry is always the Central Node.
#[derive(Clone, Debug)]
pub struct ServerList {
    /// All entries, Activity Nodes first, Central Node last.
    pub addrs: Vec<String>,
}

impl ServerList {
    fn parse(raw: &str) -> Result<Self, AlphaError> {
        let addrs: Vec<String> = raw.split(',').map(|s| s.trim().to_string()).collect();
        if addrs.len() < 2 {
            return Err(AlphaError::Config(
                "SERVER_NAME_LIST must contain at least one activity node and the central node"
                    .into(),
            ));
        }
        Ok(Self { addrs })
    }

    /// Number of Activity Nodes in the fleet (`N`, excluding the Central Node).
    pub fn activity_count(&self) -> usize {
        self.addrs.len() - 1
    }

    /// Addresses of the Activity Nodes only, in id order.
    pub fn activity_addrs(&self) -> &[String] {
        &self.addrs[..self.addrs.len() - 1]
    }

    /// Address of the Central Node.
    pub fn central_addr(&self) -> &str {
        &self.addrs[self.addrs.len() - 1]
    }
}

fn env_timeout_ms() -> Duration {
    let ms = std::env::var("PEER_REQUEST_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000u64);
    Duration::from_millis(ms)
}

fn env_metrics_dir() -> String {
    std::env::var("METRICS_OUTPUT_DIR").unwrap_or_else(|_| ".".into())
}

/// Configuration for one Activity Node process.
#[derive(Clone, Debug)]
pub struct ActivityNodeConfig {
    /// This node's id — its index into `servers`.
    pub id: ActivityId,
    /// The human name of this node's activity.
    pub activity_name: String,
    /// The full fleet address book.
    pub servers: ServerList,
    /// Base port; this process binds `base_port + id`.
    pub base_port: u16,
    /// Stem used to name the per-event metrics CSV (from `FILE_PATH`).
    pub metrics_stem: String,
    /// Directory the metrics CSV is written into.
    pub metrics_dir: String,
    /// Outbound RPC timeout (§5).
    pub peer_timeout: Duration,
    /// Which predecessor-discovery strategy to run (§4.2).
    pub strategy: PredecessorStrategy,
}

/// Which of §4.2's two predecessor-discovery strategies an Activity Node runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PredecessorStrategy {
    /// Query every AN once, pick the latest-timestamp candidate.
    Baseline,
    /// Probe the per-AN `most_frequent` list first, self-biased.
    Optimized,
}

fn env_strategy() -> PredecessorStrategy {
    match std::env::var("PREDECESSOR_STRATEGY").as_deref() {
        Ok("baseline") => PredecessorStrategy::Baseline,
        _ => PredecessorStrategy::Optimized,
    }
}

impl ActivityNodeConfig {
    /// Load from the environment, failing fast on anything missing/malformed.
    pub fn from_env() -> Result<Self, AlphaError> {
        let id: u32 = std::env::var("SERVER_ID")
            .map_err(|_| AlphaError::Config("SERVER_ID is required".into()))?
            .parse()
            .map_err(|_| AlphaError::Config("SERVER_ID must be an integer".into()))?;

        let servers = ServerList::parse(
            &std::env::var("SERVER_NAME_LIST")
                .map_err(|_| AlphaError::Config("SERVER_NAME_LIST is required".into()))?,
        )?;

        if id as usize >= servers.activity_count() {
            return Err(AlphaError::Config(format!(
                "SERVER_ID {id} is out of range for {} activity nodes",
                servers.activity_count()
            )));
        }

        let activity_name = std::env::var("ACTIVITY_NAME")
            .map_err(|_| AlphaError::Config("ACTIVITY_NAME is required".into()))?;

        let base_port: u16 = std::env::var("BASE_SERVER_PORT")
            .map_err(|_| AlphaError::Config("BASE_SERVER_PORT is required".into()))?
            .parse()
            .map_err(|_| AlphaError::Config("BASE_SERVER_PORT must be an integer".into()))?;

        let file_path = std::env::var("FILE_PATH").unwrap_or_else(|_| "events".into());
        let metrics_stem = std::path::Path::new(&file_path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "events".into());

        Ok(Self {
            id: ActivityId(id),
            activity_name,
            servers,
            base_port,
            metrics_stem,
            metrics_dir: env_metrics_dir(),
            peer_timeout: env_timeout_ms(),
            strategy: env_strategy(),
        })
    }

    /// The port this process should bind.
    pub fn bind_port(&self) -> u16 {
        self.base_port + self.id.0 as u16
    }
}

/// Configuration for the Central Node process.
#[derive(Clone, Debug)]
pub struct CentralConfig {
    /// This node's id — always `servers.addrs.len() - 1`.
    pub id: u32,
    /// The full fleet address book.
    pub servers: ServerList,
    /// Base port; this process binds `base_port + id`.
    pub base_port: u16,
    /// Activity id → human name, used to label transitions and places.
    pub activity_mapping: HashMap<u32, String>,
    /// Outbound RPC timeout (§5).
    pub peer_timeout: Duration,
}

impl CentralConfig {
    /// Load from the environment, failing fast on anything missing/malformed.
    pub fn from_env() -> Result<Self, AlphaError> {
        let id: u32 = std::env::var("SERVER_ID")
            .map_err(|_| AlphaError::Config("SERVER_ID is required".into()))?
            .parse()
            .map_err(|_| AlphaError::Config("SERVER_ID must be an integer".into()))?;

        let servers = ServerList::parse(
            &std::env::var("SERVER_NAME_LIST")
                .map_err(|_| AlphaError::Config("SERVER_NAME_LIST is required".into()))?,
        )?;

        if id as usize != servers.addrs.len() - 1 {
            return Err(AlphaError::Config(format!(
                "SERVER_ID {id} does not match the central node's position (last entry, index {}) in SERVER_NAME_LIST",
                servers.addrs.len() - 1
            )));
        }

        let base_port: u16 = std::env::var("BASE_SERVER_PORT")
            .map_err(|_| AlphaError::Config("BASE_SERVER_PORT is required".into()))?
            .parse()
            .map_err(|_| AlphaError::Config("BASE_SERVER_PORT must be an integer".into()))?;

        let mapping_raw = std::env::var("SERVER_ACTIVITY_MAPPING")
            .map_err(|_| AlphaError::Config("SERVER_ACTIVITY_MAPPING is required".into()))?;
        let raw_map: HashMap<String, String> = serde_json::from_str(&mapping_raw)
            .map_err(|e| AlphaError::Config(format!("SERVER_ACTIVITY_MAPPING: {e}")))?;
        let activity_mapping = raw_map
            .into_iter()
            .map(|(k, v)| {
                k.parse::<u32>()
                    .map(|id| (id, v))
                    .map_err(|_| AlphaError::Config(format!("bad activity id key {k:?}")))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            id,
            servers,
            base_port,
            activity_mapping,
            peer_timeout: env_timeout_ms(),
        })
    }

    /// The port this process should bind.
    pub fn bind_port(&self) -> u16 {
        self.base_port + self.id as u16
    }
}

/// Default `RUST_LOG` filter for a binary, following the teacher's
/// `"<bin>=info,tower_http=info"` convention.
pub fn default_log_filter(bin_name: &str) -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| format!("{bin_name}=info,tower_http=info"))
}
