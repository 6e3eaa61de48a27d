//! Crate root: shared types, error kinds, and the Activity Node / Central
//! Node module trees that implement the distributed Alpha process-mining
//! protocol.
//!
//! Two binaries (`activity_node`, `central_node`) wire these modules into
//! long-lived HTTP servers. The library surface itself holds no global
//! state — every piece of mutable state is owned by a node's `*State`
//! struct, constructed from environment configuration at startup.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Shared index/id newtypes and the timestamp alias used throughout.
pub mod types;
/// Domain error kinds and their HTTP mapping.
pub mod error;
/// Environment-driven configuration for both binaries.
pub mod config;
/// Self-describing wire shapes for footprint rows and summaries.
pub mod codec;
/// Per-case neighborhood store (§3, §4.1, §4.3, §4.4).
pub mod neighborhood;
/// Per-AN start-activity set.
pub mod start_activities;
/// Per-AN correlation summary (footprint row, start flag, seq).
pub mod correlation;
/// Outbound peer RPC client.
pub mod transport;
/// Per-event metrics CSV writer.
pub mod metrics;
/// Activity Node state and HTTP handlers.
pub mod activity_node;
/// Central Node state and HTTP handlers.
pub mod central_node;
