// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline sync: connectivity, replay and the status banner.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ events ┌───────────────┐ replay ┌─────────────┐
//! │ Connectivity │───────►│     Sync      │───────►│  Replayer   │──► backend
//! │   Monitor    │        │  Coordinator  │        │ (Transport) │
//! └──────▲───────┘        └───────┬───────┘        └─────────────┘
//!        │ signals                │ drains
//! ┌──────┴───────┐        ┌───────▼───────┐
//! │   platform   │        │ PendingStore  │──► failed list
//! │ probe, watch │        │ (JSONL queue) │
//! └──────────────┘        └───────────────┘
//! ```
//!
//! The banner reads a [`StatusSnapshot`] assembled from the monitor, the
//! coordinator's session and the store counts.

mod connectivity;
mod coordinator;
mod notify;
mod platform;
mod replay;
mod status;
mod transport;

pub use connectivity::{
    ConnectivityEvent, ConnectivityMonitor, ConnectivityState, Subscription, UpdateActivator,
};
pub use coordinator::{RetryPolicy, Stores, SyncCoordinator, SyncReport, SyncSession};
pub use notify::{CommandNotifier, LogNotifier, Notifier};
pub use platform::{
    probe, ExecRestart, ReachabilityProbe, ReleaseWatcher, Sources, RUNNING_VERSION,
};
pub use replay::{
    ReplayConfig, ReplayError, ReplayOutcome, ReplayResult, Replayer, TransportReplayer,
};
pub use status::{select_banner, status_line, Banner, StatusBinding, StatusSnapshot};
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};

/// Starts the platform signal sources.
pub use platform::start as start_sources;

#[cfg(test)]
mod test_helpers;
