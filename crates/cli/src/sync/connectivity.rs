// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitor.
//!
//! Tracks whether the backend is reachable and whether a new release of the
//! client has been installed. Platform sources (see [`super::platform`]) feed
//! signals in; the coordinator and the banner read the state and subscribe to
//! transitions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Snapshot of connectivity and update availability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityState {
    pub is_online: bool,
    pub update_available: bool,
}

/// A state transition, delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// The backend became reachable.
    Online,
    /// The backend stopped being reachable.
    Offline,
    /// A new release was installed and is waiting to be activated.
    UpdateAvailable { version: String },
}

/// Restarts the process into a newly installed release.
pub trait UpdateActivator: Send + Sync {
    /// Only returns on failure.
    fn activate(&self, version: &str) -> Result<()>;
}

/// Subscriber capacity. Slow subscribers skip ahead instead of blocking signals.
const EVENT_CAPACITY: usize = 32;

/// Single source of truth for connectivity and update state.
pub struct ConnectivityMonitor {
    online: AtomicBool,
    /// Version of the detected release, if any.
    update: Mutex<Option<String>>,
    events: broadcast::Sender<ConnectivityEvent>,
    activator: Box<dyn UpdateActivator>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with an initial reachability guess.
    pub fn new(initially_online: bool, activator: Box<dyn UpdateActivator>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        ConnectivityMonitor {
            online: AtomicBool::new(initially_online),
            update: Mutex::new(None),
            events,
            activator,
        }
    }

    /// Returns the current state without blocking on any signal source.
    pub fn state(&self) -> ConnectivityState {
        ConnectivityState {
            is_online: self.online.load(Ordering::Acquire),
            update_available: self.pending_update().is_some(),
        }
    }

    /// Subscribes to transitions. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.events.subscribe(),
        }
    }

    /// Applies a reachability signal. Subscribers hear only real transitions.
    ///
    /// Returns whether the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let was_online = self.online.swap(online, Ordering::AcqRel);
        if was_online == online {
            return false;
        }

        if online {
            info!("backend reachable");
            self.emit(ConnectivityEvent::Online);
        } else {
            warn!("backend unreachable, operations will be queued");
            self.emit(ConnectivityEvent::Offline);
        }
        true
    }

    /// Records a newly installed release. Repeated signals for the same
    /// version are ignored.
    ///
    /// Returns whether this was a new detection.
    pub fn mark_update_available(&self, version: &str) -> bool {
        {
            let mut update = self.update.lock().unwrap_or_else(|e| e.into_inner());
            if update.as_deref() == Some(version) {
                return false;
            }
            *update = Some(version.to_string());
        }

        info!(version, "new release installed");
        self.emit(ConnectivityEvent::UpdateAvailable {
            version: version.to_string(),
        });
        true
    }

    /// Restarts into the detected release. Only call on explicit user action.
    pub fn activate_update(&self) -> Result<()> {
        let version = self.pending_update().ok_or(Error::NoUpdate)?;
        info!(version = %version, "activating update");
        self.activator.activate(&version)
    }

    /// Version of the detected release, if any.
    pub fn pending_update(&self) -> Option<String> {
        self.update
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn emit(&self, event: ConnectivityEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }
}

/// A live subscription to [`ConnectivityEvent`]s.
pub struct Subscription {
    rx: broadcast::Receiver<ConnectivityEvent>,
}

impl Subscription {
    /// Waits for the next event. Returns `None` once the monitor is gone.
    pub async fn recv(&mut self) -> Option<ConnectivityEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "connectivity subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ConnectivityEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
