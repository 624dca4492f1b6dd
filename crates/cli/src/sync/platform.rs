// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Platform signal sources feeding the [`ConnectivityMonitor`].
//!
//! - [`ReachabilityProbe`]: periodic TCP connect to the backend host
//! - [`ReleaseWatcher`]: polls a release marker naming the installed version
//!
//! Sources run as background tasks and stop when their cancellation token
//! fires. A source that cannot be registered is skipped with a warning.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connectivity::{ConnectivityMonitor, UpdateActivator};
use crate::error::{Error, Result};

/// Version of the running binary.
pub const RUNNING_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Attempts one TCP connection to `addr` within `timeout`.
pub async fn probe(addr: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(addr, error = %e, "probe failed");
            false
        }
        Err(_) => {
            debug!(addr, "probe timed out");
            false
        }
    }
}

/// Periodic reachability probe.
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    pub addr: String,
    pub interval: Duration,
    pub timeout: Duration,
}

impl ReachabilityProbe {
    /// Probes once and reports the result to the monitor.
    pub async fn check(&self, monitor: &ConnectivityMonitor) -> bool {
        let online = probe(&self.addr, self.timeout).await;
        monitor.set_online(online);
        online
    }

    /// Spawns the probe loop. The first probe runs immediately.
    pub fn spawn(
        self,
        monitor: Arc<ConnectivityMonitor>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = self.check(&monitor) => {}
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            debug!("reachability probe stopped");
        })
    }
}

/// Detects a newly installed release through a marker file.
///
/// The installer writes the installed version into the marker. A version
/// different from the running one means an update is waiting.
#[derive(Debug, Clone)]
pub struct ReleaseWatcher {
    marker: PathBuf,
    running: String,
}

impl ReleaseWatcher {
    /// Registers a watcher. Fails if the marker's directory does not exist.
    pub fn register(marker: &Path, running: &str) -> Result<Self> {
        let dir = marker.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            if !dir.is_dir() {
                return Err(Error::Update(format!(
                    "release marker directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(ReleaseWatcher {
            marker: marker.to_path_buf(),
            running: running.to_string(),
        })
    }

    /// Returns the installed version if it differs from the running one.
    pub fn check(&self) -> Option<String> {
        let installed = std::fs::read_to_string(&self.marker).ok()?;
        let installed = installed.trim();
        if installed.is_empty() || installed == self.running {
            None
        } else {
            Some(installed.to_string())
        }
    }

    /// Checks once and reports a detected release to the monitor.
    pub fn poll(&self, monitor: &ConnectivityMonitor) {
        if let Some(version) = self.check() {
            monitor.mark_update_available(&version);
        }
    }

    /// Spawns the polling loop.
    pub fn spawn(
        self,
        monitor: Arc<ConnectivityMonitor>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                self.poll(&monitor);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("release watcher stopped");
        })
    }
}

/// Everything needed to start the platform sources.
#[derive(Debug, Clone)]
pub struct Sources {
    pub probe: ReachabilityProbe,
    /// Release marker, or `None` when update detection is disabled.
    pub marker: Option<PathBuf>,
    pub release_interval: Duration,
}

/// Starts all sources that can be registered.
pub fn start(
    sources: Sources,
    monitor: &Arc<ConnectivityMonitor>,
    cancel: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let mut handles = vec![sources
        .probe
        .spawn(Arc::clone(monitor), cancel.child_token())];

    match sources.marker {
        Some(marker) => match ReleaseWatcher::register(&marker, RUNNING_VERSION) {
            Ok(watcher) => handles.push(watcher.spawn(
                Arc::clone(monitor),
                sources.release_interval,
                cancel.child_token(),
            )),
            Err(e) => warn!(error = %e, "update detection unavailable"),
        },
        None => debug!("update detection disabled"),
    }

    handles
}

/// Activates an update by re-executing the current binary with the same
/// arguments, which picks up the newly installed release.
pub struct ExecRestart;

impl UpdateActivator for ExecRestart {
    fn activate(&self, version: &str) -> Result<()> {
        let exe = std::env::current_exe()?;
        let args: Vec<std::ffi::OsString> = std::env::args_os().skip(1).collect();
        info!(version, exe = %exe.display(), "restarting into new release");
        restart(&exe, &args)
    }
}

#[cfg(unix)]
fn restart(exe: &Path, args: &[std::ffi::OsString]) -> Result<()> {
    use std::os::unix::process::CommandExt;
    let err = std::process::Command::new(exe).args(args).exec();
    Err(Error::Update(err.to_string()))
}

#[cfg(not(unix))]
fn restart(exe: &Path, args: &[std::ffi::OsString]) -> Result<()> {
    std::process::Command::new(exe)
        .args(args)
        .spawn()
        .map_err(|e| Error::Update(e.to_string()))?;
    std::process::exit(0)
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
