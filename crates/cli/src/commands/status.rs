// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot `tack status`.

use std::sync::Arc;

use tracing::debug;

use super::{runtime, Context};
use crate::colors;
use crate::error::Result;
use crate::sync::{
    status_line, ConnectivityMonitor, ExecRestart, ReleaseWatcher, StatusSnapshot, RUNNING_VERSION,
};

pub fn run() -> Result<()> {
    let ctx = Context::load()?;
    let snapshot = runtime()?.block_on(snapshot(&ctx))?;
    println!("{}", status_line(&snapshot, colors::should_colorize()));
    Ok(())
}

/// Probes once, checks for a new release and reads the store counts.
pub(crate) async fn snapshot(ctx: &Context) -> Result<StatusSnapshot> {
    let monitor = Arc::new(ConnectivityMonitor::new(false, Box::new(ExecRestart)));
    ctx.probe()?.check(&monitor).await;

    if let Some(marker) = ctx.config.marker_path(&ctx.work_dir) {
        match ReleaseWatcher::register(&marker, RUNNING_VERSION) {
            Ok(watcher) => watcher.poll(&monitor),
            Err(e) => debug!(error = %e, "release check skipped"),
        }
    }

    let coordinator = ctx.coordinator(monitor)?;
    Ok(coordinator.status().await)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
