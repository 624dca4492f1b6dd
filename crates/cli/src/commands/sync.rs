// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot `tack sync`.

use std::sync::Arc;

use super::{runtime, Context};
use crate::error::Result;
use crate::sync::{ConnectivityMonitor, ExecRestart, SyncReport};

/// What a one-shot sync found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The backend did not answer the probe. Nothing was attempted.
    Offline { pending: usize },
    /// The queue was empty.
    Empty,
    Synced(SyncReport),
}

pub fn run(quiet: bool) -> Result<()> {
    let ctx = Context::load()?;
    let outcome = runtime()?.block_on(run_impl(&ctx))?;
    if quiet {
        return Ok(());
    }
    match outcome {
        Outcome::Offline { pending } => println!(
            "Backend unreachable at {}: {} {} stay queued",
            ctx.config.backend.url,
            pending,
            if pending == 1 { "change" } else { "changes" }
        ),
        Outcome::Empty => println!("Nothing to sync."),
        Outcome::Synced(report) => println!("{}", report),
    }
    Ok(())
}

pub(crate) async fn run_impl(ctx: &Context) -> Result<Outcome> {
    let monitor = Arc::new(ConnectivityMonitor::new(false, Box::new(ExecRestart)));
    let coordinator = ctx.coordinator(Arc::clone(&monitor))?;

    let pending = coordinator.status().await.pending_count;
    if !ctx.probe()?.check(&monitor).await {
        return Ok(Outcome::Offline { pending });
    }
    if pending == 0 {
        return Ok(Outcome::Empty);
    }
    Ok(Outcome::Synced(coordinator.sync_all().await))
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
