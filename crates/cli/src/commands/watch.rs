// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running `tack watch`.
//!
//! Keeps the connectivity monitor fed, syncs automatically, and prints the
//! status banner whenever it changes. Reads simple commands from stdin.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{runtime, Context};
use crate::colors;
use crate::config::log_path;
use crate::error::{Error, Result};
use crate::logging;
use crate::sync::{
    start_sources, status_line, ConnectivityMonitor, ExecRestart, Sources, StatusBinding,
    SyncCoordinator,
};

/// A line typed while watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    Sync,
    Update,
    Quit,
    Blank,
    Unknown(String),
}

pub(crate) fn parse_input(line: &str) -> Input {
    match line.trim() {
        "sync" | "s" => Input::Sync,
        "update" | "u" => Input::Update,
        "quit" | "q" | "exit" => Input::Quit,
        "" => Input::Blank,
        other => Input::Unknown(other.to_string()),
    }
}

pub fn run(log_file: bool) -> Result<()> {
    let ctx = Context::load()?;
    let log = log_file.then(|| log_path(&ctx.work_dir));
    logging::init(logging::WATCH_LEVEL, log.as_deref());
    let rt = runtime()?;
    let result = rt.block_on(watch(&ctx));
    // A blocked stdin read would otherwise hold up shutdown
    rt.shutdown_background();
    result
}

async fn watch(ctx: &Context) -> Result<()> {
    let monitor = Arc::new(ConnectivityMonitor::new(false, Box::new(ExecRestart)));
    let coordinator = ctx.coordinator(Arc::clone(&monitor))?;
    let interval = ctx.config.connectivity.probe_interval();
    let sources = Sources {
        probe: ctx.probe()?,
        marker: ctx.config.marker_path(&ctx.work_dir),
        release_interval: interval,
    };

    // Subscribe before the sources start so the first transition is seen
    let mut events = monitor.subscribe();
    let mut session = coordinator.subscribe();
    let cancel = CancellationToken::new();
    let mut tasks = vec![coordinator.spawn_auto_sync(Some(interval), cancel.child_token())];
    tasks.extend(start_sources(sources, &monitor, &cancel));
    info!(backend = %ctx.config.backend.url, "watching");

    let colorize = colors::should_colorize();
    let mut binding = StatusBinding::default();
    let mut refresh = tokio::time::interval(interval);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => {
                if event.is_none() {
                    break;
                }
            }
            changed = session.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = refresh.tick() => {}
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_input(&line) {
                    Input::Sync => spawn_sync(&coordinator),
                    Input::Update => activate_update(&monitor),
                    Input::Quit => break,
                    Input::Blank => {}
                    Input::Unknown(other) => {
                        eprintln!("unknown command '{}' (try: sync, update, quit)", other)
                    }
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
        }

        let snapshot = coordinator.status().await;
        if binding.update(&snapshot).is_some() {
            println!("{}", status_line(&snapshot, colorize));
        }
    }

    cancel.cancel();
    for task in tasks {
        let _ = task.await;
    }
    info!("stopped watching");
    Ok(())
}

/// Runs a manual sync without blocking the banner.
fn spawn_sync(coordinator: &SyncCoordinator) {
    let coordinator = coordinator.clone();
    tokio::spawn(async move {
        if !coordinator.monitor().state().is_online {
            println!("offline: changes stay queued");
            return;
        }
        let report = coordinator.sync_all().await;
        println!("sync: {}", report);
    });
}

fn activate_update(monitor: &ConnectivityMonitor) {
    match monitor.activate_update() {
        Ok(()) => {}
        Err(Error::NoUpdate) => println!("no update available"),
        Err(e) => eprintln!("error: {}", e),
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
