// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup shared by all commands.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::env;

/// Default level for long-running `tack watch`.
pub const WATCH_LEVEL: &str = "info";
/// Default level for one-shot commands, which report through stdout.
pub const COMMAND_LEVEL: &str = "warn";

/// Builds the filter from `TACK_LOG`, falling back to `default_level`.
pub fn filter(default_level: &str) -> EnvFilter {
    env::log_filter()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}

/// Installs the global subscriber. Logs go to `log_file` when given and
/// writable, otherwise to stderr. A second call is a no-op.
pub fn init(default_level: &str, log_file: Option<&Path>) {
    let filter = filter(default_level);

    let file = log_file.and_then(|path| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    // Errors only mean a subscriber is already installed
    let _ = match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
}
