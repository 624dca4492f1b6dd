// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tackrs - offline operation queue and sync for the school CRM.
//!
//! This crate provides the `tack` CLI. Operations recorded while the backend
//! is unreachable wait in a durable queue under `.tack/` and are replayed,
//! oldest first, once connectivity returns.
//!
//! # Main Components
//!
//! - [`sync::SyncCoordinator`] - drains the queue, one run at a time
//! - [`sync::ConnectivityMonitor`] - online/offline and update state
//! - [`sync::select_banner`] - what the status banner shows
//! - [`Config`] - project configuration (`.tack/config.toml`)
//!
//! The queue itself ([`tack_core::PendingStore`]) lives in `tack-core` so
//! the backend can share the operation model.

mod cli;
pub mod colors;
mod commands;
mod env;
mod logging;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, FailedCommand, OutputFormat, QueueCommand};
pub use config::{find_work_dir, init_work_dir, Config};
pub use error::{Error, Result};

use clap::CommandFactory;
use clap_complete::generate;

/// Execute a parsed command line. Changes into `-C <path>` first, if given.
pub fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)?;
    }
    if !matches!(cli.command, Command::Watch { .. }) {
        logging::init(logging::COMMAND_LEVEL, None);
    }
    run_command(cli.command)
}

fn run_command(command: Command) -> Result<()> {
    match command {
        Command::Init { backend } => commands::init::run(backend),
        Command::Enqueue { kind, payload } => commands::queue::enqueue(&kind, &payload),
        Command::Queue(cmd) => match cmd {
            QueueCommand::List { output } => commands::queue::list(output),
            QueueCommand::Count => commands::queue::count(),
            QueueCommand::Drop { id } => commands::queue::drop(&id),
            QueueCommand::Clear => commands::queue::clear(),
        },
        Command::Failed(cmd) => match cmd {
            FailedCommand::List { output } => commands::failed::list(output),
            FailedCommand::Retry { id } => commands::failed::retry(&id),
            FailedCommand::Dismiss { id } => commands::failed::dismiss(&id),
        },
        Command::Sync { quiet } => commands::sync::run(quiet),
        Command::Status => commands::status::run(),
        Command::Watch { log_file } => commands::watch::run(log_file),
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "tack", &mut std::io::stdout());
            Ok(())
        }
    }
}
