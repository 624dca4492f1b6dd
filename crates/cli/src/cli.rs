// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "tack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline operation queue and sync for the school CRM")]
#[command(
    long_about = "Offline operation queue and sync for the school CRM.\n\n\
    Changes made while the backend is unreachable are queued locally and \
    replayed, oldest first, as soon as it comes back."
)]
pub struct Cli {
    /// Run as if tack was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a .tack directory in the current directory
    Init {
        /// Backend WebSocket URL
        #[arg(long, value_name = "url")]
        backend: Option<String>,
    },

    /// Queue an operation for the backend
    #[command(after_help = "\
Examples:
  tack enqueue adjust-inventory '{\"sku\":\"KITE-12M\",\"delta\":-1}'
  tack enqueue cancel-booking '{\"booking_id\":\"bk-7\"}'
  echo '{\"rental_id\":\"r-9\"}' | tack enqueue return-rental -")]
    Enqueue {
        /// Operation kind (e.g. book-class, record-sale)
        kind: String,
        /// JSON payload, or '-' to read it from stdin
        payload: String,
    },

    /// Inspect and manage the pending queue
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Inspect operations that will not be retried automatically
    #[command(subcommand)]
    Failed(FailedCommand),

    /// Replay pending operations now
    Sync {
        /// Only print errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show connectivity and queue status
    Status,

    /// Stay connected: sync on reconnect and show the status banner
    #[command(after_help = "\
While running, type a command and press enter:
  sync     Replay pending operations now
  update   Restart into a newly installed release
  quit     Stop watching")]
    Watch {
        /// Write logs to .tack/tack.log instead of stderr
        #[arg(long)]
        log_file: bool,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// List pending operations, oldest first
    List {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Print the number of pending operations
    Count,
    /// Abandon one pending operation
    Drop {
        /// Operation id
        id: String,
    },
    /// Abandon every pending operation
    Clear,
}

#[derive(Subcommand)]
pub enum FailedCommand {
    /// List failed operations
    List {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Move a failed operation back to the end of the queue
    Retry {
        /// Operation id
        id: String,
    },
    /// Discard a failed operation
    Dismiss {
        /// Operation id
        id: String,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
