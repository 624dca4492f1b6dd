// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tack-remote: reference backend for the tack offline sync client.
//!
//! Accepts replayed operations over WebSocket, applies each one at most once
//! to an in-memory projection of the school's records, and keeps every
//! applied operation in `applied.jsonl`.

mod projection;
mod server;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// tack-remote: reference backend for tack
#[derive(Parser, Debug)]
#[command(name = "tack-remote")]
#[command(about = "Reference backend that applies replayed tack operations")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for the applied operation ledger
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting tack-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    std::fs::create_dir_all(&args.data)?;
    let state = state::ServerState::new(&args.data)?;
    let summary = state.summary().await;
    info!(
        "  Clients: {}, open rentals: {}",
        summary.clients, summary.open_rentals
    );

    server::run(args.bind, state).await?;

    Ok(())
}
