// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Test infrastructure for command testing.
//!
//! `TestContext` initializes a `.tack/` directory in a temp dir and hands
//! out a [`Context`] pointing at it, so commands run without touching the
//! current directory.

use futures_util::{SinkExt, StreamExt};
use tack_core::op::{AdjustInventory, BookClass};
use tack_core::protocol::{ClientMessage, ServerMessage};
use tack_core::{FailureReason, Operation, PendingOperation};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use super::Context;
use crate::config::Config;

/// A fresh `.tack/` directory with default config.
pub struct TestContext {
    pub ctx: Context,
    _temp_dir: TempDir, // Keep alive for duration of test
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_backend("ws://127.0.0.1:1")
    }

    /// Creates a context whose backend is `url`.
    pub fn with_backend(url: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let work_dir = super::init::run_in(temp_dir.path(), url).expect("Failed to init");
        let config = Config::load(&work_dir).expect("Failed to load config");
        TestContext {
            ctx: Context { work_dir, config },
            _temp_dir: temp_dir,
        }
    }

    /// Queues an inventory adjustment.
    pub fn enqueue_adjust(&self, sku: &str) -> PendingOperation {
        let op = Operation::AdjustInventory(AdjustInventory {
            sku: sku.to_string(),
            delta: -1,
            reason: None,
        });
        self.ctx.pending().unwrap().enqueue(op).unwrap()
    }

    /// Puts a booking straight on the failed list.
    pub fn fail_booking(&self, booking_id: &str) -> PendingOperation {
        let op = Operation::BookClass(BookClass {
            booking_id: booking_id.to_string(),
            class_id: "beginner-am".to_string(),
            client_id: "cl-1".to_string(),
            starts_at: chrono::Utc::now(),
        });
        let pending = PendingOperation::new(tack_core::IdGenerator::new().next_id(), op);
        self.ctx
            .failed()
            .unwrap()
            .push(
                pending.clone(),
                FailureReason::Rejected {
                    message: "unknown client cl-1".to_string(),
                },
            )
            .unwrap();
        pending
    }

    pub fn pending_count(&self) -> usize {
        self.ctx.pending().unwrap().count()
    }

    pub fn failed_count(&self) -> usize {
        self.ctx.failed().unwrap().count()
    }
}

/// Serves the replay protocol on a local port until the test ends.
///
/// Replays whose natural key is in `reject` are rejected, all others
/// applied. Connections that fail the handshake (reachability probes) are
/// ignored. Returns the backend URL.
pub async fn fake_backend(reject: &'static [&'static str]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(Message::Text(text))) = ws.next().await {
                    let reply = match ClientMessage::from_json(&text).unwrap() {
                        ClientMessage::Ping { id } => ServerMessage::pong(id),
                        ClientMessage::Replay { id, operation } => {
                            if reject.contains(&operation.natural_key()) {
                                ServerMessage::rejected(id, "not allowed")
                            } else {
                                ServerMessage::applied(id)
                            }
                        }
                    };
                    let json = reply.to_json().unwrap();
                    if ws.send(Message::Text(json.into())).await.is_err() {
                        return;
                    }
                }
            });
        }
    });
    format!("ws://{addr}")
}

/// A backend URL nothing listens on.
pub async fn closed_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}")
}
