// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use futures_util::{SinkExt, StreamExt};
use tack_core::protocol::{ClientMessage, ServerMessage};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn tack() -> Command {
    let mut cmd = cargo_bin_cmd!("tack");
    cmd.env_remove("TACK_LOG").env("NO_COLOR", "1");
    cmd
}

/// Helper to create an initialized temp directory pointing at `backend`
pub fn init_temp_with(backend: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    tack()
        .arg("init")
        .arg("--backend")
        .arg(backend)
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to create an initialized temp directory whose backend is down
pub fn init_temp() -> TempDir {
    init_temp_with(&closed_backend())
}

/// Helper to queue an inventory adjustment and return its id
pub fn enqueue_adjust(temp: &TempDir, sku: &str) -> String {
    let output = tack()
        .arg("enqueue")
        .arg("adjust-inventory")
        .arg(format!(r#"{{"sku":"{sku}","delta":-1}}"#))
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    // "Queued adjust-inventory <id>"
    String::from_utf8_lossy(&output.stdout)
        .split_whitespace()
        .last()
        .unwrap()
        .to_string()
}

/// Ids listed by `tack queue list -o json`, oldest first
pub fn pending_ids(temp: &TempDir) -> Vec<String> {
    list_ids(temp, "queue")
}

/// Ids listed by `tack failed list -o json`
pub fn failed_ids(temp: &TempDir) -> Vec<String> {
    list_ids(temp, "failed")
}

fn list_ids(temp: &TempDir, group: &str) -> Vec<String> {
    let output = tack()
        .args([group, "list", "-o", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    entries
        .iter()
        .map(|e| {
            let op = e.get("operation").unwrap_or(e);
            format!("{}-{}", op["id"]["wall_ms"], op["id"]["counter"])
        })
        .collect()
}

/// A backend address nothing listens on.
pub fn closed_backend() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}")
}

/// An in-process backend speaking the replay protocol.
///
/// Replays whose natural key is in `reject` are rejected; everything else
/// is applied. Runs until dropped.
pub struct Backend {
    pub url: String,
    _rt: tokio::runtime::Runtime,
}

pub fn backend(reject: &'static [&'static str]) -> Backend {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let listener = rt.block_on(TcpListener::bind("127.0.0.1:0")).unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    rt.spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                // Reachability probes connect and hang up without a handshake
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
    Backend { url, _rt: rt }
}
