// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Replaying a pending operation against the backend.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tack_core::protocol::{ClientMessage, ServerMessage};
use tack_core::{OpId, PendingOperation};
use tracing::debug;

use super::transport::{Transport, TransportError, WebSocketTransport};

/// How the backend accepted a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// Applied now.
    Applied,
    /// Already applied by an earlier replay.
    Duplicate,
}

/// Why a replay did not go through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// The backend could not be reached. Not the operation's fault.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The backend refused the operation. Retrying will not help.
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// The backend failed to answer properly. Worth retrying later.
    #[error("transient failure: {0}")]
    Transient(String),
}

pub type ReplayResult = Result<ReplayOutcome, ReplayError>;

/// Boxed future returned by [`Replayer::replay`].
pub type ReplayFuture<'a> = Pin<Box<dyn Future<Output = ReplayResult> + Send + 'a>>;

/// Re-executes a pending operation against the backend.
pub trait Replayer: Send {
    fn replay<'a>(&'a mut self, op: &'a PendingOperation) -> ReplayFuture<'a>;

    /// Called when a sync run is over. Nothing held here may outlive the run.
    fn end_run(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// Settings for [`TransportReplayer`].
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub url: String,
    /// Max time to establish a connection.
    pub connect_timeout: Duration,
    /// Max time to wait for the answer to one replay.
    pub reply_timeout: Duration,
}

/// Replayer speaking the replay protocol over a [`Transport`].
///
/// Connects lazily on the first replay of a run, reuses the connection for
/// the rest of it, and closes it in [`Replayer::end_run`] so the next run
/// starts from a fresh socket.
pub struct TransportReplayer<T: Transport = WebSocketTransport> {
    config: ReplayConfig,
    transport: T,
}

impl TransportReplayer<WebSocketTransport> {
    pub fn new(config: ReplayConfig) -> Self {
        Self::with_transport(config, WebSocketTransport::new())
    }
}

impl<T: Transport> TransportReplayer<T> {
    /// Creates a replayer over a custom transport (for testing).
    pub fn with_transport(config: ReplayConfig, transport: T) -> Self {
        TransportReplayer { config, transport }
    }

    async fn ensure_connected(&mut self) -> Result<(), ReplayError> {
        if self.transport.is_connected() {
            return Ok(());
        }
        let connect = self.transport.connect(&self.config.url);
        match tokio::time::timeout(self.config.connect_timeout, connect).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ReplayError::Unreachable(e.to_string())),
            Err(_) => Err(ReplayError::Unreachable(format!(
                "connect to {} timed out",
                self.config.url
            ))),
        }
    }

    /// Waits for the answer addressed to `id`, skipping anything else.
    async fn await_reply(&mut self, id: OpId) -> ReplayResult {
        loop {
            let msg = match self.transport.recv().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    return Err(ReplayError::Unreachable(
                        "connection closed by backend".to_string(),
                    ))
                }
                Err(TransportError::Malformed(e)) => return Err(ReplayError::Transient(e)),
                Err(e) => return Err(ReplayError::Unreachable(e.to_string())),
            };

            match msg {
                ServerMessage::Applied { id: got } if got == id => {
                    return Ok(ReplayOutcome::Applied)
                }
                ServerMessage::Duplicate { id: got } if got == id => {
                    return Ok(ReplayOutcome::Duplicate)
                }
                ServerMessage::Rejected { id: got, reason } if got == id => {
                    return Err(ReplayError::Rejected(reason))
                }
                ServerMessage::Error { message } => return Err(ReplayError::Transient(message)),
                other => debug!(?other, %id, "skipping unrelated message"),
            }
        }
    }

    /// Drops the connection so a late reply cannot be read as the next answer.
    async fn reset(&mut self) {
        let _ = self.transport.disconnect().await;
    }
}

impl<T: Transport> Replayer for TransportReplayer<T> {
    fn replay<'a>(&'a mut self, op: &'a PendingOperation) -> ReplayFuture<'a> {
        Box::pin(async move {
            self.ensure_connected().await?;

            if let Err(e) = self.transport.send(ClientMessage::replay(op)).await {
                self.reset().await;
                return Err(ReplayError::Unreachable(e.to_string()));
            }

            let reply_timeout = self.config.reply_timeout;
            let result = match tokio::time::timeout(reply_timeout, self.await_reply(op.id)).await {
                Ok(result) => result,
                Err(_) => Err(ReplayError::Transient(format!(
                    "no reply within {}s",
                    reply_timeout.as_secs_f32()
                ))),
            };

            if matches!(
                result,
                Err(ReplayError::Transient(_) | ReplayError::Unreachable(_))
            ) {
                self.reset().await;
            }
            result
        })
    }

    fn end_run(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.transport.is_connected() {
                self.reset().await;
            }
        })
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
