// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the tackrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'tack init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("invalid backend URL '{0}'\n  hint: the backend must be a ws:// or wss:// URL")]
    InvalidBackendUrl(String),

    #[error("invalid payload: {0}\n  hint: pass the payload as a JSON object, or '-' to read it from stdin")]
    InvalidPayload(String),

    #[error("no update available")]
    NoUpdate,

    #[error("update failed: {0}")]
    Update(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] tack_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tackrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
