// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tack-core operations.

use thiserror::Error;

/// All possible errors that can occur in tack-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("operation not found: {0}")]
    OperationNotFound(String),

    #[error("invalid operation kind: '{0}'\n  hint: valid kinds are: {kinds}", kinds = crate::op::KINDS.join(", "))]
    InvalidKind(String),

    #[error("invalid {kind} operation: {reason}")]
    InvalidOperation { kind: &'static str, reason: String },

    #[error("invalid operation id: {0}")]
    InvalidId(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store is locked by another process: {0}")]
    Locked(String),
}

/// A specialized Result type for tack-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
