// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dead-letter store for operations that will not be retried automatically.
//!
//! An operation lands here when the backend rejects it (validation or
//! authorization) or when it exhausts its retry budget. It stays visible
//! until the user retries or dismisses it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::OpId;
use crate::jsonl;
use crate::pending::PendingOperation;

/// Why an operation was dead-lettered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    /// The backend refused the operation.
    Rejected { message: String },
    /// Transient failures repeated until the retry budget ran out.
    MaxAttemptsExceeded {
        attempts: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_error: Option<String>,
    },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Rejected { message } => write!(f, "rejected: {message}"),
            FailureReason::MaxAttemptsExceeded {
                attempts,
                last_error: Some(err),
            } => write!(f, "gave up after {attempts} attempts: {err}"),
            FailureReason::MaxAttemptsExceeded { attempts, .. } => {
                write!(f, "gave up after {attempts} attempts")
            }
        }
    }
}

/// An operation moved out of the retry queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedOperation {
    pub operation: PendingOperation,
    pub reason: FailureReason,
    pub failed_at: DateTime<Utc>,
}

impl FailedOperation {
    pub fn id(&self) -> OpId {
        self.operation.id
    }
}

/// Durable list of failed operations.
pub struct DeadLetterStore {
    path: PathBuf,
    failed: Vec<FailedOperation>,
}

impl DeadLetterStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = DeadLetterStore {
            path: path.to_path_buf(),
            failed: Vec::new(),
        };
        store.refresh()?;
        Ok(store)
    }

    /// Reloads from disk.
    pub fn refresh(&mut self) -> Result<()> {
        self.failed = jsonl::read_all(&self.path)?;
        Ok(())
    }

    /// Records a failed operation.
    ///
    /// An id that is already listed is replaced in place, so an operation
    /// is never listed twice.
    pub fn push(&mut self, operation: PendingOperation, reason: FailureReason) -> Result<()> {
        let failed = FailedOperation {
            operation,
            reason,
            failed_at: Utc::now(),
        };
        let path = self.path.clone();
        jsonl::locked(&path, || {
            self.refresh()?;
            match self.failed.iter_mut().find(|f| f.id() == failed.id()) {
                Some(existing) => {
                    *existing = failed;
                    jsonl::rewrite(&path, &self.failed)
                }
                None => {
                    jsonl::append(&path, &failed)?;
                    self.failed.push(failed);
                    Ok(())
                }
            }
        })
    }

    /// Returns true if `id` is listed.
    pub fn contains(&self, id: OpId) -> bool {
        self.failed.iter().any(|f| f.id() == id)
    }

    pub fn count(&self) -> usize {
        self.failed.len()
    }

    /// Snapshot, oldest failure first.
    pub fn list(&self) -> Vec<FailedOperation> {
        self.failed.clone()
    }

    /// Removes a failed operation and hands it back.
    pub fn take(&mut self, id: OpId) -> Result<FailedOperation> {
        let path = self.path.clone();
        jsonl::locked(&path, || {
            self.refresh()?;
            let index = self
                .failed
                .iter()
                .position(|f| f.id() == id)
                .ok_or_else(|| Error::OperationNotFound(id.to_string()))?;
            let taken = self.failed.remove(index);
            jsonl::rewrite(&path, &self.failed)?;
            Ok(taken)
        })
    }

    /// Discards a failed operation for good.
    pub fn dismiss(&mut self, id: OpId) -> Result<()> {
        self.take(id).map(|_| ())
    }
}

#[cfg(test)]
#[path = "dead_letter_tests.rs"]
mod tests;
