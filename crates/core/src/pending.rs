// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending operation store.
//!
//! Holds operations that could not reach the backend, in insertion order,
//! until the sync coordinator confirms them. The store is mirrored in memory
//! and persisted as JSONL so that a restart while offline loses nothing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::id::{IdGenerator, OpId};
use crate::jsonl;
use crate::op::Operation;

/// An operation waiting to be replayed against the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingOperation {
    pub id: OpId,
    #[serde(flatten)]
    pub operation: Operation,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    /// Most recent transient failure, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl PendingOperation {
    /// Wraps an operation with a fresh id and zero attempts.
    pub fn new(id: OpId, operation: Operation) -> Self {
        PendingOperation {
            id,
            operation,
            created_at: Utc::now(),
            attempts: 0,
            last_error: None,
        }
    }

    /// Returns the operation kind.
    pub fn kind(&self) -> &'static str {
        self.operation.kind()
    }
}

/// Durable FIFO of pending operations.
pub struct PendingStore {
    path: PathBuf,
    ops: Vec<PendingOperation>,
    ids: IdGenerator,
}

impl PendingStore {
    /// Opens (or creates) the store at `path` and loads its contents.
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = PendingStore {
            path: path.to_path_buf(),
            ops: Vec::new(),
            ids: IdGenerator::new(),
        };
        jsonl::locked(path, || {
            if !path.exists() {
                jsonl::rewrite::<PendingOperation>(path, &[])?;
            }
            Ok(())
        })?;
        store.refresh()?;
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reloads the queue from disk, picking up writes from other processes.
    pub fn refresh(&mut self) -> Result<()> {
        self.ops = jsonl::read_all(&self.path)?;
        self.observe_ids();
        Ok(())
    }

    /// Validates `operation`, assigns it an id and appends it at the tail.
    ///
    /// The operation is persisted before this returns.
    pub fn enqueue(&mut self, operation: Operation) -> Result<PendingOperation> {
        operation.validate()?;

        let path = self.path.clone();
        jsonl::locked(&path, || {
            self.refresh()?;
            let pending = PendingOperation::new(self.ids.next_id(), operation);
            jsonl::append(&path, &pending)?;
            self.ops.push(pending.clone());
            Ok(pending)
        })
    }

    /// Appends a previously queued operation at the tail under its own id,
    /// with the attempt counter reset.
    ///
    /// Keeping the id lets the backend recognize an operation it already
    /// applied. If the id is still pending, the queued copy is returned
    /// unchanged.
    pub fn requeue(&mut self, operation: PendingOperation) -> Result<PendingOperation> {
        operation.operation.validate()?;
        let path = self.path.clone();
        jsonl::locked(&path, || {
            self.refresh()?;
            if let Some(existing) = self.ops.iter().find(|op| op.id == operation.id) {
                return Ok(existing.clone());
            }
            let pending = PendingOperation {
                attempts: 0,
                last_error: None,
                ..operation
            };
            jsonl::append(&path, &pending)?;
            self.ops.push(pending.clone());
            Ok(pending)
        })
    }

    /// Number of pending operations.
    pub fn count(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Snapshot of all pending operations, oldest first.
    pub fn list(&self) -> Vec<PendingOperation> {
        self.ops.clone()
    }

    /// Looks up a pending operation by id.
    pub fn get(&self, id: OpId) -> Option<PendingOperation> {
        self.ops.iter().find(|op| op.id == id).cloned()
    }

    /// Removes an operation. Removing an absent id is a no-op.
    ///
    /// Returns whether an operation was removed.
    pub fn remove(&mut self, id: OpId) -> Result<bool> {
        self.mutate(|ops| {
            let before = ops.len();
            ops.retain(|op| op.id != id);
            ops.len() != before
        })
    }

    /// Bumps the retry counter of an operation and records the failure.
    ///
    /// Returns the new attempt count, or `None` if the id is not pending.
    pub fn increment_attempts(&mut self, id: OpId, error: Option<&str>) -> Result<Option<u32>> {
        let mut attempts = None;
        self.mutate(|ops| {
            let Some(op) = ops.iter_mut().find(|op| op.id == id) else {
                return false;
            };
            op.attempts = op.attempts.saturating_add(1);
            if let Some(error) = error {
                op.last_error = Some(error.to_string());
            }
            attempts = Some(op.attempts);
            true
        })?;
        Ok(attempts)
    }

    /// Drops every pending operation. Returns how many were dropped.
    pub fn clear(&mut self) -> Result<usize> {
        let mut dropped = 0;
        self.mutate(|ops| {
            dropped = ops.len();
            ops.clear();
            dropped > 0
        })?;
        Ok(dropped)
    }

    /// Applies `f` to a fresh copy of the queue under the store lock and
    /// persists the result if `f` reports a change.
    fn mutate(&mut self, f: impl FnOnce(&mut Vec<PendingOperation>) -> bool) -> Result<bool> {
        let path = self.path.clone();
        jsonl::locked(&path, || {
            self.refresh()?;
            let changed = f(&mut self.ops);
            if changed {
                jsonl::rewrite(&path, &self.ops)?;
            }
            Ok(changed)
        })
    }

    fn observe_ids(&self) {
        if let Some(max) = self.ops.iter().map(|op| op.id).max() {
            self.ids.observe(max);
        }
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
