// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Keeps the projection and the set of applied operation ids behind one
//! lock. Every applied operation is appended to `applied.jsonl` before the
//! projection changes, and the projection is rebuilt from that file on
//! startup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use tack_core::{jsonl, OpId, Operation, Result};

use crate::projection::{Projection, Summary, Verdict};

const APPLIED_FILE_NAME: &str = "applied.jsonl";

/// How the server answered a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Duplicate,
    Rejected(String),
}

/// One line of `applied.jsonl`.
#[derive(Debug, Serialize, Deserialize)]
struct AppliedRecord {
    id: OpId,
    #[serde(flatten)]
    operation: Operation,
    applied_at: DateTime<Utc>,
}

/// Shared server state.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<Mutex<Ledger>>,
}

struct Ledger {
    path: PathBuf,
    applied: HashSet<OpId>,
    projection: Projection,
}

impl ServerState {
    /// Loads the state kept in `data_dir`.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(APPLIED_FILE_NAME);
        let records: Vec<AppliedRecord> = jsonl::read_all(&path)?;

        let mut applied = HashSet::with_capacity(records.len());
        let mut projection = Projection::default();
        for record in &records {
            applied.insert(record.id);
            projection.apply(&record.operation);
        }
        info!(applied = records.len(), "ledger loaded");

        Ok(ServerState {
            inner: Arc::new(Mutex::new(Ledger {
                path,
                applied,
                projection,
            })),
        })
    }

    /// Applies a replayed operation at most once.
    ///
    /// A known id is a duplicate. Otherwise the projection decides; an
    /// accepted operation is persisted before it is applied.
    pub async fn replay(&self, id: OpId, operation: Operation) -> Result<Outcome> {
        let mut ledger = self.inner.lock().await;
        if ledger.applied.contains(&id) {
            return Ok(Outcome::Duplicate);
        }

        match ledger.projection.check(&operation) {
            Verdict::Duplicate => Ok(Outcome::Duplicate),
            Verdict::Reject(reason) => Ok(Outcome::Rejected(reason)),
            Verdict::Apply => {
                let record = AppliedRecord {
                    id,
                    operation,
                    applied_at: Utc::now(),
                };
                jsonl::append(&ledger.path, &record)?;
                ledger.applied.insert(id);
                ledger.projection.apply(&record.operation);
                Ok(Outcome::Applied)
            }
        }
    }

    pub async fn summary(&self) -> Summary {
        self.inner.lock().await.projection.summary()
    }
}
