// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use crate::config::{failed_path, init_work_dir, pending_path, DEFAULT_BACKEND_URL};
use crate::error::Result;
use tack_core::{DeadLetterStore, PendingStore};

pub fn run(backend: Option<String>) -> Result<()> {
    let target = std::env::current_dir()?;
    let backend = backend.unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let work_dir = run_in(&target, &backend)?;

    println!("Initialized tack at {}", work_dir.display());
    println!("Backend: {}", backend);
    Ok(())
}

/// Creates `.tack/` under `target` with an empty queue and failed list.
pub(crate) fn run_in(target: &Path, backend: &str) -> Result<PathBuf> {
    let work_dir = init_work_dir(target, backend)?;
    PendingStore::open(&pending_path(&work_dir))?;
    DeadLetterStore::open(&failed_path(&work_dir))?;
    Ok(work_dir)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
