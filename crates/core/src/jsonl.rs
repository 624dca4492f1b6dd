// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL (JSON Lines) storage shared by the pending and dead-letter stores.
//!
//! Appends are fsynced. Rewrites go through a temporary file and a rename so
//! a crash never leaves a half-written store behind. Every mutation runs
//! under an exclusive advisory lock on a sibling `.lock` file, which keeps
//! the CLI and a running `tack watch` from clobbering each other.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Appends one record with fsync.
pub fn append<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let json = serde_json::to_string(record)?;
    writeln!(file, "{json}")?;
    file.sync_all()?;

    Ok(())
}

/// Reads all records.
///
/// Blank lines are skipped and a missing file reads as empty. A final line
/// without its newline is an interrupted append and is ignored; a malformed
/// line anywhere else is an error.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line.trim_end()) {
            Ok(record) => records.push(record),
            Err(_) if !line.ends_with('\n') => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(records)
}

/// Replaces the file contents with `records`, atomically.
pub fn rewrite<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let tmp = sibling(path, "tmp");
    {
        let mut file = File::create(&tmp)?;
        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{json}")?;
        }
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Runs `f` while holding the exclusive lock guarding `path`.
pub fn locked<T>(path: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let lock_path = sibling(path, "lock");
    let lock = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)?;
    lock.lock_exclusive()
        .map_err(|e| Error::Locked(format!("{}: {e}", lock_path.display())))?;

    let result = f();
    let _ = FileExt::unlock(&lock);
    result
}

/// `queue.jsonl` -> `queue.jsonl.<ext>`
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
