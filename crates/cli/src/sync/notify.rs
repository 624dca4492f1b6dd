// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client notifications sent after an operation is confirmed synced.
//!
//! Delivery is fire-and-forget: a failed notification is logged by the
//! caller and never puts the operation back in the queue.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tack_core::Notification;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Delivers notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, note: &Notification) -> Result<()>;
}

/// Logs notifications. Used when no delivery command is configured.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, note: &Notification) -> Result<()> {
        info!(
            kind = %note.kind,
            client = note.client_id.as_deref().unwrap_or("-"),
            message = %note.message,
            "notification"
        );
        Ok(())
    }
}

/// Hands each notification to a shell command as JSON on stdin.
///
/// The command runs from the project root with `TACK_NOTIFY_KIND` and
/// `TACK_NOTIFY_CLIENT` set. The caller does not wait for it: the child is
/// reaped on the runtime's blocking pool. Its exit code is ignored.
///
/// Must be called from within a tokio runtime.
pub struct CommandNotifier {
    command: String,
    project_root: PathBuf,
}

impl CommandNotifier {
    pub fn new(command: &str, work_dir: &Path) -> Self {
        CommandNotifier {
            command: command.to_string(),
            project_root: work_dir.parent().unwrap_or(work_dir).to_path_buf(),
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, note: &Notification) -> Result<()> {
        let json = serde_json::to_string(note)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Config(format!("notify command needs a runtime: {e}")))?;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.project_root)
            .env("TACK_NOTIFY_KIND", &note.kind)
            .env(
                "TACK_NOTIFY_CLIENT",
                note.client_id.as_deref().unwrap_or_default(),
            )
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Config(format!("failed to spawn notify command: {e}")))?;

        // Dropping stdin closes the pipe so the command sees EOF
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(json.as_bytes());
        }

        let kind = note.kind.clone();
        runtime.spawn_blocking(move || match child.wait() {
            Ok(status) => debug!(%kind, %status, "notify command finished"),
            Err(e) => debug!(%kind, error = %e, "could not reap notify command"),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
