// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod failed;
pub mod init;
pub mod queue;
pub mod status;
pub mod sync;
pub mod watch;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use tack_core::{DeadLetterStore, PendingStore};

use crate::config::{failed_path, find_work_dir, pending_path, Config, RetryConfig};
use crate::error::{Error, Result};
use crate::sync::{
    CommandNotifier, ConnectivityMonitor, LogNotifier, Notifier, ReachabilityProbe, ReplayConfig,
    RetryPolicy, Stores, SyncCoordinator, TransportReplayer,
};

/// The `.tack/` directory a command runs against, with its configuration.
pub struct Context {
    pub work_dir: PathBuf,
    pub config: Config,
}

impl Context {
    /// Finds the `.tack/` directory above the current directory and loads it.
    pub fn load() -> Result<Self> {
        let work_dir = find_work_dir()?;
        let config = Config::load(&work_dir)?;
        Ok(Context { work_dir, config })
    }

    pub fn pending(&self) -> Result<PendingStore> {
        Ok(PendingStore::open(&pending_path(&self.work_dir))?)
    }

    pub fn failed(&self) -> Result<DeadLetterStore> {
        Ok(DeadLetterStore::open(&failed_path(&self.work_dir))?)
    }

    pub fn stores(&self) -> Result<Stores> {
        Ok(Stores {
            pending: self.pending()?,
            failed: self.failed()?,
        })
    }

    pub fn probe(&self) -> Result<ReachabilityProbe> {
        Ok(ReachabilityProbe {
            addr: self.config.backend.probe_addr()?,
            interval: self.config.connectivity.probe_interval(),
            timeout: self.config.connectivity.probe_timeout(),
        })
    }

    fn notifier(&self) -> Arc<dyn Notifier> {
        match self.config.notify.command.as_deref() {
            Some(command) => Arc::new(CommandNotifier::new(command, &self.work_dir)),
            None => Arc::new(LogNotifier),
        }
    }

    /// Wires a coordinator against the configured backend.
    pub fn coordinator(&self, monitor: Arc<ConnectivityMonitor>) -> Result<SyncCoordinator> {
        let replayer = TransportReplayer::new(ReplayConfig {
            url: self.config.backend.url.clone(),
            connect_timeout: self.config.connectivity.probe_timeout(),
            reply_timeout: self.config.backend.reply_timeout(),
        });
        Ok(SyncCoordinator::new(
            monitor,
            self.stores()?,
            Box::new(replayer),
            self.notifier(),
            retry_policy(&self.config.retry),
        ))
    }
}

/// Converts the `[retry]` section into the coordinator's policy.
pub fn retry_policy(config: &RetryConfig) -> RetryPolicy {
    RetryPolicy {
        max_attempts: config.max_attempts,
        initial_delay: std::time::Duration::from_millis(config.initial_delay_ms),
        max_delay: std::time::Duration::from_secs(config.max_delay_secs),
    }
}

/// Builds the runtime for commands that talk to the backend.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {e}"))))
}
