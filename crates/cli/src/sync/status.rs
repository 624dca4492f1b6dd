// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Status banner selection.
//!
//! Exactly one banner is shown at a time, chosen by strict priority:
//! offline, then syncing, then pending work, then an available update.

use std::fmt;

use crate::colors::{self, codes};

/// Everything the banner depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub is_online: bool,
    pub is_syncing: bool,
    pub pending_count: usize,
    /// Dead-lettered operations. Shown as detail, never affects priority.
    pub failed_count: usize,
    pub update_available: bool,
}

/// The one banner to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Offline { pending: usize },
    Syncing,
    Pending { count: usize },
    UpdateAvailable,
    Hidden,
}

/// Picks the banner for a snapshot.
pub fn select_banner(status: &StatusSnapshot) -> Banner {
    if !status.is_online {
        Banner::Offline {
            pending: status.pending_count,
        }
    } else if status.is_syncing {
        Banner::Syncing
    } else if status.pending_count > 0 {
        Banner::Pending {
            count: status.pending_count,
        }
    } else if status.update_available {
        Banner::UpdateAvailable
    } else {
        Banner::Hidden
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Banner::Offline { pending: 0 } => write!(f, "offline: changes will be queued"),
            Banner::Offline { pending } => {
                write!(f, "offline: {pending} {} queued", plural(*pending))
            }
            Banner::Syncing => write!(f, "syncing queued changes..."),
            Banner::Pending { count } => {
                write!(f, "{count} {} waiting to sync", plural(*count))
            }
            Banner::UpdateAvailable => write!(f, "update available: restart to apply"),
            Banner::Hidden => write!(f, "all changes synced"),
        }
    }
}

impl Banner {
    /// Color code for this banner, if it is visible.
    fn code(&self) -> Option<u8> {
        match self {
            Banner::Offline { .. } => Some(codes::OFFLINE),
            Banner::Syncing => Some(codes::SYNCING),
            Banner::Pending { .. } => Some(codes::PENDING),
            Banner::UpdateAvailable => Some(codes::UPDATE),
            Banner::Hidden => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, Banner::Hidden)
    }

    /// Renders the banner as one line.
    pub fn render(&self, colorize: bool) -> String {
        let text = self.to_string();
        match self.code() {
            Some(code) if colorize => colors::paint(&text, code),
            _ => text,
        }
    }
}

/// Status line for `tack status`: the banner plus the failed count, which
/// is appended to the pending and hidden lines only.
pub fn status_line(status: &StatusSnapshot, colorize: bool) -> String {
    let banner = select_banner(status);
    let mut line = banner.render(colorize);
    if status.failed_count > 0 && matches!(banner, Banner::Pending { .. } | Banner::Hidden) {
        let suffix = format!("({} failed)", status.failed_count);
        line.push(' ');
        if colorize {
            line.push_str(&colors::context(&suffix));
        } else {
            line.push_str(&suffix);
        }
    }
    line
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "change"
    } else {
        "changes"
    }
}

/// Remembers the last banner and reports only changes.
#[derive(Debug, Default)]
pub struct StatusBinding {
    last: Option<Banner>,
}

impl StatusBinding {
    /// Returns the banner for `status` if it differs from the previous one.
    pub fn update(&mut self, status: &StatusSnapshot) -> Option<Banner> {
        let banner = select_banner(status);
        if self.last == Some(banner) {
            return None;
        }
        self.last = Some(banner);
        Some(banner)
    }

    pub fn current(&self) -> Option<Banner> {
        self.last
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
