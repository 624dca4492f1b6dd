// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal color utilities for the status banner.
//!
//! Respects environment variables:
//! - `NO_COLOR=1`: Disables colors
//! - `COLOR=1`: Forces colors even without TTY

use std::io::IsTerminal;

use crate::env;

/// ANSI 256-color codes used by the banner.
pub mod codes {
    /// Offline: soft red
    pub const OFFLINE: u8 = 203;
    /// Syncing: steel blue
    pub const SYNCING: u8 = 74;
    /// Pending work: amber
    pub const PENDING: u8 = 179;
    /// Update ready: green
    pub const UPDATE: u8 = 114;
    /// Secondary details: medium grey
    pub const CONTEXT: u8 = 245;
}

/// Check if colors should be enabled based on TTY and environment variables.
pub fn should_colorize() -> bool {
    if env::no_color() {
        return false;
    }
    if env::force_color() {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// ANSI reset sequence.
const RESET: &str = "\x1b[0m";

/// Wraps `text` in a 256-color foreground escape.
pub fn paint(text: &str, code: u8) -> String {
    format!("\x1b[38;5;{code}m{text}{RESET}")
}

/// Apply context color (ids, counts, hints) to text.
pub fn context(text: &str) -> String {
    paint(text, codes::CONTEXT)
}

#[cfg(test)]
#[path = "colors_tests.rs"]
mod tests;
