// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Operation identifiers.
//!
//! An [`OpId`] pairs wall clock time with a counter so that ids are unique
//! and sort in generation order even when the wall clock stalls or goes
//! backwards.
//!
//! Format: `{wall_ms}-{counter}`
//!
//! Ordering rules:
//! 1. Higher wall_ms wins
//! 2. If wall_ms equal, higher counter wins

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Unique, generation-ordered identifier of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpId {
    /// Wall clock time in milliseconds since Unix epoch.
    pub wall_ms: u64,
    /// Counter for ids generated within the same millisecond.
    pub counter: u32,
}

impl OpId {
    /// Creates a new id with the given components.
    pub fn new(wall_ms: u64, counter: u32) -> Self {
        OpId { wall_ms, counter }
    }

    /// Parses an id from its string representation.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_ms
            .cmp(&other.wall_ms)
            .then_with(|| self.counter.cmp(&other.counter))
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.wall_ms, self.counter)
    }
}

impl FromStr for OpId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (wall, counter) = s
            .split_once('-')
            .ok_or_else(|| Error::InvalidId(format!("expected 'wall_ms-counter', got '{s}'")))?;

        let wall_ms = wall
            .parse::<u64>()
            .map_err(|_| Error::InvalidId(format!("invalid wall_ms '{wall}' in '{s}'")))?;
        let counter = counter
            .parse::<u32>()
            .map_err(|_| Error::InvalidId(format!("invalid counter '{counter}' in '{s}'")))?;

        Ok(OpId::new(wall_ms, counter))
    }
}

/// Trait for getting the current wall clock time.
///
/// This allows injecting a mock clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Generates strictly increasing [`OpId`]s.
///
/// The generator can be seeded with the largest id already persisted, so ids
/// stay ordered across restarts even if the wall clock moved backwards.
pub struct IdGenerator<C: ClockSource = SystemClock> {
    clock: C,
    last: Mutex<Option<OpId>>,
}

impl IdGenerator<SystemClock> {
    /// Creates a generator backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for IdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> IdGenerator<C> {
    /// Creates a generator with a custom clock source.
    pub fn with_clock(clock: C) -> Self {
        IdGenerator {
            clock,
            last: Mutex::new(None),
        }
    }

    /// Ensures every id generated from now on is greater than `floor`.
    pub fn observe(&self, floor: OpId) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if last.is_none_or(|l| floor > l) {
            *last = Some(floor);
        }
    }

    /// Generates the next id.
    pub fn next_id(&self) -> OpId {
        let physical = self.clock.now_ms();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let id = match *last {
            Some(prev) if physical <= prev.wall_ms => {
                // Clock stalled or went backwards: bump the counter
                OpId::new(prev.wall_ms, prev.counter.saturating_add(1))
            }
            _ => OpId::new(physical, 0),
        };

        *last = Some(id);
        id
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
