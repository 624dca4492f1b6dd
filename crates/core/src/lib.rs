// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tack-core: shared library for the tack offline sync client
//!
//! This crate provides the operation model, the durable pending and
//! dead-letter stores, and the wire protocol used by both the `tack` client
//! and the `tack-remote` backend.

pub mod dead_letter;
pub mod error;
pub mod id;
pub mod jsonl;
pub mod op;
pub mod pending;
pub mod protocol;

pub use dead_letter::{DeadLetterStore, FailedOperation, FailureReason};
pub use error::{Error, Result};
pub use id::{ClockSource, IdGenerator, OpId, SystemClock};
pub use op::{Notification, Operation};
pub use pending::{PendingOperation, PendingStore};
