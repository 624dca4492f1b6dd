// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between a client and the backend.
//!
//! The protocol is request/reply:
//! - Client replays one queued operation at a time
//! - Server answers each replay with applied, duplicate or rejected,
//!   echoing the operation id

use serde::{Deserialize, Serialize};

use crate::id::OpId;
use crate::op::Operation;
use crate::pending::PendingOperation;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Apply a queued operation.
    ///
    /// The server must treat a repeated id as a duplicate, not a new write.
    Replay { id: OpId, operation: Operation },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The operation was applied.
    Applied { id: OpId },

    /// The operation had already been applied; nothing changed.
    Duplicate { id: OpId },

    /// The operation violates a backend rule and will never succeed as is.
    Rejected { id: OpId, reason: String },

    /// Pong response to client Ping.
    Pong { id: u64 },

    /// Server-side failure unrelated to the operation's content.
    Error { message: String },
}

impl ClientMessage {
    /// Creates a Replay message for a pending operation.
    pub fn replay(op: &PendingOperation) -> Self {
        ClientMessage::Replay {
            id: op.id,
            operation: op.operation.clone(),
        }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    pub fn applied(id: OpId) -> Self {
        ServerMessage::Applied { id }
    }

    pub fn duplicate(id: OpId) -> Self {
        ServerMessage::Duplicate { id }
    }

    pub fn rejected(id: OpId, reason: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            id,
            reason: reason.into(),
        }
    }

    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// The operation id this message answers, if it answers a replay.
    pub fn op_id(&self) -> Option<OpId> {
        match self {
            ServerMessage::Applied { id }
            | ServerMessage::Duplicate { id }
            | ServerMessage::Rejected { id, .. } => Some(*id),
            ServerMessage::Pong { .. } | ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
