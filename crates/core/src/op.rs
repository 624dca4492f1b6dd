// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Business operations that can be queued for replay.
//!
//! Every mutation the client records against the backend is one variant of
//! [`Operation`], carrying a strongly typed payload. Operations are designed
//! to be:
//!
//! - Serializable: stored in the pending queue and sent over the wire as
//!   `{"kind": "...", "payload": {...}}`
//! - Idempotent: each carries a natural key the backend deduplicates on
//! - Self-validating: malformed operations never reach the queue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// All operation kinds, in declaration order.
pub const KINDS: &[&str] = &[
    "create-client",
    "update-client-status",
    "book-class",
    "cancel-booking",
    "record-sale",
    "adjust-inventory",
    "start-rental",
    "return-rental",
    "record-transaction",
];

/// A business operation to be applied by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum Operation {
    /// Register a new client.
    CreateClient(CreateClient),
    /// Move a client between lead/active/inactive.
    UpdateClientStatus(UpdateClientStatus),
    /// Book a client into a class.
    BookClass(BookClass),
    /// Cancel an existing booking.
    CancelBooking(CancelBooking),
    /// Record a shop sale.
    RecordSale(RecordSale),
    /// Correct a stock level.
    AdjustInventory(AdjustInventory),
    /// Hand out rental equipment.
    StartRental(StartRental),
    /// Take rental equipment back.
    ReturnRental(ReturnRental),
    /// Book an income or expense in the ledger.
    RecordTransaction(RecordTransaction),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateClient {
    pub client_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateClientStatus {
    pub client_id: String,
    pub status: ClientStatus,
}

/// Lifecycle of a client record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Lead,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookClass {
    pub booking_id: String,
    pub class_id: String,
    pub client_id: String,
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancelBooking {
    pub booking_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordSale {
    pub sale_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub lines: Vec<SaleLine>,
}

/// One line of a sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleLine {
    pub sku: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl RecordSale {
    /// Sum of all lines in cents.
    pub fn total_cents(&self) -> i64 {
        self.lines
            .iter()
            .map(|l| i64::from(l.quantity).saturating_mul(l.unit_price_cents))
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdjustInventory {
    pub sku: String,
    pub delta: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartRental {
    pub rental_id: String,
    pub client_id: String,
    pub equipment_id: String,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReturnRental {
    pub rental_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordTransaction {
    pub transaction_id: String,
    pub direction: Direction,
    pub amount_cents: i64,
    pub category: String,
}

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Income,
    Expense,
}

/// Outbound message sent to a client once an operation is confirmed synced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    /// Operation kind that produced the message.
    pub kind: String,
    /// Recipient client, when the operation names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Message body.
    pub message: String,
}

impl Operation {
    /// Builds an operation from a kind name and a JSON payload.
    pub fn from_parts(kind: &str, payload: serde_json::Value) -> Result<Self> {
        if !KINDS.contains(&kind) {
            return Err(Error::InvalidKind(kind.to_string()));
        }
        let tagged = serde_json::json!({ "kind": kind, "payload": payload });
        serde_json::from_value(tagged).map_err(|e| Error::InvalidOperation {
            kind: kind_name(kind),
            reason: e.to_string(),
        })
    }

    /// Returns the kebab-case kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::CreateClient(_) => "create-client",
            Operation::UpdateClientStatus(_) => "update-client-status",
            Operation::BookClass(_) => "book-class",
            Operation::CancelBooking(_) => "cancel-booking",
            Operation::RecordSale(_) => "record-sale",
            Operation::AdjustInventory(_) => "adjust-inventory",
            Operation::StartRental(_) => "start-rental",
            Operation::ReturnRental(_) => "return-rental",
            Operation::RecordTransaction(_) => "record-transaction",
        }
    }

    /// Returns the key the backend deduplicates this operation on.
    pub fn natural_key(&self) -> &str {
        match self {
            Operation::CreateClient(p) => &p.client_id,
            Operation::UpdateClientStatus(p) => &p.client_id,
            Operation::BookClass(p) => &p.booking_id,
            Operation::CancelBooking(p) => &p.booking_id,
            Operation::RecordSale(p) => &p.sale_id,
            Operation::AdjustInventory(p) => &p.sku,
            Operation::StartRental(p) => &p.rental_id,
            Operation::ReturnRental(p) => &p.rental_id,
            Operation::RecordTransaction(p) => &p.transaction_id,
        }
    }

    /// Checks the payload for values no backend would accept.
    pub fn validate(&self) -> Result<()> {
        let kind = self.kind();
        let invalid = |reason: &str| {
            Err(Error::InvalidOperation {
                kind,
                reason: reason.to_string(),
            })
        };

        if self.natural_key().trim().is_empty() {
            return invalid("identifier cannot be empty");
        }

        match self {
            Operation::CreateClient(p) => {
                if p.name.trim().is_empty() {
                    return invalid("client name cannot be empty");
                }
                if p.email.as_deref().is_some_and(|e| !e.contains('@')) {
                    return invalid("email must contain '@'");
                }
            }
            Operation::UpdateClientStatus(_) => {}
            Operation::BookClass(p) => {
                if p.class_id.trim().is_empty() || p.client_id.trim().is_empty() {
                    return invalid("booking needs a class and a client");
                }
            }
            Operation::CancelBooking(_) => {}
            Operation::RecordSale(p) => {
                if p.lines.is_empty() {
                    return invalid("sale has no lines");
                }
                if p.lines.iter().any(|l| l.quantity == 0) {
                    return invalid("sale line quantity must be positive");
                }
                if p.lines.iter().any(|l| l.unit_price_cents < 0) {
                    return invalid("sale line price cannot be negative");
                }
            }
            Operation::AdjustInventory(p) => {
                if p.delta == 0 {
                    return invalid("inventory delta cannot be zero");
                }
            }
            Operation::StartRental(p) => {
                if p.client_id.trim().is_empty() || p.equipment_id.trim().is_empty() {
                    return invalid("rental needs a client and equipment");
                }
            }
            Operation::ReturnRental(_) => {}
            Operation::RecordTransaction(p) => {
                if p.amount_cents <= 0 {
                    return invalid("amount must be positive");
                }
                if p.category.trim().is_empty() {
                    return invalid("category cannot be empty");
                }
            }
        }

        Ok(())
    }

    /// Returns the message to send once this operation is synced, if any.
    pub fn notification(&self) -> Option<Notification> {
        let (client_id, message) = match self {
            Operation::CreateClient(p) => (
                Some(p.client_id.clone()),
                format!("Welcome aboard, {}! Your profile is ready.", p.name),
            ),
            Operation::BookClass(p) => (
                Some(p.client_id.clone()),
                format!(
                    "Your class {} is booked for {} UTC.",
                    p.class_id,
                    p.starts_at.format("%Y-%m-%d %H:%M")
                ),
            ),
            Operation::RecordSale(p) => {
                let client_id = p.client_id.clone()?;
                (
                    Some(client_id),
                    format!(
                        "Thanks for your purchase! Total: {}",
                        format_cents(p.total_cents())
                    ),
                )
            }
            Operation::StartRental(p) => (
                Some(p.client_id.clone()),
                format!(
                    "Enjoy the session! {} is due back {} UTC.",
                    p.equipment_id,
                    p.due_at.format("%Y-%m-%d %H:%M")
                ),
            ),
            Operation::UpdateClientStatus(_)
            | Operation::CancelBooking(_)
            | Operation::AdjustInventory(_)
            | Operation::ReturnRental(_)
            | Operation::RecordTransaction(_) => return None,
        };

        Some(Notification {
            kind: self.kind().to_string(),
            client_id,
            message,
        })
    }
}

/// Maps a validated kind name to its static form.
fn kind_name(kind: &str) -> &'static str {
    KINDS.iter().find(|k| **k == kind).copied().unwrap_or("unknown")
}

/// Formats cents as `units.cents`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
