// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory view of the school's records, built by applying operations.
//!
//! Checking and applying are split: [`Projection::check`] decides what to do
//! with an operation without touching anything, and [`Projection::apply`]
//! mutates. The server persists an operation between the two so the ledger
//! on disk never holds an operation the projection refused.

use std::collections::HashMap;

use tack_core::op::{ClientStatus, Direction};
use tack_core::Operation;

/// What to do with an incoming operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Apply,
    /// Already reflected in the projection.
    Duplicate,
    Reject(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub status: ClientStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rental {
    pub equipment_id: String,
    pub returned: bool,
}

/// Counts reported in logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub clients: usize,
    pub active_clients: usize,
    pub bookings: usize,
    pub open_rentals: usize,
    pub balance_cents: i64,
}

#[derive(Debug, Default)]
pub struct Projection {
    pub(crate) clients: HashMap<String, Client>,
    pub(crate) bookings: HashMap<String, Booking>,
    pub(crate) stock: HashMap<String, i64>,
    pub(crate) rentals: HashMap<String, Rental>,
    pub(crate) balance_cents: i64,
    /// Operations that create a record, by kind and natural key.
    created: HashMap<(&'static str, String), Operation>,
}

/// Kinds whose natural key names a record they create.
fn creates_record(op: &Operation) -> bool {
    matches!(
        op,
        Operation::CreateClient(_)
            | Operation::BookClass(_)
            | Operation::RecordSale(_)
            | Operation::StartRental(_)
            | Operation::RecordTransaction(_)
    )
}

impl Projection {
    /// Decides whether `op` can be applied.
    ///
    /// A creating operation whose record already exists is a duplicate when
    /// its payload matches the original and a conflict otherwise.
    pub fn check(&self, op: &Operation) -> Verdict {
        if let Err(e) = op.validate() {
            return Verdict::Reject(e.to_string());
        }

        if creates_record(op) {
            let key = (op.kind(), op.natural_key().to_string());
            if let Some(original) = self.created.get(&key) {
                return if original == op {
                    Verdict::Duplicate
                } else {
                    Verdict::Reject(format!(
                        "{} {} already exists with different details",
                        op.kind(),
                        op.natural_key()
                    ))
                };
            }
        }

        match op {
            Operation::UpdateClientStatus(p) => self.require_client(&p.client_id),
            Operation::BookClass(p) => self.require_client(&p.client_id),
            Operation::CancelBooking(p) => match self.bookings.get(&p.booking_id) {
                None => Verdict::Reject(format!("unknown booking {}", p.booking_id)),
                Some(b) if b.cancelled => Verdict::Duplicate,
                Some(_) => Verdict::Apply,
            },
            Operation::RecordSale(p) => match &p.client_id {
                Some(client_id) => self.require_client(client_id),
                None => Verdict::Apply,
            },
            Operation::StartRental(p) => {
                if let Verdict::Reject(r) = self.require_client(&p.client_id) {
                    return Verdict::Reject(r);
                }
                let out = self
                    .rentals
                    .values()
                    .any(|r| !r.returned && r.equipment_id == p.equipment_id);
                if out {
                    Verdict::Reject(format!("{} is already rented out", p.equipment_id))
                } else {
                    Verdict::Apply
                }
            }
            Operation::ReturnRental(p) => match self.rentals.get(&p.rental_id) {
                None => Verdict::Reject(format!("unknown rental {}", p.rental_id)),
                Some(r) if r.returned => Verdict::Duplicate,
                Some(_) => Verdict::Apply,
            },
            Operation::CreateClient(_)
            | Operation::AdjustInventory(_)
            | Operation::RecordTransaction(_) => Verdict::Apply,
        }
    }

    fn require_client(&self, client_id: &str) -> Verdict {
        if self.clients.contains_key(client_id) {
            Verdict::Apply
        } else {
            Verdict::Reject(format!("unknown client {client_id}"))
        }
    }

    /// Applies an operation that [`check`](Self::check) accepted.
    pub fn apply(&mut self, op: &Operation) {
        if creates_record(op) {
            self.created
                .insert((op.kind(), op.natural_key().to_string()), op.clone());
        }

        match op {
            Operation::CreateClient(p) => {
                self.clients.insert(
                    p.client_id.clone(),
                    Client {
                        status: ClientStatus::Lead,
                    },
                );
            }
            Operation::UpdateClientStatus(p) => {
                if let Some(client) = self.clients.get_mut(&p.client_id) {
                    client.status = p.status;
                }
            }
            Operation::BookClass(p) => {
                self.bookings.insert(
                    p.booking_id.clone(),
                    Booking { cancelled: false },
                );
            }
            Operation::CancelBooking(p) => {
                if let Some(booking) = self.bookings.get_mut(&p.booking_id) {
                    booking.cancelled = true;
                }
            }
            Operation::RecordSale(p) => {
                for line in &p.lines {
                    *self.stock.entry(line.sku.clone()).or_default() -= i64::from(line.quantity);
                }
                self.balance_cents = self.balance_cents.saturating_add(p.total_cents());
            }
            Operation::AdjustInventory(p) => {
                *self.stock.entry(p.sku.clone()).or_default() += p.delta;
            }
            Operation::StartRental(p) => {
                self.rentals.insert(
                    p.rental_id.clone(),
                    Rental {
                        equipment_id: p.equipment_id.clone(),
                        returned: false,
                    },
                );
            }
            Operation::ReturnRental(p) => {
                if let Some(rental) = self.rentals.get_mut(&p.rental_id) {
                    rental.returned = true;
                }
            }
            Operation::RecordTransaction(p) => {
                let signed = match p.direction {
                    Direction::Income => p.amount_cents,
                    Direction::Expense => -p.amount_cents,
                };
                self.balance_cents = self.balance_cents.saturating_add(signed);
            }
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            clients: self.clients.len(),
            active_clients: self
                .clients
                .values()
                .filter(|c| c.status == ClientStatus::Active)
                .count(),
            bookings: self.bookings.values().filter(|b| !b.cancelled).count(),
            open_rentals: self.rentals.values().filter(|r| !r.returned).count(),
            balance_cents: self.balance_cents,
        }
    }
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod tests;
