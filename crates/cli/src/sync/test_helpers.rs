// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use tack_core::op::{AdjustInventory, BookClass};
use tack_core::protocol::{ClientMessage, ServerMessage};
use tack_core::{Notification, Operation, PendingOperation};
use tokio::sync::{Notify, Semaphore};

use super::connectivity::UpdateActivator;
use super::notify::Notifier;
use super::replay::{ReplayError, ReplayFuture, ReplayOutcome, Replayer};
use super::transport::{Transport, TransportError, TransportFuture};
use crate::error::{Error, Result};

/// Inventory correction keyed by `sku`.
pub fn adjust(sku: &str) -> Operation {
    Operation::AdjustInventory(AdjustInventory {
        sku: sku.to_string(),
        delta: 1,
        reason: None,
    })
}

/// Class booking for `client_id`, which carries a client notification.
pub fn booking(booking_id: &str, client_id: &str) -> Operation {
    Operation::BookClass(BookClass {
        booking_id: booking_id.to_string(),
        class_id: "foil-intro".to_string(),
        client_id: client_id.to_string(),
        starts_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
    })
}

/// Mock transport for testing without real sockets.
#[derive(Default)]
pub struct MockTransport {
    connected: bool,
    /// Messages returned by recv(), in order.
    incoming: Arc<Mutex<VecDeque<ServerMessage>>>,
    /// Messages passed to send().
    outgoing: Arc<Mutex<Vec<ClientMessage>>>,
    connect_should_fail: bool,
    send_should_fail: bool,
    /// Never answer recv() once the queue is drained.
    stall_when_empty: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_incoming(&self, msg: ServerMessage) {
        self.incoming.lock().unwrap().push_back(msg);
    }

    pub fn outgoing(&self) -> Arc<Mutex<Vec<ClientMessage>>> {
        Arc::clone(&self.outgoing)
    }

    pub fn set_connect_fail(&mut self, fail: bool) {
        self.connect_should_fail = fail;
    }

    pub fn set_send_fail(&mut self, fail: bool) {
        self.send_should_fail = fail;
    }

    pub fn set_stall_when_empty(&mut self, stall: bool) {
        self.stall_when_empty = stall;
    }
}

impl Transport for MockTransport {
    fn connect<'a>(&'a mut self, _url: &'a str) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            if self.connect_should_fail {
                return Err(TransportError::ConnectionFailed("mock failure".into()));
            }
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if self.send_should_fail {
                self.connected = false;
                return Err(TransportError::SendFailed("mock failure".into()));
            }
            self.outgoing.lock().unwrap().push(msg);
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            let msg = self.incoming.lock().unwrap().pop_front();
            if msg.is_none() && self.stall_when_empty {
                std::future::pending::<()>().await;
            }
            Ok(msg)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Scripted replayer. Operations succeed unless their natural key has a
/// scripted failure.
#[derive(Clone)]
pub struct MockReplayer {
    script: Arc<Mutex<HashMap<String, ReplayError>>>,
    calls: Arc<Mutex<Vec<String>>>,
    runs_ended: Arc<Mutex<usize>>,
    gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
    entered: Arc<Notify>,
}

impl Default for MockReplayer {
    fn default() -> Self {
        MockReplayer {
            script: Arc::default(),
            calls: Arc::default(),
            runs_ended: Arc::default(),
            gate: Arc::default(),
            entered: Arc::new(Notify::new()),
        }
    }
}

impl MockReplayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every replay of `key` fail with `error`.
    pub fn fail(&self, key: &str, error: ReplayError) {
        self.script.lock().unwrap().insert(key.to_string(), error);
    }

    /// Makes replays of `key` succeed again.
    pub fn heal(&self, key: &str) {
        self.script.lock().unwrap().remove(key);
    }

    /// Natural keys replayed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times a run ended.
    pub fn runs_ended(&self) -> usize {
        *self.runs_ended.lock().unwrap()
    }

    /// Blocks replays until the returned semaphore gets permits.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Resolves once a replay has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }
}

impl Replayer for MockReplayer {
    fn replay<'a>(&'a mut self, op: &'a PendingOperation) -> ReplayFuture<'a> {
        Box::pin(async move {
            let key = op.operation.natural_key().to_string();
            self.calls.lock().unwrap().push(key.clone());
            self.entered.notify_one();

            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }

            match self.script.lock().unwrap().get(&key) {
                Some(error) => Err(error.clone()),
                None => Ok(ReplayOutcome::Applied),
            }
        })
    }

    fn end_run(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        *self.runs_ended.lock().unwrap() += 1;
        Box::pin(async {})
    }
}

/// Records notifications; optionally fails every send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        RecordingNotifier {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, note: &Notification) -> Result<()> {
        self.sent.lock().unwrap().push(note.clone());
        if self.failing {
            return Err(Error::Io(std::io::Error::other("sms gateway down")));
        }
        Ok(())
    }
}

/// Records activations instead of restarting.
#[derive(Clone, Default)]
pub struct RecordingActivator {
    activations: Arc<Mutex<Vec<String>>>,
}

impl RecordingActivator {
    pub fn activations(&self) -> Vec<String> {
        self.activations.lock().unwrap().clone()
    }
}

impl UpdateActivator for RecordingActivator {
    fn activate(&self, version: &str) -> Result<()> {
        self.activations.lock().unwrap().push(version.to_string());
        Ok(())
    }
}
