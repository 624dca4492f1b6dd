// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Each connection is served by its own task. Replays are answered in the
//! order they arrive.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

use tack_core::protocol::{ClientMessage, ServerMessage};

use crate::state::{Outcome, ServerState};

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);
    serve(listener, state).await?;
    Ok(())
}

/// Accepts connections until the listener fails.
pub(crate) async fn serve(listener: TcpListener, state: ServerState) -> std::io::Result<()> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                debug!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = handle_client_message(&text, &state).await;
                let json = response.to_json()?;
                ws_sink.send(Message::Text(json.into())).await?;
            }
            Ok(Message::Close(_)) => {
                info!("Client {} disconnected", peer_addr);
                break;
            }
            Ok(Message::Ping(data)) => {
                ws_sink.send(Message::Pong(data)).await?;
            }
            Ok(_) => {
                // Ignore other message types (Binary, Pong, Frame)
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Process a client message and return the response.
pub(crate) async fn handle_client_message(text: &str, state: &ServerState) -> ServerMessage {
    let msg = match ClientMessage::from_json(text) {
        Ok(msg) => msg,
        Err(e) => return ServerMessage::error(format!("malformed message: {e}")),
    };

    match msg {
        ClientMessage::Replay { id, operation } => {
            let kind = operation.kind();
            match state.replay(id, operation).await {
                Ok(Outcome::Applied) => {
                    debug!(%id, kind, "applied");
                    let summary = state.summary().await;
                    debug!(
                        clients = summary.clients,
                        active_clients = summary.active_clients,
                        bookings = summary.bookings,
                        open_rentals = summary.open_rentals,
                        balance_cents = summary.balance_cents,
                        "projection"
                    );
                    ServerMessage::applied(id)
                }
                Ok(Outcome::Duplicate) => {
                    debug!(%id, kind, "duplicate");
                    ServerMessage::duplicate(id)
                }
                Ok(Outcome::Rejected(reason)) => {
                    info!(%id, kind, %reason, "rejected");
                    ServerMessage::rejected(id, reason)
                }
                // Storage trouble is transient from the client's point of view
                Err(e) => {
                    error!(%id, error = %e, "could not record operation");
                    ServerMessage::error(e.to_string())
                }
            }
        }

        ClientMessage::Ping { id } => {
            debug!("Ping received: {}", id);
            ServerMessage::pong(id)
        }
    }
}
