//! WebSocket streaming API for the admin dashboard.
//!
//! Clients connect to `/streaming`, authenticate with the admin token and send
//! `{"type":"joinAdmin"}` to start receiving registration events.

#![allow(missing_docs)]

use async_trait::async_trait;
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use mwb_common::{AppError, AppResult};
use mwb_core::{AdminEvent, EventPublisher, RegistrationSummary};
use mwb_db::entities::registration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::middleware::{AppState, bearer_token};

const ADMIN_CHANNEL_CAPACITY: usize = 256;

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Admin token, for clients that cannot set headers on a WebSocket upgrade.
    #[serde(rename = "i")]
    pub token: Option<String>,
}

/// Client-to-server message.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Start receiving admin events.
    JoinAdmin,
    /// Stop receiving admin events.
    LeaveAdmin,
}

/// Server-to-client acknowledgement.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Joined { room: &'static str },
    Left { room: &'static str },
}

/// Shared state for streaming.
#[derive(Clone)]
pub struct StreamingState {
    /// Broadcast sender for the admin room.
    pub admin_tx: Arc<broadcast::Sender<AdminEvent>>,
}

impl StreamingState {
    /// Create a new streaming state.
    #[must_use]
    pub fn new() -> Self {
        let (admin_tx, _) = broadcast::channel(ADMIN_CHANNEL_CAPACITY);
        Self {
            admin_tx: Arc::new(admin_tx),
        }
    }

    /// Subscribe to the admin room.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AdminEvent> {
        self.admin_tx.subscribe()
    }

    /// Push an event to every connected admin.
    pub fn publish(&self, event: AdminEvent) {
        // Sending fails only when nobody is listening.
        let _ = self.admin_tx.send(event);
    }
}

impl Default for StreamingState {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for StreamingState {
    async fn publish_new_registration(&self, registration: &registration::Model) -> AppResult<()> {
        self.publish(AdminEvent::NewRegistration(RegistrationSummary::from(
            registration,
        )));
        Ok(())
    }

    async fn publish_payment_status_updated(
        &self,
        registration: &registration::Model,
    ) -> AppResult<()> {
        self.publish(AdminEvent::PaymentStatusUpdated(RegistrationSummary::from(
            registration,
        )));
        Ok(())
    }

    async fn publish_registration_updated(
        &self,
        registration: &registration::Model,
    ) -> AppResult<()> {
        self.publish(AdminEvent::RegistrationUpdated(RegistrationSummary::from(
            registration,
        )));
        Ok(())
    }
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let token = query.token.as_deref().or_else(|| bearer_token(&headers));
    if !token.is_some_and(|t| state.is_admin_token(t)) {
        warn!("Rejected streaming connection without admin token");
        return Err(AppError::Unauthorized);
    }

    info!("New admin streaming connection");
    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state.streaming))
        .into_response())
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, streaming: StreamingState) {
    let (mut sender, mut receiver) = socket.split();
    let mut admin_rx = streaming.subscribe();
    let mut joined = false;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => handle_client_message(client_msg, &mut joined),
                            Err(e) => {
                                warn!("Failed to parse client message: {}", e);
                                continue;
                            }
                        };
                        let json = serde_json::to_string(&reply).unwrap_or_default();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("Client closed connection");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            event = admin_rx.recv() => {
                match event {
                    Ok(event) if joined => {
                        let json = serde_json::to_string(&event).unwrap_or_default();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Admin stream lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Streaming connection closed");
}

fn handle_client_message(msg: ClientMessage, joined: &mut bool) -> ServerMessage {
    match msg {
        ClientMessage::JoinAdmin => {
            *joined = true;
            debug!("Client joined admin room");
            ServerMessage::Joined { room: "admin" }
        }
        ClientMessage::LeaveAdmin => {
            *joined = false;
            debug!("Client left admin room");
            ServerMessage::Left { room: "admin" }
        }
    }
}
