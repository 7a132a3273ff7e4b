//! Live session log stream over WebSocket.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use anivps_entity::log::SessionLogEntry;

use crate::error::ApiError;
use crate::extractors::auth::authenticate;
use crate::state::AppState;

/// Query parameter for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// JWT access token.
    pub token: String,
}

/// GET /api/sessions/{id}/logs/stream?token={jwt}
pub async fn log_stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    // Authenticate and authorize before upgrade
    let ctx = authenticate(&state.jwt_decoder, query.token.trim())?;
    let receiver = state.session_service.subscribe_logs(&ctx, id).await?;

    info!(session_id = %id, user_id = %ctx.user_id, "Log stream opened");
    Ok(ws.on_upgrade(move |socket| forward_logs(id, receiver, socket)))
}

/// Pushes each appended entry as a JSON text frame until either side
/// goes away.
async fn forward_logs(
    session_id: Uuid,
    mut receiver: broadcast::Receiver<SessionLogEntry>,
    socket: WebSocket,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            entry = receiver.recv() => match entry {
                Ok(entry) => {
                    let text = match serde_json::to_string(&entry) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(
                                session_id = %session_id,
                                error = %e,
                                "Failed to encode log entry"
                            );
                            continue;
                        }
                    };
                    if ws_tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(session_id = %session_id, skipped, "Log stream subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(session_id = %session_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
        }
    }

    let _ = ws_tx.close().await;
    info!(session_id = %session_id, "Log stream closed");
}
