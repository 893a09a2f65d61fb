//! WebSocket upgrade handler.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use kindred_core::error::AppError;
use kindred_realtime::connection::{ConnectionHandle, OutboundReceiver};
use kindred_realtime::message::{ClientEvent, Envelope};

use crate::dto::request::WsQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /ws[?token={jwt}]: WebSocket upgrade
///
/// The socket starts unauthenticated; a query token, when allowed, is
/// presented to the gateway right after the upgrade.
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    if query.token.is_some() && !state.realtime.config.allow_query_token {
        return Err(AppError::validation("Query token authentication is disabled").into());
    }

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, query.token, socket)))
}

/// Drives an established WebSocket until either side closes it.
async fn handle_ws_connection(state: AppState, token: Option<String>, socket: WebSocket) {
    let gateway = state.realtime.gateway.clone();
    let (handle, outbound_rx) = gateway.open_connection();
    let conn_id = handle.id;
    let (ws_tx, mut ws_rx) = socket.split();

    info!(conn_id = %conn_id, "WebSocket connection established");

    let ping_every = Duration::from_secs(state.realtime.config.ping_interval_seconds);
    let writer = tokio::spawn(forward_outbound(
        handle.clone(),
        outbound_rx,
        ws_tx,
        ping_every,
    ));

    if let Some(token) = token {
        let event = ClientEvent::Authenticate { token };
        if let Err(err) = gateway.handle_event(conn_id, event).await {
            debug!(conn_id = %conn_id, code = err.code(), "Query token rejected");
            let _ = handle.send(Arc::new(Envelope::direct(err.to_event())));
        }
    }

    let closed = handle.close_signal();
    loop {
        tokio::select! {
            _ = closed.cancelled() => break,
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    gateway.handle_frame(conn_id, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Pings are answered by axum; binary frames are not part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    let user_id = gateway.disconnect(conn_id);
    let _ = writer.await;

    info!(conn_id = %conn_id, user_id = ?user_id, "WebSocket connection closed");
}

/// Writes queued envelopes and keepalive pings until the connection is
/// closed or a write fails.
async fn forward_outbound(
    handle: Arc<ConnectionHandle>,
    mut outbound_rx: OutboundReceiver,
    mut ws_tx: SplitSink<WebSocket, Message>,
    ping_every: Duration,
) {
    let closed = handle.close_signal();
    let mut ping = tokio::time::interval(ping_every);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ping.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = closed.cancelled() => break,
            envelope = outbound_rx.recv() => {
                let Some(envelope) = envelope else { break };
                let text = match serde_json::to_string(envelope.as_ref()) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(conn_id = %handle.id, error = %e, "Failed to encode envelope");
                        continue;
                    }
                };
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    // Wakes the reader loop when the write side failed first.
    handle.mark_dead();
    let _ = ws_tx.send(Message::Close(None)).await;
}
