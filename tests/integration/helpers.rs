//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use kindred_api::{AppState, build_app};
use kindred_auth::jwt::{JwtDecoder, JwtEncoder};
use kindred_core::config::AppConfig;
use kindred_core::types::{ConversationId, UserId};
use kindred_database::MemoryActivityStore;
use kindred_realtime::RealtimeEngine;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A gateway served over a real TCP listener on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub engine: RealtimeEngine,
    pub store: Arc<MemoryActivityStore>,
    encoder: JwtEncoder,
}

impl TestServer {
    /// Start a server with default configuration.
    pub async fn start() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Start a server with the given configuration.
    pub async fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryActivityStore::new());
        let engine = RealtimeEngine::new(
            config.realtime.clone(),
            config.presence.clone(),
            Arc::new(JwtDecoder::new(&config.auth)),
            store.clone(),
        );
        let encoder = JwtEncoder::new(&config.auth);
        let app = build_app(AppState::new(Arc::new(config), engine.clone(), None));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            addr,
            engine,
            store,
            encoder,
        }
    }

    /// Mint an access token for a user.
    pub fn token(&self, user_id: UserId) -> String {
        self.encoder
            .issue_access_token(user_id)
            .expect("Failed to issue token")
    }

    /// Register a conversation with the given participants.
    pub fn conversation(&self, members: &[UserId]) -> ConversationId {
        let conversation_id = ConversationId::new();
        self.store.add_conversation(conversation_id, members.to_vec());
        conversation_id
    }

    /// Open an unauthenticated socket.
    pub async fn connect(&self) -> WsClient {
        self.connect_url(format!("ws://{}/ws", self.addr))
            .await
            .expect("WebSocket upgrade failed")
    }

    /// Open a socket authenticated through the query token, consuming the
    /// `authenticated` ack and the user's own `status.changed`.
    pub async fn connect_as(&self, user_id: UserId) -> WsClient {
        let url = format!("ws://{}/ws?token={}", self.addr, self.token(user_id));
        let mut client = self.connect_url(url).await.expect("WebSocket upgrade failed");
        let ack = client.expect("authenticated").await;
        assert_eq!(ack["user_id"], user_id.to_string());
        let status = client.expect("status.changed").await;
        assert_eq!(status["user_id"], user_id.to_string());
        client
    }

    pub async fn connect_url(
        &self,
        url: String,
    ) -> Result<WsClient, tokio_tungstenite::tungstenite::Error> {
        let (stream, _) = connect_async(url).await?;
        Ok(WsClient { stream })
    }
}

/// A WebSocket client speaking the gateway's JSON protocol.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send one client event.
    pub async fn send(&mut self, event: Value) {
        self.stream
            .send(Message::text(event.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Next server event (`data` of the envelope), skipping control frames.
    pub async fn next_event(&mut self) -> Option<Value> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .ok()??;
            match frame.ok()? {
                Message::Text(text) => {
                    let envelope: Value =
                        serde_json::from_str(text.as_str()).expect("Envelope is not JSON");
                    return Some(envelope["data"].clone());
                }
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Next server event, asserting its type.
    pub async fn expect(&mut self, event_type: &str) -> Value {
        let event = self
            .next_event()
            .await
            .unwrap_or_else(|| panic!("Connection ended while waiting for {event_type}"));
        assert_eq!(event["type"], event_type, "unexpected event: {event}");
        event
    }

    /// Close the socket from the client side.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
