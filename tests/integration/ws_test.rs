//! Integration tests for the WebSocket gateway over a real socket.

mod helpers;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use kindred_core::config::AppConfig;
use kindred_core::types::UserId;
use kindred_realtime::message::ChatMessage;

use helpers::TestServer;

#[tokio::test]
async fn test_query_token_announces_presence_to_peers() {
    let server = TestServer::start().await;
    let alice = UserId::new();
    let bob = UserId::new();

    let mut alice_ws = server.connect_as(alice).await;
    let _bob_ws = server.connect_as(bob).await;

    let status = alice_ws.expect("status.changed").await;
    assert_eq!(status["user_id"], bob.to_string());
    assert_eq!(status["is_online"], true);
    assert!(server.engine.gateway.is_online(bob));
}

#[tokio::test]
async fn test_in_band_authenticate_can_retry_after_failure() {
    let server = TestServer::start().await;
    let user = UserId::new();
    let mut ws = server.connect().await;

    ws.send(json!({"type": "authenticate", "token": "garbage"})).await;
    let error = ws.expect("error").await;
    assert_eq!(error["code"], "AUTHENTICATION_FAILED");
    assert!(!server.engine.gateway.is_online(user));

    ws.send(json!({"type": "authenticate", "token": server.token(user)}))
        .await;
    let ack = ws.expect("authenticated").await;
    assert_eq!(ack["user_id"], user.to_string());
    ws.expect("status.changed").await;
}

#[tokio::test]
async fn test_bad_query_token_leaves_socket_open() {
    let server = TestServer::start().await;
    let url = format!("ws://{}/ws?token=garbage", server.addr);
    let mut ws = server.connect_url(url).await.unwrap();

    let error = ws.expect("error").await;
    assert_eq!(error["code"], "AUTHENTICATION_FAILED");

    ws.send(json!({"type": "heartbeat"})).await;
    let error = ws.expect("error").await;
    assert_eq!(error["code"], "NOT_AUTHENTICATED");
}

#[tokio::test]
async fn test_query_token_rejected_when_disabled() {
    let mut config = AppConfig::default();
    config.realtime.allow_query_token = false;
    let server = TestServer::with_config(config).await;

    let url = format!("ws://{}/ws?token={}", server.addr, server.token(UserId::new()));
    assert!(server.connect_url(url).await.is_err());
}

#[tokio::test]
async fn test_unauthenticated_join_rejected() {
    let server = TestServer::start().await;
    let conversation_id = server.conversation(&[UserId::new()]);
    let mut ws = server.connect().await;

    ws.send(json!({"type": "join_conversation", "conversation_id": conversation_id}))
        .await;
    let error = ws.expect("error").await;
    assert_eq!(error["code"], "NOT_AUTHENTICATED");
}

#[tokio::test]
async fn test_join_requires_participation() {
    let server = TestServer::start().await;
    let user = UserId::new();
    let conversation_id = server.conversation(&[UserId::new()]);
    let mut ws = server.connect_as(user).await;

    ws.send(json!({"type": "join_conversation", "conversation_id": conversation_id}))
        .await;
    let error = ws.expect("error").await;
    assert_eq!(error["code"], "UNKNOWN_ROOM_TARGET");
}

#[tokio::test]
async fn test_conversation_typing_and_messages() {
    let server = TestServer::start().await;
    let alice = UserId::new();
    let bob = UserId::new();
    let conversation_id = server.conversation(&[alice, bob]);

    let mut alice_ws = server.connect_as(alice).await;
    let mut bob_ws = server.connect_as(bob).await;
    alice_ws.expect("status.changed").await;

    for ws in [&mut alice_ws, &mut bob_ws] {
        ws.send(json!({"type": "join_conversation", "conversation_id": conversation_id}))
            .await;
        let joined = ws.expect("conversation.joined").await;
        assert_eq!(joined["conversation_id"], conversation_id.to_string());
    }

    alice_ws
        .send(json!({
            "type": "typing",
            "conversation_id": conversation_id,
            "is_typing": true,
        }))
        .await;
    let typing = bob_ws.expect("typing.changed").await;
    assert_eq!(typing["user_id"], alice.to_string());
    assert_eq!(typing["is_typing"], true);

    // The sender's next event is its heartbeat ack, not its own typing echo.
    alice_ws.send(json!({"type": "heartbeat"})).await;
    alice_ws.expect("heartbeat.ack").await;

    let message = ChatMessage {
        id: Uuid::new_v4(),
        conversation_id,
        sender_id: alice,
        body: "hello".to_string(),
        sent_at: Utc::now(),
        attachments: None,
    };
    let report = server
        .engine
        .gateway
        .deliver_message(conversation_id, message)
        .unwrap();
    assert_eq!(report.delivered, 2);

    for ws in [&mut alice_ws, &mut bob_ws] {
        let event = ws.expect("message.new").await;
        assert_eq!(event["body"], "hello");
        assert_eq!(event["sender_id"], alice.to_string());
    }
}

#[tokio::test]
async fn test_closing_last_socket_announces_offline() {
    let server = TestServer::start().await;
    let alice = UserId::new();
    let bob = UserId::new();

    let mut alice_ws = server.connect_as(alice).await;
    let bob_ws = server.connect_as(bob).await;
    alice_ws.expect("status.changed").await;

    bob_ws.close().await;

    let status = alice_ws.expect("status.changed").await;
    assert_eq!(status["user_id"], bob.to_string());
    assert_eq!(status["is_online"], false);
    assert!(server.engine.gateway.connections_for(bob).is_empty());
}
