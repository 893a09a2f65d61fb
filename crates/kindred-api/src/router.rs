//! Route definitions for the Kindred HTTP API.
//!
//! The WebSocket upgrade lives at `/ws`; everything else is mounted under
//! `/api`.

use axum::Router;
use axum::routing::get;

use crate::handlers;
use crate::state::AppState;

/// Build the router and thread `AppState` through every route.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(presence_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_handler))
        .with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

fn presence_routes() -> Router<AppState> {
    Router::new()
        .route("/presence", get(handlers::presence::bulk_presence))
        .route("/presence/{user_id}", get(handlers::presence::user_presence))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    use kindred_core::config::AppConfig;
    use kindred_core::error::AppError;
    use kindred_core::result::AppResult;
    use kindred_core::traits::CredentialVerifier;
    use kindred_core::types::UserId;
    use kindred_database::MemoryActivityStore;
    use kindred_realtime::RealtimeEngine;

    use super::*;

    #[derive(Debug)]
    struct UuidVerifier;

    #[async_trait]
    impl CredentialVerifier for UuidVerifier {
        async fn verify(&self, credential: &str) -> AppResult<UserId> {
            credential
                .parse()
                .map_err(|_| AppError::authentication("bad token"))
        }
    }

    fn test_state() -> AppState {
        let config = AppConfig::default();
        let engine = RealtimeEngine::new(
            config.realtime.clone(),
            config.presence.clone(),
            Arc::new(UuidVerifier),
            Arc::new(MemoryActivityStore::new()),
        );
        AppState::new(Arc::new(config), engine, None)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_gateway_counts() {
        let state = test_state();
        let (_conn, _rx) = state.realtime.gateway.open_connection();

        let (status, body) = get_json(build_router(state), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["ws_connections"], 1);
        assert_eq!(body["data"]["online_users"], 0);
        assert_eq!(body["data"]["metrics"]["connections_opened"], 1);
    }

    #[tokio::test]
    async fn test_health_without_database_reports_disabled() {
        let (status, body) = get_json(build_router(test_state()), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["database"], "disabled");
    }

    #[tokio::test]
    async fn test_bulk_presence_reports_online_users() {
        let state = test_state();
        let online = UserId::new();
        let offline = UserId::new();
        let (conn, _rx) = state.realtime.gateway.open_connection();
        state
            .realtime
            .gateway
            .authenticate(conn.id, &online.to_string())
            .await
            .unwrap();

        let uri = format!("/api/presence?user_ids={online},{offline}");
        let (status, body) = get_json(build_router(state), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["users"][online.to_string()], true);
        assert_eq!(body["data"]["users"][offline.to_string()], false);
    }

    #[tokio::test]
    async fn test_bulk_presence_rejects_bad_ids() {
        let (status, body) =
            get_json(build_router(test_state()), "/api/presence?user_ids=nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_single_user_presence() {
        let user = UserId::new();
        let uri = format!("/api/presence/{user}");
        let (status, body) = get_json(build_router(test_state()), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user_id"], user.to_string());
        assert_eq!(body["data"]["is_online"], false);
    }
}
