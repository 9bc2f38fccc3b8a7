//! The gateway tier.
//!
//! Exposes the same routes as the [server](crate::server), checks
//! everything that can be checked without the database, and forwards
//! valid requests to the server. Whatever the server answers is passed
//! back to the client unchanged.

pub mod booking_api;
pub mod client;
pub mod item_api;
pub mod request_api;
pub mod user_api;

use crate::{
    feature::info::info_api,
    infra::{
        config::GatewayConfig, middleware::with_common_layers, shutdown::shutdown_signal,
        state::GatewayState,
    },
    server::docs,
};
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;

/// Constructs the gateway application.
pub fn gateway_app(state: GatewayState, timeout: Duration) -> Router {
    let api = Router::new()
        .merge(info_api::routes())
        .merge(user_api::routes())
        .merge(item_api::routes())
        .merge(booking_api::routes())
        .merge(request_api::routes())
        .with_state(state);
    with_common_layers(api.merge(docs()), timeout)
}

/// Starts the gateway.
pub async fn run_gateway(listener: TcpListener, config: GatewayConfig) -> std::io::Result<()> {
    let state = GatewayState::new(&config.server_url);
    let app = gateway_app(state, config.request_timeout);

    tracing::info!(
        "Starting gateway on {}, forwarding to {}",
        listener.local_addr()?,
        config.server_url
    );
    let exit_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal("gateway"))
        .await;

    match &exit_result {
        Ok(_) => tracing::info!("Successfully shut down"),
        Err(e) => tracing::error!("Shutdown failed: {}", e),
    }
    exit_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{error::ErrorBody, extract::Json};
    use axum::{
        body::Body,
        extract::Query,
        http::HeaderMap,
        routing::{get, patch, post},
    };
    use chrono::{Duration as TimeDelta, Utc};
    use http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tower::ServiceExt;

    /// A gateway whose server is never reached.
    fn offline_gateway() -> Router {
        gateway_app(GatewayState::new("http://127.0.0.1:1"), Duration::from_secs(5))
    }

    /// A stand-in for the server tier that echoes what it receives.
    async fn spawn_fake_server() -> String {
        async fn echo(
            method: Method,
            headers: HeaderMap,
            Query(query): Query<HashMap<String, String>>,
            body: String,
        ) -> Json<Value> {
            let sharer = headers
                .get("x-sharer-user-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            Json(json!({
                "method": method.as_str(),
                "sharer": sharer,
                "query": query,
                "body": body,
            }))
        }
        let app = Router::new()
            .route("/users", post(echo))
            .route("/bookings", get(echo).post(echo))
            .route("/bookings/:id", patch(echo))
            .route(
                "/items/:id",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "code": 404, "status": "Not Found", "error": "item 9 not found" })),
                    )
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        sharer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(id) = sharer {
            req = req.header("X-Sharer-User-Id", id);
        }
        let req = match body {
            Some(body) => req
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn timestamp(days: i64) -> String {
        (Utc::now().naive_utc() + TimeDelta::days(days))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }

    fn error_of(value: Value) -> ErrorBody {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let body = json!({ "name": "Alice", "email": "not-an-email" });
        let (status, body) =
            send(offline_gateway(), Method::POST, "/users", None, Some(body)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("invalid field(s): email (email)", error_of(body).error());
    }

    #[tokio::test]
    async fn blank_item_name_is_rejected() {
        let body = json!({ "name": "", "description": "Drill", "available": true });
        let (status, _) =
            send(offline_gateway(), Method::POST, "/items", Some("1"), Some(body)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn item_without_availability_is_rejected() {
        let body = json!({ "name": "Drill", "description": "Drill" });
        let (status, _) =
            send(offline_gateway(), Method::POST, "/items", Some("1"), Some(body)).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn booking_ending_before_start_is_rejected() {
        let body = json!({ "itemId": 1, "start": timestamp(2), "end": timestamp(1) });
        let (status, _) =
            send(offline_gateway(), Method::POST, "/bookings", Some("2"), Some(body)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn booking_in_the_past_is_rejected() {
        let body = json!({ "itemId": 1, "start": timestamp(-2), "end": timestamp(1) });
        let (status, _) =
            send(offline_gateway(), Method::POST, "/bookings", Some("2"), Some(body)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn unknown_state_is_rejected() {
        let (status, body) = send(
            offline_gateway(),
            Method::GET,
            "/bookings?state=UNSUPPORTED_STATUS",
            Some("2"),
            None,
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("Unknown state: UNSUPPORTED_STATUS", error_of(body).error());
    }

    #[tokio::test]
    async fn negative_from_is_rejected() {
        let (status, _) = send(
            offline_gateway(),
            Method::GET,
            "/items?from=-1&size=10",
            Some("2"),
            None,
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn non_numeric_sharer_is_rejected() {
        let (status, _) =
            send(offline_gateway(), Method::GET, "/requests", Some("bob"), None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn long_request_description_is_rejected() {
        let body = json!({ "description": "x".repeat(201) });
        let (status, _) =
            send(offline_gateway(), Method::POST, "/requests", Some("1"), Some(body)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_bad_gateway() {
        let (status, _) = send(offline_gateway(), Method::GET, "/users", None, None).await;
        assert_eq!(StatusCode::BAD_GATEWAY, status);
    }

    #[tokio::test]
    async fn valid_booking_is_forwarded_with_sharer() {
        let url = spawn_fake_server().await;
        let app = gateway_app(GatewayState::new(&url), Duration::from_secs(5));
        let body = json!({ "itemId": 1, "start": timestamp(1), "end": timestamp(2) });
        let (status, echo) = send(app, Method::POST, "/bookings", Some("2"), Some(body)).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("POST", echo["method"]);
        assert_eq!("2", echo["sharer"]);
        let forwarded: Value = serde_json::from_str(echo["body"].as_str().unwrap()).unwrap();
        assert_eq!(1, forwarded["itemId"]);
    }

    #[tokio::test]
    async fn list_query_is_forwarded() {
        let url = spawn_fake_server().await;
        let app = gateway_app(GatewayState::new(&url), Duration::from_secs(5));
        let (status, echo) = send(
            app,
            Method::GET,
            "/bookings?state=PAST&from=0&size=5",
            Some("2"),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("PAST", echo["query"]["state"]);
        assert_eq!("5", echo["query"]["size"]);
    }

    #[tokio::test]
    async fn approval_flag_is_forwarded() {
        let url = spawn_fake_server().await;
        let app = gateway_app(GatewayState::new(&url), Duration::from_secs(5));
        let (status, echo) = send(
            app,
            Method::PATCH,
            "/bookings/4?approved=false",
            Some("1"),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("false", echo["query"]["approved"]);
    }

    #[tokio::test]
    async fn server_errors_are_passed_through() {
        let url = spawn_fake_server().await;
        let app = gateway_app(GatewayState::new(&url), Duration::from_secs(5));
        let (status, body) = send(app, Method::GET, "/items/9", Some("1"), None).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("item 9 not found", error_of(body).error());
    }
}
