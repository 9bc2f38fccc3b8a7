//! Middleware for modifying requests and responses.

use super::error::{ApiError, ClientError, InternalError, PanicHandler};
use axum::{
    body::{Body, HttpBody},
    error_handling::HandleErrorLayer,
    middleware::Next,
    response::IntoResponse,
    Router,
};
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use std::time::Duration;
use tower::{timeout::error::Elapsed, BoxError, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, MakeSpan, TraceLayer},
};
use tracing::Level;

use super::security::X_SHARER_USER_ID;

static X_REQUEST_ID: &str = "x-request-id";

/// The maximum size of a body to log.
const MAX_BODY_SIZE: u64 = 8192;

#[derive(Clone)]
pub(crate) struct MakeRequestIdSpan;

impl<B> MakeSpan<B> for MakeRequestIdSpan {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|id| id.to_str().ok())
            .unwrap_or("unknown");
        let sharer = request
            .headers()
            .get(&X_SHARER_USER_ID)
            .and_then(|id| id.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "request",
            request_id = request_id,
            sharer = sharer,
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
        )
    }
}

/// Wraps a router in the layers both tiers share.
pub(crate) fn with_common_layers(router: Router, timeout: Duration) -> Router {
    // Fallible middleware from tower, mapped to infallible response with [`HandleErrorLayer`].
    let tower_middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .concurrency_limit(500)
        .timeout(timeout);

    router
        .layer(axum::middleware::from_fn(log_request_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestIdSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(tower_middleware)
        .layer(CatchPanicLayer::custom(PanicHandler))
}

/// Turns errors from the tower layers into error responses.
async fn handle_middleware_error(e: BoxError) -> ApiError {
    if e.is::<Elapsed>() {
        ClientError::Custom(StatusCode::REQUEST_TIMEOUT, "request timed out".to_string()).into()
    } else {
        InternalError::Other(format!("Tower middleware failed: {e}")).into()
    }
}

/// Log small request and response bodies.
pub(crate) async fn log_request_response(
    req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let (parts, body) = req.into_parts();
    let req = if is_loggable(&body) {
        let bytes = buffer_and_print("Request", body).await?;
        Request::from_parts(parts, Body::from(bytes))
    } else {
        Request::from_parts(parts, body)
    };

    let res = next.run(req).await;

    let (parts, body) = res.into_parts();
    let res = if is_loggable(&body) {
        let bytes = buffer_and_print("Response", body).await?;
        Response::from_parts(parts, Body::from(bytes))
    } else {
        Response::from_parts(parts, body)
    };
    Ok(res)
}

fn is_loggable(body: &Body) -> bool {
    matches!(body.size_hint().upper(), Some(n) if n <= MAX_BODY_SIZE)
}

/// Read the entire body stream and store it in memory.
async fn buffer_and_print(direction: &str, body: Body) -> Result<Bytes, ApiError> {
    let body = body
        .collect()
        .await
        .map_err(|e| ClientError::BadRequest(format!("failed to read body: {e}")))?
        .to_bytes();

    if !body.is_empty() {
        if let Ok(body) = std::str::from_utf8(&body) {
            tracing::debug!("{} body = {:?}", direction, body);
        }
    }

    Ok(body)
}
