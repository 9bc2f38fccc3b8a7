//! The HTTP client the gateway uses to reach the server tier.
//!
//! Calls go through [`LogClient`], a [`tower::Service`] wrapping
//! [`reqwest::Client`] that logs every forwarded request and its outcome.
//! Responses from the server are handed back to the caller as they are.

use crate::infra::{
    error::{ApiError, ApiResult, InternalError},
    security::{Sharer, X_SHARER_USER_ID},
};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode};
use reqwest::{Client, Request, RequestBuilder};
use serde::Serialize;
use std::task::{Context, Poll};
use tower::{Service, ServiceExt};

/// A response from the server tier, passed on verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerResponse {
    status: StatusCode,
    content_type: Option<HeaderValue>,
    body: Bytes,
}

impl ServerResponse {
    /// The status the server answered with.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl IntoResponse for ServerResponse {
    fn into_response(self) -> axum::response::Response {
        let mut res = (self.status, self.body).into_response();
        match self.content_type {
            Some(content_type) => {
                res.headers_mut().insert(CONTENT_TYPE, content_type);
            }
            None => {
                res.headers_mut().remove(CONTENT_TYPE);
            }
        }
        res
    }
}

/// A HTTP client wrapper that logs requests and responses.
#[derive(Clone, Debug)]
pub struct LogClient(Client);

impl LogClient {
    /// Wraps a client.
    pub fn new(client: Client) -> Self {
        Self(client)
    }

    /// Sends a logged HTTP request.
    pub async fn send(&mut self, request: Request) -> ApiResult<ServerResponse> {
        self.ready().await?.call(request).await
    }
}

impl Service<Request> for LogClient {
    type Response = ServerResponse;
    type Error = ApiError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let into_api_error = |e| ApiError::InternalError(InternalError::ReqwestError(e));
        self.0.poll_ready(cx).map_err(into_api_error)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mut client = self.0.clone();
        Box::pin(async move {
            tracing::info!("Forwarding request: {} {}", req.method(), req.url());
            if let Some(bytes) = req.body().and_then(|b| b.as_bytes()) {
                tracing::debug!("Request body: {:?}", String::from_utf8_lossy(bytes));
            }
            let res = client
                .call(req)
                .await
                .map_err(InternalError::ReqwestError)?;
            let status = res.status();
            let content_type = res.headers().get(CONTENT_TYPE).cloned();
            let body = res.bytes().await.map_err(InternalError::ReqwestError)?;
            if status.is_server_error() {
                tracing::error!("Server answered: {}", status);
            } else if status.is_client_error() {
                tracing::warn!("Server answered: {}", status);
            } else {
                tracing::info!("Server answered: {}", status);
            }
            if !body.is_empty() {
                tracing::debug!("Response body: {:?}", String::from_utf8_lossy(&body));
            }
            Ok(ServerResponse {
                status,
                content_type,
                body,
            })
        })
    }
}

/// A client for the server tier, rooted at its base URL.
#[derive(Clone, Debug)]
pub struct ServerClient {
    client: Client,
    base_url: String,
}

impl ServerClient {
    /// Creates a client calling the server at `base_url`.
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Starts a request to `path` on the server.
    pub fn request(&self, method: Method, path: impl std::fmt::Display) -> Forward {
        let url = format!("{}{}", self.base_url, path);
        Forward {
            client: LogClient::new(self.client.clone()),
            builder: self.client.request(method, url),
        }
    }
}

/// A request to the server tier that is being built.
#[derive(Debug)]
pub struct Forward {
    client: LogClient,
    builder: RequestBuilder,
}

impl Forward {
    /// Acts on behalf of `sharer`.
    pub fn sharer(mut self, sharer: Sharer) -> Self {
        self.builder = self.builder.header(&X_SHARER_USER_ID, sharer.id());
        self
    }

    /// Adds query parameters.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    /// Sends `body` as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    /// Sends the request and waits for the server's response.
    pub async fn send(mut self) -> ApiResult<ServerResponse> {
        let request = self.builder.build()?;
        self.client.send(request).await
    }
}
