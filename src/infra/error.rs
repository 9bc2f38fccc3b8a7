//! Types for reporting errors that happened during a request.
//!
//! If your function interacts with the database or validates user input,
//! you likely want to return a [`ApiResult`].

use super::extract::Json;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::IntoResponse,
};
use http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::ResponseForPanic;
use utoipa::ToSchema;

/// A standard error response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// The numeric HTTP status.
    #[schema(example = 404)]
    code: u16,
    /// A short name for the kind of error.
    #[schema(example = "Not Found")]
    status: String,
    /// A description of the error.
    #[schema(example = "item 1 not found")]
    error: String,
}

impl ErrorBody {
    pub(crate) fn new(status: StatusCode, error: String) -> Self {
        Self {
            code: status.as_u16(),
            status: status.canonical_reason().unwrap_or("Unknown").to_string(),
            error,
        }
    }

    /// The numeric HTTP status.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The kind of error.
    pub fn status(&self) -> &str {
        self.status.as_ref()
    }

    /// The error message.
    pub fn error(&self) -> &str {
        self.error.as_ref()
    }
}

/// An error from our API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An error caused by the client.
    #[error("{0}")]
    ClientError(#[from] ClientError),
    /// An internal error.
    #[error("{0}")]
    InternalError(#[from] InternalError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::ClientError(e) => {
                tracing::warn!("client error: {}", e);
                e.into_response()
            }
            ApiError::InternalError(e) => {
                tracing::error!("internal error: {}", e);
                e.into_response()
            }
        }
    }
}

/// The result of calling API-related functions.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => {
                ApiError::ClientError(ClientError::NotFound("not found".to_string()))
            }
            sqlx::Error::Database(e) if e.constraint().is_some() => {
                let constraint = e.constraint().unwrap_or_default().to_string();
                ApiError::ClientError(ClientError::Conflict(format!(
                    "constraint {constraint} violated"
                )))
            }
            e => ApiError::InternalError(InternalError::SqlxError(e)),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::InternalError(InternalError::ReqwestError(e))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut invalid_fields = String::new();
        for (k, v) in e.field_errors() {
            let mut codes = String::new();
            for e in v {
                codes += &format!("{},", e.code);
            }
            let codes = codes.trim_end_matches(',');
            invalid_fields += &format!("{k} ({codes}),");
        }
        let invalid_fields = invalid_fields.trim_end_matches(',');
        ApiError::ClientError(ClientError::Validation(format!(
            "invalid field(s): {invalid_fields}"
        )))
    }
}

/// Errors caused by the client.
/// The client can do something to fix these.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Some illegal operation was attempted.
    #[error("{0}")]
    BadRequest(String),
    /// The resource was not found, or the caller may not see it.
    #[error("{0}")]
    NotFound(String),
    /// The resource already exists.
    #[error("{0}")]
    Conflict(String),
    /// A booking state filter that we do not recognize.
    #[error("Unknown state: {0}")]
    UnsupportedState(String),
    /// Input validation failed.
    #[error("{0}")]
    Validation(String),
    /// Custom error.
    #[error("{1}")]
    Custom(StatusCode, String),
}

impl ClientError {
    /// The status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnsupportedState(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Custom(status, _) => *status,
        }
    }
}

impl Default for ClientError {
    fn default() -> Self {
        Self::BadRequest("Bad Request".to_string())
    }
}

impl From<JsonRejection> for ClientError {
    fn from(value: JsonRejection) -> Self {
        match value {
            JsonRejection::MissingJsonContentType(e) => {
                ClientError::Custom(e.status(), e.body_text())
            }
            e => ClientError::BadRequest(e.body_text()),
        }
    }
}

impl From<QueryRejection> for ClientError {
    fn from(value: QueryRejection) -> Self {
        ClientError::BadRequest(value.body_text())
    }
}

impl From<PathRejection> for ClientError {
    fn from(value: PathRejection) -> Self {
        ClientError::Custom(value.status(), value.body_text())
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        (status, Json(ErrorBody::new(status, self.to_string()))).into_response()
    }
}

/// An internal error.
/// The client cannot do anything about this.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    /// An [`sqlx`] error.
    #[error("{0}")]
    SqlxError(#[from] sqlx::Error),
    /// Reqwest-call failed.
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    /// Other miscellaneous errors.
    #[error("{0}")]
    Other(String),
}

impl IntoResponse for InternalError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            Self::SqlxError(_) => StatusCode::BAD_GATEWAY,
            Self::ReqwestError(ref e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::ReqwestError(ref e) if e.is_connect() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut response =
            (status, Json(ErrorBody::new(status, "internal error".to_string()))).into_response();
        response
            .headers_mut()
            .insert("Retry-After", HeaderValue::from_static("5"));
        response
    }
}

/// A handler for converting panics into proper responses for the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanicHandler;

impl ResponseForPanic for PanicHandler {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(
        &mut self,
        _: Box<dyn std::any::Any + Send + 'static>,
    ) -> http::Response<Self::ResponseBody> {
        ApiError::InternalError(InternalError::Other("Panic".to_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use validator::Validate;

    async fn body_of(error: ApiError) -> (StatusCode, ErrorBody) {
        let res = error.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_has_code_status_and_error() {
        let (status, body) =
            body_of(ClientError::NotFound("booking 7 not found".to_string()).into()).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!(404, body.code());
        assert_eq!("Not Found", body.status());
        assert_eq!("booking 7 not found", body.error());
    }

    #[tokio::test]
    async fn unsupported_state_is_a_bad_request() {
        let (status, body) =
            body_of(ClientError::UnsupportedState("UNSUPPORTED_STATUS".to_string()).into()).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("Unknown state: UNSUPPORTED_STATUS", body.error());
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let error = InternalError::Other("secret database password".to_string());
        let res = ApiError::from(error).into_response();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
        assert_eq!("5", res.headers()["Retry-After"]);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!("internal error", body.error());
    }

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1))]
        name: String,
    }

    #[tokio::test]
    async fn validation_errors_list_fields() {
        let errors = Named {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        let (status, body) = body_of(errors.into()).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("invalid field(s): name (length)", body.error());
    }

    #[test]
    fn row_not_found_is_not_found() {
        let error = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(
            error,
            ApiError::ClientError(ClientError::NotFound(_))
        ));
    }
}
