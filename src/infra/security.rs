//! Identification of the acting user.
//!
//! Every call that acts on behalf of a user carries its id in the
//! `X-Sharer-User-Id` header. There is no authentication beyond that.

use super::error::{ApiError, ClientError};
use axum::{async_trait, extract::FromRequestParts};
use axum_extra::{
    headers::{self, Header},
    TypedHeader,
};
use http::{request::Parts, HeaderName, HeaderValue};

/// The name of the header carrying the acting user id.
pub static X_SHARER_USER_ID: HeaderName = HeaderName::from_static("x-sharer-user-id");

/// The typed `X-Sharer-User-Id` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XSharerUserId(pub i64);

impl Header for XSharerUserId {
    fn name() -> &'static HeaderName {
        &X_SHARER_USER_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(XSharerUserId)
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(HeaderValue::from(self.0)));
    }
}

/// The user a request is made on behalf of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sharer {
    id: i64,
}

impl Sharer {
    /// Constructs a sharer from a known id.
    pub fn new(id: i64) -> Self {
        Self { id }
    }

    /// The acting user's id.
    pub fn id(&self) -> i64 {
        self.id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Sharer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(XSharerUserId(id)) =
            TypedHeader::<XSharerUserId>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    ClientError::BadRequest(format!("missing or invalid {X_SHARER_USER_ID}: {e}"))
                })?;
        Ok(Sharer { id })
    }
}
