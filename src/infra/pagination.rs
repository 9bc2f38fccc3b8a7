//! Offset based pagination with `from` and `size`.

use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

/// The largest page a client may ask for.
pub const MAX_PAGE_SIZE: i64 = 20;

const DEFAULT_PAGE_SIZE: i64 = 10;

/// Pagination parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// The index of the first element to fetch.
    #[validate(range(min = 0))]
    from: Option<i64>,
    /// The number of elements per page.
    #[validate(range(min = 1, max = 20))]
    size: Option<i64>,
}

impl PaginationParams {
    /// Constructs explicit pagination parameters.
    pub fn new(from: i64, size: i64) -> Self {
        Self {
            from: Some(from),
            size: Some(size),
        }
    }

    pub fn from(&self) -> i64 {
        self.from.unwrap_or(0).max(0)
    }

    pub fn size(&self) -> i64 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        self.size()
    }

    /// The offset of the page `from` falls into.
    pub fn offset(&self) -> i64 {
        (self.from() / self.size()) * self.size()
    }
}
