//! Booking statuses and the state filters used when listing bookings.

use crate::infra::error::ClientError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::{IntoParams, ToSchema};

/// The approval status of a booking.
///
/// A booking starts out [`Waiting`](BookingStatus::Waiting) and is then
/// decided exactly once; both decisions are final.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "booking_status", rename_all = "UPPERCASE")]
pub enum BookingStatus {
    /// Waiting for the owner to decide.
    Waiting,
    /// Approved by the owner.
    Approved,
    /// Rejected by the owner.
    Rejected,
}

impl BookingStatus {
    /// The status an owner's decision leads to.
    pub fn decided(approved: bool) -> Self {
        if approved {
            Self::Approved
        } else {
            Self::Rejected
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "WAITING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// Which bookings of a user to list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingState {
    /// Every booking.
    #[default]
    All,
    /// Bookings that have started but not ended.
    Current,
    /// Bookings that have ended.
    Past,
    /// Bookings that have not started.
    Future,
    /// Bookings waiting for a decision.
    Waiting,
    /// Rejected bookings.
    Rejected,
}

impl FromStr for BookingState {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALL" => Ok(Self::All),
            "CURRENT" => Ok(Self::Current),
            "PAST" => Ok(Self::Past),
            "FUTURE" => Ok(Self::Future),
            "WAITING" => Ok(Self::Waiting),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(ClientError::UnsupportedState(other.to_string())),
        }
    }
}

/// The `state` query parameter.
///
/// Kept as a raw string so that unknown keywords can be reported
/// with the keyword itself rather than a generic parse error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StateParams {
    /// One of ALL, CURRENT, PAST, FUTURE, WAITING, REJECTED. Defaults to ALL.
    pub state: Option<String>,
}

impl StateParams {
    /// Parses the requested state.
    pub fn parse(&self) -> Result<BookingState, ClientError> {
        self.state
            .as_deref()
            .map_or(Ok(BookingState::All), BookingState::from_str)
    }
}
