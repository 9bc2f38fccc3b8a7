//! The features of the server tier, one module per resource.
//!
//! Each feature is split into an `_api` module with the HTTP handlers,
//! a `_service` module with the business rules, and a `_repository`
//! module with the storage trait and its Postgres implementation.

pub mod booking;
pub mod info;
pub mod item;
pub mod request;
pub mod user;

#[cfg(test)]
pub(crate) mod mock;
