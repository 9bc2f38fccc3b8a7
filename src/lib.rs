//! ShareIt, an item-sharing backend.
//!
//! The crate contains two tiers that are started as separate binaries:
//!
//! * the [`server`], which owns the database and the business rules, and
//! * the [`gateway`], which validates incoming requests and forwards them to the server.

pub mod feature;
pub mod gateway;
pub mod infra;
pub mod server;
