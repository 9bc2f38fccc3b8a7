//! The user directory.

pub mod user_api;
pub mod user_repository;
pub mod user_service;
