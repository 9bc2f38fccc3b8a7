//! The request board, where users ask for items nobody has listed yet.

pub mod request_api;
pub mod request_repository;
pub mod request_service;
