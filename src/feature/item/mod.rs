//! The item catalog and the comments left on items.

pub mod comment_repository;
pub mod item_api;
pub mod item_repository;
pub mod item_service;
