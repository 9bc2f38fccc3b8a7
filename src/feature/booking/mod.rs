//! Booking items for a period, and the owner's decision on each booking.

pub mod booking_api;
pub mod booking_repository;
pub mod booking_service;
pub mod booking_state;
