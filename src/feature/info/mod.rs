//! Information about the running application.

pub mod info_api;
