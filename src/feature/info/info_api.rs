//! APIs for getting information about the application.

use crate::infra::extract::Json;
use axum::{routing::get, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The info endpoint, served by both tiers.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/info", get(info))
}

/// Application information.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
pub struct AppInfo {
    // The application name.
    name: &'static str,
    // The application version.
    version: &'static str,
}

/// Returns application information.
#[utoipa::path(
    get,
    path = "/info",
    responses(
        (status = 200, description = "Success", body = AppInfo),
    )
)]
pub async fn info() -> Json<AppInfo> {
    Json(AppInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
