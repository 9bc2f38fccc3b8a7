//! The server tier: business rules on top of the database.
//!
//! # Examples
//!
//! Serving the API on the configured port.
//!
//! ```rust,no_run
//! use shareit::{
//!     infra::{config::load_config, database::init_db},
//!     server::run_app,
//! };
//!
//! # tokio_test::block_on(async {
//! let config = load_config()?;
//! let db = init_db(&config.database);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:9090").await?;
//! run_app(listener, db, config).await?;
//! # Ok::<(), color_eyre::Report>(())
//! # }).unwrap();
//! ```

use crate::{
    feature::{
        booking::booking_api, info::info_api, item::item_api, request::request_api,
        user::user_api,
    },
    infra::{
        config::Config,
        database::DbPool,
        middleware::with_common_layers,
        openapi::ApiDoc,
        shutdown::shutdown_signal,
        state::AppState,
    },
};
use axum::Router;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

/// Constructs the full axum application.
pub fn app(state: AppState) -> Router {
    let timeout = state.config().server.request_timeout;
    let api = Router::new()
        .merge(info_api::routes())
        .merge(user_api::routes())
        .merge(item_api::routes())
        .merge(booking_api::routes())
        .merge(request_api::routes())
        .with_state(state);
    with_common_layers(api.merge(docs()), timeout)
}

/// The API documentation, served by both tiers.
pub(crate) fn docs() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/redoc", ApiDoc::openapi()))
        .merge(RapiDoc::new("/openapi.json").path("/rapidoc"))
}

/// Starts the axum server.
pub async fn run_app(listener: TcpListener, db: DbPool, config: Config) -> std::io::Result<()> {
    let state = AppState::new(db, config);
    let app = app(state);

    tracing::info!("Starting server on {}", listener.local_addr()?);
    let exit_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal("server"))
        .await;

    match &exit_result {
        Ok(_) => tracing::info!("Successfully shut down"),
        Err(e) => tracing::error!("Shutdown failed: {}", e),
    }
    exit_result
}
