//! The ShareIt server tier.

use shareit::{
    infra::{
        config::load_config,
        database::{init_db, migrate},
        logging::init_logging,
    },
    server::run_app,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let _guard = init_logging("server");
    let config = load_config()?;
    let db = init_db(&config.database);
    migrate(&db).await?;

    let listener = TcpListener::bind(format!(
        "{}:{}",
        config.server.http_address, config.server.http_port
    ))
    .await?;
    run_app(listener, db, config).await?;

    Ok(())
}
