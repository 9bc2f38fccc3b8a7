//! The ShareIt gateway tier.

use shareit::{
    gateway::run_gateway,
    infra::{config::load_config, logging::init_logging},
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let _guard = init_logging("gateway");
    let config = load_config()?;

    let listener = TcpListener::bind(format!(
        "{}:{}",
        config.gateway.http_address, config.gateway.http_port
    ))
    .await?;
    run_gateway(listener, config.gateway).await?;

    Ok(())
}
