use std::net::Ipv4Addr;
use std::sync::Arc;

use clap::Parser;
use storeview_indexer_client::RealLogSource;
use storeview_lib::api::{self, ApiContext};
use storeview_lib::config::Config;
use storeview_lib::schema;
use storeview_lib::CliOptions;
use tokio::net::TcpListener;
use tracing::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Parse options");
    let cli_options = CliOptions::parse();

    info!("Loading configuration file");
    let config = Config::read(&cli_options.config)?;

    // Building the schema validates it; an invalid schema must never serve.
    let world = schema::world();
    info!(tables = world.all().len(), "World schema loaded");

    let source = Arc::new(RealLogSource::new(
        &config.indexer_url,
        config.chain_id,
        config.world_address,
    )?);

    let port = config.api_port;
    info!(port, "Starting API server");
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
    axum::serve(listener, api::router(ApiContext { config, source })).await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt::init();
}
