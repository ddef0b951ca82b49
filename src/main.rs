mod app;
mod config;
mod db;
mod domain;
mod infrastructure;
mod pipeline;
mod tasks;
mod telegram;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let once = std::env::args().skip(1).any(|arg| arg == "--once");

    let (shutdown, _) = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::JobRelayApp::initialize(config, paths, shutdown).await?;
    if once {
        app.run_once().await
    } else {
        app.run().await
    }
}
