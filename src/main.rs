// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use fabstir_detect_node::{
    api::{AppState, DetectionServer},
    cli::Cli,
};
use std::{env, sync::Arc};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("🚀 Starting {}", fabstir_detect_node::version::get_version_string());

    let cli = Cli::parse();
    let config = cli.load_config()?;
    let addr = config.listen_addr()?;

    info!(
        "Model: {} ({}), input {}px, {} inference slots",
        config.model_name,
        config.model_path.display(),
        config.input_size,
        config.max_concurrent_inferences
    );

    let preload = config.preload_model;
    let state = Arc::new(AppState::from_config(config)?);

    if preload {
        // Startup continues without a model; requests will retry the load
        if let Err(e) = state.pipeline.models().preload().await {
            warn!("⚠️ Model preload failed: {}", e);
        }
    }

    let server = DetectionServer::start(state, addr).await?;

    // Wait for shutdown signal
    signal::ctrl_c().await?;

    info!("⏹️  Shutting down...");
    server.shutdown().await;

    Ok(())
}
