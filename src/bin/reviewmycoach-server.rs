// ABOUTME: Server binary for the ReviewMyCoach API
// ABOUTME: Loads configuration from the environment, applies CLI overrides and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

//! # ReviewMyCoach Server
//!
//! ```bash
//! # Serve with settings from the environment
//! cargo run --bin reviewmycoach-server
//!
//! # Override port and store, seed the default tag catalog first
//! cargo run --bin reviewmycoach-server -- --port 9000 --database-url sqlite:./dev.db --seed-tags
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use reviewmycoach_server::config::{LogFormat, ServerConfig};
use reviewmycoach_server::logging;
use reviewmycoach_server::resources::ServerResources;
use reviewmycoach_server::server;

#[derive(Parser)]
#[command(
    name = "reviewmycoach-server",
    about = "ReviewMyCoach API server",
    long_about = "Coach discovery, reviews, messaging, job board and billing over HTTP"
)]
struct Args {
    /// HTTP port override
    #[arg(long, env = "HTTP_PORT")]
    port: Option<u16>,

    /// Bind address override
    #[arg(long)]
    host: Option<String>,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Emit JSON logs regardless of `LOG_FORMAT`
    #[arg(long)]
    json_logs: bool,

    /// Insert the default tag catalog before serving
    #[arg(long)]
    seed_tags: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    if args.json_logs {
        config.log_format = LogFormat::Json;
    }

    logging::init(config.log_format).context("Failed to initialize logging")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.http_port,
        "Starting ReviewMyCoach server"
    );

    let resources = ServerResources::from_config(config)
        .await
        .context("Failed to initialize server resources")?;

    if args.seed_tags {
        let outcome = resources
            .database
            .tags()
            .initialize()
            .await
            .context("Failed to seed tags")?;
        info!(
            created = outcome.created,
            skipped = outcome.skipped,
            "Tag catalog seeded"
        );
    }

    server::serve(Arc::new(resources)).await?;
    Ok(())
}
