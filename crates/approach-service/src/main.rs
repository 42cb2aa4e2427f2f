//! approach-service - demo host for the approach remote console.
//!
//! Binds the service on a TCP address, registers the demo command catalog,
//! and serves connected consoles until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use approach_service::demo::{DemoHandler, demo_specification};
use approach_service::{Server, ServerConfig};

/// approach-service - host side of the approach remote console
#[derive(Parser, Debug)]
#[command(name = "approach-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Instance name to advertise
    instance: String,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:4100")]
    bind: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let specification = demo_specification().context("failed to build demo catalog")?;
    let config = ServerConfig::new(args.bind, &args.instance);
    let mut server = Server::bind(config, specification, Arc::new(DemoHandler))
        .await
        .context("failed to bind service")?;

    tokio::select! {
        () = server.run() => {},
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for interrupt")?;
            info!("interrupt received, shutting down");
        },
    }

    Ok(())
}
