//! approach - interactive terminal client for the approach remote console.
//!
//! Resolves a service instance name, connects, and turns typed command
//! lines into invocations executed on the host. Reconnects when a session
//! ends; exits on interrupt or end of input.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use approach_core::discovery::{Resolver, StaticResolver};

mod repl;
mod session;

use session::{ClientSession, SessionEnd};

/// Delay between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// approach - remote console client
#[derive(Parser, Debug)]
#[command(name = "approach")]
#[command(version, about, long_about = None)]
struct Args {
    /// Service instance name to connect to
    instance: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Service address, bypassing network discovery
    #[arg(long, default_value = "127.0.0.1:4100")]
    addr: SocketAddr,

    /// Directory received screenshots and files are saved to
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => {
            let dir = std::env::temp_dir().join("approach");
            std::fs::create_dir_all(&dir).context("failed to create output directory")?;
            dir
        },
    };

    // The discovery collaborator: a static table standing in for a network
    // browse of the service type.
    let resolver = StaticResolver::single(&args.instance, args.addr);
    let addr = resolver
        .resolve(&args.instance)
        .context("failed to resolve service instance")?;

    let mut lines = repl::spawn_line_reader();
    let session = ClientSession::new(&args.instance, addr, output_dir);

    loop {
        let outcome = tokio::select! {
            outcome = session.run(&mut lines) => outcome,
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for interrupt")?;
                println!();
                debug!("interrupt received, shutting down");
                return Ok(());
            },
        };

        match outcome {
            Ok(SessionEnd::InputClosed) => return Ok(()),
            Ok(SessionEnd::Disconnected) => {
                println!("Session ended; reconnecting...");
            },
            Err(e) => {
                println!("Connection failed: {e}; retrying...");
            },
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}
