//! Configuration-driven HTTP stub server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                   STUB SERVER                    │
//!                    │                                                  │
//!   Client Request   │  ┌─────────┐    ┌────────────┐    ┌──────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│ dispatcher │───▶│ selector │   │
//!                    │  │ server  │    │ (ArcSwap)  │    │          │   │
//!   Client Response  │  │         │◀───│            │◀───│          │   │
//!   ◀────────────────┼──│         │    └─────▲──────┘    └──────────┘   │
//!                    │  └─────────┘          │ publish                  │
//!                    │                 ┌─────┴──────┐    ┌──────────┐   │
//!   config.toml ─────┼────────────────▶│   reload   │───▶│ compiler │   │
//!   (watch/SIGHUP/   │                 │coordinator │◀───│          │   │
//!    admin)          │                 └────────────┘    └──────────┘   │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use stub_server::lifecycle::{self, signals, Settings};
use stub_server::observability::logging;
use stub_server::routing::EmptyQueryPolicy;

#[derive(Parser, Debug)]
#[command(name = "stub-server", about = "Config-driven HTTP stub server with hot reload", version)]
struct Args {
    /// Path to the route configuration file
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.toml")]
    config: PathBuf,

    /// Port to serve stubs on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Emit route registration and reload diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// How a variant with an empty query table matches: require-none or match-any
    #[arg(long, default_value = "require-none")]
    empty_query: EmptyQueryPolicy,

    /// Stabilization delay after the config file is renamed or recreated
    #[arg(long, default_value_t = 100)]
    settle_ms: u64,

    /// Disable the file watcher (SIGHUP and the admin API still reload)
    #[arg(long)]
    no_watch: bool,

    /// Serve the admin API on this address (e.g. 127.0.0.1:8081)
    #[arg(long, value_name = "ADDR")]
    admin_address: Option<SocketAddr>,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, value_name = "ADDR")]
    metrics_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(args.verbose);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "stub-server starting");
    tracing::debug!(
        config = %args.config.display(),
        port = args.port,
        empty_query = args.empty_query.as_str(),
        "Resolved settings"
    );

    let settings = Settings {
        config_path: args.config,
        listen: SocketAddr::new(args.host, args.port),
        empty_query: args.empty_query,
        settle_delay: Duration::from_millis(args.settle_ms),
        watch: !args.no_watch,
        admin_address: args.admin_address,
        metrics_address: args.metrics_address,
    };

    let running = match lifecycle::start(settings).await {
        Ok(running) => running,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    tracing::info!(address = %running.local_addr, "Stub server running");
    tokio::spawn(signals::shutdown_on_signal(running.shutdown.clone()));

    running.wait().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
