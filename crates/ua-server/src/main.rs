//! UA server binary.
//!
//! Runs an internal server over in-memory collaborators until Ctrl-C. No
//! network listener is started; the binary exercises startup, the clock and
//! shutdown.
//!
//! # Usage
//!
//! ```bash
//! ua-server --endpoint opc.tcp://0.0.0.0:4840/server/ --clock-interval-ms 500
//! ```

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use ua_server::{InternalServer, MemoryBackend, ServerConfig, SystemEnv};

/// OPC-UA internal server
#[derive(Parser, Debug)]
#[command(name = "ua-server")]
#[command(about = "OPC-UA session and subscription core over an in-memory address space")]
#[command(version)]
struct Args {
    /// Endpoint URL to advertise (repeatable)
    #[arg(long = "endpoint")]
    endpoints: Vec<String>,

    /// Application URI
    #[arg(long)]
    application_uri: Option<String>,

    /// Do not upgrade remote "admin" logins to the Admin role
    #[arg(long)]
    no_remote_admin: bool,

    /// Do not run the server clock
    #[arg(long)]
    disable_clock: bool,

    /// Clock interval in milliseconds
    #[arg(long, default_value = "1000")]
    clock_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            application_uri: self.application_uri.unwrap_or(defaults.application_uri),
            endpoint_urls: if self.endpoints.is_empty() {
                defaults.endpoint_urls
            } else {
                self.endpoints
            },
            allow_remote_admin: !self.no_remote_admin,
            disabled_clock: self.disable_clock,
            clock_interval: Duration::from_millis(self.clock_interval_ms),
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = args.into_config();
    if config.allow_remote_admin {
        tracing::warn!("Remote admin enabled: any \"admin\" user name gets the Admin role");
    }

    let env = SystemEnv::new();
    let backend = MemoryBackend::new(env);
    let server = InternalServer::new(config, env, backend.services())?;

    server.start()?;
    for endpoint in server.get_endpoints(None, None) {
        tracing::info!("Endpoint {}", endpoint.endpoint_url);
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    server.stop();
    Ok(())
}
