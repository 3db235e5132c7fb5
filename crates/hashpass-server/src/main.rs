#![doc = include_str!("../README.md")]

use clap::Parser;
use hashpass::HashService;
use hashpass_server::server::{
    config::{CliArgs, ServerConfig},
    serve, shutdown_on_signal,
    telemetry::init_telemetry,
};
use tokio::net::TcpListener;

// Each submission spawns a task and allocates a slot; keep the allocator
// off the system malloc.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry(config.logfile.as_deref())?;
    log_startup_info(&config);

    let service = HashService::new(config.service_config());
    let listener = TcpListener::bind(config.addr).await?;
    tokio::spawn(shutdown_on_signal(service.clone()));

    let res = serve(listener, service).await;
    providers.shutdown();
    res
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting hashpass on {} with full config: {:#?}",
            config.addr,
            config
        );
    } else {
        tracing::info!(
            "Starting hashpass on {} (hash delay {:?}, drain timeout {:?})",
            config.addr,
            config.hash_delay,
            config.drain_timeout
        );
    }
}
