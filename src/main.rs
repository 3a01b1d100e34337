use clap::Parser;
use std::sync::Arc;
use tokio::sync::Notify;

mod cli;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
mod store;

use config::{AppState, Config, StoreBackend};
use store::{MemoryStore, RemoteStore, TripleStore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::Args::parse();
    let cfg = Config::load(&args)?;
    logger::init(&cfg)?;

    // Create the Tokio runtime, one worker per core unless configured
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    match cfg.store.backend {
        StoreBackend::Memory => run(cfg, MemoryStore::new()).await,
        StoreBackend::Remote => {
            let endpoint = cfg
                .store
                .endpoint
                .clone()
                .ok_or("store.endpoint is required for the remote backend")?;
            let store = RemoteStore::new(endpoint)?;
            run(cfg, store).await
        }
    }
}

async fn run<S: TripleStore + 'static>(
    cfg: Config,
    store: S,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let addr = listener.local_addr()?;

    let state = Arc::new(AppState::new(cfg, store));
    logger::log_server_start(
        &addr,
        &state.config,
        &format!("{} ({} results)", state.store.name(), state.store.shape()),
    );

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run_server(listener, state, shutdown))
        .await;
    Ok(())
}
