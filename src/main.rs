use std::sync::Arc;

use resource_http::adapter::{Engine, Listener};
use resource_http::config::Config;
use resource_http::logger;
use resource_http::server::{self, signal, ServerState};
use tokio::sync::Notify;

mod echo;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config path without extension, e.g. `resource_http config/dev`
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let tcp_listener = server::create_reusable_listener(addr, cfg.server.backlog)?;

    let engine: Arc<dyn Engine> = Arc::new(echo::EchoEngine);
    let listener = Listener::new(engine, cfg.http.listener_options()?)?;
    logger::log_server_start(&addr, &cfg, listener.media_types());

    let state = Arc::new(ServerState::new(cfg, listener));
    let shutdown = Arc::new(Notify::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local.run_until(server::run(tcp_listener, state, shutdown)).await;
    Ok(())
}
