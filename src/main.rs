use gitea_webhook::config::{load_config, resolve_config_path};
use gitea_webhook::{AppState, app, logging, watch_reload_signal};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config_path = resolve_config_path(std::env::args().nth(1));

    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let log_guard = match logging::setup_logging(config.logfile.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Using config at {:?}", config_path);
    let state = Arc::new(AppState::new(config_path, &config));
    tokio::spawn(watch_reload_signal(state.clone()));

    let bind_address = state.bind_address.clone();
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            drop(log_guard);
            std::process::exit(1);
        }
    };

    info!("Listening on {}", bind_address);
    if let Err(e) = axum::serve(listener, app(state)).await {
        error!("Server error: {}", e);
    }
    drop(log_guard);
}
