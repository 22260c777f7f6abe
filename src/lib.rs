pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod logging;
pub mod reload;
pub mod rules;
pub mod webhook;

use arc_swap::ArcSwap;
use axum::{Router, routing};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::rules::HookConfig;

pub use reload::{reload_config, watch_reload_signal};

pub struct AppState {
    pub config: ArcSwap<HookConfig>,
    pub config_path: PathBuf,
    /// Listener address and log file are fixed at startup.
    pub bind_address: String,
    pub logfile: Option<PathBuf>,
}

impl AppState {
    pub fn new(config_path: PathBuf, config: &Config) -> Self {
        Self {
            config: ArcSwap::from_pointee(HookConfig::from_config(config)),
            config_path,
            bind_address: config.bind_address(),
            logfile: config.logfile.clone(),
        }
    }

    /// Snapshot of the active configuration. Stays valid across reloads.
    pub fn current_config(&self) -> Arc<HookConfig> {
        self.config.load_full()
    }

    /// Swap in a new configuration as a whole.
    pub fn replace_config(&self, config: HookConfig) {
        self.config.store(Arc::new(config));
    }
}

pub type SharedState = Arc<AppState>;

/// Router with the webhook endpoints
pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::post(api::handle_webhook))
        .route("/webhook", routing::post(api::handle_webhook))
        .with_state(state)
}
