//! Configuration reload, triggered by SIGHUP

use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

use crate::config::load_config;
use crate::error::Result;
use crate::rules::HookConfig;
use crate::{AppState, SharedState};

/// Reload the config file and swap it in.
/// On error the active configuration is left untouched.
pub fn reload_config(state: &AppState) -> Result<()> {
    let config = load_config(&state.config_path)?;

    if config.bind_address() != state.bind_address {
        warn!(
            "Listen address changed to {}, restart required (still on {})",
            config.bind_address(),
            state.bind_address
        );
    }
    if config.logfile != state.logfile {
        warn!("Logfile changed, restart required to take effect");
    }

    state.replace_config(HookConfig::from_config(&config));
    Ok(())
}

/// Reload on every SIGHUP until the process exits.
pub async fn watch_reload_signal(state: SharedState) {
    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to register SIGHUP handler, reload disabled: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        match reload_config(&state) {
            Ok(()) => info!("config reloaded from {:?}", state.config_path),
            Err(e) => error!("Failed to reload config, keeping previous one: {}", e),
        }
    }
}
