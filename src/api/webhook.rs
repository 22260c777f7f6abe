//! Webhook handler for Gitea/Gogs push events

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::SharedState;
use crate::dispatch::dispatch;
use crate::error::DispatchError;
use crate::rules::HookConfig;
use crate::webhook::delivery_id;

/// Handles the webhook POST request.
///
/// The sender always gets `200 OK`; match and command outcomes only reach the log.
/// Dispatch runs on its own task so a sender hanging up does not cancel it.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let delivery = delivery_id(&headers).unwrap_or_else(|| Uuid::now_v7().to_string());
    let span = info_span!("webhook", delivery = %delivery);

    // Pinned for the whole request, a reload mid-request does not affect it.
    let config = state.current_config();

    let task = tokio::spawn(run_dispatch(config, headers, body).instrument(span.clone()));

    if let Err(e) = task.await {
        error!(parent: &span, "Dispatch task failed: {}", e);
    }

    StatusCode::OK
}

async fn run_dispatch(config: Arc<HookConfig>, headers: HeaderMap, body: Bytes) {
    match dispatch(&config, &headers, &body).await {
        Ok(report) => {
            let failed = report.failed_count();
            if failed > 0 {
                warn!(
                    "Webhook for '{}' finished: {} command(s) run, {} failed",
                    report.repository,
                    report.executions.len(),
                    failed
                );
            } else {
                info!(
                    "Webhook for '{}' finished: {} command(s) run",
                    report.repository,
                    report.executions.len()
                );
            }
        }
        Err(e @ DispatchError::UnsupportedEvent(_)) => info!("{}", e),
        Err(e @ DispatchError::MalformedPayload { .. }) => error!("Dropping request: {}", e),
    }
}
