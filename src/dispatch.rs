//! Push event dispatch: event gate, payload decode, rule matching, command runs

use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, info};

use crate::error::DispatchError;
use crate::executor::{CommandExecution, execute};
use crate::rules::{HookConfig, find_matches};
use crate::webhook::{EventKind, PushPayload};

/// What happened to a dispatched push event
#[derive(Debug)]
pub struct DispatchReport {
    pub repository: String,
    pub executions: Vec<CommandExecution>,
}

impl DispatchReport {
    pub fn failed_count(&self) -> usize {
        self.executions
            .iter()
            .filter(|e| !e.outcome.is_success())
            .count()
    }
}

/// Decode a push payload. Decode failures carry the body base64-encoded for the log.
pub fn decode_push(body: &[u8]) -> Result<PushPayload, DispatchError> {
    PushPayload::from_slice(body).map_err(|source| DispatchError::MalformedPayload {
        source,
        body_base64: BASE64.encode(body),
    })
}

/// Dispatch one inbound request against a configuration snapshot.
///
/// Commands run sequentially: rules in configuration order, then each rule's
/// commands in order. A failed command never stops the remaining ones.
pub async fn dispatch(
    config: &HookConfig,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<DispatchReport, DispatchError> {
    if let EventKind::Other(event) = EventKind::from_headers(headers) {
        return Err(DispatchError::UnsupportedEvent(event));
    }

    let payload = decode_push(body)?;
    let repository = payload.repository_full_name().to_string();
    info!("received webhook on {}", repository);
    debug!(
        "ref: {:?}, after: {:?}, {} commit(s)",
        payload.git_ref,
        payload.after,
        payload.commits.len()
    );

    let matched = find_matches(&config.rules, &repository, &payload.secret);
    if matched.is_empty() {
        info!("No repository rule matches '{}', ignoring", repository);
    }

    let mut executions = Vec::new();
    for rule in matched {
        for command in &rule.commands {
            executions.push(execute(&rule.name, command, body, config.command_timeout).await);
        }
    }

    Ok(DispatchReport {
        repository,
        executions,
    })
}
