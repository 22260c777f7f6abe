//! Webhook related structures for Gitea/Gogs push notifications

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

pub const EVENT_HEADERS: [&str; 2] = ["X-Gogs-Event", "X-Gitea-Event"];
pub const DELIVERY_HEADERS: [&str; 2] = ["X-Gitea-Delivery", "X-Gogs-Delivery"];

/// Event kind announced by the sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Push,
    Other(String),
}

impl EventKind {
    /// Reads the first non-empty event header. Only the exact value `push` is a push.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let event = first_header(headers, &EVENT_HEADERS).unwrap_or_default();
        if event == "push" {
            EventKind::Push
        } else {
            EventKind::Other(event)
        }
    }
}

/// Delivery id sent by Gitea or Gogs, if any
pub fn delivery_id(headers: &HeaderMap) -> Option<String> {
    first_header(headers, &DELIVERY_HEADERS)
}

/// First header among `names` with a non-empty value. Non-UTF-8 bytes are kept lossily,
/// so such a value never falls through to the next header.
fn first_header(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| headers.get(*name))
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .find(|v| !v.is_empty())
}

/// Push payload. Only `repository.full_name` is required; everything else is informational.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushPayload {
    #[serde(default)]
    pub secret: String,
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub compare_url: Option<String>,
    #[serde(default)]
    pub commits: Vec<PayloadCommit>,
    pub repository: PayloadRepository,
    #[serde(default)]
    pub pusher: Option<PayloadUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadRepository {
    pub full_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadCommit {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadUser {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl PushPayload {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn repository_full_name(&self) -> &str {
        &self.repository.full_name
    }

    /// Branch name with the `refs/heads/` prefix stripped
    pub fn branch(&self) -> Option<&str> {
        self.git_ref
            .as_deref()
            .map(|r| r.strip_prefix("refs/heads/").unwrap_or(r))
    }
}
