use std::io;

/// Startup and configuration errors for gitea_webhook
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging setup failed: {0}")]
    LoggingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

/// Errors that drop a single webhook request. None of these outlive the request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("received unknown event \"{0}\"")]
    UnsupportedEvent(String),

    #[error("malformed push payload: {source} (body base64: {body_base64})")]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
        body_base64: String,
    },
}

/// Helper type for Results that use WebhookError
pub type Result<T> = std::result::Result<T, WebhookError>;
