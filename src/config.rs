//! Configuration document loaded at startup and on every reload

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WebhookError};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const CONFIG_PATH_ENV: &str = "WEBHOOK_CONFIG";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    #[serde(default)]
    pub logfile: Option<PathBuf>,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound in seconds for a single command run.
    #[serde(default)]
    pub command_timeout: Option<u64>,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RepositoryConfig {
    /// Empty means the rule accepts any incoming secret.
    #[serde(default)]
    pub secret: String,
    /// Unanchored regular expression tested against the repository full name.
    pub name: String,
    #[serde(default)]
    pub commands: Vec<String>,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn command_timeout_secs(&self) -> u64 {
        self.command_timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS)
    }

    /// A zero timeout would kill every command on start.
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout == Some(0) {
            return Err(WebhookError::ConfigError(
                "CommandTimeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve the config path: first CLI argument, then `WEBHOOK_CONFIG`, then `config.json`.
pub fn resolve_config_path(cli_arg: Option<String>) -> PathBuf {
    cli_arg
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
        .into()
}

/// Load and parse the configuration file.
/// `.toml` files are parsed as TOML, anything else as JSON.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|e| {
        WebhookError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    let config: Config = if is_toml {
        toml::from_str(&config_str)?
    } else {
        serde_json::from_str(&config_str)?
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_json_document() {
        let file = write_temp(
            ".json",
            r#"{
                "Logfile": "webhook.log",
                "Address": "127.0.0.1",
                "Port": 8090,
                "Repositories": [
                    { "Secret": "s3cr3t", "Name": "acme/.*", "Commands": ["/usr/local/bin/deploy"] },
                    { "Name": "widgets$", "Commands": [] }
                ]
            }"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8090");
        assert_eq!(config.logfile, Some(PathBuf::from("webhook.log")));
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.repositories[0].secret, "s3cr3t");
        assert_eq!(config.repositories[1].secret, "");
        assert_eq!(config.command_timeout_secs(), DEFAULT_COMMAND_TIMEOUT_SECS);
    }

    #[test]
    fn loads_toml_document() {
        let file = write_temp(
            ".toml",
            r#"
Port = 9000
CommandTimeout = 5

[[Repositories]]
Name = "acme/widgets"
Commands = ["/bin/true"]
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.command_timeout_secs(), 5);
        assert_eq!(config.repositories[0].commands, vec!["/bin/true"]);
        assert!(config.logfile.is_none());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_config("/nonexistent/webhook/config.json").unwrap_err();
        assert!(matches!(err, WebhookError::ConfigError(_)));
    }

    #[test]
    fn bad_json_is_json_parse_error() {
        let file = write_temp(".json", "{ not json");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, WebhookError::JsonParseError(_)));
    }

    #[test]
    fn bad_toml_is_toml_parse_error() {
        let file = write_temp(".toml", "Port = = 1");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, WebhookError::TomlParseError(_)));
    }

    #[test]
    fn zero_command_timeout_is_rejected() {
        let file = write_temp(".json", r#"{"CommandTimeout": 0, "Repositories": []}"#);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, WebhookError::ConfigError(ref msg) if msg.contains("CommandTimeout")));

        let file = write_temp(".json", r#"{"CommandTimeout": 1, "Repositories": []}"#);
        assert_eq!(load_config(file.path()).unwrap().command_timeout_secs(), 1);
    }

    #[test]
    fn cli_argument_wins_over_default() {
        assert_eq!(
            resolve_config_path(Some("/etc/webhook.json".to_string())),
            PathBuf::from("/etc/webhook.json")
        );
    }
}
