use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ServerConfig {
    pub listen_ip: Option<String>,
    pub port: Option<u16>,
}

/// Connection settings for one node. Handed to
/// [`RpcClient::new`](crate::rpc::RpcClient::new) and never mutated after.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    /// `host:port`, with or without a leading `http://`.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub timeout_secs: Option<u64>,
}

impl RpcConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            timeout_secs: None,
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("rpc.url"));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Missing("rpc.username"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Missing("rpc.password"));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "rpc.timeout_secs",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
}

/// Reads `path` as TOML. A missing file yields the defaults so the RPC
/// settings can come entirely from flags or the environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    let config: AppConfig = toml::from_str(&config_str)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_full_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[server]
listen_ip = "0.0.0.0"
port = 8080

[rpc]
url = "node.local:8332"
username = "alice"
password = "secret"
timeout_secs = 5
"#
        )
        .expect("write config");

        let config = load_config(file.path()).expect("config should load");
        assert_eq!(config.server.listen_ip.as_deref(), Some("0.0.0.0"));
        assert_eq!(config.server.port, Some(8080));
        assert_eq!(config.rpc.url, "node.local:8332");
        assert_eq!(config.rpc.username, "alice");
        assert_eq!(config.rpc.password, "secret");
        assert_eq!(config.rpc.timeout_secs(), 5);
        assert!(config.rpc.validate().is_ok());
    }

    #[test]
    fn server_section_is_optional() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[rpc]\nurl = \"127.0.0.1:8332\"\nusername = \"u\"\npassword = \"p\""
        )
        .expect("write config");

        let config = load_config(file.path()).expect("config should load");
        assert!(config.server.listen_ip.is_none());
        assert_eq!(config.rpc.timeout_secs(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(&dir.path().join("absent.toml")).expect("defaults");
        assert!(config.rpc.url.is_empty());
        assert!(matches!(
            config.rpc.validate(),
            Err(ConfigError::Missing("rpc.url"))
        ));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[rpc\nurl = ").expect("write config");

        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = RpcConfig::new("node.local:8332", "alice", "secret");
        config.timeout_secs = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: "rpc.timeout_secs",
                ..
            })
        ));

        config.timeout_secs = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_password_is_rejected() {
        let config = RpcConfig::new("node.local:8332", "alice", "");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("rpc.password"))
        ));
    }
}
