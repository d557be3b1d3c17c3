//! Configuration parsing and validation.
//!
//! The daemon is configured from a single TOML file defining the bind
//! address, the operator token, and the provisioned session tokens:
//!
//! ```toml
//! [daemon]
//! bind_addr = "127.0.0.1:8585"
//! operator_token = "op-secret"
//!
//! [[sessions]]
//! token = "tok-alice"
//! session_id = "jupyter-alice"
//! ```
//!
//! Validation is fail-closed: a blank operator token or an empty session
//! table is a startup error, not a daemon that accepts nothing.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::TokenEntry;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    /// Daemon configuration.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Provisioned session tokens.
    #[serde(default)]
    pub sessions: Vec<SessionTokenConfig>,
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if:
    /// - `daemon.operator_token` is empty
    /// - no session tokens are provisioned
    ///
    /// Per-entry token validation (empty or duplicate tokens) happens when
    /// the token table is handed to the authenticator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daemon.operator_token.is_empty() {
            return Err(ConfigError::Validation(
                "daemon.operator_token must not be empty".to_string(),
            ));
        }
        if self.sessions.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[sessions]] entry is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the session token table as authenticator entries.
    #[must_use]
    pub fn token_entries(&self) -> Vec<TokenEntry> {
        self.sessions
            .iter()
            .map(|s| TokenEntry {
                token: s.token.clone(),
                session_id: s.session_id.clone(),
            })
            .collect()
    }
}

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address the HTTP server binds to.
    ///
    /// Defaults to localhost only; expose through a reverse proxy if network
    /// access is required.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Bearer token for the operator-scoped routes (lookup and removal).
    ///
    /// Required field in effect: the default is empty and validation rejects
    /// an empty token.
    #[serde(default)]
    pub operator_token: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            operator_token: String::new(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8585))
}

/// One provisioned session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokenConfig {
    /// The bearer token value.
    pub token: String,
    /// Session id the token authenticates as.
    pub session_id: String,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[source] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    /// The configuration is well-formed but invalid.
    #[error("invalid config: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const VALID: &str = r#"
        [daemon]
        bind_addr = "127.0.0.1:9000"
        operator_token = "op-secret"

        [[sessions]]
        token = "tok-alice"
        session_id = "jupyter-alice"

        [[sessions]]
        token = "tok-bob"
        session_id = "jupyter-bob"
    "#;

    #[test]
    fn parses_full_config() {
        let config = ServiceConfig::from_toml(VALID).unwrap();
        config.validate().unwrap();

        assert_eq!(config.daemon.bind_addr.port(), 9000);
        assert_eq!(config.daemon.operator_token, "op-secret");
        assert_eq!(config.sessions.len(), 2);
        assert_eq!(config.sessions[1].session_id, "jupyter-bob");
    }

    #[test]
    fn bind_addr_defaults_to_localhost() {
        let config = ServiceConfig::from_toml(
            r#"
            [daemon]
            operator_token = "op-secret"

            [[sessions]]
            token = "tok-alice"
            session_id = "jupyter-alice"
        "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.daemon.bind_addr, default_bind_addr());
    }

    #[test]
    fn empty_operator_token_fails_validation() {
        let config = ServiceConfig::from_toml(
            r#"
            [[sessions]]
            token = "tok-alice"
            session_id = "jupyter-alice"
        "#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn empty_session_table_fails_validation() {
        let config = ServiceConfig::from_toml(
            r#"
            [daemon]
            operator_token = "op-secret"
        "#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        assert!(matches!(
            ServiceConfig::from_toml("daemon = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sessions.len(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ServiceConfig::from_file(Path::new("/nonexistent/spawnport.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn token_entries_mirror_session_table() {
        let config = ServiceConfig::from_toml(VALID).unwrap();
        let entries = config.token_entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].token, "tok-alice");
        assert_eq!(entries[0].session_id, "jupyter-alice");
    }
}
