//! Configuration management
//!
//! TOML file, environment overrides and validation, in that order.

use crate::errors::{ConfigurationError, GrindResult};
use crate::session::SessionPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::IpAddr;
use std::path::Path;

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrindConfig {
    pub server: ServerConfig,
    pub session: SessionPolicy,
}

/// HTTP server settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Upper bound on concurrently stored sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sessions: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
            max_sessions: None,
        }
    }
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> GrindResult<GrindConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            GrindConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> GrindResult<GrindConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    fn apply_env_overrides(&self, config: &mut GrindConfig) -> GrindResult<()> {
        if let Ok(host) = env::var("GRIND_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("GRIND_PORT") {
            config.server.port = parse_env("GRIND_PORT", port, "Invalid port number")?;
        }
        if let Ok(timeout) = env::var("GRIND_REQUEST_TIMEOUT") {
            config.server.request_timeout_secs =
                parse_env("GRIND_REQUEST_TIMEOUT", timeout, "Invalid timeout value")?;
        }
        if let Ok(enforce) = env::var("GRIND_ENFORCE_BANKROLL") {
            config.session.enforce_bankroll_limit =
                parse_env("GRIND_ENFORCE_BANKROLL", enforce, "Invalid boolean value")?;
        }
        if let Ok(max) = env::var("GRIND_MAX_HISTORY") {
            config.session.max_history = Some(parse_env("GRIND_MAX_HISTORY", max, "Invalid history limit")?);
        }

        Ok(())
    }

    fn validate(&self, config: &GrindConfig) -> GrindResult<()> {
        if config.server.host.is_empty() {
            return Err(ConfigurationError::MissingRequired("server.host".to_string()).into());
        }
        if config.server.host.parse::<IpAddr>().is_err() {
            return Err(ConfigurationError::ValidationFailed(format!(
                "server.host '{}' is not an IP address",
                config.server.host
            ))
            .into());
        }

        if config.server.port == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "server.port".to_string(),
                value: "0".to_string(),
                reason: "Port cannot be zero".to_string(),
            }
            .into());
        }

        if config.server.request_timeout_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "server.request_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be at least one second".to_string(),
            }
            .into());
        }

        if config.server.max_sessions == Some(0) {
            return Err(ConfigurationError::InvalidValue {
                field: "server.max_sessions".to_string(),
                value: "0".to_string(),
                reason: "Session limit cannot be zero".to_string(),
            }
            .into());
        }

        if config.session.max_history == Some(0) {
            return Err(ConfigurationError::InvalidValue {
                field: "session.max_history".to_string(),
                value: "0".to_string(),
                reason: "History limit cannot be zero; omit it to keep full history".to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn save(&self, config: &GrindConfig, path: &str) -> GrindResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

fn parse_env<T: std::str::FromStr>(field: &str, value: String, reason: &str) -> GrindResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigurationError::InvalidValue {
            field: field.to_string(),
            value,
            reason: reason.to_string(),
        }
        .into()
    })
}

/// Builder pattern for creating configurations
pub struct ConfigBuilder {
    config: GrindConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GrindConfig::default(),
        }
    }

    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    pub fn session(mut self, session: SessionPolicy) -> Self {
        self.config.session = session;
        self
    }

    pub fn build(self) -> GrindConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a configuration file populated with defaults
pub fn generate_sample_config(path: &str) -> GrindResult<()> {
    ConfigLoader::new().save(&GrindConfig::default(), path)
}
