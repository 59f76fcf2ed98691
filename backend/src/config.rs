//! Configuration management for the Bar Stock Manager API
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with BSM_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Bearer token verification
    pub auth: AuthConfig,

    /// Stock ledger policies
    pub stock: StockConfig,

    /// Generative-language API used by the assistant
    pub assistant: AssistantConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Run embedded migrations at startup outside development
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JSON Web Key Set published by the identity provider
    pub jwks_url: String,

    /// Expected `iss` claim, unchecked when absent
    pub issuer: Option<String>,

    /// Expected `aud` claim, unchecked when absent
    pub audience: Option<String>,

    /// How long a fetched key set is trusted
    pub jwks_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StockConfig {
    /// Accept outbound movements that take a snapshot below zero
    pub allow_negative: bool,

    /// Window for the "expiring soon" counter
    pub expiry_alert_days: i64,

    /// Default size of the movement history
    pub movement_history_limit: i64,

    /// Upper bound for a requested history size
    pub max_history_limit: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    /// Base URL of the generative-language API
    pub api_endpoint: String,

    /// API key; the assistant answers with a fixed notice when absent
    pub api_key: Option<String>,

    /// Default model
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("BSM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8787)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.run_migrations", false)?
            .set_default("auth.jwks_ttl_secs", 3600)?
            .set_default("stock.allow_negative", false)?
            .set_default("stock.expiry_alert_days", 7)?
            .set_default("stock.movement_history_limit", 50)?
            .set_default("stock.max_history_limit", 500)?
            .set_default(
                "assistant.api_endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("assistant.model", "gemini-2.0-flash")?
            .set_default("assistant.timeout_secs", 30)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BSM_ prefix)
            .add_source(
                Environment::with_prefix("BSM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn should_run_migrations(&self) -> bool {
        self.environment == "development" || self.database.run_migrations
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            allow_negative: false,
            expiry_alert_days: 7,
            movement_history_limit: 50,
            max_history_limit: 500,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Built-in defaults around a database URL, without files or environment
    pub fn with_database_url(url: impl Into<String>) -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: url.into(),
                max_connections: 5,
                min_connections: 0,
                run_migrations: false,
            },
            auth: AuthConfig {
                jwks_url: String::new(),
                issuer: None,
                audience: None,
                jwks_ttl_secs: 3600,
            },
            stock: StockConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}
