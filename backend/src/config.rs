//! Configuration management for the orchard server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with ORCHARD_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Orchard behaviour
    pub orchard: OrchardConfig,
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
}

/// How many apples a single "generate" request grows
#[derive(Debug, Deserialize, Clone, Validate)]
#[validate(schema(function = "validate_batch_bounds"))]
pub struct OrchardConfig {
    #[validate(range(min = 1, max = 100))]
    pub min_batch_size: u32,

    #[validate(range(min = 1, max = 100))]
    pub max_batch_size: u32,
}

fn validate_batch_bounds(orchard: &OrchardConfig) -> Result<(), ValidationError> {
    if orchard.min_batch_size > orchard.max_batch_size {
        return Err(ValidationError::new("min_batch_size_exceeds_max"));
    }
    Ok(())
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("ORCHARD_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("orchard.min_batch_size", 1)?
            .set_default("orchard.max_batch_size", 10)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ORCHARD_ prefix)
            .add_source(
                Environment::with_prefix("ORCHARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config
            .orchard
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid orchard config: {}", e)))?;

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for OrchardConfig {
    fn default() -> Self {
        Self {
            min_batch_size: 1,
            max_batch_size: 10,
        }
    }
}
