// Configuration module for fleet-export
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Backend sections loaded from an external logger file

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExportConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<ExportConfig> {
    let mut config = load_config(path)?;

    if let Ok(logger) = std::env::var("FLEET_LOGGER") {
        config.exporter.logger = logger;
    }

    if let Ok(servers) = std::env::var("KAFKA_BOOTSTRAP_SERVER") {
        config.kafka.get_or_insert_with(KafkaConfig::default).bootstrap_server = servers;
    }

    if let Ok(topic) = std::env::var("KAFKA_TOPIC") {
        config.kafka.get_or_insert_with(KafkaConfig::default).topic = topic;
    }

    if let Ok(bucket) = std::env::var("S3_BUCKET") {
        config.s3.get_or_insert_with(S3Config::default).bucket = bucket;
    }

    ConfigLoader::validate(&config)?;
    Ok(config)
}
