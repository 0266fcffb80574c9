// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}").expect("env var pattern is a valid regex")
});

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ExportConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        let config = Self::parse(&content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Parse a YAML document after substituting environment variables
    pub fn parse(content: &str) -> Result<ExportConfig> {
        let content = Self::substitute_env_vars(content);
        serde_yaml::from_str(&content).context("Failed to parse YAML configuration")
    }

    /// Read one top-level section (`s3`, `kafka`) out of an external logger file.
    ///
    /// The file may be YAML or JSON.
    pub fn load_backend_section<T, P>(path: P, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read logger file {}", path.display()))?;
        let content = Self::substitute_env_vars(&content);

        let document: serde_yaml::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse logger file {}", path.display()))?;

        let section = document
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("key '{}' not found in {}", key, path.display()))?;

        serde_yaml::from_value(section)
            .with_context(|| format!("Failed to decode '{}' section of {}", key, path.display()))
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${KAFKA_TOPIC:-osquery-logs} -> osquery-logs (if KAFKA_TOPIC not set)
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                let default_value = caps.get(2).map(|m| m.as_str());

                match std::env::var(var_name) {
                    Ok(value) => value,
                    Err(_) => match default_value {
                        Some(default) => default.to_string(),
                        // Keep original if no default and var not found
                        None => format!("${{{}}}", var_name),
                    },
                }
            })
            .to_string()
    }

    /// Validate configuration
    pub(crate) fn validate(config: &ExportConfig) -> Result<()> {
        if config.exporter.logger.trim().is_empty() {
            bail!("exporter.logger cannot be empty");
        }

        if config.exporter.export_timeout_seconds == 0 {
            bail!("exporter.export_timeout_seconds must be > 0");
        }

        if let Some(kafka) = &config.kafka {
            if kafka.bootstrap_server.trim().is_empty() {
                bail!("kafka.bootstrap_server cannot be empty");
            }
            if kafka.topic.trim().is_empty() {
                bail!("kafka.topic cannot be empty");
            }
        }

        if let Some(s3) = &config.s3 {
            if s3.bucket.trim().is_empty() {
                bail!("s3.bucket cannot be empty");
            }
        }

        match config.logging.format.as_str() {
            "text" | "json" => {}
            other => bail!("logging.format must be 'text' or 'json', got '{}'", other),
        }

        Ok(())
    }
}
