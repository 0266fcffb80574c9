// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration types for fleet-export

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const LOGGER_STDOUT: &str = "stdout";
pub const LOGGER_S3: &str = "s3";
pub const LOGGER_KAFKA: &str = "kafka";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub exporter: ExporterSettings,

    /// S3 settings; when absent the factory reads them from `exporter.logger_file`
    #[serde(default)]
    pub s3: Option<S3Config>,

    /// Kafka settings; when absent the factory reads them from `exporter.logger_file`
    #[serde(default)]
    pub kafka: Option<KafkaConfig>,

    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExporterSettings {
    /// Backend type: "stdout", "s3", "kafka". Unknown values fall back to stdout.
    #[serde(default = "default_logger")]
    pub logger: String,

    /// External file holding backend-specific settings
    #[serde(default)]
    pub logger_file: Option<String>,

    /// Also keep every status and query report in a second backend
    #[serde(default)]
    pub always_log: bool,

    #[serde(default = "default_logger")]
    pub always_log_backend: String,

    /// Per-call deadline used by the CLI
    #[serde(default = "default_export_timeout")]
    pub export_timeout_seconds: u64,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            logger: default_logger(),
            logger_file: None,
            always_log: false,
            always_log_backend: default_logger(),
            export_timeout_seconds: default_export_timeout(),
        }
    }
}

impl ExporterSettings {
    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Config {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_access_key: String,
    /// S3-compatible endpoint (MinIO, LocalStack); path-style addressing is used when set
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            access_key: String::new(),
            secret_access_key: String::new(),
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KafkaConfig {
    /// Comma-separated seed brokers
    pub bootstrap_server: String,
    pub topic: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Connection setup timeout, 0 keeps the client default
    #[serde(default)]
    pub connection_timeout_ms: u64,

    #[serde(default = "default_message_timeout")]
    pub message_timeout_ms: u64,

    /// CA bundle used to verify the brokers; enables TLS when set
    #[serde(default)]
    pub ssl_ca_location: String,

    #[serde(default)]
    pub sasl: SaslConfig,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_server: "localhost:9092".to_string(),
            topic: "osquery-logs".to_string(),
            client_id: default_client_id(),
            connection_timeout_ms: 0,
            message_timeout_ms: default_message_timeout(),
            ssl_ca_location: String::new(),
            sasl: SaslConfig::default(),
        }
    }
}

impl KafkaConfig {
    pub fn new(bootstrap_server: &str, topic: &str) -> Self {
        Self {
            bootstrap_server: bootstrap_server.to_string(),
            topic: topic.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SaslConfig {
    /// "SCRAM-SHA-256" or "SCRAM-SHA-512"; empty disables SASL
    #[serde(default)]
    pub mechanism: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Flags fed to [`crate::settings::StaticSettings`]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SettingsConfig {
    #[serde(default)]
    pub debug: HashMap<String, bool>,
    #[serde(default)]
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String, // "text", "json"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_logger() -> String { LOGGER_STDOUT.to_string() }
fn default_export_timeout() -> u64 { 30 }
fn default_region() -> String { "us-east-1".to_string() }
fn default_client_id() -> String { "fleet-export".to_string() }
fn default_message_timeout() -> u64 { 30000 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
