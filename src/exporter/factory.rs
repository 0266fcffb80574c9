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

// Exporter factory for creating backends from configuration

use super::backend::Exporter;
use super::kafka::KafkaExporter;
use super::s3::S3Exporter;
use super::stdout::StdoutExporter;
use super::tls::TlsExporter;
use crate::config::{ExportConfig, LOGGER_KAFKA, LOGGER_S3, LOGGER_STDOUT};
use crate::error::{ExportError, Result};
use crate::settings::SettingsProvider;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ExporterFactory;

impl ExporterFactory {
    /// Create and configure one backend by selector.
    ///
    /// Backend settings come from the matching section of `config`, or from
    /// `exporter.logger_file` when that section is missing. Unknown selectors
    /// fall back to stdout.
    pub async fn create_backend(
        logger: &str,
        config: &ExportConfig,
        settings: &dyn SettingsProvider,
    ) -> Result<Arc<dyn Exporter>> {
        let backend: Arc<dyn Exporter> = match logger {
            LOGGER_STDOUT => Arc::new(StdoutExporter::new()),

            LOGGER_S3 => {
                let exporter = match (&config.s3, &config.exporter.logger_file) {
                    (Some(s3), _) if !s3.bucket.is_empty() => S3Exporter::new(s3.clone()).await?,
                    (_, Some(file)) => S3Exporter::from_file(file).await?,
                    _ => return Err(missing_settings(LOGGER_S3)),
                };
                Arc::new(exporter)
            }

            LOGGER_KAFKA => {
                let exporter = match (&config.kafka, &config.exporter.logger_file) {
                    (Some(kafka), _) => KafkaExporter::new(kafka.clone())?,
                    (_, Some(file)) => KafkaExporter::from_file(file)?,
                    _ => return Err(missing_settings(LOGGER_KAFKA)),
                };
                Arc::new(exporter)
            }

            unknown => {
                warn!(
                    "Unknown logger '{}', falling back to {}",
                    unknown, LOGGER_STDOUT
                );
                Arc::new(StdoutExporter::new())
            }
        };

        backend.configure(settings).await.map_err(|e| {
            ExportError::Configuration(format!(
                "failed to configure {} exporter: {}",
                backend.name(),
                e
            ))
        })?;

        info!("Created {} exporter", backend.name());
        Ok(backend)
    }

    /// Build the top-level exporter: `exporter.logger` as primary and, with
    /// `always_log` set, `exporter.always_log_backend` as always-store.
    pub async fn create_tls_exporter(
        config: &ExportConfig,
        settings: &dyn SettingsProvider,
    ) -> Result<TlsExporter> {
        let primary = Self::create_backend(&config.exporter.logger, config, settings).await?;

        let always_store = if config.exporter.always_log {
            let backend =
                Self::create_backend(&config.exporter.always_log_backend, config, settings).await?;
            Some(backend)
        } else {
            None
        };

        Ok(TlsExporter::new(primary, always_store))
    }
}

fn missing_settings(logger: &str) -> ExportError {
    ExportError::Configuration(format!(
        "{} logger needs a '{}' section or exporter.logger_file",
        logger, logger
    ))
}
