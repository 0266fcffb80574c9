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

// Kafka exporter: one record per call, keyed by agent uuid

use super::backend::{Exporter, ExporterState};
use crate::config::{ConfigLoader, KafkaConfig, LOGGER_KAFKA};
use crate::error::{ExportError, Result};
use crate::kafka::{
    BrokerRecord, DeliveryReport, RdKafkaProducer, RecordProducer, HEADER_ENVIRONMENT,
    HEADER_LOG_TYPE, HEADER_QUERY_NAME, HEADER_STATUS,
};
use crate::report::LogType;
use crate::settings::SettingsProvider;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub struct KafkaExporter {
    state: ExporterState,
    topic: String,
    /// Taken on close; `None` afterwards
    producer: Mutex<Option<Arc<dyn RecordProducer>>>,
}

impl KafkaExporter {
    /// Build the producer. Fails on incomplete SASL settings, an unknown
    /// mechanism or an unreadable CA file.
    pub fn new(config: KafkaConfig) -> Result<Self> {
        let producer = RdKafkaProducer::new(&config)?;
        Ok(Self::with_producer(config.topic, Arc::new(producer)))
    }

    /// Read the `kafka` section of an external logger file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading Kafka config from {}", path.as_ref().display());
        let config: KafkaConfig = ConfigLoader::load_backend_section(path, LOGGER_KAFKA)
            .map_err(|e| ExportError::Configuration(format!("{:#}", e)))?;
        Self::new(config)
    }

    pub fn with_producer(topic: impl Into<String>, producer: Arc<dyn RecordProducer>) -> Self {
        Self {
            state: ExporterState::new(LOGGER_KAFKA),
            topic: topic.into(),
            producer: Mutex::new(Some(producer)),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_debug(&self, debug: bool) {
        self.state.set_debug(debug);
    }

    fn producer(&self) -> Result<Arc<dyn RecordProducer>> {
        self.producer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or_else(|| ExportError::Closed(self.name().to_string()))
    }

    /// Dispatch one record, then wait for the acknowledgement or the
    /// cancellation of `ctx`, whichever comes first.
    async fn send(&self, ctx: &CancellationToken, record: BrokerRecord) -> Result<DeliveryReport> {
        let producer = self.producer()?;

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(ExportError::Cancelled),
            result = producer.produce(record) => result,
        }
    }
}

fn produce_error(what: &str, err: ExportError) -> ExportError {
    match err {
        ExportError::Transport(msg) => {
            ExportError::Transport(format!("failed to produce {} to Kafka: {}", what, msg))
        }
        other => other,
    }
}

#[async_trait]
impl Exporter for KafkaExporter {
    async fn export(
        &self,
        ctx: &CancellationToken,
        log_type: LogType,
        data: &[u8],
        environment: &str,
        uuid: &str,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        if self.state.debug() {
            debug!(
                log_type = %log_type,
                environment,
                uuid,
                topic = %self.topic,
                size = data.len(),
                "Sending data to Kafka"
            );
        }

        let record = BrokerRecord::new(self.topic.clone(), uuid.as_bytes().to_vec(), data.to_vec())
            .with_header(HEADER_LOG_TYPE, log_type.as_str())
            .with_header(HEADER_ENVIRONMENT, environment);

        match self.send(ctx, record).await {
            Ok(delivery) => {
                if self.state.debug() {
                    debug!(
                        topic = %self.topic,
                        uuid,
                        partition = delivery.partition,
                        offset = delivery.offset,
                        "Successfully sent message to Kafka"
                    );
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, topic = %self.topic, uuid, "Failed to produce message to Kafka");
                Err(produce_error("message", e))
            }
        }
    }

    async fn export_query(
        &self,
        ctx: &CancellationToken,
        data: &[u8],
        environment: &str,
        uuid: &str,
        name: &str,
        status: i32,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        if self.state.debug() {
            debug!(
                environment,
                uuid,
                name,
                status,
                topic = %self.topic,
                size = data.len(),
                "Sending query result to Kafka"
            );
        }

        let record = BrokerRecord::new(self.topic.clone(), uuid.as_bytes().to_vec(), data.to_vec())
            .with_header(HEADER_LOG_TYPE, LogType::Query.as_str())
            .with_header(HEADER_ENVIRONMENT, environment)
            .with_header(HEADER_QUERY_NAME, name)
            .with_header(HEADER_STATUS, status.to_string());

        match self.send(ctx, record).await {
            Ok(delivery) => {
                if self.state.debug() {
                    debug!(
                        topic = %self.topic,
                        uuid,
                        name,
                        partition = delivery.partition,
                        offset = delivery.offset,
                        "Successfully sent query result to Kafka"
                    );
                }
                Ok(())
            }
            Err(e) => {
                error!(
                    error = %e,
                    topic = %self.topic,
                    uuid,
                    name,
                    "Failed to produce query result to Kafka"
                );
                Err(produce_error("query result", e))
            }
        }
    }

    async fn configure(&self, settings: &dyn SettingsProvider) -> Result<()> {
        info!("Configuring Kafka exporter");
        self.state.apply_settings(settings);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.state.set_enabled(enabled);
    }

    fn name(&self) -> &str {
        self.state.name()
    }

    /// Flush and release the producer. Only the first call does any work;
    /// later calls, like exports after close, report `Closed`.
    async fn close(&self) -> Result<()> {
        let producer = self
            .producer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or_else(|| ExportError::Closed(self.name().to_string()))?;

        debug!("Flushing Kafka producer for topic {}", self.topic);
        producer.flush(Duration::from_secs(5))
    }
}
