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

// Batching Kafka logger used by the ingestion pipeline
//
// Turns one agent payload into as many broker records as it holds log
// entries and submits them as a single batch keyed by the agent uuid.

use super::producer::{
    BrokerRecord, RdKafkaProducer, RecordProducer, HEADER_ENVIRONMENT, HEADER_LOG_TYPE,
};
use crate::config::KafkaConfig;
use crate::error::{ExportError, Result};
use crate::report::LogType;
use crate::settings::SettingsProvider;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct KafkaLogger {
    topic: String,
    /// Taken on close; `None` afterwards
    producer: Mutex<Option<Arc<dyn RecordProducer>>>,
    enabled: AtomicBool,
}

impl KafkaLogger {
    pub fn new(config: KafkaConfig) -> Result<Self> {
        let producer = RdKafkaProducer::new(&config)?;
        Ok(Self::with_producer(config.topic, Arc::new(producer)))
    }

    pub fn with_producer(topic: impl Into<String>, producer: Arc<dyn RecordProducer>) -> Self {
        Self {
            topic: topic.into(),
            producer: Mutex::new(Some(producer)),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn producer(&self) -> Result<Arc<dyn RecordProducer>> {
        self.producer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or_else(|| ExportError::Closed("kafka logger".to_string()))
    }

    pub fn settings(&self, settings: &dyn SettingsProvider) {
        warn!("No kafka logging settings");
        self.set_enabled(settings.exporter_enabled("kafka"));
    }

    /// Split a payload into log entries.
    ///
    /// Query results arrive as a single JSON document; status and result
    /// logs arrive as a JSON array with one element per entry.
    pub fn parse_logs(log_type: LogType, data: &[u8]) -> Result<Vec<Value>> {
        match log_type {
            LogType::Query => {
                let result: Value = serde_json::from_slice(data)
                    .map_err(|source| ExportError::Parse { log_type, source })?;
                Ok(vec![result])
            }
            LogType::Status | LogType::Result => {
                // `null` carries no entries
                let logs: Option<Vec<Value>> = serde_json::from_slice(data)
                    .map_err(|source| ExportError::Parse { log_type, source })?;
                Ok(logs.unwrap_or_default())
            }
        }
    }

    /// Ship one payload. Returns how many records the broker accepted.
    ///
    /// A malformed payload is dropped whole; a failed batch reports only
    /// its first error.
    pub async fn send(
        &self,
        log_type: LogType,
        data: &[u8],
        environment: &str,
        uuid: &str,
        debug: bool,
    ) -> Result<usize> {
        if !self.is_enabled() {
            return Ok(0);
        }

        if debug {
            info!(
                "Sending {} bytes to Kafka topic {} for {} - {}",
                data.len(),
                self.topic,
                environment,
                uuid
            );
        }

        let logs = match Self::parse_logs(log_type, data) {
            Ok(logs) => logs,
            Err(e) => {
                error!(error = %e, environment, uuid, "failed to parse logs");
                return Err(e);
            }
        };

        let mut records = Vec::with_capacity(logs.len());
        for entry in &logs {
            let value = match serde_json::to_vec(entry) {
                Ok(value) => value,
                Err(e) => {
                    error!(error = %e, "Error encoding log entry");
                    continue;
                }
            };
            records.push(
                BrokerRecord::new(self.topic.clone(), uuid.as_bytes().to_vec(), value)
                    .with_header(HEADER_LOG_TYPE, log_type.as_str())
                    .with_header(HEADER_ENVIRONMENT, environment),
            );
        }

        if records.is_empty() {
            warn!("unexpected record count of 0 from {}:{}", uuid, environment);
            return Ok(0);
        }

        let count = records.len();
        let results = self.producer()?.produce_batch(records).await;
        if let Some(e) = results.into_first_err() {
            error!(
                error = %e,
                "failed to produce messages to kafka topic '{}'", self.topic
            );
            return Err(e);
        }

        if debug {
            info!(
                "successfully sent {} {} messages to kafka topic '{}' from {}:{}",
                count, log_type, self.topic, uuid, environment
            );
        }
        Ok(count)
    }

    /// Flush pending records and release the producer. Later calls
    /// report `Closed`.
    pub fn close(&self) -> Result<()> {
        let producer = self
            .producer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or_else(|| ExportError::Closed("kafka logger".to_string()))?;

        debug!("Flushing Kafka logger for topic {}", self.topic);
        producer.flush(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_single_document() {
        let logs = KafkaLogger::parse_logs(LogType::Query, br#"{"name":"q","rows":[1,2]}"#).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["name"], "q");
    }

    #[test]
    fn test_parse_result_array() {
        let logs = KafkaLogger::parse_logs(LogType::Result, br#"[{"a":1},{"a":2},{"a":3}]"#).unwrap();
        assert_eq!(logs.len(), 3);
    }

    #[test]
    fn test_parse_status_rejects_object() {
        let err = KafkaLogger::parse_logs(LogType::Status, br#"{"a":1}"#).unwrap_err();
        assert!(matches!(err, ExportError::Parse { log_type: LogType::Status, .. }));
    }

    #[test]
    fn test_parse_status_null_is_empty() {
        let logs = KafkaLogger::parse_logs(LogType::Status, b"null").unwrap();
        assert!(logs.is_empty());
    }

    #[test]
    fn test_parse_query_rejects_garbage() {
        let err = KafkaLogger::parse_logs(LogType::Query, b"{not json").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse query payload"));
    }
}
