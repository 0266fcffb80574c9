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

// Broker records and the producer abstraction

use super::client::build_client_config;
use crate::config::KafkaConfig;
use crate::error::{ExportError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::info;

pub const HEADER_LOG_TYPE: &str = "logType";
pub const HEADER_ENVIRONMENT: &str = "environment";
pub const HEADER_QUERY_NAME: &str = "queryName";
pub const HEADER_STATUS: &str = "status";

/// One message bound for a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerRecord {
    pub topic: String,
    /// Partition key, always the agent uuid
    pub key: Bytes,
    pub headers: Vec<(String, String)>,
    pub value: Bytes,
}

impl BrokerRecord {
    pub fn new(topic: impl Into<String>, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            headers: Vec::new(),
            value: value.into(),
        }
    }

    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Where the broker stored an acknowledged record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub partition: i32,
    pub offset: i64,
}

/// Per-record outcomes of a batch, in submission order
#[derive(Debug, Default)]
pub struct ProduceResults {
    pub results: Vec<Result<DeliveryReport>>,
}

impl ProduceResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The first failure, which is all a batch reports to its caller
    pub fn into_first_err(self) -> Option<ExportError> {
        self.results.into_iter().find_map(|r| r.err())
    }
}

/// A producer bound to one broker cluster.
///
/// `produce` resolves once the broker acknowledges the record or the
/// client gives up on it.
#[async_trait]
pub trait RecordProducer: Send + Sync {
    async fn produce(&self, record: BrokerRecord) -> Result<DeliveryReport>;

    /// Enqueue every record before waiting on any acknowledgement
    async fn produce_batch(&self, records: Vec<BrokerRecord>) -> ProduceResults {
        let results = join_all(records.into_iter().map(|record| self.produce(record))).await;
        ProduceResults { results }
    }

    /// Wait for in-flight records and release the connection
    fn flush(&self, timeout: Duration) -> Result<()>;
}

/// librdkafka-backed producer
pub struct RdKafkaProducer {
    producer: FutureProducer,
    queue_timeout: Duration,
}

impl RdKafkaProducer {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let client_config = build_client_config(config)?;
        let producer: FutureProducer = client_config.create().map_err(|e| {
            ExportError::Configuration(format!("failed to create kafka client: {}", e))
        })?;

        info!(
            "Created Kafka producer for brokers: {} topic: {}",
            config.bootstrap_server, config.topic
        );

        Ok(Self {
            producer,
            queue_timeout: Duration::from_millis(config.message_timeout_ms),
        })
    }
}

#[async_trait]
impl RecordProducer for RdKafkaProducer {
    async fn produce(&self, record: BrokerRecord) -> Result<DeliveryReport> {
        let mut headers = OwnedHeaders::new_with_capacity(record.headers.len());
        for (key, value) in &record.headers {
            headers = headers.insert(Header {
                key: key.as_str(),
                value: Some(value.as_str()),
            });
        }

        let future_record = FutureRecord::to(&record.topic)
            .key(&record.key[..])
            .payload(&record.value[..])
            .headers(headers);

        match self.producer.send(future_record, self.queue_timeout).await {
            Ok((partition, offset)) => Ok(DeliveryReport { partition, offset }),
            Err((e, _)) => Err(ExportError::Transport(e.to_string())),
        }
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(|e| ExportError::Transport(format!("failed to flush kafka producer: {}", e)))
    }
}
